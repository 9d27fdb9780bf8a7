//! Cooperative scheduler for the panel's periodic actions.
//!
//! Everything runs on the polling thread. `tick` checks every registered
//! action in registration order and fires the ones that are due; an action
//! that takes long delays every other action by the same amount. Missed
//! periods are not caught up: a fired action's deadline restarts at the time
//! it actually fired.

use anyhow::Result;
use log::warn;
use std::time::Duration;

use crate::timebase::elapsed_ms;

/// When an action is due.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    /// At least this much time has passed since the last fire.
    Every(Duration),
    /// The clock has entered a new multiple of this period since the last
    /// fire (every exact 10 s mark, say), however irregular the polling is.
    PhaseBoundary(Duration),
}

impl Trigger {
    fn period_ms(self) -> u64 {
        match self {
            Trigger::Every(d) | Trigger::PhaseBoundary(d) => d.as_millis() as u64,
        }
    }

    fn is_due(self, now: u64, last_fire: u64) -> bool {
        if now < last_fire {
            return false;
        }
        let period = self.period_ms();
        match self {
            Trigger::Every(_) => elapsed_ms(now, last_fire) >= period,
            Trigger::PhaseBoundary(_) if period == 0 => true,
            Trigger::PhaseBoundary(_) => now / period > last_fire / period,
        }
    }
}

/// Actions are numbered in registration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ActionId(usize);

/// How often an observed action fired between two reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateSample {
    pub fires: u32,
    /// Measured time between the two reports, not the nominal period.
    pub window_ms: u64,
}

impl RateSample {
    pub fn per_second(&self) -> f32 {
        if self.window_ms == 0 {
            return 0.0;
        }
        self.fires as f32 * 1000.0 / self.window_ms as f32
    }
}

/// What an action is told when it fires.
#[derive(Debug, Clone, Copy)]
pub struct Firing {
    pub now: u64,
    /// Only set for reporting actions.
    pub sample: Option<RateSample>,
}

pub type ActionFn<C> = Box<dyn FnMut(&mut C, &Firing) -> Result<()>>;

pub struct ScheduledAction<C> {
    name: &'static str,
    trigger: Trigger,
    last_fire: u64,
    counter: u32,
    observes: Option<ActionId>,
    /// Start of the current report window. Set on the first pass, so time
    /// spent before the loop starts is not counted.
    window_start: Option<u64>,
    run: ActionFn<C>,
}

impl<C> ScheduledAction<C> {
    pub fn last_fire(&self) -> u64 {
        self.last_fire
    }

    /// Fires since the last report that observed this action (or since
    /// registration if nothing observes it).
    pub fn counter(&self) -> u32 {
        self.counter
    }
}

/// Owns every periodic action for the life of the process.
pub struct Scheduler<C> {
    actions: Vec<ScheduledAction<C>>,
}

impl<C> Default for Scheduler<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> Scheduler<C> {
    pub fn new() -> Self {
        Self { actions: Vec::new() }
    }

    /// Register an action. It starts with `last_fire = 0`, so it fires on the
    /// first pass at which its trigger is satisfied.
    pub fn register<F>(&mut self, name: &'static str, trigger: Trigger, run: F) -> ActionId
    where
        F: FnMut(&mut C, &Firing) -> Result<()> + 'static,
    {
        self.push(name, trigger, None, Box::new(run))
    }

    /// Register a phase-boundary action that reports how often `observed`
    /// fired since the previous report, then zeroes `observed`'s counter.
    pub fn register_report<F>(
        &mut self,
        name: &'static str,
        period: Duration,
        observed: ActionId,
        run: F,
    ) -> ActionId
    where
        F: FnMut(&mut C, &Firing) -> Result<()> + 'static,
    {
        self.push(name, Trigger::PhaseBoundary(period), Some(observed), Box::new(run))
    }

    fn push(
        &mut self,
        name: &'static str,
        trigger: Trigger,
        observes: Option<ActionId>,
        run: ActionFn<C>,
    ) -> ActionId {
        let id = ActionId(self.actions.len());
        self.actions.push(ScheduledAction {
            name,
            trigger,
            last_fire: 0,
            counter: 0,
            observes,
            window_start: None,
            run,
        });
        id
    }

    pub fn action(&self, id: ActionId) -> Option<&ScheduledAction<C>> {
        self.actions.get(id.0)
    }

    pub fn find(&self, name: &str) -> Option<ActionId> {
        self.actions.iter().position(|a| a.name == name).map(ActionId)
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// One cooperative pass. Returns how many actions fired.
    ///
    /// An action's error is logged and dropped; it never stops the pass.
    pub fn tick(&mut self, now: u64, ctx: &mut C) -> usize {
        let mut fired = 0;
        for index in 0..self.actions.len() {
            let (observes, window_start) = {
                let action = &mut self.actions[index];
                let window_start = *action.window_start.get_or_insert(now);
                if !action.trigger.is_due(now, action.last_fire) {
                    continue;
                }
                (action.observes, window_start)
            };

            let sample = observes.and_then(|observed| {
                let window_ms = elapsed_ms(now, window_start);
                self.actions.get_mut(observed.0).map(|target| {
                    let fires = target.counter;
                    target.counter = 0;
                    RateSample { fires, window_ms }
                })
            });

            let action = &mut self.actions[index];
            let firing = Firing { now, sample };
            if let Err(e) = (action.run)(ctx, &firing) {
                warn!("action '{}' failed at {}ms: {:#}", action.name, now, e);
            }
            action.last_fire = now;
            action.counter = action.counter.saturating_add(1);
            if sample.is_some() {
                action.window_start = Some(now);
            }
            fired += 1;
        }
        fired
    }
}
