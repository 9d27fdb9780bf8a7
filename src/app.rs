//! The panel itself: what each periodic action draws, and the polling loop
//! that drives them.

use anyhow::Context;
use embedded_hal::delay::DelayNs;
use log::info;

use crate::clock::{ClockSource, TimeFormat};
use crate::config::Config;
use crate::connectivity::{ConnectivityManager, LinkError, LinkReport, Transport};
use crate::display::Surface;
use crate::layout::LINK_LINE_CHARS;
use crate::scanner;
use crate::scheduler::{RateSample, Scheduler, Trigger};
use crate::system::SystemStats;
use crate::timebase::{delay_millis, Monotonic};
use crate::views;

pub const REFRESH: &str = "refresh";
pub const REPORT: &str = "report";
pub const SCAN: &str = "scan";

/// Everything the actions touch. Owned by the polling loop.
pub struct App<T, S> {
    pub link: ConnectivityManager<T>,
    pub clock: ClockSource,
    pub surface: S,
    pub stats: Box<dyn SystemStats>,
    pub config: Config,
    last_sample: Option<RateSample>,
    last_scan: Option<String>,
}

impl<T: Transport, S: Surface> App<T, S> {
    pub fn new(
        link: ConnectivityManager<T>,
        clock: ClockSource,
        surface: S,
        stats: Box<dyn SystemStats>,
        config: Config,
    ) -> Self {
        Self {
            link,
            clock,
            surface,
            stats,
            config,
            last_sample: None,
            last_scan: None,
        }
    }

    /// One run of the connect protocol with the configured credentials.
    /// Blocks for at most the retry budget.
    pub fn connect<D: DelayNs>(&mut self, delay: &mut D) -> Result<LinkReport, LinkError> {
        let creds = self.config.credentials();
        let policy = self.config.retry_policy();
        self.link.connect(&creds, &policy, delay)
    }

    /// Boot screen, link line and clock, then hold so the summary can be read.
    pub fn boot<D: DelayNs>(&mut self, delay: &mut D) {
        let info = self.stats.chip_info();
        for line in info.lines() {
            info!("{}", line);
        }
        views::boot::draw(&mut self.surface, &info);
        self.refresh();
        delay.delay_ms(delay_millis(self.config.boot_hold));
    }

    /// Clock header and link line.
    pub fn refresh(&mut self) {
        views::clock::draw(&mut self.surface, &self.clock);
        let link = self.link.link_report();
        let ssid = &self.config.wifi_ssid;
        views::status::draw(&mut self.surface, ssid, link.as_ref(), LINK_LINE_CHARS);
    }

    pub fn report(&mut self, sample: RateSample) {
        let free_heap = self.stats.free_heap();
        info!(
            "refresh rate {:.1}/s over {} ms, free heap {} bytes",
            sample.per_second(),
            sample.window_ms,
            free_heap
        );
        views::report::draw(&mut self.surface, &sample, free_heap);
        self.last_sample = Some(sample);
    }

    /// Scan, draw the table, then release the driver's copy of the results.
    /// Returns the number of networks found.
    pub fn scan_networks(&mut self) -> usize {
        let result = scanner::scan(self.link.transport_mut());
        let stamp = self.clock.now_text(TimeFormat::Time);
        views::wifi_scan::draw(&mut self.surface, &result, &stamp, self.config.scan_table_width);
        scanner::release(self.link.transport_mut());
        self.last_scan = Some(stamp);
        result.len()
    }

    pub fn last_sample(&self) -> Option<RateSample> {
        self.last_sample
    }

    /// Local time of the last completed scan.
    pub fn last_scan(&self) -> Option<&str> {
        self.last_scan.as_deref()
    }
}

impl<T, S> App<T, S>
where
    T: Transport + 'static,
    S: Surface + 'static,
{
    /// The panel's three actions, in the order they are checked each pass.
    pub fn scheduler(&self) -> Scheduler<Self> {
        let mut scheduler = Scheduler::new();
        let refresh = scheduler.register(
            REFRESH,
            Trigger::Every(self.config.refresh_interval),
            |app: &mut Self, _| {
                app.refresh();
                Ok(())
            },
        );
        scheduler.register_report(REPORT, self.config.report_period, refresh, |app: &mut Self, f| {
            let sample = f.sample.context("report fired without a sample")?;
            app.report(sample);
            Ok(())
        });
        scheduler.register(
            SCAN,
            Trigger::Every(self.config.scan_interval),
            |app: &mut Self, _| {
                app.scan_networks();
                Ok(())
            },
        );
        scheduler
    }
}

/// Poll until `until_ms` on `clock`, pausing `poll_yield` between passes.
/// Returns how many actions fired.
pub fn poll_until<T, S, M, D>(
    app: &mut App<T, S>,
    scheduler: &mut Scheduler<App<T, S>>,
    clock: &M,
    pause: &mut D,
    until_ms: u64,
) -> usize
where
    M: Monotonic,
    D: DelayNs,
{
    let step = delay_millis(app.config.poll_yield).max(1);
    let mut fired = 0;
    loop {
        let now = clock.now_ms();
        if now > until_ms {
            return fired;
        }
        fired += scheduler.tick(now, app);
        pause.delay_ms(step);
    }
}

/// The polling loop. Never returns.
///
/// The pause between passes hands the CPU to the idle task so the task
/// watchdog stays fed.
pub fn run<T, S, M, D>(
    app: &mut App<T, S>,
    scheduler: &mut Scheduler<App<T, S>>,
    clock: &M,
    pause: &mut D,
) -> !
where
    M: Monotonic,
    D: DelayNs,
{
    info!("Entering main loop");
    let step = delay_millis(app.config.poll_yield);
    loop {
        scheduler.tick(clock.now_ms(), app);
        pause.delay_ms(step);
    }
}
