//! Station link lifecycle: connect once at startup with bounded retry, then
//! leave link maintenance to the transport.
//!
//! After a verified connect the manager switches on the transport's own
//! auto-reconnect and never runs the connect protocol again by itself. Drops
//! and silent re-associations after that happen inside the transport, so the
//! state kept here is a snapshot of the last protocol run. `is_connected()`
//! asks the transport and is the only answer to trust.

use embedded_hal::delay::DelayNs;
use log::{debug, info, warn};
use std::time::Duration;
use thiserror::Error;

use crate::scanner::AccessPoint;
use crate::timebase::delay_millis;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LinkError {
    #[error("no verified link to '{ssid}' after {attempts} attempts")]
    ConnectivityFailure { ssid: String, attempts: u32 },
    #[error("wifi transport: {0}")]
    Transport(String),
}

/// Link state as reported by the transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkStatus {
    NotConnected,
    Connecting,
    /// Associated and holding an address.
    Connected,
    Failed,
}

/// The Wi-Fi station driver as seen by this crate.
pub trait Transport {
    fn set_hostname(&mut self, _hostname: &str) -> Result<(), LinkError> {
        Ok(())
    }

    fn set_tx_power(&mut self, _dbm: i8) -> Result<(), LinkError> {
        Ok(())
    }

    /// Start associating. Returns without waiting for the link.
    fn begin_association(&mut self, ssid: &str, secret: &str) -> Result<(), LinkError>;

    fn disconnect(&mut self) -> Result<(), LinkError>;

    /// Must not block.
    fn status(&self) -> LinkStatus;

    fn rssi(&self) -> i8;

    fn channel(&self) -> u8;

    fn local_address(&self) -> String;

    /// Let the driver re-associate on its own after a drop.
    fn set_auto_reconnect(&mut self, enabled: bool);

    /// Blocking scan, bounded by the driver's own scan timeout. Entries come
    /// back in the order the driver found them.
    fn scan(&mut self) -> Result<Vec<AccessPoint>, LinkError>;

    /// Free whatever the driver still holds from the last scan.
    fn release_scan_results(&mut self);
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub ssid: String,
    pub secret: String,
    pub hostname: String,
    pub tx_power_dbm: i8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// At least one attempt is always made.
    pub max_attempts: u32,
    pub retry_pause: Duration,
    /// Pause after tearing down the old session, before associating again.
    pub settle_pause: Duration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectivityState {
    Disconnected,
    Connecting { attempt: u32 },
    Connected,
    Failed { attempts: u32 },
}

/// Link quality and address after a verified connect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkReport {
    pub ssid: String,
    pub rssi: i8,
    pub channel: u8,
    pub address: String,
}

pub struct ConnectivityManager<T> {
    transport: T,
    state: ConnectivityState,
    ssid: String,
    attempt_count: u32,
    max_attempts: u32,
    retry_pause: Duration,
}

impl<T: Transport> ConnectivityManager<T> {
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            state: ConnectivityState::Disconnected,
            ssid: String::new(),
            attempt_count: 0,
            max_attempts: 0,
            retry_pause: Duration::ZERO,
        }
    }

    /// Run the connect protocol once.
    ///
    /// Blocks for `max_attempts * retry_pause` plus the settle pause at most.
    /// Failing leaves the device usable in display-only mode; whether to run
    /// the protocol again is the caller's call.
    pub fn connect<D: DelayNs>(
        &mut self,
        creds: &Credentials,
        policy: &RetryPolicy,
        delay: &mut D,
    ) -> Result<LinkReport, LinkError> {
        self.ssid = creds.ssid.clone();
        self.max_attempts = policy.max_attempts.max(1);
        self.retry_pause = policy.retry_pause;
        self.attempt_count = 0;
        self.state = ConnectivityState::Connecting { attempt: 0 };

        if let Err(e) = self.transport.set_hostname(&creds.hostname) {
            warn!("WiFi: hostname not applied: {}", e);
        }
        // A stale association must not be picked up again, by us or by the
        // driver's own reconnect from an earlier run.
        self.transport.set_auto_reconnect(false);
        if let Err(e) = self.transport.disconnect() {
            debug!("WiFi: teardown before connect: {}", e);
        }
        delay.delay_ms(delay_millis(policy.settle_pause));

        info!("Connecting to WiFi: {}", creds.ssid);
        if let Err(e) = self.transport.begin_association(&creds.ssid, &creds.secret) {
            warn!("WiFi: association request rejected: {}", e);
            self.state = ConnectivityState::Failed { attempts: 0 };
            return Err(e);
        }
        if let Err(e) = self.transport.set_tx_power(creds.tx_power_dbm) {
            warn!("WiFi: tx power not applied: {}", e);
        }

        let verified = loop {
            delay.delay_ms(delay_millis(self.retry_pause));
            self.attempt_count += 1;
            self.state = ConnectivityState::Connecting { attempt: self.attempt_count };
            let up = self.is_connected();
            debug!(
                "WiFi: attempt {}/{} -> {:?}",
                self.attempt_count,
                self.max_attempts,
                self.transport.status()
            );
            if up || self.attempt_count >= self.max_attempts {
                break up;
            }
        };

        if !verified {
            warn!(
                "WiFi: no link to '{}' after {} attempts",
                self.ssid, self.attempt_count
            );
            self.state = ConnectivityState::Failed { attempts: self.attempt_count };
            return Err(LinkError::ConnectivityFailure {
                ssid: self.ssid.clone(),
                attempts: self.attempt_count,
            });
        }

        self.state = ConnectivityState::Connected;
        self.transport.set_auto_reconnect(true);
        let report = self.current_report();
        info!(
            "Connected to {}; RSSI = {}dBm; Channel {}",
            report.ssid, report.rssi, report.channel
        );
        info!("IP address local: {}", report.address);
        Ok(report)
    }

    /// Non-blocking; asks the transport every time.
    pub fn is_connected(&self) -> bool {
        self.transport.status() == LinkStatus::Connected
    }

    /// Current link quality, or `None` while the link is down.
    pub fn link_report(&self) -> Option<LinkReport> {
        self.is_connected().then(|| self.current_report())
    }

    fn current_report(&self) -> LinkReport {
        LinkReport {
            ssid: self.ssid.clone(),
            rssi: self.transport.rssi(),
            channel: self.transport.channel(),
            address: self.transport.local_address(),
        }
    }

    /// Outcome of the last connect run. May be stale; see `is_connected`.
    pub fn state(&self) -> ConnectivityState {
        self.state
    }

    pub fn attempt_count(&self) -> u32 {
        self.attempt_count
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::{SimClock, SimTransport};

    fn creds() -> Credentials {
        Credentials {
            ssid: "home".into(),
            secret: "hunter22".into(),
            hostname: "panel".into(),
            tx_power_dbm: 11,
        }
    }

    fn policy(max_attempts: u32, pause_ms: u64) -> RetryPolicy {
        RetryPolicy {
            max_attempts,
            retry_pause: Duration::from_millis(pause_ms),
            settle_pause: Duration::from_millis(125),
        }
    }

    #[test]
    fn verified_link_enables_auto_reconnect() {
        let clock = SimClock::new(0);
        let transport = SimTransport::new(clock.clone()).link_after(Duration::from_millis(1_200));
        let mut link = ConnectivityManager::new(transport);
        let mut delay = clock.clone();

        let report = link.connect(&creds(), &policy(10, 500), &mut delay).unwrap();

        assert_eq!(link.state(), ConnectivityState::Connected);
        assert_eq!(link.attempt_count(), 3);
        assert!(link.transport().auto_reconnect);
        assert_eq!(report.ssid, "home");
        assert_eq!(report.address, link.transport().address);
        assert_eq!(link.transport().hostname.as_deref(), Some("panel"));
        assert_eq!(link.transport().tx_power, Some(11));
    }

    #[test]
    fn session_is_torn_down_before_associating() {
        let clock = SimClock::new(0);
        let mut link = ConnectivityManager::new(SimTransport::new(clock.clone()).never_links());
        let mut delay = clock.clone();

        let _ = link.connect(&creds(), &policy(1, 500), &mut delay);
        let _ = link.connect(&creds(), &policy(1, 500), &mut delay);

        assert_eq!(link.transport().disconnects, 2);
        assert_eq!(link.transport().associations, 2);
    }

    #[test]
    fn rerun_revokes_earlier_auto_reconnect() {
        let clock = SimClock::new(0);
        let transport = SimTransport::new(clock.clone()).link_after(Duration::from_millis(100));
        let mut link = ConnectivityManager::new(transport);
        let mut delay = clock.clone();
        link.connect(&creds(), &policy(3, 500), &mut delay).unwrap();
        assert!(link.transport().auto_reconnect);

        link.transport_mut().set_link_delay(None);
        let err = link.connect(&creds(), &policy(3, 500), &mut delay).unwrap_err();

        assert!(matches!(err, LinkError::ConnectivityFailure { attempts: 3, .. }));
        assert_eq!(link.state(), ConnectivityState::Failed { attempts: 3 });
        assert!(!link.transport().auto_reconnect);
        assert!(!link.is_connected());
    }

    #[test]
    fn exhausted_attempts_fail_without_auto_reconnect() {
        let clock = SimClock::new(0);
        let mut link = ConnectivityManager::new(SimTransport::new(clock.clone()).never_links());
        let mut delay = clock.clone();

        let err = link.connect(&creds(), &policy(5, 200), &mut delay).unwrap_err();

        assert_eq!(
            err,
            LinkError::ConnectivityFailure { ssid: "home".into(), attempts: 5 }
        );
        assert_eq!(link.state(), ConnectivityState::Failed { attempts: 5 });
        assert!(!link.transport().auto_reconnect);
        assert!(link.link_report().is_none());
    }

    #[test]
    fn zero_attempts_still_tries_once() {
        let clock = SimClock::new(0);
        let mut link = ConnectivityManager::new(SimTransport::new(clock.clone()).never_links());
        let mut delay = clock.clone();

        let _ = link.connect(&creds(), &policy(0, 500), &mut delay);
        assert_eq!(link.attempt_count(), 1);
        assert_eq!(clock.now_ms(), 125 + 500);
    }

    #[test]
    fn rejected_association_fails_immediately() {
        let clock = SimClock::new(0);
        let transport = SimTransport::new(clock.clone()).rejecting_association();
        let mut link = ConnectivityManager::new(transport);
        let mut delay = clock.clone();

        let err = link.connect(&creds(), &policy(10, 500), &mut delay).unwrap_err();
        assert!(matches!(err, LinkError::Transport(_)));
        assert_eq!(link.state(), ConnectivityState::Failed { attempts: 0 });
        assert_eq!(clock.now_ms(), 125);
    }

    #[test]
    fn status_query_is_idempotent() {
        let clock = SimClock::new(0);
        let transport = SimTransport::new(clock.clone()).link_after(Duration::from_millis(100));
        let mut link = ConnectivityManager::new(transport);
        let mut delay = clock.clone();
        link.connect(&creds(), &policy(3, 500), &mut delay).unwrap();

        let first = link.is_connected();
        assert!((0..50).all(|_| link.is_connected() == first));
    }

    #[test]
    fn transport_is_the_source_of_truth() {
        let clock = SimClock::new(0);
        let transport = SimTransport::new(clock.clone()).link_after(Duration::from_millis(100));
        let mut link = ConnectivityManager::new(transport);
        let mut delay = clock.clone();
        link.connect(&creds(), &policy(3, 500), &mut delay).unwrap();

        link.transport_mut().drop_link();
        assert_eq!(link.state(), ConnectivityState::Connected);
        assert!(!link.is_connected());

        // The driver re-associates by itself; the protocol is not re-run.
        link.transport_mut().restore_link();
        assert!(link.is_connected());
        assert_eq!(link.transport().associations, 1);
    }
}
