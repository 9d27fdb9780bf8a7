use chrono::{FixedOffset, Offset, Utc};
use log::{info, warn};
use std::time::Duration;

use crate::connectivity::{Credentials, RetryPolicy};

const DEFAULT_WIFI_SSID: &str = "YOUR_SSID";
const DEFAULT_WIFI_PASS: &str = "YOUR_PASSWORD";
const DEFAULT_TIMEZONE: &str = "MSK-3";
const HOSTNAME: &str = "ESP32-2432S024";
const NTP_SERVERS: [&str; 3] = ["0.ru.pool.ntp.org", "1.ru.pool.ntp.org", "2.ru.pool.ntp.org"];

// ── Timing ──────────────────────────────────────────────────────────
const CONNECT_ATTEMPTS: u32 = 10;
const RETRY_PAUSE_MS: u64 = 500;
const SETTLE_PAUSE_MS: u64 = 125;
const REFRESH_INTERVAL_MS: u64 = 250;
const REPORT_PERIOD_MS: u64 = 10_000;
const SCAN_INTERVAL_MS: u64 = 300_000;
const BOOT_HOLD_MS: u64 = 3_000;
const POLL_YIELD_MS: u64 = 2;

/// One line of size-1 text on the 320 px wide panel.
const SCAN_TABLE_WIDTH: usize = 53;
const TX_POWER_DBM: i8 = 11;

/// Build-time configuration. Nothing here is persisted or changed at runtime.
#[derive(Debug, Clone)]
pub struct Config {
    pub wifi_ssid: String,
    pub wifi_pass: String,
    pub hostname: String,
    pub tx_power_dbm: i8,
    pub ntp_servers: [&'static str; 3],
    pub timezone: String,
    pub connect_attempts: u32,
    pub retry_pause: Duration,
    pub settle_pause: Duration,
    pub refresh_interval: Duration,
    pub report_period: Duration,
    pub scan_interval: Duration,
    pub scan_table_width: usize,
    pub boot_hold: Duration,
    pub poll_yield: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            wifi_ssid: DEFAULT_WIFI_SSID.to_string(),
            wifi_pass: DEFAULT_WIFI_PASS.to_string(),
            hostname: HOSTNAME.to_string(),
            tx_power_dbm: TX_POWER_DBM,
            ntp_servers: NTP_SERVERS,
            timezone: DEFAULT_TIMEZONE.to_string(),
            connect_attempts: CONNECT_ATTEMPTS,
            retry_pause: Duration::from_millis(RETRY_PAUSE_MS),
            settle_pause: Duration::from_millis(SETTLE_PAUSE_MS),
            refresh_interval: Duration::from_millis(REFRESH_INTERVAL_MS),
            report_period: Duration::from_millis(REPORT_PERIOD_MS),
            scan_interval: Duration::from_millis(SCAN_INTERVAL_MS),
            scan_table_width: SCAN_TABLE_WIDTH,
            boot_hold: Duration::from_millis(BOOT_HOLD_MS),
            poll_yield: Duration::from_millis(POLL_YIELD_MS),
        }
    }
}

impl Config {
    /// Defaults with credentials and timezone taken from `wifi.local.rs`
    /// (see build.rs) when it was present at build time.
    pub fn from_build_env() -> Config {
        let mut cfg = Config::default();
        if let Some(ssid) = option_env!("LOCAL_WIFI_SSID") {
            cfg.wifi_ssid = ssid.to_string();
        }
        if let Some(pass) = option_env!("LOCAL_WIFI_PASS") {
            cfg.wifi_pass = pass.to_string();
        }
        if let Some(tz) = option_env!("LOCAL_TIMEZONE") {
            cfg.timezone = tz.to_string();
        }
        info!("config wifi_ssid = {:?}", cfg.wifi_ssid);
        info!("config wifi_pass = <{} chars>", cfg.wifi_pass.len());
        info!("config timezone = {:?}", cfg.timezone);
        info!("config ntp = {:?}", cfg.ntp_servers);
        cfg
    }

    pub fn credentials(&self) -> Credentials {
        Credentials {
            ssid: self.wifi_ssid.clone(),
            secret: self.wifi_pass.clone(),
            hostname: self.hostname.clone(),
            tx_power_dbm: self.tx_power_dbm,
        }
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.connect_attempts,
            retry_pause: self.retry_pause,
            settle_pause: self.settle_pause,
        }
    }

    pub fn utc_offset(&self) -> FixedOffset {
        parse_posix_utc_offset(&self.timezone).unwrap_or_else(|| {
            warn!("timezone {:?} not understood, using UTC", self.timezone);
            Utc.fix()
        })
    }
}

/// Offset of the standard-time part of a POSIX TZ rule.
///
/// POSIX counts hours *west* of Greenwich, so `"MSK-3"` is UTC+3 and
/// `"CST6CDT,M3.2.0,M11.1.0"` is UTC-6. Quoted names (`"<+0530>-5:30"`)
/// are accepted. DST rules after the offset are ignored.
pub fn parse_posix_utc_offset(rule: &str) -> Option<FixedOffset> {
    let rule = rule.trim();
    let rest = if let Some(quoted) = rule.strip_prefix('<') {
        &quoted[quoted.find('>')? + 1..]
    } else {
        let name_len = rule.find(|c: char| !c.is_ascii_alphabetic())?;
        if name_len < 3 {
            return None;
        }
        &rule[name_len..]
    };

    let (sign, digits) = match rest.as_bytes().first()? {
        b'-' => (1, &rest[1..]),
        b'+' => (-1, &rest[1..]),
        _ => (-1, rest),
    };
    let end = digits
        .find(|c: char| !(c.is_ascii_digit() || c == ':'))
        .unwrap_or(digits.len());
    let mut fields = digits[..end].split(':');
    let hours: i32 = fields.next()?.parse().ok()?;
    let minutes: i32 = fields.next().map_or(Ok(0), str::parse).ok()?;
    let seconds: i32 = fields.next().map_or(Ok(0), str::parse).ok()?;
    if hours > 24 || minutes > 59 || seconds > 59 {
        return None;
    }
    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60 + seconds))
}
