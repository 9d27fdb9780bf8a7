//! On-demand scan of visible access points and the text table the panel shows.

use log::{info, warn};

use crate::connectivity::Transport;

/// Encryption advertised by an access point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Security {
    Open,
    Wep,
    Wpa,
    Wpa2,
    WpaWpa2,
    Wpa2Enterprise,
    Wpa3,
    Wpa2Wpa3,
    Wapi,
    Unknown,
}

impl Security {
    /// From the ESP-IDF `wifi_auth_mode_t` numbering. Anything not listed is
    /// `Unknown`, never an error.
    pub fn from_auth_mode(code: u32) -> Security {
        match code {
            0 => Security::Open,
            1 => Security::Wep,
            2 => Security::Wpa,
            3 => Security::Wpa2,
            4 => Security::WpaWpa2,
            5 => Security::Wpa2Enterprise,
            6 => Security::Wpa3,
            7 => Security::Wpa2Wpa3,
            8 => Security::Wapi,
            _ => Security::Unknown,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Security::Open => "open",
            Security::Wep => "WEP",
            Security::Wpa => "WPA",
            Security::Wpa2 => "WPA2",
            Security::WpaWpa2 => "WPA+WPA2",
            Security::Wpa2Enterprise => "WPA2-EAP",
            Security::Wpa3 => "WPA3",
            Security::Wpa2Wpa3 => "WPA2+WPA3",
            Security::Wapi => "WAPI",
            Security::Unknown => "unknown",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessPoint {
    pub ssid: String,
    /// dBm
    pub rssi: i8,
    pub channel: u8,
    pub security: Security,
}

impl AccessPoint {
    pub fn new(ssid: &str, rssi: i8, channel: u8, security: Security) -> Self {
        Self {
            ssid: ssid.to_string(),
            rssi,
            channel,
            security,
        }
    }
}

/// One scan, in discovery order. Lives only until it has been rendered.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanResult {
    pub entries: Vec<AccessPoint>,
}

impl ScanResult {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &AccessPoint> {
        self.entries.iter()
    }
}

/// Scan through the transport. A failed scan comes back empty.
///
/// This is the one blocking call the polling loop allows outside of connect.
pub fn scan<T: Transport>(transport: &mut T) -> ScanResult {
    match transport.scan() {
        Ok(entries) => {
            info!("WiFi scan found {} networks", entries.len());
            ScanResult { entries }
        }
        Err(e) => {
            warn!("WiFi scan failed: {}", e);
            ScanResult::default()
        }
    }
}

/// Drop the driver's copy of the last scan so repeated scans don't pile up.
pub fn release<T: Transport>(transport: &mut T) {
    transport.release_scan_results();
}

const NO_NETWORKS: &str = " No networks found";
/// Characters in a row besides the SSID and encryption columns.
const ROW_FIXED: usize = 20;
const SSID_MIN: usize = 4;
const LABEL_MAX: usize = 9;

/// Widest SSID column that keeps a row within `max_width` characters.
fn ssid_column(result: &ScanResult, max_width: usize) -> usize {
    let longest = result
        .iter()
        .map(|ap| ap.ssid.chars().count())
        .max()
        .unwrap_or(0);
    let limit = max_width.saturating_sub(ROW_FIXED + LABEL_MAX).max(SSID_MIN);
    longest.clamp(SSID_MIN, limit)
}

fn fit(ssid: &str, width: usize) -> String {
    if ssid.chars().count() <= width {
        return ssid.to_string();
    }
    let mut cut: String = ssid.chars().take(width - 1).collect();
    cut.push('~');
    cut
}

/// The scan table, one line per entry in discovery order:
///
/// ```text
///  3 networks found at 14:55:02
///  Nr | SSID     |RSSI | CH | Encrypt
///  01 | home     | -48 | 6  | WPA2
/// ```
///
/// At most `max_lines` lines. When the entries don't fit, the last line
/// counts the ones left out (` +4 more`).
pub fn format_table(
    result: &ScanResult,
    stamp: &str,
    max_width: usize,
    max_lines: usize,
) -> String {
    if result.is_empty() {
        return NO_NETWORKS.to_string();
    }
    let col = ssid_column(result, max_width);
    let rows = if result.len() + 2 <= max_lines {
        result.len()
    } else {
        max_lines.saturating_sub(3)
    };

    let mut out = format!(" {} networks found at {}\n", result.len(), stamp);
    out.push_str(&format!(" Nr | {:<col$} |RSSI | CH | Encrypt\n", "SSID"));
    for (i, ap) in result.iter().take(rows).enumerate() {
        out.push_str(&format!(
            " {:02} | {:<col$} | {:>3} | {:<2} | {}\n",
            i + 1,
            fit(&ap.ssid, col),
            ap.rssi,
            ap.channel,
            ap.security.label(),
        ));
    }
    if rows < result.len() {
        out.push_str(&format!(" +{} more\n", result.len() - rows));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::{SimClock, SimTransport};
    use std::collections::HashSet;

    fn sample() -> Vec<AccessPoint> {
        vec![
            AccessPoint::new("home", -48, 6, Security::Wpa2),
            AccessPoint::new("Cafe Guest", -71, 11, Security::Open),
            AccessPoint::new("printer", -80, 1, Security::Unknown),
        ]
    }

    #[test]
    fn unknown_auth_modes_map_to_unknown() {
        assert_eq!(Security::from_auth_mode(3), Security::Wpa2);
        assert_eq!(Security::from_auth_mode(7).label(), "WPA2+WPA3");
        assert_eq!(Security::from_auth_mode(42), Security::Unknown);
        assert_eq!(Security::from_auth_mode(42).label(), "unknown");
    }

    #[test]
    fn table_keeps_discovery_order() {
        let result = ScanResult { entries: sample() };
        let table = format_table(&result, "14:55:02", 53, 19);
        let lines: Vec<&str> = table.lines().collect();

        assert_eq!(lines[0], " 3 networks found at 14:55:02");
        assert_eq!(lines[1], " Nr | SSID       |RSSI | CH | Encrypt");
        assert_eq!(lines[2], " 01 | home       | -48 | 6  | WPA2");
        assert_eq!(lines[3], " 02 | Cafe Guest | -71 | 11 | open");
        assert_eq!(lines[4], " 03 | printer    | -80 | 1  | unknown");
        assert_eq!(lines.len(), 5);
    }

    #[test]
    fn every_entry_appears_once() {
        let mut entries = sample();
        entries.push(AccessPoint::new("home", -90, 6, Security::Wpa2));
        let result = ScanResult { entries };
        let table = format_table(&result, "00:00:00", 53, 19);
        assert_eq!(table.matches(" home ").count(), 2);
        assert_eq!(table.lines().count(), 2 + result.len());
    }

    #[test]
    fn crowded_scan_is_cut_to_the_line_budget() {
        let entries: Vec<_> = (0..20)
            .map(|i| AccessPoint::new(&format!("ap{i}"), -60, 1, Security::Wpa2))
            .collect();
        let result = ScanResult { entries };

        let table = format_table(&result, "00:00:00", 53, 19);
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines.len(), 19);
        assert_eq!(lines[0], " 20 networks found at 00:00:00");
        assert!(lines[17].starts_with(" 16 | ap15 "));
        assert_eq!(lines[18], " +4 more");

        // Exactly filling the budget needs no summary line.
        let result = ScanResult { entries: result.entries[..17].to_vec() };
        let table = format_table(&result, "00:00:00", 53, 19);
        assert_eq!(table.lines().count(), 19);
        assert!(table.lines().last().unwrap().starts_with(" 17 | ap16 "));
    }

    #[test]
    fn long_names_are_cut_to_fit_the_row() {
        let result = ScanResult {
            entries: vec![AccessPoint::new(
                "an-extremely-long-network-name-for-a-panel",
                -60,
                3,
                Security::Wpa2Wpa3,
            )],
        };
        let table = format_table(&result, "00:00:00", 53, 19);
        let row = table.lines().nth(2).unwrap();
        assert!(row.chars().count() <= 53, "{row:?}");
        assert!(row.contains("~ |"));
    }

    #[test]
    fn empty_scan_renders_message() {
        let table = format_table(&ScanResult::default(), "12:00:00", 53, 19);
        assert_eq!(table, " No networks found");
    }

    #[test]
    fn failed_scan_is_empty_not_an_error() {
        let mut transport = SimTransport::new(SimClock::new(0)).failing_scans();
        assert!(scan(&mut transport).is_empty());
    }

    #[test]
    fn repeated_scans_see_the_same_networks() {
        let mut transport = SimTransport::new(SimClock::new(0)).with_networks(sample());
        let key = |r: &ScanResult| -> HashSet<(String, u8, Security)> {
            r.iter().map(|ap| (ap.ssid.clone(), ap.channel, ap.security)).collect()
        };

        let first = scan(&mut transport);
        release(&mut transport);
        let second = scan(&mut transport);
        release(&mut transport);

        assert_eq!(key(&first), key(&second));
        assert_eq!(transport.held_results, 0);
    }

    #[test]
    fn unreleased_results_accumulate() {
        let mut transport = SimTransport::new(SimClock::new(0)).with_networks(sample());
        scan(&mut transport);
        scan(&mut transport);
        assert_eq!(transport.held_results, 6);
        release(&mut transport);
        assert_eq!(transport.held_results, 0);
    }
}
