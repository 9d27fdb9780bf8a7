//! Simulated collaborators: a clock that advances instead of sleeping, a
//! scripted Wi-Fi transport, a surface that records what was drawn, and fixed
//! system statistics. Used by the tests and by the host build of the binary.

use embedded_graphics::pixelcolor::Rgb565;
use embedded_hal::delay::DelayNs;
use std::cell::Cell;
use std::rc::Rc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use crate::clock::WallClock;
use crate::connectivity::{LinkError, LinkStatus, Transport};
use crate::display::Surface;
use crate::layout::{SCREEN_H, SCREEN_W};
use crate::scanner::AccessPoint;
use crate::system::{ChipInfo, SystemStats};
use crate::timebase::Monotonic;

/// Wall-clock time at simulated t = 0: Fri 23 Aug 2024 11:55:02 UTC.
pub const SIM_EPOCH_SECS: u64 = 1_724_414_102;

/// Shared simulated time. Clones see the same clock; delays advance it.
#[derive(Debug, Clone, Default)]
pub struct SimClock {
    now_ns: Rc<Cell<u64>>,
}

impl SimClock {
    pub fn new(start_ms: u64) -> Self {
        Self {
            now_ns: Rc::new(Cell::new(start_ms * 1_000_000)),
        }
    }

    pub fn now_ms(&self) -> u64 {
        self.now_ns.get() / 1_000_000
    }

    pub fn advance_ms(&self, ms: u64) {
        self.now_ns.set(self.now_ns.get() + ms * 1_000_000);
    }
}

impl Monotonic for SimClock {
    fn now_ms(&self) -> u64 {
        SimClock::now_ms(self)
    }
}

impl DelayNs for SimClock {
    fn delay_ns(&mut self, ns: u32) {
        self.now_ns.set(self.now_ns.get() + u64::from(ns));
    }

    fn delay_ms(&mut self, ms: u32) {
        self.advance_ms(u64::from(ms));
    }
}

impl WallClock for SimClock {
    fn now(&self) -> SystemTime {
        UNIX_EPOCH + Duration::from_secs(SIM_EPOCH_SECS) + Duration::from_millis(self.now_ms())
    }
}

/// Scripted Wi-Fi station.
///
/// The link comes up `link_delay` after the association request, measured on
/// the shared [`SimClock`], and stays up until [`drop_link`](Self::drop_link).
pub struct SimTransport {
    clock: SimClock,
    networks: Vec<AccessPoint>,
    link_delay: Option<Duration>,
    associated_at: Option<u64>,
    dropped: bool,
    scan_fails: bool,
    reject_association: bool,
    pub rssi: i8,
    pub channel: u8,
    pub address: String,
    pub hostname: Option<String>,
    pub tx_power: Option<i8>,
    pub auto_reconnect: bool,
    pub disconnects: u32,
    pub associations: u32,
    pub scans: u32,
    pub releases: u32,
    /// Entries the driver still holds from scans that were not released.
    pub held_results: usize,
}

impl SimTransport {
    pub fn new(clock: SimClock) -> Self {
        Self {
            clock,
            networks: Vec::new(),
            link_delay: Some(Duration::ZERO),
            associated_at: None,
            dropped: false,
            scan_fails: false,
            reject_association: false,
            rssi: -58,
            channel: 6,
            address: "192.168.1.47".to_string(),
            hostname: None,
            tx_power: None,
            auto_reconnect: false,
            disconnects: 0,
            associations: 0,
            scans: 0,
            releases: 0,
            held_results: 0,
        }
    }

    pub fn link_after(mut self, delay: Duration) -> Self {
        self.link_delay = Some(delay);
        self
    }

    pub fn never_links(mut self) -> Self {
        self.link_delay = None;
        self
    }

    pub fn with_networks(mut self, networks: Vec<AccessPoint>) -> Self {
        self.networks = networks;
        self
    }

    pub fn failing_scans(mut self) -> Self {
        self.scan_fails = true;
        self
    }

    pub fn rejecting_association(mut self) -> Self {
        self.reject_association = true;
        self
    }

    /// The access point goes away.
    pub fn drop_link(&mut self) {
        self.dropped = true;
    }

    /// The access point is back; the link returns only if the driver was
    /// told to reconnect on its own.
    pub fn restore_link(&mut self) {
        if self.auto_reconnect {
            self.dropped = false;
        }
    }

    /// Change how the access point behaves for later association requests.
    pub fn set_link_delay(&mut self, delay: Option<Duration>) {
        self.link_delay = delay;
    }
}

impl Transport for SimTransport {
    fn set_hostname(&mut self, hostname: &str) -> Result<(), LinkError> {
        self.hostname = Some(hostname.to_string());
        Ok(())
    }

    fn set_tx_power(&mut self, dbm: i8) -> Result<(), LinkError> {
        self.tx_power = Some(dbm);
        Ok(())
    }

    fn begin_association(&mut self, _ssid: &str, _secret: &str) -> Result<(), LinkError> {
        if self.reject_association {
            return Err(LinkError::Transport("association rejected".into()));
        }
        self.associations += 1;
        self.associated_at = Some(self.clock.now_ms());
        self.dropped = false;
        Ok(())
    }

    fn disconnect(&mut self) -> Result<(), LinkError> {
        self.disconnects += 1;
        let was_associated = self.associated_at.take().is_some();
        if was_associated {
            Ok(())
        } else {
            Err(LinkError::Transport("not associated".into()))
        }
    }

    fn status(&self) -> LinkStatus {
        let Some(since) = self.associated_at else {
            return LinkStatus::NotConnected;
        };
        if self.dropped {
            return LinkStatus::NotConnected;
        }
        match self.link_delay {
            Some(delay) if self.clock.now_ms() - since >= delay.as_millis() as u64 => {
                LinkStatus::Connected
            }
            _ => LinkStatus::Connecting,
        }
    }

    fn rssi(&self) -> i8 {
        self.rssi
    }

    fn channel(&self) -> u8 {
        self.channel
    }

    fn local_address(&self) -> String {
        if self.status() == LinkStatus::Connected {
            self.address.clone()
        } else {
            "0.0.0.0".to_string()
        }
    }

    fn set_auto_reconnect(&mut self, enabled: bool) {
        self.auto_reconnect = enabled;
    }

    fn scan(&mut self) -> Result<Vec<AccessPoint>, LinkError> {
        self.scans += 1;
        if self.scan_fails {
            return Err(LinkError::Transport("scan timed out".into()));
        }
        self.held_results += self.networks.len();
        Ok(self.networks.clone())
    }

    fn release_scan_results(&mut self) {
        self.releases += 1;
        self.held_results = 0;
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SurfaceOp {
    Fill { x: i32, y: i32, w: u32, h: u32, color: Rgb565 },
    Cursor { x: i32, y: i32 },
    Text { size: u8, fg: Rgb565, bg: Rgb565 },
    Write(String),
}

/// Keeps every drawing call in order.
#[derive(Debug, Default)]
pub struct RecordingSurface {
    pub ops: Vec<SurfaceOp>,
}

impl RecordingSurface {
    pub fn new() -> Self {
        Self::default()
    }

    /// All text written so far, concatenated.
    pub fn written(&self) -> String {
        self.ops
            .iter()
            .filter_map(|op| match op {
                SurfaceOp::Write(text) => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn clear(&mut self) {
        self.ops.clear();
    }
}

impl Surface for RecordingSurface {
    fn width(&self) -> u32 {
        SCREEN_W
    }

    fn height(&self) -> u32 {
        SCREEN_H
    }

    fn fill_rect(&mut self, x: i32, y: i32, w: u32, h: u32, color: Rgb565) {
        self.ops.push(SurfaceOp::Fill { x, y, w, h, color });
    }

    fn set_cursor(&mut self, x: i32, y: i32) {
        self.ops.push(SurfaceOp::Cursor { x, y });
    }

    fn set_text(&mut self, size: u8, fg: Rgb565, bg: Rgb565) {
        self.ops.push(SurfaceOp::Text { size, fg, bg });
    }

    fn write(&mut self, text: &str) {
        self.ops.push(SurfaceOp::Write(text.to_string()));
    }
}

/// Plausible ESP32-WROOM numbers.
#[derive(Debug, Clone, Copy)]
pub struct FixedStats {
    pub free_heap: u32,
}

impl Default for FixedStats {
    fn default() -> Self {
        Self { free_heap: 187_432 }
    }
}

impl SystemStats for FixedStats {
    fn free_heap(&self) -> u32 {
        self.free_heap
    }

    fn chip_info(&self) -> ChipInfo {
        ChipInfo {
            model: "ESP32".to_string(),
            revision: 3,
            cores: 2,
            cpu_mhz: 240,
            flash_bytes: 4 * 1024 * 1024,
            free_heap: self.free_heap,
            free_dram: 182_020,
            total_dram: 301_472,
        }
    }
}
