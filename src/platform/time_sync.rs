use anyhow::Result;
use esp_idf_svc::sntp::{EspSntp, OperatingMode, SntpConf, SyncMode, SyncStatus};
use log::{info, warn};
use std::thread;
use std::time::{Duration, SystemTime};

use crate::clock::{is_plausible, ClockSource, TimeFormat};

const SYNC_TIMEOUT_MS: u32 = 20_000;
const POLL_INTERVAL_MS: u32 = 250;

/// Start SNTP against `servers` (primary first) with the given POSIX
/// timezone rule.
///
/// Waits up to 20 seconds for the first sync, and only when `online`. Never
/// fails on an unreachable server: the clock then keeps whatever time it
/// booted with. The returned EspSntp must be kept alive.
pub fn sync_time(
    servers: [&'static str; 3],
    tz: &str,
    online: bool,
    clock: &ClockSource,
) -> Result<EspSntp<'static>> {
    info!("Setting timezone: {}", tz);
    std::env::set_var("TZ", tz);

    let conf = SntpConf {
        servers,
        sync_mode: SyncMode::Immediate,
        operating_mode: OperatingMode::Poll,
    };

    info!("Starting SNTP sync with {:?}", servers);
    let sntp = EspSntp::new_with_callback(&conf, |_| {
        info!("SNTP sync callback triggered");
    })?;

    if !online {
        warn!("SNTP: no link, continuing with the boot clock");
        return Ok(sntp);
    }

    let mut elapsed_ms = 0u32;
    while elapsed_ms < SYNC_TIMEOUT_MS {
        if sntp.get_sync_status() == SyncStatus::Completed {
            info!("SNTP time synchronized after {}ms", elapsed_ms);
            info!("Current local time: {}", clock.now_text(TimeFormat::Full));
            return Ok(sntp);
        }
        thread::sleep(Duration::from_millis(POLL_INTERVAL_MS as u64));
        elapsed_ms += POLL_INTERVAL_MS;
    }

    warn!(
        "SNTP sync not completed within {}s, continuing anyway (plausible clock: {})",
        SYNC_TIMEOUT_MS / 1000,
        is_plausible(SystemTime::now())
    );
    Ok(sntp)
}
