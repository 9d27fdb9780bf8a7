use anyhow::Result;

#[cfg(target_os = "espidf")]
fn main() -> Result<()> {
    use clock_panel::app::{self, App};
    use clock_panel::clock::ClockSource;
    use clock_panel::config::Config;
    use clock_panel::connectivity::ConnectivityManager;
    use clock_panel::display::TextCanvas;
    use clock_panel::platform::{
        self, panel, system::EspStats, time_sync, wifi::EspTransport, EspClock,
    };
    use esp_idf_hal::delay::FreeRtos;
    use esp_idf_hal::peripherals::Peripherals;
    use esp_idf_svc::eventloop::EspSystemEventLoop;
    use esp_idf_svc::nvs::EspDefaultNvsPartition;
    use log::{info, warn};

    esp_idf_sys::link_patches();
    esp_idf_svc::log::EspLogger::initialize_default();
    info!("Clock panel starting");

    let config = Config::from_build_env();
    let mut delay = FreeRtos;

    // ── 1. Wi-Fi station ──
    let peripherals = Peripherals::take()?;
    let sysloop = EspSystemEventLoop::take()?;
    let nvs = EspDefaultNvsPartition::take()?;
    let transport = EspTransport::new(peripherals.modem, sysloop, Some(nvs))?;
    let clock = ClockSource::new(config.utc_offset());

    let mut link = ConnectivityManager::new(transport);
    let online = match link.connect(&config.credentials(), &config.retry_policy(), &mut delay) {
        Ok(_) => true,
        Err(e) => {
            warn!("{}; continuing without network", e);
            false
        }
    };

    // ── 2. Time ──
    let _sntp = match time_sync::sync_time(config.ntp_servers, &config.timezone, online, &clock) {
        Ok(sntp) => Some(sntp),
        Err(e) => {
            warn!("SNTP unavailable: {:#}", e);
            None
        }
    };

    // ── 3. Display ──
    panel::enable_backlight()?;
    let surface = TextCanvas::new(panel::Ili9341::new()?);
    FreeRtos::delay_ms(250);

    // ── 4. Boot screen ──
    let mut app = App::new(link, clock, surface, Box::new(EspStats), config);
    app.boot(&mut delay);
    if let Err(e) = platform::rgb_led_off() {
        warn!("RGB LED: {:#}", e);
    }

    // ── 5. Main loop ──
    let mut scheduler = app.scheduler();
    app::run(&mut app, &mut scheduler, &EspClock, &mut delay)
}

/// Host build: run the panel for a while against the simulated board and
/// print what ended up on screen.
#[cfg(not(target_os = "espidf"))]
fn main() -> Result<()> {
    use clock_panel::app::{self, App};
    use clock_panel::clock::ClockSource;
    use clock_panel::config::Config;
    use clock_panel::connectivity::ConnectivityManager;
    use clock_panel::scanner::{AccessPoint, Security};
    use clock_panel::sim::{FixedStats, RecordingSurface, SimClock, SimTransport};
    use std::time::Duration;

    /// Just past the first scan.
    const DEMO_SPAN_MS: u64 = 300_100;
    const LAST_FRAME_MS: u64 = 1_000;

    let config = Config::from_build_env();
    let clock = SimClock::new(0);
    let transport = SimTransport::new(clock.clone())
        .link_after(Duration::from_millis(1_300))
        .with_networks(vec![
            AccessPoint::new(&config.wifi_ssid, -52, 6, Security::Wpa2),
            AccessPoint::new("Neighbour 5G", -77, 36, Security::Wpa2Wpa3),
            AccessPoint::new("guest", -81, 11, Security::Open),
        ]);

    let mut link = ConnectivityManager::new(transport);
    let mut delay = clock.clone();
    match link.connect(&config.credentials(), &config.retry_policy(), &mut delay) {
        Ok(report) => println!(
            "connected to {} ({} dBm, ch {}) as {} after {} ms",
            report.ssid,
            report.rssi,
            report.channel,
            report.address,
            clock.now_ms()
        ),
        Err(e) => println!("{}", e),
    }

    let wall = ClockSource::with_source(config.utc_offset(), clock.clone());
    let stats = Box::new(FixedStats::default());
    let mut app = App::new(link, wall, RecordingSurface::new(), stats, config);
    app.boot(&mut delay);

    let mut scheduler = app.scheduler();
    let mut fired =
        app::poll_until(&mut app, &mut scheduler, &clock, &mut delay, DEMO_SPAN_MS - LAST_FRAME_MS);
    // Keep only what the last stretch drew.
    app.surface.clear();
    fired += app::poll_until(&mut app, &mut scheduler, &clock, &mut delay, DEMO_SPAN_MS);
    println!("{} actions fired in {} ms of simulated time", fired, clock.now_ms());
    if let Some(sample) = app.last_sample() {
        println!("refresh rate {:.1}/s", sample.per_second());
    }
    println!("--- last {} ms of screen text ---", LAST_FRAME_MS);
    println!("{}", app.surface.written());
    Ok(())
}
