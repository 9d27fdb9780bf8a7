use anyhow::Result;
use esp_idf_hal::modem::Modem;
use esp_idf_svc::eventloop::{EspSubscription, EspSystemEventLoop, System};
use esp_idf_svc::nvs::EspDefaultNvsPartition;
use esp_idf_svc::wifi::{AuthMethod, ClientConfiguration, Configuration, EspWifi, WifiEvent};
use log::{info, warn};

use crate::connectivity::{LinkError, LinkStatus, Transport};
use crate::scanner::{AccessPoint, Security};

fn link_err(op: &str, e: impl core::fmt::Display) -> LinkError {
    LinkError::Transport(format!("{}: {}", op, e))
}

fn security(auth: Option<AuthMethod>) -> Security {
    match auth {
        Some(AuthMethod::None) => Security::Open,
        Some(AuthMethod::WEP) => Security::Wep,
        Some(AuthMethod::WPA) => Security::Wpa,
        Some(AuthMethod::WPA2Personal) => Security::Wpa2,
        Some(AuthMethod::WPAWPA2Personal) => Security::WpaWpa2,
        Some(AuthMethod::WPA2Enterprise) => Security::Wpa2Enterprise,
        Some(AuthMethod::WPA3Personal) => Security::Wpa3,
        Some(AuthMethod::WPA2WPA3Personal) => Security::Wpa2Wpa3,
        Some(AuthMethod::WAPIPersonal) => Security::Wapi,
        _ => Security::Unknown,
    }
}

/// AP record of the current association, if any.
fn ap_info() -> Option<esp_idf_sys::wifi_ap_record_t> {
    let mut ap_info: esp_idf_sys::wifi_ap_record_t = unsafe { core::mem::zeroed() };
    let rc = unsafe { esp_idf_sys::esp_wifi_sta_get_ap_info(&mut ap_info) };
    (rc == esp_idf_sys::ESP_OK).then_some(ap_info)
}

/// The ESP-IDF station driver.
///
/// `begin_association` only issues the request; the link state is read back
/// from the driver on every `status()` call.
pub struct EspTransport {
    wifi: Box<EspWifi<'static>>,
    sysloop: EspSystemEventLoop,
    reconnect: Option<EspSubscription<'static, System>>,
}

impl EspTransport {
    /// Bring up the radio in station mode without associating.
    pub fn new(
        modem: Modem,
        sysloop: EspSystemEventLoop,
        nvs: Option<EspDefaultNvsPartition>,
    ) -> Result<Self> {
        let mut wifi = EspWifi::new(modem, sysloop.clone(), nvs)?;
        wifi.set_configuration(&Configuration::Client(ClientConfiguration::default()))?;
        wifi.start()?;
        info!("WiFi station started");
        Ok(Self {
            wifi: Box::new(wifi),
            sysloop,
            reconnect: None,
        })
    }
}

impl Transport for EspTransport {
    fn set_hostname(&mut self, hostname: &str) -> Result<(), LinkError> {
        self.wifi
            .sta_netif_mut()
            .set_hostname(hostname)
            .map_err(|e| link_err("set_hostname", e))
    }

    fn set_tx_power(&mut self, dbm: i8) -> Result<(), LinkError> {
        // The driver takes quarter-dBm units.
        let quarter = dbm.saturating_mul(4);
        let rc = unsafe { esp_idf_sys::esp_wifi_set_max_tx_power(quarter) };
        if rc != esp_idf_sys::ESP_OK {
            return Err(link_err("esp_wifi_set_max_tx_power", rc));
        }
        Ok(())
    }

    fn begin_association(&mut self, ssid: &str, secret: &str) -> Result<(), LinkError> {
        let auth = if secret.is_empty() {
            AuthMethod::None
        } else {
            AuthMethod::WPA2Personal
        };

        let mut wifi_ssid = heapless::String::<32>::new();
        let mut wifi_pass = heapless::String::<64>::new();
        wifi_ssid
            .push_str(ssid)
            .map_err(|_| link_err("ssid", "longer than 32 bytes"))?;
        wifi_pass
            .push_str(secret)
            .map_err(|_| link_err("password", "longer than 64 bytes"))?;

        self.wifi
            .set_configuration(&Configuration::Client(ClientConfiguration {
                ssid: wifi_ssid,
                password: wifi_pass,
                auth_method: auth,
                ..Default::default()
            }))
            .map_err(|e| link_err("set_configuration", e))?;
        self.wifi.connect().map_err(|e| link_err("connect", e))
    }

    fn disconnect(&mut self) -> Result<(), LinkError> {
        // An explicit teardown must not be undone by the reconnect handler.
        self.reconnect = None;
        self.wifi.disconnect().map_err(|e| link_err("disconnect", e))
    }

    fn status(&self) -> LinkStatus {
        let associated = self.wifi.is_connected().unwrap_or(false);
        let has_address = self.wifi.is_up().unwrap_or(false);
        match (associated, has_address) {
            (true, true) => LinkStatus::Connected,
            (true, false) => LinkStatus::Connecting,
            _ => LinkStatus::NotConnected,
        }
    }

    fn rssi(&self) -> i8 {
        ap_info().map_or(0, |ap| ap.rssi)
    }

    fn channel(&self) -> u8 {
        ap_info().map_or(0, |ap| ap.primary)
    }

    fn local_address(&self) -> String {
        match self.wifi.sta_netif().get_ip_info() {
            Ok(ip_info) => ip_info.ip.to_string(),
            Err(e) => {
                warn!("WiFi: no ip info: {}", e);
                "0.0.0.0".to_string()
            }
        }
    }

    fn set_auto_reconnect(&mut self, enabled: bool) {
        if !enabled {
            self.reconnect = None;
            return;
        }
        if self.reconnect.is_some() {
            return;
        }
        let subscription = self.sysloop.subscribe::<WifiEvent, _>(|event| {
            if matches!(event, WifiEvent::StaDisconnected { .. }) {
                info!("WiFi dropped, reassociating");
                let rc = unsafe { esp_idf_sys::esp_wifi_connect() };
                if rc != esp_idf_sys::ESP_OK {
                    warn!("esp_wifi_connect failed (err {})", rc);
                }
            }
        });
        match subscription {
            Ok(s) => self.reconnect = Some(s),
            Err(e) => warn!("WiFi: auto-reconnect not available: {}", e),
        }
    }

    fn scan(&mut self) -> Result<Vec<AccessPoint>, LinkError> {
        info!("WiFi scanning for nearby networks...");
        let aps = self.wifi.scan().map_err(|e| link_err("scan", e))?;
        Ok(aps
            .iter()
            .map(|ap| {
                AccessPoint::new(
                    ap.ssid.as_str(),
                    ap.signal_strength,
                    ap.channel,
                    security(ap.auth_method),
                )
            })
            .collect())
    }

    fn release_scan_results(&mut self) {
        let rc = unsafe { esp_idf_sys::esp_wifi_clear_ap_list() };
        if rc != esp_idf_sys::ESP_OK {
            warn!("esp_wifi_clear_ap_list failed (err {})", rc);
        }
    }
}
