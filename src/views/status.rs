use crate::connectivity::LinkReport;
use crate::display::Surface;
use crate::layout::*;

/// Link line text: `WiFi: <ssid> <address> chan:<n> <rssi>dBm`.
pub fn link_line(ssid: &str, link: Option<&LinkReport>) -> String {
    match link {
        Some(r) => format!("WiFi: {} {} chan:{} {}dBm", r.ssid, r.address, r.channel, r.rssi),
        None => format!("WiFi: {} not connected", ssid),
    }
}

/// Link line at the top of the status band.
pub fn draw<S: Surface>(surface: &mut S, ssid: &str, link: Option<&LinkReport>, width: usize) {
    surface.set_cursor(LINK_LINE_X, LINK_LINE_Y);
    surface.set_text(1, DARKCYAN, NAVY);
    surface.write(&super::padded(&link_line(ssid, link), width));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::RecordingSurface;

    fn report() -> LinkReport {
        LinkReport {
            ssid: "home".into(),
            rssi: -58,
            channel: 6,
            address: "192.168.1.47".into(),
        }
    }

    #[test]
    fn connected_line_names_link_details() {
        assert_eq!(
            link_line("home", Some(&report())),
            "WiFi: home 192.168.1.47 chan:6 -58dBm"
        );
    }

    #[test]
    fn down_link_is_reported_as_such() {
        assert_eq!(link_line("home", None), "WiFi: home not connected");
    }

    #[test]
    fn long_ssid_is_cut_to_one_line() {
        let ssid = "a-network-name-long-enough-to-wrap-the-status-band";
        let mut surface = RecordingSurface::new();
        draw(&mut surface, ssid, None, LINK_LINE_CHARS);

        let text = surface.written();
        assert_eq!(text.chars().count(), LINK_LINE_CHARS);
        assert!(text.starts_with("WiFi: a-network-name"));
        // Still ends inside the right edge, so the report line below is safe.
        assert!(LINK_LINE_X as usize + 6 * LINK_LINE_CHARS <= SCREEN_W as usize);
    }

    #[test]
    fn line_is_padded_to_cover_previous_text() {
        let mut surface = RecordingSurface::new();
        draw(&mut surface, "home", None, 48);
        assert_eq!(surface.written().len(), 48);
        assert!(surface.written().starts_with("WiFi: home not connected "));
    }
}
