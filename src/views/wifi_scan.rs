use crate::display::Surface;
use crate::layout::*;
use crate::scanner::{format_table, ScanResult};

/// Clears the scan area and writes the table from its top-left corner. The
/// table is cut to the rows that fit above the status band.
pub fn draw<S: Surface>(surface: &mut S, result: &ScanResult, stamp: &str, max_width: usize) {
    let w = surface.width();
    surface.fill_rect(0, SCAN_Y, w, SCAN_H, NAVY);
    surface.set_text(1, DARKCYAN, NAVY);
    surface.set_cursor(0, SCAN_Y);
    surface.write(&format_table(result, stamp, max_width, SCAN_LINES));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::display::TextCanvas;
    use crate::scanner::{AccessPoint, Security};
    use crate::sim::{RecordingSurface, SurfaceOp};
    use core::convert::Infallible;
    use embedded_graphics::{pixelcolor::Rgb565, prelude::*};

    /// Full-size panel that only remembers the rows it was asked to paint.
    struct RowExtent {
        lowest: i32,
        highest: i32,
    }

    impl OriginDimensions for RowExtent {
        fn size(&self) -> Size {
            Size::new(SCREEN_W, SCREEN_H)
        }
    }

    impl DrawTarget for RowExtent {
        type Color = Rgb565;
        type Error = Infallible;

        fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
        where
            I: IntoIterator<Item = Pixel<Self::Color>>,
        {
            for Pixel(point, _) in pixels {
                self.lowest = self.lowest.min(point.y);
                self.highest = self.highest.max(point.y);
            }
            Ok(())
        }
    }

    fn crowded(count: usize) -> ScanResult {
        ScanResult {
            entries: (0..count)
                .map(|i| AccessPoint::new(&format!("net-{i:02}"), -70, 6, Security::Wpa2))
                .collect(),
        }
    }

    #[test]
    fn empty_scan_shows_message() {
        let mut surface = RecordingSurface::new();
        draw(&mut surface, &ScanResult::default(), "12:00:00", 53);
        assert_eq!(
            surface.ops[0],
            SurfaceOp::Fill { x: 0, y: 21, w: 320, h: 198, color: NAVY }
        );
        assert_eq!(surface.written(), " No networks found");
    }

    #[test]
    fn table_is_written_below_header() {
        let result = ScanResult {
            entries: vec![AccessPoint::new("home", -48, 6, Security::Wpa2)],
        };
        let mut surface = RecordingSurface::new();
        draw(&mut surface, &result, "14:55:02", 53);
        assert!(surface.ops.contains(&SurfaceOp::Cursor { x: 0, y: 21 }));
        assert!(surface.written().contains(" 01 | home | -48 | 6  | WPA2"));
    }

    #[test]
    fn crowded_table_stays_out_of_the_status_band() {
        let mut canvas = TextCanvas::new(RowExtent {
            lowest: i32::MAX,
            highest: i32::MIN,
        });
        draw(&mut canvas, &crowded(20), "14:55:02", 53);

        assert_eq!(canvas.target().lowest, SCAN_Y);
        assert!(canvas.target().highest < STATUS_Y, "{}", canvas.target().highest);
        assert!(canvas.cursor().y <= STATUS_Y);

        let mut surface = RecordingSurface::new();
        draw(&mut surface, &crowded(20), "14:55:02", 53);
        let text = surface.written();
        assert_eq!(text.lines().count(), SCAN_LINES);
        assert!(text.ends_with(" +4 more\n"));
    }
}
