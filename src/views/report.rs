use crate::display::Surface;
use crate::layout::*;
use crate::scheduler::RateSample;

pub fn report_line(sample: &RateSample, free_heap: u32) -> String {
    format!(
        "[Refresh rate: {:.1} avg]  [Free heap:{:.1} kB]",
        sample.per_second(),
        free_heap as f32 * 0.001
    )
}

/// Repaints the status band, then writes the rate line under the link line.
/// The link line comes back with the next refresh.
pub fn draw<S: Surface>(surface: &mut S, sample: &RateSample, free_heap: u32) {
    let w = surface.width();
    surface.fill_rect(0, STATUS_Y, w, STATUS_H, NAVY);
    surface.set_cursor(REPORT_LINE_X, REPORT_LINE_Y);
    surface.set_text(1, DARKCYAN, NAVY);
    surface.write(&report_line(sample, free_heap));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::{RecordingSurface, SurfaceOp};

    #[test]
    fn rate_and_heap_are_reported() {
        let sample = RateSample { fires: 40, window_ms: 10_000 };
        assert_eq!(
            report_line(&sample, 187_432),
            "[Refresh rate: 4.0 avg]  [Free heap:187.4 kB]"
        );
    }

    #[test]
    fn status_band_is_cleared_first() {
        let mut surface = RecordingSurface::new();
        draw(&mut surface, &RateSample { fires: 0, window_ms: 0 }, 1_000);
        assert_eq!(
            surface.ops[0],
            SurfaceOp::Fill { x: 0, y: 220, w: 320, h: 20, color: NAVY }
        );
        assert_eq!(surface.ops[1], SurfaceOp::Cursor { x: 18, y: 230 });
        assert_eq!(surface.written(), "[Refresh rate: 0.0 avg]  [Free heap:1.0 kB]");
    }
}
