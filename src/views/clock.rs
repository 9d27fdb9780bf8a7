use crate::clock::{ClockSource, TimeFormat};
use crate::display::Surface;
use crate::layout::*;

/// Full local timestamp in the header band.
pub fn draw<S: Surface>(surface: &mut S, clock: &ClockSource) {
    surface.set_cursor(CLOCK_X, CLOCK_Y);
    surface.set_text(2, DARKCYAN, NAVY);
    surface.write(&clock.now_text(TimeFormat::Full));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::{RecordingSurface, SimClock, SurfaceOp};
    use chrono::FixedOffset;

    #[test]
    fn header_shows_full_timestamp() {
        let sim = SimClock::new(0);
        let clock = ClockSource::with_source(FixedOffset::east_opt(3 * 3600).unwrap(), sim);
        let mut surface = RecordingSurface::new();

        draw(&mut surface, &clock);

        assert_eq!(surface.ops[0], SurfaceOp::Cursor { x: 16, y: 3 });
        assert_eq!(surface.written(), "Fri Aug 23 14:55:02 2024");
    }
}
