use crate::display::Surface;
use crate::layout::*;
use crate::system::ChipInfo;

/// Black screen with the two navy bands and the chip summary.
pub fn draw<S: Surface>(surface: &mut S, info: &ChipInfo) {
    let w = surface.width();
    surface.fill_screen(BLACK);
    surface.fill_rect(0, HEADER_Y, w, HEADER_H, NAVY);
    surface.fill_rect(0, STATUS_Y, w, STATUS_H, NAVY);

    surface.set_cursor(0, BOOT_TEXT_Y);
    surface.set_text(2, DARKGREY, BLACK);
    for line in info.lines() {
        surface.write(&line);
        surface.write("\n");
    }
}
