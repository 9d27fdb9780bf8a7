//! Panel geometry and colours. The ILI9341 is driven in landscape.

use embedded_graphics::pixelcolor::Rgb565;

/// Convert 8-bit RGB to Rgb565.
pub const fn rgb(r: u8, g: u8, b: u8) -> Rgb565 {
    Rgb565::new(r >> 3, g >> 2, b >> 3)
}

// ── Colors (ILI9341 palette) ────────────────────────────────────────

pub const BLACK: Rgb565 = rgb(0, 0, 0);
/// Header and status bands, scan area
pub const NAVY: Rgb565 = rgb(0, 0, 123);
/// Boot summary text
pub const DARKGREY: Rgb565 = rgb(123, 125, 123);
/// Clock, status and scan text
pub const DARKCYAN: Rgb565 = rgb(0, 125, 123);

// ── Layout constants ────────────────────────────────────────────────

pub const SCREEN_W: u32 = 320;
pub const SCREEN_H: u32 = 240;

pub const HEADER_Y: i32 = 0;
pub const HEADER_H: u32 = 20;

pub const STATUS_Y: i32 = 220;
pub const STATUS_H: u32 = 20;

/// Between the two bands, one pixel clear of each.
pub const SCAN_Y: i32 = 21;
pub const SCAN_H: u32 = 198;
/// Size-1 text rows that fit in the scan area (10 px each).
pub const SCAN_LINES: usize = (SCAN_H / 10) as usize;

/// Boot summary starts below the header.
pub const BOOT_TEXT_Y: i32 = 48;

pub const CLOCK_X: i32 = 16;
pub const CLOCK_Y: i32 = 3;

pub const LINK_LINE_X: i32 = 18;
pub const LINK_LINE_Y: i32 = 220;
pub const REPORT_LINE_X: i32 = 18;
pub const REPORT_LINE_Y: i32 = 230;
/// Size-1 cells between the link line's left margin and the right edge.
pub const LINK_LINE_CHARS: usize = 50;
