//! Text-terminal style drawing on top of embedded-graphics.
//!
//! Views talk to a [`Surface`]: a cursor, a text size with foreground and
//! background colour, and rectangle fills. [`TextCanvas`] provides that over
//! any `DrawTarget<Color = Rgb565>`, so the same views draw to the ILI9341,
//! to a `MockDisplay` in tests, or to a recorder in the simulator.

use embedded_graphics::{
    mono_font::{ascii::FONT_6X10, MonoFont, MonoTextStyleBuilder},
    pixelcolor::Rgb565,
    prelude::*,
    primitives::{PrimitiveStyle, Rectangle},
    text::{Baseline, Text},
};
use profont::{PROFONT_12_POINT, PROFONT_18_POINT};

pub trait Surface {
    fn width(&self) -> u32;

    fn height(&self) -> u32;

    fn fill_rect(&mut self, x: i32, y: i32, w: u32, h: u32, color: Rgb565);

    fn fill_screen(&mut self, color: Rgb565) {
        let (w, h) = (self.width(), self.height());
        self.fill_rect(0, 0, w, h, color);
    }

    fn set_cursor(&mut self, x: i32, y: i32);

    /// Size 1 is the smallest font; glyph cells are painted with `bg`.
    fn set_text(&mut self, size: u8, fg: Rgb565, bg: Rgb565);

    /// Write at the cursor. `\n` starts a new line at x = 0; text that would
    /// run past the right edge wraps.
    fn write(&mut self, text: &str);
}

fn font_for(size: u8) -> &'static MonoFont<'static> {
    match size {
        0 | 1 => &FONT_6X10,
        2 => &PROFONT_12_POINT,
        _ => &PROFONT_18_POINT,
    }
}

pub struct TextCanvas<D> {
    target: D,
    cursor: Point,
    font: &'static MonoFont<'static>,
    fg: Rgb565,
    bg: Rgb565,
}

impl<D> TextCanvas<D>
where
    D: DrawTarget<Color = Rgb565>,
{
    pub fn new(target: D) -> Self {
        Self {
            target,
            cursor: Point::zero(),
            font: &FONT_6X10,
            fg: Rgb565::WHITE,
            bg: Rgb565::BLACK,
        }
    }

    pub fn cursor(&self) -> Point {
        self.cursor
    }

    pub fn target(&self) -> &D {
        &self.target
    }

    fn advance(&self) -> i32 {
        (self.font.character_size.width + self.font.character_spacing) as i32
    }

    fn line_height(&self) -> i32 {
        self.font.character_size.height as i32
    }

    fn new_line(&mut self) {
        self.cursor.x = 0;
        self.cursor.y += self.line_height();
    }
}

impl<D> Surface for TextCanvas<D>
where
    D: DrawTarget<Color = Rgb565>,
{
    fn width(&self) -> u32 {
        self.target.bounding_box().size.width
    }

    fn height(&self) -> u32 {
        self.target.bounding_box().size.height
    }

    fn fill_rect(&mut self, x: i32, y: i32, w: u32, h: u32, color: Rgb565) {
        Rectangle::new(Point::new(x, y), Size::new(w, h))
            .into_styled(PrimitiveStyle::with_fill(color))
            .draw(&mut self.target)
            .ok();
    }

    fn set_cursor(&mut self, x: i32, y: i32) {
        self.cursor = Point::new(x, y);
    }

    fn set_text(&mut self, size: u8, fg: Rgb565, bg: Rgb565) {
        self.font = font_for(size);
        self.fg = fg;
        self.bg = bg;
    }

    fn write(&mut self, text: &str) {
        let style = MonoTextStyleBuilder::new()
            .font(self.font)
            .text_color(self.fg)
            .background_color(self.bg)
            .build();
        let right = self.width() as i32;
        let advance = self.advance();
        let mut glyph = [0u8; 4];

        for ch in text.chars() {
            match ch {
                '\n' => self.new_line(),
                '\r' => {}
                _ => {
                    if self.cursor.x + advance > right {
                        self.new_line();
                    }
                    let cell = ch.encode_utf8(&mut glyph);
                    Text::with_baseline(cell, self.cursor, style, Baseline::Top)
                        .draw(&mut self.target)
                        .ok();
                    self.cursor.x += advance;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_graphics::mock_display::MockDisplay;

    fn canvas() -> TextCanvas<MockDisplay<Rgb565>> {
        let mut display = MockDisplay::new();
        display.set_allow_overdraw(true);
        display.set_allow_out_of_bounds_drawing(true);
        TextCanvas::new(display)
    }

    #[test]
    fn fill_rect_paints_pixels() {
        let mut c = canvas();
        c.fill_rect(2, 3, 4, 5, Rgb565::RED);
        assert_eq!(c.target().get_pixel(Point::new(2, 3)), Some(Rgb565::RED));
        assert_eq!(c.target().get_pixel(Point::new(5, 7)), Some(Rgb565::RED));
        assert_eq!(c.target().get_pixel(Point::new(6, 7)), None);
    }

    #[test]
    fn glyph_cell_is_painted_with_background() {
        let mut c = canvas();
        c.set_text(1, Rgb565::WHITE, Rgb565::BLUE);
        c.write("A");
        assert_eq!(
            c.target().affected_area(),
            Rectangle::new(Point::zero(), Size::new(6, 10))
        );
        assert_eq!(c.cursor(), Point::new(6, 0));
    }

    #[test]
    fn newline_returns_to_left_edge() {
        let mut c = canvas();
        c.set_cursor(18, 4);
        c.write("ab\nc");
        assert_eq!(c.cursor(), Point::new(6, 14));
    }

    #[test]
    fn long_text_wraps_at_right_edge() {
        let mut c = canvas();
        // 64 px wide mock: ten 6 px cells fit on a line.
        c.write("0123456789X");
        assert_eq!(c.cursor(), Point::new(6, 10));
    }

    #[test]
    fn larger_sizes_use_larger_cells() {
        let mut c = canvas();
        c.write("a");
        let small = c.cursor().x;
        c.set_cursor(0, 0);
        c.set_text(2, Rgb565::WHITE, Rgb565::BLACK);
        c.write("a");
        assert!(c.cursor().x > small);
    }
}
