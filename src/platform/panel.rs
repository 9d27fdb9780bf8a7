//! ILI9341 over SPI through `esp_lcd`.
//!
//! There is no room for a full frame in DRAM, so drawing goes straight to the
//! panel. Fills and glyph cells are streamed in row chunks through two DMA
//! buffers used in turn; a chunk is only refilled once the transfer that last
//! used it has completed.

use anyhow::Result;
use core::ffi::c_void;
use core::sync::atomic::{AtomicU32, Ordering};
use embedded_graphics::{
    draw_target::DrawTarget,
    geometry::{OriginDimensions, Size},
    pixelcolor::{raw::RawU16, Rgb565},
    prelude::*,
    primitives::Rectangle,
    Pixel,
};
use log::info;

use super::{esp_check, output_pin};
use crate::layout::{SCREEN_H, SCREEN_W};

const PCLK_HZ: u32 = 40_000_000;

// ── Pins (ESP32-2432S024) ───────────────────────────────────────────
const PIN_LCD_CS: i32 = 15;
const PIN_LCD_DC: i32 = 2;
const PIN_LCD_MOSI: i32 = 13;
const PIN_LCD_MISO: i32 = 12;
const PIN_LCD_SCLK: i32 = 14;
const PIN_LCD_RST: i32 = -1;
const PIN_LCD_BL: i32 = 27;

/// Panel rows per DMA chunk.
const CHUNK_LINES: usize = 20;
const CHUNK_PIXELS: usize = SCREEN_W as usize * CHUNK_LINES;

/// Completed colour transfers, bumped from the SPI done callback.
static COLOR_DONE: AtomicU32 = AtomicU32::new(0);

unsafe extern "C" fn on_color_done(
    _io: esp_idf_sys::esp_lcd_panel_io_handle_t,
    _edata: *mut esp_idf_sys::esp_lcd_panel_io_event_data_t,
    _ctx: *mut c_void,
) -> bool {
    COLOR_DONE.fetch_add(1, Ordering::Release);
    false
}

pub fn enable_backlight() -> Result<()> {
    output_pin(PIN_LCD_BL, 1)?;
    info!("Backlight ON");
    Ok(())
}

pub struct Ili9341 {
    panel: esp_idf_sys::esp_lcd_panel_handle_t,
    bufs: [*mut u8; 2],
    next_buf: usize,
    submitted: u32,
}

impl Ili9341 {
    pub fn new() -> Result<Self> {
        let mut bus_cfg = esp_idf_sys::spi_bus_config_t::default();
        bus_cfg.__bindgen_anon_1.mosi_io_num = PIN_LCD_MOSI;
        bus_cfg.__bindgen_anon_2.miso_io_num = PIN_LCD_MISO;
        bus_cfg.__bindgen_anon_3.quadwp_io_num = -1;
        bus_cfg.__bindgen_anon_4.quadhd_io_num = -1;
        bus_cfg.sclk_io_num = PIN_LCD_SCLK;
        bus_cfg.max_transfer_sz = (CHUNK_PIXELS * 2) as i32;

        let host = esp_idf_sys::spi_host_device_t_SPI2_HOST;
        esp_check(
            unsafe {
                esp_idf_sys::spi_bus_initialize(
                    host,
                    &bus_cfg,
                    esp_idf_sys::spi_common_dma_t_SPI_DMA_CH_AUTO,
                )
            },
            "spi_bus_initialize",
        )?;

        let mut io: esp_idf_sys::esp_lcd_panel_io_handle_t = std::ptr::null_mut();
        let mut io_cfg = esp_idf_sys::esp_lcd_panel_io_spi_config_t::default();
        io_cfg.cs_gpio_num = PIN_LCD_CS;
        io_cfg.dc_gpio_num = PIN_LCD_DC;
        io_cfg.spi_mode = 0;
        io_cfg.pclk_hz = PCLK_HZ;
        io_cfg.trans_queue_depth = 10;
        io_cfg.on_color_trans_done = Some(on_color_done);
        io_cfg.lcd_cmd_bits = 8;
        io_cfg.lcd_param_bits = 8;
        esp_check(
            unsafe {
                esp_idf_sys::esp_lcd_new_panel_io_spi(
                    host as esp_idf_sys::esp_lcd_spi_bus_handle_t,
                    &io_cfg,
                    &mut io,
                )
            },
            "esp_lcd_new_panel_io_spi",
        )?;

        // The ILI9341 understands the ST7789 command set used here.
        let mut panel: esp_idf_sys::esp_lcd_panel_handle_t = std::ptr::null_mut();
        let mut panel_cfg = esp_idf_sys::esp_lcd_panel_dev_config_t::default();
        panel_cfg.reset_gpio_num = PIN_LCD_RST;
        panel_cfg.__bindgen_anon_1.rgb_ele_order =
            esp_idf_sys::lcd_rgb_element_order_t_LCD_RGB_ELEMENT_ORDER_BGR;
        panel_cfg.bits_per_pixel = 16;
        esp_check(
            unsafe { esp_idf_sys::esp_lcd_new_panel_st7789(io, &panel_cfg, &mut panel) },
            "esp_lcd_new_panel_st7789",
        )?;

        esp_check(unsafe { esp_idf_sys::esp_lcd_panel_reset(panel) }, "panel_reset")?;
        esp_check(unsafe { esp_idf_sys::esp_lcd_panel_init(panel) }, "panel_init")?;
        esp_check(
            unsafe { esp_idf_sys::esp_lcd_panel_invert_color(panel, false) },
            "invert_color",
        )?;
        // Landscape, connector on the right.
        esp_check(unsafe { esp_idf_sys::esp_lcd_panel_swap_xy(panel, true) }, "swap_xy")?;
        esp_check(unsafe { esp_idf_sys::esp_lcd_panel_mirror(panel, false, false) }, "mirror")?;
        esp_check(unsafe { esp_idf_sys::esp_lcd_panel_disp_on_off(panel, true) }, "disp_on")?;

        let mut bufs = [std::ptr::null_mut(); 2];
        for buf in bufs.iter_mut() {
            *buf = unsafe {
                esp_idf_sys::heap_caps_malloc(
                    CHUNK_PIXELS * 2,
                    esp_idf_sys::MALLOC_CAP_DMA | esp_idf_sys::MALLOC_CAP_INTERNAL,
                ) as *mut u8
            };
            if buf.is_null() {
                anyhow::bail!("DMA buffer alloc failed ({} bytes)", CHUNK_PIXELS * 2);
            }
        }

        info!("Display initialized OK");
        Ok(Self {
            panel,
            bufs,
            next_buf: 0,
            submitted: 0,
        })
    }

    /// Next free chunk buffer. Waits until at most one transfer is in flight,
    /// which is the one using the other buffer.
    fn take_buf(&mut self) -> &mut [u8] {
        while self.submitted.wrapping_sub(COLOR_DONE.load(Ordering::Acquire)) > 1 {
            core::hint::spin_loop();
        }
        let buf = self.bufs[self.next_buf];
        self.next_buf ^= 1;
        unsafe { core::slice::from_raw_parts_mut(buf, CHUNK_PIXELS * 2) }
    }

    fn send(&mut self, data: *const u8, x0: i32, y0: i32, x1: i32, y1: i32) {
        let rc = unsafe {
            esp_idf_sys::esp_lcd_panel_draw_bitmap(self.panel, x0, y0, x1, y1, data.cast())
        };
        if rc == esp_idf_sys::ESP_OK {
            self.submitted = self.submitted.wrapping_add(1);
        } else {
            log::warn!("esp_lcd_panel_draw_bitmap failed (err {})", rc);
        }
    }

    /// Stream `area` row chunk by row chunk; `pixel` yields colours in row
    /// order.
    fn stream<F>(&mut self, area: &Rectangle, mut pixel: F)
    where
        F: FnMut() -> Rgb565,
    {
        let width = area.size.width as usize;
        if width == 0 || area.size.height == 0 {
            return;
        }
        let rows_per_chunk = (CHUNK_PIXELS / width).max(1);
        let x0 = area.top_left.x;
        let mut y = area.top_left.y;
        let y_end = y + area.size.height as i32;

        while y < y_end {
            let rows = rows_per_chunk.min((y_end - y) as usize);
            let buf = self.take_buf();
            for px in buf[..rows * width * 2].chunks_exact_mut(2) {
                let raw = RawU16::from(pixel()).into_inner();
                px[0] = (raw >> 8) as u8;
                px[1] = (raw & 0xFF) as u8;
            }
            let data = buf.as_ptr();
            self.send(data, x0, y, x0 + width as i32, y + rows as i32);
            y += rows as i32;
        }
    }
}

impl OriginDimensions for Ili9341 {
    fn size(&self) -> Size {
        Size::new(SCREEN_W, SCREEN_H)
    }
}

impl DrawTarget for Ili9341 {
    type Color = Rgb565;
    type Error = core::convert::Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        let bounds = self.bounding_box();
        for Pixel(point, color) in pixels {
            if bounds.contains(point) {
                self.stream(&Rectangle::new(point, Size::new(1, 1)), || color);
            }
        }
        Ok(())
    }

    fn fill_contiguous<I>(&mut self, area: &Rectangle, colors: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Self::Color>,
    {
        let clipped = area.intersection(&self.bounding_box());
        if clipped == *area {
            let mut colors = colors.into_iter();
            self.stream(area, || colors.next().unwrap_or(Rgb565::BLACK));
            Ok(())
        } else {
            // Partially off-screen: fall back to per-pixel clipping.
            self.draw_iter(
                area.points()
                    .zip(colors)
                    .map(|(point, color)| Pixel(point, color)),
            )
        }
    }

    fn fill_solid(&mut self, area: &Rectangle, color: Self::Color) -> Result<(), Self::Error> {
        let area = area.intersection(&self.bounding_box());
        self.stream(&area, || color);
        Ok(())
    }
}

impl Drop for Ili9341 {
    fn drop(&mut self) {
        unsafe {
            for buf in self.bufs {
                esp_idf_sys::heap_caps_free(buf.cast());
            }
        }
    }
}
