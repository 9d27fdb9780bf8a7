//! ESP-IDF bindings for the board: Wi-Fi station, SNTP, the ILI9341 panel
//! and chip statistics.

pub mod panel;
pub mod system;
pub mod time_sync;
pub mod wifi;

use anyhow::Result;

use crate::timebase::Monotonic;

/// Board RGB LED, active low.
const PIN_LED_RED: i32 = 16;
const PIN_LED_GREEN: i32 = 17;
const PIN_LED_BLUE: i32 = 4;

pub fn esp_check(res: esp_idf_sys::esp_err_t, msg: &str) -> Result<()> {
    if res != esp_idf_sys::ESP_OK {
        Err(anyhow::anyhow!("{} (err {})", msg, res))
    } else {
        Ok(())
    }
}

/// Milliseconds since boot from the high-resolution timer.
#[derive(Debug, Clone, Copy, Default)]
pub struct EspClock;

impl Monotonic for EspClock {
    fn now_ms(&self) -> u64 {
        let us = unsafe { esp_idf_sys::esp_timer_get_time() };
        (us / 1000).max(0) as u64
    }
}

pub(crate) fn output_pin(pin: i32, level: u32) -> Result<()> {
    let io_conf = esp_idf_sys::gpio_config_t {
        pin_bit_mask: 1u64 << (pin as u64),
        mode: esp_idf_sys::gpio_mode_t_GPIO_MODE_OUTPUT,
        pull_up_en: esp_idf_sys::gpio_pullup_t_GPIO_PULLUP_DISABLE,
        pull_down_en: esp_idf_sys::gpio_pulldown_t_GPIO_PULLDOWN_DISABLE,
        intr_type: esp_idf_sys::gpio_int_type_t_GPIO_INTR_DISABLE,
    };
    esp_check(unsafe { esp_idf_sys::gpio_config(&io_conf) }, "gpio_config")?;
    esp_check(unsafe { esp_idf_sys::gpio_set_level(pin, level) }, "gpio_set_level")
}

/// Switch the RGB LED off.
pub fn rgb_led_off() -> Result<()> {
    for pin in [PIN_LED_RED, PIN_LED_GREEN, PIN_LED_BLUE] {
        output_pin(pin, 1)?;
    }
    Ok(())
}
