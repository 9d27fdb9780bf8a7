use std::ffi::CStr;

use crate::system::{ChipInfo, SystemStats};

/// Live figures from ESP-IDF.
#[derive(Debug, Clone, Copy, Default)]
pub struct EspStats;

fn model_name(model: esp_idf_sys::esp_chip_model_t) -> &'static str {
    match model {
        esp_idf_sys::esp_chip_model_t_CHIP_ESP32 => "ESP32",
        esp_idf_sys::esp_chip_model_t_CHIP_ESP32S2 => "ESP32-S2",
        esp_idf_sys::esp_chip_model_t_CHIP_ESP32S3 => "ESP32-S3",
        esp_idf_sys::esp_chip_model_t_CHIP_ESP32C3 => "ESP32-C3",
        esp_idf_sys::esp_chip_model_t_CHIP_ESP32C6 => "ESP32-C6",
        _ => "ESP32-?",
    }
}

impl SystemStats for EspStats {
    fn free_heap(&self) -> u32 {
        unsafe { esp_idf_sys::esp_get_free_heap_size() }
    }

    fn chip_info(&self) -> ChipInfo {
        let mut chip = esp_idf_sys::esp_chip_info_t::default();
        unsafe { esp_idf_sys::esp_chip_info(&mut chip) };

        let mut flash_bytes = 0u32;
        let flash_rc =
            unsafe { esp_idf_sys::esp_flash_get_size(core::ptr::null_mut(), &mut flash_bytes) };
        if flash_rc != esp_idf_sys::ESP_OK {
            log::warn!("esp_flash_get_size failed (err {})", flash_rc);
        }

        let caps = esp_idf_sys::MALLOC_CAP_INTERNAL;
        let (free_dram, total_dram) = unsafe {
            (
                esp_idf_sys::heap_caps_get_free_size(caps),
                esp_idf_sys::heap_caps_get_total_size(caps),
            )
        };

        let idf = unsafe { CStr::from_ptr(esp_idf_sys::esp_get_idf_version()) };
        log::info!("ESP-IDF {}", idf.to_string_lossy());

        ChipInfo {
            model: model_name(chip.model).to_string(),
            revision: chip.revision,
            cores: chip.cores,
            cpu_mhz: esp_idf_sys::CONFIG_ESP_DEFAULT_CPU_FREQ_MHZ,
            flash_bytes,
            free_heap: self.free_heap(),
            free_dram: free_dram as u32,
            total_dram: total_dram as u32,
        }
    }
}
