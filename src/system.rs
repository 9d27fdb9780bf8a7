/// Chip and memory figures shown on the boot screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChipInfo {
    pub model: String,
    pub revision: u16,
    pub cores: u8,
    pub cpu_mhz: u32,
    pub flash_bytes: u32,
    pub free_heap: u32,
    pub free_dram: u32,
    pub total_dram: u32,
}

pub trait SystemStats {
    /// Bytes. Cheap enough to call from the status report.
    fn free_heap(&self) -> u32;

    fn chip_info(&self) -> ChipInfo;
}

fn kb(bytes: u32) -> f32 {
    bytes as f32 * 0.001
}

impl ChipInfo {
    /// Numbered lines for the boot banner.
    pub fn lines(&self) -> Vec<String> {
        let rows = [
            format!("Chip:{} R{}", self.model, self.revision),
            format!("CPU :{} cores @ {}MHz", self.cores, self.cpu_mhz),
            format!("Flash size: {:.1}kb", kb(self.flash_bytes)),
            format!("Flash size: {} kib", self.flash_bytes / 1024),
            format!("Free  heap: {:.1} kb", kb(self.free_heap)),
            format!("Free  DRAM: {:.1} kb", kb(self.free_dram)),
            format!("Total DRAM: {:.1} kb", kb(self.total_dram)),
        ];
        rows.iter()
            .enumerate()
            .map(|(i, row)| format!("{}. {}", i + 1, row))
            .collect()
    }
}
