//! Screens and screen regions. Each `draw` writes one region of the panel
//! and leaves the rest untouched.

pub mod boot;
pub mod clock;
pub mod report;
pub mod status;
pub mod wifi_scan;

/// Exactly `width` characters: cut to fit, or padded with spaces so a
/// shorter line fully covers a longer one drawn before it.
pub(crate) fn padded(line: &str, width: usize) -> String {
    format!("{:<width$.width$}", line)
}
