use crate::report::encoding::Charset;
use chrono::{Duration, Local};
use std::path::Path;

/// Current local time in a chrono `strftime` format
pub fn date_time(format: &str) -> String {
    Local::now().format(format).to_string()
}

/// Local time `days` from now (negative for the past)
pub fn date_time_offset(format: &str, days: i64) -> String {
    (Local::now() + Duration::days(days))
        .format(format)
        .to_string()
}

pub fn date() -> String {
    date_time("%d/%m/%Y")
}

pub fn hour() -> String {
    date_time("%H:%M:%S")
}

pub fn date_hour() -> String {
    date_time("%d/%m/%Y %H:%M:%S")
}

/// File stem for screenshots, `ddMMyyyy_HHmmssSSS`
pub fn screenshot_stamp() -> String {
    date_time("%d%m%Y_%H%M%S%3f")
}

/// Read a whole file in the given charset.
///
/// I/O failures are logged and yield an empty string.
pub fn read_file_to_string(path: &Path, charset: Charset) -> String {
    match std::fs::read(path) {
        Ok(bytes) => charset.decode(&bytes),
        Err(e) => {
            log::error!("Failed to read {}: {}", path.display(), e);
            String::new()
        }
    }
}
