//! CLI subcommand implementations for the `smsdb` binary.
//!
//! CLI argument parsing uses clap derive macros, with the top-level
//! [`app::Cli`] struct and [`app::Commands`] enum defined in [`app`] and shared
//! between `main.rs` and `build.rs` (for man page generation) via `include!()`.
//!
//! Each subcommand module follows the same pattern: an `Options` struct holding
//! the parsed arguments and a `pub fn execute(opts, writer) -> Result<(), SmsError>`
//! entry point. The `writer: &mut dyn Write` parameter allows output to be
//! captured in tests or redirected to a file via the global `--output` flag.
//!
//! # Subcommands
//!
//! | Command | Module | Purpose |
//! |---------|--------|---------|
//! | `smsdb info` | [`info`] | Database header, category table, per-folder record counts |
//! | `smsdb list` | [`list`] | One line per record; undecodable records are reported inline |
//! | `smsdb show` | [`show`] | Every field of one record, opaque spans in hex |
//! | `smsdb dump` | [`dump`] | Hex dump of a raw record payload |
//! | `smsdb export` | [`export`] | Text, JSON or CSV export of all messages |
//! | `smsdb verify` | [`verify`] | Byte-identity check of decode followed by encode |
//! | `smsdb repack` | [`repack`] | Load, re-encode and rewrite a database |
//! | `smsdb add` | [`add`] | Append a freshly constructed message |
//!
//! The `wprintln!` macro wraps `writeln!` to convert `io::Error` into
//! `SmsError`.

pub mod add;
pub mod app;
pub mod dump;
pub mod export;
pub mod info;
pub mod list;
pub mod repack;
pub mod show;
pub mod verify;

/// Write a line to the given writer, converting io::Error to SmsError.
macro_rules! wprintln {
    ($w:expr) => {
        writeln!($w).map_err(|e| $crate::SmsError::Io(e.to_string()))
    };
    ($w:expr, $($arg:tt)*) => {
        writeln!($w, $($arg)*).map_err(|e| $crate::SmsError::Io(e.to_string()))
    };
}

pub(crate) use wprintln;

use std::fs;
use std::path::{Path, PathBuf};

use crate::palm::folder::Folder;
use crate::palm::record::SmsRecord;
use crate::SmsError;

/// Create a backup of a file by copying it to `<path>.bak`.
///
/// If `<path>.bak` already exists, tries `.bak.1`, `.bak.2`, etc.
/// Returns the path of the created backup file.
pub(crate) fn create_backup(path: &str) -> Result<PathBuf, SmsError> {
    let src = Path::new(path);
    if !src.exists() {
        return Err(SmsError::Io(format!("File not found: {}", path)));
    }

    let mut backup_path = PathBuf::from(format!("{}.bak", path));
    let mut counter = 1u32;
    while backup_path.exists() {
        backup_path = PathBuf::from(format!("{}.bak.{}", path, counter));
        counter += 1;
        if counter > 999 {
            return Err(SmsError::Io(format!("Too many backup files for {}", path)));
        }
    }

    fs::copy(src, &backup_path).map_err(|e| {
        SmsError::Io(format!(
            "Cannot create backup {}: {}",
            backup_path.display(),
            e
        ))
    })?;

    Ok(backup_path)
}

/// Parse an optional `--folder` argument.
pub(crate) fn parse_folder_filter(arg: Option<&str>) -> Result<Option<Folder>, SmsError> {
    arg.map(Folder::parse).transpose()
}

/// Render a record timestamp as `YYYY-MM-DD HH:MM:SS` (device local time).
pub(crate) fn format_timestamp(record: &SmsRecord) -> String {
    match record.datetime() {
        Some(dt) => dt.format("%Y-%m-%d %H:%M:%S").to_string(),
        None => format!("@{}", record.timestamp),
    }
}

/// First `max` characters of `s` on one line, with an ellipsis if cut.
pub(crate) fn preview(s: &str, max: usize) -> String {
    let flat: String = s
        .chars()
        .map(|c| if c.is_control() { ' ' } else { c })
        .collect();
    if flat.chars().count() <= max {
        flat
    } else {
        let cut: String = flat.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", cut)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preview() {
        assert_eq!(preview("short", 10), "short");
        assert_eq!(preview("line\nbreak", 20), "line break");
        assert_eq!(preview("abcdefghijkl", 8), "abcde...");
    }

    #[test]
    fn test_format_timestamp() {
        let rec = SmsRecord::with_timestamp(86_400 + 3_661);
        assert_eq!(format_timestamp(&rec), "1970-01-02 01:01:01");
    }

    #[test]
    fn test_folder_filter() {
        assert_eq!(parse_folder_filter(None).unwrap(), None);
        assert_eq!(
            parse_folder_filter(Some("inbox")).unwrap(),
            Some(Folder::Inbox)
        );
        assert!(parse_folder_filter(Some("trash")).is_err());
    }
}
