use std::io::Write;

use colored::Colorize;
use serde::Serialize;

use crate::cli::{format_timestamp, parse_folder_filter, preview, wprintln};
use crate::palm::database::SmsDatabase;
use crate::palm::folder::Folder;
use crate::palm::pdb::PdbFile;
use crate::SmsError;

/// Options for the `smsdb list` subcommand.
pub struct ListOptions {
    pub file: String,
    pub folder: Option<String>,
    pub json: bool,
}

#[derive(Serialize)]
struct ListEntryJson {
    index: usize,
    unique_id: u32,
    category: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    folder: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    contact: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

/// List every record on one line.
///
/// Records are decoded one at a time; a record that fails to decode is shown
/// with its error instead of aborting the listing. With `--folder`, records
/// whose category nibble does not match are skipped.
pub fn execute(opts: &ListOptions, writer: &mut dyn Write) -> Result<(), SmsError> {
    let pdb = PdbFile::open(&opts.file)?;
    let filter = parse_folder_filter(opts.folder.as_deref())?;
    let scanned = SmsDatabase::scan(&pdb);

    let selected = scanned
        .into_iter()
        .filter(|s| filter.map_or(true, |f| f.as_u8() == s.category));

    if opts.json {
        let entries: Vec<ListEntryJson> = selected
            .map(|s| {
                let folder = Folder::from_u8(s.category).ok().map(|f| f.to_string());
                match s.result {
                    Ok(rec) => ListEntryJson {
                        index: s.index,
                        unique_id: s.unique_id,
                        category: s.category,
                        folder,
                        date: Some(format_timestamp(&rec)),
                        phone: rec.phone.clone(),
                        contact: rec.contact(),
                        text: rec.text,
                        error: None,
                    },
                    Err(e) => ListEntryJson {
                        index: s.index,
                        unique_id: s.unique_id,
                        category: s.category,
                        folder,
                        date: None,
                        phone: None,
                        contact: None,
                        text: None,
                        error: Some(e.to_string()),
                    },
                }
            })
            .collect();
        let json = serde_json::to_string_pretty(&entries)
            .map_err(|e| SmsError::Parse(format!("JSON serialization error: {}", e)))?;
        wprintln!(writer, "{}", json)?;
        return Ok(());
    }

    wprintln!(
        writer,
        "{}",
        format!(
            "{:>5}  {:<7} {:<19}  {:<16} {:<20} {}",
            "#", "Folder", "Date", "Phone", "Contact", "Text"
        )
        .bold()
    )?;
    wprintln!(writer, "{}", "-".repeat(100))?;

    let mut shown = 0usize;
    let mut failed = 0usize;
    for s in selected {
        shown += 1;
        match s.result {
            Ok(rec) => {
                wprintln!(
                    writer,
                    "{:>5}  {:<7} {:<19}  {:<16} {:<20} {}",
                    s.index,
                    rec.folder.name(),
                    format_timestamp(&rec),
                    preview(rec.phone.as_deref().unwrap_or(""), 16),
                    preview(&rec.contact().unwrap_or_default(), 20),
                    preview(rec.text.as_deref().unwrap_or(""), 40)
                )?;
            }
            Err(e) => {
                failed += 1;
                wprintln!(
                    writer,
                    "{:>5}  {:<7} {}",
                    s.index,
                    s.category,
                    format!("{} ({} bytes)", e, s.size).red()
                )?;
            }
        }
    }

    wprintln!(writer)?;
    if failed > 0 {
        wprintln!(
            writer,
            "{} records, {}",
            shown,
            format!("{} not decodable", failed).red()
        )?;
    } else {
        wprintln!(writer, "{} records", shown)?;
    }

    Ok(())
}
