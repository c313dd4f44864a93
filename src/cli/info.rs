use std::collections::BTreeMap;
use std::io::Write;

use colored::Colorize;
use serde::Serialize;

use crate::cli::wprintln;
use crate::palm::decode::palm_to_unix;
use crate::palm::folder::Folder;
use crate::palm::pdb::{PdbFile, PdbHeader};
use crate::SmsError;

/// Options for the `smsdb info` subcommand.
pub struct InfoOptions {
    pub file: String,
    pub json: bool,
}

#[derive(Serialize)]
struct InfoJson {
    file: String,
    header: PdbHeader,
    is_sms_db: bool,
    record_count: usize,
    deleted_records: usize,
    /// Counts keyed by category nibble.
    category_counts: BTreeMap<u8, usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    categories: Option<Vec<String>>,
}

/// Print the PDB header, the category table and record counts per folder.
///
/// Works on the raw container only, so it succeeds even when individual
/// records would not decode.
pub fn execute(opts: &InfoOptions, writer: &mut dyn Write) -> Result<(), SmsError> {
    let pdb = PdbFile::open(&opts.file)?;

    let mut category_counts: BTreeMap<u8, usize> = BTreeMap::new();
    for rec in &pdb.records {
        *category_counts.entry(rec.category()).or_insert(0) += 1;
    }
    let deleted = pdb.records.iter().filter(|r| r.is_deleted()).count();
    let categories = pdb.categories();

    if opts.json {
        let info = InfoJson {
            file: opts.file.clone(),
            header: pdb.header.clone(),
            is_sms_db: pdb.header.is_sms_db(),
            record_count: pdb.records.len(),
            deleted_records: deleted,
            category_counts,
            categories: categories.map(|c| {
                c.categories
                    .into_iter()
                    .map(|cat| cat.name)
                    .collect::<Vec<_>>()
            }),
        };
        let json = serde_json::to_string_pretty(&info)
            .map_err(|e| SmsError::Parse(format!("JSON serialization error: {}", e)))?;
        wprintln!(writer, "{}", json)?;
        return Ok(());
    }

    let h = &pdb.header;
    wprintln!(writer, "{}", format!("Database: {}", opts.file).bold())?;
    wprintln!(writer, "  Name:         {}", h.name)?;
    let kind = if h.is_sms_db() {
        "SMS database".green().to_string()
    } else {
        "not an SMS database".yellow().to_string()
    };
    wprintln!(
        writer,
        "  Type/Creator: {}/{} ({})",
        h.type_str(),
        h.creator_str(),
        kind
    )?;
    wprintln!(writer, "  Attributes:   0x{:04x}", h.attributes)?;
    wprintln!(writer, "  Version:      {}", h.version)?;
    wprintln!(writer, "  Created:      {}", palm_date(h.creation_time))?;
    wprintln!(writer, "  Modified:     {}", palm_date(h.modification_time))?;
    wprintln!(writer, "  Backed up:    {}", palm_date(h.backup_time))?;
    wprintln!(writer, "  Mod number:   {}", h.modification_number)?;
    wprintln!(writer, "  Records:      {} ({} deleted)", pdb.records.len(), deleted)?;
    wprintln!(writer)?;

    wprintln!(writer, "{}", "Records by Folder".bold())?;
    for (&cat, &count) in &category_counts {
        let label = match Folder::from_u8(cat) {
            Ok(f) => f.name().to_string(),
            Err(_) => categories
                .as_ref()
                .and_then(|c| c.category_name(cat))
                .map(|n| format!("{} (unknown layout)", n))
                .unwrap_or_else(|| "unknown".to_string()),
        };
        wprintln!(writer, "  {:>2}  {:<24} {:>6}", cat, label, count)?;
    }

    if let Some(cats) = categories {
        wprintln!(writer)?;
        wprintln!(writer, "{}", "Category Table".bold())?;
        for (i, cat) in cats.categories.iter().enumerate() {
            if cat.name.is_empty() {
                continue;
            }
            wprintln!(writer, "  {:>2}  {:<16} id={}", i, cat.name, cat.id)?;
        }
    }

    Ok(())
}

fn palm_date(raw: u32) -> String {
    if raw == 0 {
        return "never".to_string();
    }
    chrono::DateTime::from_timestamp(palm_to_unix(raw), 0)
        .map(|dt| dt.naive_utc().format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| raw.to_string())
}
