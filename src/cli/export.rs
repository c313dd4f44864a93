use std::io::Write;

use crate::cli::app::ExportFormat;
use crate::cli::show::RecordJson;
use crate::cli::{format_timestamp, parse_folder_filter, wprintln};
use crate::palm::database::SmsDatabase;
use crate::palm::folder::Folder;
use crate::palm::record::SmsRecord;
use crate::SmsError;

/// Options for the `smsdb export` subcommand.
pub struct ExportOptions {
    pub file: String,
    pub format: ExportFormat,
    pub folder: Option<String>,
}

/// Export every message of a database.
///
/// Loads the whole database first, so a single undecodable record aborts the
/// export; `smsdb list` shows which one.
pub fn execute(opts: &ExportOptions, writer: &mut dyn Write) -> Result<(), SmsError> {
    let db = SmsDatabase::open(&opts.file)?;
    let filter = parse_folder_filter(opts.folder.as_deref())?;

    let selected: Vec<(usize, u32, &SmsRecord)> = db
        .entries()
        .iter()
        .enumerate()
        .filter(|(_, e)| filter.map_or(true, |f| e.record.folder == f))
        .map(|(i, e)| (i, e.unique_id, &e.record))
        .collect();

    match opts.format {
        ExportFormat::Text => output_text(writer, &selected),
        ExportFormat::Json => output_json(writer, &selected),
        ExportFormat::Csv => output_csv(writer, &selected),
    }
}

/// Human-readable mailbox-style output.
fn output_text(
    writer: &mut dyn Write,
    records: &[(usize, u32, &SmsRecord)],
) -> Result<(), SmsError> {
    for (n, (_, _, rec)) in records.iter().enumerate() {
        if n > 0 {
            wprintln!(writer)?;
        }
        let direction = match rec.folder {
            Folder::Inbox => "From",
            Folder::Sent | Folder::Pending => "To",
        };
        let phone = rec.phone.as_deref().unwrap_or("");
        match rec.contact() {
            Some(contact) => wprintln!(writer, "{}: {} <{}>", direction, contact, phone)?,
            None => wprintln!(writer, "{}: {}", direction, phone)?,
        }
        wprintln!(writer, "Date: {}", format_timestamp(rec))?;
        wprintln!(writer, "Folder: {}", rec.folder)?;
        wprintln!(writer)?;
        wprintln!(writer, "{}", rec.text.as_deref().unwrap_or(""))?;
    }
    Ok(())
}

/// Output records as JSON (array of objects, opaque spans in hex).
fn output_json(
    writer: &mut dyn Write,
    records: &[(usize, u32, &SmsRecord)],
) -> Result<(), SmsError> {
    let rows: Vec<RecordJson> = records
        .iter()
        .map(|(i, uid, rec)| RecordJson::new(*i, *uid, rec))
        .collect();
    let json = serde_json::to_string_pretty(&rows)
        .map_err(|e| SmsError::Parse(format!("JSON serialization error: {}", e)))?;
    wprintln!(writer, "{}", json)?;
    Ok(())
}

/// Output records as CSV.
fn output_csv(
    writer: &mut dyn Write,
    records: &[(usize, u32, &SmsRecord)],
) -> Result<(), SmsError> {
    wprintln!(
        writer,
        "index,folder,timestamp,date,phone,name,first_name,text"
    )?;
    for (i, _, rec) in records {
        let values = [
            i.to_string(),
            rec.folder.to_string(),
            rec.timestamp.to_string(),
            format_timestamp(rec),
            csv_escape(rec.phone.as_deref()),
            csv_escape(rec.name.as_deref()),
            csv_escape(rec.first_name.as_deref()),
            csv_escape(rec.text.as_deref()),
        ];
        wprintln!(writer, "{}", values.join(","))?;
    }
    Ok(())
}

/// CSV-escape a field value (RFC 4180). Unset fields are empty.
fn csv_escape(val: Option<&str>) -> String {
    match val {
        None => String::new(),
        Some(s) => {
            if s.contains(',') || s.contains('"') || s.contains('\n') || s.contains('\r') {
                format!("\"{}\"", s.replace('"', "\"\""))
            } else {
                s.to_string()
            }
        }
    }
}
