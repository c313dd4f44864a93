use std::io::Write;

use colored::Colorize;
use serde::Serialize;

use crate::cli::{format_timestamp, wprintln};
use crate::palm::decode::decode;
use crate::palm::encode::unix_to_palm;
use crate::palm::pdb::PdbFile;
use crate::palm::record::SmsRecord;
use crate::palm::text::latin1_to_string;
use crate::util::hex::format_bytes;
use crate::SmsError;

/// Options for the `smsdb show` subcommand.
pub struct ShowOptions {
    pub file: String,
    pub record: usize,
    pub json: bool,
}

/// Record with opaque spans rendered as hex strings.
#[derive(Serialize)]
pub(crate) struct RecordJson {
    pub index: usize,
    pub unique_id: u32,
    pub folder: String,
    pub header_tag: String,
    pub unknown1: String,
    pub timestamp: i64,
    pub date: String,
    pub unknown2: String,
    pub name_flag: bool,
    pub phone: Option<String>,
    pub name: Option<String>,
    pub first_name: Option<String>,
    pub unknown3: String,
    pub text: Option<String>,
}

impl RecordJson {
    pub(crate) fn new(index: usize, unique_id: u32, rec: &SmsRecord) -> Self {
        RecordJson {
            index,
            unique_id,
            folder: rec.folder.to_string(),
            header_tag: latin1_to_string(&rec.header_tag),
            unknown1: format_bytes(&rec.unknown1),
            timestamp: rec.timestamp,
            date: format_timestamp(rec),
            unknown2: format_bytes(&rec.unknown2),
            name_flag: rec.name_flag(),
            phone: rec.phone.clone(),
            name: rec.name.clone(),
            first_name: rec.first_name.clone(),
            unknown3: format_bytes(&rec.unknown3),
            text: rec.text.clone(),
        }
    }
}

/// Decode one record and print every field.
pub fn execute(opts: &ShowOptions, writer: &mut dyn Write) -> Result<(), SmsError> {
    let pdb = PdbFile::open(&opts.file)?;
    let raw = pdb.records.get(opts.record).ok_or_else(|| {
        SmsError::Argument(format!(
            "Record {} out of range (database has {} records)",
            opts.record,
            pdb.records.len()
        ))
    })?;
    let rec = decode(raw.category(), &raw.data).map_err(|e| e.at_record(opts.record))?;

    if opts.json {
        let json = serde_json::to_string_pretty(&RecordJson::new(opts.record, raw.unique_id, &rec))
            .map_err(|e| SmsError::Parse(format!("JSON serialization error: {}", e)))?;
        wprintln!(writer, "{}", json)?;
        return Ok(());
    }

    let header_status = if rec.has_valid_header() {
        "ok".green().to_string()
    } else {
        "unexpected".yellow().to_string()
    };
    let raw_ts = unix_to_palm(rec.timestamp)
        .map(|v| format!("0x{:08x}", v))
        .unwrap_or_else(|_| "out of range".to_string());

    wprintln!(writer, "{}", format!("Record {}", opts.record).bold())?;
    wprintln!(writer, "  Unique ID:  {:#08x}", raw.unique_id)?;
    wprintln!(writer, "  Attributes: 0x{:02x}", raw.attributes)?;
    wprintln!(writer, "  Size:       {} bytes", raw.data.len())?;
    wprintln!(writer, "  Folder:     {}", rec.folder)?;
    wprintln!(
        writer,
        "  Header:     {} ({})",
        latin1_to_string(&rec.header_tag),
        header_status
    )?;
    wprintln!(
        writer,
        "  Timestamp:  {} ({}, raw {})",
        format_timestamp(&rec),
        rec.timestamp,
        raw_ts
    )?;
    wprintln!(writer, "  Phone:      {}", rec.phone.as_deref().unwrap_or("-"))?;
    wprintln!(writer, "  Name:       {}", rec.name.as_deref().unwrap_or("-"))?;
    wprintln!(
        writer,
        "  First name: {}",
        rec.first_name.as_deref().unwrap_or("-")
    )?;
    wprintln!(writer)?;
    wprintln!(writer, "{}", "Opaque spans".bold())?;
    wprintln!(writer, "  unknown1:   {}", format_bytes(&rec.unknown1))?;
    wprintln!(
        writer,
        "  unknown2:   {} (name flag {})",
        format_bytes(&rec.unknown2),
        if rec.name_flag() { "set" } else { "clear" }
    )?;
    wprintln!(
        writer,
        "  unknown3:   {} ({} bytes)",
        format_bytes(&rec.unknown3),
        rec.unknown3.len()
    )?;
    wprintln!(writer)?;
    wprintln!(writer, "{}", "Text".bold())?;
    wprintln!(writer, "{}", rec.text.as_deref().unwrap_or(""))?;

    Ok(())
}
