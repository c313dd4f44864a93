use std::io::Write;

use crate::cli::wprintln;
use crate::palm::constants::SMS_PREFIX_LEN;
use crate::palm::pdb::PdbFile;
use crate::util::hex::hex_dump;
use crate::SmsError;

/// Options for the `smsdb dump` subcommand.
pub struct DumpOptions {
    pub file: String,
    pub record: usize,
    pub raw: bool,
}

/// Hex dump (or raw bytes) of one record payload, undecoded.
///
/// Offsets in the dump are relative to the start of the record, so the
/// fixed prefix occupies `0x00..0x24`.
pub fn execute(opts: &DumpOptions, writer: &mut dyn Write) -> Result<(), SmsError> {
    let pdb = PdbFile::open(&opts.file)?;
    let raw = pdb.records.get(opts.record).ok_or_else(|| {
        SmsError::Argument(format!(
            "Record {} out of range (database has {} records)",
            opts.record,
            pdb.records.len()
        ))
    })?;

    if opts.raw {
        writer
            .write_all(&raw.data)
            .map_err(|e| SmsError::Io(format!("Cannot write to stdout: {}", e)))?;
        return Ok(());
    }

    wprintln!(
        writer,
        "Hex dump of {} record {} ({} bytes, category {}):",
        opts.file,
        opts.record,
        raw.data.len(),
        raw.category()
    )?;
    if raw.data.len() < SMS_PREFIX_LEN {
        wprintln!(
            writer,
            "Record is shorter than the {}-byte SMS prefix",
            SMS_PREFIX_LEN
        )?;
    }
    wprintln!(writer)?;
    wprintln!(writer, "{}", hex_dump(&raw.data, 0))?;

    Ok(())
}
