//! CLI implementation for the `smsdb verify` subcommand.
//!
//! Decodes every record and re-encodes it, then compares the result with the
//! original payload byte for byte. A mismatch means the record holds bytes
//! the codec does not carry (e.g. trailing data after a Sent message) and a
//! `repack` would change it.

use std::io::Write;

use colored::Colorize;
use serde::Serialize;

use crate::cli::wprintln;
use crate::palm::decode::decode;
use crate::palm::encode::encode;
use crate::palm::pdb::PdbFile;
use crate::SmsError;

/// Options for the `smsdb verify` subcommand.
pub struct VerifyOptions {
    /// Path to the SMS database (.pdb).
    pub file: String,
    /// Show every record in text output, not only failures.
    pub verbose: bool,
    /// Output in JSON format.
    pub json: bool,
}

#[derive(Debug, Serialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "snake_case")]
pub enum RecordStatus {
    /// Re-encoded bytes are identical.
    Identical,
    /// Decoded, but re-encoding produced different bytes.
    Mismatch,
    /// Decode or encode failed.
    Error,
}

#[derive(Debug, Serialize)]
pub(crate) struct RecordCheck {
    pub(crate) index: usize,
    category: u8,
    size: usize,
    pub(crate) status: RecordStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    first_difference: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    encoded_size: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

#[derive(Debug, Serialize)]
struct VerifyReport {
    file: String,
    total_records: usize,
    identical: usize,
    mismatched: usize,
    errors: usize,
    passed: bool,
    records: Vec<RecordCheck>,
}

/// Check decode/encode fidelity of every record.
///
/// Returns an error after printing the report when any record is not
/// reproduced exactly, so the process exits non-zero.
pub fn execute(opts: &VerifyOptions, writer: &mut dyn Write) -> Result<(), SmsError> {
    let pdb = PdbFile::open(&opts.file)?;

    let records = check_records(&pdb);

    let count = |s: RecordStatus| records.iter().filter(|r| r.status == s).count();
    let report = VerifyReport {
        file: opts.file.clone(),
        total_records: records.len(),
        identical: count(RecordStatus::Identical),
        mismatched: count(RecordStatus::Mismatch),
        errors: count(RecordStatus::Error),
        passed: records.iter().all(|r| r.status == RecordStatus::Identical),
        records,
    };

    if opts.json {
        let json = serde_json::to_string_pretty(&report)
            .map_err(|e| SmsError::Parse(format!("JSON serialization error: {}", e)))?;
        wprintln!(writer, "{}", json)?;
    } else {
        wprintln!(writer, "Round-trip Verification: {}", opts.file)?;
        wprintln!(writer, "  Records: {}", report.total_records)?;
        wprintln!(writer)?;

        for r in &report.records {
            match r.status {
                RecordStatus::Identical => {
                    if opts.verbose {
                        wprintln!(
                            writer,
                            "  Record {:>4}: {} ({} bytes)",
                            r.index,
                            "OK".green(),
                            r.size
                        )?;
                    }
                }
                RecordStatus::Mismatch => {
                    wprintln!(
                        writer,
                        "  Record {:>4}: {} ({} bytes in, {} bytes out, first difference at {})",
                        r.index,
                        "MISMATCH".yellow(),
                        r.size,
                        r.encoded_size.unwrap_or(0),
                        r.first_difference.unwrap_or(0)
                    )?;
                }
                RecordStatus::Error => {
                    wprintln!(
                        writer,
                        "  Record {:>4}: {} {}",
                        r.index,
                        "ERROR".red(),
                        r.error.as_deref().unwrap_or("")
                    )?;
                }
            }
        }

        wprintln!(writer)?;
        let status = if report.passed {
            "PASS".green().to_string()
        } else {
            "FAIL".red().to_string()
        };
        wprintln!(
            writer,
            "  {} identical, {} mismatched, {} errors: {}",
            report.identical,
            report.mismatched,
            report.errors,
            status
        )?;
    }

    if report.passed {
        Ok(())
    } else {
        Err(SmsError::Parse(format!(
            "{} of {} records do not round-trip",
            report.mismatched + report.errors,
            report.total_records
        )))
    }
}

/// Decode and re-encode each record of `pdb`, comparing against the stored bytes.
pub(crate) fn check_records(pdb: &PdbFile) -> Vec<RecordCheck> {
    pdb.records
        .iter()
        .enumerate()
        .map(|(index, raw)| {
            let mut check = RecordCheck {
                index,
                category: raw.category(),
                size: raw.data.len(),
                status: RecordStatus::Identical,
                first_difference: None,
                encoded_size: None,
                error: None,
            };
            match decode(raw.category(), &raw.data).and_then(|rec| encode(&rec)) {
                Ok(encoded) => {
                    check.encoded_size = Some(encoded.len());
                    if encoded != raw.data {
                        check.status = RecordStatus::Mismatch;
                        check.first_difference = Some(first_difference(&raw.data, &encoded));
                    }
                }
                Err(e) => {
                    check.status = RecordStatus::Error;
                    check.error = Some(e.to_string());
                }
            }
            check
        })
        .collect()
}

fn first_difference(a: &[u8], b: &[u8]) -> usize {
    a.iter()
        .zip(b.iter())
        .position(|(x, y)| x != y)
        .unwrap_or_else(|| a.len().min(b.len()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_difference() {
        assert_eq!(first_difference(b"abc", b"abd"), 2);
        assert_eq!(first_difference(b"abc", b"abcdef"), 3);
        assert_eq!(first_difference(b"", b"x"), 0);
    }
}
