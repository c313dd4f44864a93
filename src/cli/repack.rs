use std::fs;
use std::io::Write;
use std::sync::Arc;

use colored::Colorize;
use serde::Serialize;

use crate::cli::verify::{check_records, RecordStatus};
use crate::cli::{create_backup, wprintln};
use crate::palm::database::SmsDatabase;
use crate::palm::folder::Folder;
use crate::palm::pdb::PdbFile;
use crate::util::audit::AuditLogger;
use crate::SmsError;

/// Options for the `smsdb repack` subcommand.
pub struct RepackOptions {
    /// Path to the SMS database (.pdb).
    pub file: String,
    /// Write here instead of replacing the input.
    pub out: Option<String>,
    /// Skip creating a backup before an in-place rewrite.
    pub no_backup: bool,
    /// Report without writing anything.
    pub dry_run: bool,
    /// Write even when some records would not be reproduced byte for byte.
    pub force: bool,
    /// Emit output as JSON.
    pub json: bool,
    /// Audit logger for recording write operations.
    pub audit_logger: Option<Arc<AuditLogger>>,
}

#[derive(Serialize)]
struct RepackReport {
    file: String,
    destination: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    backup_path: Option<String>,
    dry_run: bool,
    records: usize,
    inbox: usize,
    sent: usize,
    original_size: u64,
    new_size: usize,
    /// Records whose bytes change when rewritten.
    changed_records: Vec<usize>,
}

/// Decode every record, re-encode it and write a fresh container.
///
/// The whole database is loaded before anything is written, so a record
/// that fails to decode leaves the input untouched. Records that would not
/// come out byte-identical are refused unless `--force` is given. In-place
/// rewrites get a `.bak` copy first unless `--no-backup` is given.
pub fn execute(opts: &RepackOptions, writer: &mut dyn Write) -> Result<(), SmsError> {
    let original_size = fs::metadata(&opts.file)
        .map_err(|e| SmsError::Io(format!("Cannot stat {}: {}", opts.file, e)))?
        .len();
    let pdb = PdbFile::open(&opts.file)?;
    let changed_records: Vec<usize> = check_records(&pdb)
        .into_iter()
        .filter(|c| c.status == RecordStatus::Mismatch)
        .map(|c| c.index)
        .collect();
    let db = SmsDatabase::from_pdb(pdb)?;
    let image = db.to_bytes()?;

    if !changed_records.is_empty() && !opts.force {
        return Err(SmsError::Argument(format!(
            "Records {} would change when rewritten; use --force to repack anyway",
            join_indexes(&changed_records)
        )));
    }

    let destination = opts.out.clone().unwrap_or_else(|| opts.file.clone());
    let in_place = opts.out.is_none();

    let backup_path = if in_place && !opts.no_backup && !opts.dry_run {
        let path = create_backup(&opts.file)?;
        if !opts.json {
            wprintln!(writer, "Backup created: {}", path.display())?;
        }
        if let Some(ref logger) = opts.audit_logger {
            let _ = logger.log_backup(&opts.file, &path.display().to_string());
        }
        Some(path.display().to_string())
    } else {
        None
    };

    if !opts.dry_run {
        fs::write(&destination, &image)
            .map_err(|e| SmsError::Io(format!("Cannot write {}: {}", destination, e)))?;
        if let Some(ref logger) = opts.audit_logger {
            let _ = logger.log_file_write(&destination, "repack", db.len() as u64);
        }
    }

    let report = RepackReport {
        file: opts.file.clone(),
        destination,
        backup_path,
        dry_run: opts.dry_run,
        records: db.len(),
        inbox: db.iter_folder(Folder::Inbox).count(),
        sent: db.iter_folder(Folder::Sent).count(),
        original_size,
        new_size: image.len(),
        changed_records,
    };

    if opts.json {
        let json = serde_json::to_string_pretty(&report)
            .map_err(|e| SmsError::Parse(format!("JSON serialization error: {}", e)))?;
        wprintln!(writer, "{}", json)?;
        return Ok(());
    }

    wprintln!(writer, "Repack Summary:")?;
    wprintln!(
        writer,
        "  Records:       {:>6} ({} inbox, {} sent)",
        report.records,
        report.inbox,
        report.sent
    )?;
    wprintln!(writer, "  Original size: {:>6} bytes", report.original_size)?;
    wprintln!(writer, "  New size:      {:>6} bytes", report.new_size)?;
    if !report.changed_records.is_empty() {
        wprintln!(
            writer,
            "  {}       {}",
            "Changed:".yellow(),
            join_indexes(&report.changed_records)
        )?;
    }
    if opts.dry_run {
        wprintln!(
            writer,
            "  {} would write {}",
            "Dry run:".yellow(),
            report.destination
        )?;
    } else {
        wprintln!(
            writer,
            "  {} {}",
            "Written:".green(),
            report.destination
        )?;
    }

    Ok(())
}

fn join_indexes(indexes: &[usize]) -> String {
    indexes
        .iter()
        .map(|i| i.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
