use std::io::Write;
use std::path::Path;
use std::sync::Arc;

use colored::Colorize;
use serde::Serialize;

use crate::cli::show::RecordJson;
use crate::cli::{create_backup, wprintln};
use crate::palm::constants::SMS_DB_DEFAULT_NAME;
use crate::palm::database::SmsDatabase;
use crate::palm::decode::decode;
use crate::palm::encode::encode;
use crate::palm::folder::Folder;
use crate::palm::record::SmsRecord;
use crate::util::audit::AuditLogger;
use crate::SmsError;

/// Options for the `smsdb add` subcommand.
pub struct AddOptions {
    /// Path to the SMS database (.pdb); created if it does not exist.
    pub file: String,
    pub phone: String,
    pub text: String,
    pub name: Option<String>,
    pub first_name: Option<String>,
    /// Target folder name or number.
    pub folder: String,
    /// Unix timestamp; current time when unset.
    pub timestamp: Option<i64>,
    /// Skip creating a backup of an existing file.
    pub no_backup: bool,
    pub json: bool,
    /// Audit logger for recording write operations.
    pub audit_logger: Option<Arc<AuditLogger>>,
}

#[derive(Serialize)]
struct AddReport {
    file: String,
    created: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    backup_path: Option<String>,
    bytes: usize,
    record: RecordJson,
}

/// Append a freshly constructed message and save the database.
pub fn execute(opts: &AddOptions, writer: &mut dyn Write) -> Result<(), SmsError> {
    let folder = Folder::parse(&opts.folder)?;
    if !folder.is_supported() {
        return Err(SmsError::UnsupportedCategory(folder.as_u8()));
    }

    let mut record = match opts.timestamp {
        Some(ts) => SmsRecord::with_timestamp(ts),
        None => SmsRecord::new(),
    };
    record.folder = folder;
    record.phone = Some(opts.phone.clone());
    record.text = Some(opts.text.clone());
    record.name = opts.name.clone();
    record.first_name = opts.first_name.clone();
    if folder == Folder::Sent {
        // Sent records always carry both name fields, possibly empty.
        record.name.get_or_insert_with(String::new);
        record.first_name.get_or_insert_with(String::new);
    }

    // Encode up front so a bad field never touches the file. Inbox bodies
    // are only found behind a device-written unknown3 marker, which a fresh
    // record lacks, so the payload must also decode back unchanged.
    let encoded = encode(&record)?;
    if decode(folder.as_u8(), &encoded).ok().as_ref() != Some(&record) {
        return Err(SmsError::Argument(format!(
            "A new {} record would not decode back to the same message",
            folder
        )));
    }
    let bytes = encoded.len();

    let created = !Path::new(&opts.file).exists();
    let mut db = if created {
        SmsDatabase::new(SMS_DB_DEFAULT_NAME)?
    } else {
        SmsDatabase::open(&opts.file)?
    };

    let backup_path = if !created && !opts.no_backup {
        let path = create_backup(&opts.file)?;
        if let Some(ref logger) = opts.audit_logger {
            let _ = logger.log_backup(&opts.file, &path.display().to_string());
        }
        Some(path.display().to_string())
    } else {
        None
    };

    let index = db.push(record)?;
    db.save(&opts.file)?;

    let entry = &db.entries()[index];
    if let Some(ref logger) = opts.audit_logger {
        let _ = logger.log_record_write(
            &opts.file,
            index,
            entry.unique_id,
            entry.record.folder.name(),
            "add",
            bytes,
        );
        let _ = logger.log_file_write(&opts.file, "add", db.len() as u64);
    }

    if opts.json {
        let report = AddReport {
            file: opts.file.clone(),
            created,
            backup_path,
            bytes,
            record: RecordJson::new(index, entry.unique_id, &entry.record),
        };
        let json = serde_json::to_string_pretty(&report)
            .map_err(|e| SmsError::Parse(format!("JSON serialization error: {}", e)))?;
        wprintln!(writer, "{}", json)?;
        return Ok(());
    }

    if let Some(ref path) = backup_path {
        wprintln!(writer, "Backup created: {}", path)?;
    }
    if created {
        wprintln!(writer, "Created {}", opts.file)?;
    }
    wprintln!(
        writer,
        "{} record {} to {} ({} bytes, unique id {:#08x})",
        "Added".green(),
        index,
        entry.record.folder,
        bytes,
        entry.unique_id
    )?;

    Ok(())
}
