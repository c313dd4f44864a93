#![cfg(feature = "cli")]
//! Integration tests for the `smsdb` subcommands.

use std::fs;
use std::sync::Arc;

use tempfile::TempDir;

use palmsms::cli::app::ExportFormat;
use palmsms::cli::{add, dump, export, info, list, repack, show, verify};
use palmsms::palm::database::SmsDatabase;
use palmsms::palm::folder::Folder;
use palmsms::palm::pdb::PdbFile;
use palmsms::palm::record::SmsRecord;
use palmsms::util::audit::AuditLogger;
use palmsms::SmsError;

fn sent(phone: &str, text: &str) -> SmsRecord {
    let mut rec = SmsRecord::with_timestamp(1_000_000_000);
    rec.phone = Some(phone.to_string());
    rec.name = Some("Doe".to_string());
    rec.first_name = Some("John".to_string());
    rec.text = Some(text.to_string());
    rec
}

fn inbox(phone: &str, text: &str) -> SmsRecord {
    let mut rec = SmsRecord::with_timestamp(1_000_003_600);
    rec.folder = Folder::Inbox;
    rec.unknown2[7] = 0x40;
    rec.phone = Some(phone.to_string());
    rec.name = Some("Smith".to_string());
    rec.first_name = Some("Jane".to_string());
    rec.unknown3 = b"\x02\x00\x1f7\0".to_vec();
    rec.text = Some(text.to_string());
    rec
}

/// Write a database with one Sent and one Inbox message.
fn write_sample_db(dir: &TempDir) -> String {
    let path = dir.path().join("sms.pdb");
    let mut db = SmsDatabase::new("SMS Messages").unwrap();
    db.push(sent("+15550100", "See you at 8, \"sharp\"")).unwrap();
    db.push(inbox("+15550199", "On my way")).unwrap();
    db.save(&path).unwrap();
    path.to_str().unwrap().to_string()
}

/// Append a Pending record, which the codec cannot decode.
fn append_pending_record(path: &str) {
    let mut pdb = PdbFile::open(path).unwrap();
    let mut bad = pdb.records[0].clone();
    bad.attributes = (bad.attributes & 0xF0) | 0x02;
    bad.unique_id = 99;
    pdb.records.push(bad);
    pdb.write(path).unwrap();
}

fn run<F>(f: F) -> (Result<(), SmsError>, String)
where
    F: FnOnce(&mut Vec<u8>) -> Result<(), SmsError>,
{
    let mut output = Vec::new();
    let result = f(&mut output);
    (result, String::from_utf8(output).unwrap())
}

// -----------------------------------------------------------------------
// info
// -----------------------------------------------------------------------

#[test]
fn test_info_text() {
    let dir = TempDir::new().unwrap();
    let file = write_sample_db(&dir);

    let (result, text) = run(|w| info::execute(&info::InfoOptions { file, json: false }, w));
    result.unwrap();
    assert!(text.contains("SMS Messages"));
    assert!(text.contains("DATA/SMS!"));
    assert!(text.contains("Records:      2"));
    assert!(text.contains("Inbox"));
    assert!(text.contains("Category Table"));
}

#[test]
fn test_info_json() {
    let dir = TempDir::new().unwrap();
    let file = write_sample_db(&dir);

    let (result, text) = run(|w| info::execute(&info::InfoOptions { file, json: true }, w));
    result.unwrap();
    let json: serde_json::Value = serde_json::from_str(&text).unwrap();
    assert_eq!(json["record_count"], 2);
    assert_eq!(json["is_sms_db"], true);
    assert_eq!(json["category_counts"]["0"], 1);
    assert_eq!(json["category_counts"]["1"], 1);
    assert_eq!(json["categories"][2], "Pending");
}

// -----------------------------------------------------------------------
// list
// -----------------------------------------------------------------------

#[test]
fn test_list_shows_all_records() {
    let dir = TempDir::new().unwrap();
    let file = write_sample_db(&dir);

    let opts = list::ListOptions {
        file,
        folder: None,
        json: false,
    };
    let (result, text) = run(|w| list::execute(&opts, w));
    result.unwrap();
    assert!(text.contains("+15550100"));
    assert!(text.contains("Jane Smith"));
    assert!(text.contains("2001-09-09 01:46:40"));
    assert!(text.contains("2 records"));
}

#[test]
fn test_list_folder_filter_json() {
    let dir = TempDir::new().unwrap();
    let file = write_sample_db(&dir);

    let opts = list::ListOptions {
        file,
        folder: Some("inbox".to_string()),
        json: true,
    };
    let (result, text) = run(|w| list::execute(&opts, w));
    result.unwrap();
    let json: serde_json::Value = serde_json::from_str(&text).unwrap();
    let rows = json.as_array().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["folder"], "Inbox");
    assert_eq!(rows[0]["text"], "On my way");
}

#[test]
fn test_list_reports_undecodable_record_inline() {
    let dir = TempDir::new().unwrap();
    let file = write_sample_db(&dir);
    append_pending_record(&file);

    let opts = list::ListOptions {
        file,
        folder: None,
        json: false,
    };
    let (result, text) = run(|w| list::execute(&opts, w));
    result.unwrap();
    assert!(text.contains("3 records"));
    assert!(text.contains("1 not decodable"));
}

// -----------------------------------------------------------------------
// show / dump
// -----------------------------------------------------------------------

#[test]
fn test_show_json_fields() {
    let dir = TempDir::new().unwrap();
    let file = write_sample_db(&dir);

    let opts = show::ShowOptions {
        file,
        record: 1,
        json: true,
    };
    let (result, text) = run(|w| show::execute(&opts, w));
    result.unwrap();
    let json: serde_json::Value = serde_json::from_str(&text).unwrap();
    assert_eq!(json["folder"], "Inbox");
    assert_eq!(json["header_tag"], "SMSh");
    assert_eq!(json["name_flag"], true);
    assert_eq!(json["first_name"], "Jane");
    assert_eq!(json["timestamp"], 1_000_003_600);
    assert_eq!(json["unique_id"], 2);
}

#[test]
fn test_show_out_of_range() {
    let dir = TempDir::new().unwrap();
    let file = write_sample_db(&dir);

    let opts = show::ShowOptions {
        file,
        record: 10,
        json: false,
    };
    let (result, _) = run(|w| show::execute(&opts, w));
    assert!(matches!(result, Err(SmsError::Argument(_))));
}

#[test]
fn test_show_unsupported_category() {
    let dir = TempDir::new().unwrap();
    let file = write_sample_db(&dir);
    append_pending_record(&file);

    let opts = show::ShowOptions {
        file,
        record: 2,
        json: false,
    };
    let (result, _) = run(|w| show::execute(&opts, w));
    assert!(matches!(result, Err(SmsError::Record { index: 2, .. })));
}

#[test]
fn test_dump_raw_bytes() {
    let dir = TempDir::new().unwrap();
    let file = write_sample_db(&dir);
    let expected = PdbFile::open(&file).unwrap().records[0].data.clone();

    let opts = dump::DumpOptions {
        file,
        record: 0,
        raw: true,
    };
    let mut output = Vec::new();
    dump::execute(&opts, &mut output).unwrap();
    assert_eq!(output, expected);
}

#[test]
fn test_dump_hex() {
    let dir = TempDir::new().unwrap();
    let file = write_sample_db(&dir);

    let opts = dump::DumpOptions {
        file,
        record: 0,
        raw: false,
    };
    let (result, text) = run(|w| dump::execute(&opts, w));
    result.unwrap();
    assert!(text.contains("category 1"));
    assert!(text.contains("|SMSh"));
}

// -----------------------------------------------------------------------
// export
// -----------------------------------------------------------------------

#[test]
fn test_export_csv_escapes_fields() {
    let dir = TempDir::new().unwrap();
    let file = write_sample_db(&dir);

    let opts = export::ExportOptions {
        file,
        format: ExportFormat::Csv,
        folder: None,
    };
    let (result, text) = run(|w| export::execute(&opts, w));
    result.unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 3);
    assert_eq!(
        lines[0],
        "index,folder,timestamp,date,phone,name,first_name,text"
    );
    assert!(lines[1].starts_with("0,Sent,1000000000,2001-09-09 01:46:40,+15550100,Doe,John,"));
    assert!(lines[1].ends_with("\"See you at 8, \"\"sharp\"\"\""));
    assert!(lines[2].ends_with(",On my way"));
}

#[test]
fn test_export_text_sent_only() {
    let dir = TempDir::new().unwrap();
    let file = write_sample_db(&dir);

    let opts = export::ExportOptions {
        file,
        format: ExportFormat::Text,
        folder: Some("sent".to_string()),
    };
    let (result, text) = run(|w| export::execute(&opts, w));
    result.unwrap();
    assert!(text.contains("To: John Doe <+15550100>"));
    assert!(!text.contains("On my way"));
}

#[test]
fn test_export_json() {
    let dir = TempDir::new().unwrap();
    let file = write_sample_db(&dir);

    let opts = export::ExportOptions {
        file,
        format: ExportFormat::Json,
        folder: None,
    };
    let (result, text) = run(|w| export::execute(&opts, w));
    result.unwrap();
    let json: serde_json::Value = serde_json::from_str(&text).unwrap();
    let rows = json.as_array().unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[1]["unknown3"], "02001f3700");
}

#[test]
fn test_export_fails_on_undecodable_record() {
    let dir = TempDir::new().unwrap();
    let file = write_sample_db(&dir);
    append_pending_record(&file);

    let opts = export::ExportOptions {
        file,
        format: ExportFormat::Text,
        folder: None,
    };
    let (result, _) = run(|w| export::execute(&opts, w));
    assert!(matches!(result, Err(SmsError::Record { index: 2, .. })));
}

// -----------------------------------------------------------------------
// verify
// -----------------------------------------------------------------------

#[test]
fn test_verify_clean_database_passes() {
    let dir = TempDir::new().unwrap();
    let file = write_sample_db(&dir);

    let opts = verify::VerifyOptions {
        file,
        verbose: true,
        json: false,
    };
    let (result, text) = run(|w| verify::execute(&opts, w));
    result.unwrap();
    assert!(text.contains("PASS"));
    assert!(text.contains("2 identical"));
}

#[test]
fn test_verify_reports_trailing_bytes_as_mismatch() {
    let dir = TempDir::new().unwrap();
    let file = write_sample_db(&dir);

    let mut pdb = PdbFile::open(&file).unwrap();
    pdb.records[0].data.extend_from_slice(b"\0\0");
    pdb.write(&file).unwrap();

    let opts = verify::VerifyOptions {
        file,
        verbose: false,
        json: true,
    };
    let (result, text) = run(|w| verify::execute(&opts, w));
    assert!(result.is_err());
    let json: serde_json::Value = serde_json::from_str(&text).unwrap();
    assert_eq!(json["passed"], false);
    assert_eq!(json["mismatched"], 1);
    assert_eq!(json["records"][0]["status"], "mismatch");
    assert_eq!(json["records"][1]["status"], "identical");
}

// -----------------------------------------------------------------------
// repack
// -----------------------------------------------------------------------

#[test]
fn test_repack_in_place_creates_backup() {
    let dir = TempDir::new().unwrap();
    let file = write_sample_db(&dir);
    let original = fs::read(&file).unwrap();

    let opts = repack::RepackOptions {
        file: file.clone(),
        out: None,
        no_backup: false,
        dry_run: false,
        force: false,
        json: false,
        audit_logger: None,
    };
    let (result, text) = run(|w| repack::execute(&opts, w));
    result.unwrap();
    assert!(text.contains("Backup created"));
    assert_eq!(fs::read(format!("{}.bak", file)).unwrap(), original);

    let db = SmsDatabase::open(&file).unwrap();
    assert_eq!(db.len(), 2);
    assert_eq!(db.get(1).unwrap().text.as_deref(), Some("On my way"));
}

#[test]
fn test_repack_dry_run_writes_nothing() {
    let dir = TempDir::new().unwrap();
    let file = write_sample_db(&dir);
    let original = fs::read(&file).unwrap();

    let opts = repack::RepackOptions {
        file: file.clone(),
        out: None,
        no_backup: false,
        dry_run: true,
        force: false,
        json: true,
        audit_logger: None,
    };
    let (result, text) = run(|w| repack::execute(&opts, w));
    result.unwrap();
    let json: serde_json::Value = serde_json::from_str(&text).unwrap();
    assert_eq!(json["dry_run"], true);
    assert_eq!(json["records"], 2);
    assert_eq!(fs::read(&file).unwrap(), original);
    assert!(!std::path::Path::new(&format!("{}.bak", file)).exists());
}

#[test]
fn test_repack_to_other_file_with_audit_log() {
    let dir = TempDir::new().unwrap();
    let file = write_sample_db(&dir);
    let out = dir.path().join("out.pdb").to_str().unwrap().to_string();
    let log_path = dir.path().join("audit.ndjson");

    let logger = Arc::new(AuditLogger::open(log_path.to_str().unwrap()).unwrap());
    let opts = repack::RepackOptions {
        file: file.clone(),
        out: Some(out.clone()),
        no_backup: false,
        dry_run: false,
        force: false,
        json: false,
        audit_logger: Some(logger.clone()),
    };
    let (result, _) = run(|w| repack::execute(&opts, w));
    result.unwrap();
    logger.end_session().unwrap();

    assert!(!std::path::Path::new(&format!("{}.bak", file)).exists());
    assert_eq!(SmsDatabase::open(&out).unwrap().len(), 2);

    let log = fs::read_to_string(&log_path).unwrap();
    let events: Vec<serde_json::Value> = log
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect();
    assert!(events
        .iter()
        .any(|e| e["event"] == "file_write" && e["operation"] == "repack"));
    let end = events.last().unwrap();
    assert_eq!(end["event"], "session_end");
    assert_eq!(end["files_written"], 1);
}

#[test]
fn test_repack_refuses_undecodable_database() {
    let dir = TempDir::new().unwrap();
    let file = write_sample_db(&dir);
    append_pending_record(&file);
    let before = fs::read(&file).unwrap();

    let opts = repack::RepackOptions {
        file: file.clone(),
        out: None,
        no_backup: false,
        dry_run: false,
        force: false,
        json: false,
        audit_logger: None,
    };
    let (result, _) = run(|w| repack::execute(&opts, w));
    assert!(result.is_err());
    assert_eq!(fs::read(&file).unwrap(), before);
}

/// Give the Inbox message a trailing null, which the codec does not keep.
fn append_null_to_inbox_body(path: &str) {
    let mut pdb = PdbFile::open(path).unwrap();
    assert_eq!(pdb.records[1].category(), 0);
    pdb.records[1].data.push(0);
    pdb.write(path).unwrap();
}

#[test]
fn test_repack_refuses_lossy_record() {
    let dir = TempDir::new().unwrap();
    let file = write_sample_db(&dir);
    append_null_to_inbox_body(&file);
    let before = fs::read(&file).unwrap();

    let opts = repack::RepackOptions {
        file: file.clone(),
        out: None,
        no_backup: false,
        dry_run: false,
        force: false,
        json: false,
        audit_logger: None,
    };
    let (result, _) = run(|w| repack::execute(&opts, w));
    match result {
        Err(SmsError::Argument(msg)) => {
            assert!(msg.contains("Records 1 "), "unexpected message: {}", msg);
            assert!(msg.contains("--force"));
        }
        other => panic!("expected argument error, got {:?}", other),
    }
    assert_eq!(fs::read(&file).unwrap(), before);
    assert!(!dir.path().join("sms.pdb.bak").exists());
}

#[test]
fn test_repack_force_reports_changed_records() {
    let dir = TempDir::new().unwrap();
    let file = write_sample_db(&dir);
    append_null_to_inbox_body(&file);
    let before = fs::read(&file).unwrap();

    let opts = repack::RepackOptions {
        file: file.clone(),
        out: None,
        no_backup: true,
        dry_run: false,
        force: true,
        json: true,
        audit_logger: None,
    };
    let (result, text) = run(|w| repack::execute(&opts, w));
    result.unwrap();
    let json: serde_json::Value = serde_json::from_str(&text).unwrap();
    assert_eq!(json["changed_records"], serde_json::json!([1]));
    assert_eq!(json["new_size"].as_u64().unwrap() + 1, before.len() as u64);

    let after = fs::read(&file).unwrap();
    assert_eq!(after.len() + 1, before.len());
    let db = SmsDatabase::open(&file).unwrap();
    assert_eq!(db.get(1).unwrap().text.as_deref(), Some("On my way"));
}

// -----------------------------------------------------------------------
// add
// -----------------------------------------------------------------------

fn add_opts(file: &str) -> add::AddOptions {
    add::AddOptions {
        file: file.to_string(),
        phone: "5551234".to_string(),
        text: "hello".to_string(),
        name: None,
        first_name: None,
        folder: "sent".to_string(),
        timestamp: Some(1_262_304_000),
        no_backup: false,
        json: false,
        audit_logger: None,
    }
}

#[test]
fn test_add_creates_new_database() {
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("fresh.pdb").to_str().unwrap().to_string();

    let (result, text) = run(|w| add::execute(&add_opts(&file), w));
    result.unwrap();
    assert!(text.contains("Created"));
    assert!(!std::path::Path::new(&format!("{}.bak", file)).exists());

    let db = SmsDatabase::open(&file).unwrap();
    assert_eq!(db.len(), 1);
    let rec = db.get(0).unwrap();
    assert_eq!(rec.folder, Folder::Sent);
    assert_eq!(rec.timestamp, 1_262_304_000);
    assert_eq!(rec.phone.as_deref(), Some("5551234"));
    assert_eq!(rec.name.as_deref(), Some(""));
    assert_eq!(rec.text.as_deref(), Some("hello"));
}

#[test]
fn test_add_appends_with_backup() {
    let dir = TempDir::new().unwrap();
    let file = write_sample_db(&dir);

    let mut opts = add_opts(&file);
    opts.name = Some("Roe".to_string());
    opts.json = true;
    let (result, text) = run(|w| add::execute(&opts, w));
    result.unwrap();
    let json: serde_json::Value = serde_json::from_str(&text).unwrap();
    assert_eq!(json["created"], false);
    assert_eq!(json["record"]["index"], 2);
    assert_eq!(json["record"]["unique_id"], 3);
    assert!(json["backup_path"].as_str().unwrap().ends_with(".bak"));

    let db = SmsDatabase::open(&file).unwrap();
    assert_eq!(db.len(), 3);
    assert_eq!(db.get(2).unwrap().name.as_deref(), Some("Roe"));
}

#[test]
fn test_add_rejects_pending_folder() {
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("fresh.pdb").to_str().unwrap().to_string();

    let mut opts = add_opts(&file);
    opts.folder = "pending".to_string();
    let (result, _) = run(|w| add::execute(&opts, w));
    assert!(matches!(result, Err(SmsError::UnsupportedCategory(2))));
    assert!(!std::path::Path::new(&file).exists());
}

#[test]
fn test_add_rejects_new_inbox_record() {
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("fresh.pdb").to_str().unwrap().to_string();

    let mut opts = add_opts(&file);
    opts.folder = "inbox".to_string();
    let (result, _) = run(|w| add::execute(&opts, w));
    assert!(matches!(result, Err(SmsError::Argument(_))));
    assert!(!std::path::Path::new(&file).exists());
}

#[test]
fn test_add_rejects_non_latin1_text() {
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("fresh.pdb").to_str().unwrap().to_string();

    let mut opts = add_opts(&file);
    opts.text = "snowman \u{2603}".to_string();
    let (result, _) = run(|w| add::execute(&opts, w));
    assert!(matches!(result, Err(SmsError::Argument(_))));
}

#[test]
fn test_add_logs_record_write() {
    let dir = TempDir::new().unwrap();
    let file = write_sample_db(&dir);
    let log_path = dir.path().join("audit.ndjson");
    let logger = Arc::new(AuditLogger::open(log_path.to_str().unwrap()).unwrap());

    let mut opts = add_opts(&file);
    opts.no_backup = true;
    opts.audit_logger = Some(logger);
    let (result, _) = run(|w| add::execute(&opts, w));
    result.unwrap();

    let log = fs::read_to_string(&log_path).unwrap();
    let record_write: serde_json::Value = log
        .lines()
        .map(|l| serde_json::from_str::<serde_json::Value>(l).unwrap())
        .find(|e| e["event"] == "record_write")
        .unwrap();
    assert_eq!(record_write["record_index"], 2);
    assert_eq!(record_write["folder"], "Sent");
    assert_eq!(record_write["operation"], "add");
}
