//! Audit logging for write operations.
//!
//! Provides [`AuditLogger`] which appends NDJSON events to a log file. Every
//! command that modifies a database (`repack`, `add`) emits structured events
//! recording which records were written, to which file, and by which
//! invocation.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::sync::Mutex;
use std::time::Instant;

use chrono::Local;
use fs2::FileExt;
use serde::Serialize;

use crate::SmsError;

/// A single audit log event, serialized as tagged NDJSON.
#[derive(Serialize)]
#[serde(tag = "event")]
pub enum AuditEvent {
    /// Emitted once at the start of a CLI invocation.
    #[serde(rename = "session_start")]
    SessionStart {
        timestamp: String,
        args: Vec<String>,
        version: String,
    },

    /// Emitted when a single record is encoded into a database (add).
    #[serde(rename = "record_write")]
    RecordWrite {
        timestamp: String,
        file: String,
        record_index: usize,
        unique_id: u32,
        folder: String,
        operation: String,
        bytes: usize,
    },

    /// Emitted when a whole database file is written (repack, add).
    #[serde(rename = "file_write")]
    FileWrite {
        timestamp: String,
        file: String,
        operation: String,
        records_written: u64,
    },

    /// Emitted when a backup file is created.
    #[serde(rename = "backup_created")]
    BackupCreated {
        timestamp: String,
        source: String,
        backup_path: String,
    },

    /// Emitted once at the end of a CLI invocation.
    #[serde(rename = "session_end")]
    SessionEnd {
        timestamp: String,
        duration_ms: u64,
        records_written: u64,
        files_written: u64,
    },
}

struct AuditLoggerInner {
    file: File,
    records_written: u64,
    files_written: u64,
}

/// Thread-safe audit logger that appends NDJSON events to a file.
///
/// File-level locking (via `fs2`) ensures safe concurrent access from
/// multiple processes.
pub struct AuditLogger {
    inner: Mutex<AuditLoggerInner>,
    start: Instant,
}

impl AuditLogger {
    /// Open (or create) the audit log file in append mode.
    pub fn open(path: &str) -> Result<Self, SmsError> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|e| SmsError::Io(format!("Cannot open audit log {}: {}", path, e)))?;

        Ok(Self {
            inner: Mutex::new(AuditLoggerInner {
                file,
                records_written: 0,
                files_written: 0,
            }),
            start: Instant::now(),
        })
    }

    /// Emit a single audit event as one NDJSON line.
    pub fn emit(&self, event: &AuditEvent) -> Result<(), SmsError> {
        let line = serde_json::to_string(event)
            .map_err(|e| SmsError::Parse(format!("Audit JSON error: {}", e)))?;

        let mut inner = self.lock_inner()?;
        inner
            .file
            .lock_exclusive()
            .map_err(|e| SmsError::Io(format!("Audit log lock error: {}", e)))?;
        writeln!(inner.file, "{}", line)
            .map_err(|e| SmsError::Io(format!("Audit log write error: {}", e)))?;
        inner
            .file
            .flush()
            .map_err(|e| SmsError::Io(format!("Audit log flush error: {}", e)))?;
        FileExt::unlock(&inner.file)
            .map_err(|e| SmsError::Io(format!("Audit log unlock error: {}", e)))?;

        Ok(())
    }

    /// Emit a `session_start` event.
    pub fn start_session(&self, args: Vec<String>) -> Result<(), SmsError> {
        self.emit(&AuditEvent::SessionStart {
            timestamp: now(),
            args,
            version: env!("CARGO_PKG_VERSION").to_string(),
        })
    }

    /// Emit a `session_end` event with accumulated counters.
    pub fn end_session(&self) -> Result<(), SmsError> {
        let inner = self.lock_inner()?;
        let duration_ms = self.start.elapsed().as_millis() as u64;
        let event = AuditEvent::SessionEnd {
            timestamp: now(),
            duration_ms,
            records_written: inner.records_written,
            files_written: inner.files_written,
        };
        drop(inner);
        self.emit(&event)
    }

    /// Log a single encoded record.
    pub fn log_record_write(
        &self,
        file: &str,
        record_index: usize,
        unique_id: u32,
        folder: &str,
        operation: &str,
        bytes: usize,
    ) -> Result<(), SmsError> {
        self.emit(&AuditEvent::RecordWrite {
            timestamp: now(),
            file: file.to_string(),
            record_index,
            unique_id,
            folder: folder.to_string(),
            operation: operation.to_string(),
            bytes,
        })?;
        self.lock_inner()?.records_written += 1;
        Ok(())
    }

    /// Log a whole-file write operation.
    pub fn log_file_write(
        &self,
        file: &str,
        operation: &str,
        records_written: u64,
    ) -> Result<(), SmsError> {
        self.emit(&AuditEvent::FileWrite {
            timestamp: now(),
            file: file.to_string(),
            operation: operation.to_string(),
            records_written,
        })?;
        self.lock_inner()?.files_written += 1;
        Ok(())
    }

    /// Log a backup file creation.
    pub fn log_backup(&self, source: &str, backup_path: &str) -> Result<(), SmsError> {
        self.emit(&AuditEvent::BackupCreated {
            timestamp: now(),
            source: source.to_string(),
            backup_path: backup_path.to_string(),
        })
    }

    fn lock_inner(&self) -> Result<std::sync::MutexGuard<'_, AuditLoggerInner>, SmsError> {
        self.inner
            .lock()
            .map_err(|_| SmsError::Io("Audit log state poisoned".to_string()))
    }
}

fn now() -> String {
    Local::now().to_rfc3339()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{BufRead, BufReader};
    use tempfile::NamedTempFile;

    fn temp_logger() -> (AuditLogger, String) {
        let tmp = NamedTempFile::new().unwrap();
        let path = tmp.path().to_str().unwrap().to_string();
        // Keep the file handle alive via the path; logger opens independently
        drop(tmp);
        let logger = AuditLogger::open(&path).unwrap();
        (logger, path)
    }

    #[test]
    fn test_writes_ndjson_lines() {
        let (logger, path) = temp_logger();
        logger
            .start_session(vec!["smsdb".into(), "add".into()])
            .unwrap();
        logger
            .log_record_write("sms.pdb", 1, 0x000102, "Sent", "add", 58)
            .unwrap();
        logger.end_session().unwrap();

        let file = File::open(&path).unwrap();
        let lines: Vec<String> = BufReader::new(file).lines().map(|l| l.unwrap()).collect();
        assert_eq!(lines.len(), 3);

        // Verify each line is valid JSON with expected event tag
        let v0: serde_json::Value = serde_json::from_str(&lines[0]).unwrap();
        assert_eq!(v0["event"], "session_start");

        let v1: serde_json::Value = serde_json::from_str(&lines[1]).unwrap();
        assert_eq!(v1["event"], "record_write");
        assert_eq!(v1["record_index"], 1);
        assert_eq!(v1["unique_id"], 258);
        assert_eq!(v1["folder"], "Sent");

        let v2: serde_json::Value = serde_json::from_str(&lines[2]).unwrap();
        assert_eq!(v2["event"], "session_end");
        assert_eq!(v2["records_written"], 1);
        assert_eq!(v2["files_written"], 0);
    }

    #[test]
    fn test_append_mode() {
        let tmp = NamedTempFile::new().unwrap();
        let path = tmp.path().to_str().unwrap().to_string();
        drop(tmp);

        // First logger writes some events
        {
            let logger = AuditLogger::open(&path).unwrap();
            logger.start_session(vec!["session1".into()]).unwrap();
        }

        // Second logger appends
        {
            let logger = AuditLogger::open(&path).unwrap();
            logger.start_session(vec!["session2".into()]).unwrap();
        }

        let file = File::open(&path).unwrap();
        let lines: Vec<String> = BufReader::new(file).lines().map(|l| l.unwrap()).collect();
        assert_eq!(lines.len(), 2);
    }

    #[test]
    fn test_session_counters() {
        let (logger, path) = temp_logger();
        logger.start_session(vec![]).unwrap();
        logger
            .log_record_write("a.pdb", 0, 1, "Inbox", "add", 40)
            .unwrap();
        logger
            .log_record_write("a.pdb", 1, 2, "Sent", "add", 44)
            .unwrap();
        logger.log_file_write("a.pdb", "repack", 10).unwrap();
        logger.end_session().unwrap();

        let file = File::open(&path).unwrap();
        let lines: Vec<String> = BufReader::new(file).lines().map(|l| l.unwrap()).collect();
        let last: serde_json::Value = serde_json::from_str(lines.last().unwrap()).unwrap();
        assert_eq!(last["records_written"], 2);
        assert_eq!(last["files_written"], 1);
    }

    #[test]
    fn test_thread_safety() {
        use std::sync::Arc;
        use std::thread;

        let (logger, path) = temp_logger();
        let logger = Arc::new(logger);

        let mut handles = Vec::new();
        for i in 0..10 {
            let lg = Arc::clone(&logger);
            handles.push(thread::spawn(move || {
                lg.log_record_write("sms.pdb", i, i as u32, "Inbox", "add", 40)
                    .unwrap();
            }));
        }

        for h in handles {
            h.join().unwrap();
        }

        let file = File::open(&path).unwrap();
        let lines: Vec<String> = BufReader::new(file).lines().map(|l| l.unwrap()).collect();
        assert_eq!(lines.len(), 10);

        // Every line should be valid JSON
        for line in &lines {
            let _: serde_json::Value = serde_json::from_str(line).unwrap();
        }
    }

    #[test]
    fn test_backup_event() {
        let (logger, path) = temp_logger();
        logger.log_backup("sms.pdb", "sms.pdb.bak").unwrap();

        let file = File::open(&path).unwrap();
        let lines: Vec<String> = BufReader::new(file).lines().map(|l| l.unwrap()).collect();
        assert_eq!(lines.len(), 1);

        let v: serde_json::Value = serde_json::from_str(&lines[0]).unwrap();
        assert_eq!(v["event"], "backup_created");
        assert_eq!(v["source"], "sms.pdb");
    }

    #[test]
    fn test_file_write_event() {
        let (logger, path) = temp_logger();
        logger.log_file_write("output.pdb", "repack", 42).unwrap();

        let file = File::open(&path).unwrap();
        let lines: Vec<String> = BufReader::new(file).lines().map(|l| l.unwrap()).collect();
        assert_eq!(lines.len(), 1);

        let v: serde_json::Value = serde_json::from_str(&lines[0]).unwrap();
        assert_eq!(v["event"], "file_write");
        assert_eq!(v["records_written"], 42);
    }
}
