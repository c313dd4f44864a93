//! Palm OS SMS database toolkit.
//!
//! The `palm-sms-utils` crate (library name `palmsms`) decodes and encodes the
//! records of the SMS application database found on Palm OS handhelds
//! (creator `SMS!`, type `DATA`). Each record is a reverse-engineered binary
//! layout: a fixed prefix with a 1904-epoch timestamp, a handful of
//! null-terminated strings, and several opaque byte spans that are preserved
//! verbatim so that unmodified records re-encode to the exact same bytes.
//!
//! # CLI Reference
//!
//! The `smsdb` binary wraps the library for working with `.pdb` files.
//!
//! | Command | Purpose |
//! |---------|---------|
//! | [`smsdb info`](cli::app::Commands::Info) | Database header, categories, per-folder counts |
//! | [`smsdb list`](cli::app::Commands::List) | One line per message |
//! | [`smsdb show`](cli::app::Commands::Show) | Every decoded field of one message |
//! | [`smsdb dump`](cli::app::Commands::Dump) | Hex dump of a raw record |
//! | [`smsdb export`](cli::app::Commands::Export) | Text, JSON, or CSV export |
//! | [`smsdb verify`](cli::app::Commands::Verify) | Check decode/encode round-trip fidelity |
//! | [`smsdb repack`](cli::app::Commands::Repack) | Re-encode and rewrite a database |
//! | [`smsdb add`](cli::app::Commands::Add) | Append a new message |
//!
//! All subcommands accept `--color <auto|always|never>`, `--output <file>` and
//! `--audit-log <file>`.
//!
//! # Library API
//!
//! ## Quick example
//!
//! ```
//! use palmsms::palm::decode::decode;
//! use palmsms::palm::encode::encode;
//!
//! let mut raw = Vec::new();
//! raw.extend_from_slice(b"SMSh");
//! raw.extend_from_slice(&[0, 0]);
//! raw.extend_from_slice(&2_082_844_801u32.to_be_bytes());
//! raw.extend_from_slice(&[0u8; 26]);
//! raw.extend_from_slice(b"5551234\0Alice\0A\0hello\0");
//!
//! let record = decode(1, &raw).unwrap();
//! assert_eq!(record.timestamp, 1);
//! assert_eq!(record.text.as_deref(), Some("hello"));
//! assert_eq!(encode(&record).unwrap(), raw);
//! ```
//!
//! ## Module overview
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`palm::decode`] | Raw record bytes to [`SmsRecord`](palm::record::SmsRecord) |
//! | [`palm::encode`] | [`SmsRecord`](palm::record::SmsRecord) back to raw bytes |
//! | [`palm::record`] | The structured record type |
//! | [`palm::folder`] | Folder (category) enum and display names |
//! | [`palm::pdb`] | Palm database container reader/writer |
//! | [`palm::appinfo`] | Standard category application-info block |
//! | [`palm::database`] | SMS database: decode on load, encode on save |
//! | [`palm::constants`] | Record and container layout constants |

#[cfg(feature = "cli")]
pub mod cli;
pub mod palm;
pub mod util;

use thiserror::Error;

/// Errors returned by `palmsms` operations.
#[derive(Error, Debug)]
pub enum SmsError {
    /// An I/O error occurred (file open, read, or write failure).
    #[error("I/O error: {0}")]
    Io(String),

    /// A container-level parse error (bad PDB header, offsets out of range).
    #[error("Parse error: {0}")]
    Parse(String),

    /// An invalid argument was supplied (bad record index, unencodable value, etc.).
    #[error("Invalid argument: {0}")]
    Argument(String),

    /// The category/folder value has no implemented record layout.
    #[error("Unsupported category: {0}")]
    UnsupportedCategory(u8),

    /// The record bytes are too short or lack a required terminator.
    #[error("Malformed record: {0}")]
    MalformedRecord(String),

    /// A per-record failure raised while loading or saving a whole database.
    #[error("Record {index}: {source}")]
    Record {
        index: usize,
        #[source]
        source: Box<SmsError>,
    },
}

impl SmsError {
    /// Attach a record index to this error.
    pub fn at_record(self, index: usize) -> Self {
        SmsError::Record {
            index,
            source: Box::new(self),
        }
    }
}
