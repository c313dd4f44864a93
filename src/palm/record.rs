//! The structured SMS record.
//!
//! [`SmsRecord`] is what [`decode`](crate::palm::decode::decode) produces and
//! [`encode`](crate::palm::encode::encode) consumes. Optional text fields are
//! `Option`s: `None` means the field is absent from the on-disk layout, which
//! matters for Inbox records where `name`/`first_name` appear only when the
//! name flag in `unknown2` is set.
//!
//! `unknown1`, `unknown2` and `unknown3` are opaque. Their meaning was never
//! established; they are carried byte-for-byte so that re-encoding an
//! unmodified record reproduces the original payload.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Serialize;

use crate::palm::constants::*;
use crate::palm::folder::Folder;

/// A decoded SMS message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SmsRecord {
    /// Folder (record category). Selects the record layout.
    pub folder: Folder,
    /// Record marker, `SMSh` in every known database. Bytes 0-3.
    pub header_tag: [u8; 4],
    /// Opaque. Bytes 4-5.
    pub unknown1: [u8; 2],
    /// Seconds since 1970-01-01, device local clock. Bytes 6-9 on disk,
    /// stored as seconds since 1904-01-01.
    pub timestamp: i64,
    /// Opaque, except for the Inbox name flag in byte 7. Bytes 10-35.
    pub unknown2: [u8; 26],
    /// Sender (Inbox) or recipient (Sent) phone number.
    pub phone: Option<String>,
    /// Contact last name.
    pub name: Option<String>,
    /// Contact first name.
    pub first_name: Option<String>,
    /// Opaque span between the name fields and the message body (Inbox only).
    pub unknown3: Vec<u8>,
    /// Message body.
    pub text: Option<String>,
}

impl SmsRecord {
    /// Construct a fresh record: folder Sent, timestamp now, `SMSh` marker,
    /// all text fields unset and opaque spans zeroed/empty.
    ///
    /// Records built this way encode to a well-formed payload, but nothing
    /// guarantees the device accepts zeroed opaque spans.
    pub fn new() -> Self {
        Self::with_timestamp(Utc::now().timestamp())
    }

    /// Same as [`SmsRecord::new`] with an explicit timestamp.
    pub fn with_timestamp(timestamp: i64) -> Self {
        SmsRecord {
            folder: Folder::Sent,
            header_tag: SMS_HEADER_TAG,
            unknown1: [0; SMS_UNKNOWN1_LEN],
            timestamp,
            unknown2: [0; SMS_UNKNOWN2_LEN],
            phone: None,
            name: None,
            first_name: None,
            unknown3: Vec::new(),
            text: None,
        }
    }

    /// Whether the record marker is the expected `SMSh`.
    pub fn has_valid_header(&self) -> bool {
        self.header_tag == SMS_HEADER_TAG
    }

    /// Whether `unknown2` flags the presence of name fields in an Inbox record.
    pub fn name_flag(&self) -> bool {
        name_flag_set(&self.unknown2)
    }

    /// Timestamp as a calendar time. No zone is attached because the device
    /// clock was local time with unknown offset.
    ///
    /// Returns `None` only for timestamps outside chrono's range.
    pub fn datetime(&self) -> Option<NaiveDateTime> {
        DateTime::from_timestamp(self.timestamp, 0).map(|dt| dt.naive_utc())
    }

    /// Display name built from first and last name, if either is non-empty.
    pub fn contact(&self) -> Option<String> {
        let parts: Vec<&str> = [self.first_name.as_deref(), self.name.as_deref()]
            .into_iter()
            .flatten()
            .filter(|s| !s.is_empty())
            .collect();
        if parts.is_empty() {
            None
        } else {
            Some(parts.join(" "))
        }
    }
}

impl Default for SmsRecord {
    fn default() -> Self {
        Self::new()
    }
}

/// Inbox name flag test on a raw `unknown2` span.
pub(crate) fn name_flag_set(unknown2: &[u8]) -> bool {
    unknown2
        .get(SMS_NAME_FLAG_BYTE)
        .is_some_and(|b| b >> 4 == SMS_NAME_FLAG_NIBBLE)
}
