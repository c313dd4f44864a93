//! Raw record bytes to [`SmsRecord`].
//!
//! Every record starts with a 36-byte fixed prefix:
//!
//! | Offset | Size | Field |
//! |-------:|-----:|-------|
//! | 0 | 4 | `header_tag` (`SMSh`) |
//! | 4 | 2 | `unknown1` |
//! | 6 | 4 | timestamp, u32 BE, seconds since 1904-01-01 |
//! | 10 | 26 | `unknown2` |
//!
//! What follows depends on the folder:
//!
//! - **Inbox**: `phone\0`, then `name\0first_name\0` only when the high nibble
//!   of `unknown2[7]` is `4`, then `unknown3` (everything up to and including
//!   the first ASCII digit followed by a null), then the message body running
//!   to the next null or the end of the record.
//! - **Sent**: `phone\0name\0first_name\0text\0`.
//!
//! The Inbox `unknown3` boundary is a heuristic recovered from sample files,
//! not a documented rule. It is ported literally: the first digit+null pair
//! after the name fields ends the span.

use byteorder::{BigEndian, ByteOrder};

use crate::palm::constants::*;
use crate::palm::folder::Folder;
use crate::palm::record::{name_flag_set, SmsRecord};
use crate::palm::text::{latin1_to_string, split_cstr, until_nul};
use crate::SmsError;

/// Decode one record payload.
///
/// `category` is the record's category nibble from the container. Only Inbox
/// (0) and Sent (1) have known layouts; anything else fails with
/// [`SmsError::UnsupportedCategory`] before the bytes are looked at.
///
/// # Examples
///
/// ```
/// use palmsms::palm::decode::decode;
/// use palmsms::SmsError;
///
/// assert!(matches!(decode(2, b"SMSh"), Err(SmsError::UnsupportedCategory(2))));
/// assert!(matches!(decode(0, b"SMSh"), Err(SmsError::MalformedRecord(_))));
/// ```
pub fn decode(category: u8, raw: &[u8]) -> Result<SmsRecord, SmsError> {
    let folder = Folder::from_u8(category)?;
    match folder {
        Folder::Inbox => decode_inbox(raw),
        Folder::Sent => decode_sent(raw),
        Folder::Pending => Err(SmsError::UnsupportedCategory(category)),
    }
}

/// Convert an on-disk 1904-epoch timestamp to Unix seconds.
///
/// The result is signed: raw values below the epoch offset are dates before
/// 1970 and come out negative rather than wrapping.
pub fn palm_to_unix(raw: u32) -> i64 {
    i64::from(raw) - PALM_EPOCH_OFFSET
}

/// Parsed fixed prefix.
struct Prefix {
    header_tag: [u8; 4],
    unknown1: [u8; 2],
    timestamp: i64,
    unknown2: [u8; 26],
}

fn parse_prefix(raw: &[u8]) -> Result<Prefix, SmsError> {
    if raw.len() < SMS_PREFIX_LEN {
        return Err(SmsError::MalformedRecord(format!(
            "record is {} bytes, fixed prefix needs {}",
            raw.len(),
            SMS_PREFIX_LEN
        )));
    }

    let mut header_tag = [0u8; SMS_HEADER_TAG_LEN];
    header_tag.copy_from_slice(&raw[SMS_OFF_HEADER_TAG..SMS_OFF_UNKNOWN1]);
    let mut unknown1 = [0u8; SMS_UNKNOWN1_LEN];
    unknown1.copy_from_slice(&raw[SMS_OFF_UNKNOWN1..SMS_OFF_TIMESTAMP]);
    let mut unknown2 = [0u8; SMS_UNKNOWN2_LEN];
    unknown2.copy_from_slice(&raw[SMS_OFF_UNKNOWN2..SMS_PREFIX_LEN]);

    Ok(Prefix {
        header_tag,
        unknown1,
        timestamp: palm_to_unix(BigEndian::read_u32(&raw[SMS_OFF_TIMESTAMP..])),
        unknown2,
    })
}

/// Read a required null-terminated string at `*pos`, advancing past it.
fn read_cstr(raw: &[u8], pos: &mut usize, field: &str) -> Result<String, SmsError> {
    let (bytes, consumed) = split_cstr(&raw[*pos..]).ok_or_else(|| {
        SmsError::MalformedRecord(format!(
            "{} at offset {} has no null terminator",
            field, *pos
        ))
    })?;
    *pos += consumed;
    Ok(latin1_to_string(bytes))
}

/// Length of the shortest prefix of `tail` ending in an ASCII digit followed
/// by a null byte.
fn find_digit_nul(tail: &[u8]) -> Option<usize> {
    tail.windows(2)
        .position(|w| w[0].is_ascii_digit() && w[1] == 0)
        .map(|i| i + 2)
}

fn decode_inbox(raw: &[u8]) -> Result<SmsRecord, SmsError> {
    let prefix = parse_prefix(raw)?;
    let mut pos = SMS_PREFIX_LEN;

    let phone = read_cstr(raw, &mut pos, "phone")?;

    let (name, first_name) = if name_flag_set(&prefix.unknown2) {
        let name = read_cstr(raw, &mut pos, "name")?;
        let first_name = read_cstr(raw, &mut pos, "first name")?;
        (Some(name), Some(first_name))
    } else {
        (None, None)
    };

    let tail = &raw[pos..];
    let split = find_digit_nul(tail).ok_or_else(|| {
        SmsError::MalformedRecord(format!(
            "no digit+null marker after offset {} ends the unknown3 span",
            pos
        ))
    })?;

    Ok(SmsRecord {
        folder: Folder::Inbox,
        header_tag: prefix.header_tag,
        unknown1: prefix.unknown1,
        timestamp: prefix.timestamp,
        unknown2: prefix.unknown2,
        phone: Some(phone),
        name,
        first_name,
        unknown3: tail[..split].to_vec(),
        text: Some(latin1_to_string(until_nul(&tail[split..]))),
    })
}

fn decode_sent(raw: &[u8]) -> Result<SmsRecord, SmsError> {
    let prefix = parse_prefix(raw)?;
    let mut pos = SMS_PREFIX_LEN;

    let phone = read_cstr(raw, &mut pos, "phone")?;
    let name = read_cstr(raw, &mut pos, "name")?;
    let first_name = read_cstr(raw, &mut pos, "first name")?;
    // Bytes after the text terminator are not part of any known field.
    let text = read_cstr(raw, &mut pos, "text")?;

    Ok(SmsRecord {
        folder: Folder::Sent,
        header_tag: prefix.header_tag,
        unknown1: prefix.unknown1,
        timestamp: prefix.timestamp,
        unknown2: prefix.unknown2,
        phone: Some(phone),
        name: Some(name),
        first_name: Some(first_name),
        unknown3: Vec::new(),
        text: Some(text),
    })
}
