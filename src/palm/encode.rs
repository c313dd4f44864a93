//! [`SmsRecord`] back to raw record bytes.
//!
//! The inverse of [`decode`](crate::palm::decode::decode) for records it
//! produced: an unmodified decoded record re-encodes to the original bytes,
//! provided the source had nothing after the Inbox message body or after the
//! Sent text terminator. Records built with [`SmsRecord::new`] encode with
//! zeroed/empty opaque spans; whether the device accepts those is unknown.

use byteorder::{BigEndian, ByteOrder};

use crate::palm::constants::*;
use crate::palm::folder::Folder;
use crate::palm::record::SmsRecord;
use crate::palm::text::{push_cstr, string_to_latin1};
use crate::SmsError;

/// Encode one record payload.
///
/// Fails with [`SmsError::UnsupportedCategory`] for folders without a known
/// layout, and with [`SmsError::Argument`] when the timestamp does not fit the
/// on-disk 32-bit field or a string holds characters outside Latin-1.
pub fn encode(record: &SmsRecord) -> Result<Vec<u8>, SmsError> {
    match record.folder {
        Folder::Inbox => encode_inbox(record),
        Folder::Sent => encode_sent(record),
        Folder::Pending => Err(SmsError::UnsupportedCategory(record.folder.as_u8())),
    }
}

/// Convert Unix seconds to the on-disk 1904-epoch value.
pub fn unix_to_palm(timestamp: i64) -> Result<u32, SmsError> {
    timestamp
        .checked_add(PALM_EPOCH_OFFSET)
        .and_then(|raw| u32::try_from(raw).ok())
        .ok_or_else(|| {
            SmsError::Argument(format!(
                "Timestamp {} is outside the 1904-2040 range of the on-disk field",
                timestamp
            ))
        })
}

fn encode_prefix(record: &SmsRecord, out: &mut Vec<u8>) -> Result<(), SmsError> {
    let mut buf = [0u8; SMS_PREFIX_LEN];
    buf[SMS_OFF_HEADER_TAG..SMS_OFF_UNKNOWN1].copy_from_slice(&record.header_tag);
    buf[SMS_OFF_UNKNOWN1..SMS_OFF_TIMESTAMP].copy_from_slice(&record.unknown1);
    BigEndian::write_u32(
        &mut buf[SMS_OFF_TIMESTAMP..SMS_OFF_UNKNOWN2],
        unix_to_palm(record.timestamp)?,
    );
    buf[SMS_OFF_UNKNOWN2..].copy_from_slice(&record.unknown2);
    out.extend_from_slice(&buf);
    Ok(())
}

fn encode_inbox(record: &SmsRecord) -> Result<Vec<u8>, SmsError> {
    let mut out = Vec::with_capacity(SMS_PREFIX_LEN + 64);
    encode_prefix(record, &mut out)?;
    push_cstr(&mut out, record.phone.as_deref())?;

    if record.name.is_some() || record.first_name.is_some() {
        push_cstr(&mut out, record.name.as_deref())?;
        push_cstr(&mut out, record.first_name.as_deref())?;
    }

    out.extend_from_slice(&record.unknown3);
    // Inbox bodies are stored without a terminator.
    if let Some(text) = record.text.as_deref() {
        out.extend_from_slice(&string_to_latin1(text)?);
    }
    Ok(out)
}

fn encode_sent(record: &SmsRecord) -> Result<Vec<u8>, SmsError> {
    let mut out = Vec::with_capacity(SMS_PREFIX_LEN + 64);
    encode_prefix(record, &mut out)?;
    push_cstr(&mut out, record.phone.as_deref())?;
    push_cstr(&mut out, record.name.as_deref())?;
    push_cstr(&mut out, record.first_name.as_deref())?;
    push_cstr(&mut out, record.text.as_deref())?;
    Ok(out)
}
