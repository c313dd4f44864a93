//! Byte-string helpers shared by the record codec and the PDB container.
//!
//! Strings on the device are single-byte and null-terminated. They are mapped
//! to Rust strings through ISO-8859-1, where byte `b` is code point `U+00b`,
//! so any byte string survives a decode/encode round trip unchanged.

use crate::SmsError;

/// Decode a Latin-1 byte string.
pub fn latin1_to_string(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| b as char).collect()
}

/// Encode a string as Latin-1, failing on characters above U+00FF.
///
/// # Examples
///
/// ```
/// use palmsms::palm::text::string_to_latin1;
///
/// assert_eq!(string_to_latin1("caf\u{e9}").unwrap(), b"caf\xe9");
/// assert!(string_to_latin1("\u{20ac}").is_err());
/// ```
pub fn string_to_latin1(s: &str) -> Result<Vec<u8>, SmsError> {
    s.chars()
        .map(|c| {
            u8::try_from(u32::from(c)).map_err(|_| {
                SmsError::Argument(format!(
                    "Character {:?} (U+{:04X}) cannot be stored on the device",
                    c,
                    u32::from(c)
                ))
            })
        })
        .collect()
}

/// Split a null-terminated string off the front of `data`.
///
/// Returns the string bytes (without the terminator) and the number of bytes
/// consumed (including the terminator), or `None` if no null byte exists.
pub fn split_cstr(data: &[u8]) -> Option<(&[u8], usize)> {
    let end = data.iter().position(|&b| b == 0)?;
    Some((&data[..end], end + 1))
}

/// Bytes of `data` up to (not including) the first null, or all of `data`.
pub fn until_nul(data: &[u8]) -> &[u8] {
    match data.iter().position(|&b| b == 0) {
        Some(end) => &data[..end],
        None => data,
    }
}

/// Append `s` as Latin-1 followed by a null terminator.
pub fn push_cstr(out: &mut Vec<u8>, s: Option<&str>) -> Result<(), SmsError> {
    if let Some(s) = s {
        out.extend_from_slice(&string_to_latin1(s)?);
    }
    out.push(0);
    Ok(())
}
