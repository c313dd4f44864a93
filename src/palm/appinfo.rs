//! Standard category application-info block.
//!
//! Most Palm record databases, the SMS one included, start their app-info
//! block with the 276-byte category table defined by the OS:
//!
//! | Offset | Size | Field |
//! |-------:|-----:|-------|
//! | 0 | 2 | renamed-categories bitmask |
//! | 2 | 256 | 16 category names, 16 bytes each, NUL-padded |
//! | 258 | 16 | category unique ids |
//! | 274 | 1 | last unique id |
//! | 275 | 1 | padding |
//!
//! Application-specific bytes after the table are kept in
//! [`CategoryAppInfo::extra`] and written back unchanged. The raw 16-byte
//! name slots and the pad byte are kept too, so an unmodified table
//! serializes to exactly the bytes it was parsed from.

use byteorder::{BigEndian, ByteOrder};
use serde::Serialize;

use crate::palm::constants::*;
use crate::palm::folder::FOLDERS;
use crate::palm::text::{latin1_to_string, string_to_latin1, until_nul};
use crate::SmsError;

/// One entry of the category table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Category {
    pub name: String,
    pub id: u8,
    pub renamed: bool,
    /// Name slot as stored, including any bytes after the terminator.
    /// Written back only while it still holds `name`.
    #[serde(skip)]
    slot: [u8; APPINFO_CATEGORY_NAME_LEN],
}

impl Category {
    /// A category whose name slot is the NUL-padded `name`.
    pub fn new(name: &str, id: u8) -> Self {
        let mut slot = [0u8; APPINFO_CATEGORY_NAME_LEN];
        if let Ok(bytes) = string_to_latin1(name) {
            let n = bytes.len().min(APPINFO_CATEGORY_NAME_LEN - 1);
            slot[..n].copy_from_slice(&bytes[..n]);
        }
        Category {
            name: name.to_string(),
            id,
            renamed: false,
            slot,
        }
    }

    /// Bytes for this category's name slot.
    fn slot_bytes(&self) -> Result<[u8; APPINFO_CATEGORY_NAME_LEN], SmsError> {
        if latin1_to_string(until_nul(&self.slot)) == self.name {
            return Ok(self.slot);
        }
        let name = string_to_latin1(&self.name)?;
        if name.len() >= APPINFO_CATEGORY_NAME_LEN {
            return Err(SmsError::Argument(format!(
                "Category name {:?} is longer than {} bytes",
                self.name,
                APPINFO_CATEGORY_NAME_LEN - 1
            )));
        }
        let mut slot = [0u8; APPINFO_CATEGORY_NAME_LEN];
        slot[..name.len()].copy_from_slice(&name);
        Ok(slot)
    }
}

/// Parsed category app-info block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryAppInfo {
    /// Always 16 entries; unused ones have an empty name.
    pub categories: Vec<Category>,
    pub last_unique_id: u8,
    /// Pad byte at offset 275.
    #[serde(skip)]
    pub pad: u8,
    /// Bytes following the standard table.
    pub extra: Vec<u8>,
}

impl CategoryAppInfo {
    /// Parse from the raw app-info block.
    pub fn parse(data: &[u8]) -> Result<Self, SmsError> {
        if data.len() < APPINFO_STD_SIZE {
            return Err(SmsError::Parse(format!(
                "App-info block is {} bytes, category table needs {}",
                data.len(),
                APPINFO_STD_SIZE
            )));
        }

        let renamed = BigEndian::read_u16(&data[APPINFO_OFF_RENAMED..]);
        let categories = (0..APPINFO_NUM_CATEGORIES)
            .map(|i| {
                let start = APPINFO_OFF_NAMES + i * APPINFO_CATEGORY_NAME_LEN;
                let mut slot = [0u8; APPINFO_CATEGORY_NAME_LEN];
                slot.copy_from_slice(&data[start..start + APPINFO_CATEGORY_NAME_LEN]);
                Category {
                    name: latin1_to_string(until_nul(&slot)),
                    id: data[APPINFO_OFF_IDS + i],
                    renamed: renamed & (1 << i) != 0,
                    slot,
                }
            })
            .collect();

        Ok(CategoryAppInfo {
            categories,
            last_unique_id: data[APPINFO_OFF_LAST_UNIQUE_ID],
            pad: data[APPINFO_OFF_LAST_UNIQUE_ID + 1],
            extra: data[APPINFO_STD_SIZE..].to_vec(),
        })
    }

    /// Category table from an optional app-info block. Blocks too short for
    /// the standard table yield `None`.
    pub fn from_app_info(app_info: Option<&[u8]>) -> Option<Self> {
        app_info.and_then(|data| Self::parse(data).ok())
    }

    /// Serialize back to the raw block.
    pub fn to_bytes(&self) -> Result<Vec<u8>, SmsError> {
        if self.categories.len() > APPINFO_NUM_CATEGORIES {
            return Err(SmsError::Argument(format!(
                "{} categories exceed the table size of {}",
                self.categories.len(),
                APPINFO_NUM_CATEGORIES
            )));
        }

        let mut out = vec![0u8; APPINFO_STD_SIZE];
        let mut renamed = 0u16;
        for (i, cat) in self.categories.iter().enumerate() {
            let start = APPINFO_OFF_NAMES + i * APPINFO_CATEGORY_NAME_LEN;
            out[start..start + APPINFO_CATEGORY_NAME_LEN].copy_from_slice(&cat.slot_bytes()?);
            out[APPINFO_OFF_IDS + i] = cat.id;
            if cat.renamed {
                renamed |= 1 << i;
            }
        }
        BigEndian::write_u16(&mut out[APPINFO_OFF_RENAMED..], renamed);
        out[APPINFO_OFF_LAST_UNIQUE_ID] = self.last_unique_id;
        out[APPINFO_OFF_LAST_UNIQUE_ID + 1] = self.pad;
        out.extend_from_slice(&self.extra);
        Ok(out)
    }

    /// Name of category `index`, if non-empty.
    pub fn category_name(&self, index: u8) -> Option<&str> {
        self.categories
            .get(index as usize)
            .map(|c| c.name.as_str())
            .filter(|n| !n.is_empty())
    }
}

impl Default for CategoryAppInfo {
    /// Table for a new SMS database: categories 0-2 named after the folders.
    fn default() -> Self {
        let categories = (0..APPINFO_NUM_CATEGORIES)
            .map(|i| match FOLDERS.get(i) {
                Some(name) => Category::new(name, i as u8),
                None => Category::new("", 0),
            })
            .collect();
        CategoryAppInfo {
            categories,
            last_unique_id: (FOLDERS.len() - 1) as u8,
            pad: 0,
            extra: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_table() {
        let info = CategoryAppInfo::default();
        assert_eq!(info.categories.len(), 16);
        assert_eq!(info.category_name(0), Some("Inbox"));
        assert_eq!(info.category_name(1), Some("Sent"));
        assert_eq!(info.category_name(2), Some("Pending"));
        assert_eq!(info.category_name(3), None);
        assert_eq!(info.category_name(40), None);
    }

    #[test]
    fn test_serialized_layout() {
        let mut info = CategoryAppInfo::default();
        info.categories[1].renamed = true;
        info.extra = vec![0xEE, 0xFF];
        let bytes = info.to_bytes().unwrap();
        assert_eq!(bytes.len(), APPINFO_STD_SIZE + 2);
        assert_eq!(BigEndian::read_u16(&bytes), 0b10);
        assert_eq!(&bytes[2..7], b"Inbox");
        assert_eq!(bytes[7], 0);
        assert_eq!(&bytes[18..22], b"Sent");
        assert_eq!(bytes[APPINFO_OFF_IDS + 2], 2);
        assert_eq!(bytes[APPINFO_OFF_LAST_UNIQUE_ID], 2);
        assert_eq!(&bytes[APPINFO_STD_SIZE..], &[0xEE, 0xFF]);

        assert_eq!(CategoryAppInfo::parse(&bytes).unwrap(), info);
    }

    #[test]
    fn test_reserialize_keeps_slot_garbage_and_pad() {
        let mut bytes = CategoryAppInfo::default().to_bytes().unwrap();
        // "Sent\0" followed by leftovers from an earlier, longer name.
        bytes[18 + 5..18 + 9].copy_from_slice(b"xyz!");
        bytes[APPINFO_OFF_LAST_UNIQUE_ID + 1] = 0x5A;

        let info = CategoryAppInfo::parse(&bytes).unwrap();
        assert_eq!(info.category_name(1), Some("Sent"));
        assert_eq!(info.pad, 0x5A);
        assert_eq!(info.to_bytes().unwrap(), bytes);
    }

    #[test]
    fn test_renamed_category_rewrites_slot() {
        let mut bytes = CategoryAppInfo::default().to_bytes().unwrap();
        bytes[18 + 5..18 + 9].copy_from_slice(b"xyz!");

        let mut info = CategoryAppInfo::parse(&bytes).unwrap();
        info.categories[1].name = "Outbox".into();
        let out = info.to_bytes().unwrap();
        assert_eq!(&out[18..34], b"Outbox\0\0\0\0\0\0\0\0\0\0");
        assert_eq!(CategoryAppInfo::parse(&out).unwrap().category_name(1), Some("Outbox"));
    }

    #[test]
    fn test_short_block_rejected() {
        assert!(CategoryAppInfo::parse(&[0u8; 100]).is_err());
    }

    #[test]
    fn test_long_name_rejected() {
        let mut info = CategoryAppInfo::default();
        info.categories[3].name = "A very long category".into();
        assert!(matches!(info.to_bytes(), Err(SmsError::Argument(_))));
    }
}
