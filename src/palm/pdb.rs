//! Palm database (PDB) container reader and writer.
//!
//! A PDB file is a 78-byte header ([`PdbHeader`]), a record list of 8-byte
//! entries (offset, attribute byte, 24-bit unique id), two bytes of
//! placeholder padding, then the optional app-info and sort-info blocks and
//! the record payloads back to back. A record's payload runs from its offset
//! to the next record's offset, or to the end of the file for the last one.
//!
//! [`PdbFile`] only shuttles bytes: it never interprets record payloads. The
//! SMS layer on top of it lives in [`crate::palm::database`].

use std::path::Path;

use byteorder::{BigEndian, ByteOrder};
use serde::Serialize;

use crate::palm::appinfo::CategoryAppInfo;
use crate::palm::constants::*;
use crate::palm::text::{latin1_to_string, string_to_latin1, until_nul};
use crate::SmsError;

/// Parsed PDB header (78 bytes at the start of every database file).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PdbHeader {
    /// Database name, NUL-padded to 32 bytes on disk. Bytes 0-31.
    pub name: String,
    /// Database attribute flags. Bytes 32-33.
    pub attributes: u16,
    /// Application-defined version. Bytes 34-35.
    pub version: u16,
    /// Creation time, seconds since 1904-01-01. Bytes 36-39.
    pub creation_time: u32,
    /// Last modification time. Bytes 40-43.
    pub modification_time: u32,
    /// Last HotSync backup time. Bytes 44-47.
    pub backup_time: u32,
    /// Modification counter. Bytes 48-51.
    pub modification_number: u32,
    /// Database type code (`DATA`). Bytes 60-63.
    pub type_code: [u8; 4],
    /// Creator code (`SMS!`). Bytes 64-67.
    pub creator: [u8; 4],
    /// Seed for record unique ids. Bytes 68-71.
    pub unique_id_seed: u32,
}

impl PdbHeader {
    /// Parse the fixed header fields. Offsets and the record count are read
    /// separately by [`PdbFile::from_bytes`].
    pub fn parse(data: &[u8]) -> Option<Self> {
        if data.len() < PDB_HEADER_SIZE {
            return None;
        }

        let mut type_code = [0u8; 4];
        type_code.copy_from_slice(&data[PDB_OFF_TYPE..PDB_OFF_TYPE + 4]);
        let mut creator = [0u8; 4];
        creator.copy_from_slice(&data[PDB_OFF_CREATOR..PDB_OFF_CREATOR + 4]);

        Some(PdbHeader {
            name: latin1_to_string(until_nul(&data[PDB_OFF_NAME..PDB_OFF_NAME + PDB_NAME_LEN])),
            attributes: BigEndian::read_u16(&data[PDB_OFF_ATTRIBUTES..]),
            version: BigEndian::read_u16(&data[PDB_OFF_VERSION..]),
            creation_time: BigEndian::read_u32(&data[PDB_OFF_CREATION_TIME..]),
            modification_time: BigEndian::read_u32(&data[PDB_OFF_MODIFICATION_TIME..]),
            backup_time: BigEndian::read_u32(&data[PDB_OFF_BACKUP_TIME..]),
            modification_number: BigEndian::read_u32(&data[PDB_OFF_MODIFICATION_NUMBER..]),
            type_code,
            creator,
            unique_id_seed: BigEndian::read_u32(&data[PDB_OFF_UNIQUE_ID_SEED..]),
        })
    }

    /// Returns true if this is a resource database (`.prc`), not a record database.
    pub fn is_resource_db(&self) -> bool {
        self.attributes & PDB_ATTR_RESOURCE != 0
    }

    /// Returns true if type and creator identify an SMS database.
    pub fn is_sms_db(&self) -> bool {
        self.type_code == SMS_DB_TYPE && self.creator == SMS_DB_CREATOR
    }

    /// Type code as text (e.g. `DATA`).
    pub fn type_str(&self) -> String {
        latin1_to_string(&self.type_code)
    }

    /// Creator code as text (e.g. `SMS!`).
    pub fn creator_str(&self) -> String {
        latin1_to_string(&self.creator)
    }
}

/// One entry of the record list plus its payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RawRecord {
    /// Attribute byte: flags in the high nibble, category in the low nibble.
    pub attributes: u8,
    /// 24-bit record unique id.
    pub unique_id: u32,
    /// Record payload.
    pub data: Vec<u8>,
}

impl RawRecord {
    /// Category nibble.
    pub fn category(&self) -> u8 {
        self.attributes & REC_ATTR_CATEGORY_MASK
    }

    /// Flag bits without the category.
    pub fn flags(&self) -> u8 {
        self.attributes & !REC_ATTR_CATEGORY_MASK
    }

    /// Record is marked deleted.
    pub fn is_deleted(&self) -> bool {
        self.attributes & REC_ATTR_DELETE != 0
    }

    /// Record is marked dirty (modified since last sync).
    pub fn is_dirty(&self) -> bool {
        self.attributes & REC_ATTR_DIRTY != 0
    }

    /// Record is marked busy.
    pub fn is_busy(&self) -> bool {
        self.attributes & REC_ATTR_BUSY != 0
    }

    /// Record is marked private.
    pub fn is_secret(&self) -> bool {
        self.attributes & REC_ATTR_SECRET != 0
    }
}

/// An in-memory Palm record database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PdbFile {
    pub header: PdbHeader,
    pub app_info: Option<Vec<u8>>,
    pub sort_info: Option<Vec<u8>>,
    pub records: Vec<RawRecord>,
}

impl PdbFile {
    /// Read and parse a PDB file from disk.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, SmsError> {
        let path = path.as_ref();
        let data = std::fs::read(path)
            .map_err(|e| SmsError::Io(format!("Cannot read {}: {}", path.display(), e)))?;
        Self::from_bytes(&data)
            .map_err(|e| match e {
                SmsError::Parse(msg) => SmsError::Parse(format!("{}: {}", path.display(), msg)),
                other => other,
            })
    }

    /// Parse a PDB image held in memory.
    pub fn from_bytes(data: &[u8]) -> Result<Self, SmsError> {
        let header = PdbHeader::parse(data).ok_or_else(|| {
            SmsError::Parse(format!(
                "File is {} bytes, too small for the {}-byte database header",
                data.len(),
                PDB_HEADER_SIZE
            ))
        })?;

        if header.is_resource_db() {
            return Err(SmsError::Parse(
                "Resource databases (.prc) are not supported".to_string(),
            ));
        }

        let app_info_offset = BigEndian::read_u32(&data[PDB_OFF_APP_INFO..]) as usize;
        let sort_info_offset = BigEndian::read_u32(&data[PDB_OFF_SORT_INFO..]) as usize;
        let num_records = BigEndian::read_u16(&data[PDB_OFF_NUM_RECORDS..]) as usize;

        let list_end = PDB_HEADER_SIZE + num_records * PDB_RECORD_ENTRY_SIZE;
        if data.len() < list_end {
            return Err(SmsError::Parse(format!(
                "Record list for {} records runs past end of file ({} bytes)",
                num_records,
                data.len()
            )));
        }

        let mut entries = Vec::with_capacity(num_records);
        for i in 0..num_records {
            let e = &data[PDB_HEADER_SIZE + i * PDB_RECORD_ENTRY_SIZE..];
            let offset = BigEndian::read_u32(e) as usize;
            let attributes = e[4];
            let unique_id = BigEndian::read_u24(&e[5..]);
            entries.push((offset, attributes, unique_id));
        }

        for (i, &(offset, _, _)) in entries.iter().enumerate() {
            if offset < list_end || offset > data.len() {
                return Err(SmsError::Parse(format!(
                    "Record {} offset {} is outside the data area ({}..{})",
                    i,
                    offset,
                    list_end,
                    data.len()
                )));
            }
            if i > 0 && offset < entries[i - 1].0 {
                return Err(SmsError::Parse(format!(
                    "Record {} offset {} precedes record {} offset {}",
                    i,
                    offset,
                    i - 1,
                    entries[i - 1].0
                )));
            }
        }

        let first_record = entries.first().map(|e| e.0).unwrap_or(data.len());

        let app_info = if app_info_offset != 0 {
            let end = if sort_info_offset != 0 {
                sort_info_offset
            } else {
                first_record
            };
            Some(block(data, app_info_offset, end, "app-info")?)
        } else {
            None
        };

        let sort_info = if sort_info_offset != 0 {
            Some(block(data, sort_info_offset, first_record, "sort-info")?)
        } else {
            None
        };

        let records = entries
            .iter()
            .enumerate()
            .map(|(i, &(offset, attributes, unique_id))| {
                let end = entries.get(i + 1).map(|e| e.0).unwrap_or(data.len());
                RawRecord {
                    attributes,
                    unique_id,
                    data: data[offset..end].to_vec(),
                }
            })
            .collect();

        Ok(PdbFile {
            header,
            app_info,
            sort_info,
            records,
        })
    }

    /// Parsed category table, if the app-info block holds one.
    pub fn categories(&self) -> Option<CategoryAppInfo> {
        CategoryAppInfo::from_app_info(self.app_info.as_deref())
    }

    /// Serialize to a PDB image. Offsets are recomputed; the record order,
    /// attributes and unique ids are written as held.
    pub fn to_bytes(&self) -> Result<Vec<u8>, SmsError> {
        if self.records.len() > u16::MAX as usize {
            return Err(SmsError::Argument(format!(
                "{} records exceed the {} a database can hold",
                self.records.len(),
                u16::MAX
            )));
        }

        let mut name = string_to_latin1(&self.header.name)?;
        // Name must keep a terminator inside its 32 bytes.
        name.truncate(PDB_NAME_LEN - 1);

        let list_end =
            PDB_HEADER_SIZE + self.records.len() * PDB_RECORD_ENTRY_SIZE + PDB_PLACEHOLDER_SIZE;
        let app_info_len = self.app_info.as_ref().map_or(0, Vec::len);
        let sort_info_len = self.sort_info.as_ref().map_or(0, Vec::len);
        let data_len: usize = self.records.iter().map(|r| r.data.len()).sum();
        let total = list_end + app_info_len + sort_info_len + data_len;
        if total > u32::MAX as usize {
            return Err(SmsError::Argument(format!(
                "Database image of {} bytes exceeds 32-bit offsets",
                total
            )));
        }

        let mut out = vec![0u8; list_end];
        let h = &self.header;
        out[PDB_OFF_NAME..PDB_OFF_NAME + name.len()].copy_from_slice(&name);
        BigEndian::write_u16(&mut out[PDB_OFF_ATTRIBUTES..], h.attributes);
        BigEndian::write_u16(&mut out[PDB_OFF_VERSION..], h.version);
        BigEndian::write_u32(&mut out[PDB_OFF_CREATION_TIME..], h.creation_time);
        BigEndian::write_u32(&mut out[PDB_OFF_MODIFICATION_TIME..], h.modification_time);
        BigEndian::write_u32(&mut out[PDB_OFF_BACKUP_TIME..], h.backup_time);
        BigEndian::write_u32(&mut out[PDB_OFF_MODIFICATION_NUMBER..], h.modification_number);
        out[PDB_OFF_TYPE..PDB_OFF_TYPE + 4].copy_from_slice(&h.type_code);
        out[PDB_OFF_CREATOR..PDB_OFF_CREATOR + 4].copy_from_slice(&h.creator);
        BigEndian::write_u32(&mut out[PDB_OFF_UNIQUE_ID_SEED..], h.unique_id_seed);
        BigEndian::write_u32(&mut out[PDB_OFF_NEXT_RECORD_LIST..], 0);
        BigEndian::write_u16(&mut out[PDB_OFF_NUM_RECORDS..], self.records.len() as u16);

        let mut offset = list_end;
        if let Some(ref app_info) = self.app_info {
            BigEndian::write_u32(&mut out[PDB_OFF_APP_INFO..], offset as u32);
            offset += app_info.len();
        }
        if let Some(ref sort_info) = self.sort_info {
            BigEndian::write_u32(&mut out[PDB_OFF_SORT_INFO..], offset as u32);
            offset += sort_info.len();
        }

        for (i, rec) in self.records.iter().enumerate() {
            if rec.unique_id > REC_UNIQUE_ID_MAX {
                return Err(SmsError::Argument(format!(
                    "Record {} unique id {:#x} does not fit in 24 bits",
                    i, rec.unique_id
                )));
            }
            let e = PDB_HEADER_SIZE + i * PDB_RECORD_ENTRY_SIZE;
            BigEndian::write_u32(&mut out[e..], offset as u32);
            out[e + 4] = rec.attributes;
            BigEndian::write_u24(&mut out[e + 5..], rec.unique_id);
            offset += rec.data.len();
        }

        out.reserve(total - list_end);
        if let Some(ref app_info) = self.app_info {
            out.extend_from_slice(app_info);
        }
        if let Some(ref sort_info) = self.sort_info {
            out.extend_from_slice(sort_info);
        }
        for rec in &self.records {
            out.extend_from_slice(&rec.data);
        }

        Ok(out)
    }

    /// Serialize and write to `path`, replacing any existing file.
    pub fn write<P: AsRef<Path>>(&self, path: P) -> Result<(), SmsError> {
        let path = path.as_ref();
        let bytes = self.to_bytes()?;
        std::fs::write(path, bytes)
            .map_err(|e| SmsError::Io(format!("Cannot write {}: {}", path.display(), e)))
    }
}

fn block(data: &[u8], start: usize, end: usize, what: &str) -> Result<Vec<u8>, SmsError> {
    if start > end || end > data.len() {
        return Err(SmsError::Parse(format!(
            "{} block {}..{} is outside the file ({} bytes)",
            what,
            start,
            end,
            data.len()
        )));
    }
    Ok(data[start..end].to_vec())
}
