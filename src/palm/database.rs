//! SMS database: decode on load, encode on save.
//!
//! [`SmsDatabase`] sits on top of [`PdbFile`]. Loading calls
//! [`decode`] once per record with the category nibble from the record's
//! attribute byte; saving calls [`encode`] once per record and writes the
//! folder back into the category nibble. Record flags and unique ids ride
//! along untouched.
//!
//! Loading is fail-fast: the first record that does not decode aborts the
//! load with [`SmsError::Record`]. Tools that want to report on every record
//! individually use [`SmsDatabase::scan`] instead.

use std::path::Path;

use chrono::Utc;

use crate::palm::appinfo::CategoryAppInfo;
use crate::palm::constants::*;
use crate::palm::decode::decode;
use crate::palm::encode::{encode, unix_to_palm};
use crate::palm::folder::Folder;
use crate::palm::pdb::{PdbFile, PdbHeader, RawRecord};
use crate::palm::record::SmsRecord;
use crate::SmsError;

/// A decoded record with its container metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SmsEntry {
    /// Attribute flag bits (delete/dirty/busy/secret). The category nibble
    /// is taken from `record.folder` on save.
    pub flags: u8,
    /// 24-bit record unique id.
    pub unique_id: u32,
    pub record: SmsRecord,
}

/// Per-record outcome from [`SmsDatabase::scan`].
#[derive(Debug)]
pub struct ScannedRecord {
    pub index: usize,
    pub category: u8,
    pub unique_id: u32,
    pub size: usize,
    pub result: Result<SmsRecord, SmsError>,
}

/// An SMS database held in memory.
#[derive(Debug, Clone)]
pub struct SmsDatabase {
    header: PdbHeader,
    app_info: Option<Vec<u8>>,
    sort_info: Option<Vec<u8>>,
    entries: Vec<SmsEntry>,
}

impl SmsDatabase {
    /// Create an empty SMS database named `name`.
    pub fn new(name: &str) -> Result<Self, SmsError> {
        let now = unix_to_palm(Utc::now().timestamp())?;
        Ok(SmsDatabase {
            header: PdbHeader {
                name: name.to_string(),
                attributes: PDB_ATTR_BACKUP,
                version: 0,
                creation_time: now,
                modification_time: now,
                backup_time: 0,
                modification_number: 0,
                type_code: SMS_DB_TYPE,
                creator: SMS_DB_CREATOR,
                unique_id_seed: 0,
            },
            app_info: Some(CategoryAppInfo::default().to_bytes()?),
            sort_info: None,
            entries: Vec::new(),
        })
    }

    /// Read and decode a database file.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, SmsError> {
        Self::from_pdb(PdbFile::open(path)?)
    }

    /// Decode a database image held in memory.
    pub fn from_bytes(data: &[u8]) -> Result<Self, SmsError> {
        Self::from_pdb(PdbFile::from_bytes(data)?)
    }

    /// Decode every record of a parsed container.
    pub fn from_pdb(pdb: PdbFile) -> Result<Self, SmsError> {
        let entries = pdb
            .records
            .iter()
            .enumerate()
            .map(|(i, raw)| {
                let record = decode(raw.category(), &raw.data).map_err(|e| e.at_record(i))?;
                Ok(SmsEntry {
                    flags: raw.flags(),
                    unique_id: raw.unique_id,
                    record,
                })
            })
            .collect::<Result<Vec<_>, SmsError>>()?;

        Ok(SmsDatabase {
            header: pdb.header,
            app_info: pdb.app_info,
            sort_info: pdb.sort_info,
            entries,
        })
    }

    /// Decode each record independently, keeping failures alongside successes.
    pub fn scan(pdb: &PdbFile) -> Vec<ScannedRecord> {
        pdb.records
            .iter()
            .enumerate()
            .map(|(index, raw)| ScannedRecord {
                index,
                category: raw.category(),
                unique_id: raw.unique_id,
                size: raw.data.len(),
                result: decode(raw.category(), &raw.data),
            })
            .collect()
    }

    /// Encode every record into a container, bumping the modification time
    /// and counter.
    pub fn to_pdb(&self) -> Result<PdbFile, SmsError> {
        let records = self
            .entries
            .iter()
            .enumerate()
            .map(|(i, entry)| {
                let data = encode(&entry.record).map_err(|e| e.at_record(i))?;
                Ok(RawRecord {
                    attributes: (entry.flags & !REC_ATTR_CATEGORY_MASK)
                        | entry.record.folder.as_u8(),
                    unique_id: entry.unique_id,
                    data,
                })
            })
            .collect::<Result<Vec<_>, SmsError>>()?;

        let mut header = self.header.clone();
        header.modification_time = unix_to_palm(Utc::now().timestamp())?;
        header.modification_number = header.modification_number.wrapping_add(1);

        Ok(PdbFile {
            header,
            app_info: self.app_info.clone(),
            sort_info: self.sort_info.clone(),
            records,
        })
    }

    /// Encode to a PDB image.
    pub fn to_bytes(&self) -> Result<Vec<u8>, SmsError> {
        self.to_pdb()?.to_bytes()
    }

    /// Encode and write to `path`.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), SmsError> {
        self.to_pdb()?.write(path)
    }

    /// Database header.
    pub fn header(&self) -> &PdbHeader {
        &self.header
    }

    /// Parsed category table, if the app-info block holds one.
    pub fn categories(&self) -> Option<CategoryAppInfo> {
        CategoryAppInfo::from_app_info(self.app_info.as_deref())
    }

    /// All entries in file order.
    pub fn entries(&self) -> &[SmsEntry] {
        &self.entries
    }

    /// All records in file order.
    pub fn records(&self) -> impl Iterator<Item = &SmsRecord> {
        self.entries.iter().map(|e| &e.record)
    }

    /// Records belonging to `folder`.
    pub fn iter_folder(&self, folder: Folder) -> impl Iterator<Item = &SmsRecord> {
        self.records().filter(move |r| r.folder == folder)
    }

    pub fn get(&self, index: usize) -> Option<&SmsRecord> {
        self.entries.get(index).map(|e| &e.record)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut SmsRecord> {
        self.entries.get_mut(index).map(|e| &mut e.record)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Append a record, marking it dirty and assigning the next unique id.
    /// Returns the new record's index.
    pub fn push(&mut self, record: SmsRecord) -> Result<usize, SmsError> {
        let unique_id = self.next_unique_id()?;
        self.entries.push(SmsEntry {
            flags: REC_ATTR_DIRTY,
            unique_id,
            record,
        });
        Ok(self.entries.len() - 1)
    }

    /// Remove and return the record at `index`.
    pub fn remove(&mut self, index: usize) -> Result<SmsRecord, SmsError> {
        if index >= self.entries.len() {
            return Err(SmsError::Argument(format!(
                "Record {} out of range (database has {} records)",
                index,
                self.entries.len()
            )));
        }
        Ok(self.entries.remove(index).record)
    }

    fn next_unique_id(&mut self) -> Result<u32, SmsError> {
        let max_existing = self.entries.iter().map(|e| e.unique_id).max().unwrap_or(0);
        let next = self.header.unique_id_seed.max(max_existing) + 1;
        if next > REC_UNIQUE_ID_MAX {
            return Err(SmsError::Argument(
                "Record unique id space exhausted".to_string(),
            ));
        }
        self.header.unique_id_seed = next;
        Ok(next)
    }
}
