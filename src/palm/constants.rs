/// SMS record and Palm database layout constants.
///
/// Record offsets are reverse-engineered from databases written by the
/// handheld SMS application; the PDB container values follow the Palm OS
/// File Format Specification.
// Epoch conversion
pub const PALM_EPOCH_OFFSET: i64 = 2_082_844_800; // seconds from 1904-01-01 to 1970-01-01

// SMS record fixed prefix (36 bytes total)
pub const SMS_HEADER_TAG: [u8; 4] = *b"SMSh";
pub const SMS_HEADER_TAG_LEN: usize = 4;
pub const SMS_UNKNOWN1_LEN: usize = 2;
pub const SMS_TIMESTAMP_LEN: usize = 4;
pub const SMS_UNKNOWN2_LEN: usize = 26;
pub const SMS_OFF_HEADER_TAG: usize = 0;
pub const SMS_OFF_UNKNOWN1: usize = 4;
pub const SMS_OFF_TIMESTAMP: usize = 6;
pub const SMS_OFF_UNKNOWN2: usize = 10;
pub const SMS_PREFIX_LEN: usize = 36;

// Inbox name flag: high nibble of unknown2[7]
pub const SMS_NAME_FLAG_BYTE: usize = 7;
pub const SMS_NAME_FLAG_NIBBLE: u8 = 0x4;

// PDB header (78 bytes total)
pub const PDB_HEADER_SIZE: usize = 78;
pub const PDB_NAME_LEN: usize = 32;
pub const PDB_OFF_NAME: usize = 0;
pub const PDB_OFF_ATTRIBUTES: usize = 32; // 2 bytes
pub const PDB_OFF_VERSION: usize = 34; // 2 bytes
pub const PDB_OFF_CREATION_TIME: usize = 36; // 4 bytes
pub const PDB_OFF_MODIFICATION_TIME: usize = 40; // 4 bytes
pub const PDB_OFF_BACKUP_TIME: usize = 44; // 4 bytes
pub const PDB_OFF_MODIFICATION_NUMBER: usize = 48; // 4 bytes
pub const PDB_OFF_APP_INFO: usize = 52; // 4 bytes, 0 = absent
pub const PDB_OFF_SORT_INFO: usize = 56; // 4 bytes, 0 = absent
pub const PDB_OFF_TYPE: usize = 60; // 4 bytes
pub const PDB_OFF_CREATOR: usize = 64; // 4 bytes
pub const PDB_OFF_UNIQUE_ID_SEED: usize = 68; // 4 bytes
pub const PDB_OFF_NEXT_RECORD_LIST: usize = 72; // 4 bytes, always 0 on disk
pub const PDB_OFF_NUM_RECORDS: usize = 76; // 2 bytes

// Record list entries
pub const PDB_RECORD_ENTRY_SIZE: usize = 8;
pub const PDB_PLACEHOLDER_SIZE: usize = 2;

// Database header attribute bits
pub const PDB_ATTR_RESOURCE: u16 = 0x0001;
pub const PDB_ATTR_BACKUP: u16 = 0x0008;

// Record attribute bits (upper nibble); lower nibble is the category
pub const REC_ATTR_DELETE: u8 = 0x80;
pub const REC_ATTR_DIRTY: u8 = 0x40;
pub const REC_ATTR_BUSY: u8 = 0x20;
pub const REC_ATTR_SECRET: u8 = 0x10;
pub const REC_ATTR_CATEGORY_MASK: u8 = 0x0F;
pub const REC_UNIQUE_ID_MAX: u32 = 0x00FF_FFFF;

// SMS database identity
pub const SMS_DB_TYPE: [u8; 4] = *b"DATA";
pub const SMS_DB_CREATOR: [u8; 4] = *b"SMS!";
pub const SMS_DB_DEFAULT_NAME: &str = "SMS Messages";

// Standard category app-info block (276 bytes total)
pub const APPINFO_NUM_CATEGORIES: usize = 16;
pub const APPINFO_CATEGORY_NAME_LEN: usize = 16;
pub const APPINFO_OFF_RENAMED: usize = 0; // 2 bytes
pub const APPINFO_OFF_NAMES: usize = 2; // 16 * 16 bytes
pub const APPINFO_OFF_IDS: usize = 258; // 16 bytes
pub const APPINFO_OFF_LAST_UNIQUE_ID: usize = 274; // 1 byte
pub const APPINFO_STD_SIZE: usize = 276; // includes 1 pad byte
