//! SMS folder (record category) definitions.
//!
//! The low nibble of each PDB record's attribute byte is a category index.
//! The SMS application uses categories 0-2 as message folders, and the folder
//! decides which record layout the codec applies.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::SmsError;

/// Folder display names, indexed by folder number.
///
/// The third label is inferred from sample databases and is unverified.
pub const FOLDERS: [&str; 3] = ["Inbox", "Sent", "Pending"];

/// Message folder, stored on disk as the record's category nibble.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Folder {
    /// Received messages (category 0)
    Inbox,
    /// Sent messages (category 1)
    Sent,
    /// Queued messages (category 2); record layout not implemented
    Pending,
}

impl Folder {
    /// Map a category value to a folder.
    ///
    /// # Examples
    ///
    /// ```
    /// use palmsms::palm::folder::Folder;
    ///
    /// assert_eq!(Folder::from_u8(0).unwrap(), Folder::Inbox);
    /// assert_eq!(Folder::from_u8(2).unwrap(), Folder::Pending);
    /// assert!(Folder::from_u8(3).is_err());
    /// ```
    pub fn from_u8(value: u8) -> Result<Self, SmsError> {
        match value {
            0 => Ok(Folder::Inbox),
            1 => Ok(Folder::Sent),
            2 => Ok(Folder::Pending),
            other => Err(SmsError::UnsupportedCategory(other)),
        }
    }

    /// Category value written to the record attribute byte.
    pub fn as_u8(self) -> u8 {
        match self {
            Folder::Inbox => 0,
            Folder::Sent => 1,
            Folder::Pending => 2,
        }
    }

    /// Display name from [`FOLDERS`].
    pub fn name(self) -> &'static str {
        FOLDERS[self.as_u8() as usize]
    }

    /// Whether the codec has a record layout for this folder.
    pub fn is_supported(self) -> bool {
        matches!(self, Folder::Inbox | Folder::Sent)
    }

    /// Parse a folder from its display name (case-insensitive) or number.
    pub fn parse(s: &str) -> Result<Self, SmsError> {
        if let Ok(n) = s.parse::<u8>() {
            return Self::from_u8(n);
        }
        FOLDERS
            .iter()
            .position(|name| name.eq_ignore_ascii_case(s))
            .map(|i| Self::from_u8(i as u8))
            .unwrap_or_else(|| Err(SmsError::Argument(format!("Unknown folder: {}", s))))
    }
}

impl fmt::Display for Folder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}
