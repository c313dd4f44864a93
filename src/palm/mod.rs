//! Palm OS SMS database binary format.
//!
//! The record codec lives in [`decode`] and [`encode`] and works on single
//! record payloads with no I/O. The container side ([`pdb`], [`appinfo`],
//! [`database`]) reads and writes whole `.pdb` files and calls the codec once
//! per record.
//!
//! Start with [`database::SmsDatabase::open`] to load a file, or with
//! [`decode::decode`] when the raw record bytes are already at hand.

pub mod appinfo;
pub mod constants;
pub mod database;
pub mod decode;
pub mod encode;
pub mod folder;
pub mod pdb;
pub mod record;
pub mod text;
