//! Shared utilities (hex formatting, audit logging for write operations).

#[cfg(feature = "cli")]
pub mod audit;
pub mod hex;
