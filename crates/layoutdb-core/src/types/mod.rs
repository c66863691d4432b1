//! # Types
//!
//! Plain value types shared by every part of the database.

pub mod address;

// Re-export all public types
pub use address::{Address, MemoryRange};
