//! MemTable Module
//!
//! In-memory key/value map behind the storage engine.
//!
//! ## Responsibilities
//! - Fast reads and writes in memory
//! - Multi-reader access through an internal RwLock
//! - Track approximate size for diagnostics
//!
//! ## Data Structure Choice
//! A HashMap wrapped in RwLock: keys have no meaningful order here, and
//! the engine serializes all writers itself.

mod table;

pub use table::MemTable;
