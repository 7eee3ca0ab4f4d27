//! Adapter implementations
//!
//! Adapters implement the port traits with concrete technologies:
//! - Local filesystem for KeyValueStorage (one JSON document per key)
//! - In-memory map for KeyValueStorage (tests, throwaway sessions)
//! - Demo data source producing a sample bank export

pub mod demo;
mod file;
mod memory;

pub use file::FileStorage;
pub use memory::MemoryStorage;
