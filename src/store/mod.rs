//! Storage implementations
//!
//! - `memory` - Concurrent in-memory reference store (DashMap-backed)

pub mod memory;

pub use memory::MemoryStore;
