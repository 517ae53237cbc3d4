//! Checkpoint store implementations.

mod json_file;
mod memory;

pub use json_file::JsonFileCheckpointStore;
pub use memory::MemoryCheckpointStore;
