mod fs;
mod memory;

pub use fs::{FsStore, FsStoreFactory};
pub use memory::{MemoryStore, MemoryStoreFactory};
