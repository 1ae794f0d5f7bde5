//! Backend-agnostic blob storage.
//!
//! [`Store`] is the one capability every backend provides (stream read,
//! stream write, remove). Direct filesystem access is an optional secondary
//! capability exposed through [`Store::path`]; callers must query it and
//! never assume it.

mod contract;
pub mod ops;
mod registry;

pub use contract::{BoxReader, BoxWriter, Store, StoreFactory};
pub use ops::{copy_between_stores, gunzip_from_store, gzip_to_store, read_to_bytes, write_bytes};
pub use registry::StoreRegistry;

#[cfg(test)]
pub(crate) mod testing;
