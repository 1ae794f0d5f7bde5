//! Concrete adapters for the krawler engine: `fs` and `memory` stores,
//! built-in hooks and the `http`/`noop` task kinds.

pub mod factory;
pub mod hooks;
pub mod stores;
pub mod tasks;

pub use factory::register_builtins;
