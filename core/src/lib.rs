//! Job/task orchestration engine.
//!
//! A [`jobs::Job`] expands into tasks that run through phased hook chains
//! under a bounded worker pool, reading and writing through pluggable
//! [`store::Store`] backends.

pub mod api;
pub mod config;
pub mod context;
pub mod error;
pub mod hooks;
pub mod jobs;
pub mod services;
pub mod store;
pub mod util;
