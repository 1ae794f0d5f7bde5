//! krawler-cli library, exposed for tests.

pub mod commands;
pub mod jobfile;
