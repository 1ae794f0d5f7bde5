//! Named operations over jobs and stores, as exposed to callers.

mod jobs;
mod stores;

pub use jobs::{JobParams, JobsService};
pub use stores::StoresService;
