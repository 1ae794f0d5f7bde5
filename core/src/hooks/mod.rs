//! Lifecycle hooks.
//!
//! ```text
//! HookConfig { jobs | tasks → before | after | error → name → options }
//!   ↓ activate_hooks()            (names resolved through the HookRegistry)
//! PhaseChains { before, after, error }
//!   ↓ run_phase(phase, &mut HookContext)
//! hooks run one after the other; a failure skips the rest of the chain,
//! runs the error chain with the failure attached, then propagates.
//! ```

mod context;
mod hook;
mod pipeline;
mod registry;

pub use context::{HookContext, HookFailure, HookParams, Phase, Target};
pub use hook::{sync_hook, Hook, HookFactory, SyncHook};
pub use pipeline::{activate_hooks, activate_hooks_with, BoundHook, HookConfig, PhaseChains, TargetHooks};
pub use registry::{lookup_hook, register_hook, HookRegistry};
