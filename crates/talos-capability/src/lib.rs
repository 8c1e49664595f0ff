//! Capability-based authorization: grant, verify, delegate, revoke, and the
//! session-cached fast path that meets sub-millisecond verification
//! latencies.

mod capability;
mod cache;
mod constraints;
mod errors;
mod key_resolver;
mod manager;
mod revocation;
mod scope;

pub use capability::{Capability, CapabilityBuilder, CAPABILITY_VERSION};
pub use cache::{SessionCache, SessionCacheEntry};
pub use constraints::{check_constraints, narrow, AuthParams, ConstraintValue, Constraints};
pub use errors::CapabilityError;
pub use key_resolver::{InMemoryKeyResolver, KeyResolver};
pub use manager::CapabilityManager;
pub use revocation::{RevocationEntry, RevocationTable};
pub use scope::{scope_covers, scope_covers_wildcard, tool_method_scope};

pub use talos_core::config::ManagerConfig;
pub use talos_core::{AuthorizationResult, DenialReason, Did};

/// Standard result type for fallible capability operations.
pub type Result<T> = std::result::Result<T, CapabilityError>;
