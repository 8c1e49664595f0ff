//! Errors raised by gateway administration operations (registration,
//! lifecycle). `authorize` itself never returns an error — every outcome,
//! including a malformed request, is an [`talos_core::AuthorizationResult`]
//! so a denial is always auditable.

/// Failures from tenant registration and lifecycle management.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// `register_tenant` was called with an already-registered tenant id.
    #[error("tenant {0} already registered")]
    DuplicateTenant(String),
}
