//! Capability verification and delegation errors, and their mapping onto
//! the closed `DenialReason` enumeration.

use talos_core::DenialReason;

/// Errors raised by capability grant/verify/delegate/revoke operations.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CapabilityError {
    /// `issued_at` is further in the future than the clock skew allows.
    #[error("capability is future-dated: {0}")]
    FutureDated(String),

    /// `now > expires_at`.
    #[error("capability has expired")]
    Expired,

    /// The capability id (or an ancestor in its delegation chain) is in
    /// the revocation table.
    #[error("capability revoked: {0}")]
    Revoked(String),

    /// Ed25519 signature verification failed.
    #[error("capability signature invalid: {0}")]
    SignatureInvalid(String),

    /// The capability's scope does not cover the requested scope.
    #[error("scope violation: capability scope does not cover the requested scope")]
    ScopeViolation,

    /// A constraint check against the request's params failed.
    #[error("constraint violation")]
    ConstraintViolation,

    /// A delegation violated a structural invariant.
    #[error("delegation invalid: {0}")]
    DelegationInvalid(String),

    /// No capability was presented and none was cached.
    #[error("no capability presented")]
    NoCapability,

    /// `tool` or `method` was empty.
    #[error("scope mismatch: empty tool or method")]
    ScopeMismatch,
}

impl CapabilityError {
    /// Translate this error into the closed [`DenialReason`] enumeration
    /// surfaced by `authorize`/`authorize_fast` so callers and audit records
    /// never see raw internal error variants.
    pub fn to_denial_reason(&self) -> DenialReason {
        match self {
            CapabilityError::FutureDated(_) => DenialReason::SignatureInvalid,
            CapabilityError::Expired => DenialReason::Expired,
            CapabilityError::Revoked(_) => DenialReason::Revoked,
            CapabilityError::SignatureInvalid(_) => DenialReason::SignatureInvalid,
            CapabilityError::ScopeViolation | CapabilityError::ConstraintViolation => {
                DenialReason::ScopeMismatch
            }
            CapabilityError::DelegationInvalid(_) => DenialReason::DelegationInvalid,
            CapabilityError::NoCapability => DenialReason::NoCapability,
            CapabilityError::ScopeMismatch => DenialReason::ScopeMismatch,
        }
    }
}
