//! # Talos Core — Layer 1: Foundation
//!
//! **Purpose**: single source of truth for the identifiers, protocol
//! constants, and result/error sum types shared by every other crate in the
//! workspace.
//!
//! This crate has zero dependencies on other Talos crates. It provides:
//! - `Did`, the DID-shaped identity used by issuers, subjects, and peers.
//! - `DenialReason` / `AuthorizationResult`, the closed outcome type every
//!   authorization path in `talos-capability`, `talos-frame`, and
//!   `talos-gateway` collapses to.
//! - `Clock` / `SecureRng`, the injectable time and randomness seams that
//!   keep `talos-capability` and `talos-ratchet` deterministic under test.
//! - The protocol-fixed constants from the wire specification.

pub mod clock;
pub mod config;
pub mod constants;
pub mod did;
pub mod result;
pub mod rng;
pub mod testkit;

pub use clock::{Clock, SystemClock};
pub use constants::*;
pub use did::Did;
pub use result::{AuthorizationResult, DenialReason};
pub use rng::{CsRng, SecureRng};

/// Standard result type for fallible core operations.
pub type Result<T> = std::result::Result<T, CoreError>;

/// Errors that can occur constructing or parsing foundation types.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// A DID string did not match the `did:talos:<hex32>` grammar.
    #[error("invalid DID: {0}")]
    InvalidDid(String),

    /// A scope string was empty or malformed.
    #[error("invalid scope: {0}")]
    InvalidScope(String),
}
