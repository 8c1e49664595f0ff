//! Frame verification failures and their mapping onto the closed
//! `DenialReason` enumeration.

use talos_core::DenialReason;

/// Errors raised while building or verifying a [`crate::Frame`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum FrameError {
    /// The frame carried a top-level key outside the wire schema.
    #[error("unexpected top-level field: {0}")]
    UnknownField(String),

    /// A required top-level field was absent.
    #[error("missing required field: {0}")]
    MissingField(&'static str),

    /// The frame's own `sig` did not verify over its canonical bytes.
    #[error("frame signature invalid")]
    SignatureInvalid,

    /// The inlined capability's own signature did not verify.
    #[error("inlined capability signature invalid")]
    CapabilityInvalid,

    /// `sha256(canonical(capability)) != capability_hash`.
    #[error("capability_hash does not match the inlined capability")]
    CapabilityHashMismatch,

    /// `issued_at` fell outside the allowed clock skew window.
    #[error("issued_at is outside the clock skew window")]
    ClockSkewExceeded,

    /// `(session_id, correlation_id)` was already seen within the replay
    /// window.
    #[error("frame already seen within the replay window")]
    Replay,

    /// A field's canonical encoding could not be built.
    #[error("canonicalization failed: {0}")]
    Canon(String),

    /// No verifying key is registered for the frame's `peer_id`.
    #[error("no verifying key registered for peer")]
    UnknownPeer,
}

impl FrameError {
    /// Collapse this error onto the closed [`DenialReason`] enumeration so
    /// callers and audit records never see raw frame-level error variants.
    pub fn to_denial_reason(&self) -> DenialReason {
        match self {
            FrameError::UnknownField(_)
            | FrameError::MissingField(_)
            | FrameError::CapabilityHashMismatch
            | FrameError::ClockSkewExceeded
            | FrameError::Canon(_) => DenialReason::InvalidFrame,
            FrameError::SignatureInvalid
            | FrameError::CapabilityInvalid
            | FrameError::UnknownPeer => DenialReason::SignatureInvalid,
            FrameError::Replay => DenialReason::Replay,
        }
    }
}

impl From<talos_canon::CanonError> for FrameError {
    fn from(err: talos_canon::CanonError) -> Self {
        FrameError::Canon(err.to_string())
    }
}
