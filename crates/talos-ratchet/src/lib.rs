//! The Signal Double Ratchet: an X3DH-initiated, forward-secret,
//! break-in-recovering session between two identities.
//!
//! Nothing here knows about capabilities or frames; a [`Session`] just
//! turns plaintext into wire bytes and back.

mod error;
mod header;
mod manager;
mod prekey;
mod session;
mod state;

pub use error::RatchetError;
pub use header::MessageHeader;
pub use manager::SessionManager;
pub use prekey::PrekeyBundle;
pub use session::Session;
pub use state::RatchetState;

pub use talos_core::MAX_SKIP;

/// Standard result type for fallible ratchet operations.
pub type Result<T> = std::result::Result<T, RatchetError>;
