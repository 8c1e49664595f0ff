//! `MCP_MESSAGE` / `MCP_RESPONSE` frame construction and verification,
//! binding an MCP tool call to a capability, with replay defense.

mod codec;
mod error;
mod frame;
mod replay;

pub use codec::FrameCodec;
pub use error::FrameError;
pub use frame::{CapabilityRef, Frame, FrameType, ResultCode};
pub use replay::ReplayTable;

pub use talos_core::config::ReplayConfig;
pub use talos_core::DenialReason;

/// Standard result type for fallible frame operations.
pub type Result<T> = std::result::Result<T, FrameError>;
