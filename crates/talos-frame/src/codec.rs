//! Builds and verifies request/response frames, binding an MCP call to a
//! capability and defending against replay.

use std::sync::Arc;

use talos_capability::KeyResolver;
use talos_core::config::ReplayConfig;
use talos_core::{Clock, Did};
use talos_crypto::{sha256, Ed25519SigningKey};

use crate::error::FrameError;
use crate::frame::{CapabilityRef, Frame, FrameType, ResultCode};

/// Builds and verifies frames for one gateway (or agent) instance.
///
/// Holds the replay table so duplicate `(type, session_id, correlation_id)`
/// triples are rejected across every frame this instance verifies.
pub struct FrameCodec {
    key_resolver: Arc<dyn KeyResolver>,
    clock: Arc<dyn Clock>,
    config: ReplayConfig,
    replay: parking_lot::RwLock<crate::replay::ReplayTable>,
}

impl FrameCodec {
    /// Build a codec with the default replay window (300s).
    pub fn new(key_resolver: Arc<dyn KeyResolver>, clock: Arc<dyn Clock>) -> Self {
        Self::with_config(key_resolver, clock, ReplayConfig::default())
    }

    /// Build a codec with an explicit replay window.
    pub fn with_config(
        key_resolver: Arc<dyn KeyResolver>,
        clock: Arc<dyn Clock>,
        config: ReplayConfig,
    ) -> Self {
        Self {
            key_resolver,
            clock,
            config,
            replay: parking_lot::RwLock::new(crate::replay::ReplayTable::new()),
        }
    }

    /// Build and sign a request frame. `jsonrpc_body` is hashed canonically
    /// into `request_hash`; `capability_ref` controls whether the full
    /// capability is inlined or only referenced by hash.
    #[allow(clippy::too_many_arguments)]
    pub fn build_request(
        &self,
        signer: &Ed25519SigningKey,
        session_id: [u8; 16],
        correlation_id: impl Into<String>,
        tool: impl Into<String>,
        method: impl Into<String>,
        jsonrpc_body: &serde_json::Value,
        capability_ref: CapabilityRef,
    ) -> Result<Frame, FrameError> {
        let request_hash = canonical_hash(jsonrpc_body)?;
        let (capability, capability_hash) = match capability_ref {
            CapabilityRef::Full(capability) => {
                let hash = capability.canonical_hash();
                (Some(capability), Some(hash))
            }
            CapabilityRef::ByHash(hash) => (None, Some(hash)),
        };

        let mut frame = Frame {
            frame_type: FrameType::McpMessage,
            protocol_version: talos_core::PROTOCOL_VERSION,
            session_id,
            correlation_id: correlation_id.into(),
            peer_id: Did::from_public_key(signer.verifying_key().as_bytes()),
            issued_at: self.clock.now_unix(),
            tool: tool.into(),
            method: method.into(),
            request_hash: Some(request_hash),
            capability_hash,
            capability,
            response_hash: None,
            result_code: None,
            sig: None,
        };
        frame.sign(signer)?;
        Ok(frame)
    }

    /// Verify a request frame's shape, signature, clock skew, and replay
    /// status in that order, and record its `(session_id, correlation_id)`
    /// in the replay table.
    pub fn verify_request(&self, frame: &Frame) -> Result<(), FrameError> {
        if frame.frame_type != FrameType::McpMessage {
            return Err(FrameError::MissingField("request_hash"));
        }
        validate_request_shape(frame)?;
        self.verify_frame_signature(frame)?;
        if let Some(capability) = &frame.capability {
            self.verify_inline_capability(capability, frame.capability_hash)?;
        }
        self.check_skew(frame.issued_at)?;
        self.check_replay(frame)?;
        Ok(())
    }

    /// Build and sign a response frame for a previously verified `request`.
    pub fn build_response(
        &self,
        signer: &Ed25519SigningKey,
        request: &Frame,
        response_body: &serde_json::Value,
        result_code: ResultCode,
    ) -> Result<Frame, FrameError> {
        let response_hash = canonical_hash(response_body)?;
        let mut frame = Frame {
            frame_type: FrameType::McpResponse,
            protocol_version: talos_core::PROTOCOL_VERSION,
            session_id: request.session_id,
            correlation_id: request.correlation_id.clone(),
            peer_id: Did::from_public_key(signer.verifying_key().as_bytes()),
            issued_at: self.clock.now_unix(),
            tool: request.tool.clone(),
            method: request.method.clone(),
            request_hash: None,
            capability_hash: None,
            capability: None,
            response_hash: Some(response_hash),
            result_code: Some(result_code),
            sig: None,
        };
        frame.sign(signer)?;
        Ok(frame)
    }

    /// Verify a response frame: signature, shape, skew, and replay.
    pub fn verify_response(&self, frame: &Frame) -> Result<(), FrameError> {
        if frame.frame_type != FrameType::McpResponse {
            return Err(FrameError::MissingField("response_hash"));
        }
        validate_response_shape(frame)?;
        self.verify_frame_signature(frame)?;
        self.check_skew(frame.issued_at)?;
        self.check_replay(frame)?;
        Ok(())
    }

    fn verify_frame_signature(&self, frame: &Frame) -> Result<(), FrameError> {
        let key = self
            .key_resolver
            .resolve(&frame.peer_id)
            .ok_or(FrameError::UnknownPeer)?;
        frame.verify_signature(&key)
    }

    fn verify_inline_capability(
        &self,
        capability: &talos_capability::Capability,
        capability_hash: Option<[u8; 32]>,
    ) -> Result<(), FrameError> {
        let issuer_key = self
            .key_resolver
            .resolve(&capability.issuer)
            .ok_or(FrameError::UnknownPeer)?;
        capability
            .verify_signature(&issuer_key)
            .map_err(|_| FrameError::CapabilityInvalid)?;
        if capability_hash != Some(capability.canonical_hash()) {
            return Err(FrameError::CapabilityHashMismatch);
        }
        Ok(())
    }

    fn check_skew(&self, issued_at: i64) -> Result<(), FrameError> {
        let now = self.clock.now_unix();
        if issued_at - now > talos_core::CLOCK_SKEW_SECONDS {
            return Err(FrameError::ClockSkewExceeded);
        }
        Ok(())
    }

    fn check_replay(&self, frame: &Frame) -> Result<(), FrameError> {
        let key = format!("{:?}:{}", frame.frame_type, frame.correlation_id);
        let now = self.clock.now_unix();
        let fresh = self.replay.write().check_and_record(
            frame.session_id,
            &key,
            now,
            self.config.window_seconds,
        );
        if fresh {
            Ok(())
        } else {
            Err(FrameError::Replay)
        }
    }
}

fn validate_request_shape(frame: &Frame) -> Result<(), FrameError> {
    if frame.request_hash.is_none() {
        return Err(FrameError::MissingField("request_hash"));
    }
    if frame.tool.is_empty() {
        return Err(FrameError::MissingField("tool"));
    }
    if frame.method.is_empty() {
        return Err(FrameError::MissingField("method"));
    }
    if frame.response_hash.is_some() || frame.result_code.is_some() {
        return Err(FrameError::UnknownField("response_hash/result_code on a request frame".to_string()));
    }
    Ok(())
}

fn validate_response_shape(frame: &Frame) -> Result<(), FrameError> {
    if frame.response_hash.is_none() {
        return Err(FrameError::MissingField("response_hash"));
    }
    if frame.result_code.is_none() {
        return Err(FrameError::MissingField("result_code"));
    }
    if frame.request_hash.is_some() || frame.capability.is_some() || frame.capability_hash.is_some() {
        return Err(FrameError::UnknownField(
            "request_hash/capability/capability_hash on a response frame".to_string(),
        ));
    }
    Ok(())
}

fn canonical_hash(body: &serde_json::Value) -> Result<[u8; 32], FrameError> {
    let bytes = talos_canon::canonicalize_json(body)?;
    Ok(sha256(&bytes))
}
