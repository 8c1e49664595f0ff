//! The `MCP_MESSAGE` / `MCP_RESPONSE` wire frame: the object that binds a
//! tool call to a capability and carries its signature.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use talos_canon::CanonicalValue;
use talos_capability::{Capability, ConstraintValue, Constraints};
use talos_core::Did;
use talos_crypto::{Ed25519Signature, Ed25519SigningKey, Ed25519VerifyingKey};

use crate::error::FrameError;

/// Which of the two frame shapes this is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FrameType {
    /// A request frame, agent to gateway.
    McpMessage,
    /// A response frame, gateway/tool back to agent.
    McpResponse,
}

impl FrameType {
    fn as_str(self) -> &'static str {
        match self {
            FrameType::McpMessage => "MCP_MESSAGE",
            FrameType::McpResponse => "MCP_RESPONSE",
        }
    }
}

/// A response frame's outcome code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ResultCode {
    /// The tool call was forwarded and a result is present.
    Ok,
    /// The tool call was denied; no result body.
    Deny,
}

impl ResultCode {
    fn as_str(self) -> &'static str {
        match self {
            ResultCode::Ok => "OK",
            ResultCode::Deny => "DENY",
        }
    }
}

/// Which capability representation a request frame carries: inlined in
/// full (first frame of a session) or referenced by hash (the gateway
/// resolves it from the session cache).
#[derive(Debug, Clone)]
pub enum CapabilityRef {
    /// Inline the full capability object.
    Full(Capability),
    /// Reference a previously-seen capability by its canonical hash.
    ByHash([u8; 32]),
}

/// The wire frame binding one MCP call (or its result) to a capability.
///
/// `deny_unknown_fields` rejects unknown top-level fields at the
/// deserialization boundary, ahead of
/// [`crate::FrameCodec::verify_request`]'s semantic checks.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Frame {
    /// `MCP_MESSAGE` or `MCP_RESPONSE`.
    #[serde(rename = "type")]
    pub frame_type: FrameType,
    /// Wire protocol version, currently always 1.
    pub protocol_version: u32,
    /// The ratchet session this frame travels over.
    pub session_id: [u8; 16],
    /// Correlates a response frame to its request.
    pub correlation_id: String,
    /// The DID of whoever signed this frame.
    pub peer_id: Did,
    /// Epoch seconds UTC when this frame was produced.
    pub issued_at: i64,
    /// The target tool name.
    pub tool: String,
    /// The target method name.
    pub method: String,

    /// Request-only: `sha256(canonical(jsonrpc_body))`.
    pub request_hash: Option<[u8; 32]>,
    /// Request-only: `sha256(canonical(capability))`, always present when a
    /// capability is referenced, whether inline or by hash.
    pub capability_hash: Option<[u8; 32]>,
    /// Request-only, first frame of a session: the full capability object.
    pub capability: Option<Capability>,

    /// Response-only: `sha256(canonical(response_body))`.
    pub response_hash: Option<[u8; 32]>,
    /// Response-only: the outcome code.
    pub result_code: Option<ResultCode>,

    /// Detached Ed25519 signature over the canonical bytes of every other
    /// field, `None` until [`Frame::sign`] is called.
    pub sig: Option<Ed25519Signature>,
}

impl Frame {
    /// The canonical bytes this frame is signed over: every field except
    /// `sig`, with absent optional fields omitted entirely.
    pub fn canonical_bytes(&self) -> Result<Vec<u8>, FrameError> {
        let mut fields = BTreeMap::new();
        fields.insert(
            "type".to_string(),
            CanonicalValue::String(self.frame_type.as_str().to_string()),
        );
        fields.insert(
            "protocol_version".to_string(),
            CanonicalValue::Integer(self.protocol_version as i64),
        );
        fields.insert(
            "session_id".to_string(),
            CanonicalValue::Bytes(self.session_id.to_vec()),
        );
        fields.insert(
            "correlation_id".to_string(),
            CanonicalValue::String(self.correlation_id.clone()),
        );
        fields.insert(
            "peer_id".to_string(),
            CanonicalValue::String(self.peer_id.as_str().to_string()),
        );
        fields.insert(
            "issued_at".to_string(),
            CanonicalValue::Integer(self.issued_at),
        );
        fields.insert("tool".to_string(), CanonicalValue::String(self.tool.clone()));
        fields.insert(
            "method".to_string(),
            CanonicalValue::String(self.method.clone()),
        );

        if let Some(hash) = self.request_hash {
            fields.insert(
                "request_hash".to_string(),
                CanonicalValue::Bytes(hash.to_vec()),
            );
        }
        if let Some(hash) = self.capability_hash {
            fields.insert(
                "capability_hash".to_string(),
                CanonicalValue::Bytes(hash.to_vec()),
            );
        }
        if let Some(capability) = &self.capability {
            fields.insert("capability".to_string(), capability_to_canonical(capability));
        }
        if let Some(hash) = self.response_hash {
            fields.insert(
                "response_hash".to_string(),
                CanonicalValue::Bytes(hash.to_vec()),
            );
        }
        if let Some(result_code) = &self.result_code {
            fields.insert(
                "result_code".to_string(),
                CanonicalValue::String(result_code.as_str().to_string()),
            );
        }

        Ok(CanonicalValue::Object(fields).encode())
    }

    /// Sign this frame with `signing_key`, attaching the resulting
    /// signature.
    pub fn sign(&mut self, signing_key: &Ed25519SigningKey) -> Result<(), FrameError> {
        let bytes = self.canonical_bytes()?;
        self.sig = Some(signing_key.sign(&bytes));
        Ok(())
    }

    /// Verify `sig` under `verifying_key`.
    pub fn verify_signature(&self, verifying_key: &Ed25519VerifyingKey) -> Result<(), FrameError> {
        let Some(sig) = &self.sig else {
            return Err(FrameError::SignatureInvalid);
        };
        let bytes = self.canonical_bytes()?;
        verifying_key
            .verify(&bytes, sig)
            .map_err(|_| FrameError::SignatureInvalid)
    }
}

/// Render a [`Capability`] (including its own signature, if attached) as a
/// nested [`CanonicalValue`] for embedding in a frame's canonical bytes.
///
/// Deliberately separate from `Capability::canonical_bytes`, which excludes
/// the signature because it *is* the capability's own signing preimage;
/// here the whole signed object, signature included, is what the frame
/// binds itself to.
fn capability_to_canonical(cap: &Capability) -> CanonicalValue {
    let mut fields = BTreeMap::new();
    fields.insert("id".to_string(), CanonicalValue::String(cap.id.clone()));
    fields.insert(
        "version".to_string(),
        CanonicalValue::Integer(cap.version as i64),
    );
    fields.insert(
        "issuer".to_string(),
        CanonicalValue::String(cap.issuer.as_str().to_string()),
    );
    fields.insert(
        "subject".to_string(),
        CanonicalValue::String(cap.subject.as_str().to_string()),
    );
    fields.insert("scope".to_string(), CanonicalValue::String(cap.scope.clone()));
    fields.insert("constraints".to_string(), constraints_to_canonical(&cap.constraints));
    fields.insert(
        "issued_at".to_string(),
        CanonicalValue::Integer(cap.issued_at),
    );
    fields.insert(
        "expires_at".to_string(),
        CanonicalValue::Integer(cap.expires_at),
    );
    fields.insert(
        "delegatable".to_string(),
        CanonicalValue::Bool(cap.delegatable),
    );
    fields.insert(
        "delegation_chain".to_string(),
        CanonicalValue::array(
            cap.delegation_chain
                .iter()
                .map(|id| CanonicalValue::String(id.clone())),
        ),
    );
    if let Some(sig) = &cap.signature {
        fields.insert(
            "signature".to_string(),
            CanonicalValue::Bytes(sig.to_bytes().to_vec()),
        );
    }
    CanonicalValue::Object(fields)
}

fn constraints_to_canonical(constraints: &Constraints) -> CanonicalValue {
    let mut fields = BTreeMap::new();
    for (key, value) in constraints {
        let json = match value {
            ConstraintValue::Paths(v) | ConstraintValue::AllowedTools(v) => {
                serde_json::to_value(v).unwrap_or(serde_json::Value::Null)
            }
            ConstraintValue::RateLimit(s) => serde_json::Value::String(s.clone()),
            ConstraintValue::Other(v) => v.clone(),
        };
        if let Ok(canon) = CanonicalValue::from_json(&json) {
            fields.insert(key.clone(), canon);
        }
    }
    CanonicalValue::Object(fields)
}
