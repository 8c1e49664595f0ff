use std::sync::Arc;

use serde_json::json;
use talos_capability::{CapabilityBuilder, InMemoryKeyResolver};
use talos_core::testkit::FixedClock;
use talos_core::Did;
use talos_crypto::generate_ed25519_signing_key;
use talos_frame::{CapabilityRef, FrameCodec, FrameError, ResultCode};

fn build_codec(clock: Arc<FixedClock>) -> (FrameCodec, talos_crypto::Ed25519SigningKey, Arc<InMemoryKeyResolver>) {
    let resolver = Arc::new(InMemoryKeyResolver::new());
    let signing_key = generate_ed25519_signing_key();
    resolver.register(
        Did::from_public_key(signing_key.verifying_key().as_bytes()),
        signing_key.verifying_key(),
    );
    let codec = FrameCodec::new(resolver.clone(), clock);
    (codec, signing_key, resolver)
}

fn sample_capability(issuer_key: &talos_crypto::Ed25519SigningKey, now: i64) -> talos_capability::Capability {
    let issuer = Did::from_public_key(issuer_key.verifying_key().as_bytes());
    let mut cap = CapabilityBuilder::new(
        "cap_1".to_string(),
        issuer.clone(),
        issuer,
        "tool:weather/method:get".to_string(),
        now,
        now + 3600,
    )
    .build();
    cap.sign(issuer_key);
    cap
}

#[test]
fn request_round_trips_with_inline_capability() {
    let clock = Arc::new(FixedClock::new(1_700_000_000));
    let (codec, signer, _resolver) = build_codec(clock);
    let cap = sample_capability(&signer, 1_700_000_000);

    let body = json!({"jsonrpc": "2.0", "method": "get", "params": {}});
    let frame = codec
        .build_request(
            &signer,
            [7u8; 16],
            "corr-1",
            "weather",
            "get",
            &body,
            CapabilityRef::Full(cap),
        )
        .unwrap();

    assert!(codec.verify_request(&frame).is_ok());
}

#[test]
fn tampered_frame_signature_is_rejected() {
    let clock = Arc::new(FixedClock::new(1_700_000_000));
    let (codec, signer, _resolver) = build_codec(clock);
    let cap = sample_capability(&signer, 1_700_000_000);
    let body = json!({"jsonrpc": "2.0"});
    let mut frame = codec
        .build_request(&signer, [1u8; 16], "corr-1", "weather", "get", &body, CapabilityRef::Full(cap))
        .unwrap();

    let mut sig_bytes = frame.sig.unwrap().to_bytes();
    sig_bytes[0] ^= 0xFF;
    frame.sig = Some(talos_crypto::Ed25519Signature::from_bytes(sig_bytes));

    assert_eq!(
        codec.verify_request(&frame).unwrap_err(),
        FrameError::SignatureInvalid
    );
}

#[test]
fn tampering_the_inlined_capability_after_signing_invalidates_the_frame() {
    let clock = Arc::new(FixedClock::new(1_700_000_000));
    let (codec, signer, _resolver) = build_codec(clock);
    let cap = sample_capability(&signer, 1_700_000_000);
    let body = json!({"jsonrpc": "2.0"});
    let mut frame = codec
        .build_request(&signer, [1u8; 16], "corr-1", "weather", "get", &body, CapabilityRef::Full(cap))
        .unwrap();

    // Tamper the capability's scope after the frame was signed over it,
    // without re-signing the frame, simulating a malicious intermediary.
    // The recanonicalized frame bytes no longer match the attached
    // signature since the capability is signed-over verbatim.
    frame.capability.as_mut().unwrap().scope = "tool:weather/method:set".to_string();

    assert_eq!(
        codec.verify_request(&frame).unwrap_err(),
        FrameError::SignatureInvalid
    );
}

#[test]
fn capability_hash_mismatch_is_caught_independently_of_frame_signature() {
    let clock = Arc::new(FixedClock::new(1_700_000_000));
    let (codec, signer, _resolver) = build_codec(clock);
    let cap = sample_capability(&signer, 1_700_000_000);
    let body = json!({"jsonrpc": "2.0"});
    let mut frame = codec
        .build_request(&signer, [2u8; 16], "corr-1", "weather", "get", &body, CapabilityRef::Full(cap))
        .unwrap();

    // Swap in a capability_hash that does not match the inlined
    // capability, then re-sign so the frame-level signature still passes.
    let mut wrong_hash = frame.capability_hash.unwrap();
    wrong_hash[0] ^= 0xFF;
    frame.capability_hash = Some(wrong_hash);
    frame.sig = None;
    frame.sign(&signer).unwrap();

    assert_eq!(
        codec.verify_request(&frame).unwrap_err(),
        FrameError::CapabilityHashMismatch
    );
}

#[test]
fn replay_of_the_same_request_is_denied_on_second_submission() {
    let clock = Arc::new(FixedClock::new(1_700_000_000));
    let (codec, signer, _resolver) = build_codec(clock);
    let cap = sample_capability(&signer, 1_700_000_000);
    let body = json!({"jsonrpc": "2.0"});
    let frame = codec
        .build_request(&signer, [3u8; 16], "corr-replay", "weather", "get", &body, CapabilityRef::Full(cap))
        .unwrap();

    assert!(codec.verify_request(&frame).is_ok());
    assert_eq!(codec.verify_request(&frame).unwrap_err(), FrameError::Replay);
}

#[test]
fn frame_far_in_the_future_exceeds_clock_skew() {
    let clock = Arc::new(FixedClock::new(1_700_000_000));
    let (codec, signer, _resolver) = build_codec(clock.clone());
    let cap = sample_capability(&signer, 1_700_000_000);
    let body = json!({"jsonrpc": "2.0"});
    let mut frame = codec
        .build_request(&signer, [4u8; 16], "corr-1", "weather", "get", &body, CapabilityRef::Full(cap))
        .unwrap();

    // Re-sign as if issued 10 minutes in the future relative to the
    // verifier's clock.
    frame.issued_at = clock.now_unix() + 600;
    frame.sig = None;
    frame.sign(&signer).unwrap();

    assert_eq!(
        codec.verify_request(&frame).unwrap_err(),
        FrameError::ClockSkewExceeded
    );
}

#[test]
fn unknown_peer_is_rejected() {
    let clock = Arc::new(FixedClock::new(1_700_000_000));
    let resolver = Arc::new(InMemoryKeyResolver::new());
    let codec = FrameCodec::new(resolver, clock);
    let signer = generate_ed25519_signing_key();
    let cap = sample_capability(&signer, 1_700_000_000);
    let body = json!({"jsonrpc": "2.0"});
    let frame = codec
        .build_request(&signer, [5u8; 16], "corr-1", "weather", "get", &body, CapabilityRef::Full(cap))
        .unwrap();

    assert_eq!(codec.verify_request(&frame).unwrap_err(), FrameError::UnknownPeer);
}

#[test]
fn response_frame_round_trips_and_its_own_replay_is_rejected() {
    let clock = Arc::new(FixedClock::new(1_700_000_000));
    let (codec, signer, _resolver) = build_codec(clock);
    let cap = sample_capability(&signer, 1_700_000_000);
    let body = json!({"jsonrpc": "2.0"});
    let request = codec
        .build_request(&signer, [6u8; 16], "corr-resp", "weather", "get", &body, CapabilityRef::Full(cap))
        .unwrap();
    codec.verify_request(&request).unwrap();

    let response_body = json!({"result": {"temp_c": 21}});
    let response = codec
        .build_response(&signer, &request, &response_body, ResultCode::Ok)
        .unwrap();

    assert!(codec.verify_response(&response).is_ok());
    assert_eq!(codec.verify_response(&response).unwrap_err(), FrameError::Replay);
}
