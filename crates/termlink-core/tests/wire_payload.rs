//! Integration tests for termlink-core.
//!
//! These go through the public API only: key presses are mapped, the
//! resulting input is encoded, and the payload is checked against the exact
//! JSON the remote session endpoint expects.

use std::time::{Duration, Instant};

use termlink_core::{
    decode_input, encode_input,
    protocol::{classify_fallback_response, FallbackVerdict},
    KeyAction, KeyMapper, KeyPress, ResolvedInput, SpecialKeyToken,
};

/// Maps a press and encodes the result, panicking if nothing is sent.
fn wire(mapper: &mut KeyMapper, press: KeyPress) -> String {
    match mapper.map(&press, true, Instant::now()) {
        KeyAction::Send(input) => encode_input(&input).expect("encode must succeed"),
        other => panic!("expected a send for {press:?}, got {other:?}"),
    }
}

#[test]
fn test_ctrl_a_goes_out_as_control_code_text() {
    let mut mapper = KeyMapper::new();
    assert_eq!(wire(&mut mapper, KeyPress::new("a").ctrl()), r#"{"text":"\u0001"}"#);
}

#[test]
fn test_altgr_at_sign_goes_out_as_literal_text() {
    let mut mapper = KeyMapper::new();
    assert_eq!(wire(&mut mapper, KeyPress::new("@").ctrl().alt()), r#"{"text":"@"}"#);
}

#[test]
fn test_shift_tab_goes_out_as_key_token() {
    let mut mapper = KeyMapper::new();
    assert_eq!(wire(&mut mapper, KeyPress::new("Tab").shift()), r#"{"key":"shift_tab"}"#);
}

#[test]
fn test_every_token_survives_encode_then_decode() {
    for token in SpecialKeyToken::ALL {
        let json = encode_input(&ResolvedInput::Key(token)).unwrap();
        assert_eq!(decode_input(&json), Ok(ResolvedInput::Key(token)));
    }
}

#[test]
fn test_every_encoded_payload_has_exactly_one_field() {
    let mut mapper = KeyMapper::new();
    let presses = [
        KeyPress::new("q"),
        KeyPress::new("z").ctrl(),
        KeyPress::new("Enter").ctrl(),
        KeyPress::new("Backspace").alt(),
        KeyPress::new("PageDown"),
    ];

    for press in presses {
        let json = wire(&mut mapper, press);
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        let object = value.as_object().expect("payload must be an object");
        assert_eq!(object.len(), 1, "payload {json} must have one field");
        assert!(object.contains_key("text") ^ object.contains_key("key"));
    }
}

#[test]
fn test_double_escape_then_late_escape_sequence() {
    let mut mapper = KeyMapper::new();
    let t0 = Instant::now();
    let esc = KeyPress::new("Escape");

    let outcomes = [
        mapper.map(&esc, true, t0),
        mapper.map(&esc, true, t0 + Duration::from_millis(250)),
        mapper.map(&esc, true, t0 + Duration::from_millis(900)),
    ];

    assert_eq!(
        outcomes,
        [
            KeyAction::Send(ResolvedInput::Key(SpecialKeyToken::Escape)),
            KeyAction::ToggleCapture,
            KeyAction::Send(ResolvedInput::Key(SpecialKeyToken::Escape)),
        ]
    );
}

#[test]
fn test_fallback_verdicts_cover_the_status_table() {
    assert_eq!(classify_fallback_response(202, ""), FallbackVerdict::Accepted);
    assert_eq!(classify_fallback_response(400, ""), FallbackVerdict::SessionExited);
    assert_eq!(classify_fallback_response(401, ""), FallbackVerdict::SessionExited);
    assert_eq!(classify_fallback_response(408, ""), FallbackVerdict::Transient);
    assert_eq!(classify_fallback_response(429, ""), FallbackVerdict::Transient);
    assert_eq!(
        classify_fallback_response(422, r#"{"error":"invalid_input"}"#),
        FallbackVerdict::InvalidInput
    );
    assert_eq!(classify_fallback_response(502, ""), FallbackVerdict::Transient);
}
