// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use proptest::prelude::*;

use super::{classify, error_message, AuthSignal};

#[yare::parameterized(
    ok_200             = { 200, r#"{"data":[]}"#, AuthSignal::Ok },
    created_201        = { 201, "", AuthSignal::Ok },
    no_content_204     = { 204, "", AuthSignal::Ok },
    unauthorized_401   = { 401, r#"{"message":"Unauthorized"}"#, AuthSignal::Unauthorized },
    unauthorized_empty = { 401, "", AuthSignal::Unauthorized },
    expired_in_500     = { 500, r#"{"message":"jwt expired"}"#, AuthSignal::Unauthorized },
    missing_in_400     = { 400, r#"{"message":"jwt must be provided"}"#, AuthSignal::Unauthorized },
    expired_in_array   = { 403, r#"{"message":["jwt expired"]}"#, AuthSignal::Unauthorized },
    expired_in_error   = { 500, r#"{"error":"JsonWebTokenError: jwt expired"}"#, AuthSignal::Unauthorized },
    expired_plain_text = { 500, "jwt expired", AuthSignal::Unauthorized },
    expired_upper      = { 500, r#"{"message":"JWT Expired"}"#, AuthSignal::Unauthorized },
    forbidden          = { 403, r#"{"message":"Forbidden resource"}"#, AuthSignal::OtherError },
    not_found          = { 404, r#"{"message":"Order not found"}"#, AuthSignal::OtherError },
    validation         = { 400, r#"{"message":["email must be an email"]}"#, AuthSignal::OtherError },
    server_error       = { 500, "Internal Server Error", AuthSignal::OtherError },
    bad_gateway        = { 502, "", AuthSignal::OtherError },
)]
fn classify_cases(status: u16, body: &str, expected: AuthSignal) {
    assert_eq!(classify(status, body.as_bytes()), expected);
}

#[test]
fn success_body_is_never_inspected() {
    // A 2xx that happens to echo the phrase is still a success.
    assert_eq!(classify(200, br#"{"message":"jwt expired"}"#), AuthSignal::Ok);
}

#[yare::parameterized(
    message_string = { r#"{"message":"bad input"}"#, "bad input" },
    message_array  = { r#"{"message":["a","b"]}"#, "a; b" },
    error_field    = { r#"{"error":"Conflict"}"#, "Conflict" },
    prefers_message = { r#"{"message":"m","error":"e"}"#, "m" },
    raw_text       = { "  upstream down \n", "upstream down" },
    empty          = { "", "" },
)]
fn extracts_error_message(body: &str, expected: &str) {
    assert_eq!(error_message(body.as_bytes()), expected);
}

#[test]
fn serde_matches_as_str() -> anyhow::Result<()> {
    for signal in [AuthSignal::Ok, AuthSignal::Unauthorized, AuthSignal::OtherError] {
        let json = serde_json::to_string(&signal)?;
        assert_eq!(json, format!("\"{}\"", signal.as_str()));
    }
    Ok(())
}

proptest! {
    #[test]
    fn any_2xx_is_ok(status in 200u16..300, body in ".*") {
        prop_assert_eq!(classify(status, body.as_bytes()), AuthSignal::Ok);
    }

    #[test]
    fn errors_without_expiry_text_pass_through(
        status in (300u16..600).prop_filter("not 401", |s| *s != 401),
        body in "[a-z ]{0,40}",
    ) {
        prop_assume!(!body.contains("jwt"));
        prop_assert_eq!(classify(status, body.as_bytes()), AuthSignal::OtherError);
    }
}
