//! Bearer token decoding.
//!
//! Tokens are JWT-shaped: three dot-separated base64url parts, with the
//! identity claims in the payload. The client only extracts claims; it
//! never verifies the signature — the backend that issued the token is
//! the authority, and every request is re-checked server-side anyway.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;

use crate::error::{Error, Result};
use crate::models::User;

/// Decode the claims payload of a bearer token into a [`User`].
pub fn decode_claims(token: &str) -> Result<User> {
    let parts: Vec<&str> = token.split('.').collect();
    if parts.len() != 3 {
        return Err(Error::InvalidToken(format!(
            "expected 3 dot-separated parts, got {}",
            parts.len()
        )));
    }

    let payload = URL_SAFE_NO_PAD
        .decode(parts[1])
        .map_err(|e| Error::InvalidToken(format!("payload is not base64url: {e}")))?;

    serde_json::from_slice(&payload)
        .map_err(|e| Error::InvalidToken(format!("claims are not valid JSON: {e}")))
}

#[cfg(test)]
pub(crate) fn encode_test_token(claims: &serde_json::Value) -> String {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
    let payload = URL_SAFE_NO_PAD.encode(serde_json::to_vec(claims).unwrap());
    format!("{header}.{payload}.sig")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Role;
    use serde_json::json;

    #[test]
    fn decodes_valid_claims() {
        let token = encode_test_token(&json!({
            "id": "u42",
            "name": "Ana Souza",
            "email": "ana@example.com",
            "role": "admin"
        }));
        let user = decode_claims(&token).unwrap();
        assert_eq!(user.id, "u42");
        assert_eq!(user.role, Role::Admin);
    }

    #[test]
    fn extra_claims_are_ignored() {
        let token = encode_test_token(&json!({
            "id": "u1",
            "name": "N",
            "email": "n@x",
            "role": "user",
            "iat": 1700000000,
            "exp": 1800000000
        }));
        assert!(decode_claims(&token).is_ok());
    }

    #[test]
    fn rejects_wrong_part_count() {
        let err = decode_claims("just-one-part").unwrap_err();
        assert!(matches!(err, Error::InvalidToken(_)));
        assert!(decode_claims("a.b").is_err());
        assert!(decode_claims("a.b.c.d").is_err());
    }

    #[test]
    fn rejects_non_base64_payload() {
        assert!(matches!(
            decode_claims("a.!!!.c"),
            Err(Error::InvalidToken(_))
        ));
    }

    #[test]
    fn rejects_non_json_payload() {
        let payload = URL_SAFE_NO_PAD.encode(b"not json");
        let token = format!("h.{payload}.s");
        assert!(matches!(
            decode_claims(&token),
            Err(Error::InvalidToken(_))
        ));
    }

    #[test]
    fn rejects_unknown_role() {
        let token = encode_test_token(&json!({
            "id": "u1", "name": "N", "email": "n@x", "role": "superuser"
        }));
        assert!(decode_claims(&token).is_err());
    }

    #[test]
    fn rejects_missing_claim() {
        let token = encode_test_token(&json!({"id": "u1", "role": "user"}));
        assert!(decode_claims(&token).is_err());
    }
}
