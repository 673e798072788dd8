use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use thiserror::Error;

use crate::models::claims::Claims;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("token is not a three-segment compact JWT")]
    WrongSegmentCount,
    #[error("token payload is not valid base64url")]
    InvalidBase64,
    #[error("token payload is not a valid claims document")]
    InvalidJson,
}

/// Decodes the claims segment of a compact JWT without verifying the
/// signature. The server is the verifier; the client only needs `exp` and
/// the role claim to decide whether to bother it.
pub fn decode_claims(token: &str) -> Result<Claims, DecodeError> {
    let mut segments = token.split('.');
    let payload = match (
        segments.next(),
        segments.next(),
        segments.next(),
        segments.next(),
    ) {
        (Some(_), Some(payload), Some(_), None) => payload,
        _ => return Err(DecodeError::WrongSegmentCount),
    };

    let bytes = URL_SAFE_NO_PAD
        .decode(payload)
        .map_err(|_| DecodeError::InvalidBase64)?;
    serde_json::from_slice(&bytes).map_err(|_| DecodeError::InvalidJson)
}

pub fn now_unix() -> u64 {
    chrono::Utc::now().timestamp().max(0) as u64
}

/// `exp` at or before `now` counts as expired; only a strictly future
/// expiry keeps the credential usable without renewal.
pub fn is_expired(claims: &Claims, now: u64) -> bool {
    (claims.exp as u64) <= now
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::claims::UserRole;
    use jsonwebtoken::{encode, EncodingKey, Header};

    fn signed_token(claims: &Claims) -> String {
        encode(
            &Header::default(),
            claims,
            &EncodingKey::from_secret(b"0123456789abcdef0123456789abcdef"),
        )
        .expect("token should encode")
    }

    fn sample_claims() -> Claims {
        Claims {
            exp: 1_700_000_000,
            role: Some(UserRole::Customer),
            user_id: Some(7),
            email: Some("customer@example.com".into()),
        }
    }

    #[test]
    fn decodes_signed_token_without_key() {
        let claims = sample_claims();
        let token = signed_token(&claims);

        let decoded = decode_claims(&token).expect("payload should decode");
        assert_eq!(decoded, claims);
    }

    #[test]
    fn rejects_token_with_two_segments() {
        let err = decode_claims("header.payload").unwrap_err();
        assert_eq!(err, DecodeError::WrongSegmentCount);
    }

    #[test]
    fn rejects_token_with_four_segments() {
        let err = decode_claims("a.b.c.d").unwrap_err();
        assert_eq!(err, DecodeError::WrongSegmentCount);
    }

    #[test]
    fn rejects_payload_that_is_not_base64url() {
        let err = decode_claims("header.!!not-base64!!.sig").unwrap_err();
        assert_eq!(err, DecodeError::InvalidBase64);
    }

    #[test]
    fn rejects_payload_that_is_not_claims_json() {
        let payload = URL_SAFE_NO_PAD.encode(b"not json at all");
        let err = decode_claims(&format!("header.{}.sig", payload)).unwrap_err();
        assert_eq!(err, DecodeError::InvalidJson);
    }

    #[test]
    fn rejects_claims_without_exp() {
        let payload = URL_SAFE_NO_PAD.encode(br#"{"role": "CUSTOMER"}"#);
        let err = decode_claims(&format!("header.{}.sig", payload)).unwrap_err();
        assert_eq!(err, DecodeError::InvalidJson);
    }

    #[test]
    fn expiry_is_strict() {
        let mut claims = sample_claims();
        claims.exp = 100;

        assert!(is_expired(&claims, 100));
        assert!(is_expired(&claims, 101));
        assert!(!is_expired(&claims, 99));
    }
}
