use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use ring::hmac;
use ring::rand::SystemRandom;
use tracing::debug;

use crate::config::BasicCredentials;
use crate::utils::errors::ServiceError;

/// Verify an `Authorization: Basic ...` header against the configured credentials.
///
/// Every failure, including a missing header, is `ServiceError::Unauthorized`.
pub fn verify_basic_auth(
    header: Option<&str>,
    expected: &BasicCredentials,
) -> Result<(), ServiceError> {
    let (username, password) = decode_basic_auth(header).ok_or_else(|| {
        debug!("Missing or malformed Authorization header");
        ServiceError::Unauthorized
    })?;

    // Evaluate both so the response time does not reveal which one matched
    let username_ok = secure_eq(&username, &expected.username);
    let password_ok = secure_eq(&password, &expected.password);

    if username_ok & password_ok {
        Ok(())
    } else {
        debug!("Credentials rejected");
        Err(ServiceError::Unauthorized)
    }
}

/// Split a Basic header into (username, password)
fn decode_basic_auth(header: Option<&str>) -> Option<(String, String)> {
    let encoded = header?.strip_prefix("Basic ")?;
    let decoded = BASE64.decode(encoded.trim()).ok()?;
    let credentials = String::from_utf8(decoded).ok()?;
    let (username, password) = credentials.split_once(':')?;
    Some((username.to_string(), password.to_string()))
}

/// Constant-time equality: tag `expected` under a one-off HMAC key and let
/// `hmac::verify` check `given` against it. Unequal lengths take the same path
/// as unequal content.
fn secure_eq(given: &str, expected: &str) -> bool {
    let key = match hmac::Key::generate(hmac::HMAC_SHA256, &SystemRandom::new()) {
        Ok(key) => key,
        Err(_) => {
            debug!("Failed to generate comparison key");
            return false;
        }
    };
    let tag = hmac::sign(&key, expected.as_bytes());
    hmac::verify(&key, given.as_bytes(), tag.as_ref()).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn creds() -> BasicCredentials {
        BasicCredentials {
            username: "admin".to_string(),
            password: "s3cret:pass".to_string(),
        }
    }

    fn header(raw: &str) -> String {
        format!("Basic {}", BASE64.encode(raw))
    }

    #[test]
    fn test_valid_credentials() {
        let value = header("admin:s3cret:pass");
        assert!(verify_basic_auth(Some(&value), &creds()).is_ok());
    }

    #[test]
    fn test_missing_header() {
        assert!(matches!(
            verify_basic_auth(None, &creds()),
            Err(ServiceError::Unauthorized)
        ));
    }

    #[test]
    fn test_rejects_bad_headers() {
        let bad = [
            header("admin:wrong"),
            header("root:s3cret:pass"),
            header("admin"),
            format!("Bearer {}", BASE64.encode("admin:s3cret:pass")),
            format!("basic {}", BASE64.encode("admin:s3cret:pass")),
            "Basic !!not-base64!!".to_string(),
            format!("Basic {}", BASE64.encode([0xff, 0xfe, b':', b'x'])),
            "Basic".to_string(),
            String::new(),
        ];

        for value in bad {
            assert!(
                matches!(verify_basic_auth(Some(&value), &creds()), Err(ServiceError::Unauthorized)),
                "accepted {:?}",
                value
            );
        }
    }

    #[test]
    fn test_secure_eq() {
        assert!(secure_eq("abc", "abc"));
        assert!(!secure_eq("abc", "abd"));
        assert!(!secure_eq("abc", "abcd"));
        assert!(secure_eq("", ""));
        assert!(!secure_eq("", "abc"));
        assert!(secure_eq("s3cret:pass", "s3cret:pass"));
    }

    #[test]
    fn test_credentials_differing_only_in_length() {
        let value = header("admin:s3cret:pas");
        assert!(matches!(verify_basic_auth(Some(&value), &creds()), Err(ServiceError::Unauthorized)));
        let value = header("admin:s3cret:passs");
        assert!(matches!(verify_basic_auth(Some(&value), &creds()), Err(ServiceError::Unauthorized)));
    }
}
