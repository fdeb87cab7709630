//! HMAC-SHA256 signed bearer tokens.
//!
//! Layout: `base64url(header).base64url(claims).base64url(signature)` where
//! the signature covers the first two segments joined by a dot.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, Duration, Utc};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use uuid::Uuid;

use super::password::constant_time_eq;
use crate::models::{PermissionSet, Role, User};

type HmacSha256 = Hmac<Sha256>;

const HEADER: &str = r#"{"alg":"HS256","typ":"JWT"}"#;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum TokenError {
    #[error("malformed token")]
    Malformed,
    #[error("invalid token signature")]
    BadSignature,
    #[error("token expired")]
    Expired,
    #[error("invalid signing key")]
    Key,
}

/// Identity and permission snapshot carried by a token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// User email.
    pub sub: String,
    pub user_id: Uuid,
    pub role_id: Uuid,
    pub role_name: String,
    pub permissions: PermissionSet,
    pub iat: i64,
    pub exp: i64,
}

impl Claims {
    pub fn new(user: &User, role: &Role, now: DateTime<Utc>, ttl: Duration) -> Self {
        Self {
            sub: user.email.clone(),
            user_id: user.id,
            role_id: role.id,
            role_name: role.name.clone(),
            permissions: role.permissions.clone(),
            iat: now.timestamp(),
            exp: now
                .checked_add_signed(ttl)
                .unwrap_or(DateTime::<Utc>::MAX_UTC)
                .timestamp(),
        }
    }
}

fn sign(secret: &str, signing_input: &str) -> Result<Vec<u8>, TokenError> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).map_err(|_| TokenError::Key)?;
    mac.update(signing_input.as_bytes());
    Ok(mac.finalize().into_bytes().to_vec())
}

pub fn encode(claims: &Claims, secret: &str) -> Result<String, TokenError> {
    let payload = serde_json::to_vec(claims).map_err(|_| TokenError::Malformed)?;
    let signing_input = format!(
        "{}.{}",
        URL_SAFE_NO_PAD.encode(HEADER),
        URL_SAFE_NO_PAD.encode(payload)
    );
    let signature = sign(secret, &signing_input)?;
    Ok(format!(
        "{}.{}",
        signing_input,
        URL_SAFE_NO_PAD.encode(signature)
    ))
}

/// Check signature and expiry, returning the embedded claims.
pub fn decode(token: &str, secret: &str, now: DateTime<Utc>) -> Result<Claims, TokenError> {
    let mut parts = token.split('.');
    let (Some(header), Some(payload), Some(signature), None) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return Err(TokenError::Malformed);
    };

    let expected = sign(secret, &format!("{}.{}", header, payload))?;
    let given = URL_SAFE_NO_PAD
        .decode(signature)
        .map_err(|_| TokenError::Malformed)?;
    if !constant_time_eq(&expected, &given) {
        return Err(TokenError::BadSignature);
    }

    let payload = URL_SAFE_NO_PAD
        .decode(payload)
        .map_err(|_| TokenError::Malformed)?;
    let claims: Claims = serde_json::from_slice(&payload).map_err(|_| TokenError::Malformed)?;

    if claims.exp <= now.timestamp() {
        return Err(TokenError::Expired);
    }
    Ok(claims)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Capability;

    fn sample_claims(now: DateTime<Utc>) -> Claims {
        let role = Role::new(
            "Sales Executive",
            2,
            PermissionSet::new().with(Capability::Leads),
        );
        let user = User::new("Eve".into(), "eve@x.test".into(), String::new(), role.id);
        Claims::new(&user, &role, now, Duration::hours(24))
    }

    #[test]
    fn test_encode_decode() {
        let now = Utc::now();
        let claims = sample_claims(now);
        let token = encode(&claims, "secret").unwrap();
        assert_eq!(token.split('.').count(), 3);

        let decoded = decode(&token, "secret", now).unwrap();
        assert_eq!(decoded, claims);
        assert!(decoded.permissions.grants(Capability::Leads));
    }

    #[test]
    fn test_wrong_secret() {
        let now = Utc::now();
        let token = encode(&sample_claims(now), "secret").unwrap();
        assert_eq!(decode(&token, "other", now), Err(TokenError::BadSignature));
    }

    #[test]
    fn test_tampered_payload() {
        let now = Utc::now();
        let token = encode(&sample_claims(now), "secret").unwrap();
        let mut parts: Vec<&str> = token.split('.').collect();
        let forged = URL_SAFE_NO_PAD.encode(r#"{"sub":"admin"}"#);
        parts[1] = &forged;
        assert_eq!(
            decode(&parts.join("."), "secret", now),
            Err(TokenError::BadSignature)
        );
    }

    #[test]
    fn test_expired() {
        let now = Utc::now();
        let token = encode(&sample_claims(now), "secret").unwrap();
        let later = now + Duration::hours(25);
        assert_eq!(decode(&token, "secret", later), Err(TokenError::Expired));
    }

    #[test]
    fn test_oversized_ttl_saturates() {
        let now = Utc::now();
        let role = Role::new("Admin", 0, PermissionSet::new());
        let user = User::new("Ada".into(), "ada@x.test".into(), String::new(), role.id);
        let claims = Claims::new(&user, &role, now, Duration::MAX);
        assert_eq!(claims.exp, DateTime::<Utc>::MAX_UTC.timestamp());
        let token = encode(&claims, "secret").unwrap();
        assert!(decode(&token, "secret", now).is_ok());
    }

    #[test]
    fn test_malformed() {
        let now = Utc::now();
        assert_eq!(decode("abc", "secret", now), Err(TokenError::Malformed));
        assert_eq!(decode("a.b.c.d", "secret", now), Err(TokenError::Malformed));
    }
}
