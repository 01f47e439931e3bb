use chrono::Utc;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::config::JwtConfig;
use crate::error::{ApiError, ApiResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Access,
    Refresh,
}

impl TokenKind {
    fn as_str(self) -> &'static str {
        match self {
            TokenKind::Access => "access",
            TokenKind::Refresh => "refresh",
        }
    }
}

/// JWT payload: subject is the user's record key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub token_type: String,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Debug, Clone)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

fn secret(cfg: &JwtConfig, kind: TokenKind) -> &str {
    match kind {
        TokenKind::Access => &cfg.access_secret,
        TokenKind::Refresh => &cfg.refresh_secret,
    }
}

fn ttl(cfg: &JwtConfig, kind: TokenKind) -> i64 {
    match kind {
        TokenKind::Access => cfg.access_ttl_secs,
        TokenKind::Refresh => cfg.refresh_ttl_secs,
    }
}

pub fn sign(cfg: &JwtConfig, user_id: &str, kind: TokenKind) -> ApiResult<String> {
    let now = Utc::now().timestamp();
    let claims = Claims {
        sub: user_id.to_string(),
        token_type: kind.as_str().to_string(),
        iat: now,
        exp: now + ttl(cfg, kind),
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret(cfg, kind).as_bytes()),
    )
    .map_err(|e| ApiError::Internal(format!("token signing failed: {e}")))
}

/// Verify a token of the expected kind; an access token presented where a
/// refresh token is expected (or vice versa) is rejected.
pub fn verify(cfg: &JwtConfig, token: &str, kind: TokenKind) -> ApiResult<Claims> {
    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret(cfg, kind).as_bytes()),
        &Validation::default(),
    )
    .map_err(|e| match e.kind() {
        jsonwebtoken::errors::ErrorKind::ExpiredSignature => {
            ApiError::Unauthorized("token expired".into())
        }
        _ => ApiError::Unauthorized("invalid token".into()),
    })?;

    if data.claims.token_type != kind.as_str() {
        return Err(ApiError::Unauthorized("wrong token type".into()));
    }

    Ok(data.claims)
}

pub fn issue_pair(cfg: &JwtConfig, user_id: &str) -> ApiResult<TokenPair> {
    Ok(TokenPair {
        access_token: sign(cfg, user_id, TokenKind::Access)?,
        refresh_token: sign(cfg, user_id, TokenKind::Refresh)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_cfg() -> JwtConfig {
        JwtConfig {
            access_secret: "access-secret".into(),
            refresh_secret: "refresh-secret".into(),
            access_ttl_secs: 900,
            refresh_ttl_secs: 86400,
        }
    }

    #[test]
    fn sign_and_verify_roundtrip() {
        let cfg = test_cfg();
        let token = sign(&cfg, "u1", TokenKind::Access).unwrap();
        let claims = verify(&cfg, &token, TokenKind::Access).unwrap();
        assert_eq!(claims.sub, "u1");
        assert_eq!(claims.token_type, "access");
    }

    #[test]
    fn refresh_token_rejected_as_access() {
        let cfg = test_cfg();
        let token = sign(&cfg, "u1", TokenKind::Refresh).unwrap();
        let err = verify(&cfg, &token, TokenKind::Access).unwrap_err();
        assert!(matches!(err, ApiError::Unauthorized(_)));
    }

    #[test]
    fn tampered_token_rejected() {
        let cfg = test_cfg();
        let mut token = sign(&cfg, "u1", TokenKind::Access).unwrap();
        token.push('x');
        assert!(verify(&cfg, &token, TokenKind::Access).is_err());
    }

    #[test]
    fn expired_token_rejected() {
        let mut cfg = test_cfg();
        cfg.access_ttl_secs = -120;
        let token = sign(&cfg, "u1", TokenKind::Access).unwrap();
        let err = verify(&cfg, &token, TokenKind::Access).unwrap_err();
        match err {
            ApiError::Unauthorized(msg) => assert!(msg.contains("expired")),
            other => panic!("expected unauthorized, got {other:?}"),
        }
    }
}
