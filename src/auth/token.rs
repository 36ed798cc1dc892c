use std::fmt;

use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, decode_header, Algorithm, DecodingKey, Validation};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::AuthenticatedUser;
use crate::config::AuthConfig;
use crate::logging::LogContext;

/// Only the symmetric HMAC family is accepted, whatever the token header claims.
pub const ALLOWED_ALGORITHMS: [Algorithm; 3] = [Algorithm::HS256, Algorithm::HS384, Algorithm::HS512];

/// The claims read from a verified token. Everything is optional here; `sub` is
/// checked after the signature so a bad subject is reported as such.
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct Claims {
    #[serde(default)]
    pub sub: Option<Value>,
    #[serde(default)]
    pub email: Option<Value>,
    #[serde(default)]
    pub role: Option<Value>,
}

/// Why a request was not authenticated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenError {
    MissingHeader,
    /// The header is not exactly `Bearer <token>`.
    MalformedHeader,
    /// The token is not a parseable JWT.
    Malformed(String),
    /// The header advertises an algorithm outside [`ALLOWED_ALGORITHMS`].
    AlgorithmNotAllowed(Algorithm),
    InvalidSignature,
    Expired,
    /// Any other claim validation failure (audience, immature token, ...).
    Rejected(String),
    /// The signature is valid but `sub` is absent or not a string.
    MissingSubject,
}

impl fmt::Display for TokenError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            TokenError::MissingHeader => write!(f, "Authorization header is required"),
            TokenError::MalformedHeader => write!(f, "Invalid authorization header format"),
            TokenError::Malformed(reason) => write!(f, "Failed to parse token: {}", reason),
            TokenError::AlgorithmNotAllowed(alg) => {
                write!(f, "Invalid token: unexpected signing method {:?}", alg)
            }
            TokenError::InvalidSignature => write!(f, "Invalid token: signature mismatch"),
            TokenError::Expired => write!(f, "Invalid token: expired"),
            TokenError::Rejected(reason) => write!(f, "Invalid token: {}", reason),
            TokenError::MissingSubject => write!(f, "Invalid token claims"),
        }
    }
}

impl std::error::Error for TokenError {}

/// Extracts the token from an `Authorization` header value. The scheme is matched
/// case-insensitively and exactly one space must separate it from the token.
pub fn bearer_token(header: &str) -> Result<&str, TokenError> {
    let mut parts = header.split(' ');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(scheme), Some(token), None)
            if scheme.eq_ignore_ascii_case("bearer") && !token.is_empty() =>
        {
            Ok(token)
        }
        _ => Err(TokenError::MalformedHeader),
    }
}

/// Verifies tokens issued by the identity provider with the shared secret.
pub struct TokenVerifier {
    key: DecodingKey,
    validation: Validation,
    log: LogContext,
}

impl TokenVerifier {
    pub fn new(config: &AuthConfig, log: LogContext) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.algorithms = ALLOWED_ALGORITHMS.to_vec();
        validation.leeway = config.leeway_secs;
        match &config.audience {
            Some(audience) => validation.set_audience(&[audience]),
            None => validation.validate_aud = false,
        }

        Self {
            key: DecodingKey::from_secret(config.jwt_secret.as_bytes()),
            validation,
            log,
        }
    }

    /// Authenticates a request from its raw `Authorization` header, if any.
    pub fn authenticate(&self, header: Option<&str>) -> Result<AuthenticatedUser, TokenError> {
        let result = header
            .ok_or(TokenError::MissingHeader)
            .and_then(bearer_token)
            .and_then(|token| self.verify(token));

        if let Err(err) = &result {
            warn!(target: self.log.target(), "rejected request: {:?}", err);
        }
        result
    }

    /// Verifies a bare token and returns the identity it carries.
    pub fn verify(&self, token: &str) -> Result<AuthenticatedUser, TokenError> {
        // The unverified header is only used to refuse foreign algorithms early.
        let header = decode_header(token).map_err(|e| TokenError::Malformed(e.to_string()))?;
        if !ALLOWED_ALGORITHMS.contains(&header.alg) {
            return Err(TokenError::AlgorithmNotAllowed(header.alg));
        }

        let data = decode::<Claims>(token, &self.key, &self.validation).map_err(|e| match e.kind() {
            ErrorKind::InvalidSignature => TokenError::InvalidSignature,
            ErrorKind::ExpiredSignature => TokenError::Expired,
            ErrorKind::InvalidAlgorithm => TokenError::AlgorithmNotAllowed(header.alg),
            ErrorKind::InvalidToken | ErrorKind::Base64(_) | ErrorKind::Json(_) | ErrorKind::Utf8(_) => {
                TokenError::Malformed(e.to_string())
            }
            _ => TokenError::Rejected(e.to_string()),
        })?;

        let claims = data.claims;
        let user_id = match claims.sub {
            Some(Value::String(sub)) if !sub.is_empty() => sub,
            _ => return Err(TokenError::MissingSubject),
        };
        debug!(target: self.log.target(), "authenticated user {}", user_id);

        Ok(AuthenticatedUser {
            user_id,
            email: claims.email.and_then(|v| v.as_str().map(str::to_string)),
            role: claims.role.and_then(|v| v.as_str().map(str::to_string)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{encode, EncodingKey, Header};
    use serde_json::json;

    const SECRET: &str = "test_secret_for_verifier";

    fn verifier() -> TokenVerifier {
        TokenVerifier::new(
            &AuthConfig {
                jwt_secret: SECRET.to_string(),
                audience: None,
                leeway_secs: 0,
            },
            LogContext::default(),
        )
    }

    fn sign(claims: Value, secret: &str, alg: Algorithm) -> String {
        encode(
            &Header::new(alg),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    fn expires_in(seconds: i64) -> i64 {
        chrono::Utc::now().timestamp() + seconds
    }

    #[test]
    fn test_bearer_token_parsing() {
        assert_eq!(bearer_token("Bearer abc.def.ghi"), Ok("abc.def.ghi"));
        assert_eq!(bearer_token("bearer abc"), Ok("abc"));
        assert_eq!(bearer_token("Bearer"), Err(TokenError::MalformedHeader));
        assert_eq!(bearer_token("Bearer "), Err(TokenError::MalformedHeader));
        assert_eq!(bearer_token("Basic abc"), Err(TokenError::MalformedHeader));
        assert_eq!(bearer_token("Bearer a b"), Err(TokenError::MalformedHeader));
    }

    #[test]
    fn test_valid_token_yields_subject() {
        for alg in ALLOWED_ALGORITHMS {
            let token = sign(
                json!({"sub": "user-123", "exp": expires_in(3600), "email": "a@example.com"}),
                SECRET,
                alg,
            );
            let user = verifier().verify(&token).unwrap();
            assert_eq!(user.user_id, "user-123");
            assert_eq!(user.email.as_deref(), Some("a@example.com"));
        }
    }

    #[test]
    fn test_wrong_secret_is_rejected() {
        let token = sign(
            json!({"sub": "user-123", "exp": expires_in(3600)}),
            "some_other_secret",
            Algorithm::HS256,
        );
        assert_eq!(verifier().verify(&token), Err(TokenError::InvalidSignature));
    }

    #[test]
    fn test_expired_token_is_rejected() {
        let token = sign(
            json!({"sub": "user-123", "exp": expires_in(-7200)}),
            SECRET,
            Algorithm::HS256,
        );
        assert_eq!(verifier().verify(&token), Err(TokenError::Expired));
    }

    #[test]
    fn test_foreign_algorithm_is_rejected() {
        let token = sign(
            json!({"sub": "user-123", "exp": expires_in(3600)}),
            SECRET,
            Algorithm::HS256,
        );
        let parts: Vec<&str> = token.split('.').collect();
        // {"alg":"RS256","typ":"JWT"}
        let forged = format!("eyJhbGciOiJSUzI1NiIsInR5cCI6IkpXVCJ9.{}.{}", parts[1], parts[2]);
        assert_eq!(
            verifier().verify(&forged),
            Err(TokenError::AlgorithmNotAllowed(Algorithm::RS256))
        );

        // {"alg":"none","typ":"JWT"}
        let unsigned = format!("eyJhbGciOiJub25lIiwidHlwIjoiSldUIn0.{}.", parts[1]);
        assert!(verifier().verify(&unsigned).is_err());
    }

    #[test]
    fn test_malformed_token_is_rejected() {
        assert!(matches!(
            verifier().verify("not-a-jwt"),
            Err(TokenError::Malformed(_))
        ));
    }

    #[test]
    fn test_subject_must_be_a_string() {
        let numeric = sign(json!({"sub": 42, "exp": expires_in(3600)}), SECRET, Algorithm::HS256);
        assert_eq!(verifier().verify(&numeric), Err(TokenError::MissingSubject));

        let absent = sign(json!({"exp": expires_in(3600)}), SECRET, Algorithm::HS256);
        assert_eq!(verifier().verify(&absent), Err(TokenError::MissingSubject));
    }

    #[test]
    fn test_audience_is_enforced_when_configured() {
        let verifier = TokenVerifier::new(
            &AuthConfig {
                jwt_secret: SECRET.to_string(),
                audience: Some("authenticated".to_string()),
                leeway_secs: 0,
            },
            LogContext::default(),
        );
        let good = sign(
            json!({"sub": "u1", "aud": "authenticated", "exp": expires_in(3600)}),
            SECRET,
            Algorithm::HS256,
        );
        let bad = sign(
            json!({"sub": "u1", "aud": "anon", "exp": expires_in(3600)}),
            SECRET,
            Algorithm::HS256,
        );
        assert!(verifier.verify(&good).is_ok());
        assert!(matches!(verifier.verify(&bad), Err(TokenError::Rejected(_))));
    }

    #[test]
    fn test_authenticate_classifies_header_problems() {
        let verifier = verifier();
        assert_eq!(verifier.authenticate(None), Err(TokenError::MissingHeader));
        assert_eq!(
            verifier.authenticate(Some("Token abc")),
            Err(TokenError::MalformedHeader)
        );

        let token = sign(json!({"sub": "u1", "exp": expires_in(60)}), SECRET, Algorithm::HS384);
        let user = verifier
            .authenticate(Some(format!("Bearer {}", token).as_str()))
            .unwrap();
        assert_eq!(user.user_id, "u1");
    }
}
