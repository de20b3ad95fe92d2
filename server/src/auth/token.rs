use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};

use shared::types::AccessClaims;

/// Signs and verifies access tokens with a single process-wide symmetric
/// key, injected at construction.
///
/// Exactly one algorithm (HS256) is accepted: a token signed any other way
/// fails verification instead of being silently honoured, and claims are
/// never inspected before the signature checks out.
#[derive(Clone)]
pub struct TokenCodec {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
}

impl std::fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Keys stay out of logs.
        f.debug_struct("TokenCodec").finish_non_exhaustive()
    }
}

impl TokenCodec {
    pub fn new(secret: &str) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // No clock leeway: an expired token is expired, matching the exact
        // second-granularity comparison used for session expiry.
        validation.leeway = 0;

        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }

    /// Sign the claims into a compact token string.
    pub fn encode(&self, claims: &AccessClaims) -> Result<String, jsonwebtoken::errors::Error> {
        jsonwebtoken::encode(&Header::new(Algorithm::HS256), claims, &self.encoding)
    }

    /// Verify signature, algorithm and expiry, then hand back the claims.
    pub fn decode(&self, token: &str) -> Result<AccessClaims, jsonwebtoken::errors::Error> {
        jsonwebtoken::decode::<AccessClaims>(token, &self.decoding, &self.validation)
            .map(|data| data.claims)
    }
}
