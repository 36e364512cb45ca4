//! Bearer tokens issued by the external identity provider (HS256).

use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use super::{Identity, IdentityError};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClaims {
    pub sub: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub picture: Option<String>,
    pub exp: usize,
}

impl From<TokenClaims> for Identity {
    fn from(claims: TokenClaims) -> Self {
        Identity {
            uid: claims.sub.into(),
            display_name: claims.name,
            email: claims.email,
            photo_url: claims.picture,
        }
    }
}

#[derive(Clone)]
pub struct TokenVerifier {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
}

impl std::fmt::Debug for TokenVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenVerifier").finish_non_exhaustive()
    }
}

impl TokenVerifier {
    pub fn new(secret: &[u8]) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            validation: Validation::default(),
        }
    }

    /// Verify signature and expiry, and return the identity the token names.
    pub fn verify(&self, token: &str) -> Result<Identity, IdentityError> {
        let data = decode::<TokenClaims>(token, &self.decoding, &self.validation)?;
        Ok(data.claims.into())
    }

    /// Sign a token for local development and tests.
    pub fn issue(&self, claims: &TokenClaims) -> Result<String, IdentityError> {
        Ok(encode(&Header::default(), claims, &self.encoding)?)
    }
}
