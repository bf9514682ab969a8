//! Static bearer-token authentication for the catalog API.

use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ApiAuthError {
    #[error("missing credentials")]
    Missing,
    #[error("invalid credentials")]
    Invalid,
}

/// Caller identity attached to authenticated requests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiPrincipal {
    /// First 12 hex chars of the token digest; safe to log.
    pub token_fingerprint: String,
}

/// Holds SHA-256 digests of the configured tokens, never the tokens.
///
/// With no tokens configured every request is rejected.
#[derive(Clone, Default)]
pub struct TokenAuthenticator {
    digests: Vec<[u8; 32]>,
}

impl TokenAuthenticator {
    pub fn new<I, S>(tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let digests = tokens
            .into_iter()
            .filter(|token| !token.as_ref().is_empty())
            .map(|token| digest(token.as_ref()))
            .collect();
        Self { digests }
    }

    pub fn has_tokens(&self) -> bool {
        !self.digests.is_empty()
    }

    pub fn authenticate(&self, token: Option<&str>) -> Result<ApiPrincipal, ApiAuthError> {
        let token = token
            .filter(|token| !token.is_empty())
            .ok_or(ApiAuthError::Missing)?;
        let candidate = digest(token);

        // Compare against every digest so timing does not reveal which matched.
        let matched = self
            .digests
            .iter()
            .fold(0u8, |acc, known| acc | known[..].ct_eq(&candidate[..]).unwrap_u8());

        if matched == 1 {
            Ok(ApiPrincipal {
                token_fingerprint: hex::encode(&candidate[..6]),
            })
        } else {
            Err(ApiAuthError::Invalid)
        }
    }
}

fn digest(token: &str) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    let mut out = [0u8; 32];
    out.copy_from_slice(&hasher.finalize());
    out
}
