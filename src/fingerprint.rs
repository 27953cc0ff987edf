//! Public-key fingerprints.
//!
//! A fingerprint is the lowercase-hex SHA-256 of the canonical JWK form
//! `{"e":"…","kty":"RSA","n":"…"}`: exactly these three members, in this
//! order, with no whitespace. Everything else a JWK may carry (`alg`, `kid`,
//! `key_ops`, member order in the serialized form) is deliberately outside
//! the digest, so the same key always yields the same fingerprint no matter
//! which export produced it.

use core::fmt;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

use crate::codec::to_hex;
use crate::error::ProtocolError;
use crate::jwk::Jwk;
use crate::keys::{EncryptionPublicKey, SigningPublicKey};

/// Lowercase-hex SHA-256 thumbprint of an RSA public key.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fingerprint(String);

impl Fingerprint {
    pub fn as_hex(&self) -> &str {
        &self.0
    }

    /// Constant-time comparison for the handshake path, where an attacker
    /// may control one side of the comparison.
    pub fn ct_eq(&self, other: &Fingerprint) -> bool {
        self.0.as_bytes().ct_eq(other.0.as_bytes()).into()
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn canonical_digest(e: &str, kty: &str, n: &str) -> Fingerprint {
    let canonical = format!(r#"{{"e":"{e}","kty":"{kty}","n":"{n}"}}"#);
    Fingerprint(to_hex(Sha256::digest(canonical.as_bytes()).as_slice()))
}

/// Fingerprint an RSA public JWK.
///
/// Fails with `InvalidKey` for a non-RSA `kty` or missing `n`/`e`; private
/// members, if present, are ignored (the fingerprint is of the public half).
pub fn jwk_thumbprint(jwk: &Jwk) -> Result<Fingerprint, ProtocolError> {
    if jwk.kty != "RSA" {
        return Err(ProtocolError::InvalidKey(format!(
            "cannot fingerprint kty '{}'",
            jwk.kty
        )));
    }
    if jwk.n.is_empty() || jwk.e.is_empty() {
        return Err(ProtocolError::InvalidKey(
            "cannot fingerprint a jwk without n and e".into(),
        ));
    }
    Ok(canonical_digest(&jwk.e, &jwk.kty, &jwk.n))
}

impl EncryptionPublicKey {
    /// Thumbprint of this key; always defined for a held key.
    pub fn fingerprint(&self) -> Fingerprint {
        let jwk = self.to_jwk();
        canonical_digest(&jwk.e, &jwk.kty, &jwk.n)
    }
}

impl SigningPublicKey {
    pub fn fingerprint(&self) -> Fingerprint {
        let jwk = self.to_jwk();
        canonical_digest(&jwk.e, &jwk.kty, &jwk.n)
    }
}
