//! JWK (RFC 7517) import/export for RSA keys.
//!
//! This is the portable key format: public halves travel through the
//! directory as JWKs, and the CLI writes key files in it. Numeric members use
//! unpadded base64url; the `alg` member tags key purpose (`RSA-OAEP-256` for
//! encryption, `PS256` for signing) and is checked on import, so a key
//! exported for one purpose cannot be re-imported for the other.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use rsa::traits::{PrivateKeyParts, PublicKeyParts};
use rsa::{BigUint, RsaPrivateKey, RsaPublicKey};
use serde::{Deserialize, Serialize};

use crate::error::ProtocolError;
use crate::keys::{
    EncryptionPrivateKey, EncryptionPublicKey, KeyPurpose, SigningPrivateKey, SigningPublicKey,
};

/// `alg` value for encryption keys (RSA-OAEP with SHA-256).
pub const ALG_ENCRYPTION: &str = "RSA-OAEP-256";
/// `alg` value for signing keys (RSA-PSS with SHA-256).
pub const ALG_SIGNING: &str = "PS256";

/// An RSA JWK. Public keys carry `kty`/`n`/`e` (+ `alg`, `key_ops`); private
/// exports add the CRT members. Unknown incidental members (`kid`, reordered
/// fields) are tolerated on import and ignored by fingerprinting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Jwk {
    pub kty: String,
    #[serde(default)]
    pub n: String,
    #[serde(default)]
    pub e: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alg: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key_ops: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kid: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub d: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub p: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub q: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dp: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dq: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub qi: Option<String>,
}

fn b64url(bytes: &[u8]) -> String {
    URL_SAFE_NO_PAD.encode(bytes)
}

fn uint_to_b64(value: &BigUint) -> String {
    b64url(&value.to_bytes_be())
}

fn b64_to_uint(member: &str, text: &str) -> Result<BigUint, ProtocolError> {
    let bytes = URL_SAFE_NO_PAD
        .decode(text)
        .map_err(|_| ProtocolError::InvalidKey(format!("jwk member '{member}' is not base64url")))?;
    Ok(BigUint::from_bytes_be(&bytes))
}

fn check_purpose(jwk: &Jwk, expected: KeyPurpose) -> Result<(), ProtocolError> {
    if jwk.kty != "RSA" {
        return Err(ProtocolError::InvalidKey(format!(
            "unsupported kty '{}'",
            jwk.kty
        )));
    }
    if jwk.n.is_empty() || jwk.e.is_empty() {
        return Err(ProtocolError::InvalidKey("missing n or e".into()));
    }
    let expected_alg = match expected {
        KeyPurpose::Encryption => ALG_ENCRYPTION,
        KeyPurpose::Signing => ALG_SIGNING,
    };
    // An absent alg is tolerated; a present one must match the requested purpose.
    if let Some(alg) = &jwk.alg {
        if alg != expected_alg {
            return Err(ProtocolError::InvalidKey(format!(
                "alg '{alg}' is not a {expected} key"
            )));
        }
    }
    Ok(())
}

fn export_public(pk: &RsaPublicKey, alg: &str, ops: &[&str]) -> Jwk {
    Jwk {
        kty: "RSA".into(),
        n: uint_to_b64(pk.n()),
        e: uint_to_b64(pk.e()),
        alg: Some(alg.into()),
        key_ops: Some(ops.iter().map(|s| (*s).into()).collect()),
        kid: None,
        d: None,
        p: None,
        q: None,
        dp: None,
        dq: None,
        qi: None,
    }
}

fn export_private(sk: &RsaPrivateKey, alg: &str, ops: &[&str]) -> Jwk {
    let primes = sk.primes();
    let (p, q) = (&primes[0], &primes[1]);
    let one = BigUint::from(1u32);
    let two = BigUint::from(2u32);
    // CRT members recomputed from d, p, q; p and q are prime so the
    // coefficient is q^(p-2) mod p.
    let dp = sk.d() % (p - &one);
    let dq = sk.d() % (q - &one);
    let qi = q.modpow(&(p - &two), p);
    Jwk {
        d: Some(uint_to_b64(sk.d())),
        p: Some(uint_to_b64(p)),
        q: Some(uint_to_b64(q)),
        dp: Some(uint_to_b64(&dp)),
        dq: Some(uint_to_b64(&dq)),
        qi: Some(uint_to_b64(&qi)),
        ..export_public(&RsaPublicKey::from(sk), alg, ops)
    }
}

fn import_public(jwk: &Jwk, purpose: KeyPurpose) -> Result<RsaPublicKey, ProtocolError> {
    check_purpose(jwk, purpose)?;
    let n = b64_to_uint("n", &jwk.n)?;
    let e = b64_to_uint("e", &jwk.e)?;
    RsaPublicKey::new(n, e).map_err(|e| ProtocolError::InvalidKey(format!("rsa public key: {e}")))
}

fn import_private(jwk: &Jwk, purpose: KeyPurpose) -> Result<RsaPrivateKey, ProtocolError> {
    check_purpose(jwk, purpose)?;
    let n = b64_to_uint("n", &jwk.n)?;
    let e = b64_to_uint("e", &jwk.e)?;
    let d = match &jwk.d {
        Some(d) => b64_to_uint("d", d)?,
        None => return Err(ProtocolError::InvalidKey("missing private member d".into())),
    };
    let (p, q) = match (&jwk.p, &jwk.q) {
        (Some(p), Some(q)) => (b64_to_uint("p", p)?, b64_to_uint("q", q)?),
        _ => return Err(ProtocolError::InvalidKey("missing prime factors".into())),
    };
    let mut sk = RsaPrivateKey::from_components(n, e, d, vec![p, q])
        .map_err(|e| ProtocolError::InvalidKey(format!("rsa private key: {e}")))?;
    sk.precompute()
        .map_err(|e| ProtocolError::InvalidKey(format!("rsa private key: {e}")))?;
    Ok(sk)
}

impl EncryptionPublicKey {
    pub fn to_jwk(&self) -> Jwk {
        export_public(&self.0, ALG_ENCRYPTION, &["encrypt", "wrapKey"])
    }

    pub fn from_jwk(jwk: &Jwk) -> Result<Self, ProtocolError> {
        import_public(jwk, KeyPurpose::Encryption).map(Self)
    }
}

impl EncryptionPrivateKey {
    pub fn to_jwk(&self) -> Jwk {
        export_private(&self.0, ALG_ENCRYPTION, &["decrypt", "unwrapKey"])
    }

    pub fn from_jwk(jwk: &Jwk) -> Result<Self, ProtocolError> {
        import_private(jwk, KeyPurpose::Encryption).map(Self)
    }
}

impl SigningPublicKey {
    pub fn to_jwk(&self) -> Jwk {
        export_public(&self.0, ALG_SIGNING, &["verify"])
    }

    pub fn from_jwk(jwk: &Jwk) -> Result<Self, ProtocolError> {
        import_public(jwk, KeyPurpose::Signing).map(Self)
    }
}

impl SigningPrivateKey {
    pub fn to_jwk(&self) -> Jwk {
        export_private(&self.0, ALG_SIGNING, &["sign"])
    }

    pub fn from_jwk(jwk: &Jwk) -> Result<Self, ProtocolError> {
        import_private(jwk, KeyPurpose::Signing).map(Self)
    }
}
