//! Capability-typed RSA key pairs.
//!
//! Key purpose lives in the type system: an encryption key and a signing key
//! are different types, so handing a signing key to a wrap operation is a
//! compile error rather than a runtime surprise. The only place purpose can
//! be confused at runtime is JWK import, which checks the `alg` tag (see
//! [`crate::jwk`]).
//!
//! Private keys deliberately do not implement `Serialize`; the only way key
//! material leaves an [`Identity`] is through an explicit JWK export.

use core::fmt;

use rand::rngs::OsRng;
use rsa::{RsaPrivateKey, RsaPublicKey};

use crate::error::ProtocolError;

/// RSA modulus size for both key purposes.
pub const RSA_MODULUS_BITS: usize = 2048;

/// Which role a key pair plays in the protocol.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KeyPurpose {
    /// Confidentiality: OAEP wrap/unwrap of per-message symmetric keys.
    Encryption,
    /// Authenticity: PSS sign/verify over ciphertext.
    Signing,
}

impl fmt::Display for KeyPurpose {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyPurpose::Encryption => write!(f, "encryption"),
            KeyPurpose::Signing => write!(f, "signing"),
        }
    }
}

// ---------------------------------------------------------------------------
// Key types
// ---------------------------------------------------------------------------

/// Public half of an encryption key pair. Wraps symmetric keys (RSA-OAEP).
#[derive(Clone, PartialEq)]
pub struct EncryptionPublicKey(pub(crate) RsaPublicKey);

/// Private half of an encryption key pair. Unwraps symmetric keys.
#[derive(Clone)]
pub struct EncryptionPrivateKey(pub(crate) RsaPrivateKey);

/// Public half of a signing key pair. Verifies PSS signatures.
#[derive(Clone, PartialEq)]
pub struct SigningPublicKey(pub(crate) RsaPublicKey);

/// Private half of a signing key pair. Produces PSS signatures.
#[derive(Clone)]
pub struct SigningPrivateKey(pub(crate) RsaPrivateKey);

impl fmt::Debug for EncryptionPrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EncryptionPrivateKey(..)")
    }
}

impl fmt::Debug for SigningPrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SigningPrivateKey(..)")
    }
}

impl fmt::Debug for EncryptionPublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EncryptionPublicKey({})", self.fingerprint())
    }
}

impl fmt::Debug for SigningPublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SigningPublicKey({})", self.fingerprint())
    }
}

// ---------------------------------------------------------------------------
// Generation
// ---------------------------------------------------------------------------

fn generate_rsa() -> Result<(RsaPublicKey, RsaPrivateKey), ProtocolError> {
    let sk = RsaPrivateKey::new(&mut OsRng, RSA_MODULUS_BITS)
        .map_err(|e| ProtocolError::Crypto(format!("rsa keygen: {e}")))?;
    let pk = RsaPublicKey::from(&sk);
    Ok((pk, sk))
}

/// Generate a fresh encryption key pair (RSA-2048, e = 65537).
///
/// Usable only for wrap/unwrap; the signing operations take different types.
pub fn generate_encryption_keypair(
) -> Result<(EncryptionPublicKey, EncryptionPrivateKey), ProtocolError> {
    let (pk, sk) = generate_rsa()?;
    Ok((EncryptionPublicKey(pk), EncryptionPrivateKey(sk)))
}

/// Generate a fresh signing key pair (RSA-2048, e = 65537).
pub fn generate_signing_keypair() -> Result<(SigningPublicKey, SigningPrivateKey), ProtocolError> {
    let (pk, sk) = generate_rsa()?;
    Ok((SigningPublicKey(pk), SigningPrivateKey(sk)))
}

// ---------------------------------------------------------------------------
// Identity
// ---------------------------------------------------------------------------

/// One actor in the demo: a user id plus exactly one encryption pair and one
/// signing pair. Created per session, never persisted.
pub struct Identity {
    user_id: String,
    enc_pub: EncryptionPublicKey,
    enc_priv: EncryptionPrivateKey,
    sign_pub: SigningPublicKey,
    sign_priv: SigningPrivateKey,
}

impl Identity {
    /// Generate both key pairs for a new actor.
    pub fn generate(user_id: impl Into<String>) -> Result<Self, ProtocolError> {
        let (enc_pub, enc_priv) = generate_encryption_keypair()?;
        let (sign_pub, sign_priv) = generate_signing_keypair()?;
        Ok(Self {
            user_id: user_id.into(),
            enc_pub,
            enc_priv,
            sign_pub,
            sign_priv,
        })
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn encryption_public(&self) -> &EncryptionPublicKey {
        &self.enc_pub
    }

    pub fn encryption_private(&self) -> &EncryptionPrivateKey {
        &self.enc_priv
    }

    pub fn signing_public(&self) -> &SigningPublicKey {
        &self.sign_pub
    }

    pub fn signing_private(&self) -> &SigningPrivateKey {
        &self.sign_priv
    }
}

impl fmt::Debug for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Identity")
            .field("user_id", &self.user_id)
            .finish_non_exhaustive()
    }
}
