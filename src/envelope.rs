//! The hybrid encryption envelope.
//!
//! Each message gets a fresh 32-byte AES-256-GCM key and 12-byte nonce. The
//! symmetric key is wrapped for the recipient with RSA-OAEP (SHA-256), and
//! the ciphertext is signed with the sender's RSA-PSS key (SHA-256, 32-byte
//! salt). All binary members travel as standard base64 inside a small JSON
//! object.
//!
//! Known limitation, preserved for wire compatibility: the signature covers
//! the ciphertext bytes only. The wrapped key and nonce are outside the
//! signed scope, so tampering with them surfaces as an unwrap or AEAD
//! failure rather than `SignatureInvalid`.

use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Nonce};
use getrandom::getrandom;
use rand::rngs::OsRng;
use rsa::{Oaep, Pss};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::debug;
use zeroize::Zeroizing;

use crate::codec::{decode_base64, encode_base64};
use crate::error::ProtocolError;
use crate::keys::{
    EncryptionPrivateKey, EncryptionPublicKey, SigningPrivateKey, SigningPublicKey,
};

/// Symmetric key length (AES-256).
pub const AES_KEY_LEN: usize = 32;
/// AES-GCM nonce length.
pub const NONCE_LEN: usize = 12;
/// PSS salt length, fixed by the wire format.
pub const PSS_SALT_LEN: usize = 32;
/// The `alg` label carried in every envelope. Display-only; decrypt does not
/// negotiate on it.
pub const ENVELOPE_ALG: &str = "RSA-OAEP";

/// One sealed message. Immutable once built; all binary members are standard
/// base64.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    pub alg: String,
    pub iv: String,
    pub ciphertext: String,
    #[serde(rename = "wrappedKey")]
    pub wrapped_key: String,
    pub signature: String,
}

impl Envelope {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }
}

fn fresh_bytes<const N: usize>() -> Result<[u8; N], ProtocolError> {
    let mut buf = [0u8; N];
    getrandom(&mut buf).map_err(|e| ProtocolError::Crypto(format!("os entropy: {e}")))?;
    Ok(buf)
}

fn aead_seal(
    key: &[u8; AES_KEY_LEN],
    nonce: &[u8; NONCE_LEN],
    plaintext: &[u8],
) -> Result<Vec<u8>, ProtocolError> {
    let cipher = Aes256Gcm::new_from_slice(key)
        .map_err(|_| ProtocolError::Crypto("aead key init".into()))?;
    cipher
        .encrypt(Nonce::from_slice(nonce), plaintext)
        .map_err(|_| ProtocolError::Crypto("aead seal".into()))
}

fn aead_open(
    key: &[u8; AES_KEY_LEN],
    nonce: &[u8; NONCE_LEN],
    ciphertext: &[u8],
) -> Result<Vec<u8>, ProtocolError> {
    let cipher = Aes256Gcm::new_from_slice(key)
        .map_err(|_| ProtocolError::AuthenticationFailed)?;
    cipher
        .decrypt(Nonce::from_slice(nonce), ciphertext)
        .map_err(|_| ProtocolError::AuthenticationFailed)
}

/// Seal a message for `recipient`, signed by `sender`.
///
/// Pure over its inputs apart from randomness: fresh key and nonce each call,
/// so sealing the same plaintext twice yields different envelopes.
pub fn encrypt(
    plaintext: &str,
    recipient: &EncryptionPublicKey,
    sender: &SigningPrivateKey,
) -> Result<Envelope, ProtocolError> {
    let key = Zeroizing::new(fresh_bytes::<AES_KEY_LEN>()?);
    let nonce = fresh_bytes::<NONCE_LEN>()?;

    let ciphertext = aead_seal(&key, &nonce, plaintext.as_bytes())?;

    let wrapped_key = recipient
        .0
        .encrypt(&mut OsRng, Oaep::new::<Sha256>(), key.as_slice())
        .map_err(|e| ProtocolError::Crypto(format!("key wrap: {e}")))?;

    // Sign the ciphertext bytes only (see module docs for the scope caveat).
    let digest = Sha256::digest(&ciphertext);
    let signature = sender
        .0
        .sign_with_rng(
            &mut OsRng,
            Pss::new_with_salt::<Sha256>(PSS_SALT_LEN),
            digest.as_slice(),
        )
        .map_err(|e| ProtocolError::Crypto(format!("sign: {e}")))?;

    debug!(
        ciphertext_len = ciphertext.len(),
        "envelope sealed"
    );

    Ok(Envelope {
        alg: ENVELOPE_ALG.into(),
        iv: encode_base64(&nonce),
        ciphertext: encode_base64(&ciphertext),
        wrapped_key: encode_base64(&wrapped_key),
        signature: encode_base64(&signature),
    })
}

/// Open an envelope: unwrap the symmetric key, verify the ciphertext
/// signature, then decrypt. Verification happens before decryption and a
/// failed signature aborts without touching the ciphertext.
///
/// The three stages fail with distinct errors (`UnwrapFailed`,
/// `SignatureInvalid`, `AuthenticationFailed`). That is deliberately more
/// informative than a production decrypt oracle should be; this crate is a
/// teaching protocol and its tests assert the stage.
pub fn decrypt(
    envelope: &Envelope,
    recipient: &EncryptionPrivateKey,
    sender: &SigningPublicKey,
) -> Result<String, ProtocolError> {
    // Stage 1: unwrap the per-message key.
    let wrapped = decode_base64(&envelope.wrapped_key).map_err(|_| ProtocolError::UnwrapFailed)?;
    let raw_key = Zeroizing::new(
        recipient
            .0
            .decrypt(Oaep::new::<Sha256>(), &wrapped)
            .map_err(|_| ProtocolError::UnwrapFailed)?,
    );
    let key: [u8; AES_KEY_LEN] = raw_key
        .as_slice()
        .try_into()
        .map_err(|_| ProtocolError::UnwrapFailed)?;

    // Stage 2: verify the signature over the ciphertext.
    let ciphertext =
        decode_base64(&envelope.ciphertext).map_err(|_| ProtocolError::SignatureInvalid)?;
    let signature =
        decode_base64(&envelope.signature).map_err(|_| ProtocolError::SignatureInvalid)?;
    let digest = Sha256::digest(&ciphertext);
    sender
        .0
        .verify(
            Pss::new_with_salt::<Sha256>(PSS_SALT_LEN),
            digest.as_slice(),
            &signature,
        )
        .map_err(|_| ProtocolError::SignatureInvalid)?;

    // Stage 3: open the AEAD.
    let iv = decode_base64(&envelope.iv).map_err(|_| ProtocolError::AuthenticationFailed)?;
    let nonce: [u8; NONCE_LEN] = iv
        .as_slice()
        .try_into()
        .map_err(|_| ProtocolError::AuthenticationFailed)?;
    let plaintext = aead_open(&key, &nonce, &ciphertext)?;

    debug!(plaintext_len = plaintext.len(), "envelope opened");

    String::from_utf8(plaintext).map_err(|_| ProtocolError::AuthenticationFailed)
}
