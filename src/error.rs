//! Error types for the envelope protocol and handshake.
//!
//! Every failure here is recoverable and reportable to the caller; nothing in
//! this crate aborts the process. The decrypt path deliberately distinguishes
//! unwrap, signature, and AEAD failures: callers and tests depend on telling
//! them apart. That distinction is a documented relaxation for a demo system;
//! a production decrypt oracle would collapse them into one opaque error.

use thiserror::Error;

use crate::keys::KeyPurpose;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// Malformed or wrong-purpose key material.
    #[error("invalid key: {0}")]
    InvalidKey(String),

    /// A required key (or the message material it guards) is missing at call time.
    #[error("key unavailable")]
    KeyUnavailable,

    /// Asymmetric unwrap of the symmetric key failed (wrong private key or
    /// corrupt wrapped-key field).
    #[error("key unwrap failed")]
    UnwrapFailed,

    /// PSS verification over the ciphertext failed.
    #[error("signature verification failed")]
    SignatureInvalid,

    /// AEAD tag check failed during decryption (wrong key, tampered
    /// ciphertext, or tampered nonce).
    #[error("decryption/authentication failed")]
    AuthenticationFailed,

    /// Directory lookup miss.
    #[error("peer record not found")]
    PeerNotFound,

    /// Handshake fingerprint comparison failed for the named key purpose.
    #[error("{0} key mismatch")]
    FingerprintMismatch(KeyPurpose),

    /// Underlying cryptographic primitive failed (OS entropy, RSA keygen,
    /// wrap/sign on the encrypt path). Rare; never secret-dependent.
    #[error("crypto error: {0}")]
    Crypto(String),
}
