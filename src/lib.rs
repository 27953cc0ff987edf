//! # Courier Envelope
//!
//! End-to-end encrypted messaging between two parties, built around a hybrid
//! encryption envelope: every message gets a fresh AES-256-GCM key, the key
//! is wrapped for the recipient with RSA-OAEP (SHA-256), and the ciphertext
//! is signed with RSA-PSS (SHA-256, 32-byte salt). Public keys travel as
//! JWKs through an unauthenticated in-memory directory, and trust is
//! established by comparing SHA-256 key fingerprints out of band.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use courier_envelope::{
//!     Directory, ExpectedFingerprints, Identity, decrypt, encrypt,
//!     fetch_peer, publish_keys, verify_fingerprints, EncryptionPublicKey,
//!     SigningPublicKey,
//! };
//!
//! # fn main() -> Result<(), courier_envelope::ProtocolError> {
//! let directory = Directory::new();
//! let alice = Identity::generate("alice")?;
//! let bob = Identity::generate("bob")?;
//!
//! // Both parties publish their public keys.
//! publish_keys(&directory, &alice);
//! publish_keys(&directory, &bob);
//!
//! // Alice fetches Bob's record and checks his fingerprints.
//! let record = fetch_peer(&directory, "bob")?;
//! verify_fingerprints(&ExpectedFingerprints::of(&bob), &record)?;
//!
//! // Seal for Bob, signed by Alice.
//! let bob_enc = EncryptionPublicKey::from_jwk(&record.enc_pub)?;
//! let envelope = encrypt("Merhaba Bob!", &bob_enc, alice.signing_private())?;
//!
//! // Bob opens it, verifying Alice's signature first.
//! let alice_record = fetch_peer(&directory, "alice")?;
//! let alice_sign = SigningPublicKey::from_jwk(&alice_record.sign_pub)?;
//! let plaintext = decrypt(&envelope, bob.encryption_private(), &alice_sign)?;
//! assert_eq!(plaintext, "Merhaba Bob!");
//! # Ok(())
//! # }
//! ```
//!
//! ## Security Properties
//!
//! - **Hybrid envelope**: per-message symmetric key, never reused
//! - **Sign-then-decrypt**: signature verified before any decryption
//! - **Fingerprint trust**: directory tampering is caught by the handshake
//!
//! ## What's NOT Provided
//!
//! - Real transport or persistent key storage
//! - Forward secrecy, revocation, groups, multi-device
//! - A uniform decrypt error (failures name their stage; see
//!   [`ProtocolError`])

#![deny(unsafe_code)]

mod codec;
mod error;
mod fingerprint;
mod jwk;
mod keys;

pub mod directory;
pub mod envelope;
pub mod handshake;
pub mod session;

pub use codec::{decode_base64, encode_base64, to_hex};
pub use directory::{Directory, DirectoryRecord};
pub use envelope::{decrypt, encrypt, Envelope, ENVELOPE_ALG, PSS_SALT_LEN};
pub use error::ProtocolError;
pub use fingerprint::{jwk_thumbprint, Fingerprint};
pub use handshake::{
    fetch_peer, publish_keys, verify_fingerprints, verify_peer, ExpectedFingerprints,
};
pub use jwk::{Jwk, ALG_ENCRYPTION, ALG_SIGNING};
pub use keys::{
    generate_encryption_keypair, generate_signing_keypair, EncryptionPrivateKey,
    EncryptionPublicKey, Identity, KeyPurpose, SigningPrivateKey, SigningPublicKey,
    RSA_MODULUS_BITS,
};
pub use session::{Session, Stage};
