//! Key handshake: publish, fetch, verify.
//!
//! The directory is unauthenticated, so possession of a record proves
//! nothing. Trust comes from comparing fingerprints obtained out of band
//! against fingerprints recomputed from the fetched JWKs. Only after that
//! comparison passes should the record's keys be used for encryption.

use chrono::Utc;
use tracing::{debug, info, warn};

use crate::directory::{Directory, DirectoryRecord};
use crate::error::ProtocolError;
use crate::fingerprint::{jwk_thumbprint, Fingerprint};
use crate::keys::{Identity, KeyPurpose};

/// The fingerprints a verifier expects a peer's published keys to have,
/// learned over some channel the directory cannot tamper with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpectedFingerprints {
    pub encryption: Fingerprint,
    pub signing: Fingerprint,
}

impl ExpectedFingerprints {
    /// What a peer holding `identity` would legitimately publish.
    pub fn of(identity: &Identity) -> Self {
        Self {
            encryption: identity.encryption_public().fingerprint(),
            signing: identity.signing_public().fingerprint(),
        }
    }
}

/// Export `identity`'s public halves and upsert them into the directory.
/// Idempotent apart from the record timestamp; returns the published record.
pub fn publish_keys(directory: &Directory, identity: &Identity) -> DirectoryRecord {
    let enc_pub = identity.encryption_public().to_jwk();
    let sign_pub = identity.signing_public().to_jwk();
    let record = DirectoryRecord {
        user_id: identity.user_id().to_string(),
        enc_thumbprint: identity.encryption_public().fingerprint(),
        sign_thumbprint: identity.signing_public().fingerprint(),
        enc_pub,
        sign_pub,
        updated_at: Utc::now(),
    };
    directory.publish(record.clone());
    info!(user_id = %record.user_id, "published keys");
    record
}

/// Fetch a peer's latest record.
pub fn fetch_peer(directory: &Directory, user_id: &str) -> Result<DirectoryRecord, ProtocolError> {
    directory.fetch(user_id).ok_or(ProtocolError::PeerNotFound)
}

/// Compare `expected` against the record's stored thumbprints, and against
/// fingerprints recomputed from the record's own JWKs. Either disagreement
/// fails: an altered stored thumbprint is flagged even when the keys still
/// match, and a swapped key is flagged even when the stored thumbprint was
/// left intact. Checks the encryption key first and short-circuits on the
/// first mismatch.
pub fn verify_fingerprints(
    expected: &ExpectedFingerprints,
    record: &DirectoryRecord,
) -> Result<(), ProtocolError> {
    let enc_actual = jwk_thumbprint(&record.enc_pub)?;
    if !expected.encryption.ct_eq(&record.enc_thumbprint) || !expected.encryption.ct_eq(&enc_actual)
    {
        warn!(user_id = %record.user_id, "encryption key fingerprint mismatch");
        return Err(ProtocolError::FingerprintMismatch(KeyPurpose::Encryption));
    }
    let sign_actual = jwk_thumbprint(&record.sign_pub)?;
    if !expected.signing.ct_eq(&record.sign_thumbprint) || !expected.signing.ct_eq(&sign_actual) {
        warn!(user_id = %record.user_id, "signing key fingerprint mismatch");
        return Err(ProtocolError::FingerprintMismatch(KeyPurpose::Signing));
    }
    debug!(user_id = %record.user_id, "fingerprints verified");
    Ok(())
}

/// Fetch and verify in one step, returning the record only when it matches.
pub fn verify_peer(
    directory: &Directory,
    user_id: &str,
    expected: &ExpectedFingerprints,
) -> Result<DirectoryRecord, ProtocolError> {
    let record = fetch_peer(directory, user_id)?;
    verify_fingerprints(expected, &record)?;
    Ok(record)
}
