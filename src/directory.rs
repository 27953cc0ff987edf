//! The simulated key directory.
//!
//! Stands in for a key server: an in-memory map from user id to the public
//! key bundle that user last published. Anyone can publish under any id and
//! records are never authenticated; that gap is what the fingerprint
//! handshake exists to close. See [`crate::handshake`].

use std::collections::HashMap;
use std::sync::RwLock;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::fingerprint::Fingerprint;
use crate::jwk::Jwk;

/// One published bundle: public JWKs for both purposes plus their
/// fingerprints as computed by the publisher. Private members never appear
/// here; `publish` takes already-exported public JWKs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryRecord {
    pub user_id: String,
    pub enc_pub: Jwk,
    pub sign_pub: Jwk,
    pub enc_thumbprint: Fingerprint,
    pub sign_thumbprint: Fingerprint,
    pub updated_at: DateTime<Utc>,
}

/// In-memory directory. Explicitly constructed and passed by reference;
/// there is no global instance, so tests get isolated directories for free.
pub struct Directory {
    records: RwLock<HashMap<String, DirectoryRecord>>,
}

impl Directory {
    pub fn new() -> Self {
        Self {
            records: RwLock::new(HashMap::new()),
        }
    }

    /// Upsert a record under its user id. Last write wins; republishing the
    /// same bundle is idempotent apart from the timestamp.
    pub fn publish(&self, record: DirectoryRecord) {
        debug!(user_id = %record.user_id, "directory publish");
        let mut records = self.records.write().unwrap();
        records.insert(record.user_id.clone(), record);
    }

    /// Look up the latest record for a user id.
    pub fn fetch(&self, user_id: &str) -> Option<DirectoryRecord> {
        let records = self.records.read().unwrap();
        let record = records.get(user_id).cloned();
        debug!(user_id, found = record.is_some(), "directory fetch");
        record
    }

    pub fn len(&self) -> usize {
        self.records.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.read().unwrap().is_empty()
    }
}

impl Default for Directory {
    fn default() -> Self {
        Self::new()
    }
}
