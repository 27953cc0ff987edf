//! Per-conversation demo-flow state.
//!
//! A [`Session`] is one actor's view of a conversation with one peer. It
//! never stores step flags: the current [`Stage`] is derived from which
//! fields are present, so the displayed step can never drift from the data
//! that actually exists.

use core::fmt;

use tracing::debug;

use crate::directory::{Directory, DirectoryRecord};
use crate::envelope::{self, Envelope};
use crate::error::ProtocolError;
use crate::handshake::{self, ExpectedFingerprints};
use crate::keys::{EncryptionPublicKey, Identity, SigningPublicKey};

/// Where a session currently stands in the demo flow.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Stage {
    /// Keys exist but have not been published.
    Generate,
    /// Published, peer not yet fetched and verified.
    Handshake,
    /// Peer verified; ready to seal a message.
    Encrypt,
    /// A sealed envelope is waiting to be handed to the transport.
    Send,
    /// A delivered envelope is waiting to be opened.
    Decrypt,
    /// A message has been opened; the round trip is complete.
    Done,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Generate => "generate",
            Stage::Handshake => "handshake",
            Stage::Encrypt => "encrypt",
            Stage::Send => "send",
            Stage::Decrypt => "decrypt",
            Stage::Done => "done",
        };
        f.write_str(name)
    }
}

/// Verified peer keys, imported from a directory record that passed the
/// fingerprint check. Constructed only by [`Session::verify_peer`].
struct PeerKeys {
    encryption: EncryptionPublicKey,
    signing: SigningPublicKey,
}

pub struct Session {
    identity: Identity,
    peer_id: String,
    published: Option<DirectoryRecord>,
    peer: Option<PeerKeys>,
    outgoing: Option<Envelope>,
    inbox: Option<Envelope>,
    opened: Option<String>,
}

impl Session {
    /// Begin a conversation: `identity` talking to `peer_id`.
    pub fn new(identity: Identity, peer_id: impl Into<String>) -> Self {
        Self {
            identity,
            peer_id: peer_id.into(),
            published: None,
            peer: None,
            outgoing: None,
            inbox: None,
            opened: None,
        }
    }

    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    pub fn peer_id(&self) -> &str {
        &self.peer_id
    }

    /// Current step, derived from present fields. Later stages win when
    /// several apply (a session that has opened a message is `Done` even if
    /// another envelope is still queued).
    pub fn stage(&self) -> Stage {
        if self.opened.is_some() {
            Stage::Done
        } else if self.inbox.is_some() {
            Stage::Decrypt
        } else if self.outgoing.is_some() {
            Stage::Send
        } else if self.peer.is_some() {
            Stage::Encrypt
        } else if self.published.is_some() {
            Stage::Handshake
        } else {
            Stage::Generate
        }
    }

    /// Publish this actor's public keys to the directory.
    pub fn publish(&mut self, directory: &Directory) {
        let record = handshake::publish_keys(directory, &self.identity);
        self.published = Some(record);
        debug!(user_id = %self.identity.user_id(), stage = %self.stage(), "session published");
    }

    /// The record this session last published, if any.
    pub fn published_record(&self) -> Option<&DirectoryRecord> {
        self.published.as_ref()
    }

    /// Fetch the peer's record and verify it against `expected`. On success
    /// the record's keys are imported and held for encryption and signature
    /// verification; on failure nothing is retained.
    pub fn verify_peer(
        &mut self,
        directory: &Directory,
        expected: &ExpectedFingerprints,
    ) -> Result<(), ProtocolError> {
        let record = handshake::verify_peer(directory, &self.peer_id, expected)?;
        let encryption = EncryptionPublicKey::from_jwk(&record.enc_pub)?;
        let signing = SigningPublicKey::from_jwk(&record.sign_pub)?;
        self.peer = Some(PeerKeys {
            encryption,
            signing,
        });
        debug!(peer = %self.peer_id, stage = %self.stage(), "peer verified");
        Ok(())
    }

    /// Seal a message for the verified peer. Refuses with `KeyUnavailable`
    /// until [`Session::verify_peer`] has succeeded.
    pub fn encrypt_to(&mut self, plaintext: &str) -> Result<&Envelope, ProtocolError> {
        let peer = self.peer.as_ref().ok_or(ProtocolError::KeyUnavailable)?;
        let sealed = envelope::encrypt(plaintext, &peer.encryption, self.identity.signing_private())?;
        debug!(peer = %self.peer_id, stage = "send", "message sealed");
        Ok(self.outgoing.insert(sealed))
    }

    /// Hand the sealed envelope to the transport.
    pub fn take_envelope(&mut self) -> Option<Envelope> {
        self.outgoing.take()
    }

    /// A transport delivered an envelope addressed to this actor.
    pub fn deliver(&mut self, envelope: Envelope) {
        self.inbox = Some(envelope);
    }

    /// Open the delivered envelope: verify the peer's signature, then
    /// decrypt. Requires a verified peer (for the signature key) and a
    /// delivered envelope; otherwise `KeyUnavailable`.
    pub fn open_received(&mut self) -> Result<&str, ProtocolError> {
        let peer = self.peer.as_ref().ok_or(ProtocolError::KeyUnavailable)?;
        let sealed = self.inbox.take().ok_or(ProtocolError::KeyUnavailable)?;
        match envelope::decrypt(&sealed, self.identity.encryption_private(), &peer.signing) {
            Ok(plaintext) => {
                debug!(peer = %self.peer_id, stage = "done", "message opened");
                Ok(self.opened.insert(plaintext))
            }
            Err(e) => {
                // Keep the envelope so a caller can inspect what failed.
                self.inbox = Some(sealed);
                Err(e)
            }
        }
    }

    /// The last successfully opened plaintext, if any.
    pub fn opened(&self) -> Option<&str> {
        self.opened.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::Identity;

    #[test]
    fn stage_progression_through_full_flow() {
        let directory = Directory::new();
        let alice = Identity::generate("alice").unwrap();
        let bob = Identity::generate("bob").unwrap();
        let expected_bob = ExpectedFingerprints::of(&bob);
        let expected_alice = ExpectedFingerprints::of(&alice);

        let mut a = Session::new(alice, "bob");
        let mut b = Session::new(bob, "alice");
        assert_eq!(a.stage(), Stage::Generate);

        a.publish(&directory);
        b.publish(&directory);
        assert_eq!(a.stage(), Stage::Handshake);

        a.verify_peer(&directory, &expected_bob).unwrap();
        b.verify_peer(&directory, &expected_alice).unwrap();
        assert_eq!(a.stage(), Stage::Encrypt);

        a.encrypt_to("Merhaba Bob!").unwrap();
        assert_eq!(a.stage(), Stage::Send);

        let envelope = a.take_envelope().unwrap();
        b.deliver(envelope);
        assert_eq!(b.stage(), Stage::Decrypt);

        assert_eq!(b.open_received().unwrap(), "Merhaba Bob!");
        assert_eq!(b.stage(), Stage::Done);
        assert_eq!(b.opened(), Some("Merhaba Bob!"));
    }

    #[test]
    fn encrypt_refused_before_verification() {
        let alice = Identity::generate("alice").unwrap();
        let mut a = Session::new(alice, "bob");
        assert_eq!(
            a.encrypt_to("too early").unwrap_err(),
            ProtocolError::KeyUnavailable
        );
    }

    #[test]
    fn open_refused_with_empty_inbox() {
        let directory = Directory::new();
        let alice = Identity::generate("alice").unwrap();
        let bob = Identity::generate("bob").unwrap();
        let expected_bob = ExpectedFingerprints::of(&bob);

        let mut b = Session::new(bob, "alice");
        b.publish(&directory);

        let mut a = Session::new(alice, "bob");
        a.publish(&directory);
        a.verify_peer(&directory, &expected_bob).unwrap();
        assert_eq!(
            a.open_received().unwrap_err(),
            ProtocolError::KeyUnavailable
        );
    }
}
