use courier_envelope::{
    decrypt, encrypt, fetch_peer, jwk_thumbprint, publish_keys, verify_fingerprints, verify_peer,
    Directory, EncryptionPublicKey, ExpectedFingerprints, Identity, KeyPurpose, ProtocolError,
    SigningPublicKey,
};

#[test]
fn fetch_missing_peer_fails() {
    let directory = Directory::new();
    assert_eq!(
        fetch_peer(&directory, "nobody").unwrap_err(),
        ProtocolError::PeerNotFound
    );
    assert_eq!(
        ProtocolError::PeerNotFound.to_string(),
        "peer record not found"
    );
}

#[test]
fn publish_then_verify_succeeds() {
    let directory = Directory::new();
    let bob = Identity::generate("bob").unwrap();
    publish_keys(&directory, &bob);

    let record = fetch_peer(&directory, "bob").unwrap();
    assert_eq!(record.user_id, "bob");
    verify_fingerprints(&ExpectedFingerprints::of(&bob), &record).unwrap();
}

#[test]
fn published_thumbprints_match_jwks() {
    let directory = Directory::new();
    let bob = Identity::generate("bob").unwrap();
    let record = publish_keys(&directory, &bob);
    assert_eq!(jwk_thumbprint(&record.enc_pub).unwrap(), record.enc_thumbprint);
    assert_eq!(
        jwk_thumbprint(&record.sign_pub).unwrap(),
        record.sign_thumbprint
    );
}

#[test]
fn substituted_encryption_key_is_detected() {
    let directory = Directory::new();
    let bob = Identity::generate("bob").unwrap();
    let mallory = Identity::generate("mallory").unwrap();
    let expected = ExpectedFingerprints::of(&bob);
    publish_keys(&directory, &bob);

    // The directory is unauthenticated: anyone can overwrite bob's record.
    let mut forged = fetch_peer(&directory, "bob").unwrap();
    forged.enc_pub = mallory.encryption_public().to_jwk();
    directory.publish(forged);

    let record = fetch_peer(&directory, "bob").unwrap();
    assert_eq!(
        verify_fingerprints(&expected, &record).unwrap_err(),
        ProtocolError::FingerprintMismatch(KeyPurpose::Encryption)
    );
    assert_eq!(
        ProtocolError::FingerprintMismatch(KeyPurpose::Encryption).to_string(),
        "encryption key mismatch"
    );
}

#[test]
fn substituted_signing_key_is_detected() {
    let directory = Directory::new();
    let bob = Identity::generate("bob").unwrap();
    let mallory = Identity::generate("mallory").unwrap();
    let expected = ExpectedFingerprints::of(&bob);
    publish_keys(&directory, &bob);

    let mut forged = fetch_peer(&directory, "bob").unwrap();
    forged.sign_pub = mallory.signing_public().to_jwk();
    directory.publish(forged);

    let record = fetch_peer(&directory, "bob").unwrap();
    assert_eq!(
        verify_fingerprints(&expected, &record).unwrap_err(),
        ProtocolError::FingerprintMismatch(KeyPurpose::Signing)
    );
    assert_eq!(
        ProtocolError::FingerprintMismatch(KeyPurpose::Signing).to_string(),
        "signing key mismatch"
    );
}

#[test]
fn self_declared_thumbprints_are_not_trusted() {
    let directory = Directory::new();
    let bob = Identity::generate("bob").unwrap();
    let mallory = Identity::generate("mallory").unwrap();
    let expected = ExpectedFingerprints::of(&bob);
    publish_keys(&directory, &bob);

    // A smarter forgery keeps bob's claimed thumbprints but swaps the keys.
    let mut forged = fetch_peer(&directory, "bob").unwrap();
    forged.enc_pub = mallory.encryption_public().to_jwk();
    directory.publish(forged);

    let record = fetch_peer(&directory, "bob").unwrap();
    assert_eq!(record.enc_thumbprint, expected.encryption);
    assert_eq!(
        verify_fingerprints(&expected, &record).unwrap_err(),
        ProtocolError::FingerprintMismatch(KeyPurpose::Encryption)
    );
}

#[test]
fn altered_stored_thumbprint_is_detected() {
    let directory = Directory::new();
    let bob = Identity::generate("bob").unwrap();
    let expected = ExpectedFingerprints::of(&bob);
    publish_keys(&directory, &bob);

    let zero_digest: courier_envelope::Fingerprint =
        serde_json::from_value(serde_json::Value::String("0".repeat(64))).unwrap();

    // Overwrite only the stored encryption thumbprint; the JWKs themselves
    // still carry bob's real keys.
    let mut forged = fetch_peer(&directory, "bob").unwrap();
    forged.enc_thumbprint = zero_digest.clone();
    directory.publish(forged);

    let record = fetch_peer(&directory, "bob").unwrap();
    assert_eq!(record.enc_pub, bob.encryption_public().to_jwk());
    assert_eq!(
        verify_fingerprints(&expected, &record).unwrap_err(),
        ProtocolError::FingerprintMismatch(KeyPurpose::Encryption)
    );

    // Same for the signing thumbprint.
    publish_keys(&directory, &bob);
    let mut forged = fetch_peer(&directory, "bob").unwrap();
    forged.sign_thumbprint = zero_digest;
    directory.publish(forged);

    let record = fetch_peer(&directory, "bob").unwrap();
    assert_eq!(
        verify_fingerprints(&expected, &record).unwrap_err(),
        ProtocolError::FingerprintMismatch(KeyPurpose::Signing)
    );
}

#[test]
fn republish_is_last_write_wins() {
    let directory = Directory::new();
    let bob = Identity::generate("bob").unwrap();
    let first = publish_keys(&directory, &bob);
    let second = publish_keys(&directory, &bob);

    assert_eq!(directory.len(), 1);
    let record = fetch_peer(&directory, "bob").unwrap();
    assert_eq!(record.enc_pub, first.enc_pub);
    assert_eq!(record.updated_at, second.updated_at);
}

#[test]
fn directories_are_isolated() {
    let a = Directory::new();
    let b = Directory::new();
    let bob = Identity::generate("bob").unwrap();
    publish_keys(&a, &bob);

    assert!(fetch_peer(&a, "bob").is_ok());
    assert_eq!(fetch_peer(&b, "bob").unwrap_err(), ProtocolError::PeerNotFound);
    assert!(b.is_empty());
}

/// The full two-party scenario: publish, handshake, then a message each way.
#[test]
fn two_party_message_exchange() {
    let directory = Directory::new();
    let alice = Identity::generate("alice").unwrap();
    let bob = Identity::generate("bob").unwrap();

    publish_keys(&directory, &alice);
    publish_keys(&directory, &bob);

    // Alice's view of bob.
    let bob_record = verify_peer(&directory, "bob", &ExpectedFingerprints::of(&bob)).unwrap();
    let bob_enc = EncryptionPublicKey::from_jwk(&bob_record.enc_pub).unwrap();

    // Bob's view of alice.
    let alice_record = verify_peer(&directory, "alice", &ExpectedFingerprints::of(&alice)).unwrap();
    let alice_enc = EncryptionPublicKey::from_jwk(&alice_record.enc_pub).unwrap();
    let alice_sign = SigningPublicKey::from_jwk(&alice_record.sign_pub).unwrap();
    let bob_sign = SigningPublicKey::from_jwk(&bob_record.sign_pub).unwrap();

    let to_bob = encrypt("Merhaba Bob!", &bob_enc, alice.signing_private()).unwrap();
    assert_eq!(
        decrypt(&to_bob, bob.encryption_private(), &alice_sign).unwrap(),
        "Merhaba Bob!"
    );

    let to_alice = encrypt("Merhaba Alice!", &alice_enc, bob.signing_private()).unwrap();
    assert_eq!(
        decrypt(&to_alice, alice.encryption_private(), &bob_sign).unwrap(),
        "Merhaba Alice!"
    );
}
