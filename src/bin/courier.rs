//! Courier CLI — E2EE messaging demo
//!
//! Usage:
//!   courier keygen --name <NAME>
//!   courier seal   --to <ENC_PUB>.jwk --sign <SIGN_SEC>.jwk --in <FILE>
//!   courier open   --key <ENC_SEC>.jwk --from <SIGN_PUB>.jwk --in <FILE>.env
//!   courier demo

use std::fs;
use std::path::PathBuf;
use std::process;

use courier_envelope::{
    decrypt, encrypt, Directory, EncryptionPrivateKey, EncryptionPublicKey, Envelope,
    ExpectedFingerprints, Identity, Jwk, Session, SigningPrivateKey, SigningPublicKey,
};

fn usage() -> ! {
    eprintln!(
        "Courier — E2EE messaging demo (RSA-OAEP + AES-256-GCM + RSA-PSS)\n\
         \n\
         Commands:\n\
         \n\
         Generate an identity (two keypairs, four JWK files):\n\
         \n\
         courier keygen --name <NAME>\n\
         Writes <NAME>.enc.pub.jwk / <NAME>.enc.sec.jwk (encryption pair)\n\
         and <NAME>.sign.pub.jwk / <NAME>.sign.sec.jwk (signing pair)\n\
         \n\
         Seal a message:\n\
         \n\
         courier seal --to <ENC_PUB>.jwk --sign <SIGN_SEC>.jwk --in <FILE>\n\
         Writes <FILE>.env (JSON envelope)\n\
         \n\
         Open a message:\n\
         \n\
         courier open --key <ENC_SEC>.jwk --from <SIGN_PUB>.jwk --in <FILE>.env\n\
         Writes <FILE> (strips .env extension, or appends .txt)\n\
         \n\
         Run the two-party walkthrough (no files written):\n\
         \n\
         courier demo\n"
    );
    process::exit(1);
}

fn die(msg: &str) -> ! {
    eprintln!("error: {}", msg);
    process::exit(1);
}

fn parse_args() -> (String, Vec<(String, String)>) {
    let args: Vec<String> = std::env::args().collect();
    if args.len() < 2 {
        usage();
    }

    let command = args[1].clone();
    let mut flags: Vec<(String, String)> = Vec::new();

    let mut i = 2;
    while i < args.len() {
        if args[i].starts_with("--") && i + 1 < args.len() {
            flags.push((args[i].clone(), args[i + 1].clone()));
            i += 2;
        } else {
            die(&format!("unexpected argument: {}", args[i]));
        }
    }

    (command, flags)
}

fn get_flag(flags: &[(String, String)], name: &str) -> Option<String> {
    flags.iter().find(|(k, _)| k == name).map(|(_, v)| v.clone())
}

fn require_flag(flags: &[(String, String)], name: &str) -> String {
    get_flag(flags, name).unwrap_or_else(|| die(&format!("missing required flag: {}", name)))
}

fn read_jwk(path: &str) -> Jwk {
    let text = fs::read_to_string(path).unwrap_or_else(|e| die(&format!("read {}: {}", path, e)));
    serde_json::from_str(&text).unwrap_or_else(|e| die(&format!("parse {}: {}", path, e)))
}

fn write_jwk(path: &str, jwk: &Jwk) {
    let json = serde_json::to_string_pretty(jwk)
        .unwrap_or_else(|e| die(&format!("serialize {}: {}", path, e)));
    fs::write(path, json).unwrap_or_else(|e| die(&format!("write {}: {}", path, e)));
}

fn cmd_keygen(flags: &[(String, String)]) {
    let name = require_flag(flags, "--name");

    let identity =
        Identity::generate(name.as_str()).unwrap_or_else(|e| die(&format!("keygen: {}", e)));

    let enc_pub_path = format!("{}.enc.pub.jwk", name);
    let enc_sec_path = format!("{}.enc.sec.jwk", name);
    let sign_pub_path = format!("{}.sign.pub.jwk", name);
    let sign_sec_path = format!("{}.sign.sec.jwk", name);

    write_jwk(&enc_pub_path, &identity.encryption_public().to_jwk());
    write_jwk(&enc_sec_path, &identity.encryption_private().to_jwk());
    write_jwk(&sign_pub_path, &identity.signing_public().to_jwk());
    write_jwk(&sign_sec_path, &identity.signing_private().to_jwk());

    eprintln!("identity '{}' generated:", name);
    eprintln!("  encryption public:  {}", enc_pub_path);
    eprintln!("  encryption secret:  {}", enc_sec_path);
    eprintln!("  signing public:     {}", sign_pub_path);
    eprintln!("  signing secret:     {}", sign_sec_path);
    eprintln!();
    eprintln!(
        "fingerprints (share these out of band):\n  encryption: {}\n  signing:    {}",
        identity.encryption_public().fingerprint(),
        identity.signing_public().fingerprint()
    );
    eprintln!();
    eprintln!("keep the .sec.jwk files safe. share the .pub.jwk files freely.");
}

fn cmd_seal(flags: &[(String, String)]) {
    let to_file = require_flag(flags, "--to");
    let sign_file = require_flag(flags, "--sign");
    let in_file = require_flag(flags, "--in");

    let out_file = format!("{}.env", in_file);

    let recipient = EncryptionPublicKey::from_jwk(&read_jwk(&to_file))
        .unwrap_or_else(|e| die(&format!("{}: {}", to_file, e)));
    let signer = SigningPrivateKey::from_jwk(&read_jwk(&sign_file))
        .unwrap_or_else(|e| die(&format!("{}: {}", sign_file, e)));

    let plaintext =
        fs::read_to_string(&in_file).unwrap_or_else(|e| die(&format!("read {}: {}", in_file, e)));

    let envelope = encrypt(&plaintext, &recipient, &signer)
        .unwrap_or_else(|e| die(&format!("seal: {}", e)));
    let json = envelope
        .to_json()
        .unwrap_or_else(|e| die(&format!("serialize envelope: {}", e)));

    fs::write(&out_file, &json).unwrap_or_else(|e| die(&format!("write {}: {}", out_file, e)));

    eprintln!(
        "sealed {} -> {} ({} bytes plaintext -> {} bytes envelope)",
        in_file,
        out_file,
        plaintext.len(),
        json.len()
    );
}

fn cmd_open(flags: &[(String, String)]) {
    let key_file = require_flag(flags, "--key");
    let from_file = require_flag(flags, "--from");
    let in_file = require_flag(flags, "--in");

    let out_file = if in_file.ends_with(".env") {
        in_file.trim_end_matches(".env").to_string()
    } else {
        format!("{}.txt", in_file)
    };

    // Don't overwrite the input
    if PathBuf::from(&out_file) == PathBuf::from(&in_file) {
        die("output path would overwrite input — rename the input file");
    }

    let recipient = EncryptionPrivateKey::from_jwk(&read_jwk(&key_file))
        .unwrap_or_else(|e| die(&format!("{}: {}", key_file, e)));
    let sender = SigningPublicKey::from_jwk(&read_jwk(&from_file))
        .unwrap_or_else(|e| die(&format!("{}: {}", from_file, e)));

    let json =
        fs::read_to_string(&in_file).unwrap_or_else(|e| die(&format!("read {}: {}", in_file, e)));
    let envelope =
        Envelope::from_json(&json).unwrap_or_else(|e| die(&format!("parse {}: {}", in_file, e)));

    let plaintext = decrypt(&envelope, &recipient, &sender)
        .unwrap_or_else(|e| die(&format!("open: {}", e)));

    fs::write(&out_file, &plaintext).unwrap_or_else(|e| die(&format!("write {}: {}", out_file, e)));

    eprintln!(
        "opened {} -> {} ({} bytes envelope -> {} bytes plaintext)",
        in_file,
        out_file,
        json.len(),
        plaintext.len()
    );
}

/// The full two-party walkthrough against an in-process directory, narrating
/// each stage as it becomes the current one.
fn cmd_demo() {
    eprintln!("generating identities (RSA-2048 x4, this takes a moment)...");
    let alice = Identity::generate("alice").unwrap_or_else(|e| die(&format!("keygen: {}", e)));
    let bob = Identity::generate("bob").unwrap_or_else(|e| die(&format!("keygen: {}", e)));

    // Fingerprints exchanged out of band, before the directory is involved.
    let expected_bob = ExpectedFingerprints::of(&bob);
    let expected_alice = ExpectedFingerprints::of(&alice);

    let directory = Directory::new();
    let mut alice = Session::new(alice, "bob");
    let mut bob = Session::new(bob, "alice");

    eprintln!("[{}] publishing keys to the directory", alice.stage());
    alice.publish(&directory);
    bob.publish(&directory);

    eprintln!("[{}] fetching peers and verifying fingerprints", alice.stage());
    alice
        .verify_peer(&directory, &expected_bob)
        .unwrap_or_else(|e| die(&format!("handshake: {}", e)));
    bob.verify_peer(&directory, &expected_alice)
        .unwrap_or_else(|e| die(&format!("handshake: {}", e)));

    eprintln!("[{}] alice seals a message for bob", alice.stage());
    alice
        .encrypt_to("Merhaba Bob!")
        .unwrap_or_else(|e| die(&format!("seal: {}", e)));

    eprintln!("[{}] envelope in transit", alice.stage());
    let envelope = alice
        .take_envelope()
        .unwrap_or_else(|| die("no envelope to deliver"));
    eprintln!(
        "    {}",
        envelope
            .to_json()
            .unwrap_or_else(|e| die(&format!("serialize envelope: {}", e)))
    );
    bob.deliver(envelope);

    eprintln!("[{}] bob verifies the signature and decrypts", bob.stage());
    let plaintext = bob
        .open_received()
        .unwrap_or_else(|e| die(&format!("open: {}", e)))
        .to_string();

    eprintln!("[{}] bob read: {:?}", bob.stage(), plaintext);
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let (command, flags) = parse_args();

    match command.as_str() {
        "keygen" => cmd_keygen(&flags),
        "seal" => cmd_seal(&flags),
        "open" => cmd_open(&flags),
        "demo" => cmd_demo(),
        _ => {
            eprintln!("unknown command: {}", command);
            usage();
        }
    }
}
