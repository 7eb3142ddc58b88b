//! Golden test vector validation
//!
//! The vectors were produced independently (PBKDF2-HMAC-SHA256 at 100k
//! iterations + AES-256-GCM, as WebCrypto computes them) and pin the exact
//! bytes a stored letter field must contain.

use letterbox::kdf::{Salt, derive_key};
use letterbox::secretcrypt::{self, EncryptedBundle, Nonce};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct GoldenVector {
    password: String,
    salt: String,
    nonce: String,
    plaintext: String,
    ciphertext: String,
    comment: String,
}

fn load_golden_vectors() -> Vec<GoldenVector> {
    let json_data = include_str!("../testdata/golden-vectors.json");
    serde_json::from_str(json_data).expect("failed to parse golden vectors")
}

#[test]
fn test_golden_vectors_seal() {
    let vectors = load_golden_vectors();
    assert!(!vectors.is_empty(), "No golden vectors were tested");

    for (i, vector) in vectors.iter().enumerate() {
        let salt = Salt::from_base64(&vector.salt).expect("bad salt");
        let nonce = Nonce::from_base64(&vector.nonce).expect("bad nonce");
        let key = derive_key(vector.password.as_bytes(), &salt);

        let bundle = secretcrypt::seal(&vector.plaintext, &key, nonce)
            .unwrap_or_else(|e| panic!("Vector {}: failed to seal - {}", i, e));

        assert_eq!(
            bundle.ciphertext_base64(),
            vector.ciphertext,
            "Vector {} ({}): ciphertext mismatch",
            i,
            vector.comment
        );
    }
}

#[test]
fn test_golden_vectors_open() {
    for (i, vector) in load_golden_vectors().iter().enumerate() {
        let salt = Salt::from_base64(&vector.salt).expect("bad salt");
        let bundle =
            EncryptedBundle::from_base64(&vector.ciphertext, &vector.nonce).expect("bad bundle");
        let key = derive_key(vector.password.as_bytes(), &salt);

        let plaintext = secretcrypt::open(&bundle, &key)
            .unwrap_or_else(|e| panic!("Vector {} ({}): failed to open - {}", i, vector.comment, e));
        assert_eq!(plaintext, vector.plaintext, "Vector {}: plaintext mismatch", i);
    }
}

#[test]
fn test_reference_letter_fields_share_salt() {
    // Vectors 0 and 1 are the body and subject of one letter.
    let vectors = load_golden_vectors();
    let (body, subject) = (&vectors[0], &vectors[1]);
    assert_eq!(body.salt, subject.salt);
    assert_ne!(body.nonce, subject.nonce);

    let key = derive_key(b"secret6", &Salt::from_base64(&body.salt).unwrap());
    let open = |v: &GoldenVector| {
        secretcrypt::open(&EncryptedBundle::from_base64(&v.ciphertext, &v.nonce).unwrap(), &key)
    };
    assert_eq!(open(body).unwrap(), "I love you");
    assert_eq!(open(subject).unwrap(), "Hi");

    let wrong = derive_key(b"wrong12", &Salt::from_base64(&body.salt).unwrap());
    for v in [body, subject] {
        let bundle = EncryptedBundle::from_base64(&v.ciphertext, &v.nonce).unwrap();
        let err = secretcrypt::open(&bundle, &wrong).expect_err("expected wrong password");
        assert_eq!(
            err.kind,
            Some(letterbox::error::ErrorKind::AuthenticationFailed)
        );
    }
}
