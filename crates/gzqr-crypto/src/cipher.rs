//! Whole-archive AES-256-GCM encryption/decryption
//!
//! Ciphertext format (binary):
//! ```text
//! [N bytes: ciphertext][16 bytes: GCM tag]
//! ```
//!
//! The nonce and salt are not prepended; they travel in every chunk envelope
//! as `nonceB64` / `saltB64`. The AAD binds the public archive metadata so
//! that editing name, extension, version or KDF parameters fails decryption.

use aes_gcm::{
    aead::{Aead, KeyInit, Payload},
    Aes256Gcm, Nonce,
};
use gzqr_core::{GzqrError, GzqrResult};
use rand::RngCore;

use crate::kdf::ArchiveKey;
use crate::{NONCE_SIZE, SALT_SIZE, TAG_SIZE};

/// Encrypt the whole plaintext under `key` and `nonce`.
///
/// Returns `ciphertext || tag`, always exactly `plaintext.len() + 16` bytes.
pub fn encrypt(
    plaintext: &[u8],
    key: &ArchiveKey,
    nonce: &[u8; NONCE_SIZE],
    aad: &[u8],
) -> GzqrResult<Vec<u8>> {
    let cipher = Aes256Gcm::new(key.as_bytes().into());

    cipher
        .encrypt(
            Nonce::from_slice(nonce),
            Payload {
                msg: plaintext,
                aad,
            },
        )
        .map_err(|e| GzqrError::Other(anyhow::anyhow!("archive encryption failed: {e}")))
}

/// Decrypt `ciphertext || tag`.
///
/// Fails closed with [`GzqrError::Authentication`] on any tag mismatch; no
/// plaintext bytes are released in that case.
pub fn decrypt(
    ciphertext_and_tag: &[u8],
    key: &ArchiveKey,
    nonce: &[u8; NONCE_SIZE],
    aad: &[u8],
) -> GzqrResult<Vec<u8>> {
    if ciphertext_and_tag.len() < TAG_SIZE {
        return Err(GzqrError::Authentication);
    }

    let cipher = Aes256Gcm::new(key.as_bytes().into());

    cipher
        .decrypt(
            Nonce::from_slice(nonce),
            Payload {
                msg: ciphertext_and_tag,
                aad,
            },
        )
        .map_err(|_| GzqrError::Authentication)
}

/// Generate a random scrypt salt.
pub fn generate_salt<R: RngCore + ?Sized>(rng: &mut R) -> [u8; SALT_SIZE] {
    let mut salt = [0u8; SALT_SIZE];
    rng.fill_bytes(&mut salt);
    salt
}

/// Generate a random GCM nonce. One per archive, never per chunk.
pub fn generate_nonce<R: RngCore + ?Sized>(rng: &mut R) -> [u8; NONCE_SIZE] {
    let mut nonce = [0u8; NONCE_SIZE];
    rng.fill_bytes(&mut nonce);
    nonce
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::KEY_SIZE;
    use proptest::prelude::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn key(b: u8) -> ArchiveKey {
        ArchiveKey::from_bytes([b; KEY_SIZE])
    }

    const NONCE: [u8; NONCE_SIZE] = [3u8; NONCE_SIZE];

    #[test]
    fn test_encrypt_decrypt_roundtrip() {
        let plaintext = b"hello, encrypted world!";
        let ct = encrypt(plaintext, &key(1), &NONCE, b"aad").unwrap();
        let pt = decrypt(&ct, &key(1), &NONCE, b"aad").unwrap();
        assert_eq!(&pt, plaintext);
    }

    #[test]
    fn test_encrypt_decrypt_empty() {
        let ct = encrypt(b"", &key(1), &NONCE, b"").unwrap();
        assert_eq!(ct.len(), TAG_SIZE);
        let pt = decrypt(&ct, &key(1), &NONCE, b"").unwrap();
        assert!(pt.is_empty());
    }

    #[test]
    fn test_encrypted_size() {
        let ct = encrypt(&[0u8; 1000], &key(1), &NONCE, b"").unwrap();
        assert_eq!(ct.len(), 1000 + TAG_SIZE);
    }

    #[test]
    fn test_decrypt_wrong_key() {
        let ct = encrypt(b"secret data", &key(1), &NONCE, b"aad").unwrap();
        let err = decrypt(&ct, &key(2), &NONCE, b"aad").unwrap_err();
        assert!(matches!(err, GzqrError::Authentication));
    }

    #[test]
    fn test_decrypt_wrong_aad() {
        let ct = encrypt(b"secret data", &key(1), &NONCE, b"name=a").unwrap();
        let err = decrypt(&ct, &key(1), &NONCE, b"name=b").unwrap_err();
        assert!(matches!(err, GzqrError::Authentication), "AAD mismatch must fail");
    }

    #[test]
    fn test_decrypt_wrong_nonce() {
        let ct = encrypt(b"secret data", &key(1), &NONCE, b"").unwrap();
        assert!(decrypt(&ct, &key(1), &[4u8; NONCE_SIZE], b"").is_err());
    }

    #[test]
    fn test_decrypt_too_short() {
        let err = decrypt(&[0u8; TAG_SIZE - 1], &key(1), &NONCE, b"").unwrap_err();
        assert!(matches!(err, GzqrError::Authentication));
    }

    #[test]
    fn test_salt_and_nonce_come_from_rng() {
        let mut rng_a = StdRng::seed_from_u64(42);
        let mut rng_b = StdRng::seed_from_u64(42);
        assert_eq!(generate_salt(&mut rng_a), generate_salt(&mut rng_b));
        assert_eq!(generate_nonce(&mut rng_a), generate_nonce(&mut rng_b));
        assert_ne!(generate_nonce(&mut rng_a), generate_nonce(&mut rng_a));
    }

    proptest! {
        #[test]
        fn any_bit_flip_fails_closed(
            data in proptest::collection::vec(any::<u8>(), 1..=512),
            pos in any::<prop::sample::Index>(),
            bit in 0u8..8,
        ) {
            let mut ct = encrypt(&data, &key(5), &NONCE, b"aad").unwrap();
            let i = pos.index(ct.len());
            ct[i] ^= 1 << bit;
            let result = decrypt(&ct, &key(5), &NONCE, b"aad");
            prop_assert!(matches!(result, Err(GzqrError::Authentication)));
        }
    }
}
