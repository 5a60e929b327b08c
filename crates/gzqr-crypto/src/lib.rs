//! gzqr-crypto: whole-archive encryption for GitZipQR
//!
//! Pipeline: password → scrypt(salt, N, r, p) → 256-bit key → AES-256-GCM
//!
//! ```text
//! key        = scrypt(password, salt[16], N, r, p) -> 32 bytes
//! aad        = canonical JSON of {N, ext, name, p, r, version}
//! ciphertext = AES-256-GCM(key, nonce[12], aad, plaintext) || tag[16]
//! ```
//!
//! One salt and one nonce are generated per archive; chunks are cut from the
//! finished ciphertext, so nonces never repeat under a key.

pub mod aad;
pub mod cipher;
pub mod digest;
pub mod kdf;

pub use aad::ArchiveAad;
pub use cipher::{decrypt, encrypt, generate_nonce, generate_salt};
pub use digest::{sha256, sha256_hex};
pub use kdf::{derive_key, ArchiveKey, KdfParams, Passphrase, MAX_KDF_MEMORY};

/// Size of the symmetric key in bytes (256-bit)
pub const KEY_SIZE: usize = 32;

/// Size of the scrypt salt in bytes
pub const SALT_SIZE: usize = 16;

/// Size of an AES-GCM nonce (96-bit)
pub const NONCE_SIZE: usize = 12;

/// Size of the GCM authentication tag
pub const TAG_SIZE: usize = 16;
