//! ashdrop-crypto: client-edge encryption for one-time file transfers
//!
//! Everything here runs on the untrusted edge that owns the raw passphrase.
//! The server-side crates only ever see the sealed envelope and the one-way
//! verifier digest — never the passphrase or the derived key.
//!
//! Envelope format (binary):
//! ```text
//! [16 bytes: random KDF salt][12 bytes: random nonce][N bytes: ciphertext + 16-byte GCM tag]
//! ```
//!
//! The key is re-derived per envelope from (passphrase, salt) via
//! PBKDF2-HMAC-SHA256, so a nonce never repeats under the same key.

pub mod envelope;
pub mod verifier;

pub use envelope::{open, seal, EnvelopeError};
pub use verifier::{validate_passphrase, PolicyError, Verifier, VerifierParseError};

/// Size of the per-envelope KDF salt in bytes.
pub const SALT_SIZE: usize = 16;

/// Size of an AES-GCM nonce (96-bit).
pub const NONCE_SIZE: usize = 12;

/// Size of a GCM authentication tag.
pub const TAG_SIZE: usize = 16;

/// Size of the derived symmetric key (256-bit).
pub const KEY_SIZE: usize = 32;

/// PBKDF2-HMAC-SHA256 iteration count. Fixed: both ends of a transfer must
/// derive the same key from the same (passphrase, salt) pair.
pub const PBKDF2_ROUNDS: u32 = 1000;
