//! Envelope codec: passphrase-sealed AES-256-GCM blobs
//!
//! `seal` and `open` are the only two operations. The envelope is
//! self-describing: the salt and nonce it was produced with travel in
//! fixed-width positions ahead of the ciphertext, so no side channel is
//! needed to decrypt beyond the passphrase itself.

use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes256Gcm, Nonce,
};
use pbkdf2::pbkdf2_hmac;
use rand::RngCore;
use secrecy::{ExposeSecret, SecretString};
use sha2::Sha256;
use zeroize::Zeroize;

use crate::{KEY_SIZE, NONCE_SIZE, PBKDF2_ROUNDS, SALT_SIZE};

/// Errors from sealing or opening an envelope.
#[derive(Debug, thiserror::Error)]
pub enum EnvelopeError {
    /// The envelope is shorter than salt + nonce + tag.
    #[error("envelope too short")]
    Malformed,

    /// The AEAD rejected the plaintext (length overflow).
    #[error("encryption failed")]
    EncryptionFailed,

    /// Tag verification failed: wrong passphrase or corrupted bytes.
    /// The two cases are deliberately indistinguishable.
    #[error("authentication failed")]
    AuthenticationFailed,
}

/// A 256-bit envelope key derived from a passphrase. Zeroized on drop.
struct EnvelopeKey {
    bytes: [u8; KEY_SIZE],
}

impl Drop for EnvelopeKey {
    fn drop(&mut self) {
        self.bytes.zeroize();
    }
}

impl std::fmt::Debug for EnvelopeKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EnvelopeKey")
            .field("bytes", &"[REDACTED]")
            .finish()
    }
}

/// Derive the envelope key from (passphrase, salt) via PBKDF2-HMAC-SHA256.
///
/// Deterministic: the receiving edge reproduces the key from the salt it
/// finds in the envelope. The salt does not need to be secret.
fn derive_envelope_key(passphrase: &SecretString, salt: &[u8; SALT_SIZE]) -> EnvelopeKey {
    let mut bytes = [0u8; KEY_SIZE];
    pbkdf2_hmac::<Sha256>(
        passphrase.expose_secret().as_bytes(),
        salt,
        PBKDF2_ROUNDS,
        &mut bytes,
    );
    EnvelopeKey { bytes }
}

/// Seal plaintext under a passphrase.
///
/// Returns `[16-byte salt][12-byte nonce][ciphertext + 16-byte tag]`.
/// Salt and nonce are drawn fresh per call; since the key is re-derived
/// from the fresh salt, nonce reuse across envelopes cannot occur.
pub fn seal(plaintext: &[u8], passphrase: &SecretString) -> Result<Vec<u8>, EnvelopeError> {
    let mut salt = [0u8; SALT_SIZE];
    rand::thread_rng().fill_bytes(&mut salt);
    let key = derive_envelope_key(passphrase, &salt);

    let mut nonce_bytes = [0u8; NONCE_SIZE];
    rand::thread_rng().fill_bytes(&mut nonce_bytes);
    let nonce = Nonce::from_slice(&nonce_bytes);

    let cipher = Aes256Gcm::new((&key.bytes).into());
    let ciphertext = cipher
        .encrypt(nonce, plaintext)
        .map_err(|_| EnvelopeError::EncryptionFailed)?;

    let mut envelope = Vec::with_capacity(SALT_SIZE + NONCE_SIZE + ciphertext.len());
    envelope.extend_from_slice(&salt);
    envelope.extend_from_slice(&nonce_bytes);
    envelope.extend_from_slice(&ciphertext);
    Ok(envelope)
}

/// Open an envelope with a passphrase.
///
/// Fails with [`EnvelopeError::AuthenticationFailed`] on any tag mismatch;
/// no partial plaintext is ever returned.
pub fn open(envelope: &[u8], passphrase: &SecretString) -> Result<Vec<u8>, EnvelopeError> {
    if envelope.len() < SALT_SIZE + NONCE_SIZE + crate::TAG_SIZE {
        return Err(EnvelopeError::Malformed);
    }

    let (salt_bytes, rest) = envelope.split_at(SALT_SIZE);
    let (nonce_bytes, ciphertext) = rest.split_at(NONCE_SIZE);

    let mut salt = [0u8; SALT_SIZE];
    salt.copy_from_slice(salt_bytes);

    let key = derive_envelope_key(passphrase, &salt);
    let cipher = Aes256Gcm::new((&key.bytes).into());
    let nonce = Nonce::from_slice(nonce_bytes);

    cipher
        .decrypt(nonce, ciphertext)
        .map_err(|_| EnvelopeError::AuthenticationFailed)
}
