//! Passphrase verifier: the only credential the server side ever holds
//!
//! `Verifier::derive` is a one-way SHA-256 digest over the passphrase,
//! computed on the same edge that seals the envelope. The digest cannot
//! decrypt anything — decryption needs the passphrase itself to re-derive
//! the envelope key — so storing it server-side is safe by construction.

use secrecy::{ExposeSecret, SecretString};
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

/// Digest width in bytes (SHA-256).
pub const VERIFIER_SIZE: usize = 32;

/// Minimum accepted passphrase length.
pub const MIN_PASSPHRASE_LEN: usize = 8;

/// A one-way passphrase digest, compared in constant time.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Verifier([u8; VERIFIER_SIZE]);

impl Verifier {
    /// Digest a passphrase into a verifier.
    pub fn derive(passphrase: &SecretString) -> Self {
        let digest = Sha256::digest(passphrase.expose_secret().as_bytes());
        Self(digest.into())
    }

    pub fn from_bytes(bytes: [u8; VERIFIER_SIZE]) -> Self {
        Self(bytes)
    }

    /// Constant-time comparison against a presented verifier.
    ///
    /// Runtime does not depend on where the digests first differ.
    pub fn matches(&self, presented: &Verifier) -> bool {
        self.0.ct_eq(&presented.0).into()
    }

    /// Hex transport encoding (64 lowercase characters).
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl std::str::FromStr for Verifier {
    type Err = VerifierParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = hex::decode(s).map_err(|_| VerifierParseError)?;
        let bytes: [u8; VERIFIER_SIZE] = bytes.try_into().map_err(|_| VerifierParseError)?;
        Ok(Self(bytes))
    }
}

/// The presented string was not a 64-character hex digest.
#[derive(Debug, thiserror::Error)]
#[error("malformed verifier")]
pub struct VerifierParseError;

impl std::fmt::Debug for Verifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Enough to correlate in logs, not enough to replay
        write!(f, "Verifier({}…)", &self.to_hex()[..8])
    }
}

impl Serialize for Verifier {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Verifier {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(de::Error::custom)
    }
}

/// Passphrase policy violations, rejected before any network or storage work.
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum PolicyError {
    #[error("passphrase must be at least {MIN_PASSPHRASE_LEN} characters")]
    TooShort,

    #[error("passphrase must contain an uppercase character")]
    MissingUppercase,
}

/// Enforce the passphrase policy: minimum length plus mixed case.
pub fn validate_passphrase(passphrase: &SecretString) -> Result<(), PolicyError> {
    let raw = passphrase.expose_secret();
    if raw.chars().count() < MIN_PASSPHRASE_LEN {
        return Err(PolicyError::TooShort);
    }
    if !raw.chars().any(char::is_uppercase) {
        return Err(PolicyError::MissingUppercase);
    }
    Ok(())
}
