//! Passcode gate for privileged actions.
//!
//! Resolve, modify and delete require the shared passcode. The gate keeps
//! only the SHA-256 digest of the secret; a plaintext secret handed to
//! [`AccessGate::from_secret`] is hashed and wiped immediately.
//!
//! ```
//! use flare_core::access::{AccessGate, Passcode};
//!
//! let gate = AccessGate::from_secret(Passcode::new("correct horse".to_string()));
//! assert!(gate.authorize("correct horse"));
//! assert!(!gate.authorize("Correct horse"));
//! ```

use crate::error::{AuthorizationError, ConfigError};
use sha2::{Digest, Sha256};
use std::fmt;
use tracing::debug;
use zeroize::Zeroizing;

const DIGEST_LEN: usize = 32;

/// SHA-256 digest of a passcode.
#[derive(Clone, PartialEq, Eq)]
pub struct PasscodeDigest([u8; DIGEST_LEN]);

impl PasscodeDigest {
    pub fn of(secret: &str) -> Self {
        let mut bytes = [0u8; DIGEST_LEN];
        bytes.copy_from_slice(&Sha256::digest(secret.as_bytes()));
        Self(bytes)
    }

    /// Parses a 64-character hex digest.
    pub fn from_hex(digest: &str) -> Result<Self, ConfigError> {
        let mut bytes = [0u8; DIGEST_LEN];
        hex::decode_to_slice(digest.trim(), &mut bytes)
            .map_err(|e| ConfigError::InvalidPasscodeDigest(e.to_string()))?;
        Ok(Self(bytes))
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Compares every byte regardless of where the first mismatch is.
    fn matches(&self, other: &PasscodeDigest) -> bool {
        self.0
            .iter()
            .zip(other.0.iter())
            .fold(0u8, |diff, (a, b)| diff | (a ^ b))
            == 0
    }
}

impl fmt::Debug for PasscodeDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PasscodeDigest(..)")
    }
}

#[derive(Debug, Clone)]
pub struct AccessGate {
    digest: PasscodeDigest,
}

impl AccessGate {
    /// Builds a gate from the plaintext secret. Taking ownership of the
    /// [`Passcode`] means the only copy of the plaintext is wiped when this
    /// returns.
    pub fn from_secret(secret: Passcode) -> Self {
        Self {
            digest: PasscodeDigest::of(&secret),
        }
    }

    /// Builds a gate from a hex SHA-256 digest of the secret.
    pub fn from_digest_hex(digest: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            digest: PasscodeDigest::from_hex(digest)?,
        })
    }

    pub fn from_digest(digest: PasscodeDigest) -> Self {
        Self { digest }
    }

    /// True iff `supplied` hashes to the configured digest. The empty string
    /// never authorizes.
    pub fn authorize(&self, supplied: &str) -> bool {
        if supplied.is_empty() {
            return false;
        }
        let granted = self.digest.matches(&PasscodeDigest::of(supplied));
        debug!("Passcode check {}", if granted { "passed" } else { "failed" });
        granted
    }

    /// [`authorize`](Self::authorize) for `?` flows.
    pub fn require(&self, supplied: &str) -> Result<(), AuthorizationError> {
        if self.authorize(supplied) {
            Ok(())
        } else {
            Err(AuthorizationError::Rejected)
        }
    }
}

/// Owned passcode input that is wiped on drop.
pub type Passcode = Zeroizing<String>;

#[cfg(test)]
mod tests {
    use super::*;

    fn gate() -> AccessGate {
        AccessGate::from_digest(PasscodeDigest::of("MuMeLeLe"))
    }

    #[test]
    fn test_authorize_matches_only_the_secret() {
        let gate = gate();
        assert!(gate.authorize("MuMeLeLe"));
        assert!(!gate.authorize("wrong"));
        assert!(!gate.authorize("mumelele"));
        assert!(!gate.authorize("MuMeLeLe "));
    }

    #[test]
    fn test_empty_passcode_never_authorizes() {
        assert!(!gate().authorize(""));
        assert!(!AccessGate::from_secret(Passcode::default()).authorize(""));
    }

    #[test]
    fn test_from_secret_takes_owned_passcode() {
        let secret = Passcode::new("MuMeLeLe".to_string());
        let gate = AccessGate::from_secret(secret);

        assert!(gate.authorize("MuMeLeLe"));
        assert!(!gate.authorize("wrong"));
    }

    #[test]
    fn test_require() {
        assert_eq!(gate().require("MuMeLeLe"), Ok(()));
        assert_eq!(gate().require("wrong"), Err(AuthorizationError::Rejected));
    }

    #[test]
    fn test_digest_hex_round_trip() {
        let hex = PasscodeDigest::of("MuMeLeLe").to_hex();
        assert_eq!(hex.len(), 64);

        let gate = AccessGate::from_digest_hex(&hex).unwrap();
        assert!(gate.authorize("MuMeLeLe"));

        let upper = AccessGate::from_digest_hex(&hex.to_uppercase()).unwrap();
        assert!(upper.authorize("MuMeLeLe"));
    }

    #[test]
    fn test_bad_digest_hex() {
        assert!(matches!(
            AccessGate::from_digest_hex("abc"),
            Err(ConfigError::InvalidPasscodeDigest(_))
        ));
        assert!(matches!(
            AccessGate::from_digest_hex(&"zz".repeat(32)),
            Err(ConfigError::InvalidPasscodeDigest(_))
        ));
    }

    #[test]
    fn test_debug_hides_digest() {
        let printed = format!("{:?}", gate());
        assert!(!printed.contains(&PasscodeDigest::of("MuMeLeLe").to_hex()));
    }
}
