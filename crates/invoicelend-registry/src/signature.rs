//! Trusted-signer verification for mint requests.
//!
//! The trust backend scores an invoice off-ledger and signs the canonical
//! [`MintRequest::signing_payload`]. The registry accepts a mint only if that
//! signature verifies against the stored backend key.

use ed25519_dalek::{Signer, SigningKey, VerifyingKey};
use invoicelend_types::{MintRequest, PublicKey, Signature};

/// Pluggable verification of a detached signature over a payload.
pub trait SignatureVerifier {
    /// `true` iff `signature` is a valid signature of `payload` under `key`.
    fn verify(&self, payload: &[u8], signature: &Signature, key: &PublicKey) -> bool;
}

/// Ed25519 verifier using strict (non-malleable) verification.
#[derive(Debug, Clone, Copy, Default)]
pub struct Ed25519Verifier;

impl SignatureVerifier for Ed25519Verifier {
    fn verify(&self, payload: &[u8], signature: &Signature, key: &PublicKey) -> bool {
        let Ok(verifying_key) = VerifyingKey::from_bytes(key.as_bytes()) else {
            tracing::debug!(%key, "Backend key is not a valid ed25519 point");
            return false;
        };
        let signature = ed25519_dalek::Signature::from_bytes(&signature.to_bytes());
        verifying_key.verify_strict(payload, &signature).is_ok()
    }
}

/// The trust backend's signing half: scores are signed with this key.
pub struct BackendSigner {
    signing_key: SigningKey,
}

impl BackendSigner {
    /// Wrap a 32-byte ed25519 secret.
    #[must_use]
    pub fn from_bytes(secret: &[u8; 32]) -> Self {
        Self {
            signing_key: SigningKey::from_bytes(secret),
        }
    }

    #[must_use]
    pub fn public_key(&self) -> PublicKey {
        PublicKey(self.signing_key.verifying_key().to_bytes())
    }

    /// Sign an arbitrary payload.
    #[must_use]
    pub fn sign(&self, payload: &[u8]) -> Signature {
        Signature(self.signing_key.sign(payload).to_bytes())
    }

    /// Sign the canonical payload of a mint request.
    #[must_use]
    pub fn sign_request(&self, request: &MintRequest) -> Signature {
        self.sign(&request.signing_payload())
    }
}

impl std::fmt::Debug for BackendSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackendSigner")
            .field("public_key", &self.public_key())
            .finish_non_exhaustive()
    }
}

#[cfg(any(test, feature = "test-helpers"))]
impl BackendSigner {
    /// Fresh random key for tests. **Never use in production.**
    #[must_use]
    pub fn random() -> Self {
        Self {
            signing_key: SigningKey::generate(&mut rand::rngs::OsRng),
        }
    }
}
