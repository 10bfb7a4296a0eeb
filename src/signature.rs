use crate::error::{decode_hex_array, LedgerError, Result};
use ed25519_dalek::{Signer, SigningKey, Verifier, VerifyingKey};
use rand::rngs::OsRng;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt::{Debug, Display, Formatter};

pub const PUBLIC_KEY_SIZE: usize = 32;
pub const SECRET_KEY_SIZE: usize = 32;
pub const SIGNATURE_SIZE: usize = 64;

/// The identity of an output's recipient: an Ed25519 public key.
/// Only the raw bytes are stored, so that a key that is not a valid curve point can still be
/// carried around in an output. Such a key simply never verifies any signature.
#[derive(Copy, Clone, Debug, Hash, Eq, PartialEq)]
pub struct PublicKey([u8; PUBLIC_KEY_SIZE]);

impl PublicKey {
    pub const fn from_raw(raw_bytes: [u8; PUBLIC_KEY_SIZE]) -> Self {
        Self(raw_bytes)
    }

    pub fn as_bytes(&self) -> &[u8; PUBLIC_KEY_SIZE] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    pub fn from_hex(s: &str) -> Result<Self> {
        decode_hex_array(s, "public key").map(Self)
    }
}

impl Display for PublicKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

/// A signature over the signable payload of a single transaction input.
#[derive(Copy, Clone, Hash, Eq, PartialEq)]
pub struct Signature([u8; SIGNATURE_SIZE]);

impl Signature {
    pub const fn from_raw(raw_bytes: [u8; SIGNATURE_SIZE]) -> Self {
        Self(raw_bytes)
    }

    /// The placeholder attached to an input until it is signed.
    pub const fn empty() -> Self {
        Self([0; SIGNATURE_SIZE])
    }

    pub fn as_bytes(&self) -> &[u8; SIGNATURE_SIZE] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    pub fn from_hex(s: &str) -> Result<Self> {
        decode_hex_array(s, "signature").map(Self)
    }
}

impl Debug for Signature {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "Signature({})", self.to_hex())
    }
}

impl Display for Signature {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

macro_rules! hex_serde {
    ($type:ty) => {
        impl Serialize for $type {
            fn serialize<S: Serializer>(
                &self,
                serializer: S,
            ) -> std::result::Result<S::Ok, S::Error> {
                serializer.serialize_str(&self.to_hex())
            }
        }

        impl<'de> Deserialize<'de> for $type {
            fn deserialize<D: Deserializer<'de>>(
                deserializer: D,
            ) -> std::result::Result<Self, D::Error> {
                let s = String::deserialize(deserializer)?;
                <$type>::from_hex(&s).map_err(D::Error::custom)
            }
        }
    };
}

hex_serde!(PublicKey);
hex_serde!(Signature);

/// Checks that a signature was produced by the owner of a public key.
pub trait SignatureVerifier {
    /// Returns true iff `signature` is a valid signature of `message` under `public_key`.
    /// Malformed keys and signatures are reported as false, never as an error.
    fn verify(&self, public_key: &PublicKey, message: &[u8], signature: &Signature) -> bool;
}

#[derive(Debug, Default, Copy, Clone)]
pub struct Ed25519Verifier;

impl SignatureVerifier for Ed25519Verifier {
    fn verify(&self, public_key: &PublicKey, message: &[u8], signature: &Signature) -> bool {
        let verifying_key = match VerifyingKey::from_bytes(public_key.as_bytes()) {
            Ok(key) => key,
            Err(_) => return false,
        };
        let signature = ed25519_dalek::Signature::from_bytes(signature.as_bytes());
        verifying_key.verify(message, &signature).is_ok()
    }
}

/// An Ed25519 key pair. The ledger itself never manages keys, this exists for wallets, the CLI
/// and tests that need to produce signed transactions.
#[derive(Clone)]
pub struct KeyPair {
    signing_key: SigningKey,
}

impl KeyPair {
    pub fn generate() -> Self {
        Self {
            signing_key: SigningKey::generate(&mut OsRng),
        }
    }

    /// Deterministic key pair, mostly useful in tests.
    pub fn from_seed(seed: [u8; SECRET_KEY_SIZE]) -> Self {
        Self {
            signing_key: SigningKey::from_bytes(&seed),
        }
    }

    pub fn from_secret_hex(s: &str) -> Result<Self> {
        decode_hex_array(s, "secret key")
            .map_err(|e| LedgerError::InvalidKey(e.to_string()))
            .map(Self::from_seed)
    }

    pub fn secret_hex(&self) -> String {
        hex::encode(self.signing_key.to_bytes())
    }

    pub fn public_key(&self) -> PublicKey {
        PublicKey::from_raw(self.signing_key.verifying_key().to_bytes())
    }

    pub fn sign(&self, message: &[u8]) -> Signature {
        Signature::from_raw(self.signing_key.sign(message).to_bytes())
    }
}

impl Debug for KeyPair {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyPair")
            .field("public_key", &self.public_key())
            .field("secret_key", &"<hidden>")
            .finish()
    }
}
