//! RSA encryption of device credentials with a connector's public key.
//!
//! On-prem connectors publish an RSA public key. Credentials sent to a
//! device behind such a connector are encrypted with PKCS#1 v1.5 padding so
//! only the connector can read them. Each ciphertext is base64 encoded.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use rand::rngs::OsRng;
use rsa::pkcs8::DecodePublicKey;
use rsa::{Pkcs1v15Encrypt, RsaPublicKey};

use crate::error::{CdoError, Result};
use crate::model::PublicKey;

/// Encrypts strings with a connector's RSA public key.
#[derive(Debug, Clone)]
pub struct Cipher {
    key: RsaPublicKey,
}

impl Cipher {
    /// Parses the base64-encoded PEM key carried by [`PublicKey::encoded_key`].
    pub fn from_encoded_key(encoded_key: &str) -> Result<Self> {
        let pem_bytes = STANDARD
            .decode(encoded_key.trim())
            .map_err(|e| CdoError::Encryption(format!("public key is not valid base64: {e}")))?;
        let pem = String::from_utf8(pem_bytes)
            .map_err(|e| CdoError::Encryption(format!("public key is not valid UTF-8: {e}")))?;
        let key = RsaPublicKey::from_public_key_pem(&pem)
            .map_err(|e| CdoError::Encryption(format!("public key is not a PEM RSA key: {e}")))?;
        Ok(Cipher { key })
    }

    pub fn from_public_key(public_key: &PublicKey) -> Result<Self> {
        Cipher::from_encoded_key(&public_key.encoded_key)
    }

    /// Encrypts `plaintext` and returns the base64-encoded ciphertext.
    pub fn encrypt(&self, plaintext: &str) -> Result<String> {
        let ciphertext = self
            .key
            .encrypt(&mut OsRng, Pkcs1v15Encrypt, plaintext.as_bytes())
            .map_err(|e| CdoError::Encryption(e.to_string()))?;
        Ok(STANDARD.encode(ciphertext))
    }
}
