//! Authenticated encryption for stored connection configs.
//!
//! Sealed form: `base64(nonce || ciphertext || tag)` with a fresh 96-bit nonce
//! per call.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use chacha20poly1305::aead::{Aead, AeadCore, KeyInit, OsRng};
use chacha20poly1305::{ChaCha20Poly1305, Nonce};
use tenant_security::SecretString;
use zeroize::Zeroize;

use crate::domain::ports::{CipherError, ConfigCipher};

const KEY_LEN: usize = 32;
const NONCE_LEN: usize = 12;

pub struct ChaChaConfigCipher {
    cipher: ChaCha20Poly1305,
}

impl ChaChaConfigCipher {
    /// Build from a base64-encoded 32-byte key. `${VAR}` references are
    /// expanded first so the key can live in the environment.
    ///
    /// # Errors
    /// Returns [`CipherError`] if the key is missing, not base64 or not 32 bytes.
    pub fn from_base64_key(key: &SecretString) -> Result<Self, CipherError> {
        if key.is_empty() {
            return Err(CipherError("encryption key is not configured".to_owned()));
        }
        let mut expanded = tenant_db::expand_env_vars(key.expose())
            .map_err(|e| CipherError(format!("encryption key: {e}")))?;
        let decoded = STANDARD.decode(expanded.trim());
        expanded.zeroize();
        let mut bytes =
            decoded.map_err(|e| CipherError(format!("encryption key is not base64: {e}")))?;
        let result = Self::from_key_bytes(&bytes);
        bytes.zeroize();
        result
    }

    /// # Errors
    /// Returns [`CipherError`] unless `key` is exactly 32 bytes.
    pub fn from_key_bytes(key: &[u8]) -> Result<Self, CipherError> {
        if key.len() != KEY_LEN {
            return Err(CipherError(format!(
                "encryption key must be {KEY_LEN} bytes, got {}",
                key.len()
            )));
        }
        let cipher = ChaCha20Poly1305::new_from_slice(key)
            .map_err(|e| CipherError(format!("invalid encryption key: {e}")))?;
        Ok(Self { cipher })
    }
}

impl ConfigCipher for ChaChaConfigCipher {
    fn seal(&self, plaintext: &[u8]) -> Result<String, CipherError> {
        let nonce = ChaCha20Poly1305::generate_nonce(&mut OsRng);
        let ciphertext = self
            .cipher
            .encrypt(&nonce, plaintext)
            .map_err(|_| CipherError("encryption failed".to_owned()))?;

        let mut sealed = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        sealed.extend_from_slice(nonce.as_slice());
        sealed.extend_from_slice(&ciphertext);
        Ok(STANDARD.encode(sealed))
    }

    fn open(&self, sealed: &str) -> Result<Vec<u8>, CipherError> {
        let raw = STANDARD
            .decode(sealed)
            .map_err(|e| CipherError(format!("sealed payload is not base64: {e}")))?;
        if raw.len() <= NONCE_LEN {
            return Err(CipherError("sealed payload is truncated".to_owned()));
        }
        let (nonce, ciphertext) = raw.split_at(NONCE_LEN);
        self.cipher
            .decrypt(Nonce::from_slice(nonce), ciphertext)
            .map_err(|_| CipherError("sealed payload failed authentication".to_owned()))
    }
}
