//! A small AES-256-GCM encrypt/decrypt primitive used to seal a `ThreatEvent`'s
//! `details` blob at rest. Not wired into the inspection pipeline itself; only the
//! threat-event persistence path uses it.
//!
//! Grounded on the retrieval pack's sealed-storage idiom (`aes_gcm::Aes256Gcm` plus a
//! random 12-byte nonce prefixed to the ciphertext), simplified to operate on an
//! in-memory key and byte slice rather than a TEE-derived, file-backed key.

use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Nonce};
use rand::RngCore;

use crate::error::RegistryError;

const NONCE_LEN: usize = 12;

/// Encrypts `plaintext` under `key`, returning `nonce || ciphertext`.
pub fn seal(plaintext: &[u8], key: &[u8; 32]) -> Result<Vec<u8>, RegistryError> {
    let cipher = Aes256Gcm::new_from_slice(key).map_err(|e| RegistryError::Crypto(e.to_string()))?;

    let mut nonce_bytes = [0u8; NONCE_LEN];
    rand::thread_rng().fill_bytes(&mut nonce_bytes);
    let nonce = Nonce::from(nonce_bytes);

    let ciphertext = cipher
        .encrypt(&nonce, plaintext)
        .map_err(|e| RegistryError::Crypto(e.to_string()))?;

    let mut sealed = Vec::with_capacity(NONCE_LEN + ciphertext.len());
    sealed.extend_from_slice(&nonce_bytes);
    sealed.extend_from_slice(&ciphertext);
    Ok(sealed)
}

/// Decrypts a blob produced by [`seal`]. Fails with [`RegistryError::Crypto`] if the
/// key is wrong, the blob is too short, or the authentication tag doesn't verify (a
/// single flipped bit anywhere in `sealed` is enough to fail this check).
pub fn open(sealed: &[u8], key: &[u8; 32]) -> Result<Vec<u8>, RegistryError> {
    let cipher = Aes256Gcm::new_from_slice(key).map_err(|e| RegistryError::Crypto(e.to_string()))?;

    if sealed.len() < NONCE_LEN {
        return Err(RegistryError::Crypto("sealed blob shorter than nonce".to_string()));
    }
    let (nonce_bytes, ciphertext) = sealed.split_at(NONCE_LEN);
    let nonce_arr: [u8; NONCE_LEN] = nonce_bytes
        .try_into()
        .map_err(|_| RegistryError::Crypto("invalid nonce length".to_string()))?;
    let nonce = Nonce::from(nonce_arr);

    cipher
        .decrypt(&nonce, ciphertext)
        .map_err(|e| RegistryError::Crypto(e.to_string()))
}
