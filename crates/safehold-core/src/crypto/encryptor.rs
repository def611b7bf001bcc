//! AES-CBC envelope encryption.
//!
//! Payload layout: `[16-byte IV][CBC ciphertext with PKCS#7 padding]`. The
//! AES variant follows the key length. There is no authentication tag;
//! callers detect a wrong key through padding or parse failures.

use aes::{Aes128, Aes192, Aes256};
use cbc::cipher::block_padding::Pkcs7;
use cbc::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use rand::RngCore;
use zeroize::Zeroizing;

use super::CryptoError;
use crate::memory::SecureBuffer;

/// Size of the random IV prepended to every payload.
pub const IV_SIZE: usize = 16;

const BLOCK_SIZE: usize = 16;

fn key_error(key: &[u8]) -> CryptoError {
    CryptoError::InvalidKeyLength { actual: key.len() }
}

/// Encrypt `plaintext` under `key` with a freshly generated IV.
pub fn encrypt(plaintext: &[u8], key: &[u8]) -> Result<Vec<u8>, CryptoError> {
    let mut iv = [0u8; IV_SIZE];
    rand::rng().fill_bytes(&mut iv);

    let ciphertext = match key.len() {
        16 => cbc::Encryptor::<Aes128>::new_from_slices(key, &iv)
            .map_err(|_| key_error(key))?
            .encrypt_padded_vec_mut::<Pkcs7>(plaintext),
        24 => cbc::Encryptor::<Aes192>::new_from_slices(key, &iv)
            .map_err(|_| key_error(key))?
            .encrypt_padded_vec_mut::<Pkcs7>(plaintext),
        32 => cbc::Encryptor::<Aes256>::new_from_slices(key, &iv)
            .map_err(|_| key_error(key))?
            .encrypt_padded_vec_mut::<Pkcs7>(plaintext),
        _ => return Err(key_error(key)),
    };

    let mut payload = Vec::with_capacity(IV_SIZE + ciphertext.len());
    payload.extend_from_slice(&iv);
    payload.extend_from_slice(&ciphertext);
    Ok(payload)
}

/// Decrypt a payload produced by [`encrypt`].
///
/// Decryption happens in a scratch copy that is wiped whether or not the
/// padding check succeeds.
pub fn decrypt(payload: &[u8], key: &[u8]) -> Result<SecureBuffer, CryptoError> {
    if payload.len() < IV_SIZE + BLOCK_SIZE || (payload.len() - IV_SIZE) % BLOCK_SIZE != 0 {
        return Err(CryptoError::InvalidCiphertextLength {
            length: payload.len(),
        });
    }
    let (iv, ciphertext) = payload.split_at(IV_SIZE);
    let mut scratch = Zeroizing::new(ciphertext.to_vec());

    let plaintext = match key.len() {
        16 => cbc::Decryptor::<Aes128>::new_from_slices(key, iv)
            .map_err(|_| key_error(key))?
            .decrypt_padded_mut::<Pkcs7>(&mut scratch),
        24 => cbc::Decryptor::<Aes192>::new_from_slices(key, iv)
            .map_err(|_| key_error(key))?
            .decrypt_padded_mut::<Pkcs7>(&mut scratch),
        32 => cbc::Decryptor::<Aes256>::new_from_slices(key, iv)
            .map_err(|_| key_error(key))?
            .decrypt_padded_mut::<Pkcs7>(&mut scratch),
        _ => return Err(key_error(key)),
    }
    .map_err(|_| CryptoError::DecryptionFailed)?;

    Ok(SecureBuffer::from_slice(plaintext))
}
