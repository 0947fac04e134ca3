use fernet::Fernet;

use crate::error::{Error, Result};

/// Encrypt `plaintext` under a freshly generated key.
///
/// Returns `(token, key)`, both URL-safe base64. The key is not stored
/// anywhere; losing it loses the data.
pub fn encrypt_data(plaintext: &str) -> Result<(String, String)> {
    let key = Fernet::generate_key();
    let f = cipher(&key)?;
    Ok((f.encrypt(plaintext.as_bytes()), key))
}

/// Decrypt a token produced by [`encrypt_data`] with its key.
pub fn decrypt_data(token: &str, key: &str) -> Result<String> {
    let bytes = cipher(key)?
        .decrypt(token)
        .map_err(|_| Error::Crypto("token is invalid or was encrypted under a different key".into()))?;
    String::from_utf8(bytes).map_err(|e| Error::Crypto(format!("plaintext is not UTF-8: {e}")))
}

fn cipher(key: &str) -> Result<Fernet> {
    Fernet::new(key).ok_or_else(|| Error::Crypto("key must be 32 bytes of URL-safe base64".into()))
}
