//! Reversible password codec for stored connections.
//!
//! Passwords are obfuscated under a shared secret before hitting the
//! connection store, and recovered when a pipeline run needs live
//! credentials. The codec is deliberately tolerant: anything it cannot
//! decode is assumed to be a plaintext or legacy-format password and is
//! returned unchanged with a warning, never an error. This keeps old
//! records usable after a key change at the cost of silently passing
//! garbage through to the connection attempt, where it fails loudly.
//!
//! This is obfuscation against casual reads of the store file, not
//! tamper-proof cryptography.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use tracing::warn;

/// Encrypts and decrypts connection passwords under a shared key.
#[derive(Debug, Clone)]
pub struct SecretCodec {
    key: String,
}

impl SecretCodec {
    /// Creates a codec with the given shared secret.
    pub fn new(key: impl Into<String>) -> Self {
        Self { key: key.into() }
    }

    /// Encrypts a plaintext password. Empty input stays empty.
    pub fn encrypt(&self, text: &str) -> String {
        if text.is_empty() {
            return String::new();
        }
        let mut bytes = text.as_bytes().to_vec();
        apply_keystream(&self.key, &mut bytes);
        BASE64.encode(bytes)
    }

    /// Decrypts a stored password, returning the input unchanged on any
    /// failure.
    pub fn decrypt(&self, cipher_text: &str) -> String {
        if cipher_text.is_empty() {
            return String::new();
        }

        // Old format was "iv:hex"; those records need to be re-saved.
        if cipher_text.contains(':') {
            warn!("Legacy password format detected. This connection needs to be re-saved.");
            return cipher_text.to_string();
        }

        let mut bytes = match BASE64.decode(cipher_text) {
            Ok(b) => b,
            Err(_) => {
                // Short raw strings are assumed to be plaintext passwords.
                if cipher_text.len() >= 15 {
                    warn!("Stored password is not valid base64. Possible wrong key or corrupted data.");
                }
                return cipher_text.to_string();
            }
        };

        apply_keystream(&self.key, &mut bytes);
        match String::from_utf8(bytes) {
            Ok(s) => s,
            Err(_) => {
                warn!("Decryption did not produce UTF-8 output. Possible wrong key or corrupted data.");
                cipher_text.to_string()
            }
        }
    }
}

/// XORs `bytes` in place with the key bytes, repeated. Symmetric, so the
/// same call both encrypts and decrypts.
///
/// The transform is fully specified by the key so stored ciphertexts stay
/// decodable across releases and toolchains.
fn apply_keystream(key: &str, bytes: &mut [u8]) {
    let key_bytes = key.as_bytes();
    if key_bytes.is_empty() {
        return;
    }
    for (byte, pad) in bytes.iter_mut().zip(key_bytes.iter().cycle()) {
        *byte ^= pad;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn codec() -> SecretCodec {
        SecretCodec::new("test-secret-key")
    }

    #[test]
    fn test_round_trip() {
        let codec = codec();
        let cipher = codec.encrypt("s3cret-p@ssword!");
        assert_ne!(cipher, "s3cret-p@ssword!");
        assert_eq!(codec.decrypt(&cipher), "s3cret-p@ssword!");
    }

    #[test]
    fn test_round_trip_unicode() {
        let codec = codec();
        let cipher = codec.encrypt("contraseña-ütf8");
        assert_eq!(codec.decrypt(&cipher), "contraseña-ütf8");
    }

    #[test]
    fn test_empty_passthrough() {
        let codec = codec();
        assert_eq!(codec.encrypt(""), "");
        assert_eq!(codec.decrypt(""), "");
    }

    #[test]
    fn test_ciphertext_format_is_stable() {
        // Records written by older builds must stay decodable, so the
        // encrypted form is pinned against a fixture.
        let codec = codec();
        assert_eq!(codec.encrypt("hunter2"), "HBAdAEgBVw==");
        assert_eq!(codec.decrypt("HBAdAEgBVw=="), "hunter2");
    }

    #[test]
    fn test_ciphertext_never_contains_colon() {
        // A ':' in output would collide with the legacy-format check.
        let codec = codec();
        for input in ["a", "hunter2", "a much longer password with spaces"] {
            assert!(!codec.encrypt(input).contains(':'));
        }
    }

    #[test]
    fn test_legacy_format_returned_unchanged() {
        let codec = codec();
        let legacy = "0badc0ffee:deadbeefcafe";
        assert_eq!(codec.decrypt(legacy), legacy);
    }

    #[test]
    fn test_non_base64_returned_unchanged() {
        let codec = codec();
        assert_eq!(codec.decrypt("hunter2"), "hunter2");
        assert_eq!(codec.decrypt("not base64 at all!"), "not base64 at all!");
    }

    #[test]
    fn test_wrong_key_falls_back_to_input() {
        let cipher = SecretCodec::new("key-one").encrypt("password-with-enough-length");
        let decrypted = SecretCodec::new("key-two").decrypt(&cipher);
        // Either the garbage failed UTF-8 validation (input returned) or it
        // decoded to mojibake; it must not equal the real password.
        assert_ne!(decrypted, "password-with-enough-length");
    }
}
