//! Encrypted user credentials record.
//!
//! The password is never stored in clear. A [`CredentialCipher`] supplied by
//! the caller performs the hybrid encryption: a fresh session key encrypts
//! the password under an authenticated mode, and the session key is
//! encrypted for the recipient's public key. This module only stores the
//! four resulting fields.

use crate::BundleResult;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use bootpack_core::UserConfiguration;
use serde::{Deserialize, Serialize};

/// Output of [`CredentialCipher::encrypt`].
#[derive(Clone, PartialEq, Eq)]
pub struct EncryptedPassword {
    /// Session key encrypted for the recipient public key.
    pub encrypted_session_key: Vec<u8>,
    pub nonce: Vec<u8>,
    /// Authentication tag of the ciphertext.
    pub tag: Vec<u8>,
    pub ciphertext: Vec<u8>,
}

impl std::fmt::Debug for EncryptedPassword {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EncryptedPassword")
            .field("encrypted_session_key", &self.encrypted_session_key.len())
            .field("nonce", &self.nonce.len())
            .field("tag", &self.tag.len())
            .field("ciphertext", &self.ciphertext.len())
            .finish()
    }
}

/// Hybrid public-key encryption of the user password.
///
/// Implementations report failures as [`crate::BundleError::Encryption`].
pub trait CredentialCipher: Send + Sync {
    fn encrypt(&self, recipient_public_key: &str, plaintext: &str)
    -> BundleResult<EncryptedPassword>;
}

/// Contents of `user.yaml`.
///
/// `password`, `aes_session_key`, `cipher_aes_nonce` and `tag` are plain
/// YAML strings holding standard base64, not `!!binary` scalars. Readers on
/// the node must base64-decode them to get the raw bytes back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    pub username: String,

    /// Encrypted password.
    pub password: String,

    #[serde(rename = "ssh-key")]
    pub ssh_key: Option<String>,

    pub aes_session_key: String,
    pub cipher_aes_nonce: String,
    pub tag: String,
    pub cluster_id: String,
}

impl UserRecord {
    pub fn new(user: &UserConfiguration, encrypted: &EncryptedPassword, cluster_id: &str) -> Self {
        Self {
            username: user.username.clone(),
            password: STANDARD.encode(&encrypted.ciphertext),
            ssh_key: user.ssh_key.clone(),
            aes_session_key: STANDARD.encode(&encrypted.encrypted_session_key),
            cipher_aes_nonce: STANDARD.encode(&encrypted.nonce),
            tag: STANDARD.encode(&encrypted.tag),
            cluster_id: cluster_id.to_string(),
        }
    }

    pub fn to_yaml(&self) -> BundleResult<String> {
        Ok(serde_yaml::to_string(self)?)
    }
}
