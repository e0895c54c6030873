//! Shared-secret loading.
//!
//! Key material can come from a command-line flag, a key file or the
//! `SQUELCH_KEY` environment variable. When several are present the flag
//! wins over the file and the file over the environment.

use std::{fmt, path::PathBuf};

use zeroize::Zeroizing;

use crate::ClientError;

/// Environment variable holding the shared secret
pub const KEY_ENV_VAR: &str = "SQUELCH_KEY";

/// Candidate sources of key material.
#[derive(Clone, Default)]
pub struct SecretSource {
    /// Secret given directly on the command line
    pub key: Option<Zeroizing<String>>,
    /// File holding the secret
    pub key_file: Option<PathBuf>,
    /// Value of [`KEY_ENV_VAR`]
    pub env: Option<Zeroizing<String>>,
}

impl SecretSource {
    /// Combine the CLI options with the current environment.
    pub fn from_args(key: Option<String>, key_file: Option<PathBuf>) -> Self {
        Self {
            key: key.map(Zeroizing::new),
            key_file,
            env: std::env::var(KEY_ENV_VAR).ok().map(Zeroizing::new),
        }
    }
}

impl fmt::Debug for SecretSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecretSource")
            .field("key", &self.key.as_ref().map(|_| "<redacted>"))
            .field("key_file", &self.key_file)
            .field("env", &self.env.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Resolve the shared secret from `source`.
///
/// A key file loses one trailing line ending (`\n` or `\r\n`).
///
/// # Errors
///
/// - `MissingSecret` if no source is set
/// - `KeyFile` if the key file cannot be read
/// - `EmptySecret` if the chosen source yields no bytes
pub fn load_secret(source: &SecretSource) -> Result<Zeroizing<Vec<u8>>, ClientError> {
    let secret = if let Some(key) = &source.key {
        Zeroizing::new(key.as_bytes().to_vec())
    } else if let Some(path) = &source.key_file {
        let mut bytes = Zeroizing::new(
            std::fs::read(path)
                .map_err(|source| ClientError::KeyFile { path: path.clone(), source })?,
        );
        strip_line_ending(&mut bytes);
        bytes
    } else if let Some(env) = &source.env {
        Zeroizing::new(env.as_bytes().to_vec())
    } else {
        return Err(ClientError::MissingSecret);
    };

    if secret.is_empty() {
        return Err(ClientError::EmptySecret);
    }

    Ok(secret)
}

fn strip_line_ending(bytes: &mut Vec<u8>) {
    if bytes.last() == Some(&b'\n') {
        bytes.pop();
        if bytes.last() == Some(&b'\r') {
            bytes.pop();
        }
    }
}
