//! Symmetric key resolution for the sealed token backend.
//!
//! Resolution order: configured hex key, then the key file, then a freshly
//! generated key persisted to the key file. A key file that exists but cannot
//! be read or decoded is a fatal error and is never overwritten.

use std::fmt;
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use ring::rand::{SecureRandom, SystemRandom};
use tracing::{info, warn};
use zeroize::Zeroizing;

use crate::errors::{Error, Result};

/// Length of the symmetric key in bytes.
pub const KEY_LEN: usize = 32;

/// 256-bit key, wiped from memory on drop.
pub struct SymmetricKey {
    bytes: Zeroizing<[u8; KEY_LEN]>,
}

impl SymmetricKey {
    pub fn from_bytes(bytes: [u8; KEY_LEN]) -> Self {
        Self { bytes: Zeroizing::new(bytes) }
    }

    /// Decode a 64-character hex string. `origin` names where it came from in errors.
    pub fn from_hex(encoded: &str, origin: &str) -> Result<Self> {
        let mut bytes = Zeroizing::new([0u8; KEY_LEN]);
        hex::decode_to_slice(encoded.trim(), &mut bytes[..]).map_err(|err| {
            Error::config(format!(
                "{} must be {} hex-encoded bytes ({} characters): {}",
                origin,
                KEY_LEN,
                KEY_LEN * 2,
                err
            ))
        })?;
        Ok(Self { bytes })
    }

    pub fn generate() -> Result<Self> {
        let mut bytes = Zeroizing::new([0u8; KEY_LEN]);
        SystemRandom::new()
            .fill(&mut bytes[..])
            .map_err(|_| Error::internal("Failed to generate token key"))?;
        Ok(Self { bytes })
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes[..]
    }

    fn to_hex(&self) -> Zeroizing<String> {
        Zeroizing::new(hex::encode(&self.bytes[..]))
    }
}

impl fmt::Debug for SymmetricKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SymmetricKey").field("bytes", &"[REDACTED]").finish()
    }
}

#[derive(Debug, Clone)]
pub struct KeyManager {
    configured_key: Option<String>,
    key_file: PathBuf,
}

impl KeyManager {
    pub fn new(configured_key: Option<String>, key_file: impl Into<PathBuf>) -> Self {
        Self { configured_key, key_file: key_file.into() }
    }

    pub fn key_file(&self) -> &Path {
        &self.key_file
    }

    /// Resolve the key, creating and persisting one on first start.
    pub fn load_or_create(&self) -> Result<SymmetricKey> {
        if let Some(configured) = self.configured_key.as_deref().filter(|k| !k.trim().is_empty()) {
            return SymmetricKey::from_hex(configured, "TOKEN_SYMMETRIC_KEY");
        }

        match fs::read_to_string(&self.key_file) {
            Ok(contents) => {
                let origin = format!("Key file '{}'", self.key_file.display());
                let key = SymmetricKey::from_hex(&Zeroizing::new(contents), &origin)?;
                info!(path = %self.key_file.display(), "loaded token key from file");
                Ok(key)
            }
            Err(err) if err.kind() == io::ErrorKind::NotFound => self.generate_and_persist(),
            Err(err) => Err(Error::config(format!(
                "Failed to read key file '{}': {}",
                self.key_file.display(),
                err
            ))),
        }
    }

    fn generate_and_persist(&self) -> Result<SymmetricKey> {
        let key = SymmetricKey::generate()?;

        if let Some(parent) = self.key_file.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|err| self.write_error(err))?;
        }

        let mut options = OpenOptions::new();
        options.write(true).create_new(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }

        let mut file = options.open(&self.key_file).map_err(|err| self.write_error(err))?;
        file.write_all(key.to_hex().as_bytes()).map_err(|err| self.write_error(err))?;
        file.sync_all().map_err(|err| self.write_error(err))?;

        warn!(
            path = %self.key_file.display(),
            "generated new token key; tokens issued under any previous key are no longer valid"
        );
        Ok(key)
    }

    fn write_error(&self, err: io::Error) -> Error {
        Error::config(format!("Failed to write key file '{}': {}", self.key_file.display(), err))
    }
}
