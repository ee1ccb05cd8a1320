//! Encrypted Device Resolver
//!
//! Implements the `EncryptedDeviceResolver` port with `cryptsetup`. Shell
//! integration stays isolated here so the orchestrator's degradation policy
//! is testable with deterministic stdout parsing.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use crate::domain::ports::{CommandExecutor, EncryptedDeviceResolver};
use crate::error::{Error, Result};

const CRYPTSETUP: &str = "cryptsetup";

/// Resolver unwrapping dm-crypt mappings via `cryptsetup`.
pub struct CryptsetupResolver {
    executor: Arc<dyn CommandExecutor>,
}

impl CryptsetupResolver {
    pub fn new(executor: Arc<dyn CommandExecutor>) -> Self {
        Self { executor }
    }
}

impl std::fmt::Debug for CryptsetupResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CryptsetupResolver").finish()
    }
}

#[async_trait]
impl EncryptedDeviceResolver for CryptsetupResolver {
    async fn resolve_backing_device(&self, encrypted_path: &str) -> Result<String> {
        let output = self
            .executor
            .run(CRYPTSETUP, &["status", encrypted_path])
            .await
            .map_err(|e| Error::Resolution {
                device: encrypted_path.to_string(),
                reason: e.to_string(),
            })?;

        let backing =
            parse_backing_device(&output).ok_or_else(|| Error::Resolution {
                device: encrypted_path.to_string(),
                reason: "no device field in cryptsetup status output".to_string(),
            })?;

        debug!(mapping = encrypted_path, device = %backing, "resolved encrypted mapping");
        Ok(backing)
    }

    async fn teardown_mapping(&self, encrypted_path: &str) -> Result<()> {
        self.executor
            .run(CRYPTSETUP, &["remove", mapping_name(encrypted_path)])
            .await
            .map_err(|e| Error::Teardown {
                device: encrypted_path.to_string(),
                reason: e.to_string(),
            })?;

        Ok(())
    }
}

/// Extract the `device:` field from `cryptsetup status` output.
fn parse_backing_device(output: &str) -> Option<String> {
    output.lines().find_map(|line| {
        line.trim()
            .strip_prefix("device:")
            .map(|rest| rest.trim().to_string())
            .filter(|device| !device.is_empty())
    })
}

/// dm mapping name for a `/dev/mapper/<name>` path.
fn mapping_name(encrypted_path: &str) -> &str {
    encrypted_path
        .strip_prefix("/dev/mapper/")
        .unwrap_or(encrypted_path)
}

#[cfg(test)]
mod tests {
    use super::*;

    const STATUS_OUTPUT: &str = "/dev/mapper/unit-0-block-dmcrypt is active and is in use.\n  \
        type:    LUKS2\n  \
        cipher:  aes-xts-plain64\n  \
        keysize: 512 bits\n  \
        device:  /dev/sdb\n  \
        sector size:  512\n  \
        offset:  32768 sectors\n  \
        mode:    read/write\n";

    #[test]
    fn test_parse_backing_device() {
        assert_eq!(
            parse_backing_device(STATUS_OUTPUT),
            Some("/dev/sdb".to_string())
        );
    }

    #[test]
    fn test_parse_backing_device_missing_field() {
        assert_eq!(parse_backing_device("inactive\n"), None);
        assert_eq!(parse_backing_device("  device:\n"), None);
    }

    #[test]
    fn test_mapping_name_strips_mapper_prefix() {
        assert_eq!(
            mapping_name("/dev/mapper/unit-0-block-dmcrypt"),
            "unit-0-block-dmcrypt"
        );
        assert_eq!(mapping_name("unit-0-block-dmcrypt"), "unit-0-block-dmcrypt");
    }
}
