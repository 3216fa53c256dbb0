//! Chat platform collaborators.

pub mod discord;
pub mod memory;
pub mod traits;

pub use discord::DiscordPlatform;
pub use memory::MemoryPlatform;
pub use traits::{Attachment, ChatMessage, ChatPlatform, MessageHandle, ThreadHandle};

/// Thin wrapper around the OS keyring for credential storage.
pub mod keyring_store {
    use crate::error::PlatformError;

    const SERVICE: &str = "rollcall";

    pub fn get(key: &str) -> Result<Option<String>, PlatformError> {
        let entry = keyring::Entry::new(SERVICE, key)?;
        match entry.get_password() {
            Ok(pw) => Ok(Some(pw)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    pub fn set(key: &str, value: &str) -> Result<(), PlatformError> {
        let entry = keyring::Entry::new(SERVICE, key)?;
        entry.set_password(value)?;
        Ok(())
    }

    pub fn delete(key: &str) -> Result<(), PlatformError> {
        let entry = keyring::Entry::new(SERVICE, key)?;
        match entry.delete_credential() {
            Ok(()) => Ok(()),
            Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
