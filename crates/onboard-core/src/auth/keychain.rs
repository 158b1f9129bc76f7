use anyhow::{bail, Context, Result};
use keyring::Entry;
use tracing::debug;

const SERVICE_NAME: &str = "onboard";

/// Remembers sign-in passwords in the OS keychain, keyed by email.
/// The session token never goes here.
pub struct Keychain;

impl Keychain {
    /// Store the password for an email in the OS keychain
    pub fn remember(email: &str, password: &str) -> Result<()> {
        let entry = Entry::new(SERVICE_NAME, email).context("Failed to create keyring entry")?;
        entry
            .set_password(password)
            .context("Failed to store password in keychain")?;

        // Read back through a fresh entry so a store that drops writes is reported
        if Self::recall(email).as_deref() != Some(password) {
            bail!("Keychain did not retain the password");
        }
        debug!(email, "Password remembered");
        Ok(())
    }

    /// Remembered password for an email, if any
    pub fn recall(email: &str) -> Option<String> {
        Entry::new(SERVICE_NAME, email)
            .and_then(|entry| entry.get_password())
            .ok()
    }

    /// Forget the password for an email. Forgetting an unknown email is fine.
    pub fn forget(email: &str) -> Result<()> {
        let entry = Entry::new(SERVICE_NAME, email).context("Failed to create keyring entry")?;
        match entry.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(e).context("Failed to delete password from keychain"),
        }
    }
}
