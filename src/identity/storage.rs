use super::{credential::unix_now, Credential, IdentityError};
use keyring::Entry;
use serde_json::Value;
use std::sync::{PoisonError, RwLock};
use tracing::{debug, info};
use uuid::Uuid;

/// The keyring account our identity lives under.
const IDENTITY_ACCOUNT: &str = "Device Identity";

/// Where the device identity lives between requests and between processes.
///
/// Implementations are shared by every API client in the process, so they
/// must be safe to use from several tasks at once.
pub trait IdentityStore: Send + Sync {
    /// The credential most recently loaded or saved by this process.
    fn current(&self) -> Credential;

    /// Re-reads the persisted credential, as another process may have refreshed it.
    fn reload(&self) -> Result<Credential, IdentityError>;

    /// Persists a backend login/refresh payload, returning the resulting credential.
    fn save(&self, payload: &Value) -> Result<Credential, IdentityError>;

    /// Forgets all tokens, starting over with a freshly generated device UUID.
    fn reset(&self) -> Result<Credential, IdentityError>;

    fn is_expired(&self, credential: &Credential) -> bool {
        credential.is_expired()
    }
}

/// Produces a blank identity for a device that has yet to pair.
fn blank_identity() -> Credential {
    Credential {
        uuid: Uuid::new_v4().to_string(),
        ..Credential::default()
    }
}

/// Identity persisted as JSON within the user's keyring.
///
/// While we would ideally have one keyring entry per token,
/// it's far easier to keep both tokens and their expiry consistent as one.
pub struct KeyringIdentityStore {
    entry: Entry,
    cached: RwLock<Credential>,
}

impl KeyringIdentityStore {
    /// Opens the identity stored under `service`, loading whatever is present.
    pub fn open(service: &str) -> Result<Self, IdentityError> {
        let entry = Entry::new(service, IDENTITY_ACCOUNT)?;
        let credential = read_entry(&entry)?;
        Ok(Self {
            entry,
            cached: RwLock::new(credential),
        })
    }

    fn persist(&self, credential: Credential) -> Result<Credential, IdentityError> {
        let contents = serde_json::to_string(&credential).map_err(IdentityError::Malformed)?;
        self.entry.set_password(&contents)?;
        *self.cached.write().unwrap_or_else(PoisonError::into_inner) = credential.clone();
        Ok(credential)
    }
}

/// Reads our credential JSON from the keyring.
/// Having nothing stored simply means we haven't paired yet.
fn read_entry(entry: &Entry) -> Result<Credential, IdentityError> {
    match entry.get_password() {
        Ok(contents) => serde_json::from_str(&contents).map_err(IdentityError::Malformed),
        Err(keyring::Error::NoEntry) => {
            debug!("no stored identity, starting blank");
            Ok(Credential::default())
        }
        Err(err) => Err(IdentityError::Keyring(err)),
    }
}

impl IdentityStore for KeyringIdentityStore {
    fn current(&self) -> Credential {
        self.cached
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn reload(&self) -> Result<Credential, IdentityError> {
        let credential = read_entry(&self.entry)?;
        *self.cached.write().unwrap_or_else(PoisonError::into_inner) = credential.clone();
        Ok(credential)
    }

    fn save(&self, payload: &Value) -> Result<Credential, IdentityError> {
        let credential = self.current().apply_login(payload, unix_now())?;
        info!(
            uuid = %credential.uuid,
            expires_at = ?credential.expires_at,
            "saving device identity"
        );
        self.persist(credential)
    }

    fn reset(&self) -> Result<Credential, IdentityError> {
        info!("resetting device identity");
        self.persist(blank_identity())
    }
}

/// Identity held only within this process.
///
/// Useful for tests, or for short-lived tools that shouldn't touch the keyring.
#[derive(Default)]
pub struct MemoryIdentityStore {
    credential: RwLock<Credential>,
}

impl MemoryIdentityStore {
    pub fn new(credential: Credential) -> Self {
        Self {
            credential: RwLock::new(credential),
        }
    }

    /// Overwrites the stored credential, as if another process had saved it.
    pub fn replace(&self, credential: Credential) {
        *self.credential.write().unwrap_or_else(PoisonError::into_inner) = credential;
    }
}

impl IdentityStore for MemoryIdentityStore {
    fn current(&self) -> Credential {
        self.credential
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn reload(&self) -> Result<Credential, IdentityError> {
        Ok(self.current())
    }

    fn save(&self, payload: &Value) -> Result<Credential, IdentityError> {
        let credential = self.current().apply_login(payload, unix_now())?;
        self.replace(credential.clone());
        Ok(credential)
    }

    fn reset(&self) -> Result<Credential, IdentityError> {
        let credential = blank_identity();
        self.replace(credential.clone());
        Ok(credential)
    }
}
