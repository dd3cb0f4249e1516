//! Name and email collected once for the weekly challenge.

use super::kv_store::{KeyValueStore, StoreResult};

/// Store key holding the registered player name.
pub const NAME_KEY: &str = "name";
/// Store key holding the registered contact email.
pub const EMAIL_KEY: &str = "email";

/// Identity used to enter the weekly challenge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerIdentity {
    /// Registered player name.
    pub name: String,
    /// Contact email.
    pub email: String,
}

/// Load the stored identity. Both entries must be present.
pub fn load_identity(store: &dyn KeyValueStore) -> StoreResult<Option<PlayerIdentity>> {
    let name = store.get(NAME_KEY)?.filter(|v| !v.is_empty());
    let email = store.get(EMAIL_KEY)?.filter(|v| !v.is_empty());
    Ok(name
        .zip(email)
        .map(|(name, email)| PlayerIdentity { name, email }))
}

/// Persist `identity`.
pub fn save_identity(store: &dyn KeyValueStore, identity: &PlayerIdentity) -> StoreResult<()> {
    store.set(NAME_KEY, &identity.name)?;
    store.set(EMAIL_KEY, &identity.email)
}
