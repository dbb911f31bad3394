//! Session storage helpers.
//!
//! Each flow keeps one serialized value per key; handlers load it, mutate it
//! and store it back only after the step succeeded.

use serde::Serialize;
use serde::de::DeserializeOwned;
use tower_sessions::Session;

/// Session keys.
pub mod keys {
    /// Plan selection, coupon state and pet profile.
    pub const CHECKOUT: &str = "checkout";

    /// Onboarding wizard state.
    pub const ONBOARDING: &str = "onboarding";

    /// Completion bundle of a finished onboarding.
    pub const ONBOARDING_COMPLETION: &str = "onboarding_completion";
}

/// Load the value stored under `key`, or its default when absent.
///
/// # Errors
///
/// Returns the session store error if the session cannot be read.
pub async fn load<T>(session: &Session, key: &str) -> Result<T, tower_sessions::session::Error>
where
    T: DeserializeOwned + Default,
{
    Ok(session.get::<T>(key).await?.unwrap_or_default())
}

/// Store `value` under `key`.
///
/// # Errors
///
/// Returns the session store error if the session cannot be written.
pub async fn store<T>(
    session: &Session,
    key: &str,
    value: &T,
) -> Result<(), tower_sessions::session::Error>
where
    T: Serialize + Sync,
{
    session.insert(key, value).await
}

/// Write the session to the store now instead of when the response is sent.
///
/// Concurrent requests of the same visitor see the write once they
/// [`reload`] the session.
///
/// # Errors
///
/// Returns the session store error if the session cannot be written.
pub async fn save_now(session: &Session) -> Result<(), tower_sessions::session::Error> {
    session.save().await
}

/// Replace the in-memory session with the copy in the store.
///
/// # Errors
///
/// Returns the session store error if the session cannot be read.
pub async fn reload(session: &Session) -> Result<(), tower_sessions::session::Error> {
    session.load().await
}
