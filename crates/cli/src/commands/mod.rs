//! CLI command implementations.
//!
//! Each command writes its human-readable result to the given writer; logs
//! go to stderr through `tracing`.

pub mod admin;
pub mod auth;
pub mod cart;
pub mod catalog;

use cartwheel_client::{ClientError, ConfigError, Store};
use cartwheel_core::{CredentialsError, UserId};
use thiserror::Error;

/// Errors that can occur while running a command.
#[derive(Debug, Error)]
pub enum CommandError {
    /// A store action failed.
    #[error(transparent)]
    Client(#[from] ClientError),

    /// Configuration could not be loaded.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Email, password or name was rejected before sending.
    #[error(transparent)]
    Credentials(#[from] CredentialsError),

    /// The command needs a signed-in user.
    #[error("Not signed in. Run `cw signin` first.")]
    NotSignedIn,

    /// The command needs the admin role.
    #[error("This command requires an admin account")]
    NotAdmin,

    /// A local file could not be read or written.
    #[error("{path}: {source}")]
    File {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Writing command output failed.
    #[error("Failed to write output: {0}")]
    Output(#[from] std::io::Error),
}

/// ID of the signed-in user, loading the profile if only the token is known.
pub(crate) async fn signed_in_user(store: &Store) -> Result<UserId, CommandError> {
    let session = store.session().await;
    if !session.is_authenticated {
        return Err(CommandError::NotSignedIn);
    }

    if let Some(user_id) = session.current_user_id() {
        return Ok(user_id.clone());
    }

    Ok(store.fetch_current_user().await?.id)
}
