//! Session commands.

use std::io::Write;

use cartwheel_client::Store;
use cartwheel_core::{Credentials, SignUpForm, User};
use secrecy::SecretString;

use super::CommandError;

/// Sign in and load the user's cart.
pub async fn sign_in(
    store: &Store,
    out: &mut impl Write,
    email: &str,
    password: SecretString,
) -> Result<(), CommandError> {
    let credentials = Credentials::new(email, password)?;
    let user = store.sign_in(&credentials).await?;

    if let Err(e) = store.fetch_cart(&user.id).await {
        tracing::warn!(error = %e, "Signed in but the cart could not be loaded");
    }

    writeln!(out, "Signed in as {}", describe(&user))?;
    Ok(())
}

/// Create an account and sign in as it.
pub async fn sign_up(
    store: &Store,
    out: &mut impl Write,
    name: &str,
    email: &str,
    password: SecretString,
) -> Result<(), CommandError> {
    let form = SignUpForm::new(name, email, password)?;
    let user = store.sign_up(&form).await?;

    writeln!(out, "Welcome, {}", describe(&user))?;
    Ok(())
}

pub async fn sign_out(store: &Store, out: &mut impl Write) -> Result<(), CommandError> {
    store.sign_out().await;
    writeln!(out, "Signed out")?;
    Ok(())
}

/// Show who is signed in, loading the profile if only the token is known.
pub async fn whoami(store: &Store, out: &mut impl Write) -> Result<(), CommandError> {
    if !store.is_authenticated().await {
        writeln!(out, "Not signed in")?;
        return Ok(());
    }

    let user = match store.user().await {
        Some(user) => user,
        None => store.fetch_current_user().await?,
    };

    writeln!(out, "{}", describe(&user))?;
    writeln!(out, "User ID: {}", user.id)?;
    writeln!(out, "Previous orders: {}", user.previous_orders.len())?;
    Ok(())
}

fn describe(user: &User) -> String {
    format!("{} <{}> ({})", user.name, user.email, user.role)
}
