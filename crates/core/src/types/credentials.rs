//! Sign-in and sign-up payloads.
//!
//! Passwords are held as [`SecretString`] and only exposed while the request
//! body is serialized. Validation is deliberately shallow: the backend owns
//! the account rules, the client only refuses input that cannot possibly
//! succeed.

use secrecy::{ExposeSecret, SecretString};
use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};

/// Errors raised when building credentials from user input.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CredentialsError {
    /// The email address is empty.
    #[error("email cannot be empty")]
    EmptyEmail,
    /// The email address has no local part or domain around an @ symbol.
    #[error("email must look like name@domain")]
    MalformedEmail,
    /// The password is empty.
    #[error("password cannot be empty")]
    EmptyPassword,
    /// The display name is empty.
    #[error("name cannot be empty")]
    EmptyName,
}

/// Email and password posted to `/users/signin`.
#[derive(Clone)]
pub struct Credentials {
    email: String,
    password: SecretString,
}

impl Credentials {
    /// Build credentials, trimming the email.
    ///
    /// # Errors
    ///
    /// Returns an error if the email is empty or has no `local@domain` shape,
    /// or if the password is empty.
    pub fn new(email: &str, password: SecretString) -> Result<Self, CredentialsError> {
        let email = check_email(email)?;
        if password.expose_secret().is_empty() {
            return Err(CredentialsError::EmptyPassword);
        }
        Ok(Self { email, password })
    }

    /// The email address these credentials sign in as.
    #[must_use]
    pub fn email(&self) -> &str {
        &self.email
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

impl Serialize for Credentials {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut body = serializer.serialize_struct("Credentials", 2)?;
        body.serialize_field("email", &self.email)?;
        body.serialize_field("password", self.password.expose_secret())?;
        body.end()
    }
}

/// Registration form posted to `/users/signup`.
#[derive(Clone)]
pub struct SignUpForm {
    name: String,
    credentials: Credentials,
}

impl SignUpForm {
    /// Build a sign-up form.
    ///
    /// # Errors
    ///
    /// Returns an error if the name is blank or the credentials are invalid.
    pub fn new(name: &str, email: &str, password: SecretString) -> Result<Self, CredentialsError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(CredentialsError::EmptyName);
        }
        Ok(Self {
            name: name.to_owned(),
            credentials: Credentials::new(email, password)?,
        })
    }

    /// The display name for the new account.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The email address for the new account.
    #[must_use]
    pub fn email(&self) -> &str {
        self.credentials.email()
    }
}

impl std::fmt::Debug for SignUpForm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignUpForm")
            .field("name", &self.name)
            .field("email", &self.credentials.email)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

impl Serialize for SignUpForm {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut body = serializer.serialize_struct("SignUpForm", 3)?;
        body.serialize_field("name", &self.name)?;
        body.serialize_field("email", &self.credentials.email)?;
        body.serialize_field("password", self.credentials.password.expose_secret())?;
        body.end()
    }
}

fn check_email(email: &str) -> Result<String, CredentialsError> {
    let email = email.trim();
    if email.is_empty() {
        return Err(CredentialsError::EmptyEmail);
    }
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() => Ok(email.to_owned()),
        _ => Err(CredentialsError::MalformedEmail),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn secret(s: &str) -> SecretString {
        SecretString::from(s.to_owned())
    }

    #[test]
    fn test_credentials_serialize_exposes_password_only_in_body() {
        let creds = Credentials::new(" shopper@example.com ", secret("hunter22")).unwrap();
        let json = serde_json::to_value(&creds).unwrap();
        assert_eq!(json["email"], "shopper@example.com");
        assert_eq!(json["password"], "hunter22");

        let debug = format!("{creds:?}");
        assert!(debug.contains("[REDACTED]"));
        assert!(!debug.contains("hunter22"));
    }

    #[test]
    fn test_credentials_rejects_bad_input() {
        assert_eq!(
            Credentials::new("", secret("x")).unwrap_err(),
            CredentialsError::EmptyEmail
        );
        assert_eq!(
            Credentials::new("no-at-symbol", secret("x")).unwrap_err(),
            CredentialsError::MalformedEmail
        );
        assert_eq!(
            Credentials::new("@example.com", secret("x")).unwrap_err(),
            CredentialsError::MalformedEmail
        );
        assert_eq!(
            Credentials::new("a@b.c", secret("")).unwrap_err(),
            CredentialsError::EmptyPassword
        );
    }

    #[test]
    fn test_sign_up_form() {
        let form = SignUpForm::new("Ada", "ada@example.com", secret("pw")).unwrap();
        let json = serde_json::to_value(&form).unwrap();
        assert_eq!(json["name"], "Ada");
        assert_eq!(json["email"], "ada@example.com");
        assert_eq!(json["password"], "pw");

        assert_eq!(
            SignUpForm::new("  ", "ada@example.com", secret("pw")).unwrap_err(),
            CredentialsError::EmptyName
        );
    }
}
