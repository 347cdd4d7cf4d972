//! Mock single sign-on used until the real identity provider is wired in.

use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

use crate::session::{Session, SessionStorage};

static USERNAME_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-zA-ZäöüÄÖÜß]+\.[a-zA-ZäöüÄÖÜß]+@ibisacam\.at$").unwrap()
});

const MIN_PASSWORD_LEN: usize = 8;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum LoginError {
    #[error("no account found for this username")]
    UnknownUser,
    #[error("the password is incorrect, please try again")]
    WrongPassword,
}

/// `firstname.lastname@ibisacam.at`.
pub fn validate_username(username: &str) -> Result<(), LoginError> {
    if USERNAME_PATTERN.is_match(username) {
        Ok(())
    } else {
        Err(LoginError::UnknownUser)
    }
}

/// At least eight characters with upper, lower, digit and symbol.
pub fn validate_password(password: &str) -> Result<(), LoginError> {
    let ok = password.chars().count() >= MIN_PASSWORD_LEN
        && password.chars().any(|c| c.is_ascii_uppercase())
        && password.chars().any(|c| c.is_ascii_lowercase())
        && password.chars().any(|c| c.is_ascii_digit())
        && password.chars().any(|c| !c.is_ascii_alphanumeric());
    if ok { Ok(()) } else { Err(LoginError::WrongPassword) }
}

/// Check the mock credentials and mark the session as signed in.
pub fn sign_in<S: SessionStorage>(
    session: &mut Session<S>,
    username: &str,
    password: &str,
) -> Result<(), LoginError> {
    validate_username(username)?;
    validate_password(password)?;
    session.set_authenticated(true);
    tracing::info!(username, "mock sign-in succeeded");
    Ok(())
}

pub fn sign_out<S: SessionStorage>(session: &mut Session<S>) {
    session.set_authenticated(false);
}
