//! Password strength checks and bcrypt hashing.

use std::fmt::Display;

use bcrypt::{BcryptError, hash, verify};
use serde::{Deserialize, Serialize};
use zxcvbn::{Score, feedback::Feedback, zxcvbn};

use crate::Error;

/// The minimum number of characters in a password.
pub const MIN_PASSWORD_LENGTH: u8 = 8;

/// A composition rule and the message shown when a password breaks it.
type Rule = (fn(&str) -> bool, &'static str);

const COMPOSITION_RULES: [Rule; 5] = [
    (
        |password| password.chars().count() >= usize::from(MIN_PASSWORD_LENGTH),
        "Password must be at least 8 characters long",
    ),
    (
        |password| password.chars().any(|c| c.is_ascii_digit()),
        "Password must contain at least one number",
    ),
    (
        |password| password.chars().any(char::is_lowercase),
        "Password must contain at least one lowercase letter",
    ),
    (
        |password| password.chars().any(char::is_uppercase),
        "Password must contain at least one uppercase letter",
    ),
    (
        |password| password.chars().any(|c| !c.is_alphanumeric()),
        "Password must contain at least one special character",
    ),
];

/// A plain text password that passed the strength checks, ready to be hashed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidatedPassword(String);

impl ValidatedPassword {
    /// Check `raw_password` against the composition rules, then reject it if
    /// zxcvbn rates it easy to guess.
    ///
    /// # Errors
    ///
    /// Returns [Error::TooWeak] with a message for the user, either the first
    /// broken rule or zxcvbn's suggestion.
    pub fn new(raw_password: &str) -> Result<Self, Error> {
        if let Some((_, message)) = COMPOSITION_RULES
            .iter()
            .find(|(is_satisfied, _)| !is_satisfied(raw_password))
        {
            return Err(Error::TooWeak((*message).to_owned()));
        }

        let estimate = zxcvbn(raw_password, &[]);

        match estimate.score() {
            Score::Three | Score::Four => Ok(Self(raw_password.to_owned())),
            _ => {
                let feedback = estimate.feedback().cloned().unwrap_or_default();
                Err(Error::TooWeak(feedback.to_string()))
            }
        }
    }

    /// Skip the strength checks, for seeding test data.
    pub fn new_unchecked(raw_password: &str) -> Self {
        Self(raw_password.to_owned())
    }
}

impl Display for ValidatedPassword {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("********")
    }
}

/// A salted bcrypt hash, as stored in the user table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PasswordHash(String);

impl PasswordHash {
    /// bcrypt's recommended work factor.
    pub const DEFAULT_COST: u32 = bcrypt::DEFAULT_COST;

    /// Hash `password` with `cost` rounds of bcrypt. Tests pass a low cost to stay fast.
    pub fn new(password: ValidatedPassword, cost: u32) -> Result<Self, Error> {
        hash(&password.0, cost)
            .map(Self)
            .map_err(|error| Error::HashingError(error.to_string()))
    }

    /// Wrap a hash read back from the database.
    pub fn new_unchecked(raw_password_hash: &str) -> Self {
        Self(raw_password_hash.to_owned())
    }

    /// Validate then hash `raw_password`.
    pub fn from_raw_password(raw_password: &str, cost: u32) -> Result<Self, Error> {
        Self::new(ValidatedPassword::new(raw_password)?, cost)
    }

    /// Whether `raw_password` is the password this hash was made from.
    pub fn verify(&self, raw_password: &str) -> Result<bool, BcryptError> {
        verify(raw_password, &self.0)
    }
}

impl AsRef<str> for PasswordHash {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Display for PasswordHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
