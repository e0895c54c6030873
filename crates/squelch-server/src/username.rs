//! Username rules.
//!
//! 1 to 32 characters from `[A-Za-z0-9_.-]`, starting with a letter or
//! digit. Relay labels start with `#`, so they can never collide with a
//! username.

use thiserror::Error;

/// Longest accepted username, in characters
pub const MAX_USERNAME_LEN: usize = 32;

/// Why a username was refused. The display text is sent to the client.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UsernameError {
    /// Empty name
    #[error("username is empty")]
    Empty,

    /// Name longer than [`MAX_USERNAME_LEN`]
    #[error("username exceeds {max} characters")]
    TooLong {
        /// Maximum length
        max: usize,
    },

    /// First character is not alphanumeric
    #[error("username must start with a letter or digit")]
    InvalidStart,

    /// Character outside the allowed set
    #[error("username contains invalid character {0:?}")]
    InvalidChar(char),
}

/// Check `name` against the username rules.
pub fn validate_username(name: &str) -> Result<(), UsernameError> {
    let Some(first) = name.chars().next() else {
        return Err(UsernameError::Empty);
    };

    if name.chars().count() > MAX_USERNAME_LEN {
        return Err(UsernameError::TooLong { max: MAX_USERNAME_LEN });
    }

    if !first.is_ascii_alphanumeric() {
        return Err(UsernameError::InvalidStart);
    }

    match name.chars().find(|&c| !is_allowed(c)) {
        Some(c) => Err(UsernameError::InvalidChar(c)),
        None => Ok(()),
    }
}

fn is_allowed(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-')
}
