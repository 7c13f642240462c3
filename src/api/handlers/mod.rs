//! API handlers and shared validation helpers.

pub mod auth;
pub mod handshakes;
pub mod health;
pub mod root;
pub mod users;

use regex::Regex;

/// Lightweight email sanity check used before persisting data.
pub fn valid_email(email: &str) -> bool {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").is_ok_and(|re| re.is_match(email))
}

/// Normalize an email for lookup/uniqueness checks.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Usernames are compared as typed, minus surrounding whitespace.
pub fn normalize_username(username: &str) -> String {
    username.trim().to_string()
}
