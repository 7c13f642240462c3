//! # Handshakr (Handshake Agreement Registry)
//!
//! `handshakr` is a CRUD backend that registers and authenticates users and
//! tracks *handshakes*: named, bilateral agreements between an initiator and
//! an acceptor. The agreement payload (`encryptedDetails`) is encrypted on
//! the client; the server stores it as an opaque blob and never inspects it.
//!
//! ## Authentication
//!
//! Authentication is stateless. A successful login issues an `HS256` JWT
//! whose subject is the username, delivered both in the response body and in
//! an `HttpOnly` cookie. Mutating requests are additionally protected by a
//! double-submit CSRF token (`XSRF-TOKEN` cookie + `X-XSRF-TOKEN` header).
//!
//! The signing secret is operator-supplied at startup and shared by all
//! replicas; the server never generates key material in-process, so tokens
//! survive restarts and horizontal scaling.
//!
//! ## Handshake lifecycle
//!
//! Status transitions go through an explicit table rather than a free-form
//! setter:
//!
//! ```text
//! CREATED -> PENDING | ACCEPTED | CANCELLED
//! PENDING -> ACCEPTED | CANCELLED
//! ACCEPTED -> COMPLETED | FAILED | CANCELLED
//! ```
//!
//! `CANCELLED`, `COMPLETED` and `FAILED` are terminal. Updates are
//! compare-and-set on the previously observed status, so concurrent writers
//! cannot silently overwrite each other.

pub mod api;
pub mod auth;
pub mod cli;
pub mod handshake;
pub mod user;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};

pub const APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"),);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_git_commit_hash_format() {
        if GIT_COMMIT_HASH == "unknown" {
            // Acceptable in non-git build environments
            return;
        }
        assert!(
            GIT_COMMIT_HASH.chars().all(|c| c.is_ascii_hexdigit()),
            "GIT_COMMIT_HASH should be a hex string, got: {GIT_COMMIT_HASH}"
        );
        assert!(GIT_COMMIT_HASH.len() >= 7);
    }

    #[test]
    fn test_app_user_agent_format() {
        assert!(APP_USER_AGENT.starts_with(env!("CARGO_PKG_NAME")));
        assert!(APP_USER_AGENT.contains(env!("CARGO_PKG_VERSION")));
    }
}
