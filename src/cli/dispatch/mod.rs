//! Command-line argument dispatch.
//!
//! Maps validated CLI matches to the appropriate action, such as starting
//! the API server with its full configuration.

use crate::cli::actions::Action;
use anyhow::{Context, Result};
use secrecy::SecretString;

/// Map validated CLI matches to a server action.
///
/// # Errors
/// Returns an error if required arguments are missing or inconsistent.
pub fn handler(matches: &clap::ArgMatches) -> Result<Action> {
    let port = matches.get_one::<u16>("port").copied().unwrap_or(8080);
    let dsn = matches
        .get_one::<String>("dsn")
        .cloned()
        .context("missing required argument: --dsn")?;

    let jwt_secret = matches
        .get_one::<String>("jwt-secret")
        .cloned()
        .map(SecretString::from)
        .context("missing required argument: --jwt-secret")?;

    let jwt_ttl_seconds = matches
        .get_one::<i64>("jwt-ttl-seconds")
        .copied()
        .unwrap_or(86400);

    let cookie_ttl_seconds = matches
        .get_one::<i64>("cookie-ttl-seconds")
        .copied()
        .unwrap_or(3600);

    let frontend_base_url = matches
        .get_one::<String>("frontend-base-url")
        .cloned()
        .context("missing required argument: --frontend-base-url")?;

    Ok(Action::Server {
        port,
        dsn,
        jwt_secret,
        jwt_ttl_seconds,
        cookie_ttl_seconds,
        frontend_base_url,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::actions::Action;
    use secrecy::ExposeSecret;

    #[test]
    fn dispatch_builds_server_action() {
        temp_env::with_vars(
            [
                ("HANDSHAKR_JWT_SECRET", None::<&str>),
                ("HANDSHAKR_PORT", None),
                ("HANDSHAKR_COOKIE_TTL_SECONDS", None),
                ("HANDSHAKR_FRONTEND_BASE_URL", None),
            ],
            || {
                let command = crate::cli::commands::new();
                let matches = command.get_matches_from(vec![
                    "handshakr",
                    "--dsn",
                    "postgres://user@localhost:5432/handshakr",
                    "--jwt-secret",
                    "s3cret-material",
                    "--jwt-ttl-seconds",
                    "600",
                ]);

                let action = handler(&matches).expect("dispatch should succeed");
                let Action::Server {
                    port,
                    dsn,
                    jwt_secret,
                    jwt_ttl_seconds,
                    cookie_ttl_seconds,
                    frontend_base_url,
                } = action;

                assert_eq!(port, 8080);
                assert_eq!(dsn, "postgres://user@localhost:5432/handshakr");
                assert_eq!(jwt_secret.expose_secret(), "s3cret-material");
                assert_eq!(jwt_ttl_seconds, 600);
                assert_eq!(cookie_ttl_seconds, 3600);
                assert_eq!(frontend_base_url, "https://handshakr.dev");
            },
        );
    }
}
