use clap::{Arg, Command};

pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new("jwt-secret")
                .long("jwt-secret")
                .help("Base secret used to sign JWTs, shared by all replicas")
                .env("HANDSHAKR_JWT_SECRET")
                .required(true),
        )
        .arg(
            Arg::new("jwt-ttl-seconds")
                .long("jwt-ttl-seconds")
                .help("JWT lifetime in seconds")
                .env("HANDSHAKR_JWT_TTL_SECONDS")
                .default_value("86400")
                .value_parser(clap::value_parser!(i64)),
        )
        .arg(
            Arg::new("cookie-ttl-seconds")
                .long("cookie-ttl-seconds")
                .help("Auth and CSRF cookie lifetime in seconds")
                .env("HANDSHAKR_COOKIE_TTL_SECONDS")
                .default_value("3600")
                .value_parser(clap::value_parser!(i64)),
        )
        .arg(
            Arg::new("frontend-base-url")
                .long("frontend-base-url")
                .help("Frontend base URL, used as the allowed CORS origin")
                .env("HANDSHAKR_FRONTEND_BASE_URL")
                .default_value("https://handshakr.dev"),
        )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn jwt_secret_required() {
        temp_env::with_vars([("HANDSHAKR_JWT_SECRET", None::<&str>)], || {
            let command = with_args(Command::new("handshakr"));
            let result = command.try_get_matches_from(vec!["handshakr"]);
            assert!(result.is_err());
        });
    }

    #[test]
    fn ttl_defaults() {
        temp_env::with_vars(
            [
                ("HANDSHAKR_JWT_SECRET", Some("s3cret")),
                ("HANDSHAKR_JWT_TTL_SECONDS", None::<&str>),
                ("HANDSHAKR_COOKIE_TTL_SECONDS", None::<&str>),
            ],
            || {
                let command = with_args(Command::new("handshakr"));
                let matches = command.get_matches_from(vec!["handshakr"]);
                assert_eq!(
                    matches.get_one::<i64>("jwt-ttl-seconds").copied(),
                    Some(86400)
                );
                assert_eq!(
                    matches.get_one::<i64>("cookie-ttl-seconds").copied(),
                    Some(3600)
                );
                assert_eq!(
                    matches.get_one::<String>("frontend-base-url").cloned(),
                    Some("https://handshakr.dev".to_string())
                );
            },
        );
    }
}
