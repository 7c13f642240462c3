pub mod server;

use secrecy::SecretString;

/// Actions the CLI can dispatch to.
#[derive(Debug)]
pub enum Action {
    Server {
        port: u16,
        dsn: String,
        jwt_secret: SecretString,
        jwt_ttl_seconds: i64,
        cookie_ttl_seconds: i64,
        frontend_base_url: String,
    },
}
