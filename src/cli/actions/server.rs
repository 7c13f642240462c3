use crate::{api, auth::state::AuthConfig, cli::actions::Action};
use anyhow::Result;

/// Handle the server action
pub async fn handle(action: Action) -> Result<()> {
    match action {
        Action::Server {
            port,
            dsn,
            jwt_secret,
            jwt_ttl_seconds,
            cookie_ttl_seconds,
            frontend_base_url,
        } => {
            let config = AuthConfig::new(frontend_base_url, jwt_secret)
                .with_jwt_ttl_seconds(jwt_ttl_seconds)
                .with_cookie_ttl_seconds(cookie_ttl_seconds);

            api::new(port, dsn, config).await?;
        }
    }

    Ok(())
}
