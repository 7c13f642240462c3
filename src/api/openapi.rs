use super::handlers::{auth, handshakes, health, users};
use utoipa::openapi::{InfoBuilder, License, OpenApiBuilder, Tag};
use utoipa_axum::{router::OpenApiRouter, routes};

#[must_use]
pub fn openapi() -> utoipa::openapi::OpenApi {
    // Reuse the same router wiring and only return the generated OpenAPI spec.
    let (_router, openapi) = api_router().split_for_parts();
    openapi
}

/// Build the router that also drives the `OpenAPI` document.
///
/// Add new endpoints here via `.routes(routes!(...))` so they are both served
/// and included in the generated spec. Routes added outside (like `/` or
/// `OPTIONS /health`) are intentionally not documented.
pub(crate) fn api_router() -> OpenApiRouter {
    // `routes!` reads #[utoipa::path] to bind HTTP method + path.
    OpenApiRouter::with_openapi(cargo_openapi())
        .routes(routes!(health::health))
        .routes(routes!(auth::register))
        .routes(routes!(auth::login))
        .routes(routes!(auth::logout))
        .routes(routes!(users::list_users))
        .routes(routes!(users::me))
        .routes(routes!(users::get_public_key, users::set_public_key))
        .routes(routes!(handshakes::create))
        .routes(routes!(handshakes::get_by_name))
        .routes(routes!(handshakes::latest_by_initiator))
        .routes(routes!(handshakes::latest_by_acceptor))
        .routes(routes!(handshakes::list_by_initiator))
        .routes(routes!(handshakes::list_by_acceptor))
        .routes(routes!(handshakes::accept))
        .routes(routes!(handshakes::reject))
        .routes(routes!(handshakes::complete))
        .routes(routes!(handshakes::cancel))
}

fn cargo_openapi() -> utoipa::openapi::OpenApi {
    // Use Cargo.toml metadata instead of the utoipa-axum crate info defaults.
    let mut info = InfoBuilder::new()
        .title(env!("CARGO_PKG_NAME"))
        .version(env!("CARGO_PKG_VERSION"))
        .description(optional_str(env!("CARGO_PKG_DESCRIPTION")))
        .build();

    info.license = cargo_license();

    let mut auth_tag = Tag::new("auth");
    auth_tag.description = Some("Registration, login, and logout".to_string());

    let mut users_tag = Tag::new("users");
    users_tag.description = Some("User directory and public keys".to_string());

    let mut handshakes_tag = Tag::new("handshakes");
    handshakes_tag.description = Some("Handshake lifecycle and queries".to_string());

    OpenApiBuilder::new()
        .info(info)
        .tags(Some(vec![auth_tag, users_tag, handshakes_tag]))
        .build()
}

fn cargo_license() -> Option<License> {
    let identifier = optional_str(env!("CARGO_PKG_LICENSE"))?;
    let mut license = License::new(identifier);
    license.identifier = Some(identifier.to_string());
    Some(license)
}

fn optional_str(value: &'static str) -> Option<&'static str> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn openapi_info_from_cargo() {
        let spec = openapi();
        assert_eq!(spec.info.title, env!("CARGO_PKG_NAME"));
        assert_eq!(spec.info.version, env!("CARGO_PKG_VERSION"));
        assert_eq!(
            spec.info.description.as_deref(),
            Some(env!("CARGO_PKG_DESCRIPTION"))
        );

        let license = spec.info.license;
        assert!(license.is_some());
        if let Some(license) = license {
            assert_eq!(license.name, "BSD-3-Clause");
        }
    }

    #[test]
    fn openapi_tags_and_paths() {
        let spec = openapi();
        let tags = spec.tags.clone().unwrap_or_default();
        assert!(tags.iter().any(|tag| tag.name == "auth"));
        assert!(tags.iter().any(|tag| tag.name == "handshakes"));

        assert!(spec.paths.paths.contains_key("/v1/auth/register"));
        assert!(spec.paths.paths.contains_key("/v1/handshakes"));
        assert!(spec.paths.paths.contains_key("/v1/handshakes/{name}/accept"));
        assert!(spec
            .paths
            .paths
            .contains_key("/v1/handshakes/by-initiator/{username}/all"));
    }
}
