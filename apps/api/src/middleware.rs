use axum::extract::{Request, State};
use axum::http::{HeaderMap, HeaderValue, Method, header};
use axum::middleware::Next;
use axum::response::Response;

use huntboard_core::{ActorIdentity, AppError};
use huntboard_domain::PrincipalId;

use crate::error::ApiResult;
use crate::state::AppState;

/// Header carrying the authenticated principal id, set by the upstream
/// gateway. Session mechanics live outside this service.
pub const PRINCIPAL_ID_HEADER: &str = "x-principal-id";

pub async fn resolve_actor(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> ApiResult<Response> {
    let header_value = request
        .headers()
        .get(PRINCIPAL_ID_HEADER)
        .and_then(|value| value.to_str().ok());
    let identity = actor_from_header(&state, header_value).await?;

    request.extensions_mut().insert(identity);

    Ok(next.run(request).await)
}

/// Resolves the gateway-supplied principal header into an acting identity.
///
/// Unknown, malformed, and deactivated principals are all rejected with
/// Unauthorized before any handler runs.
pub(crate) async fn actor_from_header(
    state: &AppState,
    header_value: Option<&str>,
) -> Result<ActorIdentity, AppError> {
    let header_value = header_value
        .ok_or_else(|| AppError::Unauthorized("principal identification required".to_owned()))?;

    let principal_id = uuid::Uuid::parse_str(header_value)
        .map(PrincipalId::from_uuid)
        .map_err(|_| AppError::Unauthorized("invalid principal identifier".to_owned()))?;

    let (tenant_id, principal) = state
        .principal_repository
        .find_principal_in_any_tenant(principal_id)
        .await?
        .ok_or_else(|| AppError::Unauthorized("unknown principal".to_owned()))?;

    if !principal.is_active {
        return Err(AppError::Unauthorized(
            "principal is deactivated".to_owned(),
        ));
    }

    Ok(ActorIdentity::new(
        principal.id.as_uuid(),
        principal.display_name(),
        Some(principal.email.as_str().to_owned()),
        tenant_id,
    ))
}

pub async fn require_same_origin_for_mutations(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> ApiResult<Response> {
    if is_state_changing_method(request.method()) {
        check_mutation_origin(request.headers(), &state.frontend_url)?;
    }

    Ok(next.run(request).await)
}

fn check_mutation_origin(headers: &HeaderMap, allowed_origin: &str) -> Result<(), AppError> {
    if let Some(fetch_site) = headers.get("sec-fetch-site")
        && fetch_site == HeaderValue::from_static("cross-site")
    {
        return Err(AppError::Unauthorized("cross-site request blocked".to_owned()));
    }

    let origin = headers
        .get(header::ORIGIN)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default();
    let referer = headers
        .get(header::REFERER)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default();

    let origin_is_allowed = origin == allowed_origin;
    let referer_is_allowed = referer.starts_with(allowed_origin);

    if !origin_is_allowed && !referer_is_allowed {
        return Err(AppError::Unauthorized("origin validation failed".to_owned()));
    }

    Ok(())
}

fn is_state_changing_method(method: &Method) -> bool {
    matches!(
        *method,
        Method::POST | Method::PUT | Method::PATCH | Method::DELETE
    )
}

#[cfg(test)]
mod tests {
    use axum::http::{HeaderMap, HeaderValue, Method, header};

    use super::{check_mutation_origin, is_state_changing_method};

    const FRONTEND: &str = "http://localhost:3000";

    #[test]
    fn cross_site_fetch_is_blocked() {
        let mut headers = HeaderMap::new();
        headers.insert("sec-fetch-site", HeaderValue::from_static("cross-site"));
        headers.insert(header::ORIGIN, HeaderValue::from_static(FRONTEND));

        assert!(check_mutation_origin(&headers, FRONTEND).is_err());
    }

    #[test]
    fn matching_origin_is_allowed() {
        let mut headers = HeaderMap::new();
        headers.insert("sec-fetch-site", HeaderValue::from_static("same-origin"));
        headers.insert(header::ORIGIN, HeaderValue::from_static(FRONTEND));

        assert!(check_mutation_origin(&headers, FRONTEND).is_ok());
    }

    #[test]
    fn referer_prefix_is_allowed_without_origin() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::REFERER,
            HeaderValue::from_static("http://localhost:3000/dashboard/security"),
        );

        assert!(check_mutation_origin(&headers, FRONTEND).is_ok());
    }

    #[test]
    fn missing_origin_headers_are_blocked() {
        assert!(check_mutation_origin(&HeaderMap::new(), FRONTEND).is_err());
    }

    #[test]
    fn foreign_origin_is_blocked() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::ORIGIN,
            HeaderValue::from_static("http://evil.example"),
        );

        assert!(check_mutation_origin(&headers, FRONTEND).is_err());
    }

    #[test]
    fn only_mutating_methods_pass_the_origin_check() {
        assert!(is_state_changing_method(&Method::POST));
        assert!(is_state_changing_method(&Method::PATCH));
        assert!(is_state_changing_method(&Method::DELETE));
        assert!(!is_state_changing_method(&Method::GET));
        assert!(!is_state_changing_method(&Method::OPTIONS));
    }
}
