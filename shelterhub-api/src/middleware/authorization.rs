/// Authorization gate layer
///
/// Mounted per route with `route_layer`, after routing, so the matched path
/// parameters are available. Builds a [`RequestView`] of the request and
/// runs the gate for the route's [`Operation`]:
///
/// - path parameters as matched by the router
/// - query string parameters
/// - the JSON body, buffered up to the configured limit and handed on to
///   the handler unchanged
///
/// Multipart and binary bodies are never read here; they stay with the
/// handler, so routes that accept them must carry the shelter id in the
/// path or the query string.
///
/// On success the [`Grant`](shelterhub_shared::auth::gate::Grant) is stored
/// in the request extensions.

use axum::{
    body::Body,
    extract::{OriginalUri, Query, RawPathParams, Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use shelterhub_shared::auth::extractor::{is_streamed_content_type, RequestView};
use shelterhub_shared::auth::gate::{authorize, require_shelter_admin};
use shelterhub_shared::auth::middleware::AuthContext;
use std::collections::HashMap;
use tracing::debug;

use crate::app::AppState;
use crate::error::ApiError;
use crate::routes::policy::{Access, Operation};

/// State handed to [`guard`]: the app plus the operation being guarded
#[derive(Clone)]
pub struct GuardState {
    pub app: AppState,
    pub operation: Operation,
}

impl GuardState {
    pub fn new(app: &AppState, operation: Operation) -> Self {
        Self {
            app: app.clone(),
            operation,
        }
    }
}

/// Gate middleware
pub async fn guard(
    State(guard): State<GuardState>,
    principal: Option<AuthContext>,
    path_params: RawPathParams,
    req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let limit = guard.app.config.api.body_limit_bytes;
    let (view, mut req) = request_view(req, &path_params, limit).await?;

    let store = guard.app.store.as_ref();
    let metrics = guard.app.metrics.as_ref();
    let principal = principal.as_ref();

    match guard.operation.access() {
        Access::Module(requirement) => {
            let grant = authorize(store, principal, requirement, &view, metrics).await?;
            debug!(operation = ?guard.operation, grant = ?grant, "Request authorized");
            req.extensions_mut().insert(grant);
        }
        Access::ShelterAdmin => {
            require_shelter_admin(store, principal, &view, metrics).await?;
            debug!(operation = ?guard.operation, "Shelter admin authorized");
        }
    }

    Ok(next.run(req).await)
}

fn is_json(content_type: &str) -> bool {
    let essence = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    essence == "application/json" || essence.ends_with("+json")
}

/// Snapshot of the request for the gate; returns the request with its body intact
async fn request_view(
    req: Request,
    path_params: &RawPathParams,
    body_limit: usize,
) -> Result<(RequestView, Request), ApiError> {
    // nested routers see the path with their prefix stripped
    let path = req
        .extensions()
        .get::<OriginalUri>()
        .map(|uri| uri.0.path().to_string())
        .unwrap_or_else(|| req.uri().path().to_string());
    let mut view = RequestView::new(path);

    for (name, value) in path_params {
        view = view.with_path_param(name, value);
    }

    if let Ok(Query(query)) = Query::<HashMap<String, String>>::try_from_uri(req.uri()) {
        for (name, value) in query {
            view = view.with_query_param(&name, value);
        }
    }

    let content_type = req
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    let Some(content_type) = content_type else {
        return Ok((view, req));
    };
    view = view.with_content_type(content_type.clone());

    if is_streamed_content_type(&content_type) || !is_json(&content_type) {
        return Ok((view, req));
    }

    let (parts, body) = req.into_parts();
    let bytes = axum::body::to_bytes(body, body_limit).await.map_err(|_| {
        ApiError::PayloadTooLarge(format!("Request body exceeds {} bytes", body_limit))
    })?;

    // handlers report malformed JSON themselves
    if let Ok(value) = serde_json::from_slice::<serde_json::Value>(&bytes) {
        view = view.with_json_body(value);
    }

    Ok((view, Request::from_parts(parts, Body::from(bytes))))
}
