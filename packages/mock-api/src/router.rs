//! Matchit routing configuration.

use std::sync::Arc;
use std::time::Instant;

use hyper::{
    body::{Body, Bytes},
    Method, Request, Response,
};
use matchit::Router as MatchitRouter;

use crate::config::ApiConfig;
use crate::handlers::request_utils::{read_request_body_with_timeout, MatchitParams};
use crate::handlers::{
    create_record, database_snapshot, delete_record, for_resource, list_enrollments_of,
    list_records, merge_record, read_record, replace_record,
};
use crate::middleware;
use mock_store::{ResourceKind, Store};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Resource store
    pub store: Arc<Store>,
    /// HTTP layer configuration
    pub config: Arc<ApiConfig>,
}

/// HTTP request router.
pub struct Router {
    inner: MatchitRouter<RouteHandler>,
    state: AppState,
}

impl Router {
    /// Creates a new router with default routes.
    pub fn new(store: Arc<Store>, config: Arc<ApiConfig>) -> Self {
        let mut router = MatchitRouter::new();

        // Whole-database endpoint
        router
            .insert("/db", RouteHandler::Database)
            .expect("Failed to insert /db route");

        // Resource CRUD endpoints
        router
            .insert("/{resource}", RouteHandler::Collection)
            .expect("Failed to insert /{resource} route");
        router
            .insert("/{resource}/{id}", RouteHandler::Record)
            .expect("Failed to insert /{resource}/{id} route");

        // Nested child listing
        router
            .insert("/{resource}/{id}/{child}", RouteHandler::Nested)
            .expect("Failed to insert /{resource}/{id}/{child} route");

        Self {
            inner: router,
            state: AppState { store, config },
        }
    }

    /// Handles a request end to end: CORS, routing, error rendering, logging.
    ///
    /// Never fails; every error becomes a JSON error response.
    pub async fn respond<B>(&self, req: Request<B>) -> Response<Bytes>
    where
        B: Body,
        B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        let started = Instant::now();
        let method = req.method().clone();
        let path = req.uri().path().to_string();
        let config = &self.state.config;

        let mut response = if config.cors && method == Method::OPTIONS {
            middleware::preflight_response()
        } else {
            match self.route(req).await {
                Ok(response) => response,
                Err(err) => {
                    if let RouterError::InternalError(msg) = &err {
                        tracing::error!("Error handling {} {}: {}", method, path, msg);
                    }
                    err.into()
                }
            }
        };

        if config.cors {
            middleware::apply_cors(&mut response);
        }
        if config.log_requests {
            middleware::log_request(&method, &path, response.status(), started.elapsed());
        }
        response
    }

    /// Routes an incoming request to the appropriate handler.
    ///
    /// The body is read on the async task; the handler itself runs on the
    /// blocking pool since store calls take a lock and may rewrite the
    /// backing file.
    ///
    /// # Arguments
    /// * `req` - HTTP request
    ///
    /// # Returns
    /// `Result<Response<Bytes>, RouterError>` containing the response or an error.
    pub async fn route<B>(&self, req: Request<B>) -> Result<Response<Bytes>, RouterError>
    where
        B: Body,
        B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        let (parts, body) = req.into_parts();
        let path = parts.uri.path().to_string();

        // Match the route
        let matched = self
            .inner
            .at(&path)
            .map_err(|_| RouterError::NotFound(format!("No route found for {}", path)))?;
        let handler = *matched.value;
        let params = RouteParams::from_matchit(&matched.params);

        let config = &self.state.config;
        let body =
            read_request_body_with_timeout(body, config.request_timeout_ms, config.max_body_bytes)
                .await?;

        let state = self.state.clone();
        let method = parts.method;
        let query = parts.uri.query().map(str::to_string);
        tokio::task::spawn_blocking(move || {
            handler.handle(&method, &path, &params, query.as_deref(), &body, &state)
        })
        .await
        .map_err(|e| RouterError::InternalError(format!("Handler task failed: {}", e)))?
    }
}

/// Route parameters copied out of a match so they can cross into the
/// blocking pool.
struct RouteParams(Vec<(String, String)>);

impl RouteParams {
    fn from_matchit(params: &MatchitParams<'_, '_>) -> Self {
        Self(
            params
                .iter()
                .map(|(key, value)| (key.to_string(), value.to_string()))
                .collect(),
        )
    }

    fn get(&self, key: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// Route handler function.
#[derive(Debug, Clone, Copy)]
enum RouteHandler {
    Database,
    Collection,
    Record,
    Nested,
}

/// Resolves the `{resource}` segment; unknown names are plain 404s.
fn resource_param(params: &RouteParams, path: &str) -> Result<ResourceKind, RouterError> {
    params
        .get("resource")
        .and_then(|name| name.parse().ok())
        .ok_or_else(|| RouterError::NotFound(format!("No route found for {}", path)))
}

impl RouteHandler {
    /// Handles a request with the given route parameters.
    fn handle(
        &self,
        method: &Method,
        path: &str,
        params: &RouteParams,
        query: Option<&str>,
        body: &Bytes,
        state: &AppState,
    ) -> Result<Response<Bytes>, RouterError> {
        match self {
            RouteHandler::Database => {
                if method == Method::GET {
                    database_snapshot(state)
                } else {
                    Err(RouterError::MethodNotAllowed)
                }
            }
            RouteHandler::Collection => {
                let kind = resource_param(params, path)?;
                if method == Method::GET {
                    for_resource!(kind, list_records(state, query))
                } else if method == Method::POST {
                    for_resource!(kind, create_record(state, body))
                } else {
                    Err(RouterError::MethodNotAllowed)
                }
            }
            RouteHandler::Record => {
                let kind = resource_param(params, path)?;
                let id = params.get("id").unwrap_or_default();
                if method == Method::GET {
                    for_resource!(kind, read_record(state, id))
                } else if method == Method::PUT {
                    for_resource!(kind, replace_record(state, id, body))
                } else if method == Method::PATCH {
                    for_resource!(kind, merge_record(state, id, body))
                } else if method == Method::DELETE {
                    for_resource!(kind, delete_record(state, id))
                } else {
                    Err(RouterError::MethodNotAllowed)
                }
            }
            RouteHandler::Nested => {
                let kind = resource_param(params, path)?;
                let id = params.get("id").unwrap_or_default();
                if params.get("child") != Some(ResourceKind::Enrollments.as_str()) {
                    return Err(RouterError::NotFound(format!("No route found for {}", path)));
                }
                if method == Method::GET {
                    list_enrollments_of(state, kind, id, query)
                } else {
                    Err(RouterError::MethodNotAllowed)
                }
            }
        }
    }
}

/// Router error type.
#[derive(Debug)]
pub enum RouterError {
    MethodNotAllowed,
    InternalError(String),
    Timeout,
    BadRequest {
        field: Option<String>,
        message: String,
    },
    NotFound(String),
    Conflict(String),
    PayloadTooLarge(usize),
}

impl RouterError {
    /// HTTP status for this error.
    pub fn status(&self) -> u16 {
        match self {
            RouterError::MethodNotAllowed => 405,
            RouterError::InternalError(_) => 500,
            RouterError::Timeout => 408,
            RouterError::BadRequest { .. } => 400,
            RouterError::NotFound(_) => 404,
            RouterError::Conflict(_) => 409,
            RouterError::PayloadTooLarge(_) => 413,
        }
    }
}

impl std::fmt::Display for RouterError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RouterError::MethodNotAllowed => write!(f, "Method Not Allowed"),
            RouterError::InternalError(msg) => write!(f, "Internal Error: {}", msg),
            RouterError::Timeout => write!(f, "Request Timeout"),
            RouterError::BadRequest { message, .. } => write!(f, "Bad Request: {}", message),
            RouterError::NotFound(msg) => write!(f, "Not Found: {}", msg),
            RouterError::Conflict(msg) => write!(f, "Conflict: {}", msg),
            RouterError::PayloadTooLarge(limit) => {
                write!(f, "Payload Too Large: body exceeds {} bytes", limit)
            }
        }
    }
}

impl std::error::Error for RouterError {}

impl From<RouterError> for Response<Bytes> {
    fn from(err: RouterError) -> Self {
        let status = err.status();
        let (message, field) = match err {
            RouterError::MethodNotAllowed => ("Method Not Allowed".to_string(), None),
            RouterError::Timeout => ("Request Timeout".to_string(), None),
            RouterError::InternalError(msg)
            | RouterError::NotFound(msg)
            | RouterError::Conflict(msg) => (msg, None),
            RouterError::BadRequest { field, message } => (message, field),
            RouterError::PayloadTooLarge(limit) => {
                (format!("Request body exceeds {} bytes", limit), None)
            }
        };

        let error_response = crate::handlers::error_response(status, message, field);
        let body = serde_json::to_vec(&error_response).unwrap_or_else(|e| {
            format!(
                "{{\"error\":\"Failed to serialize error: {}\",\"status\":500}}",
                e
            )
            .into_bytes()
        });

        Response::builder()
            .status(status)
            .header("Content-Type", "application/json")
            .body(Bytes::from(body))
            .unwrap_or_else(|_| {
                let mut fallback = Response::new(Bytes::from_static(b"Internal Server Error"));
                *fallback.status_mut() = hyper::StatusCode::INTERNAL_SERVER_ERROR;
                fallback
            })
    }
}
