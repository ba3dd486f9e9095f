//! HTTP server setup and request handling.
//!
//! # Responsibilities
//! - Create the Axum router with the catch-all gateway handler
//! - Wire up middleware (request id, timeout, tracing)
//! - Extract request facts and drive the decision pipeline
//! - Relay the composition engine's response, attaching the CSP header
//! - Serve the per-domain error template (or the embedded fallback page)
//!   when the pipeline fails

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderValue, Request, StatusCode},
    response::{IntoResponse, Response},
    routing::any,
    Router,
};
use tokio::net::TcpListener;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::GatewayConfig;
use crate::guards::{GuardExecutor, GuardHook};
use crate::http::engine::{CompositionEngine, UpstreamEngine};
use crate::http::error::{PipelineError, FALLBACK_PAGE};
use crate::http::pipeline::{Decision, Pipeline, PipelineFailure, RequestFacts};
use crate::observability::metrics;
use crate::overrides::cookie::{cookie_value, LOCALE_COOKIE};
use crate::registry::client::RegistryClient;
use crate::registry::store::{RegistryStore, RegistryTtls, DEFAULT_LOCALE};
use crate::security::{CspBuilder, LogNotifier};

const ERROR_TEMPLATE: &str = "500";

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<Pipeline>,
    pub engine: Arc<dyn CompositionEngine>,
}

/// The gateway HTTP server.
pub struct GatewayServer {
    router: Router,
    config: GatewayConfig,
    store: Arc<RegistryStore>,
}

impl GatewayServer {
    /// Build the server and its subsystems from a validated config.
    pub fn new(
        config: GatewayConfig,
        hooks: Vec<Arc<dyn GuardHook>>,
    ) -> Result<Self, PipelineError> {
        let client = Arc::new(RegistryClient::new(
            &config.registry.url,
            config.registry.request_timeout(),
        )?);
        let store = Arc::new(RegistryStore::new(
            client,
            RegistryTtls {
                config: Duration::from_secs(config.registry.config_ttl_secs),
                template: Duration::from_secs(config.registry.template_ttl_secs),
                router_domains: Duration::from_secs(config.registry.router_domains_ttl_secs),
            },
        ));

        let csp = CspBuilder::new(
            config.security.trusted_local_hosts.clone(),
            Arc::new(LogNotifier),
        );
        let pipeline = Arc::new(Pipeline::new(
            Arc::clone(&store),
            GuardExecutor::new(hooks),
            csp,
        ));

        let engine_url = url::Url::parse(&config.engine.url)
            .map_err(|e| crate::registry::client::FetchError::InvalidUrl(e.to_string()))?;
        let engine = Arc::new(UpstreamEngine::new(
            engine_url,
            config.engine.request_timeout(),
        )?);

        let state = AppState {
            pipeline,
            engine,
        };
        let router = Self::build_router(&config, state);

        Ok(Self {
            router,
            config,
            store,
        })
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(config: &GatewayConfig, state: AppState) -> Router {
        Router::new()
            .route("/{*path}", any(gateway_handler))
            .route("/", any(gateway_handler))
            .with_state(state)
            .layer(TimeoutLayer::new(Duration::from_secs(
                config.listener.request_timeout_secs,
            )))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(TraceLayer::new_for_http())
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
    }

    /// Run the server, accepting connections on the given listener.
    pub async fn run(self, listener: TcpListener) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "gateway starting");

        if self.config.registry.preheat {
            let store = Arc::clone(&self.store);
            tokio::spawn(async move {
                store.preheat().await;
            });
        }

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        tracing::info!("gateway stopped");
        Ok(())
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }
}

/// Main gateway handler: pipeline decision, then compose or redirect.
async fn gateway_handler(
    State(state): State<AppState>,
    request: Request<Body>,
) -> Response {
    let start = Instant::now();
    let method = request.method().to_string();
    let facts = extract_facts(&request);

    tracing::debug!(
        host = %facts.host,
        path = %facts.path,
        "handling request"
    );

    let plan = match state.pipeline.prepare(&facts).await {
        Ok(Decision::Redirect {
            location,
            code,
            override_active,
        }) => {
            metrics::record_request(&method, code.as_u16(), "redirect", start, !override_active);
            return redirect_response(&location, code);
        }
        Ok(Decision::Compose(plan)) => plan,
        Err(failure) => {
            return error_response(&state, &facts, &method, start, failure).await;
        }
    };

    match state.engine.compose(&facts).await {
        Ok(engine_response) => {
            let mut builder = Response::builder().status(engine_response.status);
            let content_type = engine_response
                .content_type
                .as_deref()
                .unwrap_or("text/html; charset=utf-8");
            builder = builder.header(header::CONTENT_TYPE, content_type);
            if let Some((name, value)) = plan.csp_header {
                builder = builder.header(name, value);
            }

            metrics::record_request(
                &method,
                engine_response.status.as_u16(),
                "compose",
                start,
                !plan.override_active,
            );

            builder
                .body(Body::from(engine_response.body))
                .unwrap_or_else(|_| StatusCode::INTERNAL_SERVER_ERROR.into_response())
        }
        Err(error) => {
            let failure = PipelineFailure {
                error: PipelineError::Engine(error),
                override_active: plan.override_active,
            };
            error_response(&state, &facts, &method, start, failure).await
        }
    }
}

/// Pull the pipeline inputs out of the raw request.
fn extract_facts(request: &Request<Body>) -> RequestFacts {
    let headers = request.headers();
    let host = headers
        .get(header::HOST)
        .and_then(|v| v.to_str().ok())
        .map(ToString::to_string)
        .or_else(|| request.uri().host().map(ToString::to_string))
        .unwrap_or_default();

    // Override trust checks run against Origin, falling back to the
    // Referer host, then the request host.
    let origin = headers
        .get(header::ORIGIN)
        .and_then(|v| v.to_str().ok())
        .map(ToString::to_string)
        .or_else(|| {
            headers
                .get(header::REFERER)
                .and_then(|v| v.to_str().ok())
                .and_then(|referer| url::Url::parse(referer).ok())
                .and_then(|url| url.host_str().map(ToString::to_string))
        })
        .unwrap_or_else(|| host.clone());

    let cookie_header = headers
        .get(header::COOKIE)
        .and_then(|v| v.to_str().ok())
        .map(ToString::to_string);

    // The i18n layer resolves the locale ahead of the gateway and stores
    // it in a cookie; absence means the default locale.
    let locale = cookie_header
        .as_deref()
        .and_then(|cookies| cookie_value(cookies, LOCALE_COOKIE))
        .map(ToString::to_string);

    RequestFacts {
        host,
        path: request.uri().path().to_string(),
        query: request.uri().query().map(ToString::to_string),
        origin,
        cookie_header,
        locale,
        headers: headers.clone(),
    }
}

fn redirect_response(location: &str, code: StatusCode) -> Response {
    let value = HeaderValue::from_str(location)
        .unwrap_or_else(|_| HeaderValue::from_static("/"));
    Response::builder()
        .status(code)
        .header(header::LOCATION, value)
        .body(Body::empty())
        .unwrap_or_else(|_| StatusCode::INTERNAL_SERVER_ERROR.into_response())
}

/// Render the per-domain error template, or the embedded fallback page
/// when the registry itself is unreachable.
async fn error_response(
    state: &AppState,
    facts: &RequestFacts,
    method: &str,
    start: Instant,
    failure: PipelineFailure,
) -> Response {
    let error = failure.error;
    let status = error.status();
    tracing::error!(
        error = %error,
        status = status.as_u16(),
        path = %facts.path,
        "request failed"
    );
    metrics::record_request(
        method,
        status.as_u16(),
        error.outcome(),
        start,
        !failure.override_active,
    );

    let locale = facts.locale.as_deref().unwrap_or(DEFAULT_LOCALE);
    let body = if status.is_server_error() {
        match state
            .pipeline
            .store()
            .get_template(ERROR_TEMPLATE, locale, &facts.domain())
            .await
        {
            Ok(template) => template.content.clone(),
            Err(template_error) => {
                tracing::error!(error = %template_error, "error template unavailable, serving fallback page");
                FALLBACK_PAGE.to_string()
            }
        }
    } else {
        FALLBACK_PAGE.to_string()
    };

    Response::builder()
        .status(status)
        .header(header::CONTENT_TYPE, "text/html; charset=utf-8")
        .body(Body::from(body))
        .unwrap_or_else(|_| status.into_response())
}

/// Wait for shutdown signal (Ctrl+C).
async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("failed to install Ctrl+C handler");
    tracing::info!("shutdown signal received");
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(headers: &[(&str, &str)]) -> Request<Body> {
        let mut builder = Request::builder().uri("/news?page=2");
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        builder.body(Body::empty()).unwrap()
    }

    #[test]
    fn test_extract_facts_reads_locale_cookie() {
        let request = request(&[("host", "a.com"), ("cookie", "session=abc; lang=fr-FR")]);
        let facts = extract_facts(&request);
        assert_eq!(facts.locale.as_deref(), Some("fr-FR"));
        assert_eq!(facts.host, "a.com");
        assert_eq!(facts.path, "/news");
        assert_eq!(facts.query.as_deref(), Some("page=2"));
    }

    #[test]
    fn test_extract_facts_without_locale_cookie() {
        let facts = extract_facts(&request(&[("host", "a.com"), ("cookie", "session=abc")]));
        assert_eq!(facts.locale, None);

        let facts = extract_facts(&request(&[("host", "a.com")]));
        assert_eq!(facts.locale, None);
        assert_eq!(facts.cookie_header, None);
    }

    #[test]
    fn test_extract_facts_keeps_headers_for_guards() {
        let request = request(&[("host", "a.com"), ("x-forwarded-for", "10.0.0.1")]);
        let facts = extract_facts(&request);
        assert_eq!(
            facts.headers.get("x-forwarded-for").unwrap(),
            &HeaderValue::from_static("10.0.0.1")
        );
    }
}
