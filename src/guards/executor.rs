//! Sequential guard chain execution.
//!
//! # Responsibilities
//! - Run guard hooks in list order against the matched route
//! - Stop at the first redirect and validate its status code
//! - Wrap hook failures with the failing hook's index
//!
//! # Design Decisions
//! - Empty chain and special-role routes return "no redirect" with zero I/O

use std::sync::Arc;

use async_trait::async_trait;
use axum::http::{header, HeaderMap, StatusCode};
use serde_json::{Map, Value};

use crate::guards::outcome::GuardOutcome;
use crate::observability::metrics;
use crate::overrides::cookie::cookie_value;
use crate::routing::router::MatchedRoute;

/// Default status when a redirecting hook omits one.
const DEFAULT_REDIRECT_CODE: u16 = 302;

/// Error cause reported by a failing hook.
pub type HookError = Box<dyn std::error::Error + Send + Sync>;

/// Errors from guard chain execution.
#[derive(Debug, thiserror::Error)]
pub enum GuardError {
    /// A hook returned an error; later hooks were never invoked.
    #[error("guard hook {hook_index} failed: {cause}")]
    HookFailed {
        hook_index: usize,
        #[source]
        cause: HookError,
    },

    /// A hook redirected with a status outside the 300..=308 range.
    #[error("guard hook {hook_index} returned invalid redirect code {code}")]
    InvalidRedirectCode { hook_index: usize, code: u16 },
}

/// Context handed to each guard hook.
#[derive(Debug, Clone)]
pub struct GuardContext {
    /// Request URL (path plus query).
    pub url: String,
    /// Request hostname.
    pub hostname: String,
    /// Pattern of the matched route, when it has one.
    pub pattern: Option<String>,
    /// Metadata of the matched route.
    pub meta: Map<String, Value>,
    /// Inbound request headers, for auth checks and the like.
    pub headers: HeaderMap,
}

impl GuardContext {
    /// Value of a request cookie, when present.
    pub fn cookie(&self, name: &str) -> Option<&str> {
        let cookies = self.headers.get(header::COOKIE)?.to_str().ok()?;
        cookie_value(cookies, name)
    }
}

/// A single guard hook supplied by the embedding application.
#[async_trait]
pub trait GuardHook: Send + Sync {
    /// Inspect the navigation and decide its outcome.
    async fn call(&self, ctx: &GuardContext) -> Result<GuardOutcome, HookError>;
}

/// A redirect decided by the guard chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedirectDecision {
    /// Target location.
    pub location: String,
    /// Redirect status code.
    pub code: StatusCode,
}

/// Ordered guard chain.
#[derive(Default, Clone)]
pub struct GuardExecutor {
    hooks: Vec<Arc<dyn GuardHook>>,
}

impl GuardExecutor {
    /// Build an executor over an ordered hook list.
    pub fn new(hooks: Vec<Arc<dyn GuardHook>>) -> Self {
        Self { hooks }
    }

    /// Whether any hooks are registered.
    pub fn is_empty(&self) -> bool {
        self.hooks.is_empty()
    }

    /// Run the chain for a matched route.
    ///
    /// Returns `Ok(None)` when no hook redirected. Special-role routes skip
    /// the chain entirely: guards apply only to normal navigable routes.
    pub async fn run(
        &self,
        route: &MatchedRoute,
        ctx: &GuardContext,
    ) -> Result<Option<RedirectDecision>, GuardError> {
        if route.special_role.is_some() || self.hooks.is_empty() {
            return Ok(None);
        }

        for (hook_index, hook) in self.hooks.iter().enumerate() {
            let outcome = hook
                .call(ctx)
                .await
                .map_err(|cause| GuardError::HookFailed { hook_index, cause })?;

            match outcome {
                GuardOutcome::Continue | GuardOutcome::StopNavigation => continue,
                GuardOutcome::Redirect { new_location, code } => {
                    let code = code.unwrap_or(DEFAULT_REDIRECT_CODE);
                    if !(300..=308).contains(&code) {
                        return Err(GuardError::InvalidRedirectCode { hook_index, code });
                    }
                    let status = StatusCode::from_u16(code)
                        .map_err(|_| GuardError::InvalidRedirectCode { hook_index, code })?;
                    metrics::record_guard_redirect(code);
                    tracing::debug!(
                        hook_index,
                        location = %new_location,
                        code,
                        "guard hook redirected"
                    );
                    return Ok(Some(RedirectDecision {
                        location: new_location,
                        code: status,
                    }));
                }
            }
        }

        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    struct Recorded {
        outcome: GuardOutcome,
        calls: Arc<AtomicU32>,
    }

    #[async_trait]
    impl GuardHook for Recorded {
        async fn call(&self, _ctx: &GuardContext) -> Result<GuardOutcome, HookError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.outcome.clone())
        }
    }

    struct Failing {
        calls: Arc<AtomicU32>,
    }

    #[async_trait]
    impl GuardHook for Failing {
        async fn call(&self, _ctx: &GuardContext) -> Result<GuardOutcome, HookError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err("session backend unavailable".into())
        }
    }

    fn hook(outcome: GuardOutcome) -> (Arc<dyn GuardHook>, Arc<AtomicU32>) {
        let calls = Arc::new(AtomicU32::new(0));
        (
            Arc::new(Recorded {
                outcome,
                calls: calls.clone(),
            }),
            calls,
        )
    }

    fn ctx() -> GuardContext {
        GuardContext {
            url: "/account".to_string(),
            hostname: "example.com".to_string(),
            pattern: Some("/account".to_string()),
            meta: Map::new(),
            headers: HeaderMap::new(),
        }
    }

    fn navigable_route() -> MatchedRoute {
        MatchedRoute {
            route_id: Some(1),
            pattern: Some("/account".to_string()),
            template: None,
            slots: Default::default(),
            meta: Map::new(),
            special_role: None,
        }
    }

    #[tokio::test]
    async fn test_first_redirect_wins_and_stops_the_chain() {
        let (first, first_calls) = hook(GuardOutcome::Continue);
        let (second, second_calls) = hook(GuardOutcome::Redirect {
            new_location: "/login".to_string(),
            code: Some(302),
        });
        let (third, third_calls) = hook(GuardOutcome::Continue);

        let executor = GuardExecutor::new(vec![first, second, third]);
        let decision = executor.run(&navigable_route(), &ctx()).await.unwrap();

        assert_eq!(
            decision,
            Some(RedirectDecision {
                location: "/login".to_string(),
                code: StatusCode::FOUND,
            })
        );
        assert_eq!(first_calls.load(Ordering::SeqCst), 1);
        assert_eq!(second_calls.load(Ordering::SeqCst), 1);
        assert_eq!(third_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_hook_failure_carries_index_and_aborts() {
        let (first, _) = hook(GuardOutcome::Continue);
        let failing_calls = Arc::new(AtomicU32::new(0));
        let failing = Arc::new(Failing {
            calls: failing_calls.clone(),
        });
        let (third, third_calls) = hook(GuardOutcome::Continue);

        let executor = GuardExecutor::new(vec![first, failing, third]);
        let error = executor.run(&navigable_route(), &ctx()).await.unwrap_err();

        match error {
            GuardError::HookFailed { hook_index, cause } => {
                assert_eq!(hook_index, 1);
                assert_eq!(cause.to_string(), "session backend unavailable");
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(third_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_empty_chain_is_no_redirect() {
        let executor = GuardExecutor::default();
        let decision = executor.run(&navigable_route(), &ctx()).await.unwrap();
        assert_eq!(decision, None);
    }

    #[tokio::test]
    async fn test_special_role_routes_skip_hooks() {
        let (only, calls) = hook(GuardOutcome::Redirect {
            new_location: "/never".to_string(),
            code: None,
        });
        let executor = GuardExecutor::new(vec![only]);

        let mut route = navigable_route();
        route.special_role = Some("404".to_string());
        route.pattern = None;

        let decision = executor.run(&route, &ctx()).await.unwrap();
        assert_eq!(decision, None);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_default_redirect_code_is_302() {
        let (only, _) = hook(GuardOutcome::Redirect {
            new_location: "/login".to_string(),
            code: None,
        });
        let executor = GuardExecutor::new(vec![only]);
        let decision = executor.run(&navigable_route(), &ctx()).await.unwrap().unwrap();
        assert_eq!(decision.code, StatusCode::FOUND);
    }

    #[tokio::test]
    async fn test_invalid_redirect_code_is_a_protocol_error() {
        let (only, _) = hook(GuardOutcome::Redirect {
            new_location: "/teapot".to_string(),
            code: Some(418),
        });
        let executor = GuardExecutor::new(vec![only]);
        let error = executor.run(&navigable_route(), &ctx()).await.unwrap_err();
        match error {
            GuardError::InvalidRedirectCode { hook_index, code } => {
                assert_eq!(hook_index, 0);
                assert_eq!(code, 418);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_hooks_can_inspect_request_cookies() {
        struct SessionGuard;

        #[async_trait]
        impl GuardHook for SessionGuard {
            async fn call(&self, ctx: &GuardContext) -> Result<GuardOutcome, HookError> {
                match ctx.cookie("session") {
                    Some(_) => Ok(GuardOutcome::Continue),
                    None => Ok(GuardOutcome::Redirect {
                        new_location: "/login".to_string(),
                        code: None,
                    }),
                }
            }
        }

        let executor = GuardExecutor::new(vec![Arc::new(SessionGuard)]);

        let anonymous = ctx();
        let decision = executor.run(&navigable_route(), &anonymous).await.unwrap();
        assert_eq!(decision.unwrap().location, "/login");

        let mut authenticated = ctx();
        authenticated.headers.insert(
            header::COOKIE,
            axum::http::HeaderValue::from_static("lang=en-US; session=abc123"),
        );
        let decision = executor
            .run(&navigable_route(), &authenticated)
            .await
            .unwrap();
        assert_eq!(decision, None);
    }

    #[tokio::test]
    async fn test_stop_navigation_advances_like_continue() {
        let (first, _) = hook(GuardOutcome::StopNavigation);
        let (second, second_calls) = hook(GuardOutcome::Continue);
        let executor = GuardExecutor::new(vec![first, second]);

        let decision = executor.run(&navigable_route(), &ctx()).await.unwrap();
        assert_eq!(decision, None);
        assert_eq!(second_calls.load(Ordering::SeqCst), 1);
    }
}
