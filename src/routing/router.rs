//! Route selection.
//!
//! # Responsibilities
//! - Select exactly one route for a normalized, unlocalized path
//! - Apply precedence: exact literal > most specific wildcard > 404 special role
//! - Break ties within a tier by ascending order position
//!
//! # Design Decisions
//! - Works on an already-resolved config; no I/O
//! - Explicit `None` when nothing matches and no 404 route exists

use std::collections::HashMap;

use serde_json::{Map, Value};

use crate::registry::schema::{ResolvedConfig, Route, SlotConfig};
use crate::routing::matcher::RoutePattern;

/// Special role used as the last-resort fallback route.
pub const NOT_FOUND_ROLE: &str = "404";

/// The route selected for a request.
#[derive(Debug, Clone)]
pub struct MatchedRoute {
    /// Registry id of the matched route, when it has one.
    pub route_id: Option<i64>,
    /// The pattern that matched; `None` for special-role routes.
    pub pattern: Option<String>,
    /// Template the composition engine should render.
    pub template: Option<String>,
    /// Slot bindings for the template.
    pub slots: HashMap<String, SlotConfig>,
    /// Free-form route metadata, passed to guard hooks.
    pub meta: Map<String, Value>,
    /// Set when the route was selected by role rather than pattern.
    pub special_role: Option<String>,
}

impl MatchedRoute {
    fn from_route(route: &Route) -> Self {
        Self {
            route_id: Some(route.id),
            pattern: Some(route.pattern.clone()),
            template: route.template.clone(),
            slots: route.slots.clone(),
            meta: route.meta.clone(),
            special_role: None,
        }
    }

    fn from_special(role: &str, route: &Route) -> Self {
        Self {
            route_id: Some(route.id),
            pattern: None,
            template: route.template.clone(),
            slots: route.slots.clone(),
            meta: route.meta.clone(),
            special_role: Some(role.to_string()),
        }
    }
}

/// Select one route for the given path.
///
/// Precedence: exact literal match, then the most specific wildcard match,
/// then the `404` special-role route. Within a tier the lowest `order_pos`
/// wins. Returns `None` only when nothing matches and no 404 route is
/// configured.
pub fn resolve_route(config: &ResolvedConfig, path: &str) -> Option<MatchedRoute> {
    let mut exact: Option<&Route> = None;
    let mut wildcard: Option<(&Route, usize)> = None;

    for route in &config.routes {
        let pattern = RoutePattern::parse(&route.pattern);
        if !pattern.matches(path) {
            continue;
        }
        if pattern.is_wildcard() {
            let specificity = pattern.specificity();
            let better = match wildcard {
                None => true,
                Some((current, current_specificity)) => {
                    specificity > current_specificity
                        || (specificity == current_specificity
                            && route.order_pos < current.order_pos)
                }
            };
            if better {
                wildcard = Some((route, specificity));
            }
        } else {
            let better = match exact {
                None => true,
                Some(current) => route.order_pos < current.order_pos,
            };
            if better {
                exact = Some(route);
            }
        }
    }

    if let Some(route) = exact {
        return Some(MatchedRoute::from_route(route));
    }
    if let Some((route, _)) = wildcard {
        return Some(MatchedRoute::from_route(route));
    }
    config
        .special_routes
        .get(NOT_FOUND_ROLE)
        .map(|route| MatchedRoute::from_special(NOT_FOUND_ROLE, route))
}
