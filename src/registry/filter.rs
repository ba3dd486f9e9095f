//! Per-domain scoping of the raw registry configuration.
//!
//! # Responsibilities
//! - Select the route set for a domain (domain-specific replaces defaults)
//! - Transform the special-route array into a role-keyed map
//! - Filter apps to those relevant for the domain
//!
//! # Design Decisions
//! - Domain-specific and default sets are never merged: if any route
//!   carries the request domain, the whole default set is discarded
//! - Filtering is a pure function and idempotent per domain

use std::collections::{HashMap, HashSet};

use crate::registry::schema::{
    AppConfig, RegistryConfig, ResolvedConfig, Route, SpecialRoute,
};

/// Resolve the raw configuration for one domain.
pub fn filter_for_domain(raw: &RegistryConfig, domain: Option<&str>) -> ResolvedConfig {
    let routes = select_routes(&raw.routes, domain);
    let special_routes = select_special_routes(&raw.special_routes, domain);
    let apps = select_apps(raw, &routes, &special_routes, domain);

    ResolvedConfig {
        apps,
        routes,
        special_routes,
        shared_libs: raw.shared_libs.clone(),
        dynamic_libs: raw.dynamic_libs.clone(),
        settings: raw.settings.clone(),
    }
}

/// Select the navigable routes for a domain, ordered by position.
///
/// Routes without a domain are the defaults; if any route's domain equals
/// the request domain, the domain-specific set replaces the defaults.
pub fn select_routes(routes: &[Route], domain: Option<&str>) -> Vec<Route> {
    let domain_specific: Vec<&Route> = match domain {
        Some(d) => routes
            .iter()
            .filter(|r| r.domain.as_deref() == Some(d))
            .collect(),
        None => Vec::new(),
    };

    let mut selected: Vec<Route> = if domain_specific.is_empty() {
        routes
            .iter()
            .filter(|r| r.domain.is_none())
            .cloned()
            .collect()
    } else {
        domain_specific.into_iter().cloned().collect()
    };

    selected.sort_by_key(|r| r.order_pos);
    selected
}

/// Transform the special-route array into a role-keyed map using the same
/// replace-or-default rule, stripping domain and role from the output.
pub fn select_special_routes(
    special: &[SpecialRoute],
    domain: Option<&str>,
) -> HashMap<String, Route> {
    let has_domain_specific = domain
        .map(|d| special.iter().any(|r| r.domain.as_deref() == Some(d)))
        .unwrap_or(false);

    special
        .iter()
        .filter(|r| {
            if has_domain_specific {
                r.domain.as_deref() == domain
            } else {
                r.domain.is_none()
            }
        })
        .map(|r| {
            (
                r.special_role.clone(),
                Route {
                    id: r.id,
                    pattern: String::new(),
                    next: false,
                    template: r.template.clone(),
                    slots: r.slots.clone(),
                    meta: r.meta.clone(),
                    order_pos: 0,
                    domain: None,
                },
            )
        })
        .collect()
}

/// Filter apps to the union of: apps referenced by the domain-relevant
/// route set, apps referenced by no route at all (orphans), and apps whose
/// `enforce_domain` equals the current domain. Apps enforced onto another
/// domain are excluded entirely. Wrappers of included apps are pulled in
/// so wrapped apps stay renderable.
fn select_apps(
    raw: &RegistryConfig,
    routes: &[Route],
    special_routes: &HashMap<String, Route>,
    domain: Option<&str>,
) -> HashMap<String, AppConfig> {
    let mut referenced_anywhere: HashSet<&str> = HashSet::new();
    for route in &raw.routes {
        referenced_anywhere.extend(route.slots.values().map(|s| s.app_name.as_str()));
    }
    for route in &raw.special_routes {
        referenced_anywhere.extend(route.slots.values().map(|s| s.app_name.as_str()));
    }

    let mut relevant: HashSet<&str> = HashSet::new();
    for route in routes {
        relevant.extend(route.slots.values().map(|s| s.app_name.as_str()));
    }
    for route in special_routes.values() {
        relevant.extend(route.slots.values().map(|s| s.app_name.as_str()));
    }

    let included = |name: &str, app: &AppConfig| -> bool {
        if let Some(enforced) = app.enforce_domain.as_deref() {
            return Some(enforced) == domain;
        }
        relevant.contains(name) || !referenced_anywhere.contains(name)
    };

    let mut selected: HashMap<String, AppConfig> = raw
        .apps
        .iter()
        .filter(|(name, app)| included(name, app))
        .map(|(name, app)| (name.clone(), strip_enforce_domain(app)))
        .collect();

    // Pull in wrappers of included apps so wrapped apps stay renderable.
    let mut queue: Vec<String> = selected
        .values()
        .filter_map(|app| app.wrapped_with.clone())
        .collect();
    let mut seen: HashSet<String> = queue.iter().cloned().collect();
    while let Some(wrapper) = queue.pop() {
        if selected.contains_key(&wrapper) {
            continue;
        }
        if let Some(app) = raw.apps.get(&wrapper) {
            if app.enforce_domain.is_none() || app.enforce_domain.as_deref() == domain {
                if let Some(next) = app.wrapped_with.clone() {
                    if seen.insert(next.clone()) {
                        queue.push(next);
                    }
                }
                selected.insert(wrapper, strip_enforce_domain(app));
            }
        }
    }

    selected
}

fn strip_enforce_domain(app: &AppConfig) -> AppConfig {
    AppConfig {
        enforce_domain: None,
        ..app.clone()
    }
}
