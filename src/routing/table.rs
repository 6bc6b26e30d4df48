//! Compiled routing table.
//!
//! # Responsibilities
//! - Compile a registry snapshot into matchers
//! - Look up the route for a request
//! - Return the matched route or explicit no-match
//!
//! # Design Decisions
//! - Immutable after construction (shared via `Arc`, no locks)
//! - O(n) scan in registration order, first match wins
//! - Routes that fail to compile are skipped with a warning

use axum::http::Method;

use crate::routing::matcher::{Matches, MethodMatcher, PathPattern};
use crate::routing::route::Route;

#[derive(Debug)]
struct CompiledRoute {
    route: Route,
    method: MethodMatcher,
    pattern: PathPattern,
}

/// A matched route together with its captured segments.
#[derive(Debug, Clone, Default)]
pub struct RouteMatch {
    pub route: Route,
    pub matches: Matches,
}

/// Immutable lookup structure built from a route snapshot.
#[derive(Debug, Default)]
pub struct RoutingTable {
    routes: Vec<CompiledRoute>,
    generation: u64,
}

impl RoutingTable {
    /// A table that matches nothing.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Compile routes in the order given.
    pub fn build(routes: Vec<Route>) -> Self {
        Self::with_generation(routes, 0)
    }

    /// Compile routes and tag the table with the registry generation.
    pub fn with_generation(routes: Vec<Route>, generation: u64) -> Self {
        let routes = routes
            .into_iter()
            .filter_map(|route| match PathPattern::parse(&route.pattern) {
                Ok(pattern) => Some(CompiledRoute {
                    method: MethodMatcher::new(route.method.clone()),
                    pattern,
                    route,
                }),
                Err(e) => {
                    tracing::warn!(route_id = %route.id, pattern = %route.pattern, error = %e, "Skipping route with invalid pattern");
                    None
                }
            })
            .collect();

        Self { routes, generation }
    }

    /// First route whose method and pattern match.
    pub fn find(&self, method: &Method, path: &str) -> Option<RouteMatch> {
        self.routes.iter().find_map(|compiled| {
            if !compiled.method.matches(method) {
                return None;
            }
            compiled.pattern.captures(path).map(|matches| RouteMatch {
                route: compiled.route.clone(),
                matches,
            })
        })
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn route(id: &str, method: &str, pattern: &str) -> Route {
        Route {
            id: id.into(),
            ..Route::new(method, pattern, "")
        }
    }

    #[test]
    fn empty_table_matches_nothing() {
        assert!(RoutingTable::empty().find(&Method::GET, "/").is_none());
    }

    #[test]
    fn first_registered_route_wins() {
        let table = RoutingTable::build(vec![
            route("a", "GET", "/foo/{bar}"),
            route("b", "GET", "/foo/baz"),
        ]);

        let matched = table.find(&Method::GET, "/foo/baz").unwrap();
        assert_eq!(matched.route.id, "a");
        assert_eq!(matched.matches.get("bar").map(String::as_str), Some("baz"));
    }

    #[test]
    fn method_must_match() {
        let table = RoutingTable::build(vec![
            route("a", "POST", "/foo"),
            route("b", "GET", "/foo"),
        ]);

        assert_eq!(table.find(&Method::GET, "/foo").unwrap().route.id, "b");
        assert!(table.find(&Method::DELETE, "/foo").is_none());
    }

    #[test]
    fn invalid_patterns_are_skipped() {
        let table = RoutingTable::build(vec![
            route("bad", "GET", "/{oops"),
            route("good", "GET", "/ok"),
        ]);
        assert_eq!(table.len(), 1);
        assert!(table.find(&Method::GET, "/ok").is_some());
    }
}
