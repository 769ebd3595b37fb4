//! The built route table and route lookup.
//!
//! [`RouteTable`] is the immutable product of registration: routes sorted
//! globally so that literal segments outrank captures at the same
//! position, each carrying its compiled pattern, metadata, and an erased
//! handler closure. Lookup walks the sorted list; the first pattern that
//! matches both path and method wins.

use std::sync::Arc;

use weft_core::{BoxFuture, HttpError, HttpExchange, Method, Response, RouteMeta};

use crate::pattern::PathPattern;

/// The erased per-route handler: binding plus handler plus decorators,
/// already folded into one closure at registration.
pub type RouteHandler =
    Arc<dyn Fn(&HttpExchange) -> BoxFuture<Result<Response, HttpError>> + Send + Sync>;

/// One registered route.
#[derive(Clone)]
pub struct Route {
    method: Method,
    pattern: PathPattern,
    meta: RouteMeta,
    handler: RouteHandler,
}

impl Route {
    /// Create a route. Registration calls this once per handler.
    #[must_use]
    pub fn new(method: Method, pattern: PathPattern, meta: RouteMeta, handler: RouteHandler) -> Self {
        Self {
            method,
            pattern,
            meta,
            handler,
        }
    }

    /// The route's method.
    #[must_use]
    pub fn method(&self) -> Method {
        self.method
    }

    /// The compiled path pattern.
    #[must_use]
    pub fn pattern(&self) -> &PathPattern {
        &self.pattern
    }

    /// The route's metadata.
    #[must_use]
    pub fn meta(&self) -> &RouteMeta {
        &self.meta
    }

    /// The erased handler.
    #[must_use]
    pub fn handler(&self) -> &RouteHandler {
        &self.handler
    }
}

impl std::fmt::Debug for Route {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Route")
            .field("method", &self.method)
            .field("template", &self.pattern.template())
            .field("name", &self.meta.name())
            .finish_non_exhaustive()
    }
}

/// A matched route with its captured parameters.
#[derive(Debug)]
pub struct RouteMatch<'a> {
    /// The matched route.
    pub route: &'a Route,
    /// Captured path parameters, already percent-decoded.
    pub params: Vec<(String, String)>,
}

/// Result of attempting to locate a route by path and method.
#[derive(Debug)]
pub enum RouteLookup<'a> {
    /// A route matched by path and method.
    Match(RouteMatch<'a>),
    /// Path matched at least one route, but none with this method.
    MethodNotAllowed { allowed: AllowedMethods },
    /// No route matched the path.
    NotFound,
}

/// Allowed methods for a matched path.
#[derive(Debug, Clone)]
pub struct AllowedMethods {
    methods: Vec<Method>,
}

impl AllowedMethods {
    /// Create a normalized allow list.
    ///
    /// - Adds `HEAD` if `GET` is present.
    /// - Sorts and de-duplicates for stable output.
    #[must_use]
    pub fn new(mut methods: Vec<Method>) -> Self {
        if methods.contains(&Method::Get) && !methods.contains(&Method::Head) {
            methods.push(Method::Head);
        }
        methods.sort_by_key(method_order);
        methods.dedup();
        Self { methods }
    }

    /// Access the normalized methods.
    #[must_use]
    pub fn methods(&self) -> &[Method] {
        &self.methods
    }

    /// Check whether a method is allowed.
    #[must_use]
    pub fn contains(&self, method: Method) -> bool {
        self.methods.contains(&method)
    }

    /// Format as an HTTP Allow header value.
    #[must_use]
    pub fn header_value(&self) -> String {
        let mut out = String::new();
        for (idx, method) in self.methods.iter().enumerate() {
            if idx > 0 {
                out.push_str(", ");
            }
            out.push_str(method.as_str());
        }
        out
    }
}

fn method_order(method: &Method) -> u8 {
    match *method {
        Method::Get => 0,
        Method::Head => 1,
        Method::Post => 2,
        Method::Put => 3,
        Method::Delete => 4,
        Method::Patch => 5,
        Method::Options => 6,
        Method::Trace => 7,
    }
}

/// The immutable table dispatch runs against.
#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    routes: Vec<Route>,
}

impl RouteTable {
    /// Build the table from registered routes.
    ///
    /// Sorts globally by the patterns' sort keys so more specific
    /// templates win ties; the sort is stable, so registration order
    /// breaks any remaining ties.
    #[must_use]
    pub fn build(mut routes: Vec<Route>) -> Self {
        routes.sort_by_cached_key(|route| route.pattern.sort_key());
        Self { routes }
    }

    /// All routes in match order.
    #[must_use]
    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    /// Look up a route by path and method.
    #[must_use]
    pub fn find(&self, method: Method, path: &str) -> RouteLookup<'_> {
        let mut allowed = Vec::new();
        for route in &self.routes {
            let Some(params) = route.pattern.match_path(path) else {
                continue;
            };
            if route.method == method {
                return RouteLookup::Match(RouteMatch { route, params });
            }
            allowed.push(route.method);
        }
        if allowed.is_empty() {
            RouteLookup::NotFound
        } else {
            RouteLookup::MethodNotAllowed {
                allowed: AllowedMethods::new(allowed),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use weft_core::StatusCode;

    fn route(method: Method, template: &str) -> Route {
        let handler: RouteHandler = Arc::new(move |_| {
            Box::pin(async { Ok(Response::status(StatusCode::OK)) })
        });
        Route::new(
            method,
            PathPattern::compile(template).unwrap(),
            RouteMeta::new(template.to_owned(), Vec::new()),
            handler,
        )
    }

    #[test]
    fn literal_template_beats_capture() {
        let table = RouteTable::build(vec![
            route(Method::Get, "/users/:id"),
            route(Method::Get, "/users/me"),
        ]);
        match table.find(Method::Get, "/users/me") {
            RouteLookup::Match(m) => {
                assert_eq!(m.route.pattern().template(), "/users/me");
                assert!(m.params.is_empty());
            }
            other => panic!("expected match, got {other:?}"),
        }
        match table.find(Method::Get, "/users/42") {
            RouteLookup::Match(m) => {
                assert_eq!(m.route.pattern().template(), "/users/:id");
                assert_eq!(m.params, vec![("id".to_owned(), "42".to_owned())]);
            }
            other => panic!("expected match, got {other:?}"),
        }
    }

    #[test]
    fn method_not_allowed_collects_methods() {
        let table = RouteTable::build(vec![
            route(Method::Get, "/items"),
            route(Method::Post, "/items"),
        ]);
        match table.find(Method::Delete, "/items") {
            RouteLookup::MethodNotAllowed { allowed } => {
                assert!(allowed.contains(Method::Get));
                assert!(allowed.contains(Method::Post));
                assert_eq!(allowed.header_value(), "GET, HEAD, POST");
            }
            other => panic!("expected method-not-allowed, got {other:?}"),
        }
    }

    #[test]
    fn not_found_when_no_pattern_matches() {
        let table = RouteTable::build(vec![route(Method::Get, "/items")]);
        assert!(matches!(
            table.find(Method::Get, "/missing"),
            RouteLookup::NotFound
        ));
    }

    #[test]
    fn registration_order_breaks_ties() {
        let handler: RouteHandler =
            Arc::new(|_| Box::pin(async { Ok(Response::ok()) }));
        let make = |name: &str| {
            Route::new(
                Method::Get,
                PathPattern::compile("/a/:x").unwrap(),
                RouteMeta::new(name.to_owned(), Vec::new()),
                Arc::clone(&handler),
            )
        };
        let table = RouteTable::build(vec![make("first"), make("second")]);
        match table.find(Method::Get, "/a/1") {
            RouteLookup::Match(m) => assert_eq!(m.route.meta().name(), "first"),
            other => panic!("expected match, got {other:?}"),
        }
    }
}
