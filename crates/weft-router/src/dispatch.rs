//! Request dispatch against a built route table.
//!
//! The dispatcher looks up the route, records the match on the exchange
//! (captured parameters and route metadata), passes a cancellation
//! checkpoint, and runs the decorated handler. It never builds error
//! responses itself; callers turn a [`DispatchOutcome`] into a response
//! through an [`ErrorMapper`].

use weft_core::{
    CancelledError, HttpError, HttpExchange, Response, StatusCode, logging,
};

use crate::table::{AllowedMethods, RouteLookup, RouteTable};

/// What dispatching one request produced.
#[derive(Debug)]
pub enum DispatchOutcome {
    /// The handler produced a response.
    Response(Response),
    /// The handler (or binding, or a hook) failed.
    Error(HttpError),
    /// No route matched the path.
    NotFound,
    /// The path matched but not the method.
    MethodNotAllowed(AllowedMethods),
}

impl DispatchOutcome {
    /// Turn the outcome into a response, mapping failures through
    /// `mapper`. A method-not-allowed outcome carries its `allow` header.
    #[must_use]
    pub fn into_response(self, mapper: &dyn ErrorMapper, exchange: &HttpExchange) -> Response {
        match self {
            Self::Response(response) => response,
            Self::Error(err) => mapper.map(exchange, &err),
            Self::NotFound => mapper.map(exchange, &HttpError::not_found()),
            Self::MethodNotAllowed(allowed) => {
                let err = HttpError::method_not_allowed();
                mapper.map(exchange, &err).header("allow", allowed.header_value())
            }
        }
    }

    /// The status this outcome will produce, before error mapping.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Response(response) => response.status_code(),
            Self::Error(err) => err.status,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::MethodNotAllowed(_) => StatusCode::METHOD_NOT_ALLOWED,
        }
    }
}

/// Maps request failures to responses at the dispatch boundary.
pub trait ErrorMapper: Send + Sync {
    /// Build the response for a failed request.
    fn map(&self, exchange: &HttpExchange, err: &HttpError) -> Response;
}

/// The stock mapper: a JSON body with a single `error` field.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultErrorMapper;

impl ErrorMapper for DefaultErrorMapper {
    fn map(&self, _exchange: &HttpExchange, err: &HttpError) -> Response {
        let message = err
            .detail
            .clone()
            .unwrap_or_else(|| err.status.canonical_reason().to_owned());
        let body = serde_json::json!({ "error": message });
        match Response::status(err.status).body_json(&body) {
            Ok(response) => response,
            Err(_) => Response::status(err.status).body_text(message),
        }
    }
}

/// Runs requests against a built [`RouteTable`].
#[derive(Debug, Clone)]
pub struct Dispatcher {
    table: RouteTable,
}

impl Dispatcher {
    /// A dispatcher over the given table.
    #[must_use]
    pub fn new(table: RouteTable) -> Self {
        Self { table }
    }

    /// The underlying table.
    #[must_use]
    pub fn table(&self) -> &RouteTable {
        &self.table
    }

    /// Dispatch one request.
    ///
    /// On a match the exchange learns its captured path parameters and
    /// route metadata before any hook runs. A cancellation requested
    /// before the handler starts yields a 499 error outcome.
    pub async fn dispatch(&self, exchange: &HttpExchange) -> DispatchOutcome {
        let (route, params) = match self.table.find(exchange.method(), exchange.path()) {
            RouteLookup::Match(m) => (m.route, m.params),
            RouteLookup::MethodNotAllowed { allowed } => {
                return DispatchOutcome::MethodNotAllowed(allowed);
            }
            RouteLookup::NotFound => return DispatchOutcome::NotFound,
        };
        exchange.set_path_params(params);
        exchange.set_route(route.meta().clone());

        if exchange.context().checkpoint().is_err() {
            return DispatchOutcome::Error(HttpError::from(CancelledError));
        }

        match (route.handler())(exchange).await {
            Ok(response) => DispatchOutcome::Response(response),
            Err(err) => {
                let line = format!(
                    "{} {} failed: {err}",
                    exchange.method(),
                    exchange.path()
                );
                if err.status.is_server_error() {
                    logging::error("weft::dispatch", &line);
                } else {
                    logging::debug("weft::dispatch", &line);
                }
                DispatchOutcome::Error(err)
            }
        }
    }

    /// Dispatch and map failures through `mapper` in one step.
    pub async fn respond(&self, exchange: &HttpExchange, mapper: &dyn ErrorMapper) -> Response {
        self.dispatch(exchange).await.into_response(mapper, exchange)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binder::ParamSpec;
    use crate::registry::{HandlerSpec, RouteSet, RouteTag, Router};
    use weft_core::testing::{block_on, exchange};
    use weft_core::{BoundValue, Method, TargetType};

    fn dispatcher() -> Dispatcher {
        let mut router = Router::new();
        router
            .register(
                RouteSet::new("/users")
                    .handler(
                        HandlerSpec::new("get_user", |_, values: Vec<BoundValue>| {
                            let id = values[0].as_int().unwrap_or(0);
                            async move { Ok(Response::ok().body_text(format!("user {id}"))) }
                        })
                        .tag(RouteTag::get("/:id"))
                        .param(ParamSpec::path("id", TargetType::Int)),
                    )
                    .handler(
                        HandlerSpec::new("boom", |_, _| async {
                            Err(HttpError::internal().with_detail("boom"))
                        })
                        .tag(RouteTag::post("/")),
                    ),
            )
            .unwrap();
        Dispatcher::new(router.build())
    }

    #[test]
    fn dispatches_matched_route() {
        let d = dispatcher();
        let e = exchange(Method::Get, "/users/7").build();
        let outcome = block_on(d.dispatch(&e));
        let DispatchOutcome::Response(response) = outcome else {
            panic!("expected response");
        };
        assert_eq!(response.text(), "user 7");
        // The match was recorded on the exchange before the handler ran.
        assert_eq!(e.path_param("id").as_deref(), Some("7"));
        assert_eq!(e.route().unwrap().name(), "get_user");
    }

    #[test]
    fn unmatched_path_is_not_found() {
        let d = dispatcher();
        let e = exchange(Method::Get, "/nope").build();
        assert!(matches!(
            block_on(d.dispatch(&e)),
            DispatchOutcome::NotFound
        ));
    }

    #[test]
    fn wrong_method_reports_allowed() {
        let d = dispatcher();
        let e = exchange(Method::Delete, "/users").build();
        let DispatchOutcome::MethodNotAllowed(allowed) = block_on(d.dispatch(&e)) else {
            panic!("expected method-not-allowed");
        };
        assert!(allowed.contains(Method::Post));
    }

    #[test]
    fn handler_error_becomes_error_outcome() {
        let d = dispatcher();
        let e = exchange(Method::Post, "/users").build();
        let outcome = block_on(d.dispatch(&e));
        assert_eq!(outcome.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn cancellation_short_circuits_with_499() {
        let d = dispatcher();
        let e = exchange(Method::Get, "/users/7").build();
        e.context().cx().set_cancel_requested(true);
        let outcome = block_on(d.dispatch(&e));
        assert_eq!(outcome.status().as_u16(), 499);
    }

    #[test]
    fn default_mapper_builds_json_error_body() {
        let d = dispatcher();
        let e = exchange(Method::Post, "/users").build();
        let response = block_on(d.respond(&e, &DefaultErrorMapper));
        assert_eq!(response.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(response.text().contains("boom"));
    }

    #[test]
    fn method_not_allowed_response_carries_allow_header() {
        let d = dispatcher();
        let e = exchange(Method::Delete, "/users").build();
        let response = block_on(d.respond(&e, &DefaultErrorMapper));
        assert_eq!(response.status_code(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(response.header_value("allow"), Some("POST"));
    }
}
