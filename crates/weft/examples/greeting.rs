//! Register a small route set and dispatch a few requests against it.
//!
//! Run with: `cargo run --example greeting`

use weft::prelude::*;
use weft::testing::{block_on, exchange};
use weft::{BoundValue, ConfigError, ParamSpec, request_logger};

fn main() -> Result<(), ConfigError> {
    let mut router = Router::new();
    router.register(
        RouteSet::new("/hello")
            .decorator(request_logger())
            .handler(
                HandlerSpec::new("say_hello", |_, values: Vec<BoundValue>| {
                    let name = values[0].as_str().unwrap_or("world").to_owned();
                    let shout = values[1].as_bool().unwrap_or(false);
                    async move {
                        let mut greeting = format!("hello, {name}");
                        if shout {
                            greeting.make_ascii_uppercase();
                        }
                        Ok(Response::ok().body_text(greeting))
                    }
                })
                .tag(RouteTag::get("/:name"))
                .param(ParamSpec::path("name", TargetType::Str))
                .param(ParamSpec::query("shout", TargetType::Bool).optional()),
            ),
    )?;
    let dispatcher = Dispatcher::new(router.build());

    for (path, query) in [("/hello/Ann", None), ("/hello/Ann", Some("shout")), ("/nope", None)] {
        let mut builder = exchange(Method::Get, path);
        if let Some(query) = query {
            builder = builder.query(query);
        }
        let e = builder.build();
        let response = block_on(dispatcher.respond(&e, &DefaultErrorMapper));
        println!("GET {path}?{} -> {} {}", query.unwrap_or(""), response.status_code(), response.text());
    }
    Ok(())
}
