//! Route handlers. Each route is a small struct holding its dependencies and
//! implementing [`RouteHandler`]; [`route`] mounts one on the router.

mod admin;
mod listing;
mod resolver;

pub use admin::{MappingAdmin, MappingForm};
pub use listing::AdminListing;
pub use resolver::RedirectResolver;

use crate::error::Result;
use async_trait::async_trait;
use axum::extract::Request;
use axum::response::{IntoResponse, Response};
use axum::routing::{any, MethodRouter};
use std::sync::Arc;

#[async_trait]
pub trait RouteHandler: Send + Sync + 'static {
    async fn handle(&self, req: Request) -> Result<Response>;
}

/// Accept every method on the route; the handler decides what it allows.
pub fn route<H: RouteHandler>(handler: H) -> MethodRouter {
    let handler = Arc::new(handler);
    any(move |req: Request| {
        let handler = Arc::clone(&handler);
        async move { handler.handle(req).await.into_response() }
    })
}
