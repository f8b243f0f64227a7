use crate::error::{Result, UrlShareError};
use crate::handlers::RouteHandler;
use crate::repository::MappingRepository;
use crate::templates::IndexTemplate;
use askama::Template;
use async_trait::async_trait;
use axum::extract::Request;
use axum::http::Method;
use axum::response::{Html, IntoResponse, Response};

/// Admin page listing every mapping, highest key first.
pub struct AdminListing {
    repo: MappingRepository,
    base_iri: String,
}

impl AdminListing {
    pub fn new(repo: MappingRepository, base_iri: String) -> Self {
        Self { repo, base_iri }
    }

    pub async fn render(&self) -> Result<String> {
        let mappings = self.repo.blocking(|repo| repo.list()).await?;
        let template = IndexTemplate {
            mappings,
            base_iri: self.base_iri.clone(),
        };
        Ok(template.render()?)
    }
}

#[async_trait]
impl RouteHandler for AdminListing {
    async fn handle(&self, req: Request) -> Result<Response> {
        if req.method() != Method::GET {
            return Err(UrlShareError::MethodNotAllowed(req.method().clone()));
        }
        Ok(Html(self.render().await?).into_response())
    }
}
