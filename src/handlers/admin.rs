use crate::error::{Result, UrlShareError};
use crate::handlers::RouteHandler;
use crate::iri;
use crate::metrics::AdminMetrics;
use crate::repository::{KeyFormat, MappingRepository};
use async_trait::async_trait;
use axum::extract::{Form, FromRequest, Request};
use axum::http::{Method, StatusCode};
use axum::response::{IntoResponse, Response};
use serde::Deserialize;
use tracing::info;
use url::Url;

/// Form body of a create/update request.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MappingForm {
    /// Key to upsert. Empty means "generate one".
    #[serde(rename = "fromIri", default)]
    pub from_iri: String,
    #[serde(rename = "toIri", default)]
    pub to_iri: String,
}

/// Create and update endpoint. Only `PATCH` writes.
pub struct MappingAdmin {
    repo: MappingRepository,
    base: Url,
    key_format: KeyFormat,
}

impl MappingAdmin {
    pub fn new(repo: MappingRepository, base: Url, key_format: KeyFormat) -> Self {
        Self {
            repo,
            base,
            key_format,
        }
    }

    /// Validate and store one mapping. Returns the generated key on create.
    pub async fn apply(&self, form: MappingForm) -> Result<Option<String>> {
        let target = iri::canonical_target(&form.to_iri, &self.base).inspect_err(|_| {
            AdminMetrics::record_rejected();
        })?;
        let target = String::from(target);
        let from = form.from_iri.trim().to_string();

        if from.is_empty() {
            let key_format = self.key_format.clone();
            let key = self
                .repo
                .blocking(move |repo| repo.create(&target, &key_format))
                .await?;
            AdminMetrics::record_create();
            info!(%key, "short key assigned");
            Ok(Some(key))
        } else {
            self.repo
                .blocking(move |repo| repo.update(&from, &target))
                .await?;
            AdminMetrics::record_update();
            Ok(None)
        }
    }
}

#[async_trait]
impl RouteHandler for MappingAdmin {
    async fn handle(&self, req: Request) -> Result<Response> {
        if req.method() != Method::PATCH {
            return Err(UrlShareError::MethodNotAllowed(req.method().clone()));
        }
        let Form(form) = Form::<MappingForm>::from_request(req, &())
            .await
            .map_err(|rejection| UrlShareError::InvalidInput(rejection.body_text()))?;
        // The generated key is deliberately not echoed back.
        self.apply(form).await?;
        Ok(StatusCode::OK.into_response())
    }
}
