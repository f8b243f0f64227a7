use crate::config::Addressing;
use crate::error::{Result, UrlShareError};
use crate::handlers::RouteHandler;
use crate::iri;
use crate::metrics::RedirectMetrics;
use crate::repository::MappingRepository;
use async_trait::async_trait;
use axum::extract::Request;
use axum::http::{Method, Uri};
use axum::response::{IntoResponse, Redirect, Response};
use tracing::{debug, error};
use url::Url;

/// Resolves inbound paths to stored targets and answers with a 307.
pub struct RedirectResolver {
    repo: MappingRepository,
    base: Url,
    addressing: Addressing,
}

/// One key to try, and whether the request query still has to be merged.
struct Candidate {
    key: String,
    merge_query: bool,
}

impl RedirectResolver {
    pub fn new(repo: MappingRepository, base: Url, addressing: Addressing) -> Self {
        Self {
            repo,
            base,
            addressing,
        }
    }

    /// Find the target for `uri` and merge the request's query into it.
    pub async fn resolve(&self, uri: &Uri) -> Result<Url> {
        let candidates = self.candidates(uri);
        let found = self
            .repo
            .blocking(move |repo| {
                for candidate in candidates {
                    if let Some(mapping) = repo.get(&candidate.key)? {
                        return Ok(Some((mapping, candidate.merge_query)));
                    }
                }
                Ok(None)
            })
            .await?;

        let Some((mapping, merge)) = found else {
            RedirectMetrics::record_miss();
            return Err(UrlShareError::NotFound(uri.path().to_string()));
        };

        let mut target = iri::parse_stored(&mapping.key, &mapping.target).map_err(|e| {
            RedirectMetrics::record_malformed_target();
            error!(key = %mapping.key, value = %mapping.target, "stored target is not a valid IRI");
            e
        })?;
        if merge {
            iri::merge_query(&mut target, uri.query());
        }
        RedirectMetrics::record_hit();
        debug!(key = %mapping.key, target = %target, "resolved");
        Ok(target)
    }

    /// Keys to try in order. Empty when the request cannot name a mapping.
    fn candidates(&self, uri: &Uri) -> Vec<Candidate> {
        match self.addressing {
            Addressing::Short => iri::short_key(uri.path())
                .map(|key| Candidate {
                    key,
                    merge_query: true,
                })
                .into_iter()
                .collect(),
            Addressing::External => {
                let Some(without_query) = self.external_iri(uri.path()) else {
                    return Vec::new();
                };
                let mut candidates = Vec::with_capacity(2);
                if let Some(query) = uri.query().filter(|q| !q.is_empty()) {
                    candidates.push(Candidate {
                        key: format!("{without_query}?{query}"),
                        merge_query: false,
                    });
                }
                candidates.push(Candidate {
                    key: without_query,
                    merge_query: true,
                });
                candidates
            }
        }
    }

    fn external_iri(&self, path: &str) -> Option<String> {
        let mut url = self.base.join(path).ok()?;
        url.set_query(None);
        url.set_fragment(None);
        Some(url.into())
    }
}

#[async_trait]
impl RouteHandler for RedirectResolver {
    async fn handle(&self, req: Request) -> Result<Response> {
        if req.method() != Method::GET && req.method() != Method::HEAD {
            return Err(UrlShareError::MethodNotAllowed(req.method().clone()));
        }
        let target = self.resolve(req.uri()).await?;
        Ok(Redirect::temporary(target.as_str()).into_response())
    }
}
