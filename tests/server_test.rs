use anyhow::Result;
use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use std::io;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::{tempdir, TempDir};
use tower::ServiceExt;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::EnvFilter;
use urlshare::config::{Addressing, Config};
use urlshare::server::create_server;
use urlshare::{MappingRepository, Store};

struct TestApp {
    _dir: TempDir,
    repo: MappingRepository,
    router: Router,
}

fn test_app(addressing: Addressing) -> Result<TestApp> {
    let dir = tempdir()?;
    let mut config = Config::default();
    config.store.path = dir.path().join("urlshare.db");
    config.server.static_dir = dir.path().join("static");
    config.server.addressing = addressing;
    std::fs::create_dir_all(&config.server.static_dir)?;
    std::fs::write(config.server.static_dir.join("style.css"), "body {}")?;

    let store = Store::open(&config.store.path, Duration::from_secs(5))?;
    let repo = MappingRepository::new(Arc::new(store));
    let router = create_server(&config, repo.clone())?;
    Ok(TestApp {
        _dir: dir,
        repo,
        router,
    })
}

impl TestApp {
    async fn send(&self, req: Request<Body>) -> Result<axum::response::Response> {
        Ok(self.router.clone().oneshot(req).await?)
    }

    async fn get(&self, uri: &str) -> Result<axum::response::Response> {
        self.send(Request::get(uri).body(Body::empty())?).await
    }

    async fn write(&self, method: Method, body: &str) -> Result<axum::response::Response> {
        let req = Request::builder()
            .method(method)
            .uri("/admin/mappings")
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(body.to_string()))?;
        self.send(req).await
    }
}

fn location(resp: &axum::response::Response) -> &str {
    resp.headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
}

async fn body_text(resp: axum::response::Response) -> Result<String> {
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await?;
    Ok(String::from_utf8(bytes.to_vec())?)
}

/// Value of an unlabelled counter in a Prometheus text scrape.
fn counter_value(scrape: &str, name: &str) -> f64 {
    scrape
        .lines()
        .filter(|line| !line.starts_with('#'))
        .find_map(|line| {
            let (metric, value) = line.split_once(' ')?;
            (metric == name).then(|| value.trim().parse().ok()).flatten()
        })
        .unwrap_or(0.0)
}

async fn scrape(app: &TestApp) -> Result<String> {
    let resp = app.get("/admin/metrics").await?;
    assert_eq!(resp.status(), StatusCode::OK);
    body_text(resp).await
}

/// In-memory log sink for a thread-local subscriber.
#[derive(Clone, Default)]
struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

impl CapturedLogs {
    fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl io::Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for CapturedLogs {
    type Writer = CapturedLogs;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

#[tokio::test]
async fn create_then_redirect_end_to_end() -> Result<()> {
    let app = test_app(Addressing::Short)?;

    let resp = app
        .write(Method::PATCH, "toIri=https%3A%2F%2Fnews.example%2Farticle%2F42")
        .await?;
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(body_text(resp).await?.is_empty());

    let resp = app.get("/1").await?;
    assert_eq!(resp.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(location(&resp), "https://news.example/article/42");

    let resp = app
        .write(Method::PATCH, "fromIri=&toIri=https%3A%2F%2Fnews.example%2F%3Fref%3Dsite")
        .await?;
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = app.get("/2?utm=foo").await?;
    assert_eq!(resp.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(location(&resp), "https://news.example/?ref=site&utm=foo");
    Ok(())
}

#[tokio::test]
async fn query_params_are_appended_to_the_target() -> Result<()> {
    let app = test_app(Addressing::Short)?;
    app.repo.update("x", "https://example.com/x?a=1")?;

    let resp = app.get("/x?a=2&b=3").await?;
    assert_eq!(resp.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(location(&resp), "https://example.com/x?a=1&a=2&b=3");
    Ok(())
}

#[tokio::test]
async fn unknown_key_is_not_found() -> Result<()> {
    let app = test_app(Addressing::Short)?;
    assert_eq!(app.get("/42").await?.status(), StatusCode::NOT_FOUND);
    assert_eq!(app.get("/").await?.status(), StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn malformed_stored_target_is_an_internal_error() -> Result<()> {
    let app = test_app(Addressing::Short)?;
    app.repo.update("bad", "definitely not an iri")?;

    let resp = app.get("/bad").await?;
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(resp.headers().get(header::LOCATION).is_none());
    Ok(())
}

#[tokio::test]
async fn admin_write_validates_method_and_input() -> Result<()> {
    let app = test_app(Addressing::Short)?;

    let resp = app.write(Method::POST, "toIri=https%3A%2F%2Fexample.com").await?;
    assert_eq!(resp.status(), StatusCode::METHOD_NOT_ALLOWED);

    let resp = app.write(Method::PATCH, "fromIri=abc").await?;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let resp = app.write(Method::PATCH, "toIri=http%3A%2F%2F%5B%3A%3A1").await?;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    assert!(app.repo.list()?.is_empty());
    Ok(())
}

#[tokio::test]
async fn explicit_from_iri_upserts() -> Result<()> {
    let app = test_app(Addressing::Short)?;

    let resp = app
        .write(Method::PATCH, "fromIri=docs&toIri=https%3A%2F%2Fdocs.example%2Fv1")
        .await?;
    assert_eq!(resp.status(), StatusCode::OK);
    let resp = app
        .write(Method::PATCH, "fromIri=docs&toIri=https%3A%2F%2Fdocs.example%2Fv2")
        .await?;
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = app.get("/docs").await?;
    assert_eq!(location(&resp), "https://docs.example/v2");
    Ok(())
}

#[tokio::test]
async fn relative_target_resolves_against_base() -> Result<()> {
    let app = test_app(Addressing::Short)?;
    let resp = app
        .write(Method::PATCH, "fromIri=home&toIri=%2Fstatic%2Fstyle.css")
        .await?;
    assert_eq!(resp.status(), StatusCode::OK);

    let mapping = app.repo.get("home")?.expect("mapping should exist");
    assert_eq!(mapping.target, "http://localhost:8080/static/style.css");
    Ok(())
}

#[tokio::test]
async fn resolver_rejects_non_get_methods() -> Result<()> {
    let app = test_app(Addressing::Short)?;
    app.repo.update("1", "https://example.com/")?;

    let req = Request::delete("/1").body(Body::empty())?;
    assert_eq!(app.send(req).await?.status(), StatusCode::METHOD_NOT_ALLOWED);
    Ok(())
}

#[tokio::test]
async fn head_request_redirects_like_get() -> Result<()> {
    let app = test_app(Addressing::Short)?;
    app.repo.update("1", "https://example.com/landing")?;

    let req = Request::head("/1?utm=foo").body(Body::empty())?;
    let resp = app.send(req).await?;
    assert_eq!(resp.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(location(&resp), "https://example.com/landing?utm=foo");
    Ok(())
}

#[tokio::test]
async fn admin_listing_only_answers_get() -> Result<()> {
    let app = test_app(Addressing::Short)?;

    let req = Request::post("/admin").body(Body::empty())?;
    assert_eq!(app.send(req).await?.status(), StatusCode::METHOD_NOT_ALLOWED);

    let req = Request::patch("/admin").body(Body::empty())?;
    assert_eq!(app.send(req).await?.status(), StatusCode::METHOD_NOT_ALLOWED);
    Ok(())
}

#[tokio::test]
async fn short_key_with_spaces_resolves_from_encoded_path() -> Result<()> {
    let app = test_app(Addressing::Short)?;

    let resp = app
        .write(Method::PATCH, "fromIri=my+link&toIri=https%3A%2F%2Fexample.com%2F")
        .await?;
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(app.repo.get("my link")?.is_some());

    let resp = app.get("/my%20link").await?;
    assert_eq!(resp.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(location(&resp), "https://example.com/");
    Ok(())
}

#[tokio::test]
async fn requests_are_logged_at_info() -> Result<()> {
    let app = test_app(Addressing::Short)?;
    let logs = CapturedLogs::default();
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new("urlshare=info,tower_http=info"))
        .with_writer(logs.clone())
        .with_ansi(false)
        .finish();
    let _guard = tracing::subscriber::set_default(subscriber);

    let resp = app.get("/admin/health").await?;
    assert_eq!(resp.status(), StatusCode::OK);

    let output = logs.contents();
    assert!(output.contains("/admin/health"), "no request line in {output:?}");
    assert!(output.contains("started processing request"));
    assert!(output.contains("finished processing request"));
    assert!(output.contains("status=200"));
    Ok(())
}

#[tokio::test]
async fn admin_listing_shows_mappings_newest_key_first() -> Result<()> {
    let app = test_app(Addressing::Short)?;
    app.repo.update("1", "https://first.example/")?;
    app.repo.update("2", "https://second.example/?a=1&b=2")?;

    let resp = app.get("/admin").await?;
    assert_eq!(resp.status(), StatusCode::OK);
    let html = body_text(resp).await?;
    let second = html.find("second.example").expect("second listed");
    let first = html.find("first.example").expect("first listed");
    assert!(second < first);
    // Markup is escaped by the template engine.
    assert!(html.contains("a=1&amp;b=2"));
    Ok(())
}

#[tokio::test]
async fn static_assets_and_health() -> Result<()> {
    let app = test_app(Addressing::Short)?;

    let resp = app.get("/static/style.css").await?;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_text(resp).await?, "body {}");

    assert_eq!(
        app.get("/static/missing.css").await?.status(),
        StatusCode::NOT_FOUND
    );

    let resp = app.get("/admin/health").await?;
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(body_text(resp).await?.contains("healthy"));
    Ok(())
}

#[tokio::test]
async fn external_addressing_uses_full_iri_keys() -> Result<()> {
    let app = test_app(Addressing::External)?;

    let resp = app
        .write(Method::PATCH, "toIri=https%3A%2F%2Fnews.example%2F")
        .await?;
    assert_eq!(resp.status(), StatusCode::OK);
    let keys: Vec<String> = app.repo.list()?.into_iter().map(|m| m.key).collect();
    assert_eq!(keys, vec!["http://localhost:8080/s/1"]);

    let resp = app.get("/s/1?utm=foo").await?;
    assert_eq!(resp.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(location(&resp), "https://news.example/?utm=foo");

    // A key that already includes the query matches exactly and is not merged again.
    app.repo
        .update("http://localhost:8080/promo?src=mail", "https://shop.example/sale")?;
    let resp = app.get("/promo?src=mail").await?;
    assert_eq!(location(&resp), "https://shop.example/sale");

    // In external mode only the full IRI matches, not the last segment.
    assert_eq!(app.get("/1").await?.status(), StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn metrics_endpoint_reports_redirects() -> Result<()> {
    urlshare::metrics::init_metrics();
    let app = test_app(Addressing::Short)?;
    app.repo.update("m", "https://example.com/")?;

    let resp = app.get("/m").await?;
    assert_eq!(resp.status(), StatusCode::TEMPORARY_REDIRECT);

    let scrape_before = scrape(&app).await?;
    assert!(scrape_before.contains("urlshare_redirect_hits_total"));
    let misses_before = counter_value(&scrape_before, "urlshare_redirect_misses_total");

    // No key at all still counts as a miss.
    assert_eq!(app.get("/").await?.status(), StatusCode::NOT_FOUND);

    let misses_after = counter_value(&scrape(&app).await?, "urlshare_redirect_misses_total");
    assert!(misses_after >= misses_before + 1.0);
    Ok(())
}
