use crate::cli::ServeArgs;
use crate::infra::{build_pipeline, AppState};
use crate::routes::with_service_routes;
use axum::http::{header, HeaderValue, Method};
use axum::{Extension, Router};
use axum_prometheus::PrometheusMetricLayer;
use leadflow::config::{AppConfig, CorsConfig};
use leadflow::error::AppError;
use leadflow::telemetry;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::services::ServeDir;
use tower_http::set_header::SetResponseHeaderLayer;
use tracing::{info, warn};

/// Multipart framing on top of the largest accepted upload.
const REQUEST_OVERHEAD_BYTES: usize = 512 * 1024;

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    std::fs::create_dir_all(&config.storage.root)?;
    let pipeline = Arc::new(build_pipeline(&config)?);
    let body_limit = config.uploads.largest() + REQUEST_OVERHEAD_BYTES;

    let app = with_service_routes(pipeline)
        .merge(uploads_router(&config.storage.root))
        .layer(Extension(app_state))
        .layer(RequestBodyLimitLayer::new(body_limit))
        .layer(cors_layer(&config.cors))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        storage_root = %config.storage.root.display(),
        body_limit,
        "lead capture service ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}

/// Uploaded files are served as downloads and never content-sniffed, so a
/// stored object cannot run as a page on the API origin.
fn uploads_router(root: &Path) -> Router {
    Router::new()
        .nest_service("/uploads", ServeDir::new(root))
        .layer(SetResponseHeaderLayer::overriding(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::CONTENT_DISPOSITION,
            HeaderValue::from_static("attachment"),
        ))
}

/// Browsers may only call the API from configured origins; an empty list allows none.
fn cors_layer(config: &CorsConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .allowed_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(%origin, "ignoring unparsable CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use axum::routing::get;
    use tower::ServiceExt;

    fn guarded(origins: &[&str]) -> Router {
        let config = CorsConfig {
            allowed_origins: origins.iter().map(|origin| origin.to_string()).collect(),
        };
        Router::new()
            .route("/api/health", get(|| async { "ok" }))
            .layer(cors_layer(&config))
    }

    async fn allow_origin_for(app: Router, origin: &str) -> Option<HeaderValue> {
        let request = Request::builder()
            .uri("/api/health")
            .header(header::ORIGIN, origin)
            .body(Body::empty())
            .expect("request builds");
        let response = app.oneshot(request).await.expect("responds");
        assert_eq!(response.status(), StatusCode::OK);
        response
            .headers()
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .cloned()
    }

    #[tokio::test]
    async fn configured_origins_are_echoed() {
        let app = guarded(&["https://www.acme.test", "bad\norigin"]);
        let allowed = allow_origin_for(app, "https://www.acme.test").await;
        assert_eq!(
            allowed,
            Some(HeaderValue::from_static("https://www.acme.test"))
        );
    }

    #[tokio::test]
    async fn unknown_origins_get_no_cors_grant() {
        let app = guarded(&["https://www.acme.test"]);
        assert_eq!(allow_origin_for(app, "https://evil.test").await, None);

        let app = guarded(&[]);
        assert_eq!(allow_origin_for(app, "https://www.acme.test").await, None);
    }

    #[tokio::test]
    async fn uploads_are_served_as_unsniffed_downloads() {
        let root = std::env::temp_dir().join(format!("leadflow-uploads-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(root.join("avatars")).expect("scratch directory");
        std::fs::write(root.join("avatars/priya.png"), b"\x89PNG").expect("scratch file");

        let request = Request::builder()
            .uri("/uploads/avatars/priya.png")
            .body(Body::empty())
            .expect("request builds");
        let response = uploads_router(&root).oneshot(request).await.expect("responds");

        assert_eq!(response.status(), StatusCode::OK);
        let headers = response.headers();
        assert_eq!(
            headers.get(header::X_CONTENT_TYPE_OPTIONS),
            Some(&HeaderValue::from_static("nosniff"))
        );
        assert_eq!(
            headers.get(header::CONTENT_DISPOSITION),
            Some(&HeaderValue::from_static("attachment"))
        );
        assert_eq!(
            headers.get(header::CONTENT_TYPE),
            Some(&HeaderValue::from_static("image/png"))
        );

        std::fs::remove_dir_all(&root).expect("cleanup");
    }
}
