use std::net::SocketAddr;

use axum::http::{header, HeaderValue, Method};
use axum::{routing::get, Router};
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::CorsConfig;
use crate::state::AppState;
use crate::{auth, media, users};

pub fn build_app(state: AppState) -> Router {
    let cors = build_cors(&state.config.cors);
    Router::new()
        .merge(users::router())
        .merge(auth::router())
        .merge(media::router())
        .route("/health", get(|| async { "ok" }))
        .with_state(state)
        .layer(cors)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|req: &axum::http::Request<_>| {
                    let method = req.method().clone();
                    let uri = req.uri().clone();
                    tracing::info_span!("http_request", %method, uri = %uri)
                })
                .on_response(
                    |res: &axum::http::Response<_>,
                     _latency: std::time::Duration,
                     span: &tracing::Span| {
                        let status = res.status();
                        span.record("status", tracing::field::display(status));
                        if status.is_server_error() {
                            tracing::error!(%status, "response");
                        } else {
                            tracing::info!(%status, "response");
                        }
                    },
                ),
        )
}

fn build_cors(config: &CorsConfig) -> CorsLayer {
    // credentials together with a wildcard origin is rejected by browsers
    // (and panics in tower-http), so a wildcard drops the credentials flag
    if config.origins.iter().any(|o| o == "*") {
        return CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);
    }

    let origins = config
        .origins
        .iter()
        .filter_map(|o| o.parse::<HeaderValue>().ok());
    let methods: Vec<Method> = config
        .methods
        .iter()
        .filter_map(|m| m.parse::<Method>().ok())
        .collect();

    let layer = CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(AllowMethods::list(methods))
        .allow_headers(AllowHeaders::list([
            header::ACCEPT,
            header::AUTHORIZATION,
            header::CONTENT_TYPE,
        ]))
        .expose_headers([header::CONTENT_DISPOSITION]);

    if config.credentials {
        layer.allow_credentials(true)
    } else {
        layer
    }
}

pub async fn serve(app: Router, port: u16) -> anyhow::Result<()> {
    let addr: SocketAddr = format!(
        "{}:{}",
        std::env::var("APP_HOST").unwrap_or_else(|_| "0.0.0.0".into()),
        port
    )
    .parse()?;

    tracing::info!("listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cors_accepts_explicit_origins_with_credentials() {
        let _ = build_cors(&CorsConfig {
            origins: vec!["http://localhost:3000".into(), "https://app.example.com".into()],
            methods: vec!["GET".into(), "POST".into(), "PATCH".into()],
            credentials: true,
        });
    }

    #[test]
    fn cors_wildcard_does_not_panic_with_credentials() {
        let _ = build_cors(&CorsConfig {
            origins: vec!["*".into()],
            methods: vec!["GET".into()],
            credentials: true,
        });
    }

    #[tokio::test]
    async fn app_builds_from_fake_state() {
        let _ = build_app(AppState::fake());
    }
}
