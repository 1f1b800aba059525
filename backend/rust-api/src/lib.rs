use axum::{
    extract::Request,
    http::{header, HeaderValue, Method},
    middleware::{self, Next},
    response::Response,
    routing::{get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

pub mod config;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod metrics;
pub mod middlewares;
pub mod models;
pub mod response;
pub mod services;
pub mod utils;

pub use config::Config;
pub use services::AppState;

/// CSP middleware adds Content-Security-Policy header to all responses
async fn csp_middleware(request: Request, next: Next) -> Response {
    let mut response = next.run(request).await;
    response.headers_mut().insert(
        header::CONTENT_SECURITY_POLICY,
        HeaderValue::from_static(
            "default-src 'self'; \
             script-src 'self' 'unsafe-inline'; \
             style-src 'self' 'unsafe-inline'; \
             img-src 'self' data: https:; \
             connect-src 'self'",
        ),
    );
    response
}

pub fn create_router(app_state: std::sync::Arc<services::AppState>) -> Router {
    // Verification is embedded on third-party sites, so it stays CORS-open
    let verify_cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE])
        .allow_origin(tower_http::cors::Any);

    Router::new()
        // Public endpoints (no auth required)
        .route("/health", get(handlers::health_check))
        .route(
            "/api/certificates/verify/{certificate_id}",
            get(handlers::certificates::verify_certificate).layer(verify_cors),
        )
        // Metrics endpoint with Basic Auth protection
        .route(
            "/metrics",
            get(handlers::metrics_handler)
                .layer(middleware::from_fn(handlers::metrics_auth_middleware)),
        )
        // Protected endpoints (require JWT)
        .nest("/api/quiz", quiz_routes(app_state.clone()))
        .nest("/api/certificates", certificate_routes(app_state.clone()))
        .nest("/api/webinars", webinar_routes(app_state.clone()))
        .with_state(app_state)
        .layer(middleware::from_fn(csp_middleware))
        .layer(middleware::from_fn(
            middlewares::metrics::metrics_middleware,
        ))
        .layer(TraceLayer::new_for_http())
}

fn quiz_routes(
    app_state: std::sync::Arc<services::AppState>,
) -> Router<std::sync::Arc<services::AppState>> {
    let submit_route = Router::new()
        .route("/submit", post(handlers::quiz::submit_quiz))
        .route_layer(middleware::from_fn_with_state(
            app_state.clone(),
            middlewares::rate_limit::write_rate_limit_middleware,
        ));

    submit_route
        .route("/my/{course_id}", get(handlers::quiz::my_results))
        .layer(middleware::from_fn_with_state(
            app_state,
            middlewares::auth::auth_middleware,
        ))
}

fn certificate_routes(
    app_state: std::sync::Arc<services::AppState>,
) -> Router<std::sync::Arc<services::AppState>> {
    let generate_route = Router::new()
        .route(
            "/generate",
            post(handlers::certificates::generate_certificate),
        )
        .route_layer(middleware::from_fn_with_state(
            app_state.clone(),
            middlewares::rate_limit::write_rate_limit_middleware,
        ));

    generate_route
        .route("/my", get(handlers::certificates::my_certificates))
        .layer(middleware::from_fn_with_state(
            app_state,
            middlewares::auth::auth_middleware,
        ))
}

fn webinar_routes(
    app_state: std::sync::Arc<services::AppState>,
) -> Router<std::sync::Arc<services::AppState>> {
    // Creation is restricted to instructors and admins
    let create_route = Router::new()
        .route("/", post(handlers::webinars::create_webinar))
        .route_layer(middleware::from_fn(
            middlewares::auth::instructor_guard_middleware,
        ));

    let register_route = Router::new().route("/{id}/register", post(handlers::webinars::register));

    create_route
        .merge(register_route)
        .layer(middleware::from_fn_with_state(
            app_state.clone(),
            middlewares::rate_limit::write_rate_limit_middleware,
        ))
        .layer(middleware::from_fn_with_state(
            app_state,
            middlewares::auth::auth_middleware,
        ))
}
