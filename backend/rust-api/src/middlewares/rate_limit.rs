use axum::{
    extract::{ConnectInfo, Request, State},
    http::HeaderMap,
    middleware::Next,
    response::{IntoResponse, Response},
};
use redis::aio::ConnectionManager;
use std::net::SocketAddr;
use std::sync::Arc;

use crate::error::ApiError;
use crate::services::AppState;

const WRITE_RATE_LIMIT_PER_USER: u32 = 30; // writes per minute
const WRITE_RATE_LIMIT_PER_IP: u32 = 60; // writes per minute
const RATE_WINDOW_SECONDS: u64 = 60;

fn extract_client_ip_from(headers: &HeaderMap, extensions: &axum::http::Extensions) -> String {
    // Preferred order: X-Forwarded-For, X-Real-IP, ConnectInfo
    if let Some(v) = headers.get("x-forwarded-for") {
        if let Ok(s) = v.to_str() {
            // x-forwarded-for can be a comma separated list; take first
            return s.split(',').next().unwrap_or(s).trim().to_string();
        }
    }

    if let Some(v) = headers.get("x-real-ip") {
        if let Ok(s) = v.to_str() {
            return s.trim().to_string();
        }
    }

    if let Some(ci) = extensions.get::<ConnectInfo<SocketAddr>>() {
        return ci.0.ip().to_string();
    }

    "unknown".to_string()
}

/// Fixed-window limiter for the write endpoints (quiz submission,
/// certificate generation, webinar creation/registration).
pub async fn write_rate_limit_middleware(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Result<Response, Response> {
    if std::env::var("RATE_LIMIT_DISABLED").unwrap_or_default() == "1" {
        return Ok(next.run(request).await);
    }

    let client_ip = extract_client_ip_from(request.headers(), request.extensions());

    let user_id = request
        .extensions()
        .get::<super::auth::JwtClaims>()
        .map(|claims| claims.sub.clone());

    // The user window is checked (and consumed) first, so a request the
    // IP window rejects still burns one unit of user quota. Both windows
    // reset within RATE_WINDOW_SECONDS.
    if let Some(uid) = &user_id {
        let user_limit = std::env::var("RATE_LIMIT_PER_USER")
            .ok()
            .and_then(|s| s.parse::<u32>().ok())
            .unwrap_or(WRITE_RATE_LIMIT_PER_USER);

        let allowed = check_rate_limit(
            &state.redis,
            &format!("ratelimit:user:{}", uid),
            user_limit,
            RATE_WINDOW_SECONDS,
        )
        .await
        .map_err(|e| {
            tracing::error!("Rate limit check failed: {}", e);
            ApiError::Internal(e).into_response()
        })?;

        if !allowed {
            tracing::warn!("Rate limit exceeded for user: {}", uid);
            return Err(ApiError::RateLimited.into_response());
        }
    }

    let ip_limit = std::env::var("RATE_LIMIT_PER_IP")
        .ok()
        .and_then(|s| s.parse::<u32>().ok())
        .unwrap_or(WRITE_RATE_LIMIT_PER_IP);

    let allowed = check_rate_limit(
        &state.redis,
        &format!("ratelimit:ip:{}", client_ip),
        ip_limit,
        RATE_WINDOW_SECONDS,
    )
    .await
    .map_err(|e| {
        tracing::error!("Rate limit check failed: {}", e);
        ApiError::Internal(e).into_response()
    })?;

    if !allowed {
        tracing::warn!("Rate limit exceeded for IP: {}", client_ip);
        return Err(ApiError::RateLimited.into_response());
    }

    Ok(next.run(request).await)
}

/// Atomic fixed-window check via Lua: SET NX with TTL, then bounded INCR.
async fn check_rate_limit(
    redis: &ConnectionManager,
    key: &str,
    limit: u32,
    window_seconds: u64,
) -> anyhow::Result<bool> {
    let mut conn = redis.clone();

    let lua_script = r#"
        local key = KEYS[1]
        local limit = tonumber(ARGV[1])
        local window = tonumber(ARGV[2])

        local current = redis.call('GET', key)

        if current == false then
            redis.call('SET', key, 1, 'EX', window)
            return 1
        end

        current = tonumber(current)

        if current >= limit then
            return 0
        end

        redis.call('INCR', key)
        return 1
    "#;

    let allowed: u32 = redis::Script::new(lua_script)
        .key(key)
        .arg(limit)
        .arg(window_seconds)
        .invoke_async(&mut conn)
        .await?;

    Ok(allowed == 1)
}
