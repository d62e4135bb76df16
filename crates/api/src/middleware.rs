//! Rate limiting for mutating routes.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use axum::{
    extract::State,
    http::{Method, StatusCode},
    middleware::Next,
    response::Response,
};

/// Fixed-window counter per client key.
#[derive(Debug)]
pub struct RateLimiter {
    max_per_window: u32,
    window: Duration,
    hits: Mutex<HashMap<String, (Instant, u32)>>,
}

impl RateLimiter {
    pub fn new(max_per_window: u32, window: Duration) -> Self {
        Self {
            max_per_window,
            window,
            hits: Mutex::new(HashMap::new()),
        }
    }

    /// Count one hit for `key`; false once the window is exhausted.
    pub fn check(&self, key: &str) -> bool {
        let Ok(mut hits) = self.hits.lock() else {
            // A poisoned counter must not take the API down.
            return true;
        };
        let now = Instant::now();
        let entry = hits.entry(key.to_string()).or_insert((now, 0));
        if now.duration_since(entry.0) > self.window {
            *entry = (now, 0);
        }
        entry.1 += 1;
        entry.1 <= self.max_per_window
    }
}

#[derive(Clone)]
pub struct RateLimitState {
    pub limiter: Arc<RateLimiter>,
}

/// Mutating requests pass the limiter before touching the engine; reads are
/// exempt (they hit the cache anyway).
pub async fn rate_limit_middleware(
    State(state): State<RateLimitState>,
    req: axum::http::Request<axum::body::Body>,
    next: Next,
) -> Result<Response, StatusCode> {
    if req.method() != Method::GET {
        let key = req
            .headers()
            .get("x-client-id")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("global")
            .to_string();

        if !state.limiter.check(&key) {
            return Err(StatusCode::TOO_MANY_REQUESTS);
        }
    }

    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn window_caps_and_resets() {
        let limiter = RateLimiter::new(2, Duration::from_millis(20));
        assert!(limiter.check("a"));
        assert!(limiter.check("a"));
        assert!(!limiter.check("a"));
        // Separate keys have separate budgets.
        assert!(limiter.check("b"));

        std::thread::sleep(Duration::from_millis(25));
        assert!(limiter.check("a"));
    }
}
