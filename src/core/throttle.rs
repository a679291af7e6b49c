//! Rate limiting per IP a finestra fissa di un minuto

use crate::core::AppError;
use crate::core::AppState;
use crate::core::security::client_ip;
use axum::extract::{ConnectInfo, Request, State};
use axum::{body::Body, http::Response, middleware::Next};
use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{instrument, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ThrottleScope {
    Login,
    Register,
}

struct Window {
    started_at: DateTime<Utc>,
    hits: u32,
}

pub struct Throttle {
    windows: DashMap<(ThrottleScope, String), Window>,
    login_per_minute: u32,
    register_per_minute: u32,
}

impl Throttle {
    pub fn new(login_per_minute: u32, register_per_minute: u32) -> Self {
        Throttle {
            windows: DashMap::new(),
            login_per_minute,
            register_per_minute,
        }
    }

    fn limit(&self, scope: ThrottleScope) -> u32 {
        match scope {
            ThrottleScope::Login => self.login_per_minute,
            ThrottleScope::Register => self.register_per_minute,
        }
    }

    /// Registra una richiesta; `false` se il client ha superato il limite
    #[instrument(skip(self, now))]
    pub fn check(&self, scope: ThrottleScope, client: &str, now: DateTime<Utc>) -> bool {
        let limit = self.limit(scope);
        let mut window = self
            .windows
            .entry((scope, client.to_string()))
            .or_insert(Window {
                started_at: now,
                hits: 0,
            });

        if now - window.started_at >= Duration::minutes(1) {
            window.started_at = now;
            window.hits = 0;
        }

        if window.hits >= limit {
            warn!("Rate limit exceeded");
            return false;
        }
        window.hits += 1;
        true
    }

    /// Elimina le finestre scadute
    pub fn purge(&self, now: DateTime<Utc>) {
        self.windows
            .retain(|_, window| now - window.started_at < Duration::minutes(1));
    }
}

/// Middleware per le route di login e registrazione.
/// Lo state è la coppia (AppState, scope) passata a `from_fn_with_state`.
pub async fn throttle_middleware(
    State((state, scope)): State<(Arc<AppState>, ThrottleScope)>,
    req: Request,
    next: Next,
) -> Result<Response<Body>, AppError> {
    let peer = req
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);
    let client = client_ip(req.headers(), peer).unwrap_or_else(|| "unknown".to_string());

    if !state.throttle.check(scope, &client, Utc::now()) {
        return Err(AppError::too_many_requests("Request was throttled")
            .with_details("Too many attempts, try again in a minute"));
    }
    Ok(next.run(req).await)
}
