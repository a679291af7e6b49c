//! Filtro di accesso alle API per IP e dominio di provenienza
//!
//! Attivo solo con `SECURITY_ENABLED`. Le richieste vengono classificate in:
//! - app native (origin `capacitor://`, `http://localhost`, user agent dell'app): sempre ammesse
//! - browser (Origin/Referer http/https): ammesse se il dominio è in `API_ALLOWED_DOMAINS`
//! - server-to-server (tutto il resto): ammesse se l'IP è in `API_ALLOWED_IPS`
//!
//! Liste vuote = nessuna restrizione.

use crate::core::{AppError, AppState};
use axum::extract::{ConnectInfo, Request, State};
use axum::http::{HeaderMap, header};
use axum::{body::Body, http::Response, middleware::Next};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{debug, instrument, warn};
use url::Url;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestKind {
    NativeApp,
    Browser,
    ServerToServer,
}

/// Provenienza dichiarata da un header Origin o Referer
#[derive(Debug, Clone, PartialEq, Eq)]
struct Source {
    scheme: String,
    host: String,
    port: Option<u16>,
}

impl Source {
    fn parse(value: &str) -> Option<Self> {
        let url = Url::parse(value).ok()?;
        Some(Self {
            scheme: url.scheme().to_string(),
            host: url.host_str().unwrap_or_default().to_ascii_lowercase(),
            port: url.port(),
        })
    }

    fn is_web(&self) -> bool {
        self.scheme == "http" || self.scheme == "https"
    }

    /// Confronta con una voce di `API_ALLOWED_DOMAINS`: `host` oppure `host:porta`
    fn matches_domain(&self, allowed: &str) -> bool {
        match self.port {
            Some(port) => {
                allowed.eq_ignore_ascii_case(&self.host)
                    || allowed.eq_ignore_ascii_case(&format!("{}:{}", self.host, port))
            }
            None => allowed.eq_ignore_ascii_case(&self.host),
        }
    }
}

fn header_str<'a>(headers: &'a HeaderMap, name: header::HeaderName) -> &'a str {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
}

pub fn classify(headers: &HeaderMap) -> RequestKind {
    let sources: Vec<Source> = [header::ORIGIN, header::REFERER]
        .into_iter()
        .filter_map(|name| Source::parse(header_str(headers, name)))
        .collect();
    let user_agent_lower = header_str(headers, header::USER_AGENT).to_ascii_lowercase();

    let capacitor = sources.iter().any(|source| source.scheme == "capacitor");
    let localhost = sources
        .iter()
        .any(|source| source.is_web() && source.host == "localhost");

    if capacitor
        || localhost
        || user_agent_lower.contains("capacitor")
        || (user_agent_lower.contains("cfnetwork") && user_agent_lower.contains("darwin"))
        || user_agent_lower.contains("zigzag")
    {
        return RequestKind::NativeApp;
    }

    if sources.iter().any(Source::is_web) {
        RequestKind::Browser
    } else {
        RequestKind::ServerToServer
    }
}

/// IP del client: primo hop di X-Forwarded-For, poi X-Real-IP, poi il socket
pub fn client_ip(headers: &HeaderMap, peer: Option<SocketAddr>) -> Option<String> {
    let forwarded = header_str(headers, header::HeaderName::from_static("x-forwarded-for"))
        .split(',')
        .next()
        .map(str::trim)
        .filter(|ip| !ip.is_empty());
    if let Some(ip) = forwarded {
        return Some(ip.to_string());
    }
    let real_ip = header_str(headers, header::HeaderName::from_static("x-real-ip")).trim();
    if !real_ip.is_empty() {
        return Some(real_ip.to_string());
    }
    peer.map(|addr| addr.ip().to_string())
}

/// Decide se la richiesta può proseguire
pub fn check_access(
    headers: &HeaderMap,
    ip: Option<&str>,
    allowed_ips: &[String],
    allowed_domains: &[String],
) -> Result<(), AppError> {
    match classify(headers) {
        RequestKind::NativeApp => Ok(()),
        RequestKind::Browser => {
            if allowed_domains.is_empty() {
                return Ok(());
            }
            let source = Source::parse(header_str(headers, header::ORIGIN))
                .or_else(|| Source::parse(header_str(headers, header::REFERER)));
            match source {
                Some(source) if !allowed_domains.iter().any(|d| source.matches_domain(d)) => {
                    warn!("API access denied for domain: {}", source.host);
                    Err(AppError::forbidden("Access denied").with_details("API access denied"))
                }
                _ => Ok(()),
            }
        }
        RequestKind::ServerToServer => {
            if allowed_ips.is_empty() {
                return Ok(());
            }
            match ip {
                Some(ip) if allowed_ips.iter().any(|allowed| allowed == ip) => Ok(()),
                Some(ip) => {
                    warn!("API access denied for server IP: {}", ip);
                    Err(AppError::forbidden("Access denied").with_details("API access denied"))
                }
                None => {
                    warn!("Could not determine client IP");
                    Err(AppError::forbidden("Access denied")
                        .with_details("Could not determine client IP"))
                }
            }
        }
    }
}

#[instrument(skip(state, req, next), fields(path = %req.uri().path()))]
pub async fn security_middleware(
    State(state): State<Arc<AppState>>,
    req: Request,
    next: Next,
) -> Result<Response<Body>, AppError> {
    if !state.config.security_enabled || !req.uri().path().starts_with("/api/") {
        return Ok(next.run(req).await);
    }

    let peer = req
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);
    let ip = client_ip(req.headers(), peer);
    debug!("API access from {:?}", ip);

    check_access(
        req.headers(),
        ip.as_deref(),
        &state.config.api_allowed_ips,
        &state.config.api_allowed_domains,
    )?;

    Ok(next.run(req).await)
}
