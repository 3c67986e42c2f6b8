use std::{
    collections::HashMap,
    future::{Ready, ready},
    net::{IpAddr, Ipv4Addr},
    rc::Rc,
    sync::{Arc, Mutex},
    time::{Duration, Instant},
};

use actix_web::{
    Error, HttpResponse,
    body::{EitherBody, MessageBody},
    dev::{Service, ServiceRequest, ServiceResponse, Transform, forward_ready},
    http::header::{self, HeaderName, HeaderValue},
};
use futures::future::LocalBoxFuture;
use log::{info, warn};

use crate::errors::ErrorBody;

/// Policy used when `--csp` is not given; the page needs its inline script and style
pub const DEFAULT_CSP: &str = "default-src 'self'; script-src 'self' 'unsafe-inline'; \
     style-src 'self' 'unsafe-inline'; connect-src 'self'; frame-ancestors 'none'";

/// Tracked clients above which stale windows get pruned
const PRUNE_THRESHOLD: usize = 1024;

/// Configuration for security middleware
#[derive(Debug, Clone)]
pub struct SecurityConfig {
    /// Add hardening headers to every response
    pub enable_security_headers: bool,
    /// Enforce `rate_limit_config`
    pub enable_rate_limiting: bool,
    /// Largest accepted request body in bytes
    pub max_request_size: usize,
    pub rate_limit_config: RateLimitConfig,
    /// Content-Security-Policy sent along with the other headers
    pub csp: String,
}

/// Fixed window rate limit, per client IP
#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    /// Requests allowed per window
    pub max_requests: u32,
    /// Window length in seconds
    pub window_size: u64,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            enable_security_headers: false,
            enable_rate_limiting: false,
            max_request_size: 1024 * 1024,
            rate_limit_config: RateLimitConfig::default(),
            csp: DEFAULT_CSP.to_string(),
        }
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: 60,
            window_size: 60,
        }
    }
}

impl SecurityConfig {
    /// Header set added to responses when security headers are enabled
    pub fn headers(&self) -> Vec<(HeaderName, HeaderValue)> {
        let mut headers = vec![
            (header::X_FRAME_OPTIONS, HeaderValue::from_static("DENY")),
            (
                header::X_CONTENT_TYPE_OPTIONS,
                HeaderValue::from_static("nosniff"),
            ),
            (header::REFERRER_POLICY, HeaderValue::from_static("no-referrer")),
        ];
        match HeaderValue::from_str(&self.csp) {
            Ok(value) => headers.push((header::CONTENT_SECURITY_POLICY, value)),
            Err(_) => warn!("Ignoring Content-Security-Policy with invalid characters"),
        }
        headers
    }
}

/// Request count of one client in its current window
#[derive(Debug)]
pub struct ClientWindow {
    started: Instant,
    count: u32,
}

impl ClientWindow {
    /// Counts one request and tells whether it is still within the limit
    fn admit(&mut self, now: Instant, config: &RateLimitConfig) -> bool {
        if now.duration_since(self.started) >= Duration::from_secs(config.window_size) {
            self.started = now;
            self.count = 0;
        }
        if self.count >= config.max_requests {
            return false;
        }
        self.count += 1;
        true
    }
}

pub type RateLimiterState = Arc<Mutex<HashMap<IpAddr, ClientWindow>>>;

/// Security middleware factory
#[derive(Clone)]
pub struct SecurityMiddleware {
    config: Rc<SecurityConfig>,
    headers: Rc<Vec<(HeaderName, HeaderValue)>>,
    rate_limiter: RateLimiterState,
}

impl SecurityMiddleware {
    pub fn new(config: SecurityConfig) -> Self {
        Self::with_state(config, RateLimiterState::default())
    }

    /// Shares one limiter table between the factories of all workers
    pub fn with_state(config: SecurityConfig, rate_limiter: RateLimiterState) -> Self {
        let headers = if config.enable_security_headers {
            config.headers()
        } else {
            Vec::new()
        };
        Self {
            config: Rc::new(config),
            headers: Rc::new(headers),
            rate_limiter,
        }
    }

    pub fn shared_state() -> RateLimiterState {
        RateLimiterState::default()
    }
}

impl<S, B> Transform<S, ServiceRequest> for SecurityMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: MessageBody + 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = SecurityMiddlewareService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(SecurityMiddlewareService {
            service,
            config: self.config.clone(),
            headers: self.headers.clone(),
            rate_limiter: self.rate_limiter.clone(),
        }))
    }
}

pub struct SecurityMiddlewareService<S> {
    service: S,
    config: Rc<SecurityConfig>,
    headers: Rc<Vec<(HeaderName, HeaderValue)>>,
    rate_limiter: RateLimiterState,
}

impl<S> SecurityMiddlewareService<S> {
    fn over_rate_limit(&self, client_ip: IpAddr) -> bool {
        let Ok(mut limiter) = self.rate_limiter.lock() else {
            warn!("Rate limiter lock poisoned, letting request through");
            return false;
        };
        let now = Instant::now();
        let config = &self.config.rate_limit_config;

        if limiter.len() > PRUNE_THRESHOLD {
            let window = Duration::from_secs(config.window_size);
            limiter.retain(|_, w| now.duration_since(w.started) < window);
        }

        !limiter
            .entry(client_ip)
            .or_insert_with(|| ClientWindow {
                started: now,
                count: 0,
            })
            .admit(now, config)
    }
}

impl<S, B> Service<ServiceRequest> for SecurityMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: MessageBody + 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        if let Some(size) = declared_content_length(&req) {
            if size > self.config.max_request_size {
                warn!(
                    "Request size {size} exceeds limit {}",
                    self.config.max_request_size
                );
                let res = HttpResponse::PayloadTooLarge().json(ErrorBody {
                    message: "Request size exceeds limit".to_string(),
                    error: None,
                });
                return Box::pin(ready(Ok(req.into_response(res).map_into_right_body())));
            }
        }

        if self.config.enable_rate_limiting {
            let client_ip = client_ip(&req);
            if self.over_rate_limit(client_ip) {
                log_security_event("RATE_LIMIT_EXCEEDED", &client_ip, &req);
                let res = HttpResponse::TooManyRequests().json(ErrorBody {
                    message: "Rate limit exceeded".to_string(),
                    error: None,
                });
                return Box::pin(ready(Ok(req.into_response(res).map_into_right_body())));
            }
        }

        let headers = self.headers.clone();
        let fut = self.service.call(req);

        Box::pin(async move {
            let mut res = fut.await?;
            let res_headers = res.headers_mut();
            for (name, value) in headers.iter() {
                res_headers.insert(name.clone(), value.clone());
            }
            Ok(res.map_into_left_body())
        })
    }
}

fn declared_content_length(req: &ServiceRequest) -> Option<usize> {
    req.headers()
        .get(header::CONTENT_LENGTH)?
        .to_str()
        .ok()?
        .parse()
        .ok()
}

/// Peer address of the connection; forwarding headers are not trusted
fn client_ip(req: &ServiceRequest) -> IpAddr {
    req.peer_addr()
        .map(|addr| addr.ip())
        .unwrap_or(IpAddr::V4(Ipv4Addr::LOCALHOST))
}

fn log_security_event(event_type: &str, client_ip: &IpAddr, req: &ServiceRequest) {
    let user_agent = req
        .headers()
        .get(header::USER_AGENT)
        .and_then(|h| h.to_str().ok())
        .unwrap_or("unknown");

    info!(
        "SECURITY_EVENT: {event_type} - IP: {client_ip} - Method: {} - Path: {} - User-Agent: {user_agent}",
        req.method(),
        req.path()
    );
}
