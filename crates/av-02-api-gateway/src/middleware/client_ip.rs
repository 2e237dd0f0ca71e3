//! Client IP resolution.
//!
//! The source IP a token is bound to is the connection's peer address.
//! Only a configured trusted proxy may substitute the first address of
//! `X-Forwarded-For`; the header is ignored for every other peer.

use axum::{body::Body, extract::ConnectInfo, http::Request, response::Response};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;
use std::task::{Context, Poll};
use tower::{Layer, Service};
use tracing::debug;

const FORWARDED_FOR: &str = "x-forwarded-for";

/// Resolved source IP of a request, stored in request extensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClientIp(pub IpAddr);

/// Trusted proxy configuration
#[derive(Clone, Debug, Default)]
pub struct TrustedProxyConfig {
    /// Peers whose `X-Forwarded-For` is honoured
    pub trusted_proxies: Vec<IpAddr>,
}

/// Client IP layer
#[derive(Clone)]
pub struct ClientIpLayer {
    config: Arc<TrustedProxyConfig>,
}

impl ClientIpLayer {
    pub fn new(config: TrustedProxyConfig) -> Self {
        Self {
            config: Arc::new(config),
        }
    }
}

impl<S> Layer<S> for ClientIpLayer {
    type Service = ClientIpService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        ClientIpService {
            inner,
            config: Arc::clone(&self.config),
        }
    }
}

/// Client IP service
#[derive(Clone)]
pub struct ClientIpService<S> {
    inner: S,
    config: Arc<TrustedProxyConfig>,
}

impl<S> Service<Request<Body>> for ClientIpService<S>
where
    S: Service<Request<Body>, Response = Response> + Clone + Send + 'static,
    S::Future: Send,
{
    type Response = Response;
    type Error = S::Error;
    type Future = std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<Self::Response, Self::Error>> + Send>,
    >;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: Request<Body>) -> Self::Future {
        let mut inner = self.inner.clone();

        let direct_ip = req
            .extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ci| ci.0.ip())
            .unwrap_or(IpAddr::V4(Ipv4Addr::LOCALHOST));
        let client_ip = determine_client_ip(&req, direct_ip, &self.config);
        req.extensions_mut().insert(ClientIp(client_ip));

        Box::pin(async move { inner.call(req).await })
    }
}

fn determine_client_ip<B>(req: &Request<B>, direct_ip: IpAddr, config: &TrustedProxyConfig) -> IpAddr {
    let Some(forwarded) = req.headers().get(FORWARDED_FOR) else {
        return direct_ip;
    };

    if !config.trusted_proxies.contains(&direct_ip) {
        debug!(
            direct_ip = %direct_ip,
            forwarded = ?forwarded,
            "Ignoring X-Forwarded-For from untrusted peer"
        );
        return direct_ip;
    }

    forwarded
        .to_str()
        .ok()
        .and_then(|value| value.split(',').next())
        .and_then(|first| first.trim().parse::<IpAddr>().ok())
        .unwrap_or(direct_ip)
}
