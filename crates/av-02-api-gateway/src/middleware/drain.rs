//! In-flight request tracking for shutdown.
//!
//! [`InFlight`] counts requests currently inside the router. Shutdown waits
//! for the count to reach zero before the backend is closed; after the
//! grace period [`InFlight::cut_off`] resolves every remaining request with
//! a 503 and drops its handler. Requests arriving after the cut-off never
//! reach the handler at all.

use crate::domain::error::ApiError;
use axum::{
    body::Body,
    http::{Request, StatusCode},
    response::{IntoResponse, Response},
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::task::{Context, Poll};
use tokio::sync::{watch, Notify};
use tower::{Layer, Service};

/// Shared in-flight counter and cut-off switch.
#[derive(Debug)]
pub struct InFlight {
    active: AtomicUsize,
    idle: Notify,
    cutoff_tx: watch::Sender<bool>,
}

impl Default for InFlight {
    fn default() -> Self {
        let (cutoff_tx, _) = watch::channel(false);
        Self {
            active: AtomicUsize::new(0),
            idle: Notify::new(),
            cutoff_tx,
        }
    }
}

impl InFlight {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Number of requests currently being handled.
    pub fn active(&self) -> usize {
        self.active.load(Ordering::SeqCst)
    }

    /// Resolves once no request is in flight.
    pub async fn wait_idle(&self) {
        loop {
            let notified = self.idle.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();
            if self.active() == 0 {
                return;
            }
            notified.await;
        }
    }

    /// Abort every in-flight request.
    pub fn cut_off(&self) {
        self.cutoff_tx.send_replace(true);
    }

    fn enter(self: &Arc<Self>) -> InFlightGuard {
        self.active.fetch_add(1, Ordering::SeqCst);
        InFlightGuard {
            in_flight: Arc::clone(self),
        }
    }
}

struct InFlightGuard {
    in_flight: Arc<InFlight>,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        if self.in_flight.active.fetch_sub(1, Ordering::SeqCst) == 1 {
            self.in_flight.idle.notify_waiters();
        }
    }
}

/// Drain layer
#[derive(Clone)]
pub struct DrainLayer {
    in_flight: Arc<InFlight>,
}

impl DrainLayer {
    pub fn new(in_flight: Arc<InFlight>) -> Self {
        Self { in_flight }
    }
}

impl<S> Layer<S> for DrainLayer {
    type Service = DrainService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        DrainService {
            inner,
            in_flight: Arc::clone(&self.in_flight),
        }
    }
}

/// Drain service
#[derive(Clone)]
pub struct DrainService<S> {
    inner: S,
    in_flight: Arc<InFlight>,
}

impl<S> Service<Request<Body>> for DrainService<S>
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

    fn call(&mut self, req: Request<Body>) -> Self::Future {
        let guard = self.in_flight.enter();
        let mut cutoff = self.in_flight.cutoff_tx.subscribe();
        if *cutoff.borrow() {
            return Box::pin(async move {
                drop(guard);
                Ok(shutting_down())
            });
        }

        let mut inner = self.inner.clone();
        Box::pin(async move {
            let _guard = guard;
            tokio::select! {
                biased;
                _ = wait_for_cutoff(&mut cutoff) => Ok(shutting_down()),
                result = inner.call(req) => result,
            }
        })
    }
}

fn shutting_down() -> Response {
    ApiError::new(StatusCode::SERVICE_UNAVAILABLE, "server shutting down").into_response()
}

async fn wait_for_cutoff(rx: &mut watch::Receiver<bool>) {
    let cut = rx.wait_for(|cut| *cut).await.is_ok();
    if !cut {
        std::future::pending::<()>().await;
    }
}
