//! Request instrumentation middleware.
//!
//! [`track_requests`] wraps every route (and the fallback) of the router. For
//! each request it starts a [`RequestTimer`], captures the method, raw path
//! and matched route template, and on the way out records
//! `http_requests_total`, `http_request_duration_seconds` and one log line.
//!
//! Finalization happens exactly once per request whatever the handler does:
//!
//! - a normal response is recorded with its status, and 5xx responses that
//!   carry an [`ErrorKind`] also bump `app_errors_total`;
//! - a panic is caught, recorded as 500 and answered with a JSON body;
//! - a future dropped before completion (client disconnect, timeout) is
//!   finalized by the [`InFlight`] guard's `Drop` as status 499.

use super::timer::RequestTimer;
use crate::domain::MetricsPtr;
use crate::error::{AppError, ErrorKind};
use axum::extract::{MatchedPath, Request, State};
use axum::http::{Method, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use futures::FutureExt;
use std::panic::AssertUnwindSafe;

/// Route label used for requests that matched no route.
pub const UNKNOWN_ROUTE: &str = "unknown";

/// Status recorded for requests whose future was dropped.
pub const CLIENT_CLOSED_REQUEST: u16 = 499;

/// Middleware state: where finished requests get recorded.
#[derive(Clone)]
pub struct Instrumentation {
    metrics: MetricsPtr,
}

impl Instrumentation {
    // ---
    pub fn new(metrics: MetricsPtr) -> Self {
        Instrumentation { metrics }
    }

    /// Idle -> InFlight. The returned guard finalizes the request exactly once.
    pub fn begin(&self, req: &Request) -> InFlight {
        // ---
        InFlight {
            ctx: Some(RequestContext::capture(req)),
            metrics: self.metrics.clone(),
        }
    }
}

/// Everything captured on arrival.
#[derive(Debug)]
pub struct RequestContext {
    timer: RequestTimer,
    method: &'static str,
    route: String,
    path: String,
}

impl RequestContext {
    // ---
    fn capture(req: &Request) -> Self {
        // ---
        let route = req
            .extensions()
            .get::<MatchedPath>()
            .map(|matched| matched.as_str().to_string())
            .unwrap_or_else(|| UNKNOWN_ROUTE.to_string());

        RequestContext {
            timer: RequestTimer::start(),
            method: method_label(req.method()),
            route,
            path: req.uri().path().to_string(),
        }
    }
}

/// Standard methods keep their name; anything else collapses to `OTHER`
/// so clients cannot mint new label values.
fn method_label(method: &Method) -> &'static str {
    // ---
    match *method {
        Method::GET => "GET",
        Method::POST => "POST",
        Method::PUT => "PUT",
        Method::DELETE => "DELETE",
        Method::PATCH => "PATCH",
        Method::HEAD => "HEAD",
        Method::OPTIONS => "OPTIONS",
        Method::CONNECT => "CONNECT",
        Method::TRACE => "TRACE",
        _ => "OTHER",
    }
}

#[derive(Debug)]
enum Outcome {
    Responded {
        status: StatusCode,
        error: Option<ErrorKind>,
    },
    Panicked,
    Cancelled,
}

impl Outcome {
    // ---
    fn status_and_error(&self) -> (u16, Option<&'static str>) {
        // ---
        match self {
            Outcome::Responded { status, error } => {
                let error = error.filter(|_| status.is_server_error()).map(|kind| kind.0);
                (status.as_u16(), error)
            }
            Outcome::Panicked => (StatusCode::INTERNAL_SERVER_ERROR.as_u16(), Some("panic")),
            Outcome::Cancelled => (CLIENT_CLOSED_REQUEST, Some("cancelled")),
        }
    }
}

/// A request between arrival and completion.
pub struct InFlight {
    ctx: Option<RequestContext>,
    metrics: MetricsPtr,
}

impl InFlight {
    // ---
    fn complete(mut self, outcome: Outcome) {
        if let Some(ctx) = self.ctx.take() {
            finalize(&self.metrics, ctx, outcome);
        }
    }
}

impl Drop for InFlight {
    fn drop(&mut self) {
        // ---
        if let Some(ctx) = self.ctx.take() {
            finalize(&self.metrics, ctx, Outcome::Cancelled);
        }
    }
}

macro_rules! request_event {
    ($level:expr, $ctx:ident, $status:ident, $elapsed:ident) => {
        tracing::event!(
            $level,
            method = $ctx.method,
            path = %$ctx.path,
            route = %$ctx.route,
            status = $status,
            duration = $elapsed,
            "Request: {} {} - Status: {} - Duration: {:.3}s",
            $ctx.method,
            $ctx.path,
            $status,
            $elapsed
        )
    };
}

fn finalize(metrics: &MetricsPtr, ctx: RequestContext, outcome: Outcome) {
    // ---
    let elapsed = ctx.timer.elapsed();
    let (status, error_type) = outcome.status_and_error();

    metrics.record_http_request(ctx.method, &ctx.route, status, elapsed);
    if let Some(error_type) = error_type {
        metrics.record_app_error(error_type);
    }

    if status >= 500 {
        request_event!(tracing::Level::ERROR, ctx, status, elapsed);
    } else {
        request_event!(tracing::Level::INFO, ctx, status, elapsed);
    }
}

/// Axum middleware recording metrics and one log line per request.
///
/// Install with `axum::middleware::from_fn_with_state(Instrumentation, track_requests)`
/// through `Router::layer` so the fallback is covered as well.
pub async fn track_requests(
    State(instrumentation): State<Instrumentation>,
    req: Request,
    next: Next,
) -> Response {
    // ---
    let in_flight = instrumentation.begin(&req);

    match AssertUnwindSafe(next.run(req)).catch_unwind().await {
        Ok(response) => {
            let error = response.extensions().get::<ErrorKind>().copied();
            in_flight.complete(Outcome::Responded {
                status: response.status(),
                error,
            });
            response
        }
        Err(_panic) => {
            in_flight.complete(Outcome::Panicked);
            AppError::HandlerPanicked.into_response()
        }
    }
}
