//! HTTP middleware.

mod instrumentation;
mod timer;

pub use instrumentation::{
    track_requests, InFlight, Instrumentation, RequestContext, CLIENT_CLOSED_REQUEST,
    UNKNOWN_ROUTE,
};
pub use timer::RequestTimer;
