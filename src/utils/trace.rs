//! Query traces: one typed record per listing call, logged as a JSON line under the
//! `campquery::trace` target and optionally captured on the current thread.

use serde::Serialize;
use std::cell::RefCell;
use std::marker::PhantomData;

pub const TRACE_TARGET: &str = "campquery::trace";

/// What one `advanced_results` call read and returned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QueryTrace {
    pub collection: String,
    pub duration_ms: u64,
    /// Matches for the filter, ignoring pagination.
    pub total: u64,
    pub returned: u64,
    pub page: u64,
    pub limit: u64,
    pub skip: u64,
}

thread_local! {
    static CAPTURED: RefCell<Option<Vec<QueryTrace>>> = const { RefCell::new(None) };
}

/// Collects the traces recorded on this thread until dropped.
///
/// Captures are per thread, so async tests must run on a current-thread runtime.
pub struct TraceCapture {
    _thread_bound: PhantomData<*const ()>,
}

impl TraceCapture {
    /// Takes the records collected so far.
    #[must_use]
    pub fn take(&self) -> Vec<QueryTrace> {
        CAPTURED.with(|c| c.borrow_mut().as_mut().map(std::mem::take).unwrap_or_default())
    }
}

impl Drop for TraceCapture {
    fn drop(&mut self) {
        CAPTURED.with(|c| *c.borrow_mut() = None);
    }
}

/// Starts capturing on the current thread, discarding anything captured before.
#[must_use]
pub fn capture() -> TraceCapture {
    CAPTURED.with(|c| *c.borrow_mut() = Some(Vec::new()));
    TraceCapture { _thread_bound: PhantomData }
}

pub fn record(trace: QueryTrace) {
    if log::log_enabled!(target: TRACE_TARGET, log::Level::Trace) {
        match serde_json::to_string(&trace) {
            Ok(line) => log::trace!(target: TRACE_TARGET, "{line}"),
            Err(e) => log::warn!("unserializable query trace for {}: {e}", trace.collection),
        }
    }
    CAPTURED.with(|c| {
        if let Some(buf) = c.borrow_mut().as_mut() {
            buf.push(trace);
        }
    });
}
