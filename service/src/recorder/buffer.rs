//! Trace buffer implementations

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;

use super::executor::QueryExecutor;
use super::{CapturedCall, CapturedStatement};
use crate::utils::sql::is_explainable;

/// Capture buffer for recorded calls.
///
/// `record` is a no-op while capture is off, so instrumentation can stay in
/// place permanently. `export` is non-destructive; the processing pass calls
/// `clear` only after a fully successful run.
#[async_trait]
pub trait TraceBuffer: Send + Sync {
    fn start(&self);
    fn stop(&self);
    fn is_recording(&self) -> bool;
    async fn record(&self, call: CapturedCall);
    /// Snapshot of all buffered calls in capture order
    async fn export(&self) -> Vec<CapturedCall>;
    async fn clear(&self);
}

/// In-process trace buffer for embedding the pipeline inside the observed
/// application
#[derive(Default)]
pub struct MemoryBuffer {
    recording: AtomicBool,
    calls: Mutex<Vec<CapturedCall>>,
}

impl MemoryBuffer {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TraceBuffer for MemoryBuffer {
    fn start(&self) {
        self.recording.store(true, Ordering::SeqCst);
    }

    fn stop(&self) {
        self.recording.store(false, Ordering::SeqCst);
    }

    fn is_recording(&self) -> bool {
        self.recording.load(Ordering::SeqCst)
    }

    async fn record(&self, call: CapturedCall) {
        if !self.is_recording() {
            return;
        }
        self.calls.lock().push(call);
    }

    async fn export(&self) -> Vec<CapturedCall> {
        self.calls.lock().clone()
    }

    async fn clear(&self) {
        self.calls.lock().clear();
    }
}

/// Capture one executed statement into the buffer.
///
/// Explainable statements get their plan attached at capture time; a failed
/// EXPLAIN defers resolution to the processing pass instead of dropping the
/// statement. Everything else buffers with an empty plan.
pub async fn capture_statement(buffer: &dyn TraceBuffer, executor: &dyn QueryExecutor, sql: &str) {
    if !buffer.is_recording() {
        return;
    }

    let explain_rows = if is_explainable(sql) {
        match executor.explain(sql).await {
            Ok(rows) => Some(rows),
            Err(e) => {
                tracing::warn!(error = %e, "EXPLAIN failed at capture time, deferring");
                None
            }
        }
    } else {
        Some(Vec::new())
    };

    buffer
        .record(CapturedCall {
            statements: vec![CapturedStatement {
                query: sql.to_string(),
                explain_rows,
            }],
        })
        .await;
}
