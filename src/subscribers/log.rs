//! # LogWriter: renders events to `tracing`
//!
//! Each event becomes one line at its [`Event::level`], with the worker label
//! and pid attached as fields.
//!
//! ## Example output
//! ```text
//! INFO  procvisor: Starting API server worker="API server"
//! INFO  procvisor: Started API server with Process ID: 4242 worker="API server" pid=4242
//! WARN  procvisor: Process API server with ID 4242 not found. Restarting... worker="API server" pid=4242 delay_ms=500
//! INFO  procvisor: Restarted API server with Process ID: 4250 worker="API server" pid=4250
//! ERROR procvisor: File path is null. Skipping this worker.
//! INFO  procvisor: Supervisor is stopping...
//! ```

use async_trait::async_trait;
use tracing::Level;

use crate::events::Event;
use crate::subscribers::Subscribe;

/// Subscriber writing every event to the `tracing` logging sink.
#[derive(Default)]
pub struct LogWriter;

impl LogWriter {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

macro_rules! emit {
    ($lvl:expr, $e:expr, $msg:expr) => {
        tracing::event!(
            target: "procvisor",
            $lvl,
            worker = $e.worker.as_deref(),
            pid = $e.pid.map(|p| p.as_u32()),
            prev_pid = $e.prev_pid.map(|p| p.as_u32()),
            delay_ms = $e.delay_ms,
            attempt = $e.attempt,
            "{}",
            $msg
        )
    };
}

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_event(&self, e: &Event) {
        let msg = e.message();
        // `tracing::event!` needs a constant level.
        let level = e.level();
        if level == Level::ERROR {
            emit!(Level::ERROR, e, msg);
        } else if level == Level::WARN {
            emit!(Level::WARN, e, msg);
        } else if level == Level::INFO {
            emit!(Level::INFO, e, msg);
        } else {
            emit!(Level::DEBUG, e, msg);
        }
    }

    fn name(&self) -> &'static str {
        "LogWriter"
    }
}
