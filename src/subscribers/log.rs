//! # Simple logging subscriber for debugging and demos.
//!
//! [`LogWriter`] prints notices to stdout in a human-readable format.
//!
//! ## Output format
//! ```text
//! [started]
//! [skipped] tick=2024-01-01T00:00:05.000Z reason="tick already past by 3.2s"
//! [produced] #0 @ 2024-01-01T00:00:05.000Z producer=sensor
//! [consumed] #0 @ 2024-01-01T00:00:05.000Z results=[0, 0]
//! [overflow] dropped=#0 @ 2024-01-01T00:00:05.000Z
//! [failed] stage=production reason="..."
//! [stop-requested]
//! [stopped] reason="stop requested"
//! ```

use async_trait::async_trait;

use crate::notices::{Notice, NoticeKind};
use crate::subscribers::Subscribe;

/// Stdout logging subscriber.
///
/// Enabled via the `logging` feature. Not intended for production use;
/// implement a custom [`Subscribe`] for structured logging or metrics.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogWriter;

impl LogWriter {
    /// Renders one notice as a single line.
    pub fn render(n: &Notice) -> String {
        let event = n.event.map(|e| e.to_string()).unwrap_or_default();
        let reason = n.reason.as_deref().unwrap_or_default();
        match n.kind {
            NoticeKind::ConveyorStarted => "[started]".to_string(),
            NoticeKind::StopRequested => "[stop-requested]".to_string(),
            NoticeKind::ConveyorStopped => format!("[stopped] reason={reason:?}"),
            NoticeKind::TickSkipped => {
                let tick = n
                    .event_time
                    .map(|t| t.to_rfc3339_opts(chrono::SecondsFormat::Millis, true))
                    .unwrap_or_default();
                format!("[skipped] tick={tick} reason={reason:?}")
            }
            NoticeKind::EventProduced => format!(
                "[produced] {event} producer={}",
                n.name.as_deref().unwrap_or_default()
            ),
            NoticeKind::ConsumersCompleted => format!(
                "[consumed] {event} results={:?}",
                n.results.as_deref().unwrap_or_default()
            ),
            NoticeKind::QueueOverflow => format!("[overflow] dropped={event}"),
            NoticeKind::StageFailed => format!(
                "[failed] stage={} reason={reason:?}",
                n.stage.map(|s| s.as_str()).unwrap_or("?")
            ),
            NoticeKind::SubscriberPanicked | NoticeKind::SubscriberOverflow => format!(
                "[subscriber] name={} reason={reason:?}",
                n.name.as_deref().unwrap_or_default()
            ),
        }
    }
}

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_notice(&self, n: &Notice) {
        println!("{}", Self::render(n));
    }

    fn name(&self) -> &'static str {
        "log-writer"
    }
}

#[cfg(test)]
mod tests {
    use chrono::DateTime;

    use super::*;
    use crate::core::Stage;
    use crate::schedule::Event;

    #[test]
    fn renders_event_notices() {
        let ev = Event {
            event_time: DateTime::from_timestamp(5, 0).unwrap(),
            loop_counter: 0,
        };
        let line = LogWriter::render(
            &Notice::new(NoticeKind::ConsumersCompleted)
                .with_event(&ev)
                .with_results(&[0, 3]),
        );
        assert_eq!(line, "[consumed] #0 @ 1970-01-01T00:00:05.000Z results=[0, 3]");

        let failed = LogWriter::render(
            &Notice::new(NoticeKind::StageFailed)
                .with_stage(Stage::Production)
                .with_reason("boom"),
        );
        assert_eq!(failed, "[failed] stage=production reason=\"boom\"");
    }
}
