//! The default alert callback for a standalone gateway process: log the event at
//! `warn!` rather than call out to an external paging system. A real deployment would
//! swap this for one that posts to PagerDuty or similar.

use async_trait::async_trait;
use clawshield_core::{AlertHandler, Result, ThreatEvent};
use tracing::warn;

pub struct LoggingAlertHandler;

#[async_trait]
impl AlertHandler for LoggingAlertHandler {
    async fn send_alert(&self, event: &ThreatEvent) -> Result<()> {
        warn!(
            agent_id = %event.agent_id,
            threat_type = ?event.threat_type,
            severity = %event.severity,
            "ALERT: critical threat event"
        );
        Ok(())
    }
}
