//! In-process report bus backed by a tokio broadcast channel.

use std::future::Future;

use tokio::sync::broadcast;

use homecore_domain::error::HomeCoreError;
use homecore_domain::execution::Report;

use crate::ports::ReportPublisher;

/// In-process report bus using a tokio [`broadcast`] channel.
///
/// Publishing succeeds even when there are no active subscribers
/// (the report is simply dropped).
pub struct InProcessReportBus {
    sender: broadcast::Sender<Report>,
}

impl InProcessReportBus {
    /// Create a new bus with the given channel capacity.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Subscribe to reports published *after* this call.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<Report> {
        self.sender.subscribe()
    }
}

impl ReportPublisher for InProcessReportBus {
    fn publish(&self, report: Report) -> impl Future<Output = Result<(), HomeCoreError>> + Send {
        // send fails only when nobody listens
        let _ = self.sender.send(report);
        async { Ok(()) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn notification(message: &str) -> Report {
        Report::Notification {
            rule_id: None,
            message: message.to_string(),
        }
    }

    #[tokio::test]
    async fn should_deliver_report_to_every_subscriber() {
        let bus = InProcessReportBus::new(16);
        let mut rx1 = bus.subscribe();
        let mut rx2 = bus.subscribe();

        bus.publish(notification("door open")).await.unwrap();

        assert_eq!(rx1.recv().await.unwrap(), notification("door open"));
        assert_eq!(rx2.recv().await.unwrap(), notification("door open"));
    }

    #[tokio::test]
    async fn should_succeed_when_no_subscribers() {
        let bus = InProcessReportBus::new(16);
        assert!(bus.publish(notification("nobody home")).await.is_ok());
    }

    #[tokio::test]
    async fn should_not_deliver_reports_published_before_subscription() {
        let bus = InProcessReportBus::new(16);
        bus.publish(notification("early")).await.unwrap();

        let mut rx = bus.subscribe();
        bus.publish(notification("late")).await.unwrap();

        assert_eq!(rx.recv().await.unwrap(), notification("late"));
    }
}
