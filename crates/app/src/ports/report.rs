//! Report port: outbound execution results for logging and UI collaborators.

use std::future::Future;

use homecore_domain::error::HomeCoreError;
use homecore_domain::execution::Report;

/// Publishes [`Report`]s to interested subscribers.
pub trait ReportPublisher {
    /// Publish a report to all current subscribers.
    fn publish(&self, report: Report) -> impl Future<Output = Result<(), HomeCoreError>> + Send;
}

impl<T: ReportPublisher + Send + Sync> ReportPublisher for std::sync::Arc<T> {
    fn publish(&self, report: Report) -> impl Future<Output = Result<(), HomeCoreError>> + Send {
        (**self).publish(report)
    }
}
