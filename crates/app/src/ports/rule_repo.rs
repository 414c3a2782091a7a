//! Rule repository port: persistence for automation rules.

use std::future::Future;

use homecore_domain::automation::AutomationRule;
use homecore_domain::error::HomeCoreError;
use homecore_domain::id::RuleId;
use homecore_domain::time::Timestamp;

/// Repository for persisting and querying [`AutomationRule`]s.
///
/// Listing methods return rules in a stable order; the engine reports
/// results in that order.
pub trait RuleRepository {
    fn create(
        &self,
        rule: AutomationRule,
    ) -> impl Future<Output = Result<AutomationRule, HomeCoreError>> + Send;

    fn get_by_id(
        &self,
        id: RuleId,
    ) -> impl Future<Output = Result<Option<AutomationRule>, HomeCoreError>> + Send;

    fn get_all(&self) -> impl Future<Output = Result<Vec<AutomationRule>, HomeCoreError>> + Send;

    fn get_enabled(
        &self,
    ) -> impl Future<Output = Result<Vec<AutomationRule>, HomeCoreError>> + Send;

    /// Replace an existing rule.
    fn update(
        &self,
        rule: AutomationRule,
    ) -> impl Future<Output = Result<AutomationRule, HomeCoreError>> + Send;

    fn delete(&self, id: RuleId) -> impl Future<Output = Result<(), HomeCoreError>> + Send;

    /// Record a firing. A rule deleted in the meantime is ignored.
    fn mark_executed(
        &self,
        id: RuleId,
        at: Timestamp,
    ) -> impl Future<Output = Result<(), HomeCoreError>> + Send;
}

impl<T: RuleRepository + Send + Sync> RuleRepository for std::sync::Arc<T> {
    fn create(
        &self,
        rule: AutomationRule,
    ) -> impl Future<Output = Result<AutomationRule, HomeCoreError>> + Send {
        (**self).create(rule)
    }

    fn get_by_id(
        &self,
        id: RuleId,
    ) -> impl Future<Output = Result<Option<AutomationRule>, HomeCoreError>> + Send {
        (**self).get_by_id(id)
    }

    fn get_all(&self) -> impl Future<Output = Result<Vec<AutomationRule>, HomeCoreError>> + Send {
        (**self).get_all()
    }

    fn get_enabled(
        &self,
    ) -> impl Future<Output = Result<Vec<AutomationRule>, HomeCoreError>> + Send {
        (**self).get_enabled()
    }

    fn update(
        &self,
        rule: AutomationRule,
    ) -> impl Future<Output = Result<AutomationRule, HomeCoreError>> + Send {
        (**self).update(rule)
    }

    fn delete(&self, id: RuleId) -> impl Future<Output = Result<(), HomeCoreError>> + Send {
        (**self).delete(id)
    }

    fn mark_executed(
        &self,
        id: RuleId,
        at: Timestamp,
    ) -> impl Future<Output = Result<(), HomeCoreError>> + Send {
        (**self).mark_executed(id, at)
    }
}
