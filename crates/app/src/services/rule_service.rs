//! Rule service: use-cases for managing automation rules.

use homecore_domain::automation::AutomationRule;
use homecore_domain::error::{HomeCoreError, NotFoundError};
use homecore_domain::id::RuleId;
use homecore_domain::time::now;

use crate::ports::RuleRepository;

/// Application service for rule CRUD operations.
pub struct RuleService<R> {
    repo: R,
}

impl<R: RuleRepository> RuleService<R> {
    /// Create a new service backed by the given repository.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Store a new rule after validating its trees.
    ///
    /// # Errors
    ///
    /// Returns [`HomeCoreError::Validation`] if invariants fail, or a
    /// storage error propagated from the repository.
    #[tracing::instrument(skip(self, rule), fields(rule_name = %rule.name))]
    pub async fn create_rule(&self, rule: AutomationRule) -> Result<AutomationRule, HomeCoreError> {
        rule.validate()?;
        self.repo.create(rule).await
    }

    /// Look up a rule by id, returning an error if not found.
    ///
    /// # Errors
    ///
    /// Returns [`HomeCoreError::NotFound`] when no rule with `id` exists,
    /// or a storage error from the repository.
    #[tracing::instrument(skip(self))]
    pub async fn get_rule(&self, id: RuleId) -> Result<AutomationRule, HomeCoreError> {
        let missing = id.to_string();
        self.repo.get_by_id(id).await?.ok_or_else(|| {
            NotFoundError {
                entity: "Rule",
                id: missing,
            }
            .into()
        })
    }

    /// List all rules.
    ///
    /// # Errors
    ///
    /// Returns a storage error propagated from the repository.
    pub async fn list_rules(&self) -> Result<Vec<AutomationRule>, HomeCoreError> {
        self.repo.get_all().await
    }

    /// # Errors
    ///
    /// Returns a storage error propagated from the repository.
    pub async fn list_enabled(&self) -> Result<Vec<AutomationRule>, HomeCoreError> {
        self.repo.get_enabled().await
    }

    /// Replace a stored rule, bumping its `updated_at`.
    ///
    /// # Errors
    ///
    /// Returns [`HomeCoreError::Validation`] if invariants fail, or a
    /// storage error from the repository.
    #[tracing::instrument(skip(self, rule), fields(rule_id = %rule.id))]
    pub async fn update_rule(
        &self,
        mut rule: AutomationRule,
    ) -> Result<AutomationRule, HomeCoreError> {
        rule.validate()?;
        rule.updated_at = now();
        self.repo.update(rule).await
    }

    /// Enable or disable a rule.
    ///
    /// # Errors
    ///
    /// Returns [`HomeCoreError::NotFound`] for an unknown rule, or a
    /// storage error from the repository.
    #[tracing::instrument(skip(self))]
    pub async fn set_enabled(
        &self,
        id: RuleId,
        enabled: bool,
    ) -> Result<AutomationRule, HomeCoreError> {
        let mut rule = self.get_rule(id).await?;
        rule.enabled = enabled;
        rule.updated_at = now();
        self.repo.update(rule).await
    }

    /// Delete a rule by id.
    ///
    /// # Errors
    ///
    /// Returns a storage error propagated from the repository.
    #[tracing::instrument(skip(self))]
    pub async fn delete_rule(&self, id: RuleId) -> Result<(), HomeCoreError> {
        self.repo.delete(id).await
    }
}

#[cfg(test)]
mod tests {
    use homecore_domain::automation::{Action, Condition};
    use homecore_domain::error::ValidationError;

    use super::*;
    use crate::testing::InMemoryRules;

    fn make_service() -> RuleService<InMemoryRules> {
        RuleService::new(InMemoryRules::default())
    }

    fn valid_rule() -> AutomationRule {
        AutomationRule::builder()
            .id("goodnight")
            .name("Goodnight")
            .action(Action::Notification {
                message: "sleep well".to_string(),
            })
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn should_create_rule_when_valid() {
        let svc = make_service();

        svc.create_rule(valid_rule()).await.unwrap();

        let fetched = svc.get_rule(RuleId::from("goodnight")).await.unwrap();
        assert_eq!(fetched.name, "Goodnight");
    }

    #[tokio::test]
    async fn should_reject_rule_without_actions() {
        let svc = make_service();
        let mut rule = valid_rule();
        rule.actions.clear();

        let result = svc.create_rule(rule).await;

        assert!(matches!(
            result,
            Err(HomeCoreError::Validation(ValidationError::NoActions))
        ));
        assert!(svc.list_rules().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn should_reject_tree_deeper_than_allowed() {
        let svc = make_service();
        let mut condition = Condition::and(vec![]);
        for _ in 0..20 {
            condition = Condition::not(condition);
        }
        let mut rule = valid_rule();
        rule.conditions.push(condition);

        let result = svc.create_rule(rule).await;

        assert!(matches!(
            result,
            Err(HomeCoreError::Validation(ValidationError::TreeTooDeep { .. }))
        ));
    }

    #[tokio::test]
    async fn should_return_not_found_for_unknown_rule() {
        let svc = make_service();

        let result = svc.get_rule(RuleId::from("ghost")).await;

        assert!(matches!(result, Err(HomeCoreError::NotFound(_))));
    }

    #[tokio::test]
    async fn should_toggle_enabled_flag() {
        let svc = make_service();
        svc.create_rule(valid_rule()).await.unwrap();

        svc.set_enabled(RuleId::from("goodnight"), false)
            .await
            .unwrap();

        assert!(svc.list_enabled().await.unwrap().is_empty());
        assert_eq!(svc.list_rules().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn should_bump_updated_at_on_update() {
        let svc = make_service();
        let created = svc.create_rule(valid_rule()).await.unwrap();
        let mut changed = created.clone();
        changed.name = "Good night".to_string();

        let updated = svc.update_rule(changed).await.unwrap();

        assert_eq!(updated.name, "Good night");
        assert!(updated.updated_at >= created.updated_at);
    }

    #[tokio::test]
    async fn should_delete_rule() {
        let svc = make_service();
        svc.create_rule(valid_rule()).await.unwrap();

        svc.delete_rule(RuleId::from("goodnight")).await.unwrap();

        assert!(svc.list_rules().await.unwrap().is_empty());
    }
}
