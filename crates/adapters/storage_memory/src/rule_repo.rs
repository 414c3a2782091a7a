//! In-memory implementation of [`RuleRepository`].

use homecore_app::ports::RuleRepository;
use homecore_domain::automation::AutomationRule;
use homecore_domain::error::{HomeCoreError, NotFoundError, StorageError};
use homecore_domain::id::RuleId;
use homecore_domain::time::Timestamp;
use tokio::sync::RwLock;

/// Rules kept in insertion order.
#[derive(Debug, Default)]
pub struct InMemoryRuleRepository {
    rules: RwLock<Vec<AutomationRule>>,
}

impl InMemoryRuleRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with `rules` already stored, unvalidated.
    #[must_use]
    pub fn with_rules(rules: Vec<AutomationRule>) -> Self {
        Self {
            rules: RwLock::new(rules),
        }
    }
}

fn not_found(id: &RuleId) -> HomeCoreError {
    NotFoundError {
        entity: "Rule",
        id: id.to_string(),
    }
    .into()
}

impl RuleRepository for InMemoryRuleRepository {
    async fn create(&self, rule: AutomationRule) -> Result<AutomationRule, HomeCoreError> {
        let mut rules = self.rules.write().await;
        if rules.iter().any(|existing| existing.id == rule.id) {
            return Err(StorageError(format!("rule `{}` already exists", rule.id)).into());
        }
        rules.push(rule.clone());
        tracing::debug!(rule_id = %rule.id, "rule stored");
        Ok(rule)
    }

    async fn get_by_id(&self, id: RuleId) -> Result<Option<AutomationRule>, HomeCoreError> {
        let rules = self.rules.read().await;
        Ok(rules.iter().find(|rule| rule.id == id).cloned())
    }

    async fn get_all(&self) -> Result<Vec<AutomationRule>, HomeCoreError> {
        Ok(self.rules.read().await.clone())
    }

    async fn get_enabled(&self) -> Result<Vec<AutomationRule>, HomeCoreError> {
        let rules = self.rules.read().await;
        Ok(rules.iter().filter(|rule| rule.enabled).cloned().collect())
    }

    async fn update(&self, rule: AutomationRule) -> Result<AutomationRule, HomeCoreError> {
        let mut rules = self.rules.write().await;
        let slot = rules
            .iter_mut()
            .find(|existing| existing.id == rule.id)
            .ok_or_else(|| not_found(&rule.id))?;
        *slot = rule.clone();
        Ok(rule)
    }

    async fn delete(&self, id: RuleId) -> Result<(), HomeCoreError> {
        let mut rules = self.rules.write().await;
        let before = rules.len();
        rules.retain(|rule| rule.id != id);
        if rules.len() == before {
            return Err(not_found(&id));
        }
        Ok(())
    }

    async fn mark_executed(&self, id: RuleId, at: Timestamp) -> Result<(), HomeCoreError> {
        let mut rules = self.rules.write().await;
        match rules.iter_mut().find(|rule| rule.id == id) {
            Some(rule) => rule.last_executed = Some(at),
            None => tracing::debug!(rule_id = %id, "firing recorded for a deleted rule"),
        }
        Ok(())
    }
}
