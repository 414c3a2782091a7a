//! Rule Engine: matches events against enabled rules and fires them.
//!
//! A firing goes matched → conditions checked → executing → completed.
//! Rules matched by one event run concurrently; actions within a rule run
//! strictly in order and a failed action never stops the ones after it.
//! Two rules touching the same device meet at that device's lock in the
//! dispatcher, never at a global one.

use std::sync::Arc;

use futures::future::join_all;
use homecore_domain::automation::AutomationRule;
use homecore_domain::error::{HomeCoreError, NotFoundError};
use homecore_domain::event::Event;
use homecore_domain::execution::{Report, RuleExecutionResult};
use homecore_domain::id::RuleId;
use homecore_domain::time::now;
use tokio::time::Instant;

use crate::evaluator::{EvalContext, evaluate_all};
use crate::executor::{ActionExecutor, ExecContext};
use crate::ports::{ReportPublisher, RuleRepository, SceneRepository};
use crate::settings::{EngineSettings, UnmetConditionsPolicy};

pub struct RuleEngine<R, S, P> {
    rules: R,
    executor: Arc<ActionExecutor<S, P>>,
    settings: EngineSettings,
}

impl<R, S, P> RuleEngine<R, S, P>
where
    R: RuleRepository + Send + Sync,
    S: SceneRepository + Send + Sync,
    P: ReportPublisher + Send + Sync,
{
    pub fn new(rules: R, executor: Arc<ActionExecutor<S, P>>, settings: EngineSettings) -> Self {
        Self {
            rules,
            executor,
            settings,
        }
    }

    #[must_use]
    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    /// React to `event`, bounding every firing by the configured rule deadline.
    ///
    /// Returns one result per rule that fired, in rule order. Rules whose
    /// conditions do not hold yield nothing unless the engine is set to
    /// report them.
    ///
    /// # Errors
    ///
    /// Returns an error when the enabled rules cannot be loaded. Once rules
    /// have fired their results are always returned; device failures and
    /// failures to record a run never surface here.
    #[tracing::instrument(skip(self, event), fields(event = event.kind()))]
    pub async fn handle_event(
        &self,
        event: &Event,
    ) -> Result<Vec<RuleExecutionResult>, HomeCoreError> {
        let deadline = self
            .settings
            .rule_deadline
            .map(|budget| Instant::now() + budget);
        self.handle_event_until(event, deadline).await
    }

    /// Like [`handle_event`](Self::handle_event) with a caller-supplied deadline.
    ///
    /// # Errors
    ///
    /// Returns an error when the enabled rules cannot be loaded.
    pub async fn handle_event_until(
        &self,
        event: &Event,
        deadline: Option<Instant>,
    ) -> Result<Vec<RuleExecutionResult>, HomeCoreError> {
        if let Event::StateChanged {
            device_id,
            property,
            value,
        } = event
            && self
                .executor
                .registry()
                .update_state(device_id, property.clone(), value.clone())
                .is_none()
        {
            tracing::debug!(%device_id, %property, "state report for unknown device");
        }

        let rules = self.rules.get_enabled().await?;
        let matched: Vec<&AutomationRule> = rules
            .iter()
            .filter(|rule| rule.enabled && rule.trigger.matches(event))
            .collect();
        tracing::debug!(matched = matched.len(), "rules matched");

        let firings = matched.into_iter().map(|rule| self.fire(rule, deadline));
        Ok(join_all(firings).await.into_iter().flatten().collect())
    }

    /// Fire one rule by hand, ignoring its trigger.
    ///
    /// Returns `None` when the rule is disabled or its conditions do not
    /// hold under the skip policy.
    ///
    /// # Errors
    ///
    /// Returns [`NotFoundError`] for an unknown rule, or a storage error.
    #[tracing::instrument(skip(self))]
    pub async fn trigger_rule(
        &self,
        rule_id: &RuleId,
    ) -> Result<Option<RuleExecutionResult>, HomeCoreError> {
        let rule = self
            .rules
            .get_by_id(rule_id.clone())
            .await?
            .ok_or_else(|| NotFoundError {
                entity: "Rule",
                id: rule_id.to_string(),
            })?;
        if !rule.enabled {
            tracing::debug!("rule disabled, not firing");
            return Ok(None);
        }
        let deadline = self
            .settings
            .rule_deadline
            .map(|budget| Instant::now() + budget);
        Ok(self.fire(&rule, deadline).await)
    }

    #[tracing::instrument(skip(self, rule, deadline), fields(rule_id = %rule.id, rule_name = %rule.name))]
    async fn fire(
        &self,
        rule: &AutomationRule,
        deadline: Option<Instant>,
    ) -> Option<RuleExecutionResult> {
        let started = now();

        let holds = {
            let ctx = EvalContext::new(
                &**self.executor.registry(),
                self.executor.clock().time_of_day(),
            );
            evaluate_all(&rule.conditions, &ctx)
        };
        if !holds {
            return match self.settings.unmet_conditions {
                UnmetConditionsPolicy::Skip => {
                    tracing::debug!("conditions not met, skipping");
                    None
                }
                UnmetConditionsPolicy::Report => {
                    let result = RuleExecutionResult::conditions_not_met(rule.id.clone(), started);
                    self.publish(&result).await;
                    Some(result)
                }
            };
        }

        let ctx = ExecContext::for_rule(rule.id.clone(), deadline);
        let mut action_results = Vec::with_capacity(rule.actions.len());
        for action in &rule.actions {
            action_results.push(self.executor.execute(action, &ctx).await);
        }

        let result = RuleExecutionResult::new(rule.id.clone(), action_results, started);
        if result.success() {
            tracing::info!(message = result.message(), "rule fired");
        } else {
            tracing::warn!(message = result.message(), "rule fired with failures");
        }
        // the report goes out even when recording the run fails
        self.publish(&result).await;
        if let Err(err) = self.rules.mark_executed(rule.id.clone(), started).await {
            tracing::warn!(error = %err, "failed to record rule run");
        }
        Some(result)
    }

    async fn publish(&self, result: &RuleExecutionResult) {
        if let Err(err) = self
            .executor
            .publisher()
            .publish(Report::RuleExecuted(result.clone()))
            .await
        {
            tracing::warn!(error = %err, "failed to publish rule report");
        }
    }
}
