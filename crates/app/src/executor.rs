//! Action Executor: runs one action tree and reports what happened.
//!
//! Nothing here returns an error. Device failures, vetoes and deadline
//! expiry all come back as an unsuccessful [`ActionResult`].

use std::sync::Arc;
use std::time::Duration;

use futures::future::BoxFuture;
use homecore_domain::automation::Action;
use homecore_domain::command::DeviceCommand;
use homecore_domain::execution::{ActionResult, DeviceCommandResult, ErrorCode, Report};
use homecore_domain::id::{DeviceId, RuleId};
use tokio::time::Instant;

use crate::dispatcher::DeviceCommandDispatcher;
use crate::evaluator::{EvalContext, evaluate};
use crate::ports::{ActionAuthorizer, Clock, ReportPublisher, SceneRepository};
use crate::registry::DeviceRegistry;
use crate::scene_runner::SceneRunner;
use crate::settings::EngineSettings;

/// Per-firing context threaded through an action tree.
#[derive(Debug, Clone, Default)]
pub struct ExecContext {
    /// Rule being fired, if any. Carried into notifications.
    pub rule_id: Option<RuleId>,
    /// Actions not started by this instant are cancelled; running ones are cut short.
    pub deadline: Option<Instant>,
}

impl ExecContext {
    #[must_use]
    pub fn for_rule(rule_id: RuleId, deadline: Option<Instant>) -> Self {
        Self {
            rule_id: Some(rule_id),
            deadline,
        }
    }

    fn expired(&self) -> bool {
        self.deadline.is_some_and(|deadline| Instant::now() >= deadline)
    }
}

pub struct ActionExecutor<S, P> {
    dispatcher: Arc<DeviceCommandDispatcher>,
    scenes: Arc<SceneRunner<S, P>>,
    publisher: P,
    clock: Arc<dyn Clock>,
    authorizer: Option<Arc<dyn ActionAuthorizer>>,
    retries: u32,
}

impl<S, P> ActionExecutor<S, P>
where
    S: SceneRepository + Send + Sync,
    P: ReportPublisher + Send + Sync,
{
    pub fn new(
        dispatcher: Arc<DeviceCommandDispatcher>,
        scenes: Arc<SceneRunner<S, P>>,
        publisher: P,
        clock: Arc<dyn Clock>,
        settings: &EngineSettings,
    ) -> Self {
        Self {
            dispatcher,
            scenes,
            publisher,
            clock,
            authorizer: None,
            retries: settings.command_retries,
        }
    }

    /// Consult `authorizer` before every device action.
    #[must_use]
    pub fn with_authorizer(mut self, authorizer: Arc<dyn ActionAuthorizer>) -> Self {
        self.authorizer = Some(authorizer);
        self
    }

    #[must_use]
    pub fn registry(&self) -> &Arc<DeviceRegistry> {
        self.dispatcher.registry()
    }

    #[must_use]
    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    pub fn publisher(&self) -> &P {
        &self.publisher
    }

    /// Execute `action` within the context's deadline.
    pub fn execute<'a>(
        &'a self,
        action: &'a Action,
        ctx: &'a ExecContext,
    ) -> BoxFuture<'a, ActionResult> {
        Box::pin(async move {
            let kind = action.kind();
            let Some(deadline) = ctx.deadline else {
                return self.run(action, ctx).await;
            };
            if ctx.expired() {
                tracing::debug!(action = kind, "deadline passed before action started");
                return ActionResult::cancelled(kind);
            }
            match tokio::time::timeout_at(deadline, self.run(action, ctx)).await {
                Ok(result) => result,
                Err(_elapsed) => {
                    tracing::warn!(action = kind, "action cut short by deadline");
                    ActionResult::failed(kind, ErrorCode::DeadlineExceeded, "deadline exceeded")
                }
            }
        })
    }

    async fn run(&self, action: &Action, ctx: &ExecContext) -> ActionResult {
        match action {
            Action::Device { device_id, command } => self.device(device_id, command).await,
            Action::Scene { scene_id } => {
                let result = self.scenes.activate_by_id(scene_id).await;
                ActionResult::new("scene", result.success(), result.message())
            }
            Action::Notification { message } => {
                tracing::info!(rule_id = ?ctx.rule_id, %message, "notification");
                let report = Report::Notification {
                    rule_id: ctx.rule_id.clone(),
                    message: message.clone(),
                };
                if let Err(err) = self.publisher.publish(report).await {
                    tracing::warn!(error = %err, "failed to publish notification");
                }
                ActionResult::succeeded("notification", message.clone())
            }
            Action::Delay { seconds } => {
                tokio::time::sleep(Duration::from_secs(*seconds)).await;
                ActionResult::succeeded("delay", format!("waited {seconds}s"))
            }
            Action::Conditional {
                condition,
                then,
                otherwise,
            } => {
                let holds = {
                    let eval = EvalContext::new(&**self.registry(), self.clock.time_of_day());
                    evaluate(condition, &eval)
                };
                match (holds, otherwise) {
                    (true, _) => self.execute(then, ctx).await,
                    (false, Some(otherwise)) => self.execute(otherwise, ctx).await,
                    (false, None) => {
                        ActionResult::succeeded("conditional", "condition not met, branch skipped")
                    }
                }
            }
        }
    }

    async fn device(&self, device_id: &DeviceId, command: &DeviceCommand) -> ActionResult {
        if let Some(authorizer) = &self.authorizer
            && let Err(reason) = authorizer.authorize(device_id, command)
        {
            tracing::warn!(%device_id, %command, %reason, "device action denied");
            return ActionResult::failed(command.kind(), ErrorCode::Denied, reason);
        }
        self.dispatch_with_retry(device_id, command).await.into()
    }

    async fn dispatch_with_retry(
        &self,
        device_id: &DeviceId,
        command: &DeviceCommand,
    ) -> DeviceCommandResult {
        let mut attempt = 0;
        loop {
            let result = self.dispatcher.dispatch(device_id, command, None).await;
            match result.error_code() {
                Some(code) if code.is_transient() && attempt < self.retries => {
                    attempt += 1;
                    tracing::debug!(%device_id, %code, attempt, "retrying device command");
                }
                _ => return result,
            }
        }
    }
}
