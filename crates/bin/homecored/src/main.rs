//! # homecored: homecore daemon
//!
//! Composition root that wires the engine to its adapters and runs it.
//!
//! ## Responsibilities
//! - Parse configuration (config file, env vars)
//! - Register device connectors and discover devices
//! - Construct repositories and load the optional seed file
//! - Construct the engine pipeline, injecting ports
//! - Emit one clock tick at the start of each wall-clock minute
//! - Read JSON requests from stdin, one per line:
//!   `{"activate_scene": "<id>"}`, `{"trigger_rule": "<id>"}` or any event
//!   such as `{"type": "state_changed", "device_id": "...", "property": "...", "value": 30}`
//! - Log every execution report
//! - Handle graceful shutdown (SIGINT)
//!
//! ## Dependency rule
//! This is the **only** crate that depends on all other crates.
//! It is the wiring layer; no domain logic belongs here.

mod config;
mod seed;

use std::sync::Arc;
use std::time::Duration;

use chrono::{NaiveTime, Timelike};
use homecore_adapter_storage_memory::{InMemoryRuleRepository, InMemorySceneRepository};
use homecore_adapter_virtual::VirtualConnector;
use homecore_app::dispatcher::DeviceCommandDispatcher;
use homecore_app::engine::RuleEngine;
use homecore_app::executor::ActionExecutor;
use homecore_app::ports::{Clock, Connectors, SystemClock};
use homecore_app::registry::DeviceRegistry;
use homecore_app::report_bus::InProcessReportBus;
use homecore_app::scene_runner::SceneRunner;
use homecore_app::services::device_service::DeviceService;
use homecore_app::services::rule_service::RuleService;
use homecore_app::services::scene_service::SceneService;
use homecore_domain::event::Event;
use homecore_domain::execution::Report;
use homecore_domain::id::{RuleId, SceneId};
use homecore_domain::time::TimeOfDay;
use serde::Deserialize;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast;
use tracing_subscriber::EnvFilter;

use crate::config::Config;
use crate::seed::SeedFile;

type Rules = Arc<InMemoryRuleRepository>;
type Scenes = Arc<InMemorySceneRepository>;
type Bus = Arc<InProcessReportBus>;
type Engine = RuleEngine<Rules, Scenes, Bus>;
type Runner = SceneRunner<Scenes, Bus>;

/// One line on stdin.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Request {
    ActivateScene { activate_scene: SceneId },
    TriggerRule { trigger_rule: RuleId },
    Event(Event),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::load()?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&config.logging.filter))
        .init();

    let settings = config.engine_settings();

    // Devices
    let registry = Arc::new(DeviceRegistry::new());
    let mut connectors = Connectors::new();
    if config.integrations.virtual_enabled {
        connectors.register(Arc::new(VirtualConnector::demo()?));
        tracing::info!("virtual connector enabled");
    }
    let devices = DeviceService::new(Arc::clone(&registry), connectors.clone());
    let found = devices.discover(config.discovery_timeout()).await;
    tracing::info!(devices = found.len(), "device registry ready");

    // Repositories
    let rules: Rules = Arc::new(InMemoryRuleRepository::new());
    let scenes: Scenes = Arc::new(InMemorySceneRepository::new());
    if let Some(path) = &config.storage.seed_file {
        SeedFile::read(path)?
            .apply(
                &RuleService::new(Arc::clone(&rules)),
                &SceneService::new(Arc::clone(&scenes)),
            )
            .await?;
    }

    // Reports
    let bus: Bus = Arc::new(InProcessReportBus::new(256));
    tokio::spawn(log_reports(bus.subscribe()));

    // Engine
    let dispatcher = Arc::new(DeviceCommandDispatcher::new(
        registry,
        connectors,
        settings.dispatch_timeout,
    ));
    let runner = Arc::new(SceneRunner::new(
        scenes,
        Arc::clone(&dispatcher),
        Arc::clone(&bus),
    ));
    let executor = Arc::new(ActionExecutor::new(
        dispatcher,
        Arc::clone(&runner),
        bus,
        Arc::new(SystemClock),
        &settings,
    ));
    let engine = Arc::new(RuleEngine::new(rules, executor, settings));

    tokio::spawn(clock_ticks(Arc::clone(&engine)));
    tokio::spawn(serve_stdin(engine, runner));

    tracing::info!("homecored running, press ctrl-c to stop");
    tokio::signal::ctrl_c().await?;
    tracing::info!("shutting down");
    Ok(())
}

async fn log_reports(mut reports: broadcast::Receiver<Report>) {
    loop {
        match reports.recv().await {
            Ok(report) => match serde_json::to_string(&report) {
                Ok(json) => tracing::info!(target: "homecored::reports", %json, "report"),
                Err(err) => tracing::warn!(error = %err, "report could not be serialized"),
            },
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                tracing::warn!(skipped, "report log fell behind");
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}

async fn clock_ticks(engine: Arc<Engine>) {
    let mut last = None;
    loop {
        tokio::time::sleep(until_next_minute(SystemClock.time_of_day())).await;
        let time = TimeOfDay::from_time(SystemClock.time_of_day());
        // an early wake-up still reads the previous minute
        if last == Some(time) {
            continue;
        }
        last = Some(time);
        if let Err(err) = engine.handle_event(&Event::ClockTick { time }).await {
            tracing::error!(error = %err, "clock tick failed");
        }
    }
}

/// Time left until the next wall-clock minute starts.
fn until_next_minute(now: NaiveTime) -> Duration {
    let into_minute = Duration::from_secs(u64::from(now.second()))
        + Duration::from_nanos(u64::from(now.nanosecond()));
    Duration::from_secs(60).saturating_sub(into_minute)
}

async fn serve_stdin(engine: Arc<Engine>, runner: Arc<Runner>) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => {
                tracing::info!("stdin closed, no more requests");
                return;
            }
            Err(err) => {
                tracing::error!(error = %err, "failed to read stdin");
                return;
            }
        };
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<Request>(&line) {
            Ok(request) => {
                let engine = Arc::clone(&engine);
                let runner = Arc::clone(&runner);
                tokio::spawn(async move { handle(&engine, &runner, request).await });
            }
            Err(err) => tracing::warn!(error = %err, "ignoring malformed request"),
        }
    }
}

async fn handle(engine: &Engine, runner: &Runner, request: Request) {
    match request {
        Request::ActivateScene { activate_scene } => {
            runner.activate_by_id(&activate_scene).await;
        }
        Request::TriggerRule { trigger_rule } => {
            match engine.trigger_rule(&trigger_rule).await {
                Ok(Some(_)) => {}
                Ok(None) => tracing::info!(rule_id = %trigger_rule, "rule did not fire"),
                Err(err) => tracing::warn!(rule_id = %trigger_rule, error = %err, "trigger failed"),
            }
        }
        Request::Event(event) => {
            if let Err(err) = engine.handle_event(&event).await {
                tracing::error!(error = %err, "event handling failed");
            }
        }
    }
}
