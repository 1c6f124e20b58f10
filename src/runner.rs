//! Runs scenarios with one browser session per scenario and a fixed pool of workers.

use crate::browser::{BrowserSession, SessionLauncher};
use crate::config::RunConfig;
use crate::error::Result;
use crate::feature::Scenario;
use crate::session::{SessionRegistry, WorkerId};
use crate::steps::{bind_all, ScenarioContext, Step};
use crate::test_log::TestLog;
use futures::FutureExt;
use log::{error, info, warn};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::collections::VecDeque;
use std::panic::AssertUnwindSafe;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ScenarioStatus {
    Passed,
    Failed,
    Undefined,
}

impl ScenarioStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ScenarioStatus::Passed => "PASSED",
            ScenarioStatus::Failed => "FAILED",
            ScenarioStatus::Undefined => "UNDEFINED",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioResult {
    pub name: String,
    pub status: ScenarioStatus,
    pub duration_ms: u64,
    pub steps_run: usize,
    pub steps_total: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SuiteReport {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub undefined: usize,
    pub duration_ms: u64,
    pub scenarios: Vec<ScenarioResult>,
}

impl SuiteReport {
    fn from_results(scenarios: Vec<ScenarioResult>, duration_ms: u64) -> Self {
        let count = |status| scenarios.iter().filter(|r| r.status == status).count();
        Self {
            total: scenarios.len(),
            passed: count(ScenarioStatus::Passed),
            failed: count(ScenarioStatus::Failed),
            undefined: count(ScenarioStatus::Undefined),
            duration_ms,
            scenarios,
        }
    }

    pub fn all_passed(&self) -> bool {
        self.passed == self.total
    }

    pub fn write_json(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }
}

fn scenario_result(
    scenario: &Scenario,
    started: Instant,
    status: ScenarioStatus,
    steps_run: usize,
    error: Option<String>,
) -> ScenarioResult {
    ScenarioResult {
        name: scenario.name.clone(),
        status,
        duration_ms: started.elapsed().as_millis() as u64,
        steps_run,
        steps_total: scenario.steps.len(),
        error,
    }
}

pub struct ScenarioRunner<L: SessionLauncher> {
    launcher: Arc<L>,
    registry: Arc<SessionRegistry<L::Session>>,
    config: Arc<RunConfig>,
    log: Arc<TestLog>,
}

impl<L: SessionLauncher> Clone for ScenarioRunner<L> {
    fn clone(&self) -> Self {
        Self {
            launcher: Arc::clone(&self.launcher),
            registry: Arc::clone(&self.registry),
            config: Arc::clone(&self.config),
            log: Arc::clone(&self.log),
        }
    }
}

impl<L> ScenarioRunner<L>
where
    L: SessionLauncher + 'static,
{
    pub fn new(launcher: L, config: RunConfig, log: TestLog) -> Self {
        Self {
            launcher: Arc::new(launcher),
            registry: Arc::new(SessionRegistry::new()),
            config: Arc::new(config),
            log: Arc::new(log),
        }
    }

    pub fn registry(&self) -> &SessionRegistry<L::Session> {
        &self.registry
    }

    pub fn log(&self) -> &TestLog {
        &self.log
    }

    /// Runs one scenario on `worker`. The worker's session is torn down on every path.
    pub async fn run_scenario(&self, worker: WorkerId, scenario: &Scenario) -> ScenarioResult {
        let started = Instant::now();

        let steps = match bind_all(&scenario.steps) {
            Ok(steps) => steps,
            Err(e) => {
                warn!("{}: {}", scenario.name, e);
                self.log.scenario_start(&scenario.name);
                self.log.log(&format!("❌ {}", e));
                self.log
                    .scenario_end(&scenario.name, ScenarioStatus::Undefined.as_str());
                let error = Some(e.to_string());
                return scenario_result(scenario, started, ScenarioStatus::Undefined, 0, error);
            }
        };

        let (steps_run, outcome) = self.run_steps(worker, &scenario.name, &steps).await;

        let status = match &outcome {
            Ok(()) => ScenarioStatus::Passed,
            Err(e) => {
                if e.is_assertion() {
                    self.log.log(&format!("❌ {}", e));
                } else {
                    error!("{} on {} aborted: {}", scenario.name, worker, e);
                    self.log.log(&format!("❌ Scenario aborted: {}", e));
                }
                ScenarioStatus::Failed
            }
        };
        self.log.scenario_end(&scenario.name, status.as_str());

        if let Err(e) = self.registry.teardown(worker).await {
            warn!("Teardown for {} failed: {}", worker, e);
        }

        let error = outcome.err().map(|e| e.to_string());
        scenario_result(scenario, started, status, steps_run, error)
    }

    async fn run_steps(
        &self,
        worker: WorkerId,
        name: &str,
        steps: &[Step],
    ) -> (usize, Result<()>) {
        let session = match self.start_session(worker).await {
            Ok(session) => session,
            Err(e) => {
                self.log.scenario_start(name);
                return (0, Err(e));
            }
        };
        self.log.scenario_start(name);

        let mut context =
            ScenarioContext::new(session, Arc::clone(&self.config), Arc::clone(&self.log));
        for (index, step) in steps.iter().enumerate() {
            if let Err(e) = context.execute(step).await {
                return (index, Err(e));
            }
        }
        (steps.len(), Ok(()))
    }

    async fn start_session(&self, worker: WorkerId) -> Result<Arc<L::Session>> {
        let session = self.registry.initialize(worker, self.launcher.as_ref()).await?;
        session.maximize().await?;
        Ok(session)
    }

    /// Runs every scenario across `workers` concurrent workers and collects the
    /// results in input order.
    pub async fn run_all(&self, scenarios: Vec<Scenario>, workers: usize) -> SuiteReport {
        let started = Instant::now();
        let total = scenarios.len();
        let workers = workers.clamp(1, total.max(1));
        info!("Running {} scenario(s) on {} worker(s)", total, workers);

        let planned: Vec<(String, usize)> = scenarios
            .iter()
            .map(|s| (s.name.clone(), s.steps.len()))
            .collect();
        let queue: Arc<Mutex<VecDeque<(usize, Scenario)>>> =
            Arc::new(Mutex::new(scenarios.into_iter().enumerate().collect()));

        let mut handles = Vec::with_capacity(workers);
        for id in 0..workers {
            let runner = self.clone();
            let queue = Arc::clone(&queue);
            handles.push(tokio::spawn(async move {
                let worker = WorkerId(id);
                let mut done = Vec::new();
                loop {
                    let next = queue.lock().pop_front();
                    let Some((index, scenario)) = next else {
                        break;
                    };
                    done.push((index, runner.run_guarded(worker, &scenario).await));
                }
                done
            }));
        }

        let mut finished: Vec<Option<ScenarioResult>> = vec![None; total];
        for handle in handles {
            match handle.await {
                Ok(done) => {
                    for (index, result) in done {
                        finished[index] = Some(result);
                    }
                }
                Err(e) => error!("Worker task failed: {}", e),
            }
        }

        let results = finished
            .into_iter()
            .zip(planned)
            .map(|(result, (name, steps_total))| {
                result.unwrap_or_else(|| ScenarioResult {
                    name,
                    status: ScenarioStatus::Failed,
                    duration_ms: 0,
                    steps_run: 0,
                    steps_total,
                    error: Some("worker stopped before reporting this scenario".to_string()),
                })
            })
            .collect();

        SuiteReport::from_results(results, started.elapsed().as_millis() as u64)
    }

    /// [`ScenarioRunner::run_scenario`], with a panic turned into a failed result.
    async fn run_guarded(&self, worker: WorkerId, scenario: &Scenario) -> ScenarioResult {
        let started = Instant::now();
        let outcome = AssertUnwindSafe(self.run_scenario(worker, scenario))
            .catch_unwind()
            .await;
        match outcome {
            Ok(result) => result,
            Err(payload) => {
                let reason = format!("scenario panicked: {}", panic_message(payload.as_ref()));
                error!("{} on {}: {}", scenario.name, worker, reason);
                self.log.log(&format!("❌ {}", reason));
                self.log
                    .scenario_end(&scenario.name, ScenarioStatus::Failed.as_str());
                if let Err(e) = self.registry.teardown(worker).await {
                    warn!("Teardown for {} failed: {}", worker, e);
                }
                scenario_result(scenario, started, ScenarioStatus::Failed, 0, Some(reason))
            }
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&str>() {
        *message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.as_str()
    } else {
        "unknown panic"
    }
}
