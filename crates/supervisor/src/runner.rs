use crate::ecosystem::{Ecosystem, WorkUnit};
use anyhow::{anyhow, Result};
use std::process::{ExitStatus, Stdio};
use std::time::{Duration, Instant};
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::{Child, Command};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestartDecision {
    Restart(Duration),
    GiveUp,
    Stop,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RestartPolicy {
    pub autorestart: bool,
    pub max_restarts: u32,
    pub delay: Duration,
    pub min_uptime: Duration,
}

impl From<&WorkUnit> for RestartPolicy {
    fn from(unit: &WorkUnit) -> Self {
        Self {
            autorestart: unit.autorestart,
            max_restarts: unit.max_restarts,
            delay: unit.restart_delay(),
            min_uptime: unit.min_uptime(),
        }
    }
}

impl RestartPolicy {
    /// `Stop` means the unit is done on purpose; `GiveUp` means the restart
    /// budget is exhausted.
    pub fn decide(&self, exited_successfully: bool, restarts_so_far: u32) -> RestartDecision {
        if !self.autorestart {
            return RestartDecision::Stop;
        }
        if restarts_so_far >= self.max_restarts {
            return if exited_successfully {
                RestartDecision::Stop
            } else {
                RestartDecision::GiveUp
            };
        }
        RestartDecision::Restart(self.delay)
    }

    /// Only unstable runs count against `max_restarts`; a run that stayed up
    /// for `min_uptime` starts the count over.
    pub fn restarts_after_run(&self, restarts_so_far: u32, uptime: Duration) -> u32 {
        if uptime >= self.min_uptime {
            0
        } else {
            restarts_so_far
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnitOutcome {
    Stopped { restarts: u32 },
    GaveUp { restarts: u32 },
    Cancelled { restarts: u32 },
}

/// Runs a single work unit until its policy says stop or the token fires.
pub struct UnitRunner {
    unit: WorkUnit,
    policy: RestartPolicy,
    child: Option<Child>,
}

impl UnitRunner {
    pub fn new(unit: WorkUnit) -> Self {
        let policy = RestartPolicy::from(&unit);
        Self {
            unit,
            policy,
            child: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.unit.name
    }

    fn spawn(&mut self) -> Result<()> {
        let (program, args) = self.unit.program_and_args();
        info!(unit = %self.unit.name, %program, "Starting process");

        let mut child = Command::new(&program)
            .args(&args)
            .current_dir(&self.unit.cwd)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| anyhow!("Failed to start '{}': {e}", self.unit.name))?;

        if let Some(stdout) = child.stdout.take() {
            forward_lines(self.unit.name.clone(), "stdout", stdout);
        }
        if let Some(stderr) = child.stderr.take() {
            forward_lines(self.unit.name.clone(), "stderr", stderr);
        }

        self.child = Some(child);
        Ok(())
    }

    async fn wait(&mut self) -> Result<ExitStatus> {
        let child = self
            .child
            .as_mut()
            .ok_or_else(|| anyhow!("Process '{}' is not running", self.unit.name))?;
        let status = child.wait().await?;
        self.child = None;
        Ok(status)
    }

    pub async fn run(mut self, shutdown: CancellationToken) -> UnitOutcome {
        if self.unit.watch {
            warn!(unit = %self.unit.name, "watch = true is not supported and will be ignored");
        }

        let mut restarts = 0u32;
        loop {
            let started = Instant::now();
            let exited_successfully = match self.spawn() {
                Ok(()) => {
                    let waited = tokio::select! {
                        status = self.wait() => Some(status),
                        _ = shutdown.cancelled() => None,
                    };
                    match waited {
                        Some(Ok(status)) => {
                            info!(unit = %self.unit.name, %status, "Process exited");
                            status.success()
                        }
                        Some(Err(e)) => {
                            error!(unit = %self.unit.name, "Failed waiting on process: {e}");
                            false
                        }
                        None => {
                            self.shutdown().await;
                            return UnitOutcome::Cancelled { restarts };
                        }
                    }
                }
                Err(e) => {
                    error!(unit = %self.unit.name, "{e}");
                    false
                }
            };

            let uptime = started.elapsed();
            if self.policy.restarts_after_run(restarts, uptime) != restarts {
                debug!(unit = %self.unit.name, ?uptime, "Stable run, restart count reset");
                restarts = 0;
            }

            match self.policy.decide(exited_successfully, restarts) {
                RestartDecision::Stop => return UnitOutcome::Stopped { restarts },
                RestartDecision::GiveUp => {
                    error!(
                        unit = %self.unit.name,
                        restarts,
                        "Restart limit reached, giving up"
                    );
                    return UnitOutcome::GaveUp { restarts };
                }
                RestartDecision::Restart(delay) => {
                    debug!(unit = %self.unit.name, ?delay, attempt = restarts + 1, "Restarting");
                    tokio::select! {
                        _ = tokio::time::sleep(delay) => {}
                        _ = shutdown.cancelled() => return UnitOutcome::Cancelled { restarts },
                    }
                    restarts += 1;
                }
            }
        }
    }

    pub async fn shutdown(&mut self) {
        if let Some(mut child) = self.child.take() {
            let _ = child.kill().await;
            let _ = child.wait().await;
            info!(unit = %self.unit.name, "Process stopped");
        }
    }
}

impl Drop for UnitRunner {
    fn drop(&mut self) {
        if let Some(mut child) = self.child.take() {
            let _ = child.start_kill();
        }
    }
}

fn forward_lines<R>(unit: String, stream: &'static str, reader: R)
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut lines = BufReader::new(reader).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            info!(unit = %unit, stream, "{line}");
        }
    });
}

pub struct Supervisor {
    ecosystem: Ecosystem,
}

impl Supervisor {
    pub fn new(ecosystem: Ecosystem) -> Result<Self> {
        ecosystem.validate()?;
        Ok(Self { ecosystem })
    }

    /// Runs every unit concurrently and returns once all of them have finished.
    pub async fn run(self, shutdown: CancellationToken) -> Vec<(String, UnitOutcome)> {
        let mut tasks = JoinSet::new();
        for unit in self.ecosystem.apps {
            let token = shutdown.child_token();
            tasks.spawn(async move {
                let runner = UnitRunner::new(unit);
                let name = runner.name().to_string();
                (name, runner.run(token).await)
            });
        }

        let mut outcomes = Vec::new();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(outcome) => outcomes.push(outcome),
                Err(e) => error!("Supervised task panicked: {e}"),
            }
        }
        outcomes
    }
}
