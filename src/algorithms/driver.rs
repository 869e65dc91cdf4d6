use std::str::FromStr;
use std::time::Instant;

use log::{info, warn};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tokio::sync::{mpsc, watch};
use tokio::time::{self, Interval, MissedTickBehavior};

use super::checker::StepAudit;
use super::fitness::Objective;
use super::models::{OptimizationProgress, PsoParameters};
use super::optimizer::Swarm;
use super::particle::RandomCoefficients;
use crate::config::{validate_interval, validate_parameters, validate_particle_count, SwarmConfig};
use crate::error::{PsoError, PsoResult};

/// Textual commands understood by the interactive driver.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DriverCommand {
    Toggle,
    Play,
    Pause,
    Step,
    Reset,
    Inertia(f64),
    Cognitive(f64),
    Social(f64),
    Interval(u64),
    Particles(usize),
    Function(Objective),
    Status,
    Quit,
}

impl FromStr for DriverCommand {
    type Err = PsoError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut words = line.split_whitespace();
        let Some(verb) = words.next() else {
            return Ok(DriverCommand::Toggle);
        };
        let arg = words.next();
        if words.next().is_some() {
            return Err(PsoError::InvalidCommand(line.trim().to_string()));
        }

        let number = |arg: Option<&str>| -> PsoResult<f64> {
            arg.and_then(|a| a.parse::<f64>().ok())
                .ok_or_else(|| PsoError::InvalidCommand(line.trim().to_string()))
        };
        let count = |arg: Option<&str>| -> PsoResult<u64> {
            arg.and_then(|a| a.parse::<u64>().ok())
                .ok_or_else(|| PsoError::InvalidCommand(line.trim().to_string()))
        };

        let command = match (verb.to_ascii_lowercase().as_str(), arg) {
            ("toggle" | "t", None) => DriverCommand::Toggle,
            ("play" | "run", None) => DriverCommand::Play,
            ("pause", None) => DriverCommand::Pause,
            ("step" | "s", None) => DriverCommand::Step,
            ("reset" | "r", None) => DriverCommand::Reset,
            ("status", None) => DriverCommand::Status,
            ("quit" | "q" | "exit", None) => DriverCommand::Quit,
            ("w" | "inertia", _) => DriverCommand::Inertia(number(arg)?),
            ("c1" | "cognitive", _) => DriverCommand::Cognitive(number(arg)?),
            ("c2" | "social", _) => DriverCommand::Social(number(arg)?),
            ("interval", _) => DriverCommand::Interval(count(arg)?),
            ("particles" | "n", _) => DriverCommand::Particles(count(arg)? as usize),
            ("function" | "f", Some(name)) => DriverCommand::Function(name.parse()?),
            _ => return Err(PsoError::InvalidCommand(line.trim().to_string())),
        };
        Ok(command)
    }
}

#[derive(Debug, Clone)]
pub enum CommandOutcome {
    Stepped(OptimizationProgress),
    Updated(String),
    Ignored(String),
    Quit,
}

/// Owns a swarm and drives it: manual steps, timer-driven play, resets and
/// live parameter changes.
pub struct SwarmDriver {
    config: SwarmConfig,
    swarm: Swarm,
    rng: StdRng,
    running: bool,
    started: Instant,
}

impl SwarmDriver {
    pub fn new(config: SwarmConfig) -> PsoResult<Self> {
        config.validate()?;
        let mut rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        let swarm = Swarm::initialize(config.particle_count, config.objective, &mut rng);

        Ok(SwarmDriver {
            config,
            swarm,
            rng,
            running: false,
            started: Instant::now(),
        })
    }

    pub fn config(&self) -> &SwarmConfig {
        &self.config
    }

    pub fn swarm(&self) -> &Swarm {
        &self.swarm
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Discard the swarm and scatter a fresh one with the current settings.
    pub fn reset(&mut self) {
        self.swarm = Swarm::initialize(
            self.config.particle_count,
            self.config.objective,
            &mut self.rng,
        );
        self.started = Instant::now();
    }

    pub fn set_particle_count(&mut self, count: usize) -> PsoResult<()> {
        validate_particle_count(count)?;
        self.config.particle_count = count;
        self.reset();
        Ok(())
    }

    pub fn set_objective(&mut self, objective: Objective) {
        self.config.objective = objective;
        self.reset();
    }

    /// Takes effect on the next step; the swarm is kept.
    pub fn set_parameters(&mut self, params: PsoParameters) -> PsoResult<()> {
        validate_parameters(&params)?;
        self.config.set_parameters(params);
        Ok(())
    }

    pub fn set_step_interval(&mut self, interval_ms: u64) -> PsoResult<()> {
        validate_interval(interval_ms)?;
        self.config.step_interval_ms = interval_ms;
        Ok(())
    }

    /// Advance the swarm by one step and report progress.
    pub fn step(&mut self) -> OptimizationProgress {
        let params = self.config.parameters();
        let before = self.config.audit.then(|| self.swarm.clone());

        let improved = self.swarm.step_with(&params, &mut RandomCoefficients(&mut self.rng));

        if let Some(before) = before {
            let audit = StepAudit::compare(&before, &self.swarm);
            for violation in &audit.violations {
                warn!(
                    "invariant violated at iteration {}: {:?}",
                    self.swarm.iteration(),
                    violation
                );
            }
        }

        self.progress(improved, false)
    }

    fn progress(&self, improved: bool, is_finished: bool) -> OptimizationProgress {
        let best = self.swarm.global_best();
        OptimizationProgress {
            iteration: self.swarm.iteration(),
            elapsed_time: self.started.elapsed(),
            best_fitness: best.fitness(),
            best_position: best.is_found().then_some(best.position),
            improved,
            is_finished,
        }
    }

    fn target_reached(&self) -> bool {
        self.config
            .target_fitness
            .is_some_and(|target| self.swarm.global_best().fitness <= target)
    }

    pub fn apply(&mut self, command: DriverCommand) -> PsoResult<CommandOutcome> {
        let mut params = self.config.parameters();
        let outcome = match command {
            DriverCommand::Toggle => {
                self.running = !self.running;
                CommandOutcome::Updated(if self.running { "playing" } else { "paused" }.to_string())
            }
            DriverCommand::Play => {
                self.running = true;
                CommandOutcome::Updated("playing".to_string())
            }
            DriverCommand::Pause => {
                self.running = false;
                CommandOutcome::Updated("paused".to_string())
            }
            DriverCommand::Step if self.running => {
                CommandOutcome::Ignored("pause before stepping manually".to_string())
            }
            DriverCommand::Step => CommandOutcome::Stepped(self.step()),
            DriverCommand::Reset => {
                self.reset();
                CommandOutcome::Updated(format!("swarm reset ({} particles)", self.swarm.len()))
            }
            DriverCommand::Inertia(w) => {
                params.inertia_weight = w;
                self.set_parameters(params)?;
                CommandOutcome::Updated(format!("inertia = {w}"))
            }
            DriverCommand::Cognitive(c1) => {
                params.cognitive_weight = c1;
                self.set_parameters(params)?;
                CommandOutcome::Updated(format!("cognitive = {c1}"))
            }
            DriverCommand::Social(c2) => {
                params.social_weight = c2;
                self.set_parameters(params)?;
                CommandOutcome::Updated(format!("social = {c2}"))
            }
            DriverCommand::Interval(ms) => {
                self.set_step_interval(ms)?;
                CommandOutcome::Updated(format!("interval = {ms} ms"))
            }
            DriverCommand::Particles(n) => {
                self.set_particle_count(n)?;
                CommandOutcome::Updated(format!("swarm reset ({n} particles)"))
            }
            DriverCommand::Function(objective) => {
                self.set_objective(objective);
                CommandOutcome::Updated(format!("swarm reset on {objective}"))
            }
            DriverCommand::Status => CommandOutcome::Updated(format!(
                "iteration {} | best {}",
                self.swarm.iteration(),
                self.swarm.global_best()
            )),
            DriverCommand::Quit => CommandOutcome::Quit,
        };
        Ok(outcome)
    }

    fn ticker(&self) -> Interval {
        let mut ticker = time::interval(self.config.step_interval());
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        ticker
    }

    /// Step on every timer tick until `max_steps` (or the configured
    /// `max_iterations`) steps were taken, the target fitness is reached, or
    /// `stop` flips to true.
    pub async fn run<F>(
        &mut self,
        mut stop: watch::Receiver<bool>,
        max_steps: Option<usize>,
        mut on_progress: F,
    ) -> OptimizationProgress
    where
        F: FnMut(&OptimizationProgress),
    {
        let max_steps = max_steps.or(self.config.max_iterations);
        let mut ticker = self.ticker();
        let mut stop_open = true;
        let mut taken = 0;
        self.running = true;

        info!(
            "playing {} on {} every {:?}",
            self.swarm.len(),
            self.config.objective,
            self.config.step_interval()
        );

        while !*stop.borrow() && max_steps.is_none_or(|max| taken < max) {
            tokio::select! {
                _ = ticker.tick() => {
                    let progress = self.step();
                    taken += 1;
                    on_progress(&progress);
                    if self.target_reached() {
                        info!("target fitness reached at iteration {}", progress.iteration);
                        break;
                    }
                }
                changed = stop.changed(), if stop_open => {
                    if changed.is_err() {
                        stop_open = false;
                    }
                }
            }
        }

        self.running = false;
        let finished = self.progress(false, true);
        on_progress(&finished);
        finished
    }

    /// Play/pause loop fed by textual commands (one per line).
    ///
    /// Returns when a `quit` command arrives, the command channel closes, or
    /// `stop` flips to true. Rejected commands are reported through
    /// `on_message` and do not end the loop.
    pub async fn run_interactive<F, M>(
        &mut self,
        mut commands: mpsc::Receiver<String>,
        mut stop: watch::Receiver<bool>,
        mut on_progress: F,
        mut on_message: M,
    ) -> OptimizationProgress
    where
        F: FnMut(&OptimizationProgress),
        M: FnMut(&str),
    {
        let mut ticker = self.ticker();
        let mut interval = self.config.step_interval_ms;
        let mut stop_open = true;

        while !*stop.borrow() {
            tokio::select! {
                _ = ticker.tick(), if self.running => {
                    let progress = self.step();
                    on_progress(&progress);
                }
                line = commands.recv() => {
                    let Some(line) = line else { break };
                    let outcome = line
                        .parse::<DriverCommand>()
                        .and_then(|command| self.apply(command));
                    match outcome {
                        Ok(CommandOutcome::Quit) => break,
                        Ok(CommandOutcome::Stepped(progress)) => on_progress(&progress),
                        Ok(CommandOutcome::Updated(message)) => on_message(&message),
                        Ok(CommandOutcome::Ignored(message)) => on_message(&message),
                        Err(e) => {
                            warn!("rejected command {:?}: {}", line.trim(), e);
                            on_message(&e.to_string());
                        }
                    }
                    if interval != self.config.step_interval_ms {
                        interval = self.config.step_interval_ms;
                        ticker = self.ticker();
                    }
                }
                changed = stop.changed(), if stop_open => {
                    if changed.is_err() {
                        stop_open = false;
                    }
                }
            }
        }

        self.running = false;
        self.progress(false, true)
    }
}
