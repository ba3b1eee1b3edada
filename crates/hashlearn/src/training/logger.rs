//! Training progress logging.
//!
//! [`TrainingLogger`] formats progress the classic way (average loss,
//! example counter, current label, current prediction, current feature
//! count) and emits it through the [`log`] facade. Nothing is printed unless
//! the embedding application installs a logger.

use std::fmt;
use std::str::FromStr;
use std::time::Instant;

/// Verbosity level for training output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Verbosity {
    /// No output.
    #[default]
    Silent,
    /// Warnings only.
    Warning,
    /// Progress, holdout losses and summary.
    Info,
    /// Everything, including learner descriptions.
    Debug,
}

// =============================================================================
// ProgressSchedule
// =============================================================================

/// When to emit a progress line, in training samples seen.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ProgressSchedule {
    /// Multiply the next report point by this factor.
    Exponential(f64),
    /// Add this many samples to the next report point.
    Additive(u64),
}

impl Default for ProgressSchedule {
    fn default() -> Self {
        Self::Exponential(2.0)
    }
}

impl ProgressSchedule {
    /// Report point following `current`. Always moves forward.
    pub fn next(&self, current: u64) -> u64 {
        let next = match *self {
            Self::Exponential(factor) => (current as f64 * factor) as u64,
            Self::Additive(step) => current.saturating_add(step),
        };
        next.max(current + 1)
    }
}

/// Error parsing a [`ProgressSchedule`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid progress interval {0:?}")]
pub struct InvalidProgress(String);

impl FromStr for ProgressSchedule {
    type Err = InvalidProgress;

    /// A value with a decimal point is an exponential factor ("2.0"),
    /// an integer is an additive step ("1000").
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || InvalidProgress(s.to_string());
        if s.contains('.') {
            let factor: f64 = s.parse().map_err(|_| invalid())?;
            if factor.is_finite() && factor > 1.0 {
                return Ok(Self::Exponential(factor));
            }
            Err(invalid())
        } else {
            let step: u64 = s.parse().map_err(|_| invalid())?;
            if step > 0 { Ok(Self::Additive(step)) } else { Err(invalid()) }
        }
    }
}

// =============================================================================
// ProgressLine
// =============================================================================

/// One row of the progress table.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProgressLine {
    pub average_loss: f64,
    pub count: u64,
    pub label: f64,
    pub prediction: f64,
    pub n_features: usize,
}

impl fmt::Display for ProgressLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:.6} {:>12}  {:>7.4}  {:>7.4}  {}",
            self.average_loss, self.count, self.label, self.prediction, self.n_features
        )
    }
}

// =============================================================================
// TrainingLogger
// =============================================================================

/// Logger for online training runs.
#[derive(Debug, Clone)]
pub struct TrainingLogger {
    verbosity: Verbosity,
    schedule: ProgressSchedule,
    next_report: u64,
    last_reported: Option<u64>,
    started: Option<Instant>,
}

impl TrainingLogger {
    pub fn new(verbosity: Verbosity) -> Self {
        Self::with_schedule(verbosity, ProgressSchedule::default())
    }

    pub fn with_schedule(verbosity: Verbosity, schedule: ProgressSchedule) -> Self {
        Self {
            verbosity,
            schedule,
            next_report: 1,
            last_reported: None,
            started: None,
        }
    }

    pub fn verbosity(&self) -> Verbosity {
        self.verbosity
    }

    fn enabled(&self, level: Verbosity) -> bool {
        self.verbosity >= level
    }

    /// Log a free-form message at info level.
    pub fn info(&self, message: &str) {
        if self.enabled(Verbosity::Info) {
            log::info!("{message}");
        }
    }

    /// Log a free-form message at debug level.
    pub fn debug(&self, message: &str) {
        if self.enabled(Verbosity::Debug) {
            log::debug!("{message}");
        }
    }

    /// Log a warning.
    pub fn warn(&self, message: &str) {
        if self.enabled(Verbosity::Warning) {
            log::warn!("{message}");
        }
    }

    /// Start of a run: learner setup and the progress table header.
    pub fn start_training(&mut self, passes: usize, learner: &str, link: &str) {
        self.started = Some(Instant::now());
        self.next_report = 1;
        self.last_reported = None;
        if !self.enabled(Verbosity::Info) {
            return;
        }
        log::info!("Number of passes = {passes}");
        for line in learner.lines() {
            self.debug(line);
        }
        self.debug(link);
        log::info!("average       example  current  current  current");
        log::info!("loss          counter    label  predict  features");
    }

    /// Emit `line` if its counter hits the schedule.
    pub fn log_progress(&mut self, line: ProgressLine) {
        if line.count < self.next_report {
            return;
        }
        self.next_report = self.schedule.next(self.next_report);
        self.last_reported = Some(line.count);
        if self.enabled(Verbosity::Info) {
            log::info!("{line}");
        }
    }

    /// Summary of the first pass of a multi-pass run.
    pub fn log_first_pass(&self, n_train: usize, n_holdout: usize) {
        if self.enabled(Verbosity::Info) {
            log::info!("finished first epoch");
            log::info!("{n_train} training samples");
            log::info!("{n_holdout} holdout samples saved");
        }
    }

    pub fn log_holdout(&self, pass: usize, loss: f64) {
        if self.enabled(Verbosity::Info) {
            log::info!("Weighted loss on holdout on epoch {} = {:.6}", pass + 1, loss);
        }
    }

    pub fn log_early_stopping(&self, pass: usize, best_pass: usize) {
        if self.enabled(Verbosity::Info) {
            log::info!("Early stopping after epoch {} (best: epoch {})", pass + 1, best_pass + 1);
        }
    }

    /// End of a run: the final progress line (unless it was just printed),
    /// the best constant baseline and the elapsed time.
    pub fn finish_training(&mut self, last: Option<ProgressLine>, best_constant_loss: f64) {
        if !self.enabled(Verbosity::Info) {
            return;
        }
        if let Some(line) = last {
            if self.last_reported != Some(line.count) {
                log::info!("{line}");
            }
        }
        log::info!("finished run");
        log::info!("average loss best constant predictor: {best_constant_loss:.6}");
        if let Some(started) = self.started {
            let elapsed = started.elapsed().as_secs();
            log::info!("Elapsed time: {} min, {} sec", elapsed / 60, elapsed % 60);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn verbosity_ordering() {
        assert!(Verbosity::Debug > Verbosity::Info);
        assert!(Verbosity::Info > Verbosity::Warning);
        assert!(Verbosity::Warning > Verbosity::Silent);
    }

    #[test]
    fn exponential_schedule() {
        let schedule = ProgressSchedule::default();
        let points: Vec<u64> = std::iter::successors(Some(1), |&p| Some(schedule.next(p))).take(5).collect();
        assert_eq!(points, vec![1, 2, 4, 8, 16]);
        assert_eq!(ProgressSchedule::Exponential(1.2).next(1), 2);
    }

    #[test]
    fn additive_schedule() {
        assert_eq!(ProgressSchedule::Additive(100).next(1), 101);
    }

    #[rstest]
    #[case("2.0", Some(ProgressSchedule::Exponential(2.0)))]
    #[case("1.5", Some(ProgressSchedule::Exponential(1.5)))]
    #[case("1000", Some(ProgressSchedule::Additive(1000)))]
    #[case("0", None)]
    #[case("0.5", None)]
    #[case("fast", None)]
    fn parse_schedule(#[case] text: &str, #[case] expected: Option<ProgressSchedule>) {
        assert_eq!(text.parse::<ProgressSchedule>().ok(), expected);
    }

    #[test]
    fn progress_line_layout() {
        let line = ProgressLine {
            average_loss: 0.5,
            count: 16,
            label: -1.0,
            prediction: 0.25,
            n_features: 3,
        };
        assert_eq!(line.to_string(), "0.500000           16  -1.0000   0.2500  3");
    }

    #[test]
    fn progress_follows_schedule() {
        let mut logger = TrainingLogger::new(Verbosity::Silent);
        let line = |count| ProgressLine {
            average_loss: 0.0,
            count,
            label: 0.0,
            prediction: 0.0,
            n_features: 1,
        };
        for count in 1..=5 {
            logger.log_progress(line(count));
        }
        assert_eq!(logger.last_reported, Some(4));
        assert_eq!(logger.next_report, 8);
    }
}
