//! Game session state machine: guesses in, scoring and timing out.
//!
//! Every command returns the [`SessionEvent`]s it produced, in order. The
//! session never renders anything; hosts map events onto sounds, toasts and
//! region fills.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::clock::{Clock, Millis};
use crate::error::QuizError;
use crate::geometry::Point;
use crate::picker::TargetPicker;
use crate::regions::{RegionId, RegionIndex};

/// Scoring and timing rules.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SessionConfig {
    /// Guesses this soon after a target is picked are dropped.
    pub debounce_ms: Millis,
    /// Wrong guesses on one target before it is force-failed.
    pub max_attempts: u32,
    /// Time added to the clock by a forced fail.
    pub fail_penalty_ms: Millis,
    /// Multiplier applied to the final time of a flawless run.
    pub flawless_bonus: f64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            debounce_ms: 250.0,
            max_attempts: 3,
            fail_penalty_ms: 5000.0,
            flawless_bonus: 0.95,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    Idle,
    Running,
    Done,
}

/// One resolved target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Resolution {
    pub id: RegionId,
    pub name: String,
    pub time_taken: Millis,
    pub failed: bool,
}

/// Summary of a finished run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunOutcome {
    pub final_time: Millis,
    /// Only set for flawless runs.
    pub bonus_time: Option<Millis>,
    pub accuracy: u32,
    pub flawless: bool,
    pub full_run: bool,
}

impl RunOutcome {
    /// The time that counts: the bonus time when flawless, else the final time.
    pub fn reported_time(&self) -> Millis {
        self.bonus_time.unwrap_or(self.final_time)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    TargetChanged {
        id: RegionId,
        name: String,
    },
    CorrectGuess {
        id: RegionId,
        time_taken: Millis,
    },
    WrongGuess {
        id: RegionId,
        attempts_remaining: u32,
        point: Point,
    },
    ForcedFail {
        id: RegionId,
        penalty: Millis,
    },
    RegionResolved {
        id: RegionId,
        failed: bool,
    },
    RunComplete(RunOutcome),
    QualifiesForLeaderboard {
        time: Millis,
    },
}

/// `round(correct / (correct + mistakes) * 100)`, or 0 with no attempts.
pub fn accuracy(correct: u32, mistakes: u32) -> u32 {
    let attempts = correct + mistakes;
    if attempts == 0 {
        return 0;
    }
    (f64::from(correct) / f64::from(attempts) * 100.0).round() as u32
}

pub struct GameSession {
    config: SessionConfig,
    clock: Box<dyn Clock>,
    picker: Box<dyn TargetPicker>,
    leaderboard_cutoff: Option<Millis>,

    phase: Phase,
    start_reference: Millis,
    elapsed: Millis,
    run_ids: Vec<RegionId>,
    remaining: Vec<RegionId>,
    target: Option<RegionId>,
    target_picked_at: Millis,
    attempts: u32,
    mistakes: u32,
    correct: u32,
    resolutions: Vec<Resolution>,
    last_accepted: Option<RegionId>,
    full_run: bool,
    outcome: Option<RunOutcome>,
}

impl GameSession {
    pub fn new(config: SessionConfig, clock: Box<dyn Clock>, picker: Box<dyn TargetPicker>) -> Self {
        GameSession {
            config,
            clock,
            picker,
            leaderboard_cutoff: None,
            phase: Phase::Idle,
            start_reference: 0.0,
            elapsed: 0.0,
            run_ids: Vec::new(),
            remaining: Vec::new(),
            target: None,
            target_picked_at: 0.0,
            attempts: 0,
            mistakes: 0,
            correct: 0,
            resolutions: Vec::new(),
            last_accepted: None,
            full_run: false,
            outcome: None,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn now(&self) -> Millis {
        self.clock.now()
    }

    pub fn elapsed(&self) -> Millis {
        self.elapsed
    }

    pub fn target(&self) -> Option<&RegionId> {
        self.target.as_ref()
    }

    pub fn remaining(&self) -> &[RegionId] {
        &self.remaining
    }

    pub fn total(&self) -> usize {
        self.run_ids.len()
    }

    pub fn attempts_on_target(&self) -> u32 {
        self.attempts
    }

    pub fn mistakes(&self) -> u32 {
        self.mistakes
    }

    pub fn correct_count(&self) -> u32 {
        self.correct
    }

    pub fn resolutions(&self) -> &[Resolution] {
        &self.resolutions
    }

    /// Resolutions ordered slowest first.
    pub fn resolutions_by_time(&self) -> Vec<&Resolution> {
        let mut sorted: Vec<&Resolution> = self.resolutions.iter().collect();
        sorted.sort_by(|a, b| b.time_taken.total_cmp(&a.time_taken));
        sorted
    }

    pub fn is_resolved(&self, id: &RegionId) -> bool {
        self.resolutions.iter().any(|r| r.id == *id)
    }

    pub fn is_full_run(&self) -> bool {
        self.full_run
    }

    pub fn outcome(&self) -> Option<&RunOutcome> {
        self.outcome.as_ref()
    }

    /// Accuracy so far, `None` before the first attempt.
    pub fn live_accuracy(&self) -> Option<u32> {
        (self.correct + self.mistakes > 0).then(|| accuracy(self.correct, self.mistakes))
    }

    /// `(correct, total)` for the progress display.
    pub fn progress(&self) -> (u32, usize) {
        (self.correct, self.run_ids.len())
    }

    pub fn leaderboard_cutoff(&self) -> Option<Millis> {
        self.leaderboard_cutoff
    }

    /// Slowest time still on the board; `None` means any full run qualifies.
    pub fn set_leaderboard_cutoff(&mut self, cutoff: Option<Millis>) {
        self.leaderboard_cutoff = cutoff;
    }

    /// Start a run over every region of the index.
    pub fn start(&mut self, index: &RegionIndex) -> Result<Vec<SessionEvent>, QuizError> {
        if index.is_empty() {
            return Err(QuizError::EmptyMap);
        }
        Ok(self.begin(index.ids(), true, index))
    }

    /// Start a run over a chosen subset. Duplicates are ignored.
    pub fn start_subset(
        &mut self,
        ids: &[RegionId],
        index: &RegionIndex,
    ) -> Result<Vec<SessionEvent>, QuizError> {
        let mut seen = HashSet::new();
        let mut selected = Vec::with_capacity(ids.len());
        for id in ids {
            if !index.contains(id) {
                return Err(QuizError::UnknownRegion(id.clone()));
            }
            if seen.insert(id) {
                selected.push(id.clone());
            }
        }
        if selected.is_empty() {
            return Err(QuizError::EmptyMap);
        }
        let full_run = selected.len() == index.len();
        Ok(self.begin(selected, full_run, index))
    }

    fn begin(&mut self, ids: Vec<RegionId>, full_run: bool, index: &RegionIndex) -> Vec<SessionEvent> {
        self.clear();
        self.remaining = ids.clone();
        self.run_ids = ids;
        self.full_run = full_run;
        self.start_reference = self.clock.now();
        self.phase = Phase::Running;
        tracing::debug!(regions = self.run_ids.len(), full_run, "Run started");

        let mut events = Vec::new();
        self.next_target(index, &mut events);
        events
    }

    /// Handle one click. `candidates` are topmost first and must all exist in
    /// `index`.
    pub fn submit_guess(
        &mut self,
        candidates: &[RegionId],
        point: Point,
        index: &RegionIndex,
    ) -> Vec<SessionEvent> {
        let mut events = Vec::new();
        if self.phase != Phase::Running || candidates.is_empty() {
            return events;
        }
        let Some(target) = self.target.clone() else {
            return events;
        };
        debug_assert!(
            candidates.iter().all(|c| index.contains(c)),
            "guess names a region outside the index: {candidates:?}"
        );

        let chosen = if candidates.contains(&target) {
            target.clone()
        } else {
            candidates[0].clone()
        };

        let now = self.clock.now();
        if now - self.target_picked_at < self.config.debounce_ms {
            tracing::trace!(id = %chosen, "Guess debounced");
            return events;
        }
        if self.last_accepted.as_ref() == Some(&chosen) {
            tracing::trace!(id = %chosen, "Guess repeats last accepted region");
            return events;
        }
        if self.is_resolved(&chosen) {
            tracing::trace!(id = %chosen, "Guess on resolved region");
            return events;
        }

        if chosen == target {
            let time_taken = now - self.target_picked_at;
            self.resolve(&target, time_taken, false, index);
            self.correct += 1;
            self.last_accepted = Some(chosen);
            events.push(SessionEvent::CorrectGuess {
                id: target.clone(),
                time_taken,
            });
            events.push(SessionEvent::RegionResolved {
                id: target,
                failed: false,
            });
            self.next_target(index, &mut events);
            return events;
        }

        self.mistakes += 1;
        self.attempts += 1;

        if self.attempts >= self.config.max_attempts {
            let penalty = self.config.fail_penalty_ms;
            self.start_reference -= penalty;
            let time_taken = now - self.target_picked_at + penalty;
            self.resolve(&target, time_taken, true, index);
            tracing::debug!(id = %target, "Target force-failed");
            events.push(SessionEvent::ForcedFail {
                id: target.clone(),
                penalty,
            });
            events.push(SessionEvent::RegionResolved {
                id: target,
                failed: true,
            });
            self.next_target(index, &mut events);
        } else {
            events.push(SessionEvent::WrongGuess {
                id: chosen,
                attempts_remaining: self.config.max_attempts - self.attempts,
                point,
            });
        }
        events
    }

    /// Refresh `elapsed` while running. Returns the running time, if any.
    pub fn tick(&mut self) -> Option<Millis> {
        if self.phase != Phase::Running {
            return None;
        }
        self.elapsed = self.clock.now() - self.start_reference;
        Some(self.elapsed)
    }

    /// Back to `Idle`. Returns `false` when already idle.
    pub fn reset(&mut self) -> bool {
        if self.phase == Phase::Idle {
            return false;
        }
        self.clear();
        tracing::debug!("Session reset");
        true
    }

    fn clear(&mut self) {
        self.phase = Phase::Idle;
        self.start_reference = 0.0;
        self.elapsed = 0.0;
        self.run_ids.clear();
        self.remaining.clear();
        self.target = None;
        self.target_picked_at = 0.0;
        self.attempts = 0;
        self.mistakes = 0;
        self.correct = 0;
        self.resolutions.clear();
        self.last_accepted = None;
        self.full_run = false;
        self.outcome = None;
    }

    fn resolve(&mut self, id: &RegionId, time_taken: Millis, failed: bool, index: &RegionIndex) {
        self.remaining.retain(|r| r != id);
        self.resolutions.push(Resolution {
            id: id.clone(),
            name: index.name_of(id),
            time_taken,
            failed,
        });
        debug_assert!(self.partition_holds(), "remaining and resolved ids drifted");
    }

    fn next_target(&mut self, index: &RegionIndex, events: &mut Vec<SessionEvent>) {
        if self.remaining.is_empty() {
            self.finish(events);
            return;
        }
        let pick = self.picker.pick(&self.remaining).min(self.remaining.len() - 1);
        let id = self.remaining[pick].clone();
        self.target_picked_at = self.clock.now();
        self.attempts = 0;
        tracing::debug!(id = %id, "New target");
        events.push(SessionEvent::TargetChanged {
            name: index.name_of(&id),
            id: id.clone(),
        });
        self.target = Some(id);
    }

    fn finish(&mut self, events: &mut Vec<SessionEvent>) {
        self.phase = Phase::Done;
        self.target = None;
        self.elapsed = self.clock.now() - self.start_reference;

        let flawless = self.mistakes == 0 && self.correct > 0;
        let outcome = RunOutcome {
            final_time: self.elapsed,
            bonus_time: flawless.then(|| (self.elapsed * self.config.flawless_bonus).floor()),
            accuracy: accuracy(self.correct, self.mistakes),
            flawless,
            full_run: self.full_run,
        };
        tracing::info!(
            final_time = outcome.final_time,
            accuracy = outcome.accuracy,
            flawless,
            "Run complete"
        );
        self.outcome = Some(outcome);
        events.push(SessionEvent::RunComplete(outcome));

        let time = outcome.reported_time();
        if outcome.full_run && self.leaderboard_cutoff.map_or(true, |cutoff| time < cutoff) {
            events.push(SessionEvent::QualifiesForLeaderboard { time });
        }
    }

    fn partition_holds(&self) -> bool {
        let remaining: HashSet<&RegionId> = self.remaining.iter().collect();
        let resolved: HashSet<&RegionId> = self.resolutions.iter().map(|r| &r.id).collect();
        remaining.is_disjoint(&resolved)
            && remaining.len() + resolved.len() == self.run_ids.len()
            && self
                .run_ids
                .iter()
                .all(|id| remaining.contains(id) || resolved.contains(id))
    }
}
