//! Turns session events into the short messages shown to the player.

use mapquiz_shared::clock::{format_clock, Millis};
use mapquiz_shared::geometry::Point;
use mapquiz_shared::regions::{RegionId, RegionIndex};
use mapquiz_shared::session::{SessionConfig, SessionEvent};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastKind {
    Good,
    Bad,
}

impl ToastKind {
    pub fn class(self) -> &'static str {
        match self {
            ToastKind::Good => "good",
            ToastKind::Bad => "bad",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Toast {
    pub message: String,
    pub kind: ToastKind,
}

impl Toast {
    pub fn good(message: impl Into<String>) -> Self {
        Toast {
            message: message.into(),
            kind: ToastKind::Good,
        }
    }

    pub fn bad(message: impl Into<String>) -> Self {
        Toast {
            message: message.into(),
            kind: ToastKind::Bad,
        }
    }
}

pub const TOAST_MS: u32 = 1200;
pub const ERROR_LABEL_MS: u32 = 1500;

/// Message for one event, if it deserves one.
pub fn toast_for(event: &SessionEvent, index: &RegionIndex, config: &SessionConfig) -> Option<Toast> {
    match event {
        SessionEvent::CorrectGuess { id, .. } => {
            Some(Toast::good(format!("Correct: {}", index.name_of(id))))
        }
        SessionEvent::WrongGuess {
            id,
            attempts_remaining,
            ..
        } => Some(Toast::bad(format!(
            "Wrong: {} ({}/{})",
            index.name_of(id),
            config.max_attempts - attempts_remaining,
            config.max_attempts
        ))),
        SessionEvent::ForcedFail { id, penalty } => Some(Toast::bad(format!(
            "Failed: {} (+{}s)",
            index.name_of(id),
            (penalty / 1000.0).round()
        ))),
        SessionEvent::RunComplete(outcome) => Some(Toast::good(if outcome.flawless {
            "Flawless run complete!"
        } else if outcome.full_run {
            "Run complete!"
        } else {
            "Custom run done!"
        })),
        SessionEvent::QualifiesForLeaderboard { time } => {
            Some(Toast::good(format!("New best time: {}", format_clock(*time))))
        }
        SessionEvent::TargetChanged { .. } | SessionEvent::RegionResolved { .. } => None,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelKind {
    /// Name of the region resolved last, kept until the next resolution.
    Resolved,
    /// Name of a wrongly clicked region, shown briefly where the click landed.
    Error,
}

/// A text label pinned to a map point, so it follows pan and zoom.
#[derive(Debug, Clone, PartialEq)]
pub struct MapLabel {
    pub seq: u64,
    pub text: String,
    pub at: Point,
    pub kind: LabelKind,
}

/// Update the label list for one event. `wrong_at` is the map point under a
/// wrong click, when it could be computed.
pub fn update_labels(
    labels: &mut Vec<MapLabel>,
    event: &SessionEvent,
    index: &RegionIndex,
    wrong_at: Option<Point>,
    seq: u64,
) {
    match event {
        SessionEvent::RegionResolved { id, .. } => {
            labels.retain(|l| l.kind != LabelKind::Resolved);
            if let Some(region) = index.get(id) {
                labels.push(MapLabel {
                    seq,
                    text: region.name.clone(),
                    at: region.center,
                    kind: LabelKind::Resolved,
                });
            }
        }
        SessionEvent::WrongGuess { id, .. } => {
            if let Some(at) = wrong_at {
                labels.push(MapLabel {
                    seq,
                    text: index.name_of(id),
                    at,
                    kind: LabelKind::Error,
                });
            }
        }
        _ => {}
    }
}

/// Id of the region a wrong guess named, for the flash effect.
pub fn wrong_region(event: &SessionEvent) -> Option<&RegionId> {
    match event {
        SessionEvent::WrongGuess { id, .. } => Some(id),
        _ => None,
    }
}

/// The time shown on the summary: bonus time when flawless.
pub fn summary_time(final_time: Millis, bonus_time: Option<Millis>) -> String {
    match bonus_time {
        Some(bonus) => format!("{} (bonus from {})", format_clock(bonus), format_clock(final_time)),
        None => format_clock(final_time),
    }
}
