use dioxus::prelude::*;
use mapquiz_shared::clock::{format_clock, format_seconds, Millis};
use mapquiz_shared::session::Phase;
use mapquiz_shared::Quiz;

fn start_label(phase: Phase) -> &'static str {
    match phase {
        Phase::Idle => "Start",
        Phase::Running => "Restart",
        Phase::Done => "Play again",
    }
}

/// Target prompt, clock, progress and live accuracy.
#[component]
pub fn Hud(
    quiz: Signal<Quiz>,
    elapsed: Signal<Millis>,
    on_start: EventHandler<()>,
    on_reset: EventHandler<()>,
) -> Element {
    let q = quiz.read();
    let session = q.session();
    let phase = session.phase();
    let target = session
        .target()
        .map(|id| q.index().name_of(id))
        .unwrap_or_else(|| "\u{2014}".to_string());
    let (resolved, total) = session.progress();
    let accuracy = session
        .live_accuracy()
        .map(|a| format!("{a}%"))
        .unwrap_or_else(|| "\u{2014}".to_string());
    let clock = match phase {
        Phase::Idle => format_clock(0.0),
        Phase::Running => format_clock(*elapsed.read()),
        Phase::Done => format_clock(session.outcome().map(|o| o.final_time).unwrap_or_default()),
    };
    let attempts_left = session
        .config()
        .max_attempts
        .saturating_sub(session.attempts_on_target());
    let start_text = start_label(phase);

    rsx! {
        div { class: "panel hud",
            div { class: "hud-target",
                span { class: "hud-caption", "Find" }
                span { class: "hud-target-name", "{target}" }
            }
            div { class: "hud-stats",
                span { class: "hud-clock", "{clock}" }
                span { class: "hud-progress", "{resolved}/{total}" }
                span { class: "hud-accuracy", "{accuracy}" }
            }
            if phase == Phase::Running {
                div { class: "hud-attempts", "Attempts left: {attempts_left}" }
            }
            div { class: "hud-actions",
                button { onclick: move |_| on_start.call(()), "{start_text}" }
                if phase != Phase::Idle {
                    button { class: "secondary", onclick: move |_| on_reset.call(()), "Reset" }
                }
            }
        }
    }
}

/// Resolved regions, slowest first.
#[component]
pub fn FoundList(quiz: Signal<Quiz>) -> Element {
    let q = quiz.read();
    let rows: Vec<(String, String, bool)> = q
        .session()
        .resolutions_by_time()
        .into_iter()
        .map(|r| (r.name.clone(), format_seconds(r.time_taken), r.failed))
        .collect();

    if rows.is_empty() {
        return rsx! {};
    }

    rsx! {
        div { class: "panel found-list",
            h3 { "Found" }
            ul {
                for (name, time, failed) in rows {
                    li { class: if failed { "failed" } else { "found" },
                        span { class: "found-name", "{name}" }
                        span { class: "found-time", "{time}" }
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_start_label_per_phase() {
        assert_eq!(start_label(Phase::Idle), "Start");
        assert_eq!(start_label(Phase::Running), "Restart");
        assert_eq!(start_label(Phase::Done), "Play again");
    }
}
