use dioxus::prelude::*;
use mapquiz_shared::session::RunOutcome;

use crate::notify::summary_time;

#[component]
pub fn RunSummary(outcome: RunOutcome, new_best: bool, on_close: EventHandler<()>) -> Element {
    let title = if outcome.flawless {
        "Flawless!"
    } else if outcome.full_run {
        "Run complete"
    } else {
        "Custom run done"
    };
    let time = summary_time(outcome.final_time, outcome.bonus_time);
    let accuracy = outcome.accuracy;

    rsx! {
        div {
            class: "help-overlay-backdrop",
            onclick: move |_| on_close.call(()),

            div {
                class: "help-overlay run-summary",
                onclick: move |evt: Event<MouseData>| evt.stop_propagation(),

                h2 { "{title}" }
                div { class: "summary-row",
                    span { "Time" }
                    span { class: "summary-value", "{time}" }
                }
                div { class: "summary-row",
                    span { "Accuracy" }
                    span { class: "summary-value", "{accuracy}%" }
                }
                if new_best {
                    p { class: "summary-best", "New best time this session" }
                }
                if !outcome.full_run {
                    p { class: "summary-note", "Custom runs do not count towards best times." }
                }
                button {
                    class: "close-help",
                    onclick: move |_| on_close.call(()),
                    "Close"
                }
            }
        }
    }
}
