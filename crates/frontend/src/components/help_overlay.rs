use dioxus::prelude::*;

#[component]
pub fn HelpOverlay(show: Signal<bool>, max_attempts: u32, penalty_seconds: u32) -> Element {
    if !*show.read() {
        return rsx! {};
    }

    rsx! {
        div {
            class: "help-overlay-backdrop",
            onclick: move |_| show.set(false),

            div {
                class: "help-overlay",
                onclick: move |evt: Event<MouseData>| evt.stop_propagation(),

                h2 { "How to play" }

                div { class: "shortcut-section",
                    h3 { "Keyboard" }
                    div { class: "shortcut-row",
                        span { class: "shortcut-keys", kbd { "Space" } }
                        span { "Start a run, or reset the current one" }
                    }
                    div { class: "shortcut-row",
                        span { class: "shortcut-keys", kbd { "Esc" } }
                        span { "Reset the run / close help" }
                    }
                    div { class: "shortcut-row",
                        span { class: "shortcut-keys", kbd { "H" } " / " kbd { "?" } }
                        span { "Toggle this help" }
                    }
                }

                div { class: "shortcut-section",
                    h3 { "Map" }
                    div { class: "shortcut-row",
                        span { class: "shortcut-keys", "Click / tap" }
                        span { "Guess a region" }
                    }
                    div { class: "shortcut-row",
                        span { class: "shortcut-keys", "Drag" }
                        span { "Pan" }
                    }
                    div { class: "shortcut-row",
                        span { class: "shortcut-keys", "Wheel / pinch" }
                        span { "Zoom around the pointer" }
                    }
                }

                div { class: "help-divider" }

                div { class: "help-info-section",
                    h3 { "Scoring" }
                    p { "Each target allows {max_attempts} attempts. Running out marks the region failed and adds {penalty_seconds}s to the clock." }
                    p { "Accuracy is correct guesses over all guesses. A run without a single mistake earns a 5% time bonus." }
                    p { "Small regions get a dot marker and a wider tap area." }
                }

                button {
                    class: "close-help",
                    onclick: move |_| show.set(false),
                    "Close"
                }
            }
        }
    }
}
