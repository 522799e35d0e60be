use dioxus::prelude::*;

use crate::notify::Toast;

#[component]
pub fn ToastBanner(toast: Signal<Option<Toast>>) -> Element {
    match &*toast.read() {
        Some(t) => {
            let class = t.kind.class();
            let message = t.message.clone();
            rsx! {
                div { class: "toast {class}", "{message}" }
            }
        }
        None => rsx! {},
    }
}
