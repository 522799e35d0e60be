mod api;
mod components;
mod coords;
mod notify;
mod pages;
mod platform;

use dioxus::prelude::*;

#[derive(Routable, Clone, PartialEq)]
enum Route {
    #[route("/")]
    Home {},
    #[route("/map/:map_key")]
    MapQuiz { map_key: String },
}

#[component]
fn Home() -> Element {
    rsx! {
        pages::quiz::QuizPage { map_key: None::<String> }
    }
}

#[component]
fn MapQuiz(map_key: String) -> Element {
    rsx! {
        pages::quiz::QuizPage { map_key: Some(map_key) }
    }
}

const CSS: Asset = asset!("/assets/main.css");
const FAVICON: Asset = asset!("/assets/favicon.svg");

#[allow(non_snake_case)]
fn App() -> Element {
    rsx! {
        document::Link { rel: "icon", r#type: "image/svg+xml", href: FAVICON }
        document::Stylesheet { href: CSS }
        Router::<Route> {}
    }
}

fn main() {
    launch(App);
}
