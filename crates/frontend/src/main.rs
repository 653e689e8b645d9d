mod api;
mod components;
mod host;
mod pages;
mod visibility;

use dioxus::prelude::*;

#[derive(Routable, Clone, PartialEq)]
enum Route {
    #[route("/")]
    Home {},
    #[route("/tour/:slug")]
    TourView { slug: String },
}

const DEFAULT_TOUR: &str = "featured";

#[component]
fn Home() -> Element {
    rsx! {
        pages::tour::Tour { slug: DEFAULT_TOUR.to_string() }
    }
}

#[component]
fn TourView(slug: String) -> Element {
    rsx! {
        pages::tour::Tour { key: "{slug}", slug: slug.clone() }
    }
}

const CSS: Asset = asset!("/assets/main.css");

#[allow(non_snake_case)]
fn App() -> Element {
    rsx! {
        document::Stylesheet { href: CSS }
        Router::<Route> {}
    }
}

fn main() {
    launch(App);
}
