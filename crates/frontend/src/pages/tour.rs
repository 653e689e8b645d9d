use dioxus::prelude::*;

use crate::api::{self, TourData};
use crate::components::tour_map::TourMap;

#[component]
pub fn Tour(slug: String) -> Element {
    let tour = use_resource(move || {
        let slug = slug.clone();
        async move { api::fetch_tour(&slug).await }
    });

    let tour: Option<Result<TourData, String>> = tour.read().clone();
    match tour {
        None => rsx! {
            div { class: "tour-page", p { class: "tour-loading", "Loading tour..." } }
        },
        Some(Err(e)) => rsx! {
            div { class: "tour-page",
                div { class: "map-error map-error--full", "Tour could not be loaded: {e}" }
            }
        },
        Some(Ok(tour)) => rsx! {
            article { class: "tour-page",
                h1 { "{tour.title}" }
                if let Some(summary) = &tour.summary {
                    p { class: "tour-summary", "{summary}" }
                }
                // Each map owns its own engine; one failing leaves the others alone.
                for (i, map) in tour.maps.iter().enumerate() {
                    section { key: "{i}", class: "tour-map-section",
                        TourMap {
                            peaks: map.peaks_attribute(),
                            track_src: map.track_src.clone(),
                            map_config: map.config_attribute(),
                        }
                    }
                }
            }
        },
    }
}
