//! State to HTML projection.
//!
//! [`render`] is pure: the same model always produces the same bytes. A
//! section whose data is still pending renders as an empty fragment; the
//! refill itself is started by the store, never from here.

use maud::{html, Markup, PreEscaped};
use serde::{Deserialize, Serialize};

use crate::cache::{self, Resolution};
use crate::dates::CalendarDate;
use crate::model::{
    ApodImage, ApodState, EpicState, MissionStatus, Model, Rover, RoverInfo, RoverPhotos, Section,
};
use crate::FALLBACK_ASPECT_RATIO;

pub const APOD_CALENDAR_ID: &str = "apod-calendar";
pub const MARS_CALENDAR_ID: &str = "mars-calendar";
pub const CAROUSEL_ID: &str = "carousel";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CalendarTarget {
    /// Changes come back as `Event::ApodDateSelected`.
    Apod,
    /// Changes come back as `Event::RoverDateSelected`.
    Rover,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarBinding {
    pub element_id: String,
    pub target: CalendarTarget,
    pub start_date: CalendarDate,
    pub min_date: CalendarDate,
    pub max_date: CalendarDate,
    pub disabled_dates: Vec<CalendarDate>,
}

/// Interactive element in the rendered markup. The shell attaches its
/// listeners to these after every paint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Widget {
    Calendar(CalendarBinding),
    Carousel { element_id: String },
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewModel {
    pub section: Section,
    pub navbar_html: String,
    /// Empty while the section's data is pending.
    pub content_html: String,
    pub footer_html: String,
    pub pending: bool,
    pub widgets: Vec<Widget>,
}

enum Page {
    Ready { markup: Markup, widgets: Vec<Widget> },
    Pending,
}

#[must_use]
pub fn render(model: &Model) -> ViewModel {
    let page = match model.active_section {
        Section::Earth => earth_page(&model.epic),
        Section::Mars => mars_page(model),
        Section::Beyond => beyond_page(&model.apod, model.today),
        Section::About => Page::Ready {
            markup: about_page(),
            widgets: Vec::new(),
        },
    };

    let (content_html, widgets, pending) = match page {
        Page::Ready { markup, widgets } => (markup.into_string(), widgets, false),
        Page::Pending => (String::new(), Vec::new(), true),
    };

    ViewModel {
        section: model.active_section,
        navbar_html: navbar(model.active_section).into_string(),
        content_html,
        footer_html: footer().into_string(),
        pending,
        widgets,
    }
}

fn carousel(urls: impl IntoIterator<Item = impl AsRef<str>>) -> Markup {
    html! {
        div.glider-contain id=(CAROUSEL_ID) {
            div.glider {
                @for url in urls {
                    div { img src=(url.as_ref()) width="90%" alt=""; }
                }
            }
            button.glider-prev aria-label="Previous" { "«" }
            button.glider-next aria-label="Next" { "»" }
            div.dots role="tablist" {}
        }
    }
}

fn carousel_widget() -> Widget {
    Widget::Carousel {
        element_id: CAROUSEL_ID.to_string(),
    }
}

fn title_block(title: &str, subtitle: Markup) -> Markup {
    html! {
        div.columns {
            div.column.has-text-centered {
                h1 class="title is-size-1-desktop is-size-2-mobile" {
                    (title) br;
                    span class="subtitle is-4" { (subtitle) }
                }
            }
        }
    }
}

pub fn navbar(active: Section) -> Markup {
    html! {
        div.navbar-brand {
            a.navbar-item.has-text-black.is-uppercase.has-text-weight-semibold href="#" {
                img src="./assets/images/logo.png" alt="";
            }
            a.navbar-burger #burgers role="button" aria-label="menu" aria-expanded="false" data-target="collapsed-menu" {
                span aria-hidden="true" {}
                span aria-hidden="true" {}
                span aria-hidden="true" {}
            }
        }
        div.navbar-menu #"collapsed-menu" {
            div.navbar-end {
                a.navbar-item.menu-item data-target=(Section::Earth.slug()) { "Earth" }
                @for rover in Rover::ALL {
                    a.navbar-item.menu-item data-target=(Section::Mars.slug()) data-rover=(rover.slug()) {
                        "Mars > " (rover.name()) " Rover"
                    }
                }
                a.navbar-item.menu-item data-target=(Section::Beyond.slug()) { "And Beyond..." }
                a.navbar-item.menu-item data-target=(Section::About.slug()) { "About" }
            }
        }
        div.navbar-menu #menu {
            div.navbar-end {
                a.navbar-item.menu-item.earth.is-active[active == Section::Earth] data-target=(Section::Earth.slug()) { "Earth" }
                div.navbar-item.has-dropdown.is-hoverable.mars.is-active[active == Section::Mars] #"mars-dropdown" {
                    a.navbar-link data-target=(Section::Mars.slug()) { "Mars" }
                    div.navbar-dropdown {
                        @for rover in Rover::ALL {
                            a class={ "navbar-item menu-item " (rover.slug()) } data-target=(Section::Mars.slug()) data-rover=(rover.slug()) {
                                (rover.name()) " Rover"
                            }
                        }
                    }
                }
                a.navbar-item.menu-item.beyond.is-active[active == Section::Beyond] data-target=(Section::Beyond.slug()) { "And Beyond..." }
                a.navbar-item.menu-item.about.is-active[active == Section::About] data-target=(Section::About.slug()) { "About" }
            }
        }
    }
}

fn earth_page(epic: &EpicState) -> Page {
    let Resolution::Ready(epic) = cache::resolve_epic_set(epic) else {
        return Page::Pending;
    };
    let Some(day) = epic.date else {
        return Page::Pending;
    };

    let markup = html! {
        div #earth {
            (title_block("Planet Earth", html! { "on " (day.to_string()) }))
            div.columns {
                div.column.is-half-tablet.is-offset-one-quarter-tablet.has-text-centered {
                    (carousel(epic.images.iter().map(|image| image.url.as_str())))
                }
            }
            div.columns {
                div.column {
                    div.block.epic-exp.has-text-justified {
                        p {
                            strong { "The Deep Space Climate Observatory (DSCOVR)" }
                            " is a NOAA space weather, space climate, and Earth observation satellite. "
                            "It was launched on " strong { "February 11, 2015" }
                            " from Cape Canaveral and became NOAA's first operational deep-space satellite."
                        }
                        p {
                            "On board is the " strong { "Earth Polychromatic Imaging Camera (EPIC)" }
                            ", which photographs the sunlit side of Earth. The pictures on this page were taken on "
                            strong { (day.to_string()) } " from roughly one million miles away."
                        }
                    }
                }
            }
        }
    };

    Page::Ready {
        markup,
        widgets: vec![carousel_widget()],
    }
}

fn mission_summary(info: &RoverInfo) -> Markup {
    html! {
        "The " strong { (info.name) } " rover was launched from Cape Canaveral on "
        strong { (info.launch_date) } ", and landed on Mars on "
        strong { (info.landing_date) } ". "
        @match (info.status, info.completion_date()) {
            (MissionStatus::Complete, Some(completed)) => {
                "The rover completed its mission on " strong { (completed.to_string()) }
                ". While it was active, it sent "
            }
            _ => { "The rover is still active on Mars, and has sent " }
        }
        "a total of " strong { (info.total_photos.to_string()) } " photos to Earth."
    }
}

fn mars_page(model: &Model) -> Page {
    let rovers = &model.rovers;
    let (Resolution::Ready(info), Resolution::Ready(photos)) = (
        cache::resolve_rover_manifest(rovers),
        cache::resolve_rover_photos(rovers),
    ) else {
        return Page::Pending;
    };
    let RoverPhotos {
        requested_date, urls, ..
    } = photos;

    let markup = html! {
        div #mars {
            (title_block(&format!("Photos from the {} Rover", info.name), html! { "on " (requested_date.to_string()) }))
            div.columns {
                div.column.carousel-column.has-text-centered {
                    @if urls.is_empty() {
                        p.has-text-grey { "No photos from the selected cameras on this day." }
                    } @else {
                        (carousel(urls))
                    }
                }
                div.column.is-narrow {
                    div.mars-info {
                        div.block {
                            input.input.is-hidden id=(MARS_CALENDAR_ID) type="date";
                        }
                    }
                }
            }
            div.columns {
                div.column {
                    div.block.mars-exp.has-text-justified { (mission_summary(info)) }
                }
            }
        }
    };

    let mut widgets = Vec::with_capacity(2);
    if !urls.is_empty() {
        widgets.push(carousel_widget());
    }
    widgets.push(Widget::Calendar(CalendarBinding {
        element_id: MARS_CALENDAR_ID.to_string(),
        target: CalendarTarget::Rover,
        start_date: *requested_date,
        min_date: info.min_date,
        max_date: info.max_date,
        disabled_dates: info.disabled_dates.iter().copied().collect(),
    }));

    Page::Ready { markup, widgets }
}

fn apod_calendar(apod: &ApodState, today: CalendarDate) -> Widget {
    Widget::Calendar(CalendarBinding {
        element_id: APOD_CALENDAR_ID.to_string(),
        target: CalendarTarget::Apod,
        start_date: apod.requested_date,
        min_date: CalendarDate::apod_epoch(),
        max_date: today,
        disabled_dates: apod.disabled_dates.iter().copied().collect(),
    })
}

fn apod_calendar_column() -> Markup {
    html! {
        div.column.is-narrow {
            div.apod-info {
                div.block {
                    input.input.is-hidden id=(APOD_CALENDAR_ID) type="date";
                }
            }
        }
    }
}

fn apod_image(image: &ApodImage) -> Markup {
    let padding = image.aspect_ratio.unwrap_or(FALLBACK_ASPECT_RATIO);
    let subtitle = html! {
        @if let Some(copyright) = &image.copyright {
            " by " (copyright)
        }
    };

    html! {
        div #beyond {
            (title_block(&image.title, subtitle))
            div.columns {
                div.column.has-text-centered {
                    div.apod-img-wrapper {
                        img.apod-img src=(image.url) alt="";
                    }
                }
                (apod_calendar_column())
            }
            div.columns {
                div.column {
                    div.block.apod-exp.has-text-justified { (image.explanation) }
                }
            }
        }
        style {
            (PreEscaped(format!(".apod-img-wrapper:after {{ padding-bottom: {padding}%; }}")))
        }
    }
}

fn beyond_page(apod: &ApodState, today: CalendarDate) -> Page {
    let markup = match cache::resolve_apod_image(apod, apod.requested_date) {
        Resolution::Pending => return Page::Pending,
        Resolution::Ready(image) => apod_image(image),
        Resolution::Unavailable => html! {
            div #beyond {
                (title_block("No picture on this day", html! { (apod.requested_date.to_string()) }))
                div.columns {
                    div.column.has-text-centered {
                        p { "The picture for this date is not an image. Pick another day from the calendar." }
                    }
                    (apod_calendar_column())
                }
            }
        },
    };

    Page::Ready {
        markup,
        widgets: vec![apod_calendar(apod, today)],
    }
}

fn about_page() -> Markup {
    html! {
        div #about {
            (title_block("About Earth, Mars, and Beyond...", html! {}))
            div.columns {
                div.column {
                    div.block.about-exp.has-text-justified {
                        p { "Three views of the sky, all served from NASA's open APIs." }
                        ul {
                            li {
                                "The " em { "Earth" } " section shows the latest set from the "
                                em { "Earth Polychromatic Imaging Camera" } " (EPIC), on board a deep-space weather satellite."
                            }
                            li {
                                "The " em { "Mars" } " section samples photos sent by the Curiosity, Opportunity, "
                                "Spirit and Perseverance rovers, along with a summary of each mission."
                            }
                            li {
                                "The " em { "Beyond" } " section shows the "
                                em { "Astronomy Picture of the Day" } " (APOD) for any day since June 16, 1995."
                            }
                        }
                        p {
                            "More about these and other NASA APIs at "
                            a href="https://api.nasa.gov/" target="_blank" { "api.nasa.gov" } "."
                        }
                    }
                }
            }
        }
    }
}

fn footer() -> Markup {
    html! {
        div.columns.is-vcentered {
            div.content.column.has-text-centered {
                p {
                    "Imagery courtesy of "
                    a href="https://api.nasa.gov/" target="_blank" { "NASA Open APIs" } "."
                }
            }
        }
    }
}
