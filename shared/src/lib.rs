#![forbid(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod app;
pub mod cache;
pub mod capabilities;
pub mod config;
pub mod dates;
pub mod event;
pub mod gateway;
pub mod imaging;
pub mod model;
pub mod store;
pub mod view;

use serde::{Deserialize, Serialize};

pub use app::App;
pub use capabilities::{Capabilities, Effect};
pub use config::CoreConfig;
pub use crux_core::{render::Render, App as CruxApp};
pub use dates::CalendarDate;
pub use event::Event;
pub use model::Model;
pub use view::ViewModel;

pub const DEFAULT_PROXY_BASE_URL: &str = "http://localhost:3000";
pub const DEFAULT_ROVER_SAMPLE_SIZE: usize = 25;
pub const EPIC_ARCHIVE_BASE: &str = "https://epic.gsfc.nasa.gov/archive/natural";
/// `padding-bottom` used until an image's real ratio is known.
pub const FALLBACK_ASPECT_RATIO: f64 = 100.0;
pub const RECENT_ROVER_LAG_DAYS: i64 = 6;
pub const OPPORTUNITY_DEFAULT_DATE: &str = "2018-06-05";
pub const SPIRIT_DEFAULT_DATE: &str = "2010-03-03";

pub const ROVER_CAMERAS: &[&str] = &[
    "FHAZ",
    "NAVCAM",
    "PANCAM",
    "RHAZ",
    "NAVCAM_LEFT",
    "NAVCAM_RIGHT",
    "FRONT_HAZCAM_LEFT_A",
    "FRONT_HAZCAM_RIGHT_A",
    "REAR_HAZCAM_LEFT",
    "REAR_HAZCAM_RIGHT",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    Network,
    MalformedResponse,
}

impl ErrorKind {
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::Network => "NETWORK_ERROR",
            Self::MalformedResponse => "MALFORMED_RESPONSE",
        }
    }
}
