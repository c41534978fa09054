use serde::{Deserialize, Serialize};

use crate::config::CoreConfig;
use crate::dates::CalendarDate;
use crate::gateway::{ApodRecord, EpicRecord, GatewayResult, ManifestEnvelope, PhotosEnvelope};
use crate::model::{Rover, Section};

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub enum Event {
    #[default]
    Noop,

    // --- Shell lifecycle ---
    AppStarted {
        today: CalendarDate,
        config: Box<CoreConfig>,
    },
    /// The user's local calendar day rolled over.
    DayChanged {
        today: CalendarDate,
    },
    /// Load or visibility change: re-check and repaint without changing state.
    Repaint,

    // --- User interaction ---
    SectionSelected {
        section: Section,
        rover: Option<Rover>,
    },
    ApodDateSelected {
        date: CalendarDate,
    },
    RoverDateSelected {
        date: CalendarDate,
    },

    // --- Gateway responses ---
    ApodImageFetched {
        date: CalendarDate,
        result: Box<GatewayResult<ApodRecord>>,
    },
    ApodRangeFetched {
        start: CalendarDate,
        end: CalendarDate,
        result: Box<GatewayResult<Vec<ApodRecord>>>,
    },
    ApodImageMeasured {
        date: CalendarDate,
        url: String,
        result: Box<GatewayResult<f64>>,
    },
    EpicFetched(Box<GatewayResult<Vec<EpicRecord>>>),
    RoverManifestFetched {
        rover: Rover,
        result: Box<GatewayResult<ManifestEnvelope>>,
    },
    RoverPhotosFetched {
        rover: Rover,
        date: CalendarDate,
        result: Box<GatewayResult<PhotosEnvelope>>,
    },
}

impl Event {
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Noop => "noop",
            Self::AppStarted { .. } => "app_started",
            Self::DayChanged { .. } => "day_changed",
            Self::Repaint => "repaint",
            Self::SectionSelected { .. } => "section_selected",
            Self::ApodDateSelected { .. } => "apod_date_selected",
            Self::RoverDateSelected { .. } => "rover_date_selected",
            Self::ApodImageFetched { .. } => "apod_image_fetched",
            Self::ApodRangeFetched { .. } => "apod_range_fetched",
            Self::ApodImageMeasured { .. } => "apod_image_measured",
            Self::EpicFetched(_) => "epic_fetched",
            Self::RoverManifestFetched { .. } => "rover_manifest_fetched",
            Self::RoverPhotosFetched { .. } => "rover_photos_fetched",
        }
    }

    #[must_use]
    pub const fn is_user_initiated(&self) -> bool {
        matches!(
            self,
            Self::SectionSelected { .. }
                | Self::ApodDateSelected { .. }
                | Self::RoverDateSelected { .. }
        )
    }

}
