use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::fmt;

use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use crate::config::CoreConfig;
use crate::dates::CalendarDate;
use crate::{OPPORTUNITY_DEFAULT_DATE, RECENT_ROVER_LAG_DAYS, SPIRIT_DEFAULT_DATE};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Section {
    #[default]
    Earth,
    Mars,
    Beyond,
    About,
}

impl Section {
    #[must_use]
    pub const fn slug(self) -> &'static str {
        match self {
            Self::Earth => "earth",
            Self::Mars => "mars",
            Self::Beyond => "beyond",
            Self::About => "about",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Rover {
    #[default]
    Curiosity,
    Opportunity,
    Spirit,
    Perseverance,
}

impl Rover {
    pub const ALL: [Rover; 4] = [
        Self::Curiosity,
        Self::Opportunity,
        Self::Spirit,
        Self::Perseverance,
    ];

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Curiosity => "Curiosity",
            Self::Opportunity => "Opportunity",
            Self::Spirit => "Spirit",
            Self::Perseverance => "Perseverance",
        }
    }

    /// Path segment the proxy expects.
    #[must_use]
    pub const fn slug(self) -> &'static str {
        match self {
            Self::Curiosity => "curiosity",
            Self::Opportunity => "opportunity",
            Self::Spirit => "spirit",
            Self::Perseverance => "perseverance",
        }
    }

    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|rover| rover.name().eq_ignore_ascii_case(name.trim()))
    }

    /// Date the photo calendar opens on when the rover is picked from the menu.
    /// Retired rovers open on a day known to have a good photo set.
    #[must_use]
    pub fn default_photo_date(self, today: CalendarDate) -> CalendarDate {
        let fixed = |s: &str| CalendarDate::parse(s).unwrap_or(today);
        match self {
            Self::Curiosity | Self::Perseverance => today.add_days(-RECENT_ROVER_LAG_DAYS),
            Self::Opportunity => fixed(OPPORTUNITY_DEFAULT_DATE),
            Self::Spirit => fixed(SPIRIT_DEFAULT_DATE),
        }
    }
}

impl fmt::Display for Rover {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApodImage {
    pub date: CalendarDate,
    pub title: String,
    pub explanation: String,
    pub copyright: Option<String>,
    pub url: String,
    /// Height as a percentage of width; `None` until the probe lands.
    pub aspect_ratio: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApodState {
    pub requested_date: CalendarDate,
    pub current_image: Option<ApodImage>,
    /// Keyed by date, so one entry per day at most.
    pub cached_images: BTreeMap<CalendarDate, ApodImage>,
    pub disabled_dates: BTreeSet<CalendarDate>,
    pub checked_until: CalendarDate,
}

impl ApodState {
    #[must_use]
    pub fn new(requested_date: CalendarDate, checked_until: CalendarDate) -> Self {
        Self {
            requested_date,
            current_image: None,
            cached_images: BTreeMap::new(),
            disabled_dates: BTreeSet::new(),
            checked_until,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EpicImage {
    pub date: String,
    pub url: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EpicState {
    pub date: Option<CalendarDate>,
    pub images: Vec<EpicImage>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissionStatus {
    Active,
    Complete,
}

impl MissionStatus {
    #[must_use]
    pub fn from_manifest(status: &str) -> Self {
        if status.eq_ignore_ascii_case("complete") {
            Self::Complete
        } else {
            Self::Active
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoverInfo {
    pub rover: Rover,
    pub name: String,
    pub launch_date: String,
    pub landing_date: String,
    pub status: MissionStatus,
    pub total_photos: u64,
    pub min_date: CalendarDate,
    pub max_date: CalendarDate,
    pub disabled_dates: BTreeSet<CalendarDate>,
}

impl RoverInfo {
    #[must_use]
    pub fn completion_date(&self) -> Option<CalendarDate> {
        (self.status == MissionStatus::Complete).then_some(self.max_date)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoverPhotos {
    pub requested_date: CalendarDate,
    pub delivered_date: Option<CalendarDate>,
    pub urls: Vec<String>,
}

impl RoverPhotos {
    #[must_use]
    pub fn requested(date: CalendarDate) -> Self {
        Self {
            requested_date: date,
            delivered_date: None,
            urls: Vec::new(),
        }
    }

    #[must_use]
    pub fn delivered(date: CalendarDate, urls: Vec<String>) -> Self {
        Self {
            requested_date: date,
            delivered_date: Some(date),
            urls,
        }
    }

    #[must_use]
    pub fn is_delivered(&self) -> bool {
        self.delivered_date == Some(self.requested_date)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoverState {
    pub selected_rover: Rover,
    pub selected_rover_info: Option<RoverInfo>,
    pub photos: RoverPhotos,
    /// Manifests already derived this session.
    pub manifests: HashMap<Rover, RoverInfo>,
    /// Sampled photo sets by rover and Earth date.
    pub photo_sets: HashMap<(Rover, CalendarDate), Vec<String>>,
}

impl RoverState {
    #[must_use]
    pub fn new(rover: Rover, today: CalendarDate) -> Self {
        Self {
            selected_rover: rover,
            selected_rover_info: None,
            photos: RoverPhotos::requested(rover.default_photo_date(today)),
            manifests: HashMap::new(),
            photo_sets: HashMap::new(),
        }
    }

    /// Photos for `date` on the selected rover, already delivered when the set
    /// was sampled earlier in the session.
    #[must_use]
    pub fn photos_for(&self, date: CalendarDate) -> RoverPhotos {
        match self.photo_sets.get(&(self.selected_rover, date)) {
            Some(urls) => RoverPhotos::delivered(date, urls.clone()),
            None => RoverPhotos::requested(date),
        }
    }
}

/// One outstanding call to the gateway. Doubles as the in-flight key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FetchRequest {
    ApodImage(CalendarDate),
    ApodRange {
        start: CalendarDate,
        end: CalendarDate,
    },
    ApodDimensions {
        date: CalendarDate,
        url: String,
    },
    EpicLatest,
    RoverManifest(Rover),
    RoverPhotos {
        rover: Rover,
        date: CalendarDate,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InFlight {
    requests: HashSet<FetchRequest>,
}

impl InFlight {
    /// Returns `false` when the same request is already running.
    pub fn begin(&mut self, request: FetchRequest) -> bool {
        self.requests.insert(request)
    }

    pub fn finish(&mut self, request: &FetchRequest) -> bool {
        self.requests.remove(request)
    }

    #[must_use]
    pub fn contains(&self, request: &FetchRequest) -> bool {
        self.requests.contains(request)
    }

    /// Any disabled-date scan, whatever its bounds.
    #[must_use]
    pub fn has_range_scan(&self) -> bool {
        self.requests
            .iter()
            .any(|r| matches!(r, FetchRequest::ApodRange { .. }))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.requests.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.requests.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct Model {
    pub config: CoreConfig,
    pub today: CalendarDate,
    pub active_section: Section,
    pub apod: ApodState,
    pub epic: EpicState,
    pub rovers: RoverState,
    pub in_flight: InFlight,
    pub rng: StdRng,
}

impl Default for Model {
    fn default() -> Self {
        Self::new(CalendarDate::today_local(), StdRng::from_entropy())
    }
}

impl Model {
    #[must_use]
    pub fn new(today: CalendarDate, rng: StdRng) -> Self {
        let config = CoreConfig::default();
        Self {
            today,
            active_section: Section::default(),
            apod: ApodState::new(today, config.apod_scan_start),
            epic: EpicState::default(),
            rovers: RoverState::new(Rover::default(), today),
            in_flight: InFlight::default(),
            rng,
            config,
        }
    }

    /// Deterministic sampling for tests and replays.
    #[must_use]
    pub fn seeded(today: CalendarDate, seed: u64) -> Self {
        Self::new(today, StdRng::seed_from_u64(seed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> CalendarDate {
        CalendarDate::parse(s).unwrap()
    }

    #[test]
    fn test_model_defaults() {
        let model = Model::seeded(date("2024-03-10"), 1);
        assert_eq!(model.active_section, Section::Earth);
        assert_eq!(model.apod.requested_date, date("2024-03-10"));
        assert_eq!(model.apod.checked_until, CalendarDate::apod_epoch());
        assert_eq!(model.rovers.selected_rover, Rover::Curiosity);
        assert_eq!(model.rovers.photos.requested_date, date("2024-03-04"));
        assert!(!model.rovers.photos.is_delivered());
        assert!(model.in_flight.is_empty());
    }

    #[test]
    fn test_rover_default_dates() {
        let today = date("2024-03-10");
        assert_eq!(Rover::Perseverance.default_photo_date(today), date("2024-03-04"));
        assert_eq!(Rover::Opportunity.default_photo_date(today), date("2018-06-05"));
        assert_eq!(Rover::Spirit.default_photo_date(today), date("2010-03-03"));
    }

    #[test]
    fn test_rover_from_manifest_name() {
        assert_eq!(Rover::from_name("Curiosity"), Some(Rover::Curiosity));
        assert_eq!(Rover::from_name(" spirit "), Some(Rover::Spirit));
        assert_eq!(Rover::from_name("Sojourner"), None);
    }

    #[test]
    fn test_in_flight_rejects_duplicates() {
        let mut in_flight = InFlight::default();
        let request = FetchRequest::ApodImage(date("2020-12-08"));
        assert!(in_flight.begin(request.clone()));
        assert!(!in_flight.begin(request.clone()));
        assert_eq!(in_flight.len(), 1);
        assert!(in_flight.finish(&request));
        assert!(!in_flight.finish(&request));
    }

    #[test]
    fn test_range_scan_detected_regardless_of_bounds() {
        let mut in_flight = InFlight::default();
        assert!(!in_flight.has_range_scan());
        in_flight.begin(FetchRequest::ApodRange {
            start: date("1995-06-16"),
            end: date("2024-03-10"),
        });
        assert!(in_flight.has_range_scan());
    }

    #[test]
    fn test_photos_for_reuses_sampled_set() {
        let mut rovers = RoverState::new(Rover::Spirit, date("2024-03-10"));
        let day = date("2010-03-03");
        assert!(!rovers.photos_for(day).is_delivered());
        rovers
            .photo_sets
            .insert((Rover::Spirit, day), vec!["a.jpg".into()]);
        let photos = rovers.photos_for(day);
        assert!(photos.is_delivered());
        assert_eq!(photos.urls, vec!["a.jpg".to_string()]);
    }

    #[test]
    fn test_completion_date_only_for_complete_missions() {
        let info = RoverInfo {
            rover: Rover::Spirit,
            name: "Spirit".into(),
            launch_date: "2003-06-10".into(),
            landing_date: "2004-01-04".into(),
            status: MissionStatus::from_manifest("complete"),
            total_photos: 124_550,
            min_date: date("2004-01-05"),
            max_date: date("2010-03-21"),
            disabled_dates: BTreeSet::new(),
        };
        assert_eq!(info.completion_date(), Some(date("2010-03-21")));
        let active = RoverInfo {
            status: MissionStatus::from_manifest("active"),
            ..info
        };
        assert_eq!(active.completion_date(), None);
    }
}
