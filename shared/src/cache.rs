//! Cache and staleness engine.
//!
//! Two halves, both free of I/O:
//!
//! * `resolve_*` / [`refresh_disabled_dates`] read a section and say whether
//!   its data is ready, still pending, or known to be unavailable.
//!   [`plan_refills`] turns the pending ones for the active section into
//!   [`FetchRequest`]s, skipping anything already in flight.
//! * `absorb_*` fold a fetched payload back into a *new* section value, after
//!   checking that the payload is still relevant. The caller hands the result
//!   to the store.

use std::collections::BTreeSet;

use rand::seq::SliceRandom;
use rand::Rng;
use tracing::{debug, warn};

use crate::config::CoreConfig;
use crate::dates::{self, CalendarDate};
use crate::gateway::{
    ApodRecord, EpicRecord, GatewayError, ManifestEnvelope, PhotosEnvelope, MAX_SOL,
};
use crate::model::{
    ApodImage, ApodState, EpicImage, EpicState, FetchRequest, MissionStatus, Model, Rover,
    RoverInfo, RoverPhotos, RoverState, Section,
};
use crate::store::StateUpdate;
use crate::EPIC_ARCHIVE_BASE;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Resolution<'a, T> {
    Ready(&'a T),
    /// Requested (or about to be); the section renders empty for now.
    Pending,
    /// Known to have no usable data; nothing will be fetched.
    Unavailable,
}

impl<'a, T> Resolution<'a, T> {
    #[must_use]
    pub fn ready(self) -> Option<&'a T> {
        match self {
            Self::Ready(value) => Some(value),
            Self::Pending | Self::Unavailable => None,
        }
    }

    #[must_use]
    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Pending)
    }
}

/// Whether a late result still matches what the user is looking at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Relevance {
    Current,
    Stale,
}

impl Relevance {
    fn of(matches: bool) -> Self {
        if matches {
            Self::Current
        } else {
            Self::Stale
        }
    }
}

#[must_use]
pub fn resolve_apod_image(apod: &ApodState, date: CalendarDate) -> Resolution<'_, ApodImage> {
    if let Some(current) = apod.current_image.as_ref().filter(|image| image.date == date) {
        return Resolution::Ready(current);
    }
    if let Some(cached) = apod.cached_images.get(&date) {
        debug!(%date, "apod cache hit");
        return Resolution::Ready(cached);
    }
    if apod.disabled_dates.contains(&date) {
        return Resolution::Unavailable;
    }
    Resolution::Pending
}

/// The scan still owed for `[checked_until, today]`, or `None` once caught up.
#[must_use]
pub fn refresh_disabled_dates(apod: &ApodState, today: CalendarDate) -> Option<FetchRequest> {
    (apod.checked_until < today).then_some(FetchRequest::ApodRange {
        start: apod.checked_until,
        end: today,
    })
}

#[must_use]
pub fn resolve_epic_set(epic: &EpicState) -> Resolution<'_, EpicState> {
    if epic.date.is_some() {
        Resolution::Ready(epic)
    } else {
        Resolution::Pending
    }
}

#[must_use]
pub fn resolve_rover_manifest(rovers: &RoverState) -> Resolution<'_, RoverInfo> {
    match &rovers.selected_rover_info {
        Some(info) if info.rover == rovers.selected_rover => Resolution::Ready(info),
        _ => Resolution::Pending,
    }
}

#[must_use]
pub fn resolve_rover_photos(rovers: &RoverState) -> Resolution<'_, RoverPhotos> {
    if rovers.photos.is_delivered() {
        Resolution::Ready(&rovers.photos)
    } else {
        Resolution::Pending
    }
}

/// Fetches the active section still needs. Every returned request has been
/// recorded in `model.in_flight`; requests already running are left out.
pub fn plan_refills(model: &mut Model) -> Vec<FetchRequest> {
    let mut wanted = Vec::new();

    match model.active_section {
        Section::Beyond => {
            if let Some(scan) = refresh_disabled_dates(&model.apod, model.today) {
                if !model.in_flight.has_range_scan() {
                    wanted.push(scan);
                }
            }
            let date = model.apod.requested_date;
            match resolve_apod_image(&model.apod, date) {
                Resolution::Pending => wanted.push(FetchRequest::ApodImage(date)),
                Resolution::Ready(image) if image.aspect_ratio.is_none() => {
                    wanted.push(FetchRequest::ApodDimensions {
                        date,
                        url: image.url.clone(),
                    });
                }
                Resolution::Ready(_) | Resolution::Unavailable => {}
            }
        }
        Section::Earth => {
            if resolve_epic_set(&model.epic).is_pending() {
                wanted.push(FetchRequest::EpicLatest);
            }
        }
        Section::Mars => {
            let rover = model.rovers.selected_rover;
            if resolve_rover_manifest(&model.rovers).is_pending() {
                wanted.push(FetchRequest::RoverManifest(rover));
            }
            if resolve_rover_photos(&model.rovers).is_pending() {
                wanted.push(FetchRequest::RoverPhotos {
                    rover,
                    date: model.rovers.photos.requested_date,
                });
            }
        }
        Section::About => {}
    }

    wanted
        .into_iter()
        .filter(|request| {
            let fresh = model.in_flight.begin(request.clone());
            if !fresh {
                debug!(?request, "already in flight");
            }
            fresh
        })
        .collect()
}

/// Caches a single-day APOD record. Videos go to the disabled set instead.
#[must_use]
pub fn absorb_apod_image(apod: &ApodState, date: CalendarDate, record: ApodRecord) -> StateUpdate {
    let mut next = apod.clone();

    if !record.is_image() {
        debug!(%date, media_type = %record.media_type, "apod date has no image");
        next.disabled_dates.insert(date);
        return StateUpdate::Apod(next);
    }

    // A refetch of the same picture keeps a ratio that is already known.
    let aspect_ratio = apod
        .cached_images
        .get(&date)
        .filter(|cached| cached.url == record.url)
        .and_then(|cached| cached.aspect_ratio);

    let image = ApodImage {
        date,
        title: record.title,
        explanation: record.explanation,
        copyright: record.copyright.filter(|c| !c.trim().is_empty()),
        url: record.url,
        aspect_ratio,
    };
    next.cached_images.insert(date, image.clone());

    match Relevance::of(next.requested_date == date) {
        Relevance::Current => next.current_image = Some(image),
        Relevance::Stale => {
            debug!(%date, requested = %next.requested_date, "stale apod result cached only");
        }
    }
    StateUpdate::Apod(next)
}

#[must_use]
pub fn absorb_apod_range(apod: &ApodState, end: CalendarDate, records: &[ApodRecord]) -> StateUpdate {
    let mut next = apod.clone();
    for record in records.iter().filter(|record| !record.is_image()) {
        match CalendarDate::parse(&record.date) {
            Ok(date) => {
                next.disabled_dates.insert(date);
            }
            Err(error) => warn!(%error, "skipping apod entry with unreadable date"),
        }
    }
    next.checked_until = next.checked_until.max(end);
    StateUpdate::Apod(next)
}

/// Patches the ratio into the cached entry for `date`, as long as that entry
/// still points at the measured `url`.
#[must_use]
pub fn absorb_image_dimensions(
    apod: &ApodState,
    date: CalendarDate,
    url: &str,
    aspect_ratio: f64,
) -> Option<StateUpdate> {
    let cached = apod.cached_images.get(&date)?;
    if Relevance::of(cached.url == url) == Relevance::Stale {
        debug!(%date, "stale image measurement discarded");
        return None;
    }

    let mut next = apod.clone();
    if let Some(entry) = next.cached_images.get_mut(&date) {
        entry.aspect_ratio = Some(aspect_ratio);
    }
    if let Some(current) = next
        .current_image
        .as_mut()
        .filter(|image| image.date == date && image.url == url)
    {
        current.aspect_ratio = Some(aspect_ratio);
    }
    Some(StateUpdate::Apod(next))
}

#[must_use]
pub fn epic_image_url(day: CalendarDate, image: &str) -> String {
    format!(
        "{EPIC_ARCHIVE_BASE}/{:04}/{:02}/{:02}/png/{image}.png",
        day.year(),
        day.month(),
        day.day()
    )
}

/// Builds the EPIC set. A set that is already present wins over a late one.
pub fn absorb_epic(
    epic: &EpicState,
    records: &[EpicRecord],
) -> Result<Option<StateUpdate>, GatewayError> {
    if epic.date.is_some() {
        debug!("epic set already present, late result discarded");
        return Ok(None);
    }
    let first = records
        .first()
        .ok_or_else(|| GatewayError::malformed("EPIC returned an empty image list"))?;
    let day = CalendarDate::from_timestamp_prefix(&first.date)
        .map_err(|e| GatewayError::malformed(e.to_string()))?;

    let images = records
        .iter()
        .map(|record| EpicImage {
            date: record.date.clone(),
            url: epic_image_url(day, &record.image),
        })
        .collect();

    Ok(Some(StateUpdate::Epic(EpicState {
        date: Some(day),
        images,
    })))
}

pub fn rover_info_from_manifest(
    rover: Rover,
    envelope: &ManifestEnvelope,
) -> Result<RoverInfo, GatewayError> {
    let manifest = &envelope.photo_manifest;
    let (first, last) = match (manifest.photos.first(), manifest.photos.last()) {
        (Some(first), Some(last)) => (first, last),
        _ => {
            return Err(GatewayError::malformed(format!(
                "manifest for {} lists no photos",
                manifest.name
            )))
        }
    };
    if let Some(named) = Rover::from_name(&manifest.name).filter(|named| *named != rover) {
        return Err(GatewayError::malformed(format!(
            "asked for the {rover} manifest, got {named}"
        )));
    }
    if let Some(entry) = manifest.photos.iter().find(|entry| entry.sol > MAX_SOL) {
        return Err(GatewayError::malformed(format!(
            "manifest for {} lists sol {}, beyond {MAX_SOL}",
            manifest.name, entry.sol
        )));
    }
    let parse = |raw: &str| {
        CalendarDate::parse(raw).map_err(|e| GatewayError::malformed(e.to_string()))
    };
    let min_date = parse(&first.earth_date)?;
    let max_date = parse(&last.earth_date)?;
    let sols: Vec<u32> = manifest.photos.iter().map(|entry| entry.sol).collect();

    Ok(RoverInfo {
        rover,
        name: manifest.name.clone(),
        launch_date: manifest.launch_date.clone(),
        landing_date: manifest.landing_date.clone(),
        status: MissionStatus::from_manifest(&manifest.status),
        total_photos: manifest.total_photos,
        min_date,
        max_date,
        disabled_dates: dates::rover_disabled_dates(&sols, min_date),
    })
}

pub fn absorb_rover_manifest(
    rovers: &RoverState,
    rover: Rover,
    envelope: &ManifestEnvelope,
) -> Result<StateUpdate, GatewayError> {
    let mut next = rovers.clone();
    // First derivation wins; a rover's disabled dates never change afterwards.
    let info = match next.manifests.get(&rover) {
        Some(known) => known.clone(),
        None => {
            let derived = rover_info_from_manifest(rover, envelope)?;
            next.manifests.insert(rover, derived.clone());
            derived
        }
    };

    match Relevance::of(next.selected_rover == rover) {
        Relevance::Current => next.selected_rover_info = Some(info),
        Relevance::Stale => debug!(%rover, "manifest cached for a rover no longer selected"),
    }
    Ok(StateUpdate::Rover(next))
}

/// Up to `config.rover_sample_size` distinct URLs from allow-listed cameras.
pub fn sample_photos<R: Rng + ?Sized>(
    envelope: &PhotosEnvelope,
    config: &CoreConfig,
    rng: &mut R,
) -> Vec<String> {
    let mut seen = BTreeSet::new();
    let candidates: Vec<&str> = envelope
        .photos
        .iter()
        .filter(|photo| config.allows_camera(&photo.camera.name))
        .map(|photo| photo.img_src.as_str())
        .filter(|src| seen.insert(*src))
        .collect();

    candidates
        .choose_multiple(rng, config.rover_sample_size)
        .map(|src| (*src).to_string())
        .collect()
}

pub fn absorb_rover_photos<R: Rng + ?Sized>(
    rovers: &RoverState,
    config: &CoreConfig,
    rng: &mut R,
    rover: Rover,
    date: CalendarDate,
    envelope: &PhotosEnvelope,
) -> StateUpdate {
    let mut next = rovers.clone();
    let urls = next
        .photo_sets
        .entry((rover, date))
        .or_insert_with(|| sample_photos(envelope, config, rng))
        .clone();

    let relevant = next.selected_rover == rover && next.photos.requested_date == date;
    match Relevance::of(relevant) {
        Relevance::Current => next.photos = RoverPhotos::delivered(date, urls),
        Relevance::Stale => debug!(%rover, %date, "photo set cached for a date no longer requested"),
    }
    StateUpdate::Rover(next)
}
