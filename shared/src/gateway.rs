//! Client half of the NASA gateway.
//!
//! Builds the GET requests the proxy understands, turns raw transport results
//! into typed records, and maps every failure onto [`GatewayError`]. Nothing in
//! here touches the model: [`dispatch`] only starts the request and names the
//! event the result comes back on.

use crux_http::Response;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use crate::capabilities::Http;
use crate::config::CoreConfig;
use crate::dates::CalendarDate;
use crate::event::Event;
use crate::imaging;
use crate::model::{FetchRequest, Rover};
use crate::ErrorKind;

pub const APOD_IMAGE_PATH: &str = "apod/get_image";
pub const APOD_RANGE_PATH: &str = "apod/get_images";
pub const EPIC_LATEST_PATH: &str = "epic/get_latest";
pub const MANIFEST_PATH: &str = "mars-photos/manifest";
pub const ROVER_PHOTOS_PATH: &str = "mars-photos/rovers";

/// Highest sol a manifest may list. Far beyond any mission so far, and small
/// enough that the sol-to-date arithmetic and the missing-sol scan stay cheap.
pub const MAX_SOL: u32 = 100_000;

#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum GatewayError {
    #[error("network failure: {reason}")]
    NetworkFailure { reason: String, status: Option<u16> },

    #[error("malformed response: {reason}")]
    MalformedResponse { reason: String },
}

impl GatewayError {
    pub fn malformed(reason: impl Into<String>) -> Self {
        Self::MalformedResponse {
            reason: reason.into(),
        }
    }

    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::NetworkFailure { .. } => ErrorKind::Network,
            Self::MalformedResponse { .. } => ErrorKind::MalformedResponse,
        }
    }
}

pub type GatewayResult<T> = Result<T, GatewayError>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApodRecord {
    pub date: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub explanation: String,
    #[serde(default)]
    pub copyright: Option<String>,
    #[serde(default)]
    pub url: String,
    pub media_type: String,
}

impl ApodRecord {
    #[must_use]
    pub fn is_image(&self) -> bool {
        self.media_type == "image"
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EpicRecord {
    /// `YYYY-MM-DD HH:MM:SS`
    pub date: String,
    /// File name token inside the daily archive.
    pub image: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestEnvelope {
    pub photo_manifest: PhotoManifest,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhotoManifest {
    pub name: String,
    pub launch_date: String,
    pub landing_date: String,
    pub status: String,
    pub total_photos: u64,
    #[serde(default)]
    pub photos: Vec<ManifestEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestEntry {
    pub sol: u32,
    pub earth_date: String,
    #[serde(default)]
    pub total_photos: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhotosEnvelope {
    #[serde(default)]
    pub photos: Vec<RoverPhotoRecord>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoverPhotoRecord {
    pub img_src: String,
    pub camera: CameraRecord,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CameraRecord {
    pub name: String,
}

/// Raw outcome of a GET as the HTTP capability reports it.
pub type HttpOutcome = crux_http::Result<Response<Vec<u8>>>;

fn endpoint(config: &CoreConfig, path: &str, query: &[(&str, String)]) -> GatewayResult<Url> {
    let base = config.proxy_base_url.trim_end_matches('/');
    let mut url = Url::parse(&format!("{base}/"))
        .and_then(|base| base.join(path))
        .map_err(|e| GatewayError::NetworkFailure {
            reason: format!("invalid proxy URL '{}': {e}", config.proxy_base_url),
            status: None,
        })?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(GatewayError::NetworkFailure {
            reason: format!("proxy URL '{}' is not http(s)", config.proxy_base_url),
            status: None,
        });
    }

    if !query.is_empty() {
        url.query_pairs_mut()
            .extend_pairs(query.iter().map(|(k, v)| (*k, v.as_str())));
    }
    Ok(url)
}

pub fn apod_image_request(config: &CoreConfig, date: CalendarDate) -> GatewayResult<Url> {
    endpoint(config, APOD_IMAGE_PATH, &[("date", date.to_string())])
}

pub fn apod_range_request(
    config: &CoreConfig,
    start: CalendarDate,
    end: CalendarDate,
) -> GatewayResult<Url> {
    endpoint(
        config,
        APOD_RANGE_PATH,
        &[("start_date", start.to_string()), ("end_date", end.to_string())],
    )
}

pub fn epic_latest_request(config: &CoreConfig) -> GatewayResult<Url> {
    endpoint(config, EPIC_LATEST_PATH, &[])
}

pub fn rover_manifest_request(config: &CoreConfig, rover: Rover) -> GatewayResult<Url> {
    endpoint(config, &format!("{MANIFEST_PATH}/{}", rover.slug()), &[])
}

pub fn rover_photos_request(
    config: &CoreConfig,
    rover: Rover,
    date: CalendarDate,
) -> GatewayResult<Url> {
    endpoint(
        config,
        &format!("{ROVER_PHOTOS_PATH}/{}/{date}", rover.slug()),
        &[],
    )
}

/// The APOD picture itself, fetched straight from NASA to read its size. The
/// URL comes from an APOD record, so a bad one is a malformed response.
pub fn image_probe_request(url: &str) -> GatewayResult<Url> {
    let parsed = Url::parse(url.trim())
        .map_err(|e| GatewayError::malformed(format!("unusable image URL '{url}': {e}")))?;
    if !matches!(parsed.scheme(), "http" | "https") || parsed.host_str().is_none() {
        return Err(GatewayError::malformed(format!("unusable image URL '{url}'")));
    }
    Ok(parsed)
}

/// Body of a 2xx response. Transport errors and other statuses are network
/// failures.
pub fn response_body(outcome: HttpOutcome) -> GatewayResult<Vec<u8>> {
    let mut response = outcome.map_err(|e| GatewayError::NetworkFailure {
        reason: e.to_string(),
        status: None,
    })?;
    let status = u16::from(response.status());
    if !(200..300).contains(&status) {
        return Err(GatewayError::NetworkFailure {
            reason: format!("proxy answered HTTP {status}"),
            status: Some(status),
        });
    }
    Ok(response.take_body().unwrap_or_default())
}

pub fn parse_json<T: DeserializeOwned>(body: GatewayResult<Vec<u8>>) -> GatewayResult<T> {
    serde_json::from_slice(&body?)
        .map_err(|e| GatewayError::malformed(format!("failed to parse JSON: {e}")))
}

pub fn parse_epic(body: GatewayResult<Vec<u8>>) -> GatewayResult<Vec<EpicRecord>> {
    let records: Vec<EpicRecord> = parse_json(body)?;
    if records.is_empty() {
        return Err(GatewayError::malformed("EPIC returned an empty image list"));
    }
    Ok(records)
}

pub fn parse_manifest(body: GatewayResult<Vec<u8>>) -> GatewayResult<ManifestEnvelope> {
    let envelope: ManifestEnvelope = parse_json(body)?;
    let manifest = &envelope.photo_manifest;
    if manifest.photos.is_empty() {
        return Err(GatewayError::malformed(format!(
            "manifest for {} lists no photos",
            manifest.name
        )));
    }
    if let Some(entry) = manifest.photos.iter().find(|entry| entry.sol > MAX_SOL) {
        return Err(GatewayError::malformed(format!(
            "manifest for {} lists sol {}, beyond {MAX_SOL}",
            manifest.name, entry.sol
        )));
    }
    Ok(envelope)
}

pub fn parse_aspect_ratio(body: GatewayResult<Vec<u8>>) -> GatewayResult<f64> {
    imaging::aspect_ratio(&body?).map_err(|e| GatewayError::malformed(e.to_string()))
}

/// Starts the request behind `request`. The result arrives later as the
/// matching `Event::*Fetched` / `Event::ApodImageMeasured`.
pub fn dispatch(request: &FetchRequest, config: &CoreConfig, http: &Http<Event>) -> GatewayResult<()> {
    const JSON: &str = "application/json";

    match request.clone() {
        FetchRequest::ApodImage(date) => {
            let url = apod_image_request(config, date)?;
            http.get(url.as_str())
                .header("Accept", JSON)
                .send(move |outcome| Event::ApodImageFetched {
                    date,
                    result: Box::new(parse_json(response_body(outcome))),
                });
        }
        FetchRequest::ApodRange { start, end } => {
            let url = apod_range_request(config, start, end)?;
            http.get(url.as_str())
                .header("Accept", JSON)
                .send(move |outcome| Event::ApodRangeFetched {
                    start,
                    end,
                    result: Box::new(parse_json(response_body(outcome))),
                });
        }
        FetchRequest::ApodDimensions { date, url } => {
            let target = image_probe_request(&url)?;
            http.get(target.as_str())
                .header("Accept", "image/*")
                .send(move |outcome| Event::ApodImageMeasured {
                    date,
                    url: url.clone(),
                    result: Box::new(parse_aspect_ratio(response_body(outcome))),
                });
        }
        FetchRequest::EpicLatest => {
            let url = epic_latest_request(config)?;
            http.get(url.as_str())
                .header("Accept", JSON)
                .send(|outcome| Event::EpicFetched(Box::new(parse_epic(response_body(outcome)))));
        }
        FetchRequest::RoverManifest(rover) => {
            let url = rover_manifest_request(config, rover)?;
            http.get(url.as_str())
                .header("Accept", JSON)
                .send(move |outcome| Event::RoverManifestFetched {
                    rover,
                    result: Box::new(parse_manifest(response_body(outcome))),
                });
        }
        FetchRequest::RoverPhotos { rover, date } => {
            let url = rover_photos_request(config, rover, date)?;
            http.get(url.as_str())
                .header("Accept", JSON)
                .send(move |outcome| Event::RoverPhotosFetched {
                    rover,
                    date,
                    result: Box::new(parse_json(response_body(outcome))),
                });
        }
    }
    Ok(())
}
