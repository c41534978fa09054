//! Requests to NASA, with the API key added on the way out.

use axum::body::Body;
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use chrono::NaiveDate;
use secrecy::{ExposeSecret, SecretString};
use tracing::{debug, warn};

use crate::config::ProxyConfig;
use crate::error::ProxyError;

const APOD_PATH: &str = "planetary/apod";
const MANIFEST_PATH: &str = "mars-photos/api/v1/manifests";
const ROVER_PHOTOS_PATH: &str = "mars-photos/api/v1/rovers";
const EPIC_LATEST_PATH: &str = "api/natural";
const DATE_FORMAT: &str = "%Y-%m-%d";

pub struct Upstream {
    http: reqwest::Client,
    api_key: SecretString,
    nasa_api_base: String,
    epic_api_base: String,
}

impl Upstream {
    #[must_use]
    pub fn new(http: reqwest::Client, config: &ProxyConfig) -> Self {
        Self {
            http,
            api_key: config.api_key.clone(),
            nasa_api_base: config.nasa_api_base.clone(),
            epic_api_base: config.epic_api_base.clone(),
        }
    }

    fn key(&self) -> (&'static str, &str) {
        ("api_key", self.api_key.expose_secret().as_str())
    }

    pub fn apod_image(&self, date: NaiveDate) -> Result<reqwest::Request, ProxyError> {
        let date = date.format(DATE_FORMAT).to_string();
        Ok(self
            .http
            .get(format!("{}/{APOD_PATH}", self.nasa_api_base))
            .query(&[self.key(), ("date", date.as_str())])
            .build()?)
    }

    pub fn apod_range(&self, start: NaiveDate, end: NaiveDate) -> Result<reqwest::Request, ProxyError> {
        let start = start.format(DATE_FORMAT).to_string();
        let end = end.format(DATE_FORMAT).to_string();
        Ok(self
            .http
            .get(format!("{}/{APOD_PATH}", self.nasa_api_base))
            .query(&[
                self.key(),
                ("start_date", start.as_str()),
                ("end_date", end.as_str()),
            ])
            .build()?)
    }

    /// EPIC is a separate service and takes no key.
    pub fn epic_latest(&self) -> Result<reqwest::Request, ProxyError> {
        Ok(self
            .http
            .get(format!("{}/{EPIC_LATEST_PATH}", self.epic_api_base))
            .build()?)
    }

    pub fn rover_manifest(&self, rover: &str) -> Result<reqwest::Request, ProxyError> {
        Ok(self
            .http
            .get(format!("{}/{MANIFEST_PATH}/{rover}", self.nasa_api_base))
            .query(&[self.key()])
            .build()?)
    }

    pub fn rover_photos(&self, rover: &str, date: NaiveDate) -> Result<reqwest::Request, ProxyError> {
        let date = date.format(DATE_FORMAT).to_string();
        Ok(self
            .http
            .get(format!("{}/{ROVER_PHOTOS_PATH}/{rover}/photos", self.nasa_api_base))
            .query(&[("earth_date", date.as_str()), self.key()])
            .build()?)
    }

    /// Sends `request` and relays NASA's status, content type and body.
    pub async fn forward(&self, request: reqwest::Request) -> Result<Response, ProxyError> {
        let path = request.url().path().to_string();
        debug!(%path, "forwarding upstream");

        let resp = self.http.execute(request).await?;
        if !resp.status().is_success() {
            warn!(%path, status = %resp.status(), "upstream answered with an error");
        }
        relay(resp).await.map_err(ProxyError::from)
    }
}

async fn relay(resp: reqwest::Response) -> Result<Response, reqwest::Error> {
    let status = StatusCode::from_u16(resp.status().as_u16()).unwrap_or(StatusCode::BAD_GATEWAY);
    let content_type = resp
        .headers()
        .get(http::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("application/json")
        .to_string();

    let bytes = resp.bytes().await?;
    let mut headers = HeaderMap::new();
    headers.insert(
        http::header::CONTENT_TYPE,
        HeaderValue::from_str(&content_type)
            .unwrap_or_else(|_| HeaderValue::from_static("application/json")),
    );
    Ok((status, headers, Body::from(bytes)).into_response())
}
