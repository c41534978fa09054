use serde::{Deserialize, Serialize};

use crate::dates::CalendarDate;
use crate::{DEFAULT_PROXY_BASE_URL, DEFAULT_ROVER_SAMPLE_SIZE, ROVER_CAMERAS};

/// Settings the shell passes in with `Event::AppStarted`. Missing fields fall
/// back to the defaults below.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoreConfig {
    /// Base URL of the key-injecting proxy.
    pub proxy_base_url: String,
    pub rover_sample_size: usize,
    pub camera_allow_list: Vec<String>,
    /// First day scanned for video-only APOD entries.
    pub apod_scan_start: CalendarDate,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            proxy_base_url: DEFAULT_PROXY_BASE_URL.to_string(),
            rover_sample_size: DEFAULT_ROVER_SAMPLE_SIZE,
            camera_allow_list: ROVER_CAMERAS.iter().map(ToString::to_string).collect(),
            apod_scan_start: CalendarDate::apod_epoch(),
        }
    }
}

impl CoreConfig {
    #[must_use]
    pub fn allows_camera(&self, name: &str) -> bool {
        self.camera_allow_list.iter().any(|allowed| allowed == name)
    }
}
