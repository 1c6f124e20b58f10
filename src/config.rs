use crate::error::{CareersError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Data attributes on a search result anchor that carry the advertised job metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ListingAttributes {
    pub title: String,
    pub location: String,
    pub identifier: String,
}

impl Default for ListingAttributes {
    fn default() -> Self {
        Self {
            title: "data-ph-at-job-title-text".to_string(),
            location: "data-ph-at-job-location-text".to_string(),
            identifier: "data-ph-at-job-id-text".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    pub base_url: String,
    pub careers_link_text: String,
    pub search_input_selector: String,
    pub search_button_selector: String,
    pub first_result_selector: String,
    pub listing_attributes: ListingAttributes,
    pub structured_data_xpath: String,
    pub structured_data_prefix: String,
    pub apply_link_selector: String,
    pub wait_timeout_secs: u64,
    pub poll_interval_ms: u64,
    pub headless: bool,
    pub chrome_executable: Option<PathBuf>,
    pub log_dir: PathBuf,
    pub report_path: PathBuf,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            base_url: "https://www.labcorp.com".to_string(),
            careers_link_text: "Careers".to_string(),
            search_input_selector: "input[placeholder='Search job title or location']".to_string(),
            search_button_selector: "button[aria-label='Search']".to_string(),
            first_result_selector:
                "span[data-ph-id='ph-page-element-page11-CRdnpK'] a.au-target:first-of-type"
                    .to_string(),
            listing_attributes: ListingAttributes::default(),
            structured_data_xpath: "/html/head/script[2]/text()".to_string(),
            structured_data_prefix: "{\"identifier\"".to_string(),
            apply_link_selector: "a.btn.primary-button.au-target".to_string(),
            wait_timeout_secs: 10,
            poll_interval_ms: 250,
            headless: true,
            chrome_executable: None,
            log_dir: PathBuf::from("target"),
            report_path: PathBuf::from("target/careers-report.json"),
        }
    }
}

impl RunConfig {
    /// Reads a JSON config file; keys that are absent keep their defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let config: RunConfig = serde_json::from_str(&text)
            .map_err(|e| CareersError::Config(format!("{}: {}", path.display(), e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.wait_timeout_secs == 0 {
            return Err(CareersError::Config("wait_timeout_secs must be positive".to_string()));
        }
        if self.poll_interval_ms == 0 {
            return Err(CareersError::Config("poll_interval_ms must be positive".to_string()));
        }
        url::Url::parse(&self.base_url)
            .map_err(|e| CareersError::Config(format!("base_url {:?}: {}", self.base_url, e)))?;
        Ok(())
    }

    pub fn wait_timeout(&self) -> Duration {
        Duration::from_secs(self.wait_timeout_secs)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}
