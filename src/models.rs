use crate::error::{CareersError, Result};
use serde::{Deserialize, Serialize};

/// Job metadata as advertised on a search result card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobListingSummary {
    pub title: String,
    pub location: String,
    pub identifier: String,
}

/// Job metadata read from the detail page's structured data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobDetailRecord {
    pub title: String,
    pub identifier: String,
    pub location: String,
    /// Description body, still HTML-escaped.
    pub description_markup: String,
}

/// The JSON object embedded in a job detail page.
#[derive(Debug, Clone, Deserialize)]
pub struct JobPosting {
    pub title: String,
    pub identifier: Identifier,
    #[serde(rename = "jobLocation")]
    pub job_location: JobLocation,
    pub description: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Identifier {
    pub value: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct JobLocation {
    pub address: PostalAddress,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PostalAddress {
    #[serde(rename = "addressLocality")]
    pub locality: Option<String>,
    #[serde(rename = "addressRegion")]
    pub region: Option<String>,
    #[serde(rename = "addressCountry")]
    pub country: Option<String>,
}

impl PostalAddress {
    /// Joins the present, non-blank parts as "locality, region, country".
    pub fn display_location(&self) -> String {
        [&self.locality, &self.region, &self.country]
            .into_iter()
            .filter_map(|part| part.as_deref().map(str::trim))
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl JobPosting {
    /// Parses structured data text. Any missing required key is a data-shape error.
    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text).map_err(|e| CareersError::DataShape(e.to_string()))
    }

    pub fn into_record(self) -> JobDetailRecord {
        JobDetailRecord {
            location: self.job_location.address.display_location(),
            title: self.title,
            identifier: self.identifier.value,
            description_markup: self.description,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn address(locality: Option<&str>, region: Option<&str>, country: Option<&str>) -> PostalAddress {
        PostalAddress {
            locality: locality.map(String::from),
            region: region.map(String::from),
            country: country.map(String::from),
        }
    }

    #[test]
    fn test_location_skips_empty_region() {
        let addr = address(Some("Burlington"), Some(""), Some("US"));
        assert_eq!(addr.display_location(), "Burlington, US");
    }

    #[test]
    fn test_location_trims_and_skips_missing_parts() {
        assert_eq!(
            address(Some(" Durham "), Some("NC"), Some("US")).display_location(),
            "Durham, NC, US"
        );
        assert_eq!(address(None, Some("  "), Some("US")).display_location(), "US");
        assert_eq!(address(None, None, None).display_location(), "");
    }

    #[test]
    fn test_posting_into_record() {
        let json = r#"{
            "identifier": {"name": "Labcorp", "value": "25-12345"},
            "title": "QA Test Automation Developer",
            "jobLocation": {"address": {"addressLocality": "Burlington", "addressRegion": "", "addressCountry": "US"}},
            "description": "&lt;p&gt;Hello&lt;/p&gt;"
        }"#;
        let record = JobPosting::from_json(json).unwrap().into_record();
        assert_eq!(record.title, "QA Test Automation Developer");
        assert_eq!(record.identifier, "25-12345");
        assert_eq!(record.location, "Burlington, US");
        assert_eq!(record.description_markup, "&lt;p&gt;Hello&lt;/p&gt;");
    }

    #[test]
    fn test_missing_identifier_is_data_shape_error() {
        let json = r#"{"title": "X", "jobLocation": {"address": {}}, "description": ""}"#;
        let err = JobPosting::from_json(json).unwrap_err();
        assert!(matches!(err, CareersError::DataShape(_)));
    }

    #[test]
    fn test_missing_address_is_data_shape_error() {
        let json = r#"{"title": "X", "identifier": {"value": "1"}, "jobLocation": {}, "description": ""}"#;
        assert!(matches!(
            JobPosting::from_json(json),
            Err(CareersError::DataShape(_))
        ));
    }
}
