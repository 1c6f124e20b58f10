use crate::browser::{BrowserSession, Locator, PageElement};
use crate::config::RunConfig;
use crate::description::ParsedDescription;
use crate::error::{CareersError, Result};
use crate::models::{JobDetailRecord, JobListingSummary, JobPosting};
use crate::navigation::resolve_href;
use crate::wait::{wait_for_element, wait_until, ElementCondition, WaitConfig};
use log::{debug, info};
use serde_json::Value;
use std::sync::Arc;

/// Everything captured while opening a search result.
#[derive(Debug, Clone)]
pub struct JobLookup {
    pub listing: JobListingSummary,
    pub detail: JobDetailRecord,
    pub description: ParsedDescription,
}

pub struct JobDetailReader<S> {
    session: Arc<S>,
    config: Arc<RunConfig>,
}

impl<S: BrowserSession> JobDetailReader<S> {
    pub fn new(session: Arc<S>, config: Arc<RunConfig>) -> Self {
        Self { session, config }
    }

    /// Reads the first result card, follows its link and parses the detail page.
    pub async fn open_first_result(&self) -> Result<JobLookup> {
        let wait = WaitConfig::from(self.config.as_ref());
        let card = wait_for_element(
            self.session.as_ref(),
            &Locator::css(&self.config.first_result_selector),
            ElementCondition::Present,
            wait,
        )
        .await?;

        let attrs = &self.config.listing_attributes;
        let listing = JobListingSummary {
            title: read_attribute(&card, &attrs.title).await?,
            location: read_attribute(&card, &attrs.location).await?,
            identifier: read_attribute(&card, &attrs.identifier).await?,
        };
        info!("Listing card advertises {:?}", listing);

        let href = card
            .attribute("href")
            .await?
            .map(|h| h.trim().to_string())
            .filter(|h| !h.is_empty())
            .ok_or_else(|| CareersError::Navigation("job href was empty".to_string()))?;
        let current = self.session.current_url().await?;
        let target = resolve_href(current.as_deref(), &href);
        self.session.navigate(&target).await?;

        let json = self.wait_for_structured_data(wait).await?;
        let detail = JobPosting::from_json(&json)?.into_record();
        debug!("Detail page reports {} ({})", detail.title, detail.identifier);

        let description = ParsedDescription::parse(&detail.description_markup)?;

        Ok(JobLookup {
            listing,
            detail,
            description,
        })
    }

    async fn wait_for_structured_data(&self, wait: WaitConfig) -> Result<String> {
        let script = structured_data_script(&self.config.structured_data_xpath);
        let prefix = self.config.structured_data_prefix.as_str();
        let session = self.session.as_ref();
        let script = script.as_str();

        wait_until(wait, "embedded job structured data", move || {
            probe_structured_data(session, script, prefix)
        })
        .await
    }
}

async fn probe_structured_data<S>(session: &S, script: &str, prefix: &str) -> Result<Option<String>>
where
    S: BrowserSession + ?Sized,
{
    Ok(match session.execute_script(script).await? {
        Value::String(text) if text.trim().starts_with(prefix) => Some(text),
        _ => None,
    })
}

/// Missing attributes read as empty so the comparison step reports them.
async fn read_attribute<E: PageElement>(element: &E, name: &str) -> Result<String> {
    Ok(element.attribute(name).await?.unwrap_or_default())
}

/// JavaScript expression yielding the text of the node at `xpath`, or null.
fn structured_data_script(xpath: &str) -> String {
    let quoted = serde_json::to_string(xpath).unwrap_or_else(|_| "\"\"".to_string());
    format!(
        "(() => {{ const node = document.evaluate({}, document, null, \
         XPathResult.FIRST_ORDERED_NODE_TYPE, null).singleNodeValue; \
         return node ? node.nodeValue : null; }})()",
        quoted
    )
}
