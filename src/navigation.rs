use crate::browser::{BrowserSession, Locator, PageElement};
use crate::config::RunConfig;
use crate::error::{CareersError, Result};
use crate::wait::{wait_for_element, wait_until, ElementCondition, WaitConfig};
use log::{debug, warn};
use std::sync::Arc;

/// What happened when the Apply link was followed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApplyOutcome {
    Navigated(String),
    NotFound,
    MissingHref,
    Failed(String),
}

/// Resolves `href` against the page it was read from.
pub(crate) fn resolve_href(base: Option<&str>, href: &str) -> String {
    match base.and_then(|b| url::Url::parse(b).ok()) {
        Some(base) => base
            .join(href)
            .map(|u| u.to_string())
            .unwrap_or_else(|_| href.to_string()),
        None => href.to_string(),
    }
}

pub struct CareersNavigator<S> {
    session: Arc<S>,
    config: Arc<RunConfig>,
    careers_url: Option<String>,
}

impl<S: BrowserSession> CareersNavigator<S> {
    pub fn new(session: Arc<S>, config: Arc<RunConfig>) -> Self {
        Self {
            session,
            config,
            careers_url: None,
        }
    }

    fn wait(&self) -> WaitConfig {
        WaitConfig::from(self.config.as_ref())
    }

    /// Opens the site's home page and returns its title.
    pub async fn open_home_page(&self) -> Result<Option<String>> {
        self.session.navigate(&self.config.base_url).await?;
        self.session.maximize().await?;
        self.session.title().await
    }

    /// Clicks through to the careers section and remembers where it landed.
    pub async fn open_careers(&mut self) -> Result<String> {
        let link = wait_for_element(
            self.session.as_ref(),
            &Locator::link_text(&self.config.careers_link_text),
            ElementCondition::Clickable,
            self.wait(),
        )
        .await?;
        let before = self.session.current_url().await?;
        link.click().await?;

        let session = self.session.as_ref();
        let before = before.as_deref();
        let url = wait_until(self.wait(), "the careers page to load", move || {
            probe_url_change(session, before)
        })
        .await?;
        debug!("Careers page is {}", url);
        self.careers_url = Some(url.clone());
        Ok(url)
    }

    pub fn careers_url(&self) -> Option<&str> {
        self.careers_url.as_deref()
    }

    pub async fn search(&self, query: &str) -> Result<()> {
        let input = wait_for_element(
            self.session.as_ref(),
            &Locator::css(&self.config.search_input_selector),
            ElementCondition::Visible,
            self.wait(),
        )
        .await?;
        input.send_keys(query).await?;

        let button_locator = Locator::css(&self.config.search_button_selector);
        let button = self
            .session
            .find_element(&button_locator)
            .await?
            .ok_or_else(|| CareersError::Navigation(format!("{} not found", button_locator)))?;
        button.click().await
    }

    /// Goes back to the remembered careers page. Returns `false` without
    /// navigating when no careers page was visited.
    pub async fn return_to_careers(&self) -> Result<bool> {
        match &self.careers_url {
            Some(url) => {
                self.session.navigate(url).await?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Follows the Apply link when there is one. Never fails the scenario.
    pub async fn apply(&self) -> ApplyOutcome {
        match self.try_apply().await {
            Ok(outcome) => outcome,
            Err(CareersError::Timeout { .. }) => ApplyOutcome::NotFound,
            Err(e) => {
                warn!("Apply navigation failed: {}", e);
                ApplyOutcome::Failed(e.to_string())
            }
        }
    }

    async fn try_apply(&self) -> Result<ApplyOutcome> {
        let link = wait_for_element(
            self.session.as_ref(),
            &Locator::css(&self.config.apply_link_selector),
            ElementCondition::Present,
            self.wait(),
        )
        .await?;

        let href = match link.attribute("href").await? {
            Some(href) if !href.trim().is_empty() => href,
            _ => return Ok(ApplyOutcome::MissingHref),
        };
        let current = self.session.current_url().await?;
        let target = resolve_href(current.as_deref(), href.trim());
        self.session.navigate(&target).await?;
        Ok(ApplyOutcome::Navigated(target))
    }
}

/// Clicks return before the browser commits the navigation they start.
async fn probe_url_change<S>(session: &S, before: Option<&str>) -> Result<Option<String>>
where
    S: BrowserSession + ?Sized,
{
    Ok(session
        .current_url()
        .await?
        .filter(|url| Some(url.as_str()) != before))
}
