#![allow(dead_code)]

use async_trait::async_trait;
use careers_acceptance::browser::{BrowserSession, Locator, PageElement, SessionLauncher};
use careers_acceptance::config::RunConfig;
use careers_acceptance::error::{CareersError, Result};
use careers_acceptance::test_log::TestLog;
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

pub const HOME: &str = "https://careers.test/";
pub const CAREERS: &str = "https://careers.test/careers";
pub const RESULTS: &str = "https://careers.test/careers/search";
pub const JOB: &str = "https://careers.test/careers/job/25-1234";
pub const APPLY: &str = "https://apply.test/25-1234";

pub const DESCRIPTION_HTML: &str = "<p>Labcorp is hiring.</p><p> </p>\
    <p>Second paragraph goes here.</p>\
    <p>The right candidate for this role will participate in the test automation technology development. They will work cross-functionally.</p>\
    <h3>Main responsibilities include</h3>\
    <ul><li>Design test plans</li><li>Build test automation frameworks</li></ul>";

#[derive(Debug, Clone, Default)]
pub struct ElementSpec {
    pub attributes: HashMap<String, String>,
    pub click_to: Option<String>,
    pub hidden: bool,
}

impl ElementSpec {
    pub fn link(to: &str) -> Self {
        Self {
            click_to: Some(to.to_string()),
            ..Default::default()
        }
    }

    pub fn with_attr(mut self, name: &str, value: &str) -> Self {
        self.attributes.insert(name.to_string(), value.to_string());
        self
    }
}

#[derive(Debug, Clone, Default)]
pub struct PageSpec {
    pub title: String,
    pub elements: HashMap<Locator, ElementSpec>,
    /// Value returned by script evaluation once enough polls have happened.
    pub script_value: Value,
    pub script_ready_after_polls: usize,
}

#[derive(Debug, Clone, Default)]
pub struct FakeSite {
    pub pages: HashMap<String, PageSpec>,
    /// Navigating to one of these fails like an unreachable host.
    pub unreachable: Vec<String>,
    /// Navigating here panics inside the session.
    pub panics_at: Option<String>,
}

impl FakeSite {
    pub fn page_mut(&mut self, url: &str) -> &mut PageSpec {
        self.pages.entry(url.to_string()).or_default()
    }
}

pub fn escape(html: &str) -> String {
    html.replace('<', "&lt;").replace('>', "&gt;")
}

pub fn posting_json(title: &str, id: &str, locality: &str, region: &str, country: &str) -> String {
    posting_json_with_description(title, id, locality, region, country, DESCRIPTION_HTML)
}

pub fn posting_json_with_description(
    title: &str,
    id: &str,
    locality: &str,
    region: &str,
    country: &str,
    description_html: &str,
) -> String {
    format!(
        r#"{{"identifier":{{"name":"Labcorp","value":{}}},"title":{},"jobLocation":{{"address":{{"addressLocality":{},"addressRegion":{},"addressCountry":{}}}}},"description":{}}}"#,
        Value::from(id),
        Value::from(title),
        Value::from(locality),
        Value::from(region),
        Value::from(country),
        Value::from(escape(description_html)),
    )
}

/// The careers site as the default configuration expects to find it.
pub fn careers_site(config: &RunConfig) -> FakeSite {
    let mut site = FakeSite::default();

    let home = site.page_mut(HOME);
    home.title = "Labcorp | Home".to_string();
    home.elements
        .insert(Locator::link_text("Careers"), ElementSpec::link(CAREERS));

    let careers = site.page_mut(CAREERS);
    careers.title = "Careers".to_string();
    careers.elements.insert(
        Locator::css(&config.search_input_selector),
        ElementSpec::default(),
    );
    careers.elements.insert(
        Locator::css(&config.search_button_selector),
        ElementSpec::link(RESULTS),
    );

    let attrs = &config.listing_attributes;
    let card = ElementSpec::default()
        .with_attr(&attrs.title, "QA Test Automation Developer")
        .with_attr(&attrs.location, "Burlington, US")
        .with_attr(&attrs.identifier, "25-1234")
        .with_attr("href", "/careers/job/25-1234");
    site.page_mut(RESULTS)
        .elements
        .insert(Locator::css(&config.first_result_selector), card);

    let job = site.page_mut(JOB);
    job.title = "QA Test Automation Developer".to_string();
    job.script_value = Value::String(posting_json(
        "QA Test Automation Developer",
        "25-1234",
        "Burlington",
        "",
        "US",
    ));
    job.script_ready_after_polls = 2;
    job.elements.insert(
        Locator::css(&config.apply_link_selector),
        ElementSpec::default().with_attr("href", APPLY),
    );

    site
}

pub fn test_config() -> RunConfig {
    RunConfig {
        base_url: HOME.to_string(),
        wait_timeout_secs: 1,
        poll_interval_ms: 10,
        ..Default::default()
    }
}

pub fn quiet_log(dir: &Path) -> TestLog {
    TestLog::quiet(dir)
}

#[derive(Debug, Default)]
pub struct FakeState {
    pub url: Option<String>,
    pub typed: Vec<String>,
    pub visited: Vec<String>,
    pub polls: usize,
    pub maximized: bool,
}

pub struct FakeSession {
    site: Arc<FakeSite>,
    pub state: Arc<Mutex<FakeState>>,
    closed: Arc<AtomicUsize>,
}

impl FakeSession {
    pub fn new(site: Arc<FakeSite>, closed: Arc<AtomicUsize>) -> Self {
        Self {
            site,
            state: Arc::new(Mutex::new(FakeState::default())),
            closed,
        }
    }

    fn current_page(&self) -> Option<&PageSpec> {
        let url = self.state.lock().url.clone()?;
        self.site.pages.get(&url)
    }
}

fn go(state: &Mutex<FakeState>, url: &str) {
    let mut state = state.lock();
    state.url = Some(url.to_string());
    state.visited.push(url.to_string());
    state.polls = 0;
}

pub struct FakeElement {
    spec: ElementSpec,
    state: Arc<Mutex<FakeState>>,
}

#[async_trait]
impl PageElement for FakeElement {
    async fn click(&self) -> Result<()> {
        if let Some(to) = &self.spec.click_to {
            go(&self.state, to);
        }
        Ok(())
    }

    async fn send_keys(&self, text: &str) -> Result<()> {
        self.state.lock().typed.push(text.to_string());
        Ok(())
    }

    async fn attribute(&self, name: &str) -> Result<Option<String>> {
        Ok(self.spec.attributes.get(name).cloned())
    }

    async fn is_displayed(&self) -> Result<bool> {
        Ok(!self.spec.hidden)
    }

    async fn is_enabled(&self) -> Result<bool> {
        Ok(true)
    }
}

#[async_trait]
impl BrowserSession for FakeSession {
    type Element = FakeElement;

    async fn navigate(&self, url: &str) -> Result<()> {
        if self.site.panics_at.as_deref() == Some(url) {
            panic!("renderer crashed loading {}", url);
        }
        if self.site.unreachable.iter().any(|u| u == url) {
            return Err(CareersError::Navigation(format!(
                "net::ERR_CONNECTION_REFUSED at {}",
                url
            )));
        }
        go(&self.state, url);
        Ok(())
    }

    async fn find_element(&self, locator: &Locator) -> Result<Option<FakeElement>> {
        Ok(self
            .current_page()
            .and_then(|page| page.elements.get(locator))
            .map(|spec| FakeElement {
                spec: spec.clone(),
                state: Arc::clone(&self.state),
            }))
    }

    async fn execute_script(&self, _expression: &str) -> Result<Value> {
        let Some(page) = self.current_page() else {
            return Ok(Value::Null);
        };
        let mut state = self.state.lock();
        state.polls += 1;
        if state.polls > page.script_ready_after_polls {
            Ok(page.script_value.clone())
        } else {
            Ok(Value::Null)
        }
    }

    async fn current_url(&self) -> Result<Option<String>> {
        Ok(self.state.lock().url.clone())
    }

    async fn title(&self) -> Result<Option<String>> {
        Ok(self.current_page().map(|page| page.title.clone()))
    }

    async fn maximize(&self) -> Result<()> {
        self.state.lock().maximized = true;
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        self.closed.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[derive(Clone, Default)]
pub struct FakeLauncher {
    pub site: Arc<FakeSite>,
    pub launched: Arc<AtomicUsize>,
    pub closed: Arc<AtomicUsize>,
    pub fail_launch: bool,
    pub panic_launch: bool,
}

impl FakeLauncher {
    pub fn new(site: FakeSite) -> Self {
        Self {
            site: Arc::new(site),
            ..Default::default()
        }
    }

    pub fn launched(&self) -> usize {
        self.launched.load(Ordering::SeqCst)
    }

    pub fn closed(&self) -> usize {
        self.closed.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SessionLauncher for FakeLauncher {
    type Session = FakeSession;

    async fn launch(&self) -> Result<FakeSession> {
        if self.panic_launch {
            panic!("browser binary crashed during startup");
        }
        if self.fail_launch {
            return Err(CareersError::BrowserLaunch("no browser in this test".to_string()));
        }
        self.launched.fetch_add(1, Ordering::SeqCst);
        Ok(FakeSession::new(
            Arc::clone(&self.site),
            Arc::clone(&self.closed),
        ))
    }
}
