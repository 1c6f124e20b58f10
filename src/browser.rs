//! Browser-engine contract and its Chrome implementation.
//!
//! Everything above this module talks to [`BrowserSession`] only; the
//! chromiumoxide types never leak out of here.

use crate::error::{CareersError, Result};
use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::browser::{
    Bounds, GetWindowForTargetParams, SetWindowBoundsParams, WindowState,
};
use chromiumoxide::element::Element;
use chromiumoxide::page::Page;
use futures::StreamExt;
use log::{debug, warn};
use serde_json::Value;
use std::env;
use std::fmt;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

const DISPLAYED_JS: &str = "function() {
    const rect = this.getBoundingClientRect();
    const style = window.getComputedStyle(this);
    return rect.width > 0 && rect.height > 0 && style.visibility !== 'hidden' && style.display !== 'none';
}";

const ENABLED_JS: &str = "function() { return !this.disabled; }";

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Locator {
    Css(String),
    /// An anchor whose visible text equals the given text.
    LinkText(String),
}

impl Locator {
    pub fn css(selector: impl Into<String>) -> Self {
        Locator::Css(selector.into())
    }

    pub fn link_text(text: impl Into<String>) -> Self {
        Locator::LinkText(text.into())
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Locator::Css(selector) => write!(f, "element `{}`", selector),
            Locator::LinkText(text) => write!(f, "link \"{}\"", text),
        }
    }
}

#[async_trait]
pub trait PageElement: Send + Sync {
    async fn click(&self) -> Result<()>;
    async fn send_keys(&self, text: &str) -> Result<()>;
    async fn attribute(&self, name: &str) -> Result<Option<String>>;
    async fn is_displayed(&self) -> Result<bool>;
    async fn is_enabled(&self) -> Result<bool>;
}

/// One browser window driven by one scenario.
#[async_trait]
pub trait BrowserSession: Send + Sync {
    type Element: PageElement;

    async fn navigate(&self, url: &str) -> Result<()>;

    /// Immediate lookup; `None` when nothing matches right now.
    /// Use [`crate::wait::wait_for_element`] for a bounded wait.
    async fn find_element(&self, locator: &Locator) -> Result<Option<Self::Element>>;

    /// Evaluates a JavaScript expression and returns its JSON value.
    async fn execute_script(&self, expression: &str) -> Result<Value>;

    async fn current_url(&self) -> Result<Option<String>>;
    async fn title(&self) -> Result<Option<String>>;
    async fn maximize(&self) -> Result<()>;
    async fn close(&self) -> Result<()>;
}

#[async_trait]
pub trait SessionLauncher: Send + Sync {
    type Session: BrowserSession + 'static;

    async fn launch(&self) -> Result<Self::Session>;
}

pub struct ChromeElement {
    inner: Element,
}

#[async_trait]
impl PageElement for ChromeElement {
    async fn click(&self) -> Result<()> {
        self.inner.click().await?;
        Ok(())
    }

    async fn send_keys(&self, text: &str) -> Result<()> {
        self.inner.click().await?;
        self.inner.type_str(text).await?;
        Ok(())
    }

    async fn attribute(&self, name: &str) -> Result<Option<String>> {
        Ok(self.inner.attribute(name).await?)
    }

    async fn is_displayed(&self) -> Result<bool> {
        let returns = self.inner.call_js_fn(DISPLAYED_JS, false).await?;
        Ok(returns.result.value.as_ref().and_then(Value::as_bool).unwrap_or(false))
    }

    async fn is_enabled(&self) -> Result<bool> {
        let returns = self.inner.call_js_fn(ENABLED_JS, false).await?;
        Ok(returns.result.value.as_ref().and_then(Value::as_bool).unwrap_or(true))
    }
}

pub struct ChromeSession {
    browser: Mutex<Browser>,
    page: Page,
    handle: JoinHandle<()>,
}

#[async_trait]
impl BrowserSession for ChromeSession {
    type Element = ChromeElement;

    async fn navigate(&self, url: &str) -> Result<()> {
        debug!("Navigating to {}", url);
        self.page.goto(url).await?;
        self.page.wait_for_navigation().await?;
        Ok(())
    }

    async fn find_element(&self, locator: &Locator) -> Result<Option<ChromeElement>> {
        // The DOM may be mid-navigation; a failed query counts as "not there yet".
        let found = match locator {
            Locator::Css(selector) => match self.page.find_elements(selector.as_str()).await {
                Ok(elements) => elements.into_iter().next(),
                Err(e) => {
                    debug!("Query for {} failed: {}", locator, e);
                    None
                }
            },
            Locator::LinkText(text) => self.find_link_by_text(text).await,
        };
        Ok(found.map(|inner| ChromeElement { inner }))
    }

    async fn execute_script(&self, expression: &str) -> Result<Value> {
        let result = self.page.evaluate(expression).await?;
        Ok(result.value().cloned().unwrap_or(Value::Null))
    }

    async fn current_url(&self) -> Result<Option<String>> {
        Ok(self.page.url().await?)
    }

    async fn title(&self) -> Result<Option<String>> {
        Ok(self.page.get_title().await?)
    }

    async fn maximize(&self) -> Result<()> {
        let window = self.page.execute(GetWindowForTargetParams::default()).await?;
        let bounds = Bounds::builder().window_state(WindowState::Maximized).build();
        self.page
            .execute(SetWindowBoundsParams::new(window.result.window_id, bounds))
            .await?;
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        let mut browser = self.browser.lock().await;
        browser.close().await?;
        if let Err(e) = browser.wait().await {
            warn!("Browser process did not exit cleanly: {}", e);
        }
        self.handle.abort();
        Ok(())
    }
}

impl ChromeSession {
    async fn find_link_by_text(&self, text: &str) -> Option<Element> {
        let anchors = match self.page.find_elements("a").await {
            Ok(anchors) => anchors,
            Err(e) => {
                debug!("Query for anchors failed: {}", e);
                return None;
            }
        };
        for anchor in anchors {
            if let Ok(Some(anchor_text)) = anchor.inner_text().await {
                if anchor_text.trim() == text {
                    return Some(anchor);
                }
            }
        }
        None
    }
}

#[derive(Debug, Clone, Default)]
pub struct ChromeLauncher {
    pub headless: bool,
    pub chrome_executable: Option<PathBuf>,
}

impl ChromeLauncher {
    pub fn new(headless: bool, chrome_executable: Option<PathBuf>) -> Self {
        Self {
            headless,
            chrome_executable,
        }
    }

    fn executable(&self) -> Option<PathBuf> {
        if let Some(path) = &self.chrome_executable {
            return Some(path.clone());
        }
        if let Ok(path) = env::var("CHROME_EXECUTABLE") {
            return Some(PathBuf::from(path));
        }
        // Otherwise chromiumoxide auto-detects; this path covers the usual Linux install.
        let known_path = Path::new("/usr/bin/google-chrome-stable");
        known_path.exists().then(|| known_path.to_path_buf())
    }
}

#[async_trait]
impl SessionLauncher for ChromeLauncher {
    type Session = ChromeSession;

    async fn launch(&self) -> Result<ChromeSession> {
        let mut builder = BrowserConfig::builder();
        if let Some(path) = self.executable() {
            builder = builder.chrome_executable(path);
        }
        if !self.headless {
            builder = builder.with_head();
        }

        let config = builder
            .arg("--no-sandbox")
            .arg("--disable-dev-shm-usage")
            .window_size(1920, 1080)
            .build()
            .map_err(CareersError::BrowserLaunch)?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| CareersError::BrowserLaunch(e.to_string()))?;

        let handle = tokio::task::spawn(async move {
            while let Some(h) = handler.next().await {
                if h.is_err() {
                    break;
                }
            }
        });

        let page = browser.new_page("about:blank").await?;

        Ok(ChromeSession {
            browser: Mutex::new(browser),
            page,
            handle,
        })
    }
}
