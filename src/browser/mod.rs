//! Browser capability consumed by the harvester
//!
//! The harvester never talks to a browser engine directly. Everything it needs
//! (navigation, element lookup, scripts, screenshots, timed waits) goes through
//! the [`BrowserSession`] trait, so the crawl logic can run against Chromium in
//! production and against an in-memory feed in tests.

pub mod chromium;

pub use chromium::ChromiumSession;

use async_trait::async_trait;
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Scrolls the window to the bottom of the document
pub const SCROLL_TO_BOTTOM: &str = "window.scrollTo(0, document.body.scrollHeight);";

/// Scrolls the window back to the top
pub const SCROLL_TO_TOP: &str = "window.scrollTo(0, 0);";

/// Scrolls the first script argument into the viewport
pub const SCROLL_INTO_VIEW: &str = "arguments[0].scrollIntoView();";

/// Errors raised by a browser session
#[derive(Debug, Error)]
pub enum BrowserError {
    #[error("No element matches {0}")]
    NoSuchElement(Locator),

    #[error("Timed out after {timeout_ms}ms waiting for {locator}")]
    Timeout { locator: Locator, timeout_ms: u64 },

    #[error("Click on element {0} was intercepted by another element")]
    ClickIntercepted(Element),

    #[error("Element {0} is no longer attached to the page")]
    StaleElement(Element),

    #[error("Script error: {0}")]
    Script(String),

    #[error("Failed to launch browser: {0}")]
    Launch(String),

    #[error("Driver error: {0}")]
    Driver(String),
}

impl BrowserError {
    /// True for errors a caller may treat as "element not there"
    pub fn is_missing(&self) -> bool {
        matches!(self, Self::NoSuchElement(_) | Self::StaleElement(_))
    }
}

/// Result type for browser operations
pub type BrowserResult<T> = Result<T, BrowserError>;

/// Element lookup strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Strategy {
    XPath,
    Css,
}

/// A (strategy, expression) pair identifying elements on the page
///
/// Relative XPath expressions (starting with `.`) are resolved against the
/// scope element passed alongside the locator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Locator {
    pub strategy: Strategy,
    pub expression: &'static str,
}

impl Locator {
    pub const fn xpath(expression: &'static str) -> Self {
        Self {
            strategy: Strategy::XPath,
            expression,
        }
    }

    pub const fn css(expression: &'static str) -> Self {
        Self {
            strategy: Strategy::Css,
            expression,
        }
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.strategy {
            Strategy::XPath => write!(f, "xpath {}", self.expression),
            Strategy::Css => write!(f, "css {}", self.expression),
        }
    }
}

/// Opaque handle to an element found by a session
///
/// Handles are only meaningful to the session that issued them and become
/// stale once the page is navigated or reloaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Element(u64);

impl Element {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn id(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Keys the harvester sends to the page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Escape,
}

impl Key {
    /// DOM key and code name
    pub fn as_str(&self) -> &'static str {
        match self {
            Key::Escape => "Escape",
        }
    }

    /// Windows virtual key code sent with trusted key events
    pub fn virtual_key_code(&self) -> i64 {
        match self {
            Key::Escape => 27,
        }
    }
}

/// Capability interface over a live browser page
///
/// A session is exclusively owned by one harvest and every call completes
/// before the next one starts.
#[async_trait]
pub trait BrowserSession: Send + Sync {
    /// Loads `url`, discarding the current document and all element handles
    async fn navigate(&self, url: &str) -> BrowserResult<()>;

    /// First element matching `locator`, searched under `scope` or the document
    async fn find_one(&self, scope: Option<Element>, locator: &Locator) -> BrowserResult<Element>;

    /// All elements matching `locator` in document order
    async fn find_all(
        &self,
        scope: Option<Element>,
        locator: &Locator,
    ) -> BrowserResult<Vec<Element>>;

    /// Waits until `locator` matches in the document, failing with
    /// [`BrowserError::Timeout`] after `timeout`
    async fn wait_until_present(
        &self,
        locator: &Locator,
        timeout: Duration,
    ) -> BrowserResult<Element>;

    /// Runs `code` with `args` bound to `arguments[..]`
    async fn run_script(&self, code: &str, args: &[Element]) -> BrowserResult<serde_json::Value>;

    /// PNG screenshot of one element
    async fn screenshot_element(&self, element: Element) -> BrowserResult<Vec<u8>>;

    /// Length of the currently rendered document markup
    async fn rendered_size(&self) -> BrowserResult<usize>;

    /// Visible text of an element
    async fn text(&self, element: Element) -> BrowserResult<String>;

    /// Attribute value, `None` when the attribute is absent
    async fn attribute(&self, element: Element, name: &str) -> BrowserResult<Option<String>>;

    /// Rendered markup of an element
    async fn outer_html(&self, element: Element) -> BrowserResult<String>;

    async fn is_displayed(&self, element: Element) -> BrowserResult<bool>;

    /// Clicks an element, failing with [`BrowserError::ClickIntercepted`]
    /// when an overlay sits on top of it
    async fn click(&self, element: Element) -> BrowserResult<()>;

    /// Moves the pointer over an element
    async fn hover(&self, element: Element) -> BrowserResult<()>;

    /// Sends a key press to the focused document
    async fn press_key(&self, key: Key) -> BrowserResult<()>;
}

/// Looks up an optional element, mapping "not found" to `None`
pub async fn find_optional<S>(
    session: &S,
    scope: Option<Element>,
    locator: &Locator,
) -> BrowserResult<Option<Element>>
where
    S: BrowserSession + ?Sized,
{
    match session.find_one(scope, locator).await {
        Ok(element) => Ok(Some(element)),
        Err(e) if e.is_missing() => Ok(None),
        Err(e) => Err(e),
    }
}

/// Tries each locator in turn and returns the first match
pub async fn find_first_of<S>(
    session: &S,
    scope: Option<Element>,
    locators: &[Locator],
) -> BrowserResult<Option<Element>>
where
    S: BrowserSession + ?Sized,
{
    for locator in locators {
        if let Some(element) = find_optional(session, scope, locator).await? {
            return Ok(Some(element));
        }
    }
    Ok(None)
}
