use anyhow::Result;
use async_trait::async_trait;
use std::fmt;

/// Element locator for storefront pages
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Locator {
    /// Select by CSS selector
    Css(String),
    /// Select by XPath expression
    XPath(String),
    /// Select by element id
    Id(String),
    /// Select by `name` attribute
    Name(String),
}

impl Locator {
    pub fn css(selector: impl Into<String>) -> Self {
        Locator::Css(selector.into())
    }

    pub fn xpath(expr: impl Into<String>) -> Self {
        Locator::XPath(expr.into())
    }

    pub fn id(id: impl Into<String>) -> Self {
        Locator::Id(id.into())
    }

    pub fn name(name: impl Into<String>) -> Self {
        Locator::Name(name.into())
    }

    /// Query kind and expression understood by the in-page resolver
    pub fn query(&self) -> (&'static str, String) {
        match self {
            Locator::Css(css) => ("css", css.clone()),
            Locator::XPath(xpath) => ("xpath", xpath.clone()),
            Locator::Id(id) => ("css", format!("[id=\"{}\"]", id)),
            Locator::Name(name) => ("css", format!("[name=\"{}\"]", name)),
        }
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Locator::Css(s) => write!(f, "css={}", s),
            Locator::XPath(s) => write!(f, "xpath={}", s),
            Locator::Id(s) => write!(f, "id={}", s),
            Locator::Name(s) => write!(f, "name={}", s),
        }
    }
}

/// Handle to an element resolved earlier from a [`Locator`].
///
/// The handle stays valid until the page re-renders the node it points to;
/// after that every call through it fails with [`DriverError::StaleElement`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ElementRef {
    pub id: String,
    pub locator: Locator,
}

impl fmt::Display for ElementRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}]", self.locator, self.id)
    }
}

/// Failure classes a poll loop may retry through
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Transient {
    /// Element not (yet) attached to the DOM
    NotPresent,
    /// Element reference no longer points at a live node
    Stale,
    /// Element present but hidden or covered
    NotInteractable,
}

#[derive(Debug, thiserror::Error)]
pub enum DriverError {
    #[error("no element matches {0}")]
    NoSuchElement(String),
    #[error("element {0} is no longer attached to the page")]
    StaleElement(String),
    #[error("element {0} is not interactable")]
    NotInteractable(String),
    #[error(transparent)]
    Browser(#[from] anyhow::Error),
}

impl DriverError {
    /// Transient class of this error, if it has one
    pub fn transient(&self) -> Option<Transient> {
        match self {
            DriverError::NoSuchElement(_) => Some(Transient::NotPresent),
            DriverError::StaleElement(_) => Some(Transient::Stale),
            DriverError::NotInteractable(_) => Some(Transient::NotInteractable),
            DriverError::Browser(_) => None,
        }
    }
}

/// Browser automation session
///
/// One session drives one browser page. Page objects never talk to the
/// browser directly; they go through this trait so the wait engine and the
/// lifecycle hooks can be exercised against a scripted session.
#[async_trait]
pub trait BrowserSession: Send + Sync {
    /// Navigate the current page to a URL
    async fn navigate(&self, url: &str) -> Result<()>;

    /// Grow the viewport to the configured screen size
    async fn maximize(&self) -> Result<()>;

    /// Resolve every element currently matching `locator`, in document order.
    ///
    /// Zero matches is not an error.
    async fn find_elements(&self, locator: &Locator) -> Result<Vec<ElementRef>, DriverError>;

    /// Whether the element is rendered and visible
    async fn is_displayed(&self, element: &ElementRef) -> Result<bool, DriverError>;

    /// Value of a form control as currently displayed
    async fn element_value(&self, element: &ElementRef) -> Result<String, DriverError>;

    /// Click the element
    async fn click(&self, element: &ElementRef) -> Result<(), DriverError>;

    /// Focus the element and type text into it
    async fn type_text(&self, element: &ElementRef, text: &str) -> Result<(), DriverError>;

    /// Move the mouse over the element
    async fn hover(&self, element: &ElementRef) -> Result<(), DriverError>;

    /// Capture the current viewport as PNG bytes
    async fn screenshot_png(&self) -> Result<Vec<u8>>;

    /// Close the browser
    async fn quit(&self) -> Result<()>;

    /// Resolve the first match of `locator`
    async fn find_element(&self, locator: &Locator) -> Result<ElementRef, DriverError> {
        self.find_elements(locator)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| DriverError::NoSuchElement(locator.to_string()))
    }
}
