//! Scripted in-memory session used by unit tests
//!
//! Elements are scheduled against the tokio clock, so tests running with a
//! paused clock see them appear and disappear deterministically.

use super::traits::{BrowserSession, DriverError, ElementRef, Locator};
use anyhow::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use tokio::time::Instant;

#[derive(Debug, Clone)]
pub struct FakeElement {
    appear_at: Duration,
    gone_at: Option<Duration>,
    shown_at: Option<Duration>,
    values: Vec<(Duration, String)>,
}

impl FakeElement {
    pub fn visible() -> Self {
        Self {
            appear_at: Duration::ZERO,
            gone_at: None,
            shown_at: Some(Duration::ZERO),
            values: Vec::new(),
        }
    }

    pub fn hidden() -> Self {
        Self {
            shown_at: None,
            ..Self::visible()
        }
    }

    pub fn attached_at(mut self, at: Duration) -> Self {
        self.appear_at = at;
        self
    }

    pub fn detached_at(mut self, at: Duration) -> Self {
        self.gone_at = Some(at);
        self
    }

    pub fn shown_at(mut self, at: Duration) -> Self {
        self.shown_at = Some(at);
        self
    }

    pub fn value_at(mut self, at: Duration, value: &str) -> Self {
        self.values.push((at, value.to_string()));
        self
    }

    fn attached(&self, elapsed: Duration) -> bool {
        elapsed >= self.appear_at && self.gone_at.map_or(true, |gone| elapsed < gone)
    }
}

pub struct FakeSession {
    start: Instant,
    elements: Mutex<HashMap<Locator, Vec<FakeElement>>>,
    fail_screenshot: bool,
    pub quits: AtomicUsize,
    pub clicks: AtomicUsize,
    pub probes: AtomicUsize,
    pub typed: Mutex<Vec<String>>,
    pub visited: Mutex<Vec<String>>,
}

impl FakeSession {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
            elements: Mutex::new(HashMap::new()),
            fail_screenshot: false,
            quits: AtomicUsize::new(0),
            clicks: AtomicUsize::new(0),
            probes: AtomicUsize::new(0),
            typed: Mutex::new(Vec::new()),
            visited: Mutex::new(Vec::new()),
        }
    }

    pub fn with(self, locator: Locator, element: FakeElement) -> Self {
        self.elements
            .lock()
            .unwrap()
            .entry(locator)
            .or_default()
            .push(element);
        self
    }

    pub fn failing_screenshots(mut self) -> Self {
        self.fail_screenshot = true;
        self
    }

    fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    fn lookup(&self, element: &ElementRef) -> Result<FakeElement, DriverError> {
        let index: usize = element
            .id
            .rsplit('#')
            .next()
            .and_then(|i| i.parse().ok())
            .ok_or_else(|| DriverError::StaleElement(element.to_string()))?;
        let elements = self.elements.lock().unwrap();
        let found = elements
            .get(&element.locator)
            .and_then(|list| list.get(index))
            .cloned()
            .ok_or_else(|| DriverError::StaleElement(element.to_string()))?;
        if !found.attached(self.elapsed()) {
            return Err(DriverError::StaleElement(element.to_string()));
        }
        Ok(found)
    }
}

#[async_trait]
impl BrowserSession for FakeSession {
    async fn navigate(&self, url: &str) -> Result<()> {
        self.visited.lock().unwrap().push(url.to_string());
        Ok(())
    }

    async fn maximize(&self) -> Result<()> {
        Ok(())
    }

    async fn find_elements(&self, locator: &Locator) -> Result<Vec<ElementRef>, DriverError> {
        self.probes.fetch_add(1, Ordering::SeqCst);
        let elapsed = self.elapsed();
        let elements = self.elements.lock().unwrap();
        Ok(elements
            .get(locator)
            .map(|list| {
                list.iter()
                    .enumerate()
                    .filter(|(_, e)| e.attached(elapsed))
                    .map(|(i, _)| ElementRef {
                        id: format!("{}#{}", locator, i),
                        locator: locator.clone(),
                    })
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn is_displayed(&self, element: &ElementRef) -> Result<bool, DriverError> {
        let found = self.lookup(element)?;
        Ok(found.shown_at.map_or(false, |at| self.elapsed() >= at))
    }

    async fn element_value(&self, element: &ElementRef) -> Result<String, DriverError> {
        let found = self.lookup(element)?;
        let elapsed = self.elapsed();
        Ok(found
            .values
            .iter()
            .filter(|(at, _)| elapsed >= *at)
            .last()
            .map(|(_, v)| v.clone())
            .unwrap_or_default())
    }

    async fn click(&self, element: &ElementRef) -> Result<(), DriverError> {
        if !self.is_displayed(element).await? {
            return Err(DriverError::NotInteractable(element.to_string()));
        }
        self.clicks.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn type_text(&self, element: &ElementRef, text: &str) -> Result<(), DriverError> {
        self.lookup(element)?;
        self.typed.lock().unwrap().push(text.to_string());
        Ok(())
    }

    async fn hover(&self, element: &ElementRef) -> Result<(), DriverError> {
        self.lookup(element).map(|_| ())
    }

    async fn screenshot_png(&self) -> Result<Vec<u8>> {
        if self.fail_screenshot {
            anyhow::bail!("page crashed");
        }
        Ok(b"\x89PNG\r\n\x1a\nfake".to_vec())
    }

    async fn quit(&self) -> Result<()> {
        self.quits.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
