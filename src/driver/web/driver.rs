//! Browser session backed by Playwright
//!
//! Elements are resolved inside the page. Each resolved node is parked in
//! `window.__lumiRefs` under a generated id; an [`ElementRef`] carries that
//! id. Navigation wipes the registry, which is how stale references surface.

use anyhow::{Context, Result};
use async_trait::async_trait;
use colored::Colorize;
use playwright::api::{Browser, BrowserContext, Page, ScreenshotType, Viewport};
use playwright::Playwright;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::driver::traits::{BrowserSession, DriverError, ElementRef, Locator};
use crate::utils::config::{BrowserConfig, Viewport as ViewportSize};

/// Mobile device emulation profile
#[derive(Debug, Clone)]
pub struct DeviceProfile {
    pub name: &'static str,
    pub user_agent: &'static str,
    pub viewport: ViewportSize,
    pub device_scale_factor: f64,
    pub is_mobile: bool,
    pub has_touch: bool,
}

impl DeviceProfile {
    pub fn named(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "iphone x" => Some(Self {
                name: "iPhone X",
                user_agent: "Mozilla/5.0 (iPhone; CPU iPhone OS 11_0 like Mac OS X) \
                             AppleWebKit/604.1.38 (KHTML, like Gecko) Version/11.0 \
                             Mobile/15A372 Safari/604.1",
                viewport: ViewportSize {
                    width: 375,
                    height: 812,
                },
                device_scale_factor: 3.0,
                is_mobile: true,
                has_touch: true,
            }),
            _ => None,
        }
    }
}

/// Answers native dialogs the way a user clicking "OK" would
const ACCEPT_DIALOGS_SCRIPT: &str = r#"
window.alert = () => {};
window.confirm = () => true;
window.prompt = (_message, value) => (value === undefined ? '' : value);
"#;

const RESOLVE_SCRIPT: &str = r#"([kind, value, token]) => {
    const refs = (window.__lumiRefs = window.__lumiRefs || {});
    const ids = (window.__lumiIds = window.__lumiIds || new WeakMap());
    let nodes = [];
    if (kind === 'xpath') {
        const snap = document.evaluate(value, document, null, XPathResult.ORDERED_NODE_SNAPSHOT_TYPE, null);
        for (let i = 0; i < snap.snapshotLength; i++) nodes.push(snap.snapshotItem(i));
    } else {
        nodes = Array.from(document.querySelectorAll(value));
    }
    return nodes.map((node, i) => {
        let id = ids.get(node);
        if (!id) {
            id = token + '-' + i;
            ids.set(node, id);
            refs[id] = node;
        }
        return id;
    });
}"#;

const DISPLAYED_SCRIPT: &str = r#"(id) => {
    const el = (window.__lumiRefs || {})[id];
    if (!el || !el.isConnected) return null;
    const style = window.getComputedStyle(el);
    const rect = el.getBoundingClientRect();
    return style.display !== 'none'
        && style.visibility !== 'hidden'
        && style.opacity !== '0'
        && (rect.width > 0 || rect.height > 0);
}"#;

const VALUE_SCRIPT: &str = r#"(id) => {
    const el = (window.__lumiRefs || {})[id];
    if (!el || !el.isConnected) return null;
    if ('value' in el && el.value !== undefined && el.value !== null) return String(el.value);
    return el.textContent || '';
}"#;

const POINT_SCRIPT: &str = r#"(id) => {
    const el = (window.__lumiRefs || {})[id];
    if (!el || !el.isConnected) return null;
    el.scrollIntoView({ block: 'center', inline: 'center' });
    const rect = el.getBoundingClientRect();
    const style = window.getComputedStyle(el);
    const visible = style.display !== 'none' && style.visibility !== 'hidden'
        && rect.width > 0 && rect.height > 0;
    return { x: rect.left + rect.width / 2, y: rect.top + rect.height / 2, visible };
}"#;

const FOCUS_SCRIPT: &str = r#"(id) => {
    const el = (window.__lumiRefs || {})[id];
    if (!el || !el.isConnected) return null;
    el.scrollIntoView({ block: 'center' });
    el.focus();
    return document.activeElement === el;
}"#;

#[derive(Debug, Deserialize)]
struct ElementPoint {
    x: f64,
    y: f64,
    visible: bool,
}

/// One Chromium window driven through Playwright
pub struct WebSession {
    #[allow(dead_code)]
    playwright: Arc<Playwright>,
    browser: Arc<Browser>,
    #[allow(dead_code)]
    context: Arc<BrowserContext>,
    page: Arc<Mutex<Page>>,
    viewport: ViewportSize,
    mobile: bool,
}

impl WebSession {
    /// Launch Chromium with downloads routed to `download_dir` and native
    /// dialogs auto-accepted
    pub async fn launch(config: &BrowserConfig, download_dir: &Path) -> Result<Self> {
        let device = if config.mobile_emulation {
            let profile = DeviceProfile::named(&config.device)
                .with_context(|| format!("Unknown emulated device: {}", config.device))?;
            println!("{} Emulating {}", "📱".blue(), profile.name);
            Some(profile)
        } else {
            None
        };

        let playwright = Playwright::initialize()
            .await
            .context("Failed to initialize Playwright")?;
        let chromium = playwright.chromium();
        let browser = launch_chromium_browser(&chromium, config, download_dir).await?;

        let mut builder = browser.context_builder().accept_downloads(true);
        if let Some(ref device) = device {
            builder = builder
                .user_agent(device.user_agent)
                .is_mobile(device.is_mobile)
                .has_touch(device.has_touch)
                .device_scale_factor(device.device_scale_factor);
        }
        let context = builder
            .build()
            .await
            .context("Failed to create browser context")?;
        context
            .add_init_script(ACCEPT_DIALOGS_SCRIPT)
            .await
            .context("Failed to install dialog handler")?;

        let page = context.new_page().await?;
        let viewport = device
            .as_ref()
            .map(|d| d.viewport)
            .unwrap_or(config.viewport);
        page.set_viewport_size(to_playwright(viewport)).await?;

        Ok(Self {
            playwright: Arc::new(playwright),
            browser: Arc::new(browser),
            context: Arc::new(context),
            page: Arc::new(Mutex::new(page)),
            viewport,
            mobile: device.is_some(),
        })
    }

    async fn element_point(&self, element: &ElementRef) -> Result<ElementPoint, DriverError> {
        let page = self.page.lock().await;
        let point: Option<ElementPoint> = page
            .evaluate(POINT_SCRIPT, element.id.clone())
            .await
            .map_err(|e| classify(e, element))?;
        let point = point.ok_or_else(|| DriverError::StaleElement(element.to_string()))?;
        if !point.visible {
            return Err(DriverError::NotInteractable(element.to_string()));
        }
        Ok(point)
    }
}

#[async_trait]
impl BrowserSession for WebSession {
    async fn navigate(&self, url: &str) -> Result<()> {
        let page = self.page.lock().await;
        page.goto_builder(url)
            .goto()
            .await
            .with_context(|| format!("Failed to navigate to {}", url))?;
        Ok(())
    }

    async fn maximize(&self) -> Result<()> {
        if self.mobile {
            return Ok(());
        }
        let page = self.page.lock().await;
        page.set_viewport_size(to_playwright(self.viewport)).await?;
        log::debug!(
            "Viewport set to {}x{}",
            self.viewport.width,
            self.viewport.height
        );
        Ok(())
    }

    async fn find_elements(&self, locator: &Locator) -> Result<Vec<ElementRef>, DriverError> {
        let (kind, value) = locator.query();
        let token = uuid::Uuid::new_v4().simple().to_string();

        let page = self.page.lock().await;
        let ids: Vec<String> = page
            .evaluate(RESOLVE_SCRIPT, (kind.to_string(), value, token))
            .await
            .map_err(|e| classify_lookup(e, locator))?;

        Ok(ids
            .into_iter()
            .map(|id| ElementRef {
                id,
                locator: locator.clone(),
            })
            .collect())
    }

    async fn is_displayed(&self, element: &ElementRef) -> Result<bool, DriverError> {
        let page = self.page.lock().await;
        let displayed: Option<bool> = page
            .evaluate(DISPLAYED_SCRIPT, element.id.clone())
            .await
            .map_err(|e| classify(e, element))?;
        displayed.ok_or_else(|| DriverError::StaleElement(element.to_string()))
    }

    async fn element_value(&self, element: &ElementRef) -> Result<String, DriverError> {
        let page = self.page.lock().await;
        let value: Option<String> = page
            .evaluate(VALUE_SCRIPT, element.id.clone())
            .await
            .map_err(|e| classify(e, element))?;
        value.ok_or_else(|| DriverError::StaleElement(element.to_string()))
    }

    async fn click(&self, element: &ElementRef) -> Result<(), DriverError> {
        let point = self.element_point(element).await?;
        let page = self.page.lock().await;
        page.mouse
            .r#move(point.x, point.y, None)
            .await
            .map_err(|e| classify(e, element))?;
        page.mouse
            .down(None, None)
            .await
            .map_err(|e| classify(e, element))?;
        page.mouse
            .up(None, None)
            .await
            .map_err(|e| classify(e, element))?;
        Ok(())
    }

    async fn type_text(&self, element: &ElementRef, text: &str) -> Result<(), DriverError> {
        let page = self.page.lock().await;
        let focused: Option<bool> = page
            .evaluate(FOCUS_SCRIPT, element.id.clone())
            .await
            .map_err(|e| classify(e, element))?;
        match focused {
            None => return Err(DriverError::StaleElement(element.to_string())),
            Some(false) => return Err(DriverError::NotInteractable(element.to_string())),
            Some(true) => {}
        }
        page.keyboard
            .input_text(text)
            .await
            .map_err(|e| classify(e, element))?;
        Ok(())
    }

    async fn hover(&self, element: &ElementRef) -> Result<(), DriverError> {
        let point = self.element_point(element).await?;
        let page = self.page.lock().await;
        page.mouse
            .r#move(point.x, point.y, None)
            .await
            .map_err(|e| classify(e, element))?;
        Ok(())
    }

    async fn screenshot_png(&self) -> Result<Vec<u8>> {
        let page = self.page.lock().await;
        let bytes = page
            .screenshot_builder()
            .r#type(ScreenshotType::Png)
            .screenshot()
            .await?;
        Ok(bytes)
    }

    async fn quit(&self) -> Result<()> {
        self.browser
            .close()
            .await
            .context("Failed to close the browser")?;
        log::debug!("Browser closed");
        Ok(())
    }
}

fn to_playwright(size: ViewportSize) -> Viewport {
    Viewport {
        width: size.width,
        height: size.height,
    }
}

/// Page evaluation errors that mean the element's document went away
fn is_context_lost(message: &str) -> bool {
    message.contains("Execution context was destroyed")
        || message.contains("Cannot find context with specified id")
        || message.contains("Target closed")
}

fn classify<E: std::fmt::Display>(error: E, element: &ElementRef) -> DriverError {
    let message = error.to_string();
    if is_context_lost(&message) {
        DriverError::StaleElement(element.to_string())
    } else {
        DriverError::Browser(anyhow::anyhow!("{}: {}", element, message))
    }
}

/// A lookup racing a navigation simply found nothing yet
fn classify_lookup<E: std::fmt::Display>(error: E, locator: &Locator) -> DriverError {
    let message = error.to_string();
    if is_context_lost(&message) {
        DriverError::NoSuchElement(locator.to_string())
    } else {
        DriverError::Browser(anyhow::anyhow!("{}: {}", locator, message))
    }
}

/// Launch Chromium, preferring an explicitly configured or installed binary
async fn launch_chromium_browser(
    chromium: &playwright::api::BrowserType,
    config: &BrowserConfig,
    download_dir: &Path,
) -> Result<Browser> {
    let mut launcher = chromium
        .launcher()
        .headless(config.headless)
        .downloads(download_dir);

    let executable = config.executable.clone().or_else(find_system_browser);
    if let Some(ref path) = executable {
        println!("{} Using browser: {}", "🌐".blue(), path.display());
        launcher = launcher.executable(path);
    } else {
        println!(
            "{} No browser executable found. Attempting default launch if possible...",
            "ℹ".blue()
        );
    }

    let args: Vec<String> = [
        "--no-sandbox",
        "--disable-dev-shm-usage",
        "--disable-infobars",
        "--disable-save-password-bubble",
        "--password-store=basic",
        "--start-maximized",
        "--ignore-certificate-errors",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect();
    launcher = launcher.args(&args);

    launcher
        .launch()
        .await
        .context("Failed to launch Chromium")
}

fn find_system_browser() -> Option<PathBuf> {
    let common_paths = [
        "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
        "/usr/bin/google-chrome",
        "/usr/bin/google-chrome-stable",
        "/Applications/Chromium.app/Contents/MacOS/Chromium",
        "/usr/bin/chromium",
        "/usr/bin/chromium-browser",
    ];

    common_paths
        .iter()
        .map(Path::new)
        .find(|p| p.exists())
        .map(Path::to_path_buf)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_iphone_x_profile() {
        let profile = DeviceProfile::named("iPhone X").unwrap();
        assert_eq!(profile.viewport.width, 375);
        assert_eq!(profile.viewport.height, 812);
        assert_eq!(profile.device_scale_factor, 3.0);
        assert!(profile.is_mobile && profile.has_touch);
        assert!(DeviceProfile::named("Nokia 3310").is_none());
    }

    #[test]
    fn test_lost_context_maps_to_stale() {
        let element = ElementRef {
            id: "abc-0".into(),
            locator: Locator::css("#x"),
        };
        assert!(matches!(
            classify("Execution context was destroyed, most likely because of a navigation", &element),
            DriverError::StaleElement(_)
        ));
        assert!(matches!(
            classify("Protocol error", &element),
            DriverError::Browser(_)
        ));
        assert!(matches!(
            classify_lookup("Execution context was destroyed", &Locator::css("#x")),
            DriverError::NoSuchElement(_)
        ));
    }
}
