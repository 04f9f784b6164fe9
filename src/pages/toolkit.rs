use super::ELEMENT_TIMEOUT;
use crate::driver::traits::{BrowserSession, ElementRef, Locator};
use crate::report::{NodeHandle, Status};
use crate::runner::capture::capture_screenshot;
use crate::runner::context::RunContext;
use crate::utils::interrupt::Interrupt;
use crate::utils::poll;
use crate::wait::WaitEngine;
use anyhow::Result;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Settle delay after a download file shows up
pub const DOWNLOAD_SETTLE: Duration = Duration::from_millis(500);

/// Shared helpers of every page object
#[derive(Clone)]
pub struct Toolkit {
    session: Arc<dyn BrowserSession>,
    waits: WaitEngine,
    node: NodeHandle,
    interrupt: Interrupt,
    images_dir: PathBuf,
    download_dir: PathBuf,
    download_timeout: Duration,
    loading: Locator,
}

impl Toolkit {
    pub fn new(ctx: &RunContext, session: Arc<dyn BrowserSession>, node: NodeHandle) -> Self {
        Self {
            waits: ctx.wait_engine(session.clone()),
            session,
            node,
            interrupt: ctx.interrupt.clone(),
            images_dir: ctx.images_dir.clone(),
            download_dir: ctx.download_dir.clone(),
            download_timeout: ctx.config.download_timeout(),
            loading: Locator::css(ctx.config.loading_selector.clone()),
        }
    }

    pub fn session(&self) -> &Arc<dyn BrowserSession> {
        &self.session
    }

    pub fn waits(&self) -> &WaitEngine {
        &self.waits
    }

    pub fn node(&self) -> &NodeHandle {
        &self.node
    }

    pub async fn pause(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }

    /// Wait for `locator` to be visible and click it
    pub async fn click(&self, locator: &Locator) -> Result<ElementRef> {
        let element = self.waits.wait_element(locator, ELEMENT_TIMEOUT).await?;
        self.session.click(&element).await?;
        Ok(element)
    }

    /// Wait for `locator` to be visible and type into it
    pub async fn type_into(&self, locator: &Locator, text: &str) -> Result<ElementRef> {
        let element = self.waits.wait_element(locator, ELEMENT_TIMEOUT).await?;
        self.session.type_text(&element, text).await?;
        Ok(element)
    }

    pub async fn move_to_element(&self, element: &ElementRef) -> Result<()> {
        self.session.hover(element).await?;
        Ok(())
    }

    /// Pass entry with a screenshot of the current page
    pub async fn log(&self, message: &str) -> Result<()> {
        let media = capture_screenshot(self.session.as_ref(), &self.images_dir).await?;
        self.node.log_with_media(Status::Pass, message, &media).await;
        Ok(())
    }

    /// Fail entry with a screenshot of the current page
    pub async fn log_print_fail(&self, message: &str) -> Result<()> {
        let media = capture_screenshot(self.session.as_ref(), &self.images_dir).await?;
        self.node.log_with_media(Status::Fail, message, &media).await;
        Ok(())
    }

    pub async fn log_info(&self, message: &str) {
        self.node.info(message).await;
    }

    pub async fn log_skip(&self, message: &str) {
        self.node.skip(message).await;
    }

    pub async fn log_fail(&self, message: &str) {
        self.node.fail(message).await;
    }

    pub async fn log_error(&self, message: &str) {
        self.node.error(message).await;
    }

    pub async fn log_pass(&self, message: &str) {
        self.node.pass(message).await;
    }

    /// Child node of the scenario's node, for grouping sub-steps
    pub async fn create_child(&self, name: &str) -> NodeHandle {
        self.node.create_child(name, "").await
    }

    /// Wait for a browser download to land, then let it settle
    pub async fn await_download(&self) -> Result<bool> {
        let arrived =
            poll::wait_for_file_in_dir(&self.download_dir, self.download_timeout, &self.interrupt)
                .await?;
        tokio::time::sleep(DOWNLOAD_SETTLE).await;
        Ok(arrived)
    }

    pub async fn await_loading(&self) -> Result<bool> {
        Ok(self.waits.await_loading(&self.loading).await?)
    }
}
