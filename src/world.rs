use anyhow::{Context, Result};
use cucumber::World;
use lumi_storefront::driver::web::WebSession;
use lumi_storefront::driver::BrowserSession;
use lumi_storefront::pages::Toolkit;
use lumi_storefront::report::NodeHandle;
use lumi_storefront::runner::RunContext;
use std::fmt;
use std::sync::Arc;

/// Per-scenario state. The browser session is created by the first step and
/// released by the teardown hook.
#[derive(World, Default)]
pub struct StoreWorld {
    pub ctx: Option<Arc<RunContext>>,
    pub node: Option<NodeHandle>,
    pub session: Option<Arc<dyn BrowserSession>>,
}

impl fmt::Debug for StoreWorld {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoreWorld")
            .field("node", &self.node)
            .field("session", &self.session.is_some())
            .finish()
    }
}

impl StoreWorld {
    pub fn attach(&mut self, ctx: Arc<RunContext>, node: NodeHandle) {
        self.ctx = Some(ctx);
        self.node = Some(node);
    }

    fn context(&self) -> Result<&Arc<RunContext>> {
        self.ctx
            .as_ref()
            .context("Scenario is not attached to a run")
    }

    /// Launch a browser and open `url` in it
    pub async fn open_session(&mut self, url: &str) -> Result<()> {
        let ctx = self.context()?.clone();

        if let Some(previous) = self.session.take() {
            log::warn!("Replacing the scenario's open browser session");
            previous.quit().await?;
        }

        let session: Arc<dyn BrowserSession> =
            Arc::new(WebSession::launch(&ctx.config.browser, &ctx.download_dir).await?);
        self.session = Some(session.clone());

        session.navigate(url).await?;
        session.maximize().await?;
        Ok(())
    }

    pub fn toolkit(&self) -> Result<Toolkit> {
        let ctx = self.context()?;
        let session = self
            .session
            .clone()
            .context("No browser session; open the site first")?;
        let node = self
            .node
            .clone()
            .context("Scenario has no report node")?;
        Ok(Toolkit::new(ctx, session, node))
    }
}
