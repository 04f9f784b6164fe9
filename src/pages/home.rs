use super::Toolkit;
use crate::driver::traits::Locator;
use anyhow::Result;

/// Landing page with the search bar
pub struct HomePage<'a> {
    toolkit: &'a Toolkit,
    search_field: Locator,
    search_button: Locator,
}

impl<'a> HomePage<'a> {
    pub fn new(toolkit: &'a Toolkit) -> Self {
        Self {
            toolkit,
            search_field: Locator::css("#search_query_top"),
            search_button: Locator::name("submit_search"),
        }
    }

    pub async fn search_product(&self, product: &str) -> Result<()> {
        self.toolkit.type_into(&self.search_field, product).await?;
        self.toolkit.click(&self.search_button).await?;
        self.toolkit
            .log(&format!("Searched for the product: {}", product))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::fake::{FakeElement, FakeSession};
    use crate::pages::toolkit::tests::toolkit_for;
    use crate::report::Status;
    use std::sync::atomic::Ordering;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_search_types_clicks_and_logs() {
        let tmp = tempfile::tempdir().unwrap();
        let session = Arc::new(
            FakeSession::new()
                .with(Locator::css("#search_query_top"), FakeElement::visible())
                .with(Locator::name("submit_search"), FakeElement::visible()),
        );
        let (ctx, toolkit) = toolkit_for(tmp.path(), session.clone()).await;

        HomePage::new(&toolkit)
            .search_product("Blouse")
            .await
            .unwrap();

        assert_eq!(*session.typed.lock().unwrap(), vec!["Blouse".to_string()]);
        assert_eq!(session.clicks.load(Ordering::SeqCst), 1);

        let run = ctx.report.lock().await;
        let entry = &run.node(toolkit.node().id()).unwrap().entries[0];
        assert_eq!(entry.status, Status::Pass);
        assert_eq!(entry.message, "Searched for the product: Blouse");
        assert!(entry.media.is_some());
    }
}
