use super::Toolkit;
use crate::driver::traits::Locator;
use anyhow::Result;

/// Shopping cart summary
pub struct CartPage<'a> {
    toolkit: &'a Toolkit,
}

impl<'a> CartPage<'a> {
    pub fn new(toolkit: &'a Toolkit) -> Self {
        Self { toolkit }
    }

    pub fn cart_item(product: &str) -> Locator {
        Locator::xpath(format!(
            "//*[contains(@class,'cart_item')]//a[text()='{}']",
            product
        ))
    }

    /// Whether the cart lists `product`. Logs the verdict either way.
    pub async fn shows_product(&self, product: &str) -> Result<bool> {
        let present = self
            .toolkit
            .waits()
            .is_element_displayed(&Self::cart_item(product))
            .await?;

        if present {
            self.toolkit
                .log(&format!(
                    "The product [{}] was correctly displayed in the cart.",
                    product
                ))
                .await?;
        } else {
            self.toolkit
                .log_fail(&format!(
                    "The product [{}] should have been displayed in the cart, but it was not found.",
                    product
                ))
                .await;
        }
        Ok(present)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::fake::{FakeElement, FakeSession};
    use crate::pages::toolkit::tests::toolkit_for;
    use crate::report::Status;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_product_in_cart() {
        let tmp = tempfile::tempdir().unwrap();
        let session = Arc::new(
            FakeSession::new().with(CartPage::cart_item("Blouse"), FakeElement::visible()),
        );
        let (ctx, toolkit) = toolkit_for(tmp.path(), session).await;

        let cart = CartPage::new(&toolkit);
        assert!(cart.shows_product("Blouse").await.unwrap());
        assert!(!cart.shows_product("Faded Short Sleeve T-shirts").await.unwrap());

        let run = ctx.report.lock().await;
        let entries = &run.node(toolkit.node().id()).unwrap().entries;
        assert_eq!(entries[0].status, Status::Pass);
        assert!(entries[0].media.is_some());
        assert_eq!(entries[1].status, Status::Fail);
        assert!(entries[1].media.is_none());
    }
}
