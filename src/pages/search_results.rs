use super::Toolkit;
use crate::driver::traits::Locator;
use anyhow::Result;
use std::time::Duration;

const CHECKOUT_TIMEOUT: Duration = Duration::from_secs(10);

/// Product listing shown after a search
pub struct SearchResultsPage<'a> {
    toolkit: &'a Toolkit,
    add_to_cart: Locator,
    proceed_to_checkout: Locator,
}

impl<'a> SearchResultsPage<'a> {
    pub fn new(toolkit: &'a Toolkit) -> Self {
        Self {
            toolkit,
            add_to_cart: Locator::xpath("//*[text()='Add to cart']"),
            proceed_to_checkout: Locator::css("[title='Proceed to checkout']"),
        }
    }

    /// Title of a listed product, matched exactly or by substring
    pub fn product_title(product: &str) -> Locator {
        Locator::xpath(format!(
            ".//*[@itemprop='name']/*[contains(text(), '{0}')] | .//*[@itemprop='name'][text()='{0}']",
            product
        ))
    }

    pub async fn add_product_to_cart(&self, product: &str) -> Result<()> {
        let title = self.toolkit.session().find_element(&Self::product_title(product)).await?;
        self.toolkit.move_to_element(&title).await?;

        self.toolkit.click(&self.add_to_cart).await?;

        let checkout = self
            .toolkit
            .waits()
            .wait_element(&self.proceed_to_checkout, CHECKOUT_TIMEOUT)
            .await?;
        self.toolkit.session().click(&checkout).await?;

        self.toolkit
            .log(&format!("Added product [{}] to the cart.", product))
            .await
    }
}
