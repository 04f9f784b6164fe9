use crate::world::StoreWorld;
use anyhow::{ensure, Result};
use cucumber::then;
use lumi_storefront::pages::CartPage;

#[then(regex = r#"^o produto "(.*)" deve estar presente no carrinho$"#)]
async fn product_in_cart(world: &mut StoreWorld, product: String) -> Result<()> {
    let toolkit = world.toolkit()?;
    let present = CartPage::new(&toolkit).shows_product(&product).await?;
    ensure!(
        present,
        "The product [{}] should have been displayed in the cart.",
        product
    );
    Ok(())
}
