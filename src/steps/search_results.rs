use crate::world::StoreWorld;
use anyhow::Result;
use cucumber::when;
use lumi_storefront::pages::SearchResultsPage;

#[when(regex = r#"^adiciona o produto "(.*)" ao carrinho$"#)]
async fn add_product_to_cart(world: &mut StoreWorld, product: String) -> Result<()> {
    let toolkit = world.toolkit()?;
    SearchResultsPage::new(&toolkit)
        .add_product_to_cart(&product)
        .await
}
