use crate::world::StoreWorld;
use anyhow::Result;
use cucumber::given;
use lumi_storefront::pages::HomePage;

#[given(regex = r#"^que um usuario acessa o site "(.*)"$"#)]
async fn access_site(world: &mut StoreWorld, url: String) -> Result<()> {
    world.open_session(&url).await
}

#[given(regex = r#"^pesquisa pelo produto "(.*)"$"#)]
async fn search_product(world: &mut StoreWorld, product: String) -> Result<()> {
    let toolkit = world.toolkit()?;
    HomePage::new(&toolkit).search_product(&product).await
}
