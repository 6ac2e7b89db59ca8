use cucumber::given;

use crate::cucumber::{world::MarketSystem, MarketplaceWorld};

#[given("a fresh install")]
async fn fresh_database(world: &mut MarketplaceWorld) {
    let system = MarketSystem::new().await;
    world.system = Some(system);
}
