use cucumber::given;
use gophermart_engine::{db_types::NewUser, AuthManagement};

use crate::cucumber::{gophermart_world::LedgerSystem, GophermartWorld};

#[given("a fresh install")]
async fn fresh_database(world: &mut GophermartWorld) {
    let system = LedgerSystem::new().await;
    world.system = Some(system);
}

#[given(expr = "a user named {word}")]
async fn create_user(world: &mut GophermartWorld, name: String) {
    let user = world
        .api()
        .db()
        .create_user(NewUser::new(name.as_str(), "not-a-real-hash"))
        .await
        .expect("Error creating user");
    world.users.insert(name, user.id);
}
