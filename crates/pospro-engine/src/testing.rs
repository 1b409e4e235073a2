//! Shared fixtures for the engine's unit tests.

use pospro_core::requests::{Principal, Role};
use pospro_core::Product;
use pospro_db::{Database, DbConfig, NewProduct};

pub const ORG: &str = "org-1";

pub async fn setup() -> Database {
    Database::new(DbConfig::in_memory()).await.unwrap()
}

pub async fn seed(db: &Database, product: NewProduct) -> Product {
    db.products().insert(&product).await.unwrap()
}

pub fn cashier() -> Principal {
    Principal::new(ORG, "cashier-1", Role::Cashier)
}

pub fn principal(user_id: &str) -> Principal {
    Principal::new(ORG, user_id, Role::Cashier)
}
