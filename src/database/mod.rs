pub mod manager;
pub mod memory;
pub mod models;
pub mod repository;
pub mod store;

pub use manager::{DatabaseError, DatabaseManager};
pub use memory::MemoryDrinkStore;
pub use models::{Drink, DrinkChanges, Ingredient, Recipe};
pub use repository::DrinkRepository;
pub use store::{DrinkStore, StoreError};
