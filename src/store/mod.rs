pub mod database_store;
pub mod memory_store;
pub mod recipe_store;

pub use database_store::DatabaseStore;
pub use memory_store::MemoryStore;
pub use recipe_store::{
    ImportSummary, IngredientWrite, RecipeImport, RecipeSave, RecipeStore, StoreError,
};
