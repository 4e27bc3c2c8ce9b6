pub mod ingredient;
pub mod recipe;
