pub mod auth;
pub mod config;
pub mod database;
pub mod error;
pub mod formset;
pub mod http;
pub mod importer;
pub mod logging;
pub mod portions;
pub mod recipe_form;
pub mod store;
pub mod views;
pub mod workflow;
