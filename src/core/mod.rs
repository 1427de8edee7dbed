pub mod config;
pub mod copier;
pub mod db;
pub mod error;
pub mod model;
pub mod rebind;
pub mod reconcile;
pub mod schemas;
pub mod stage;
pub mod store;
