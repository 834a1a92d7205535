pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod relations;
pub mod routes;
pub mod schema;
pub mod state;
