mod book_routes;
mod citation_routes;
pub mod config;
mod epigraph_routes;
mod forms;
mod http_layers;
mod lookup_routes;
mod people_routes;
pub mod server;
pub mod state;
mod taxonomy_routes;

pub use config::ServerConfig;
pub use http_layers::*;
#[allow(unused_imports)] // Used by main.rs
pub use server::{make_app, run_server};
