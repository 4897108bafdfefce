pub mod core;
pub mod crypto;
pub mod db;
pub mod handlers;
pub mod models;
pub mod seed;
pub mod stores;
pub mod utils;
