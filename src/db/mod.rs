pub mod migrations;
pub mod pool;
pub mod provider;
