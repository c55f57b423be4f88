pub mod core;
pub mod error;
pub mod forest;
pub mod inference;
pub mod tasks;
pub mod ui;
pub mod weather;
