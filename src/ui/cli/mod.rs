pub mod args;
pub mod wizard;
