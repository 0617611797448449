pub mod args;
pub mod command;
