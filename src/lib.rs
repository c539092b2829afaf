#[macro_use]
pub mod errors;
pub mod command;
pub mod config;
pub mod database;
pub mod persist;
pub mod repl;
pub mod session;
pub mod sql;
pub mod storage;
pub mod transfer;
