pub mod blocks;
pub mod cli;
pub mod controller;
pub mod display;
pub mod error;
pub mod overlay;
pub mod round_log;
pub mod session;
pub mod state;
