//! bizdash - sales dashboard report engine with an offline response cache

pub mod cli;
pub mod config;
pub mod services;
pub mod types;
