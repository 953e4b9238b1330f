// src/lib.rs

//! mediadrop: retrieve remote media through an extraction engine, store it
//! under a safe name, and serve it back over HTTP.

pub mod config;
pub mod error;
pub mod models;
pub mod server;
pub mod services;
pub mod storage;
pub mod utils;
