pub mod cache;
pub mod cli;
pub mod config;
pub mod ctx;
pub mod io;
pub mod pipeline;
pub mod producer;
