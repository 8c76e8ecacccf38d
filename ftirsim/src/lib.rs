// src/lib.rs
pub mod sim {
    pub mod config;
    pub mod calculator;
    pub mod pipeline;
    pub mod io;
}
