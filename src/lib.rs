// src/lib.rs

//! Hotelscope Review Library
//!
//! Fetches guest reviews for a hotel from several travel platforms,
//! normalizes them to one schema and rates, scores and summarizes them.

pub mod analysis;
pub mod error;
pub mod extract;
pub mod models;
pub mod pipeline;
pub mod services;
pub mod utils;
