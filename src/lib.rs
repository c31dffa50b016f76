//! Heuristic scam and phishing risk scoring for messages, links and images.

pub mod cli;
pub mod config;
pub mod core;
pub mod detectors;
pub mod pipeline;
