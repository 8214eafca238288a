//! Skytrail - live aircraft tracking for a single ADS-B receiver
//!
//! Polls the receiver's `aircraft.json`, keeps per-aircraft state and
//! altitude-coloured trails, and serves marker and trail views over HTTP.

pub mod actions;
pub mod config;
pub mod feed;
pub mod feed_client;
pub mod geometry;
pub mod logging;
pub mod marker_style;
pub mod metadata;
pub mod metrics;
pub mod registration;
pub mod service;
pub mod tracker;
pub mod web;


pub use feed::{AircraftRecord, AircraftSnapshot};
pub use tracker::{Aircraft, AircraftTracker};
