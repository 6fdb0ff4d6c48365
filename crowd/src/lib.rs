//! Grid crowd simulation with interchangeable tick strategies.
//!
//! A [`Model`] owns the agents and advances them one cell per [`Model::tick`]
//! toward their waypoints, using the [`Strategy`] chosen at setup.

pub mod agent;
pub mod config;
pub mod error;
pub mod model;
pub mod strategy;
pub mod waypoint;

pub use agent::Agent;
pub use config::{AcceleratorKind, Config};
pub use error::{SimError, SimResult};
pub use model::Model;
pub use strategy::{Strategy, TickStats};
pub use waypoint::Waypoint;
