#![deny(missing_docs)]
//! Yearly disaster counts and the two-regime Poisson switchpoint model built
//! on top of the coal graph and sampler crates.

mod data;
mod model;

pub use data::DisasterData;
pub use model::{SwitchpointModel, SwitchpointPosterior, YearObservation};
