#![deny(warnings)]
#![deny(rust_2018_idioms)]

//! Keeps a map's vessel markers in sync with three independent update sources (an initial
//! snapshot, a periodic poll and a push channel) and animates markers between positions.

pub mod bounds;
pub mod engine;
pub mod error;
pub mod fetcher;
pub mod filter;
pub mod interpolator;
pub mod models;
pub mod multiplexer;
pub mod push;
pub mod render;
pub mod settings;
pub mod startup;
pub mod status;
pub mod store;

pub use error::{Error, Result};
