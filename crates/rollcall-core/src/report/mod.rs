//! Report text: rendering, parsing and the shared line grammar.

pub mod grammar;
pub mod reconstruct;
pub mod render;

pub use reconstruct::{reconstruct, Reconstruction};
pub use render::{split_for_delivery, ReportRenderer, RunSummary};
