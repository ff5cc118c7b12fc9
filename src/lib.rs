//! Datascope: interactive tabular dataset explorer and classifier.
//!
//! The data layer parses delimited files into an immutable [`data::model::TabularDataset`],
//! the filter engine derives filtered views from user-selected predicates,
//! and the model layer provisions a persisted classifier (training one when
//! no usable artifact exists) to answer feature-vector predictions with
//! ranked confidences.  The egui shell in [`app`] renders all of it.

pub mod app;
pub mod cache;
pub mod color;
pub mod data;
pub mod error;
pub mod ml;
pub mod state;
pub mod store;
pub mod ui;
