//! Measure table transformation.
//!
//! This crate provides the processing applied to pre-aggregated count tables:
//!
//! - **shape**: reconstruct column roles from an explicit schema or the
//!   positional layout written by the measures framework
//! - **frame** / **frame_builder**: typed measure frames backed by Polars
//! - **loader**: read a measure file into a frame
//! - **redaction**: small-number suppression with rate coupling
//! - **rates**: rates per unit and binomial confidence intervals
//! - **filters**: row filters applied before charting
//! - **strata**: category labelling for demographic columns

pub mod data_utils;
pub mod filters;
pub mod frame;
pub mod frame_builder;
pub mod loader;
pub mod rates;
pub mod redaction;
pub mod shape;
pub mod strata;

pub use filters::{
    drop_irrelevant_practices, drop_missing_demographics, drop_zero_denominator_rows,
    practice_coverage,
};
pub use frame::{MeasureFrame, MeasureFrameMeta};
pub use frame_builder::build_measure_frame;
pub use loader::load_measure;
pub use rates::{
    CI_HIGH_COLUMN, CI_LOW_COLUMN, Z_95, add_confidence_intervals, compute_rates,
    confidence_interval, rate,
};
pub use redaction::{
    ColumnSuppression, RedactionReport, SuppressionState, redact_columns, redact_measure,
    suppress_counts,
};
pub use shape::{infer_positional_shape, resolve_shape};
pub use strata::{convert_binary, label_strata};
