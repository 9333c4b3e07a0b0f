//! Core types shared by the QOF measure pipeline.
//!
//! - **error**: the error taxonomy (missing input, schema mismatch, config)
//! - **config**: validated study configuration
//! - **stratum**: demographic breakdown dimensions and their categories
//! - **schema**: measure column roles (explicit schema and resolved shape)

pub mod config;
pub mod error;
pub mod schema;
pub mod stratum;

pub use config::{
    DEFAULT_MEASURE_FILE_PATTERN, DEFAULT_SUPPRESSION_THRESHOLD, StudyConfig, StudyConfigFile,
    SuppressionOptions, SuppressionPolicy,
};
pub use error::{MeasureError, Result};
pub use schema::{MeasureSchema, MeasureShape, ShapeSource};
pub use stratum::{BinaryLabels, Stratum};
