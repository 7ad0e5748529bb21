//! Result types and report writers.

mod csv;
pub mod progress;
mod report;
mod types;

pub use csv::{CsvReportWriter, write_csv_report};
pub use report::{BatchReport, write_json_report};
pub use types::{
    BatchSummary, BoundingBox, DetectionRecord, ImageReport, ImageResult, ImageStatus,
    SpeciesLabel,
};
