//! CSV sample ingestion and JSON result writing for the grove pipeline.

mod domain;
mod error;
mod reader;
mod writer;

pub use domain::{ExperimentName, LabelEncoding, SampleTable};
pub use error::IoError;
pub use reader::SampleReader;
pub use writer::ResultWriter;
