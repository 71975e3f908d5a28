pub mod batch_processor;
pub mod classifier;
pub mod transcoder;
pub mod unit_converter;

pub use batch_processor::{BatchProcessor, BatchReport, FailureKind, FileFailure};
pub use classifier::{DescriptorRule, FileNameRule, HeaderClassifier, MarkerClass};
pub use transcoder::{TranscodeSummary, Transcoder};
pub use unit_converter::UnitConverter;
