pub mod discovery;
pub mod source_reader;

pub use discovery::{is_source_file, SourceDiscovery};
pub use source_reader::{DataRecords, SourceFile, SourceReader};
