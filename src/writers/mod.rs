pub mod cbh_writer;

pub use cbh_writer::CbhWriter;
