pub mod quantity;
pub mod record;
pub mod timestamp;

pub use quantity::{LabelStyle, QuantityKind};
pub use record::{DataRecord, OutputLine};
pub use timestamp::Timestamp;
