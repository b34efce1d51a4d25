mod error;
pub mod line;
mod parser;

pub use error::UnattributedReason;
pub use parser::LogParser;
