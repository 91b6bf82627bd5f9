//! Timing-sheet loading and lap-table processing

pub mod classification;
pub mod parser;
pub mod source;
pub mod table;

// Re-export commonly used types
pub use classification::ClassificationParser;
pub use parser::{lap_time_to_seconds, LapTimeParser, ParseOptions};
pub use source::read_text_dump;
pub use table::{
    classification_to_dataframe, records_to_dataframe, similarity_to_dataframe, write_csv,
};
