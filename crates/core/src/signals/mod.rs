//! Read side of the signal page: fetch, normalize, summarize, filter, sort, render.

pub mod comparison;
pub mod dates;
pub mod query;
pub mod render;
pub mod source;
pub mod stats;
pub mod viewer;

pub use comparison::{ComparisonPoint, ComparisonSource, MockComparison};
pub use query::{SentimentFilter, SignalQuery, SortKey, SortOrder};
pub use source::{HttpSignalSource, SignalSource};
pub use stats::SummaryStats;
pub use viewer::{SignalViewer, ViewState};
