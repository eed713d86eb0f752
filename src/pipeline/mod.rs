//! Pipeline entry points for review operations.
//!
//! - `fetch_reviews`: Gather reviews for a hotel from several sources at once
//! - `analyze`: Score sentiment, extract keywords and build the roll-up
//! - `ReviewSession`: Keep the latest snapshot between the two

pub mod analyze;
pub mod fetch;
pub mod session;

pub use analyze::{AnalyzeOptions, analyze};
pub use fetch::{FetchOutcome, FetchRequest, SourceReport, fetch_from_clients, fetch_reviews};
pub use session::ReviewSession;
