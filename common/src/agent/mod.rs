pub mod prompt;
pub mod sanitizer;
pub mod executor;

pub use prompt::synthesize;
pub use sanitizer::{sanitize, LineKind, Sanitizer, ScanState};
pub use executor::{generate_sql, generate_sql_with_retry};
