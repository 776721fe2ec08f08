pub mod fallback;
pub mod matcher;

pub use fallback::{FallbackError, FallbackResponder, HttpVlmFallback};
pub use matcher::{MatchError, SemanticMatcher};
