// Core algorithm exports
pub mod clock;
pub mod keywords;
pub mod matcher;
pub mod scoring;
pub mod session;

pub use clock::{Clock, ManualClock, SystemClock};
pub use keywords::{extract_keywords, normalize_keywords, search_keywords};
pub use matcher::{rank_designers, MatchResult, Matcher, TOP_K};
pub use scoring::{calculate_keyword_score, calculate_match_score};
pub use session::{MatchingSession, SessionConfig, SessionSnapshot, SessionStore, PAGE_SIZE, SESSION_TTL_MINUTES};
