// Service exports
pub mod postgres;
pub mod proposal;
pub mod source;

pub use postgres::{PostgresCandidateSource, PostgresError, DEFAULT_MAX_CANDIDATES};
pub use proposal::{ProposalClient, ProposalError, ProposalGenerator};
pub use source::{CandidateSource, InMemoryCandidateSource, SourceError};
