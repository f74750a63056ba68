//! Read-only data access over the Astro app's Core Data SQLite store

pub mod astro;

pub use astro::{
    AstroDatabase, CompetitorRow, LowCompetitionRow, OpportunityRow, SimilarKeyword,
};
