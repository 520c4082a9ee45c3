pub mod cantons;
pub mod careers;
pub mod fields;
pub mod scoring;
pub mod vector;
pub mod weights;

pub use careers::{match_careers, CareerArchetype, CareerMatch, CAREER_ARCHETYPES};
pub use scoring::{compatibility, CompatibilityResult, ListingProfile, StudentTraits};
