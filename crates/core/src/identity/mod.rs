//! Cross-database media identity.
//!
//! An identity spans four ID systems (IMDb, TMDB, TVmaze, TVDB). The
//! resolver fills in whatever is missing through [`IdentityLookup`]
//! backends and a title-search fallback.

mod cache;
mod combined;
mod lookup;
mod resolver;
mod tmdb;
mod tvmaze;
mod types;

pub use cache::{CachedIdentity, IdentityCache};
pub use combined::CombinedLookup;
pub use lookup::{direct_edges, propagation_edges, Edge, IdentityLookup, LookupError};
pub use resolver::{rank_candidates, IdentityResolver};
pub use tmdb::{TmdbClient, TmdbConfig, TmdbExternalIds};
pub use tvmaze::{TvMazeClient, TvMazeConfig, TvMazeExternals, TvMazeShow};
pub use types::*;
