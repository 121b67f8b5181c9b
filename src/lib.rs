pub mod browser;
pub mod config;
pub mod error;
pub mod facets;
pub mod filter;
pub mod models;
pub mod query;
pub mod segment;

pub use browser::Browser;
pub use config::{BrowseConfig, FacetProperties};
pub use error::{BrowseError, Result};
pub use facets::{
    AttributeFacetHandler, ComboFacetHandler, FacetHandler, FacetHandlers, SimpleFacetHandler,
};
pub use filter::Filter;
pub use models::*;
pub use query::{BooleanQuery, PhraseQuery, QueryPlanBuilder, SectionQuery, SectionSearcher};
pub use segment::{MemoryDocument, MemorySegment, PostingSource, SegmentSet};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
