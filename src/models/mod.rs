pub mod request;
pub mod result;

pub use request::{
    BrowseRequest, BrowseSelection, FacetComparator, FacetSortSpec, FacetSpec, SortField,
    ValueOperation,
};
pub use result::{BrowseFacet, BrowseHit, BrowseResult, FacetResult};
