//! Read side of the inverted index as seen by the browse engine
//!
//! # Architecture
//!
//! - `PostingSource`: postings and stored values of one immutable segment
//! - `IntervalSet` / `MetaDataCache`: section ranges per document
//! - `SegmentSet`: live segments with loaded facet data, swapped atomically

mod intervals;
mod manifest;
mod source;
mod types;

pub use intervals::*;
pub use manifest::*;
pub use source::*;
pub use types::*;
