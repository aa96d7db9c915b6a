//! Stage-level building blocks for custom extraction pipelines.
//!
//! These functions expose each pipeline stage on its own so callers can swap
//! in their own segmentation or inspect intermediate candidates. Most users
//! should prefer [`Extractor`](crate::Extractor) and
//! [`Matcher`](crate::Matcher).

pub use crate::detect::{detect, RawMinutia, RidgeTrace, TraceStop};
pub use crate::filter::filter;
pub use crate::matcher::PairwiseRelation;
pub use crate::preprocess::preprocess;
pub use crate::skeleton::thin;
