//! Anytime progress logs: parsing of timestamped best-so-far samples and
//! alignment of independently sampled traces onto a common time grid.

pub mod align;
pub mod anytime;

pub use align::{ComparisonGrid, ReferenceGrid, TraceAligner};
pub use anytime::{AnytimeSample, AnytimeTrace};
