pub mod evaluating;
pub mod merging;
pub mod sampling;
