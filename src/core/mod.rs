pub mod checking;
pub mod completion;
pub mod domain;
pub mod metrics;
pub mod pipeline;
pub mod traits;
