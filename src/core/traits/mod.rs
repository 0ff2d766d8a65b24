pub mod executor;
pub mod sampler;
