#[cfg(test)]
pub mod executor;
pub mod sampler;
