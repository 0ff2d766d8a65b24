pub mod constants;
pub mod core;
pub mod error;
pub mod jsonl;
pub mod native;
pub mod stubs;
