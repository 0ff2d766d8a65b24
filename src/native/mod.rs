/// Native module contains implementations of core traits
/// that talk to the host directly: a plain child process per
/// program, no containers or namespaces.
pub mod executor;
