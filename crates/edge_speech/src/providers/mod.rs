//! Speech synthesis providers (adapters)

pub mod edge;

pub use edge::EdgeTtsProvider;
