pub mod graph;

pub use graph::{ObjectNode, ReferenceGraph, ReferenceType};
