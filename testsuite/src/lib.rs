//! Conformance tooling for the arp RDF/XML parser: an owned triple model, a handler recording
//! every callback, graph isomorphism and a fixture evaluator.
#![deny(
    future_incompatible,
    nonstandard_style,
    rust_2018_idioms,
    missing_copy_implementations,
    trivial_casts,
    trivial_numeric_casts,
    unsafe_code,
    unused_qualifications
)]

pub mod evaluator;
mod isomorphism;
pub mod model;
pub mod recorder;
pub mod report;

pub use isomorphism::are_graphs_isomorphic;
