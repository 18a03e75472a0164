//! This crate provides the data structures and the handler interfaces shared by the arp RDF/XML parser and its consumers.
//!
//! It is used by the [`arp_xml`](https://docs.rs/arp_xml/) parser and the [`arp_ntriples`](https://docs.rs/arp_ntriples/) writer.
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
#![doc(test(attr(deny(warnings))))]

pub mod condition;
pub mod formatter;
pub mod handler;
pub mod model;
pub mod sink;
