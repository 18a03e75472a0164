//! [N-Triples](https://www.w3.org/TR/n-triples/) output for the [`arp_xml`](https://docs.rs/arp_xml/) RDF/XML parser.
//!
//! [`NTriplesFormatter`] writes triples one per line.
//! [`NTriplesWriter`] is a complete parser handler around it that also prints the conditions reported by the parser.
//!
//! ```
//! use arp_ntriples::NTriplesWriter;
//! use arp_xml::RdfXmlParser;
//!
//! let file = br#"<rdf:RDF xmlns:rdf="http://www.w3.org/1999/02/22-rdf-syntax-ns#" xmlns:schema="http://schema.org/">
//!   <schema:Person rdf:about="http://example.com/foo" />
//! </rdf:RDF>"#;
//!
//! let mut writer = NTriplesWriter::new(Vec::new(), Vec::new());
//! RdfXmlParser::new().parse(file.as_ref(), &mut writer)?;
//! let (output, problems) = writer.finish()?;
//! assert_eq!(
//!     String::from_utf8(output)?,
//!     "<http://example.com/foo> <http://www.w3.org/1999/02/22-rdf-syntax-ns#type> <http://schema.org/Person> .\n"
//! );
//! assert!(problems.is_empty());
//! # Result::<_, Box<dyn std::error::Error>>::Ok(())
//! ```
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

mod formatter;
mod writer;

pub use formatter::NTriplesFormatter;
pub use writer::NTriplesWriter;
