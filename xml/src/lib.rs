//! Implementation of a streaming [RDF XML](https://www.w3.org/TR/rdf-syntax-grammar/) parser
//! with configurable condition severities and blank node scope tracking.
//!
//! The parser pushes everything it finds to an [`ArpHandler`](arp_api::handler::ArpHandler):
//! triples, namespace declarations, the end of the scope of each blank node and the conditions (warnings, errors)
//! detected on the way. The severity of each condition is configured with [`ErrorModes`].
//!
//! How to read a file `foo.rdf` and count the number of triples, failing on anything suspicious:
//! ```no_run
//! use arp_api::handler::{HandlerResult, StatementHandler, HandlerSet};
//! use arp_api::model::{AResource, ALiteral};
//! use arp_xml::{ErrorModes, ParserOptions, RdfXmlParser};
//! use std::io::BufReader;
//! use std::fs::File;
//!
//! struct Count(u64);
//!
//! impl StatementHandler for Count {
//!     fn statement(&mut self, _: &AResource, _: &AResource, _: &AResource) -> HandlerResult {
//!         self.0 += 1;
//!         Ok(())
//!     }
//!
//!     fn literal_statement(&mut self, _: &AResource, _: &AResource, _: &ALiteral) -> HandlerResult {
//!         self.0 += 1;
//!         Ok(())
//!     }
//! }
//!
//! let options = ParserOptions { error_modes: ErrorModes::strict(), ..ParserOptions::default() };
//! let mut handler = HandlerSet::new().with_statement_handler(Count(0));
//! RdfXmlParser::new()
//!     .with_options(options)
//!     .with_base_uri("file:foo.rdf")
//!     .parse(BufReader::new(File::open("foo.rdf").unwrap()), &mut handler)
//!     .unwrap();
//! println!("{} triples", handler.statements.0);
//! ```
//!
//! The grammar itself is [`RdfXmlCore`], an [`XmlContentHandler`]. [`PullAdapter`] feeds it from `quick-xml`,
//! [`XmlDocument::walk`] from an element tree held in memory.
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

mod error;
mod event;
mod grammar;
mod language;
mod options;
mod parser;
mod pull;
mod resolver;
mod scope;
mod tree;
mod utils;

pub use error::{ArpError, OptionError};
pub use event::{XmlAttribute, XmlContentHandler, XmlName};
pub use grammar::RdfXmlCore;
pub use options::{ErrorModes, IriRules, ParserOptions};
pub use parser::RdfXmlParser;
pub use pull::PullAdapter;
pub use tree::{XmlDocument, XmlElement, XmlNode};
