use crate::error::ArpError;
use crate::event::XmlContentHandler;
use crate::grammar::RdfXmlCore;
use crate::options::ParserOptions;
use crate::pull::{report_failure, PullAdapter};
use crate::tree::XmlDocument;
use arp_api::handler::ArpHandler;
use std::io::BufRead;

/// A [RDF XML](https://www.w3.org/TR/rdf-syntax-grammar/) streaming parser.
///
/// It implements the [`ArpHandler`] driven interface: triples, namespaces, blank node scopes and conditions are pushed
/// to the handler as soon as they are known.
///
/// Count the number of people using the [`StatementHandler`](arp_api::handler::StatementHandler) API:
/// ```
/// use arp_api::handler::{HandlerResult, HandlerSet, StatementHandler};
/// use arp_api::model::{AResource, ALiteral};
/// use arp_xml::RdfXmlParser;
///
/// #[derive(Default)]
/// struct People(usize);
///
/// impl StatementHandler for People {
///     fn statement(&mut self, _: &AResource, p: &AResource, o: &AResource) -> HandlerResult {
///         if p.uri_ref() == Some("http://www.w3.org/1999/02/22-rdf-syntax-ns#type")
///             && o.uri_ref() == Some("http://schema.org/Person")
///         {
///             self.0 += 1;
///         }
///         Ok(())
///     }
///
///     fn literal_statement(&mut self, _: &AResource, _: &AResource, _: &ALiteral) -> HandlerResult {
///         Ok(())
///     }
/// }
///
/// let file = br#"<?xml version="1.0"?>
/// <rdf:RDF xmlns:rdf="http://www.w3.org/1999/02/22-rdf-syntax-ns#" xmlns:schema="http://schema.org/">
///  <rdf:Description rdf:about="http://example.com/foo">
///    <rdf:type rdf:resource="http://schema.org/Person" />
///    <schema:name>Foo</schema:name>
///  </rdf:Description>
///  <schema:Person rdf:about="http://example.com/bar" schema:name="Bar" />
/// </rdf:RDF>"#;
///
/// let mut handler = HandlerSet::new().with_statement_handler(People::default());
/// RdfXmlParser::new().parse(file.as_ref(), &mut handler).unwrap();
/// assert_eq!(2, handler.statements.0);
/// ```
#[derive(Debug, Clone, Default)]
pub struct RdfXmlParser {
    options: ParserOptions,
    base_uri: Option<String>,
    system_id: Option<String>,
}

impl RdfXmlParser {
    /// A parser with [`ParserOptions::default`] and no base URI.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(mut self, options: ParserOptions) -> Self {
        self.options = options;
        self
    }

    /// The base URI of the document, the empty string states that relative URIs must be kept as written.
    pub fn with_base_uri(mut self, base_uri: impl Into<String>) -> Self {
        self.base_uri = Some(base_uri.into());
        self
    }

    /// The name of the input used in condition locations, usually a file name or an URL.
    pub fn with_system_id(mut self, system_id: impl Into<String>) -> Self {
        self.system_id = Some(system_id.into());
        self
    }

    pub fn options(&self) -> &ParserOptions {
        &self.options
    }

    pub fn options_mut(&mut self) -> &mut ParserOptions {
        &mut self.options
    }

    /// Parses a document read from a [`BufRead`] implementation.
    pub fn parse<R: BufRead, H: ArpHandler + ?Sized>(
        &self,
        read: R,
        handler: &mut H,
    ) -> Result<(), ArpError> {
        let mut core = self.core(handler);
        let result = PullAdapter::new(read).run(&mut core);
        core.finish(result)
    }

    /// Parses a document already held in memory.
    pub fn parse_document<H: ArpHandler + ?Sized>(
        &self,
        document: &XmlDocument,
        handler: &mut H,
    ) -> Result<(), ArpError> {
        let mut core = self.core(handler);
        let result = document.walk(&mut core);
        core.finish(result)
    }

    /// Reads the whole document into an [`XmlDocument`] then parses it.
    ///
    /// If the document is not well-formed no triple is emitted.
    pub fn parse_buffered<R: BufRead, H: ArpHandler + ?Sized>(
        &self,
        read: R,
        handler: &mut H,
    ) -> Result<(), ArpError> {
        match XmlDocument::parse(read) {
            Ok(document) => self.parse_document(&document, handler),
            Err(error) => {
                let mut core = self.core(handler);
                let result = core.start_document().and_then(|()| Err(replay(&mut core, error)));
                core.finish(result)
            }
        }
    }

    /// The grammar, for callers feeding events from their own source.
    pub fn core<'h, H: ArpHandler + ?Sized>(&self, handler: &'h mut H) -> RdfXmlCore<'h, H> {
        RdfXmlCore::new(
            handler,
            self.options,
            self.base_uri.as_deref(),
            self.system_id.clone(),
        )
    }
}

/// Reports a failure of the tree construction to the grammar.
fn replay<C: XmlContentHandler + ?Sized>(content: &mut C, error: ArpError) -> ArpError {
    match error {
        ArpError::Fatal(condition) => {
            content.set_location(condition.location.line, condition.location.column);
            match content.report(condition.code, &condition.message) {
                Err(error) => error,
                Ok(()) => ArpError::Fatal(condition),
            }
        }
        error => report_failure(content, error),
    }
}
