//! The RDF/XML grammar, as a stack of frames driven by [`XmlContentHandler`] events.

use crate::error::ArpError;
use crate::event::{XmlAttribute, XmlContentHandler, XmlName};
use crate::language::check_language;
use crate::options::ParserOptions;
use crate::resolver::{has_scheme, BaseUri};
use crate::scope::{IdCheck, IdRegistry, ScopeTracker, ID_CHECK_LIMIT};
use crate::utils::{is_name, is_nc_name, is_whitespace};
use arp_api::condition::{ErrorCode, Location, ParseCondition, Severity};
use arp_api::handler::{ArpHandler, Reaction};
use arp_api::model::{AResource, ALiteral, Object};
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use std::iter::once;
use std::mem::take;
use std::rc::Rc;
use tracing::{debug, trace};

pub(crate) const RDF_NS: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#";
pub(crate) const XML_NS: &str = "http://www.w3.org/XML/1998/namespace";
const DAML_NS: &str = "http://www.daml.org/2001/03/daml+oil#";

const FORBIDDEN_NODE_ELEMENTS: [&str; 11] = [
    "RDF",
    "ID",
    "about",
    "bagID",
    "parseType",
    "resource",
    "nodeID",
    "li",
    "aboutEach",
    "aboutEachPrefix",
    "datatype",
];
const FORBIDDEN_PROPERTY_ELEMENTS: [&str; 11] = [
    "Description",
    "RDF",
    "ID",
    "about",
    "bagID",
    "parseType",
    "resource",
    "nodeID",
    "aboutEach",
    "aboutEachPrefix",
    "datatype",
];
const REMOVED_ATTRIBUTES: [&str; 6] = [
    "li",
    "RDF",
    "Description",
    "aboutEach",
    "aboutEachPrefix",
    "bagID",
];
/// Attributes that are read as their `rdf:` counterpart when written without prefix.
const UNQUALIFIED_RDF_ATTRIBUTES: [&str; 8] = [
    "about",
    "ID",
    "nodeID",
    "resource",
    "parseType",
    "datatype",
    "type",
    "bagID",
];
const RDF_VOCABULARY: [&str; 32] = [
    "Alt",
    "Bag",
    "CompoundLiteral",
    "Description",
    "HTML",
    "ID",
    "JSON",
    "List",
    "PlainLiteral",
    "Property",
    "RDF",
    "Seq",
    "Statement",
    "XMLLiteral",
    "about",
    "aboutEach",
    "aboutEachPrefix",
    "bagID",
    "datatype",
    "direction",
    "first",
    "langString",
    "language",
    "li",
    "nil",
    "nodeID",
    "object",
    "parseType",
    "predicate",
    "resource",
    "rest",
    "subject",
];

/// `rdf:_1`, `rdf:_2`...
fn is_member_name(local_name: &str) -> bool {
    local_name.strip_prefix('_').is_some_and(|n| {
        !n.is_empty() && !n.starts_with('0') && n.bytes().all(|b| b.is_ascii_digit())
    })
}

fn is_rdf_name(local_name: &str) -> bool {
    local_name == "type"
        || local_name == "value"
        || RDF_VOCABULARY.contains(&local_name)
        || is_member_name(local_name)
}

fn rdf(local_name: &str) -> AResource {
    AResource::uri(format!("{}{}", RDF_NS, local_name))
}

#[derive(Eq, PartialEq, Debug, Clone, Copy)]
enum Verdict {
    Proceed,
    /// The construct the condition is about must not produce triples.
    Suppress,
}

#[derive(Clone)]
struct Context {
    base: Rc<BaseUri>,
    language: String,
}

enum NodeOrText {
    Node(AResource),
    Text(String),
}

#[derive(Eq, PartialEq, Debug, Clone, Copy)]
enum ListVocabulary {
    Rdf,
    Daml,
}

impl ListVocabulary {
    fn term(self, local_name: &str) -> AResource {
        match self {
            ListVocabulary::Rdf => rdf(local_name),
            ListVocabulary::Daml => AResource::uri(format!("{}{}", DAML_NS, local_name)),
        }
    }
}

enum RdfXmlState {
    Doc {
        context: Context,
    },
    /// Plain XML around the RDF content, in embedding mode.
    Embedded {
        context: Context,
    },
    Rdf {
        context: Context,
    },
    NodeElt {
        context: Context,
        subject: AResource,
        li_counter: u64,
    },
    PropertyElt {
        //Resource, Literal or Empty property element
        context: Context,
        predicate: AResource,
        subject: AResource,
        object: Option<NodeOrText>,
        /// The object was given by rdf:resource, rdf:nodeID or property attributes.
        from_attributes: bool,
        id: Option<AResource>,
        datatype: Option<String>,
    },
    ParseTypeCollectionPropertyElt {
        context: Context,
        predicate: AResource,
        subject: AResource,
        objects: Vec<AResource>,
        id: Option<AResource>,
        vocabulary: ListVocabulary,
    },
    ParseTypeLiteralPropertyElt {
        context: Context,
        predicate: AResource,
        subject: AResource,
        id: Option<AResource>,
        writer: Writer<Vec<u8>>,
        depth: usize,
        /// Prefixes declared in the output so far, with the depth of the declaring element.
        declared: Vec<(usize, String)>,
        parse_type: String,
        emit: bool, //false for rejected parseTypes, the content is consumed silently
    },
    /// A subtree dropped after an error.
    Skipped {
        context: Context,
        nested: usize,
    },
}

impl RdfXmlState {
    fn context(&self) -> &Context {
        match self {
            RdfXmlState::Doc { context }
            | RdfXmlState::Embedded { context }
            | RdfXmlState::Rdf { context }
            | RdfXmlState::NodeElt { context, .. }
            | RdfXmlState::PropertyElt { context, .. }
            | RdfXmlState::ParseTypeCollectionPropertyElt { context, .. }
            | RdfXmlState::ParseTypeLiteralPropertyElt { context, .. }
            | RdfXmlState::Skipped { context, .. } => context,
        }
    }
}

fn skip(context: Context) -> RdfXmlState {
    RdfXmlState::Skipped { context, nested: 0 }
}

/// A reference to a resource given by attributes, in document order of precedence.
enum Reference {
    Uri(String),
    Id(String),
    NodeId(String),
}

/// The RDF attributes of one element, screened and sorted.
#[derive(Default)]
struct RdfAttributes {
    about: Option<(usize, String)>,
    id: Option<(usize, String)>,
    node_id: Option<(usize, String)>,
    resource: Option<(usize, String)>,
    datatype: Option<String>,
    parse_type: Option<String>,
    rdf_type: Option<String>,
    properties: Vec<(AResource, String)>,
}

impl RdfAttributes {
    fn is_empty(&self) -> bool {
        self.about.is_none()
            && self.id.is_none()
            && self.node_id.is_none()
            && self.resource.is_none()
            && self.datatype.is_none()
            && self.parse_type.is_none()
            && self.rdf_type.is_none()
            && self.properties.is_empty()
    }
}

fn set_first(slot: &mut Option<(usize, String)>, position: usize, value: &str) {
    if slot.is_none() {
        *slot = Some((position, value.to_owned()));
    }
}

/// The RDF/XML grammar.
///
/// It consumes XML events and reports triples, conditions and scope notifications to an [`ArpHandler`].
/// Feed it from any event source, then call [`finish`](RdfXmlCore::finish) whatever the outcome:
/// it closes the remaining blank node scopes and the RDF content bracket.
///
/// ```
/// use arp_api::handler::NoHandler;
/// use arp_xml::{RdfXmlCore, ParserOptions, XmlAttribute, XmlContentHandler, XmlName};
///
/// const RDF: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#";
/// let mut handler = NoHandler;
/// let mut core = RdfXmlCore::new(&mut handler, ParserOptions::default(), Some("http://ex.org/"), None);
/// let description = XmlName::new(RDF, "Description", "rdf:Description");
/// let name = XmlName::new("http://ex.org/", "name", "ex:name");
/// let result = (|| {
///     core.start_document()?;
///     core.start_prefix_mapping("rdf", RDF)?;
///     core.start_element(&description, &[XmlAttribute::new(XmlName::new(RDF, "about", "rdf:about"), "a")])?;
///     core.start_element(&name, &[])?;
///     core.characters("Ann")?;
///     core.end_element(&name)?;
///     core.end_element(&description)?;
///     core.end_prefix_mapping("rdf")?;
///     core.end_document()
/// })();
/// assert_eq!(core.triple_count(), 1);
/// core.finish(result).unwrap();
/// ```
pub struct RdfXmlCore<'h, H: ArpHandler + ?Sized> {
    handler: &'h mut H,
    options: ParserOptions,
    location: Location,
    state: Vec<RdfXmlState>,
    /// In scope namespace bindings, innermost last.
    namespaces: Vec<(String, String)>,
    /// Bindings announced for the next element.
    pending_prefixes: Vec<(String, String)>,
    scope: ScopeTracker,
    ids: IdRegistry,
    document_base: Rc<BaseUri>,
    promoted: Option<ParseCondition>,
    base_significance_reported: bool,
    triple_count: u64,
}

impl<'h, H: ArpHandler + ?Sized> RdfXmlCore<'h, H> {
    /// `system_id` names the input in condition locations.
    pub fn new(
        handler: &'h mut H,
        options: ParserOptions,
        base_uri: Option<&str>,
        system_id: Option<String>,
    ) -> Self {
        let discard_node_ids = handler.discard_nodes_with_node_id();
        let document_base = Rc::new(BaseUri::new(base_uri, options.iri_rules));
        Self {
            handler,
            options,
            location: Location {
                system_id,
                line: 0,
                column: 0,
            },
            state: vec![RdfXmlState::Doc {
                context: Context {
                    base: document_base.clone(),
                    language: String::new(),
                },
            }],
            namespaces: Vec::new(),
            pending_prefixes: Vec::new(),
            scope: ScopeTracker::new(discard_node_ids),
            ids: IdRegistry::default(),
            document_base,
            promoted: None,
            base_significance_reported: false,
            triple_count: 0,
        }
    }

    /// The number of triples emitted so far.
    pub fn triple_count(&self) -> u64 {
        self.triple_count
    }

    /// Ends the parse.
    ///
    /// `result` is the outcome of feeding the events. Pending blank node scopes are closed and `end_rdf`
    /// is called even if it is an error. The first failure is returned.
    pub fn finish(mut self, result: Result<(), ArpError>) -> Result<(), ArpError> {
        let result = result.and_then(|()| self.checkpoint());
        let closed = self.scope.close_all(&mut *self.handler);
        let ended = self.scope.end_rdf(&mut *self.handler);
        debug!(
            triples = self.triple_count,
            blank_nodes = self.scope.generated(),
            failed = result.is_err(),
            "RDF/XML parse finished"
        );
        result?;
        closed?;
        ended?;
        Ok(())
    }

    fn report(
        &mut self,
        code: ErrorCode,
        message: impl Into<String>,
    ) -> Result<Verdict, ArpError> {
        let condition = |location: &Location| ParseCondition {
            code,
            message: message.into(),
            location: location.clone(),
        };
        let (condition, reaction, verdict) = match self.options.error_modes.mode(code) {
            Severity::Ignore => return Ok(Verdict::Proceed),
            Severity::Warning => {
                let condition = condition(&self.location);
                let reaction = self.handler.warning(&condition);
                (condition, reaction, Verdict::Proceed)
            }
            Severity::Error => {
                let condition = condition(&self.location);
                let reaction = self.handler.error(&condition);
                (condition, reaction, Verdict::Suppress)
            }
            Severity::Fatal => {
                let condition = condition(&self.location);
                self.handler.fatal_error(&condition);
                return Err(ArpError::Fatal(condition));
            }
        };
        if reaction == Reaction::Promote && self.promoted.is_none() {
            self.promoted = Some(condition);
        }
        Ok(verdict)
    }

    /// Raises a condition promoted by the error handler during the current event.
    fn checkpoint(&mut self) -> Result<(), ArpError> {
        match self.promoted.take() {
            Some(condition) => Err(ArpError::Promoted(condition)),
            None => Ok(()),
        }
    }

    fn current_context(&self) -> Context {
        match self.state.last() {
            Some(state) => state.context().clone(),
            None => Context {
                base: self.document_base.clone(),
                language: String::new(),
            },
        }
    }

    fn on_start_document(&mut self) -> Result<(), ArpError> {
        debug!(
            base = ?self.document_base.as_str(),
            embedding = self.options.embedding,
            iri_rules = ?self.options.iri_rules,
            "RDF/XML parse started"
        );
        if let Some((code, message)) = self.document_base.install_condition() {
            self.report(code, message)?;
        }
        Ok(())
    }

    fn on_start_prefix_mapping(&mut self, prefix: &str, uri: &str) -> Result<(), ArpError> {
        if uri != RDF_NS && uri.starts_with(RDF_NS.trim_end_matches('#')) {
            self.report(
                ErrorCode::BadRdfNamespaceUri,
                format!("namespace <{}> looks like a misspelling of the RDF namespace", uri),
            )?;
        } else if uri != XML_NS && uri.starts_with(XML_NS) {
            self.report(
                ErrorCode::BadXmlNamespaceUri,
                format!("namespace <{}> looks like a misspelling of the XML namespace", uri),
            )?;
        } else if !uri.is_empty() && !has_scheme(uri) {
            self.report(
                ErrorCode::RelativeNamespaceUriDeprecated,
                format!("the namespace <{}> of prefix {:?} is relative", uri, prefix),
            )?;
        }
        self.namespaces.push((prefix.to_owned(), uri.to_owned()));
        self.pending_prefixes
            .push((prefix.to_owned(), uri.to_owned()));
        self.handler.start_prefix_mapping(prefix, uri)?;
        Ok(())
    }

    fn on_end_prefix_mapping(&mut self, prefix: &str) -> Result<(), ArpError> {
        if let Some(i) = self.namespaces.iter().rposition(|(p, _)| p == prefix) {
            self.namespaces.remove(i);
        }
        self.handler.end_prefix_mapping(prefix)?;
        Ok(())
    }

    fn on_start_element(
        &mut self,
        name: &XmlName,
        attributes: &[XmlAttribute],
    ) -> Result<(), ArpError> {
        let declared_here = take(&mut self.pending_prefixes);

        //Literal case
        let namespaces = &self.namespaces;
        match self.state.last_mut() {
            Some(RdfXmlState::ParseTypeLiteralPropertyElt {
                writer,
                depth,
                declared,
                ..
            }) => {
                return write_literal_start(
                    writer,
                    depth,
                    declared,
                    namespaces,
                    &declared_here,
                    name,
                    attributes,
                )
            }
            Some(RdfXmlState::Skipped { nested, .. }) => {
                *nested += 1;
                return Ok(());
            }
            _ => (),
        }

        let depth = self.state.len();
        let context = self.current_context();
        trace!(depth, element = %name.qname, "opening frame");
        let new_state = match self.state.last() {
            Some(RdfXmlState::Doc { .. }) | Some(RdfXmlState::Embedded { .. }) => {
                if name.is(RDF_NS, "RDF") {
                    self.build_rdf(name, attributes, context)?
                } else if self.options.embedding {
                    self.build_embedded(attributes, context)?
                } else {
                    self.scope.start_rdf(&mut *self.handler)?;
                    self.build_node_elt(name, attributes, context, depth)?
                }
            }
            Some(RdfXmlState::Rdf { .. }) | Some(RdfXmlState::ParseTypeCollectionPropertyElt { .. }) => {
                self.build_node_elt(name, attributes, context, depth)?
            }
            Some(RdfXmlState::PropertyElt { .. }) => {
                if self.check_property_content()? {
                    self.build_node_elt(name, attributes, context, depth)?
                } else {
                    skip(context)
                }
            }
            Some(RdfXmlState::NodeElt { .. }) => {
                self.build_property_elt(name, attributes, context, depth)?
            }
            _ => {
                self.report(
                    ErrorCode::MinorInternalError,
                    format!("unexpected element {}", name.qname),
                )?;
                skip(context)
            }
        };
        self.state.push(new_state);
        Ok(())
    }

    fn on_end_element(&mut self, name: &XmlName) -> Result<(), ArpError> {
        //Literal case
        match self.state.last_mut() {
            Some(RdfXmlState::ParseTypeLiteralPropertyElt {
                writer,
                depth,
                declared,
                ..
            }) if *depth > 0 => {
                *depth -= 1;
                let level = *depth;
                declared.retain(|(d, _)| *d < level);
                writer.write_event(Event::End(BytesEnd::new(name.qname.as_str())))?;
                return Ok(());
            }
            Some(RdfXmlState::Skipped { nested, .. }) if *nested > 0 => {
                *nested -= 1;
                return Ok(());
            }
            _ => (),
        }

        if self.state.len() <= 1 {
            self.report(
                ErrorCode::MinorInternalError,
                format!("unbalanced end of element {}", name.qname),
            )?;
            return Ok(());
        }
        if let Some(state) = self.state.pop() {
            trace!(depth = self.state.len(), element = %name.qname, "closing frame");
            let result = self.end_state(state);
            let closed = self.scope.close_frame(self.state.len(), &mut *self.handler);
            result?;
            closed?;
        }
        Ok(())
    }

    fn on_characters(&mut self, text: &str) -> Result<(), ArpError> {
        let misplaced = match self.state.last_mut() {
            Some(RdfXmlState::ParseTypeLiteralPropertyElt { writer, .. }) => {
                writer.write_event(Event::Text(BytesText::new(text)))?;
                false
            }
            Some(RdfXmlState::PropertyElt { object, .. }) => match object {
                Some(NodeOrText::Text(buffer)) => {
                    buffer.push_str(text);
                    false
                }
                Some(NodeOrText::Node(_)) => !is_whitespace(text),
                None => {
                    *object = Some(NodeOrText::Text(text.to_owned()));
                    false
                }
            },
            Some(RdfXmlState::Rdf { .. })
            | Some(RdfXmlState::NodeElt { .. })
            | Some(RdfXmlState::ParseTypeCollectionPropertyElt { .. }) => !is_whitespace(text),
            _ => false,
        };
        if misplaced {
            self.report(
                ErrorCode::NotWhitespace,
                format!("text {:?} is not allowed here and is dropped", text.trim()),
            )?;
        }
        Ok(())
    }

    fn on_comment(&mut self, text: &str) -> Result<(), ArpError> {
        if let Some(RdfXmlState::ParseTypeLiteralPropertyElt { writer, .. }) = self.state.last_mut()
        {
            writer.write_event(Event::Comment(BytesText::from_escaped(text)))?;
        }
        Ok(())
    }

    fn on_processing_instruction(&mut self, target: &str, data: &str) -> Result<(), ArpError> {
        match self.state.last_mut() {
            Some(RdfXmlState::ParseTypeLiteralPropertyElt { writer, .. }) => {
                let pi = if data.is_empty() {
                    format!("<?{}?>", target)
                } else {
                    format!("<?{} {}?>", target, data)
                };
                writer.get_mut().extend_from_slice(pi.as_bytes());
            }
            Some(RdfXmlState::Doc { .. }) | Some(RdfXmlState::Embedded { .. }) | None => (),
            Some(_) => {
                self.report(
                    ErrorCode::ProcessingInstructionInRdf,
                    format!("processing instruction <?{}?> in RDF content is ignored", target),
                )?;
            }
        }
        Ok(())
    }

    /// `rdf:RDF`: only `xml:` attributes are allowed.
    fn build_rdf(
        &mut self,
        name: &XmlName,
        attributes: &[XmlAttribute],
        mut context: Context,
    ) -> Result<RdfXmlState, ArpError> {
        self.scope.start_rdf(&mut *self.handler)?;
        let attrs = self.read_attributes(name, attributes, &mut context)?;
        if !attrs.is_empty() {
            self.report(
                ErrorCode::SyntaxError,
                "rdf:RDF only allows namespace declarations and xml: attributes",
            )?;
        }
        Ok(RdfXmlState::Rdf { context })
    }

    fn build_embedded(
        &mut self,
        attributes: &[XmlAttribute],
        mut context: Context,
    ) -> Result<RdfXmlState, ArpError> {
        for attribute in attributes {
            if attribute.name.namespace == XML_NS {
                match attribute.name.local_name.as_str() {
                    "base" => self.set_base(&mut context, &attribute.value)?,
                    "lang" => self.set_language(&mut context, &attribute.value)?,
                    _ => (),
                }
            }
        }
        Ok(RdfXmlState::Embedded { context })
    }

    fn build_node_elt(
        &mut self,
        name: &XmlName,
        attributes: &[XmlAttribute],
        mut context: Context,
        depth: usize,
    ) -> Result<RdfXmlState, ArpError> {
        let verdict = if name.namespace.is_empty() {
            self.report(
                ErrorCode::UnqualifiedElement,
                format!("node element {} is not in a namespace", name.qname),
            )?
        } else if name.namespace == RDF_NS {
            let local_name = name.local_name.as_str();
            if FORBIDDEN_NODE_ELEMENTS.contains(&local_name) {
                self.report(
                    ErrorCode::BadRdfElement,
                    format!("rdf:{} is not allowed as a node element", local_name),
                )?
            } else if is_member_name(local_name) {
                self.report(
                    ErrorCode::RdfNnAsType,
                    format!("rdf:{} is used as a type", local_name),
                )?
            } else if !is_rdf_name(local_name) {
                self.report(
                    ErrorCode::UnknownRdfElement,
                    format!("rdf:{} is not part of the RDF vocabulary", local_name),
                )?
            } else {
                Verdict::Proceed
            }
        } else {
            Verdict::Proceed
        };
        if verdict == Verdict::Suppress {
            return Ok(skip(context));
        }

        let mut attrs = self.read_attributes(name, attributes, &mut context)?;
        for (present, attribute) in [
            (attrs.resource.is_some(), "rdf:resource"),
            (attrs.parse_type.is_some(), "rdf:parseType"),
            (attrs.datatype.is_some(), "rdf:datatype"),
        ] {
            if present {
                self.report(
                    ErrorCode::BadRdfAttribute,
                    format!("{} is not allowed on a node element and is ignored", attribute),
                )?;
            }
        }

        let mut candidates = Vec::new();
        if let Some((position, about)) = attrs.about.take() {
            candidates.push((position, Reference::Uri(about)));
        }
        if let Some((position, id)) = attrs.id.take() {
            candidates.push((position, Reference::Id(id)));
        }
        if let Some((position, node_id)) = attrs.node_id.take() {
            candidates.push((position, Reference::NodeId(node_id)));
        }
        candidates.sort_by_key(|(position, _)| *position);
        if candidates.len() > 1 {
            self.report(
                ErrorCode::SyntaxError,
                "rdf:about, rdf:ID and rdf:nodeID are mutually exclusive, only the first one is used",
            )?;
        }

        let subject = match candidates.into_iter().next().map(|(_, r)| r) {
            Some(Reference::Uri(about)) => match self.resolve(&context.base, &about)? {
                Some(uri) => AResource::Uri(uri),
                None => return Ok(skip(context)),
            },
            Some(Reference::Id(id)) => match self.resolve_id(&context.base, &id)? {
                Some(uri) => AResource::Uri(uri),
                None => return Ok(skip(context)),
            },
            Some(Reference::NodeId(label)) => {
                self.check_name("rdf:nodeID", &label)?;
                AResource::Blank(self.scope.node_id(&label))
            }
            None => {
                let retire_depth = match self.state.last() {
                    Some(RdfXmlState::PropertyElt { .. })
                    | Some(RdfXmlState::ParseTypeCollectionPropertyElt { .. }) => depth - 1,
                    _ => depth,
                };
                AResource::Blank(self.scope.fresh(retire_depth))
            }
        };

        if !name.is(RDF_NS, "Description") {
            self.emit(&subject, &rdf("type"), &AResource::uri(name.uri()))?;
        }
        if let Some(rdf_type) = attrs.rdf_type.take() {
            if let Some(uri) = self.resolve(&context.base, &rdf_type)? {
                self.emit(&subject, &rdf("type"), &AResource::Uri(uri))?;
            }
        }
        self.emit_property_attrs(&subject, take(&mut attrs.properties), &context.language)?;
        Ok(RdfXmlState::NodeElt {
            context,
            subject,
            li_counter: 0,
        })
    }

    fn build_property_elt(
        &mut self,
        name: &XmlName,
        attributes: &[XmlAttribute],
        mut context: Context,
        depth: usize,
    ) -> Result<RdfXmlState, ArpError> {
        let subject = match self.state.last_mut() {
            Some(RdfXmlState::NodeElt {
                subject,
                li_counter,
                ..
            }) => {
                if name.is(RDF_NS, "li") {
                    *li_counter += 1;
                }
                subject.clone()
            }
            _ => return Ok(skip(context)),
        };

        let predicate = if name.is(RDF_NS, "li") {
            match self.state.last() {
                Some(RdfXmlState::NodeElt { li_counter, .. }) => rdf(&format!("_{}", li_counter)),
                _ => return Ok(skip(context)),
            }
        } else {
            let verdict = if name.namespace.is_empty() {
                self.report(
                    ErrorCode::UnqualifiedElement,
                    format!("property element {} is not in a namespace", name.qname),
                )?
            } else if name.namespace == RDF_NS {
                let local_name = name.local_name.as_str();
                if FORBIDDEN_PROPERTY_ELEMENTS.contains(&local_name) {
                    self.report(
                        ErrorCode::BadRdfElement,
                        format!("rdf:{} is not allowed as a property element", local_name),
                    )?
                } else if !is_rdf_name(local_name) {
                    self.report(
                        ErrorCode::UnknownRdfElement,
                        format!("rdf:{} is not part of the RDF vocabulary", local_name),
                    )?
                } else {
                    Verdict::Proceed
                }
            } else {
                Verdict::Proceed
            };
            if verdict == Verdict::Suppress {
                return Ok(skip(context));
            }
            AResource::uri(name.uri())
        };

        let mut attrs = self.read_attributes(name, attributes, &mut context)?;
        if attrs.about.is_some() {
            self.report(
                ErrorCode::BadRdfAttribute,
                "rdf:about is not allowed on a property element and is ignored",
            )?;
        }
        let id = match attrs.id.take() {
            Some((_, id)) => self.resolve_id(&context.base, &id)?.map(AResource::Uri),
            None => None,
        };

        if let Some(parse_type) = attrs.parse_type.take() {
            return self.build_parse_type_property_elt(
                context, depth, subject, predicate, id, parse_type, attrs,
            );
        }

        let reference = match (attrs.resource.take(), attrs.node_id.take()) {
            (Some(resource), Some(node_id)) => {
                self.report(
                    ErrorCode::SyntaxError,
                    "rdf:resource and rdf:nodeID are mutually exclusive, only the first one is used",
                )?;
                if resource.0 < node_id.0 {
                    Some(Reference::Uri(resource.1))
                } else {
                    Some(Reference::NodeId(node_id.1))
                }
            }
            (Some((_, resource)), None) => Some(Reference::Uri(resource)),
            (None, Some((_, node_id))) => Some(Reference::NodeId(node_id)),
            (None, None) => None,
        };

        if reference.is_none() && attrs.rdf_type.is_none() && attrs.properties.is_empty() {
            let datatype = match attrs.datatype {
                Some(datatype) => match self.resolve(&context.base, &datatype)? {
                    Some(uri) => Some(uri),
                    None => return Ok(skip(context)),
                },
                None => None,
            };
            return Ok(RdfXmlState::PropertyElt {
                context,
                predicate,
                subject,
                object: None,
                from_attributes: false,
                id,
                datatype,
            });
        }

        if attrs.datatype.is_some()
            && self.report(
                ErrorCode::SyntaxError,
                "rdf:datatype is only allowed on literal property elements",
            )? == Verdict::Suppress
        {
            return Ok(skip(context));
        }
        let object = match reference {
            Some(Reference::Uri(resource)) => match self.resolve(&context.base, &resource)? {
                Some(uri) => AResource::Uri(uri),
                None => return Ok(skip(context)),
            },
            Some(Reference::NodeId(label)) => {
                self.check_name("rdf:nodeID", &label)?;
                AResource::Blank(self.scope.node_id(&label))
            }
            Some(Reference::Id(_)) | None => AResource::Blank(self.scope.fresh(depth)),
        };
        if let Some(rdf_type) = attrs.rdf_type.take() {
            if let Some(uri) = self.resolve(&context.base, &rdf_type)? {
                self.emit(&object, &rdf("type"), &AResource::Uri(uri))?;
            }
        }
        self.emit_property_attrs(&object, take(&mut attrs.properties), &context.language)?;
        Ok(RdfXmlState::PropertyElt {
            context,
            predicate,
            subject,
            object: Some(NodeOrText::Node(object)),
            from_attributes: true,
            id,
            datatype: None,
        })
    }

    #[allow(clippy::too_many_arguments)]
    fn build_parse_type_property_elt(
        &mut self,
        context: Context,
        depth: usize,
        subject: AResource,
        predicate: AResource,
        id: Option<AResource>,
        parse_type: String,
        attrs: RdfAttributes,
    ) -> Result<RdfXmlState, ArpError> {
        if (attrs.resource.is_some()
            || attrs.node_id.is_some()
            || attrs.datatype.is_some()
            || attrs.rdf_type.is_some()
            || !attrs.properties.is_empty())
            && self.report(
                ErrorCode::SyntaxError,
                format!(
                    "rdf:parseType=\"{}\" cannot be combined with rdf:resource, rdf:nodeID, rdf:datatype or property attributes",
                    parse_type
                ),
            )? == Verdict::Suppress
        {
            return Ok(skip(context));
        }

        let daml_allowed =
            self.options.error_modes.mode(ErrorCode::InStrictMode) < Severity::Error;
        let vocabulary = match parse_type.as_str() {
            "Resource" => {
                return self
                    .build_parse_type_resource_property_elt(context, depth, subject, predicate, id)
            }
            "Collection" => Some(ListVocabulary::Rdf),
            "daml:collection" if daml_allowed => {
                self.report(
                    ErrorCode::DamlCollection,
                    "rdf:parseType=\"daml:collection\" builds a DAML list",
                )?;
                Some(ListVocabulary::Daml)
            }
            _ => None,
        };
        if let Some(vocabulary) = vocabulary {
            return Ok(RdfXmlState::ParseTypeCollectionPropertyElt {
                context,
                predicate,
                subject,
                objects: Vec::new(),
                id,
                vocabulary,
            });
        }

        let emit = parse_type == "Literal"
            || self.report(
                ErrorCode::UnknownParseType,
                format!("unknown rdf:parseType {:?} is read as \"Literal\"", parse_type),
            )? == Verdict::Proceed;
        Ok(RdfXmlState::ParseTypeLiteralPropertyElt {
            context,
            predicate,
            subject,
            id,
            writer: Writer::new(Vec::new()),
            depth: 0,
            declared: Vec::new(),
            parse_type,
            emit,
        })
    }

    fn build_parse_type_resource_property_elt(
        &mut self,
        context: Context,
        depth: usize,
        subject: AResource,
        predicate: AResource,
        id: Option<AResource>,
    ) -> Result<RdfXmlState, ArpError> {
        let object = AResource::Blank(self.scope.fresh(depth));
        self.emit(&subject, &predicate, &object)?;
        if let Some(id) = &id {
            self.reify(id, &subject, &predicate, Object::Resource(&object))?;
        }
        Ok(RdfXmlState::NodeElt {
            context,
            subject: object,
            li_counter: 0,
        })
    }

    /// Checks that a node element may start in the current property element.
    ///
    /// Returns false if the node element must be skipped.
    fn check_property_content(&mut self) -> Result<bool, ArpError> {
        let (conflict, text) = match self.state.last_mut() {
            Some(RdfXmlState::PropertyElt {
                object,
                from_attributes,
                ..
            }) => match object.take() {
                Some(NodeOrText::Node(node)) => {
                    *object = Some(NodeOrText::Node(node));
                    (Some(*from_attributes), None)
                }
                Some(NodeOrText::Text(text)) => (None, Some(text)),
                None => (None, None),
            },
            _ => (None, None),
        };
        if let Some(text) = text {
            if !is_whitespace(&text) {
                self.report(
                    ErrorCode::NotWhitespace,
                    format!("text {:?} before a node element is dropped", text.trim()),
                )?;
            }
        }
        match conflict {
            Some(true) => {
                self.report(
                    ErrorCode::SyntaxError,
                    "a property element with rdf:resource, rdf:nodeID or property attributes must be empty",
                )?;
                Ok(false)
            }
            Some(false) => {
                self.report(
                    ErrorCode::SyntaxError,
                    "a property element contains at most one node element",
                )?;
                Ok(false)
            }
            None => Ok(true),
        }
    }

    fn end_state(&mut self, state: RdfXmlState) -> Result<(), ArpError> {
        match state {
            RdfXmlState::PropertyElt {
                context,
                predicate,
                subject,
                object,
                id,
                datatype,
                ..
            } => match object {
                Some(NodeOrText::Node(object)) => {
                    self.emit(&subject, &predicate, &object)?;
                    if let Some(id) = &id {
                        self.reify(id, &subject, &predicate, Object::Resource(&object))?;
                    }
                }
                Some(NodeOrText::Text(text)) => {
                    let literal = new_literal(text, &context.language, datatype);
                    self.emit_literal(&subject, &predicate, &literal)?;
                    if let Some(id) = &id {
                        self.reify(id, &subject, &predicate, Object::Literal(&literal))?;
                    }
                }
                None => {
                    let literal = new_literal(String::new(), &context.language, datatype);
                    self.emit_literal(&subject, &predicate, &literal)?;
                    if let Some(id) = &id {
                        self.reify(id, &subject, &predicate, Object::Literal(&literal))?;
                    }
                }
            },
            RdfXmlState::ParseTypeCollectionPropertyElt {
                predicate,
                subject,
                objects,
                id,
                vocabulary,
                ..
            } => {
                let depth = self.state.len();
                let cells = objects
                    .iter()
                    .map(|_| AResource::Blank(self.scope.fresh(depth)))
                    .collect::<Vec<_>>();
                let first = vocabulary.term("first");
                let rest = vocabulary.term("rest");
                let nil = vocabulary.term("nil");
                for (i, (cell, object)) in cells.iter().zip(&objects).enumerate() {
                    self.emit(cell, &first, object)?;
                    self.emit(cell, &rest, cells.get(i + 1).unwrap_or(&nil))?;
                }
                let head = cells.first().unwrap_or(&nil);
                self.emit(&subject, &predicate, head)?;
                if let Some(id) = &id {
                    self.reify(id, &subject, &predicate, Object::Resource(head))?;
                }
            }
            RdfXmlState::ParseTypeLiteralPropertyElt {
                predicate,
                subject,
                id,
                writer,
                parse_type,
                emit,
                ..
            } => {
                if emit {
                    let lexical = String::from_utf8_lossy(&writer.into_inner()).into_owned();
                    let literal = ALiteral::xml(lexical, parse_type);
                    self.emit_literal(&subject, &predicate, &literal)?;
                    if let Some(id) = &id {
                        self.reify(id, &subject, &predicate, Object::Literal(&literal))?;
                    }
                }
            }
            RdfXmlState::NodeElt { subject, .. } => match self.state.last_mut() {
                Some(RdfXmlState::PropertyElt { object, .. }) => {
                    *object = Some(NodeOrText::Node(subject))
                }
                Some(RdfXmlState::ParseTypeCollectionPropertyElt { objects, .. }) => {
                    objects.push(subject)
                }
                _ => (),
            },
            RdfXmlState::Doc { .. }
            | RdfXmlState::Embedded { .. }
            | RdfXmlState::Rdf { .. }
            | RdfXmlState::Skipped { .. } => (),
        }
        Ok(())
    }

    /// Screens the attributes of an RDF element and applies `xml:lang` and `xml:base` to `context`.
    fn read_attributes(
        &mut self,
        element: &XmlName,
        attributes: &[XmlAttribute],
        context: &mut Context,
    ) -> Result<RdfAttributes, ArpError> {
        let mut attrs = RdfAttributes::default();
        for (position, attribute) in attributes.iter().enumerate() {
            let name = &attribute.name;
            let value = attribute.value.as_str();
            if name.namespace == XML_NS {
                match name.local_name.as_str() {
                    "lang" => self.set_language(context, value)?,
                    "base" => self.set_base(context, value)?,
                    "space" => (),
                    _ => {
                        self.report(
                            ErrorCode::UnknownXmlAttribute,
                            format!("unknown XML attribute {} is ignored", name.qname),
                        )?;
                    }
                }
                continue;
            }
            let local_name = if name.namespace == RDF_NS {
                name.local_name.as_str()
            } else if name.namespace.is_empty() {
                let local_name = name.local_name.as_str();
                if local_name.to_ascii_lowercase().starts_with("xml") {
                    self.report(
                        ErrorCode::UnknownXmlAttribute,
                        format!("reserved attribute {} is ignored", local_name),
                    )?;
                    continue;
                }
                if UNQUALIFIED_RDF_ATTRIBUTES.contains(&local_name) {
                    if self.report(
                        ErrorCode::UnqualifiedRdfAttribute,
                        format!("unqualified {} is read as rdf:{}", local_name, local_name),
                    )? == Verdict::Suppress
                    {
                        continue;
                    }
                    local_name
                } else {
                    let verdict = self.report(
                        ErrorCode::UnqualifiedAttribute,
                        format!(
                            "unqualified attribute {} is read in the namespace of element {}",
                            local_name, element.qname
                        ),
                    )?;
                    if verdict == Verdict::Proceed && !element.namespace.is_empty() {
                        attrs.properties.push((
                            AResource::uri(format!("{}{}", element.namespace, local_name)),
                            value.to_owned(),
                        ));
                    }
                    continue;
                }
            } else {
                attrs
                    .properties
                    .push((AResource::uri(name.uri()), value.to_owned()));
                continue;
            };

            match local_name {
                "about" => set_first(&mut attrs.about, position, value),
                "ID" => set_first(&mut attrs.id, position, value),
                "nodeID" => set_first(&mut attrs.node_id, position, value),
                "resource" => set_first(&mut attrs.resource, position, value),
                "datatype" => attrs.datatype = Some(value.to_owned()),
                "parseType" => attrs.parse_type = Some(value.to_owned()),
                "type" => attrs.rdf_type = Some(value.to_owned()),
                _ if REMOVED_ATTRIBUTES.contains(&local_name) => {
                    self.report(
                        ErrorCode::BadRdfAttribute,
                        format!("rdf:{} is not allowed as an attribute and is ignored", local_name),
                    )?;
                }
                _ => {
                    if !is_rdf_name(local_name)
                        && self.report(
                            ErrorCode::UnknownRdfAttribute,
                            format!("rdf:{} is not part of the RDF vocabulary", local_name),
                        )? == Verdict::Suppress
                    {
                        continue;
                    }
                    attrs.properties.push((rdf(local_name), value.to_owned()));
                }
            }
        }
        Ok(attrs)
    }

    fn set_language(&mut self, context: &mut Context, tag: &str) -> Result<(), ArpError> {
        if let Some((code, message)) = check_language(tag) {
            if self.report(code, message)? == Verdict::Suppress {
                return Ok(());
            }
        }
        context.language = tag.to_owned();
        Ok(())
    }

    fn set_base(&mut self, context: &mut Context, value: &str) -> Result<(), ArpError> {
        self.report(ErrorCode::XmlBaseUsed, format!("xml:base {:?} is used", value))?;
        let parent = context.base.clone();
        let Some(mut resolved) = self.resolve(&parent, value)? else {
            return Ok(());
        };
        if let Some(fragment) = resolved.find('#') {
            resolved.truncate(fragment);
        }
        let base = BaseUri::new(Some(&resolved), self.options.iri_rules);
        if let Some((code, message)) = base.install_condition() {
            if self.report(code, message)? == Verdict::Suppress {
                return Ok(());
            }
        }
        context.base = Rc::new(base);
        Ok(())
    }

    /// Resolves a reference, reporting failures.
    ///
    /// Returns `None` if the failure suppresses the construct.
    fn resolve(
        &mut self,
        base: &Rc<BaseUri>,
        reference: &str,
    ) -> Result<Option<String>, ArpError> {
        let rules = self.options.iri_rules;
        let resolved = match base.resolve(reference, rules) {
            Ok(resolved) => resolved,
            Err(failure) => match self.report(failure.code, failure.message)? {
                Verdict::Proceed => failure.fallback,
                Verdict::Suppress => return Ok(None),
            },
        };
        if !self.base_significance_reported
            && !Rc::ptr_eq(base, &self.document_base)
            && !has_scheme(reference)
            && self.options.error_modes.mode(ErrorCode::XmlBaseSignificant) != Severity::Ignore
        {
            let without_xml_base = match self.document_base.resolve(reference, rules) {
                Ok(resolved) => resolved,
                Err(failure) => failure.fallback,
            };
            if without_xml_base != resolved {
                self.base_significance_reported = true;
                self.report(
                    ErrorCode::XmlBaseSignificant,
                    format!(
                        "xml:base changes the resolution of <{}> from <{}> to <{}>",
                        reference, without_xml_base, resolved
                    ),
                )?;
            }
        }
        Ok(Some(resolved))
    }

    fn resolve_id(&mut self, base: &Rc<BaseUri>, id: &str) -> Result<Option<String>, ArpError> {
        self.check_name("rdf:ID", id)?;
        let Some(uri) = self.resolve(base, &format!("#{}", id))? else {
            return Ok(None);
        };
        let verdict = match self.ids.check_id(id, &uri) {
            IdCheck::Fresh | IdCheck::Unchecked => Verdict::Proceed,
            IdCheck::Redefinition => self.report(
                ErrorCode::RedefinitionOfId,
                format!("<{}> is already defined by another rdf:ID", uri),
            )?,
            IdCheck::LegalReuse => self.report(
                ErrorCode::LegalReuseOfId,
                format!("rdf:ID {:?} is reused with another base URI", id),
            )?,
            IdCheck::CheckDisabled => {
                self.report(
                    ErrorCode::IdCheckDisabled,
                    format!(
                        "more than {} rdf:ID values: duplicates are no longer detected",
                        ID_CHECK_LIMIT
                    ),
                )?;
                Verdict::Proceed
            }
        };
        Ok(match verdict {
            Verdict::Proceed => Some(uri),
            Verdict::Suppress => None,
        })
    }

    fn check_name(&mut self, attribute: &str, value: &str) -> Result<(), ArpError> {
        if !is_name(value) {
            self.report(
                ErrorCode::BadName,
                format!("{} value {:?} is not an XML name", attribute, value),
            )?;
        } else if !is_nc_name(value) {
            self.report(
                ErrorCode::QNameAsId,
                format!("{} value {:?} looks like a qualified name", attribute, value),
            )?;
        }
        Ok(())
    }

    fn emit(
        &mut self,
        subject: &AResource,
        predicate: &AResource,
        object: &AResource,
    ) -> Result<(), ArpError> {
        self.triple_count += 1;
        self.handler.statement(subject, predicate, object)?;
        Ok(())
    }

    fn emit_literal(
        &mut self,
        subject: &AResource,
        predicate: &AResource,
        object: &ALiteral,
    ) -> Result<(), ArpError> {
        self.triple_count += 1;
        self.handler.literal_statement(subject, predicate, object)?;
        Ok(())
    }

    fn reify(
        &mut self,
        statement_id: &AResource,
        subject: &AResource,
        predicate: &AResource,
        object: Object<'_>,
    ) -> Result<(), ArpError> {
        self.emit(statement_id, &rdf("type"), &rdf("Statement"))?;
        self.emit(statement_id, &rdf("subject"), subject)?;
        self.emit(statement_id, &rdf("predicate"), predicate)?;
        match object {
            Object::Resource(object) => self.emit(statement_id, &rdf("object"), object),
            Object::Literal(object) => self.emit_literal(statement_id, &rdf("object"), object),
        }
    }

    fn emit_property_attrs(
        &mut self,
        subject: &AResource,
        literal_attributes: Vec<(AResource, String)>,
        language: &str,
    ) -> Result<(), ArpError> {
        for (predicate, value) in literal_attributes {
            self.emit_literal(subject, &predicate, &ALiteral::plain(value, language))?;
        }
        Ok(())
    }
}

fn new_literal(value: String, language: &str, datatype: Option<String>) -> ALiteral {
    match datatype {
        Some(datatype) => ALiteral::typed(value, datatype),
        None => ALiteral::plain(value, language),
    }
}

/// Writes the start tag of an element inside a `rdf:parseType="Literal"` value.
///
/// Namespaces the tag uses are declared on the first element of the output that needs them.
fn write_literal_start(
    writer: &mut Writer<Vec<u8>>,
    depth: &mut usize,
    declared: &mut Vec<(usize, String)>,
    namespaces: &[(String, String)],
    declared_here: &[(String, String)],
    name: &XmlName,
    attributes: &[XmlAttribute],
) -> Result<(), ArpError> {
    let mut prefixes = declared_here
        .iter()
        .map(|(prefix, _)| prefix.as_str())
        .collect::<Vec<_>>();
    for used in once(name).chain(attributes.iter().map(|a| &a.name)) {
        let prefix = used.prefix();
        if used.namespace.is_empty()
            || prefix == "xml"
            || prefixes.contains(&prefix)
            || declared.iter().any(|(_, p)| p == prefix)
        {
            continue;
        }
        prefixes.push(prefix);
    }

    let mut start = BytesStart::new(name.qname.as_str());
    for prefix in prefixes {
        let uri = namespaces
            .iter()
            .rev()
            .find(|(p, _)| p == prefix)
            .map_or("", |(_, uri)| uri.as_str());
        let key = if prefix.is_empty() {
            "xmlns".to_owned()
        } else {
            format!("xmlns:{}", prefix)
        };
        start.push_attribute((key.as_str(), uri));
        declared.push((*depth, prefix.to_owned()));
    }
    for attribute in attributes {
        start.push_attribute((attribute.name.qname.as_str(), attribute.value.as_str()));
    }
    writer.write_event(Event::Start(start))?;
    *depth += 1;
    Ok(())
}

impl<'h, H: ArpHandler + ?Sized> XmlContentHandler for RdfXmlCore<'h, H> {
    fn start_document(&mut self) -> Result<(), ArpError> {
        self.on_start_document()?;
        self.checkpoint()
    }

    fn set_location(&mut self, line: u64, column: u64) {
        self.location.line = line;
        self.location.column = column;
    }

    fn start_prefix_mapping(&mut self, prefix: &str, uri: &str) -> Result<(), ArpError> {
        self.on_start_prefix_mapping(prefix, uri)?;
        self.checkpoint()
    }

    fn end_prefix_mapping(&mut self, prefix: &str) -> Result<(), ArpError> {
        self.on_end_prefix_mapping(prefix)?;
        self.checkpoint()
    }

    fn start_element(
        &mut self,
        name: &XmlName,
        attributes: &[XmlAttribute],
    ) -> Result<(), ArpError> {
        self.on_start_element(name, attributes)?;
        self.checkpoint()
    }

    fn end_element(&mut self, name: &XmlName) -> Result<(), ArpError> {
        self.on_end_element(name)?;
        self.checkpoint()
    }

    fn characters(&mut self, text: &str) -> Result<(), ArpError> {
        self.on_characters(text)?;
        self.checkpoint()
    }

    fn comment(&mut self, text: &str) -> Result<(), ArpError> {
        self.on_comment(text)
    }

    fn processing_instruction(&mut self, target: &str, data: &str) -> Result<(), ArpError> {
        self.on_processing_instruction(target, data)?;
        self.checkpoint()
    }

    fn report(&mut self, code: ErrorCode, message: &str) -> Result<(), ArpError> {
        RdfXmlCore::report(self, code, message)?;
        self.checkpoint()
    }
}
