//! The four ports through which the parser reports what it finds.
//!
//! A parse is driven with one value implementing all of them ([`ArpHandler`]).
//! Either implement the four traits on a single type, or compose independent
//! strategies with [`HandlerSet`].

use crate::condition::ParseCondition;
use crate::model::{AResource, ALiteral, BlankNode};
use std::error::Error;
use std::fmt;
use std::io;
use tracing::{error, warn};

/// A failure raised by a consumer while handling a parser callback.
///
/// It aborts the parse. The parser still closes the RDF content bracket before returning it.
pub struct HandlerError {
    inner: Box<dyn Error + Send + Sync + 'static>,
}

impl HandlerError {
    pub fn new(error: impl Into<Box<dyn Error + Send + Sync + 'static>>) -> Self {
        Self {
            inner: error.into(),
        }
    }

    pub fn into_inner(self) -> Box<dyn Error + Send + Sync + 'static> {
        self.inner
    }
}

impl fmt::Debug for HandlerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.inner.fmt(f)
    }
}

impl fmt::Display for HandlerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.inner.fmt(f)
    }
}

impl Error for HandlerError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        Some(self.inner.as_ref())
    }
}

impl From<io::Error> for HandlerError {
    fn from(error: io::Error) -> Self {
        Self::new(error)
    }
}

pub type HandlerResult = Result<(), HandlerError>;

/// Receives the triples.
pub trait StatementHandler {
    fn statement(
        &mut self,
        subject: &AResource,
        predicate: &AResource,
        object: &AResource,
    ) -> HandlerResult;

    fn literal_statement(
        &mut self,
        subject: &AResource,
        predicate: &AResource,
        object: &ALiteral,
    ) -> HandlerResult;
}

/// Receives the namespace declarations of the document.
///
/// Mappings are not guaranteed to be nested: a consumer building a prefix table may ignore `end_prefix_mapping`.
pub trait NamespaceHandler {
    fn start_prefix_mapping(&mut self, _prefix: &str, _uri: &str) -> HandlerResult {
        Ok(())
    }

    fn end_prefix_mapping(&mut self, _prefix: &str) -> HandlerResult {
        Ok(())
    }
}

/// Receives the RDF content bracket and the blank node scope notifications.
pub trait ExtendedHandler {
    /// Called at most once, when the RDF content starts.
    fn start_rdf(&mut self) -> HandlerResult {
        Ok(())
    }

    /// Called exactly once per parse, including aborted ones.
    fn end_rdf(&mut self) -> HandlerResult {
        Ok(())
    }

    /// Called exactly once for each blank node that cannot appear in any later triple.
    fn end_bnode_scope(&mut self, _node: &BlankNode) -> HandlerResult {
        Ok(())
    }

    /// If true, `end_bnode_scope` is not called for `rdf:nodeID` nodes.
    ///
    /// Queried once, at the start of the parse. Changing the answer during a parse has no effect.
    fn discard_nodes_with_node_id(&self) -> bool {
        true
    }
}

/// What the parser should do after a condition was reported.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash)]
pub enum Reaction {
    Continue,
    /// Abort the parse at the end of the current XML event with [`ParseCondition`] as the failure.
    Promote,
}

/// Receives the conditions whose configured severity is not `Ignore`.
///
/// The default methods log with [`tracing`] and never promote.
pub trait ErrorHandler {
    fn warning(&mut self, condition: &ParseCondition) -> Reaction {
        warn!(code = %condition.code, location = %condition.location, "{}", condition.message);
        Reaction::Continue
    }

    fn error(&mut self, condition: &ParseCondition) -> Reaction {
        error!(code = %condition.code, location = %condition.location, "{}", condition.message);
        Reaction::Continue
    }

    /// The parse is aborted after this call whatever is returned.
    fn fatal_error(&mut self, condition: &ParseCondition) -> Reaction {
        error!(code = %condition.code, location = %condition.location, "fatal: {}", condition.message);
        Reaction::Continue
    }
}

/// Everything the parser needs to report to.
pub trait ArpHandler: StatementHandler + NamespaceHandler + ExtendedHandler + ErrorHandler {}

impl<T: StatementHandler + NamespaceHandler + ExtendedHandler + ErrorHandler + ?Sized> ArpHandler
    for T
{
}

impl<T: StatementHandler + ?Sized> StatementHandler for &mut T {
    fn statement(
        &mut self,
        subject: &AResource,
        predicate: &AResource,
        object: &AResource,
    ) -> HandlerResult {
        (**self).statement(subject, predicate, object)
    }

    fn literal_statement(
        &mut self,
        subject: &AResource,
        predicate: &AResource,
        object: &ALiteral,
    ) -> HandlerResult {
        (**self).literal_statement(subject, predicate, object)
    }
}

impl<T: NamespaceHandler + ?Sized> NamespaceHandler for &mut T {
    fn start_prefix_mapping(&mut self, prefix: &str, uri: &str) -> HandlerResult {
        (**self).start_prefix_mapping(prefix, uri)
    }

    fn end_prefix_mapping(&mut self, prefix: &str) -> HandlerResult {
        (**self).end_prefix_mapping(prefix)
    }
}

impl<T: ExtendedHandler + ?Sized> ExtendedHandler for &mut T {
    fn start_rdf(&mut self) -> HandlerResult {
        (**self).start_rdf()
    }

    fn end_rdf(&mut self) -> HandlerResult {
        (**self).end_rdf()
    }

    fn end_bnode_scope(&mut self, node: &BlankNode) -> HandlerResult {
        (**self).end_bnode_scope(node)
    }

    fn discard_nodes_with_node_id(&self) -> bool {
        (**self).discard_nodes_with_node_id()
    }
}

impl<T: ErrorHandler + ?Sized> ErrorHandler for &mut T {
    fn warning(&mut self, condition: &ParseCondition) -> Reaction {
        (**self).warning(condition)
    }

    fn error(&mut self, condition: &ParseCondition) -> Reaction {
        (**self).error(condition)
    }

    fn fatal_error(&mut self, condition: &ParseCondition) -> Reaction {
        (**self).fatal_error(condition)
    }
}

/// A handler doing nothing, except logging conditions.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoHandler;

impl StatementHandler for NoHandler {
    fn statement(&mut self, _: &AResource, _: &AResource, _: &AResource) -> HandlerResult {
        Ok(())
    }

    fn literal_statement(&mut self, _: &AResource, _: &AResource, _: &ALiteral) -> HandlerResult {
        Ok(())
    }
}

impl NamespaceHandler for NoHandler {}

impl ExtendedHandler for NoHandler {}

impl ErrorHandler for NoHandler {}

/// Four independent strategies combined into one [`ArpHandler`].
///
/// ```
/// use arp_api::handler::{HandlerResult, HandlerSet, StatementHandler};
/// use arp_api::model::{AResource, ALiteral};
///
/// #[derive(Default)]
/// struct Count(usize);
///
/// impl StatementHandler for Count {
///     fn statement(&mut self, _: &AResource, _: &AResource, _: &AResource) -> HandlerResult {
///         self.0 += 1;
///         Ok(())
///     }
///
///     fn literal_statement(&mut self, _: &AResource, _: &AResource, _: &ALiteral) -> HandlerResult {
///         self.0 += 1;
///         Ok(())
///     }
/// }
///
/// let mut count = Count::default();
/// let handlers = HandlerSet::new().with_statement_handler(&mut count);
/// # drop(handlers);
/// ```
#[derive(Debug, Clone, Default)]
pub struct HandlerSet<S = NoHandler, N = NoHandler, X = NoHandler, E = NoHandler> {
    pub statements: S,
    pub namespaces: N,
    pub extended: X,
    pub errors: E,
}

impl HandlerSet {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<S, N, X, E> HandlerSet<S, N, X, E> {
    pub fn with_statement_handler<S2: StatementHandler>(self, statements: S2) -> HandlerSet<S2, N, X, E> {
        HandlerSet {
            statements,
            namespaces: self.namespaces,
            extended: self.extended,
            errors: self.errors,
        }
    }

    pub fn with_namespace_handler<N2: NamespaceHandler>(self, namespaces: N2) -> HandlerSet<S, N2, X, E> {
        HandlerSet {
            statements: self.statements,
            namespaces,
            extended: self.extended,
            errors: self.errors,
        }
    }

    pub fn with_extended_handler<X2: ExtendedHandler>(self, extended: X2) -> HandlerSet<S, N, X2, E> {
        HandlerSet {
            statements: self.statements,
            namespaces: self.namespaces,
            extended,
            errors: self.errors,
        }
    }

    pub fn with_error_handler<E2: ErrorHandler>(self, errors: E2) -> HandlerSet<S, N, X, E2> {
        HandlerSet {
            statements: self.statements,
            namespaces: self.namespaces,
            extended: self.extended,
            errors,
        }
    }
}

impl<S: StatementHandler, N, X, E> StatementHandler for HandlerSet<S, N, X, E> {
    fn statement(
        &mut self,
        subject: &AResource,
        predicate: &AResource,
        object: &AResource,
    ) -> HandlerResult {
        self.statements.statement(subject, predicate, object)
    }

    fn literal_statement(
        &mut self,
        subject: &AResource,
        predicate: &AResource,
        object: &ALiteral,
    ) -> HandlerResult {
        self.statements.literal_statement(subject, predicate, object)
    }
}

impl<S, N: NamespaceHandler, X, E> NamespaceHandler for HandlerSet<S, N, X, E> {
    fn start_prefix_mapping(&mut self, prefix: &str, uri: &str) -> HandlerResult {
        self.namespaces.start_prefix_mapping(prefix, uri)
    }

    fn end_prefix_mapping(&mut self, prefix: &str) -> HandlerResult {
        self.namespaces.end_prefix_mapping(prefix)
    }
}

impl<S, N, X: ExtendedHandler, E> ExtendedHandler for HandlerSet<S, N, X, E> {
    fn start_rdf(&mut self) -> HandlerResult {
        self.extended.start_rdf()
    }

    fn end_rdf(&mut self) -> HandlerResult {
        self.extended.end_rdf()
    }

    fn end_bnode_scope(&mut self, node: &BlankNode) -> HandlerResult {
        self.extended.end_bnode_scope(node)
    }

    fn discard_nodes_with_node_id(&self) -> bool {
        self.extended.discard_nodes_with_node_id()
    }
}

impl<S, N, X, E: ErrorHandler> ErrorHandler for HandlerSet<S, N, X, E> {
    fn warning(&mut self, condition: &ParseCondition) -> Reaction {
        self.errors.warning(condition)
    }

    fn error(&mut self, condition: &ParseCondition) -> Reaction {
        self.errors.error(condition)
    }

    fn fatal_error(&mut self, condition: &ParseCondition) -> Reaction {
        self.errors.fatal_error(condition)
    }
}
