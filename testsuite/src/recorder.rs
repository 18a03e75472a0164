//! A handler remembering every callback of a parse.

use crate::model::{OwnedGraph, OwnedTriple};
use arp_api::condition::{ErrorCode, ParseCondition, Severity};
use arp_api::handler::{
    ErrorHandler, ExtendedHandler, HandlerResult, NamespaceHandler, Reaction, StatementHandler,
};
use arp_api::model::{AResource, ALiteral, BlankNode};

/// A callback other than a triple or a condition.
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum RecordedEvent {
    StartRdf,
    EndRdf,
    EndBNodeScope(BlankNode),
    StartPrefixMapping { prefix: String, uri: String },
    EndPrefixMapping { prefix: String },
}

/// Records triples in emission order, conditions with the severity they were reported with, and the other events.
#[derive(Debug, Clone, Default)]
pub struct Recorder {
    pub triples: Vec<OwnedTriple>,
    pub conditions: Vec<(Severity, ParseCondition)>,
    pub events: Vec<RecordedEvent>,
    /// Conditions with these codes are promoted to a fatal failure.
    pub promoted: Vec<ErrorCode>,
    /// Answer of [`ExtendedHandler::discard_nodes_with_node_id`].
    pub discard_node_ids: bool,
}

impl Recorder {
    pub fn new() -> Self {
        Self {
            discard_node_ids: true,
            ..Self::default()
        }
    }

    pub fn promoting(mut self, code: ErrorCode) -> Self {
        self.promoted.push(code);
        self
    }

    pub fn with_node_id_scopes(mut self) -> Self {
        self.discard_node_ids = false;
        self
    }

    pub fn graph(&self) -> OwnedGraph {
        self.triples.iter().cloned().collect()
    }

    /// The codes reported with the given severity, in report order.
    pub fn codes(&self, severity: Severity) -> Vec<ErrorCode> {
        self.conditions
            .iter()
            .filter(|(s, _)| *s == severity)
            .map(|(_, c)| c.code)
            .collect()
    }

    /// Every reported code, whatever its severity.
    pub fn all_codes(&self) -> Vec<ErrorCode> {
        self.conditions.iter().map(|(_, c)| c.code).collect()
    }

    pub fn has_errors(&self) -> bool {
        self.conditions.iter().any(|(s, _)| *s >= Severity::Error)
    }

    pub fn scope_ends(&self) -> Vec<&BlankNode> {
        self.events
            .iter()
            .filter_map(|e| match e {
                RecordedEvent::EndBNodeScope(node) => Some(node),
                _ => None,
            })
            .collect()
    }

    pub fn count(&self, event: &RecordedEvent) -> usize {
        self.events.iter().filter(|e| *e == event).count()
    }

    fn record(&mut self, severity: Severity, condition: &ParseCondition) -> Reaction {
        self.conditions.push((severity, condition.clone()));
        if self.promoted.contains(&condition.code) {
            Reaction::Promote
        } else {
            Reaction::Continue
        }
    }
}

impl StatementHandler for Recorder {
    fn statement(
        &mut self,
        subject: &AResource,
        predicate: &AResource,
        object: &AResource,
    ) -> HandlerResult {
        self.triples.push(OwnedTriple::new(subject, predicate, object));
        Ok(())
    }

    fn literal_statement(
        &mut self,
        subject: &AResource,
        predicate: &AResource,
        object: &ALiteral,
    ) -> HandlerResult {
        self.triples.push(OwnedTriple::new(subject, predicate, object));
        Ok(())
    }
}

impl NamespaceHandler for Recorder {
    fn start_prefix_mapping(&mut self, prefix: &str, uri: &str) -> HandlerResult {
        self.events.push(RecordedEvent::StartPrefixMapping {
            prefix: prefix.to_owned(),
            uri: uri.to_owned(),
        });
        Ok(())
    }

    fn end_prefix_mapping(&mut self, prefix: &str) -> HandlerResult {
        self.events.push(RecordedEvent::EndPrefixMapping {
            prefix: prefix.to_owned(),
        });
        Ok(())
    }
}

impl ExtendedHandler for Recorder {
    fn start_rdf(&mut self) -> HandlerResult {
        self.events.push(RecordedEvent::StartRdf);
        Ok(())
    }

    fn end_rdf(&mut self) -> HandlerResult {
        self.events.push(RecordedEvent::EndRdf);
        Ok(())
    }

    fn end_bnode_scope(&mut self, node: &BlankNode) -> HandlerResult {
        self.events.push(RecordedEvent::EndBNodeScope(node.clone()));
        Ok(())
    }

    fn discard_nodes_with_node_id(&self) -> bool {
        self.discard_node_ids
    }
}

impl ErrorHandler for Recorder {
    fn warning(&mut self, condition: &ParseCondition) -> Reaction {
        self.record(Severity::Warning, condition)
    }

    fn error(&mut self, condition: &ParseCondition) -> Reaction {
        self.record(Severity::Error, condition)
    }

    fn fatal_error(&mut self, condition: &ParseCondition) -> Reaction {
        self.record(Severity::Fatal, condition)
    }
}
