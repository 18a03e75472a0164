//! Adapter from the parser callbacks to a downstream graph store.

use crate::condition::{ErrorCode, ParseCondition};
use crate::handler::{
    ErrorHandler, ExtendedHandler, HandlerResult, NamespaceHandler, Reaction, StatementHandler,
};
use crate::model::{AResource, ALiteral, BlankNode};
use std::collections::HashMap;

/// The problem levels of a [`GraphTarget`].
#[derive(Eq, PartialEq, Ord, PartialOrd, Debug, Clone, Copy, Hash)]
pub enum ProblemLevel {
    Warning,
    Error,
    Fatal,
}

/// The narrow interface of a graph store fed by a [`GraphSink`].
pub trait GraphTarget {
    /// The store's own node handle.
    type Node: Clone;

    fn uri_node(&mut self, uri: &str) -> Self::Node;

    /// A new blank node, distinct from every other.
    fn fresh_blank_node(&mut self) -> Self::Node;

    fn literal_node(&mut self, literal: &ALiteral) -> Self::Node;

    /// Adds a triple. Deduplication is the store's concern.
    fn add_triple(
        &mut self,
        subject: Self::Node,
        predicate: Self::Node,
        object: Self::Node,
    ) -> HandlerResult;

    fn set_prefix(&mut self, _prefix: &str, _uri: &str) {}

    /// A condition reported by the parser, with its original code.
    fn problem(&mut self, _level: ProblemLevel, _code: ErrorCode, _condition: &ParseCondition) {}
}

/// Feeds a [`GraphTarget`] from the parser.
///
/// Blank nodes are turned into store nodes once and memoised in a side table.
/// The entry of a node is dropped when its scope ends, so the table only holds nodes that may still be referenced.
pub struct GraphSink<G: GraphTarget> {
    target: G,
    blank_nodes: HashMap<BlankNode, G::Node>,
    discard_node_ids: bool,
}

impl<G: GraphTarget> GraphSink<G> {
    pub fn new(target: G) -> Self {
        Self {
            target,
            blank_nodes: HashMap::new(),
            discard_node_ids: false,
        }
    }

    /// Skips scope notifications for `rdf:nodeID` nodes.
    ///
    /// Their store nodes then stay in the side table until the sink is dropped.
    pub fn with_node_id_discard(mut self, discard: bool) -> Self {
        self.discard_node_ids = discard;
        self
    }

    pub fn target(&self) -> &G {
        &self.target
    }

    pub fn into_target(self) -> G {
        self.target
    }

    /// Number of blank nodes currently memoised.
    pub fn live_blank_nodes(&self) -> usize {
        self.blank_nodes.len()
    }

    fn node(&mut self, resource: &AResource) -> G::Node {
        match resource {
            AResource::Uri(uri) => self.target.uri_node(uri),
            AResource::Blank(node) => {
                let target = &mut self.target;
                self.blank_nodes
                    .entry(node.clone())
                    .or_insert_with(|| target.fresh_blank_node())
                    .clone()
            }
        }
    }

    fn forward(&mut self, level: ProblemLevel, condition: &ParseCondition) -> Reaction {
        self.target.problem(level, condition.code, condition);
        Reaction::Continue
    }
}

impl<G: GraphTarget> StatementHandler for GraphSink<G> {
    fn statement(
        &mut self,
        subject: &AResource,
        predicate: &AResource,
        object: &AResource,
    ) -> HandlerResult {
        let subject = self.node(subject);
        let predicate = self.node(predicate);
        let object = self.node(object);
        self.target.add_triple(subject, predicate, object)
    }

    fn literal_statement(
        &mut self,
        subject: &AResource,
        predicate: &AResource,
        object: &ALiteral,
    ) -> HandlerResult {
        let subject = self.node(subject);
        let predicate = self.node(predicate);
        let object = self.target.literal_node(object);
        self.target.add_triple(subject, predicate, object)
    }
}

impl<G: GraphTarget> NamespaceHandler for GraphSink<G> {
    fn start_prefix_mapping(&mut self, prefix: &str, uri: &str) -> HandlerResult {
        self.target.set_prefix(prefix, uri);
        Ok(())
    }
}

impl<G: GraphTarget> ExtendedHandler for GraphSink<G> {
    fn end_bnode_scope(&mut self, node: &BlankNode) -> HandlerResult {
        self.blank_nodes.remove(node);
        Ok(())
    }

    fn discard_nodes_with_node_id(&self) -> bool {
        self.discard_node_ids
    }
}

impl<G: GraphTarget> ErrorHandler for GraphSink<G> {
    fn warning(&mut self, condition: &ParseCondition) -> Reaction {
        self.forward(ProblemLevel::Warning, condition)
    }

    fn error(&mut self, condition: &ParseCondition) -> Reaction {
        self.forward(ProblemLevel::Error, condition)
    }

    fn fatal_error(&mut self, condition: &ParseCondition) -> Reaction {
        self.forward(ProblemLevel::Fatal, condition)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::condition::Location;
    use pretty_assertions::assert_eq;

    #[derive(Default)]
    struct Store {
        blank_count: usize,
        triples: Vec<(String, String, String)>,
        prefixes: Vec<(String, String)>,
        problems: Vec<(ProblemLevel, ErrorCode)>,
    }

    impl GraphTarget for Store {
        type Node = String;

        fn uri_node(&mut self, uri: &str) -> String {
            uri.to_owned()
        }

        fn fresh_blank_node(&mut self) -> String {
            self.blank_count += 1;
            format!("b{}", self.blank_count)
        }

        fn literal_node(&mut self, literal: &ALiteral) -> String {
            literal.to_string()
        }

        fn add_triple(&mut self, s: String, p: String, o: String) -> HandlerResult {
            self.triples.push((s, p, o));
            Ok(())
        }

        fn set_prefix(&mut self, prefix: &str, uri: &str) {
            self.prefixes.push((prefix.to_owned(), uri.to_owned()));
        }

        fn problem(&mut self, level: ProblemLevel, code: ErrorCode, _: &ParseCondition) {
            self.problems.push((level, code));
        }
    }

    #[test]
    fn blank_nodes_are_memoised_until_their_scope_ends() {
        let mut sink = GraphSink::new(Store::default());
        let node = AResource::Blank(BlankNode::anonymous(1));
        let p = AResource::uri("http://ex.org/p");
        sink.statement(&node, &p, &node).unwrap();
        sink.literal_statement(&node, &p, &ALiteral::plain("x", "")).unwrap();
        assert_eq!(sink.live_blank_nodes(), 1);
        sink.end_bnode_scope(&BlankNode::anonymous(1)).unwrap();
        assert_eq!(sink.live_blank_nodes(), 0);

        let store = sink.into_target();
        assert_eq!(store.blank_count, 1);
        assert_eq!(
            store.triples,
            vec![
                ("b1".into(), "http://ex.org/p".into(), "b1".into()),
                ("b1".into(), "http://ex.org/p".into(), "\"x\"".into()),
            ]
        );
    }

    #[test]
    fn conditions_keep_their_code() {
        let mut sink = GraphSink::new(Store::default());
        let condition = ParseCondition {
            code: ErrorCode::MalformedUri,
            message: "bad".into(),
            location: Location::default(),
        };
        assert_eq!(sink.warning(&condition), Reaction::Continue);
        sink.error(&condition);
        sink.start_prefix_mapping("ex", "http://ex.org/").unwrap();
        let store = sink.into_target();
        assert_eq!(
            store.problems,
            vec![
                (ProblemLevel::Warning, ErrorCode::MalformedUri),
                (ProblemLevel::Error, ErrorCode::MalformedUri)
            ]
        );
        assert_eq!(store.prefixes, vec![("ex".into(), "http://ex.org/".into())]);
    }
}
