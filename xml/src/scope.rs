//! Blank node identity and lifetime, the RDF content bracket and the `rdf:ID` registry.

use arp_api::handler::{ExtendedHandler, HandlerError};
use arp_api::model::BlankNode;
use std::collections::HashSet;

/// Number of distinct `rdf:ID`s after which duplicates are no longer detected.
pub(crate) const ID_CHECK_LIMIT: usize = 10_000;

/// Tracks the blank nodes of one parse and tells the handler when they go out of scope.
///
/// Anonymous nodes are retired when the frame they are attached to closes.
/// `rdf:nodeID` nodes may be referenced anywhere in the document so they are retired at the end of the parse,
/// unless the handler asked to discard them, in which case they are not even remembered.
pub(crate) struct ScopeTracker {
    counter: u64,
    /// Anonymous nodes with the stack depth whose closing retires them, in creation order.
    pending: Vec<(usize, BlankNode)>,
    discard_node_ids: bool,
    node_ids: HashSet<BlankNode>,
    node_id_order: Vec<BlankNode>,
    started: bool,
    ended: bool,
}

impl ScopeTracker {
    pub fn new(discard_node_ids: bool) -> Self {
        Self {
            counter: 0,
            pending: Vec::new(),
            discard_node_ids,
            node_ids: HashSet::new(),
            node_id_order: Vec::new(),
            started: false,
            ended: false,
        }
    }

    /// A new anonymous node retired when the frame at `retire_depth` closes.
    pub fn fresh(&mut self, retire_depth: usize) -> BlankNode {
        self.counter += 1;
        let node = BlankNode::anonymous(self.counter);
        self.pending.push((retire_depth, node.clone()));
        node
    }

    /// The node named by an `rdf:nodeID`.
    pub fn node_id(&mut self, label: &str) -> BlankNode {
        let node = BlankNode::with_node_id(label);
        if !self.discard_node_ids && self.node_ids.insert(node.clone()) {
            self.node_id_order.push(node.clone());
        }
        node
    }

    /// Retires the anonymous nodes attached to the frames at `depth` and deeper.
    pub fn close_frame<H: ExtendedHandler + ?Sized>(
        &mut self,
        depth: usize,
        handler: &mut H,
    ) -> Result<(), HandlerError> {
        let mut result = Ok(());
        while let Some((retire_depth, _)) = self.pending.last() {
            if *retire_depth < depth {
                break;
            }
            if let Some((_, node)) = self.pending.pop() {
                let notified = handler.end_bnode_scope(&node);
                if result.is_ok() {
                    result = notified;
                }
            }
        }
        result
    }

    /// Retires every node still in scope.
    ///
    /// Every node is notified even if the handler fails, the first failure is returned.
    pub fn close_all<H: ExtendedHandler + ?Sized>(
        &mut self,
        handler: &mut H,
    ) -> Result<(), HandlerError> {
        let mut result = self.close_frame(0, handler);
        self.node_ids.clear();
        for node in self.node_id_order.drain(..) {
            let notified = handler.end_bnode_scope(&node);
            if result.is_ok() {
                result = notified;
            }
        }
        result
    }

    pub fn start_rdf<H: ExtendedHandler + ?Sized>(
        &mut self,
        handler: &mut H,
    ) -> Result<(), HandlerError> {
        if self.started {
            return Ok(());
        }
        self.started = true;
        handler.start_rdf()
    }

    pub fn end_rdf<H: ExtendedHandler + ?Sized>(
        &mut self,
        handler: &mut H,
    ) -> Result<(), HandlerError> {
        if self.ended {
            return Ok(());
        }
        self.ended = true;
        handler.end_rdf()
    }

    pub fn generated(&self) -> u64 {
        self.counter
    }
}

/// Outcome of registering an `rdf:ID`.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub(crate) enum IdCheck {
    Fresh,
    /// The resolved URI was already defined.
    Redefinition,
    /// The same name was used under another base.
    LegalReuse,
    /// The limit was just reached: this and later IDs are not checked.
    CheckDisabled,
    Unchecked,
}

#[derive(Default)]
pub(crate) struct IdRegistry {
    uris: HashSet<String>,
    names: HashSet<String>,
    disabled: bool,
}

impl IdRegistry {
    pub fn check_id(&mut self, name: &str, uri: &str) -> IdCheck {
        if self.disabled {
            return IdCheck::Unchecked;
        }
        if self.uris.len() >= ID_CHECK_LIMIT {
            self.disabled = true;
            self.uris = HashSet::new();
            self.names = HashSet::new();
            return IdCheck::CheckDisabled;
        }
        if !self.uris.insert(uri.to_owned()) {
            IdCheck::Redefinition
        } else if !self.names.insert(name.to_owned()) {
            IdCheck::LegalReuse
        } else {
            IdCheck::Fresh
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arp_api::handler::HandlerResult;
    use pretty_assertions::assert_eq;

    #[derive(Default)]
    struct Scopes {
        ended: Vec<String>,
        brackets: Vec<&'static str>,
        fail: bool,
    }

    impl ExtendedHandler for Scopes {
        fn start_rdf(&mut self) -> HandlerResult {
            self.brackets.push("start");
            Ok(())
        }

        fn end_rdf(&mut self) -> HandlerResult {
            self.brackets.push("end");
            Ok(())
        }

        fn end_bnode_scope(&mut self, node: &BlankNode) -> HandlerResult {
            self.ended.push(node.to_string());
            if self.fail {
                Err(HandlerError::new("sink is full"))
            } else {
                Ok(())
            }
        }
    }

    #[test]
    fn frames_retire_their_nodes() {
        let mut scopes = Scopes::default();
        let mut tracker = ScopeTracker::new(false);
        tracker.fresh(1);
        tracker.fresh(2);
        tracker.fresh(3);
        tracker.close_frame(3, &mut scopes).unwrap();
        assert_eq!(scopes.ended, vec!["_:A3"]);
        tracker.close_frame(2, &mut scopes).unwrap();
        tracker.close_frame(2, &mut scopes).unwrap();
        assert_eq!(scopes.ended, vec!["_:A3", "_:A2"]);
        tracker.close_all(&mut scopes).unwrap();
        assert_eq!(scopes.ended, vec!["_:A3", "_:A2", "_:A1"]);
        tracker.close_all(&mut scopes).unwrap();
        assert_eq!(scopes.ended.len(), 3);
    }

    #[test]
    fn node_ids_are_retired_at_the_end_unless_discarded() {
        let mut scopes = Scopes::default();
        let mut tracker = ScopeTracker::new(false);
        tracker.node_id("x");
        tracker.node_id("y");
        tracker.node_id("x");
        tracker.close_frame(0, &mut scopes).unwrap();
        assert!(scopes.ended.is_empty());
        tracker.close_all(&mut scopes).unwrap();
        assert_eq!(scopes.ended, vec!["_:Ux", "_:Uy"]);

        let mut scopes = Scopes::default();
        let mut tracker = ScopeTracker::new(true);
        tracker.node_id("x");
        tracker.close_all(&mut scopes).unwrap();
        assert!(scopes.ended.is_empty());
    }

    #[test]
    fn failing_handler_still_sees_every_node_once() {
        let mut scopes = Scopes {
            fail: true,
            ..Scopes::default()
        };
        let mut tracker = ScopeTracker::new(false);
        tracker.fresh(1);
        tracker.fresh(1);
        tracker.node_id("n");
        assert!(tracker.close_all(&mut scopes).is_err());
        assert_eq!(scopes.ended, vec!["_:A2", "_:A1", "_:Un"]);
        assert!(tracker.close_all(&mut scopes).is_ok());
        assert_eq!(scopes.ended.len(), 3);
    }

    #[test]
    fn bracket_fires_once() {
        let mut scopes = Scopes::default();
        let mut tracker = ScopeTracker::new(false);
        tracker.start_rdf(&mut scopes).unwrap();
        tracker.start_rdf(&mut scopes).unwrap();
        tracker.end_rdf(&mut scopes).unwrap();
        tracker.end_rdf(&mut scopes).unwrap();
        assert_eq!(scopes.brackets, vec!["start", "end"]);
    }

    #[test]
    fn id_registry() {
        let mut ids = IdRegistry::default();
        assert_eq!(ids.check_id("a", "http://ex.org/doc#a"), IdCheck::Fresh);
        assert_eq!(ids.check_id("a", "http://ex.org/doc#a"), IdCheck::Redefinition);
        assert_eq!(ids.check_id("a", "http://ex.org/other#a"), IdCheck::LegalReuse);
    }

    #[test]
    fn id_registry_gives_up_once() {
        let mut ids = IdRegistry::default();
        for i in 0..ID_CHECK_LIMIT {
            assert_eq!(
                ids.check_id(&format!("n{}", i), &format!("#n{}", i)),
                IdCheck::Fresh
            );
        }
        assert_eq!(ids.check_id("n0", "#n0"), IdCheck::CheckDisabled);
        assert_eq!(ids.check_id("n0", "#n0"), IdCheck::Unchecked);
    }
}
