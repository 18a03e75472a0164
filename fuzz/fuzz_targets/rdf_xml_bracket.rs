#![no_main]
use arp_api::handler::{ErrorHandler, ExtendedHandler, HandlerResult, NamespaceHandler, StatementHandler};
use arp_api::model::{AResource, ALiteral, BlankNode};
use arp_xml::RdfXmlParser;
use libfuzzer_sys::fuzz_target;
use std::collections::HashSet;

/// Checks the bracket and blank node scope guarantees hold on any input.
#[derive(Default)]
struct Checker {
    started: usize,
    ended: usize,
    retired: HashSet<BlankNode>,
    triples: usize,
}

impl Checker {
    fn check_live(&self, resource: &AResource) {
        if let AResource::Blank(node) = resource {
            assert!(!self.retired.contains(node), "{} used after its scope ended", node);
        }
    }
}

impl StatementHandler for Checker {
    fn statement(&mut self, s: &AResource, _: &AResource, o: &AResource) -> HandlerResult {
        self.check_live(s);
        self.check_live(o);
        self.triples += 1;
        Ok(())
    }

    fn literal_statement(&mut self, s: &AResource, _: &AResource, _: &ALiteral) -> HandlerResult {
        self.check_live(s);
        self.triples += 1;
        Ok(())
    }
}

impl NamespaceHandler for Checker {}

impl ExtendedHandler for Checker {
    fn start_rdf(&mut self) -> HandlerResult {
        self.started += 1;
        Ok(())
    }

    fn end_rdf(&mut self) -> HandlerResult {
        self.ended += 1;
        Ok(())
    }

    fn end_bnode_scope(&mut self, node: &BlankNode) -> HandlerResult {
        assert!(self.retired.insert(node.clone()), "{} retired twice", node);
        Ok(())
    }
}

impl ErrorHandler for Checker {}

fuzz_target!(|data: &[u8]| {
    let mut streamed = Checker::default();
    let streamed_result = RdfXmlParser::new().parse(data, &mut streamed);
    assert!(streamed.started <= 1);
    assert_eq!(streamed.ended, 1);

    let mut buffered = Checker::default();
    let buffered_result = RdfXmlParser::new().parse_buffered(data, &mut buffered);
    assert!(buffered.started <= 1);
    assert_eq!(buffered.ended, 1);
    if streamed_result.is_ok() && buffered_result.is_ok() {
        assert_eq!(streamed.triples, buffered.triples);
    }
});
