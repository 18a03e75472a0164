use arp_api::condition::{ErrorCode, Severity};
use arp_api::handler::{HandlerError, HandlerResult, HandlerSet, StatementHandler};
use arp_api::model::{AResource, ALiteral, BlankNode, RDF_XML_LITERAL};
use arp_testsuite::model::*;
use arp_testsuite::recorder::{RecordedEvent, Recorder};
use arp_xml::{ArpError, ErrorModes, ParserOptions, RdfXmlParser};
use pretty_assertions::assert_eq;
use std::collections::HashSet;

const RDF: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#";
const EX: &str = "http://ex.org/";

fn document(body: &str) -> String {
    format!(
        "<?xml version=\"1.0\"?>\n<rdf:RDF xmlns:rdf=\"{}\" xmlns:ex=\"{}\">\n{}\n</rdf:RDF>\n",
        RDF, EX, body
    )
}

fn parse_with(
    parser: &RdfXmlParser,
    data: &str,
    mut recorder: Recorder,
) -> (Recorder, Result<(), ArpError>) {
    let result = parser.parse(data.as_bytes(), &mut recorder);
    (recorder, result)
}

fn parse(data: &str) -> (Recorder, Result<(), ArpError>) {
    parse_with(
        &RdfXmlParser::new().with_base_uri("http://ex.org/doc"),
        data,
        Recorder::new(),
    )
}

fn strict() -> RdfXmlParser {
    RdfXmlParser::new()
        .with_base_uri("http://ex.org/doc")
        .with_options(ParserOptions {
            error_modes: ErrorModes::strict(),
            ..ParserOptions::default()
        })
}

fn named(iri: &str) -> OwnedNamedNode {
    OwnedNamedNode::new(iri)
}

fn ex(local_name: &str) -> OwnedNamedNode {
    named(&format!("{}{}", EX, local_name))
}

fn rdf(local_name: &str) -> OwnedNamedNode {
    named(&format!("{}{}", RDF, local_name))
}

fn blank(id: &str) -> OwnedBlankNode {
    OwnedBlankNode::new(id)
}

fn plain(value: &str) -> OwnedLiteral {
    OwnedLiteral::Simple {
        value: value.to_owned(),
    }
}

fn blank_nodes(triples: &[OwnedTriple]) -> HashSet<OwnedBlankNode> {
    let mut nodes = HashSet::new();
    for t in triples {
        if let OwnedNamedOrBlankNode::BlankNode(node) = &t.subject {
            nodes.insert(node.clone());
        }
        if let OwnedTerm::BlankNode(node) = &t.object {
            nodes.insert(node.clone());
        }
    }
    nodes
}

#[test]
fn scenario_absolute_uris_with_empty_base() {
    let data = document(
        r#"<rdf:Description rdf:about="http://ex.org/a"><ex:name>Ann</ex:name></rdf:Description>"#,
    );
    let (recorder, result) = parse_with(&RdfXmlParser::new().with_base_uri(""), &data, Recorder::new());
    result.unwrap();
    assert_eq!(
        recorder.triples,
        vec![OwnedTriple::new(ex("a"), ex("name"), plain("Ann"))]
    );
    assert!(recorder.conditions.is_empty());
}

#[test]
fn scenario_id_against_document_base() {
    let data = document(r#"<rdf:Description rdf:ID="a"><ex:name>Ann</ex:name></rdf:Description>"#);
    let (recorder, result) = parse(&data);
    result.unwrap();
    assert_eq!(
        recorder.triples,
        vec![OwnedTriple::new(named("http://ex.org/doc#a"), ex("name"), plain("Ann"))]
    );
}

#[test]
fn scenario_unqualified_attribute() {
    let data = document(r#"<ex:Thing rdf:about="http://ex.org/s" foo="bar"/>"#);
    let foo = OwnedTriple::new(ex("s"), ex("foo"), plain("bar"));

    let (recorder, result) = parse(&data);
    result.unwrap();
    assert!(recorder.triples.contains(&foo));
    assert_eq!(
        recorder.codes(Severity::Warning),
        vec![ErrorCode::UnqualifiedAttribute]
    );
    assert!(recorder.codes(Severity::Error).is_empty());

    let (recorder, result) = parse_with(&strict(), &data, Recorder::new());
    result.unwrap();
    assert!(!recorder.triples.contains(&foo));
    assert_eq!(
        recorder.triples,
        vec![OwnedTriple::new(ex("s"), rdf("type"), ex("Thing"))]
    );
    assert_eq!(
        recorder.codes(Severity::Error),
        vec![ErrorCode::UnqualifiedAttribute]
    );
    assert!(recorder.codes(Severity::Warning).is_empty());
}

#[test]
fn language_tags_are_kept_verbatim() {
    for tag in ["en", "en-US", "EN-gb", "de-CH-1996", "zh-Hant-TW", "x-klingon"] {
        let data = document(&format!(
            r#"<rdf:Description rdf:about="http://ex.org/s" xml:lang="{}"><ex:p>v</ex:p></rdf:Description>"#,
            tag
        ));
        let (recorder, result) = parse(&data);
        result.unwrap();
        assert!(!recorder.has_errors(), "{} raised errors", tag);
        assert_eq!(
            recorder.triples,
            vec![OwnedTriple::new(
                ex("s"),
                ex("p"),
                OwnedLiteral::LanguageTaggedString {
                    value: "v".to_owned(),
                    language: tag.to_owned()
                }
            )]
        );
    }
}

#[test]
fn identity_attributes_are_mutually_exclusive() {
    let data = document(
        r#"<rdf:Description rdf:about="http://ex.org/a" rdf:ID="b" rdf:nodeID="c" ex:p="1"><ex:q>2</ex:q></rdf:Description>"#,
    );
    let (recorder, result) = parse(&data);
    result.unwrap();
    assert_eq!(recorder.codes(Severity::Error), vec![ErrorCode::SyntaxError]);
    assert_eq!(
        recorder.triples,
        vec![
            OwnedTriple::new(ex("a"), ex("p"), plain("1")),
            OwnedTriple::new(ex("a"), ex("q"), plain("2")),
        ]
    );

    // the first attribute of the element wins
    let data = document(r#"<rdf:Description rdf:ID="b" rdf:about="http://ex.org/a" ex:p="1"/>"#);
    let (recorder, result) = parse(&data);
    result.unwrap();
    assert_eq!(recorder.codes(Severity::Error), vec![ErrorCode::SyntaxError]);
    assert_eq!(
        recorder.triples,
        vec![OwnedTriple::new(named("http://ex.org/doc#b"), ex("p"), plain("1"))]
    );
}

#[test]
fn each_anonymous_node_scope_ends_once() {
    let data = document(
        r#"<rdf:Description>
  <ex:p ex:q="attribute object"/>
  <ex:r rdf:parseType="Resource"><ex:s>nested</ex:s></ex:r>
  <ex:list rdf:parseType="Collection">
    <rdf:Description/>
    <ex:Item><ex:t><rdf:Description ex:u="deep"/></ex:t></ex:Item>
  </ex:list>
</rdf:Description>
<ex:Other/>"#,
    );
    let (recorder, result) = parse(&data);
    result.unwrap();

    let nodes = blank_nodes(&recorder.triples);
    let ended: Vec<OwnedBlankNode> = recorder.scope_ends().into_iter().map(OwnedBlankNode::from).collect();
    let unique: HashSet<OwnedBlankNode> = ended.iter().cloned().collect();
    assert_eq!(ended.len(), unique.len(), "a scope ended twice: {:?}", ended);
    // the rdf:Description in the list has no triple of its own but is still a list item
    assert_eq!(unique, nodes);
    assert_eq!(recorder.events.last(), Some(&RecordedEvent::EndRdf));
}

#[test]
fn scopes_end_before_later_blank_nodes_appear() {
    let data = document(
        r#"<rdf:Description rdf:about="http://ex.org/s"><ex:p><rdf:Description ex:v="1"/></ex:p></rdf:Description>
<rdf:Description rdf:about="http://ex.org/s"><ex:p><rdf:Description ex:v="2"/></ex:p></rdf:Description>"#,
    );
    let (recorder, result) = parse(&data);
    result.unwrap();
    assert_eq!(
        recorder.scope_ends(),
        vec![&BlankNode::anonymous(1), &BlankNode::anonymous(2)]
    );
}

#[test]
fn node_id_scopes_end_with_the_document_if_requested() {
    let data = document(
        r#"<rdf:Description rdf:nodeID="x"><ex:p rdf:nodeID="y"/></rdf:Description>
<rdf:Description rdf:nodeID="y" ex:v="1"/>"#,
    );
    let (recorder, result) = parse(&data);
    result.unwrap();
    assert!(recorder.scope_ends().is_empty());

    let (recorder, result) = parse_with(
        &RdfXmlParser::new(),
        &data,
        Recorder::new().with_node_id_scopes(),
    );
    result.unwrap();
    assert_eq!(
        recorder.scope_ends(),
        vec![&BlankNode::with_node_id("x"), &BlankNode::with_node_id("y")]
    );
    let end = recorder.events.len();
    assert_eq!(recorder.events[end - 1], RecordedEvent::EndRdf);
}

#[test]
fn rdf_bracket_is_closed_on_fatal_errors() {
    let data = format!(
        "<rdf:RDF xmlns:rdf=\"{}\" xmlns:ex=\"{}\"><rdf:Description><ex:p><ex:Thing/></ex:p></rdf:RDF>",
        RDF, EX
    );
    let (recorder, result) = parse(&data);
    assert!(result.is_err());
    assert_eq!(recorder.count(&RecordedEvent::StartRdf), 1);
    assert_eq!(recorder.count(&RecordedEvent::EndRdf), 1);
    assert_eq!(recorder.events.last(), Some(&RecordedEvent::EndRdf));
    assert_eq!(recorder.codes(Severity::Fatal), vec![ErrorCode::XmlFatal]);
    // the blank nodes opened before the failure are still retired
    assert_eq!(
        recorder.scope_ends(),
        vec![&BlankNode::anonymous(2), &BlankNode::anonymous(1)]
    );
}

#[test]
fn rdf_bracket_without_rdf_content() {
    let parser = RdfXmlParser::new().with_options(ParserOptions {
        embedding: true,
        ..ParserOptions::default()
    });
    let (recorder, result) = parse_with(&parser, "<html><body>nothing</body></html>", Recorder::new());
    result.unwrap();
    assert_eq!(recorder.count(&RecordedEvent::StartRdf), 0);
    assert_eq!(recorder.count(&RecordedEvent::EndRdf), 1);
}

struct FailingStatements;

impl StatementHandler for FailingStatements {
    fn statement(&mut self, _: &AResource, _: &AResource, _: &AResource) -> HandlerResult {
        Err(HandlerError::new("store is full"))
    }

    fn literal_statement(&mut self, _: &AResource, _: &AResource, _: &ALiteral) -> HandlerResult {
        Err(HandlerError::new("store is full"))
    }
}

#[test]
fn handler_failures_abort_and_close_the_bracket() {
    let data = document(r#"<rdf:Description rdf:about="http://ex.org/s" ex:p="1"/>"#);
    let mut recorder = Recorder::new();
    let mut handler = HandlerSet::new()
        .with_statement_handler(FailingStatements)
        .with_extended_handler(&mut recorder)
        .with_error_handler(Recorder::new());
    let result = RdfXmlParser::new().parse(data.as_bytes(), &mut handler);
    assert!(matches!(result, Err(ArpError::Handler(_))));
    drop(handler);
    assert_eq!(
        recorder.events,
        vec![RecordedEvent::StartRdf, RecordedEvent::EndRdf]
    );
}

#[test]
fn promoted_conditions_abort_the_parse() {
    let data = document(
        r#"<ex:Thing rdf:about="http://ex.org/s" foo="bar"/>
<rdf:Description rdf:about="http://ex.org/t" ex:p="never"/>"#,
    );
    let (recorder, result) = parse_with(
        &RdfXmlParser::new(),
        &data,
        Recorder::new().promoting(ErrorCode::UnqualifiedAttribute),
    );
    match result {
        Err(ArpError::Promoted(condition)) => {
            assert_eq!(condition.code, ErrorCode::UnqualifiedAttribute)
        }
        other => panic!("unexpected outcome {:?}", other),
    }
    assert!(recorder
        .triples
        .iter()
        .all(|t| t.subject != OwnedNamedOrBlankNode::NamedNode(ex("t"))));
    assert_eq!(recorder.count(&RecordedEvent::EndRdf), 1);
}

#[test]
fn presets_do_not_change_xml_errors() {
    let data = format!(
        "<rdf:RDF xmlns:rdf=\"{}\" xmlns:ex=\"{}\"><rdf:Description rdf:about=\"s\" foo=\"bar\"><ex:p>1</ex:q></rdf:Description></rdf:RDF>",
        RDF, EX
    );
    let xml_codes = |recorder: &Recorder| -> Vec<ErrorCode> {
        recorder
            .all_codes()
            .into_iter()
            .filter(|c| matches!(c, ErrorCode::XmlFatal | ErrorCode::XmlError | ErrorCode::XmlWarning))
            .collect()
    };
    let lax = RdfXmlParser::new().with_options(ParserOptions {
        error_modes: ErrorModes::lax(),
        ..ParserOptions::default()
    });
    let (lax_recorder, lax_result) = parse_with(&lax, &data, Recorder::new());
    let (strict_recorder, strict_result) = parse_with(&strict(), &data, Recorder::new());
    assert!(lax_result.is_err() && strict_result.is_err());
    assert_eq!(xml_codes(&lax_recorder), vec![ErrorCode::XmlFatal]);
    assert_eq!(xml_codes(&lax_recorder), xml_codes(&strict_recorder));
    assert!(!lax_recorder.all_codes().contains(&ErrorCode::UnqualifiedAttribute));
    assert!(strict_recorder.all_codes().contains(&ErrorCode::UnqualifiedAttribute));
}

#[test]
fn collections_build_lists() {
    let data = document(
        r#"<rdf:Description rdf:about="http://ex.org/s"><ex:p rdf:parseType="Collection"><rdf:Description rdf:about="http://ex.org/a"/><rdf:Description rdf:about="http://ex.org/b"/></ex:p></rdf:Description>"#,
    );
    let (recorder, result) = parse(&data);
    result.unwrap();
    assert_eq!(
        recorder.triples,
        vec![
            OwnedTriple::new(blank("A1"), rdf("first"), ex("a")),
            OwnedTriple::new(blank("A1"), rdf("rest"), blank("A2")),
            OwnedTriple::new(blank("A2"), rdf("first"), ex("b")),
            OwnedTriple::new(blank("A2"), rdf("rest"), rdf("nil")),
            OwnedTriple::new(ex("s"), ex("p"), blank("A1")),
        ]
    );
}

#[test]
fn list_items_are_numbered_in_document_order() {
    let data = document(
        r#"<rdf:Bag rdf:about="http://ex.org/bag">
  <rdf:li>a</rdf:li>
  <ex:other>x</ex:other>
  <rdf:li>b</rdf:li>
  <ex:other>y</ex:other>
  <ex:other>z</ex:other>
  <rdf:li>c</rdf:li>
</rdf:Bag>"#,
    );
    let (recorder, result) = parse(&data);
    result.unwrap();
    let members: Vec<(String, String)> = recorder
        .triples
        .iter()
        .filter(|t| t.predicate.iri.starts_with(&format!("{}_", RDF)))
        .map(|t| (t.predicate.iri[RDF.len()..].to_owned(), t.object.to_string()))
        .collect();
    assert_eq!(
        members,
        vec![
            ("_1".to_owned(), "\"a\"".to_owned()),
            ("_2".to_owned(), "\"b\"".to_owned()),
            ("_3".to_owned(), "\"c\"".to_owned()),
        ]
    );
}

#[test]
fn xml_literals_keep_their_markup() {
    let data = document(
        r#"<rdf:Description rdf:about="http://ex.org/s"><ex:p rdf:parseType="Literal"><b xmlns="http://www.w3.org/1999/xhtml">bold</b> and <ex:q>v</ex:q></ex:p></rdf:Description>"#,
    );
    let (recorder, result) = parse(&data);
    result.unwrap();
    assert_eq!(
        recorder.triples,
        vec![OwnedTriple::new(
            ex("s"),
            ex("p"),
            OwnedLiteral::Typed {
                value: "<b xmlns=\"http://www.w3.org/1999/xhtml\">bold</b> and <ex:q xmlns:ex=\"http://ex.org/\">v</ex:q>".to_owned(),
                datatype: named(RDF_XML_LITERAL),
            }
        )]
    );
}

#[test]
fn unknown_parse_types_are_read_as_literals_unless_strict() {
    let data = document(
        r#"<rdf:Description rdf:about="http://ex.org/s"><ex:p rdf:parseType="Other">text</ex:p></rdf:Description>"#,
    );
    let (recorder, result) = parse(&data);
    result.unwrap();
    assert_eq!(recorder.codes(Severity::Warning), vec![ErrorCode::UnknownParseType]);
    assert_eq!(recorder.triples.len(), 1);

    let (recorder, result) = parse_with(&strict(), &data, Recorder::new());
    result.unwrap();
    assert_eq!(recorder.codes(Severity::Error), vec![ErrorCode::UnknownParseType]);
    assert!(recorder.triples.is_empty());
}

#[test]
fn embedded_rdf_is_found_anywhere() {
    let data = format!(
        "<html><head><rdf:RDF xmlns:rdf=\"{}\" xmlns:ex=\"{}\"><rdf:Description rdf:about=\"http://ex.org/s\" ex:p=\"1\"/></rdf:RDF></head></html>",
        RDF, EX
    );
    let parser = RdfXmlParser::new().with_options(ParserOptions {
        embedding: true,
        ..ParserOptions::default()
    });
    let (recorder, result) = parse_with(&parser, &data, Recorder::new());
    result.unwrap();
    assert_eq!(
        recorder.triples,
        vec![OwnedTriple::new(ex("s"), ex("p"), plain("1"))]
    );
}

#[test]
fn streaming_and_buffered_parses_agree() {
    let data = document(
        r#"<rdf:Description rdf:about="s" xml:lang="en" foo="bar">
  <ex:p rdf:parseType="Resource"><ex:q rdf:resource="http://ex.org/o"/></ex:p>
  <ex:r rdf:parseType="Literal"><ex:b>x</ex:b></ex:r>
  <ex:l rdf:parseType="Collection"><rdf:Description rdf:about="a"/></ex:l>
  <?ignored pi?>
</rdf:Description>"#,
    );
    let parser = RdfXmlParser::new().with_base_uri("http://ex.org/doc");

    let mut streamed = Recorder::new();
    parser.parse(data.as_bytes(), &mut streamed).unwrap();
    let mut buffered = Recorder::new();
    parser.parse_buffered(data.as_bytes(), &mut buffered).unwrap();

    assert_eq!(streamed.triples, buffered.triples);
    assert_eq!(streamed.all_codes(), buffered.all_codes());
    assert_eq!(streamed.events, buffered.events);
    assert_eq!(
        streamed.all_codes(),
        vec![
            ErrorCode::UnqualifiedAttribute,
            ErrorCode::ProcessingInstructionInRdf
        ]
    );
}

#[test]
fn buffered_parses_emit_nothing_for_broken_documents() {
    let data = document(r#"<rdf:Description rdf:about="http://ex.org/s" ex:p="1"/><ex:open>"#);
    let mut recorder = Recorder::new();
    let result = RdfXmlParser::new().parse_buffered(data.as_bytes(), &mut recorder);
    assert!(result.is_err());
    assert!(recorder.triples.is_empty());
    assert_eq!(recorder.codes(Severity::Fatal), vec![ErrorCode::XmlFatal]);
    assert_eq!(recorder.count(&RecordedEvent::EndRdf), 1);
}
