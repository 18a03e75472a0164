//! Runs the parser on fixture files and compares with their expectations.
//!
//! A fixture is a `name.rdf` document next to either:
//! * `name.nt`: the expected graph. The document must parse without error, both streamed and
//!   buffered, to a graph isomorphic to this one.
//! * `name.err`: one condition name per line (e.g. `WARN_MALFORMED_URI`) that must be reported.
//!   Lines starting with `@` are parser properties (`@error-mode strict`) applied before parsing.
//!   Empty lines and lines starting with `#` are ignored.
//!
//! Fixtures are parsed with the base URI [`FIXTURE_BASE`] followed by their file name.

use crate::isomorphism::are_graphs_isomorphic;
use crate::model::{OwnedGraph, OwnedNamedOrBlankNode, OwnedTerm, OwnedTriple};
use crate::recorder::{RecordedEvent, Recorder};
use crate::report::{TestOutcome, TestResult};
use arp_api::condition::ErrorCode;
use arp_xml::{ArpError, ParserOptions, RdfXmlParser};
use rio_api::model::{Subject, Term, Triple};
use rio_api::parser::TriplesParser;
use rio_turtle::NTriplesParser;
use std::error::Error;
use std::ffi::OsStr;
use std::fmt;
use std::fs::{self, File};
use std::io;
use std::io::BufReader;
use std::path::Path;

pub const FIXTURE_BASE: &str = "http://example.org/fixtures/";

/// Evaluates every fixture of a directory, in file name order.
pub fn evaluate_fixtures(dir: &Path) -> Result<Vec<TestResult>, Box<dyn Error>> {
    let mut inputs = Vec::new();
    for entry in
        fs::read_dir(dir).map_err(|e| TestEvaluationError::Io(dir.display().to_string(), e))?
    {
        let path = entry?.path();
        if path.extension() == Some(OsStr::new("rdf")) {
            inputs.push(path);
        }
    }
    inputs.sort();
    inputs.iter().map(|input| evaluate_fixture(input)).collect()
}

pub fn evaluate_fixture(input: &Path) -> Result<TestResult, Box<dyn Error>> {
    let name = input
        .file_name()
        .and_then(OsStr::to_str)
        .ok_or_else(|| TestEvaluationError::InvalidFileName(input.display().to_string()))?
        .to_owned();
    let expected_graph = input.with_extension("nt");
    let expected_conditions = input.with_extension("err");
    let outcome = if expected_graph.exists() {
        let expected = read_expected_graph(&expected_graph)?;
        evaluate_positive(input, &name, &expected)?
    } else if expected_conditions.exists() {
        let (options, codes) = read_expected_conditions(&read_to_string(&expected_conditions)?)?;
        evaluate_negative(input, &name, options, &codes)?
    } else {
        return Err(Box::new(TestEvaluationError::MissingExpectation(name)));
    };
    Ok(TestResult {
        test: name,
        outcome,
    })
}

/// Parses a fixture and records everything the parser reported.
pub fn parse_fixture(
    input: &Path,
    name: &str,
    options: ParserOptions,
    buffered: bool,
) -> Result<(Recorder, Result<(), ArpError>), Box<dyn Error>> {
    let read = BufReader::new(
        File::open(input).map_err(|e| TestEvaluationError::Io(input.display().to_string(), e))?,
    );
    let parser = RdfXmlParser::new()
        .with_options(options)
        .with_base_uri(format!("{}{}", FIXTURE_BASE, name))
        .with_system_id(name);
    let mut recorder = Recorder::new();
    let result = if buffered {
        parser.parse_buffered(read, &mut recorder)
    } else {
        parser.parse(read, &mut recorder)
    };
    Ok((recorder, result))
}

fn evaluate_positive(
    input: &Path,
    name: &str,
    expected: &OwnedGraph,
) -> Result<TestOutcome, Box<dyn Error>> {
    for buffered in [false, true] {
        let mode = if buffered { "buffered" } else { "streaming" };
        let (recorder, result) = parse_fixture(input, name, ParserOptions::default(), buffered)?;
        if let Err(e) = result {
            return Ok(failed(format!("{} parse failed: {}", mode, e)));
        }
        if recorder.has_errors() {
            return Ok(failed(format!(
                "{} parse reported errors: {:?}",
                mode,
                recorder.all_codes()
            )));
        }
        if recorder.count(&RecordedEvent::EndRdf) != 1 {
            return Ok(failed(format!("{} parse did not end the RDF content once", mode)));
        }
        let actual = recorder.graph();
        if !are_graphs_isomorphic(expected, &actual) {
            return Ok(failed(format!(
                "{} parse is not isomorphic to the expected graph. Expected:\n{}\nActual:\n{}",
                mode, expected, actual
            )));
        }
    }
    Ok(TestOutcome::Passed)
}

fn evaluate_negative(
    input: &Path,
    name: &str,
    options: ParserOptions,
    codes: &[ErrorCode],
) -> Result<TestOutcome, Box<dyn Error>> {
    let (recorder, _) = parse_fixture(input, name, options, false)?;
    let reported = recorder.all_codes();
    let missing: Vec<_> = codes.iter().filter(|c| !reported.contains(c)).collect();
    Ok(if missing.is_empty() {
        TestOutcome::Passed
    } else {
        failed(format!(
            "conditions {:?} were not reported, got {:?}",
            missing, reported
        ))
    })
}

fn read_expected_graph(path: &Path) -> Result<OwnedGraph, Box<dyn Error>> {
    let read = BufReader::new(
        File::open(path).map_err(|e| TestEvaluationError::Io(path.display().to_string(), e))?,
    );
    let mut graph = OwnedGraph::default();
    NTriplesParser::new(read).parse_all(&mut |t: Triple<'_>| -> Result<(), Box<dyn Error>> {
        graph.insert(owned_triple(t)?);
        Ok(())
    })?;
    Ok(graph)
}

fn owned_triple(t: Triple<'_>) -> Result<OwnedTriple, TestEvaluationError> {
    let subject = match t.subject {
        Subject::NamedNode(n) => OwnedNamedOrBlankNode::NamedNode(n.into()),
        Subject::BlankNode(n) => OwnedNamedOrBlankNode::BlankNode(n.into()),
        Subject::Triple(_) => return Err(TestEvaluationError::QuotedTriple(t.to_string())),
    };
    let object = match t.object {
        Term::NamedNode(n) => OwnedTerm::NamedNode(n.into()),
        Term::BlankNode(n) => OwnedTerm::BlankNode(n.into()),
        Term::Literal(l) => OwnedTerm::Literal(l.into()),
        Term::Triple(_) => return Err(TestEvaluationError::QuotedTriple(t.to_string())),
    };
    Ok(OwnedTriple::new(subject, t.predicate, object))
}

fn read_expected_conditions(
    data: &str,
) -> Result<(ParserOptions, Vec<ErrorCode>), Box<dyn Error>> {
    let mut options = ParserOptions::default();
    let mut codes = Vec::new();
    for line in data.lines().map(str::trim) {
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if let Some(property) = line.strip_prefix('@') {
            let (name, value) = property
                .split_once(char::is_whitespace)
                .ok_or_else(|| TestEvaluationError::InvalidExpectation(line.to_owned()))?;
            options.set_property(name, value.trim())?;
        } else {
            codes.push(
                ErrorCode::from_name(line)
                    .ok_or_else(|| TestEvaluationError::InvalidExpectation(line.to_owned()))?,
            );
        }
    }
    Ok((options, codes))
}

fn read_to_string(path: &Path) -> Result<String, TestEvaluationError> {
    fs::read_to_string(path).map_err(|e| TestEvaluationError::Io(path.display().to_string(), e))
}

fn failed(error: String) -> TestOutcome {
    TestOutcome::Failed { error }
}

#[derive(Debug)]
pub enum TestEvaluationError {
    InvalidFileName(String),
    MissingExpectation(String),
    InvalidExpectation(String),
    QuotedTriple(String),
    Io(String, io::Error),
}

impl fmt::Display for TestEvaluationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TestEvaluationError::InvalidFileName(file) => {
                write!(f, "The file name {} is not valid UTF-8", file)
            }
            TestEvaluationError::MissingExpectation(file) => {
                write!(f, "The fixture {} has neither a .nt nor a .err file", file)
            }
            TestEvaluationError::InvalidExpectation(line) => {
                write!(f, "Invalid expectation line {:?}", line)
            }
            TestEvaluationError::QuotedTriple(triple) => {
                write!(f, "Quoted triples are not supported in expected graphs: {}", triple)
            }
            TestEvaluationError::Io(file, error) => {
                write!(f, "I/O error on file {}: {}", file, error)
            }
        }
    }
}

impl Error for TestEvaluationError {}
