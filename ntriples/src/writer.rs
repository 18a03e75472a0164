use crate::formatter::NTriplesFormatter;
use arp_api::condition::{ParseCondition, Severity};
use arp_api::formatter::TriplesFormatter;
use arp_api::handler::{
    ErrorHandler, ExtendedHandler, HandlerError, HandlerResult, NamespaceHandler, Reaction,
    StatementHandler,
};
use arp_api::model::{AResource, ALiteral, Object, Triple};
use std::io;
use std::io::Write;

/// A parser handler writing triples as N-Triples and conditions as text lines.
///
/// Each condition is written to the `problems` output as `<severity> <CODE> <line>:<column> <message>`.
pub struct NTriplesWriter<W: Write, E: Write> {
    formatter: NTriplesFormatter<W>,
    problems: E,
    emit_triples: bool,
    triple_count: u64,
    worst: Option<Severity>,
    problem_write_error: Option<io::Error>,
}

impl<W: Write, E: Write> NTriplesWriter<W, E> {
    pub fn new(output: W, problems: E) -> Self {
        Self {
            formatter: NTriplesFormatter::new(output),
            problems,
            emit_triples: true,
            triple_count: 0,
            worst: None,
            problem_write_error: None,
        }
    }

    /// Only counts the triples, nothing is written to the output.
    pub fn check_only(mut self) -> Self {
        self.emit_triples = false;
        self
    }

    pub fn triple_count(&self) -> u64 {
        self.triple_count
    }

    /// The highest severity reported so far.
    pub fn worst_severity(&self) -> Option<Severity> {
        self.worst
    }

    /// If an error or a fatal error has been reported.
    pub fn has_errors(&self) -> bool {
        self.worst >= Some(Severity::Error)
    }

    /// Returns the two outputs, or the first failure to write a condition.
    pub fn finish(self) -> io::Result<(W, E)> {
        if let Some(error) = self.problem_write_error {
            return Err(error);
        }
        Ok((self.formatter.finish(), self.problems))
    }

    fn write_triple(&mut self, triple: &Triple<'_>) -> HandlerResult {
        self.triple_count += 1;
        if self.emit_triples {
            self.formatter.format(triple)?;
        }
        Ok(())
    }

    fn report(&mut self, severity: Severity, condition: &ParseCondition) -> Reaction {
        self.worst = self.worst.max(Some(severity));
        let written = writeln!(
            self.problems,
            "{} {} {}:{} {}",
            severity,
            condition.code,
            condition.location.line,
            condition.location.column,
            condition.message
        );
        if let Err(error) = written {
            self.problem_write_error.get_or_insert(error);
        }
        Reaction::Continue
    }
}

impl<W: Write, E: Write> StatementHandler for NTriplesWriter<W, E> {
    fn statement(
        &mut self,
        subject: &AResource,
        predicate: &AResource,
        object: &AResource,
    ) -> HandlerResult {
        self.write_triple(&Triple {
            subject,
            predicate,
            object: Object::Resource(object),
        })
    }

    fn literal_statement(
        &mut self,
        subject: &AResource,
        predicate: &AResource,
        object: &ALiteral,
    ) -> HandlerResult {
        self.write_triple(&Triple {
            subject,
            predicate,
            object: Object::Literal(object),
        })
    }
}

impl<W: Write, E: Write> NamespaceHandler for NTriplesWriter<W, E> {}

impl<W: Write, E: Write> ExtendedHandler for NTriplesWriter<W, E> {
    fn end_rdf(&mut self) -> HandlerResult {
        self.formatter.flush().map_err(HandlerError::from)
    }
}

impl<W: Write, E: Write> ErrorHandler for NTriplesWriter<W, E> {
    fn warning(&mut self, condition: &ParseCondition) -> Reaction {
        self.report(Severity::Warning, condition)
    }

    fn error(&mut self, condition: &ParseCondition) -> Reaction {
        self.report(Severity::Error, condition)
    }

    fn fatal_error(&mut self, condition: &ParseCondition) -> Reaction {
        self.report(Severity::Fatal, condition)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arp_api::condition::{ErrorCode, Location};

    #[test]
    fn conditions_are_written_one_per_line() {
        let mut writer = NTriplesWriter::new(Vec::new(), Vec::new());
        let condition = ParseCondition {
            code: ErrorCode::MalformedUri,
            message: "http://a b is not a valid IRI".into(),
            location: Location {
                system_id: Some("doc.rdf".into()),
                line: 3,
                column: 14,
            },
        };
        assert_eq!(writer.warning(&condition), Reaction::Continue);
        assert!(!writer.has_errors());
        writer.error(&condition);
        assert!(writer.has_errors());
        assert_eq!(writer.worst_severity(), Some(Severity::Error));

        let (output, problems) = writer.finish().unwrap();
        assert!(output.is_empty());
        assert_eq!(
            String::from_utf8(problems).unwrap(),
            "warning WARN_MALFORMED_URI 3:14 http://a b is not a valid IRI\nerror WARN_MALFORMED_URI 3:14 http://a b is not a valid IRI\n"
        );
    }

    #[test]
    fn check_only_counts_triples() {
        let mut writer = NTriplesWriter::new(Vec::new(), Vec::new()).check_only();
        let s = AResource::uri("http://ex.org/s");
        writer.statement(&s, &s, &s).unwrap();
        writer
            .literal_statement(&s, &s, &ALiteral::plain("v", ""))
            .unwrap();
        assert_eq!(writer.triple_count(), 2);
        let (output, _) = writer.finish().unwrap();
        assert!(output.is_empty());
    }
}
