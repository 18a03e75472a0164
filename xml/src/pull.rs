//! Drives an [`XmlContentHandler`] from the `quick-xml` pull parser.

use crate::error::ArpError;
use crate::event::{XmlAttribute, XmlContentHandler, XmlName};
use crate::grammar::XML_NS;
use arp_api::condition::{ErrorCode, Location, ParseCondition};
use quick_xml::escape::resolve_xml_entity;
use quick_xml::events::{BytesStart, Event};
use quick_xml::name::{PrefixDeclaration, ResolveResult};
use quick_xml::NsReader;
use std::io::{self, BufRead, Read};
use std::mem::take;

/// Stands for [`io::ErrorKind::Interrupted`], which the tokenizer would silently retry.
#[derive(Debug, thiserror::Error)]
#[error("the read was interrupted")]
struct ReadInterrupted;

/// Counts lines and columns of the bytes consumed by the tokenizer.
struct LocatingReader<R> {
    inner: R,
    line: u64,
    column: u64,
}

impl<R: BufRead> Read for LocatingReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let available = self.fill_buf()?;
        let amount = available.len().min(buf.len());
        buf[..amount].copy_from_slice(&available[..amount]);
        self.consume(amount);
        Ok(amount)
    }
}

impl<R: BufRead> BufRead for LocatingReader<R> {
    fn fill_buf(&mut self) -> io::Result<&[u8]> {
        self.inner.fill_buf().map_err(|error| {
            if error.kind() == io::ErrorKind::Interrupted {
                io::Error::new(io::ErrorKind::Other, ReadInterrupted)
            } else {
                error
            }
        })
    }

    fn consume(&mut self, amount: usize) {
        if let Ok(buffer) = self.inner.fill_buf() {
            for byte in &buffer[..amount.min(buffer.len())] {
                if *byte == b'\n' {
                    self.line += 1;
                    self.column = 1;
                } else if *byte & 0xC0 != 0x80 {
                    // one column per character, not per UTF-8 byte
                    self.column += 1;
                }
            }
        }
        self.inner.consume(amount)
    }
}

/// Translates the events pulled from a [`BufRead`] into [`XmlContentHandler`] calls.
///
/// Namespace declarations are turned into `start_prefix_mapping`/`end_prefix_mapping` pairs around
/// the element declaring them. Each event is preceded by a `set_location` call with the position of its first byte.
///
/// ```
/// use arp_xml::{ArpError, PullAdapter, XmlAttribute, XmlContentHandler, XmlName};
///
/// #[derive(Default)]
/// struct Names(Vec<String>);
///
/// impl XmlContentHandler for Names {
///     fn start_prefix_mapping(&mut self, _: &str, _: &str) -> Result<(), ArpError> { Ok(()) }
///     fn end_prefix_mapping(&mut self, _: &str) -> Result<(), ArpError> { Ok(()) }
///     fn start_element(&mut self, name: &XmlName, _: &[XmlAttribute]) -> Result<(), ArpError> {
///         self.0.push(name.uri());
///         Ok(())
///     }
///     fn end_element(&mut self, _: &XmlName) -> Result<(), ArpError> { Ok(()) }
///     fn characters(&mut self, _: &str) -> Result<(), ArpError> { Ok(()) }
/// }
///
/// let mut names = Names::default();
/// PullAdapter::new(b"<a xmlns='http://ex.org/'><b/></a>".as_ref()).run(&mut names).unwrap();
/// assert_eq!(names.0, ["http://ex.org/a", "http://ex.org/b"]);
/// ```
pub struct PullAdapter<R: BufRead> {
    reader: NsReader<LocatingReader<R>>,
    buffer: Vec<u8>,
    /// Open elements with the prefixes they declare.
    open: Vec<(XmlName, Vec<String>)>,
    is_end: bool,
}

impl<R: BufRead> PullAdapter<R> {
    pub fn new(read: R) -> Self {
        let mut reader = NsReader::from_reader(LocatingReader {
            inner: read,
            line: 1,
            column: 1,
        });
        reader.config_mut().expand_empty_elements = true;
        Self {
            reader,
            buffer: Vec::new(),
            open: Vec::new(),
            is_end: false,
        }
    }

    /// The line and column of the next byte to be read.
    pub fn position(&self) -> (u64, u64) {
        let locating = self.reader.get_ref();
        (locating.line, locating.column)
    }

    pub fn is_end(&self) -> bool {
        self.is_end
    }

    /// Pulls one event and forwards it.
    pub fn step<C: XmlContentHandler + ?Sized>(&mut self, content: &mut C) -> Result<(), ArpError> {
        let (line, column) = self.position();
        content.set_location(line, column);
        let mut buffer = take(&mut self.buffer);
        buffer.clear();
        let result = match self.reader.read_event_into(&mut buffer) {
            Ok(event) => self.forward(event, content),
            Err(error) => Err(error.into()),
        };
        self.buffer = buffer;
        result
    }

    /// Forwards the whole document, from `start_document` to `end_document`.
    ///
    /// Tokenizer failures are reported to `content` with their condition code before being returned.
    pub fn run<C: XmlContentHandler + ?Sized>(mut self, content: &mut C) -> Result<(), ArpError> {
        let result = self.drain(content);
        result.map_err(|error| report_failure(content, error))
    }

    fn drain<C: XmlContentHandler + ?Sized>(&mut self, content: &mut C) -> Result<(), ArpError> {
        content.start_document()?;
        while !self.is_end {
            self.step(content)?;
        }
        content.end_document()
    }

    fn forward<C: XmlContentHandler + ?Sized>(
        &mut self,
        event: Event<'_>,
        content: &mut C,
    ) -> Result<(), ArpError> {
        match event {
            Event::Start(event) => self.forward_start(&event, content),
            Event::End(_) => {
                if let Some((name, prefixes)) = self.open.pop() {
                    content.end_element(&name)?;
                    for prefix in prefixes.iter().rev() {
                        content.end_prefix_mapping(prefix)?;
                    }
                }
                Ok(())
            }
            Event::Empty(event) => {
                // only when expand_empty_elements is off
                self.forward_start(&event, content)?;
                self.forward(Event::End(event.to_end().into_owned()), content)
            }
            Event::Text(event) => {
                let text = event.unescape_with(resolve_xml_entity)?;
                if self.open.is_empty() {
                    Ok(())
                } else {
                    content.characters(&text)
                }
            }
            Event::CData(event) => {
                let text = self
                    .reader
                    .decoder()
                    .decode(&event)
                    .map_err(quick_xml::Error::from)?;
                content.characters(&text)
            }
            Event::Comment(event) => {
                let text = self
                    .reader
                    .decoder()
                    .decode(&event)
                    .map_err(quick_xml::Error::from)?;
                content.comment(&text)
            }
            Event::PI(event) => {
                let decoder = self.reader.decoder();
                let target = decoder
                    .decode(event.target())
                    .map_err(quick_xml::Error::from)?;
                let data = decoder
                    .decode(event.content())
                    .map_err(quick_xml::Error::from)?;
                content.processing_instruction(&target, data.trim_start())
            }
            Event::Decl(decl) => {
                if let Some(encoding) = decl.encoding() {
                    let encoding = encoding.map_err(quick_xml::Error::InvalidAttr)?;
                    let name = String::from_utf8_lossy(&encoding);
                    if !is_utf8(&encoding) {
                        content.report(
                            ErrorCode::UnsupportedEncoding,
                            &format!("encoding {:?} is not supported, the input is read as UTF-8", name),
                        )?;
                    } else if !encoding.eq_ignore_ascii_case(b"utf-8") {
                        content.report(
                            ErrorCode::NoncanonicalIanaName,
                            &format!("{:?} is not the canonical name of UTF-8", name),
                        )?;
                    }
                }
                Ok(())
            }
            Event::DocType(_) => content.report(
                ErrorCode::XmlWarning,
                "the document type declaration is not processed, entities it declares are unknown",
            ),
            Event::Eof => {
                if let Some((name, _)) = self.open.last() {
                    let message = format!("the document ends before element {} is closed", name.qname);
                    return Err(self.ill_formed(content, message));
                }
                self.is_end = true;
                Ok(())
            }
        }
    }

    fn forward_start<C: XmlContentHandler + ?Sized>(
        &mut self,
        event: &BytesStart<'_>,
        content: &mut C,
    ) -> Result<(), ArpError> {
        let decoder = self.reader.decoder();
        let mut prefixes = Vec::new();
        let mut attributes = Vec::new();
        for attribute in event.attributes() {
            let attribute = attribute.map_err(quick_xml::Error::InvalidAttr)?;
            let value = attribute
                .decode_and_unescape_value_with(decoder, resolve_xml_entity)?
                .into_owned();
            if let Some(declaration) = attribute.key.as_namespace_binding() {
                let prefix = match declaration {
                    PrefixDeclaration::Default => String::new(),
                    PrefixDeclaration::Named(prefix) => decoder
                        .decode(prefix)
                        .map_err(quick_xml::Error::from)?
                        .into_owned(),
                };
                content.start_prefix_mapping(&prefix, &value)?;
                prefixes.push(prefix);
                continue;
            }
            let qname = decoder
                .decode(attribute.key.as_ref())
                .map_err(quick_xml::Error::from)?
                .into_owned();
            let (namespace, local_name) = self.reader.resolve_attribute(attribute.key);
            let local_name = decoder
                .decode(local_name.as_ref())
                .map_err(quick_xml::Error::from)?
                .into_owned();
            let namespace = if qname.starts_with("xml:") {
                XML_NS.to_owned()
            } else {
                match self.namespace(namespace) {
                    Ok(namespace) => namespace,
                    Err(prefix) => {
                        let message = format!("prefix {:?} of attribute {} is not declared", prefix, qname);
                        return Err(self.ill_formed(content, message));
                    }
                }
            };
            attributes.push(XmlAttribute::new(
                XmlName::new(namespace, local_name, qname),
                value,
            ));
        }

        let qname = decoder
            .decode(event.name().as_ref())
            .map_err(quick_xml::Error::from)?
            .into_owned();
        let (namespace, local_name) = self.reader.resolve_element(event.name());
        let local_name = decoder
            .decode(local_name.as_ref())
            .map_err(quick_xml::Error::from)?
            .into_owned();
        let namespace = match self.namespace(namespace) {
            Ok(namespace) => namespace,
            Err(prefix) => {
                let message = format!("prefix {:?} of element {} is not declared", prefix, qname);
                return Err(self.ill_formed(content, message));
            }
        };
        let name = XmlName::new(namespace, local_name, qname);
        content.start_element(&name, &attributes)?;
        self.open.push((name, prefixes));
        Ok(())
    }

    /// The namespace URI, empty if unbound, or the unknown prefix.
    fn namespace(&self, result: ResolveResult<'_>) -> Result<String, String> {
        let decoder = self.reader.decoder();
        match result {
            ResolveResult::Bound(namespace) => Ok(String::from_utf8_lossy(namespace.as_ref()).into_owned()),
            ResolveResult::Unbound => Ok(String::new()),
            ResolveResult::Unknown(prefix) => Err(decoder
                .decode(&prefix)
                .map_or_else(|_| String::from_utf8_lossy(&prefix).into_owned(), |p| p.into_owned())),
        }
    }

    /// Reports a namespace well-formedness error and builds the matching failure.
    fn ill_formed<C: XmlContentHandler + ?Sized>(&self, content: &mut C, message: String) -> ArpError {
        let (line, column) = self.position();
        match content.report(ErrorCode::XmlFatal, &message) {
            Err(error) => error,
            Ok(()) => ArpError::Fatal(ParseCondition {
                code: ErrorCode::XmlFatal,
                message,
                location: Location {
                    system_id: None,
                    line,
                    column,
                },
            }),
        }
    }
}

/// The condition code of a failure of the tokenizer or of the input stream.
pub(crate) fn failure_code(error: &ArpError) -> Option<ErrorCode> {
    match error {
        ArpError::Io(error)
            if error
                .get_ref()
                .is_some_and(|inner| inner.is::<ReadInterrupted>()) =>
        {
            Some(ErrorCode::Interrupted)
        }
        ArpError::Io(_) => Some(ErrorCode::GenericIo),
        ArpError::Xml(quick_xml::Error::InvalidAttr(_)) => Some(ErrorCode::XmlError),
        ArpError::Xml(_) => Some(ErrorCode::XmlFatal),
        ArpError::Fatal(_) | ArpError::Promoted(_) | ArpError::Handler(_) => None,
    }
}

/// Reports a tokenizer or stream failure to `content` and returns the error the parse fails with.
pub(crate) fn report_failure<C: XmlContentHandler + ?Sized>(
    content: &mut C,
    error: ArpError,
) -> ArpError {
    let Some(code) = failure_code(&error) else {
        return error;
    };
    match content.report(code, &error.to_string()) {
        Ok(()) | Err(ArpError::Fatal(_)) | Err(ArpError::Promoted(_)) => error,
        Err(other) => other,
    }
}

fn is_utf8(encoding: &[u8]) -> bool {
    matches!(
        encoding.to_ascii_lowercase().as_slice(),
        b"unicode-1-1-utf-8"
            | b"unicode11utf8"
            | b"unicode20utf8"
            | b"utf-8"
            | b"utf8"
            | b"x-unicode20utf8"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[derive(Default)]
    struct Trace {
        events: Vec<String>,
        reports: Vec<ErrorCode>,
        line: u64,
        element_lines: Vec<u64>,
    }

    impl XmlContentHandler for Trace {
        fn set_location(&mut self, line: u64, _column: u64) {
            self.line = line;
        }

        fn start_prefix_mapping(&mut self, prefix: &str, uri: &str) -> Result<(), ArpError> {
            self.events.push(format!("+{}={}", prefix, uri));
            Ok(())
        }

        fn end_prefix_mapping(&mut self, prefix: &str) -> Result<(), ArpError> {
            self.events.push(format!("-{}", prefix));
            Ok(())
        }

        fn start_element(
            &mut self,
            name: &XmlName,
            attributes: &[XmlAttribute],
        ) -> Result<(), ArpError> {
            let mut event = format!("<{}", name.uri());
            for attribute in attributes {
                event.push_str(&format!(" {}={}", attribute.name.uri(), attribute.value));
            }
            self.events.push(event);
            self.element_lines.push(self.line);
            Ok(())
        }

        fn end_element(&mut self, name: &XmlName) -> Result<(), ArpError> {
            self.events.push(format!("</{}", name.qname));
            Ok(())
        }

        fn characters(&mut self, text: &str) -> Result<(), ArpError> {
            if !text.trim().is_empty() {
                self.events.push(text.to_owned());
            }
            Ok(())
        }

        fn processing_instruction(&mut self, target: &str, data: &str) -> Result<(), ArpError> {
            self.events.push(format!("?{} {}", target, data));
            Ok(())
        }

        fn report(&mut self, code: ErrorCode, _message: &str) -> Result<(), ArpError> {
            self.reports.push(code);
            Ok(())
        }
    }

    fn run_adapter(xml: &str) -> (Trace, Result<(), ArpError>) {
        let mut trace = Trace::default();
        let result = PullAdapter::new(xml.as_bytes()).run(&mut trace);
        (trace, result)
    }

    #[test]
    fn prefix_mappings_bracket_their_element() {
        let (trace, result) = run_adapter(
            "<r:a xmlns:r='http://ex.org/' xmlns='http://d/' r:x='1' y='&amp;'>\n  <b>t</b><?pi some data?></r:a>",
        );
        result.unwrap();
        assert_eq!(
            trace.events,
            vec![
                "+r=http://ex.org/",
                "+=http://d/",
                "<http://ex.org/a http://ex.org/x=1 y=&",
                "<http://d/b",
                "t",
                "</b",
                "?pi some data",
                "</r:a",
                "-",
                "-r",
            ]
        );
        assert_eq!(trace.element_lines, vec![1, 2]);
    }

    #[test]
    fn xml_attributes_are_in_the_xml_namespace() {
        let (trace, result) = run_adapter("<a xml:lang='en'/>");
        result.unwrap();
        assert_eq!(trace.events[0], format!("<a {}lang=en", XML_NS));
    }

    #[test]
    fn declaration_and_doctype_conditions() {
        let (trace, result) = run_adapter("<?xml version='1.0' encoding='utf8'?><!DOCTYPE a><a/>");
        result.unwrap();
        assert_eq!(
            trace.reports,
            vec![ErrorCode::NoncanonicalIanaName, ErrorCode::XmlWarning]
        );
        let (trace, result) = run_adapter("<?xml version='1.0' encoding='ISO-8859-1'?><a/>");
        result.unwrap();
        assert_eq!(trace.reports, vec![ErrorCode::UnsupportedEncoding]);
    }

    #[test]
    fn tokenizer_failures_are_reported() {
        let (trace, result) = run_adapter("<a><b></a>");
        assert!(matches!(result, Err(ArpError::Xml(_))));
        assert_eq!(trace.reports, vec![ErrorCode::XmlFatal]);

        let (trace, result) = run_adapter("<p:a/>");
        assert!(result.is_err());
        assert_eq!(trace.reports, vec![ErrorCode::XmlFatal]);

        let (trace, result) = run_adapter("<a>");
        assert!(result.is_err());
        assert_eq!(trace.reports, vec![ErrorCode::XmlFatal]);
    }

    struct Interrupting;

    impl Read for Interrupting {
        fn read(&mut self, _: &mut [u8]) -> io::Result<usize> {
            Err(io::ErrorKind::Interrupted.into())
        }
    }

    struct Failing;

    impl Read for Failing {
        fn read(&mut self, _: &mut [u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::Other, "disk on fire"))
        }
    }

    #[test]
    fn stream_failures_have_their_own_codes() {
        let mut trace = Trace::default();
        let result = PullAdapter::new(io::BufReader::new(Interrupting)).run(&mut trace);
        assert!(matches!(result, Err(ArpError::Io(_))));
        assert_eq!(trace.reports, vec![ErrorCode::Interrupted]);
        assert!(trace.events.is_empty());

        let mut trace = Trace::default();
        let result = PullAdapter::new(io::BufReader::new(Failing)).run(&mut trace);
        assert!(matches!(result, Err(ArpError::Io(_))));
        assert_eq!(trace.reports, vec![ErrorCode::GenericIo]);
    }
}
