//! Resources and literals produced by the RDF/XML parser.
//!
//! The default string formatters return an [N-Triples](https://www.w3.org/TR/n-triples/) compatible representation.

use std::fmt;
use std::fmt::Write;

/// The IRI of the `rdf:XMLLiteral` datatype, used when writing `rdf:parseType="Literal"` values.
pub const RDF_XML_LITERAL: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#XMLLiteral";

/// A blank node.
///
/// Anonymous nodes get a parser generated label, nodes introduced by `rdf:nodeID` keep the label of the document.
/// Both label spaces are kept apart by the `explicit` flag so `rdf:nodeID="A1"` never aliases a generated node.
///
/// ```
/// use arp_api::model::BlankNode;
///
/// assert_eq!("_:A1", BlankNode::anonymous(1).to_string());
/// assert_eq!("_:UfooZ5aX", BlankNode::with_node_id("fooZX").to_string());
/// ```
#[derive(Eq, PartialEq, Ord, PartialOrd, Debug, Clone, Hash)]
pub struct BlankNode {
    label: String,
    explicit: bool,
}

impl BlankNode {
    /// A fresh node generated by the parser from a per-document counter.
    pub fn anonymous(counter: u64) -> Self {
        Self {
            label: format!("A{}", counter),
            explicit: false,
        }
    }

    /// A node named by an `rdf:nodeID` attribute.
    pub fn with_node_id(node_id: impl Into<String>) -> Self {
        Self {
            label: node_id.into(),
            explicit: true,
        }
    }

    /// The label: the `rdf:nodeID` value or the generated identifier.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Whether this node was introduced by an explicit `rdf:nodeID`.
    pub fn has_node_id(&self) -> bool {
        self.explicit
    }
}

impl fmt::Display for BlankNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.explicit {
            f.write_str("_:U")?;
            write_escaped_label(f, &self.label)
        } else {
            write!(f, "_:{}", self.label)
        }
    }
}

/// A resource reference: an URI reference or a blank node.
///
/// Equality is by logical identity: the same URI text or the same blank node.
///
/// ```
/// use arp_api::model::AResource;
///
/// assert_eq!(
///     "<http://example.com/foo>",
///     AResource::uri("http://example.com/foo").to_string()
/// )
/// ```
#[derive(Eq, PartialEq, Ord, PartialOrd, Debug, Clone, Hash)]
pub enum AResource {
    Uri(String),
    Blank(BlankNode),
}

impl AResource {
    pub fn uri(uri: impl Into<String>) -> Self {
        AResource::Uri(uri.into())
    }

    /// The URI reference if this resource is not a blank node.
    pub fn uri_ref(&self) -> Option<&str> {
        match self {
            AResource::Uri(uri) => Some(uri),
            AResource::Blank(_) => None,
        }
    }

    pub fn blank_node(&self) -> Option<&BlankNode> {
        match self {
            AResource::Uri(_) => None,
            AResource::Blank(node) => Some(node),
        }
    }

    pub fn is_anonymous(&self) -> bool {
        matches!(self, AResource::Blank(_))
    }
}

impl fmt::Display for AResource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AResource::Uri(uri) => {
                f.write_char('<')?;
                write_escaped_uri(f, uri)?;
                f.write_char('>')
            }
            AResource::Blank(node) => node.fmt(f),
        }
    }
}

impl From<BlankNode> for AResource {
    fn from(node: BlankNode) -> Self {
        AResource::Blank(node)
    }
}

/// A literal value.
///
/// `lang` is never absent: the empty string means "no language".
/// A `rdf:parseType="Literal"` value has `well_formed_xml` set and its `parse_type` records the parseType that produced it.
///
/// ```
/// use arp_api::model::ALiteral;
///
/// assert_eq!("\"foo\\nbar\"", ALiteral::plain("foo\nbar", "").to_string());
/// assert_eq!("\"chat\"@fr", ALiteral::plain("chat", "fr").to_string());
/// assert_eq!(
///     "\"1\"^^<http://www.w3.org/2001/XMLSchema#integer>",
///     ALiteral::typed("1", "http://www.w3.org/2001/XMLSchema#integer").to_string()
/// );
/// ```
#[derive(Eq, PartialEq, Debug, Clone, Hash)]
pub struct ALiteral {
    /// The lexical form.
    pub lexical: String,
    /// The `xml:lang` in scope, verbatim.
    pub lang: String,
    /// The `rdf:datatype` IRI.
    pub datatype: Option<String>,
    pub well_formed_xml: bool,
    pub parse_type: Option<String>,
}

impl ALiteral {
    pub fn plain(lexical: impl Into<String>, lang: impl Into<String>) -> Self {
        Self {
            lexical: lexical.into(),
            lang: lang.into(),
            datatype: None,
            well_formed_xml: false,
            parse_type: None,
        }
    }

    pub fn typed(lexical: impl Into<String>, datatype: impl Into<String>) -> Self {
        Self {
            lexical: lexical.into(),
            lang: String::new(),
            datatype: Some(datatype.into()),
            well_formed_xml: false,
            parse_type: None,
        }
    }

    /// Serialized XML content captured from a `rdf:parseType="Literal"` (or unknown parseType) property element.
    pub fn xml(lexical: impl Into<String>, parse_type: impl Into<String>) -> Self {
        Self {
            lexical: lexical.into(),
            lang: String::new(),
            datatype: None,
            well_formed_xml: true,
            parse_type: Some(parse_type.into()),
        }
    }

    pub fn lang(&self) -> &str {
        &self.lang
    }

    pub fn datatype_uri(&self) -> Option<&str> {
        self.datatype.as_deref()
    }

    pub fn is_well_formed_xml(&self) -> bool {
        self.well_formed_xml
    }
}

impl fmt::Display for ALiteral {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_char('"')?;
        write_escaped_string(f, &self.lexical)?;
        f.write_char('"')?;
        if let Some(datatype) = &self.datatype {
            write!(f, "^^{}", AResource::Uri(datatype.clone()))
        } else if self.well_formed_xml {
            write!(f, "^^<{}>", RDF_XML_LITERAL)
        } else if !self.lang.is_empty() {
            write!(f, "@{}", self.lang)
        } else {
            Ok(())
        }
    }
}

/// The object of a triple.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash)]
pub enum Object<'a> {
    Resource(&'a AResource),
    Literal(&'a ALiteral),
}

impl<'a> fmt::Display for Object<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Object::Resource(resource) => resource.fmt(f),
            Object::Literal(literal) => literal.fmt(f),
        }
    }
}

/// A triple borrowed from the parser for the duration of one emission.
///
/// ```
/// use arp_api::model::{AResource, Object, Triple};
///
/// let s = AResource::uri("http://example.com/foo");
/// let p = AResource::uri("http://schema.org/sameAs");
/// assert_eq!(
///     "<http://example.com/foo> <http://schema.org/sameAs> <http://example.com/foo> .",
///     Triple { subject: &s, predicate: &p, object: Object::Resource(&s) }.to_string()
/// )
/// ```
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash)]
pub struct Triple<'a> {
    pub subject: &'a AResource,
    pub predicate: &'a AResource,
    pub object: Object<'a>,
}

impl<'a> fmt::Display for Triple<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {} .", self.subject, self.predicate, self.object)
    }
}

fn write_escaped_string(f: &mut impl Write, s: &str) -> fmt::Result {
    for c in s.chars() {
        match c {
            '\n' => f.write_str("\\n")?,
            '\r' => f.write_str("\\r")?,
            '\t' => f.write_str("\\t")?,
            '"' => f.write_str("\\\"")?,
            '\\' => f.write_str("\\\\")?,
            c => write_char_or_unicode_escape(f, c)?,
        }
    }
    Ok(())
}

fn write_escaped_uri(f: &mut impl Write, s: &str) -> fmt::Result {
    for c in s.chars() {
        match c {
            '<' | '>' | '"' | '{' | '}' | '|' | '^' | '`' | '\\' | ' ' => {
                write!(f, "\\u{:04X}", u32::from(c))?
            }
            c => write_char_or_unicode_escape(f, c)?,
        }
    }
    Ok(())
}

fn write_char_or_unicode_escape(f: &mut impl Write, c: char) -> fmt::Result {
    let code = u32::from(c);
    if (0x20..0x7F).contains(&code) {
        f.write_char(c)
    } else if code <= 0xFFFF {
        write!(f, "\\u{:04X}", code)
    } else {
        write!(f, "\\U{:08X}", code)
    }
}

/// Makes an arbitrary `rdf:nodeID` usable as a N-Triples label.
///
/// ASCII letters and digits other than `Z` are kept, every other character becomes `Z`
/// followed by the lowercase hexadecimal of each of its UTF-8 bytes.
fn write_escaped_label(f: &mut impl Write, label: &str) -> fmt::Result {
    for c in label.chars() {
        if c.is_ascii_alphanumeric() && c != 'Z' {
            f.write_char(c)?;
        } else {
            let mut buffer = [0; 4];
            for byte in c.encode_utf8(&mut buffer).bytes() {
                write!(f, "Z{:x}", byte)?;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_id_labels_are_escaped() {
        assert_eq!(BlankNode::with_node_id("André").to_string(), "_:UAndrZc3Za9");
        assert_eq!(BlankNode::with_node_id("a.b").to_string(), "_:UaZ2eb");
        assert_eq!(BlankNode::with_node_id("a:b").to_string(), "_:UaZ3ab");
    }

    #[test]
    fn node_id_never_aliases_generated_label() {
        let generated = BlankNode::anonymous(1);
        let named = BlankNode::with_node_id("A1");
        assert_ne!(generated, named);
        assert_ne!(generated.to_string(), named.to_string());
    }

    #[test]
    fn literal_escapes() {
        assert_eq!(
            ALiteral::plain("a\tb\u{7}é\u{1F600}\"", "").to_string(),
            "\"a\\tb\\u0007\\u00E9\\U0001F600\\\"\""
        );
    }

    #[test]
    fn xml_literal_is_written_with_its_datatype() {
        assert_eq!(
            ALiteral::xml("<b>x</b>", "Literal").to_string(),
            "\"<b>x</b>\"^^<http://www.w3.org/1999/02/22-rdf-syntax-ns#XMLLiteral>"
        );
    }
}
