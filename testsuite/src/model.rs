//! Owned triples, comparable across parses.

use arp_api::model::{AResource, ALiteral, BlankNode, RDF_XML_LITERAL};
use rio_api::model as rio;
use std::collections::HashSet;
use std::fmt;

#[derive(Eq, PartialEq, Ord, PartialOrd, Debug, Clone, Hash)]
pub struct OwnedNamedNode {
    pub iri: String,
}

impl OwnedNamedNode {
    pub fn new(iri: impl Into<String>) -> Self {
        Self { iri: iri.into() }
    }
}

impl fmt::Display for OwnedNamedNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        AResource::uri(self.iri.as_str()).fmt(f)
    }
}

impl From<&AResource> for OwnedNamedNode {
    fn from(resource: &AResource) -> Self {
        match resource {
            AResource::Uri(uri) => Self::new(uri.as_str()),
            AResource::Blank(node) => Self::new(node.to_string()),
        }
    }
}

impl From<rio::NamedNode<'_>> for OwnedNamedNode {
    fn from(n: rio::NamedNode<'_>) -> Self {
        Self::new(n.iri)
    }
}

#[derive(Eq, PartialEq, Ord, PartialOrd, Debug, Clone, Hash)]
pub struct OwnedBlankNode {
    /// The label as written in N-Triples, without the `_:` prefix.
    pub id: String,
}

impl OwnedBlankNode {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }
}

impl fmt::Display for OwnedBlankNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "_:{}", self.id)
    }
}

impl From<&BlankNode> for OwnedBlankNode {
    fn from(node: &BlankNode) -> Self {
        let written = node.to_string();
        Self::new(written.strip_prefix("_:").unwrap_or(&written))
    }
}

impl From<rio::BlankNode<'_>> for OwnedBlankNode {
    fn from(n: rio::BlankNode<'_>) -> Self {
        Self::new(n.id)
    }
}

#[derive(Eq, PartialEq, Ord, PartialOrd, Debug, Clone, Hash)]
pub enum OwnedLiteral {
    Simple {
        value: String,
    },
    LanguageTaggedString {
        value: String,
        language: String,
    },
    Typed {
        value: String,
        datatype: OwnedNamedNode,
    },
}

impl OwnedLiteral {
    pub fn value(&self) -> &str {
        match self {
            OwnedLiteral::Simple { value }
            | OwnedLiteral::LanguageTaggedString { value, .. }
            | OwnedLiteral::Typed { value, .. } => value,
        }
    }
}

impl fmt::Display for OwnedLiteral {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OwnedLiteral::Simple { value } => ALiteral::plain(value.as_str(), "").fmt(f),
            OwnedLiteral::LanguageTaggedString { value, language } => {
                ALiteral::plain(value.as_str(), language.as_str()).fmt(f)
            }
            OwnedLiteral::Typed { value, datatype } => {
                ALiteral::typed(value.as_str(), datatype.iri.as_str()).fmt(f)
            }
        }
    }
}

impl From<&ALiteral> for OwnedLiteral {
    fn from(literal: &ALiteral) -> Self {
        let value = literal.lexical.clone();
        if let Some(datatype) = literal.datatype_uri() {
            OwnedLiteral::Typed {
                value,
                datatype: OwnedNamedNode::new(datatype),
            }
        } else if literal.is_well_formed_xml() {
            OwnedLiteral::Typed {
                value,
                datatype: OwnedNamedNode::new(RDF_XML_LITERAL),
            }
        } else if literal.lang().is_empty() {
            OwnedLiteral::Simple { value }
        } else {
            OwnedLiteral::LanguageTaggedString {
                value,
                language: literal.lang().to_owned(),
            }
        }
    }
}

impl From<rio::Literal<'_>> for OwnedLiteral {
    fn from(l: rio::Literal<'_>) -> Self {
        match l {
            rio::Literal::Simple { value } => OwnedLiteral::Simple {
                value: value.to_owned(),
            },
            rio::Literal::LanguageTaggedString { value, language } => {
                OwnedLiteral::LanguageTaggedString {
                    value: value.to_owned(),
                    language: language.to_owned(),
                }
            }
            rio::Literal::Typed { value, datatype } => OwnedLiteral::Typed {
                value: value.to_owned(),
                datatype: datatype.into(),
            },
        }
    }
}

#[derive(Eq, PartialEq, Ord, PartialOrd, Debug, Clone, Hash)]
pub enum OwnedNamedOrBlankNode {
    NamedNode(OwnedNamedNode),
    BlankNode(OwnedBlankNode),
}

impl fmt::Display for OwnedNamedOrBlankNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OwnedNamedOrBlankNode::NamedNode(node) => node.fmt(f),
            OwnedNamedOrBlankNode::BlankNode(node) => node.fmt(f),
        }
    }
}

impl From<&AResource> for OwnedNamedOrBlankNode {
    fn from(resource: &AResource) -> Self {
        match resource {
            AResource::Uri(uri) => OwnedNamedOrBlankNode::NamedNode(OwnedNamedNode::new(uri.as_str())),
            AResource::Blank(node) => OwnedNamedOrBlankNode::BlankNode(node.into()),
        }
    }
}

impl From<OwnedNamedNode> for OwnedNamedOrBlankNode {
    fn from(node: OwnedNamedNode) -> Self {
        OwnedNamedOrBlankNode::NamedNode(node)
    }
}

impl From<OwnedBlankNode> for OwnedNamedOrBlankNode {
    fn from(node: OwnedBlankNode) -> Self {
        OwnedNamedOrBlankNode::BlankNode(node)
    }
}

#[derive(Eq, PartialEq, Ord, PartialOrd, Debug, Clone, Hash)]
pub enum OwnedTerm {
    NamedNode(OwnedNamedNode),
    BlankNode(OwnedBlankNode),
    Literal(OwnedLiteral),
}

impl fmt::Display for OwnedTerm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OwnedTerm::NamedNode(node) => node.fmt(f),
            OwnedTerm::BlankNode(node) => node.fmt(f),
            OwnedTerm::Literal(literal) => literal.fmt(f),
        }
    }
}

impl From<&AResource> for OwnedTerm {
    fn from(resource: &AResource) -> Self {
        OwnedNamedOrBlankNode::from(resource).into()
    }
}

impl From<&ALiteral> for OwnedTerm {
    fn from(literal: &ALiteral) -> Self {
        OwnedTerm::Literal(literal.into())
    }
}

impl From<OwnedNamedNode> for OwnedTerm {
    fn from(node: OwnedNamedNode) -> Self {
        OwnedTerm::NamedNode(node)
    }
}

impl From<OwnedBlankNode> for OwnedTerm {
    fn from(node: OwnedBlankNode) -> Self {
        OwnedTerm::BlankNode(node)
    }
}

impl From<OwnedLiteral> for OwnedTerm {
    fn from(literal: OwnedLiteral) -> Self {
        OwnedTerm::Literal(literal)
    }
}

impl From<OwnedNamedOrBlankNode> for OwnedTerm {
    fn from(resource: OwnedNamedOrBlankNode) -> Self {
        match resource {
            OwnedNamedOrBlankNode::NamedNode(node) => OwnedTerm::NamedNode(node),
            OwnedNamedOrBlankNode::BlankNode(node) => OwnedTerm::BlankNode(node),
        }
    }
}

#[derive(Eq, PartialEq, Ord, PartialOrd, Debug, Clone, Hash)]
pub struct OwnedTriple {
    pub subject: OwnedNamedOrBlankNode,
    pub predicate: OwnedNamedNode,
    pub object: OwnedTerm,
}

impl OwnedTriple {
    pub fn new(
        subject: impl Into<OwnedNamedOrBlankNode>,
        predicate: impl Into<OwnedNamedNode>,
        object: impl Into<OwnedTerm>,
    ) -> Self {
        Self {
            subject: subject.into(),
            predicate: predicate.into(),
            object: object.into(),
        }
    }
}

impl fmt::Display for OwnedTriple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {} .", self.subject, self.predicate, self.object)
    }
}

#[derive(Default, Debug, Clone)]
pub struct OwnedGraph {
    inner: HashSet<OwnedTriple>,
}

impl OwnedGraph {
    pub fn insert(&mut self, t: OwnedTriple) {
        self.inner.insert(t);
    }

    pub fn iter(&self) -> impl Iterator<Item = &OwnedTriple> {
        self.inner.iter()
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn contains(&self, t: &OwnedTriple) -> bool {
        self.inner.contains(t)
    }

    pub fn triples_for_subject<'a>(
        &'a self,
        subject: &'a OwnedNamedOrBlankNode,
    ) -> impl Iterator<Item = &'a OwnedTriple> + 'a {
        self.inner.iter().filter(move |t| &t.subject == subject)
    }

    pub fn triples_for_object<'a>(
        &'a self,
        object: &'a OwnedTerm,
    ) -> impl Iterator<Item = &'a OwnedTriple> + 'a {
        self.inner.iter().filter(move |t| &t.object == object)
    }
}

impl IntoIterator for OwnedGraph {
    type Item = OwnedTriple;
    type IntoIter = <HashSet<OwnedTriple> as IntoIterator>::IntoIter;

    fn into_iter(self) -> Self::IntoIter {
        self.inner.into_iter()
    }
}

impl FromIterator<OwnedTriple> for OwnedGraph {
    fn from_iter<I: IntoIterator<Item = OwnedTriple>>(iter: I) -> Self {
        Self {
            inner: HashSet::from_iter(iter),
        }
    }
}

impl fmt::Display for OwnedGraph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut triples: Vec<_> = self.inner.iter().collect();
        triples.sort();
        for t in triples {
            writeln!(f, "{}", t)?;
        }
        Ok(())
    }
}
