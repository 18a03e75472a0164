//! An owned XML element tree and the walker replaying it as [`XmlContentHandler`] events.

use crate::error::ArpError;
use crate::event::{XmlAttribute, XmlContentHandler, XmlName};
use crate::pull::PullAdapter;
use arp_api::condition::ErrorCode;
use std::io::BufRead;
use std::mem::take;

/// A child of an element, or a top level item of a document.
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum XmlNode {
    Element(XmlElement),
    Text(String),
    Comment(String),
    ProcessingInstruction { target: String, data: String },
    /// A condition raised by the tokenizer while the tree was read.
    Report {
        code: ErrorCode,
        message: String,
        line: u64,
        column: u64,
    },
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct XmlElement {
    pub name: XmlName,
    /// The `(prefix, uri)` namespace declarations of this element, the default namespace has the empty prefix.
    pub namespaces: Vec<(String, String)>,
    pub attributes: Vec<XmlAttribute>,
    pub children: Vec<XmlNode>,
    /// Position of the start tag, 0 if unknown.
    pub line: u64,
    pub column: u64,
}

impl XmlElement {
    pub fn new(name: XmlName) -> Self {
        Self {
            name,
            namespaces: Vec::new(),
            attributes: Vec::new(),
            children: Vec::new(),
            line: 0,
            column: 0,
        }
    }

    pub fn with_namespace(mut self, prefix: impl Into<String>, uri: impl Into<String>) -> Self {
        self.namespaces.push((prefix.into(), uri.into()));
        self
    }

    pub fn with_attribute(mut self, name: XmlName, value: impl Into<String>) -> Self {
        self.attributes.push(XmlAttribute::new(name, value));
        self
    }

    pub fn with_child(mut self, child: XmlElement) -> Self {
        self.children.push(XmlNode::Element(child));
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.children.push(XmlNode::Text(text.into()));
        self
    }
}

/// An XML document held in memory.
///
/// ```
/// use arp_xml::{XmlDocument, XmlElement, XmlName, XmlNode};
///
/// let document = XmlDocument::parse(b"<a xmlns='http://ex.org/'>text<b/></a>".as_ref()).unwrap();
/// let root = document.root().unwrap();
/// assert_eq!(root.name, XmlName::new("http://ex.org/", "a", "a"));
/// assert_eq!(root.namespaces, [("".to_owned(), "http://ex.org/".to_owned())]);
/// assert!(matches!(&root.children[1], XmlNode::Element(b) if b.name.local_name == "b"));
///
/// // trees can also be built in memory
/// let built = XmlDocument::new(XmlElement::new(XmlName::new("http://ex.org/", "a", "a")).with_text("text"));
/// assert!(built.root().is_some());
/// ```
#[derive(Eq, PartialEq, Debug, Clone, Default)]
pub struct XmlDocument {
    /// Comments, processing instructions, reports and the root element, in document order.
    pub nodes: Vec<XmlNode>,
}

impl XmlDocument {
    pub fn new(root: XmlElement) -> Self {
        Self {
            nodes: vec![XmlNode::Element(root)],
        }
    }

    /// Reads a whole document.
    pub fn parse(read: impl BufRead) -> Result<Self, ArpError> {
        let mut builder = TreeBuilder::default();
        PullAdapter::new(read).run(&mut builder)?;
        Ok(builder.document)
    }

    pub fn root(&self) -> Option<&XmlElement> {
        self.nodes.iter().find_map(|node| match node {
            XmlNode::Element(element) => Some(element),
            _ => None,
        })
    }

    /// Replays the document depth first, with the events a streaming read of it would produce.
    pub fn walk<C: XmlContentHandler + ?Sized>(&self, content: &mut C) -> Result<(), ArpError> {
        content.start_document()?;
        for node in &self.nodes {
            walk_node(node, content)?;
        }
        content.end_document()
    }
}

enum Step<'a> {
    Node(&'a XmlNode),
    Close(&'a XmlElement),
}

fn walk_node<C: XmlContentHandler + ?Sized>(
    node: &XmlNode,
    content: &mut C,
) -> Result<(), ArpError> {
    // explicit stack, documents may nest deeper than the call stack allows
    let mut stack = vec![Step::Node(node)];
    while let Some(step) = stack.pop() {
        match step {
            Step::Node(XmlNode::Element(element)) => {
                if element.line > 0 {
                    content.set_location(element.line, element.column);
                }
                for (prefix, uri) in &element.namespaces {
                    content.start_prefix_mapping(prefix, uri)?;
                }
                content.start_element(&element.name, &element.attributes)?;
                stack.push(Step::Close(element));
                stack.extend(element.children.iter().rev().map(Step::Node));
            }
            Step::Node(XmlNode::Text(text)) => content.characters(text)?,
            Step::Node(XmlNode::Comment(text)) => content.comment(text)?,
            Step::Node(XmlNode::ProcessingInstruction { target, data }) => {
                content.processing_instruction(target, data)?
            }
            Step::Node(XmlNode::Report {
                code,
                message,
                line,
                column,
            }) => {
                content.set_location(*line, *column);
                content.report(*code, message)?
            }
            Step::Close(element) => {
                content.end_element(&element.name)?;
                for (prefix, _) in element.namespaces.iter().rev() {
                    content.end_prefix_mapping(prefix)?;
                }
            }
        }
    }
    Ok(())
}

/// Collects events into an [`XmlDocument`].
#[derive(Default)]
struct TreeBuilder {
    document: XmlDocument,
    open: Vec<XmlElement>,
    pending_namespaces: Vec<(String, String)>,
    line: u64,
    column: u64,
}

impl TreeBuilder {
    fn push(&mut self, node: XmlNode) {
        match self.open.last_mut() {
            Some(parent) => parent.children.push(node),
            None => self.document.nodes.push(node),
        }
    }
}

impl XmlContentHandler for TreeBuilder {
    fn set_location(&mut self, line: u64, column: u64) {
        self.line = line;
        self.column = column;
    }

    fn start_prefix_mapping(&mut self, prefix: &str, uri: &str) -> Result<(), ArpError> {
        self.pending_namespaces
            .push((prefix.to_owned(), uri.to_owned()));
        Ok(())
    }

    fn end_prefix_mapping(&mut self, _prefix: &str) -> Result<(), ArpError> {
        Ok(())
    }

    fn start_element(
        &mut self,
        name: &XmlName,
        attributes: &[XmlAttribute],
    ) -> Result<(), ArpError> {
        self.open.push(XmlElement {
            name: name.clone(),
            namespaces: take(&mut self.pending_namespaces),
            attributes: attributes.to_vec(),
            children: Vec::new(),
            line: self.line,
            column: self.column,
        });
        Ok(())
    }

    fn end_element(&mut self, _name: &XmlName) -> Result<(), ArpError> {
        if let Some(element) = self.open.pop() {
            self.push(XmlNode::Element(element));
        }
        Ok(())
    }

    fn characters(&mut self, text: &str) -> Result<(), ArpError> {
        if let Some(parent) = self.open.last_mut() {
            if let Some(XmlNode::Text(previous)) = parent.children.last_mut() {
                previous.push_str(text);
            } else {
                parent.children.push(XmlNode::Text(text.to_owned()));
            }
        }
        Ok(())
    }

    fn comment(&mut self, text: &str) -> Result<(), ArpError> {
        self.push(XmlNode::Comment(text.to_owned()));
        Ok(())
    }

    fn processing_instruction(&mut self, target: &str, data: &str) -> Result<(), ArpError> {
        self.push(XmlNode::ProcessingInstruction {
            target: target.to_owned(),
            data: data.to_owned(),
        });
        Ok(())
    }

    fn report(&mut self, code: ErrorCode, message: &str) -> Result<(), ArpError> {
        self.push(XmlNode::Report {
            code,
            message: message.to_owned(),
            line: self.line,
            column: self.column,
        });
        Ok(())
    }
}
