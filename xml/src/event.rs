//! The XML event contract shared by the event sources and the RDF/XML grammar.

use crate::error::ArpError;
use arp_api::condition::ErrorCode;

/// A namespace-resolved XML name.
#[derive(Eq, PartialEq, Debug, Clone, Hash)]
pub struct XmlName {
    /// The namespace URI, empty if the name is in no namespace.
    pub namespace: String,
    pub local_name: String,
    /// The name as written in the document, prefix included.
    pub qname: String,
}

impl XmlName {
    pub fn new(
        namespace: impl Into<String>,
        local_name: impl Into<String>,
        qname: impl Into<String>,
    ) -> Self {
        Self {
            namespace: namespace.into(),
            local_name: local_name.into(),
            qname: qname.into(),
        }
    }

    /// The prefix of the qualified name, empty for unprefixed names.
    pub fn prefix(&self) -> &str {
        self.qname
            .split_once(':')
            .map_or("", |(prefix, _)| prefix)
    }

    /// The concatenation of the namespace and the local name.
    pub fn uri(&self) -> String {
        format!("{}{}", self.namespace, self.local_name)
    }

    pub fn is(&self, namespace: &str, local_name: &str) -> bool {
        self.namespace == namespace && self.local_name == local_name
    }
}

/// An attribute other than a namespace declaration, with its unescaped value.
#[derive(Eq, PartialEq, Debug, Clone, Hash)]
pub struct XmlAttribute {
    pub name: XmlName,
    pub value: String,
}

impl XmlAttribute {
    pub fn new(name: XmlName, value: impl Into<String>) -> Self {
        Self {
            name,
            value: value.into(),
        }
    }
}

/// Receiver of a SAX-like sequence of XML events.
///
/// Namespace declarations are announced with `start_prefix_mapping` just before the
/// `start_element` of the element declaring them and withdrawn with `end_prefix_mapping`
/// just after its `end_element`.
pub trait XmlContentHandler {
    fn start_document(&mut self) -> Result<(), ArpError> {
        Ok(())
    }

    fn end_document(&mut self) -> Result<(), ArpError> {
        Ok(())
    }

    /// The position of the next event.
    fn set_location(&mut self, _line: u64, _column: u64) {}

    fn start_prefix_mapping(&mut self, prefix: &str, uri: &str) -> Result<(), ArpError>;

    fn end_prefix_mapping(&mut self, prefix: &str) -> Result<(), ArpError>;

    fn start_element(&mut self, name: &XmlName, attributes: &[XmlAttribute])
        -> Result<(), ArpError>;

    fn end_element(&mut self, name: &XmlName) -> Result<(), ArpError>;

    fn characters(&mut self, text: &str) -> Result<(), ArpError>;

    fn comment(&mut self, _text: &str) -> Result<(), ArpError> {
        Ok(())
    }

    fn processing_instruction(&mut self, _target: &str, _data: &str) -> Result<(), ArpError> {
        Ok(())
    }

    /// A condition raised by the event source itself, like an encoding problem or a read failure.
    fn report(&mut self, _code: ErrorCode, _message: &str) -> Result<(), ArpError> {
        Ok(())
    }
}
