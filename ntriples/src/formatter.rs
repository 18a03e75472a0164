use arp_api::formatter::TriplesFormatter;
use arp_api::model::Triple;
use std::io;
use std::io::Write;

/// A [N-Triples](https://www.w3.org/TR/n-triples/) formatter.
///
/// It implements the `TriplesFormatter` trait.
/// Blank nodes are written with their parser label, `_:A1` for anonymous nodes and `_:U…` for `rdf:nodeID` ones.
///
/// Write some triples using the `TriplesFormatter` API into a `Vec` buffer:
/// ```
/// use arp_ntriples::NTriplesFormatter;
/// use arp_api::formatter::TriplesFormatter;
/// use arp_api::model::{AResource, Object, Triple};
///
/// let mut formatter = NTriplesFormatter::new(Vec::default());
/// formatter.format(&Triple {
///     subject: &AResource::uri("http://example.com/foo"),
///     predicate: &AResource::uri("http://www.w3.org/1999/02/22-rdf-syntax-ns#type"),
///     object: Object::Resource(&AResource::uri("http://schema.org/Person")),
/// })?;
/// let _ntriples = formatter.finish();
/// # std::io::Result::Ok(())
/// ```
pub struct NTriplesFormatter<W: Write> {
    write: W,
}

impl<W: Write> NTriplesFormatter<W> {
    /// Builds a new formatter from a `Write` implementation
    pub fn new(write: W) -> Self {
        Self { write }
    }

    pub fn flush(&mut self) -> io::Result<()> {
        self.write.flush()
    }

    /// Finishes writing and returns the underlying `Write`
    pub fn finish(self) -> W {
        self.write
    }
}

impl<W: Write> TriplesFormatter for NTriplesFormatter<W> {
    type Error = io::Error;

    fn format(&mut self, triple: &Triple<'_>) -> Result<(), io::Error> {
        writeln!(self.write, "{}", triple)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arp_api::model::{ALiteral, AResource, BlankNode, Object};

    #[test]
    fn literals_and_blank_nodes_are_escaped() {
        let mut formatter = NTriplesFormatter::new(Vec::new());
        let subject = AResource::Blank(BlankNode::with_node_id("André"));
        let predicate = AResource::uri("http://ex.org/p");
        formatter
            .format(&Triple {
                subject: &subject,
                predicate: &predicate,
                object: Object::Literal(&ALiteral::plain("line\n\"quoted\"", "en")),
            })
            .unwrap();
        formatter
            .format(&Triple {
                subject: &AResource::Blank(BlankNode::anonymous(3)),
                predicate: &predicate,
                object: Object::Resource(&subject),
            })
            .unwrap();
        assert_eq!(
            String::from_utf8(formatter.finish()).unwrap(),
            "_:UAndrZc3Za9 <http://ex.org/p> \"line\\n\\\"quoted\\\"\"@en .\n_:A3 <http://ex.org/p> _:UAndrZc3Za9 .\n"
        );
    }
}
