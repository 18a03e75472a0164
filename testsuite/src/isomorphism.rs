//! Graph comparison modulo blank node renaming.
//!
//! Blank nodes are first partitioned by a hash of their ground neighbourhood,
//! then a bijection is searched inside each partition.

use crate::model::*;
use permutohedron::LexicalPermutation;
use std::collections::hash_map::DefaultHasher;
use std::collections::{BTreeSet, HashMap, HashSet};
use std::hash::{Hash, Hasher};

type Partitions<'a> = HashMap<u64, Vec<&'a OwnedBlankNode>>;
type Mapping<'a> = HashMap<&'a OwnedBlankNode, &'a OwnedBlankNode>;

/// Returns `true` if there is a blank node bijection making `a` equal to `b`.
///
/// ```
/// use arp_testsuite::are_graphs_isomorphic;
/// use arp_testsuite::model::*;
///
/// let p = OwnedNamedNode::new("http://ex.org/p");
/// let a: OwnedGraph = vec![OwnedTriple::new(OwnedBlankNode::new("A1"), p.clone(), OwnedBlankNode::new("A2"))]
///     .into_iter()
///     .collect();
/// let b: OwnedGraph = vec![OwnedTriple::new(OwnedBlankNode::new("x"), p, OwnedBlankNode::new("y"))]
///     .into_iter()
///     .collect();
/// assert!(are_graphs_isomorphic(&a, &b));
/// ```
pub fn are_graphs_isomorphic(a: &OwnedGraph, b: &OwnedGraph) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let a_bnodes = match ground_contained_and_blank_nodes(a, b) {
        Some(nodes) => nodes,
        None => return false,
    };
    let b_bnodes = match ground_contained_and_blank_nodes(b, a) {
        Some(nodes) => nodes,
        None => return false,
    };
    if a_bnodes.len() != b_bnodes.len() {
        return false;
    }

    let a_partitions = partition_blank_nodes(a_bnodes, a);
    let b_partitions = partition_blank_nodes(b_bnodes, b);
    if a_partitions.len() != b_partitions.len()
        || a_partitions
            .iter()
            .any(|(hash, nodes)| b_partitions.get(hash).map(Vec::len) != Some(nodes.len()))
    {
        return false;
    }

    let mut hashes: Vec<u64> = a_partitions.keys().copied().collect();
    // the biggest partitions are tried last, after the cheap ones fixed most of the mapping
    hashes.sort_by_key(|hash| std::cmp::Reverse(a_partitions[hash].len()));
    search_mapping(
        &mut hashes,
        &a_partitions,
        &b_partitions,
        &mut HashMap::new(),
        a,
        b,
    )
}

/// The blank nodes of `graph`, or `None` if one of its ground triples is missing from `other`.
fn ground_contained_and_blank_nodes<'a>(
    graph: &'a OwnedGraph,
    other: &OwnedGraph,
) -> Option<HashSet<&'a OwnedBlankNode>> {
    let mut bnodes = HashSet::new();
    for t in graph.iter() {
        let mut ground = true;
        if let OwnedNamedOrBlankNode::BlankNode(subject) = &t.subject {
            bnodes.insert(subject);
            ground = false;
        }
        if let OwnedTerm::BlankNode(object) = &t.object {
            bnodes.insert(object);
            ground = false;
        }
        if ground && !other.contains(t) {
            return None;
        }
    }
    Some(bnodes)
}

/// Hashes the sorted ground triples around each node, ignoring blank neighbours.
fn partition_blank_nodes<'a>(
    bnodes: HashSet<&'a OwnedBlankNode>,
    graph: &'a OwnedGraph,
) -> Partitions<'a> {
    let mut partitions = Partitions::new();
    for bnode in bnodes {
        let subject = OwnedNamedOrBlankNode::BlankNode(bnode.clone());
        let object = OwnedTerm::BlankNode(bnode.clone());

        let outgoing: BTreeSet<(&OwnedNamedNode, &OwnedTerm)> = graph
            .triples_for_subject(&subject)
            .filter(|t| !matches!(t.object, OwnedTerm::BlankNode(_)))
            .map(|t| (&t.predicate, &t.object))
            .collect();
        let incoming: BTreeSet<(&OwnedNamedOrBlankNode, &OwnedNamedNode)> = graph
            .triples_for_object(&object)
            .filter(|t| !matches!(t.subject, OwnedNamedOrBlankNode::BlankNode(_)))
            .map(|t| (&t.subject, &t.predicate))
            .collect();

        let mut hasher = DefaultHasher::new();
        outgoing.hash(&mut hasher);
        incoming.hash(&mut hasher);
        partitions.entry(hasher.finish()).or_default().push(bnode);
    }
    partitions
}

fn search_mapping<'a>(
    hashes: &mut Vec<u64>,
    a_partitions: &'a Partitions<'a>,
    b_partitions: &'a Partitions<'a>,
    mapping: &mut Mapping<'a>,
    a: &OwnedGraph,
    b: &OwnedGraph,
) -> bool {
    let hash = match hashes.pop() {
        Some(hash) => hash,
        None => return is_contained(mapping, a, b),
    };
    let (a_nodes, b_nodes) = match (a_partitions.get(&hash), b_partitions.get(&hash)) {
        (Some(a_nodes), Some(b_nodes)) if a_nodes.len() == b_nodes.len() => (a_nodes, b_nodes),
        _ => {
            hashes.push(hash);
            return false;
        }
    };

    // every permutation of the a side zipped with the b side gives every candidate bijection
    let mut candidates = a_nodes.clone();
    candidates.sort();
    let found = loop {
        for (a_node, b_node) in candidates.iter().zip(b_nodes) {
            mapping.insert(*a_node, *b_node);
        }
        if search_mapping(hashes, a_partitions, b_partitions, mapping, a, b) {
            break true;
        }
        if !candidates.next_permutation() {
            break false;
        }
    };
    for a_node in &candidates {
        mapping.remove(a_node);
    }
    hashes.push(hash);
    found
}

fn is_contained(mapping: &Mapping<'_>, a: &OwnedGraph, b: &OwnedGraph) -> bool {
    a.iter().all(|t| {
        let subject = match &t.subject {
            OwnedNamedOrBlankNode::BlankNode(node) => match mapping.get(node) {
                Some(mapped) => OwnedNamedOrBlankNode::BlankNode((*mapped).clone()),
                None => return false,
            },
            subject => subject.clone(),
        };
        let object = match &t.object {
            OwnedTerm::BlankNode(node) => match mapping.get(node) {
                Some(mapped) => OwnedTerm::BlankNode((*mapped).clone()),
                None => return false,
            },
            object => object.clone(),
        };
        b.contains(&OwnedTriple {
            subject,
            predicate: t.predicate.clone(),
            object,
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn graph(triples: &[(&str, &str, &str)]) -> OwnedGraph {
        triples
            .iter()
            .map(|(s, p, o)| {
                let subject: OwnedNamedOrBlankNode = match s.strip_prefix("_:") {
                    Some(id) => OwnedBlankNode::new(id).into(),
                    None => OwnedNamedNode::new(*s).into(),
                };
                let object: OwnedTerm = match o.strip_prefix("_:") {
                    Some(id) => OwnedBlankNode::new(id).into(),
                    None => OwnedNamedNode::new(*o).into(),
                };
                OwnedTriple::new(subject, OwnedNamedNode::new(*p), object)
            })
            .collect()
    }

    #[test]
    fn lists_with_renamed_nodes_are_isomorphic() {
        let a = graph(&[
            ("_:c1", "first", "a"),
            ("_:c1", "rest", "_:c2"),
            ("_:c2", "first", "b"),
            ("_:c2", "rest", "nil"),
            ("s", "p", "_:c1"),
        ]);
        let b = graph(&[
            ("_:y", "first", "b"),
            ("_:y", "rest", "nil"),
            ("_:x", "first", "a"),
            ("_:x", "rest", "_:y"),
            ("s", "p", "_:x"),
        ]);
        assert!(are_graphs_isomorphic(&a, &b));
    }

    #[test]
    fn swapped_list_items_are_not_isomorphic() {
        let a = graph(&[
            ("_:c1", "first", "a"),
            ("_:c1", "rest", "_:c2"),
            ("_:c2", "first", "b"),
            ("_:c2", "rest", "nil"),
        ]);
        let b = graph(&[
            ("_:c1", "first", "b"),
            ("_:c1", "rest", "_:c2"),
            ("_:c2", "first", "a"),
            ("_:c2", "rest", "nil"),
        ]);
        assert!(!are_graphs_isomorphic(&a, &b));
    }

    #[test]
    fn indistinguishable_nodes_need_a_search() {
        let a = graph(&[
            ("_:1", "p", "_:2"),
            ("_:2", "p", "_:3"),
            ("_:3", "p", "_:1"),
        ]);
        let b = graph(&[
            ("_:z", "p", "_:x"),
            ("_:x", "p", "_:y"),
            ("_:y", "p", "_:z"),
        ]);
        let c = graph(&[
            ("_:z", "p", "_:x"),
            ("_:x", "p", "_:z"),
            ("_:y", "p", "_:y"),
        ]);
        assert!(are_graphs_isomorphic(&a, &b));
        assert!(!are_graphs_isomorphic(&a, &c));
    }

    #[test]
    fn ground_triples_must_match() {
        let a = graph(&[("s", "p", "o")]);
        let b = graph(&[("s", "p", "o2")]);
        assert!(!are_graphs_isomorphic(&a, &b));
        assert!(are_graphs_isomorphic(&a, &a));
    }
}
