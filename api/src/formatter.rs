//! Interfaces for RDF formatters.

use crate::model::Triple;
use std::error::Error;

/// A formatter for [`Triple`](../model/struct.Triple.html).
pub trait TriplesFormatter {
    type Error: Error;

    /// Writes a triple
    fn format(&mut self, triple: &Triple<'_>) -> Result<(), Self::Error>;
}
