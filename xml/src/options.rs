//! Parser configuration: severity table, IRI rules and embedding.
//!
//! Every value here is plain data: clone it to share a configuration between parsers.

use crate::error::OptionError;
use arp_api::condition::{ErrorCode, Severity};
use std::fmt;

const TABLE_SIZE: usize = 400;

/// Conditions that stay at a non error severity in strict mode.
const STYLISTIC_WARNINGS: [ErrorCode; 7] = [
    ErrorCode::MinorInternalError,
    ErrorCode::DeprecatedXmlLang,
    ErrorCode::UnknownRdfElement,
    ErrorCode::UnknownRdfAttribute,
    ErrorCode::QNameAsId,
    ErrorCode::XmlWarning,
    ErrorCode::IdCheckDisabled,
];

/// Conditions that take the caller chosen non error severity in strict mode.
const NON_ERRORS: [ErrorCode; 4] = [
    ErrorCode::ProcessingInstructionInRdf,
    ErrorCode::LegalReuseOfId,
    ErrorCode::RdfNnAsType,
    ErrorCode::UnknownXmlAttribute,
];

/// The severity of each condition.
///
/// ```
/// use arp_xml::ErrorModes;
/// use arp_api::condition::{ErrorCode, Severity};
///
/// let mut modes = ErrorModes::strict();
/// assert_eq!(modes.mode(ErrorCode::UnqualifiedAttribute), Severity::Error);
/// modes.set_mode(ErrorCode::UnqualifiedAttribute, Severity::Warning);
/// modes.promote_all(Severity::Error, Severity::Fatal);
/// assert_eq!(modes.mode(ErrorCode::SyntaxError), Severity::Fatal);
/// assert_eq!(modes.mode(ErrorCode::UnqualifiedAttribute), Severity::Warning);
/// ```
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct ErrorModes {
    modes: [Severity; TABLE_SIZE],
}

impl ErrorModes {
    /// Every condition at the severity of its code range.
    pub fn new() -> Self {
        let mut modes = [Severity::Ignore; TABLE_SIZE];
        for code in ErrorCode::ALL {
            modes[usize::from(code.code())] = code.default_severity();
        }
        Self { modes }
    }

    /// Warnings are ignored, except internal inconsistencies.
    pub fn lax() -> Self {
        let mut modes = Self::new();
        for code in ErrorCode::ALL {
            if code.default_severity() == Severity::Warning && *code != ErrorCode::MinorInternalError
            {
                modes.set_mode(*code, Severity::Ignore);
            }
        }
        modes
    }

    /// Warnings become errors, except a few stylistic ones.
    pub fn strict() -> Self {
        Self::strict_with(Severity::Ignore)
    }

    /// Strict mode where ignorable and stylistic conditions get `non_error`.
    pub fn strict_with(non_error: Severity) -> Self {
        let mut modes = Self::new();
        for code in ErrorCode::ALL {
            match code.default_severity() {
                Severity::Ignore => {
                    modes.set_mode(*code, non_error);
                }
                Severity::Warning => {
                    modes.set_mode(*code, Severity::Error);
                }
                Severity::Error | Severity::Fatal => (),
            }
        }
        let warning = match non_error {
            Severity::Error | Severity::Fatal => non_error,
            Severity::Ignore | Severity::Warning => Severity::Warning,
        };
        for code in STYLISTIC_WARNINGS {
            modes.set_mode(code, warning);
        }
        for code in NON_ERRORS {
            modes.set_mode(code, non_error);
        }
        modes
    }

    pub fn mode(&self, code: ErrorCode) -> Severity {
        if code.is_locked() {
            Severity::Fatal
        } else {
            self.modes[usize::from(code.code())]
        }
    }

    /// Sets the severity of a condition and returns the previous one.
    ///
    /// Locked conditions keep their severity.
    pub fn set_mode(&mut self, code: ErrorCode, severity: Severity) -> Severity {
        let previous = self.mode(code);
        if !code.is_locked() {
            self.modes[usize::from(code.code())] = severity;
        }
        previous
    }

    /// Moves every condition currently at `from` to `to`.
    pub fn promote_all(&mut self, from: Severity, to: Severity) {
        for code in ErrorCode::ALL {
            if self.mode(*code) == from {
                self.set_mode(*code, to);
            }
        }
    }
}

impl Default for ErrorModes {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ErrorModes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(ErrorCode::ALL.iter().map(|code| (code.name(), self.mode(*code))))
            .finish()
    }
}

/// The rule set used to decide whether an URI is malformed.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash, Default)]
pub enum IriRules {
    /// Only characters that can never appear in a reference are refused, spaces are allowed.
    #[default]
    Lax,
    /// Full RFC 3987 IRI syntax.
    Strict,
}

/// The configuration of a parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ParserOptions {
    pub error_modes: ErrorModes,
    /// If true, RDF content is searched for as `rdf:RDF` elements anywhere in the XML document.
    /// Otherwise the root element is either `rdf:RDF` or the only top-level node element.
    pub embedding: bool,
    pub iri_rules: IriRules,
}

impl ParserOptions {
    /// Applies a named property.
    ///
    /// `error-mode`, `embedding` and `iri-rules` are recognized, and every condition name
    /// (e.g. `WARN_MALFORMED_URI`) with a severity name as value.
    ///
    /// ```
    /// use arp_xml::ParserOptions;
    /// use arp_api::condition::{ErrorCode, Severity};
    ///
    /// let mut options = ParserOptions::default();
    /// options.set_property("error-mode", "strict").unwrap();
    /// options.set_property("WARN_MALFORMED_URI", "EM_WARNING").unwrap();
    /// assert_eq!(options.error_modes.mode(ErrorCode::MalformedUri), Severity::Warning);
    /// assert!(options.set_property("colour", "blue").is_err());
    /// ```
    pub fn set_property(&mut self, name: &str, value: &str) -> Result<(), OptionError> {
        let invalid = || OptionError::InvalidValue {
            name: name.to_owned(),
            value: value.to_owned(),
        };
        match name {
            "error-mode" => {
                self.error_modes = match value {
                    "default" => ErrorModes::new(),
                    "lax" => ErrorModes::lax(),
                    "strict" => ErrorModes::strict(),
                    "strict-ignore" => ErrorModes::strict_with(Severity::Ignore),
                    "strict-warning" => ErrorModes::strict_with(Severity::Warning),
                    "strict-error" => ErrorModes::strict_with(Severity::Error),
                    "strict-fatal" => ErrorModes::strict_with(Severity::Fatal),
                    _ => return Err(invalid()),
                }
            }
            "embedding" => {
                self.embedding = value.parse().map_err(|_| invalid())?;
            }
            "iri-rules" => {
                self.iri_rules = match value {
                    "lax" => IriRules::Lax,
                    "strict" | "iri" => IriRules::Strict,
                    _ => return Err(invalid()),
                }
            }
            _ => {
                let code = ErrorCode::from_name(name)
                    .ok_or_else(|| OptionError::UnknownProperty(name.to_owned()))?;
                let severity = Severity::from_name(value).ok_or_else(invalid)?;
                self.error_modes.set_mode(code, severity);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_follows_code_ranges() {
        let modes = ErrorModes::new();
        assert_eq!(modes.mode(ErrorCode::XmlBaseUsed), Severity::Ignore);
        assert_eq!(modes.mode(ErrorCode::UnqualifiedAttribute), Severity::Warning);
        assert_eq!(modes.mode(ErrorCode::NotWhitespace), Severity::Error);
        assert_eq!(modes.mode(ErrorCode::Interrupted), Severity::Fatal);
    }

    #[test]
    fn lax_keeps_internal_warnings() {
        let modes = ErrorModes::lax();
        assert_eq!(modes.mode(ErrorCode::UnqualifiedAttribute), Severity::Ignore);
        assert_eq!(modes.mode(ErrorCode::MinorInternalError), Severity::Warning);
        assert_eq!(modes.mode(ErrorCode::SyntaxError), Severity::Error);
    }

    #[test]
    fn strict_promotes_structural_warnings() {
        let modes = ErrorModes::strict();
        assert_eq!(modes.mode(ErrorCode::UnqualifiedAttribute), Severity::Error);
        assert_eq!(modes.mode(ErrorCode::UnknownParseType), Severity::Error);
        assert_eq!(modes.mode(ErrorCode::DeprecatedXmlLang), Severity::Warning);
        assert_eq!(modes.mode(ErrorCode::RdfNnAsType), Severity::Ignore);
        assert_eq!(modes.mode(ErrorCode::XmlBaseUsed), Severity::Ignore);
    }

    #[test]
    fn strict_with_error_moves_stylistic_warnings() {
        let modes = ErrorModes::strict_with(Severity::Error);
        assert_eq!(modes.mode(ErrorCode::DeprecatedXmlLang), Severity::Error);
        assert_eq!(modes.mode(ErrorCode::RdfNnAsType), Severity::Error);
        assert_eq!(modes.mode(ErrorCode::XmlBaseUsed), Severity::Error);
    }

    #[test]
    fn locked_codes_cannot_be_changed() {
        let mut modes = ErrorModes::new();
        assert_eq!(modes.set_mode(ErrorCode::XmlFatal, Severity::Ignore), Severity::Fatal);
        assert_eq!(modes.mode(ErrorCode::XmlFatal), Severity::Fatal);
        assert_eq!(
            modes.set_mode(ErrorCode::NotWhitespace, Severity::Warning),
            Severity::Error
        );
        assert_eq!(modes.mode(ErrorCode::NotWhitespace), Severity::Warning);
    }

    #[test]
    fn properties() {
        let mut options = ParserOptions::default();
        options.set_property("embedding", "true").unwrap();
        options.set_property("iri-rules", "strict").unwrap();
        options.set_property("error-mode", "lax").unwrap();
        assert!(options.embedding);
        assert_eq!(options.iri_rules, IriRules::Strict);
        assert_eq!(options.error_modes, ErrorModes::lax());
        assert_eq!(
            options.set_property("embedding", "maybe"),
            Err(OptionError::InvalidValue {
                name: "embedding".into(),
                value: "maybe".into()
            })
        );
        assert_eq!(
            options.set_property("WARN_NOPE", "ignore"),
            Err(OptionError::UnknownProperty("WARN_NOPE".into()))
        );
    }
}
