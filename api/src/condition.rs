//! Condition codes, severities and the condition reports handed to [`ErrorHandler`](crate::handler::ErrorHandler)s.

use std::error::Error;
use std::fmt;

/// How a condition is handled by the parser.
#[derive(Eq, PartialEq, Ord, PartialOrd, Debug, Clone, Copy, Hash)]
pub enum Severity {
    /// Not reported, triples proceed normally.
    Ignore = 0,
    /// Reported, triples proceed normally.
    Warning = 1,
    /// Reported, triples associated with the offending construct are suppressed.
    Error = 2,
    /// Reported, then the parse is aborted.
    Fatal = 3,
}

impl Severity {
    /// Parses `ignore`, `warning`, `error`, `fatal` or their `EM_` prefixed upper case spelling.
    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.strip_prefix("EM_").unwrap_or(name);
        if name.eq_ignore_ascii_case("ignore") {
            Some(Severity::Ignore)
        } else if name.eq_ignore_ascii_case("warning") {
            Some(Severity::Warning)
        } else if name.eq_ignore_ascii_case("error") {
            Some(Severity::Error)
        } else if name.eq_ignore_ascii_case("fatal") {
            Some(Severity::Fatal)
        } else {
            None
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Severity::Ignore => "ignore",
            Severity::Warning => "warning",
            Severity::Error => "error",
            Severity::Fatal => "fatal",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

macro_rules! error_codes {
    ($($(#[$doc:meta])* $variant:ident = $code:literal => $name:literal,)*) => {
        /// A condition the parser may detect.
        ///
        /// The numeric code is stable and falls in one of four ranges that give its default severity:
        /// 1-99 ignorable, 100-199 warning, 200-299 error and 300-399 fatal.
        #[derive(Eq, PartialEq, Ord, PartialOrd, Debug, Clone, Copy, Hash)]
        #[repr(u16)]
        pub enum ErrorCode {
            $($(#[$doc])* $variant = $code,)*
        }

        impl ErrorCode {
            /// Every known condition, ordered by code.
            pub const ALL: &'static [ErrorCode] = &[$(ErrorCode::$variant,)*];

            /// The historical upper case name, e.g. `WARN_MALFORMED_URI`.
            pub fn name(self) -> &'static str {
                match self {
                    $(ErrorCode::$variant => $name,)*
                }
            }
        }
    };
}

error_codes! {
    /// The parse was started without a base URI.
    NoBaseUriSpecified = 1 => "IGN_NO_BASE_URI_SPECIFIED",
    /// `rdf:parseType="daml:collection"` was used.
    DamlCollection = 2 => "IGN_DAML_COLLECTION",
    /// A private use (`x-`) language tag.
    PrivateXmlLang = 3 => "IGN_PRIVATE_XMLLANG",
    XmlBaseUsed = 4 => "IGN_XMLBASE_USED",
    /// `xml:base` changed the result of a resolution.
    XmlBaseSignificant = 5 => "IGN_XMLBASE_SIGNIFICANT",
    /// A well-formed language tag with a primary subtag missing from the registry.
    UnregisteredXmlLang = 6 => "IGN_UNREGISTERED_XMLLANG",
    /// A language tag using extension subtags.
    XmlLangExtension = 7 => "IGN_XMLLANG_EXTENSION",

    /// The base URI is relative.
    RelativeUri = 101 => "WARN_RELATIVE_URI",
    /// The same `rdf:ID` under a different base.
    LegalReuseOfId = 102 => "WARN_LEGAL_REUSE_OF_ID",
    ProcessingInstructionInRdf = 103 => "WARN_PROCESSING_INSTRUCTION_IN_RDF",
    /// An `rdf:ID` resolving to an URI already defined in the document.
    RedefinitionOfId = 104 => "WARN_REDEFINITION_OF_ID",
    MalformedXmlLang = 105 => "WARN_MALFORMED_XMLLANG",
    DeprecatedXmlLang = 106 => "WARN_DEPRECATED_XMLLANG",
    /// Controls the non standard constructs that are refused in strict mode.
    InStrictMode = 107 => "WARN_IN_STRICT_MODE",
    /// A warning from the XML layer.
    XmlWarning = 108 => "WARN_XML_WARNING",
    ResolvingUriAgainstEmptyBase = 109 => "WARN_RESOLVING_URI_AGAINST_EMPTY_BASE",
    RelativeNamespaceUriDeprecated = 110 => "WARN_RELATIVE_NAMESPACE_URI_DEPRECATED",
    /// `about`, `ID`... used without the `rdf:` prefix.
    UnqualifiedRdfAttribute = 111 => "WARN_UNQUALIFIED_RDF_ATTRIBUTE",
    /// An attribute without namespace, read in the namespace of its element.
    UnqualifiedAttribute = 112 => "WARN_UNQUALIFIED_ATTRIBUTE",
    UnknownRdfElement = 113 => "WARN_UNKNOWN_RDF_ELEMENT",
    UnknownRdfAttribute = 114 => "WARN_UNKNOWN_RDF_ATTRIBUTE",
    UnknownParseType = 115 => "WARN_UNKNOWN_PARSETYPE",
    /// An `rdf:ID` or `rdf:nodeID` that looks like a qualified name.
    QNameAsId = 116 => "WARN_QNAME_AS_ID",
    /// An `rdf:ID` or `rdf:nodeID` that is not an XML name.
    BadName = 117 => "WARN_BAD_NAME",
    UnknownXmlAttribute = 118 => "WARN_UNKNOWN_XML_ATTRIBUTE",
    /// An inconsistency in the event stream the parser can work around.
    MinorInternalError = 119 => "WARN_MINOR_INTERNAL_ERROR",
    /// A node element named `rdf:_n`.
    RdfNnAsType = 120 => "WARN_RDF_NN_AS_TYPE",
    BadRdfNamespaceUri = 121 => "WARN_BAD_RDF_NAMESPACE_URI",
    BadXmlNamespaceUri = 122 => "WARN_BAD_XML_NAMESPACE_URI",
    MalformedUri = 123 => "WARN_MALFORMED_URI",
    /// Too many `rdf:ID`s: duplicates are no longer detected.
    IdCheckDisabled = 124 => "WARN_ID_CHECK_DISABLED",
    UnsupportedEncoding = 125 => "WARN_UNSUPPORTED_ENCODING",
    NoncanonicalIanaName = 126 => "WARN_NONCANONICAL_IANA_NAME",

    SyntaxError = 201 => "ERR_SYNTAX_ERROR",
    /// A reserved RDF element name in a position where it is not allowed.
    BadRdfElement = 202 => "ERR_BAD_RDF_ELEMENT",
    /// A reserved RDF attribute name in a position where it is not allowed.
    BadRdfAttribute = 203 => "ERR_BAD_RDF_ATTRIBUTE",
    NotWhitespace = 204 => "ERR_NOT_WHITESPACE",
    ResolvingUriAgainstNullBase = 205 => "ERR_RESOLVING_URI_AGAINST_NULL_BASE",
    ResolvingAgainstMalformedBase = 206 => "ERR_RESOLVING_AGAINST_MALFORMED_BASE",
    ResolvingAgainstRelativeBase = 207 => "ERR_RESOLVING_AGAINST_RELATIVE_BASE",
    GenericIo = 208 => "ERR_GENERIC_IO",
    /// A recoverable error of the XML layer.
    XmlError = 209 => "ERR_XML_ERROR",
    /// An element without namespace in RDF content.
    UnqualifiedElement = 210 => "ERR_UNQUALIFIED_ELEMENT",

    /// A well-formedness error of the XML layer.
    XmlFatal = 301 => "ERR_XML_FATAL",
    /// The underlying read was interrupted.
    Interrupted = 302 => "ERR_INTERRUPTED",
    UnableToRecover = 303 => "ERR_UNABLE_TO_RECOVER",
}

impl ErrorCode {
    pub fn code(self) -> u16 {
        self as u16
    }

    pub fn from_code(code: u16) -> Option<Self> {
        Self::ALL.iter().copied().find(|c| c.code() == code)
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|c| c.name() == name)
    }

    /// The severity given by the code range.
    pub fn default_severity(self) -> Severity {
        match self.code() / 100 {
            0 => Severity::Ignore,
            1 => Severity::Warning,
            2 => Severity::Error,
            _ => Severity::Fatal,
        }
    }

    /// Locked codes are always fatal whatever the configuration.
    pub fn is_locked(self) -> bool {
        matches!(
            self,
            ErrorCode::XmlFatal | ErrorCode::Interrupted | ErrorCode::UnableToRecover
        )
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A position in the parsed document.
#[derive(Eq, PartialEq, Debug, Clone, Default, Hash)]
pub struct Location {
    /// The URI or file name of the input, if known.
    pub system_id: Option<String>,
    /// 1-based line, 0 if unknown.
    pub line: u64,
    /// 1-based column, 0 if unknown.
    pub column: u64,
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(system_id) = &self.system_id {
            write!(f, "{}:", system_id)?;
        }
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// A condition detected by the parser.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct ParseCondition {
    pub code: ErrorCode,
    pub message: String,
    pub location: Location,
}

impl fmt::Display for ParseCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{{}}} {}: {}", self.code, self.location, self.message)
    }
}

impl Error for ParseCondition {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_round_trip_through_the_table() {
        for code in ErrorCode::ALL {
            assert_eq!(ErrorCode::from_name(code.name()), Some(*code));
            assert_eq!(ErrorCode::from_code(code.code()), Some(*code));
        }
        assert_eq!(ErrorCode::from_name("WARN_NOT_A_CODE"), None);
    }

    #[test]
    fn code_ranges_match_name_prefixes() {
        for code in ErrorCode::ALL {
            let expected = match code.default_severity() {
                Severity::Ignore => "IGN_",
                Severity::Warning => "WARN_",
                Severity::Error | Severity::Fatal => "ERR_",
            };
            assert!(code.name().starts_with(expected), "{}", code);
        }
    }

    #[test]
    fn severity_names() {
        assert_eq!(Severity::from_name("EM_FATAL"), Some(Severity::Fatal));
        assert_eq!(Severity::from_name("warning"), Some(Severity::Warning));
        assert_eq!(Severity::from_name("loud"), None);
    }
}
