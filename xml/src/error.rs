use arp_api::condition::{ErrorCode, ParseCondition};
use arp_api::handler::HandlerError;
use std::io;
use std::sync::Arc;

/// Error that might be returned by a parse.
///
/// Conditions configured below `Fatal` are never returned here: they are only reported to the
/// [`ErrorHandler`](arp_api::handler::ErrorHandler).
#[derive(Debug, thiserror::Error)]
pub enum ArpError {
    /// The input is not well-formed XML.
    #[error(transparent)]
    Xml(quick_xml::Error),
    /// The input stream failed.
    #[error(transparent)]
    Io(#[from] io::Error),
    /// A condition whose configured severity is `Fatal`.
    #[error("fatal error {0}")]
    Fatal(ParseCondition),
    /// A condition the error handler asked to promote.
    #[error("promoted error {0}")]
    Promoted(ParseCondition),
    /// A handler callback failed.
    #[error(transparent)]
    Handler(#[from] HandlerError),
}

impl ArpError {
    /// The condition behind a `Fatal` or `Promoted` error.
    pub fn condition(&self) -> Option<&ParseCondition> {
        match self {
            ArpError::Fatal(condition) | ArpError::Promoted(condition) => Some(condition),
            _ => None,
        }
    }

    pub fn code(&self) -> Option<ErrorCode> {
        self.condition().map(|c| c.code)
    }
}

impl From<quick_xml::Error> for ArpError {
    fn from(error: quick_xml::Error) -> Self {
        match error {
            quick_xml::Error::Io(error) => ArpError::Io(
                Arc::try_unwrap(error).unwrap_or_else(|e| io::Error::new(e.kind(), e.to_string())),
            ),
            error => ArpError::Xml(error),
        }
    }
}

/// A configuration property could not be applied.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OptionError {
    #[error("unknown parser property {0}")]
    UnknownProperty(String),
    #[error("invalid value {value:?} for parser property {name}")]
    InvalidValue { name: String, value: String },
}
