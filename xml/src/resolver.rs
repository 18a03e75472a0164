//! Base URIs and the resolution of references against them.

use crate::options::IriRules;
use arp_api::condition::ErrorCode;
use oxiri::{Iri, IriRef};

/// A base URI as installed by the caller or by `xml:base`.
#[derive(Debug)]
pub(crate) enum BaseUri {
    /// No base at all.
    Null,
    /// The empty string, usual for documents without retrieval URI.
    Empty,
    Relative(String),
    Malformed(String),
    /// Parsed without validation, the installing rules already checked it.
    Absolute(Iri<String>),
}

/// A resolution that hit one of the failure modes, with the value to use if the failure is tolerated.
#[derive(Debug, PartialEq, Eq)]
pub(crate) struct ResolveFailure {
    pub code: ErrorCode,
    pub message: String,
    pub fallback: String,
}

impl BaseUri {
    pub fn new(value: Option<&str>, rules: IriRules) -> Self {
        match value {
            None => BaseUri::Null,
            Some("") => BaseUri::Empty,
            Some(value) if !has_scheme(value) => BaseUri::Relative(value.to_owned()),
            Some(value) => {
                if check(value, rules).is_err() {
                    return BaseUri::Malformed(value.to_owned());
                }
                BaseUri::Absolute(Iri::parse_unchecked(value.to_owned()))
            }
        }
    }

    /// The condition to report when this base comes into use.
    pub fn install_condition(&self) -> Option<(ErrorCode, String)> {
        match self {
            BaseUri::Null => Some((
                ErrorCode::NoBaseUriSpecified,
                "no base URI: relative references cannot be resolved".to_owned(),
            )),
            BaseUri::Relative(value) => Some((
                ErrorCode::RelativeUri,
                format!("the base URI <{}> is relative", value),
            )),
            BaseUri::Malformed(value) => Some((
                ErrorCode::MalformedUri,
                format!("the base URI <{}> is malformed", value),
            )),
            BaseUri::Empty | BaseUri::Absolute(_) => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            BaseUri::Null => None,
            BaseUri::Empty => Some(""),
            BaseUri::Relative(value) | BaseUri::Malformed(value) => Some(value),
            BaseUri::Absolute(iri) => Some(iri.as_str()),
        }
    }

    /// Resolves `reference` and checks the result against `rules`.
    pub fn resolve(&self, reference: &str, rules: IriRules) -> Result<String, ResolveFailure> {
        if has_scheme(reference) {
            return match check(reference, rules) {
                Ok(()) => Ok(reference.to_owned()),
                Err(reason) => Err(ResolveFailure {
                    code: ErrorCode::MalformedUri,
                    message: format!("<{}> is malformed: {}", reference, reason),
                    fallback: reference.to_owned(),
                }),
            };
        }
        match self {
            BaseUri::Null => Err(ResolveFailure {
                code: ErrorCode::ResolvingUriAgainstNullBase,
                message: format!(
                    "the relative reference <{}> cannot be resolved without base URI",
                    reference
                ),
                fallback: reference.to_owned(),
            }),
            BaseUri::Empty => Err(ResolveFailure {
                code: ErrorCode::ResolvingUriAgainstEmptyBase,
                message: format!(
                    "the relative reference <{}> is resolved against the empty base URI",
                    reference
                ),
                fallback: reference.to_owned(),
            }),
            BaseUri::Relative(base) => Err(ResolveFailure {
                code: ErrorCode::ResolvingAgainstRelativeBase,
                message: format!(
                    "the relative reference <{}> is resolved against the relative base <{}>",
                    reference, base
                ),
                fallback: merge_path(base, reference),
            }),
            BaseUri::Malformed(base) => Err(ResolveFailure {
                code: ErrorCode::ResolvingAgainstMalformedBase,
                message: format!(
                    "the relative reference <{}> is resolved against the malformed base <{}>",
                    reference, base
                ),
                fallback: merge_path(base, reference),
            }),
            BaseUri::Absolute(iri) => match rules {
                IriRules::Strict => iri.resolve(reference).map(Iri::into_inner).map_err(|error| {
                    ResolveFailure {
                        code: ErrorCode::MalformedUri,
                        message: format!("<{}> is malformed: {}", reference, error),
                        fallback: iri.resolve_unchecked(reference).into_inner(),
                    }
                }),
                IriRules::Lax => {
                    let resolved = iri.resolve_unchecked(reference).into_inner();
                    match check_lax(reference) {
                        Ok(()) => Ok(resolved),
                        Err(reason) => Err(ResolveFailure {
                            code: ErrorCode::MalformedUri,
                            message: format!("<{}> is malformed: {}", reference, reason),
                            fallback: resolved,
                        }),
                    }
                }
            },
        }
    }
}

/// True if the reference starts with `scheme ":"`.
pub(crate) fn has_scheme(reference: &str) -> bool {
    scheme_end(reference).is_some()
}

fn scheme_end(reference: &str) -> Option<usize> {
    let end = reference.find(':')?;
    let mut chars = reference[..end].chars();
    if !chars.next()?.is_ascii_alphabetic() {
        return None;
    }
    chars
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
        .then_some(end)
}

fn check(value: &str, rules: IriRules) -> Result<(), String> {
    match rules {
        IriRules::Lax => check_lax(value),
        IriRules::Strict => {
            if has_scheme(value) {
                Iri::parse(value).map(|_| ()).map_err(|e| e.to_string())
            } else {
                IriRef::parse(value).map(|_| ()).map_err(|e| e.to_string())
            }
        }
    }
}

fn check_lax(value: &str) -> Result<(), String> {
    match value
        .chars()
        .find(|c| c.is_control() || matches!(c, '<' | '>' | '"' | '{' | '}' | '|' | '\\' | '^' | '`'))
    {
        Some(c) => Err(format!("the character {:?} is not allowed", c)),
        None => Ok(()),
    }
}

/// Fallback for bases that cannot be parsed as IRIs: the reference is appended after the last `/`.
///
/// `#foo` against `foo/` gives `foo/#foo`.
pub(crate) fn merge_path(base: &str, reference: &str) -> String {
    let base = base.split_once('#').map_or(base, |(base, _)| base);
    if reference.starts_with('#') {
        return format!("{}{}", base, reference);
    }
    let base = base.split_once('?').map_or(base, |(base, _)| base);
    if reference.is_empty() || reference.starts_with('?') {
        return format!("{}{}", base, reference);
    }
    if reference.starts_with('/') {
        return reference.to_owned();
    }
    match base.rfind('/') {
        Some(i) => format!("{}{}", &base[..=i], reference),
        None => reference.to_owned(),
    }
}
