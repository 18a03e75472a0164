//! `xml:lang` checks.
//!
//! Tags are kept verbatim, these checks only decide which condition, if any, a tag raises.

use arp_api::condition::ErrorCode;
use oxilangtag::LanguageTag;

/// Deprecated ISO 639 codes and grandfathered tags, lowercase.
const DEPRECATED: [&str; 31] = [
    "art-lojban",
    "cel-gaulish",
    "en-gb-oed",
    "i-ami",
    "i-bnn",
    "i-default",
    "i-enochian",
    "i-hak",
    "i-klingon",
    "i-lux",
    "i-mingo",
    "i-navajo",
    "i-pwn",
    "i-tao",
    "i-tay",
    "i-tsu",
    "in",
    "iw",
    "ji",
    "jw",
    "mo",
    "no-bok",
    "no-nyn",
    "sgn-be-fr",
    "sgn-be-nl",
    "sgn-ch-de",
    "zh-guoyu",
    "zh-hakka",
    "zh-min",
    "zh-min-nan",
    "zh-xiang",
];

/// ISO 639-1 codes, sorted.
const ISO_639_1: [&str; 184] = [
    "aa", "ab", "ae", "af", "ak", "am", "an", "ar", "as", "av", "ay", "az", "ba", "be", "bg",
    "bh", "bi", "bm", "bn", "bo", "br", "bs", "ca", "ce", "ch", "co", "cr", "cs", "cu", "cv",
    "cy", "da", "de", "dv", "dz", "ee", "el", "en", "eo", "es", "et", "eu", "fa", "ff", "fi",
    "fj", "fo", "fr", "fy", "ga", "gd", "gl", "gn", "gu", "gv", "ha", "he", "hi", "ho", "hr",
    "ht", "hu", "hy", "hz", "ia", "id", "ie", "ig", "ii", "ik", "io", "is", "it", "iu", "ja",
    "jv", "ka", "kg", "ki", "kj", "kk", "kl", "km", "kn", "ko", "kr", "ks", "ku", "kv", "kw",
    "ky", "la", "lb", "lg", "li", "ln", "lo", "lt", "lu", "lv", "mg", "mh", "mi", "mk", "ml",
    "mn", "mr", "ms", "mt", "my", "na", "nb", "nd", "ne", "ng", "nl", "nn", "no", "nr", "nv",
    "ny", "oc", "oj", "om", "or", "os", "pa", "pi", "pl", "ps", "pt", "qu", "rm", "rn", "ro",
    "ru", "rw", "sa", "sc", "sd", "se", "sg", "si", "sk", "sl", "sm", "sn", "so", "sq", "sr",
    "ss", "st", "su", "sv", "sw", "ta", "te", "tg", "th", "ti", "tk", "tl", "tn", "to", "tr",
    "ts", "tt", "tw", "ty", "ug", "uk", "ur", "uz", "ve", "vi", "vo", "wa", "wo", "xh", "yi",
    "yo", "za", "zh", "zu",
];

/// The condition raised by an `xml:lang` value, if any. The empty tag resets the language and is always fine.
pub(crate) fn check_language(tag: &str) -> Option<(ErrorCode, String)> {
    if tag.is_empty() {
        return None;
    }
    let lower = tag.to_ascii_lowercase();
    let primary = lower.split('-').next().unwrap_or_default();
    if DEPRECATED.contains(&lower.as_str()) || DEPRECATED.contains(&primary) {
        return Some((
            ErrorCode::DeprecatedXmlLang,
            format!("the language tag {:?} is deprecated", tag),
        ));
    }
    if primary == "x" {
        return Some((
            ErrorCode::PrivateXmlLang,
            format!("the language tag {:?} is for private use", tag),
        ));
    }
    let parsed = match LanguageTag::parse(lower.as_str()) {
        Ok(parsed) => parsed,
        Err(error) => {
            return Some((
                ErrorCode::MalformedXmlLang,
                format!("the language tag {:?} is malformed: {}", tag, error),
            ))
        }
    };
    if parsed.extension().is_some() {
        return Some((
            ErrorCode::XmlLangExtension,
            format!("the language tag {:?} uses extension subtags", tag),
        ));
    }
    let registered = match primary.len() {
        2 => ISO_639_1.binary_search(&primary).is_ok(),
        3 => true,
        _ => false,
    };
    if registered {
        None
    } else {
        Some((
            ErrorCode::UnregisteredXmlLang,
            format!("the primary language subtag {:?} is not registered", primary),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn code(tag: &str) -> Option<ErrorCode> {
        check_language(tag).map(|(code, _)| code)
    }

    #[test]
    fn registry_is_sorted() {
        assert!(ISO_639_1.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn valid_tags_raise_nothing() {
        for tag in ["", "en", "en-US", "EN-us", "fr-CA", "zh-Hant-TW", "haw", "de-CH-1996"] {
            assert_eq!(code(tag), None, "{}", tag);
        }
    }

    #[test]
    fn three_levels_of_non_conformance() {
        assert_eq!(code("en_US"), Some(ErrorCode::MalformedXmlLang));
        assert_eq!(code("-en"), Some(ErrorCode::MalformedXmlLang));
        assert_eq!(code("qq"), Some(ErrorCode::UnregisteredXmlLang));
        assert_eq!(code("iw"), Some(ErrorCode::DeprecatedXmlLang));
        assert_eq!(code("i-klingon"), Some(ErrorCode::DeprecatedXmlLang));
    }

    #[test]
    fn private_use_and_extensions() {
        assert_eq!(code("x-klingon"), Some(ErrorCode::PrivateXmlLang));
        assert_eq!(code("en-a-bbb-x-a-ccc"), Some(ErrorCode::XmlLangExtension));
    }
}
