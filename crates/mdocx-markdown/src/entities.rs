//! Named HTML entities.
//!
//! XML parsers only know the five predefined entities, so HTML input is
//! rewritten to Unicode first. The predefined ones are left for the parser.

use std::sync::LazyLock;

use regex::Regex;

static ENTITY_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"&([a-zA-Z][a-zA-Z0-9]*);").expect("invalid entity regex"));

static REFERENCE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"&(#?[a-zA-Z0-9]+);").expect("invalid reference regex"));

/// Replace named HTML entities with their characters.
pub fn convert_html_entities(html: &str) -> String {
    ENTITY_PATTERN
        .replace_all(html, |caps: &regex::Captures| {
            entity_to_unicode(&caps[1]).map_or_else(|| caps[0].to_owned(), str::to_owned)
        })
        .into_owned()
}

/// Decode every entity and character reference in raw text.
pub fn decode_references(text: &str) -> String {
    REFERENCE_PATTERN
        .replace_all(text, |caps: &regex::Captures| decode_entity(&caps[1]))
        .into_owned()
}

/// Decode an entity reference body (`lt`, `#x41`, `#65`) reported by the parser.
pub fn decode_entity(entity: &str) -> String {
    match entity {
        "lt" => "<".to_owned(),
        "gt" => ">".to_owned(),
        "amp" => "&".to_owned(),
        "apos" => "'".to_owned(),
        "quot" => "\"".to_owned(),
        s if s.starts_with('#') => {
            let code = if s.starts_with("#x") || s.starts_with("#X") {
                u32::from_str_radix(&s[2..], 16).ok()
            } else {
                s[1..].parse::<u32>().ok()
            };
            code.and_then(char::from_u32)
                .map_or_else(|| format!("&{entity};"), |c| c.to_string())
        }
        other => entity_to_unicode(other).map_or_else(|| format!("&{entity};"), str::to_owned),
    }
}

fn entity_to_unicode(name: &str) -> Option<&'static str> {
    Some(match name {
        "nbsp" => "\u{00a0}",
        "ensp" => "\u{2002}",
        "emsp" => "\u{2003}",
        "thinsp" => "\u{2009}",
        "shy" => "\u{00ad}",
        "mdash" => "\u{2014}",
        "ndash" => "\u{2013}",
        "ldquo" => "\u{201c}",
        "rdquo" => "\u{201d}",
        "lsquo" => "\u{2018}",
        "rsquo" => "\u{2019}",
        "bdquo" => "\u{201e}",
        "laquo" => "\u{00ab}",
        "raquo" => "\u{00bb}",
        "bull" => "\u{2022}",
        "middot" => "\u{00b7}",
        "hellip" => "\u{2026}",

        "rarr" => "\u{2192}",
        "larr" => "\u{2190}",
        "harr" => "\u{2194}",
        "uarr" => "\u{2191}",
        "darr" => "\u{2193}",

        "le" => "\u{2264}",
        "ge" => "\u{2265}",
        "ne" => "\u{2260}",
        "plusmn" => "\u{00b1}",
        "times" => "\u{00d7}",
        "divide" => "\u{00f7}",
        "deg" => "\u{00b0}",
        "micro" => "\u{00b5}",

        "copy" => "\u{00a9}",
        "reg" => "\u{00ae}",
        "trade" => "\u{2122}",
        "sect" => "\u{00a7}",
        "para" => "\u{00b6}",
        "dagger" => "\u{2020}",
        "Dagger" => "\u{2021}",

        "euro" => "\u{20ac}",
        "pound" => "\u{00a3}",
        "yen" => "\u{00a5}",
        "cent" => "\u{00a2}",

        "frac14" => "\u{00bc}",
        "frac12" => "\u{00bd}",
        "frac34" => "\u{00be}",
        "sup1" => "\u{00b9}",
        "sup2" => "\u{00b2}",
        "sup3" => "\u{00b3}",
        _ => return None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_convert_named_entities() {
        assert_eq!(
            convert_html_entities("a&nbsp;b&mdash;c &copy;"),
            "a\u{a0}b\u{2014}c \u{a9}"
        );
    }

    #[test]
    fn test_xml_entities_left_for_parser() {
        assert_eq!(convert_html_entities("&amp;&lt;&gt;"), "&amp;&lt;&gt;");
        assert_eq!(convert_html_entities("&unknown;"), "&unknown;");
    }

    #[test]
    fn test_decode_entity() {
        assert_eq!(decode_entity("lt"), "<");
        assert_eq!(decode_entity("#x41"), "A");
        assert_eq!(decode_entity("#8226"), "\u{2022}");
        assert_eq!(decode_entity("bogus"), "&bogus;");
    }

    #[test]
    fn test_decode_references() {
        assert_eq!(decode_references("a &amp; b &#x41;&hellip; &zz;"), "a & b A\u{2026} &zz;");
    }
}
