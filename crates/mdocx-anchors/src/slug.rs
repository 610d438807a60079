//! Slug and bookmark-name normalization.

/// Longest bookmark name accepted by word processors.
pub const MAX_BOOKMARK_LEN: usize = 40;

/// Convert heading text to a URL-safe slug.
///
/// Lower-cases, transliterates common accented letters, drops punctuation
/// other than hyphens, and joins words with single hyphens. The result never
/// starts or ends with a hyphen and `slugify(slugify(x)) == slugify(x)`.
#[must_use]
pub fn slugify(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let mut last_was_dash = true; // Prevents leading dash

    for c in text.trim().chars().flat_map(char::to_lowercase) {
        if let Some(ascii) = transliterate(c) {
            result.push_str(ascii);
            last_was_dash = false;
        } else if c.is_alphanumeric() {
            result.push(c);
            last_was_dash = false;
        } else if !last_was_dash && (c.is_whitespace() || c == '-' || c == '_') {
            result.push('-');
            last_was_dash = true;
        }
    }

    if result.ends_with('-') {
        result.pop();
    }
    result
}

/// ASCII replacement for accented lowercase letters.
fn transliterate(c: char) -> Option<&'static str> {
    let replacement = match c {
        'à' | 'á' | 'â' | 'ã' | 'ä' | 'å' | 'ā' | 'ă' | 'ą' => "a",
        'æ' => "ae",
        'ç' | 'ć' | 'č' => "c",
        'ď' | 'đ' | 'ð' => "d",
        'è' | 'é' | 'ê' | 'ë' | 'ē' | 'ė' | 'ę' | 'ě' => "e",
        'ğ' => "g",
        'ì' | 'í' | 'î' | 'ï' | 'ī' | 'į' | 'ı' => "i",
        'ł' | 'ľ' => "l",
        'ñ' | 'ń' | 'ň' => "n",
        'ò' | 'ó' | 'ô' | 'õ' | 'ö' | 'ø' | 'ō' | 'ő' => "o",
        'œ' => "oe",
        'ř' => "r",
        'ś' | 'š' | 'ş' => "s",
        'ß' => "ss",
        'ť' | 'ţ' => "t",
        'þ' => "th",
        'ù' | 'ú' | 'û' | 'ü' | 'ū' | 'ů' | 'ű' => "u",
        'ý' | 'ÿ' => "y",
        'ź' | 'ż' | 'ž' => "z",
        _ => return None,
    };
    Some(replacement)
}

/// Convert a slug (or any text) to a document bookmark name.
///
/// Bookmark names allow ASCII letters, digits and underscores only, must not
/// start or end with an underscore, must start with a letter and are capped
/// at [`MAX_BOOKMARK_LEN`] characters. Returns `None` when nothing usable
/// remains.
#[must_use]
pub fn bookmark_name(text: &str) -> Option<String> {
    let mut name = String::with_capacity(text.len().min(MAX_BOOKMARK_LEN + 2));
    let mut last_was_underscore = true;

    for c in text.chars() {
        if c.is_ascii_alphanumeric() {
            name.push(c);
            last_was_underscore = false;
        } else if !last_was_underscore {
            name.push('_');
            last_was_underscore = true;
        }
    }

    if name.is_empty() || name == "_" {
        return None;
    }
    if name.starts_with(|c: char| c.is_ascii_digit()) {
        name.insert_str(0, "h_");
    }
    Some(truncate_bookmark(&name, MAX_BOOKMARK_LEN))
}

/// Cut `name` to at most `max` characters without a trailing underscore.
pub(crate) fn truncate_bookmark(name: &str, max: usize) -> String {
    // ASCII only, byte slicing is safe
    let cut = &name[..name.len().min(max)];
    cut.trim_end_matches('_').to_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn is_strict_slug(s: &str) -> bool {
        !s.is_empty()
            && s.split('-')
                .all(|part| !part.is_empty() && part.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit()))
    }

    #[test]
    fn test_slugify_basic() {
        assert_eq!(slugify("Hello World"), "hello-world");
        assert_eq!(slugify("Intro Section"), "intro-section");
        assert_eq!(slugify("API Reference"), "api-reference");
    }

    #[test]
    fn test_slugify_strips_punctuation() {
        assert_eq!(slugify("What's new? (v2.0)"), "whats-new-v20");
        assert_eq!(slugify("C++ & Rust!"), "c-rust");
    }

    #[test]
    fn test_slugify_collapses_separators() {
        assert_eq!(slugify("  snake_case   and -- dashes  "), "snake-case-and-dashes");
        assert_eq!(slugify("--leading and trailing--"), "leading-and-trailing");
    }

    #[test]
    fn test_slugify_transliterates() {
        assert_eq!(slugify("Café Crème"), "cafe-creme");
        assert_eq!(slugify("Straße über Łódź"), "strasse-uber-lodz");
        assert_eq!(slugify("ÆON Œuvre"), "aeon-oeuvre");
    }

    #[test]
    fn test_slugify_keeps_non_latin_letters() {
        assert_eq!(slugify("概要 Overview"), "概要-overview");
    }

    #[test]
    fn test_slugify_empty() {
        assert_eq!(slugify(""), "");
        assert_eq!(slugify("!!!"), "");
    }

    #[test]
    fn test_slugify_idempotent() {
        let inputs = [
            "Hello World",
            "Café Crème -- Déjà vu",
            "__init__ method",
            "1. Getting Started",
            "  a  b  c  ",
            "Ünïcödé_Tëxt",
            "概要 Overview",
            "x-y_z w",
        ];
        for input in inputs {
            let once = slugify(input);
            assert_eq!(slugify(&once), once, "not idempotent for {input:?}");
        }
    }

    #[test]
    fn test_slugify_ascii_output_shape() {
        let inputs = [
            "Hello World",
            "a",
            "Chapter 10 Results",
            "  spaced   out  words ",
            "UPPER lower 123",
        ];
        for input in inputs {
            let slug = slugify(input);
            assert!(is_strict_slug(&slug), "{slug:?} from {input:?}");
        }
    }

    #[test]
    fn test_bookmark_name_basic() {
        assert_eq!(bookmark_name("intro-section"), Some("intro_section".to_owned()));
        assert_eq!(bookmark_name("hello"), Some("hello".to_owned()));
    }

    #[test]
    fn test_bookmark_name_trims_underscores() {
        assert_eq!(bookmark_name("-a--b-"), Some("a_b".to_owned()));
        assert_eq!(bookmark_name("__x__"), Some("x".to_owned()));
    }

    #[test]
    fn test_bookmark_name_leading_digit() {
        assert_eq!(bookmark_name("1-getting-started"), Some("h_1_getting_started".to_owned()));
    }

    #[test]
    fn test_bookmark_name_length_cap() {
        let long = "a-very-long-heading-that-goes-on-and-on-and-on-forever";
        let name = bookmark_name(long).unwrap();
        assert!(name.len() <= MAX_BOOKMARK_LEN);
        assert!(!name.ends_with('_'));
        assert!(name.starts_with("a_very_long"));
    }

    #[test]
    fn test_bookmark_name_rejects_empty() {
        assert_eq!(bookmark_name(""), None);
        assert_eq!(bookmark_name("概要"), None);
        assert_eq!(bookmark_name("---"), None);
    }
}
