//! Validation and normalisation of URL-safe identifiers ("slugs").
//!
//! [`validate`] accepts the RFC 3986 "unreserved" character set plus
//! well-formed percent-encoded triplets. [`normalise`] is stricter than
//! [`validate`]: it rewrites arbitrary text down to lowercase ASCII letters,
//! digits and hyphens, which is the alphabet used for slugs derived from
//! titles.

use deunicode::deunicode;
use thiserror::Error;

/// Tests a slug for validity.
///
/// A slug is valid if it is non-empty and contains only characters from the
/// RFC 3986 unreserved set (ASCII letters, digits, `-`, `.`, `_`, `~`) plus
/// percent-encoded triplets. A `%` that is not followed by exactly two hex
/// digits invalidates the slug.
///
/// Capital letters, periods, underscores and tildes are accepted but
/// discouraged; [`normalise`] never emits them.
pub fn validate(slug: &str) -> bool {
    if slug.is_empty() {
        return false;
    }

    let bytes = slug.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'a'..=b'z' | b'A'..=b'Z' | b'0'..=b'9' | b'-' | b'.' | b'_' | b'~' => i += 1,
            b'%' => {
                if i + 2 >= bytes.len()
                    || !bytes[i + 1].is_ascii_hexdigit()
                    || !bytes[i + 2].is_ascii_hexdigit()
                {
                    return false;
                }
                i += 3;
            }
            _ => return false,
        }
    }
    true
}

/// Rewrites `slug` to contain only characters from `[a-z0-9-]`.
///
/// The transform is lossy: lowercase; turn separator punctuation (em/en
/// dashes, `/`, `:`, `;`, `,`, `.`, `~`, `_`) into hyphens; drop
/// percent-encoded triplets; transliterate non-ASCII to the closest ASCII;
/// drop anything still outside `[-a-z0-9 ]`; turn spaces into hyphens;
/// collapse hyphen runs; trim hyphens from both ends.
///
/// Normalisation is idempotent, and every successful output passes
/// [`validate`].
pub fn normalise(slug: &str) -> Result<String, Error> {
    let lowered = slug.to_lowercase();

    // Separator punctuation becomes a hyphen so word boundaries survive.
    let mut separated = String::with_capacity(lowered.len());
    for c in lowered.chars() {
        match c {
            '\u{2014}' | '\u{2013}' | '/' | ':' | ';' | ',' | '.' | '~' | '_' => {
                separated.push('-')
            }
            _ => separated.push(c),
        }
    }

    // Percent-encoded triplets collapse to a hyphen rather than leaking
    // their hex digits into the slug.
    let mut stripped = String::with_capacity(separated.len());
    let bytes = separated.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%'
            && i + 2 < bytes.len()
            && bytes[i + 1].is_ascii_hexdigit()
            && bytes[i + 2].is_ascii_hexdigit()
        {
            stripped.push('-');
            i += 3;
        } else {
            // `separated` is valid UTF-8; multi-byte characters never start
            // with b'%', so byte-wise stepping only needs char boundaries.
            let rest = &separated[i..];
            let c = match rest.chars().next() {
                Some(c) => c,
                None => break,
            };
            stripped.push(c);
            i += c.len_utf8();
        }
    }

    let ascii = deunicode(&stripped);

    let mut cleaned = String::with_capacity(ascii.len());
    for c in ascii.chars() {
        match c {
            'a'..='z' | '0'..='9' | '-' => cleaned.push(c),
            ' ' => cleaned.push('-'),
            _ => {}
        }
    }

    let mut collapsed = String::with_capacity(cleaned.len());
    for c in cleaned.chars() {
        if c == '-' && collapsed.ends_with('-') {
            continue;
        }
        collapsed.push(c);
    }

    let trimmed = collapsed.trim_matches('-');
    if trimmed.is_empty() {
        return Err(Error::Empty {
            input: slug.to_owned(),
        });
    }
    Ok(trimmed.to_owned())
}

/// Represents a failed slug normalisation.
#[derive(Debug, Error)]
pub enum Error {
    /// Returned when normalisation leaves nothing behind, i.e. the input
    /// contained no retainable characters.
    #[error("slug is empty after normalising {input:?}")]
    Empty { input: String },
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_validate_accepts_unreserved_characters() {
        for slug in ["simple", "Mixed-Case", "dots.and_underscores~", "a1-b2"] {
            assert!(validate(slug), "{:?} should be valid", slug);
        }
    }

    #[test]
    fn test_validate_accepts_percent_triplets() {
        assert!(validate("hello%20world"));
        assert!(validate("%C3%A9"));
    }

    #[test]
    fn test_validate_rejects_bad_percent() {
        assert!(!validate("50%"));
        assert!(!validate("a%2"));
        assert!(!validate("a%zz-b"));
    }

    #[test]
    fn test_validate_rejects_empty_and_reserved() {
        assert!(!validate(""));
        assert!(!validate("with space"));
        assert!(!validate("question?mark"));
        assert!(!validate("slash/slash"));
    }

    #[test]
    fn test_normalise_basic() -> Result<(), Error> {
        assert_eq!(normalise("Hello, World!")?, "hello-world");
        assert_eq!(normalise("a few words here")?, "a-few-words-here");
        Ok(())
    }

    #[test]
    fn test_normalise_separators_become_hyphens() -> Result<(), Error> {
        assert_eq!(normalise("one/two:three;four")?, "one-two-three-four");
        assert_eq!(normalise("em\u{2014}dash en\u{2013}dash")?, "em-dash-en-dash");
        assert_eq!(normalise("dots.under_scores~tilde")?, "dots-under-scores-tilde");
        Ok(())
    }

    #[test]
    fn test_normalise_strips_percent_triplets() -> Result<(), Error> {
        assert_eq!(normalise("hello%20world")?, "hello-world");
        Ok(())
    }

    #[test]
    fn test_normalise_transliterates() -> Result<(), Error> {
        assert_eq!(normalise("Café au lait")?, "cafe-au-lait");
        assert_eq!(normalise("naïve résumé")?, "naive-resume");
        Ok(())
    }

    #[test]
    fn test_normalise_collapses_and_trims_hyphens() -> Result<(), Error> {
        assert_eq!(normalise("--lots---of----hyphens--")?, "lots-of-hyphens");
        Ok(())
    }

    #[test]
    fn test_normalise_empty_result_is_an_error() {
        assert!(normalise("???").is_err());
        assert!(normalise("").is_err());
    }

    #[test]
    fn test_normalise_is_idempotent() -> Result<(), Error> {
        for input in ["Hello, World!", "Café au lait", "a%20b", "X/Y/Z"] {
            let once = normalise(input)?;
            assert_eq!(normalise(&once)?, once);
        }
        Ok(())
    }

    #[test]
    fn test_normalise_output_validates() -> Result<(), Error> {
        for input in ["Hello, World!", "Café au lait", "a%20b", "X/Y/Z"] {
            assert!(validate(&normalise(input)?));
        }
        Ok(())
    }
}
