//! Character reference matching.
//!
//! Only references terminated by `;` are decoded. The named table is a
//! deliberately small compile-time map; anything it does not know stays
//! source text, which the writer escapes on output.

use phf::phf_map;

/// Longest name in [`NAMED`].
const MAX_NAME_LEN: usize = 8;
const MAX_DECIMAL_DIGITS: usize = 7;
const MAX_HEX_DIGITS: usize = 6;

static NAMED: phf::Map<&'static str, char> = phf_map! {
    "amp" => '&',
    "lt" => '<',
    "gt" => '>',
    "quot" => '"',
    "apos" => '\'',
    "nbsp" => '\u{a0}',
    "shy" => '\u{ad}',
    "copy" => '©',
    "reg" => '®',
    "trade" => '™',
    "hellip" => '…',
    "mdash" => '—',
    "ndash" => '–',
    "lsquo" => '‘',
    "rsquo" => '’',
    "sbquo" => '‚',
    "ldquo" => '“',
    "rdquo" => '”',
    "bdquo" => '„',
    "laquo" => '«',
    "raquo" => '»',
    "lsaquo" => '‹',
    "rsaquo" => '›',
    "bull" => '•',
    "middot" => '·',
    "deg" => '°',
    "plusmn" => '±',
    "times" => '×',
    "divide" => '÷',
    "micro" => 'µ',
    "euro" => '€',
    "pound" => '£',
    "yen" => '¥',
    "cent" => '¢',
    "curren" => '¤',
    "sect" => '§',
    "para" => '¶',
    "iexcl" => '¡',
    "iquest" => '¿',
    "frac12" => '½',
    "frac14" => '¼',
    "frac34" => '¾',
    "sup1" => '¹',
    "sup2" => '²',
    "sup3" => '³',
    "ensp" => '\u{2002}',
    "emsp" => '\u{2003}',
    "thinsp" => '\u{2009}',
    "zwnj" => '\u{200c}',
    "zwj" => '\u{200d}',
    "lrm" => '\u{200e}',
    "rlm" => '\u{200f}',
    "larr" => '←',
    "rarr" => '→',
    "uarr" => '↑',
    "darr" => '↓',
    "harr" => '↔',
    "colon" => ':',
    "sol" => '/',
    "bsol" => '\\',
    "lpar" => '(',
    "rpar" => ')',
    "lsqb" => '[',
    "rsqb" => ']',
    "lcub" => '{',
    "rcub" => '}',
    "excl" => '!',
    "num" => '#',
    "dollar" => '$',
    "percnt" => '%',
    "ast" => '*',
    "plus" => '+',
    "comma" => ',',
    "period" => '.',
    "semi" => ';',
    "equals" => '=',
    "quest" => '?',
    "commat" => '@',
    "lowbar" => '_',
    "grave" => '`',
    "verbar" => '|',
    "Tab" => '\t',
    "NewLine" => '\n',
};

/// Outcome of matching at an `&`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum RefMatch {
    /// `len` source bytes, starting at the `&`, decode to `ch`.
    Decoded { ch: char, len: usize },
    /// The buffered bytes are a prefix of a possible reference.
    NeedMore,
    /// The `&` is literal text.
    NotReference,
}

/// Looks up a named reference without the surrounding `&` and `;`.
pub fn decode_named(name: &str) -> Option<char> {
    NAMED.get(name).copied()
}

/// Matches a reference at the start of `bytes`, which begins with `&`.
///
/// When the bytes run out before the reference is decided, the answer is
/// [`RefMatch::NeedMore`] unless `at_end`, in which case the `&` is text.
pub(crate) fn match_reference(bytes: &[u8], at_end: bool) -> RefMatch {
    debug_assert_eq!(bytes.first(), Some(&b'&'));
    match bytes.get(1) {
        None => undecided(at_end),
        Some(b'#') => match_numeric(bytes, at_end),
        Some(b) if b.is_ascii_alphanumeric() => match_named(bytes, at_end),
        Some(_) => RefMatch::NotReference,
    }
}

fn undecided(at_end: bool) -> RefMatch {
    if at_end {
        RefMatch::NotReference
    } else {
        RefMatch::NeedMore
    }
}

fn match_named(bytes: &[u8], at_end: bool) -> RefMatch {
    let mut end = 1;
    loop {
        match bytes.get(end) {
            None => return undecided(at_end),
            Some(b) if b.is_ascii_alphanumeric() => {
                if end > MAX_NAME_LEN {
                    return RefMatch::NotReference;
                }
                end += 1;
            }
            Some(b';') => {
                // Names are ASCII, so the slice is valid UTF-8.
                let name = std::str::from_utf8(&bytes[1..end]).unwrap_or_default();
                return match decode_named(name) {
                    Some(ch) => RefMatch::Decoded { ch, len: end + 1 },
                    None => RefMatch::NotReference,
                };
            }
            Some(_) => return RefMatch::NotReference,
        }
    }
}

fn match_numeric(bytes: &[u8], at_end: bool) -> RefMatch {
    let (radix, first_digit, max_digits) = match bytes.get(2) {
        None => return undecided(at_end),
        Some(b'x' | b'X') => (16, 3, MAX_HEX_DIGITS),
        Some(_) => (10, 2, MAX_DECIMAL_DIGITS),
    };
    let mut value: u32 = 0;
    let mut end = first_digit;
    loop {
        let Some(&b) = bytes.get(end) else {
            return undecided(at_end);
        };
        if let Some(digit) = char::from(b).to_digit(radix) {
            if end - first_digit == max_digits {
                return RefMatch::NotReference;
            }
            value = value * radix + digit;
            end += 1;
            continue;
        }
        if b != b';' || end == first_digit {
            return RefMatch::NotReference;
        }
        let ch = if value == 0 {
            char::REPLACEMENT_CHARACTER
        } else {
            match char::from_u32(value) {
                Some(ch) => ch,
                None => return RefMatch::NotReference,
            }
        };
        return RefMatch::Decoded { ch, len: end + 1 };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decoded(input: &str) -> Option<(char, usize)> {
        match match_reference(input.as_bytes(), true) {
            RefMatch::Decoded { ch, len } => Some((ch, len)),
            _ => None,
        }
    }

    #[test]
    fn named_references_need_semicolon() {
        assert_eq!(decoded("&amp;x"), Some(('&', 5)));
        assert_eq!(decoded("&nbsp;"), Some(('\u{a0}', 6)));
        assert_eq!(decoded("&NewLine;"), Some(('\n', 9)));
        assert_eq!(decoded("&amp x"), None);
        assert_eq!(decoded("&AMP;"), None);
        assert_eq!(decoded("&bogus;"), None);
        assert_eq!(decoded("& "), None);
    }

    #[test]
    fn numeric_references() {
        assert_eq!(decoded("&#60;"), Some(('<', 5)));
        assert_eq!(decoded("&#x3C;"), Some(('<', 6)));
        assert_eq!(decoded("&#X3c;"), Some(('<', 6)));
        assert_eq!(decoded("&#0;"), Some((char::REPLACEMENT_CHARACTER, 4)));
        assert_eq!(decoded("&#x10FFFF;"), Some(('\u{10FFFF}', 10)));
    }

    #[test]
    fn invalid_numeric_references_stay_text() {
        assert_eq!(decoded("&#xD800;"), None);
        assert_eq!(decoded("&#x110000;"), None);
        assert_eq!(decoded("&#;"), None);
        assert_eq!(decoded("&#x;"), None);
        assert_eq!(decoded("&#12345678;"), None);
        assert_eq!(decoded("&#x1234567;"), None);
        assert_eq!(decoded("&#60"), None);
    }

    #[test]
    fn undecided_prefixes_wait_for_input() {
        for prefix in ["&", "&a", "&am", "&amp", "&#", "&#x", "&#x3", "&#6"] {
            assert_eq!(
                match_reference(prefix.as_bytes(), false),
                RefMatch::NeedMore,
                "{prefix}"
            );
            assert_eq!(
                match_reference(prefix.as_bytes(), true),
                RefMatch::NotReference,
                "{prefix}"
            );
        }
    }

    #[test]
    fn overlong_names_are_decided_without_more_input() {
        assert_eq!(
            match_reference(b"&abcdefghij", false),
            RefMatch::NotReference
        );
        assert_eq!(match_reference(b"&#12345678", false), RefMatch::NotReference);
    }

    #[test]
    fn table_names_fit_the_lookahead_bound() {
        for name in NAMED.keys() {
            assert!(name.len() <= MAX_NAME_LEN, "{name}");
            assert!(name.bytes().all(|b| b.is_ascii_alphanumeric()), "{name}");
        }
    }
}
