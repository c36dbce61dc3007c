//! HTML character reference decoding.

use std::borrow::Cow;

/// Longest reference body we look at before giving up on a `&`.
const MAX_REFERENCE_LEN: usize = 32;

/// Decodes named (`&amp;`) and numeric (`&#39;`, `&#x27;`) character
/// references. Unknown or malformed references are kept literally.
///
/// ```
/// use tootpack::sanitize::decode_entities;
///
/// assert_eq!(decode_entities("Tom &amp; Jerry&#39;s"), "Tom & Jerry's");
/// assert_eq!(decode_entities("&bogus; &"), "&bogus; &");
/// ```
pub fn decode_entities(input: &str) -> Cow<'_, str> {
    if !input.contains('&') {
        return Cow::Borrowed(input);
    }

    let mut out = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let after = &rest[amp + 1..];

        match decode_reference(after) {
            Some((ch, consumed)) => {
                out.push(ch);
                rest = &after[consumed..];
            }
            None => {
                out.push('&');
                rest = after;
            }
        }
    }
    out.push_str(rest);

    Cow::Owned(out)
}

/// Decodes the reference that starts right after a `&`. Returns the
/// character and the number of bytes consumed, including the `;`.
fn decode_reference(after: &str) -> Option<(char, usize)> {
    let window = &after.as_bytes()[..after.len().min(MAX_REFERENCE_LEN + 1)];
    let semi = window.iter().position(|&b| b == b';')?;
    let body = &after[..semi];

    let ch = if let Some(numeric) = body.strip_prefix('#') {
        decode_numeric(numeric)?
    } else {
        if body.is_empty() || !body.bytes().all(|b| b.is_ascii_alphanumeric()) {
            return None;
        }
        named_entity(body)?
    };

    Some((ch, semi + 1))
}

fn decode_numeric(digits: &str) -> Option<char> {
    let code = if let Some(hex) = digits.strip_prefix(['x', 'X']) {
        if hex.is_empty() || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            return None;
        }
        u32::from_str_radix(hex, 16).ok()
    } else {
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        digits.parse::<u32>().ok()
    };

    // Overflowing or invalid code points still count as a reference.
    Some(
        code.filter(|&c| c != 0)
            .and_then(char::from_u32)
            .unwrap_or(char::REPLACEMENT_CHARACTER),
    )
}

fn named_entity(name: &str) -> Option<char> {
    let ch = match name {
        "amp" | "AMP" => '&',
        "lt" | "LT" => '<',
        "gt" | "GT" => '>',
        "quot" | "QUOT" => '"',
        "apos" => '\'',
        "nbsp" => '\u{00A0}',
        "ensp" => '\u{2002}',
        "emsp" => '\u{2003}',
        "thinsp" => '\u{2009}',
        "zwnj" => '\u{200C}',
        "zwj" => '\u{200D}',
        "lrm" => '\u{200E}',
        "rlm" => '\u{200F}',
        "shy" => '\u{00AD}',
        "ndash" => '–',
        "mdash" => '—',
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
        "hellip" => '…',
        "bull" => '•',
        "middot" => '·',
        "copy" => '©',
        "reg" => '®',
        "trade" => '™',
        "deg" => '°',
        "plusmn" => '±',
        "times" => '×',
        "divide" => '÷',
        "euro" => '€',
        "pound" => '£',
        "yen" => '¥',
        "cent" => '¢',
        "sect" => '§',
        "para" => '¶',
        "iexcl" => '¡',
        "iquest" => '¿',
        "larr" => '←',
        "rarr" => '→',
        "uarr" => '↑',
        "darr" => '↓',
        "hearts" => '♥',
        _ => return None,
    };
    Some(ch)
}
