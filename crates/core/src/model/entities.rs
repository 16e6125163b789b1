//! HTML character entity decoding for provider text.
//!
//! The trivia provider returns question and answer strings with HTML entities
//! (`&quot;`, `&#039;`, `&eacute;`, ...). Everything shown to a player or
//! compared for scoring goes through [`decode_entities`] first.

/// Longest entity name we try to match, excluding `&` and `;`.
const MAX_ENTITY_LEN: usize = 10;

/// Decode HTML character entities to their literal characters.
///
/// Named entities from the table below, decimal (`&#39;`) and hex (`&#x27;`)
/// references are supported. Unknown or malformed entities are left as-is.
///
/// Decoding runs to a fixpoint, so `decode_entities(decode_entities(s))`
/// always equals `decode_entities(s)` and plain text passes through unchanged.
#[must_use]
pub fn decode_entities(input: &str) -> String {
    // Every replacement is shorter than the entity it replaces, so this ends.
    let mut current = input.to_owned();
    loop {
        let next = decode_once(&current);
        if next == current {
            return current;
        }
        current = next;
    }
}

fn decode_once(input: &str) -> String {
    if !input.contains('&') {
        return input.to_owned();
    }

    let mut out = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let tail = &rest[amp..];

        match parse_entity(tail) {
            Some((ch, consumed)) => {
                out.push(ch);
                rest = &tail[consumed..];
            }
            None => {
                out.push('&');
                rest = &tail[1..];
            }
        }
    }

    out.push_str(rest);
    out
}

/// Parse an entity at the start of `s` (which begins with `&`).
///
/// Returns the decoded character and the number of bytes consumed.
fn parse_entity(s: &str) -> Option<(char, usize)> {
    let semi = s.get(1..)?.find(';')? + 1;
    let body = &s[1..semi];
    if body.is_empty() || body.len() > MAX_ENTITY_LEN {
        return None;
    }

    let ch = if let Some(num) = body.strip_prefix('#') {
        parse_numeric(num)?
    } else {
        named_entity(body)?
    };

    Some((ch, semi + 1))
}

fn parse_numeric(num: &str) -> Option<char> {
    let code = if let Some(hex) = num.strip_prefix('x').or_else(|| num.strip_prefix('X')) {
        if hex.is_empty() || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return None;
        }
        u32::from_str_radix(hex, 16).ok()?
    } else {
        if num.is_empty() || !num.chars().all(|c| c.is_ascii_digit()) {
            return None;
        }
        num.parse::<u32>().ok()?
    };

    if code == 0 {
        return None;
    }
    char::from_u32(code)
}

fn named_entity(name: &str) -> Option<char> {
    let ch = match name {
        "amp" => '&',
        "lt" => '<',
        "gt" => '>',
        "quot" => '"',
        "apos" => '\'',
        "nbsp" => '\u{00A0}',
        "shy" => '\u{00AD}',
        "copy" => '©',
        "reg" => '®',
        "trade" => '™',
        "deg" => '°',
        "plusmn" => '±',
        "times" => '×',
        "divide" => '÷',
        "micro" => 'µ',
        "para" => '¶',
        "sect" => '§',
        "middot" => '·',
        "laquo" => '«',
        "raquo" => '»',
        "iexcl" => '¡',
        "iquest" => '¿',
        "cent" => '¢',
        "pound" => '£',
        "euro" => '€',
        "yen" => '¥',
        "sup2" => '²',
        "sup3" => '³',
        "frac12" => '½',
        "frac14" => '¼',
        "frac34" => '¾',
        "ndash" => '–',
        "mdash" => '—',
        "lsquo" => '‘',
        "rsquo" => '’',
        "sbquo" => '‚',
        "ldquo" => '“',
        "rdquo" => '”',
        "bdquo" => '„',
        "hellip" => '…',
        "prime" => '′',
        "Prime" => '″',
        "bull" => '•',
        "dagger" => '†',
        "pi" => 'π',
        "Agrave" => 'À',
        "Aacute" => 'Á',
        "Acirc" => 'Â',
        "Atilde" => 'Ã',
        "Auml" => 'Ä',
        "Aring" => 'Å',
        "AElig" => 'Æ',
        "Ccedil" => 'Ç',
        "Egrave" => 'È',
        "Eacute" => 'É',
        "Ecirc" => 'Ê',
        "Euml" => 'Ë',
        "Iacute" => 'Í',
        "Iuml" => 'Ï',
        "Ntilde" => 'Ñ',
        "Oacute" => 'Ó',
        "Ocirc" => 'Ô',
        "Ouml" => 'Ö',
        "Oslash" => 'Ø',
        "Uacute" => 'Ú',
        "Uuml" => 'Ü',
        "szlig" => 'ß',
        "agrave" => 'à',
        "aacute" => 'á',
        "acirc" => 'â',
        "atilde" => 'ã',
        "auml" => 'ä',
        "aring" => 'å',
        "aelig" => 'æ',
        "ccedil" => 'ç',
        "egrave" => 'è',
        "eacute" => 'é',
        "ecirc" => 'ê',
        "euml" => 'ë',
        "igrave" => 'ì',
        "iacute" => 'í',
        "icirc" => 'î',
        "iuml" => 'ï',
        "ntilde" => 'ñ',
        "ograve" => 'ò',
        "oacute" => 'ó',
        "ocirc" => 'ô',
        "otilde" => 'õ',
        "ouml" => 'ö',
        "oslash" => 'ø',
        "ugrave" => 'ù',
        "uacute" => 'ú',
        "ucirc" => 'û',
        "uuml" => 'ü',
        "yacute" => 'ý',
        "yuml" => 'ÿ',
        _ => return None,
    };
    Some(ch)
}
