//! Text helpers shared by the catalog handlers and the report engine:
//! ASCII transliteration for locale-stable sort keys, sprintf-style value
//! templates from the column config, person-name composition, and LIKE
//! pattern escaping.

/// Strip diacritics and transliterate to ASCII.
///
/// Sort keys are compared byte-wise, so "Dvořák" and "Dvorak" must land
/// next to each other regardless of database collation. ASCII passes
/// through unchanged; unmapped non-Latin characters are kept as-is rather
/// than dropped, which keeps distinct titles distinct.
pub fn transliterate(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for ch in input.chars() {
        if ch.is_ascii() {
            out.push(ch);
            continue;
        }
        match ch {
            'À' | 'Á' | 'Â' | 'Ã' | 'Ä' | 'Å' | 'Ā' | 'Ă' | 'Ą' => out.push('A'),
            'à' | 'á' | 'â' | 'ã' | 'ä' | 'å' | 'ā' | 'ă' | 'ą' => out.push('a'),
            'Æ' => out.push_str("AE"),
            'æ' => out.push_str("ae"),
            'Ç' | 'Ć' | 'Ĉ' | 'Ċ' | 'Č' => out.push('C'),
            'ç' | 'ć' | 'ĉ' | 'ċ' | 'č' => out.push('c'),
            'Ď' | 'Đ' | 'Ð' => out.push('D'),
            'ď' | 'đ' | 'ð' => out.push('d'),
            'È' | 'É' | 'Ê' | 'Ë' | 'Ē' | 'Ĕ' | 'Ė' | 'Ę' | 'Ě' => out.push('E'),
            'è' | 'é' | 'ê' | 'ë' | 'ē' | 'ĕ' | 'ė' | 'ę' | 'ě' => out.push('e'),
            'Ĝ' | 'Ğ' | 'Ġ' | 'Ģ' => out.push('G'),
            'ĝ' | 'ğ' | 'ġ' | 'ģ' => out.push('g'),
            'Ĥ' | 'Ħ' => out.push('H'),
            'ĥ' | 'ħ' => out.push('h'),
            'Ì' | 'Í' | 'Î' | 'Ï' | 'Ĩ' | 'Ī' | 'Ĭ' | 'Į' | 'İ' => out.push('I'),
            'ì' | 'í' | 'î' | 'ï' | 'ĩ' | 'ī' | 'ĭ' | 'į' | 'ı' => out.push('i'),
            'Ĵ' => out.push('J'),
            'ĵ' => out.push('j'),
            'Ķ' => out.push('K'),
            'ķ' => out.push('k'),
            'Ĺ' | 'Ļ' | 'Ľ' | 'Ŀ' | 'Ł' => out.push('L'),
            'ĺ' | 'ļ' | 'ľ' | 'ŀ' | 'ł' => out.push('l'),
            'Ñ' | 'Ń' | 'Ņ' | 'Ň' => out.push('N'),
            'ñ' | 'ń' | 'ņ' | 'ň' => out.push('n'),
            'Ò' | 'Ó' | 'Ô' | 'Õ' | 'Ö' | 'Ø' | 'Ō' | 'Ŏ' | 'Ő' => out.push('O'),
            'ò' | 'ó' | 'ô' | 'õ' | 'ö' | 'ø' | 'ō' | 'ŏ' | 'ő' => out.push('o'),
            'Œ' => out.push_str("OE"),
            'œ' => out.push_str("oe"),
            'Ŕ' | 'Ŗ' | 'Ř' => out.push('R'),
            'ŕ' | 'ŗ' | 'ř' => out.push('r'),
            'Ś' | 'Ŝ' | 'Ş' | 'Š' => out.push('S'),
            'ś' | 'ŝ' | 'ş' | 'š' => out.push('s'),
            'ß' => out.push_str("ss"),
            'Ţ' | 'Ť' | 'Ŧ' => out.push('T'),
            'ţ' | 'ť' | 'ŧ' => out.push('t'),
            'Þ' => out.push_str("Th"),
            'þ' => out.push_str("th"),
            'Ù' | 'Ú' | 'Û' | 'Ü' | 'Ũ' | 'Ū' | 'Ŭ' | 'Ů' | 'Ű' | 'Ų' => out.push('U'),
            'ù' | 'ú' | 'û' | 'ü' | 'ũ' | 'ū' | 'ŭ' | 'ů' | 'ű' | 'ų' => out.push('u'),
            'Ŵ' => out.push('W'),
            'ŵ' => out.push('w'),
            'Ý' | 'Ŷ' | 'Ÿ' => out.push('Y'),
            'ý' | 'ÿ' | 'ŷ' => out.push('y'),
            'Ź' | 'Ż' | 'Ž' => out.push('Z'),
            'ź' | 'ż' | 'ž' => out.push('z'),
            other => out.push(other),
        }
    }
    out
}

/// Apply a sprintf-style template from the column config to a value.
///
/// Supports `%s`, `%d`, and zero-padded `%0<width>d`; everything else in
/// the template passes through literally (`%%` escapes a percent sign).
/// Numeric conversions fall back to the raw text when the value does not
/// parse, so a template never loses data.
pub fn format_template(template: &str, value: &str) -> String {
    let mut out = String::with_capacity(template.len() + value.len());
    let mut chars = template.chars().peekable();
    while let Some(ch) = chars.next() {
        if ch != '%' {
            out.push(ch);
            continue;
        }
        match chars.peek() {
            Some('%') => {
                chars.next();
                out.push('%');
            }
            Some('s') => {
                chars.next();
                out.push_str(value);
            }
            Some('d') => {
                chars.next();
                match value.trim().parse::<i64>() {
                    Ok(n) => out.push_str(&n.to_string()),
                    Err(_) => out.push_str(value),
                }
            }
            Some('0') => {
                // %0<width>d
                chars.next();
                let mut width = String::new();
                while let Some(c) = chars.peek() {
                    if c.is_ascii_digit() {
                        width.push(*c);
                        chars.next();
                    } else {
                        break;
                    }
                }
                if chars.peek() == Some(&'d') {
                    chars.next();
                    let width: usize = width.parse().unwrap_or(0);
                    match value.trim().parse::<i64>() {
                        Ok(n) => out.push_str(&format!("{:0width$}", n, width = width)),
                        Err(_) => out.push_str(value),
                    }
                } else {
                    out.push('%');
                    out.push('0');
                    out.push_str(&width);
                }
            }
            _ => out.push('%'),
        }
    }
    out
}

/// Compose a person display name as "Last, First (dates)".
///
/// Empty components are omitted along with their punctuation.
pub fn compose_person_name(last: &str, first: &str, dates: &str) -> String {
    let mut name = last.trim().to_string();
    let first = first.trim();
    let dates = dates.trim();
    if !first.is_empty() {
        if !name.is_empty() {
            name.push_str(", ");
        }
        name.push_str(first);
    }
    if !dates.is_empty() {
        if !name.is_empty() {
            name.push(' ');
        }
        name.push('(');
        name.push_str(dates);
        name.push(')');
    }
    name
}

/// Escape `%`, `_`, and the escape character itself in user input headed
/// into a LIKE pattern (queries use `ESCAPE '\'`).
pub fn escape_like(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for ch in input.chars() {
        if ch == '%' || ch == '_' || ch == '\\' {
            out.push('\\');
        }
        out.push(ch);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transliterate_strips_diacritics() {
        assert_eq!(transliterate("Dvořák"), "Dvorak");
        assert_eq!(transliterate("Saint-Saëns"), "Saint-Saens");
        assert_eq!(transliterate("Müller"), "Muller");
        assert_eq!(transliterate("plain ascii"), "plain ascii");
    }

    #[test]
    fn transliterate_expands_ligatures() {
        assert_eq!(transliterate("Strauß"), "Strauss");
        assert_eq!(transliterate("Œuvre"), "OEuvre");
    }

    #[test]
    fn format_template_pads_keys() {
        assert_eq!(format_template("%06d", "42"), "000042");
        assert_eq!(format_template("ML-%04d", "7"), "ML-0007");
        assert_eq!(format_template("%s copies", "3"), "3 copies");
        assert_eq!(format_template("100%%", ""), "100%");
    }

    #[test]
    fn format_template_keeps_unparseable_values() {
        assert_eq!(format_template("%06d", "n/a"), "n/a");
    }

    #[test]
    fn person_name_omits_empty_parts() {
        assert_eq!(
            compose_person_name("Bach", "Johann Sebastian", "1685-1750"),
            "Bach, Johann Sebastian (1685-1750)"
        );
        assert_eq!(compose_person_name("Anonymous", "", ""), "Anonymous");
        assert_eq!(compose_person_name("Holst", "", "1874-1934"), "Holst (1874-1934)");
        assert_eq!(compose_person_name("", "", ""), "");
    }

    #[test]
    fn escape_like_neutralizes_wildcards() {
        assert_eq!(escape_like("100% pure"), "100\\% pure");
        assert_eq!(escape_like("under_score"), "under\\_score");
        assert_eq!(escape_like(r"back\slash"), r"back\\slash");
    }
}
