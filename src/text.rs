use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Minúsculas y sin tildes ("F. Preñ" → "f. pren")
pub fn fold(s: &str) -> String {
    s.nfd()
        .filter(|c| !is_combining_mark(*c))
        .collect::<String>()
        .to_lowercase()
}

/// Solo letras y dígitos, para comparar nombres de columna
pub fn canonical_key(s: &str) -> String {
    fold(s).chars().filter(|c| c.is_alphanumeric()).collect()
}

/// Valores que pandas deja como texto "nan"/"none"
pub fn is_blank(s: &str) -> bool {
    let t = s.trim();
    t.is_empty() || t.eq_ignore_ascii_case("nan") || t.eq_ignore_ascii_case("none")
}

/// Identificador seguro para nombres de archivo
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_sep = false;

    for c in fold(name.trim()).chars() {
        if c.is_ascii_lowercase() || c.is_ascii_digit() {
            if pending_sep && !slug.is_empty() {
                slug.push('_');
            }
            pending_sep = false;
            slug.push(c);
        } else {
            pending_sep = true;
        }
    }

    let slug: String = slug.chars().take(80).collect();
    let slug = slug.trim_end_matches('_');
    if slug.is_empty() {
        "sheet".to_string()
    } else {
        slug.to_string()
    }
}
