//! Identifier checks shared by the resolver and the query builders.

/// `true` for a plain SQL identifier: `[A-Za-z_][A-Za-z0-9_]*`.
pub(crate) fn is_valid_segment(segment: &str) -> bool {
    let mut chars = segment.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// `true` for a possibly qualified identifier such as `users.email`.
pub(crate) fn is_valid_identifier(ident: &str) -> bool {
    !ident.is_empty() && ident.split('.').all(is_valid_segment)
}
