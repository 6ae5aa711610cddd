//! Identifier quoting shared by every dialect.

/// Quote `schema_name` + `table_name` (concatenated, no separator) as a
/// single identifier delimited by `quote`.
///
/// Whitespace and `;` are dropped, embedded quote characters are doubled.
/// Returns an empty string when both names are empty. Never fails.
pub fn quote_identifier(quote: char, schema_name: &str, table_name: &str) -> String {
    if schema_name.is_empty() && table_name.is_empty() {
        return String::new();
    }

    let mut quoted = String::with_capacity(schema_name.len() + table_name.len() + 2);
    quoted.push(quote);
    for c in schema_name.chars().chain(table_name.chars()) {
        if c.is_whitespace() || c == ';' {
            continue;
        }
        if c == quote {
            quoted.push(quote);
        }
        quoted.push(c);
    }
    quoted.push(quote);
    quoted
}
