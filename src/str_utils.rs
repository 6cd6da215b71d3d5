/// Utility functions for string processing, particularly SQL statement handling

/// Check if a position in SQL is inside quotes (handles both single and double quotes)
pub fn is_in_quotes(sql: &str, pos: usize) -> bool {
    let mut in_single_quote = false;
    let mut in_double_quote = false;
    let mut escaped = false;

    for ch in sql.chars().take(pos + 1) {
        if escaped {
            escaped = false;
            continue;
        }

        match ch {
            '\\' => escaped = true,
            '\'' => {
                if !in_double_quote {
                    in_single_quote = !in_single_quote;
                }
            }
            '"' => {
                if !in_single_quote {
                    in_double_quote = !in_double_quote;
                }
            }
            _ => {}
        }
    }

    in_single_quote || in_double_quote
}

/// Count positional `?` placeholders that are not inside quoted literals
pub fn count_placeholders(sql: &str) -> usize {
    sql.char_indices()
        .filter(|(idx, ch)| *ch == '?' && !is_in_quotes(sql, *idx))
        .count()
}

/// Build a `?, ?, ?` placeholder list
pub fn placeholder_list(count: usize) -> String {
    vec!["?"; count].join(", ")
}

/// Build a `a=?, b=?` assignment list (or `a=? AND b=?` with an other separator)
pub fn assignment_list(fields: &[String], separator: &str) -> String {
    fields
        .iter()
        .map(|field| format!("{field}=?"))
        .collect::<Vec<_>>()
        .join(separator)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_count_placeholders_skips_quoted() {
        assert_eq!(count_placeholders("SELECT * FROM t WHERE a=? AND b=?"), 2);
        assert_eq!(count_placeholders("SELECT '?' FROM t WHERE a=?"), 1);
        assert_eq!(count_placeholders("SELECT \"what?\" FROM t"), 0);
    }

    #[test]
    fn test_placeholder_list() {
        assert_eq!(placeholder_list(3), "?, ?, ?");
        assert_eq!(placeholder_list(0), "");
    }

    #[test]
    fn test_assignment_list() {
        let fields = vec!["a".to_string(), "b".to_string()];
        assert_eq!(assignment_list(&fields, ", "), "a=?, b=?");
        assert_eq!(assignment_list(&fields, " AND "), "a=? AND b=?");
    }
}
