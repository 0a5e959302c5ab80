use regex::Regex;

/// Compile a name glob into an anchored regex.
///
/// `*` matches any run of characters, `?` exactly one; everything else is
/// literal. Matching is case-sensitive over the whole name.
pub fn glob_to_regex(pattern: &str) -> Result<Regex, regex::Error> {
    let mut expr = String::with_capacity(pattern.len() + 8);
    expr.push('^');
    let mut literal = String::new();
    for ch in pattern.chars() {
        match ch {
            '*' | '?' => {
                expr.push_str(&regex::escape(&literal));
                literal.clear();
                expr.push_str(if ch == '*' { "(?s:.*)" } else { "(?s:.)" });
            }
            other => literal.push(other),
        }
    }
    expr.push_str(&regex::escape(&literal));
    expr.push('$');
    Regex::new(&expr)
}

/// Whether `name` matches the glob `pattern`. A pattern that cannot be compiled matches nothing.
pub fn glob_matches(pattern: &str, name: &str) -> bool {
    match glob_to_regex(pattern) {
        Ok(re) => re.is_match(name),
        Err(e) => {
            tracing::warn!(pattern = %pattern, error = %e, "Ignoring uncompilable name pattern");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_star_and_question_mark() {
        assert!(glob_matches("dev-*", "dev-web-1"));
        assert!(glob_matches("dev-*", "dev-"));
        assert!(!glob_matches("dev-*", "prod-web-1"));
        assert!(glob_matches("web-?", "web-1"));
        assert!(!glob_matches("web-?", "web-12"));
    }

    #[test]
    fn test_whole_name_and_case_sensitive() {
        assert!(!glob_matches("web", "web-1"));
        assert!(!glob_matches("Web-*", "web-1"));
        assert!(glob_matches("*", ""));
    }

    #[test]
    fn test_regex_metacharacters_are_literal() {
        assert!(glob_matches("a.b+(c)", "a.b+(c)"));
        assert!(!glob_matches("a.b", "axb"));
        assert!(glob_matches("[tmp]*", "[tmp]-cache"));
    }
}
