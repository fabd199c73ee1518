//! SQL identifier and predicate validation.
//!
//! Caller-supplied table names are quoted as identifiers and filter
//! expressions must be a single self-contained predicate fragment before
//! either is placed into query text.

use crate::errors::{AppError, AppResult};

/// Validates and quotes caller-supplied SQL fragments.
pub struct SqlValidator;

/// Keywords that may not appear outside quotes in a predicate fragment.
const FORBIDDEN_KEYWORDS: [&str; 10] = [
    "DROP", "TRUNCATE", "DELETE", "ALTER", "INSERT", "UPDATE", "CREATE", "GRANT", "REVOKE",
    "COPY",
];

impl SqlValidator {
    /// Quotes `name` as a double-quoted identifier.
    ///
    /// # Errors
    /// Returns `AppError::InvalidArgument` for empty names or names containing NUL.
    pub fn quote_identifier(name: &str) -> AppResult<String> {
        if name.is_empty() {
            return Err(AppError::InvalidArgument("identifier must not be empty".into()));
        }
        if name.contains('\0') {
            return Err(AppError::InvalidArgument(format!(
                "identifier contains NUL: {:?}",
                name
            )));
        }
        Ok(format!("\"{}\"", name.replace('"', "\"\"")))
    }

    /// Quotes `schema.unit` as a qualified name.
    pub fn qualified_name(schema: &str, unit: &str) -> AppResult<String> {
        Ok(format!(
            "{}.{}",
            Self::quote_identifier(schema)?,
            Self::quote_identifier(unit)?
        ))
    }

    /// Checks that `predicate` is a single predicate fragment.
    ///
    /// Outside string literals and quoted identifiers the fragment may not
    /// contain statement separators, comments, unbalanced parentheses or any of
    /// the forbidden keywords; every literal and quoted identifier must be closed.
    ///
    /// # Errors
    /// Returns `AppError::InvalidArgument` describing the first violation.
    pub fn validate_predicate(predicate: &str) -> AppResult<()> {
        let reject = |reason: &str| {
            Err(AppError::InvalidArgument(format!(
                "invalid filter expression ({}): {}",
                reason, predicate
            )))
        };

        let chars: Vec<char> = predicate.chars().collect();
        let mut depth: i32 = 0;
        let mut word = String::new();
        let mut i = 0;

        while i < chars.len() {
            let c = chars[i];

            if c.is_alphanumeric() || c == '_' {
                word.push(c);
                i += 1;
                continue;
            }
            if Self::is_forbidden(&word) {
                return reject("forbidden keyword");
            }
            // E'...' literals take backslash escapes.
            let escape_string = c == '\'' && word.eq_ignore_ascii_case("e");
            word.clear();

            match c {
                '\'' | '"' => match Self::closing_quote(&chars, i, escape_string) {
                    Some(end) => {
                        i = end + 1;
                        continue;
                    }
                    None => return reject("unterminated quote"),
                },
                ';' => return reject("statement separator"),
                '$' => return reject("dollar quoting"),
                '-' if chars.get(i + 1) == Some(&'-') => return reject("comment"),
                '/' if chars.get(i + 1) == Some(&'*') => return reject("comment"),
                '(' => depth += 1,
                ')' => {
                    depth -= 1;
                    if depth < 0 {
                        return reject("unbalanced parentheses");
                    }
                }
                _ => {}
            }
            i += 1;
        }

        if Self::is_forbidden(&word) {
            return reject("forbidden keyword");
        }
        if depth != 0 {
            return reject("unbalanced parentheses");
        }
        Ok(())
    }

    /// Index of the quote closing the one at `start`; doubled quotes are escapes,
    /// and so is any backslash pair when `backslash_escapes` is set.
    fn closing_quote(chars: &[char], start: usize, backslash_escapes: bool) -> Option<usize> {
        let quote = chars[start];
        let mut j = start + 1;
        while j < chars.len() {
            if backslash_escapes && chars[j] == '\\' {
                j += 2;
                continue;
            }
            if chars[j] == quote {
                if chars.get(j + 1) == Some(&quote) {
                    j += 2;
                    continue;
                }
                return Some(j);
            }
            j += 1;
        }
        None
    }

    fn is_forbidden(word: &str) -> bool {
        !word.is_empty()
            && FORBIDDEN_KEYWORDS
                .iter()
                .any(|kw| kw.eq_ignore_ascii_case(word))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quote_identifier_doubles_quotes() {
        assert_eq!(SqlValidator::quote_identifier("orders").unwrap(), "\"orders\"");
        assert_eq!(
            SqlValidator::quote_identifier("we\"ird").unwrap(),
            "\"we\"\"ird\""
        );
        assert!(SqlValidator::quote_identifier("").is_err());
        assert!(SqlValidator::quote_identifier("a\0b").is_err());
    }

    #[test]
    fn test_qualified_name() {
        assert_eq!(
            SqlValidator::qualified_name("public", "Orders").unwrap(),
            "\"public\".\"Orders\""
        );
    }

    #[test]
    fn test_plain_predicates_are_allowed() {
        assert!(SqlValidator::validate_predicate("id = 1").is_ok());
        assert!(SqlValidator::validate_predicate("name = 'O''Brien' AND (age > 3)").is_ok());
        assert!(SqlValidator::validate_predicate("\"updated_at\" IS NOT NULL").is_ok());
        assert!(SqlValidator::validate_predicate("note = 'drop; -- here'").is_ok());
        assert!(SqlValidator::validate_predicate("created_by = 'x' OR dropped = true").is_ok());
    }

    #[test]
    fn test_statement_escapes_are_rejected() {
        assert!(SqlValidator::validate_predicate("1=1; DROP TABLE users").is_err());
        assert!(SqlValidator::validate_predicate("1=1 -- trailing").is_err());
        assert!(SqlValidator::validate_predicate("1=1 /* c */").is_err());
        assert!(SqlValidator::validate_predicate("1=1) OR (1=1").is_err());
        assert!(SqlValidator::validate_predicate("(1=1").is_err());
        assert!(SqlValidator::validate_predicate("name = 'open").is_err());
        assert!(SqlValidator::validate_predicate("id IN (SELECT 1) OR delete").is_err());
    }

    #[test]
    fn test_escape_string_literals_end_where_postgres_ends_them() {
        assert!(SqlValidator::validate_predicate(r"x = E'\'' --'").is_err());
        assert!(SqlValidator::validate_predicate(r"x = E'\'' ) OR (true --'").is_err());
        assert!(SqlValidator::validate_predicate(r"x = e'\\' OR drop_me = 1; '").is_err());

        assert!(SqlValidator::validate_predicate(r"x = E'it\'s' AND y = 'a\'").is_ok());
        assert!(SqlValidator::validate_predicate(r"x = E'tab\there' OR (y = E'')").is_ok());
        // Without the prefix a backslash is literal text.
        assert!(SqlValidator::validate_predicate(r"path = 'C:\'").is_ok());
    }

    #[test]
    fn test_dollar_quoting_is_rejected() {
        assert!(SqlValidator::validate_predicate("x = $$'$$ OR true; DROP TABLE t; '").is_err());
        assert!(SqlValidator::validate_predicate("x = $tag$ -- $tag$").is_err());
        assert!(SqlValidator::validate_predicate("price = '$5'").is_ok());
    }
}
