//! In-process evaluation of [`Filter`]s, mirroring the SQL semantics the
//! PostgreSQL backend compiles them to.

use std::borrow::Cow;

use serde_json::Value;

use gamerent_core::types::{Document, Filter, FilterField, FilterOp};

/// Whether `doc` satisfies every condition of `filter`.
pub fn matches(filter: &Filter, doc: &Document) -> bool {
    filter.fields.iter().all(|field| matches_field(field, doc))
}

fn matches_field(field: &FilterField, doc: &Document) -> bool {
    let Some(actual) = doc.field_value(&field.field) else {
        return false;
    };
    match field.op {
        FilterOp::Eq => actual == field.value,
        FilterOp::Like | FilterOp::ILike => match (&actual, &field.value) {
            (Value::String(text), Value::String(pattern)) => {
                like(pattern, text, field.op == FilterOp::ILike)
            }
            _ => false,
        },
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Token {
    AnyRun,
    AnyOne,
    Literal(char),
}

fn tokenize(pattern: &str, fold: bool) -> Vec<Token> {
    let mut tokens = Vec::with_capacity(pattern.len());
    let mut chars = pattern.chars();
    while let Some(c) = chars.next() {
        let token = match c {
            '%' => Token::AnyRun,
            '_' => Token::AnyOne,
            '\\' => Token::Literal(chars.next().unwrap_or('\\')),
            other => Token::Literal(other),
        };
        tokens.push(match token {
            Token::Literal(c) if fold => Token::Literal(fold_char(c)),
            t => t,
        });
    }
    tokens
}

fn fold_char(c: char) -> char {
    c.to_lowercase().next().unwrap_or(c)
}

/// Turn a dangling trailing `\` into an escaped literal backslash.
///
/// PostgreSQL rejects a pattern ending in the escape character; [`like`]
/// reads it as a literal, so both backends bind this form.
pub fn close_trailing_escape(pattern: &str) -> Cow<'_, str> {
    let trailing = pattern.chars().rev().take_while(|&c| c == '\\').count();
    if trailing % 2 == 1 {
        Cow::Owned(format!("{pattern}\\"))
    } else {
        Cow::Borrowed(pattern)
    }
}

/// SQL `LIKE` matching: `%` matches any run, `_` one character, `\` escapes.
pub fn like(pattern: &str, text: &str, case_insensitive: bool) -> bool {
    let tokens = tokenize(pattern, case_insensitive);
    let text: Vec<char> = if case_insensitive {
        text.chars().map(fold_char).collect()
    } else {
        text.chars().collect()
    };

    // reachable[j]: tokens so far can consume exactly text[..j]
    let mut reachable = vec![false; text.len() + 1];
    reachable[0] = true;
    for token in tokens {
        let mut next = vec![false; text.len() + 1];
        match token {
            Token::AnyRun => {
                let mut seen = false;
                for j in 0..=text.len() {
                    seen |= reachable[j];
                    next[j] = seen;
                }
            }
            Token::AnyOne => {
                for j in 0..text.len() {
                    next[j + 1] = reachable[j];
                }
            }
            Token::Literal(c) => {
                for j in 0..text.len() {
                    next[j + 1] = reachable[j] && text[j] == c;
                }
            }
        }
        reachable = next;
    }
    reachable[text.len()]
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_like_wildcards() {
        assert!(like("zel%", "zelda", false));
        assert!(like("%da", "zelda", false));
        assert!(like("z_lda", "zelda", false));
        assert!(like("%", "", false));
        assert!(!like("_", "", false));
        assert!(!like("zel", "zelda", false));
        assert!(!like("ZEL%", "zelda", false));
        assert!(like("ZEL%", "zelda", true));
        assert!(like("100\\%", "100%", false));
        assert!(!like("100\\%", "1000", false));
    }

    #[test]
    fn test_close_trailing_escape() {
        assert_eq!(close_trailing_escape("abc"), "abc");
        assert_eq!(close_trailing_escape("abc\\"), "abc\\\\");
        assert_eq!(close_trailing_escape("abc\\\\"), "abc\\\\");
        assert_eq!(close_trailing_escape("\\"), "\\\\");

        for pattern in ["abc\\", "%\\"] {
            let closed = close_trailing_escape(pattern);
            assert_eq!(like(pattern, "abc\\", false), like(&closed, "abc\\", false));
            assert!(like(&closed, "abc\\", false));
        }
    }

    #[test]
    fn test_matches_conjunction() {
        let doc = Document::new(
            json!({"title": "Zelda", "owner": "alice"})
                .as_object()
                .cloned()
                .unwrap(),
        );

        assert!(matches(&Filter::all(), &doc));
        assert!(matches(&Filter::all().eq("owner", "alice").like("title", "Z%"), &doc));
        assert!(!matches(&Filter::all().eq("owner", "bob").like("title", "Z%"), &doc));
        assert!(matches(&Filter::by_id(doc.id), &doc));
        assert!(!matches(&Filter::all().eq("missing", "x"), &doc));
        assert!(!matches(&Filter::all().like("owner", "%").eq("version", 2), &doc));
    }
}
