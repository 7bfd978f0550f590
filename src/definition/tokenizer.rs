//! Tokenisation of the definition DSL.
//!
//! Double-quoted string literals are lifted out first and replaced with
//! `@@<index>@@` placeholder tokens (identical literals share a placeholder),
//! so punctuation inside them cannot be mis-tokenised. The remaining text is
//! padded around structural characters and split on whitespace. Malformed
//! input is not an error at this stage; it surfaces as a parse error later.

use ahash::AHashMap;
use std::collections::VecDeque;

pub(super) struct TokenStream {
    tokens: VecDeque<String>,
    placeholders: AHashMap<String, String>,
}

impl TokenStream {
    pub(super) fn next(&mut self) -> Option<String> {
        self.tokens.pop_front()
    }

    pub(super) fn peek(&self) -> Option<&str> {
        self.tokens.front().map(String::as_str)
    }

    pub(super) fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// The original string literal behind a placeholder token, if the token is
    /// one.
    pub(super) fn literal(&self, token: &str) -> Option<&str> {
        self.placeholders.get(token).map(String::as_str)
    }

    pub(super) fn brace_counts(&self) -> (usize, usize) {
        let open = self.tokens.iter().filter(|t| t.as_str() == "{").count();
        let close = self.tokens.iter().filter(|t| t.as_str() == "}").count();
        (open, close)
    }
}

pub(super) fn tokenize(definition: &str) -> TokenStream {
    let (substituted, placeholders) = substitute_string_literals(definition);

    let mut padded = String::with_capacity(substituted.len());
    for character in substituted.chars() {
        match character {
            '(' | ')' | '{' | '}' | '[' | ']' | ',' => {
                padded.push(' ');
                padded.push(character);
                padded.push(' ');
            }
            other => padded.push(other),
        }
    }

    TokenStream {
        tokens: padded.split_whitespace().map(str::to_string).collect(),
        placeholders,
    }
}

/// Replaces every double-quoted literal (escaped quotes supported) with a
/// `@@<index>@@` placeholder, deduplicating identical literals.
fn substitute_string_literals(definition: &str) -> (String, AHashMap<String, String>) {
    let mut placeholders: AHashMap<String, String> = AHashMap::new();
    let mut assigned: AHashMap<String, String> = AHashMap::new();
    let mut output = String::with_capacity(definition.len());
    let mut characters = definition.chars();

    while let Some(character) = characters.next() {
        if character != '"' {
            output.push(character);
            continue;
        }

        let mut literal = String::new();
        let mut escaped = false;
        for inner in characters.by_ref() {
            if escaped {
                literal.push(inner);
                escaped = false;
            } else if inner == '\\' {
                escaped = true;
            } else if inner == '"' {
                break;
            } else {
                literal.push(inner);
            }
        }

        let token = assigned.entry(literal.clone()).or_insert_with(|| {
            let token = format!("@@{}@@", placeholders.len());
            placeholders.insert(token.clone(), literal);
            token
        });
        output.push_str(token);
    }

    (output, placeholders)
}
