use std::collections::HashMap;

use crate::{diff::Diff, traits::Symbol};

/// Granularity at which text is reduced to tokens before diffing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenMode {
    /// A run of non-whitespace plus the whitespace that follows it.
    Word,
    /// Text up to a `.`, `!` or `?` followed by whitespace, including that whitespace.
    Sentence,
    /// Text up to and including a blank line.
    Paragraph,
    /// Text up to and including a `\n`.
    Line,
}

/// Two texts rewritten as token ids, and the table to turn them back.
/// Id `0` is never handed out; `tokens[0]` is an empty sentinel.
#[derive(Debug)]
pub(crate) struct Tokenized<'a, T> {
    pub(crate) old: Vec<usize>,
    pub(crate) new: Vec<usize>,
    pub(crate) tokens: Vec<&'a [T]>,
}

pub(crate) fn tokenize<'a, T: Symbol>(
    old: &'a [T],
    new: &'a [T],
    mode: TokenMode,
) -> Tokenized<'a, T> {
    let mut tokens: Vec<&'a [T]> = vec![&[]];
    let mut ids: HashMap<&'a [T], usize> = HashMap::new();

    let mut encode = |text: &'a [T]| -> Vec<usize> {
        split(text, mode)
            .map(|token| {
                *ids.entry(token).or_insert_with(|| {
                    tokens.push(token);
                    tokens.len() - 1
                })
            })
            .collect()
    };

    let old = encode(old);
    let new = encode(new);

    Tokenized { old, new, tokens }
}

/// Replaces every token id in a token-level diff with the text it stands for.
pub(crate) fn detokenize<T: Symbol>(diffs: &[Diff<usize>], tokens: &[&[T]]) -> Vec<Diff<T>> {
    diffs
        .iter()
        .map(|diff| {
            let text = diff
                .data()
                .iter()
                .filter_map(|&id| tokens.get(id))
                .flat_map(|token| token.iter().copied())
                .collect::<Vec<_>>();
            Diff(diff.op(), text)
        })
        .collect()
}

/// Splits `text` into consecutive tokens; concatenated they give back `text`.
pub(crate) fn split<T: Symbol>(text: &[T], mode: TokenMode) -> impl Iterator<Item = &[T]> {
    let mut start = 0;
    std::iter::from_fn(move || {
        if start >= text.len() {
            return None;
        }
        let end = match mode {
            TokenMode::Word => word_end(text, start),
            TokenMode::Sentence => sentence_end(text, start),
            TokenMode::Paragraph => paragraph_end(text, start),
            TokenMode::Line => line_end(text, start),
        };
        let token = &text[start..end];
        start = end;

        Some(token)
    })
}

fn is(symbol: &impl Symbol, f: impl Fn(char) -> bool) -> bool {
    symbol.as_char().is_some_and(f)
}

fn skip_whitespace<T: Symbol>(text: &[T], mut at: usize) -> usize {
    while at < text.len() && is(&text[at], char::is_whitespace) {
        at += 1;
    }
    at
}

fn word_end<T: Symbol>(text: &[T], start: usize) -> usize {
    let mut at = start;
    while at < text.len() && !is(&text[at], char::is_whitespace) {
        at += 1;
    }
    skip_whitespace(text, at)
}

fn sentence_end<T: Symbol>(text: &[T], start: usize) -> usize {
    let mut at = start;
    while at < text.len() {
        let terminal = is(&text[at], |c| matches!(c, '.' | '!' | '?'));
        at += 1;
        if terminal && (at == text.len() || is(&text[at], char::is_whitespace)) {
            return skip_whitespace(text, at);
        }
    }
    at
}

fn paragraph_end<T: Symbol>(text: &[T], start: usize) -> usize {
    let newline = |at: usize| at < text.len() && is(&text[at], |c| c == '\n');
    let carriage = |at: usize| at < text.len() && is(&text[at], |c| c == '\r');

    let mut at = start;
    while at < text.len() {
        if newline(at) {
            let mut next = at + 1;
            if carriage(next) {
                next += 1;
            }
            if newline(next) {
                at = next + 1;
                while newline(at) || carriage(at) {
                    at += 1;
                }
                return at;
            }
        }
        at += 1;
    }
    at
}

fn line_end<T: Symbol>(text: &[T], start: usize) -> usize {
    text[start..]
        .iter()
        .position(|s| is(s, |c| c == '\n'))
        .map_or(text.len(), |p| start + p + 1)
}
