use crate::{diff::Diff, traits::DType};

/// What a patch set is built from.
pub enum PatchInput<'a, T: DType> {
    /// Source and destination text; the diff is computed.
    Texts(&'a str, &'a str),
    /// A diff; the source text is rebuilt from it.
    Diffs(&'a [Diff<T>]),
    /// Source text and a diff of it.
    TextDiffs(&'a str, &'a [Diff<T>]),
}

impl<'a, T: DType> PatchInput<'a, T> {
    pub fn new_text_text(old: &'a str, new: &'a str) -> Self {
        Self::Texts(old, new)
    }

    pub fn new_diffs(diffs: &'a [Diff<T>]) -> Self {
        Self::Diffs(diffs)
    }

    pub fn new_text_diffs(old: &'a str, diffs: &'a [Diff<T>]) -> Self {
        Self::TextDiffs(old, diffs)
    }
}
