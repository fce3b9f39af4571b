use std::{
    collections::{BTreeSet, VecDeque},
    ops::Range,
};

use crate::{
    cleanup::cleanup_semantic_lossless,
    config::MATCH_MAX_BITS,
    diff::{self, Diff, Ops},
    dmp::DiffMatchPatch,
    matcher::{find, rfind},
    traits::DType,
    Error,
};

/// One hunk of a patch: a short diff plus the window of text it covers.
///
/// Offsets are 0-based units of `T`. `start1`/`length1` locate the hunk in the source
/// text and `start2`/`length2` in the text produced once every earlier hunk applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Patch<T> {
    pub(crate) diffs: Vec<Diff<T>>,
    pub(crate) start1: usize,
    pub(crate) start2: usize,
    pub(crate) length1: usize,
    pub(crate) length2: usize,
}

impl<T> Default for Patch<T> {
    fn default() -> Self {
        Self {
            diffs: Vec::new(),
            start1: 0,
            start2: 0,
            length1: 0,
            length2: 0,
        }
    }
}

impl<T: Copy> Patch<T> {
    pub fn diffs(&self) -> &[Diff<T>] {
        &self.diffs[..]
    }

    pub fn start1(&self) -> usize {
        self.start1
    }

    pub fn start2(&self) -> usize {
        self.start2
    }

    pub fn length1(&self) -> usize {
        self.length1
    }

    pub fn length2(&self) -> usize {
        self.length2
    }
}

pub type Patches<T> = Vec<Patch<T>>;

impl DiffMatchPatch {
    fn margin(&self) -> usize {
        self.patch.margin as usize
    }

    pub(crate) fn patch_make_internal<T: DType>(&self, text: &[T], diffs: &[Diff<T>]) -> Patches<T> {
        // No diffs -> no patches
        if diffs.is_empty() {
            return Vec::new();
        }

        let margin = self.margin();

        let mut patches = vec![];
        let mut patch = Patch::default();

        // Offsets into the source and the destination text
        let mut char_n1 = 0;
        let mut char_n2 = 0;

        // Patches are built against a rolling context: `prepatch` is the source
        // text with every completed patch already applied.
        let mut prepatch: Vec<T> = text.to_vec();
        let mut postpatch: Vec<T> = prepatch.clone();

        for (idx, diff) in diffs.iter().enumerate() {
            // A new patch starts here
            if patch.diffs.is_empty() && diff.op() != Ops::Equal {
                patch.start1 = char_n1;
                patch.start2 = char_n2;
            }

            match diff.op() {
                Ops::Insert => {
                    patch.length2 += diff.size();
                    postpatch.splice(char_n2..char_n2, diff.data().iter().copied());
                    patch.diffs.push(diff.clone());
                }
                Ops::Delete => {
                    patch.length1 += diff.size();
                    postpatch.drain(char_n2..char_n2 + diff.size());
                    patch.diffs.push(diff.clone());
                }
                Ops::Equal => {
                    if diff.size() <= 2 * margin
                        && !patch.diffs.is_empty()
                        && idx + 1 != diffs.len()
                    {
                        // Small equality inside a patch.
                        patch.length1 += diff.size();
                        patch.length2 += diff.size();
                        patch.diffs.push(diff.clone());
                    } else if diff.size() >= 2 * margin && !patch.diffs.is_empty() {
                        // Time for a new patch.
                        self.patch_add_context(&mut patch, &prepatch);
                        patches.push(std::mem::take(&mut patch));

                        prepatch.clone_from(&postpatch);
                        char_n1 = char_n2;
                    }
                }
            }

            if diff.op() != Ops::Insert {
                char_n1 += diff.size();
            }
            if diff.op() != Ops::Delete {
                char_n2 += diff.size();
            }
        }

        // Pick up the leftover patch if not empty.
        if !patch.diffs.is_empty() {
            self.patch_add_context(&mut patch, &prepatch);
            patches.push(patch);
        }

        patches
    }

    /// Grows the context around a patch until its source text is unique in `text`,
    /// staying within what the matcher can look for.
    pub(crate) fn patch_add_context<T: DType>(&self, patch: &mut Patch<T>, text: &[T]) {
        if text.is_empty() {
            return;
        }

        let margin = self.margin();
        let window = |pad: usize| -> (usize, usize) {
            let end = (patch.start2 + patch.length1 + pad).min(text.len());
            (patch.start2.saturating_sub(pad).min(end), end)
        };

        let mut padding = 0;
        let (mut from, mut to) = window(padding);
        while find(text, &text[from..to], 0) != rfind(text, &text[from..to], text.len())
            && to - from < MATCH_MAX_BITS - 2 * margin
        {
            padding += margin;
            (from, to) = window(padding);
        }
        // One chunk more for good luck
        padding += margin;

        let begin = patch.start2.min(text.len());
        let prefix = &text[begin.saturating_sub(padding)..begin];
        let after = (patch.start2 + patch.length1).min(text.len());
        let suffix = &text[after..(after + padding).min(text.len())];

        if !prefix.is_empty() {
            patch.diffs.insert(0, Diff::equal(prefix));
        }
        if !suffix.is_empty() {
            patch.diffs.push(Diff::equal(suffix));
        }

        patch.start1 -= prefix.len();
        patch.start2 -= prefix.len();
        patch.length1 += prefix.len() + suffix.len();
        patch.length2 += prefix.len() + suffix.len();
    }

    /// Surrounds the patches with `margin` units of padding, so edits at either end
    /// of the text can still be matched. Returns the padding.
    pub(crate) fn patch_add_padding<T: DType>(&self, patches: &mut Patches<T>) -> Vec<T> {
        let pad_len = self.margin();
        let padding = (1..=pad_len as u8)
            .map(|c| T::from_char(c as char))
            .collect::<Vec<_>>();

        // Bump all the patches forward.
        for p in patches.iter_mut() {
            p.start1 = p.start1.saturating_add(pad_len);
            p.start2 = p.start2.saturating_add(pad_len);
        }

        // Add some padding on start of first diff.
        if let Some(first) = patches.first_mut() {
            match equality_len(first.diffs.first()) {
                Some(have) => {
                    if pad_len > have {
                        // Grow first equality.
                        let extra = pad_len - have;
                        first.diffs[0].1.splice(0..0, padding[have..].iter().copied());
                        first.start1 -= extra;
                        first.start2 -= extra;
                        first.length1 += extra;
                        first.length2 += extra;
                    }
                }
                None => {
                    first.diffs.insert(0, Diff::equal(&padding));
                    first.start1 -= pad_len;
                    first.start2 -= pad_len;
                    first.length1 += pad_len;
                    first.length2 += pad_len;
                }
            }
        }

        // Add some padding on end of last diff.
        if let Some(last) = patches.last_mut() {
            match equality_len(last.diffs.last()) {
                Some(have) => {
                    if pad_len > have {
                        // Grow last equality.
                        let extra = pad_len - have;
                        if let Some(diff) = last.diffs.last_mut() {
                            diff.1.extend_from_slice(&padding[..extra]);
                        }
                        last.length1 += extra;
                        last.length2 += extra;
                    }
                }
                None => {
                    last.diffs.push(Diff::equal(&padding));
                    last.length1 += pad_len;
                    last.length2 += pad_len;
                }
            }
        }

        padding
    }

    /// Breaks up any patch longer than the matcher can locate into several.
    /// Returns, for every resulting patch, the index of the patch it came from.
    pub(crate) fn split_max<T: DType>(&self, patches: &mut Patches<T>) -> Vec<usize> {
        let patch_size = MATCH_MAX_BITS;
        let margin = self.margin();

        let mut split = Vec::with_capacity(patches.len());
        let mut origins = Vec::with_capacity(patches.len());

        for (origin, bigpatch) in std::mem::take(patches).into_iter().enumerate() {
            if bigpatch.length1 <= patch_size {
                split.push(bigpatch);
                origins.push(origin);
                continue;
            }

            let mut start1 = bigpatch.start1;
            let mut start2 = bigpatch.start2;
            let mut precontext: Vec<T> = vec![];
            let mut remaining = VecDeque::from(bigpatch.diffs);

            while !remaining.is_empty() {
                // Create one of several smaller patches.
                let mut patch = Patch {
                    start1: start1 - precontext.len(),
                    start2: start2 - precontext.len(),
                    ..Default::default()
                };
                let mut empty = true;

                if !precontext.is_empty() {
                    patch.length1 = precontext.len();
                    patch.length2 = precontext.len();
                    patch.diffs.push(Diff::equal(&precontext));
                }

                while patch.length1 < patch_size - margin {
                    let Some(front) = remaining.front_mut() else {
                        break;
                    };
                    let op = front.op();

                    if op == Ops::Insert {
                        // Insertions are harmless.
                        patch.length2 += front.size();
                        start2 += front.size();
                        empty = false;
                        if let Some(diff) = remaining.pop_front() {
                            patch.diffs.push(diff);
                        }
                    } else if op == Ops::Delete
                        && patch.diffs.len() == 1
                        && patch.diffs[0].op() == Ops::Equal
                        && front.size() > 2 * patch_size
                    {
                        // This is a large deletion. Let it pass in one chunk.
                        patch.length1 += front.size();
                        start1 += front.size();
                        empty = false;
                        if let Some(diff) = remaining.pop_front() {
                            patch.diffs.push(diff);
                        }
                    } else {
                        // Deletion or equality. Only take as much as we can stomach.
                        let take = front.size().min(patch_size - patch.length1 - margin);
                        let piece = Diff::new(op, &front.data()[..take]);

                        patch.length1 += take;
                        start1 += take;
                        if op == Ops::Equal {
                            patch.length2 += take;
                            start2 += take;
                        } else {
                            empty = false;
                        }
                        patch.diffs.push(piece);

                        if take == front.size() {
                            remaining.pop_front();
                        } else {
                            front.1.drain(..take);
                        }
                    }
                }

                // Compute the head context for the next patch.
                let text_new = diff::text_new(&patch.diffs);
                precontext = text_new[text_new.len().saturating_sub(margin)..].to_vec();

                // Append the end context for this patch.
                let mut postcontext = remaining
                    .iter()
                    .filter(|d| d.op() != Ops::Insert)
                    .flat_map(|d| d.data().iter().copied())
                    .take(margin)
                    .collect::<Vec<_>>();

                if !postcontext.is_empty() {
                    patch.length1 += postcontext.len();
                    patch.length2 += postcontext.len();

                    match patch.diffs.last_mut() {
                        Some(tail) if tail.op() == Ops::Equal => tail.1.append(&mut postcontext),
                        _ => patch.diffs.push(Diff::equal(&postcontext)),
                    }
                }

                if !empty {
                    split.push(patch);
                    origins.push(origin);
                }
            }
        }

        *patches = split;
        origins
    }

    /// Applies patches to `source`, locating each with the fuzzy matcher.
    /// Returns the patched text and the indices of the patches applied in full.
    pub(crate) fn patch_apply_internal<T: DType>(
        &self,
        patches: &Patches<T>,
        source: &[T],
    ) -> Result<(Vec<T>, BTreeSet<usize>), Error> {
        if patches.is_empty() {
            return Ok((source.to_vec(), BTreeSet::new()));
        }

        let count = patches.len();
        // Work on a copy, the caller's patches stay untouched.
        let mut patches = patches.clone();

        let padding = self.patch_add_padding(&mut patches);
        let mut text = [&padding[..], source, &padding[..]].concat();
        let origins = self.split_max(&mut patches);

        let mut failed = BTreeSet::new();

        // Drift between where a patch expected to land and where it did.
        // Deletions, insertions and fuzzy placement all move later patches around.
        let mut delta: isize = 0;

        for (patch, &origin) in patches.iter().zip(origins.iter()) {
            let expected = signed(patch.start2).saturating_add(delta).max(0) as usize;
            let text1 = diff::text_old(&patch.diffs);

            let (start, end) = if text1.len() > MATCH_MAX_BITS {
                // Long patch: locate both ends of it separately.
                let head = self.match_internal(&text, &text1[..MATCH_MAX_BITS], expected)?;
                let tail = match head {
                    Some(_) => self.match_internal(
                        &text,
                        &text1[text1.len() - MATCH_MAX_BITS..],
                        expected + text1.len() - MATCH_MAX_BITS,
                    )?,
                    None => None,
                };

                match (head, tail) {
                    // Can't find valid trailing context. Drop this patch.
                    (Some(head), Some(tail)) if head < tail => (Some(head), Some(tail)),
                    _ => (None, None),
                }
            } else {
                (self.match_internal(&text, &text1, expected)?, None)
            };

            let Some(start) = start else {
                // No match found. :(
                tracing::debug!(patch = origin, expected, "patch could not be located");
                failed.insert(origin);
                // Subtract the delta for this failed patch from subsequent patches.
                delta = delta.saturating_sub(signed(patch.length2) - signed(patch.length1));
                continue;
            };

            tracing::trace!(patch = origin, expected, start, "located patch");
            delta = start as isize - expected as isize;

            let found_end = match end {
                Some(end) => (end + MATCH_MAX_BITS).min(text.len()),
                None => (start + text1.len()).min(text.len()),
            };

            // Byte units can be spliced in the middle of a character.
            let before = T::SPLITS_CHARS.then(|| text.clone());

            let complete = self.splice_patch(&mut text, patch, &text1, start..found_end, origin);

            match before {
                Some(before) if !T::is_text(&text) => {
                    tracing::debug!(patch = origin, start, "patch would split a character");
                    text = before;
                    failed.insert(origin);
                    delta = delta.saturating_sub(signed(patch.length2) - signed(patch.length1));
                }
                _ if !complete => {
                    failed.insert(origin);
                }
                _ => {}
            }
        }

        // Strip the padding off.
        let patched = text[padding.len()..text.len() - padding.len()].to_vec();
        let applied = (0..count).filter(|idx| !failed.contains(idx)).collect();

        Ok((patched, applied))
    }

    // Rewrites `found`, where the old text of `patch` was located, with the new text.
    // `false` when only the insertions made it in.
    fn splice_patch<T: DType>(
        &self,
        text: &mut Vec<T>,
        patch: &Patch<T>,
        text1: &[T],
        found: Range<usize>,
        origin: usize,
    ) -> bool {
        let start = found.start;
        let text2 = &text[found];

        if text1 == text2 {
            // Perfect match, just shove the replacement text in.
            text.splice(start..start + text1.len(), diff::text_new(&patch.diffs));
            return true;
        }

        // Imperfect match. Run a diff to get a framework of equivalent indices.
        let mut diffs = self.diff_internal(text1, text2, false, self.deadline());

        if text1.len() > MATCH_MAX_BITS
            && diff::edit_distance(&diffs) as f32 / text1.len() as f32
                > self.patch.delete_threshold
        {
            // The end points match, but the content is unacceptably bad.
            // Keep the surrounding text intact, only add what the patch inserts.
            tracing::debug!(patch = origin, "patch applied insert-only");

            let mut index1 = 0;
            let mut inserted = 0;
            for change in patch.diffs.iter() {
                if change.op() == Ops::Insert {
                    let at = (start + diff::x_index(&diffs, index1) + inserted).min(text.len());
                    text.splice(at..at, change.data().iter().copied());
                    inserted += change.size();
                } else {
                    index1 += change.size();
                }
            }
            return false;
        }

        cleanup_semantic_lossless(&mut diffs);

        let mut index1 = 0;
        for change in patch.diffs.iter() {
            if change.op() != Ops::Equal {
                let index2 = diff::x_index(&diffs, index1);
                match change.op() {
                    Ops::Insert => {
                        let at = (start + index2).min(text.len());
                        text.splice(at..at, change.data().iter().copied());
                    }
                    Ops::Delete => {
                        let to = (start + diff::x_index(&diffs, index1 + change.size()))
                            .min(text.len());
                        let from = (start + index2).min(to);
                        text.drain(from..to);
                    }
                    Ops::Equal => {}
                }
            }
            if change.op() != Ops::Delete {
                index1 += change.size();
            }
        }

        true
    }
}

// Parsed offsets are bounded by `isize::MAX`, padding may push them a few units past it.
fn signed(n: usize) -> isize {
    isize::try_from(n).unwrap_or(isize::MAX)
}

fn equality_len<T: Copy>(diff: Option<&Diff<T>>) -> Option<usize> {
    diff.filter(|d| d.op() == Ops::Equal).map(Diff::size)
}
