use std::{collections::BTreeSet, time::Duration};

use crate::{
    cleanup::{
        cleanup_merge, cleanup_semantic, cleanup_semantic_lossless, common_prefix, common_suffix,
    },
    codec,
    config::{Config, DiffConfig, MatchConfig, PatchConfig},
    diff::{self, Diff, Ops},
    html::HtmlConfig,
    matcher::find,
    patch::Patches,
    time::Deadline,
    tokenizer::{detokenize, tokenize, TokenMode},
    traits::{DType, Symbol},
    Error, PatchInput,
};

// Line mode only pays off when both sides have some bulk.
const LINE_MODE_MIN_LEN: usize = 100;
// Inputs this large are diffed line by line first, whatever the quality setting.
const LINE_MODE_FORCE_LEN: usize = 100_000;

/// The diff, match and patch engine.
///
/// Holds nothing but its configuration; every operation is a pure function of its
/// inputs, so one instance can be shared freely across threads.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DiffMatchPatch {
    pub(crate) diff: DiffConfig,
    pub(crate) matching: MatchConfig,
    pub(crate) patch: PatchConfig,
}

/// A substring shared by both texts that is at least half the length of the longer one.
#[derive(Debug, PartialEq, Eq)]
struct HalfMatch<'a, T> {
    prefix_long: &'a [T],
    suffix_long: &'a [T],
    prefix_short: &'a [T],
    suffix_short: &'a [T],
    common: &'a [T],
}

// Settings
impl DiffMatchPatch {
    /// Builds an engine from a full configuration, rejecting out of range values.
    pub fn from_config(config: Config) -> Result<Self, Error> {
        config.validate()?;

        Ok(Self {
            diff: config.diff,
            matching: config.matching,
            patch: config.patch,
        })
    }

    pub fn config(&self) -> Config {
        Config {
            diff: self.diff,
            matching: self.matching,
            patch: self.patch,
        }
    }

    /// When disabled, texts with more than 100 units on both sides get a quick
    /// line-level diff first. Faster, slightly less optimal. Defaults to `true`.
    pub fn set_high_quality(&mut self, high_quality: bool) {
        self.diff = self.diff.with_high_quality(high_quality);
    }

    /// Upper bound on the time spent looking for an optimal diff; once exceeded the
    /// remaining region is reported as one deletion and one insertion.
    /// [`Duration::ZERO`] (the default) means no limit.
    pub fn set_time_limit(&mut self, limit: Duration) {
        self.diff = self.diff.with_time_limit(limit);
    }

    /// Cost of an empty edit operation in terms of edit characters. Defaults to 4.
    pub fn set_edit_cost(&mut self, edit_cost: usize) {
        self.diff = self.diff.with_edit_cost(edit_cost);
    }

    /// At what point no match is declared (0.0 = perfection, 1.0 = very loose).
    pub fn set_match_threshold(&mut self, threshold: f32) -> Result<(), Error> {
        self.matching = MatchConfig::new(threshold, self.matching.distance)?;
        Ok(())
    }

    /// How far from the expected location a match may drift. A match this many
    /// units away adds 1.0 to its score; `0` demands the exact location.
    pub fn set_match_distance(&mut self, distance: usize) {
        self.matching.distance = distance;
    }

    /// Units of context kept on either side of every patch. Must leave room for an
    /// edit inside the 32 unit matcher window.
    pub fn set_patch_margin(&mut self, margin: u8) -> Result<(), Error> {
        self.patch = PatchConfig::new(margin, self.patch.delete_threshold)?;
        Ok(())
    }

    /// When deleting a large block of text, how close the contents have to match the
    /// expected contents (0.0 = perfection, 1.0 = very loose).
    pub fn set_delete_threshold(&mut self, threshold: f32) -> Result<(), Error> {
        self.patch = PatchConfig::new(self.patch.margin, threshold)?;
        Ok(())
    }

    pub(crate) fn deadline(&self) -> Deadline {
        Deadline::after(self.diff.time_limit)
    }

    fn wants_line_mode(&self, old: usize, new: usize) -> bool {
        !self.diff.high_quality || old.max(new) > LINE_MODE_FORCE_LEN
    }
}

// Diff computation
impl DiffMatchPatch {
    /// Raw diff: strip the common prefix and suffix, solve the middle, merge.
    pub(crate) fn diff_internal<T: Symbol>(
        &self,
        old: &[T],
        new: &[T],
        linemode: bool,
        deadline: Deadline,
    ) -> Vec<Diff<T>> {
        if old == new {
            if old.is_empty() {
                return vec![];
            }
            return vec![Diff::equal(old)];
        }

        let prefix = common_prefix(old, new);
        let suffix = common_suffix(&old[prefix..], &new[prefix..]);

        let mut diffs = Vec::new();
        if prefix > 0 {
            diffs.push(Diff::equal(&old[..prefix]));
        }
        diffs.append(&mut self.compute(
            &old[prefix..old.len() - suffix],
            &new[prefix..new.len() - suffix],
            linemode,
            deadline,
        ));
        if suffix > 0 {
            diffs.push(Diff::equal(&old[old.len() - suffix..]));
        }

        cleanup_merge(&mut diffs);

        diffs
    }

    // Both sides are assumed to share no prefix or suffix.
    fn compute<T: Symbol>(
        &self,
        old: &[T],
        new: &[T],
        linemode: bool,
        deadline: Deadline,
    ) -> Vec<Diff<T>> {
        if old.is_empty() {
            return vec![Diff::insert(new)];
        }
        if new.is_empty() {
            return vec![Diff::delete(old)];
        }

        let old_longer = old.len() > new.len();
        let (long, short) = if old_longer { (old, new) } else { (new, old) };

        // Shorter text inside the longer one
        if let Some(at) = find(long, short, 0) {
            let op = if old_longer { Ops::Delete } else { Ops::Insert };
            return [
                Diff::new(op, &long[..at]),
                Diff::equal(short),
                Diff::new(op, &long[at + short.len()..]),
            ]
            .into_iter()
            .filter(|d| !d.is_empty())
            .collect();
        }

        // A single unit that is not in the other text: nothing in common
        if short.len() == 1 {
            return vec![Diff::delete(old), Diff::insert(new)];
        }

        if let Some(hm) = self.half_match(old, new, deadline) {
            let (old_a, old_b, new_a, new_b) = if old_longer {
                (hm.prefix_long, hm.suffix_long, hm.prefix_short, hm.suffix_short)
            } else {
                (hm.prefix_short, hm.suffix_short, hm.prefix_long, hm.suffix_long)
            };

            let mut diffs = self.diff_internal(old_a, new_a, linemode, deadline);
            diffs.push(Diff::equal(hm.common));
            diffs.append(&mut self.diff_internal(old_b, new_b, linemode, deadline));

            return diffs;
        }

        if linemode && old.len() > LINE_MODE_MIN_LEN && new.len() > LINE_MODE_MIN_LEN {
            return self.line_mode(old, new, deadline);
        }

        self.bisect(old, new, deadline)
    }

    // Trades optimality for speed, so only used when the diff is time bounded.
    fn half_match<'a, T: Symbol>(
        &self,
        old: &'a [T],
        new: &'a [T],
        deadline: Deadline,
    ) -> Option<HalfMatch<'a, T>> {
        if !deadline.is_bounded() {
            return None;
        }

        let (long, short) = if old.len() > new.len() {
            (old, new)
        } else {
            (new, old)
        };
        if long.len() < 4 || short.len() * 2 < long.len() {
            return None;
        }

        // Seeds at the second and third quarter of the longer text
        let first = Self::half_match_at(long, short, long.len().div_ceil(4));
        let second = Self::half_match_at(long, short, long.len().div_ceil(2));

        match (first, second) {
            (None, None) => None,
            (Some(hm), None) | (None, Some(hm)) => Some(hm),
            (Some(a), Some(b)) => Some(if a.common.len() > b.common.len() { a } else { b }),
        }
    }

    fn half_match_at<'a, T: Symbol>(
        long: &'a [T],
        short: &'a [T],
        idx: usize,
    ) -> Option<HalfMatch<'a, T>> {
        let seed = &long[idx..idx + long.len() / 4];

        let mut best: Option<HalfMatch<'a, T>> = None;
        let mut best_len = 0;
        let mut from = 0;
        while let Some(at) = find(short, seed, from) {
            let prefix = common_prefix(&long[idx..], &short[at..]);
            let suffix = common_suffix(&long[..idx], &short[..at]);
            if best_len < prefix + suffix {
                best_len = prefix + suffix;
                best = Some(HalfMatch {
                    prefix_long: &long[..idx - suffix],
                    suffix_long: &long[idx + prefix..],
                    prefix_short: &short[..at - suffix],
                    suffix_short: &short[at + prefix..],
                    common: &short[at - suffix..at + prefix],
                });
            }
            from = at + 1;
        }

        best.filter(|_| best_len * 2 >= long.len())
    }

    // Diff whole lines as tokens, then rediff every replaced block unit by unit.
    fn line_mode<T: Symbol>(&self, old: &[T], new: &[T], deadline: Deadline) -> Vec<Diff<T>> {
        tracing::trace!(old = old.len(), new = new.len(), "diffing line by line first");

        let tokenized = tokenize(old, new, TokenMode::Line);
        let token_diffs = self.diff_internal(&tokenized.old, &tokenized.new, false, deadline);

        let mut diffs = detokenize(&token_diffs, &tokenized.tokens);
        // Eliminate freak matches (e.g. blank lines)
        cleanup_semantic(&mut diffs);

        diffs.push(Diff::equal(&[]));
        let mut pointer = 0;
        let (mut n_delete, mut n_insert) = (0, 0);
        let mut deleted: Vec<T> = vec![];
        let mut inserted: Vec<T> = vec![];

        while pointer < diffs.len() {
            match diffs[pointer].op() {
                Ops::Insert => {
                    n_insert += 1;
                    inserted.extend_from_slice(diffs[pointer].data());
                }
                Ops::Delete => {
                    n_delete += 1;
                    deleted.extend_from_slice(diffs[pointer].data());
                }
                Ops::Equal => {
                    if n_delete >= 1 && n_insert >= 1 {
                        let start = pointer - n_delete - n_insert;
                        let sub = self.diff_internal(&deleted, &inserted, false, deadline);
                        let sub_len = sub.len();
                        diffs.splice(start..pointer, sub);
                        pointer = start + sub_len;
                    }
                    n_delete = 0;
                    n_insert = 0;
                    deleted.clear();
                    inserted.clear();
                }
            }
            pointer += 1;
        }
        diffs.pop();

        diffs
    }

    /// Myers' O(ND) bisection: walk the edit graph from both ends until the paths
    /// overlap, then solve each half independently.
    pub(crate) fn bisect<T: Symbol>(
        &self,
        old: &[T],
        new: &[T],
        deadline: Deadline,
    ) -> Vec<Diff<T>> {
        let old_len = old.len() as isize;
        let new_len = new.len() as isize;

        let max_d = (old_len + new_len + 1) / 2;
        let v_offset = max_d;
        let v_len = 2 * max_d;

        let mut v1 = vec![-1_isize; v_len as usize + 2];
        let mut v2 = vec![-1_isize; v_len as usize + 2];
        v1[v_offset as usize + 1] = 0;
        v2[v_offset as usize + 1] = 0;

        let delta = old_len - new_len;
        // With an odd delta the forward path will collide with the reverse one.
        let front = delta % 2 != 0;

        // Offsets for the start and end of k loops, to skip parts of the grid known to be out of bounds
        let (mut k1start, mut k1end) = (0, 0);
        let (mut k2start, mut k2end) = (0, 0);

        for d in 0..max_d {
            if deadline.expired() {
                tracing::debug!(d, old = old.len(), new = new.len(), "diff deadline expired");
                break;
            }

            // Walk the front path one step.
            let mut k1 = -d + k1start;
            while k1 <= d - k1end {
                let k1_offset = (v_offset + k1) as usize;
                let mut x1 = if k1 == -d || (k1 != d && v1[k1_offset - 1] < v1[k1_offset + 1]) {
                    v1[k1_offset + 1]
                } else {
                    v1[k1_offset - 1] + 1
                };
                let mut y1 = x1 - k1;

                while x1 >= 0
                    && y1 >= 0
                    && x1 < old_len
                    && y1 < new_len
                    && old[x1 as usize] == new[y1 as usize]
                {
                    x1 += 1;
                    y1 += 1;
                }
                v1[k1_offset] = x1;

                if x1 > old_len {
                    // Ran off the right of the graph.
                    k1end += 2;
                } else if y1 > new_len {
                    // Ran off the bottom of the graph.
                    k1start += 2;
                } else if front {
                    let k2_offset = v_offset + delta - k1;
                    if k2_offset >= 0 && k2_offset < v_len && v2[k2_offset as usize] != -1 {
                        // Mirror x2 onto top-left coordinate system.
                        let x2 = old_len - v2[k2_offset as usize];
                        if x1 >= x2 {
                            return self.bisect_split(old, new, x1 as usize, y1 as usize, deadline);
                        }
                    }
                }
                k1 += 2;
            }

            // Walk the reverse path one step.
            let mut k2 = -d + k2start;
            while k2 <= d - k2end {
                let k2_offset = (v_offset + k2) as usize;
                let mut x2 = if k2 == -d || (k2 != d && v2[k2_offset - 1] < v2[k2_offset + 1]) {
                    v2[k2_offset + 1]
                } else {
                    v2[k2_offset - 1] + 1
                };
                let mut y2 = x2 - k2;

                while x2 >= 0
                    && y2 >= 0
                    && x2 < old_len
                    && y2 < new_len
                    && old[(old_len - x2 - 1) as usize] == new[(new_len - y2 - 1) as usize]
                {
                    x2 += 1;
                    y2 += 1;
                }
                v2[k2_offset] = x2;

                if x2 > old_len {
                    k2end += 2;
                } else if y2 > new_len {
                    k2start += 2;
                } else if !front {
                    let k1_offset = v_offset + delta - k2;
                    if k1_offset >= 0 && k1_offset < v_len && v1[k1_offset as usize] != -1 {
                        let x1 = v1[k1_offset as usize];
                        let y1 = v_offset + x1 - k1_offset;
                        if x1 >= old_len - x2 {
                            return self.bisect_split(old, new, x1 as usize, y1 as usize, deadline);
                        }
                    }
                }
                k2 += 2;
            }
        }

        // Out of time, or no commonality at all.
        vec![Diff::delete(old), Diff::insert(new)]
    }

    fn bisect_split<T: Symbol>(
        &self,
        old: &[T],
        new: &[T],
        x: usize,
        y: usize,
        deadline: Deadline,
    ) -> Vec<Diff<T>> {
        let mut diffs = self.diff_internal(&old[..x], &new[..y], false, deadline);
        diffs.append(&mut self.diff_internal(&old[x..], &new[y..], false, deadline));

        diffs
    }
}

// Public APIs
impl DiffMatchPatch {
    /// Create a new instance with default settings: optimal diffs without a time
    /// limit, match threshold 0.5 within 1000 units, patch margin 4.
    /// # Example
    /// ```
    /// use textsync::{DiffMatchPatch, Efficient};
    ///
    /// let mut dmp = DiffMatchPatch::new();
    /// // trade some quality for speed on long, multi-line texts
    /// dmp.set_high_quality(false);
    /// let diffs = dmp.diff_main::<Efficient>("Fast enough", "Blazing fast");
    /// assert!(!diffs.is_empty());
    /// ```
    pub fn new() -> Self {
        Self::default()
    }

    /// Find the differences between two texts. The result is merged and
    /// semantically cleaned up, so it reads well to humans.
    ///
    /// # Example
    /// ```
    /// use textsync::{Compat, Diff, DiffMatchPatch};
    ///
    /// let dmp = DiffMatchPatch::new();
    /// let diffs = dmp.diff_main::<Compat>("Hello world.", "Goodbye world.");
    /// assert_eq!(
    ///     vec![
    ///         Diff::delete(&"Hello".chars().collect::<Vec<_>>()),
    ///         Diff::insert(&"Goodbye".chars().collect::<Vec<_>>()),
    ///         Diff::equal(&" world.".chars().collect::<Vec<_>>()),
    ///     ],
    ///     diffs
    /// );
    /// ```
    pub fn diff_main<T: DType>(&self, old: &str, new: &str) -> Vec<Diff<T>> {
        let old = T::from_str(old);
        let new = T::from_str(new);

        let mut diffs = self.diff_internal(
            &old,
            &new,
            self.wants_line_mode(old.len(), new.len()),
            self.deadline(),
        );
        cleanup_semantic(&mut diffs);

        diffs
    }

    /// Diffs two texts at the granularity of `mode`: whole words, sentences,
    /// paragraphs or lines change together.
    ///
    /// ```
    /// use textsync::{Compat, DiffMatchPatch, TokenMode};
    ///
    /// let dmp = DiffMatchPatch::new();
    /// let diffs = dmp.diff_tokens::<Compat>("The cat sat.", "The dog sat.", TokenMode::Word);
    /// // whole words, not the common " " of "cat " and "dog "
    /// assert_eq!(4, diffs.len());
    /// assert_eq!("cat ", diffs[1].data().iter().collect::<String>());
    /// ```
    pub fn diff_tokens<T: DType>(&self, old: &str, new: &str, mode: TokenMode) -> Vec<Diff<T>> {
        let old = T::from_str(old);
        let new = T::from_str(new);

        let tokenized = tokenize(&old, &new, mode);
        let token_diffs =
            self.diff_internal(&tokenized.old, &tokenized.new, false, self.deadline());

        detokenize(&token_diffs, &tokenized.tokens)
    }

    /// A diff of two unrelated texts can be filled with coincidental matches.
    /// For example, the diff of "mouse" and "sofas" is [(-1, "m"), (1, "s"), (0, "o"), (-1, "u"), (1, "fa"), (0, "s"), (-1, "e")].
    /// Semantic cleanup rewrites it as [(-1, "mouse"), (1, "sofas")].
    /// [`diff_main`](Self::diff_main) already applies it; this is for diffs obtained elsewhere.
    pub fn diff_cleanup_semantic<T: DType>(diffs: &mut Vec<Diff<T>>) {
        cleanup_semantic(diffs)
    }

    /// Slides edits surrounded by equalities onto word, line and paragraph boundaries
    /// without changing the number of edits.
    pub fn diff_cleanup_semantic_lossless<T: DType>(diffs: &mut Vec<Diff<T>>) {
        cleanup_semantic_lossless(diffs)
    }

    /// The source text of a diff, as units.
    pub fn diff_text_old<T: DType>(diffs: &[Diff<T>]) -> Vec<T> {
        diff::text_old(diffs)
    }

    /// The destination text of a diff, as units.
    pub fn diff_text_new<T: DType>(diffs: &[Diff<T>]) -> Vec<T> {
        diff::text_new(diffs)
    }

    /// The source text of a diff.
    pub fn diff_text1<T: DType>(diffs: &[Diff<T>]) -> Result<String, Error> {
        T::to_string(&diff::text_old(diffs))
    }

    /// The destination text of a diff.
    pub fn diff_text2<T: DType>(diffs: &[Diff<T>]) -> Result<String, Error> {
        T::to_string(&diff::text_new(diffs))
    }

    /// Translates `loc`, a position in the source text, to the matching position in the destination text.
    /// e.g. "The cat" vs "The big cat", 1->1, 5->8
    pub fn diff_x_index<T: DType>(diffs: &[Diff<T>], loc: usize) -> usize {
        diff::x_index(diffs, loc)
    }

    /// Number of units inserted plus units deleted.
    /// `[(Delete, "Hello"), (Insert, "Goodbye"), (Equal, " world.")]` measures 12.
    pub fn diff_levenshtein<T: DType>(diffs: &[Diff<T>]) -> usize {
        diff::levenshtein(diffs)
    }

    /// Renders a diff as HTML. Mainly intended as an example from which to write ones own display functions.
    ///
    /// # Example
    /// ```
    /// # use textsync::{DiffMatchPatch, Error, Efficient, HtmlConfig};
    /// # fn main() -> Result<(), Error> {
    /// let dmp = DiffMatchPatch::new();
    ///
    /// let diffs = dmp.diff_main::<Efficient>("The old man and the new house?", "The old man and the old dog!");
    /// let pretty = dmp.diff_pretty_html(&diffs, &HtmlConfig::new())?;
    /// assert!(pretty.starts_with("The old man and the "));
    /// # Ok(())
    /// # }
    /// ```
    ///
    /// Check out [`HtmlConfig`] options for ways to control the generated html.
    pub fn diff_pretty_html<T: DType>(
        &self,
        diffs: &[Diff<T>],
        html_cfg: &HtmlConfig,
    ) -> Result<String, Error> {
        let mut diffs = diffs.to_vec();
        T::humanize(&mut diffs)?;

        diffs.iter().try_fold(String::new(), |mut html, diff| {
            html.push_str(&html_cfg.render(diff.op(), &T::to_string(diff.data())?));
            Ok(html)
        })
    }

    /// Crush the diff into an encoded string which describes the operations required to transform the old text into the new one.
    /// E.g. `=3\t-2\t+ing` keeps 3 units, deletes 2 units and inserts `ing`.
    /// Inserted text is escaped using %xx notation.
    ///
    /// # Example
    /// ```
    /// # use textsync::{DiffMatchPatch, Error, Compat};
    /// # fn main() -> Result<(), Error> {
    /// let dmp = DiffMatchPatch::new();
    ///
    /// let diffs = dmp.diff_main::<Compat>("The old house and the new dog!", "The old man and the new dog!");
    /// let delta = dmp.diff_to_delta(&diffs);
    ///
    /// // and back, given the old text
    /// let recovered = dmp.diff_from_delta::<Compat>("The old house and the new dog!", &delta)?;
    /// assert_eq!(diffs, recovered);
    /// # Ok(())
    /// # }
    /// ```
    pub fn diff_to_delta<T: DType>(&self, diffs: &[Diff<T>]) -> String {
        codec::to_delta(diffs)
    }

    /// Given the old text and a delta produced by [`diff_to_delta`](Self::diff_to_delta), rebuild the diff.
    pub fn diff_from_delta<T: DType>(&self, old: &str, delta: &str) -> Result<Vec<Diff<T>>, Error> {
        codec::from_delta(&T::from_str(old), delta)
    }

    /// Locate the best instance of `pattern` in `text` near `loc`, or `None`.
    /// Offsets are counted in units of `T`.
    ///
    /// Candidates are scored on the number of errors and on the distance from `loc`;
    /// see [`set_match_threshold`](Self::set_match_threshold) and [`set_match_distance`](Self::set_match_distance).
    /// Patterns longer than 32 units are rejected with [`Error::PatternTooLong`].
    ///
    /// ```
    /// use textsync::{Compat, DiffMatchPatch};
    ///
    /// let dmp = DiffMatchPatch::new();
    /// assert_eq!(Some(5), dmp.match_main::<Compat>("abcdefghijk", "fgh", 5)?);
    /// assert_eq!(Some(4), dmp.match_main::<Compat>("abcdefghijk", "efxhi", 1)?);
    /// assert_eq!(None, dmp.match_main::<Compat>("abcdefghijk", "bxy", 1)?);
    /// # Ok::<(), textsync::Error>(())
    /// ```
    pub fn match_main<T: DType>(
        &self,
        text: &str,
        pattern: &str,
        loc: usize,
    ) -> Result<Option<usize>, Error> {
        self.match_internal(&T::from_str(text), &T::from_str(pattern), loc)
    }

    /// Given two texts, or an already computed list of differences, return the patches turning one into the other.
    ///
    /// # Example
    /// ```
    /// # use textsync::{DiffMatchPatch, Error, Efficient, PatchInput};
    /// # fn main() -> Result<(), Error> {
    /// let dmp = DiffMatchPatch::new();
    ///
    /// let patches = dmp.patch_make::<Efficient>(PatchInput::new_text_text("Apples are a fruit.", "Bananas are also fruit"));
    /// let (new_from_old, _) = dmp.patch_apply(&patches, "Apples are a fruit.")?;
    /// assert_eq!("Bananas are also fruit", new_from_old);
    ///
    /// // From an existing diff
    /// let diffs = dmp.diff_main::<Efficient>("Apples are a fruit.", "Bananas are also fruit");
    /// let patches = dmp.patch_make(PatchInput::new_diffs(&diffs));
    /// let (new_from_old, _) = dmp.patch_apply(&patches, "Apples are a fruit.")?;
    /// assert_eq!("Bananas are also fruit", new_from_old);
    /// # Ok(())
    /// # }
    /// ```
    ///
    /// Prefer [`PatchInput::new_text_diffs`] when both are at hand, it saves recomputing the source text.
    pub fn patch_make<T: DType>(&self, input: PatchInput<T>) -> Patches<T> {
        match input {
            PatchInput::Texts(old, new) => {
                let mut diffs = self.diff_main::<T>(old, new);
                if diffs.len() > 2 {
                    crate::cleanup::cleanup_efficiency(&mut diffs, self.diff.edit_cost);
                }
                self.patch_make_internal(&T::from_str(old), &diffs)
            }
            PatchInput::Diffs(diffs) => self.patch_make_internal(&diff::text_old(diffs), diffs),
            PatchInput::TextDiffs(old, diffs) => self.patch_make_internal(&T::from_str(old), diffs),
        }
    }

    /// Serializes patches to a block of text resembling the GNU diff/patch format.
    ///
    /// Check out [`diff_to_delta`](Self::diff_to_delta) for a more compact way of representing a single diff.
    pub fn patch_to_text<T: DType>(&self, patches: &Patches<T>) -> String {
        patches.iter().map(|p| p.to_string()).collect()
    }

    /// Parses text produced by [`patch_to_text`](Self::patch_to_text) back into patches.
    ///
    /// ```
    /// use textsync::{Compat, DiffMatchPatch, Error, FormatError};
    ///
    /// let dmp = DiffMatchPatch::new();
    /// let patches = dmp.patch_from_text::<Compat>("@@ -1,5 +1,5 @@\n-Hello\n+World\n")?;
    /// assert_eq!(1, patches.len());
    /// assert_eq!("@@ -1,5 +1,5 @@\n-Hello\n+World\n", dmp.patch_to_text(&patches));
    ///
    /// assert!(matches!(
    ///     dmp.patch_from_text::<Compat>("@@ bogus @@"),
    ///     Err(Error::Format(FormatError::PatchHeader(_)))
    /// ));
    /// # Ok::<(), Error>(())
    /// ```
    pub fn patch_from_text<T: DType>(&self, text: &str) -> Result<Patches<T>, Error> {
        codec::parse_patches(text)
    }

    /// Applies patches to `source_txt`, tolerating drift in the text.
    /// Returns the patched text and the indices of the patches that applied cleanly.
    /// In byte mode a patch whose placement would cut a character in two is skipped.
    ///
    /// ```
    /// use textsync::{Compat, DiffMatchPatch, PatchInput};
    ///
    /// let dmp = DiffMatchPatch::new();
    /// let patches = dmp.patch_make::<Compat>(PatchInput::new_text_text("The quick fox.", "The slow fox."));
    ///
    /// let (patched, applied) = dmp.patch_apply(&patches, "The quick fox. Extra.")?;
    /// assert_eq!("The slow fox. Extra.", patched);
    /// assert!(applied.contains(&0));
    /// # Ok::<(), textsync::Error>(())
    /// ```
    pub fn patch_apply<T: DType>(
        &self,
        patches: &Patches<T>,
        source_txt: &str,
    ) -> Result<(String, BTreeSet<usize>), Error> {
        let (patched, applied) = self.patch_apply_internal(patches, &T::from_str(source_txt))?;

        Ok((T::to_string(&patched)?, applied))
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use crate::{
        diff::{Diff, Ops},
        time::Deadline,
        Compat, DiffMatchPatch, Efficient, Error, TokenMode,
    };

    use super::HalfMatch;

    fn chars(text: &str) -> Vec<char> {
        text.chars().collect()
    }

    fn d(op: Ops, text: &str) -> Diff<char> {
        Diff(op, chars(text))
    }

    fn raw(dmp: &DiffMatchPatch, old: &str, new: &str) -> Vec<Diff<char>> {
        dmp.diff_internal(&chars(old), &chars(new), false, Deadline::unbounded())
    }

    #[test]
    fn test_half_match() {
        let mut dmp = DiffMatchPatch::new();
        dmp.set_time_limit(Duration::from_secs(1));
        let deadline = dmp.deadline();

        // Reported as [old prefix, old suffix, new prefix, new suffix, common]
        let hm = |old: &str, new: &str| -> Option<[String; 5]> {
            let (old, new) = (chars(old), chars(new));
            let old_longer = old.len() > new.len();
            dmp.half_match(&old, &new, deadline).map(|hm| {
                let parts = if old_longer {
                    [hm.prefix_long, hm.suffix_long, hm.prefix_short, hm.suffix_short, hm.common]
                } else {
                    [hm.prefix_short, hm.suffix_short, hm.prefix_long, hm.suffix_long, hm.common]
                };
                parts.map(|p| p.iter().collect())
            })
        };
        let expect = |parts: [&str; 5]| Some(parts.map(String::from));

        // No match
        assert_eq!(None, hm("1234567890", "abcdef"));
        assert_eq!(None, hm("12345", "23"));

        // Single match
        assert_eq!(expect(["12", "90", "a", "z", "345678"]), hm("1234567890", "a345678z"));
        assert_eq!(expect(["a", "z", "12", "90", "345678"]), hm("a345678z", "1234567890"));
        assert_eq!(expect(["abc", "z", "1234", "0", "56789"]), hm("abc56789z", "1234567890"));
        assert_eq!(expect(["a", "xyz", "1", "7890", "23456"]), hm("a23456xyz", "1234567890"));

        // Multiple matches
        assert_eq!(
            expect(["12123", "123121", "a", "z", "1234123451"]),
            hm("121231234123451234123121", "a1234123451z")
        );
        assert_eq!(
            expect(["", "-=-=-=-=-=", "x", "", "x-=-=-=-=-=-=-="]),
            hm("x-=-=-=-=-=-=-=-=-=-=-=-=", "xx-=-=-=-=-=-=-=")
        );
        assert_eq!(
            expect(["-=-=-=-=-=", "", "", "y", "-=-=-=-=-=-=-=y"]),
            hm("-=-=-=-=-=-=-=-=-=-=-=-=y", "-=-=-=-=-=-=-=yy")
        );

        // Non-optimal halfmatch
        assert_eq!(
            expect(["qHillo", "w", "x", "Hulloy", "HelloHe"]),
            hm("qHilloHelloHew", "xHelloHeHulloy")
        );

        // Unbounded diffs never take the shortcut
        let unbounded = DiffMatchPatch::new();
        let (a, b) = (chars("qHilloHelloHew"), chars("xHelloHeHulloy"));
        assert_eq!(None::<HalfMatch<char>>, unbounded.half_match(&a, &b, Deadline::unbounded()));
    }

    #[test]
    fn test_bisect() {
        let dmp = DiffMatchPatch::new();
        let (a, b) = (chars("cat"), chars("map"));

        assert_eq!(
            vec![
                d(Ops::Delete, "c"),
                d(Ops::Insert, "m"),
                d(Ops::Equal, "a"),
                d(Ops::Delete, "t"),
                d(Ops::Insert, "p"),
            ],
            dmp.bisect(&a, &b, Deadline::unbounded())
        );

        // Timeout
        let deadline = Deadline::elapsed();
        std::thread::sleep(Duration::from_millis(1));
        assert_eq!(
            vec![d(Ops::Delete, "cat"), d(Ops::Insert, "map")],
            dmp.bisect(&a, &b, deadline)
        );
    }

    #[test]
    fn test_diff_internal() {
        let dmp = DiffMatchPatch::new();

        assert!(raw(&dmp, "", "").is_empty());
        assert_eq!(vec![d(Ops::Equal, "abc")], raw(&dmp, "abc", "abc"));
        assert_eq!(
            vec![d(Ops::Equal, "ab"), d(Ops::Insert, "123"), d(Ops::Equal, "c")],
            raw(&dmp, "abc", "ab123c")
        );
        assert_eq!(
            vec![d(Ops::Equal, "a"), d(Ops::Delete, "123"), d(Ops::Equal, "bc")],
            raw(&dmp, "a123bc", "abc")
        );
        assert_eq!(
            vec![
                d(Ops::Equal, "a"),
                d(Ops::Insert, "123"),
                d(Ops::Equal, "b"),
                d(Ops::Insert, "456"),
                d(Ops::Equal, "c"),
            ],
            raw(&dmp, "abc", "a123b456c")
        );
        assert_eq!(
            vec![d(Ops::Delete, "a"), d(Ops::Insert, "b")],
            raw(&dmp, "a", "b")
        );
        assert_eq!(
            vec![
                d(Ops::Delete, "Apple"),
                d(Ops::Insert, "Banana"),
                d(Ops::Equal, "s are a"),
                d(Ops::Insert, "lso"),
                d(Ops::Equal, " fruit."),
            ],
            raw(&dmp, "Apples are a fruit.", "Bananas are also fruit.")
        );
        assert_eq!(
            vec![
                d(Ops::Delete, "a"),
                d(Ops::Insert, "\u{0680}"),
                d(Ops::Equal, "x"),
                d(Ops::Delete, "\t"),
                d(Ops::Insert, "\0"),
            ],
            raw(&dmp, "ax\t", "\u{0680}x\0")
        );
        // Overlaps
        assert_eq!(
            vec![
                d(Ops::Delete, "1"),
                d(Ops::Equal, "a"),
                d(Ops::Delete, "y"),
                d(Ops::Equal, "b"),
                d(Ops::Delete, "2"),
                d(Ops::Insert, "xab"),
            ],
            raw(&dmp, "1ayb2", "abxab")
        );
        assert_eq!(
            vec![d(Ops::Insert, "xaxcx"), d(Ops::Equal, "abc"), d(Ops::Delete, "y")],
            raw(&dmp, "abcy", "xaxcxabc")
        );
        assert_eq!(
            vec![
                d(Ops::Delete, "ABCD"),
                d(Ops::Equal, "a"),
                d(Ops::Delete, "="),
                d(Ops::Insert, "-"),
                d(Ops::Equal, "bcd"),
                d(Ops::Delete, "="),
                d(Ops::Insert, "-"),
                d(Ops::Equal, "efghijklmnopqrs"),
                d(Ops::Delete, "EFGHIJKLMNOefg"),
            ],
            raw(
                &dmp,
                "ABCDa=bcd=efghijklmnopqrsEFGHIJKLMNOefg",
                "a-bcd-efghijklmnopqrs"
            )
        );
        // Large equality
        assert_eq!(
            vec![
                d(Ops::Insert, " "),
                d(Ops::Equal, "a"),
                d(Ops::Insert, "nd"),
                d(Ops::Equal, " [[Pennsylvania]]"),
                d(Ops::Delete, " and [[New"),
            ],
            raw(
                &dmp,
                "a [[Pennsylvania]] and [[New",
                " and [[Pennsylvania]]"
            )
        );
    }

    #[test]
    fn test_diff_main_semantic() {
        let dmp = DiffMatchPatch::new();

        assert_eq!(
            vec![
                d(Ops::Delete, "Hello"),
                d(Ops::Insert, "Goodbye"),
                d(Ops::Equal, " world.")
            ],
            dmp.diff_main::<Compat>("Hello world.", "Goodbye world.")
        );
        assert_eq!(
            vec![d(Ops::Delete, "mouse"), d(Ops::Insert, "sofas")],
            dmp.diff_main::<Compat>("mouse", "sofas")
        );

        let diffs = dmp.diff_main::<Efficient>("Hello world.", "Goodbye world.");
        assert_eq!(12, DiffMatchPatch::diff_levenshtein(&diffs));
    }

    #[test]
    fn test_diff_timeout() {
        let mut dmp = DiffMatchPatch::new();
        dmp.set_time_limit(Duration::from_millis(100));

        let mut old = "`Twas brillig, and the slithy toves\nDid gyre and gimble in the wabe:\nAll mimsy were the borogoves,\nAnd the mome raths outgrabe.\n".to_string();
        let mut new = "I am the very model of a modern major general,\nI've information vegetable, animal, and mineral,\nI know the kings of England, and I quote the fights historical,\nFrom Marathon to Waterloo, in order categorical.\n".to_string();
        // Increase the text lengths by 1024 times to ensure a timeout.
        for _ in 0..10 {
            old = format!("{old}{old}");
            new = format!("{new}{new}");
        }

        let start = std::time::Instant::now();
        let diffs = dmp.diff_main::<Efficient>(&old, &new);
        let elapsed = start.elapsed();

        // Degraded, but still correct
        assert_eq!(old.as_bytes(), DiffMatchPatch::diff_text_old(&diffs));
        assert_eq!(new.as_bytes(), DiffMatchPatch::diff_text_new(&diffs));
        // Test that we took at least the timeout period, but not much longer
        assert!(elapsed >= Duration::from_millis(100));
        assert!(elapsed < Duration::from_secs(10));
    }

    #[test]
    fn test_line_mode_matches_char_mode() {
        let a = "1234567890\n".repeat(13);
        let b = "abcdefghij\n".repeat(13);

        let mut fast = DiffMatchPatch::new();
        fast.set_high_quality(false);
        let slow = DiffMatchPatch::new();

        // Simple line-mode
        assert_eq!(
            slow.diff_main::<Compat>(&a, &b),
            fast.diff_main::<Compat>(&a, &b)
        );

        // Single line-mode
        let a = "1234567890".repeat(13);
        let b = "abcdefghij".repeat(13);
        assert_eq!(
            slow.diff_main::<Compat>(&a, &b),
            fast.diff_main::<Compat>(&a, &b)
        );

        // Overlap line-mode: the scripts differ but both reproduce the texts
        let a = "1234567890\n".repeat(13);
        let b = "abcdefghij\n1234567890\n1234567890\n1234567890\nabcdefghij\n1234567890\n1234567890\n1234567890\nabcdefghij\n1234567890\n1234567890\n1234567890\nabcdefghij\n";
        let diffs = fast.diff_main::<Compat>(&a, b);
        assert_eq!(chars(&a), DiffMatchPatch::diff_text_old(&diffs));
        assert_eq!(chars(b), DiffMatchPatch::diff_text_new(&diffs));
    }

    #[test]
    fn test_diff_tokens() -> Result<(), Error> {
        let dmp = DiffMatchPatch::new();

        let diffs =
            dmp.diff_tokens::<Compat>("The cat sat on the mat.", "The dog sat on a mat.", TokenMode::Word);
        assert_eq!(
            vec![
                d(Ops::Equal, "The "),
                d(Ops::Delete, "cat "),
                d(Ops::Insert, "dog "),
                d(Ops::Equal, "sat on "),
                d(Ops::Delete, "the "),
                d(Ops::Insert, "a "),
                d(Ops::Equal, "mat."),
            ],
            diffs
        );

        let old = "First line.\nSecond line.\nThird line.\n";
        let new = "First line.\nSecond line, edited.\nThird line.\n";
        let diffs = dmp.diff_tokens::<Efficient>(old, new, TokenMode::Line);
        assert_eq!(
            vec![
                Diff::equal(b"First line.\n"),
                Diff::delete(b"Second line.\n"),
                Diff::insert(b"Second line, edited.\n"),
                Diff::equal(b"Third line.\n"),
            ],
            diffs
        );
        assert_eq!(old, DiffMatchPatch::diff_text1(&diffs)?);
        assert_eq!(new, DiffMatchPatch::diff_text2(&diffs)?);

        let diffs = dmp.diff_tokens::<Compat>(
            "One. Two! Three?",
            "One. Deux! Three?",
            TokenMode::Sentence,
        );
        assert_eq!(
            vec![
                d(Ops::Equal, "One. "),
                d(Ops::Delete, "Two! "),
                d(Ops::Insert, "Deux! "),
                d(Ops::Equal, "Three?"),
            ],
            diffs
        );

        Ok(())
    }

    #[test]
    fn test_settings_validation() {
        let mut dmp = DiffMatchPatch::new();
        assert!(dmp.set_match_threshold(0.8).is_ok());
        assert!(matches!(
            dmp.set_match_threshold(1.2),
            Err(Error::InvalidConfig(_))
        ));
        assert_eq!(0.8, dmp.config().matching.threshold());

        assert!(dmp.set_patch_margin(16).is_err());
        assert!(dmp.set_delete_threshold(-1.0).is_err());
        assert_eq!(4, dmp.config().patch.margin());

        dmp.set_time_limit(Duration::ZERO);
        assert_eq!(None, dmp.config().diff.time_limit());
        assert!(DiffMatchPatch::from_config(dmp.config()).is_ok());
    }
}
