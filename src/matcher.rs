use std::collections::HashMap;

use crate::{config::MATCH_MAX_BITS, dmp::DiffMatchPatch, traits::Symbol, Error};

/// First occurrence of `needle` in `haystack` at or after `from`.
/// An empty needle is found right at `from`, clamped to the haystack.
pub(crate) fn find<T: PartialEq>(haystack: &[T], needle: &[T], from: usize) -> Option<usize> {
    if needle.is_empty() {
        return Some(from.min(haystack.len()));
    }
    if from >= haystack.len() || needle.len() > haystack.len() - from {
        return None;
    }

    haystack[from..]
        .windows(needle.len())
        .position(|w| w == needle)
        .map(|p| p + from)
}

/// Last occurrence of `needle` in `haystack` starting at or before `from`.
pub(crate) fn rfind<T: PartialEq>(haystack: &[T], needle: &[T], from: usize) -> Option<usize> {
    if needle.is_empty() {
        return Some(from.min(haystack.len()));
    }
    if needle.len() > haystack.len() {
        return None;
    }

    let last = from.min(haystack.len() - needle.len());
    (0..=last)
        .rev()
        .find(|&at| &haystack[at..at + needle.len()] == needle)
}

/// Bit mask of the positions every symbol occupies in `pattern`, most significant bit first.
pub(crate) fn match_alphabet<T: Symbol>(pattern: &[T]) -> HashMap<T, u64> {
    let mut alphabet = HashMap::with_capacity(pattern.len());
    for (i, &symbol) in pattern.iter().enumerate() {
        *alphabet.entry(symbol).or_insert(0_u64) |= 1 << (pattern.len() - i - 1);
    }

    alphabet
}

impl DiffMatchPatch {
    pub(crate) fn match_internal<T: Symbol>(
        &self,
        text: &[T],
        pattern: &[T],
        loc: usize,
    ) -> Result<Option<usize>, Error> {
        let loc = loc.min(text.len());

        if text == pattern {
            // Shortcut (potentially not guaranteed by the algorithm)
            return Ok(Some(0));
        }
        if text.is_empty() {
            return Ok(None);
        }
        if text.get(loc..loc + pattern.len()) == Some(pattern) {
            // Perfect match at the perfect spot!
            return Ok(Some(loc));
        }

        self.match_bitap(text, pattern, loc)
    }

    /// Fuzzy search with the Bitap algorithm, trading errors against distance from `loc`.
    pub(crate) fn match_bitap<T: Symbol>(
        &self,
        text: &[T],
        pattern: &[T],
        loc: usize,
    ) -> Result<Option<usize>, Error> {
        if pattern.len() > MATCH_MAX_BITS {
            return Err(Error::PatternTooLong {
                len: pattern.len(),
                max: MATCH_MAX_BITS,
            });
        }
        if pattern.is_empty() {
            return Ok(Some(loc));
        }

        let alphabet = match_alphabet(pattern);
        let score = |errors: usize, at: usize| self.bitap_score(errors, at, loc, pattern.len());

        // Highest score beyond which we give up.
        let mut threshold = self.matching.threshold as f64;
        // Is there a nearby exact match? (speedup)
        if let Some(at) = find(text, pattern, loc) {
            threshold = score(0, at).min(threshold);
            // What about in the other direction? (speedup)
            if let Some(at) = rfind(text, pattern, loc + pattern.len()) {
                threshold = score(0, at).min(threshold);
            }
        }

        let match_mask = 1_u64 << (pattern.len() - 1);
        let mut best_loc = None;

        let loc_i = loc as isize;
        let mut bin_max = (pattern.len() + text.len()) as isize;
        let mut last_rd: Vec<u64> = vec![];

        for d in 0..pattern.len() {
            // Scan for the best match; each iteration allows for one more error.
            // Run a binary search to determine how far from `loc` we can stray at this error level.
            let mut bin_min = 0;
            let mut bin_mid = bin_max;
            while bin_min < bin_mid {
                if score(d, (loc_i + bin_mid) as usize) <= threshold {
                    bin_min = bin_mid;
                } else {
                    bin_max = bin_mid;
                }
                bin_mid = (bin_max - bin_min) / 2 + bin_min;
            }
            // Use the result from this iteration as the maximum for the next.
            bin_max = bin_mid;

            let mut start = (loc_i - bin_mid + 1).max(1);
            let finish = (loc_i + bin_mid).min(text.len() as isize) + pattern.len() as isize;

            let mut rd = vec![0_u64; finish as usize + 2];
            rd[finish as usize + 1] = (1 << d) - 1;

            let mut j = finish;
            while j >= start {
                let ju = j as usize;
                let char_match = text
                    .get(ju - 1)
                    .and_then(|symbol| alphabet.get(symbol))
                    .copied()
                    .unwrap_or(0);

                rd[ju] = ((rd[ju + 1] << 1) | 1) & char_match;
                if d > 0 {
                    // Subsequent passes: fuzzy match.
                    let prev = |at: usize| last_rd.get(at).copied().unwrap_or(0);
                    rd[ju] |= ((prev(ju + 1) | prev(ju)) << 1) | 1 | prev(ju + 1);
                }

                if rd[ju] & match_mask != 0 {
                    let candidate = score(d, ju - 1);
                    // This match will almost certainly be better than any existing match.
                    if candidate <= threshold {
                        threshold = candidate;
                        best_loc = Some(ju - 1);
                        if ju - 1 > loc {
                            // When passing `loc`, don't exceed our current distance from it.
                            start = (2 * loc_i - (ju as isize - 1)).max(1);
                        } else {
                            // Already passed `loc`, downhill from here on in.
                            break;
                        }
                    }
                }
                j -= 1;
            }

            // No hope for a (better) match at greater error levels.
            if score(d + 1, loc) > threshold {
                break;
            }
            last_rd = rd;
        }

        Ok(best_loc)
    }

    /// Score of a match with `errors` mistakes found at `at`. Lower is better.
    fn bitap_score(&self, errors: usize, at: usize, loc: usize, pattern_len: usize) -> f64 {
        let accuracy = errors as f64 / pattern_len as f64;
        let proximity = at.abs_diff(loc);

        if self.matching.distance == 0 {
            // Dodge divide by zero.
            return if proximity > 0 { 1. } else { accuracy };
        }

        accuracy + proximity as f64 / self.matching.distance as f64
    }
}
