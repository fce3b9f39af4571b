//! Rewrites of an edit script that keep both of its texts intact.

use crate::{
    diff::{Diff, Ops},
    matcher::find,
    traits::Symbol,
};

// Boundary quality, best first. Used to slide edits onto natural breaks.
const EDGE_SCORE: u8 = 6;
const BLANK_LINE_SCORE: u8 = 5;
const LINE_BREAK_SCORE: u8 = 4;
const SENTENCE_END_SCORE: u8 = 3;
const WHITESPACE_SCORE: u8 = 2;
const NON_ALPHANUMERIC_SCORE: u8 = 1;

pub(crate) fn common_prefix<T: PartialEq>(lhs: &[T], rhs: &[T]) -> usize {
    lhs.iter().zip(rhs).take_while(|(l, r)| l == r).count()
}

pub(crate) fn common_suffix<T: PartialEq>(lhs: &[T], rhs: &[T]) -> usize {
    lhs.iter()
        .rev()
        .zip(rhs.iter().rev())
        .take_while(|(l, r)| l == r)
        .count()
}

/// Length of the longest suffix of `lhs` that is also a prefix of `rhs`.
pub(crate) fn common_overlap<T: PartialEq>(lhs: &[T], rhs: &[T]) -> usize {
    if lhs.is_empty() || rhs.is_empty() {
        return 0;
    }

    let len = lhs.len().min(rhs.len());
    let lhs = &lhs[lhs.len() - len..];
    let rhs = &rhs[..len];
    if lhs == rhs {
        return len;
    }

    // Grow a candidate suffix; every time it reappears in `rhs` jump ahead by the offset.
    let mut best = 0;
    let mut length = 1;
    while length <= len {
        let Some(found) = find(rhs, &lhs[len - length..], 0) else {
            break;
        };
        length += found;
        if found == 0 || lhs[len - length..] == rhs[..length] {
            best = length;
            length += 1;
        }
    }

    best
}

/// Coalesces runs of the same operation, factors text shared by a deletion and an
/// insertion out into equalities, and drops empty diffs.
pub(crate) fn cleanup_merge<T: Symbol>(diffs: &mut Vec<Diff<T>>) {
    loop {
        merge_runs(diffs);
        if !shift_single_edits(diffs) {
            break;
        }
    }
}

fn merge_runs<T: Symbol>(diffs: &mut Vec<Diff<T>>) {
    // trailing sentinel so the last run is flushed
    diffs.push(Diff::equal(&[]));

    let mut pointer = 0;
    let (mut n_delete, mut n_insert) = (0, 0);
    let mut deleted: Vec<T> = vec![];
    let mut inserted: Vec<T> = vec![];

    while pointer < diffs.len() {
        if diffs[pointer].is_empty() && pointer + 1 < diffs.len() {
            diffs.remove(pointer);
            continue;
        }

        match diffs[pointer].op() {
            Ops::Insert => {
                n_insert += 1;
                inserted.extend_from_slice(diffs[pointer].data());
                pointer += 1;
            }
            Ops::Delete => {
                n_delete += 1;
                deleted.extend_from_slice(diffs[pointer].data());
                pointer += 1;
            }
            Ops::Equal => {
                if n_delete + n_insert > 1 {
                    if n_delete != 0 && n_insert != 0 {
                        let prefix = common_prefix(&inserted, &deleted);
                        if prefix != 0 {
                            let run_start = pointer - n_delete - n_insert;
                            if run_start > 0 && diffs[run_start - 1].op() == Ops::Equal {
                                diffs[run_start - 1]
                                    .1
                                    .extend_from_slice(&inserted[..prefix]);
                            } else {
                                diffs.insert(0, Diff::equal(&inserted[..prefix]));
                                pointer += 1;
                            }
                            inserted.drain(..prefix);
                            deleted.drain(..prefix);
                        }

                        let suffix = common_suffix(&inserted, &deleted);
                        if suffix != 0 {
                            let tail = inserted.split_off(inserted.len() - suffix);
                            deleted.truncate(deleted.len() - suffix);
                            diffs[pointer].1.splice(0..0, tail);
                        }
                    }

                    let run_start = pointer - n_delete - n_insert;
                    let mut run = Vec::with_capacity(2);
                    if !deleted.is_empty() {
                        run.push(Diff(Ops::Delete, std::mem::take(&mut deleted)));
                    }
                    if !inserted.is_empty() {
                        run.push(Diff(Ops::Insert, std::mem::take(&mut inserted)));
                    }
                    let run_len = run.len();
                    diffs.splice(run_start..pointer, run);
                    pointer = run_start + run_len + 1;
                } else if pointer != 0 && diffs[pointer - 1].op() == Ops::Equal {
                    let Diff(_, data) = diffs.remove(pointer);
                    diffs[pointer - 1].1.extend(data);
                } else {
                    pointer += 1;
                }

                n_delete = 0;
                n_insert = 0;
                deleted.clear();
                inserted.clear();
            }
        }
    }

    if diffs.last().is_some_and(Diff::is_empty) {
        diffs.pop();
    }
}

// Slides single edits surrounded by equalities sideways to eliminate an equality:
// A<ins>BA</ins>C -> <ins>AB</ins>AC
fn shift_single_edits<T: Symbol>(diffs: &mut Vec<Diff<T>>) -> bool {
    let mut changes = false;
    let mut pointer = 1;

    while pointer + 1 < diffs.len() {
        if diffs[pointer - 1].op() == Ops::Equal && diffs[pointer + 1].op() == Ops::Equal {
            if diffs[pointer].data().ends_with(diffs[pointer - 1].data()) {
                let Diff(_, prev) = diffs.remove(pointer - 1);
                let edit = &mut diffs[pointer - 1].1;
                edit.truncate(edit.len() - prev.len());
                edit.splice(0..0, prev.iter().copied());
                diffs[pointer].1.splice(0..0, prev);
                changes = true;
            } else if diffs[pointer].data().starts_with(diffs[pointer + 1].data()) {
                let Diff(_, next) = diffs.remove(pointer + 1);
                diffs[pointer - 1].1.extend_from_slice(&next);
                let edit = &mut diffs[pointer].1;
                edit.drain(..next.len());
                edit.extend(next);
                changes = true;
            }
        }
        pointer += 1;
    }

    changes
}

/// Reduces the number of edits by eliminating semantically trivial equalities,
/// then aligns edit boundaries and extracts overlaps between deletions and insertions.
pub(crate) fn cleanup_semantic<T: Symbol>(diffs: &mut Vec<Diff<T>>) {
    let mut changes = false;
    let mut equalities: Vec<usize> = vec![];
    let mut last_equality: Option<usize> = None;
    let (mut inserted_before, mut deleted_before) = (0, 0);
    let (mut inserted_after, mut deleted_after) = (0, 0);

    let mut pointer = 0;
    while pointer < diffs.len() {
        if diffs[pointer].op() == Ops::Equal {
            equalities.push(pointer);
            inserted_before = inserted_after;
            deleted_before = deleted_after;
            inserted_after = 0;
            deleted_after = 0;
            last_equality = Some(diffs[pointer].size());
            pointer += 1;
            continue;
        }

        if diffs[pointer].op() == Ops::Insert {
            inserted_after += diffs[pointer].size();
        } else {
            deleted_after += diffs[pointer].size();
        }

        // An equality no longer than the edits on both of its sides is noise.
        if let Some(len) = last_equality.filter(|&len| len > 0) {
            if len <= inserted_before.max(deleted_before) && len <= inserted_after.max(deleted_after)
            {
                if let Some(at) = equalities.pop() {
                    split_equality(diffs, at);
                }
                equalities.pop();

                inserted_before = 0;
                deleted_before = 0;
                inserted_after = 0;
                deleted_after = 0;
                last_equality = None;
                changes = true;

                pointer = equalities.last().map_or(0, |&at| at + 1);
                continue;
            }
        }

        pointer += 1;
    }

    if changes {
        cleanup_merge(diffs);
    }
    cleanup_semantic_lossless(diffs);
    extract_overlaps(diffs);
}

// Turns the equality at `at` into a deletion followed by an insertion of the same text.
fn split_equality<T: Symbol>(diffs: &mut Vec<Diff<T>>, at: usize) {
    let text = diffs[at].1.clone();
    diffs[at].0 = Ops::Insert;
    diffs.insert(at, Diff(Ops::Delete, text));
}

// <del>abcxxx</del><ins>xxxdef</ins> -> <del>abc</del>xxx<ins>def</ins>
// <del>xxxabc</del><ins>defxxx</ins> -> <ins>def</ins>xxx<del>abc</del>
// Only when the overlap is at least half of one of the edits.
fn extract_overlaps<T: Symbol>(diffs: &mut Vec<Diff<T>>) {
    let mut pointer = 1;
    while pointer < diffs.len() {
        if diffs[pointer - 1].op() == Ops::Delete && diffs[pointer].op() == Ops::Insert {
            let deletion = diffs[pointer - 1].1.clone();
            let insertion = diffs[pointer].1.clone();

            let forward = common_overlap(&deletion, &insertion);
            let backward = common_overlap(&insertion, &deletion);

            if forward >= backward {
                if 2 * forward >= deletion.len() || 2 * forward >= insertion.len() {
                    diffs.insert(pointer, Diff::equal(&insertion[..forward]));
                    diffs[pointer - 1].1.truncate(deletion.len() - forward);
                    diffs[pointer + 1].1.drain(..forward);
                    pointer += 1;
                }
            } else if 2 * backward >= deletion.len() || 2 * backward >= insertion.len() {
                diffs.insert(pointer, Diff::equal(&deletion[..backward]));
                diffs[pointer - 1] = Diff::insert(&insertion[..insertion.len() - backward]);
                diffs[pointer + 1] = Diff::delete(&deletion[backward..]);
                pointer += 1;
            }
            pointer += 1;
        }
        pointer += 1;
    }
}

/// Slides single edits surrounded by equalities to the position scoring best on
/// [`boundary_score`], e.g. `The c<ins>at c</ins>ame.` -> `The <ins>cat </ins>came.`
pub(crate) fn cleanup_semantic_lossless<T: Symbol>(diffs: &mut Vec<Diff<T>>) {
    let mut pointer = 1;
    while pointer + 1 < diffs.len() {
        if pointer == 0
            || diffs[pointer - 1].op() != Ops::Equal
            || diffs[pointer + 1].op() != Ops::Equal
        {
            pointer += 1;
            continue;
        }

        let mut equality1 = diffs[pointer - 1].1.clone();
        let mut edit = diffs[pointer].1.clone();
        let mut equality2 = diffs[pointer + 1].1.clone();

        // First, shift the edit as far left as possible.
        let offset = common_suffix(&equality1, &edit);
        if offset > 0 {
            let common = edit[edit.len() - offset..].to_vec();
            equality1.truncate(equality1.len() - offset);
            edit.truncate(edit.len() - offset);
            edit.splice(0..0, common.iter().copied());
            equality2.splice(0..0, common);
        }

        // Then step right one unit at a time, keeping the best fit.
        let mut best_score = boundary_score(&equality1, &edit) + boundary_score(&edit, &equality2);
        let mut best = (equality1.clone(), edit.clone(), equality2.clone());
        while !edit.is_empty() && !equality2.is_empty() && edit[0] == equality2[0] {
            let unit = equality2.remove(0);
            equality1.push(edit.remove(0));
            edit.push(unit);

            let score = boundary_score(&equality1, &edit) + boundary_score(&edit, &equality2);
            // `>=` favours trailing over leading whitespace
            if score >= best_score {
                best_score = score;
                best = (equality1.clone(), edit.clone(), equality2.clone());
            }
        }

        let (best1, best_edit, best2) = best;
        if diffs[pointer - 1].data() != best1.as_slice() {
            if best1.is_empty() {
                diffs.remove(pointer - 1);
                pointer -= 1;
            } else {
                diffs[pointer - 1].1 = best1;
            }
            diffs[pointer].1 = best_edit;
            if best2.is_empty() {
                diffs.remove(pointer + 1);
                pointer = pointer.saturating_sub(1);
            } else {
                diffs[pointer + 1].1 = best2;
            }
        }
        pointer += 1;
    }
}

/// How good a boundary between `one` and `two` is, from 6 (edge of text) to 0.
fn boundary_score<T: Symbol>(one: &[T], two: &[T]) -> u8 {
    let (Some(last), Some(first)) = (one.last(), two.first()) else {
        return EDGE_SCORE;
    };
    let (c1, c2) = (last.as_char(), first.as_char());

    let non_alphanumeric1 = c1.map_or(true, |c| !c.is_ascii_alphanumeric());
    let non_alphanumeric2 = c2.map_or(true, |c| !c.is_ascii_alphanumeric());
    let whitespace1 = non_alphanumeric1 && c1.is_some_and(char::is_whitespace);
    let whitespace2 = non_alphanumeric2 && c2.is_some_and(char::is_whitespace);
    let line_break1 = whitespace1 && c1.is_some_and(|c| c == '\r' || c == '\n');
    let line_break2 = whitespace2 && c2.is_some_and(|c| c == '\r' || c == '\n');
    let blank_line1 = line_break1 && ends_with_blank_line(one);
    let blank_line2 = line_break2 && starts_with_blank_line(two);

    if blank_line1 || blank_line2 {
        BLANK_LINE_SCORE
    } else if line_break1 || line_break2 {
        LINE_BREAK_SCORE
    } else if non_alphanumeric1 && !whitespace1 && whitespace2 {
        SENTENCE_END_SCORE
    } else if whitespace1 || whitespace2 {
        WHITESPACE_SCORE
    } else if non_alphanumeric1 || non_alphanumeric2 {
        NON_ALPHANUMERIC_SCORE
    } else {
        0
    }
}

fn ends_with_blank_line<T: Symbol>(text: &[T]) -> bool {
    let tail = text.iter().rev().take(3).map(|s| s.as_char()).collect::<Vec<_>>();
    matches!(
        tail.as_slice(),
        [Some('\n'), Some('\n'), ..] | [Some('\n'), Some('\r'), Some('\n')]
    )
}

fn starts_with_blank_line<T: Symbol>(text: &[T]) -> bool {
    let head = text.iter().take(4).map(|s| s.as_char()).collect::<Vec<_>>();
    matches!(
        head.as_slice(),
        [Some('\n'), Some('\n'), ..]
            | [Some('\r'), Some('\n'), Some('\n'), ..]
            | [Some('\n'), Some('\r'), Some('\n'), ..]
            | [Some('\r'), Some('\n'), Some('\r'), Some('\n')]
    )
}

/// Folds edits separated by short equalities together when the extra edit
/// costs more than the units it saves. `edit_cost` is the price of one edit.
pub(crate) fn cleanup_efficiency<T: Symbol>(diffs: &mut Vec<Diff<T>>, edit_cost: usize) {
    let mut changes = false;
    let mut equalities: Vec<usize> = vec![];
    let mut last_equality: Option<usize> = None;
    // Is there an insertion or deletion before or after the last equality.
    let (mut pre_ins, mut pre_del) = (false, false);
    let (mut post_ins, mut post_del) = (false, false);

    let mut pointer = 0;
    while pointer < diffs.len() {
        if diffs[pointer].op() == Ops::Equal {
            if diffs[pointer].size() < edit_cost && (post_ins || post_del) {
                equalities.push(pointer);
                pre_ins = post_ins;
                pre_del = post_del;
                last_equality = Some(diffs[pointer].size());
            } else {
                equalities.clear();
                last_equality = None;
            }
            post_ins = false;
            post_del = false;
            pointer += 1;
            continue;
        }

        if diffs[pointer].op() == Ops::Delete {
            post_del = true;
        } else {
            post_ins = true;
        }

        // Five cases of an equality worth folding:
        // <ins>A</ins><del>B</del>XY<ins>C</ins><del>D</del>
        // <ins>A</ins>X<ins>C</ins><del>D</del>
        // <ins>A</ins><del>B</del>X<ins>C</ins>
        // <del>A</del>X<ins>C</ins><del>D</del>
        // <ins>A</ins><del>B</del>X<del>C</del>
        if let Some(len) = last_equality.filter(|&len| len > 0) {
            let sides = [pre_ins, pre_del, post_ins, post_del]
                .into_iter()
                .filter(|&side| side)
                .count();

            if sides == 4 || (2 * len < edit_cost && sides == 3) {
                if let Some(&at) = equalities.last() {
                    split_equality(diffs, at);
                }
                equalities.pop();
                last_equality = None;
                changes = true;

                if pre_ins && pre_del {
                    // No changes made which could affect previous entry, keep going.
                    post_ins = true;
                    post_del = true;
                    equalities.clear();
                } else {
                    equalities.pop();
                    post_ins = false;
                    post_del = false;
                    pointer = equalities.last().map_or(0, |&at| at + 1);
                    continue;
                }
            }
        }

        pointer += 1;
    }

    if changes {
        cleanup_merge(diffs);
    }
}
