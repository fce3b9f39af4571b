use std::fmt::Display;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::traits::Symbol;

/// The operation carried by a [`Diff`]
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[repr(i8)]
pub enum Ops {
    Delete = -1,
    Equal = 0,
    Insert = 1,
}

/// One step of an edit script.
/// (Ops::Delete, "Hello") means delete `Hello`
/// (Ops::Insert, "Goodbye") means add `Goodbye`
/// (Ops::Equal, "World") means keep `World`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Diff<T>(pub(crate) Ops, pub(crate) Vec<T>);

impl Display for Diff<u8> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "({:?}, {})",
            self.op(),
            String::from_utf8_lossy(self.data())
        )
    }
}

impl Display for Diff<char> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "({:?}, {})",
            self.op(),
            self.data().iter().collect::<String>()
        )
    }
}

impl<T: Copy> Diff<T> {
    pub fn new(op: Ops, data: &[T]) -> Self {
        Self(op, data.to_vec())
    }

    pub fn delete(data: &[T]) -> Self {
        Self::new(Ops::Delete, data)
    }

    pub fn insert(data: &[T]) -> Self {
        Self::new(Ops::Insert, data)
    }

    pub fn equal(data: &[T]) -> Self {
        Self::new(Ops::Equal, data)
    }

    pub fn op(&self) -> Ops {
        self.0
    }

    pub fn data(&self) -> &[T] {
        &self.1[..]
    }

    pub fn size(&self) -> usize {
        self.1.len()
    }

    pub fn is_empty(&self) -> bool {
        self.1.is_empty()
    }
}

/// Source side of an edit script: every equality and deletion, in order.
pub(crate) fn text_old<T: Copy>(diffs: &[Diff<T>]) -> Vec<T> {
    diffs
        .iter()
        .filter(|d| d.op() != Ops::Insert)
        .flat_map(|d| d.data().iter().copied())
        .collect()
}

/// Destination side of an edit script: every equality and insertion, in order.
pub(crate) fn text_new<T: Copy>(diffs: &[Diff<T>]) -> Vec<T> {
    diffs
        .iter()
        .filter(|d| d.op() != Ops::Delete)
        .flat_map(|d| d.data().iter().copied())
        .collect()
}

/// Total number of units inserted plus units deleted.
pub(crate) fn levenshtein<T: Copy>(diffs: &[Diff<T>]) -> usize {
    diffs
        .iter()
        .filter(|d| d.op() != Ops::Equal)
        .map(|d| d.size())
        .sum()
}

/// Edit distance where a deletion and an insertion in the same run count as substitutions.
pub(crate) fn edit_distance<T: Copy>(diffs: &[Diff<T>]) -> usize {
    let mut distance = 0;
    let (mut inserted, mut deleted) = (0, 0);

    for diff in diffs {
        match diff.op() {
            Ops::Insert => inserted += diff.size(),
            Ops::Delete => deleted += diff.size(),
            Ops::Equal => {
                distance += inserted.max(deleted);
                inserted = 0;
                deleted = 0;
            }
        }
    }

    distance + inserted.max(deleted)
}

/// Maps `loc`, an offset into the source text, to the equivalent offset in the destination.
/// A location inside a deletion maps to where the deletion happened.
pub(crate) fn x_index<T: Symbol>(diffs: &[Diff<T>], loc: usize) -> usize {
    let (mut chars1, mut chars2) = (0, 0);
    let (mut last1, mut last2) = (0, 0);

    let mut hit = None;
    for diff in diffs {
        if diff.op() != Ops::Insert {
            chars1 += diff.size();
        }
        if diff.op() != Ops::Delete {
            chars2 += diff.size();
        }
        if chars1 > loc {
            hit = Some(diff);
            break;
        }
        last1 = chars1;
        last2 = chars2;
    }

    match hit {
        Some(diff) if diff.op() == Ops::Delete => last2,
        _ => last2 + (loc - last1),
    }
}
