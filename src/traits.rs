use std::{fmt::Debug, hash::Hash};

use crate::{codec, diff::Diff, errors::FormatError, Error, Ops};

/// Byte mode: every diff, offset and length is counted in UTF-8 bytes.
/// Fastest, but its patch and delta text only make sense to other byte-mode users.
pub type Efficient = u8;

/// Character mode: offsets and lengths are counted in Unicode scalar values, so
/// patch and delta text interoperate with other diff-match-patch ports.
pub type Compat = char;

/// A unit the diff engine can compare. Implemented for text units and for the
/// `usize` token ids produced by the tokenizer.
pub trait Symbol: Copy + Ord + Eq + Hash + Debug {
    /// The character this unit stands for, when it stands for exactly one.
    fn as_char(&self) -> Option<char>;
}

impl Symbol for u8 {
    fn as_char(&self) -> Option<char> {
        self.is_ascii().then_some(*self as char)
    }
}

impl Symbol for char {
    fn as_char(&self) -> Option<char> {
        Some(*self)
    }
}

impl Symbol for usize {
    fn as_char(&self) -> Option<char> {
        None
    }
}

/// A text unit: a [`Symbol`] that can be converted from and to strings and the wire formats.
pub trait DType: Symbol {
    fn from_str(text: &str) -> Vec<Self>;

    fn to_string(data: &[Self]) -> Result<String, Error>;

    /// Only called with ASCII characters.
    fn from_char(c: char) -> Self;

    fn percent_encode(data: &[Self]) -> String;

    fn percent_decode(text: &str) -> Result<Vec<Self>, Error>;

    /// `true` when units can hold part of a character, so an edit may leave
    /// `data` unconvertible.
    const SPLITS_CHARS: bool = false;

    /// Whether `data` converts back to a string.
    fn is_text(_data: &[Self]) -> bool {
        true
    }

    /// Rewrites a diff so that every segment converts to valid text on its own.
    fn humanize(_diffs: &mut Vec<Diff<Self>>) -> Result<(), Error> {
        Ok(())
    }
}

impl DType for u8 {
    const SPLITS_CHARS: bool = true;

    fn from_str(text: &str) -> Vec<Self> {
        text.as_bytes().to_vec()
    }

    fn is_text(data: &[Self]) -> bool {
        std::str::from_utf8(data).is_ok()
    }

    fn to_string(data: &[Self]) -> Result<String, Error> {
        std::str::from_utf8(data)
            .map(str::to_string)
            .map_err(|_| Error::Utf8Error)
    }

    fn from_char(c: char) -> Self {
        c as u8
    }

    fn percent_encode(data: &[Self]) -> String {
        codec::encode_bytes(data)
    }

    fn percent_decode(text: &str) -> Result<Vec<Self>, Error> {
        Ok(codec::decode_bytes(text)?)
    }

    // Byte diffs may cut a multi-byte character in two. Partial characters at the
    // edges of an equality are pushed into the neighbouring edit, on both sides.
    fn humanize(diffs: &mut Vec<Diff<Self>>) -> Result<(), Error> {
        let mut segments: Vec<Segment> = vec![];
        let mut current = Segment::default();
        for diff in diffs.iter() {
            match diff.op() {
                Ops::Equal => {
                    if !current.is_empty() {
                        segments.push(std::mem::take(&mut current));
                    }
                    current.equal.extend_from_slice(diff.data());
                }
                Ops::Delete => current.delete.extend_from_slice(diff.data()),
                Ops::Insert => current.insert.extend_from_slice(diff.data()),
            }
        }
        if !current.is_empty() {
            segments.push(current);
        }

        let mut fixed: Vec<Segment> = Vec::with_capacity(segments.len());
        for mut seg in segments {
            if let Some(prev) = fixed.last_mut() {
                if prev.has_edit() {
                    let head = seg
                        .equal
                        .iter()
                        .take(3)
                        .take_while(|&&b| is_continuation(b))
                        .count();
                    let moved = seg.equal.drain(..head).collect::<Vec<_>>();
                    prev.delete.extend_from_slice(&moved);
                    prev.insert.extend_from_slice(&moved);
                }
            }

            if seg.has_edit() {
                let tail = incomplete_tail(&seg.equal);
                let at = seg.equal.len() - tail;
                let moved = seg.equal.split_off(at);
                seg.delete.splice(0..0, moved.iter().copied());
                seg.insert.splice(0..0, moved);
            }

            match fixed.last_mut() {
                Some(prev) if seg.equal.is_empty() => {
                    prev.delete.append(&mut seg.delete);
                    prev.insert.append(&mut seg.insert);
                }
                _ => fixed.push(seg),
            }
        }

        diffs.clear();
        for seg in fixed {
            if !seg.equal.is_empty() {
                diffs.push(Diff::equal(&seg.equal));
            }
            if !seg.delete.is_empty() {
                diffs.push(Diff::delete(&seg.delete));
            }
            if !seg.insert.is_empty() {
                diffs.push(Diff::insert(&seg.insert));
            }
        }

        // every segment must now stand on its own
        diffs
            .iter()
            .try_for_each(|d| std::str::from_utf8(d.data()).map(|_| ()))
            .map_err(|_| Error::Utf8Error)
    }
}

impl DType for char {
    fn from_str(text: &str) -> Vec<Self> {
        text.chars().collect()
    }

    fn to_string(data: &[Self]) -> Result<String, Error> {
        Ok(data.iter().collect())
    }

    fn from_char(c: char) -> Self {
        c
    }

    fn percent_encode(data: &[Self]) -> String {
        codec::encode_bytes(data.iter().collect::<String>().as_bytes())
    }

    fn percent_decode(text: &str) -> Result<Vec<Self>, Error> {
        let bytes = codec::decode_bytes(text)?;
        let decoded = String::from_utf8(bytes).map_err(|_| FormatError::Utf8)?;

        Ok(decoded.chars().collect())
    }
}

/// An equality followed by the edit run that comes after it.
#[derive(Default)]
struct Segment {
    equal: Vec<u8>,
    delete: Vec<u8>,
    insert: Vec<u8>,
}

impl Segment {
    fn has_edit(&self) -> bool {
        !self.delete.is_empty() || !self.insert.is_empty()
    }

    fn is_empty(&self) -> bool {
        self.equal.is_empty() && !self.has_edit()
    }
}

fn is_continuation(b: u8) -> bool {
    b & 0b1100_0000 == 0b1000_0000
}

// Number of trailing bytes that begin a character without completing it.
fn incomplete_tail(bytes: &[u8]) -> usize {
    let Some(lead) = bytes
        .iter()
        .rev()
        .take(4)
        .position(|&b| !is_continuation(b))
    else {
        return 0;
    };
    let start = bytes.len() - 1 - lead;
    let width = match bytes[start] {
        b if b >= 0xf0 => 4,
        b if b >= 0xe0 => 3,
        b if b >= 0xc0 => 2,
        _ => 1,
    };

    if start + width > bytes.len() {
        bytes.len() - start
    } else {
        0
    }
}
