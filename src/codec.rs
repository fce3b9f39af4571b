//! Textual forms of diffs and patches: the tab separated delta and the
//! `@@ -a,b +c,d @@` patch text, both percent-encoded.

use std::fmt::Display;

use percent_encoding::{percent_decode_str, percent_encode, AsciiSet, NON_ALPHANUMERIC};

use crate::{
    diff::{Diff, Ops},
    errors::FormatError,
    patch::{Patch, Patches},
    traits::DType,
    Error,
};

/// Left unescaped in patch and delta text, together with alphanumerics.
const SAFE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b' ')
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')')
    .remove(b';')
    .remove(b'/')
    .remove(b'?')
    .remove(b':')
    .remove(b'@')
    .remove(b'&')
    .remove(b'=')
    .remove(b'+')
    .remove(b'$')
    .remove(b',')
    .remove(b'#');

pub(crate) fn encode_bytes(data: &[u8]) -> String {
    percent_encode(data, SAFE).to_string()
}

/// Reverses [`encode_bytes`]. Every `%` must start a two digit hex escape.
pub(crate) fn decode_bytes(text: &str) -> Result<Vec<u8>, FormatError> {
    let bytes = text.as_bytes();
    let mut at = 0;
    while let Some(p) = bytes[at..].iter().position(|&b| b == b'%') {
        let escape = at + p;
        let valid = bytes
            .get(escape + 1..escape + 3)
            .is_some_and(|hex| hex.iter().all(u8::is_ascii_hexdigit));
        if !valid {
            return Err(FormatError::Escape(text.to_string()));
        }
        at = escape + 3;
    }

    Ok(percent_decode_str(text).collect())
}

impl<T: DType> Display for Patch<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(
            f,
            "@@ -{} +{} @@",
            Coords(self.start1, self.length1),
            Coords(self.start2, self.length2)
        )?;

        for diff in self.diffs.iter() {
            let sign = match diff.op() {
                Ops::Insert => '+',
                Ops::Delete => '-',
                Ops::Equal => ' ',
            };
            writeln!(f, "{sign}{}", T::percent_encode(diff.data()))?;
        }

        Ok(())
    }
}

/// 0-based start and length, rendered the GNU way: 1-based, length omitted when 1.
struct Coords(usize, usize);

impl Display for Coords {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.1 {
            0 => write!(f, "{},0", self.0),
            1 => write!(f, "{}", self.0 + 1),
            len => write!(f, "{},{len}", self.0 + 1),
        }
    }
}

pub(crate) fn parse_patches<T: DType>(text: &str) -> Result<Patches<T>, Error> {
    let mut patches = vec![];
    let mut lines = text.split('\n').peekable();

    while let Some(line) = lines.next() {
        if line.is_empty() {
            continue;
        }

        let mut patch = parse_header::<T>(line)?;

        while let Some(&line) = lines.peek() {
            let Some(sign) = line.chars().next() else {
                // Blank line? Whatever.
                lines.next();
                continue;
            };
            if sign == '@' {
                // Start of next patch.
                break;
            }

            let op = match sign {
                '-' => Ops::Delete,
                '+' => Ops::Insert,
                ' ' => Ops::Equal,
                _ => return Err(FormatError::PatchLine(line.to_string()).into()),
            };
            let data = T::percent_decode(&line[1..])?;
            patch.diffs.push(Diff(op, data));
            lines.next();
        }

        let actual = patch
            .diffs
            .iter()
            .filter(|d| d.op() != Ops::Insert)
            .map(Diff::size)
            .sum::<usize>();
        if actual != patch.length1 {
            return Err(FormatError::PatchLength {
                declared: patch.length1,
                actual,
            }
            .into());
        }

        patches.push(patch);
    }

    Ok(patches)
}

fn parse_header<T>(line: &str) -> Result<Patch<T>, FormatError> {
    let invalid = || FormatError::PatchHeader(line.to_string());

    let (old, new) = line
        .strip_prefix("@@ -")
        .and_then(|rest| rest.strip_suffix(" @@"))
        .and_then(|coords| coords.split_once(" +"))
        .ok_or_else(invalid)?;

    let (start1, length1) = parse_coords(old).ok_or_else(invalid)?;
    let (start2, length2) = parse_coords(new).ok_or_else(invalid)?;

    Ok(Patch {
        diffs: vec![],
        start1,
        start2,
        length1,
        length2,
    })
}

// `start[,len]` back to a 0-based start and a length.
// Both must fit an `isize`, patch application tracks signed drift against them.
fn parse_coords(coords: &str) -> Option<(usize, usize)> {
    let (start, len) = match coords.split_once(',') {
        Some((start, len)) => (offset(start)?, Some(offset(len)?)),
        None => (offset(coords)?, None),
    };

    match len {
        None => Some((start.checked_sub(1)?, 1)),
        Some(0) => Some((start, 0)),
        Some(len) => Some((start.checked_sub(1)?, len)),
    }
}

fn offset(digits: &str) -> Option<usize> {
    number(digits).filter(|&n| isize::try_from(n).is_ok())
}

fn number(digits: &str) -> Option<usize> {
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

pub(crate) fn to_delta<T: DType>(diffs: &[Diff<T>]) -> String {
    diffs
        .iter()
        .map(|diff| match diff.op() {
            Ops::Insert => format!("+{}", T::percent_encode(diff.data())),
            Ops::Delete => format!("-{}", diff.size()),
            Ops::Equal => format!("={}", diff.size()),
        })
        .collect::<Vec<_>>()
        .join("\t")
}

pub(crate) fn from_delta<T: DType>(old: &[T], delta: &str) -> Result<Vec<Diff<T>>, Error> {
    let mut pointer: usize = 0;
    let mut diffs = vec![];

    for token in delta.split('\t') {
        let mut chars = token.chars();
        let Some(opcode) = chars.next() else {
            continue;
        };
        let param = chars.as_str();

        match opcode {
            '+' => {
                let data = T::percent_decode(param)?;
                if !data.is_empty() {
                    diffs.push(Diff(Ops::Insert, data));
                }
            }
            '-' | '=' => {
                let n = number(param).ok_or_else(|| FormatError::DeltaToken(token.to_string()))?;
                let end = pointer.saturating_add(n);
                if end > old.len() {
                    return Err(FormatError::DeltaLength {
                        consumed: end,
                        expected: old.len(),
                    }
                    .into());
                }

                let op = if opcode == '=' { Ops::Equal } else { Ops::Delete };
                if n > 0 {
                    diffs.push(Diff::new(op, &old[pointer..end]));
                }
                pointer = end;
            }
            _ => return Err(FormatError::DeltaToken(token.to_string()).into()),
        }
    }

    if pointer != old.len() {
        return Err(FormatError::DeltaLength {
            consumed: pointer,
            expected: old.len(),
        }
        .into());
    }

    Ok(diffs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Compat, Efficient};

    fn d(op: Ops, text: &str) -> Diff<char> {
        Diff(op, text.chars().collect())
    }

    #[test]
    fn test_encode_decode_bytes() -> Result<(), FormatError> {
        assert_eq!(
            "A-Z a-z 0-9 - _ . ! ~ * ' ( ) ; / ? : @ & = + $ , # ",
            encode_bytes("A-Z a-z 0-9 - _ . ! ~ * ' ( ) ; / ? : @ & = + $ , # ".as_bytes())
        );
        assert_eq!("%DA%82 %02 %5C %7C", encode_bytes("\u{0682} \x02 \\ |".as_bytes()));
        assert_eq!("%0A%25%E2%82%AC", encode_bytes("\n%€".as_bytes()));

        assert_eq!("\u{0682} \x02 \\ |".as_bytes(), decode_bytes("%DA%82 %02 %5C %7C")?);
        // Lower case hex and literal non-ascii are accepted
        assert_eq!("€ü".as_bytes(), decode_bytes("%e2%82%acü")?);
        assert_eq!(b"a+b".to_vec(), decode_bytes("a+b")?);

        assert!(matches!(decode_bytes("100%"), Err(FormatError::Escape(_))));
        assert!(matches!(decode_bytes("%zz"), Err(FormatError::Escape(_))));
        assert!(matches!(decode_bytes("%4"), Err(FormatError::Escape(_))));

        Ok(())
    }

    #[test]
    fn test_patch_display() {
        let patch = Patch {
            diffs: vec![
                d(Ops::Equal, "jump"),
                d(Ops::Delete, "s"),
                d(Ops::Insert, "ed"),
                d(Ops::Equal, " over "),
                d(Ops::Delete, "the"),
                d(Ops::Insert, "a"),
                d(Ops::Equal, "\nlaz"),
            ],
            start1: 20,
            start2: 21,
            length1: 18,
            length2: 17,
        };
        assert_eq!(
            "@@ -21,18 +22,17 @@\n jump\n-s\n+ed\n  over \n-the\n+a\n %0Alaz\n",
            patch.to_string()
        );

        assert_eq!("0,0", Coords(0, 0).to_string());
        assert_eq!("5,0", Coords(5, 0).to_string());
        assert_eq!("6", Coords(5, 1).to_string());
        assert_eq!("6,3", Coords(5, 3).to_string());
    }

    #[test]
    fn test_parse_patches() -> Result<(), Error> {
        assert!(parse_patches::<Compat>("")?.is_empty());

        for text in [
            "@@ -21,18 +22,17 @@\n jump\n-s\n+ed\n  over \n-the\n+a\n %0Alaz\n",
            "@@ -1 +1 @@\n-a\n+b\n",
            "@@ -1,3 +0,0 @@\n-abc\n",
            "@@ -0,0 +1,3 @@\n+abc\n",
            "@@ -1,9 +1,9 @@\n-f\n+F\n oo+fooba\n@@ -7,9 +7,9 @@\n obar\n-,\n+.\n  tes\n",
        ] {
            let patches = parse_patches::<Compat>(text)?;
            let rendered = patches.iter().map(|p| p.to_string()).collect::<String>();
            assert_eq!(text, rendered);
        }

        let patches = parse_patches::<Compat>("@@ -1 +1 @@\n-a\n+b\n")?;
        assert_eq!(0, patches[0].start1);
        assert_eq!(1, patches[0].length1);

        let patches = parse_patches::<Compat>("@@ -1,3 +0,0 @@\n-abc\n")?;
        assert_eq!((0, 3, 0, 0), (patches[0].start1, patches[0].length1, patches[0].start2, patches[0].length2));

        // Byte mode keeps escapes of partial characters
        let patches = parse_patches::<Efficient>("@@ -1 +1 @@\n-%C3\n+%C4\n")?;
        assert_eq!(vec![Diff::<u8>::delete(&[0xC3]), Diff::insert(&[0xC4])], patches[0].diffs);

        Ok(())
    }

    #[test]
    fn test_parse_patches_errors() {
        let header = |text: &str| {
            matches!(
                parse_patches::<Compat>(text),
                Err(Error::Format(FormatError::PatchHeader(_)))
            )
        };
        assert!(header("Bad\nPatch\n"));
        assert!(header("@@ -1,2 +1,2\n"));
        assert!(header("@@ -a,2 +1,2 @@\n"));
        assert!(header("@@ -0 +1 @@\n-a\n"));
        assert!(header("@@ --1,2 +1,2 @@\n"));
        // Offsets beyond what a signed drift can track
        assert!(header("@@ -18446744073709551615,0 +1,0 @@\n"));
        assert!(header(&format!("@@ -1,0 +{},0 @@\n", isize::MAX as usize + 1)));

        assert!(matches!(
            parse_patches::<Compat>("@@ -1,2 +1,2 @@\n*ab\n"),
            Err(Error::Format(FormatError::PatchLine(_)))
        ));
        assert!(matches!(
            parse_patches::<Compat>("@@ -1,5 +1,5 @@\n-Hell\n+World\n"),
            Err(Error::Format(FormatError::PatchLength {
                declared: 5,
                actual: 4
            }))
        ));
        assert!(matches!(
            parse_patches::<Compat>("@@ -1 +1 @@\n-%\n"),
            Err(Error::Format(FormatError::Escape(_)))
        ));
        // Not text in character mode
        assert!(matches!(
            parse_patches::<Compat>("@@ -1 +1 @@\n-%C3\n+a\n"),
            Err(Error::Format(FormatError::Utf8))
        ));
    }

    #[test]
    fn test_delta() -> Result<(), Error> {
        let diffs = vec![
            d(Ops::Equal, "jump"),
            d(Ops::Delete, "s"),
            d(Ops::Insert, "ed"),
            d(Ops::Equal, " over "),
            d(Ops::Delete, "the"),
            d(Ops::Insert, "a"),
            d(Ops::Equal, " lazy"),
            d(Ops::Insert, "old dog"),
        ];
        let old = "jumps over the lazy".chars().collect::<Vec<_>>();

        let delta = to_delta(&diffs);
        assert_eq!("=4\t-1\t+ed\t=6\t-3\t+a\t=5\t+old dog", delta);
        assert_eq!(diffs, from_delta(&old, &delta)?);

        // Generates error (19 != 20).
        let longer = "jumps over the lazyx".chars().collect::<Vec<_>>();
        assert!(matches!(
            from_delta(&longer, &delta),
            Err(Error::Format(FormatError::DeltaLength {
                consumed: 19,
                expected: 20
            }))
        ));
        // Generates error (19 != 18).
        assert!(matches!(
            from_delta(&old[1..], &delta),
            Err(Error::Format(FormatError::DeltaLength { .. }))
        ));
        // Generates error (%c3%xy invalid Unicode).
        assert!(matches!(
            from_delta::<char>(&[], "+%c3%xy"),
            Err(Error::Format(FormatError::Escape(_)))
        ));

        // Special characters.
        let diffs = vec![
            d(Ops::Equal, "\u{0680} \x00 \t %"),
            d(Ops::Delete, "\u{0681} \x01 \n ^"),
            d(Ops::Insert, "\u{0682} \x02 \\ |"),
        ];
        let old = "\u{0680} \x00 \t %\u{0681} \x01 \n ^".chars().collect::<Vec<_>>();
        let delta = to_delta(&diffs);
        assert_eq!("=7\t-7\t+%DA%82 %02 %5C %7C", delta);
        assert_eq!(diffs, from_delta(&old, &delta)?);

        // Unchanged characters.
        let diffs = vec![d(
            Ops::Insert,
            "A-Z a-z 0-9 - _ . ! ~ * ' ( ) ; / ? : @ & = + $ , # ",
        )];
        let delta = to_delta(&diffs);
        assert_eq!("+A-Z a-z 0-9 - _ . ! ~ * ' ( ) ; / ? : @ & = + $ , # ", delta);
        assert_eq!(diffs, from_delta::<char>(&[], &delta)?);

        // Counts follow the unit: 7 bytes, not 7 characters, in byte mode.
        let bytes = "\u{0680} \x00 \t %\u{0681} \x01 \n ^".as_bytes();
        let diffs = vec![Diff::equal(&bytes[..8]), Diff::delete(&bytes[8..])];
        assert_eq!("=8\t-8", to_delta(&diffs));
        assert_eq!(diffs, from_delta(bytes, "=8\t-8")?);

        // Bad tokens
        for bad in ["=x", "-", "=-1", "=+1", "*3", "=3\t%2"] {
            assert!(
                matches!(
                    from_delta(&old, bad),
                    Err(Error::Format(FormatError::DeltaToken(_)))
                ),
                "{bad}"
            );
        }
        // Counts that run past the end, however large
        assert!(matches!(
            from_delta(&['a', 'b'], &format!("=1\t={}", usize::MAX)),
            Err(Error::Format(FormatError::DeltaLength {
                consumed: usize::MAX,
                expected: 2
            }))
        ));
        assert!(matches!(
            from_delta(&['a', 'b'], "=99999999999999999999999"),
            Err(Error::Format(FormatError::DeltaToken(_)))
        ));
        // Empty tokens are skipped
        assert_eq!(
            vec![d(Ops::Equal, "ab")],
            from_delta(&['a', 'b'], "=2\t\t")?
        );

        Ok(())
    }
}
