use std::collections::BTreeSet;

use textsync::{Compat, DiffMatchPatch, Efficient, Error, FormatError, PatchInput};

// Patch and delta text written by other diff-match-patch ports count offsets in
// characters; `Compat` reads and writes the same text.

#[test]
fn test_compat_foreign_patch_text() -> Result<(), Error> {
    const TXT_OLD: &str = "The quick brown fox jumps over the lazy dog.";
    const TXT_NEW: &str = "That quick brown fox jumped over a lazy dog.";
    // As produced by the reference javascript and python libraries
    const PATCH_TXT: &str = "@@ -1,11 +1,12 @@\n Th\n-e\n+at\n  quick b\n@@ -22,18 +22,17 @@\n jump\n-s\n+ed\n  over \n-the\n+a\n  laz\n";

    let dmp = DiffMatchPatch::default();
    let patches = dmp.patch_from_text::<Compat>(PATCH_TXT)?;
    let (txt_new, applied) = dmp.patch_apply(&patches, TXT_OLD)?;
    assert_eq!(TXT_NEW, txt_new);
    assert_eq!(BTreeSet::from([0, 1]), applied);

    assert_eq!(
        PATCH_TXT,
        dmp.patch_to_text(&dmp.patch_make::<Compat>(PatchInput::new_text_text(TXT_OLD, TXT_NEW)))
    );

    Ok(())
}

#[test]
fn test_compat_non_ascii_patch_text() -> Result<(), Error> {
    const TXT_OLD: &str = "Hi \u{1F60A} there";
    const TXT_NEW: &str = "Hi \u{1F642} there";

    let dmp = DiffMatchPatch::default();

    // One character replaced by another, escaped as UTF-8
    let patch_txt = "@@ -1,8 +1,8 @@\n Hi \n-%F0%9F%98%8A\n+%F0%9F%99%82\n  the\n";
    let patches = dmp.patch_make::<Compat>(PatchInput::new_text_text(TXT_OLD, TXT_NEW));
    assert_eq!(patch_txt, dmp.patch_to_text(&patches));

    let patches = dmp.patch_from_text::<Compat>(patch_txt)?;
    assert_eq!(TXT_NEW, dmp.patch_apply(&patches, TXT_OLD)?.0);

    // Byte mode shares the first two bytes of both emoji and counts in bytes
    let byte_txt = "@@ -2,10 +2,10 @@\n i %F0%9F\n-%98%8A\n+%99%82\n  the\n";
    let patches = dmp.patch_make::<Efficient>(PatchInput::new_text_text(TXT_OLD, TXT_NEW));
    assert_eq!(byte_txt, dmp.patch_to_text(&patches));
    assert_eq!(TXT_NEW, dmp.patch_apply(&patches, TXT_OLD)?.0);

    // which character mode refuses to read
    assert!(matches!(
        dmp.patch_from_text::<Compat>(byte_txt),
        Err(Error::Format(FormatError::Utf8))
    ));

    Ok(())
}

#[test]
fn test_compat_foreign_delta() -> Result<(), Error> {
    // As produced by the reference libraries
    const TXT_OLD: &str = "\u{0680} \x00 \t %\u{0681} \x01 \n ^";
    const TXT_NEW: &str = "\u{0680} \x00 \t %\u{0682} \x02 \\ |";
    const DELTA: &str = "=7\t-7\t+%DA%82 %02 %5C %7C";

    let dmp = DiffMatchPatch::default();
    let diffs = dmp.diff_from_delta::<Compat>(TXT_OLD, DELTA)?;
    assert_eq!(TXT_OLD, DiffMatchPatch::diff_text1(&diffs)?);
    assert_eq!(TXT_NEW, DiffMatchPatch::diff_text2(&diffs)?);
    assert_eq!(DELTA, dmp.diff_to_delta(&diffs));

    let patches = dmp.patch_make(PatchInput::new_text_diffs(TXT_OLD, &diffs));
    let (txt_new, _) = dmp.patch_apply(&patches, TXT_OLD)?;
    assert_eq!(TXT_NEW, txt_new);

    // Character counts do not line up with bytes
    assert!(matches!(
        dmp.diff_from_delta::<Efficient>(TXT_OLD, DELTA),
        Err(Error::Format(FormatError::DeltaLength { .. }))
    ));

    Ok(())
}
