use crate::{Compat, DiffMatchPatch, Efficient, Error, PatchInput};

/// Checks that patches and deltas made from `old` and `new` reproduce `new`, in
/// both text representations. Panics on a mismatch.
pub fn fuzz(old: &str, new: &str) -> Result<(), Error> {
    let dmp = DiffMatchPatch::new();

    let diffs = dmp.diff_main::<Efficient>(old, new);
    let patches = dmp.patch_make(PatchInput::new_diffs(&diffs));
    assert_eq!(new, dmp.patch_apply(&patches, old)?.0);

    let delta = dmp.diff_to_delta(&diffs);
    assert_eq!(diffs, dmp.diff_from_delta::<Efficient>(old, &delta)?);

    let diffs = dmp.diff_main::<Compat>(old, new);
    let patches = dmp.patch_make(PatchInput::new_text_diffs(old, &diffs));
    let text = dmp.patch_to_text(&patches);
    assert_eq!(new, dmp.patch_apply(&dmp.patch_from_text::<Compat>(&text)?, old)?.0);

    Ok(())
}
