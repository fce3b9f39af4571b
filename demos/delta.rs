use textsync::{DiffMatchPatch, Efficient, Error, PatchInput};

// Syncing an edited document by shipping a delta instead of the whole text.
// The delta needs the old text at the receiving end; `patch_make` rebuilds the
// patches from it.

const TXT_OLD: &str = "Dear team,

The release planned for Friday slips to Monday 🙁. The build farm was down
for most of Wednesday, and the migration scripts still need a review.

Thanks for your patience,
Ops";

const TXT_NEW: &str = "Dear team,

The release planned for Friday ships on time 🎉. The build farm is back up
since Wednesday evening, and the migration scripts passed review.

Thanks for your hard work,
Ops";

fn at_source() -> String {
    let dmp = DiffMatchPatch::new();

    let diffs = dmp.diff_main::<Efficient>(TXT_OLD, TXT_NEW);
    let delta = dmp.diff_to_delta(&diffs);

    // Equalities travel as counts, only the inserted text is spelled out
    println!("{delta:?}");
    println!("{} bytes instead of {}", delta.len(), TXT_NEW.len());

    delta
}

fn at_destination(delta: &str) -> Result<(), Error> {
    let dmp = DiffMatchPatch::new();

    let diffs = dmp.diff_from_delta::<Efficient>(TXT_OLD, delta)?;
    let patches = dmp.patch_make(PatchInput::new_text_diffs(TXT_OLD, &diffs));

    let (new_txt, applied) = dmp.patch_apply(&patches, TXT_OLD)?;
    println!("{} of {} patches applied", applied.len(), patches.len());

    assert_eq!(TXT_NEW, new_txt);
    println!("{new_txt}");

    Ok(())
}

fn main() -> Result<(), Error> {
    let delta = at_source();
    at_destination(&delta)
}
