use textsync::{Compat, DiffMatchPatch, Efficient, Error, PatchInput};

// The same edit in both unit modes.
//
// `Efficient` diffs raw UTF-8 bytes: fast, but offsets in patch text count bytes
// and edits may split a multi-byte character. Only this crate reads it back.
// `Compat` diffs characters and produces patch text any diff-match-patch port
// understands.

const TXT_OLD: &str = "Grocery list:
- 2 kg potatoes 🥔
- milk
- Käse (Gouda, mild)
- coffee ☕, the strong one";

const TXT_NEW: &str = "Grocery list:
- 1 kg potatoes 🥔
- oat milk 🥛
- Käse (Gouda, alt)
- tea 🍵, the green one";

fn roundtrip<T: textsync::DType>(dmp: &DiffMatchPatch, label: &str) -> Result<(), Error> {
    let patches = dmp.patch_make::<T>(PatchInput::new_text_text(TXT_OLD, TXT_NEW));
    let patch_txt = dmp.patch_to_text(&patches);
    println!("{label}:\n{patch_txt}");

    let patches = dmp.patch_from_text::<T>(&patch_txt)?;
    let (new_txt, applied) = dmp.patch_apply(&patches, TXT_OLD)?;
    assert_eq!(TXT_NEW, new_txt);
    println!("{label}: {} of {} patches applied\n", applied.len(), patches.len());

    Ok(())
}

fn main() -> Result<(), Error> {
    let dmp = DiffMatchPatch::new();

    roundtrip::<Efficient>(&dmp, "efficient")?;
    roundtrip::<Compat>(&dmp, "compat")
}
