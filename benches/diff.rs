use criterion::{criterion_group, criterion_main, Criterion};
use textsync::{Compat, DiffMatchPatch, Efficient, PatchInput};

// A few kilobytes of prose with scattered edits
fn texts() -> (String, String) {
    let paragraph = "Lorem ipsum dolor sit amet, consectetur adipiscing elit, sed do eiusmod \
                     tempor incididunt ut labore et dolore magna aliqua. Ut enim ad minim veniam, \
                     quis nostrud exercitation ullamco laboris nisi ut aliquip ex ea commodo.\n";

    let old = paragraph.repeat(40);
    let new = old
        .lines()
        .enumerate()
        .map(|(i, line)| match i % 7 {
            0 => line.replace("dolor", "dolorem"),
            3 => line.replace("minim veniam", "maxim venia"),
            5 => format!("{line} Excepteur sint occaecat."),
            _ => line.to_string(),
        })
        .collect::<Vec<_>>()
        .join("\n");

    (old, new)
}

fn diff_main(c: &mut Criterion) {
    let (old, new) = texts();
    let dmp = DiffMatchPatch::default();

    c.bench_function("diff-efficient", |bencher| {
        bencher.iter(|| dmp.diff_main::<Efficient>(&old, &new));
    });
    c.bench_function("diff-compat", |bencher| {
        bencher.iter(|| dmp.diff_main::<Compat>(&old, &new));
    });

    let mut fast = DiffMatchPatch::default();
    fast.set_high_quality(false);
    c.bench_function("diff-line-mode", |bencher| {
        bencher.iter(|| fast.diff_main::<Efficient>(&old, &new));
    });
}

fn patch_apply(c: &mut Criterion) {
    let (old, new) = texts();
    let dmp = DiffMatchPatch::default();
    let patches = dmp.patch_make::<Compat>(PatchInput::new_text_text(&old, &new));
    let drifted = format!("Preface.\n{old}");

    c.bench_function("patch-apply-drifted", |bencher| {
        bencher.iter(|| dmp.patch_apply(&patches, &drifted));
    });
}

criterion_group!(diff, diff_main, patch_apply);
criterion_main!(diff);
