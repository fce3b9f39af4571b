//! Diff, fuzzy match and patch for plain text.
//!
//! ```
//! use textsync::{Compat, DiffMatchPatch, PatchInput};
//!
//! let dmp = DiffMatchPatch::new();
//! let patches = dmp.patch_make::<Compat>(PatchInput::new_text_text(
//!     "The quick brown fox.",
//!     "The quick red fox.",
//! ));
//! let text = dmp.patch_to_text(&patches);
//!
//! // elsewhere, on a text that drifted in the meantime
//! let patches = dmp.patch_from_text::<Compat>(&text)?;
//! let (patched, applied) = dmp.patch_apply(&patches, "Look! The quick brown fox.")?;
//! assert_eq!("Look! The quick red fox.", patched);
//! assert_eq!(1, applied.len());
//! # Ok::<(), textsync::Error>(())
//! ```

mod cleanup;
mod codec;
pub mod config;
mod diff;
pub mod dmp;
pub mod errors;
pub mod fuzz;
mod html;
mod matcher;
mod patch;
pub mod patch_input;
mod time;
mod tokenizer;
pub mod traits;

pub use config::{Config, DiffConfig, MatchConfig, PatchConfig, MATCH_MAX_BITS};
pub use diff::{Diff, Ops};
pub use dmp::DiffMatchPatch;
pub use errors::{Error, FormatError};
pub use html::HtmlConfig;
pub use patch::{Patch, Patches};
pub use patch_input::PatchInput;
pub use tokenizer::TokenMode;
pub use traits::{Compat, DType, Efficient, Symbol};
