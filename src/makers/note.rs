//! Note rhythm maker: one (possibly tied) note per duration

use super::check_durations;
use super::leaves::make_leaves;
use crate::error::Result;
use crate::models::duration::Duration;
use crate::models::{Component, LeafKind, Tag};
use crate::specifiers::Spelling;

/// Notes lasting each duration in turn, flattened into one list
///
/// Non-dyadic durations come back wrapped in tuplets.
pub fn note(durations: &[Duration], spelling: &Spelling, tag: &Tag) -> Result<Vec<Component>> {
    check_durations(durations)?;
    spelling.validate()?;
    let tag = tag.append_function("note");
    Ok(durations
        .iter()
        .flat_map(|&target| make_leaves(target, LeafKind::Note, spelling, &tag))
        .collect())
}
