//! Rewrite commands
//!
//! Passes that run over the music a maker returned: tuplet rewrites
//! (extraction, prolation toggling, respelling, tuplet number notation),
//! tie and leaf utilities, beaming, and measure splitting with meter
//! rewriting.
//!
//! Tuplet passes take the component list they may splice into and visit
//! every tuplet in it, nested tuplets first. Tie and beam passes take
//! flattened mutable leaf lists; neighbour queries stay inside the list.

pub mod beams;
pub mod meter;
pub mod ties;
pub mod tuplets;

pub use beams::{
    attach_beams_to_runs_by_leaf_list, attach_span_beams_to_runs_across_leaf_lists, beam,
    detach_beams_from_leaves, make_beamable_groups, override_beam_grow_direction, unbeam,
    BeamOptions,
};
pub use meter::{group_by_measure, rewrite_meter, split_measures, wrap_in_time_signature_voice};
pub use ties::{
    attach_repeat_ties_to_pleaves, attach_ties_to_pleaves, detach_ties_from_leaves,
    replace_leaves_with_notes, replace_leaves_with_rests, replace_ties_with_repeat_ties,
    respell_leaves_written_duration_and_dmp, TieThreshold,
};
pub use tuplets::{
    attach_invisible_music_commands_to_leaves, extract_rest_filled_tuplets, extract_trivial_tuplets,
    force_augmentation, force_diminution, normalize_tuplet_ratios, override_tuplet_number_text_duration_markup,
    reduce_tuplet_ratios, respell_tuplets_without_dots, rewrite_rest_filled_tuplets, rewrite_sustained_tuplets,
    select_nongrace_leaves_by_tuplet, swap_length_1_tuplets_for_containers,
    swap_skip_filled_tuplets_for_containers, swap_trivial_tuplets_for_containers, trivialize_tuplets,
    tweak_skip_filled_tuplets_stencil_false, tweak_trivial_tuplets_stencil_false,
    tweak_tuplet_number_text_calc_fraction_text,
};

use crate::models::{Component, Tuplet};

/// Call `f` on every tuplet in `components`, innermost first
pub(crate) fn visit_tuplets_mut<F>(components: &mut [Component], f: &mut F)
where
    F: FnMut(&mut Tuplet),
{
    for component in components.iter_mut() {
        match component {
            Component::Tuplet(tuplet) => {
                visit_tuplets_mut(&mut tuplet.components, f);
                f(tuplet);
            }
            Component::Container(container) => visit_tuplets_mut(&mut container.components, f),
            Component::Leaf(_) => {}
        }
    }
}

/// Rebuild `components`, letting `f` replace each tuplet (innermost first)
///
/// `f` receives the tuplet by value and returns what takes its place.
pub(crate) fn replace_tuplets<F>(components: &mut Vec<Component>, f: &mut F)
where
    F: FnMut(Tuplet) -> Vec<Component>,
{
    let old = std::mem::take(components);
    for component in old {
        match component {
            Component::Tuplet(mut tuplet) => {
                replace_tuplets(&mut tuplet.components, f);
                components.extend(f(tuplet));
            }
            Component::Container(mut container) => {
                replace_tuplets(&mut container.components, f);
                components.push(container.into());
            }
            leaf @ Component::Leaf(_) => components.push(leaf),
        }
    }
}
