//! Tuplet rewrite passes
//!
//! Every pass visits all tuplets of a component list, nested ones first, and
//! is idempotent: running it twice gives the same tree as running it once.

use super::{replace_tuplets, visit_tuplets_mut};
use crate::makers::leaves::make_leaves;
use crate::makers::normalize_nested;
use crate::models::duration;
use crate::models::{is_tied, Component, Container, Leaf, LeafKind, Music, Tag, Tuplet, TupletRatio};
use crate::specifiers::Spelling;

// ============================================================================
// Extraction and swapping
// ============================================================================

/// Splice the contents of every 1:1 tuplet into its parent
pub fn extract_trivial_tuplets(components: &mut Vec<Component>) {
    replace_tuplets(components, &mut |tuplet| {
        if tuplet.is_trivial() {
            tuplet.components
        } else {
            vec![tuplet.into()]
        }
    });
}

/// Splice the contents of every rest-filled tuplet into its parent
///
/// A prolated rest-filled tuplet is first respelled as 1:1 rests so the
/// extracted rests keep its duration. Tuplets whose duration cannot be
/// written without prolation stay in place.
pub fn extract_rest_filled_tuplets(components: &mut Vec<Component>) {
    let tag = Tag::for_function("extract_rest_filled_tuplets");
    let spelling = Spelling::default();
    replace_tuplets(components, &mut |mut tuplet| {
        if !tuplet.is_rest_filled() {
            return vec![tuplet.into()];
        }
        if !tuplet.is_trivial() {
            respell_as_one_value(&mut tuplet, LeafKind::Rest, &spelling, &tag);
        }
        if tuplet.is_trivial() {
            tuplet.components
        } else {
            vec![tuplet.into()]
        }
    });
}

/// Replace every 1:1 tuplet with a plain container
pub fn swap_trivial_tuplets_for_containers(components: &mut Vec<Component>) {
    swap_for_containers(components, Tuplet::is_trivial);
}

/// Replace every tuplet holding a single component with a plain container
pub fn swap_length_1_tuplets_for_containers(components: &mut Vec<Component>) {
    swap_for_containers(components, |tuplet| tuplet.len() == 1);
}

/// Replace every skip-filled tuplet with a plain container
pub fn swap_skip_filled_tuplets_for_containers(components: &mut Vec<Component>) {
    swap_for_containers(components, Tuplet::is_skip_filled);
}

fn swap_for_containers<P>(components: &mut Vec<Component>, predicate: P)
where
    P: Fn(&Tuplet) -> bool,
{
    replace_tuplets(components, &mut |tuplet| {
        if predicate(&tuplet) {
            let container = Container {
                components: tuplet.components,
                tag: tuplet.tag,
            };
            vec![container.into()]
        } else {
            vec![tuplet.into()]
        }
    });
}

// ============================================================================
// Ratio passes
// ============================================================================

/// Toggle every diminished tuplet so that it is augmented
pub fn force_augmentation(components: &mut [Component]) {
    visit_tuplets_mut(components, &mut |tuplet| {
        if tuplet.ratio.is_diminished() {
            tuplet.toggle_prolation();
        }
    });
}

/// Toggle every augmented tuplet so that it is diminished
pub fn force_diminution(components: &mut [Component]) {
    visit_tuplets_mut(components, &mut |tuplet| {
        if tuplet.ratio.is_augmented() {
            tuplet.toggle_prolation();
        }
    });
}

/// Rewrite tuplets as 1:1 wherever their leaves permit it
pub fn trivialize_tuplets(components: &mut [Component]) {
    visit_tuplets_mut(components, &mut Tuplet::trivialize);
}

/// Reduce every ratio to lowest terms: 8:6 becomes 4:3
pub fn reduce_tuplet_ratios(components: &mut [Component]) {
    visit_tuplets_mut(components, &mut |tuplet| tuplet.ratio = tuplet.ratio.reduced());
}

/// Bring every multiplier strictly between 1/2 and 2
pub fn normalize_tuplet_ratios(components: &mut [Component]) {
    for component in components.iter_mut() {
        match component {
            Component::Tuplet(tuplet) => normalize_nested(tuplet),
            Component::Container(container) => normalize_tuplet_ratios(&mut container.components),
            Component::Leaf(_) => {}
        }
    }
}

/// Move dots from the leaves into the ratio
///
/// Applies only to tuplets whose children are all leaves with the same
/// nonzero dot count: three dotted eighths at 1:1 become three eighths at
/// 2:3.
pub fn respell_tuplets_without_dots(components: &mut [Component]) {
    visit_tuplets_mut(components, &mut |tuplet| {
        let mut dot_counts = Vec::new();
        for component in &tuplet.components {
            match component {
                Component::Leaf(leaf) => match duration::dot_count(leaf.written_duration) {
                    Some(dots) => dot_counts.push(dots),
                    None => return,
                },
                _ => return,
            }
        }
        let dots = match dot_counts.first() {
            Some(&dots) if dots > 0 && dot_counts.iter().all(|&d| d == dots) => dots,
            _ => return,
        };
        let power = 1i64 << dots;
        let dot_multiplier = duration::duration(2 * power - 1, power);
        tuplet.ratio = TupletRatio::from_multiplier(tuplet.multiplier() * dot_multiplier);
        for leaf in tuplet.leaves_mut() {
            leaf.written_duration /= dot_multiplier;
        }
    });
}

// ============================================================================
// Content rewrites
// ============================================================================

/// Respell the contents of every rest-filled tuplet as 1:1 rests
pub fn rewrite_rest_filled_tuplets(components: &mut [Component], spelling: &Spelling, tag: &Tag) {
    let tag = tag.append_function("rewrite_rest_filled_tuplets");
    visit_tuplets_mut(components, &mut |tuplet| {
        if tuplet.is_rest_filled() {
            respell_as_one_value(tuplet, LeafKind::Rest, spelling, &tag);
        }
    });
}

/// Collapse every sustained tuplet to a single value
///
/// A tuplet is sustained when each of its leaves after the first is tied
/// to the leaf before it. The collapsed tuplet keeps the first leaf's
/// repeat tie and the last leaf's tie.
pub fn rewrite_sustained_tuplets(components: &mut [Component], tag: &Tag) {
    let tag = tag.append_function("rewrite_sustained_tuplets");
    visit_tuplets_mut(components, &mut |tuplet| {
        let (kind, repeat_tie, tie) = {
            let leaves = tuplet.leaves();
            if !is_sustained(&leaves) {
                return;
            }
            match (leaves.first(), leaves.last()) {
                (Some(first), Some(last)) => {
                    (first.kind, first.indicators.repeat_tie, last.indicators.tie)
                }
                _ => return,
            }
        };
        if !respell_as_one_value(tuplet, kind, &Spelling::default(), &tag) {
            return;
        }
        if kind == LeafKind::Note {
            let mut leaves = tuplet.leaves_mut();
            if let Some(first) = leaves.first_mut() {
                first.indicators.repeat_tie = repeat_tie;
            }
            if let Some(last) = leaves.last_mut() {
                last.indicators.tie = tie;
            }
        }
    });
}

fn is_sustained(leaves: &[&Leaf]) -> bool {
    !leaves.is_empty() && leaves.windows(2).all(|pair| is_tied(pair[0], pair[1]))
}

/// Replace the contents of `tuplet` with leaves of one value
///
/// Dyadic tuplets become 1:1. Otherwise the ratio is kept and the contents
/// are respelled at their unprolated duration. Returns false when neither
/// is possible.
fn respell_as_one_value(tuplet: &mut Tuplet, kind: LeafKind, spelling: &Spelling, tag: &Tag) -> bool {
    let total = tuplet.duration();
    if duration::is_dyadic(total) {
        tuplet.components = make_leaves(total, kind, spelling, tag);
        tuplet.ratio = TupletRatio::trivial();
        return true;
    }
    let contents = tuplet.contents_duration();
    if duration::is_dyadic(contents) {
        tuplet.components = make_leaves(contents, kind, spelling, tag);
        return true;
    }
    log::trace!("can not respell tuplet of duration {} as one value", total);
    false
}

// ============================================================================
// Notation
// ============================================================================

/// Hide the bracket and number of every 1:1 tuplet
pub fn tweak_trivial_tuplets_stencil_false(components: &mut [Component]) {
    visit_tuplets_mut(components, &mut |tuplet| {
        if tuplet.is_trivial() {
            tuplet.notation.hide = true;
        }
    });
}

/// Hide the bracket and number of every skip-filled tuplet
pub fn tweak_skip_filled_tuplets_stencil_false(components: &mut [Component]) {
    visit_tuplets_mut(components, &mut |tuplet| {
        if tuplet.is_skip_filled() {
            tuplet.notation.hide = true;
        }
    });
}

/// Show the full ratio on tuplets whose plain number would mislead
///
/// That is augmentations, nondyadic ratios and 1:1 tuplets. Tuplets
/// already showing a duration markup are left alone.
pub fn tweak_tuplet_number_text_calc_fraction_text(components: &mut [Component]) {
    visit_tuplets_mut(components, &mut |tuplet| {
        if tuplet.notation.duration_markup {
            return;
        }
        let ratio = tuplet.ratio;
        if ratio.is_augmented() || !ratio.is_dyadic() || ratio.is_trivial() {
            tuplet.notation.fraction_text = true;
        }
    });
}

/// Replace every tuplet number with the tuplet's duration as a rhythm
pub fn override_tuplet_number_text_duration_markup(components: &mut [Component]) {
    visit_tuplets_mut(components, &mut |tuplet| {
        tuplet.notation.duration_markup = true;
    });
}

/// Mark each leaf invisible
pub fn attach_invisible_music_commands_to_leaves(leaves: &mut [&mut Leaf]) {
    for leaf in leaves.iter_mut() {
        leaf.indicators.invisible = true;
    }
}

// ============================================================================
// Selection
// ============================================================================

/// Leaves of each item, one list per item
pub fn select_nongrace_leaves_by_tuplet<M: Music>(items: &mut [M]) -> Vec<Vec<&mut Leaf>> {
    items
        .iter_mut()
        .map(|item| {
            let mut leaves = Vec::new();
            item.collect_leaves_mut(&mut leaves);
            leaves
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::duration::{duration as d, Duration};
    use crate::models::sum_durations;

    fn notes(written: &[Duration]) -> Vec<Component> {
        written.iter().map(|&w| Leaf::note(w).into()).collect()
    }

    fn tied(written: &[Duration]) -> Vec<Component> {
        let count = written.len();
        written
            .iter()
            .enumerate()
            .map(|(i, &w)| {
                let mut leaf = Leaf::note(w);
                leaf.indicators.tie = i + 1 < count;
                leaf.into()
            })
            .collect()
    }

    fn triplet() -> Component {
        Tuplet::new(TupletRatio::new(3, 2), notes(&[d(1, 8); 3])).into()
    }

    #[test]
    fn test_extract_trivial_tuplets() {
        let mut components: Vec<Component> = vec![
            Tuplet::trivial(notes(&[d(1, 8), d(1, 8)])).into(),
            triplet(),
        ];
        extract_trivial_tuplets(&mut components);
        assert_eq!(components.len(), 3);
        assert!(components[0].as_leaf().is_some());
        assert!(components[2].as_tuplet().is_some());

        let once = components.clone();
        extract_trivial_tuplets(&mut components);
        assert_eq!(components, once);
    }

    #[test]
    fn test_extract_nested_trivial_tuplet() {
        let inner = Tuplet::trivial(notes(&[d(1, 8)]));
        let outer = Tuplet::new(
            TupletRatio::new(3, 2),
            vec![inner.into(), Leaf::note(d(1, 4)).into()],
        );
        let mut components: Vec<Component> = vec![outer.into()];
        extract_trivial_tuplets(&mut components);
        let outer = components[0].as_tuplet().unwrap();
        assert_eq!(outer.len(), 2);
        assert!(outer.components.iter().all(|c| c.as_leaf().is_some()));
    }

    #[test]
    fn test_extract_rest_filled_tuplets() {
        let rests = Tuplet::new(
            TupletRatio::new(5, 4),
            vec![Leaf::rest(d(1, 16)).into(); 5],
        );
        let mut components: Vec<Component> = vec![rests.into(), triplet()];
        let before = sum_durations(&components);
        extract_rest_filled_tuplets(&mut components);
        assert_eq!(sum_durations(&components), before);
        let first = components[0].as_leaf().unwrap();
        assert_eq!(first.kind, LeafKind::Rest);
        assert_eq!(first.written_duration, d(1, 4));
    }

    #[test]
    fn test_force_augmentation_and_diminution() {
        let mut components = vec![triplet()];
        force_diminution(&mut components);
        let ratio = components[0].as_tuplet().unwrap().ratio;
        assert!(ratio.is_diminished());
        force_augmentation(&mut components);
        let tuplet = components[0].as_tuplet().unwrap();
        assert!(tuplet.ratio.is_augmented());
        assert_eq!(tuplet.duration(), d(1, 4));
        assert_eq!(tuplet.leaves()[0].written_duration, d(1, 16));
    }

    #[test]
    fn test_reduce_and_normalize() {
        let mut components: Vec<Component> = vec![
            Tuplet::new(TupletRatio::new(8, 6), notes(&[d(1, 16); 8])).into(),
            Tuplet::new(TupletRatio::new(3, 1), notes(&[d(1, 4); 3])).into(),
        ];
        reduce_tuplet_ratios(&mut components);
        assert_eq!(components[0].as_tuplet().unwrap().ratio, TupletRatio::new(4, 3));
        normalize_tuplet_ratios(&mut components);
        let second = components[1].as_tuplet().unwrap();
        assert!(second.ratio.is_normalized());
        assert_eq!(second.duration(), d(1, 4));
    }

    #[test]
    fn test_trivialize_tuplets() {
        let mut components: Vec<Component> = vec![
            Tuplet::new(TupletRatio::new(2, 1), notes(&[d(1, 16), d(1, 16)])).into(),
        ];
        trivialize_tuplets(&mut components);
        let tuplet = components[0].as_tuplet().unwrap();
        assert!(tuplet.is_trivial());
        assert_eq!(tuplet.leaves()[0].written_duration, d(1, 32));
    }

    #[test]
    fn test_respell_tuplets_without_dots() {
        let mut components: Vec<Component> =
            vec![Tuplet::trivial(notes(&[d(3, 16), d(3, 16)])).into()];
        respell_tuplets_without_dots(&mut components);
        let tuplet = components[0].as_tuplet().unwrap();
        assert_eq!(tuplet.ratio, TupletRatio::new(2, 3));
        assert_eq!(tuplet.leaves()[0].written_duration, d(1, 8));
        assert_eq!(tuplet.duration(), d(3, 8));

        // Mixed dot counts are left alone
        let mut mixed: Vec<Component> = vec![Tuplet::trivial(notes(&[d(3, 16), d(1, 8)])).into()];
        let before = mixed.clone();
        respell_tuplets_without_dots(&mut mixed);
        assert_eq!(mixed, before);
    }

    #[test]
    fn test_rewrite_rest_filled_tuplets() {
        let rests = Tuplet::new(
            TupletRatio::new(3, 2),
            vec![Leaf::rest(d(1, 8)).into(); 3],
        );
        let mut components: Vec<Component> = vec![rests.into()];
        let spelling = Spelling::default();
        rewrite_rest_filled_tuplets(&mut components, &spelling, &Tag::default());
        let tuplet = components[0].as_tuplet().unwrap();
        assert!(tuplet.is_trivial());
        assert_eq!(tuplet.len(), 1);
        assert_eq!(tuplet.leaves()[0].written_duration, d(1, 4));

        let once = components.clone();
        rewrite_rest_filled_tuplets(&mut components, &spelling, &Tag::default());
        assert_eq!(components, once);
    }

    #[test]
    fn test_rewrite_sustained_tuplets() {
        let mut contents = tied(&[d(1, 8); 3]);
        if let Component::Leaf(last) = &mut contents[2] {
            last.indicators.tie = true;
        }
        let mut components: Vec<Component> = vec![
            Tuplet::new(TupletRatio::new(3, 2), contents).into(),
            triplet(),
        ];
        rewrite_sustained_tuplets(&mut components, &Tag::default());
        let sustained = components[0].as_tuplet().unwrap();
        assert!(sustained.is_trivial());
        assert_eq!(sustained.leaves().len(), 1);
        assert_eq!(sustained.leaves()[0].written_duration, d(1, 4));
        assert!(sustained.leaves()[0].indicators.tie);
        // Three attacks: not sustained
        assert_eq!(components[1].as_tuplet().unwrap().ratio, TupletRatio::new(3, 2));

        let once = components.clone();
        rewrite_sustained_tuplets(&mut components, &Tag::default());
        assert_eq!(components, once);
    }

    #[test]
    fn test_swap_for_containers() {
        let mut components: Vec<Component> = vec![
            Tuplet::trivial(notes(&[d(1, 8)])).into(),
            triplet(),
            Tuplet::trivial(vec![Leaf::skip(d(1, 4)).into()]).into(),
        ];
        swap_skip_filled_tuplets_for_containers(&mut components);
        assert!(matches!(components[2], Component::Container(_)));
        swap_length_1_tuplets_for_containers(&mut components);
        assert!(matches!(components[0], Component::Container(_)));
        swap_trivial_tuplets_for_containers(&mut components);
        assert!(matches!(components[1], Component::Tuplet(_)));
    }

    #[test]
    fn test_select_nongrace_leaves_by_tuplet() {
        let mut tuplets = vec![
            Tuplet::trivial(notes(&[d(1, 8), d(1, 8)])),
            Tuplet::new(TupletRatio::new(3, 2), notes(&[d(1, 8); 3])),
        ];
        let lists = select_nongrace_leaves_by_tuplet(&mut tuplets);
        assert_eq!(lists.iter().map(Vec::len).collect::<Vec<_>>(), vec![2, 3]);
    }

    #[test]
    fn test_stencil_tweaks() {
        let mut music: Vec<Component> = vec![
            Tuplet::trivial(notes(&[d(1, 8)])).into(),
            Tuplet::new(TupletRatio::new(3, 2), notes(&[d(1, 8); 3])).into(),
            Tuplet::new(TupletRatio::new(3, 2), vec![Leaf::skip(d(1, 8)).into(); 3]).into(),
        ];
        tweak_trivial_tuplets_stencil_false(&mut music);
        let hidden: Vec<bool> = music.iter().map(|c| c.as_tuplet().unwrap().notation.hide).collect();
        assert_eq!(hidden, vec![true, false, false]);

        tweak_skip_filled_tuplets_stencil_false(&mut music);
        let hidden: Vec<bool> = music.iter().map(|c| c.as_tuplet().unwrap().notation.hide).collect();
        assert_eq!(hidden, vec![true, false, true]);
    }

    #[test]
    fn test_fraction_text_for_misleading_ratios() {
        let mut music: Vec<Component> = vec![
            Tuplet::new(TupletRatio::new(3, 2), notes(&[d(1, 8); 3])).into(),
            Tuplet::new(TupletRatio::new(3, 4), notes(&[d(1, 8); 3])).into(),
            Tuplet::new(TupletRatio::new(4, 3), notes(&[d(1, 16); 4])).into(),
            Tuplet::trivial(notes(&[d(1, 8)])).into(),
        ];
        if let Component::Tuplet(tuplet) = &mut music[3] {
            tuplet.notation.duration_markup = true;
        }
        tweak_tuplet_number_text_calc_fraction_text(&mut music);
        let fractions: Vec<bool> = music
            .iter()
            .map(|c| c.as_tuplet().unwrap().notation.fraction_text)
            .collect();
        // 3:2 reads fine as "3"; the 1:1 tuplet already shows a duration
        assert_eq!(fractions, vec![false, true, true, false]);
    }

    #[test]
    fn test_duration_markup_reaches_nested_tuplets() {
        let inner = Tuplet::new(TupletRatio::new(3, 2), notes(&[d(1, 16); 3]));
        let mut music: Vec<Component> =
            vec![Tuplet::new(TupletRatio::new(5, 4), vec![inner.into(), Leaf::note(d(1, 4)).into()]).into()];
        override_tuplet_number_text_duration_markup(&mut music);
        let outer = music[0].as_tuplet().unwrap();
        assert!(outer.notation.duration_markup);
        assert!(outer.components[0].as_tuplet().unwrap().notation.duration_markup);
    }

    #[test]
    fn test_invisible_music() {
        let mut music = notes(&[d(1, 8), d(1, 8)]);
        let mut leaves = crate::models::leaves_mut(&mut music[1..]);
        attach_invisible_music_commands_to_leaves(&mut leaves);
        let invisible: Vec<bool> = crate::models::leaves(&music)
            .iter()
            .map(|leaf| leaf.indicators.invisible)
            .collect();
        assert_eq!(invisible, vec![false, true]);
    }
}
