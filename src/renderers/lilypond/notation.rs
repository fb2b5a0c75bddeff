//! LilyPond notation for component trees
//!
//! Notes are written on a fixed pitch (`c'`); rhythm makers produce
//! durations only. One component per line, nested containers indented.

use crate::makers::leaves::make_leaves;
use crate::models::duration::{self, Duration};
use crate::models::{Component, GrowDirection, Leaf, LeafKind, Staff, Tag, Tuplet, TupletNotation, Voice};
use crate::specifiers::Spelling;

/// Pitch every note is written on
pub const NOTE_PITCH: &str = "c'";

/// Music variable that hides a leaf; emitted commented out
pub const INVISIBLE_MUSIC: &str = "\\abjad-invisible-music";

/// Music variable that prints a leaf in white
pub const INVISIBLE_MUSIC_COLORING: &str = "\\abjad-invisible-music-coloring";

/// Prefix of a deactivated line
const DEACTIVATED: &str = "%@% ";

const INDENT: &str = "    ";

/// Written duration plus multiplier, e.g. `8.` or `16 * 3/2`
pub fn duration_to_lilypond(written: Duration, multiplier: Option<Duration>) -> String {
    let (base, extra) = match duration::lilypond_duration_string(written) {
        Some(base) => (base, duration::duration(1, 1)),
        None => ("1".to_string(), written),
    };
    let total = extra * multiplier.unwrap_or_else(|| duration::duration(1, 1));
    if total == duration::duration(1, 1) {
        base
    } else {
        format!("{} * {}/{}", base, total.numer(), total.denom())
    }
}

/// One leaf with its indicators
pub fn leaf_to_lilypond(leaf: &Leaf) -> String {
    let mut result = String::new();
    if let Some(count) = leaf.indicators.beam_count {
        result.push_str(&format!(
            "\\set stemLeftBeamCount = {} \\set stemRightBeamCount = {} ",
            count.left, count.right
        ));
    }
    if let Some(direction) = leaf.indicators.beam_grow_direction {
        let direction = match direction {
            GrowDirection::Left => "left",
            GrowDirection::Right => "right",
        };
        result.push_str(&format!("\\once \\override Beam.grow-direction = #{} ", direction));
    }
    if leaf.indicators.invisible {
        result.push_str(INVISIBLE_MUSIC_COLORING);
        result.push(' ');
    }
    let head = match leaf.kind {
        LeafKind::Note => NOTE_PITCH,
        LeafKind::Rest => "r",
        LeafKind::Skip => "s",
        LeafKind::MultimeasureRest => "R",
    };
    result.push_str(head);
    result.push_str(&duration_to_lilypond(
        leaf.written_duration,
        leaf.multiplier.map(|m| m.value()),
    ));
    if leaf.indicators.repeat_tie {
        result.push_str(" \\repeatTie");
    }
    if leaf.indicators.tie {
        result.push_str(" ~");
    }
    if leaf.indicators.start_beam {
        result.push_str(" [");
    }
    if leaf.indicators.stop_beam {
        result.push_str(" ]");
    }
    result
}

/// Lines for one component at `depth`
pub fn component_to_lilypond(component: &Component, depth: usize) -> Vec<String> {
    let indent = INDENT.repeat(depth);
    match component {
        Component::Leaf(leaf) => {
            let mut lines = Vec::new();
            if leaf.indicators.invisible {
                lines.push(format!("{}{}{}", indent, DEACTIVATED, INVISIBLE_MUSIC));
            }
            lines.push(format!("{}{}", indent, leaf_to_lilypond(leaf)));
            lines
        }
        Component::Tuplet(tuplet) => {
            let opening = tuplet_opening(tuplet);
            block(&indent, &opening, &tuplet.components, depth)
        }
        Component::Container(container) => block(&indent, "{", &container.components, depth),
    }
}

/// 1:1 tuplets without tweaks are written as plain braces
fn tuplet_opening(tuplet: &Tuplet) -> String {
    let notation = &tuplet.notation;
    if tuplet.is_trivial() && *notation == TupletNotation::default() {
        return "{".to_string();
    }
    let mut opening = String::new();
    if notation.hide {
        opening.push_str("\\tweak stencil ##f ");
    }
    if notation.fraction_text {
        opening.push_str("\\tweak text #tuplet-number::calc-fraction-text ");
    }
    if notation.duration_markup {
        if let Some(markup) = duration_markup(tuplet.duration()) {
            opening.push_str(&format!("\\tweak text {} ", markup));
        }
    }
    opening.push_str(&format!(
        "\\tuplet {}/{} {{",
        tuplet.ratio.numerator, tuplet.ratio.denominator
    ));
    opening
}

/// Markup showing `value` as a rhythm, scaled to three quarters
///
/// Dyadic durations become `\rhythm` snippets joined by `+`; anything
/// else is engraved as a small score.
pub fn duration_markup(value: Duration) -> Option<String> {
    if value <= duration::zero() {
        return None;
    }
    let components = make_leaves(value, LeafKind::Note, &Spelling::default(), &Tag::default());
    let written: Option<Vec<String>> = components
        .iter()
        .map(|component| {
            component
                .as_leaf()
                .and_then(|leaf| duration::lilypond_duration_string(leaf.duration()))
        })
        .collect();
    let body = match written {
        Some(strings) => {
            let rhythms: Vec<String> = strings.iter().map(|s| format!("\\rhythm {{ {} }}", s)).collect();
            if rhythms.len() > 1 {
                format!("{{ {} }}", rhythms.join(" + "))
            } else {
                rhythms.concat()
            }
        }
        None => {
            let music: Vec<String> = components
                .iter()
                .flat_map(|component| component_to_lilypond(component, 0))
                .collect();
            format!(
                "\\score {{ \\new RhythmicStaff {{ {} }} \\layout {{ indent = 0 }} }}",
                music.join(" ")
            )
        }
    };
    Some(format!("\\markup \\scale #'(0.75 . 0.75) {}", body))
}

fn block(indent: &str, opening: &str, components: &[Component], depth: usize) -> Vec<String> {
    let mut lines = vec![format!("{}{}", indent, opening)];
    for component in components {
        lines.extend(component_to_lilypond(component, depth + 1));
    }
    lines.push(format!("{}}}", indent));
    lines
}

/// Components as one LilyPond music expression
pub fn components_to_lilypond(components: &[Component]) -> String {
    let mut lines = vec!["{".to_string()];
    for component in components {
        lines.extend(component_to_lilypond(component, 1));
    }
    lines.push("}".to_string());
    lines.join("\n")
}

pub fn voice_to_lilypond(voice: &Voice, depth: usize) -> String {
    let indent = INDENT.repeat(depth);
    let opening = format!("\\new Voice = \"{}\" {{", voice.name);
    block(&indent, &opening, &voice.components, depth).join("\n")
}

/// Staff with a skip voice carrying the time signatures
pub fn staff_to_lilypond(staff: &Staff, depth: usize) -> String {
    let indent = INDENT.repeat(depth);
    let inner = INDENT.repeat(depth + 1);
    let mut lines = vec![format!("{}\\new Staff <<", indent)];
    lines.push(format!("{}\\new Voice = \"TimeSignatureVoice\" {{", inner));
    for time_signature in &staff.time_signatures {
        lines.push(format!(
            "{}{}\\time {} s1 * {}",
            inner, INDENT, time_signature, time_signature
        ));
    }
    lines.push(format!("{}}}", inner));
    lines.push(voice_to_lilypond(&staff.voice, depth + 1));
    lines.push(format!("{}>>", indent));
    lines.join("\n")
}
