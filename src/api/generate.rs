//! Generation operations for the WASM API
//!
//! Each `*_request` function runs one maker on a deserialized request and
//! renders the result to a LilyPond document. The `generate*` exports wrap
//! them for JavaScript callers.

use wasm_bindgen::prelude::*;

use super::helpers::{deserialize, parse_durations, rhythm_error, serialize};
use super::types::{
    AccelerandoRequest, EvenDivisionRequest, IncisedRequest, NoteRequest, OutputOptions, Response,
    TaleaRequest, TupletsRequest,
};
use crate::commands::{
    attach_beams_to_runs_by_leaf_list, extract_trivial_tuplets, override_beam_grow_direction,
    override_tuplet_number_text_duration_markup, rewrite_meter, rewrite_rest_filled_tuplets,
    select_nongrace_leaves_by_tuplet, tweak_trivial_tuplets_stencil_false,
    tweak_tuplet_number_text_calc_fraction_text, wrap_in_time_signature_voice, BeamOptions,
};
use crate::error::{Result, RhythmError};
use crate::makers;
use crate::models::duration::Duration;
use crate::models::{Component, Tag, TimeSignature, Tuplet};
use crate::renderers::lilypond::generate_lilypond_document;
use crate::specifiers::{Spelling, State};
use crate::wasm_log;

// ============================================================================
// Native operations
// ============================================================================

pub fn talea_request(request: &TaleaRequest) -> Result<Response> {
    let durations = parse_durations(&request.durations)?;
    let (tuplets, state) = makers::talea(&durations, &request.counts, request.denominator, &request.options)?;
    render(&durations, tuplets_to_components(tuplets), Some(state), &request.output, false)
}

pub fn even_division_request(request: &EvenDivisionRequest) -> Result<Response> {
    let durations = parse_durations(&request.durations)?;
    let (tuplets, state) = makers::even_division(&durations, &request.denominators, &request.options)?;
    render(&durations, tuplets_to_components(tuplets), Some(state), &request.output, false)
}

pub fn incised_request(request: &IncisedRequest) -> Result<Response> {
    let durations = parse_durations(&request.durations)?;
    let tuplets = makers::incised(&durations, &request.incise, &request.options)?;
    render(&durations, tuplets_to_components(tuplets), None, &request.output, false)
}

/// Accelerando tuplets get feathered beams when beaming is requested
pub fn accelerando_request(request: &AccelerandoRequest) -> Result<Response> {
    let durations = parse_durations(&request.durations)?;
    let (tuplets, state) = makers::accelerando(&durations, &request.options)?;
    render(&durations, tuplets_to_components(tuplets), Some(state), &request.output, true)
}

pub fn note_request(request: &NoteRequest) -> Result<Response> {
    let durations = parse_durations(&request.durations)?;
    let components = makers::note(&durations, &request.spelling, &Tag::default())?;
    render(&durations, components, None, &request.output, false)
}

pub fn tuplets_request(request: &TupletsRequest) -> Result<Response> {
    let durations = parse_durations(&request.durations)?;
    let tuplets = makers::tuplet(&durations, &request.proportions, &Tag::default())?;
    render(&durations, tuplets_to_components(tuplets), None, &request.output, false)
}

fn tuplets_to_components(tuplets: Vec<Tuplet>) -> Vec<Component> {
    tuplets.into_iter().map(Component::from).collect()
}

/// Post-process maker output and render it under its time signatures
fn render(
    durations: &[Duration],
    mut components: Vec<Component>,
    state: Option<State>,
    output: &OutputOptions,
    feather: bool,
) -> Result<Response> {
    if output.rewrite_rest_filled_tuplets {
        rewrite_rest_filled_tuplets(&mut components, &Spelling::default(), &Tag::default());
    }
    if output.beam {
        let mut leaf_lists = select_nongrace_leaves_by_tuplet(&mut components);
        attach_beams_to_runs_by_leaf_list(&mut leaf_lists, &BeamOptions::default());
        if feather {
            override_beam_grow_direction(&mut leaf_lists);
        }
    }
    if output.extract_trivial_tuplets {
        extract_trivial_tuplets(&mut components);
    }
    if output.tuplet_number_durations {
        override_tuplet_number_text_duration_markup(&mut components);
    }
    if output.tuplet_number_fractions {
        tweak_tuplet_number_text_calc_fraction_text(&mut components);
    }
    if output.hide_trivial_tuplets {
        tweak_trivial_tuplets_stencil_false(&mut components);
    }

    let time_signatures = if output.time_signatures.is_empty() {
        durations
            .iter()
            .map(|&d| TimeSignature::from_duration(d))
            .collect::<Result<Vec<_>>>()?
    } else {
        output
            .time_signatures
            .iter()
            .map(|text| parse_time_signature(text))
            .collect::<Result<Vec<_>>>()?
    };
    let mut staff = wrap_in_time_signature_voice(components, &time_signatures)?;
    if output.rewrite_meter {
        rewrite_meter(&mut staff, None, &[])?;
    }
    let lilypond = generate_lilypond_document(&[staff], &output.lilypond)?;
    log::debug!(
        "rendered {} durations under {} time signatures",
        durations.len(),
        time_signatures.len()
    );
    Ok(Response { lilypond, state })
}

/// Parse `"6/8"` without reducing it
pub fn parse_time_signature(text: &str) -> Result<TimeSignature> {
    let invalid = || RhythmError::DurationParse(text.to_string());
    let (numerator, denominator) = text.trim().split_once('/').ok_or_else(invalid)?;
    let numerator = numerator.trim().parse::<i64>().map_err(|_| invalid())?;
    let denominator = denominator.trim().parse::<i64>().map_err(|_| invalid())?;
    TimeSignature::new(numerator, denominator)
}

// ============================================================================
// WASM exports
// ============================================================================

fn run<T, F>(name: &str, request: JsValue, operation: F) -> std::result::Result<JsValue, JsValue>
where
    T: serde::de::DeserializeOwned,
    F: FnOnce(&T) -> Result<Response>,
{
    wasm_log!("{} called", name);
    let request: T = deserialize(request, &format!("{}: invalid request", name))?;
    let response = operation(&request).map_err(|e| {
        log::error!("{} failed: {}", name, e);
        rhythm_error(name, e)
    })?;
    wasm_log!("{} produced {} bytes of LilyPond", name, response.lilypond.len());
    serialize(&response, &format!("{}: response", name))
}

#[wasm_bindgen(js_name = generateTalea)]
pub fn generate_talea(request: JsValue) -> std::result::Result<JsValue, JsValue> {
    run("generateTalea", request, talea_request)
}

#[wasm_bindgen(js_name = generateEvenDivision)]
pub fn generate_even_division(request: JsValue) -> std::result::Result<JsValue, JsValue> {
    run("generateEvenDivision", request, even_division_request)
}

#[wasm_bindgen(js_name = generateIncised)]
pub fn generate_incised(request: JsValue) -> std::result::Result<JsValue, JsValue> {
    run("generateIncised", request, incised_request)
}

#[wasm_bindgen(js_name = generateAccelerando)]
pub fn generate_accelerando(request: JsValue) -> std::result::Result<JsValue, JsValue> {
    run("generateAccelerando", request, accelerando_request)
}

#[wasm_bindgen(js_name = generateNote)]
pub fn generate_note(request: JsValue) -> std::result::Result<JsValue, JsValue> {
    run("generateNote", request, note_request)
}

#[wasm_bindgen(js_name = generateTuplets)]
pub fn generate_tuplets(request: JsValue) -> std::result::Result<JsValue, JsValue> {
    run("generateTuplets", request, tuplets_request)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::specifiers::Count;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_talea_request_renders_and_returns_state() {
        let request = TaleaRequest {
            durations: strings(&["3/8", "4/8"]),
            counts: vec![Count::Value(1), Count::Value(2), Count::Value(3)],
            denominator: 16,
            options: Default::default(),
            output: OutputOptions {
                beam: true,
                extract_trivial_tuplets: true,
                ..Default::default()
            },
        };
        let response = talea_request(&request).unwrap();
        assert!(response.lilypond.contains("\\time 3/8"));
        assert!(response.lilypond.contains("\\time 1/2"));
        let state = response.state.unwrap();
        assert_eq!(state.durations_consumed, 2);
        assert_eq!(state.talea_weight_consumed, Some(14));
    }

    #[test]
    fn test_explicit_time_signatures_are_not_reduced() {
        assert_eq!(parse_time_signature("6/8").unwrap().pair(), (6, 8));
        assert!(parse_time_signature("6").is_err());
        assert!(parse_time_signature("0/8").is_err());
    }

    #[test]
    fn test_note_request_is_stateless() {
        let request = NoteRequest {
            durations: strings(&["5/8"]),
            spelling: Spelling::default(),
            output: OutputOptions::default(),
        };
        let response = note_request(&request).unwrap();
        assert!(response.state.is_none());
        assert!(response.lilypond.contains("c'2 ~"));
        assert!(response.lilypond.contains("c'8"));
    }

    #[test]
    fn test_request_errors_propagate() {
        let request = TupletsRequest {
            durations: strings(&["1/4"]),
            proportions: vec![vec![]],
            output: OutputOptions::default(),
        };
        assert_eq!(
            tuplets_request(&request),
            Err(RhythmError::InvalidProportion(vec![]))
        );
    }
}
