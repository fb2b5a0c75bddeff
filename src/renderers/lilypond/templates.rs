//! LilyPond template rendering
//!
//! Mustache templates wrap formatted music in a complete LilyPond document.
//!
//! - `Minimal`: version line and the score block only
//! - `Standard`: adds a header with the title and a layout block that
//!   keeps tuplet brackets visible
//!
//! Both define the invisible-music variables when the staves use them.

use serde::Serialize;

use super::notation::INVISIBLE_MUSIC_COLORING;
use crate::error::{Result, RhythmError};

/// Template selection for LilyPond output
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LilyPondTemplate {
    Minimal,
    Standard,
}

/// Context data for template rendering
#[derive(Debug, Clone, Serialize)]
pub struct TemplateContext {
    /// LilyPond version (e.g., "2.24.0")
    pub version: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    /// Formatted `\new Staff` blocks
    pub staves: String,

    /// Staves use the invisible-music variables
    pub invisible_music: bool,
}

impl TemplateContext {
    pub fn new(version: String, staves: String) -> Self {
        Self {
            version,
            title: None,
            invisible_music: staves.contains(INVISIBLE_MUSIC_COLORING),
            staves,
        }
    }

    pub fn builder(version: String, staves: String) -> TemplateContextBuilder {
        TemplateContextBuilder::new(version, staves)
    }
}

/// Builder for TemplateContext
pub struct TemplateContextBuilder {
    context: TemplateContext,
}

impl TemplateContextBuilder {
    pub fn new(version: String, staves: String) -> Self {
        Self {
            context: TemplateContext::new(version, staves),
        }
    }

    pub fn title(mut self, title: Option<String>) -> Self {
        self.context.title = title;
        self
    }

    pub fn build(self) -> TemplateContext {
        self.context
    }
}

/// Get template content by type
pub fn get_template_content(template_type: LilyPondTemplate) -> &'static str {
    match template_type {
        LilyPondTemplate::Minimal => include_str!("templates/minimal.ly.mustache"),
        LilyPondTemplate::Standard => include_str!("templates/standard.ly.mustache"),
    }
}

/// Render a LilyPond document using a template
pub fn render_lilypond(template_type: LilyPondTemplate, context: &TemplateContext) -> Result<String> {
    let template = mustache::compile_str(get_template_content(template_type))
        .map_err(|e| RhythmError::Template(e.to_string()))?;
    template
        .render_to_string(context)
        .map_err(|e| RhythmError::Template(e.to_string()))
}
