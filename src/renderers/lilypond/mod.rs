//! LilyPond output
//!
//! `notation` formats component trees; `templates` wraps them into full
//! documents.

pub mod notation;
pub mod templates;

pub use notation::{components_to_lilypond, leaf_to_lilypond, staff_to_lilypond, voice_to_lilypond};
pub use templates::{render_lilypond, LilyPondTemplate, TemplateContext};

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::models::Staff;

/// Document-level settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LilyPondSettings {
    pub version: String,
    pub title: Option<String>,
}

impl Default for LilyPondSettings {
    fn default() -> Self {
        Self {
            version: "2.24.0".to_string(),
            title: None,
        }
    }
}

/// Complete LilyPond document for `staves`
///
/// Uses the standard template when a title is set, the minimal one
/// otherwise.
pub fn generate_lilypond_document(staves: &[Staff], settings: &LilyPondSettings) -> Result<String> {
    let content = staves
        .iter()
        .map(|staff| staff_to_lilypond(staff, 2))
        .collect::<Vec<_>>()
        .join("\n");
    let title = settings.title.as_ref().map(|s| escape_lilypond_string(s));
    let template = if title.is_some() {
        LilyPondTemplate::Standard
    } else {
        LilyPondTemplate::Minimal
    };
    let context = TemplateContext::builder(settings.version.clone(), content)
        .title(title)
        .build();
    let document = render_lilypond(template, &context)?;
    log::debug!("generated LilyPond document of {} bytes", document.len());
    Ok(document)
}

/// Escape special characters for LilyPond strings
fn escape_lilypond_string(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"")
}
