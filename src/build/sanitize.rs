//! HTML sanitizing with a fixed user-generated-content policy.

use std::borrow::Cow;

use ammonia::Builder as AmmoniaBuilder;

use super::markdown::RenderedFragment;

/// HTML that has been through [`Sanitizer::clean`].
///
/// This is the only way to obtain one, so anything the templater embeds
/// has been sanitized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SafeFragment(String);

impl SafeFragment {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Strips scripts, event handlers and unsafe URLs while keeping the markup
/// pulldown-cmark produces for ordinary documents.
pub struct Sanitizer {
    builder: AmmoniaBuilder<'static>,
}

impl Sanitizer {
    /// The user-generated-content policy.
    ///
    /// Ammonia's defaults already allow the structural and formatting tags
    /// (tables, lists, images, links with safe schemes) and add
    /// `rel="noopener noreferrer"` to links. On top of that we keep code
    /// block language classes, element ids and task-list checkboxes.
    pub fn ugc() -> Self {
        let mut builder = AmmoniaBuilder::default();

        builder.add_tags(&["input"]);
        builder.add_tag_attributes("input", &["type", "checked", "disabled"]);
        builder.add_tag_attributes("code", &["class"]);
        builder.add_generic_attributes(&["id"]);

        builder.attribute_filter(|element, attribute, value| {
            if element == "input" && attribute == "type" {
                // Only task-list checkboxes are allowed through
                value
                    .eq_ignore_ascii_case("checkbox")
                    .then_some(Cow::Borrowed(value))
            } else {
                Some(Cow::Borrowed(value))
            }
        });

        Self { builder }
    }

    pub fn clean(&self, fragment: &RenderedFragment) -> SafeFragment {
        SafeFragment(self.clean_str(fragment.as_str()))
    }

    fn clean_str(&self, html: &str) -> String {
        self.builder.clean(html).to_string()
    }
}

impl Default for Sanitizer {
    fn default() -> Self {
        Self::ugc()
    }
}
