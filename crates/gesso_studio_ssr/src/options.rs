//! SSR compiler options.

use gesso_canvas::{BindingMetadata, CodegenMode, CompilerOptions, WhitespaceStrategy};
use gesso_palette::String;
use serde::{Deserialize, Serialize};

use gesso_studio_dom::dom_parser_options;

/// Options for a server build
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SsrCompilerOptions {
    pub mode: CodegenMode,
    /// Scoped style id, rendered as an attribute of every plain element
    pub scope_id: Option<String>,
    pub comments: bool,
    pub whitespace: WhitespaceStrategy,
    pub inline: bool,
    pub filename: String,
    pub binding_metadata: Option<BindingMetadata>,
}

impl Default for SsrCompilerOptions {
    fn default() -> Self {
        Self {
            mode: CodegenMode::Function,
            scope_id: None,
            comments: false,
            whitespace: WhitespaceStrategy::Condense,
            inline: false,
            filename: String::const_new("template.vue"),
            binding_metadata: None,
        }
    }
}

impl SsrCompilerOptions {
    /// Server builds always prefix identifiers and never hoist or cache
    pub fn to_compiler_options(&self) -> CompilerOptions {
        let mut options = CompilerOptions {
            parser: dom_parser_options(),
            ..CompilerOptions::default()
        };
        options.parser.comments = self.comments;
        options.parser.whitespace = self.whitespace;

        let transform = &mut options.transform;
        transform.ssr = true;
        transform.prefix_identifiers = true;
        transform.hoist_static = false;
        transform.cache_handlers = false;
        transform.filename = self.filename.clone();
        transform.scope_id = self.scope_id.clone();
        transform.inline = self.inline;
        transform.binding_metadata = self.binding_metadata.clone();

        options.codegen.mode = self.mode;
        options.sync();
        options
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_settings_are_forced() {
        let options = SsrCompilerOptions::default().to_compiler_options();
        assert!(options.transform.ssr);
        assert!(options.codegen.ssr);
        assert!(options.transform.prefix_identifiers);
        assert!(options.codegen.prefix_identifiers);
        assert!(!options.transform.hoist_static);
        assert!(!options.transform.cache_handlers);
    }

    #[test]
    fn test_from_json() {
        let options: SsrCompilerOptions =
            serde_json::from_str(r#"{ "mode": "module", "scopeId": "data-v-1a2b", "comments": true }"#).unwrap();
        assert_eq!(options.mode, CodegenMode::Module);
        assert_eq!(options.scope_id.as_deref(), Some("data-v-1a2b"));
        assert!(options.to_compiler_options().parser.comments);
    }
}
