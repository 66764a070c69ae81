//! DOM compiler options.

use gesso_canvas::{BindingMetadata, CodegenMode, CompilerOptions, WhitespaceStrategy};
use gesso_palette::String;
use serde::{Deserialize, Serialize};

use crate::parser_options::dom_parser_options;

/// Options a host passes for a browser build, usually as JSON
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DomCompilerOptions {
    pub mode: CodegenMode,
    pub prefix_identifiers: bool,
    pub hoist_static: bool,
    pub hoist_children_arrays: bool,
    /// Hot reload build; hoisted children arrays are copied per render
    pub hmr: bool,
    pub cache_handlers: bool,
    /// Scoped style id
    pub scope_id: Option<String>,
    pub source_map: bool,
    pub comments: bool,
    pub whitespace: WhitespaceStrategy,
    /// Interpolation delimiters, `{{`/`}}` when unset
    pub delimiters: Option<(String, String)>,
    pub inline: bool,
    pub filename: String,
    pub binding_metadata: Option<BindingMetadata>,
}

impl Default for DomCompilerOptions {
    fn default() -> Self {
        Self {
            mode: CodegenMode::Function,
            prefix_identifiers: false,
            hoist_static: true,
            hoist_children_arrays: false,
            hmr: false,
            cache_handlers: false,
            scope_id: None,
            source_map: false,
            comments: false,
            whitespace: WhitespaceStrategy::Condense,
            delimiters: None,
            inline: false,
            filename: String::const_new("template.vue"),
            binding_metadata: None,
        }
    }
}

impl DomCompilerOptions {
    /// Full compiler options with the DOM parser settings
    pub fn to_compiler_options(&self) -> CompilerOptions {
        let mut options = CompilerOptions {
            parser: dom_parser_options(),
            ..CompilerOptions::default()
        };

        let parser = &mut options.parser;
        parser.comments = self.comments;
        parser.whitespace = self.whitespace;
        if let Some(delimiters) = &self.delimiters {
            parser.delimiters = delimiters.clone();
        }

        let transform = &mut options.transform;
        transform.filename = self.filename.clone();
        transform.prefix_identifiers = self.prefix_identifiers;
        transform.hoist_static = self.hoist_static;
        transform.hoist_children_arrays = self.hoist_children_arrays;
        transform.hmr = self.hmr;
        transform.cache_handlers = self.cache_handlers;
        transform.scope_id = self.scope_id.clone();
        transform.inline = self.inline;
        transform.binding_metadata = self.binding_metadata.clone();

        options.codegen.mode = self.mode;
        options.codegen.source_map = self.source_map;
        options
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gesso_canvas::BindingType;

    #[test]
    fn test_default_options() {
        let options = DomCompilerOptions::default();
        assert!(!options.prefix_identifiers);
        assert!(options.hoist_static);
        assert_eq!(options.mode, CodegenMode::Function);
    }

    #[test]
    fn test_from_json() {
        let options: DomCompilerOptions = serde_json::from_str(
            r#"{
                "mode": "module",
                "cacheHandlers": true,
                "delimiters": ["${", "}"],
                "bindingMetadata": { "bindings": { "count": "setup-ref" }, "isScriptSetup": true }
            }"#,
        )
        .unwrap();
        assert_eq!(options.mode, CodegenMode::Module);
        assert!(options.cache_handlers);
        assert!(options.hoist_static);

        let compiler = options.to_compiler_options();
        assert_eq!(compiler.parser.delimiters.0, "${");
        let metadata = compiler.transform.binding_metadata.unwrap();
        assert_eq!(metadata.get("count"), Some(BindingType::SetupRef));
    }
}
