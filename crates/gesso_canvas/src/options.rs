//! Compiler options.

use crate::{CompilerError, ElementNode, Namespace, RuntimeHelper};
use gesso_palette::{FxHashMap, String};
use serde::{Deserialize, Serialize};

/// Text mode for element content
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextMode {
    /// Normal text parsing (default)
    #[default]
    Data,
    /// Entities decoded, no tags (`textarea`, `title`)
    RcData,
    /// Verbatim (`script`, `style`)
    RawText,
    /// Inside `<![CDATA[`
    CData,
    /// Attribute value
    AttributeValue,
}

/// Whitespace handling strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WhitespaceStrategy {
    /// Condense whitespace (default)
    #[default]
    Condense,
    /// Preserve all whitespace
    Preserve,
}

/// Namespace resolver: `(tag, parent) -> namespace`
pub type GetNamespace = fn(&str, Option<&ElementNode<'_>>) -> Namespace;

/// Text mode resolver: `(tag, namespace) -> mode`
pub type GetTextMode = fn(&str, Namespace) -> TextMode;

/// Entity decoder: `(raw, in_attribute) -> decoded`
pub type DecodeEntities = fn(&str, bool) -> String;

/// Diagnostic sink
pub type DiagnosticHandler = fn(CompilerError);

/// Parser options
#[derive(Debug, Clone)]
pub struct ParserOptions {
    pub whitespace: WhitespaceStrategy,
    /// Interpolation delimiters (default: `{{` and `}}`)
    pub delimiters: (String, String),
    pub is_void_tag: fn(&str) -> bool,
    /// Content of these tags keeps its whitespace
    pub is_pre_tag: fn(&str) -> bool,
    pub is_custom_element: Option<fn(&str) -> bool>,
    pub is_native_tag: Option<fn(&str) -> bool>,
    /// Platform components (`Transition`, ...), resolved to their helper
    pub is_builtin_component: Option<fn(&str) -> Option<RuntimeHelper>>,
    pub get_namespace: GetNamespace,
    pub get_text_mode: GetTextMode,
    pub decode_entities: DecodeEntities,
    /// Keep comments in the output
    pub comments: bool,
    pub on_error: Option<DiagnosticHandler>,
    pub on_warn: Option<DiagnosticHandler>,
}

impl Default for ParserOptions {
    fn default() -> Self {
        Self {
            whitespace: WhitespaceStrategy::Condense,
            delimiters: (String::const_new("{{"), String::const_new("}}")),
            is_void_tag: gesso_palette::is_void_tag,
            is_pre_tag: |_| false,
            is_custom_element: None,
            is_native_tag: None,
            is_builtin_component: None,
            get_namespace: |_, _| Namespace::Html,
            get_text_mode: |_, _| TextMode::Data,
            decode_entities: decode_basic_entities,
            comments: false,
            on_error: None,
            on_warn: None,
        }
    }
}

/// Decodes the five XML entities and numeric character references.
/// Platforms with a full entity table override this.
pub fn decode_basic_entities(raw: &str, _in_attribute: bool) -> String {
    if !raw.contains('&') {
        return String::from(raw);
    }
    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        rest = &rest[amp..];
        let decoded = rest.find(';').and_then(|semi| {
            let name = &rest[1..semi];
            let ch = match name {
                "amp" => Some('&'),
                "lt" => Some('<'),
                "gt" => Some('>'),
                "quot" => Some('"'),
                "apos" => Some('\''),
                _ => decode_numeric_reference(name),
            };
            ch.map(|c| (c, semi + 1))
        });
        match decoded {
            Some((c, consumed)) => {
                out.push(c);
                rest = &rest[consumed..];
            }
            None => {
                out.push('&');
                rest = &rest[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

/// `#38` / `#x26` -> char
pub fn decode_numeric_reference(name: &str) -> Option<char> {
    let digits = name.strip_prefix('#')?;
    let code = match digits.strip_prefix(['x', 'X']) {
        Some(hex) => u32::from_str_radix(hex, 16).ok()?,
        None => digits.parse::<u32>().ok()?,
    };
    match code {
        0 => Some('\u{fffd}'),
        _ => char::from_u32(code).or(Some('\u{fffd}')),
    }
}

/// Transform options
#[derive(Debug, Clone)]
pub struct TransformOptions {
    /// Filename for error messages
    pub filename: String,
    /// Rewrite free identifiers to `_ctx.` access instead of `with (_ctx)`
    pub prefix_identifiers: bool,
    /// Hoist constant subtrees out of the render function
    pub hoist_static: bool,
    /// Also hoist children arrays whose elements all hoisted
    pub hoist_children_arrays: bool,
    /// Hot reload: hoisted children arrays are copied at render time
    pub hmr: bool,
    /// Cache inline event handlers in `_cache`
    pub cache_handlers: bool,
    /// Scoped style id
    pub scope_id: Option<String>,
    /// Server rendering
    pub ssr: bool,
    /// Render function is inlined into `setup()`
    pub inline: bool,
    pub binding_metadata: Option<BindingMetadata>,
    pub is_builtin_component: Option<fn(&str) -> Option<RuntimeHelper>>,
    pub is_custom_element: Option<fn(&str) -> bool>,
    pub on_error: Option<DiagnosticHandler>,
    pub on_warn: Option<DiagnosticHandler>,
}

impl Default for TransformOptions {
    fn default() -> Self {
        Self {
            filename: String::const_new("template.vue"),
            prefix_identifiers: false,
            hoist_static: false,
            hoist_children_arrays: false,
            hmr: false,
            cache_handlers: false,
            scope_id: None,
            ssr: false,
            inline: false,
            binding_metadata: None,
            is_builtin_component: None,
            is_custom_element: None,
            on_error: None,
            on_warn: None,
        }
    }
}

/// Binding metadata from script setup
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BindingMetadata {
    /// Setup bindings with their types
    pub bindings: FxHashMap<std::string::String, BindingType>,
    /// Props aliases (local name -> prop key)
    #[serde(default)]
    pub props_aliases: FxHashMap<std::string::String, std::string::String>,
    /// Components and directives may resolve from these bindings
    #[serde(default)]
    pub is_script_setup: bool,
}

impl BindingMetadata {
    pub fn get(&self, name: &str) -> Option<BindingType> {
        self.bindings.get(name).copied()
    }
}

/// Binding type from script setup
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
#[repr(u8)]
pub enum BindingType {
    /// `let` in setup
    SetupLet = 0,
    /// Const that may be a ref
    SetupMaybeRef = 1,
    /// Const that is definitely a ref
    SetupRef = 2,
    /// `reactive()` const
    SetupReactiveConst = 3,
    /// Non-reactive const (functions, classes)
    SetupConst = 4,
    Props = 5,
    PropsAliased = 6,
    Data = 7,
    /// Options API (computed, methods, inject)
    Options = 8,
    LiteralConst = 9,
}

/// Codegen options
#[derive(Debug, Clone)]
pub struct CodegenOptions {
    pub mode: CodegenMode,
    pub prefix_identifiers: bool,
    /// Produce a v3 source map
    pub source_map: bool,
    pub filename: String,
    pub ssr: bool,
    pub runtime_module_name: String,
    pub runtime_global_name: String,
    pub ssr_runtime_module_name: String,
    pub inline: bool,
    pub binding_metadata: Option<BindingMetadata>,
}

impl Default for CodegenOptions {
    fn default() -> Self {
        Self {
            mode: CodegenMode::Function,
            prefix_identifiers: false,
            source_map: false,
            filename: String::const_new("template.vue"),
            ssr: false,
            runtime_module_name: String::const_new("vue"),
            runtime_global_name: String::const_new("Vue"),
            ssr_runtime_module_name: String::const_new("vue/server-renderer"),
            inline: false,
            binding_metadata: None,
        }
    }
}

/// Codegen output mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CodegenMode {
    /// Ambient-scope function (default)
    #[default]
    Function,
    /// ES module with explicit imports
    Module,
}

/// Combined compiler options
#[derive(Debug, Clone, Default)]
pub struct CompilerOptions {
    pub parser: ParserOptions,
    pub transform: TransformOptions,
    pub codegen: CodegenOptions,
}

impl CompilerOptions {
    /// Options for a module-mode compile with identifier prefixing.
    /// Transform and codegen must agree on both.
    pub fn module() -> Self {
        let mut options = Self::default();
        options.transform.prefix_identifiers = true;
        options.codegen.prefix_identifiers = true;
        options.codegen.mode = CodegenMode::Module;
        options
    }

    /// Propagates the settings shared by several phases from the transform
    /// options onto the codegen options.
    pub fn sync(&mut self) {
        if self.codegen.mode == CodegenMode::Module {
            self.transform.prefix_identifiers = true;
        }
        self.codegen.prefix_identifiers = self.transform.prefix_identifiers;
        self.codegen.ssr = self.transform.ssr;
        self.codegen.inline = self.transform.inline;
        self.codegen.filename = self.transform.filename.clone();
        self.codegen.binding_metadata = self.transform.binding_metadata.clone();
        if self.transform.on_error.is_none() {
            self.transform.on_error = self.parser.on_error;
        }
        if self.transform.on_warn.is_none() {
            self.transform.on_warn = self.parser.on_warn;
        }
        if self.transform.is_builtin_component.is_none() {
            self.transform.is_builtin_component = self.parser.is_builtin_component;
        }
        if self.transform.is_custom_element.is_none() {
            self.transform.is_custom_element = self.parser.is_custom_element;
        }
    }
}
