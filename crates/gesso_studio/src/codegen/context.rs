//! Code buffer with indentation and source position tracking.

use gesso_canvas::{CodegenOptions, RuntimeHelper, SourceLocation};
use gesso_palette::{is_simple_identifier, String};

use super::source_map::SourceMapBuilder;

pub(crate) const PURE_ANNOTATION: &str = "/*#__PURE__*/";

/// Output of [`generate`](crate::codegen::generate)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CodegenResult {
    /// Complete module or function source
    pub code: std::string::String,
    /// Imports, helper bindings and hoisted constants. Part of `code`
    /// unless the render function is inlined.
    pub preamble: std::string::String,
    /// Source map (JSON)
    pub map: Option<std::string::String>,
}

pub struct CodegenContext<'o> {
    pub(crate) options: &'o CodegenOptions,
    code: std::string::String,
    indent_level: u32,
    /// Annotate calls as side-effect free (hoisted constants)
    pub(crate) pure: bool,
    /// 0-based generated line
    line: u32,
    /// 0-based generated column, in UTF-16 code units
    column: u32,
    map: Option<SourceMapBuilder>,
}

impl<'o> CodegenContext<'o> {
    pub fn new(options: &'o CodegenOptions, source: Option<&str>) -> Self {
        let map = match source {
            Some(source) if options.source_map => Some(SourceMapBuilder::new(options.filename.clone(), source)),
            _ => None,
        };
        Self {
            options,
            code: std::string::String::with_capacity(4096),
            indent_level: 0,
            pure: false,
            line: 0,
            column: 0,
            map,
        }
    }

    #[inline]
    pub fn push(&mut self, code: &str) {
        if self.map.is_some() {
            self.advance(code);
        }
        self.code.push_str(code);
    }

    /// Push code produced from `loc`. Non-stub locations are mapped at both
    /// ends; a named identifier (`foo` or `_ctx.foo`) records `foo`.
    pub fn push_mapped(&mut self, code: &str, loc: &SourceLocation, named: bool) {
        if self.map.is_none() || loc.is_stub() {
            self.push(code);
            return;
        }
        let name = if named {
            let bare = code.strip_prefix("_ctx.").unwrap_or(code);
            is_simple_identifier(bare).then_some(bare)
        } else {
            None
        };
        self.add_mapping(loc.start.line, loc.start.column, name);
        self.push(code);
        self.add_mapping(loc.end.line, loc.end.column, None);
    }

    fn add_mapping(&mut self, source_line: u32, source_column: u32, name: Option<&str>) {
        let (line, column) = (self.line, self.column);
        if let Some(map) = self.map.as_mut() {
            map.add_mapping(
                line,
                column,
                source_line.saturating_sub(1),
                source_column.saturating_sub(1),
                name,
            );
        }
    }

    fn advance(&mut self, code: &str) {
        for c in code.chars() {
            if c == '\n' {
                self.line += 1;
                self.column = 0;
            } else {
                self.column += c.len_utf16() as u32;
            }
        }
    }

    pub fn newline(&mut self) {
        self.push("\n");
        for _ in 0..self.indent_level {
            self.push("  ");
        }
    }

    /// One level deeper, on a new line
    pub fn indent(&mut self) {
        self.indent_level += 1;
        self.newline();
    }

    pub fn deindent(&mut self, with_newline: bool) {
        self.indent_level = self.indent_level.saturating_sub(1);
        if with_newline {
            self.newline();
        }
    }

    /// Adjust the level without emitting a line break
    pub(crate) fn shift(&mut self, deeper: bool) {
        if deeper {
            self.indent_level += 1;
        } else {
            self.indent_level = self.indent_level.saturating_sub(1);
        }
    }

    pub fn push_pure(&mut self) {
        if self.pure {
            self.push(PURE_ANNOTATION);
        }
    }

    /// Local alias of a runtime helper: `_createVNode`
    pub fn helper(&self, helper: RuntimeHelper) -> String {
        let mut alias = String::const_new("_");
        alias.push_str(helper.name());
        alias
    }

    pub fn push_helper(&mut self, helper: RuntimeHelper) {
        self.push("_");
        self.push(helper.name());
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn into_parts(self) -> (std::string::String, Option<std::string::String>) {
        let map = self.map.as_ref().and_then(SourceMapBuilder::to_json);
        (self.code, map)
    }
}

/// JSON-compatible double-quoted string literal
pub fn js_string(s: &str) -> std::string::String {
    fn push_hex4(out: &mut std::string::String, value: u32) {
        const HEX: &[u8; 16] = b"0123456789abcdef";
        out.push_str("\\u");
        for shift in [12, 8, 4, 0] {
            out.push(HEX[((value >> shift) & 0xF) as usize] as char);
        }
    }

    let mut out = std::string::String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\x08' => out.push_str("\\b"),
            '\x0C' => out.push_str("\\f"),
            // line terminators inside JS string literals
            '\u{2028}' | '\u{2029}' => push_hex4(&mut out, c as u32),
            c if c.is_control() => push_hex4(&mut out, c as u32),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}
