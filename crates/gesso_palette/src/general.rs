//! String casing and name classification helpers.

use crate::String;
use phf::phf_set;

/// `foo-bar` -> `fooBar`
pub fn camelize(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut upper_next = false;
    for c in s.chars() {
        if upper_next {
            upper_next = false;
            if c.is_ascii_alphanumeric() || c == '_' {
                out.extend(c.to_uppercase());
                continue;
            }
            out.push('-');
        }
        if c == '-' {
            upper_next = true;
        } else {
            out.push(c);
        }
    }
    if upper_next {
        out.push('-');
    }
    out
}

/// `foo` -> `Foo`
pub fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => {
            let mut out = String::with_capacity(s.len());
            out.extend(first.to_uppercase());
            out.push_str(chars.as_str());
            out
        }
        None => String::default(),
    }
}

/// `fooBar` -> `foo-bar`
pub fn hyphenate(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 4);
    for (i, c) in s.char_indices() {
        if c.is_ascii_uppercase() {
            if i > 0 {
                out.push('-');
            }
            out.push(c.to_ascii_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}

/// `click` -> `onClick`, empty input stays empty.
pub fn to_handler_key(event: &str) -> String {
    if event.is_empty() {
        return String::default();
    }
    let mut out = String::const_new("on");
    out.push_str(&capitalize(event));
    out
}

/// Listener prop keys: `on` followed by anything but a lowercase letter.
pub fn is_on(key: &str) -> bool {
    let bytes = key.as_bytes();
    bytes.len() > 2 && bytes[0] == b'o' && bytes[1] == b'n' && !bytes[2].is_ascii_lowercase()
}

pub fn is_vnode_hook(key: &str) -> bool {
    key.starts_with("onVnode")
}

static RESERVED_PROPS: phf::Set<&'static str> = phf_set! {
    "",
    "key",
    "ref",
    "ref_for",
    "ref_key",
    "onVnodeBeforeMount",
    "onVnodeMounted",
    "onVnodeBeforeUpdate",
    "onVnodeUpdated",
    "onVnodeBeforeUnmount",
    "onVnodeUnmounted",
};

/// Props the runtime consumes itself instead of passing them through.
pub fn is_reserved_prop(key: &str) -> bool {
    RESERVED_PROPS.contains(key)
}

static BUILTIN_DIRECTIVES: phf::Set<&'static str> = phf_set! {
    "bind", "cloak", "else-if", "else", "for", "html", "if",
    "model", "on", "once", "pre", "show", "slot", "text", "memo",
};

pub fn is_builtin_directive(name: &str) -> bool {
    BUILTIN_DIRECTIVES.contains(name)
}

static GLOBALS_ALLOWED: phf::Set<&'static str> = phf_set! {
    "Infinity", "undefined", "NaN", "isFinite", "isNaN", "parseFloat",
    "parseInt", "decodeURI", "decodeURIComponent", "encodeURI",
    "encodeURIComponent", "Math", "Number", "Date", "Array", "Object",
    "Boolean", "String", "RegExp", "Map", "Set", "JSON", "Intl", "BigInt",
    "console", "Error", "Symbol",
};

/// Globals a template expression may read without going through `_ctx`.
pub fn is_globally_allowed(name: &str) -> bool {
    GLOBALS_ALLOWED.contains(name)
}

/// Identifiers that are literal values.
pub fn is_literal_whitelisted(name: &str) -> bool {
    matches!(name, "true" | "false" | "null" | "this")
}

/// `[A-Za-z_$][\w$]*`
pub fn is_simple_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' || c == '$' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
}
