//! Static `style="..."` attributes become a bound object literal so the
//! runtime patches them like `:style`.

use gesso_canvas::{ConstantType, DirectiveNode, ExpressionNode, PropNode, TemplateChildNode};
use gesso_palette::{Box, SmallVec, String};
use gesso_studio::{Cursor, Exit, TransformContext};

pub fn transform_style<'a>(ctx: &mut TransformContext<'a>, cursor: &mut Cursor<'_, 'a>) -> Exit<'a> {
    let allocator = ctx.allocator;
    let TemplateChildNode::Element(el) = cursor.node_mut() else {
        return Exit::None;
    };
    for prop in el.props.iter_mut() {
        let PropNode::Attribute(attr) = prop else { continue };
        if attr.name != "style" {
            continue;
        }
        let Some(value) = attr.value.as_ref() else { continue };
        let object = stringify_style(&parse_string_style(&value.content));
        let loc = attr.loc.clone();
        let name_loc = attr.name_loc.clone();
        *prop = PropNode::Directive(Box::new_in(
            DirectiveNode {
                name: String::const_new("bind"),
                raw_name: String::const_new(":style"),
                exp: Some(ExpressionNode::simple(allocator, object, false, loc.clone(), ConstantType::CanStringify)),
                arg: Some(ExpressionNode::simple(
                    allocator,
                    "style",
                    true,
                    name_loc,
                    ConstantType::CanStringify,
                )),
                modifiers: SmallVec::new(),
                for_parse_result: None,
                loc,
            },
            allocator,
        ));
    }
    Exit::None
}

/// `color: red; background: url(a;b)` -> declarations in source order
pub fn parse_string_style(css: &str) -> std::vec::Vec<(String, String)> {
    let css = strip_comments(css);
    let mut declarations = std::vec::Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    let mut push = |item: &str| {
        if let Some((key, value)) = item.split_once(':') {
            let (key, value) = (key.trim(), value.trim());
            if !key.is_empty() {
                declarations.push((String::from(key), String::from(value)));
            }
        }
    };
    for (i, c) in css.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            ';' if depth == 0 => {
                push(&css[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    push(&css[start..]);
    declarations
}

fn strip_comments(css: &str) -> std::borrow::Cow<'_, str> {
    if !css.contains("/*") {
        return std::borrow::Cow::Borrowed(css);
    }
    let mut out = std::string::String::with_capacity(css.len());
    let mut rest = css;
    while let Some(open) = rest.find("/*") {
        out.push_str(&rest[..open]);
        match rest[open + 2..].find("*/") {
            Some(close) => rest = &rest[open + 2 + close + 2..],
            None => {
                rest = "";
            }
        }
    }
    out.push_str(rest);
    std::borrow::Cow::Owned(out)
}

/// JSON object literal; a repeated property keeps its last value
fn stringify_style(declarations: &[(String, String)]) -> String {
    let mut unique: std::vec::Vec<(&str, &str)> = std::vec::Vec::with_capacity(declarations.len());
    for (key, value) in declarations {
        match unique.iter_mut().find(|(k, _)| *k == key.as_str()) {
            Some(entry) => entry.1 = value.as_str(),
            None => unique.push((key.as_str(), value.as_str())),
        }
    }
    let mut out = String::const_new("{");
    for (i, (key, value)) in unique.iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        out.push_str(&json_string(key));
        out.push(':');
        out.push_str(&json_string(value));
    }
    out.push('}');
    out
}

fn json_string(s: &str) -> std::string::String {
    serde_json::to_string(s).unwrap_or_else(|_| format!("{s:?}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_declarations() {
        let parsed = parse_string_style("color: red; background: url(a;b) ;; /* x: y */ margin:0");
        let pairs: std::vec::Vec<(&str, &str)> = parsed.iter().map(|(k, v)| (k.as_str(), v.as_str())).collect();
        assert_eq!(pairs, [("color", "red"), ("background", "url(a;b)"), ("margin", "0")]);
    }

    #[test]
    fn test_stringify() {
        let parsed = parse_string_style("color:red;font-family: \"A B\";color: blue");
        assert_eq!(stringify_style(&parsed), r#"{"color":"blue","font-family":"\"A B\""}"#);
    }
}
