//! Parser settings for browser templates.

use gesso_canvas::{ElementNode, Namespace, ParserOptions, PropNode, RuntimeHelper, TextMode};
use gesso_palette::{is_native_tag, is_void_tag, phf_set, PhfSet, String};

/// Tags whose content is verbatim text in HTML
static RAW_TEXT_TAGS: PhfSet<&'static str> = phf_set! {
    "style", "iframe", "script", "noscript", "xmp", "noembed", "noframes",
};

/// Parser options with HTML namespaces, text modes and the full entity table
pub fn dom_parser_options() -> ParserOptions {
    ParserOptions {
        is_void_tag,
        is_native_tag: Some(is_native_tag),
        is_pre_tag: |tag| tag == "pre",
        is_builtin_component: Some(builtin_component),
        get_namespace,
        get_text_mode,
        decode_entities,
        ..ParserOptions::default()
    }
}

/// `Transition` and `TransitionGroup`, in either casing
pub fn builtin_component(tag: &str) -> Option<RuntimeHelper> {
    match tag {
        "Transition" | "transition" => Some(RuntimeHelper::Transition),
        "TransitionGroup" | "transition-group" => Some(RuntimeHelper::TransitionGroup),
        _ => None,
    }
}

pub fn get_namespace(tag: &str, parent: Option<&ElementNode<'_>>) -> Namespace {
    let mut ns = parent.map_or(Namespace::Html, |p| p.ns);
    if let Some(parent) = parent {
        match ns {
            Namespace::MathMl if parent.tag == "annotation-xml" => {
                if tag == "svg" {
                    return Namespace::Svg;
                }
                if has_html_encoding(parent) {
                    ns = Namespace::Html;
                }
            }
            Namespace::MathMl => {
                if is_math_text_integration_point(&parent.tag) && tag != "mglyph" && tag != "malignmark" {
                    ns = Namespace::Html;
                }
            }
            Namespace::Svg => {
                if matches!(parent.tag.as_str(), "foreignObject" | "desc" | "title") {
                    ns = Namespace::Html;
                }
            }
            Namespace::Html => {}
        }
    }

    if ns == Namespace::Html {
        match tag {
            "svg" => return Namespace::Svg,
            "math" => return Namespace::MathMl,
            _ => {}
        }
    }
    ns
}

/// `mi`, `mo`, `mn`, `ms` and `mtext`
fn is_math_text_integration_point(tag: &str) -> bool {
    matches!(tag, "mi" | "mo" | "mn" | "ms" | "mtext")
}

fn has_html_encoding(el: &ElementNode<'_>) -> bool {
    el.props.iter().any(|prop| match prop {
        PropNode::Attribute(attr) => {
            attr.name == "encoding"
                && attr
                    .value
                    .as_ref()
                    .is_some_and(|v| matches!(v.content.as_str(), "text/html" | "application/xhtml+xml"))
        }
        PropNode::Directive(_) => false,
    })
}

pub fn get_text_mode(tag: &str, ns: Namespace) -> TextMode {
    if ns != Namespace::Html {
        return TextMode::Data;
    }
    match tag {
        "textarea" | "title" => TextMode::RcData,
        _ if RAW_TEXT_TAGS.contains(tag) => TextMode::RawText,
        _ => TextMode::Data,
    }
}

/// Named and numeric character references from the HTML table.
/// Attribute values keep `&name` followed by `=` or an alphanumeric
/// character literal.
pub fn decode_entities(raw: &str, in_attribute: bool) -> String {
    if !raw.contains('&') {
        return String::from(raw);
    }
    let decoded = if in_attribute {
        htmlize::unescape_attribute(raw)
    } else {
        htmlize::unescape(raw)
    };
    String::from(decoded.as_ref())
}

#[cfg(test)]
mod tests {
    use super::*;
    use gesso_canvas::SourceLocation;
    use gesso_palette::Bump;

    fn element<'a>(allocator: &'a Bump, tag: &str, ns: Namespace) -> ElementNode<'a> {
        let mut el = ElementNode::new(allocator, tag, SourceLocation::STUB);
        el.ns = ns;
        el
    }

    #[test]
    fn test_namespace_switches() {
        let allocator = Bump::new();
        assert_eq!(get_namespace("svg", None), Namespace::Svg);
        assert_eq!(get_namespace("math", None), Namespace::MathMl);

        let svg = element(&allocator, "svg", Namespace::Svg);
        assert_eq!(get_namespace("circle", Some(&svg)), Namespace::Svg);

        let foreign = element(&allocator, "foreignObject", Namespace::Svg);
        assert_eq!(get_namespace("div", Some(&foreign)), Namespace::Html);

        let mi = element(&allocator, "mi", Namespace::MathMl);
        assert_eq!(get_namespace("span", Some(&mi)), Namespace::Html);
        assert_eq!(get_namespace("mglyph", Some(&mi)), Namespace::MathMl);

        let annotation = element(&allocator, "annotation-xml", Namespace::MathMl);
        assert_eq!(get_namespace("svg", Some(&annotation)), Namespace::Svg);
    }

    #[test]
    fn test_text_modes() {
        assert_eq!(get_text_mode("textarea", Namespace::Html), TextMode::RcData);
        assert_eq!(get_text_mode("script", Namespace::Html), TextMode::RawText);
        assert_eq!(get_text_mode("div", Namespace::Html), TextMode::Data);
        assert_eq!(get_text_mode("title", Namespace::Svg), TextMode::Data);
    }

    #[test]
    fn test_named_entities() {
        assert_eq!(decode_entities("a&nbsp;b", false), "a\u{a0}b");
        assert_eq!(decode_entities("&copy; &amp;", false), "\u{a9} &");
        assert_eq!(decode_entities("plain", true), "plain");
    }

    #[test]
    fn test_builtin_components() {
        assert_eq!(builtin_component("transition"), Some(RuntimeHelper::Transition));
        assert_eq!(builtin_component("TransitionGroup"), Some(RuntimeHelper::TransitionGroup));
        assert_eq!(builtin_component("KeepAlive"), None);
    }
}
