//! Plain elements rendered as markup.
//!
//! Attributes render straight into the open tag unless the element can
//! receive props it cannot see at compile time (fallthrough `_attrs`,
//! `v-bind="obj"`, a dynamic argument or a custom directive). Those go
//! through one `_ssrRenderAttrs(...)` call instead.

use gesso_canvas::{
    Callee, ConditionalExpression, ConstantType, DirectiveNode, ElementNode, ErrorCode, JsNode, Namespace, PropNode,
    Property, RuntimeHelper,
};
use gesso_palette::{
    camelize, is_boolean_attr, is_builtin_directive, is_reserved_prop, is_void_tag, phf_map, Box, PhfMap, String, Vec,
};
use gesso_studio::transforms::props::{bind_shorthand_exp, build_props, PropsTarget};
use gesso_studio::transforms::transform_expression::process_expression;
use gesso_studio::transforms::utils::to_valid_asset_id;

use crate::codegen::SsrCodegen;

/// DOM property names whose attribute is spelled differently
static PROPS_TO_ATTRS: PhfMap<&'static str, &'static str> = phf_map! {
    "acceptCharset" => "accept-charset",
    "className" => "class",
    "htmlFor" => "for",
    "httpEquiv" => "http-equiv",
};

/// Element content supplied by a prop or directive instead of children
pub(crate) enum Content<'a> {
    /// Unescaped HTML (`v-html`, `:innerHTML`)
    Raw(JsNode<'a>),
    /// Escaped at runtime (`v-text`, `:textContent`, textarea values)
    Interpolated(JsNode<'a>),
    /// A static `value` of a textarea
    Static(String),
}

/// Attribute names the server renderer writes without quoting checks
pub fn is_ssr_safe_attr_name(name: &str) -> bool {
    !name.is_empty()
        && !name
            .chars()
            .any(|c| matches!(c, '>' | '/' | '=' | '"' | '\'' | '\u{0009}' | '\u{000a}' | '\u{000c}' | ' '))
}

/// Attribute name for the bound prop `key` on `el`
fn attr_name_of(el: &ElementNode<'_>, key: &str) -> String {
    if let Some(mapped) = PROPS_TO_ATTRS.get(key) {
        return String::from(*mapped);
    }
    if el.ns == Namespace::Html && !el.tag.contains('-') {
        String::from(key.to_ascii_lowercase())
    } else {
        String::from(key)
    }
}

impl<'a, 'o> SsrCodegen<'a, 'o> {
    pub(crate) fn process_element(&mut self, el: &mut ElementNode<'a>) {
        self.push_str("<");
        self.push_str(&el.tag);
        let content = if self.needs_merged_attrs(el) {
            self.render_merged_attrs(el)
        } else {
            self.render_attrs(el)
        };
        let options = self.options;
        if let Some(scope_id) = &options.scope_id {
            self.push_str(" ");
            self.push_str(scope_id);
        }
        self.push_str(">");
        if is_void_tag(&el.tag) {
            return;
        }

        match content {
            Some(Content::Raw(node)) => self.push_expr(node),
            Some(Content::Interpolated(node)) => {
                let call = self.call(RuntimeHelper::SsrInterpolate, [node]);
                self.push_expr(call);
            }
            Some(Content::Static(text)) => self.push_str(&htmlize::escape_all_quotes(text.as_str())),
            None => self.process_children(&mut el.children, false),
        }
        self.push_str("</");
        self.push_str(&el.tag);
        self.push_str(">");
    }

    fn needs_merged_attrs(&self, el: &ElementNode<'a>) -> bool {
        self.takes_fallthrough(el.loc.start.offset)
            || el.props.iter().any(|prop| match prop {
                PropNode::Directive(dir) => {
                    (dir.name == "bind" && dir.static_arg().is_none()) || !is_builtin_directive(&dir.name)
                }
                PropNode::Attribute(_) => false,
            })
    }

    /// `${_ssrRenderAttrs(_mergeProps(...))}`
    fn render_merged_attrs(&mut self, el: &ElementNode<'a>) -> Option<Content<'a>> {
        let allocator = self.allocator();
        let only: std::vec::Vec<usize> = el
            .props
            .iter()
            .enumerate()
            .filter(|(_, prop)| match prop {
                PropNode::Attribute(_) => true,
                PropNode::Directive(dir) => dir.name == "bind",
            })
            .map(|(index, _)| index)
            .collect();
        let result = build_props(
            &mut self.ctx,
            el,
            Some(&only),
            PropsTarget {
                ssr: true,
                ..Default::default()
            },
        );

        let mut args = std::vec::Vec::new();
        if let Some(props) = result.props {
            self.flatten_merge_args(props, &mut args);
        }

        let mut content = self.content_directives(el);
        let mut tag_part = None;
        for prop in el.props.iter() {
            let PropNode::Directive(dir) = prop else { continue };
            match dir.name.as_str() {
                "show" => {
                    if let Some(style) = self.show_style(dir) {
                        args.push(single_prop(allocator, "style", style));
                    }
                }
                "model" => {
                    let model = self.process_model(el, dir);
                    if !model.props.is_empty() {
                        let mut properties = Vec::new_in(allocator);
                        for (key, value) in model.props {
                            properties.push(Property::named(allocator, key, value));
                        }
                        args.push(JsNode::object(allocator, properties));
                    }
                    tag_part = tag_part.or(model.tag_part);
                    content = content.or(model.content);
                }
                name if !is_builtin_directive(name) => {
                    let props = self.directive_props(dir);
                    args.push(props);
                }
                _ => {}
            }
        }
        if self.takes_fallthrough(el.loc.start.offset) {
            args.push(self.code("_attrs"));
        }

        let attrs = match args.len() {
            0 => None,
            1 => args.pop(),
            _ => Some(self.call(RuntimeHelper::MergeProps, args)),
        };
        if let Some(attrs) = attrs {
            let rendered = self.call(RuntimeHelper::SsrRenderAttrs, [attrs]);
            self.push_expr(rendered);
        }
        if let Some(part) = tag_part {
            self.push_expr(part);
        }
        content
    }

    /// Spread an existing `mergeProps(...)` into the outer argument list
    pub(crate) fn flatten_merge_args(&mut self, props: JsNode<'a>, args: &mut std::vec::Vec<JsNode<'a>>) {
        match props {
            JsNode::Call(mut call) if matches!(call.callee, Callee::Helper(RuntimeHelper::MergeProps)) => {
                self.ctx.remove_helper(RuntimeHelper::MergeProps);
                let inner = std::mem::replace(&mut call.arguments, Vec::new_in(self.allocator()));
                args.extend(inner);
            }
            props => args.push(props),
        }
    }

    /// `_ssrGetDirectiveProps(_ctx, _directive_name, exp, arg, modifiers)`
    fn directive_props(&mut self, dir: &DirectiveNode<'a>) -> JsNode<'a> {
        let allocator = self.allocator();
        self.ctx.helper(RuntimeHelper::ResolveDirective);
        self.ctx.add_directive(&dir.name);

        let mut arguments = std::vec::Vec::new();
        arguments.push(self.code("_ctx"));
        arguments.push(self.code(&to_valid_asset_id(&dir.name, "directive")));
        let has_modifiers = !dir.modifiers.is_empty();
        if dir.exp.is_some() || dir.arg.is_some() || has_modifiers {
            arguments.push(match &dir.exp {
                Some(exp) => JsNode::from_expression(exp.clone_in(allocator)),
                None => self.code("void 0"),
            });
        }
        if dir.arg.is_some() || has_modifiers {
            arguments.push(match (&dir.arg, dir.static_arg()) {
                (_, Some(arg)) => JsNode::string(allocator, arg),
                (Some(arg), None) => JsNode::from_expression(arg.clone_in(allocator)),
                (None, None) => self.code("void 0"),
            });
        }
        if has_modifiers {
            let mut properties = Vec::new_in(allocator);
            for modifier in dir.modifiers.iter() {
                properties.push(Property::named(
                    allocator,
                    modifier.clone(),
                    JsNode::simple(allocator, "true", ConstantType::CanStringify),
                ));
            }
            arguments.push(JsNode::object(allocator, properties));
        }
        self.call(RuntimeHelper::SsrGetDirectiveProps, arguments)
    }

    /// Content from `v-html` or `v-text`
    fn content_directives(&mut self, el: &ElementNode<'a>) -> Option<Content<'a>> {
        let allocator = self.allocator();
        let mut content = None;
        for prop in el.props.iter() {
            let PropNode::Directive(dir) = prop else { continue };
            let (missing, with_children) = match dir.name.as_str() {
                "html" => (ErrorCode::XVHtmlNoExpression, ErrorCode::XVHtmlWithChildren),
                "text" => (ErrorCode::XVTextNoExpression, ErrorCode::XVTextWithChildren),
                _ => continue,
            };
            let Some(exp) = dir.exp.as_ref().filter(|exp| !exp.is_blank()) else {
                self.ctx.on_error(missing, Some(&dir.loc));
                continue;
            };
            if !el.children.is_empty() {
                self.ctx.on_error(with_children, Some(&dir.loc));
            }
            let node = JsNode::from_expression(exp.clone_in(allocator));
            content = Some(if dir.name == "html" {
                Content::Raw(node)
            } else {
                Content::Interpolated(node)
            });
        }
        content
    }

    /// `(exp) ? null : { display: "none" }`
    pub(crate) fn show_style(&mut self, dir: &DirectiveNode<'a>) -> Option<JsNode<'a>> {
        let allocator = self.allocator();
        let Some(exp) = &dir.exp else {
            self.ctx.on_error(ErrorCode::XVShowNoExpression, Some(&dir.loc));
            return None;
        };
        Some(JsNode::Conditional(Box::new_in(
            ConditionalExpression {
                test: JsNode::from_expression(exp.clone_in(allocator)),
                consequent: self.code("null"),
                alternate: single_prop(allocator, "display", JsNode::string(allocator, "none")),
                newline: false,
            },
            allocator,
        )))
    }

    /// Value of a bound prop, reading the argument for `:foo` shorthand
    fn bind_value(&mut self, dir: &DirectiveNode<'a>) -> Option<JsNode<'a>> {
        let allocator = self.allocator();
        if let Some(exp) = dir.exp.as_ref().filter(|exp| !exp.is_blank()) {
            return Some(JsNode::from_expression(exp.clone_in(allocator)));
        }
        match bind_shorthand_exp(allocator, dir) {
            Some(shorthand) => Some(JsNode::from_expression(process_expression(&mut self.ctx, shorthand))),
            None => {
                self.ctx.on_error(ErrorCode::XVBindNoExpression, Some(&dir.loc));
                None
            }
        }
    }

    /// Attributes written one by one into the open tag
    fn render_attrs(&mut self, el: &ElementNode<'a>) -> Option<Content<'a>> {
        let allocator = self.allocator();
        let is_textarea = el.tag == "textarea";
        let static_class = el
            .props
            .iter()
            .find_map(|prop| match prop {
                PropNode::Attribute(attr) if attr.name == "class" => attr.value.as_ref().map(|v| v.content.clone()),
                _ => None,
            });
        let has_dynamic_class = el.find_prop("class", true, true).is_some();

        let (style_at, sources) = self.style_sources(el);
        let mut style_sources = Some(sources);
        let mut content = self.content_directives(el);

        for (index, prop) in el.props.iter().enumerate() {
            match prop {
                PropNode::Attribute(attr) => {
                    let name = attr.name.as_str();
                    match name {
                        "key" | "ref" => continue,
                        "value" if is_textarea => {
                            if let Some(value) = &attr.value {
                                content = Some(Content::Static(value.content.clone()));
                            }
                            continue;
                        }
                        "class" if has_dynamic_class => continue,
                        "style" if style_at.is_some() => continue,
                        _ => {}
                    }
                    self.push_str(" ");
                    self.push_str(name);
                    if let Some(value) = &attr.value {
                        self.push_str("=\"");
                        self.push_str(&htmlize::escape_all_quotes(value.content.as_str()));
                        self.push_str("\"");
                    }
                }
                PropNode::Directive(dir) if dir.name == "bind" => {
                    let Some(arg) = dir.static_arg() else { continue };
                    let key = if dir.has_modifier("camel") {
                        camelize(arg)
                    } else {
                        String::from(arg)
                    };
                    match key.as_str() {
                        "style" => {
                            if let Some(sources) = style_sources.take().filter(|_| style_at == Some(index)) {
                                self.render_style(sources);
                            }
                            continue;
                        }
                        "key" | "ref" => continue,
                        _ => {}
                    }
                    let Some(value) = self.bind_value(dir) else { continue };
                    match key.as_str() {
                        "class" => {
                            let value = match &static_class {
                                Some(class) => {
                                    let mut elements = Vec::new_in(allocator);
                                    elements.push(value);
                                    elements.push(JsNode::string(allocator, class.clone()));
                                    JsNode::array(allocator, elements)
                                }
                                None => value,
                            };
                            self.push_str(" class=\"");
                            let call = self.call(RuntimeHelper::SsrRenderClass, [value]);
                            self.push_expr(call);
                            self.push_str("\"");
                        }
                        "innerHTML" => content = Some(Content::Raw(value)),
                        "textContent" => content = Some(Content::Interpolated(value)),
                        "value" if is_textarea => content = Some(Content::Interpolated(value)),
                        _ => self.render_bound_attr(el, &key, value, &dir.loc),
                    }
                }
                PropNode::Directive(dir) if dir.name == "show" => {
                    if let Some(sources) = style_sources.take().filter(|_| style_at == Some(index)) {
                        self.render_style(sources);
                    }
                }
                PropNode::Directive(dir) if dir.name == "model" => {
                    let model = self.process_model(el, dir);
                    for (key, value) in model.props {
                        self.render_bound_attr(el, key, value, &dir.loc);
                    }
                    if let Some(part) = model.tag_part {
                        self.push_expr(part);
                    }
                    content = content.or(model.content);
                }
                PropNode::Directive(_) => {}
            }
        }
        content
    }

    /// One bound attribute: boolean attributes render by truthiness, the
    /// rest through `_ssrRenderAttr`
    fn render_bound_attr(
        &mut self,
        el: &ElementNode<'a>,
        key: &str,
        value: JsNode<'a>,
        loc: &gesso_canvas::SourceLocation,
    ) {
        if is_reserved_prop(key) {
            return;
        }
        let name = attr_name_of(el, key);
        if is_boolean_attr(&name) {
            let allocator = self.allocator();
            let test = self.call(RuntimeHelper::SsrIncludeBooleanAttr, [value]);
            let mut present = String::from(" ");
            present.push_str(&name);
            let conditional = JsNode::Conditional(Box::new_in(
                ConditionalExpression {
                    test,
                    consequent: JsNode::string(allocator, present),
                    alternate: JsNode::string(allocator, ""),
                    newline: false,
                },
                allocator,
            ));
            self.push_expr(conditional);
        } else if is_ssr_safe_attr_name(&name) {
            let allocator = self.allocator();
            let call = self.call(RuntimeHelper::SsrRenderAttr, [JsNode::string(allocator, name), value]);
            self.push_expr(call);
        } else {
            tracing::warn!(attr = %name, "unsafe attribute name");
            self.ctx.on_error(ErrorCode::XSsrUnsafeAttrName, Some(loc));
        }
    }

    /// Where the combined `style` renders (the first `:style` or `v-show`)
    /// and what goes into it. A static style joins at the end.
    fn style_sources(&mut self, el: &ElementNode<'a>) -> (Option<usize>, std::vec::Vec<JsNode<'a>>) {
        let allocator = self.allocator();
        let mut at = None;
        let mut sources = std::vec::Vec::new();
        let mut static_style = None;
        for (index, prop) in el.props.iter().enumerate() {
            let source = match prop {
                PropNode::Attribute(attr) => {
                    if attr.name == "style" {
                        static_style = attr.value.as_ref().map(|v| JsNode::string(allocator, v.content.clone()));
                    }
                    continue;
                }
                PropNode::Directive(dir) if dir.name == "bind" && dir.static_arg() == Some("style") => {
                    self.bind_value(dir)
                }
                PropNode::Directive(dir) if dir.name == "show" => self.show_style(dir),
                PropNode::Directive(_) => continue,
            };
            if let Some(source) = source {
                at = at.or(Some(index));
                sources.push(source);
            }
        }
        if at.is_some() {
            sources.extend(static_style);
        }
        (at, sources)
    }

    /// ` style="${_ssrRenderStyle(...)}"`
    fn render_style(&mut self, mut sources: std::vec::Vec<JsNode<'a>>) {
        let allocator = self.allocator();
        let value = if sources.len() == 1 {
            sources.remove(0)
        } else {
            let mut elements = Vec::new_in(allocator);
            elements.extend(sources);
            JsNode::array(allocator, elements)
        };
        self.push_str(" style=\"");
        let call = self.call(RuntimeHelper::SsrRenderStyle, [value]);
        self.push_expr(call);
        self.push_str("\"");
    }
}

/// `{ key: value }`
fn single_prop<'a>(allocator: &'a gesso_palette::Bump, key: &str, value: JsNode<'a>) -> JsNode<'a> {
    let mut properties = Vec::new_in(allocator);
    properties.push(Property::named(allocator, key, value));
    JsNode::object(allocator, properties)
}
