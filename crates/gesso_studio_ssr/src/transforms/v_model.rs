//! `v-model` on native elements, rendered as the bound value.
//!
//! Inputs get `value` or `checked` from the model, a textarea gets the
//! model as content. `<select>` is left to the client directive.

use gesso_canvas::{
    Callee, ConditionalExpression, DirectiveNode, ElementNode, ErrorCode, ExpressionNode, JsNode, PropNode,
    RuntimeHelper,
};
use gesso_palette::{Box, String, Vec};

use super::element::Content;
use crate::codegen::SsrCodegen;

/// What a `v-model` adds to an element
pub(crate) struct ModelOutput<'a> {
    /// Props rendered like bound attributes
    pub props: std::vec::Vec<(&'static str, JsNode<'a>)>,
    /// Markup appended to the open tag
    pub tag_part: Option<JsNode<'a>>,
    pub content: Option<Content<'a>>,
}

impl<'a> ModelOutput<'a> {
    fn empty() -> Self {
        Self {
            props: std::vec::Vec::new(),
            tag_part: None,
            content: None,
        }
    }
}

impl<'a, 'o> SsrCodegen<'a, 'o> {
    pub(crate) fn process_model(&mut self, el: &ElementNode<'a>, dir: &DirectiveNode<'a>) -> ModelOutput<'a> {
        let allocator = self.allocator();
        let mut output = ModelOutput::empty();
        let Some(exp) = dir.exp.as_ref().filter(|exp| !exp.is_blank()) else {
            self.ctx.on_error(ErrorCode::XVModelNoExpression, Some(&dir.loc));
            return output;
        };
        let model = || JsNode::from_expression(exp.clone_in(allocator));

        match el.tag.as_str() {
            "input" => {
                let type_prop = el.find_prop("type", false, true).map(|index| &el.props[index]);
                match type_prop {
                    Some(PropNode::Attribute(attr)) => match attr.value.as_ref().map(|v| v.content.as_str()) {
                        Some("radio") => {
                            let value = self.model_value(el);
                            let checked = self.call(RuntimeHelper::SsrLooseEqual, [model(), value]);
                            output.props.push(("checked", checked));
                        }
                        Some("checkbox") => {
                            let checked = self.checkbox_checked(el, exp);
                            output.props.push(("checked", checked));
                        }
                        Some("file") => {
                            self.ctx.on_error(ErrorCode::XVModelOnFileInputElement, Some(&dir.loc));
                        }
                        _ => output.props.push(("value", model())),
                    },
                    Some(PropNode::Directive(type_dir)) => {
                        let kind = match type_dir.exp.as_ref() {
                            Some(kind) => JsNode::from_expression(kind.clone_in(allocator)),
                            None => self.code("type"),
                        };
                        let value = self.model_value(el);
                        output.tag_part =
                            Some(self.call(RuntimeHelper::SsrRenderDynamicModel, [kind, model(), value]));
                    }
                    None => output.props.push(("value", model())),
                }
            }
            "textarea" => output.content = Some(Content::Interpolated(model())),
            "select" => {}
            _ => self.ctx.on_error(ErrorCode::XVModelOnInvalidElement, Some(&dir.loc)),
        }
        tracing::trace!(tag = %el.tag, props = output.props.len(), "ssr v-model");
        output
    }

    /// `value` attribute or binding of an input, `null` without one
    fn model_value(&self, el: &ElementNode<'a>) -> JsNode<'a> {
        let allocator = self.allocator();
        match el.find_prop("value", false, false).map(|index| &el.props[index]) {
            Some(PropNode::Attribute(attr)) => {
                JsNode::string(allocator, attr.value.as_ref().map(|v| v.content.clone()).unwrap_or_default())
            }
            Some(PropNode::Directive(dir)) => match &dir.exp {
                Some(exp) => JsNode::from_expression(exp.clone_in(allocator)),
                None => self.code("null"),
            },
            None => self.code("null"),
        }
    }

    /// A checkbox with `true-value` compares against it. Otherwise an
    /// array model checks membership and anything else is truthiness.
    fn checkbox_checked(&mut self, el: &ElementNode<'a>, model: &ExpressionNode<'a>) -> JsNode<'a> {
        let allocator = self.allocator();
        let model = || JsNode::from_expression(model.clone_in(allocator));
        if let Some(index) = el.find_prop("true-value", false, false) {
            let true_value = match &el.props[index] {
                PropNode::Attribute(attr) => {
                    JsNode::string(allocator, attr.value.as_ref().map(|v| v.content.clone()).unwrap_or_default())
                }
                PropNode::Directive(dir) => match &dir.exp {
                    Some(exp) => JsNode::from_expression(exp.clone_in(allocator)),
                    None => self.code("true"),
                },
            };
            return self.call(RuntimeHelper::SsrLooseEqual, [model(), true_value]);
        }

        let mut is_array_args = Vec::new_in(allocator);
        is_array_args.push(model());
        let test = JsNode::call(allocator, Callee::Name(String::const_new("Array.isArray")), is_array_args);
        let value = self.model_value(el);
        let contains = self.call(RuntimeHelper::SsrLooseContain, [model(), value]);
        JsNode::Conditional(Box::new_in(
            ConditionalExpression {
                test,
                consequent: contains,
                alternate: model(),
                newline: false,
            },
            allocator,
        ))
    }
}
