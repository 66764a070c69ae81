//! Vue-style template parser.
//!
//! A single left-to-right recursive descent over the source. Every node
//! records its exact source range; malformed markup is reported and
//! repaired on the fly, the parser never gives up.

use gesso_canvas::{
    core_component, AttributeNode, CommentNode, CompilerError, ConstantType, DirectiveNode,
    ElementNode, ElementType, ErrorCode, ExpressionNode, InterpolationNode, Namespace, NodeType,
    ParserOptions, Position, PropNode, RootNode, SourceLocation, TemplateChildNode, TextMode,
    TextNode, WhitespaceStrategy,
};
use gesso_palette::{format_compact, Box, Bump, FxHashSet, SmallVec, String, Vec};

use crate::directive::{is_directive_attr, modifiers_of, split_directive};
use crate::for_expression::parse_for_expression;
use crate::scanner::{is_html_whitespace, Scanner};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TagKind {
    Start,
    End,
}

/// Attribute value as scanned
struct AttributeValue {
    content: String,
    is_quoted: bool,
    loc: SourceLocation,
}

/// Parser state for one template
pub struct Parser<'a> {
    allocator: &'a Bump,
    source: &'a str,
    options: ParserOptions,
    scanner: Scanner<'a>,
    /// Tags of the open elements, innermost last
    ancestors: Vec<'a, String>,
    /// Inside a tag matched by `is_pre_tag`
    in_pre: bool,
    /// Inside a `v-pre` subtree
    in_v_pre: bool,
    errors: Vec<'a, CompilerError>,
}

impl<'a> Parser<'a> {
    pub fn new(allocator: &'a Bump, source: &'a str) -> Self {
        Self::with_options(allocator, source, ParserOptions::default())
    }

    pub fn with_options(allocator: &'a Bump, source: &'a str, options: ParserOptions) -> Self {
        Self {
            allocator,
            source,
            options,
            scanner: Scanner::new(source),
            ancestors: Vec::new_in(allocator),
            in_pre: false,
            in_v_pre: false,
            errors: Vec::new_in(allocator),
        }
    }

    /// Parse the source and return the AST
    pub fn parse(mut self) -> (RootNode<'a>, Vec<'a, CompilerError>) {
        let mut root = RootNode::new(self.allocator, self.source);
        let start = self.scanner.position();
        root.children = self.parse_children(TextMode::Data, None);
        root.loc = self.scanner.selection(start);

        for error in self.errors.iter() {
            tracing::warn!(code = ?error.code, message = %error.message, "template parse error");
            if let Some(on_error) = self.options.on_error {
                on_error(error.clone());
            }
        }
        tracing::debug!(
            children = root.children.len(),
            errors = self.errors.len(),
            "parsed template"
        );
        (root, self.errors)
    }

    // ------------------------------------------------------------------
    // Children
    // ------------------------------------------------------------------

    fn parse_children(
        &mut self,
        mode: TextMode,
        parent: Option<&ElementNode<'a>>,
    ) -> Vec<'a, TemplateChildNode<'a>> {
        let ns = parent.map_or(Namespace::Html, |p| p.ns);
        let mut nodes = Vec::new_in(self.allocator);

        while !self.is_end(mode) {
            let mut node = None;

            if matches!(mode, TextMode::Data | TextMode::RcData) {
                if !self.in_v_pre && self.scanner.starts_with(&self.options.delimiters.0) {
                    node = self.parse_interpolation(mode);
                } else if mode == TextMode::Data && self.scanner.peek(0) == Some(b'<') {
                    match self.scanner.peek(1) {
                        None => self.emit_error(ErrorCode::EofBeforeTagName, 1),
                        Some(b'!') => {
                            if self.scanner.starts_with("<!--") {
                                node = Some(self.parse_comment());
                            } else if self.scanner.starts_with("<!DOCTYPE") {
                                node = Some(self.parse_bogus_comment());
                            } else if self.scanner.starts_with("<![CDATA[") {
                                if ns != Namespace::Html {
                                    let cdata = self.parse_cdata(parent);
                                    for child in cdata {
                                        push_node(&mut nodes, child);
                                    }
                                    continue;
                                }
                                self.emit_error(ErrorCode::CdataInHtmlContent, 0);
                                node = Some(self.parse_bogus_comment());
                            } else {
                                self.emit_error(ErrorCode::IncorrectlyOpenedComment, 0);
                                node = Some(self.parse_bogus_comment());
                            }
                        }
                        Some(b'/') => match self.scanner.peek(2) {
                            None => self.emit_error(ErrorCode::EofBeforeTagName, 2),
                            Some(b'>') => {
                                self.emit_error(ErrorCode::MissingEndTagName, 2);
                                self.scanner.advance_by(3);
                                continue;
                            }
                            Some(c) if c.is_ascii_alphabetic() => {
                                self.emit_error(ErrorCode::XInvalidEndTag, 0);
                                self.parse_tag(TagKind::End, parent);
                                continue;
                            }
                            Some(_) => {
                                self.emit_error(ErrorCode::InvalidFirstCharacterOfTagName, 2);
                                node = Some(self.parse_bogus_comment());
                            }
                        },
                        Some(c) if c.is_ascii_alphabetic() => {
                            let element = self.parse_element(parent);
                            node = Some(TemplateChildNode::Element(Box::new_in(
                                element,
                                self.allocator,
                            )));
                        }
                        Some(b'?') => {
                            self.emit_error(ErrorCode::UnexpectedQuestionMarkInsteadOfTagName, 1);
                            node = Some(self.parse_bogus_comment());
                        }
                        Some(_) => self.emit_error(ErrorCode::InvalidFirstCharacterOfTagName, 1),
                    }
                }
            }

            let node = match node {
                Some(node) => node,
                None => self.parse_text(mode),
            };
            push_node(&mut nodes, node);
        }

        if !matches!(mode, TextMode::RawText | TextMode::RcData) {
            self.condense_children(&mut nodes, parent);
        }
        nodes
    }

    /// Whitespace and comment policy for one finished child list
    fn condense_children(
        &self,
        nodes: &mut Vec<'a, TemplateChildNode<'a>>,
        parent: Option<&ElementNode<'a>>,
    ) {
        let condense = self.options.whitespace == WhitespaceStrategy::Condense;
        let mut dropped: SmallVec<[bool; 16]> = SmallVec::from_elem(false, nodes.len());

        for i in 0..nodes.len() {
            let prev = (i > 0 && !dropped[i - 1]).then(|| nodes[i - 1].node_type());
            let next = nodes.get(i + 1).map(|n| n.node_type());
            match &mut nodes[i] {
                TemplateChildNode::Text(text) if !self.in_pre => {
                    if is_all_whitespace(&text.content) {
                        let remove = match (prev, next) {
                            (Some(prev), Some(next)) => {
                                condense
                                    && removable_between(prev, next, text.content.contains(['\r', '\n']))
                            }
                            _ => true,
                        };
                        if remove {
                            dropped[i] = true;
                        } else {
                            text.content = String::const_new(" ");
                        }
                    } else if condense {
                        text.content = collapse_whitespace(&text.content);
                    }
                }
                TemplateChildNode::Text(text) => {
                    if text.content.contains("\r\n") {
                        text.content = String::from(text.content.replace("\r\n", "\n"));
                    }
                }
                TemplateChildNode::Comment(_) if !self.options.comments => dropped[i] = true,
                _ => {}
            }
        }

        if self.in_pre && parent.is_some_and(|p| (self.options.is_pre_tag)(&p.tag)) {
            if let Some(TemplateChildNode::Text(first)) = nodes.first_mut() {
                let stripped = first
                    .content
                    .strip_prefix("\r\n")
                    .or_else(|| first.content.strip_prefix('\n'))
                    .map(String::from);
                if let Some(stripped) = stripped {
                    first.content = stripped;
                }
            }
        }

        if dropped.iter().any(|d| *d) {
            let mut i = 0;
            nodes.retain(|_| {
                let keep = !dropped[i];
                i += 1;
                keep
            });
        }
    }

    fn is_end(&self, mode: TextMode) -> bool {
        if self.scanner.is_eof() {
            return true;
        }
        let rest = self.scanner.rest();
        match mode {
            TextMode::Data => {
                rest.starts_with("</")
                    && self
                        .ancestors
                        .iter()
                        .rev()
                        .any(|tag| starts_with_end_tag_open(rest, tag))
            }
            TextMode::RcData | TextMode::RawText => self
                .ancestors
                .last()
                .is_some_and(|tag| starts_with_end_tag_open(rest, tag)),
            TextMode::CData => rest.starts_with("]]>"),
            TextMode::AttributeValue => false,
        }
    }

    // ------------------------------------------------------------------
    // Elements
    // ------------------------------------------------------------------

    fn parse_element(&mut self, parent: Option<&ElementNode<'a>>) -> ElementNode<'a> {
        let was_in_pre = self.in_pre;
        let was_in_v_pre = self.in_v_pre;

        let mut element = self.parse_tag(TagKind::Start, parent);
        let is_pre_boundary = self.in_pre && !was_in_pre;
        let is_v_pre_boundary = self.in_v_pre && !was_in_v_pre;

        if element.is_self_closing || (self.options.is_void_tag)(&element.tag) {
            if is_pre_boundary {
                self.in_pre = false;
            }
            if is_v_pre_boundary {
                self.in_v_pre = false;
            }
            return element;
        }

        self.ancestors.push(element.tag.clone());
        let mode = (self.options.get_text_mode)(&element.tag, element.ns);
        let children = self.parse_children(mode, Some(&element));
        self.ancestors.pop();
        element.children = children;

        if starts_with_end_tag_open(self.scanner.rest(), &element.tag) {
            self.parse_tag(TagKind::End, parent);
        } else {
            self.emit_error_at(ErrorCode::XMissingEndTag, element.loc.start);
            if self.scanner.is_eof()
                && element.tag.eq_ignore_ascii_case("script")
                && element
                    .children
                    .first()
                    .is_some_and(|c| c.loc().source.starts_with("<!--"))
            {
                self.emit_error(ErrorCode::EofInScriptHtmlCommentLikeText, 0);
            }
        }

        element.loc = self.scanner.selection(element.loc.start);

        if is_pre_boundary {
            self.in_pre = false;
        }
        if is_v_pre_boundary {
            self.in_v_pre = false;
        }
        element
    }

    /// Parses `<tag ...>` or `</tag ...>`. End tags are consumed and their
    /// result discarded by the caller.
    fn parse_tag(&mut self, kind: TagKind, parent: Option<&ElementNode<'a>>) -> ElementNode<'a> {
        let start = self.scanner.position();
        let rest = self.scanner.rest();
        let open_len = if kind == TagKind::End { 2 } else { 1 };
        let name_len = rest.as_bytes()[open_len.min(rest.len())..]
            .iter()
            .take_while(|b| !is_html_whitespace(**b) && **b != b'/' && **b != b'>')
            .count();
        let tag = &rest[open_len.min(rest.len())..open_len + name_len];
        let ns = (self.options.get_namespace)(tag, parent);

        self.scanner.advance_by(open_len + name_len);
        self.scanner.advance_spaces();

        let attrs_start = self.scanner.position();
        let errors_before = self.errors.len();
        if kind == TagKind::Start && (self.options.is_pre_tag)(tag) {
            self.in_pre = true;
        }
        let mut props = self.parse_attributes(kind);

        if kind == TagKind::Start
            && !self.in_v_pre
            && props
                .iter()
                .any(|p| matches!(p, PropNode::Directive(dir) if dir.name == "pre"))
        {
            // Everything on this tag, v-pre included, is a plain attribute.
            self.in_v_pre = true;
            self.scanner.reset(attrs_start);
            self.errors.truncate(errors_before);
            props = self.parse_attributes(kind);
            props.retain(|p| !matches!(p, PropNode::Attribute(attr) if attr.name == "v-pre"));
        }

        let mut is_self_closing = false;
        if self.scanner.is_eof() {
            self.emit_error(ErrorCode::EofInTag, 0);
        } else {
            is_self_closing = self.scanner.starts_with("/>");
            if kind == TagKind::End && is_self_closing {
                self.emit_error(ErrorCode::EndTagWithTrailingSolidus, 0);
            }
            self.scanner.advance_by(if is_self_closing { 2 } else { 1 });
        }

        let mut element = ElementNode::new(self.allocator, tag, SourceLocation::STUB);
        element.ns = ns;
        element.is_self_closing = is_self_closing;
        if kind == TagKind::Start && !self.in_v_pre {
            element.tag_type = self.element_type(tag, &props);
        }
        element.props = props;
        element.loc = self.scanner.selection(start);
        element
    }

    fn element_type(&self, tag: &str, props: &[PropNode<'a>]) -> ElementType {
        if tag == "slot" {
            ElementType::Slot
        } else if tag == "template" {
            let special = props.iter().any(|p| {
                matches!(p, PropNode::Directive(dir)
                    if matches!(dir.name.as_str(), "if" | "else" | "else-if" | "for" | "slot"))
            });
            if special {
                ElementType::Template
            } else {
                ElementType::Element
            }
        } else if self.is_component(tag, props) {
            ElementType::Component
        } else {
            ElementType::Element
        }
    }

    fn is_component(&self, tag: &str, props: &[PropNode<'a>]) -> bool {
        if self.options.is_custom_element.is_some_and(|f| f(tag)) {
            return false;
        }
        if tag == "component"
            || tag.starts_with(|c: char| c.is_ascii_uppercase())
            || core_component(tag).is_some()
            || self
                .options
                .is_builtin_component
                .is_some_and(|f| f(tag).is_some())
            || self.options.is_native_tag.is_some_and(|f| !f(tag))
        {
            return true;
        }
        props.iter().any(|p| {
            matches!(p, PropNode::Attribute(attr)
                if attr.name == "is"
                    && attr.value.as_ref().is_some_and(|v| v.content.starts_with("vue:")))
        })
    }

    // ------------------------------------------------------------------
    // Attributes
    // ------------------------------------------------------------------

    fn parse_attributes(&mut self, kind: TagKind) -> Vec<'a, PropNode<'a>> {
        let mut props = Vec::new_in(self.allocator);
        let mut names: FxHashSet<&'a str> = FxHashSet::default();

        while !self.scanner.is_eof()
            && !self.scanner.starts_with(">")
            && !self.scanner.starts_with("/>")
        {
            if self.scanner.starts_with("/") {
                self.emit_error(ErrorCode::UnexpectedSolidusInTag, 0);
                self.scanner.advance_by(1);
                self.scanner.advance_spaces();
                continue;
            }
            if kind == TagKind::End {
                self.emit_error(ErrorCode::EndTagWithAttributes, 0);
            }

            let mut prop = self.parse_attribute(&mut names);
            if let PropNode::Attribute(attr) = &mut prop {
                if attr.name == "class" {
                    if let Some(value) = attr.value.as_mut() {
                        value.content = normalize_class(&value.content);
                    }
                }
            }
            if kind == TagKind::Start {
                props.push(prop);
            }

            if self
                .scanner
                .peek(0)
                .is_some_and(|b| !is_html_whitespace(b) && b != b'/' && b != b'>')
            {
                self.emit_error(ErrorCode::MissingWhitespaceBetweenAttributes, 0);
            }
            self.scanner.advance_spaces();
        }
        props
    }

    fn parse_attribute(&mut self, names: &mut FxHashSet<&'a str>) -> PropNode<'a> {
        let start = self.scanner.position();
        let rest = self.scanner.rest();
        let bytes = rest.as_bytes();
        let len = match bytes.first() {
            Some(_) => {
                1 + bytes[1..]
                    .iter()
                    .take_while(|b| !is_html_whitespace(**b) && !matches!(b, b'/' | b'>' | b'='))
                    .count()
            }
            None => 0,
        };
        let len = char_boundary_at_or_after(rest, len);
        let name = &rest[..len];

        if !names.insert(name) {
            self.emit_error(ErrorCode::DuplicateAttribute, 0);
        }
        if name.starts_with('=') {
            self.emit_error(ErrorCode::UnexpectedEqualsSignBeforeAttributeName, 0);
        }
        for (i, b) in name.bytes().enumerate() {
            if matches!(b, b'"' | b'\'' | b'<') {
                self.emit_error(ErrorCode::UnexpectedCharacterInAttributeName, i);
            }
        }
        self.scanner.advance_by(len);
        let name_loc = self.scanner.selection(start);

        let mut value = None;
        let spaces = self
            .scanner
            .rest()
            .bytes()
            .take_while(|b| is_html_whitespace(*b))
            .count();
        if self.scanner.peek(spaces) == Some(b'=') {
            self.scanner.advance_spaces();
            self.scanner.advance_by(1);
            self.scanner.advance_spaces();
            value = self.parse_attribute_value();
            if value.is_none() {
                self.emit_error(ErrorCode::MissingAttributeValue, 0);
            }
        }
        let loc = self.scanner.selection(start);

        if !self.in_v_pre && is_directive_attr(name) {
            return self.build_directive(name, name_loc, value, loc);
        }
        if !self.in_v_pre && name.starts_with("v-") {
            self.emit_error(ErrorCode::XMissingDirectiveName, 0);
        }

        PropNode::Attribute(Box::new_in(
            AttributeNode {
                name: String::from(name),
                name_loc,
                value: value.map(|v| TextNode::new(v.content, v.loc)),
                loc,
            },
            self.allocator,
        ))
    }

    fn build_directive(
        &mut self,
        raw_name: &str,
        name_loc: SourceLocation,
        value: Option<AttributeValue>,
        loc: SourceLocation,
    ) -> PropNode<'a> {
        let parts = split_directive(raw_name);
        let is_prop_shorthand = raw_name.starts_with('.');
        let name = match parts.name {
            Some(name) => name,
            None if is_prop_shorthand || raw_name.starts_with(':') => "bind",
            None if raw_name.starts_with('@') => "on",
            None => "slot",
        };
        let is_slot = name == "slot";

        let mut arg = None;
        if let Some((raw_arg, offset)) = parts.arg {
            // Slot names keep their dots.
            let extra = if is_slot { parts.rest.unwrap_or("") } else { "" };
            let arg_loc = name_loc.inner(offset, raw_arg.len() + extra.len());
            let (content, is_static) = match raw_arg.strip_prefix('[') {
                Some(inner) => match inner.strip_suffix(']') {
                    Some(inner) => (String::from(inner), false),
                    None => {
                        self.emit_error(ErrorCode::XMissingDynamicDirectiveArgumentEnd, 0);
                        (String::from(inner), false)
                    }
                },
                None if is_slot => (format_compact!("{raw_arg}{extra}"), true),
                None => (String::from(raw_arg), true),
            };
            let const_type = if is_static {
                ConstantType::CanStringify
            } else {
                ConstantType::NotConstant
            };
            arg = Some(ExpressionNode::simple(
                self.allocator,
                content,
                is_static,
                arg_loc,
                const_type,
            ));
        }

        let exp = value.map(|v| {
            let loc = if v.is_quoted {
                let source_len = v.loc.source.len();
                let closed = source_len >= 2 && v.loc.source.ends_with(&v.loc.source[..1]);
                v.loc.inner(1, source_len.saturating_sub(if closed { 2 } else { 1 }))
            } else {
                v.loc
            };
            ExpressionNode::simple(
                self.allocator,
                v.content,
                false,
                loc,
                ConstantType::NotConstant,
            )
        });

        let mut modifiers: SmallVec<[String; 2]> = SmallVec::new();
        if let Some(rest) = parts.rest {
            if !(is_slot && parts.arg.is_some()) {
                modifiers.extend(modifiers_of(rest).map(String::from));
            }
        }
        if is_prop_shorthand {
            modifiers.push(String::const_new("prop"));
        }

        let for_parse_result = match (&exp, name) {
            (Some(ExpressionNode::Simple(exp)), "for") => parse_for_expression(self.allocator, exp),
            _ => None,
        };

        PropNode::Directive(Box::new_in(
            DirectiveNode {
                name: String::from(name),
                raw_name: String::from(raw_name),
                exp,
                arg,
                modifiers,
                for_parse_result,
                loc,
            },
            self.allocator,
        ))
    }

    fn parse_attribute_value(&mut self) -> Option<AttributeValue> {
        let start = self.scanner.position();
        let quote = self.scanner.peek(0);
        let is_quoted = matches!(quote, Some(b'"' | b'\''));

        let content = if is_quoted {
            self.scanner.advance_by(1);
            let quote = if quote == Some(b'"') { "\"" } else { "'" };
            match self.scanner.find(quote, 0) {
                Some(end) => {
                    let content = self.parse_text_data(end, TextMode::AttributeValue);
                    self.scanner.advance_by(1);
                    content
                }
                None => {
                    let len = self.scanner.rest().len();
                    self.parse_text_data(len, TextMode::AttributeValue)
                }
            }
        } else {
            let rest = self.scanner.rest();
            let len = rest
                .bytes()
                .take_while(|b| !is_html_whitespace(*b) && *b != b'>')
                .count();
            if len == 0 {
                return None;
            }
            for (i, b) in rest[..len].bytes().enumerate() {
                if matches!(b, b'"' | b'\'' | b'<' | b'=' | b'`') {
                    self.emit_error(ErrorCode::UnexpectedCharacterInUnquotedAttributeValue, i);
                }
            }
            self.parse_text_data(len, TextMode::AttributeValue)
        };

        Some(AttributeValue {
            content,
            is_quoted,
            loc: self.scanner.selection(start),
        })
    }

    // ------------------------------------------------------------------
    // Text-like nodes
    // ------------------------------------------------------------------

    fn parse_interpolation(&mut self, mode: TextMode) -> Option<TemplateChildNode<'a>> {
        let open_len = self.options.delimiters.0.len();
        let close_len = self.options.delimiters.1.len();
        let Some(close_index) = self.scanner.find(&self.options.delimiters.1, open_len) else {
            self.emit_error(ErrorCode::XMissingInterpolationEnd, 0);
            return None;
        };

        let start = self.scanner.position();
        self.scanner.advance_by(open_len);
        let inner_pos = self.scanner.position();
        let raw_len = close_index - open_len;
        let raw = &self.scanner.rest()[..raw_len];
        let trimmed = raw.trim();
        let inner_start = inner_pos.advanced(&raw[..raw.len() - raw.trim_start().len()]);
        let inner_end = inner_start.advanced(trimmed);
        let content = if mode != TextMode::RawText && trimmed.contains('&') {
            (self.options.decode_entities)(trimmed, false)
        } else {
            String::from(trimmed)
        };
        self.scanner.advance_by(raw_len + close_len);

        let exp = ExpressionNode::simple(
            self.allocator,
            content,
            false,
            self.scanner.selection_between(inner_start, inner_end),
            ConstantType::NotConstant,
        );
        Some(TemplateChildNode::Interpolation(Box::new_in(
            InterpolationNode {
                content: exp,
                loc: self.scanner.selection(start),
            },
            self.allocator,
        )))
    }

    fn parse_text(&mut self, mode: TextMode) -> TemplateChildNode<'a> {
        let mut end = self.scanner.rest().len();
        if mode == TextMode::CData {
            if let Some(i) = self.scanner.find("]]>", 1) {
                end = end.min(i);
            }
        } else {
            if let Some(i) = self.scanner.find("<", 1) {
                end = end.min(i);
            }
            if let Some(i) = self.scanner.find(&self.options.delimiters.0, 1) {
                end = end.min(i);
            }
        }

        let start = self.scanner.position();
        let content = self.parse_text_data(end, mode);
        TemplateChildNode::Text(Box::new_in(
            TextNode::new(content, self.scanner.selection(start)),
            self.allocator,
        ))
    }

    /// Consumes `len` bytes, decoding entities where the mode allows.
    fn parse_text_data(&mut self, len: usize, mode: TextMode) -> String {
        let rest = self.scanner.rest();
        let raw = &rest[..len.min(rest.len())];
        self.scanner.advance_by(raw.len());
        if matches!(mode, TextMode::RawText | TextMode::CData) || !raw.contains('&') {
            String::from(raw)
        } else {
            (self.options.decode_entities)(raw, mode == TextMode::AttributeValue)
        }
    }

    fn parse_comment(&mut self) -> TemplateChildNode<'a> {
        let start = self.scanner.position();
        let rest = self.scanner.rest();

        let content = match find_comment_close(rest) {
            None => {
                self.scanner.advance_by(rest.len());
                self.emit_error(ErrorCode::EofInComment, 0);
                rest.get(4..).unwrap_or("")
            }
            Some((index, close_len, has_bang)) => {
                if index <= 3 {
                    self.emit_error(ErrorCode::AbruptClosingOfEmptyComment, 0);
                }
                if has_bang {
                    self.emit_error(ErrorCode::IncorrectlyClosedComment, 0);
                }
                let body = &rest[..index];
                let mut from = 1;
                while let Some(nested) = body.get(from..).and_then(|s| s.find("<!--")) {
                    let nested = nested + from;
                    if nested + 4 < body.len() {
                        self.emit_error(ErrorCode::NestedComment, nested);
                    }
                    from = nested + 1;
                }
                self.scanner.advance_by(index + close_len);
                rest.get(4..index).unwrap_or("")
            }
        };

        TemplateChildNode::Comment(Box::new_in(
            CommentNode {
                content: String::from(content),
                loc: self.scanner.selection(start),
            },
            self.allocator,
        ))
    }

    /// `<!DOCTYPE ...>`, `<?...>` and other markup that is kept as a comment
    fn parse_bogus_comment(&mut self) -> TemplateChildNode<'a> {
        let start = self.scanner.position();
        let rest = self.scanner.rest();
        let content_start = if rest.as_bytes().get(1) == Some(&b'?') { 1 } else { 2 };
        let content = match self.scanner.find(">", 0) {
            Some(close) => {
                self.scanner.advance_by(close + 1);
                rest.get(content_start..close).unwrap_or("")
            }
            None => {
                self.scanner.advance_by(rest.len());
                rest.get(content_start..).unwrap_or("")
            }
        };
        TemplateChildNode::Comment(Box::new_in(
            CommentNode {
                content: String::from(content),
                loc: self.scanner.selection(start),
            },
            self.allocator,
        ))
    }

    fn parse_cdata(&mut self, parent: Option<&ElementNode<'a>>) -> Vec<'a, TemplateChildNode<'a>> {
        self.scanner.advance_by("<![CDATA[".len());
        let nodes = self.parse_children(TextMode::CData, parent);
        if self.scanner.is_eof() {
            self.emit_error(ErrorCode::EofInCdata, 0);
        } else {
            self.scanner.advance_by(3);
        }
        nodes
    }

    // ------------------------------------------------------------------
    // Errors
    // ------------------------------------------------------------------

    /// Records an error `offset` bytes past the cursor
    fn emit_error(&mut self, code: ErrorCode, offset: usize) {
        let mut pos = self.scanner.position();
        pos.offset += offset as u32;
        pos.column += offset as u32;
        self.emit_error_at(code, pos);
    }

    fn emit_error_at(&mut self, code: ErrorCode, pos: Position) {
        self.errors.push(CompilerError::new(
            code,
            Some(SourceLocation::new(pos, pos, "")),
        ));
    }
}

/// Appends a node, merging it into a directly preceding text node.
fn push_node<'a>(nodes: &mut Vec<'a, TemplateChildNode<'a>>, node: TemplateChildNode<'a>) {
    if let TemplateChildNode::Text(text) = &node {
        if let Some(TemplateChildNode::Text(prev)) = nodes.last_mut() {
            if prev.loc.end.offset == text.loc.start.offset {
                prev.content.push_str(&text.content);
                prev.loc.end = text.loc.end;
                prev.loc.source.push_str(&text.loc.source);
                return;
            }
        }
    }
    nodes.push(node);
}

/// Whether whitespace-only text between `prev` and `next` goes away
fn removable_between(prev: NodeType, next: NodeType, has_newline: bool) -> bool {
    use NodeType::{Comment, Element};
    match (prev, next) {
        (Comment, Comment) | (Comment, Element) | (Element, Comment) => true,
        (Element, Element) => has_newline,
        _ => false,
    }
}

fn is_all_whitespace(s: &str) -> bool {
    s.bytes().all(is_html_whitespace)
}

/// Runs of HTML whitespace become one space
fn collapse_whitespace(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut in_space = false;
    for c in s.chars() {
        if c.is_ascii() && is_html_whitespace(c as u8) {
            if !in_space {
                out.push(' ');
            }
            in_space = true;
        } else {
            out.push(c);
            in_space = false;
        }
    }
    out
}

fn normalize_class(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for (i, part) in s.split_whitespace().enumerate() {
        if i > 0 {
            out.push(' ');
        }
        out.push_str(part);
    }
    out
}

/// `</tag` followed by whitespace, `/`, `>` or the end of input
fn starts_with_end_tag_open(source: &str, tag: &str) -> bool {
    source.starts_with("</")
        && source
            .get(2..2 + tag.len())
            .is_some_and(|t| t.eq_ignore_ascii_case(tag))
        && source
            .as_bytes()
            .get(2 + tag.len())
            .map_or(true, |b| is_html_whitespace(*b) || *b == b'/' || *b == b'>')
}

/// Leftmost `--!?>`: `(index, length, has_bang)`
fn find_comment_close(s: &str) -> Option<(usize, usize, bool)> {
    let bytes = s.as_bytes();
    let mut from = 0;
    while let Some(i) = memchr::memmem::find(&bytes[from..], b"--") {
        let idx = from + i;
        match bytes.get(idx + 2) {
            Some(b'>') => return Some((idx, 3, false)),
            Some(b'!') if bytes.get(idx + 3) == Some(&b'>') => return Some((idx, 4, true)),
            _ => from = idx + 1,
        }
    }
    None
}

fn char_boundary_at_or_after(s: &str, mut i: usize) -> usize {
    while i < s.len() && !s.is_char_boundary(i) {
        i += 1;
    }
    i.min(s.len())
}

/// Parse a template with default options
pub fn parse<'a>(allocator: &'a Bump, source: &'a str) -> (RootNode<'a>, Vec<'a, CompilerError>) {
    Parser::new(allocator, source).parse()
}

/// Parse a template with platform options
pub fn parse_with_options<'a>(
    allocator: &'a Bump,
    source: &'a str,
    options: ParserOptions,
) -> (RootNode<'a>, Vec<'a, CompilerError>) {
    Parser::with_options(allocator, source, options).parse()
}
