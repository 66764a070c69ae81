//! Compiler diagnostics.
//!
//! Every diagnostic is recoverable: parsers and transforms record a
//! `CompilerError` and carry on with a best-effort repair.

use crate::SourceLocation;
use gesso_palette::String;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Diagnostic codes. Parser codes follow the HTML tokenizer error names,
/// `X*` codes are compiler specific.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u16)]
pub enum ErrorCode {
    // Parser
    AbruptClosingOfEmptyComment = 0,
    CdataInHtmlContent,
    DuplicateAttribute,
    EndTagWithAttributes,
    EndTagWithTrailingSolidus,
    EofBeforeTagName,
    EofInCdata,
    EofInComment,
    EofInScriptHtmlCommentLikeText,
    EofInTag,
    IncorrectlyClosedComment,
    IncorrectlyOpenedComment,
    InvalidFirstCharacterOfTagName,
    MissingAttributeValue,
    MissingEndTagName,
    MissingWhitespaceBetweenAttributes,
    NestedComment,
    UnexpectedCharacterInAttributeName,
    UnexpectedCharacterInUnquotedAttributeValue,
    UnexpectedEqualsSignBeforeAttributeName,
    UnexpectedNullCharacter,
    UnexpectedQuestionMarkInsteadOfTagName,
    UnexpectedSolidusInTag,

    // Template structure
    XInvalidEndTag = 23,
    XMissingEndTag,
    XMissingInterpolationEnd,
    XMissingDirectiveName,
    XMissingDynamicDirectiveArgumentEnd,

    // Transforms
    XVIfNoExpression = 28,
    XVIfSameKey,
    XVElseNoAdjacentIf,
    XVForNoExpression,
    XVForMalformedExpression,
    XVForTemplateKeyPlacement,
    XVBindNoExpression,
    XVOnNoExpression,
    XVSlotUnexpectedDirectiveOnSlotOutlet,
    XVSlotMixedSlotUsage,
    XVSlotDuplicateSlotNames,
    XVSlotExtraneousDefaultSlotChildren,
    XVSlotMisplaced,
    XVModelNoExpression,
    XVModelMalformedExpression,
    XVModelOnScopeVariable,
    XVModelOnProps,
    XInvalidExpression,
    XKeepAliveInvalidChildren,

    // Warnings
    WarnVIfVForPrecedence = 50,

    // DOM platform
    XVHtmlNoExpression = 53,
    XVHtmlWithChildren,
    XVTextNoExpression,
    XVTextWithChildren,
    XVModelOnInvalidElement,
    XVModelArgOnElement,
    XVModelOnFileInputElement,
    XVModelUnnecessaryValue,
    XVShowNoExpression,
    XTransitionInvalidChildren,
    XIgnoredSideEffectTag,

    // Server rendering
    XSsrUnsafeAttrName = 65,
    XSsrNoTeleportTarget,
    XSsrInvalidAstNode,
}

impl ErrorCode {
    pub fn message(&self) -> &'static str {
        match self {
            Self::AbruptClosingOfEmptyComment => "Illegal comment.",
            Self::CdataInHtmlContent => "CDATA section is allowed only in XML context.",
            Self::DuplicateAttribute => "Duplicate attribute.",
            Self::EndTagWithAttributes => "End tag cannot have attributes.",
            Self::EndTagWithTrailingSolidus => "Illegal '/' in tags.",
            Self::EofBeforeTagName => "Unexpected EOF in tag.",
            Self::EofInCdata => "Unexpected EOF in CDATA section.",
            Self::EofInComment => "Unexpected EOF in comment.",
            Self::EofInScriptHtmlCommentLikeText => "Unexpected EOF in script.",
            Self::EofInTag => "Unexpected EOF in tag.",
            Self::IncorrectlyClosedComment => "Incorrectly closed comment.",
            Self::IncorrectlyOpenedComment => "Incorrectly opened comment.",
            Self::InvalidFirstCharacterOfTagName => "Illegal tag name. Use '&lt;' to print '<'.",
            Self::MissingAttributeValue => "Attribute value was expected.",
            Self::MissingEndTagName => "End tag name was expected.",
            Self::MissingWhitespaceBetweenAttributes => "Whitespace was expected.",
            Self::NestedComment => "Unexpected '<!--' in comment.",
            Self::UnexpectedCharacterInAttributeName => {
                "Attribute name cannot contain U+0022 (\"), U+0027 ('), and U+003C (<)."
            }
            Self::UnexpectedCharacterInUnquotedAttributeValue => {
                "Unquoted attribute value cannot contain U+0022 (\"), U+0027 ('), U+003C (<), U+003D (=), and U+0060 (`)."
            }
            Self::UnexpectedEqualsSignBeforeAttributeName => {
                "Attribute name cannot start with '='."
            }
            Self::UnexpectedNullCharacter => "Unexpected null character.",
            Self::UnexpectedQuestionMarkInsteadOfTagName => "'<?' is allowed only in XML context.",
            Self::UnexpectedSolidusInTag => "Illegal '/' in tags.",
            Self::XInvalidEndTag => "Invalid end tag.",
            Self::XMissingEndTag => "Element is missing end tag.",
            Self::XMissingInterpolationEnd => "Interpolation end sign was not found.",
            Self::XMissingDirectiveName => "Legal directive name was expected.",
            Self::XMissingDynamicDirectiveArgumentEnd => {
                "End bracket for dynamic directive argument was not found. Note that dynamic directive argument cannot contain spaces."
            }
            Self::XVIfNoExpression => "v-if/v-else-if is missing expression.",
            Self::XVIfSameKey => "v-if/else branches must use unique keys.",
            Self::XVElseNoAdjacentIf => "v-else/v-else-if has no adjacent v-if or v-else-if.",
            Self::XVForNoExpression => "v-for is missing expression.",
            Self::XVForMalformedExpression => "v-for has invalid expression.",
            Self::XVForTemplateKeyPlacement => "<template v-for> key should be placed on the <template> tag.",
            Self::XVBindNoExpression => "v-bind is missing expression.",
            Self::XVOnNoExpression => "v-on is missing expression.",
            Self::XVSlotUnexpectedDirectiveOnSlotOutlet => "Unexpected custom directive on <slot> outlet.",
            Self::XVSlotMixedSlotUsage => {
                "Mixed v-slot usage on both the component and nested <template>. When there are multiple named slots, all slots should use <template> syntax to avoid scope ambiguity."
            }
            Self::XVSlotDuplicateSlotNames => "Duplicate slot names found.",
            Self::XVSlotExtraneousDefaultSlotChildren => {
                "Extraneous children found when component already has explicitly named default slot. These children will be ignored."
            }
            Self::XVSlotMisplaced => "v-slot can only be used on components or <template> tags.",
            Self::XVModelNoExpression => "v-model is missing expression.",
            Self::XVModelMalformedExpression => "v-model value must be a valid JavaScript member expression.",
            Self::XVModelOnScopeVariable => {
                "v-model cannot be used on v-for or v-slot scope variables because they are not writable."
            }
            Self::XVModelOnProps => {
                "v-model cannot be used on a prop, because local prop bindings are not writable. Use a v-bind binding combined with a v-on listener that emits update:x event instead."
            }
            Self::XInvalidExpression => "Error parsing JavaScript expression.",
            Self::XKeepAliveInvalidChildren => "<KeepAlive> expects exactly one child component.",
            Self::WarnVIfVForPrecedence => {
                "v-if takes higher precedence than v-for when both are used on the same element. Use a wrapping <template> instead."
            }
            Self::XVHtmlNoExpression => "v-html is missing expression.",
            Self::XVHtmlWithChildren => "v-html will override element children.",
            Self::XVTextNoExpression => "v-text is missing expression.",
            Self::XVTextWithChildren => "v-text will override element children.",
            Self::XVModelOnInvalidElement => "v-model can only be used on <input>, <textarea> and <select> elements.",
            Self::XVModelArgOnElement => "v-model argument is not supported on plain elements.",
            Self::XVModelOnFileInputElement => {
                "v-model cannot be used on file inputs since they are read-only. Use a v-on:change listener instead."
            }
            Self::XVModelUnnecessaryValue => {
                "Unnecessary value binding used alongside v-model. It will interfere with v-model's behavior."
            }
            Self::XVShowNoExpression => "v-show is missing expression.",
            Self::XTransitionInvalidChildren => "<Transition> expects exactly one child element or component.",
            Self::XIgnoredSideEffectTag => {
                "Tags with side effect (<script> and <style>) are ignored in client component templates."
            }
            Self::XSsrUnsafeAttrName => "Unsafe attribute name for SSR.",
            Self::XSsrNoTeleportTarget => "Missing the 'to' prop on teleport element.",
            Self::XSsrInvalidAstNode => "Invalid AST node during SSR transform.",
        }
    }

    /// Reported through the warning channel instead of the error list
    pub fn is_warning(&self) -> bool {
        matches!(self, Self::WarnVIfVForPrecedence)
    }
}

/// A recorded diagnostic
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
#[error("{message}")]
pub struct CompilerError {
    pub code: ErrorCode,
    pub loc: Option<SourceLocation>,
    pub message: String,
}

impl CompilerError {
    pub fn new(code: ErrorCode, loc: Option<SourceLocation>) -> Self {
        Self {
            code,
            loc,
            message: String::const_new(code.message()),
        }
    }

    /// Same code with extra detail appended to the stock message
    pub fn with_detail(code: ErrorCode, loc: Option<SourceLocation>, detail: &str) -> Self {
        let mut message = String::const_new(code.message());
        if !detail.is_empty() {
            message.push(' ');
            message.push_str(detail);
        }
        Self { code, loc, message }
    }
}
