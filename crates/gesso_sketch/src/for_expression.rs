//! `v-for` expression decomposition: `<alias> in|of <source>`.

use gesso_canvas::{ConstantType, ExpressionNode, ForParseResult, SimpleExpressionNode};
use gesso_palette::Bump;

/// Splits a `v-for` value into source and aliases. Returns `None` when the
/// `in`/`of` separator is missing.
///
/// Accepted alias forms: `value`, `(value)`, `(value, key)`,
/// `(value, key, index)`; destructuring patterns are kept verbatim.
pub fn parse_for_expression<'a>(
    allocator: &'a Bump,
    input: &SimpleExpressionNode,
) -> Option<ForParseResult<'a>> {
    let exp = input.content.as_str();
    let (lhs, rhs_start) = split_alias(exp)?;

    let alias = |content: &str, offset: usize| {
        ExpressionNode::simple(
            allocator,
            content,
            false,
            input.loc.inner(offset, content.len()),
            ConstantType::NotConstant,
        )
    };

    let rhs = &exp[rhs_start..];
    let source_content = rhs.trim();
    let source = alias(source_content, rhs_start + (rhs.len() - rhs.trim_start().len()));

    let trimmed = lhs.trim();
    let unwrapped = trimmed.strip_prefix('(').unwrap_or(trimmed);
    let unwrapped = unwrapped.strip_suffix(')').unwrap_or(unwrapped);
    let mut value_content = unwrapped.trim();
    let value_offset = lhs.find(value_content).unwrap_or(0);

    let mut key = None;
    let mut index = None;
    if let Some((comma, key_raw, index_raw)) = split_iterator(value_content) {
        let full_value = value_content;
        value_content = full_value[..comma].trim();

        let key_content = key_raw.trim();
        let mut key_end = None;
        if !key_content.is_empty() {
            let from = value_offset + value_content.len();
            if let Some(offset) = find_from(exp, key_content, from) {
                key = Some(alias(key_content, offset));
                key_end = Some(offset + key_content.len());
            }
        }
        if let Some(index_raw) = index_raw {
            let index_content = index_raw.trim();
            if !index_content.is_empty() {
                let from = key_end.unwrap_or(value_offset + value_content.len());
                if let Some(offset) = find_from(exp, index_content, from) {
                    index = Some(alias(index_content, offset));
                }
            }
        }
    }

    let value = (!value_content.is_empty()).then(|| alias(value_content, value_offset));

    Some(ForParseResult {
        source,
        value,
        key,
        index,
    })
}

/// Finds the first `\s+(in|of)\s+`; returns the alias side and the offset
/// where the source side starts.
fn split_alias(exp: &str) -> Option<(&str, usize)> {
    let bytes = exp.as_bytes();
    let is_ws = |b: u8| b.is_ascii_whitespace() || b == b'\x0b';
    for (i, b) in bytes.iter().enumerate() {
        if !is_ws(*b) {
            continue;
        }
        let mut j = i;
        while j < bytes.len() && is_ws(bytes[j]) {
            j += 1;
        }
        let keyword = &bytes[j..];
        if !(keyword.starts_with(b"in") || keyword.starts_with(b"of")) {
            continue;
        }
        let mut k = j + 2;
        if k >= bytes.len() || !is_ws(bytes[k]) {
            continue;
        }
        while k < bytes.len() && is_ws(bytes[k]) {
            k += 1;
        }
        return Some((&exp[..i], k));
    }
    None
}

/// Matches `,([^,}\]]*)(?:,([^,}\]]*))?$` at the leftmost possible comma.
fn split_iterator(value: &str) -> Option<(usize, &str, Option<&str>)> {
    let bytes = value.as_bytes();
    let segment_end = |from: usize| {
        from + bytes[from..]
            .iter()
            .take_while(|b| !matches!(b, b',' | b'}' | b']'))
            .count()
    };
    for (comma, b) in bytes.iter().enumerate() {
        if *b != b',' {
            continue;
        }
        let key_end = segment_end(comma + 1);
        if key_end == bytes.len() {
            return Some((comma, &value[comma + 1..], None));
        }
        if bytes[key_end] == b',' {
            let index_end = segment_end(key_end + 1);
            if index_end == bytes.len() {
                return Some((comma, &value[comma + 1..key_end], Some(&value[key_end + 1..])));
            }
        }
    }
    None
}

fn find_from(haystack: &str, needle: &str, from: usize) -> Option<usize> {
    haystack.get(from..)?.find(needle).map(|i| i + from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use gesso_canvas::{Position, SourceLocation};

    fn exp(content: &str) -> SimpleExpressionNode {
        let start = Position::new(10, 1, 11);
        SimpleExpressionNode::new(
            content,
            false,
            SourceLocation::new(start, start.advanced(content), content),
            ConstantType::NotConstant,
        )
    }

    fn text(node: &ExpressionNode<'_>) -> String {
        node.as_simple().map(|s| s.content.to_string()).unwrap_or_default()
    }

    #[test]
    fn test_simple_alias() {
        let allocator = Bump::new();
        let result = parse_for_expression(&allocator, &exp("item in items")).unwrap();
        assert_eq!(text(&result.source), "items");
        assert_eq!(text(result.value.as_ref().unwrap()), "item");
        assert!(result.key.is_none());
        assert!(result.index.is_none());
        assert_eq!(result.source.loc().start.offset, 18);
    }

    #[test]
    fn test_full_triple_with_of() {
        let allocator = Bump::new();
        let result =
            parse_for_expression(&allocator, &exp("(value, key, index) of object")).unwrap();
        assert_eq!(text(result.value.as_ref().unwrap()), "value");
        assert_eq!(text(result.key.as_ref().unwrap()), "key");
        assert_eq!(text(result.index.as_ref().unwrap()), "index");
        assert_eq!(text(&result.source), "object");
        assert_eq!(result.key.as_ref().unwrap().loc().source, "key");
        assert_eq!(result.index.as_ref().unwrap().loc().start.offset, 23);
    }

    #[test]
    fn test_destructured_value() {
        let allocator = Bump::new();
        let result = parse_for_expression(&allocator, &exp("({ id, name }, i) in list")).unwrap();
        assert_eq!(text(result.value.as_ref().unwrap()), "{ id, name }");
        assert_eq!(text(result.key.as_ref().unwrap()), "i");
    }

    #[test]
    fn test_missing_separator() {
        let allocator = Bump::new();
        assert!(parse_for_expression(&allocator, &exp("items")).is_none());
        assert!(parse_for_expression(&allocator, &exp("item inside")).is_none());
    }

    #[test]
    fn test_skipped_value() {
        let allocator = Bump::new();
        let result = parse_for_expression(&allocator, &exp("(, i) in 5")).unwrap();
        assert!(result.value.is_none());
        assert_eq!(text(result.key.as_ref().unwrap()), "i");
    }
}
