//! Directive attribute-name grammar.
//!
//! ```text
//! v-name[:arg][.mod...]    :arg   .arg   @arg   #arg
//! ```
//!
//! where `arg` is either `[dynamic]` or a run of anything but `.`.

/// Pieces of a directive attribute name
#[derive(Debug, PartialEq, Eq)]
pub(crate) struct DirectiveName<'s> {
    /// Name after `v-`, if written in long form
    pub name: Option<&'s str>,
    /// Raw argument text (brackets included) and its byte offset
    pub arg: Option<(&'s str, usize)>,
    /// Trailing `.mod.mod` text
    pub rest: Option<&'s str>,
}

/// `^(v-[A-Za-z0-9-]|:|\.|@|#)`
pub(crate) fn is_directive_attr(name: &str) -> bool {
    let bytes = name.as_bytes();
    match bytes.first() {
        Some(b':' | b'.' | b'@' | b'#') => true,
        Some(b'v') => {
            bytes.get(1) == Some(&b'-')
                && bytes
                    .get(2)
                    .is_some_and(|b| b.is_ascii_alphanumeric() || *b == b'-')
        }
        _ => false,
    }
}

pub(crate) fn split_directive(raw: &str) -> DirectiveName<'_> {
    let bytes = raw.as_bytes();
    let mut i = 0;
    let mut name = None;

    if raw.starts_with("v-") {
        let len = bytes[2..]
            .iter()
            .take_while(|b| b.is_ascii_alphanumeric() || **b == b'-')
            .count();
        if len > 0 {
            name = Some(&raw[2..2 + len]);
            i = 2 + len;
        }
    }

    let mut arg = None;
    let marker = bytes.get(i).copied();
    let opens_arg = marker == Some(b':') || (i == 0 && matches!(marker, Some(b'.' | b'@' | b'#')));
    if opens_arg {
        let start = i + 1;
        let end = arg_end(bytes, start);
        if end > start {
            arg = Some((&raw[start..end], start));
            i = end;
        }
    }

    let rest = (i < raw.len()).then(|| &raw[i..]);
    DirectiveName { name, arg, rest }
}

/// End of `\[[^\]]+\]` or, failing that, of `[^.]+`
fn arg_end(bytes: &[u8], start: usize) -> usize {
    if bytes.get(start) == Some(&b'[') {
        if let Some(close) = bytes[start + 1..].iter().position(|b| *b == b']') {
            if close > 0 {
                return start + 1 + close + 1;
            }
        }
    }
    start
        + bytes[start..]
            .iter()
            .take_while(|b| **b != b'.')
            .count()
}

/// Splits `.a.b` into `["a", "b"]`
pub(crate) fn modifiers_of(rest: &str) -> impl Iterator<Item = &str> {
    rest.get(1..).unwrap_or("").split('.')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_long_form() {
        let d = split_directive("v-on:click.stop.prevent");
        assert_eq!(d.name, Some("on"));
        assert_eq!(d.arg, Some(("click", 5)));
        assert_eq!(d.rest, Some(".stop.prevent"));
        assert_eq!(modifiers_of(d.rest.unwrap()).collect::<Vec<_>>(), vec!["stop", "prevent"]);
    }

    #[test]
    fn test_shorthands() {
        assert_eq!(
            split_directive(":title"),
            DirectiveName { name: None, arg: Some(("title", 1)), rest: None }
        );
        assert_eq!(split_directive("@update:model-value").arg, Some(("update:model-value", 1)));
        assert_eq!(split_directive(".id").arg, Some(("id", 1)));
        let slot = split_directive("#item.name");
        assert_eq!(slot.arg, Some(("item", 1)));
        assert_eq!(slot.rest, Some(".name"));
    }

    #[test]
    fn test_dynamic_arg() {
        let d = split_directive("v-bind:[key.path].camel");
        assert_eq!(d.arg, Some(("[key.path]", 7)));
        assert_eq!(d.rest, Some(".camel"));

        // unterminated bracket falls back to the plain form
        let d = split_directive(":[foo");
        assert_eq!(d.arg, Some(("[foo", 1)));
    }

    #[test]
    fn test_no_arg() {
        let d = split_directive("v-model.trim");
        assert_eq!(d.name, Some("model"));
        assert_eq!(d.arg, None);
        assert_eq!(d.rest, Some(".trim"));
        assert!(is_directive_attr("v-if"));
        assert!(!is_directive_attr("v-"));
        assert!(!is_directive_attr("value"));
    }
}
