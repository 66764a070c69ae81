//! Template expressions read through the OXC JavaScript parser.
//!
//! Finds the identifiers an expression reads so they can be rewritten to
//! `_ctx.` access, the names a parameter list binds, and the shape checks
//! `v-on` and `v-model` need (member path, function).

use gesso_palette::{FxHashSet, String};
use oxc_allocator::Allocator as OxcAllocator;
use oxc_ast::ast::{
    ArrowFunctionExpression, AssignmentTargetPropertyIdentifier, BindingIdentifier, Expression, Function,
    IdentifierReference, ObjectProperty,
};
use oxc_ast_visit::{walk, Visit};
use oxc_parser::Parser;
use oxc_span::SourceType;
use oxc_syntax::scope::ScopeFlags;

/// An identifier read by an expression
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScannedIdentifier {
    pub start: usize,
    pub end: usize,
    /// Shorthand `{ foo }` or `({ foo } = x)`, needs a `foo: ` key on rewrite
    pub shorthand: bool,
    /// Bound inside the expression itself (parameter or declaration)
    pub local: bool,
}

/// First syntax error the parser reported
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanError {
    pub message: String,
}

impl ScanError {
    fn first<E: std::fmt::Display>(errors: &[E]) -> Self {
        let message = errors
            .first()
            .map_or_else(|| String::from("invalid expression"), |err| String::from(err.to_string()));
        Self { message }
    }
}

fn source_type() -> SourceType {
    SourceType::default().with_module(true)
}

/// Identifiers read by the expression `source`, in source order
pub fn scan_identifiers(source: &str) -> Result<std::vec::Vec<ScannedIdentifier>, ScanError> {
    let allocator = OxcAllocator::default();
    let expression = Parser::new(&allocator, source, source_type())
        .parse_expression()
        .map_err(|errors| ScanError::first(&errors))?;
    let mut collector = IdentifierCollector::new();
    collector.visit_expression(&expression);
    Ok(collector.finish())
}

/// Identifiers read by a statement list such as `foo(); bar = $event`
pub fn scan_statement_identifiers(source: &str) -> Result<std::vec::Vec<ScannedIdentifier>, ScanError> {
    let allocator = OxcAllocator::default();
    let parsed = Parser::new(&allocator, source, source_type()).parse();
    if !parsed.errors.is_empty() {
        return Err(ScanError::first(&parsed.errors));
    }
    let mut collector = IdentifierCollector::new();
    collector.visit_program(&parsed.program);
    Ok(collector.finish())
}

/// Names bound by a parameter list such as `{ item, index }` or `[a, b]`
pub fn param_names(source: &str) -> Result<std::vec::Vec<String>, ScanError> {
    let wrapped = format!("({source}) => {{}}");
    let allocator = OxcAllocator::default();
    let expression = Parser::new(&allocator, &wrapped, source_type())
        .parse_expression()
        .map_err(|errors| ScanError::first(&errors))?;
    let mut names = BindingNames::default();
    if let Expression::ArrowFunctionExpression(arrow) = &expression {
        names.visit_formal_parameters(&arrow.params);
    }
    Ok(names.names)
}

/// Path usable as an assignment target: `a`, `a.b`, `a[b].c`
pub fn is_member_expression(source: &str) -> bool {
    let allocator = OxcAllocator::default();
    match Parser::new(&allocator, source, source_type()).parse_expression() {
        Ok(expression) => match expression.without_parentheses() {
            Expression::Identifier(id) => id.name.as_str() != "undefined",
            other => other.is_member_expression(),
        },
        Err(_) => false,
    }
}

/// Arrow function or function expression
pub fn is_function_expression(source: &str) -> bool {
    let allocator = OxcAllocator::default();
    match Parser::new(&allocator, source, source_type()).parse_expression() {
        Ok(expression) => matches!(
            expression.without_parentheses(),
            Expression::ArrowFunctionExpression(_) | Expression::FunctionExpression(_)
        ),
        Err(_) => false,
    }
}

struct IdentifierCollector {
    scopes: std::vec::Vec<FxHashSet<std::string::String>>,
    shorthands: FxHashSet<u32>,
    found: std::vec::Vec<ScannedIdentifier>,
}

impl IdentifierCollector {
    fn new() -> Self {
        Self {
            scopes: vec![FxHashSet::default()],
            shorthands: FxHashSet::default(),
            found: std::vec::Vec::new(),
        }
    }

    fn is_local(&self, name: &str) -> bool {
        self.scopes.iter().any(|scope| scope.contains(name))
    }

    fn finish(mut self) -> std::vec::Vec<ScannedIdentifier> {
        self.found.sort_by_key(|id| id.start);
        self.found
    }
}

impl<'a> Visit<'a> for IdentifierCollector {
    fn visit_identifier_reference(&mut self, it: &IdentifierReference<'a>) {
        self.found.push(ScannedIdentifier {
            start: it.span.start as usize,
            end: it.span.end as usize,
            shorthand: self.shorthands.contains(&it.span.start),
            local: self.is_local(it.name.as_str()),
        });
    }

    fn visit_binding_identifier(&mut self, it: &BindingIdentifier<'a>) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(it.name.to_string());
        }
    }

    fn visit_object_property(&mut self, it: &ObjectProperty<'a>) {
        if it.shorthand {
            if let Expression::Identifier(id) = &it.value {
                self.shorthands.insert(id.span.start);
            }
        }
        walk::walk_object_property(self, it);
    }

    fn visit_assignment_target_property_identifier(&mut self, it: &AssignmentTargetPropertyIdentifier<'a>) {
        self.shorthands.insert(it.binding.span.start);
        walk::walk_assignment_target_property_identifier(self, it);
    }

    fn visit_arrow_function_expression(&mut self, it: &ArrowFunctionExpression<'a>) {
        self.scopes.push(FxHashSet::default());
        walk::walk_arrow_function_expression(self, it);
        self.scopes.pop();
    }

    fn visit_function(&mut self, it: &Function<'a>, flags: ScopeFlags) {
        self.scopes.push(FxHashSet::default());
        walk::walk_function(self, it, flags);
        self.scopes.pop();
    }
}

/// Names bound at the top of a parameter list
#[derive(Default)]
struct BindingNames {
    names: std::vec::Vec<String>,
}

impl<'a> Visit<'a> for BindingNames {
    fn visit_binding_identifier(&mut self, it: &BindingIdentifier<'a>) {
        let name = it.name.as_str();
        if !self.names.iter().any(|n| n == name) {
            self.names.push(String::from(name));
        }
    }

    // default values may hold functions with parameters of their own
    fn visit_arrow_function_expression(&mut self, _it: &ArrowFunctionExpression<'a>) {}

    fn visit_function(&mut self, _it: &Function<'a>, _flags: ScopeFlags) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    fn refs(source: &str) -> std::vec::Vec<(&str, bool, bool)> {
        scan_identifiers(source)
            .unwrap()
            .into_iter()
            .map(|id| (&source[id.start..id.end], id.shorthand, id.local))
            .collect()
    }

    fn free(source: &str) -> std::vec::Vec<&str> {
        refs(source)
            .into_iter()
            .filter(|(_, _, local)| !local)
            .map(|(name, _, _)| name)
            .collect()
    }

    #[test]
    fn test_member_access() {
        assert_eq!(free("foo.bar.baz"), vec!["foo"]);
        assert_eq!(free("a?.b[c]"), vec!["a", "c"]);
        assert_eq!(free("list.map(x => x.id)"), vec!["list"]);
    }

    #[test]
    fn test_object_literals() {
        assert_eq!(free("{ a: b, [c]: d }"), vec!["b", "c", "d"]);
        assert_eq!(refs("{ foo, bar: 1 }"), vec![("foo", true, false)]);
        assert_eq!(free("{ a: x ? y : z }"), vec!["x", "y", "z"]);
    }

    #[test]
    fn test_destructuring_assignment() {
        assert_eq!(
            refs("({ a = d } = o)"),
            vec![("a", true, false), ("d", false, false), ("o", false, false)]
        );
        assert_eq!(free("[x, y] = pair"), vec!["x", "y", "pair"]);
    }

    #[test]
    fn test_arrow_and_function_params() {
        assert_eq!(refs("(a, b) => a + c"), vec![("a", false, true), ("c", false, false)]);
        assert_eq!(free("({ id }) => select(id)"), vec!["select"]);
        assert_eq!(free("function (e) { go(e, x) }"), vec!["go", "x"]);
        assert_eq!(free("(a = dflt) => a"), vec!["dflt"]);
        assert_eq!(free("[1, 2].map(n => n * k), n"), vec!["k", "n"]);
    }

    #[test]
    fn test_literals_and_keywords() {
        assert_eq!(free("'a' + \"b\" + 1.5e-3 + c"), vec!["c"]);
        assert_eq!(free("`hi ${name}!` + tail"), vec!["name", "tail"]);
        assert_eq!(free("typeof x === 'string' && this.y"), vec!["x"]);
        assert_eq!(free("/ab+c/i.test(s)"), vec!["s"]);
        assert_eq!(free("a / b / c"), vec!["a", "b", "c"]);
        assert!(free("true ? null : false").is_empty());
    }

    #[test]
    fn test_statements() {
        let source = "foo(); bar = $event";
        let names: std::vec::Vec<&str> = scan_statement_identifiers(source)
            .unwrap()
            .into_iter()
            .map(|id| &source[id.start..id.end])
            .collect();
        assert_eq!(names, vec!["foo", "bar", "$event"]);

        let source = "const t = v; use(t)";
        let free: std::vec::Vec<&str> = scan_statement_identifiers(source)
            .unwrap()
            .into_iter()
            .filter(|id| !id.local)
            .map(|id| &source[id.start..id.end])
            .collect();
        assert_eq!(free, vec!["v", "use"]);
        assert!(scan_identifiers(source).is_err());
    }

    #[test]
    fn test_param_names() {
        assert_eq!(param_names("{ item, index }").unwrap(), vec!["item", "index"]);
        assert_eq!(param_names("{ item: { name }, rest = 1 }").unwrap(), vec!["name", "rest"]);
        assert_eq!(param_names("[a, b]").unwrap(), vec!["a", "b"]);
        assert_eq!(param_names("props").unwrap(), vec!["props"]);
        assert_eq!(param_names("{ cb = (x) => x }").unwrap(), vec!["cb"]);
    }

    #[test]
    fn test_invalid() {
        assert!(scan_identifiers("foo(").is_err());
        assert!(scan_identifiers("'abc").is_err());
        assert!(scan_identifiers("a)").is_err());
        assert!(scan_identifiers("`${a`").is_err());
        assert!(scan_identifiers("a b").is_err());
        assert!(scan_identifiers("a + (b * c)").is_ok());
    }

    #[test]
    fn test_member_expressions() {
        assert!(is_member_expression("foo"));
        assert!(is_member_expression("foo.bar"));
        assert!(is_member_expression("foo[bar].baz"));
        assert!(is_member_expression("foo['a b']"));
        assert!(is_member_expression(" (foo).bar "));
        assert!(!is_member_expression("a b"));
        assert!(!is_member_expression("foo.bar baz"));
        assert!(!is_member_expression("foo()"));
        assert!(!is_member_expression("a + b"));
        assert!(!is_member_expression("1"));
        assert!(!is_member_expression("undefined"));
        assert!(!is_member_expression(""));
    }

    #[test]
    fn test_function_expressions() {
        assert!(is_function_expression("() => foo()"));
        assert!(is_function_expression("e => go(e)"));
        assert!(is_function_expression("async (a, b) => a"));
        assert!(is_function_expression("function (e) { go(e) }"));
        assert!(!is_function_expression("go(e)"));
        assert!(!is_function_expression("handler"));
        assert!(!is_function_expression("a >= b"));
    }
}
