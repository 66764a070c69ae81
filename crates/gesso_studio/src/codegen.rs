//! Render function code generation.
//!
//! Emits, in order: helper imports or destructuring, hoisted constants,
//! the function signature, asset resolution, temp declarations and the
//! returned root node. Function mode reads helpers off a global runtime
//! object; module mode imports them.

mod context;
mod node;
pub mod source_map;

pub use context::{js_string, CodegenContext, CodegenResult};
pub use node::{gen_node, gen_template_child, Owner};

use gesso_canvas::{CodegenMode, CodegenOptions, ImportItem, RootNode, RuntimeHelper};

use crate::transforms::utils::to_valid_asset_id;

/// Helpers whose aliases hoisted constants may use outside `with (_ctx)`
const STATIC_HELPERS: [RuntimeHelper; 4] = [
    RuntimeHelper::CreateVNode,
    RuntimeHelper::CreateElementVNode,
    RuntimeHelper::CreateComment,
    RuntimeHelper::CreateText,
];

/// Generate render code for a transformed root
pub fn generate(root: &RootNode<'_>, options: &CodegenOptions) -> CodegenResult {
    let mut ctx = CodegenContext::new(options, Some(root.source.as_str()));
    let (ssr_helpers, helpers): (std::vec::Vec<RuntimeHelper>, std::vec::Vec<RuntimeHelper>) =
        root.helpers.iter().copied().partition(RuntimeHelper::is_ssr);
    let use_with_block = !options.prefix_identifiers && options.mode != CodegenMode::Module;

    tracing::debug!(
        mode = ?options.mode,
        ssr = options.ssr,
        helpers = root.helpers.len(),
        hoists = root.hoists.len(),
        "generate"
    );

    // an inlined render function gets its preamble separately
    let preamble = if options.inline {
        let mut preamble_ctx = CodegenContext::new(options, None);
        gen_preamble(&mut preamble_ctx, root, &helpers, &ssr_helpers);
        preamble_ctx.into_parts().0
    } else {
        gen_preamble(&mut ctx, root, &helpers, &ssr_helpers);
        ctx.code().to_string()
    };

    let function_name = if options.ssr { "ssrRender" } else { "render" };
    let mut args: std::vec::Vec<&str> = if options.ssr {
        vec!["_ctx", "_push", "_parent", "_attrs"]
    } else {
        vec!["_ctx", "_cache"]
    };
    if options.binding_metadata.is_some() && !options.inline {
        args.extend(["$props", "$setup", "$data", "$options"]);
    }
    let signature = args.join(", ");
    if options.inline {
        ctx.push(&format!("({signature}) => {{"));
    } else {
        ctx.push(&format!("function {function_name}({signature}) {{"));
    }
    ctx.indent();

    if use_with_block {
        ctx.push("with (_ctx) {");
        ctx.indent();
        if !helpers.is_empty() {
            ctx.push(&format!("const {{ {} }} = _Vue\n", alias_list(&helpers)));
            ctx.newline();
        }
    }

    if !root.components.is_empty() {
        gen_assets(&mut ctx, &root.components, AssetKind::Component);
        if !root.directives.is_empty() || root.temps > 0 {
            ctx.newline();
        }
    }
    if !root.directives.is_empty() {
        gen_assets(&mut ctx, &root.directives, AssetKind::Directive);
        if root.temps > 0 {
            ctx.newline();
        }
    }
    if root.temps > 0 {
        let temps: std::vec::Vec<_> = (0..root.temps).map(|i| format!("_temp{i}")).collect();
        ctx.push(&format!("let {}", temps.join(", ")));
    }
    if !root.components.is_empty() || !root.directives.is_empty() || root.temps > 0 {
        ctx.push("\n");
        ctx.newline();
    }

    if !options.ssr {
        ctx.push("return ");
    }
    match &root.codegen {
        Some(codegen) => gen_node(&mut ctx, codegen, Owner::Children(&root.children)),
        None => ctx.push("null"),
    }

    if use_with_block {
        ctx.deindent(true);
        ctx.push("}");
    }
    ctx.deindent(true);
    ctx.push("}");

    let (code, map) = ctx.into_parts();
    tracing::debug!(bytes = code.len(), mapped = map.is_some(), "generated");
    CodegenResult { code, preamble, map }
}

fn gen_preamble(
    ctx: &mut CodegenContext<'_>,
    root: &RootNode<'_>,
    helpers: &[RuntimeHelper],
    ssr_helpers: &[RuntimeHelper],
) {
    match ctx.options.mode {
        CodegenMode::Module => gen_module_preamble(ctx, root, helpers, ssr_helpers),
        CodegenMode::Function => gen_function_preamble(ctx, root, helpers, ssr_helpers),
    }
}

/// `createVNode: _createVNode, ...`
fn alias_list(helpers: &[RuntimeHelper]) -> std::string::String {
    helpers
        .iter()
        .map(|h| format!("{0}: _{0}", h.name()))
        .collect::<std::vec::Vec<_>>()
        .join(", ")
}

/// `createVNode as _createVNode, ...`
fn import_list(helpers: &[RuntimeHelper]) -> std::string::String {
    helpers
        .iter()
        .map(|h| format!("{0} as _{0}", h.name()))
        .collect::<std::vec::Vec<_>>()
        .join(", ")
}

fn gen_function_preamble(
    ctx: &mut CodegenContext<'_>,
    root: &RootNode<'_>,
    helpers: &[RuntimeHelper],
    ssr_helpers: &[RuntimeHelper],
) {
    let options = ctx.options;
    let vue_binding = if options.ssr {
        format!("require({})", js_string(&options.runtime_module_name))
    } else {
        options.runtime_global_name.to_string()
    };

    if !helpers.is_empty() {
        if options.prefix_identifiers {
            ctx.push(&format!("const {{ {} }} = {vue_binding}\n", alias_list(helpers)));
        } else {
            ctx.push(&format!("const _Vue = {vue_binding}\n"));
            if !root.hoists.is_empty() {
                let used: std::vec::Vec<_> = STATIC_HELPERS
                    .iter()
                    .copied()
                    .filter(|h| helpers.contains(h))
                    .collect();
                if !used.is_empty() {
                    ctx.push(&format!("const {{ {} }} = _Vue\n", alias_list(&used)));
                }
            }
        }
    }
    if !ssr_helpers.is_empty() {
        ctx.push(&format!(
            "const {{ {} }} = require({})\n",
            alias_list(ssr_helpers),
            js_string(&options.ssr_runtime_module_name)
        ));
    }
    gen_hoists(ctx, root);
    ctx.newline();
    ctx.push("return ");
}

fn gen_module_preamble(
    ctx: &mut CodegenContext<'_>,
    root: &RootNode<'_>,
    helpers: &[RuntimeHelper],
    ssr_helpers: &[RuntimeHelper],
) {
    let options = ctx.options;
    if !helpers.is_empty() {
        ctx.push(&format!(
            "import {{ {} }} from {}\n",
            import_list(helpers),
            js_string(&options.runtime_module_name)
        ));
    }
    if !ssr_helpers.is_empty() {
        ctx.push(&format!(
            "import {{ {} }} from {}\n",
            import_list(ssr_helpers),
            js_string(&options.ssr_runtime_module_name)
        ));
    }
    if !root.imports.is_empty() {
        gen_imports(ctx, &root.imports);
        ctx.newline();
    }
    gen_hoists(ctx, root);
    ctx.newline();
    if !options.inline {
        ctx.push("export ");
    }
}

fn gen_imports(ctx: &mut CodegenContext<'_>, imports: &[ImportItem]) {
    for import in imports {
        ctx.push(&format!("import {} from '{}'", import.exp, import.path));
        ctx.newline();
    }
}

fn gen_hoists(ctx: &mut CodegenContext<'_>, root: &RootNode<'_>) {
    if root.hoists.is_empty() {
        return;
    }
    ctx.pure = true;
    ctx.newline();
    for (i, hoisted) in root.hoists.iter().enumerate() {
        ctx.push(&format!("const _hoisted_{} = ", i + 1));
        gen_node(ctx, &hoisted.codegen, Owner::Children(&hoisted.children));
        ctx.newline();
    }
    ctx.pure = false;
}

#[derive(Clone, Copy)]
enum AssetKind {
    Component,
    Directive,
}

fn gen_assets(ctx: &mut CodegenContext<'_>, assets: &[gesso_palette::String], kind: AssetKind) {
    let (resolver, kind) = match kind {
        AssetKind::Component => (RuntimeHelper::ResolveComponent, "component"),
        AssetKind::Directive => (RuntimeHelper::ResolveDirective, "directive"),
    };
    let resolver = ctx.helper(resolver);
    for (i, asset) in assets.iter().enumerate() {
        // `__self`: the component may resolve to itself
        let (id, self_reference) = match asset.strip_suffix("__self") {
            Some(id) => (id, true),
            None => (asset.as_str(), false),
        };
        ctx.push(&format!(
            "const {} = {resolver}({}{})",
            to_valid_asset_id(id, kind),
            js_string(id),
            if self_reference { ", true" } else { "" }
        ));
        if i + 1 < assets.len() {
            ctx.newline();
        }
    }
}
