//! Compile result cache.
//!
//! Keys are an xxh3 hash over the template source and every option that
//! changes the output. Function-valued options (predicates, resolvers,
//! diagnostic sinks) are not part of the key: callers that swap those
//! must use separate caches.

use std::collections::VecDeque;

use gesso_canvas::CompilerOptions;
use gesso_palette::{hash_parts, FxHashMap};

use crate::{compile, CompileResult};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
}

/// Bounded cache; the oldest entry goes first once `capacity` is reached
#[derive(Debug)]
pub struct CompileCache {
    entries: FxHashMap<u64, CompileResult>,
    order: VecDeque<u64>,
    capacity: usize,
    stats: CacheStats,
}

impl Default for CompileCache {
    fn default() -> Self {
        Self::new(256)
    }
}

impl CompileCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: FxHashMap::default(),
            order: VecDeque::new(),
            capacity: capacity.max(1),
            stats: CacheStats::default(),
        }
    }

    /// Cache key of `source` compiled with `options`
    pub fn key(source: &str, options: &CompilerOptions) -> u64 {
        let fingerprint = options_fingerprint(options);
        hash_parts([source.as_bytes(), fingerprint.as_bytes()])
    }

    /// Compile with the core plugins unless an equal compile is cached
    pub fn get_or_compile(&mut self, source: &str, options: &CompilerOptions) -> &CompileResult {
        let key = Self::key(source, options);
        if self.entries.contains_key(&key) {
            self.stats.hits += 1;
        } else {
            self.stats.misses += 1;
            let result = compile(source, options.clone());
            self.insert(key, result);
        }
        &self.entries[&key]
    }

    fn insert(&mut self, key: u64, result: CompileResult) {
        while self.entries.len() >= self.capacity {
            let Some(oldest) = self.order.pop_front() else { break };
            self.entries.remove(&oldest);
            tracing::trace!(key = oldest, "evicted compile result");
        }
        self.order.push_back(key);
        self.entries.insert(key, result);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn stats(&self) -> CacheStats {
        self.stats
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.order.clear();
    }
}

/// Output-relevant option values as one string
fn options_fingerprint(options: &CompilerOptions) -> std::string::String {
    let parser = &options.parser;
    let transform = &options.transform;
    let codegen = &options.codegen;

    let mut bindings: std::vec::Vec<std::string::String> = transform
        .binding_metadata
        .iter()
        .chain(codegen.binding_metadata.iter())
        .flat_map(|metadata| {
            let aliases = metadata
                .props_aliases
                .iter()
                .map(|(local, key)| format!("alias:{local}={key}"));
            metadata
                .bindings
                .iter()
                .map(|(name, kind)| format!("{name}={kind:?}"))
                .chain(aliases)
                .chain(std::iter::once(format!("setup={}", metadata.is_script_setup)))
        })
        .collect();
    // map iteration order is unspecified
    bindings.sort_unstable();

    format!(
        "{:?}|{}|{}|{}|{}{}{}{}{}{}{}{:?}|{}|{:?}|{}{}{}|{}|{}|{}|{}",
        parser.whitespace,
        parser.delimiters.0,
        parser.delimiters.1,
        parser.comments,
        transform.prefix_identifiers as u8,
        transform.hoist_static as u8,
        transform.hoist_children_arrays as u8,
        transform.hmr as u8,
        transform.cache_handlers as u8,
        transform.ssr as u8,
        transform.inline as u8,
        transform.scope_id,
        transform.filename,
        codegen.mode,
        codegen.prefix_identifiers as u8,
        codegen.source_map as u8,
        codegen.ssr as u8,
        codegen.runtime_module_name,
        codegen.runtime_global_name,
        codegen.ssr_runtime_module_name,
        bindings.join(","),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hit_and_miss() {
        let mut cache = CompileCache::new(4);
        let options = CompilerOptions::default();
        let first = cache.get_or_compile("<div>{{ a }}</div>", &options).code.clone();
        let second = cache.get_or_compile("<div>{{ a }}</div>", &options).code.clone();
        assert_eq!(first, second);
        assert_eq!(cache.stats(), CacheStats { hits: 1, misses: 1 });
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_options_change_the_key() {
        let plain = CompilerOptions::default();
        let module = CompilerOptions::module();
        assert_ne!(CompileCache::key("<div/>", &plain), CompileCache::key("<div/>", &module));
        assert_eq!(CompileCache::key("<div/>", &plain), CompileCache::key("<div/>", &plain.clone()));
    }

    #[test]
    fn test_eviction() {
        let mut cache = CompileCache::new(2);
        let options = CompilerOptions::default();
        cache.get_or_compile("<a/>", &options);
        cache.get_or_compile("<b/>", &options);
        cache.get_or_compile("<i/>", &options);
        assert_eq!(cache.len(), 2);
        // `<a/>` was evicted
        cache.get_or_compile("<a/>", &options);
        assert_eq!(cache.stats().misses, 4);
    }
}
