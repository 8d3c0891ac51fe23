//! Merge strategy registry.
//!
//! Holds one merge strategy per section name and drives how a fetched
//! fragment's sections fold into the running accumulator, and how the
//! root document's own sections fold in last. There is deliberately no
//! catch-all strategy: a section contributed by a fragment with no
//! registered strategy is dropped, while the root document's own
//! sections always survive. The registered section list is the explicit
//! extension point for downstream section kinds.
//!
//! # Precedence
//!
//! Strategies are pure functions `(base, incoming) -> merged` where the
//! base value wins per the strategy's own collision rule. Fragments fold
//! with the accumulator as base; the root folds last with its own value
//! as base, so explicit root-level content always wins over anything
//! inherited transitively.

use std::collections::HashMap;

use serde_json::Value;

#[cfg(test)]
#[path = "merge_tests.rs"]
mod tests;

/// A merge strategy combines a section's base value (possibly absent)
/// with an incoming value and returns the merged result.
pub type MergeStrategy = Box<dyn Fn(Option<Value>, Value) -> Value + Send + Sync>;

/// Registry mapping section names to merge strategies.
///
/// Keys are top-level section names (`variables`, `documents`) or
/// single-level dotted paths addressing one nested child
/// (`settings.modifiers`).
///
/// # Examples
///
/// ```
/// use config_resolver::MergeStrategyRegistry;
/// use serde_json::json;
///
/// let registry = MergeStrategyRegistry::built_ins();
///
/// let merged = registry.merge_fragment_section(
///     "variables",
///     Some(json!({"NAME": "first"})),
///     json!({"NAME": "second", "EXTRA": "x"}),
/// );
/// assert_eq!(merged, Some(json!({"NAME": "first", "EXTRA": "x"})));
///
/// // Unregistered sections contribute nothing from fragments.
/// assert_eq!(
///     registry.merge_fragment_section("unknown", None, json!({"a": 1})),
///     None
/// );
/// ```
pub struct MergeStrategyRegistry {
    strategies: HashMap<String, MergeStrategy>,
}

impl MergeStrategyRegistry {
    /// Creates an empty registry with no strategies registered.
    pub fn new() -> Self {
        Self {
            strategies: HashMap::new(),
        }
    }

    /// Creates a registry with the built-in strategies registered:
    /// keyed-map union for `variables` and `settings.modifiers`, entry
    /// list append for `documents`, `tools`, and `prompts`.
    pub fn built_ins() -> Self {
        let mut registry = Self::new();
        registry.register("variables", merge_keyed_map);
        registry.register("documents", merge_entry_list);
        registry.register("tools", merge_entry_list);
        registry.register("prompts", merge_entry_list);
        registry.register("settings.modifiers", merge_keyed_map);
        registry
    }

    /// Registers a strategy for a section name, replacing any previous
    /// registration for the same name.
    pub fn register<F>(&mut self, section: impl Into<String>, strategy: F)
    where
        F: Fn(Option<Value>, Value) -> Value + Send + Sync + 'static,
    {
        self.strategies.insert(section.into(), Box::new(strategy));
    }

    /// Returns true when the section, or a nested child of it, has a
    /// registered strategy.
    pub fn covers(&self, section: &str) -> bool {
        self.strategies.contains_key(section)
            || self
                .strategies
                .keys()
                .any(|key| nested_child(key, section).is_some())
    }

    /// Folds one fragment-contributed section into the accumulator.
    ///
    /// `base` is the accumulated value so far (absent on first
    /// contribution). Returns `None` when no strategy covers the
    /// section, in which case the incoming value must be dropped.
    ///
    /// For a section covered only by dotted child registrations, the
    /// incoming value must be a map; registered children merge child by
    /// child and unregistered children are dropped.
    pub fn merge_fragment_section(
        &self,
        section: &str,
        base: Option<Value>,
        incoming: Value,
    ) -> Option<Value> {
        if let Some(strategy) = self.strategies.get(section) {
            return Some(strategy(base, incoming));
        }
        if !self.covers(section) {
            return None;
        }

        let Value::Object(mut incoming_map) = incoming else {
            // Nested-child sections must be maps; anything else has no
            // mergeable children.
            return base;
        };
        let had_base = base.is_some();
        let mut result = match base {
            Some(Value::Object(map)) => map,
            Some(other) => return Some(other),
            None => serde_json::Map::new(),
        };

        let mut contributed = had_base;
        for (key, strategy) in &self.strategies {
            let Some(child) = nested_child(key, section) else {
                continue;
            };
            if let Some(value) = incoming_map.remove(child) {
                let merged = strategy(result.remove(child), value);
                result.insert(child.to_string(), merged);
                contributed = true;
            }
        }

        if contributed {
            Some(Value::Object(result))
        } else {
            None
        }
    }

    /// Folds the root document's own value for a section in last.
    ///
    /// The root value is the base, so root content wins per the
    /// strategy's own collision rule. Sections with no covering
    /// strategy are overwritten wholesale by the root value; the root's
    /// own content is never dropped.
    pub fn fold_root_section(&self, section: &str, root: Value, accumulated: Option<Value>) -> Value {
        let Some(accumulated) = accumulated else {
            return root;
        };
        if let Some(strategy) = self.strategies.get(section) {
            return strategy(Some(root), accumulated);
        }

        // Nested children: merge registered children under the root's
        // own map, keeping everything else exactly as the root wrote it.
        match (root, accumulated) {
            (Value::Object(mut root_map), Value::Object(mut accumulated_map)) => {
                for (key, strategy) in &self.strategies {
                    let Some(child) = nested_child(key, section) else {
                        continue;
                    };
                    if let Some(value) = accumulated_map.remove(child) {
                        let merged = strategy(root_map.remove(child), value);
                        root_map.insert(child.to_string(), merged);
                    }
                }
                Value::Object(root_map)
            }
            (root, _) => root,
        }
    }
}

impl Default for MergeStrategyRegistry {
    fn default() -> Self {
        Self::built_ins()
    }
}

impl std::fmt::Debug for MergeStrategyRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut sections: Vec<&str> = self.strategies.keys().map(String::as_str).collect();
        sections.sort_unstable();
        f.debug_struct("MergeStrategyRegistry")
            .field("sections", &sections)
            .finish()
    }
}

/// Returns the child name when `key` is a single-level dotted path under
/// `section` (e.g. `settings.modifiers` under `settings`).
fn nested_child<'a>(key: &'a str, section: &str) -> Option<&'a str> {
    let child = key.strip_prefix(section)?.strip_prefix('.')?;
    if child.is_empty() || child.contains('.') {
        return None;
    }
    Some(child)
}

/// Shallow map union where base keys win on collision and incoming-only
/// keys are added. Used for `variables` and `settings.modifiers`.
pub fn merge_keyed_map(base: Option<Value>, incoming: Value) -> Value {
    match (base, incoming) {
        (None, incoming) => incoming,
        (Some(Value::Object(mut base_map)), Value::Object(incoming_map)) => {
            for (key, value) in incoming_map {
                base_map.entry(key).or_insert(value);
            }
            Value::Object(base_map)
        }
        // Shape mismatch: the existing value wins outright.
        (Some(base), _) => base,
    }
}

/// List append: incoming entries are appended after the base's own
/// entries, preserving declaration order, with no de-duplication. Used
/// for `documents`, `tools`, and `prompts`.
pub fn merge_entry_list(base: Option<Value>, incoming: Value) -> Value {
    match (base, incoming) {
        (None, incoming) => incoming,
        (Some(Value::Array(mut entries)), Value::Array(incoming_entries)) => {
            entries.extend(incoming_entries);
            Value::Array(entries)
        }
        (Some(base), _) => base,
    }
}
