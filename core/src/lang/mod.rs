//! Immutable language tables: keywords, built-in globals and the domain helper functions
//! dosage scripts may call.
//!
//! The tables are built once per process and shared read-only through
//! [`LanguageDefinition::shared`]; no analysis pass mutates them.

mod builtins;

use std::fmt;
use std::sync::Arc;

use once_cell::sync::Lazy;

use crate::util::fast_map::{FastHashMap, FastHashSet};

/// Coarse value classes used by typed signatures and argument classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Number,
    String,
    Boolean,
    Array,
    Object,
    Any,
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValueKind::Number => "number",
            ValueKind::String => "string",
            ValueKind::Boolean => "boolean",
            ValueKind::Array => "array",
            ValueKind::Object => "object",
            ValueKind::Any => "any",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamSpec {
    pub name: &'static str,
    pub kind: ValueKind,
    pub optional: bool,
}

impl ParamSpec {
    pub const fn required(name: &'static str, kind: ValueKind) -> Self {
        Self {
            name,
            kind,
            optional: false,
        }
    }

    pub const fn optional(name: &'static str, kind: ValueKind) -> Self {
        Self {
            name,
            kind,
            optional: true,
        }
    }
}

/// A domain helper callable from user scripts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionSignature {
    pub name: &'static str,
    pub params: Vec<ParamSpec>,
    pub description: &'static str,
    pub returns: Option<ValueKind>,
}

impl FunctionSignature {
    pub fn required_count(&self) -> usize {
        self.params.iter().filter(|p| !p.optional).count()
    }

    pub fn total_count(&self) -> usize {
        self.params.len()
    }

    /// `name(a: number, b?: string)`
    pub fn label(&self) -> String {
        let params: Vec<String> = self
            .params
            .iter()
            .map(|p| format!("{}{}: {}", p.name, if p.optional { "?" } else { "" }, p.kind))
            .collect();
        format!("{}({})", self.name, params.join(", "))
    }

    /// Snippet-style call template with one `${n:label}` marker per parameter.
    pub fn insertion_template(&self) -> String {
        let markers: Vec<String> = self
            .params
            .iter()
            .enumerate()
            .map(|(i, p)| format!("${{{}:{}}}", i + 1, p.name))
            .collect();
        format!("{}({})", self.name, markers.join(", "))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeywordDef {
    pub name: &'static str,
    pub snippet: Option<&'static str>,
    /// Statement-introducing keywords rank slightly above operators/literals in completion.
    pub control_flow: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuiltinObject {
    pub name: &'static str,
    pub description: &'static str,
    pub members: &'static [&'static str],
}

/// Process-wide language configuration.
#[derive(Debug)]
pub struct LanguageDefinition {
    pub keywords: Vec<KeywordDef>,
    pub builtin_functions: Vec<(&'static str, &'static str)>,
    pub builtin_objects: Vec<BuiltinObject>,
    pub constants: Vec<&'static str>,
    pub array_methods: Vec<&'static str>,
    pub string_methods: Vec<&'static str>,
    pub custom_functions: Vec<FunctionSignature>,
    /// Host-provided globals scripts may touch; stubbed by the compile check.
    pub environment_globals: Vec<&'static str>,
    keyword_set: FastHashSet<&'static str>,
    builtin_set: FastHashSet<&'static str>,
    custom_index: FastHashMap<&'static str, usize>,
}

static SHARED: Lazy<Arc<LanguageDefinition>> = Lazy::new(|| Arc::new(LanguageDefinition::standard()));

impl LanguageDefinition {
    /// The DoseScript tables, loaded on first use and shared afterwards.
    pub fn shared() -> Arc<LanguageDefinition> {
        SHARED.clone()
    }

    pub fn standard() -> Self {
        Self::from_tables(
            builtins::keywords(),
            builtins::builtin_functions(),
            builtins::builtin_objects(),
            builtins::CONSTANTS.to_vec(),
            builtins::ARRAY_METHODS.to_vec(),
            builtins::STRING_METHODS.to_vec(),
            builtins::custom_functions(),
            builtins::ENVIRONMENT_GLOBALS.to_vec(),
        )
    }

    #[allow(clippy::too_many_arguments)]
    fn from_tables(
        keywords: Vec<KeywordDef>,
        builtin_functions: Vec<(&'static str, &'static str)>,
        builtin_objects: Vec<BuiltinObject>,
        constants: Vec<&'static str>,
        array_methods: Vec<&'static str>,
        string_methods: Vec<&'static str>,
        custom_functions: Vec<FunctionSignature>,
        environment_globals: Vec<&'static str>,
    ) -> Self {
        let keyword_set = keywords.iter().map(|k| k.name).collect();
        let builtin_set = builtin_functions
            .iter()
            .map(|(name, _)| *name)
            .chain(builtin_objects.iter().map(|o| o.name))
            .chain(constants.iter().copied())
            .chain(environment_globals.iter().copied())
            .collect();
        let custom_index = custom_functions.iter().enumerate().map(|(i, f)| (f.name, i)).collect();

        Self {
            keywords,
            builtin_functions,
            builtin_objects,
            constants,
            array_methods,
            string_methods,
            custom_functions,
            environment_globals,
            keyword_set,
            builtin_set,
            custom_index,
        }
    }

    pub fn is_keyword(&self, name: &str) -> bool {
        self.keyword_set.contains(name)
    }

    /// Built-in function, object, constant or environment global.
    pub fn is_builtin(&self, name: &str) -> bool {
        self.builtin_set.contains(name)
    }

    pub fn custom_function(&self, name: &str) -> Option<&FunctionSignature> {
        self.custom_index.get(name).map(|&i| &self.custom_functions[i])
    }

    pub fn builtin_object(&self, name: &str) -> Option<&BuiltinObject> {
        self.builtin_objects.iter().find(|o| o.name == name)
    }

    pub fn object_members(&self, name: &str) -> Option<&'static [&'static str]> {
        self.builtin_object(name).map(|o| o.members)
    }

    pub fn is_array_method(&self, name: &str) -> bool {
        self.array_methods.contains(&name)
    }

    /// Whether `name` is known without any user declaration.
    pub fn is_predeclared(&self, name: &str) -> bool {
        self.is_builtin(name) || self.custom_index.contains_key(name)
    }
}
