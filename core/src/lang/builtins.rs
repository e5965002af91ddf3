use super::{BuiltinObject, FunctionSignature, KeywordDef, ParamSpec, ValueKind};

pub(super) const CONSTANTS: &[&str] = &["NaN", "Infinity", "undefined"];

pub(super) const ENVIRONMENT_GLOBALS: &[&str] = &["results", "context"];

pub(super) const ARRAY_METHODS: &[&str] = &[
    "push", "pop", "shift", "unshift", "slice", "splice", "concat", "join", "indexOf", "lastIndexOf", "includes",
    "map", "filter", "reduce", "forEach", "find", "findIndex", "some", "every", "sort", "reverse", "fill",
];

pub(super) const STRING_METHODS: &[&str] = &[
    "charAt", "indexOf", "includes", "slice", "substring", "toLowerCase", "toUpperCase", "trim", "split", "replace",
    "startsWith", "endsWith", "padStart", "padEnd", "toFixed", "toString",
];

const fn kw(name: &'static str, snippet: Option<&'static str>, control_flow: bool) -> KeywordDef {
    KeywordDef {
        name,
        snippet,
        control_flow,
    }
}

pub(super) fn keywords() -> Vec<KeywordDef> {
    vec![
        kw("if", Some("if (${1:condition}) {\n\t$0\n}"), true),
        kw("else", Some("else {\n\t$0\n}"), true),
        kw("for", Some("for (let ${1:i} = 0; ${1:i} < ${2:count}; ${1:i}++) {\n\t$0\n}"), true),
        kw("while", Some("while (${1:condition}) {\n\t$0\n}"), true),
        kw("do", Some("do {\n\t$0\n} while (${1:condition});"), true),
        kw(
            "switch",
            Some("switch (${1:value}) {\n\tcase ${2:option}:\n\t\tbreak;\n\tdefault:\n\t\tbreak;\n}"),
            true,
        ),
        kw("case", None, true),
        kw("default", None, true),
        kw("break", None, true),
        kw("continue", None, true),
        kw("return", Some("return ${1:value};"), true),
        kw("function", Some("function ${1:name}(${2:params}) {\n\t$0\n}"), true),
        kw("try", Some("try {\n\t$0\n} catch (${1:error}) {\n}"), true),
        kw("catch", None, true),
        kw("finally", None, true),
        kw("throw", Some("throw new Error(${1:message});"), true),
        kw("var", Some("var ${1:name} = ${2:value};"), true),
        kw("let", Some("let ${1:name} = ${2:value};"), true),
        kw("const", Some("const ${1:name} = ${2:value};"), true),
        kw("new", None, false),
        kw("typeof", None, false),
        kw("instanceof", None, false),
        kw("in", None, false),
        kw("of", None, false),
        kw("delete", None, false),
        kw("void", None, false),
        kw("this", None, false),
        kw("true", None, false),
        kw("false", None, false),
        kw("null", None, false),
        kw("undefined", None, false),
    ]
}

pub(super) fn builtin_functions() -> Vec<(&'static str, &'static str)> {
    vec![
        ("parseInt", "parseInt(text, radix?) - parse an integer"),
        ("parseFloat", "parseFloat(text) - parse a decimal number"),
        ("isNaN", "isNaN(value) - test for NaN"),
        ("isFinite", "isFinite(value) - test for a finite number"),
        ("Boolean", "Boolean(value) - convert to boolean"),
    ]
}

pub(super) fn builtin_objects() -> Vec<BuiltinObject> {
    vec![
        BuiltinObject {
            name: "Math",
            description: "Mathematical functions and constants",
            members: &[
                "abs", "ceil", "floor", "round", "trunc", "sign", "sqrt", "cbrt", "pow", "exp", "log", "log10",
                "log2", "min", "max", "random", "sin", "cos", "tan", "PI", "E", "LN2", "LN10",
            ],
        },
        BuiltinObject {
            name: "JSON",
            description: "JSON encoding and decoding",
            members: &["parse", "stringify"],
        },
        BuiltinObject {
            name: "console",
            description: "Diagnostic output",
            members: &["log", "info", "warn", "error"],
        },
        BuiltinObject {
            name: "Number",
            description: "Number conversion and limits",
            members: &[
                "isInteger",
                "isFinite",
                "isNaN",
                "parseFloat",
                "parseInt",
                "MAX_VALUE",
                "MIN_VALUE",
                "EPSILON",
            ],
        },
        BuiltinObject {
            name: "String",
            description: "String conversion",
            members: &["fromCharCode"],
        },
        BuiltinObject {
            name: "Array",
            description: "Array construction helpers",
            members: &["isArray", "from", "of"],
        },
        BuiltinObject {
            name: "Object",
            description: "Object reflection helpers",
            members: &["keys", "values", "entries", "assign", "freeze"],
        },
        BuiltinObject {
            name: "Date",
            description: "Dates and timestamps",
            members: &["now", "parse", "UTC"],
        },
        BuiltinObject {
            name: "Error",
            description: "Error construction",
            members: &[],
        },
    ]
}

pub(super) fn custom_functions() -> Vec<FunctionSignature> {
    use ValueKind::*;

    vec![
        FunctionSignature {
            name: "addNormalResult",
            params: vec![
                ParamSpec::required("description", String),
                ParamSpec::required("dose", Number),
                ParamSpec::required("unit", String),
                ParamSpec::optional("frequency", String),
                ParamSpec::optional("route", String),
                ParamSpec::optional("notes", String),
            ],
            description: "Report a calculated dose as a normal result",
            returns: None,
        },
        FunctionSignature {
            name: "addWarningResult",
            params: vec![
                ParamSpec::required("description", String),
                ParamSpec::required("dose", Number),
                ParamSpec::required("unit", String),
                ParamSpec::optional("message", String),
            ],
            description: "Report a dose that needs clinical attention",
            returns: None,
        },
        FunctionSignature {
            name: "addErrorResult",
            params: vec![ParamSpec::required("message", String)],
            description: "Report that no dose can be calculated",
            returns: None,
        },
        FunctionSignature {
            name: "addInfoResult",
            params: vec![ParamSpec::required("message", String)],
            description: "Attach an informational note to the result",
            returns: None,
        },
        FunctionSignature {
            name: "roundTo",
            params: vec![
                ParamSpec::required("value", Number),
                ParamSpec::required("decimals", Number),
            ],
            description: "Round a value to a fixed number of decimals",
            returns: Some(Number),
        },
        FunctionSignature {
            name: "clamp",
            params: vec![
                ParamSpec::required("value", Number),
                ParamSpec::required("min", Number),
                ParamSpec::required("max", Number),
            ],
            description: "Limit a value to the inclusive range [min, max]",
            returns: Some(Number),
        },
        FunctionSignature {
            name: "mgPerKg",
            params: vec![
                ParamSpec::required("dosePerKg", Number),
                ParamSpec::required("weightKg", Number),
                ParamSpec::optional("maxDose", Number),
            ],
            description: "Weight-based dose, optionally capped at a maximum",
            returns: Some(Number),
        },
        FunctionSignature {
            name: "calculateBSA",
            params: vec![
                ParamSpec::required("weightKg", Number),
                ParamSpec::required("heightCm", Number),
            ],
            description: "Body surface area (Mosteller) in m²",
            returns: Some(Number),
        },
        FunctionSignature {
            name: "calculateIBW",
            params: vec![
                ParamSpec::required("heightCm", Number),
                ParamSpec::required("isMale", Boolean),
            ],
            description: "Ideal body weight (Devine) in kg",
            returns: Some(Number),
        },
        FunctionSignature {
            name: "calculateCrCl",
            params: vec![
                ParamSpec::required("age", Number),
                ParamSpec::required("weightKg", Number),
                ParamSpec::required("serumCreatinine", Number),
                ParamSpec::required("isFemale", Boolean),
            ],
            description: "Creatinine clearance (Cockcroft-Gault) in mL/min",
            returns: Some(Number),
        },
        FunctionSignature {
            name: "formatDose",
            params: vec![
                ParamSpec::required("value", Number),
                ParamSpec::required("unit", String),
                ParamSpec::optional("decimals", Number),
            ],
            description: "Format a dose with its unit for display",
            returns: Some(String),
        },
        FunctionSignature {
            name: "log",
            params: vec![ParamSpec::required("message", Any)],
            description: "Write a line to the calculation log",
            returns: None,
        },
    ]
}
