//! Static type mapping tables.
//!
//! Each row maps one raw source type to its name in every target vocabulary,
//! so a lookup for a `(DataSource, Vocabulary)` pair is a row search followed
//! by a column index. Backends that share a type system share a vocabulary.
//!
//! | Vocabulary | Backends |
//! |------------|----------|
//! | TypeScript | typescript |
//! | TypeQl | typedb, loader |
//! | Julia | julia |
//! | Python | python |
//! | Cozo | cozo |
//! | Structured | json, toon |

use heck::ToPascalCase;

use crate::ir::DataSource;

/// A target type system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Vocabulary {
    TypeScript,
    TypeQl,
    Julia,
    Python,
    Cozo,
    Structured,
}

type Row = (&'static str, [&'static str; 6]);

//  raw                           typescript                  typeql      julia                    python                 cozo      structured
#[rustfmt::skip]
const POSTGRES: &[Row] = &[
    ("smallint",                  ["number",                  "long",     "Int16",                 "int",                 "Int",    "integer"]),
    ("int2",                      ["number",                  "long",     "Int16",                 "int",                 "Int",    "integer"]),
    ("smallserial",               ["number",                  "long",     "Int16",                 "int",                 "Int",    "integer"]),
    ("int",                       ["number",                  "long",     "Int32",                 "int",                 "Int",    "integer"]),
    ("int4",                      ["number",                  "long",     "Int32",                 "int",                 "Int",    "integer"]),
    ("integer",                   ["number",                  "long",     "Int32",                 "int",                 "Int",    "integer"]),
    ("serial",                    ["number",                  "long",     "Int32",                 "int",                 "Int",    "integer"]),
    ("serial4",                   ["number",                  "long",     "Int32",                 "int",                 "Int",    "integer"]),
    ("bigint",                    ["number",                  "long",     "Int64",                 "int",                 "Int",    "integer"]),
    ("int8",                      ["number",                  "long",     "Int64",                 "int",                 "Int",    "integer"]),
    ("bigserial",                 ["number",                  "long",     "Int64",                 "int",                 "Int",    "integer"]),
    ("serial8",                   ["number",                  "long",     "Int64",                 "int",                 "Int",    "integer"]),
    ("oid",                       ["number",                  "long",     "UInt32",                "int",                 "Int",    "integer"]),
    ("real",                      ["number",                  "double",   "Float32",               "float",               "Float",  "number"]),
    ("float4",                    ["number",                  "double",   "Float32",               "float",               "Float",  "number"]),
    ("double precision",          ["number",                  "double",   "Float64",               "float",               "Float",  "number"]),
    ("float8",                    ["number",                  "double",   "Float64",               "float",               "Float",  "number"]),
    ("float",                     ["number",                  "double",   "Float64",               "float",               "Float",  "number"]),
    ("numeric",                   ["string",                  "double",   "Float64",               "decimal.Decimal",     "Float",  "number"]),
    ("decimal",                   ["string",                  "double",   "Float64",               "decimal.Decimal",     "Float",  "number"]),
    ("money",                     ["string",                  "double",   "Float64",               "decimal.Decimal",     "Float",  "number"]),
    ("bool",                      ["boolean",                 "boolean",  "Bool",                  "bool",                "Bool",   "boolean"]),
    ("boolean",                   ["boolean",                 "boolean",  "Bool",                  "bool",                "Bool",   "boolean"]),
    ("text",                      ["string",                  "string",   "String",                "str",                 "String", "string"]),
    ("varchar",                   ["string",                  "string",   "String",                "str",                 "String", "string"]),
    ("character varying",         ["string",                  "string",   "String",                "str",                 "String", "string"]),
    ("char",                      ["string",                  "string",   "String",                "str",                 "String", "string"]),
    ("character",                 ["string",                  "string",   "String",                "str",                 "String", "string"]),
    ("bpchar",                    ["string",                  "string",   "String",                "str",                 "String", "string"]),
    ("name",                      ["string",                  "string",   "String",                "str",                 "String", "string"]),
    ("citext",                    ["string",                  "string",   "String",                "str",                 "String", "string"]),
    ("enum",                      ["string",                  "string",   "String",                "str",                 "String", "string"]),
    ("set",                       ["string",                  "string",   "String",                "str",                 "String", "string"]),
    ("xml",                       ["string",                  "string",   "String",                "str",                 "String", "string"]),
    ("tsvector",                  ["string",                  "string",   "String",                "str",                 "String", "string"]),
    ("inet",                      ["string",                  "string",   "String",                "str",                 "String", "string"]),
    ("cidr",                      ["string",                  "string",   "String",                "str",                 "String", "string"]),
    ("macaddr",                   ["string",                  "string",   "String",                "str",                 "String", "string"]),
    ("uuid",                      ["string",                  "string",   "UUID",                  "uuid.UUID",           "Uuid",   "string"]),
    ("date",                      ["Date",                    "datetime", "Date",                  "datetime.date",       "String", "date"]),
    ("timestamp",                 ["Date",                    "datetime", "DateTime",              "datetime.datetime",   "String", "datetime"]),
    ("timestamp without time zone", ["Date",                  "datetime", "DateTime",              "datetime.datetime",   "String", "datetime"]),
    ("timestamptz",               ["Date",                    "datetime", "DateTime",              "datetime.datetime",   "String", "datetime"]),
    ("timestamp with time zone",  ["Date",                    "datetime", "DateTime",              "datetime.datetime",   "String", "datetime"]),
    ("datetime",                  ["Date",                    "datetime", "DateTime",              "datetime.datetime",   "String", "datetime"]),
    ("time",                      ["string",                  "string",   "Time",                  "datetime.time",       "String", "time"]),
    ("time without time zone",    ["string",                  "string",   "Time",                  "datetime.time",       "String", "time"]),
    ("timetz",                    ["string",                  "string",   "Time",                  "datetime.time",       "String", "time"]),
    ("time with time zone",       ["string",                  "string",   "Time",                  "datetime.time",       "String", "time"]),
    ("interval",                  ["string",                  "string",   "Dates.CompoundPeriod",  "datetime.timedelta",  "String", "duration"]),
    ("json",                      ["unknown",                 "string",   "Dict{String, Any}",     "dict",                "Json",   "object"]),
    ("jsonb",                     ["unknown",                 "string",   "Dict{String, Any}",     "dict",                "Json",   "object"]),
    ("bytea",                     ["Buffer",                  "string",   "Vector{UInt8}",         "bytes",               "Bytes",  "bytes"]),
];

// Raw types here are the value kinds inferred from sampled graph properties.
#[rustfmt::skip]
const AGE: &[Row] = &[
    ("string",                    ["string",                  "string",   "String",                "str",                 "String", "string"]),
    ("integer",                   ["number",                  "long",     "Int64",                 "int",                 "Int",    "integer"]),
    ("float",                     ["number",                  "double",   "Float64",               "float",               "Float",  "number"]),
    ("numeric",                   ["number",                  "double",   "Float64",               "decimal.Decimal",     "Float",  "number"]),
    ("boolean",                   ["boolean",                 "boolean",  "Bool",                  "bool",                "Bool",   "boolean"]),
    ("map",                       ["Record<string, unknown>", "string",   "Dict{String, Any}",     "dict",                "Json",   "object"]),
];

impl Vocabulary {
    fn column(&self) -> usize {
        match self {
            Vocabulary::TypeScript => 0,
            Vocabulary::TypeQl => 1,
            Vocabulary::Julia => 2,
            Vocabulary::Python => 3,
            Vocabulary::Cozo => 4,
            Vocabulary::Structured => 5,
        }
    }

    /// Type emitted when nothing else matches.
    pub fn fallback(&self) -> &'static str {
        match self {
            Vocabulary::TypeScript => "unknown",
            Vocabulary::TypeQl => "string",
            Vocabulary::Julia => "Any",
            Vocabulary::Python => "Any",
            Vocabulary::Cozo => "Any",
            Vocabulary::Structured => "unknown",
        }
    }

    /// How a column typed by a source enum refers to that enum.
    pub fn enum_reference(&self, enum_name: &str) -> String {
        match self {
            Vocabulary::TypeScript | Vocabulary::Julia | Vocabulary::Python => enum_name.to_pascal_case(),
            // No enum types: values are plain strings constrained elsewhere
            Vocabulary::TypeQl => "string".to_string(),
            Vocabulary::Cozo => "String".to_string(),
            Vocabulary::Structured => enum_name.to_string(),
        }
    }

    pub fn wrap_array(&self, inner: &str) -> String {
        match self {
            Vocabulary::TypeScript => {
                if inner.contains(' ') {
                    format!("({})[]", inner)
                } else {
                    format!("{}[]", inner)
                }
            }
            // Attributes are single-valued; multiplicity is expressed by owning several
            Vocabulary::TypeQl => inner.to_string(),
            Vocabulary::Julia => format!("Vector{{{}}}", inner),
            Vocabulary::Python => format!("list[{}]", inner),
            Vocabulary::Cozo => format!("[{}]", inner),
            Vocabulary::Structured => format!("{}[]", inner),
        }
    }

    pub fn wrap_nullable(&self, inner: &str) -> String {
        match self {
            Vocabulary::TypeScript => format!("{} | null", inner),
            Vocabulary::TypeQl => inner.to_string(),
            Vocabulary::Julia => format!("Union{{{}, Missing}}", inner),
            Vocabulary::Python => format!("Optional[{}]", inner),
            Vocabulary::Cozo | Vocabulary::Structured => format!("{}?", inner),
        }
    }
}

fn table(data_source: DataSource) -> &'static [Row] {
    match data_source {
        DataSource::Postgres => POSTGRES,
        DataSource::Age => AGE,
    }
}

/// Look up a normalized raw type for a `(source, vocabulary)` pair.
pub fn lookup(data_source: DataSource, vocabulary: Vocabulary, normalized: &str) -> Option<&'static str> {
    table(data_source)
        .iter()
        .find(|(raw, _)| *raw == normalized)
        .map(|(_, targets)| targets[vocabulary.column()])
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(Vocabulary::TypeScript, "number")]
    #[case(Vocabulary::TypeQl, "long")]
    #[case(Vocabulary::Julia, "Int32")]
    #[case(Vocabulary::Python, "int")]
    #[case(Vocabulary::Cozo, "Int")]
    #[case(Vocabulary::Structured, "integer")]
    fn test_int4_in_every_vocabulary(#[case] vocabulary: Vocabulary, #[case] expected: &str) {
        assert_eq!(lookup(DataSource::Postgres, vocabulary, "int4"), Some(expected));
    }

    #[rstest]
    fn test_lookup_is_per_source() {
        assert_eq!(lookup(DataSource::Age, Vocabulary::TypeQl, "integer"), Some("long"));
        assert_eq!(lookup(DataSource::Age, Vocabulary::TypeQl, "int4"), None);
    }

    #[rstest]
    fn test_raw_names_are_unique_per_table() {
        for rows in [POSTGRES, AGE] {
            let mut names: Vec<_> = rows.iter().map(|(raw, _)| *raw).collect();
            names.sort();
            let before = names.len();
            names.dedup();
            assert_eq!(before, names.len());
        }
    }

    #[rstest]
    fn test_raw_names_are_normalized() {
        for (raw, _) in POSTGRES.iter().chain(AGE.iter()) {
            assert_eq!(*raw, raw.to_ascii_lowercase());
            assert!(!raw.contains('('));
        }
    }

    #[rstest]
    #[case(Vocabulary::TypeScript, "string[]")]
    #[case(Vocabulary::Julia, "Vector{string}")]
    #[case(Vocabulary::Python, "list[string]")]
    #[case(Vocabulary::Cozo, "[string]")]
    #[case(Vocabulary::TypeQl, "string")]
    fn test_wrap_array(#[case] vocabulary: Vocabulary, #[case] expected: &str) {
        assert_eq!(vocabulary.wrap_array("string"), expected);
    }

    #[rstest]
    fn test_typescript_array_parenthesizes_compound_types() {
        assert_eq!(
            Vocabulary::TypeScript.wrap_array("Record<string, unknown>"),
            "(Record<string, unknown>)[]"
        );
    }

    #[rstest]
    #[case(Vocabulary::TypeScript, "T | null")]
    #[case(Vocabulary::Julia, "Union{T, Missing}")]
    #[case(Vocabulary::Python, "Optional[T]")]
    #[case(Vocabulary::Cozo, "T?")]
    fn test_wrap_nullable(#[case] vocabulary: Vocabulary, #[case] expected: &str) {
        assert_eq!(vocabulary.wrap_nullable("T"), expected);
    }

    #[rstest]
    fn test_enum_reference_forms() {
        assert_eq!(Vocabulary::TypeScript.enum_reference("order_status"), "OrderStatus");
        assert_eq!(Vocabulary::TypeQl.enum_reference("order_status"), "string");
        assert_eq!(Vocabulary::Structured.enum_reference("order_status"), "order_status");
    }
}
