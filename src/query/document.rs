/*
 * Typed query document model for the subgraph query language
 */

use ethers_core::types::Address;
use std::fmt;

/// Argument value in a query document. Everything that reaches the rendered
/// text goes through this enum, so escaping happens in exactly one place.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Int(u64),
    Str(String),
    Ident(String),
    Address(Address),
    List(Vec<Value>),
    Object(Vec<(String, Value)>),
}

impl Value {
    pub fn string(value: impl Into<String>) -> Self {
        Value::Str(value.into())
    }

    pub fn ident(value: impl Into<String>) -> Self {
        Value::Ident(value.into())
    }

    fn render(&self, out: &mut String) {
        match self {
            Value::Int(value) => out.push_str(&value.to_string()),
            Value::Str(value) => {
                out.push('"');
                out.push_str(&escape_string(value));
                out.push('"');
            }
            Value::Ident(value) => out.push_str(value),
            Value::Address(address) => {
                out.push('"');
                out.push_str(&format!("{address:?}"));
                out.push('"');
            }
            Value::List(items) => {
                out.push('[');
                for (index, item) in items.iter().enumerate() {
                    if index > 0 {
                        out.push_str(", ");
                    }
                    item.render(out);
                }
                out.push(']');
            }
            Value::Object(entries) => {
                out.push_str("{ ");
                for (index, (key, value)) in entries.iter().enumerate() {
                    if index > 0 {
                        out.push_str(", ");
                    }
                    out.push_str(key);
                    out.push_str(": ");
                    value.render(out);
                }
                out.push_str(" }");
            }
        }
    }
}

/// A field selection, optionally aliased, with arguments and sub-selections.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    alias: Option<String>,
    name: String,
    arguments: Vec<(String, Value)>,
    selection: Vec<Field>,
}

impl Field {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            alias: None,
            name: name.into(),
            arguments: Vec::new(),
            selection: Vec::new(),
        }
    }

    #[must_use]
    pub fn aliased(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    #[must_use]
    pub fn arg(mut self, name: impl Into<String>, value: Value) -> Self {
        self.arguments.push((name.into(), value));
        self
    }

    #[must_use]
    pub fn select(mut self, fields: Vec<Field>) -> Self {
        self.selection.extend(fields);
        self
    }

    #[must_use]
    pub fn alias(&self) -> Option<&str> {
        self.alias.as_deref()
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    fn render(&self, out: &mut String) {
        if let Some(alias) = &self.alias {
            out.push_str(alias);
            out.push_str(": ");
        }
        out.push_str(&self.name);
        if !self.arguments.is_empty() {
            out.push('(');
            for (index, (name, value)) in self.arguments.iter().enumerate() {
                if index > 0 {
                    out.push_str(", ");
                }
                out.push_str(name);
                out.push_str(": ");
                value.render(out);
            }
            out.push(')');
        }
        if !self.selection.is_empty() {
            out.push_str(" { ");
            for (index, field) in self.selection.iter().enumerate() {
                if index > 0 {
                    out.push(' ');
                }
                field.render(out);
            }
            out.push_str(" }");
        }
    }
}

/// A named operation holding top-level selections. `render` is the only
/// place document text is produced.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    name: String,
    fields: Vec<Field>,
}

impl Document {
    pub fn new(name: impl Into<String>, fields: Vec<Field>) -> Self {
        Self {
            name: name.into(),
            fields,
        }
    }

    #[must_use]
    pub fn render(&self) -> QueryDocument {
        let mut out = String::new();
        out.push_str("query ");
        out.push_str(&self.name);
        out.push_str(" {\n");
        for field in &self.fields {
            out.push_str("    ");
            field.render(&mut out);
            out.push('\n');
        }
        out.push('}');
        QueryDocument(out)
    }
}

/// A fully rendered query document, ready for transmission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryDocument(String);

impl QueryDocument {
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for QueryDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Escapes a string per the query language's string-literal grammar.
pub(crate) fn escape_string(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if (c as u32) < 0x20 => out.push_str(&format!("\\u{:04x}", c as u32)),
            c => out.push(c),
        }
    }
    out
}

/// Checks that `value` is a legal name: leading letter or underscore, then
/// letters, digits, and underscores.
pub(crate) fn is_identifier(value: &str) -> bool {
    let mut chars = value.chars();
    match chars.next() {
        Some(c) if c == '_' || c.is_ascii_alphabetic() => {}
        _ => return false,
    }
    chars.all(|c| c == '_' || c.is_ascii_alphanumeric())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn renders_flat_selection() {
        let document = Document::new(
            "tokens",
            vec![Field::new("tokens")
                .arg("first", Value::Int(5))
                .select(vec![Field::new("id"), Field::new("symbol")])],
        )
        .render();

        assert_eq!(
            document.as_str(),
            "query tokens {\n    tokens(first: 5) { id symbol }\n}"
        );
    }

    #[test]
    fn renders_nested_selection_with_arguments() {
        let field = Field::new("token")
            .arg("id", Value::string("0xabc"))
            .select(vec![Field::new("dayData")
                .arg("first", Value::Int(7))
                .arg("orderBy", Value::ident("date"))
                .select(vec![Field::new("priceUSD"), Field::new("date")])]);

        let document = Document::new("snapshot", vec![field]).render();
        assert_eq!(
            document.as_str(),
            "query snapshot {\n    token(id: \"0xabc\") { dayData(first: 7, orderBy: date) { priceUSD date } }\n}"
        );
    }

    #[test]
    fn renders_aliases_objects_and_lists() {
        let field = Field::new("pair")
            .aliased("t1600000000")
            .arg("block", Value::Object(vec![("number".to_string(), Value::Int(42))]))
            .arg(
                "ids",
                Value::List(vec![Value::string("a"), Value::string("b")]),
            )
            .select(vec![Field::new("id")]);

        let mut out = String::new();
        field.render(&mut out);
        assert_eq!(
            out,
            "t1600000000: pair(block: { number: 42 }, ids: [\"a\", \"b\"]) { id }"
        );
    }

    #[test]
    fn renders_address_as_quoted_lowercase_hex() {
        let address =
            ethers_core::types::Address::from_str("0xC0AEe478e3658e2610c5F7A4A2E1777cE9e4f2Ac")
                .unwrap();
        let mut out = String::new();
        Value::Address(address).render(&mut out);
        assert_eq!(out, "\"0xc0aee478e3658e2610c5f7a4a2e1777ce9e4f2ac\"");
    }

    #[test]
    fn escapes_string_literals() {
        assert_eq!(escape_string("plain"), "plain");
        assert_eq!(escape_string("say \"hi\""), "say \\\"hi\\\"");
        assert_eq!(escape_string("back\\slash"), "back\\\\slash");
        assert_eq!(escape_string("line\nbreak"), "line\\nbreak");
        assert_eq!(escape_string("bell\u{07}"), "bell\\u0007");
    }

    #[test]
    fn identifier_rules() {
        assert!(is_identifier("volumeUSD"));
        assert!(is_identifier("_private"));
        assert!(is_identifier("t1600000000"));
        assert!(!is_identifier(""));
        assert!(!is_identifier("1leading"));
        assert!(!is_identifier("has-dash"));
        assert!(!is_identifier("has space"));
        assert!(!is_identifier("inject) { id }"));
    }
}
