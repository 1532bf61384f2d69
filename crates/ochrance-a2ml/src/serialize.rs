use crate::ast::{Field, FieldValue, Manifest, Section, Value};

/// Canonical (signature-grade) rendering: two-space indentation, fields
/// sorted lexicographically by key, LF line endings, no trailing whitespace,
/// no trailing newline after the final `}`.
#[must_use]
pub fn serialize_canonical(manifest: &Manifest) -> String {
    let mut out = String::new();
    let sections = manifest.sections_in_canonical_order();
    for (i, section) in sections.iter().enumerate() {
        if i > 0 {
            out.push('\n');
        }
        write_section(&mut out, section, true, 0);
    }
    while out.ends_with('\n') {
        out.pop();
    }
    out
}

/// Compact rendering: same AST, no indentation and no blank lines between
/// sections.
#[must_use]
pub fn serialize_compact(manifest: &Manifest) -> String {
    let mut out = String::new();
    for section in manifest.sections_in_canonical_order() {
        write_section(&mut out, section, false, 0);
    }
    while out.ends_with('\n') {
        out.pop();
    }
    out
}

fn write_section(out: &mut String, section: &Section, pretty: bool, depth: usize) {
    indent(out, pretty, depth);
    out.push_str(&format!("{} {{\n", section.tag));
    write_fields(out, &section.fields, pretty, depth + 1);
    indent(out, pretty, depth);
    out.push_str("}\n");
}

fn write_fields(out: &mut String, fields: &[Field], pretty: bool, depth: usize) {
    let mut sorted: Vec<&Field> = fields.iter().collect();
    if pretty {
        sorted.sort_by(|a, b| a.key.cmp(&b.key));
    }
    for field in sorted {
        write_field(out, field, pretty, depth);
    }
}

fn write_field(out: &mut String, field: &Field, pretty: bool, depth: usize) {
    indent(out, pretty, depth);
    match &field.value {
        FieldValue::Value(value) => {
            out.push_str(&field.key);
            out.push_str(": ");
            out.push_str(&render_value(value));
            out.push('\n');
        }
        FieldValue::Block(nested) => {
            out.push_str(&field.key);
            out.push_str(" {\n");
            write_fields(out, nested, pretty, depth + 1);
            indent(out, pretty, depth);
            out.push_str("}\n");
        }
    }
}

fn indent(out: &mut String, pretty: bool, depth: usize) {
    if pretty {
        for _ in 0..depth {
            out.push_str("  ");
        }
    }
}

fn render_value(value: &Value) -> String {
    match value {
        Value::Str(s) | Value::Timestamp(s) => render_string(s),
        Value::Ident(s) => s.clone(),
        Value::Hash(hex) => format!("#{hex}"),
        Value::Integer(n) => n.to_string(),
        Value::List(items) => {
            let rendered: Vec<String> = items.iter().map(render_value).collect();
            format!("[{}]", rendered.join(" "))
        }
        Value::Blob(bytes) => {
            use base64::Engine as _;
            format!(
                "base64({})",
                base64::engine::general_purpose::STANDARD.encode(bytes)
            )
        }
        Value::Bool(b) => b.to_string(),
    }
}

fn render_string(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            other => out.push(other),
        }
    }
    out.push('"');
    out
}
