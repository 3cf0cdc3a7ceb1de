//! Plain-text rendering of a collection

use schemaward::schema::{CollectionSchema, Field};

/// One line per field: position, id, name, type and flags
pub fn render_schema(schema: &CollectionSchema) -> String {
    let id_width = schema.fields.iter().map(|f| f.id.len()).max().unwrap_or(0);
    let name_width = schema.fields.iter().map(|f| f.name.len()).max().unwrap_or(0);

    let mut lines = Vec::with_capacity(schema.len() + 1);
    lines.push(format!("{} ({}), {} field(s)", schema.name, schema.id, schema.len()));

    for (position, field) in schema.fields.iter().enumerate() {
        let line = format!(
            "  {:>2}  {:<id_width$}  {:<name_width$}  {}",
            position,
            field.id,
            field.name,
            field.field_type,
        );
        let flags = flags(field);
        if flags.is_empty() {
            lines.push(line);
        } else {
            lines.push(format!("{}  [{}]", line, flags.join(", ")));
        }
    }

    let mut out = lines.join("\n");
    out.push('\n');
    out
}

fn flags(field: &Field) -> Vec<&'static str> {
    [
        (field.system, "system"),
        (field.required, "required"),
        (field.hidden, "hidden"),
        (field.presentable, "presentable"),
    ]
    .into_iter()
    .filter_map(|(set, name)| set.then_some(name))
    .collect()
}
