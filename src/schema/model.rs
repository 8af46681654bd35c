//! Target-side schema model: what the emitter renders.

/// A fully resolved target schema: enum blocks plus one model per table.
#[derive(Debug, Clone, PartialEq)]
pub struct PrismaSchema {
    pub enums: Vec<PrismaEnum>,
    pub models: Vec<Model>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PrismaEnum {
    pub name: String,
    /// Declared name, kept for @@map when the rendered name differs.
    pub sql_name: String,
    pub values: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Model {
    pub name: String,
    /// Source table name, kept for @@map when the model name differs.
    pub table_name: String,
    /// Scalar fields first; relation fields are folded on in a second pass.
    pub fields: Vec<Field>,
    pub relation_fields: Vec<Field>,
    /// Composite primary key, as camel-cased field names.
    pub composite_id: Option<Vec<String>>,
    pub uniques: Vec<Vec<String>>,
    pub indexes: Vec<Vec<String>>,
    pub comment: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub name: String,
    /// Scalar name, enum name, or referenced model name.
    pub field_type: String,
    pub optional: bool,
    /// Collection marker for back relations.
    pub is_array: bool,
    /// Rendered attributes in emission order (@id, @unique, @default, @map, @relation).
    pub attributes: Vec<String>,
    pub comment: Option<String>,
}

impl Field {
    /// Type column as rendered: name, optionality marker, array marker.
    pub fn type_display(&self) -> String {
        let mut out = self.field_type.clone();
        if self.is_array {
            out.push_str("[]");
        } else if self.optional {
            out.push('?');
        }
        out
    }
}
