//! Relation and field naming: collision-free names for both relation sides.

use std::collections::HashSet;

use super::inflect::{camel_case, pascal_case, pluralize, singularize};
use crate::ast::{ForeignKey, Table};

/// Accumulator of relation identifiers handed out so far in one document.
///
/// Threaded through the fold over constraints and returned from every
/// resolution step. Traversal order (tables in declaration order, constraints
/// in declaration order within each table) is part of the output contract:
/// reordering statements may change tie-break suffixes.
#[derive(Debug, Clone, Default)]
pub struct RelationNamer {
    used: HashSet<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedRelation {
    /// Shared identifier linking the forward field to its back relation.
    pub relation_name: String,
    /// Field on the owning model referencing one related row.
    pub forward_field: String,
    /// Collection field on the referenced model.
    pub backward_field: String,
    /// True when any participating column is nullable.
    pub optional: bool,
}

impl RelationNamer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve one foreign key, returning the grown accumulator.
    ///
    /// `owning_fields` and `referenced_fields` are the field names already
    /// assigned on the two models, including relation fields from earlier
    /// constraints.
    pub fn resolve(
        mut self,
        owning: &Table,
        fk: &ForeignKey,
        owning_fields: &HashSet<String>,
        referenced_fields: &HashSet<String>,
    ) -> (Self, ResolvedRelation) {
        let naming_column = naming_column(fk);
        let context = fk_context(naming_column);
        let meaningful = is_meaningful(&context, &owning.name);
        let referenced = fk.referenced_table.as_str();

        let mut relation_name = format!(
            "{}To{}",
            pascal_case(&owning.name),
            pascal_case(referenced)
        );
        if meaningful {
            relation_name.push('_');
            relation_name.push_str(&pascal_case(&context));
        }
        let relation_name = claim(&mut self.used, relation_name);

        let forward_base = if naming_column == "id" || context.eq_ignore_ascii_case(referenced) {
            camel_case(&singularize(referenced))
        } else {
            camel_case(&context)
        };
        let forward_field = unique_field_name(
            &forward_base,
            &owning.name,
            naming_column,
            &context,
            owning_fields,
        );

        let mut backward_base = camel_case(&pluralize(&owning.name));
        if meaningful {
            backward_base.push_str("As");
            backward_base.push_str(&pascal_case(&context));
        }
        // Self-referential keys put both fields on one model
        let backward_field = if owning.name == referenced {
            let mut taken = referenced_fields.clone();
            taken.insert(forward_field.clone());
            unique_field_name(&backward_base, &owning.name, naming_column, &context, &taken)
        } else {
            unique_field_name(
                &backward_base,
                &owning.name,
                naming_column,
                &context,
                referenced_fields,
            )
        };

        let optional = fk
            .columns
            .iter()
            .any(|c| owning.find_column(c).is_none_or(|col| col.nullable));

        (
            self,
            ResolvedRelation {
                relation_name,
                forward_field,
                backward_field,
                optional,
            },
        )
    }
}

/// Pick the column that drives name generation.
///
/// Single-column keys name themselves. For composite keys, the owning column
/// co-located with the referenced `id` is the business key; failing that, the
/// last column wins (scoping columns conventionally come first). Kept as a
/// heuristic, deliberately not generalized.
fn naming_column(fk: &ForeignKey) -> &str {
    if let [only] = fk.columns.as_slice() {
        return only;
    }
    if let Some(pos) = fk.referenced_columns.iter().position(|c| c == "id") {
        if let Some(col) = fk.columns.get(pos) {
            return col;
        }
    }
    fk.columns.last().map(String::as_str).unwrap_or("id")
}

/// Strip the `_id` suffix: `created_by_user_id` → `created_by_user`.
fn fk_context(naming_column: &str) -> String {
    naming_column
        .strip_suffix("_id")
        .unwrap_or(naming_column)
        .to_string()
}

/// Context is meaningless when it names nothing beyond the key or the table.
fn is_meaningful(context: &str, owning_table: &str) -> bool {
    !context.eq_ignore_ascii_case("id") && !context.eq_ignore_ascii_case(owning_table)
}

/// Register `name`, suffixing a counter from 2 on collision.
fn claim(used: &mut HashSet<String>, name: String) -> String {
    if used.insert(name.clone()) {
        return name;
    }
    let mut n = 2;
    loop {
        let candidate = format!("{name}{n}");
        if used.insert(candidate.clone()) {
            return candidate;
        }
        n += 1;
    }
}

/// The uniqueness cascade: increasingly specific candidates, numeric suffix
/// as the absolute last resort.
fn unique_field_name(
    base: &str,
    owning_table: &str,
    naming_column: &str,
    context: &str,
    taken: &HashSet<String>,
) -> String {
    let candidates = [
        base.to_string(),
        camel_case(context),
        format!("{}{}", camel_case(owning_table), pascal_case(base)),
        camel_case(naming_column),
        format!("{}{}", camel_case(owning_table), pascal_case(context)),
    ];
    for candidate in &candidates {
        if !taken.contains(candidate) {
            return candidate.clone();
        }
    }

    let last = &candidates[4];
    let mut n = 2;
    loop {
        let candidate = format!("{last}{n}");
        if !taken.contains(&candidate) {
            return candidate;
        }
        n += 1;
    }
}
