//! SQL to Prisma scalar type mapping.

/// Map a SQL type token to the Prisma scalar name.
///
/// The token arrives with any length qualifier already split off. Unknown
/// types fall back to String.
pub fn prisma_scalar(sql_type: &str) -> &'static str {
    let base = sql_type.to_lowercase();
    match base.trim() {
        // Integer types
        "int" | "int4" | "integer" | "serial" | "serial4" | "smallint" | "int2"
        | "smallserial" | "serial2" | "mediumint" | "tinyint" => "Int",
        "bigint" | "int8" | "bigserial" | "serial8" => "BigInt",

        // Floating point
        "real" | "float4" | "double precision" | "float8" | "float" | "double" => "Float",
        "decimal" | "numeric" | "money" => "Decimal",

        // String types
        "varchar" | "character varying" | "char" | "character" | "text" | "citext"
        | "uuid" | "inet" => "String",

        // Date/time
        "timestamp" | "timestamptz" | "timestamp with time zone"
        | "timestamp without time zone" | "date" | "time" | "timetz"
        | "time with time zone" | "time without time zone" | "datetime" => "DateTime",

        // Boolean
        "boolean" | "bool" => "Boolean",

        // JSON
        "json" | "jsonb" => "Json",

        // Binary
        "bytea" | "blob" | "binary" | "varbinary" => "Bytes",

        // Default: no dedicated scalar in the subset
        _ => "String",
    }
}

/// Serial markers carry auto-increment semantics regardless of which syntax
/// declared them (shorthand type or identity clause, already normalized).
pub fn is_auto_increment(sql_type: &str) -> bool {
    matches!(
        sql_type.to_lowercase().as_str(),
        "serial" | "serial2" | "serial4" | "serial8" | "smallserial" | "bigserial"
    )
}
