//! SQL DDL parsing into the intermediate schema representation.

mod cursor;
mod parser;
mod segment;
mod table;
mod types;

pub use parser::parse_sql;
pub use segment::split_statements;
pub use types::{is_auto_increment, prisma_scalar};
