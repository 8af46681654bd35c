//! Target schema generation from a parse result.

mod emit;
mod inflect;
mod model;
mod naming;

pub use emit::{build_schema, generate};
pub use model::{Field, Model, PrismaEnum, PrismaSchema};
pub use naming::{RelationNamer, ResolvedRelation};
