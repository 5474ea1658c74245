// Query-string terms and where lists
pub mod term;
pub mod wheres;

// Search requests and mutation statements
pub mod grammar;
pub mod schema;

pub use grammar::{MAX_QUERY_SIZE, MutationTarget, QueryGrammar};
pub use schema::{SchemaGrammar, normalize_name};
pub use wheres::{compile_where_string, remove_qualified_column};
