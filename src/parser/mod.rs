// Module declarations
mod common;
mod ddl;
mod dml;
mod queries;
pub mod query;
pub mod scopes;
mod statement;

// Re-export all public types
pub use query::{
    Aggregate, AggregateFunction, BooleanOp, DatePart, Operator, OrderBy, Query, SelectColumn,
    SortOrder, WhereClause, WhereKind,
};
pub use statement::{AlterTableOperation, Blueprint, ColumnDef, SqlStatement};

// Main parser function that combines all parsers
use nom::branch::alt;

pub fn parse_statement(input: &str) -> Result<SqlStatement, String> {
    let input = input.trim();
    let input = input.trim_end_matches(';');

    let result = alt((
        queries::select,
        dml::insert,
        dml::update,
        dml::delete,
        ddl::create_table,
        ddl::drop_table,
        ddl::alter_table,
    ))(input);

    match result {
        Ok((remaining, stmt)) => {
            if remaining.trim().is_empty() {
                Ok(stmt)
            } else {
                Err(format!("Unexpected input after statement: {remaining}"))
            }
        }
        Err(e) => Err(format!("Parse error: {e:?}")),
    }
}
