use super::common::{column_name, keyword, value, ws};
use super::queries::{inherit_table, where_clause};
use super::query::Query;
use super::statement::SqlStatement;
use crate::core::Value;
use nom::{
    character::complete::char,
    combinator::map,
    multi::separated_list1,
    sequence::{delimited, separated_pair, tuple},
    IResult,
};

fn column_list(input: &str) -> IResult<&str, Vec<String>> {
    delimited(
        ws(char('(')),
        separated_list1(ws(char(',')), ws(column_name)),
        ws(char(')')),
    )(input)
}

fn row_values(input: &str) -> IResult<&str, Vec<Value>> {
    delimited(
        ws(char('(')),
        separated_list1(ws(char(',')), ws(value)),
        ws(char(')')),
    )(input)
}

pub fn insert(input: &str) -> IResult<&str, SqlStatement> {
    map(
        tuple((
            keyword("INSERT"),
            keyword("INTO"),
            ws(column_name),
            column_list,
            keyword("VALUES"),
            separated_list1(ws(char(',')), row_values),
        )),
        |(_, _, table, columns, _, rows)| SqlStatement::Insert {
            table,
            columns,
            rows,
        },
    )(input)
}

fn assignment(input: &str) -> IResult<&str, (String, Value)> {
    separated_pair(ws(column_name), ws(char('=')), ws(value))(input)
}

pub fn update(input: &str) -> IResult<&str, SqlStatement> {
    map(
        tuple((
            keyword("UPDATE"),
            ws(column_name),
            keyword("SET"),
            separated_list1(ws(char(',')), assignment),
            where_clause,
        )),
        |(_, table, _, assignments, wheres)| {
            let mut query = Query::table(table);
            query.wheres = inherit_table(wheres, &query.table);
            SqlStatement::Update { query, assignments }
        },
    )(input)
}

pub fn delete(input: &str) -> IResult<&str, SqlStatement> {
    map(
        tuple((keyword("DELETE"), keyword("FROM"), ws(column_name), where_clause)),
        |(_, _, table, wheres)| {
            let mut query = Query::table(table);
            query.wheres = inherit_table(wheres, &query.table);
            SqlStatement::Delete { query }
        },
    )(input)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_multi_row_insert() {
        let (_, stmt) =
            insert("INSERT INTO entry_news (title, views) VALUES ('a', 1), ('b', 2)").unwrap();
        match stmt {
            SqlStatement::Insert { table, columns, rows } => {
                assert_eq!(table, "entry_news");
                assert_eq!(columns, vec!["title", "views"]);
                assert_eq!(rows.len(), 2);
                assert_eq!(rows[1][1], Value::Integer(2));
            }
            other => panic!("Expected Insert, got {other:?}"),
        }
    }

    #[test]
    fn test_update_with_filter() {
        let (_, stmt) = update("UPDATE customer SET firstname = 'Ada' WHERE id = 5").unwrap();
        match stmt {
            SqlStatement::Update { query, assignments } => {
                assert_eq!(query.table, "customer");
                assert_eq!(assignments[0].0, "firstname");
                assert_eq!(query.target_id(), Some(&Value::Integer(5)));
            }
            other => panic!("Expected Update, got {other:?}"),
        }
    }

    #[test]
    fn test_delete_without_filter() {
        let (_, stmt) = delete("DELETE FROM entry_news").unwrap();
        match stmt {
            SqlStatement::Delete { query } => {
                assert!(query.wheres.is_empty());
                assert_eq!(query.target_id(), None);
            }
            other => panic!("Expected Delete, got {other:?}"),
        }
    }
}
