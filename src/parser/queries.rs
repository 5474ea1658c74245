use super::common::{column_name, integer, keyword, string_literal, value, ws};
use super::query::{
    Aggregate, AggregateFunction, BooleanOp, DatePart, OrderBy, Operator, Query, SelectColumn,
    SortOrder, WhereClause, WhereKind,
};
use super::statement::SqlStatement;
use nom::{
    branch::alt,
    bytes::complete::tag,
    character::complete::char,
    combinator::{map, map_res, opt, value as constant},
    multi::{separated_list0, separated_list1},
    sequence::{delimited, preceded, tuple},
    IResult,
};

fn comparison_operator(input: &str) -> IResult<&str, Operator> {
    map_res(
        ws(alt((
            tag(">="),
            tag("<="),
            tag("!="),
            tag("<>"),
            tag("="),
            tag(">"),
            tag("<"),
        ))),
        str::parse::<Operator>,
    )(input)
}

fn date_part(input: &str) -> IResult<&str, DatePart> {
    alt((
        constant(DatePart::Year, keyword("YEAR")),
        constant(DatePart::Month, keyword("MONTH")),
        constant(DatePart::Day, keyword("DAY")),
        constant(DatePart::Time, keyword("TIME")),
        constant(DatePart::Date, keyword("DATE")),
    ))(input)
}

fn value_list(input: &str) -> IResult<&str, Vec<crate::core::Value>> {
    delimited(
        ws(char('(')),
        separated_list0(ws(char(',')), ws(value)),
        ws(char(')')),
    )(input)
}

// Parse a single predicate (column = value, etc.)
fn predicate(input: &str) -> IResult<&str, WhereKind> {
    alt((
        // IS NULL / IS NOT NULL
        map(
            tuple((ws(column_name), keyword("IS"), keyword("NOT"), keyword("NULL"))),
            |(column, _, _, _)| WhereKind::NotNull { column },
        ),
        map(
            tuple((ws(column_name), keyword("IS"), keyword("NULL"))),
            |(column, _, _)| WhereKind::Null { column },
        ),
        // [NOT] BETWEEN
        map(
            tuple((
                ws(column_name),
                opt(keyword("NOT")),
                keyword("BETWEEN"),
                ws(value),
                keyword("AND"),
                ws(value),
            )),
            |(column, not, _, low, _, high)| WhereKind::Between {
                column,
                low,
                high,
                negated: not.is_some(),
            },
        ),
        // [NOT] LIKE
        map(
            tuple((ws(column_name), opt(keyword("NOT")), keyword("LIKE"), ws(string_literal))),
            |(column, not, _, pattern)| WhereKind::Basic {
                column,
                operator: if not.is_some() { Operator::NotLike } else { Operator::Like },
                value: pattern.into(),
            },
        ),
        // [NOT] IN
        map(
            tuple((ws(column_name), opt(keyword("NOT")), keyword("IN"), value_list)),
            |(column, not, _, values)| WhereKind::In {
                column,
                values,
                negated: not.is_some(),
            },
        ),
        // MATCH (a, b) AGAINST ('words')
        map(
            tuple((
                keyword("MATCH"),
                delimited(
                    ws(char('(')),
                    separated_list1(ws(char(',')), ws(column_name)),
                    ws(char(')')),
                ),
                keyword("AGAINST"),
                delimited(ws(char('(')), ws(string_literal), ws(char(')'))),
            )),
            |(_, columns, _, value)| WhereKind::FullText { columns, value },
        ),
        // YEAR(col) = 2020, DATE(col) = '2020-01-01', ...
        map(
            tuple((
                date_part,
                delimited(ws(char('(')), ws(column_name), ws(char(')'))),
                comparison_operator,
                ws(value),
            )),
            |(part, column, operator, value)| WhereKind::Date {
                part,
                column,
                operator,
                value,
            },
        ),
        map(
            tuple((ws(column_name), comparison_operator, ws(value))),
            |(column, operator, value)| WhereKind::Basic {
                column,
                operator,
                value,
            },
        ),
        // column compared with another column
        map(
            tuple((ws(column_name), comparison_operator, ws(column_name))),
            |(first, operator, second)| WhereKind::Column {
                first,
                operator,
                second,
            },
        ),
    ))(input)
}

// Parenthesized group or single predicate
fn condition_term(input: &str) -> IResult<&str, WhereKind> {
    alt((
        map(
            delimited(ws(char('(')), conditions, ws(char(')'))),
            |wheres| WhereKind::Nested {
                query: Box::new(Query {
                    wheres,
                    ..Query::default()
                }),
            },
        ),
        predicate,
    ))(input)
}

// Parse AND chains (higher priority than OR)
fn condition_and(input: &str) -> IResult<&str, Vec<WhereKind>> {
    separated_list1(keyword("AND"), condition_term)(input)
}

/// Parses a boolean condition into a flat clause list; AND chains joined
/// by OR become nested groups so precedence survives the flattening.
pub fn conditions(input: &str) -> IResult<&str, Vec<WhereClause>> {
    let (input, chains) = separated_list1(keyword("OR"), condition_and)(input)?;

    if chains.len() == 1 {
        let wheres = chains
            .into_iter()
            .flatten()
            .map(WhereClause::and)
            .collect();
        return Ok((input, wheres));
    }

    let wheres = chains
        .into_iter()
        .enumerate()
        .map(|(i, mut chain)| {
            let boolean = if i == 0 { BooleanOp::And } else { BooleanOp::Or };
            let kind = if chain.len() == 1 {
                chain.remove(0)
            } else {
                WhereKind::Nested {
                    query: Box::new(Query {
                        wheres: chain.into_iter().map(WhereClause::and).collect(),
                        ..Query::default()
                    }),
                }
            };
            WhereClause::new(boolean, kind)
        })
        .collect();
    Ok((input, wheres))
}

fn aggregate_function(input: &str) -> IResult<&str, (AggregateFunction, bool, String)> {
    alt((
        map(
            tuple((
                keyword("COUNT"),
                ws(char('(')),
                keyword("DISTINCT"),
                ws(column_name),
                ws(char(')')),
            )),
            |(_, _, _, column, _)| (AggregateFunction::Count, true, column),
        ),
        map(
            tuple((
                alt((
                    constant(AggregateFunction::Count, keyword("COUNT")),
                    constant(AggregateFunction::Avg, keyword("AVG")),
                    constant(AggregateFunction::Min, keyword("MIN")),
                    constant(AggregateFunction::Max, keyword("MAX")),
                )),
                delimited(
                    ws(char('(')),
                    alt((map(ws(tag("*")), str::to_string), ws(column_name))),
                    ws(char(')')),
                ),
            )),
            |(function, column)| (function, false, column),
        ),
    ))(input)
}

#[derive(Clone)]
enum Projection {
    All,
    Columns(Vec<String>),
    Aggregate(AggregateFunction, bool, String),
}

fn projection(input: &str) -> IResult<&str, Projection> {
    alt((
        map(aggregate_function, |(f, distinct, column)| {
            Projection::Aggregate(f, distinct, column)
        }),
        constant(Projection::All, ws(tag("*"))),
        map(separated_list1(ws(char(',')), ws(column_name)), Projection::Columns),
    ))(input)
}

// Parse optional WHERE clause
pub fn where_clause(input: &str) -> IResult<&str, Vec<WhereClause>> {
    map(opt(preceded(keyword("WHERE"), conditions)), Option::unwrap_or_default)(input)
}

fn order_item(input: &str) -> IResult<&str, OrderItem> {
    alt((
        map(
            tuple((keyword("RANDOM"), ws(char('(')), opt(ws(integer)), ws(char(')')))),
            |(_, _, seed, _)| OrderItem::Random(seed.and_then(|s| i64::try_from(s).ok())),
        ),
        map(
            tuple((
                ws(column_name),
                opt(alt((
                    constant(SortOrder::Asc, keyword("ASC")),
                    constant(SortOrder::Desc, keyword("DESC")),
                ))),
            )),
            |(column, direction)| OrderItem::Column(column, direction.unwrap_or_default()),
        ),
    ))(input)
}

enum OrderItem {
    Column(String, SortOrder),
    Random(Option<i64>),
}

// Parse optional ORDER BY clause
fn order_by(input: &str) -> IResult<&str, Vec<OrderItem>> {
    map(
        opt(preceded(
            tuple((keyword("ORDER"), keyword("BY"))),
            separated_list1(ws(char(',')), order_item),
        )),
        Option::unwrap_or_default,
    )(input)
}

pub fn limit(input: &str) -> IResult<&str, Option<usize>> {
    opt(preceded(keyword("LIMIT"), ws(integer)))(input)
}

pub fn offset(input: &str) -> IResult<&str, Option<usize>> {
    opt(preceded(keyword("OFFSET"), ws(integer)))(input)
}

pub fn select(input: &str) -> IResult<&str, SqlStatement> {
    let (input, _) = keyword("SELECT")(input)?;
    let (input, distinct) = opt(keyword("DISTINCT"))(input)?;
    let (input, projection) = projection(input)?;
    let (input, _) = keyword("FROM")(input)?;
    let (input, table) = ws(column_name)(input)?;
    let (input, wheres) = where_clause(input)?;
    let (input, orders) = order_by(input)?;
    let (input, limit) = limit(input)?;
    let (input, offset) = offset(input)?;

    let mut query = Query::table(table);
    query.distinct = distinct.is_some();
    match projection {
        Projection::All => {}
        Projection::Columns(columns) => {
            query.columns = columns.into_iter().map(SelectColumn::Named).collect();
        }
        Projection::Aggregate(function, distinct, column) => {
            query.distinct |= distinct;
            query.aggregate = Some(Aggregate {
                function,
                columns: vec![column],
            });
        }
    }
    query.wheres = inherit_table(wheres, &query.table);
    for item in orders {
        query = match item {
            OrderItem::Column(column, direction) => query.order_by(&column, direction),
            OrderItem::Random(seed) => query.in_random_order(seed),
        };
    }
    query.limit = limit;
    query.offset = offset;

    Ok((input, SqlStatement::Select(query)))
}

/// Nested groups parsed before the table was known get the outer table.
pub fn inherit_table(wheres: Vec<WhereClause>, table: &str) -> Vec<WhereClause> {
    wheres
        .into_iter()
        .map(|clause| match clause.kind {
            WhereKind::Nested { mut query } => {
                query.table = table.to_string();
                query.wheres = inherit_table(std::mem::take(&mut query.wheres), table);
                WhereClause::new(clause.boolean, WhereKind::Nested { query })
            }
            kind => WhereClause::new(clause.boolean, kind),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Value;

    #[test]
    fn test_and_chain_stays_flat() {
        let (rest, wheres) = conditions("a = 1 AND b = 'x'").unwrap();
        assert!(rest.is_empty());
        assert_eq!(wheres.len(), 2);
        assert!(wheres.iter().all(|w| w.boolean == BooleanOp::And));
    }

    #[test]
    fn test_or_of_and_chains_nests() {
        let (_, wheres) = conditions("a = 1 AND b = 2 OR c = 3").unwrap();
        assert_eq!(wheres.len(), 2);
        assert!(matches!(wheres[0].kind, WhereKind::Nested { .. }));
        assert_eq!(wheres[1].boolean, BooleanOp::Or);
        assert!(matches!(wheres[1].kind, WhereKind::Basic { .. }));
    }

    #[test]
    fn test_between_and_is_not_a_separator() {
        let (_, wheres) = conditions("n BETWEEN 1 AND 5 AND m = 2").unwrap();
        assert_eq!(wheres.len(), 2);
        match &wheres[0].kind {
            WhereKind::Between { low, high, negated, .. } => {
                assert_eq!(*low, Value::Integer(1));
                assert_eq!(*high, Value::Integer(5));
                assert!(!negated);
            }
            other => panic!("Expected Between, got {other:?}"),
        }
    }

    #[test]
    fn test_predicate_kinds() {
        let (_, w) = conditions("deleted_at IS NULL").unwrap();
        assert!(matches!(w[0].kind, WhereKind::Null { .. }));
        let (_, w) = conditions("id NOT IN (1, 2)").unwrap();
        assert!(matches!(w[0].kind, WhereKind::In { negated: true, .. }));
        let (_, w) = conditions("id IN ()").unwrap();
        assert!(matches!(&w[0].kind, WhereKind::In { values, .. } if values.is_empty()));
        let (_, w) = conditions("title NOT LIKE '%draft%'").unwrap();
        assert!(matches!(w[0].kind, WhereKind::Basic { operator: Operator::NotLike, .. }));
        let (_, w) = conditions("MATCH (title, body) AGAINST ('rust driver')").unwrap();
        assert!(matches!(&w[0].kind, WhereKind::FullText { columns, .. } if columns.len() == 2));
        let (_, w) = conditions("YEAR(created) = 2020").unwrap();
        assert!(matches!(w[0].kind, WhereKind::Date { part: DatePart::Year, .. }));
        let (_, w) = conditions("a = b").unwrap();
        assert!(matches!(w[0].kind, WhereKind::Column { .. }));
    }

    #[test]
    fn test_select_full() {
        let (rest, stmt) = select(
            "SELECT id, title FROM entry_news WHERE published = true ORDER BY created DESC, title LIMIT 10 OFFSET 20",
        )
        .unwrap();
        assert!(rest.trim().is_empty());
        match stmt {
            SqlStatement::Select(q) => {
                assert_eq!(q.table, "entry_news");
                assert_eq!(q.columns.len(), 2);
                assert_eq!(q.wheres.len(), 1);
                assert_eq!(q.orders.len(), 2);
                assert_eq!(q.limit, Some(10));
                assert_eq!(q.offset, Some(20));
            }
            other => panic!("Expected Select, got {other:?}"),
        }
    }

    #[test]
    fn test_select_aggregate() {
        let (_, stmt) = select("SELECT COUNT(DISTINCT author) FROM entry_news").unwrap();
        match stmt {
            SqlStatement::Select(q) => {
                assert!(q.distinct);
                let aggregate = q.aggregate.unwrap();
                assert_eq!(aggregate.function, AggregateFunction::Count);
                assert_eq!(aggregate.columns, vec!["author".to_string()]);
            }
            other => panic!("Expected Select, got {other:?}"),
        }
    }

    #[test]
    fn test_select_random_order() {
        let (_, stmt) = select("SELECT * FROM page ORDER BY RANDOM(7)").unwrap();
        match stmt {
            SqlStatement::Select(q) => {
                assert!(matches!(&q.orders[0], OrderBy::Raw { .. }));
            }
            other => panic!("Expected Select, got {other:?}"),
        }
    }
}
