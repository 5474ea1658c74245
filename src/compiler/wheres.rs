use super::term::{any_of, escape_value, exists, missing, prepare_value, range, term};
use crate::core::{DriverError, Result, Value};
use crate::parser::{DatePart, Operator, Query, WhereClause, WhereKind};

/// Strips a `table.` qualifier and rewrites JSON paths (`a->b`) to dots.
#[must_use]
pub fn remove_qualified_column(table: &str, column: &str) -> String {
    let column = if !table.is_empty() {
        column
            .strip_prefix(table)
            .and_then(|rest| rest.strip_prefix('.'))
            .unwrap_or(column)
    } else {
        column
    };
    column.replace("->", ".")
}

fn remove_leading_boolean(compiled: &str) -> &str {
    compiled
        .strip_prefix("AND ")
        .or_else(|| compiled.strip_prefix("OR "))
        .unwrap_or(compiled)
}

/// Compiles the query's where list into one query string, `None` when no
/// clause produced a fragment.
pub fn compile_where_string(query: &Query) -> Result<Option<String>> {
    let mut fragments = Vec::with_capacity(query.wheres.len());
    for clause in &query.wheres {
        let compiled = compile_clause(&query.table, clause)?;
        if !compiled.is_empty() {
            fragments.push(format!("{} ({compiled})", clause.boolean.as_str()));
        }
    }

    if fragments.is_empty() {
        return Ok(None);
    }
    Ok(Some(remove_leading_boolean(&fragments.join(" ")).to_string()))
}

fn compile_clause(table: &str, clause: &WhereClause) -> Result<String> {
    let column = |name: &str| remove_qualified_column(table, name);

    match &clause.kind {
        WhereKind::Basic {
            column: name,
            operator,
            value,
        } => Ok(term(&column(name), *operator, &prepare_value(*operator, value))),
        WhereKind::In {
            column: name,
            values,
            negated,
        } => {
            let set = any_of(&column(name), values);
            Ok(if *negated && !set.is_empty() {
                format!("NOT {set}")
            } else {
                set
            })
        }
        WhereKind::InRaw {
            column: name,
            values,
        } => {
            if values.is_empty() {
                return Ok(String::new());
            }
            let values: Vec<String> = values.iter().map(Value::to_string).collect();
            Ok(format!("{}:({})", column(name), values.join(" ")))
        }
        WhereKind::Between {
            column: name,
            low,
            high,
            negated,
        } => {
            let compiled = range(&column(name), low, high);
            Ok(if *negated {
                format!("NOT ({compiled})")
            } else {
                compiled
            })
        }
        WhereKind::Null { column: name } => Ok(missing(&column(name))),
        WhereKind::NotNull { column: name } => Ok(exists(&column(name))),
        WhereKind::Nested { query } => Ok(compile_where_string(query)?
            .map(|nested| format!("({nested})"))
            .unwrap_or_default()),
        WhereKind::Raw { sql, bindings } => Ok(substitute_bindings(sql, bindings)),
        WhereKind::FullText {
            columns,
            value,
        } => Ok(compile_full_text(table, columns, value)),
        WhereKind::Date {
            part,
            column: name,
            operator,
            value,
        } => compile_date(&column(name), *part, *operator, value),
        WhereKind::Exists { .. } => Err(DriverError::unsupported_operation("whereExists")),
        WhereKind::Column { .. } => Err(DriverError::unsupported_operation("whereColumn")),
        WhereKind::BetweenColumns { .. } => {
            Err(DriverError::unsupported_operation("whereBetweenColumns"))
        }
    }
}

/// Replaces each `?` with the next escaped binding; extra placeholders stay.
fn substitute_bindings(sql: &str, bindings: &[Value]) -> String {
    let mut bindings = bindings.iter();
    let mut compiled = String::with_capacity(sql.len());
    for c in sql.chars() {
        if c == '?' {
            if let Some(binding) = bindings.next() {
                compiled.push_str(&escape_value(binding));
                continue;
            }
        }
        compiled.push(c);
    }
    compiled
}

fn compile_full_text(table: &str, columns: &[String], value: &str) -> String {
    let words: Vec<&str> = value.split_whitespace().collect();
    if words.is_empty() {
        return String::new();
    }

    columns
        .iter()
        .map(|name| {
            let column = remove_qualified_column(table, name);
            let terms: Vec<String> = words
                .iter()
                .map(|word| {
                    let pattern = prepare_value(Operator::Like, &Value::Text(format!("*{word}*")));
                    term(&column, Operator::Like, &pattern)
                })
                .collect();
            format!("({})", terms.join(" AND "))
        })
        .collect::<Vec<_>>()
        .join(" OR ")
}

fn compile_date(column: &str, part: DatePart, operator: Operator, value: &Value) -> Result<String> {
    match part {
        DatePart::Date => Ok(term(column, operator, &prepare_value(operator, value))),
        DatePart::Year => {
            let year = match value {
                Value::Integer(year) => year.to_string(),
                other => other.to_string(),
            };
            Ok(range(
                column,
                &Value::Text(format!("{year}-01-01")),
                &Value::Text(format!("{year}-12-31")),
            ))
        }
        DatePart::Month | DatePart::Day | DatePart::Time => {
            Err(DriverError::unsupported_operation(part.operation()))
        }
    }
}


#[cfg(test)]
mod property {
    use super::*;
    use crate::compiler::term::parse::{parse_existence, parse_term};
    use crate::parser::BooleanOp;
    use proptest::collection::vec;
    use proptest::prelude::*;

    const TABLE: &str = "entry_news";

    fn arb_column() -> impl Strategy<Value = String> {
        prop_oneof![
            Just("title".to_string()),
            Just("views".to_string()),
            Just("author_id".to_string()),
            Just("entry_news.views".to_string()),
            Just("meta->seo".to_string()),
        ]
    }

    fn arb_value() -> impl Strategy<Value = Value> {
        prop_oneof![
            (-1000i64..1000).prop_map(Value::Integer),
            any::<bool>().prop_map(Value::Boolean),
            "[a-z]{1,8}( [a-z]{1,8})?".prop_map(Value::Text),
        ]
    }

    fn arb_operator() -> impl Strategy<Value = Operator> {
        prop_oneof![
            Just(Operator::Eq),
            Just(Operator::NotEq),
            Just(Operator::Lt),
            Just(Operator::Gt),
            Just(Operator::LtEq),
            Just(Operator::GtEq),
        ]
    }

    fn arb_boolean() -> impl Strategy<Value = BooleanOp> {
        prop_oneof![Just(BooleanOp::And), Just(BooleanOp::Or)]
    }

    fn arb_leaf() -> impl Strategy<Value = WhereKind> {
        prop_oneof![
            (arb_column(), arb_operator(), arb_value())
                .prop_map(|(column, operator, value)| WhereKind::Basic { column, operator, value }),
            (arb_column(), vec(arb_value(), 1..4), any::<bool>())
                .prop_map(|(column, values, negated)| WhereKind::In { column, values, negated }),
            (arb_column(), -1000i64..1000, -1000i64..1000, any::<bool>()).prop_map(
                |(column, low, high, negated)| WhereKind::Between {
                    column,
                    low: Value::Integer(low),
                    high: Value::Integer(high),
                    negated,
                }
            ),
            arb_column().prop_map(|column| WhereKind::Null { column }),
            arb_column().prop_map(|column| WhereKind::NotNull { column }),
        ]
    }

    fn query_of(clauses: Vec<(BooleanOp, WhereKind)>) -> Query {
        let mut query = Query::table(TABLE);
        query.wheres = clauses
            .into_iter()
            .map(|(boolean, kind)| WhereClause::new(boolean, kind))
            .collect();
        query
    }

    fn arb_kind() -> impl Strategy<Value = WhereKind> {
        arb_leaf().prop_recursive(3, 32, 4, |inner| {
            vec((arb_boolean(), inner), 1..4).prop_map(|clauses| WhereKind::Nested {
                query: Box::new(query_of(clauses)),
            })
        })
    }

    fn arb_query() -> impl Strategy<Value = Query> {
        vec((arb_boolean(), arb_kind()), 1..5).prop_map(query_of)
    }

    /// A term the compiled string must contain, with what it should read back as.
    enum Leaf {
        Term { rendered: String, column: String, operator: Operator, value: String },
        Existence { rendered: String, column: String, present: bool },
    }

    fn basic(column: &str, operator: Operator, value: &Value) -> Leaf {
        let value = prepare_value(operator, value);
        Leaf::Term {
            rendered: term(column, operator, &value),
            column: column.to_string(),
            operator,
            value: value.to_string(),
        }
    }

    fn collect_leaves(kind: &WhereKind, leaves: &mut Vec<Leaf>) {
        let column = |name: &str| remove_qualified_column(TABLE, name);
        match kind {
            WhereKind::Basic { column: name, operator, value } => {
                leaves.push(basic(&column(name), *operator, value));
            }
            WhereKind::In { column: name, values, .. } => {
                for value in values {
                    leaves.push(basic(&column(name), Operator::Eq, value));
                }
            }
            WhereKind::Between { column: name, low, high, .. } => {
                leaves.push(basic(&column(name), Operator::GtEq, low));
                leaves.push(basic(&column(name), Operator::LtEq, high));
            }
            WhereKind::Null { column: name } => leaves.push(Leaf::Existence {
                rendered: missing(&column(name)),
                column: column(name),
                present: false,
            }),
            WhereKind::NotNull { column: name } => leaves.push(Leaf::Existence {
                rendered: exists(&column(name)),
                column: column(name),
                present: true,
            }),
            WhereKind::Nested { query } => {
                for clause in &query.wheres {
                    collect_leaves(&clause.kind, leaves);
                }
            }
            _ => {}
        }
    }

    fn balanced(compiled: &str) -> bool {
        let mut depth = 0i32;
        for c in compiled.chars() {
            match c {
                '(' => depth += 1,
                ')' => depth -= 1,
                _ => {}
            }
            if depth < 0 {
                return false;
            }
        }
        depth == 0
    }

    proptest! {
        #[test]
        fn compiled_groups_never_open_with_a_boolean(query in arb_query()) {
            let compiled = compile_where_string(&query).unwrap().unwrap();
            prop_assert!(!compiled.starts_with("AND ") && !compiled.starts_with("OR "), "{}", compiled);
            prop_assert!(!compiled.contains("(AND ") && !compiled.contains("(OR "), "{}", compiled);
            prop_assert!(balanced(&compiled), "{}", compiled);
            prop_assert!(!compiled.contains("entry_news."), "{}", compiled);
        }

        #[test]
        fn every_leaf_reads_back(query in arb_query()) {
            let compiled = compile_where_string(&query).unwrap().unwrap();
            let mut leaves = Vec::new();
            for clause in &query.wheres {
                collect_leaves(&clause.kind, &mut leaves);
            }
            prop_assert!(!leaves.is_empty());

            for leaf in leaves {
                match leaf {
                    Leaf::Term { rendered, column, operator, value } => {
                        prop_assert!(compiled.contains(&rendered), "{} not in {}", rendered, compiled);
                        let (rest, parsed) = parse_term(&rendered).unwrap();
                        prop_assert!(rest.is_empty(), "unparsed tail in {}", rendered);
                        prop_assert_eq!(parsed.column, column);
                        prop_assert_eq!(parsed.operator, operator);
                        prop_assert_eq!(parsed.value, value);
                    }
                    Leaf::Existence { rendered, column, present } => {
                        prop_assert!(compiled.contains(&rendered), "{} not in {}", rendered, compiled);
                        let (rest, (parsed_present, parsed_column)) =
                            parse_existence(&rendered).unwrap();
                        prop_assert!(rest.is_empty());
                        prop_assert_eq!(parsed_present, present);
                        prop_assert_eq!(parsed_column, column.as_str());
                    }
                }
            }
        }
    }
}
