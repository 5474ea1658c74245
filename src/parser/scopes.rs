use chrono::NaiveDateTime;

use super::query::{BooleanOp, Operator, Query};

/// Restricts `query` to rows visible at `at`: the `published` flag matches
/// and, when `use_time` is set, `at` falls inside the `start`/`stop` window
/// (missing bounds are open).
#[must_use]
pub fn published(query: Query, at: NaiveDateTime, published: bool) -> Query {
    query
        .where_eq("published", published)
        .where_nested(BooleanOp::And, |window| {
            window
                .where_eq("use_time", false)
                .where_nested(BooleanOp::Or, |timed| {
                    timed
                        .where_eq("use_time", true)
                        .where_nested(BooleanOp::And, |start| {
                            start
                                .where_null("start")
                                .or_where_op("start", Operator::LtEq, at)
                        })
                        .where_nested(BooleanOp::And, |stop| {
                            stop.where_null("stop")
                                .or_where_op("stop", Operator::GtEq, at)
                        })
                })
        })
}
