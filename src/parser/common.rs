use crate::core::Value;
use chrono::{NaiveDate, NaiveDateTime};
use nom::{
    branch::alt,
    bytes::complete::{is_not, tag, tag_no_case, take_while, take_while1},
    character::complete::{alpha1, char, digit1, multispace0, satisfy},
    combinator::{map, map_res, not, opt, peek, recognize},
    multi::many0,
    sequence::{delimited, pair, terminated, tuple},
    IResult,
};

pub fn ws<'a, F, O>(inner: F) -> impl FnMut(&'a str) -> IResult<&'a str, O>
where
    F: FnMut(&'a str) -> IResult<&'a str, O>,
{
    delimited(multispace0, inner, multispace0)
}

/// Case-insensitive keyword that must not run into an identifier character
/// (so `OR` does not match the start of `ORDER`).
pub fn keyword<'a>(word: &'static str) -> impl FnMut(&'a str) -> IResult<&'a str, &'a str> {
    ws(terminated(
        tag_no_case(word),
        not(peek(satisfy(|c: char| c.is_alphanumeric() || c == '_'))),
    ))
}

pub fn identifier(input: &str) -> IResult<&str, String> {
    map(
        recognize(pair(
            alt((alpha1, tag("_"))),
            take_while(|c: char| c.is_alphanumeric() || c == '_'),
        )),
        |s: &str| s.to_string(),
    )(input)
}

// Identifier that is not a reserved keyword of the condition grammar
pub fn non_keyword_identifier(input: &str) -> IResult<&str, String> {
    use nom::combinator::verify;

    verify(identifier, |s: &String| {
        let upper = s.to_uppercase();
        !matches!(
            upper.as_str(),
            "NOT" | "AND" | "OR" | "MATCH" | "EXISTS" | "ORDER" | "LIMIT" | "OFFSET"
        )
    })(input)
}

/// Column reference: `col`, `table.col` or a JSON path `meta->title`.
pub fn column_name(input: &str) -> IResult<&str, String> {
    map(
        recognize(pair(
            non_keyword_identifier,
            many0(pair(alt((tag("->"), tag("."))), identifier)),
        )),
        |s: &str| s.to_string(),
    )(input)
}

pub fn string_literal(input: &str) -> IResult<&str, String> {
    map(
        delimited(
            char('\''),
            recognize(many0(alt((is_not("'"), tag("''"))))),
            char('\''),
        ),
        |s: &str| s.replace("''", "'"),
    )(input)
}

pub fn integer(input: &str) -> IResult<&str, usize> {
    map_res(take_while1(|c: char| c.is_ascii_digit()), |s: &str| {
        s.parse::<usize>()
    })(input)
}

pub fn value(input: &str) -> IResult<&str, Value> {
    alt((
        map(keyword("NULL"), |_| Value::Null),
        map(keyword("TRUE"), |_| Value::Boolean(true)),
        map(keyword("FALSE"), |_| Value::Boolean(false)),
        // Date/Timestamp/Text in quotes
        map(string_literal, |s: String| {
            if let Ok(d) = NaiveDate::parse_from_str(&s, "%Y-%m-%d") {
                return Value::Date(d);
            }
            if let Ok(t) = NaiveDateTime::parse_from_str(&s, "%Y-%m-%d %H:%M:%S") {
                return Value::Timestamp(t);
            }
            Value::Text(s)
        }),
        map_res(
            recognize(tuple((opt(char('-')), digit1, char('.'), digit1))),
            |s: &str| s.parse::<f64>().map(Value::Real),
        ),
        map_res(recognize(pair(opt(char('-')), digit1)), |s: &str| {
            s.parse::<i64>().map(Value::Integer)
        }),
    ))(input)
}
