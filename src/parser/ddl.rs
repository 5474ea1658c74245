use super::common::{column_name, identifier, integer, keyword, value, ws};
use super::statement::{AlterTableOperation, Blueprint, ColumnDef, SqlStatement};
use nom::{
    branch::alt,
    character::complete::char,
    combinator::{map, opt, verify},
    multi::{many0, separated_list1},
    sequence::{delimited, preceded, tuple},
    IResult,
};

// Type name with an optional, ignored length: VARCHAR(255) -> "varchar"
fn data_type(input: &str) -> IResult<&str, String> {
    map(
        tuple((
            verify(identifier, |name: &String| {
                !matches!(name.to_uppercase().as_str(), "NOT" | "NULL" | "DEFAULT")
            }),
            opt(delimited(ws(char('(')), ws(integer), ws(char(')')))),
        )),
        |(name, _)| name.to_lowercase(),
    )(input)
}

enum ColumnOption {
    NotNull,
    Null,
    Default(crate::core::Value),
    UseCurrent,
}

fn column_option(input: &str) -> IResult<&str, ColumnOption> {
    alt((
        map(tuple((keyword("NOT"), keyword("NULL"))), |_| ColumnOption::NotNull),
        map(keyword("NULL"), |_| ColumnOption::Null),
        map(
            tuple((keyword("DEFAULT"), keyword("CURRENT_TIMESTAMP"))),
            |_| ColumnOption::UseCurrent,
        ),
        map(preceded(keyword("DEFAULT"), ws(value)), ColumnOption::Default),
    ))(input)
}

fn column_def(input: &str) -> IResult<&str, ColumnDef> {
    map(
        tuple((ws(column_name), opt(ws(data_type)), many0(column_option))),
        |(name, data_type, options)| {
            let mut column = ColumnDef::new(name);
            column.data_type = data_type;
            for option in options {
                match option {
                    ColumnOption::NotNull => column.nullable = false,
                    ColumnOption::Null => column.nullable = true,
                    ColumnOption::Default(value) => column.default = Some(value),
                    ColumnOption::UseCurrent => column.use_current = true,
                }
            }
            column
        },
    )(input)
}

pub fn create_table(input: &str) -> IResult<&str, SqlStatement> {
    map(
        tuple((
            keyword("CREATE"),
            keyword("TABLE"),
            ws(column_name),
            delimited(
                ws(char('(')),
                separated_list1(ws(char(',')), column_def),
                ws(char(')')),
            ),
        )),
        |(_, _, table, columns)| SqlStatement::CreateTable(Blueprint { table, columns }),
    )(input)
}

pub fn drop_table(input: &str) -> IResult<&str, SqlStatement> {
    map(
        tuple((
            keyword("DROP"),
            keyword("TABLE"),
            opt(tuple((keyword("IF"), keyword("EXISTS")))),
            ws(column_name),
        )),
        |(_, _, if_exists, name)| SqlStatement::DropTable {
            name,
            if_exists: if_exists.is_some(),
        },
    )(input)
}

fn alter_operation(input: &str) -> IResult<&str, AlterTableOperation> {
    alt((
        map(
            preceded(tuple((keyword("ADD"), opt(keyword("COLUMN")))), column_def),
            AlterTableOperation::AddColumn,
        ),
        map(
            tuple((
                keyword("RENAME"),
                keyword("COLUMN"),
                ws(column_name),
                keyword("TO"),
                ws(column_name),
            )),
            |(_, _, from, _, to)| AlterTableOperation::RenameColumn { from, to },
        ),
        map(
            tuple((
                keyword("DROP"),
                opt(keyword("COLUMN")),
                opt(tuple((keyword("IF"), keyword("EXISTS")))),
                ws(column_name),
            )),
            |(_, _, if_exists, name)| AlterTableOperation::DropColumn {
                name,
                if_exists: if_exists.is_some(),
            },
        ),
    ))(input)
}

pub fn alter_table(input: &str) -> IResult<&str, SqlStatement> {
    map(
        tuple((keyword("ALTER"), keyword("TABLE"), ws(column_name), alter_operation)),
        |(_, _, name, operation)| SqlStatement::AlterTable { name, operation },
    )(input)
}
