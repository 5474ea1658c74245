use tracing::debug;

use super::command::{Arguments, Command, Statement};
use crate::adapter::{Adapter, ExecContext};
use crate::core::{DriverError, Result};

/// Runs one command against an adapter.
pub type Handler = fn(&dyn Adapter, &mut ExecContext<'_>, &Arguments) -> Result<bool>;

macro_rules! handlers {
    ($($command:ident => $method:ident),* $(,)?) => {
        $(
            fn $method(adapter: &dyn Adapter, cx: &mut ExecContext<'_>, args: &Arguments) -> Result<bool> {
                adapter.$method(cx, args)
            }
        )*

        const HANDLERS: &[(Command, Handler)] = &[$((Command::$command, $method as Handler)),*];
    };
}

handlers! {
    Search => select,
    Insert => insert,
    Update => update,
    Delete => delete,
    TableExists => table_exists,
    TableCreate => create_table,
    TableDrop => drop_table,
    TableDropIfExists => drop_table_if_exists,
    TableColumnsSelect => select_columns,
    TableColumnExists => column_exists,
    TableColumnAdd => add_column,
    TableColumnAlter => alter_column,
    TableColumnDrop => drop_column,
    TableColumnDropIfExists => drop_column_if_exists,
}

pub fn handler(command: Command) -> Result<Handler> {
    HANDLERS
        .iter()
        .find(|(candidate, _)| *candidate == command)
        .map(|(_, handler)| *handler)
        .ok_or_else(|| DriverError::UnsupportedCommand(command.to_string()))
}

pub fn dispatch(adapter: &dyn Adapter, cx: &mut ExecContext<'_>, statement: &Statement) -> Result<bool> {
    let command = statement.command();
    let handler = handler(command)?;
    debug!(adapter = adapter.name(), %command, "dispatch");
    handler(adapter, cx, statement.arguments())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::{EntryAdapter, ReadOnlyAdapter};
    use crate::arguments;
    use crate::client::{Method, ScriptedClient};
    use serde_json::json;
    use std::cell::RefCell;

    #[test]
    fn test_every_command_has_a_handler() {
        for command in Command::ALL {
            assert!(handler(command).is_ok(), "no handler for {command}");
        }
        assert_eq!(HANDLERS.len(), Command::ALL.len());
    }

    #[test]
    fn test_dispatch_routes_to_adapter_method() {
        let client = ScriptedClient::new();
        client.respond(Method::Get, "builder/structures/news", json!({ "id": 1 }));
        let slot = RefCell::new(None);
        let mut cx = ExecContext::new(&client, &slot);

        let exists = Statement::new(Command::TableExists, arguments! { "table" => "news" });
        assert!(dispatch(&EntryAdapter, &mut cx, &exists).unwrap());

        let delete = Statement::new(Command::Delete, arguments! { "table" => "news", "id" => 1 });
        assert!(!dispatch(&ReadOnlyAdapter, &mut cx, &delete).unwrap());
        assert_eq!(client.requests().len(), 1);
    }
}
