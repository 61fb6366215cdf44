use thiserror::Error;

use crate::row::{Row, RowError};
use crate::table::{Table, TableError};

#[derive(Debug, PartialEq, Eq)]
pub enum Statement {
    Insert { row: Row },
    Select,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum StatementError {
    #[error("Syntax error. Could not parse statement.")]
    Syntax,
    #[error("ID must be positive.")]
    NegativeId,
    #[error("String is too long.")]
    TooLong(#[from] RowError),
    #[error("Unrecognized keyword at start of '{0}'")]
    Unrecognized(String),
}

pub struct VirtualMachine<'a> {
    pub table: &'a mut Table,
}

#[derive(Debug, Error)]
pub enum VMErr {
    #[error("Table full.")]
    TableFull,
    #[error("Duplicate key.")]
    DuplicateKey,
    #[error(transparent)]
    Table(TableError),
}

impl From<TableError> for VMErr {
    fn from(e: TableError) -> Self {
        match e {
            TableError::TableFull { .. } => VMErr::TableFull,
            TableError::DuplicateKey { .. } => VMErr::DuplicateKey,
            other => VMErr::Table(other),
        }
    }
}

impl VMErr {
    /// Whether the session can carry on after this error.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, VMErr::Table(_))
    }
}

#[derive(Debug)]
pub enum VMResult {
    Rows(Vec<Row>),
    Success,
}

/// Splits an input line into a statement. Validation happens here, before
/// the table is touched.
pub fn prepare_statement(original_input: &str) -> Result<Statement, StatementError> {
    if original_input.starts_with("insert") {
        prepare_insert(original_input)
    } else if original_input == "select" {
        Ok(Statement::Select)
    } else {
        Err(StatementError::Unrecognized(original_input.to_owned()))
    }
}

fn prepare_insert(original_input: &str) -> Result<Statement, StatementError> {
    let mut parts = original_input.split_whitespace();
    let id = parts.nth(1);
    let username = parts.next();
    let email = parts.next();

    match (id, username, email) {
        (Some(id), Some(username), Some(email)) => {
            let id: i64 = id.parse().map_err(|_| StatementError::Syntax)?;
            if id < 0 {
                return Err(StatementError::NegativeId);
            }
            let id = u32::try_from(id).map_err(|_| StatementError::Syntax)?;
            let row = Row::new(id, username, email)?;
            Ok(Statement::Insert { row })
        }
        _ => Err(StatementError::Syntax),
    }
}

impl VirtualMachine<'_> {
    pub fn execute_statement(&mut self, statement: Statement) -> Result<VMResult, VMErr> {
        match statement {
            Statement::Insert { row } => {
                self.table.insert(&row)?;
                Ok(VMResult::Success)
            }
            Statement::Select => {
                let rows = self.table.select()?.collect::<Result<Vec<_>, _>>()?;
                Ok(VMResult::Rows(rows))
            }
        }
    }
}
