/// Represents a shell command with its parsed statement and original text.
#[derive(Debug, PartialEq)]
pub struct SqlCommand {
    pub statement: Statement,
    pub sql: String,
}

/// A literal as written in a statement, before coercion to a column kind.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Str(String),
    Number(String),
    Bool(bool),
}

/// Statement types supported by the parser.
#[derive(Debug, PartialEq)]
pub enum Statement {
    Select(SelectStatement),
    Insert(InsertStatement),
    Update(UpdateStatement),
    Delete(DeleteStatement),
    CreateTable(CreateTableStatement),
    DropTable(String),
    Show(ShowStatement),
    Describe(String),
    Status,
    Export(TransferStatement),
    Import(TransferStatement),
}

/// Variants of `SHOW` statements.
#[derive(Debug, PartialEq)]
pub enum ShowStatement {
    Databases,
    Tables,
}

/// Column selection in a `SELECT` statement.
#[derive(Debug, PartialEq)]
pub enum Columns {
    All,
    List(Vec<String>),
}

/// `SELECT cols FROM table [WHERE ...] [LIMIT n]`.
#[derive(Debug, PartialEq)]
pub struct SelectStatement {
    pub table: String,
    pub columns: Columns,
    pub conditions: Vec<(String, Literal)>,
    pub limit: Option<i64>,
}

/// `INSERT INTO table (cols) VALUES (values)`.
#[derive(Debug, PartialEq)]
pub struct InsertStatement {
    pub table: String,
    pub columns: Vec<String>,
    pub values: Vec<Literal>,
}

/// `UPDATE table SET col = value, ... WHERE ...`.
#[derive(Debug, PartialEq)]
pub struct UpdateStatement {
    pub table: String,
    pub sets: Vec<(String, Literal)>,
    pub conditions: Vec<(String, Literal)>,
}

/// `DELETE FROM table WHERE ...`.
#[derive(Debug, PartialEq)]
pub struct DeleteStatement {
    pub table: String,
    pub conditions: Vec<(String, Literal)>,
}

/// `CREATE TABLE name (col type, ...)`.
#[derive(Debug, PartialEq)]
pub struct CreateTableStatement {
    pub name: String,
    pub columns: Vec<(String, String)>,
}

/// `EXPORT table TO 'path'` and `IMPORT table FROM 'path'`.
#[derive(Debug, PartialEq)]
pub struct TransferStatement {
    pub table: String,
    pub path: String,
}
