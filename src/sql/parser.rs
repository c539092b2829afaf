use super::statement::*;
use super::tokenizer::{self, Token};
use super::validator;
use crate::errors;
use std::collections::VecDeque;

/// Parses a `SELECT` statement.
fn parse_select(tokens: &mut VecDeque<Token>) -> Result<SelectStatement, errors::Error> {
    let columns = if tokens.front() == Some(&Token::Symbol('*')) {
        tokens.pop_front();
        Columns::All
    } else {
        Columns::List(parse_identifier_list(tokens, "'SELECT' must specify columns.")?)
    };
    expect_keyword(tokens, "FROM", "'SELECT ...' must be followed by 'FROM'.")?;
    let table = pop_identifier(tokens, "'SELECT ... FROM' must be followed by a table name.")?;
    let conditions = parse_where_clause(tokens, false)?;

    let mut limit = None;
    if next_is_keyword(tokens, "LIMIT") {
        tokens.pop_front();
        limit = Some(match tokens.pop_front() {
            Some(Token::Number(n)) => n
                .parse::<i64>()
                .map_err(|_| errors::Error::Syntax(format!("Invalid LIMIT: {}.", n)))?,
            _ => {
                return Err(errors::Error::Syntax(
                    "'LIMIT' must be followed by a number.".to_owned(),
                ))
            }
        });
    }
    Ok(SelectStatement {
        table,
        columns,
        conditions,
        limit,
    })
}

/// Parses an `INSERT` statement.
fn parse_insert(tokens: &mut VecDeque<Token>) -> Result<InsertStatement, errors::Error> {
    expect_keyword(tokens, "INTO", "'INSERT' must be followed by 'INTO'.")?;
    let table = pop_identifier(tokens, "'INSERT INTO' must be followed by a table name.")?;

    expect_symbol(
        tokens,
        '(',
        "'INSERT INTO table' must be followed by column names in parentheses.",
    )?;
    let columns = parse_identifier_list(tokens, "Missing column name.")?;
    expect_symbol(tokens, ')', "Column names must be enclosed in parentheses.")?;

    expect_keyword(
        tokens,
        "VALUES",
        "'INSERT INTO table (...)' must be followed by 'VALUES'.",
    )?;
    expect_symbol(tokens, '(', "'VALUES' must be followed by values in parentheses.")?;
    let mut values = vec![parse_literal(tokens)?];
    while tokens.front() == Some(&Token::Symbol(',')) {
        tokens.pop_front();
        values.push(parse_literal(tokens)?);
    }
    expect_symbol(tokens, ')', "Values must be enclosed in parentheses.")?;

    if columns.len() != values.len() {
        return Err(errors::Error::Syntax(format!(
            "Column count ({}) does not match value count ({}).",
            columns.len(),
            values.len()
        )));
    }
    Ok(InsertStatement {
        table,
        columns,
        values,
    })
}

/// Parses an `UPDATE` statement. The `WHERE` clause is required.
fn parse_update(tokens: &mut VecDeque<Token>) -> Result<UpdateStatement, errors::Error> {
    let table = pop_identifier(tokens, "'UPDATE' must be followed by a table name.")?;
    expect_keyword(tokens, "SET", "'UPDATE table' must be followed by 'SET'.")?;
    let mut sets = vec![parse_assignment(tokens)?];
    while tokens.front() == Some(&Token::Symbol(',')) {
        tokens.pop_front();
        sets.push(parse_assignment(tokens)?);
    }
    let conditions = parse_where_clause(tokens, true)?;
    Ok(UpdateStatement {
        table,
        sets,
        conditions,
    })
}

/// Parses a `DELETE` statement. The `WHERE` clause is required.
fn parse_delete(tokens: &mut VecDeque<Token>) -> Result<DeleteStatement, errors::Error> {
    expect_keyword(tokens, "FROM", "'DELETE' must be followed by 'FROM'.")?;
    let table = pop_identifier(tokens, "'DELETE FROM' must be followed by a table name.")?;
    let conditions = parse_where_clause(tokens, true)?;
    Ok(DeleteStatement { table, conditions })
}

/// Parses `CREATE TABLE name (col type, ...)`.
fn parse_create(tokens: &mut VecDeque<Token>) -> Result<CreateTableStatement, errors::Error> {
    expect_keyword(tokens, "TABLE", "'CREATE' must be followed by 'TABLE'.")?;
    let name = pop_identifier(tokens, "'CREATE TABLE' must be followed by a table name.")?;
    expect_symbol(
        tokens,
        '(',
        "'CREATE TABLE name' must be followed by column definitions in parentheses.",
    )?;

    let mut columns = Vec::new();
    loop {
        let column = pop_identifier(tokens, "Missing column name.")?;
        let type_ = match tokens.pop_front() {
            Some(Token::Word(w)) => w,
            _ => {
                return Err(errors::Error::Syntax(format!(
                    "Column '{}' missing type.",
                    column
                )))
            }
        };
        columns.push((column, type_));
        match tokens.pop_front() {
            Some(Token::Symbol(',')) => continue,
            Some(Token::Symbol(')')) => break,
            _ => {
                return Err(errors::Error::Syntax(
                    "Column definitions must be separated by ',' and end with ')'.".to_owned(),
                ))
            }
        }
    }
    Ok(CreateTableStatement { name, columns })
}

/// Parses `DROP TABLE name`.
fn parse_drop(tokens: &mut VecDeque<Token>) -> Result<String, errors::Error> {
    expect_keyword(tokens, "TABLE", "'DROP' must be followed by 'TABLE'.")?;
    pop_identifier(tokens, "'DROP TABLE' must be followed by a name.")
}

/// Parses a `SHOW` statement.
fn parse_show(tokens: &mut VecDeque<Token>) -> Result<ShowStatement, errors::Error> {
    match tokens.pop_front() {
        Some(t) if t.is_keyword("TABLES") => Ok(ShowStatement::Tables),
        Some(t) if t.is_keyword("DATABASES") => Ok(ShowStatement::Databases),
        _ => Err(errors::Error::Syntax(
            "'SHOW' must specify 'DATABASES' or 'TABLES'.".to_owned(),
        )),
    }
}

/// Parses `EXPORT table TO 'path'` or `IMPORT table FROM 'path'`.
fn parse_transfer(
    tokens: &mut VecDeque<Token>,
    verb: &str,
    preposition: &str,
) -> Result<TransferStatement, errors::Error> {
    let table = pop_identifier(tokens, &format!("'{}' must be followed by a table name.", verb))?;
    expect_keyword(
        tokens,
        preposition,
        &format!("'{} table' must be followed by '{}'.", verb, preposition),
    )?;
    match tokens.pop_front() {
        Some(Token::Str(path)) if !path.is_empty() => Ok(TransferStatement { table, path }),
        _ => Err(errors::Error::Syntax(format!(
            "'{} table {}' must be followed by a quoted file name.",
            verb, preposition
        ))),
    }
}

/// Parses an optional `WHERE col = value [AND col = value ...]` clause.
fn parse_where_clause(
    tokens: &mut VecDeque<Token>,
    required: bool,
) -> Result<Vec<(String, Literal)>, errors::Error> {
    if !next_is_keyword(tokens, "WHERE") {
        if required {
            return Err(errors::Error::Syntax(
                "A 'WHERE' clause is required.".to_owned(),
            ));
        }
        return Ok(Vec::new());
    }
    tokens.pop_front();

    let mut conditions = vec![parse_assignment(tokens)?];
    while next_is_keyword(tokens, "AND") {
        tokens.pop_front();
        conditions.push(parse_assignment(tokens)?);
    }
    Ok(conditions)
}

/// Parses `column = literal`.
fn parse_assignment(tokens: &mut VecDeque<Token>) -> Result<(String, Literal), errors::Error> {
    let column = pop_identifier(tokens, "Missing column name.")?;
    expect_symbol(tokens, '=', &format!("Expected '=' after column '{}'.", column))?;
    let value = parse_literal(tokens)?;
    Ok((column, value))
}

fn parse_literal(tokens: &mut VecDeque<Token>) -> Result<Literal, errors::Error> {
    match tokens.pop_front() {
        Some(Token::Str(s)) => Ok(Literal::Str(s)),
        Some(Token::Number(n)) => Ok(Literal::Number(n)),
        Some(t) if t.is_keyword("TRUE") => Ok(Literal::Bool(true)),
        Some(t) if t.is_keyword("FALSE") => Ok(Literal::Bool(false)),
        Some(Token::Word(w)) => Ok(Literal::Str(w)),
        _ => Err(errors::Error::Syntax("Expected a value.".to_owned())),
    }
}

fn parse_identifier_list(
    tokens: &mut VecDeque<Token>,
    error_msg: &str,
) -> Result<Vec<String>, errors::Error> {
    let mut names = vec![pop_identifier(tokens, error_msg)?];
    while tokens.front() == Some(&Token::Symbol(',')) {
        tokens.pop_front();
        names.push(pop_identifier(tokens, error_msg)?);
    }
    Ok(names)
}

fn next_is_keyword(tokens: &VecDeque<Token>, keyword: &str) -> bool {
    tokens.front().map_or(false, |t| t.is_keyword(keyword))
}

/// Helper function to expect and consume a specific keyword.
fn expect_keyword(
    tokens: &mut VecDeque<Token>,
    expected: &str,
    error_msg: &str,
) -> Result<(), errors::Error> {
    match tokens.pop_front() {
        Some(token) if token.is_keyword(expected) => Ok(()),
        _ => Err(errors::Error::Syntax(error_msg.to_owned())),
    }
}

fn expect_symbol(
    tokens: &mut VecDeque<Token>,
    expected: char,
    error_msg: &str,
) -> Result<(), errors::Error> {
    match tokens.pop_front() {
        Some(Token::Symbol(c)) if c == expected => Ok(()),
        _ => Err(errors::Error::Syntax(error_msg.to_owned())),
    }
}

/// Helper function to pop an identifier or return an error.
fn pop_identifier(tokens: &mut VecDeque<Token>, error_msg: &str) -> Result<String, errors::Error> {
    match tokens.pop_front() {
        Some(Token::Word(w)) => validator::validate_identifier(&w),
        _ => Err(errors::Error::Syntax(error_msg.to_owned())),
    }
}

/// Parses a full statement.
///
/// # Arguments
/// * `raw_sql` - The raw statement text, optionally terminated by `;` or `\g`.
///
/// # Returns
/// A `Result` containing the parsed `SqlCommand` or an `errors::Error`.
pub fn parse(raw_sql: String) -> Result<SqlCommand, errors::Error> {
    let trimmed = raw_sql.trim();
    let body = trimmed
        .strip_suffix("\\g")
        .or_else(|| trimmed.strip_suffix(';'))
        .unwrap_or(trimmed);
    let mut tokens = tokenizer::tokenize_sql(body)?;

    let first = match tokens.pop_front() {
        Some(Token::Word(w)) => w.to_uppercase(),
        Some(_) => {
            return Err(errors::Error::Syntax(
                "Statement must start with a keyword.".to_owned(),
            ))
        }
        None => {
            return Err(errors::Error::Syntax(
                "Statement cannot be empty.".to_owned(),
            ))
        }
    };
    let statement = match first.as_str() {
        "SELECT" => Statement::Select(parse_select(&mut tokens)?),
        "VIEW" => Statement::Select(SelectStatement {
            table: pop_identifier(&mut tokens, "'VIEW' must be followed by a table name.")?,
            columns: Columns::All,
            conditions: Vec::new(),
            limit: None,
        }),
        "INSERT" => Statement::Insert(parse_insert(&mut tokens)?),
        "UPDATE" => Statement::Update(parse_update(&mut tokens)?),
        "DELETE" => Statement::Delete(parse_delete(&mut tokens)?),
        "CREATE" => Statement::CreateTable(parse_create(&mut tokens)?),
        "DROP" => Statement::DropTable(parse_drop(&mut tokens)?),
        "SHOW" => Statement::Show(parse_show(&mut tokens)?),
        "DESCRIBE" | "DESC" => Statement::Describe(pop_identifier(
            &mut tokens,
            "'DESCRIBE' must be followed by a table name.",
        )?),
        "STATUS" => Statement::Status,
        "EXPORT" => Statement::Export(parse_transfer(&mut tokens, "EXPORT", "TO")?),
        "IMPORT" => Statement::Import(parse_transfer(&mut tokens, "IMPORT", "FROM")?),
        _ => {
            return Err(errors::Error::Syntax(format!(
                "Unrecognized statement: {}.",
                first
            )))
        }
    };
    if !tokens.is_empty() {
        return Err(errors::Error::Syntax(
            "Unexpected tokens after statement.".to_owned(),
        ));
    }
    Ok(SqlCommand {
        statement,
        sql: raw_sql,
    })
}
