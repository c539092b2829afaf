use crate::database::show_databases;
use crate::errors::Error;
use crate::session::Session;
use crate::sql::statement::*;
use crate::storage::{
    ColumnSchema, ColumnType, ColumnValue, Filter, TableSchema, Values, ID_COLUMN,
};
use crate::transfer;
use std::path::Path;
use tracing::trace;

#[derive(Debug, PartialEq)]
pub enum SqlResult {
    /// OK response from UPDATE/DELETE/IMPORT and DDL statements.
    Ok { affected_rows: u64 },
    /// OK response from INSERT carrying the assigned `_id`.
    Inserted { id: u64 },
    /// Result set from SELECT-like statements.
    ResultSet {
        columns: Vec<String>,
        rows: Vec<Vec<String>>,
        note: Option<String>,
    },
    /// Free-form confirmation message.
    Notice(String),
}

/// Returns the confirmation question to ask before running a destructive
/// statement, if it is one.
pub fn confirmation(statement: &Statement) -> Option<String> {
    match statement {
        Statement::DropTable(name) => Some(format!("Are you sure you want to drop '{}'?", name)),
        Statement::Delete(d) => Some(format!(
            "Delete rows from '{}' where {}?",
            d.table,
            d.conditions
                .iter()
                .map(|(c, v)| format!("{} = {}", c, literal_text(v)))
                .collect::<Vec<_>>()
                .join(" AND ")
        )),
        _ => None,
    }
}

/// Execute a statement.
pub fn execute(session: &mut Session, c: SqlCommand) -> Result<SqlResult, Error> {
    trace!(sql = c.sql, "Executing statement.");
    let db = &mut session.database;
    match c.statement {
        Statement::Select(s) => {
            let schema = db.describe(&s.table)?.schema;
            let filter = build_filter(&schema, &s.conditions)?;
            let columns: Vec<String> = match s.columns {
                Columns::All => std::iter::once(ID_COLUMN.to_string())
                    .chain(schema.names())
                    .collect(),
                Columns::List(list) => {
                    for column in &list {
                        if column != ID_COLUMN && !schema.contains(column) {
                            return Err(err!(
                                Column,
                                "Column '{}' does not exist in table '{}'",
                                column,
                                s.table
                            ));
                        }
                    }
                    list
                }
            };

            let rows = db
                .select(&s.table, &filter, s.limit)?
                .into_iter()
                .map(|r| {
                    columns
                        .iter()
                        .map(|c| r.get_column(c).unwrap_or("-".into()))
                        .collect::<Vec<String>>()
                })
                .collect();
            Ok(SqlResult::ResultSet {
                columns,
                rows,
                note: None,
            })
        }
        Statement::Insert(i) => {
            let schema = db.describe(&i.table)?.schema;
            let pairs: Vec<(String, Literal)> = i.columns.into_iter().zip(i.values).collect();
            let data = build_values(&schema, &pairs)?;
            let id = db.insert(&i.table, data)?;
            Ok(SqlResult::Inserted { id })
        }
        Statement::Update(u) => {
            let schema = db.describe(&u.table)?.schema;
            let data = build_values(&schema, &u.sets)?;
            let filter = build_filter(&schema, &u.conditions)?;
            let count = db.update(&u.table, data, &filter)?;
            Ok(SqlResult::Ok {
                affected_rows: count as u64,
            })
        }
        Statement::Delete(d) => {
            let schema = db.describe(&d.table)?.schema;
            let filter = build_filter(&schema, &d.conditions)?;
            let count = db.delete(&d.table, &filter)?;
            Ok(SqlResult::Ok {
                affected_rows: count as u64,
            })
        }
        Statement::CreateTable(s) => {
            let columns = s
                .columns
                .iter()
                .map(|(name, type_)| {
                    Ok(ColumnSchema {
                        name: name.clone(),
                        type_: ColumnType::parse(type_)?,
                    })
                })
                .collect::<Result<Vec<_>, Error>>()?;
            db.create_table(&s.name, TableSchema::new(columns)?)?;
            Ok(SqlResult::Ok { affected_rows: 0 })
        }
        Statement::DropTable(name) => {
            db.drop_table(&name)?;
            Ok(SqlResult::Ok { affected_rows: 0 })
        }
        Statement::Show(ShowStatement::Tables) => Ok(SqlResult::ResultSet {
            columns: vec![format!("Tables_in_{}", db.name)],
            rows: db.list_tables().into_iter().map(|t| vec![t]).collect(),
            note: None,
        }),
        Statement::Show(ShowStatement::Databases) => Ok(SqlResult::ResultSet {
            columns: vec!["Database".to_string()],
            rows: show_databases(&session.config.data_dir)?
                .into_iter()
                .map(|d| vec![d])
                .collect(),
            note: None,
        }),
        Statement::Describe(name) => {
            let description = db.describe(&name)?;
            let rows = std::iter::once(vec![ID_COLUMN.to_string(), ColumnType::Integer.to_string()])
                .chain(
                    description
                        .schema
                        .columns
                        .iter()
                        .map(|c| vec![c.name.clone(), c.type_.to_string()]),
                )
                .collect();
            Ok(SqlResult::ResultSet {
                columns: vec!["Field".to_string(), "Type".to_string()],
                rows,
                note: Some(format!(
                    "Table '{}' holds {} row{}",
                    description.name,
                    description.row_count,
                    plural(description.row_count)
                )),
            })
        }
        Statement::Status => {
            let info = db.info();
            let mut rows = Vec::new();
            for table in &info.tables {
                let description = db.describe(table)?;
                rows.push(vec![
                    table.clone(),
                    description.row_count.to_string(),
                    description.schema.len().to_string(),
                ]);
            }
            Ok(SqlResult::ResultSet {
                columns: vec!["Table".into(), "Rows".into(), "Columns".into()],
                rows,
                note: Some(format!(
                    "Database '{}' at {}: {} table{}, {} row{}",
                    info.name,
                    info.path.display(),
                    info.total_tables,
                    plural(info.total_tables),
                    info.total_rows,
                    plural(info.total_rows)
                )),
            })
        }
        Statement::Export(t) => {
            let count = transfer::export_table(db, &t.table, Path::new(&t.path))?;
            Ok(SqlResult::Notice(format!(
                "Exported {} row{} to '{}'",
                count,
                plural(count),
                t.path
            )))
        }
        Statement::Import(t) => {
            let count = transfer::import_table(db, &t.table, Path::new(&t.path))?;
            Ok(SqlResult::Ok {
                affected_rows: count as u64,
            })
        }
    }
}

/// Converts `column = literal` pairs into a payload, coercing each literal to
/// the declared kind of its column.
fn build_values(schema: &TableSchema, pairs: &[(String, Literal)]) -> Result<Values, Error> {
    let mut values = Values::new();
    for (column, literal) in pairs {
        let value = coerce(literal, declared_type(schema, column), column)?;
        if values.insert(column.clone(), value).is_some() {
            return Err(err!(Syntax, "Column '{}' is given more than once.", column));
        }
    }
    Ok(values)
}

fn build_filter(schema: &TableSchema, conditions: &[(String, Literal)]) -> Result<Filter, Error> {
    Ok(Filter::new(build_values(schema, conditions)?))
}

fn declared_type(schema: &TableSchema, column: &str) -> Option<ColumnType> {
    if column == ID_COLUMN {
        return Some(ColumnType::Integer);
    }
    schema.get(column).map(|c| c.type_)
}

/// Coerces a literal to a column kind. Columns the schema does not declare
/// keep the literal's natural kind.
pub fn coerce(
    literal: &Literal,
    type_: Option<ColumnType>,
    column: &str,
) -> Result<ColumnValue, Error> {
    let invalid = |kind: &str| {
        err!(
            Syntax,
            "Invalid {} value {} for column '{}'.",
            kind,
            literal_text(literal),
            column
        )
    };
    match (type_, literal) {
        (None, Literal::Str(s)) => Ok(ColumnValue::Str(s.clone())),
        (None, Literal::Bool(b)) => Ok(ColumnValue::Bool(*b)),
        (None, Literal::Number(n)) => n
            .parse::<i64>()
            .map(ColumnValue::Int)
            .or_else(|_| n.parse::<f64>().map(ColumnValue::Float))
            .map_err(|_| invalid("number")),
        (Some(ColumnType::String), Literal::Str(s)) | (Some(ColumnType::String), Literal::Number(s)) => {
            Ok(ColumnValue::Str(s.clone()))
        }
        (Some(ColumnType::String), Literal::Bool(b)) => Ok(ColumnValue::Str(b.to_string())),
        (Some(ColumnType::Integer), Literal::Str(s)) | (Some(ColumnType::Integer), Literal::Number(s)) => s
            .trim()
            .parse::<i64>()
            .map(ColumnValue::Int)
            .map_err(|_| invalid("integer")),
        (Some(ColumnType::Float), Literal::Str(s)) | (Some(ColumnType::Float), Literal::Number(s)) => s
            .trim()
            .parse::<f64>()
            .map(ColumnValue::Float)
            .map_err(|_| invalid("float")),
        (Some(ColumnType::Boolean), Literal::Bool(b)) => Ok(ColumnValue::Bool(*b)),
        (Some(ColumnType::Boolean), Literal::Str(s)) | (Some(ColumnType::Boolean), Literal::Number(s)) => {
            match s.trim().to_lowercase().as_str() {
                "true" | "1" | "yes" => Ok(ColumnValue::Bool(true)),
                "false" | "0" | "no" => Ok(ColumnValue::Bool(false)),
                _ => Err(invalid("boolean")),
            }
        }
        (Some(kind), Literal::Bool(_)) => Err(invalid(kind.as_str())),
    }
}

fn literal_text(literal: &Literal) -> String {
    match literal {
        Literal::Str(s) => format!("'{}'", s),
        Literal::Number(n) => n.clone(),
        Literal::Bool(b) => b.to_string(),
    }
}

fn plural(n: usize) -> &'static str {
    if n == 1 {
        ""
    } else {
        "s"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::sql::parser;
    use tempfile::TempDir;

    fn run(session: &mut Session, sql: &str) -> Result<SqlResult, Error> {
        execute(session, parser::parse(sql.to_string())?)
    }

    fn session(dir: &TempDir) -> Session {
        Session::open(Config {
            data_dir: dir.path().to_path_buf(),
            database: "shop".into(),
        })
        .unwrap()
    }

    #[test]
    fn test_products_scenario_through_statements() {
        let dir = TempDir::new().unwrap();
        let mut s = session(&dir);

        run(&mut s, "CREATE TABLE products (name string, price float, stock integer);").unwrap();
        assert_eq!(
            run(&mut s, "INSERT INTO products (name, price, stock) VALUES ('Laptop', 999.99, 50);")
                .unwrap(),
            SqlResult::Inserted { id: 1 }
        );
        assert_eq!(
            run(&mut s, "INSERT INTO products (name, price, stock) VALUES ('Mouse', 29.99, 200);")
                .unwrap(),
            SqlResult::Inserted { id: 2 }
        );
        assert_eq!(
            run(&mut s, "UPDATE products SET stock = 45 WHERE name = 'Laptop';").unwrap(),
            SqlResult::Ok { affected_rows: 1 }
        );
        assert_eq!(
            run(&mut s, "SELECT * FROM products WHERE name = 'Laptop';").unwrap(),
            SqlResult::ResultSet {
                columns: vec!["_id".into(), "name".into(), "price".into(), "stock".into()],
                rows: vec![vec!["1".into(), "Laptop".into(), "999.99".into(), "45".into()]],
                note: None,
            }
        );
        assert_eq!(
            run(&mut s, "DELETE FROM products WHERE name = 'Mouse';").unwrap(),
            SqlResult::Ok { affected_rows: 1 }
        );
        match run(&mut s, "VIEW products;").unwrap() {
            SqlResult::ResultSet { rows, .. } => assert_eq!(rows.len(), 1),
            other => panic!("unexpected result {:?}", other),
        }
    }

    #[test]
    fn test_where_literals_follow_column_kinds() {
        let dir = TempDir::new().unwrap();
        let mut s = session(&dir);
        run(&mut s, "CREATE TABLE t (code string, n integer, ok boolean);").unwrap();
        run(&mut s, "INSERT INTO t (code, n, ok) VALUES (7, '3', yes);").unwrap();

        // `code` is a string column, so the numeric literal matches the text "7".
        let result = run(&mut s, "SELECT _id FROM t WHERE code = 7 AND n = 3 AND ok = true;").unwrap();
        assert_eq!(
            result,
            SqlResult::ResultSet {
                columns: vec!["_id".into()],
                rows: vec![vec!["1".into()]],
                note: None,
            }
        );
    }

    #[test]
    fn test_errors_surface_as_typed_failures() {
        let dir = TempDir::new().unwrap();
        let mut s = session(&dir);
        run(&mut s, "CREATE TABLE t (a integer);").unwrap();

        assert!(matches!(run(&mut s, "CREATE TABLE t (a integer);"), Err(Error::TableExists(_))));
        assert!(matches!(run(&mut s, "VIEW ghost;"), Err(Error::TableNotFound(_))));
        assert!(matches!(
            run(&mut s, "INSERT INTO t (b) VALUES (1);"),
            Err(Error::Column(_))
        ));
        assert!(matches!(
            run(&mut s, "UPDATE t SET b = 1 WHERE a = 1;"),
            Err(Error::Column(_))
        ));
        assert!(matches!(
            run(&mut s, "INSERT INTO t (a) VALUES ('abc');"),
            Err(Error::Syntax(_))
        ));
        assert!(matches!(run(&mut s, "CREATE TABLE u (a blob);"), Err(Error::Syntax(_))));
        assert!(matches!(run(&mut s, "SELECT z FROM t;"), Err(Error::Column(_))));
    }

    #[test]
    fn test_describe_status_and_show() {
        let dir = TempDir::new().unwrap();
        let mut s = session(&dir);
        run(&mut s, "CREATE TABLE t (a integer, b string);").unwrap();
        run(&mut s, "INSERT INTO t (a) VALUES (1);").unwrap();

        match run(&mut s, "DESCRIBE t;").unwrap() {
            SqlResult::ResultSet { rows, note, .. } => {
                assert_eq!(rows[0], vec!["_id".to_string(), "integer".to_string()]);
                assert_eq!(rows[2], vec!["b".to_string(), "string".to_string()]);
                assert_eq!(note.as_deref(), Some("Table 't' holds 1 row"));
            }
            other => panic!("unexpected result {:?}", other),
        }
        match run(&mut s, "STATUS;").unwrap() {
            SqlResult::ResultSet { rows, .. } => {
                assert_eq!(rows, vec![vec!["t".to_string(), "1".to_string(), "2".to_string()]])
            }
            other => panic!("unexpected result {:?}", other),
        }
        assert_eq!(
            run(&mut s, "SHOW TABLES;").unwrap(),
            SqlResult::ResultSet {
                columns: vec!["Tables_in_shop".into()],
                rows: vec![vec!["t".into()]],
                note: None,
            }
        );
        assert_eq!(
            run(&mut s, "SHOW DATABASES;").unwrap(),
            SqlResult::ResultSet {
                columns: vec!["Database".into()],
                rows: vec![vec!["shop".into()]],
                note: None,
            }
        );
    }

    #[test]
    fn test_confirmation_only_for_destructive_statements() {
        let drop = parser::parse("DROP TABLE t;".into()).unwrap();
        assert!(confirmation(&drop.statement).is_some());
        let delete = parser::parse("DELETE FROM t WHERE a = 'x';".into()).unwrap();
        assert_eq!(
            confirmation(&delete.statement).as_deref(),
            Some("Delete rows from 't' where a = 'x'?")
        );
        let select = parser::parse("VIEW t;".into()).unwrap();
        assert!(confirmation(&select.statement).is_none());
    }

    #[test]
    fn test_coerce() {
        let n = |s: &str| Literal::Number(s.to_string());
        assert_eq!(coerce(&n("5"), Some(ColumnType::Float), "c").unwrap(), ColumnValue::Float(5.0));
        assert_eq!(coerce(&n("5"), None, "c").unwrap(), ColumnValue::Int(5));
        assert_eq!(coerce(&n("5.5"), None, "c").unwrap(), ColumnValue::Float(5.5));
        assert_eq!(
            coerce(&Literal::Str("no".into()), Some(ColumnType::Boolean), "c").unwrap(),
            ColumnValue::Bool(false)
        );
        assert!(coerce(&Literal::Bool(true), Some(ColumnType::Integer), "c").is_err());
        assert!(coerce(&n("1.5"), Some(ColumnType::Integer), "c").is_err());
    }
}
