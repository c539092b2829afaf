use super::buffer;
use crate::command::{self, SqlResult};
use crate::persist::LoadStatus;
use crate::{config, errors, session, sql};
use crossterm::{
    cursor, queue,
    style::{Attribute, Color, Print, ResetColor, SetAttribute, SetForegroundColor},
    terminal::{Clear, ClearType},
};
use std::io::{self, BufRead, Write};
use std::time::Instant;
use tracing::{error, info};

const NAME: &str = env!("CARGO_PKG_NAME");
const VERSION: &str = env!("CARGO_PKG_VERSION");
const DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");

const BANNER: &str = r#"
Type "use <name>" to open a database.
Commands end with ; or \g. Type 'help;' or '\h' for help.
"#;

const HELP: &str = r#"Shell commands (first on line, ';' optional):

?         (\?) Synonym for `help'.
help      (\h) Display this help.
use       (\u) Use another database. Takes database name as argument.
version   (\v) Show version information.
clear     (\c) Clear the screen and any pending input.
quit      (\q) Quit. `exit' works too.

Statements (end with ';' or \g):

SHOW TABLES | SHOW DATABASES | STATUS | DESCRIBE t
CREATE TABLE t (col string|integer|float|boolean, ...)
DROP TABLE t
INSERT INTO t (a, b) VALUES (1, 'x')
SELECT * | a, b FROM t [WHERE a = 1 AND b = 'x'] [LIMIT n]
VIEW t
UPDATE t SET a = 2 WHERE b = 'x'
DELETE FROM t WHERE a = 2
EXPORT t TO 'file.json' | IMPORT t FROM 'file.json'
"#;

/// Starts a REPL session over stdin and stdout.
///
/// # Returns
/// A `Result` indicating success or an `errors::Error` if initialization or cleanup fails.
pub fn start(config: config::Config) -> Result<(), errors::Error> {
    let mut session = session::Session::open(config)?;
    info!(session_id = %session.id, "Starting REPL session...");

    let stdin = io::stdin();
    let mut console = Console::new(&mut session, stdin.lock(), io::stdout());
    let result = console.start();

    session.close().map_err(|e| {
        error!("Failed to close session: {}", e);
        e
    })?;

    info!("REPL session ended.");
    result
}

pub struct Console<'a, R, W> {
    session: &'a mut session::Session,
    input: R,
    output: W,
    buffer: buffer::Buffer,
}

impl<'a, R: BufRead, W: Write> Console<'a, R, W> {
    pub fn new(session: &'a mut session::Session, input: R, output: W) -> Self {
        Self {
            session,
            input,
            output,
            buffer: buffer::Buffer::new(),
        }
    }

    /// Runs the read-eval-print loop until `quit` or end of input.
    pub fn start(&mut self) -> Result<(), errors::Error> {
        self.echo_line(format!("Welcome to the {} {} REPL. {}", NAME, VERSION, DESCRIPTION))?;
        self.echo_lines(BANNER)?;
        self.report_load_status()?;

        loop {
            self.prompt()?;
            let mut line = String::new();
            if self.input.read_line(&mut line)? == 0 {
                break;
            }
            if self.handle_line(&line)? {
                break;
            }
        }

        self.echo_line("Bye".to_string())?;
        Ok(())
    }

    /// Executes a single statement given on the command line.
    pub fn run_command(&mut self, sql: &str) -> Result<(), errors::Error> {
        self.report_load_status()?;
        self.handle_statement(sql.trim().to_string())?;
        Ok(())
    }

    fn prompt(&mut self) -> io::Result<()> {
        let text = if self.buffer.is_empty() {
            format!("{}:{}> ", NAME, self.session.database.name)
        } else {
            format!("{}-> ", " ".repeat(NAME.len() + self.session.database.name.len()))
        };
        queue!(
            self.output,
            SetAttribute(Attribute::Bold),
            SetForegroundColor(Color::Green),
            Print(text),
            SetAttribute(Attribute::Reset),
            ResetColor
        )?;
        self.output.flush()
    }

    /// Handles one input line and returns whether the session should end.
    fn handle_line(&mut self, line: &str) -> Result<bool, errors::Error> {
        let word = line.trim().trim_end_matches(';').trim();
        if matches!(word, "clear" | "\\c") {
            self.buffer.clear();
            queue!(self.output, Clear(ClearType::All), cursor::MoveTo(0, 0))?;
            self.output.flush()?;
            return Ok(false);
        }

        if self.buffer.is_empty() {
            match word {
                "" => return Ok(false),
                "exit" | "quit" | "\\q" => return Ok(true),
                "version" | "\\v" => {
                    self.echo_line(format!("{} version: {}", NAME, VERSION))?;
                    return Ok(false);
                }
                "help" | "\\h" | "\\?" | "?" => {
                    self.echo_lines(HELP)?;
                    return Ok(false);
                }
                cmd if is_use(cmd) => {
                    self.handle_use(cmd)?;
                    return Ok(false);
                }
                cmd if cmd.starts_with('\\') && !cmd.ends_with("\\g") => {
                    self.echo_error(format!("Unrecognized command: {}", cmd))?;
                    return Ok(false);
                }
                _ => {}
            }
        }

        self.buffer.push_line(line);
        if self.buffer.is_complete() {
            let sql = self.buffer.build();
            self.buffer.clear();
            self.handle_statement(sql)?;
        }
        Ok(false)
    }

    fn handle_use(&mut self, cmd: &str) -> io::Result<()> {
        let switched = cmd
            .split_whitespace()
            .nth(1)
            .ok_or_else(|| err!(InvalidOperation, "USE must be followed by a database name"))
            .and_then(|name| self.session.use_database(name));
        match switched {
            Ok(()) => {
                self.echo_line("Database changed".to_string())?;
                self.report_load_status()
            }
            Err(e) => self.echo_error(e.to_string()),
        }
    }

    fn handle_statement(&mut self, sql: String) -> io::Result<()> {
        let start = Instant::now();
        let sql_cmd = match sql::parser::parse(sql) {
            Ok(c) => c,
            Err(e) => return self.echo_error(e.to_string()),
        };

        if let Some(question) = command::confirmation(&sql_cmd.statement) {
            if !self.confirm(&question)? {
                return self.echo_line("Cancelled".to_string());
            }
        }

        match command::execute(self.session, sql_cmd) {
            Ok(result) => self.render(result, start.elapsed().as_secs_f32())?,
            Err(e) => self.echo_error(e.to_string())?,
        }

        if let Some(e) = self.session.database.take_save_error() {
            self.echo_error(format!("Warning: changes were not saved to disk. {}", e))?;
        }
        Ok(())
    }

    fn render(&mut self, result: SqlResult, elapsed: f32) -> io::Result<()> {
        match result {
            SqlResult::Ok { affected_rows } => self.echo_line(format!(
                "Query OK, {} row{} affected ({:.2} sec)",
                affected_rows,
                if affected_rows == 1 { "" } else { "s" },
                elapsed
            )),
            SqlResult::Inserted { id } => {
                self.echo_line(format!("Query OK, row inserted with _id {} ({:.2} sec)", id, elapsed))
            }
            SqlResult::ResultSet {
                columns,
                rows,
                note,
            } => {
                if rows.is_empty() {
                    self.echo_line(format!("Empty set ({:.2} sec)", elapsed))?;
                } else {
                    self.echo_lines(&build_table(&columns, &rows))?;
                    self.echo_line(format!(
                        "{} row{} in set ({:.2} sec)",
                        rows.len(),
                        if rows.len() == 1 { "" } else { "s" },
                        elapsed
                    ))?;
                }
                match note {
                    Some(note) => self.echo_line(note),
                    None => Ok(()),
                }
            }
            SqlResult::Notice(message) => self.echo_line(message),
        }
    }

    fn confirm(&mut self, question: &str) -> io::Result<bool> {
        queue!(
            self.output,
            SetForegroundColor(Color::Yellow),
            Print(format!("{} [y/N] ", question)),
            ResetColor
        )?;
        self.output.flush()?;
        let mut answer = String::new();
        self.input.read_line(&mut answer)?;
        Ok(matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"))
    }

    fn report_load_status(&mut self) -> io::Result<()> {
        if let LoadStatus::Recovered { reason } = self.session.database.load_status() {
            let message = format!(
                "Warning: could not read the saved data of '{}', starting empty. {}",
                self.session.database.name, reason
            );
            self.echo_error(message)?;
        }
        Ok(())
    }

    fn echo_line(&mut self, s: String) -> io::Result<()> {
        queue!(self.output, Print(s), Print("\n"))?;
        self.output.flush()
    }

    /// Echoes an error message in red.
    fn echo_error(&mut self, s: String) -> io::Result<()> {
        queue!(
            self.output,
            SetForegroundColor(Color::Red),
            Print(s),
            ResetColor,
            Print("\n")
        )?;
        self.output.flush()
    }

    fn echo_lines(&mut self, s: &str) -> io::Result<()> {
        for line in s.lines() {
            queue!(self.output, Print(line), Print("\n"))?;
        }
        self.output.flush()
    }
}

fn is_use(cmd: &str) -> bool {
    let cmd = cmd.to_lowercase();
    cmd == "use" || cmd == "\\u" || cmd.starts_with("use ") || cmd.starts_with("\\u ")
}

/// Builds an ASCII table from headers and rows.
///
/// # Arguments
/// * `headers` - Column headers.
/// * `rows` - Data rows.
///
/// # Returns
/// A formatted ASCII table as a `String`.
pub fn build_table(headers: &[String], rows: &[Vec<String>]) -> String {
    if headers.is_empty() {
        return String::new();
    }

    let column_widths: Vec<usize> = headers
        .iter()
        .enumerate()
        .map(|(i, h)| {
            rows.iter()
                .filter_map(|r| r.get(i))
                .fold(h.chars().count(), |max, cell| max.max(cell.chars().count()))
        })
        .collect();
    let border = format!(
        "+{}+\n",
        column_widths
            .iter()
            .map(|w| "-".repeat(*w + 2))
            .collect::<Vec<_>>()
            .join("+")
    );
    let format_row = |cells: &[String]| {
        let mut line = String::from("|");
        for (i, width) in column_widths.iter().enumerate() {
            let cell = cells.get(i).map_or("", String::as_str);
            line.push_str(&format!(" {:<width$} |", cell, width = width));
        }
        line.push('\n');
        line
    };

    let mut result = border.clone();
    result.push_str(&format_row(headers));
    result.push_str(&border);
    for row in rows {
        result.push_str(&format_row(row));
    }
    result.push_str(&border);
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use tempfile::TempDir;

    fn run_script(dir: &TempDir, script: &str) -> String {
        let mut session = session::Session::open(Config {
            data_dir: dir.path().to_path_buf(),
            database: "default".into(),
        })
        .unwrap();
        let mut output = Vec::new();
        Console::new(&mut session, script.as_bytes(), &mut output)
            .start()
            .unwrap();
        String::from_utf8(output).unwrap()
    }

    #[test]
    fn test_build_table() {
        let table = build_table(
            &["_id".to_string(), "name".to_string()],
            &[vec!["1".to_string(), "Laptop".to_string()]],
        );
        assert_eq!(
            table,
            "+-----+--------+\n\
             | _id | name   |\n\
             +-----+--------+\n\
             | 1   | Laptop |\n\
             +-----+--------+\n"
        );
    }

    #[test]
    fn test_session_script() {
        let dir = TempDir::new().unwrap();
        let out = run_script(
            &dir,
            "CREATE TABLE products (name string,\n price float);\n\
             INSERT INTO products (name, price) VALUES ('Laptop', 999.99);\n\
             VIEW ghost;\n\
             SELECT name FROM products;\n\
             quit\n\
             VIEW products;\n",
        );
        assert!(out.contains("Query OK, 0 rows affected"));
        assert!(out.contains("row inserted with _id 1"));
        assert!(out.contains("[2100] Table Not Found"));
        assert!(out.contains("| Laptop |"));
        assert!(out.contains("1 row in set"));
        assert!(out.trim_end().ends_with("Bye"));
        assert_eq!(out.matches("row in set").count(), 1);
    }

    #[test]
    fn test_destructive_statements_ask_first() {
        let dir = TempDir::new().unwrap();
        let out = run_script(
            &dir,
            "CREATE TABLE t (a integer);\n\
             INSERT INTO t (a) VALUES (1);\n\
             DELETE FROM t WHERE a = 1;\nn\n\
             DROP TABLE t;\ny\n\
             SHOW TABLES;\n",
        );
        assert!(out.contains("Delete rows from 't' where a = 1? [y/N]"));
        assert!(out.contains("Cancelled"));
        assert!(out.contains("Are you sure you want to drop 't'?"));
        assert!(out.contains("Empty set"));
    }

    #[test]
    fn test_use_switches_database() {
        let dir = TempDir::new().unwrap();
        let out = run_script(&dir, "use shop\nuse ../x\nversion\n");
        assert!(out.contains("Database changed"));
        assert!(out.contains("minidbms:shop> "));
        assert!(out.contains("[3000] Syntax Error"));
        assert!(out.contains(&format!("version: {}", VERSION)));
        assert!(dir.path().join("shop").is_dir());
    }

    #[test]
    fn test_clear_discards_pending_statement() {
        let dir = TempDir::new().unwrap();
        let out = run_script(
            &dir,
            "SELECT *\n\
             clear\n\
             CREATE TABLE t (a integer);\n\
             SHOW TABLES;\n",
        );
        assert!(!out.contains("Syntax Error"));
        assert!(out.contains("Query OK, 0 rows affected"));
        assert!(out.contains("| t "));
    }

    #[test]
    fn test_use_without_name_is_reported() {
        let dir = TempDir::new().unwrap();
        let out = run_script(&dir, "use\n");
        assert!(out.contains("[7000] Invalid Operation: USE must be followed by a database name"));
        assert!(out.contains("minidbms:default> "));
    }
}
