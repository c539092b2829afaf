//! The statement language of the shell: a small SQL dialect limited to
//! equality conjunctions.
pub mod parser;
pub mod statement;
pub mod tokenizer;
pub mod validator;
