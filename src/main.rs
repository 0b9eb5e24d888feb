mod environment;
mod expr;
mod generate_ast;
mod interpreter;
mod lox;
mod lox_callable;
mod lox_class;
mod lox_function;
mod lox_instance;
mod lox_result;
mod lox_return;
mod object;
mod parser;
mod pretty_printer;
mod resolver;
mod runtime_error;
mod scanner;
mod stmt;
mod token;
mod token_type;
mod unique_id;

use crate::lox::Lox;

use std::env;
use std::process;

use anyhow::Result;

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<_> = env::args().collect();
    if args.len() != 2 {
        eprintln!("Usage: treelox <script>");
        process::exit(1);
    }

    Lox::new().run_file(&args[1])
}
