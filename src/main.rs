use std::fs::File;
use std::io::BufReader;
use std::io::Read;
use std::path::PathBuf;
use std::process::ExitCode;

use treelox as lox;

use clap::Parser as ClapParser;
use clap::Subcommand;

use lox::ast_printer::AstPrinter;
use lox::error::LoxError;
use lox::interpreter::Interpreter;
use lox::parser::Parser;
use lox::resolver::Resolver;
use lox::scanner::Scanner;
use lox::stmt::Stmt;
use lox::token::Token;

/// Lex/parse/resolve errors exit with 65, runtime errors with 70.
const EXIT_COMPILE_ERROR: u8 = 65;
const EXIT_RUNTIME_ERROR: u8 = 70;

#[derive(ClapParser, Debug)]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    commands: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Tokenizes the provided input from a given valid filepath
    Tokenize { filename: PathBuf },

    /// Parses the provided input and prints the program in prefix form
    Parse { filename: PathBuf },

    /// Runs the provided program; the filepath defaults to main.lox
    Run { filename: Option<PathBuf> },
}

fn read_source(filename: &PathBuf) -> anyhow::Result<Vec<u8>> {
    let mut buf: Vec<u8> = Vec::new();
    let mut reader: BufReader<File> = BufReader::new(File::open(filename)?);

    reader.read_to_end(&mut buf)?;

    Ok(buf)
}

fn scan(buf: &[u8]) -> (Vec<Token>, Vec<LoxError>) {
    let mut tokens: Vec<Token> = Vec::new();
    let mut errors: Vec<LoxError> = Vec::new();

    for result in Scanner::new(buf) {
        match result {
            Ok(token) => tokens.push(token),

            Err(e) => errors.push(e),
        }
    }

    (tokens, errors)
}

fn parse_source(buf: &[u8]) -> Result<Vec<Stmt>, Vec<LoxError>> {
    let (tokens, errors) = scan(buf);

    if !errors.is_empty() {
        return Err(errors);
    }

    Parser::new(tokens).parse()
}

fn report(errors: &[LoxError]) {
    for error in errors {
        eprintln!("{}", error);
    }
}

fn main() -> anyhow::Result<ExitCode> {
    env_logger::init();

    let args: Cli = Cli::parse();

    match args.commands {
        Commands::Tokenize { filename } => {
            let buf: Vec<u8> = read_source(&filename)?;

            let (tokens, errors) = scan(&buf);

            report(&errors);

            for token in &tokens {
                println!("{}", token);
            }

            if !errors.is_empty() {
                return Ok(ExitCode::from(EXIT_COMPILE_ERROR));
            }
        }

        Commands::Parse { filename } => {
            let buf: Vec<u8> = read_source(&filename)?;

            match parse_source(&buf) {
                Ok(statements) => {
                    println!("{}", AstPrinter::print_program(&statements));
                }

                Err(errors) => {
                    report(&errors);
                    return Ok(ExitCode::from(EXIT_COMPILE_ERROR));
                }
            }
        }

        Commands::Run { filename } => {
            let filename: PathBuf = filename.unwrap_or_else(|| PathBuf::from("main.lox"));
            let buf: Vec<u8> = read_source(&filename)?;

            let statements: Vec<Stmt> = match parse_source(&buf) {
                Ok(statements) => statements,

                Err(errors) => {
                    report(&errors);
                    return Ok(ExitCode::from(EXIT_COMPILE_ERROR));
                }
            };

            let locals = match Resolver::new().resolve(&statements) {
                Ok(locals) => locals,

                Err(e) => {
                    eprintln!("{}", e);
                    return Ok(ExitCode::from(EXIT_COMPILE_ERROR));
                }
            };

            if let Err(e) = Interpreter::new().interpret(&statements, locals) {
                eprintln!("{}", e);
                return Ok(ExitCode::from(EXIT_RUNTIME_ERROR));
            }
        }
    }

    Ok(ExitCode::SUCCESS)
}
