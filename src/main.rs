pub mod ast;
pub mod cli;
pub mod codegen;
pub mod parse;
pub mod plan;
pub mod policy;
pub mod validate;

use colored::Colorize;

fn main() {
    let command_line_interface = cli::CommandLineInterface::load();
    if let Err(error) = command_line_interface.run() {
        eprintln!("{} {error:#}", "error:".red().bold());
        std::process::exit(1);
    }
}
