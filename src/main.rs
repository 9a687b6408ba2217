mod autocomplete;
mod builtin;
mod config;
mod editor;
mod parser;
mod path;
mod redirection;
mod runner;
mod shell;
mod terminal;
mod tokenizer;

use crate::config::ShellConfig;
use crate::shell::Shell;

fn main() {
    // Stay quiet unless asked otherwise through RUST_LOG.
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let code = match Shell::new(ShellConfig::from_env()).and_then(|shell| shell.run()) {
        Ok(code) => code,
        Err(e) => {
            log::error!("{}", e);
            eprintln!("{}", e);
            1
        }
    };

    std::process::exit(code);
}
