use clap::Parser;

#[derive(Parser)]
#[command(name = "paren", about = "Paren: a toy Lisp with a language server")]
struct Cli {
    /// File to interpret
    file: Option<String>,

    /// Speak the language server protocol over stdio
    #[arg(long)]
    language_server: bool,
}

fn main() {
    let cli = Cli::parse();

    if cli.language_server {
        if let Err(e) = paren_lsp::run_server() {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
        return;
    }

    if let Some(file) = &cli.file {
        // TODO: wire up the interpreter once evaluation lands.
        eprintln!("paren: interpreting {file} is not implemented yet");
        std::process::exit(1);
    }

    eprintln!("usage: paren [--language-server | FILE]");
    std::process::exit(2);
}
