use clap::{Parser, Subcommand};
use tokio::io::{stdin, stdout};
use tower_lsp_server::{LspService, Server};
use ts_semantic_ls::classification::{Classification, Legend, TokenModifier};
use ts_semantic_ls::lsp::TsSemanticLs;

/// A Language Server Protocol (LSP) server providing semantic tokens from tsserver
#[derive(Parser)]
#[command(name = "ts-semantic-ls")]
#[command(version)]
#[command(about = "An LSP server providing semantic tokens from tsserver")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the semantic token legend advertised to clients as JSON
    Legend,
    /// Decode raw tsserver classification values
    Decode {
        /// Classification values as returned by encodedSemanticClassifications-full
        #[arg(required = true)]
        values: Vec<u32>,
    },
}

fn describe(value: u32) -> String {
    match Classification::from_raw(value) {
        Classification::Packed {
            token_type,
            modifiers,
        } => {
            let names: Vec<&str> = TokenModifier::from_mask(modifiers)
                .into_iter()
                .map(TokenModifier::name)
                .collect();
            if names.is_empty() {
                format!("{value}: {}", token_type.name())
            } else {
                format!("{value}: {} [{}]", token_type.name(), names.join(", "))
            }
        }
        Classification::Legacy(legacy, token_type) => {
            format!("{value}: {} (legacy {:?})", token_type.name(), legacy)
        }
        Classification::Unrecognized(_) => format!("{value}: unrecognized"),
    }
}

#[tokio::main]
async fn main() {
    // stdout carries the protocol, so logs go to stderr
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"))
        .target(env_logger::Target::Stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Legend) => match serde_json::to_string_pretty(&Legend::new()) {
            Ok(json) => println!("{json}"),
            Err(e) => {
                eprintln!("Error: {}", e);
                std::process::exit(1);
            }
        },
        Some(Commands::Decode { values }) => {
            for value in values {
                println!("{}", describe(value));
            }
        }
        None => {
            let stdin = stdin();
            let stdout = stdout();

            let (service, socket) = LspService::new(TsSemanticLs::new);
            Server::new(stdin, stdout, socket).serve(service).await;
        }
    }
}
