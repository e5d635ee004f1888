use clap::{Parser, Subcommand};
use ptbflow::collab::SignatureSnapshot;
use ptbflow::prelude::*;
use std::fs;
use tracing_subscriber::EnvFilter;

/// Compile, lower and decode programmable-transaction graphs
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: CliCommand,
}

#[derive(Subcommand, Debug)]
enum CliCommand {
    /// Print the IR of a saved document
    Compile {
        /// Path to the document JSON file
        document: String,
        /// Also write the program as a binary artifact
        #[arg(long)]
        artifact: Option<String>,
    },
    /// Print TypeScript source for a saved document
    Emit {
        document: String,
        #[command(flatten)]
        options: LoweringArgs,
    },
    /// Print the transaction JSON for a saved document
    Build {
        document: String,
        #[command(flatten)]
        options: LoweringArgs,
    },
    /// Turn a transaction JSON file back into a document
    Decode {
        /// Path to the transaction JSON file
        transaction: String,
        /// Signature snapshot JSON used to type moveCall ports
        #[arg(short, long)]
        signatures: Option<String>,
        /// Chain identifier recorded in the document
        #[arg(long, default_value = "sui:mainnet")]
        chain: String,
    },
    /// List structural issues in a saved document
    Validate { document: String },
}

#[derive(clap::Args, Debug)]
struct LoweringArgs {
    /// Sender address, overriding the document's
    #[arg(long)]
    sender: Option<String>,
    #[arg(long)]
    gas_budget: Option<u64>,
}

impl LoweringArgs {
    fn resolve(&self, document: &PtbDocument) -> ExecOptions {
        let mut options = document.exec_options();
        if let Some(sender) = &self.sender {
            options.sender = Some(sender.clone());
        }
        options.gas_budget = self.gas_budget.or(options.gas_budget);
        options
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        CliCommand::Compile { document, artifact } => {
            let document = load_document(&document);
            let program = compile(&document);
            print!("{}", program);
            if let Some(path) = artifact {
                program.save(&path).unwrap_or_else(|e| {
                    exit_with_error(&format!("Failed to write artifact: {}", e))
                });
                eprintln!("Wrote artifact to {}", path);
            }
        }
        CliCommand::Emit { document, options } => {
            let document = load_document(&document);
            let program = compile(&document);
            let source = emit_source(&program, &options.resolve(&document))
                .unwrap_or_else(|e| exit_with_error(&format!("Lowering failed: {}", e)));
            print!("{}", source.code);
        }
        CliCommand::Build { document, options } => {
            let document = load_document(&document);
            let program = compile(&document);
            let tx = build_transaction(&program, &options.resolve(&document))
                .unwrap_or_else(|e| exit_with_error(&format!("Lowering failed: {}", e)));
            let json = tx.to_json().unwrap_or_else(|e| {
                exit_with_error(&format!("Failed to serialize transaction: {}", e))
            });
            println!("{}", json);
        }
        CliCommand::Decode {
            transaction,
            signatures,
            chain,
        } => {
            let json = read_file(&transaction);
            let tx = Transaction::from_json(&json).unwrap_or_else(|e| {
                exit_with_error(&format!("Failed to parse transaction JSON: {}", e))
            });
            let snapshot: SignatureSnapshot = match signatures {
                Some(path) => serde_json::from_str(&read_file(&path)).unwrap_or_else(|e| {
                    exit_with_error(&format!("Failed to parse signatures JSON: {}", e))
                }),
                None => SignatureSnapshot::new(),
            };

            let decoded = Decoder::new(&tx).with_signatures(&snapshot).decode();
            for diagnostic in &decoded.diagnostics {
                eprintln!("{}", diagnostic);
            }
            let mut document = PtbDocument::new(chain, decoded.graph).with_signatures(snapshot);
            document.sender = decoded.options.sender;
            let json = document.to_json().unwrap_or_else(|e| {
                exit_with_error(&format!("Failed to serialize document: {}", e))
            });
            println!("{}", json);
        }
        CliCommand::Validate { document } => {
            let document = load_document(&document);
            let issues = validate(&document.graph);
            if issues.is_empty() {
                println!("No issues found.");
            }
            for issue in &issues {
                println!("{}", issue);
            }
            if !issues.is_empty() {
                std::process::exit(2);
            }
        }
    }
}

fn read_file(path: &str) -> String {
    fs::read_to_string(path)
        .unwrap_or_else(|e| exit_with_error(&format!("Failed to read file '{}': {}", path, e)))
}

fn load_document(path: &str) -> PtbDocument {
    PtbDocument::load(path)
        .unwrap_or_else(|e| exit_with_error(&format!("Failed to load document '{}': {}", path, e)))
}

fn compile(document: &PtbDocument) -> Program {
    Compiler::builder(&document.graph)
        .build()
        .compile()
        .unwrap_or_else(|e| exit_with_error(&format!("Compilation failed: {}", e)))
}

fn exit_with_error(message: &str) -> ! {
    eprintln!("\nError: {}", message);
    std::process::exit(1);
}
