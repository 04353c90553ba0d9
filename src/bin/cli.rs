//! hexkv CLI Client
//!
//! Command-line interface for talking to a hexkv server.

use clap::{Parser, Subcommand};
use hexkv::protocol::Response;
use hexkv::{Client, EngineKind};

/// hexkv CLI
#[derive(Parser, Debug)]
#[command(name = "hexkv-cli")]
#[command(about = "CLI for the hexkv key-value store")]
struct Args {
    /// Server address
    #[arg(short, long, default_value = "127.0.0.1:9096")]
    server: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Insert a new key
    Set {
        key: String,
        value: String,
        /// Engine: array, rb, b, sh, dh, sk
        #[arg(short, long, default_value = "array")]
        engine: String,
    },

    /// Get a value by key
    Get {
        key: String,
        #[arg(short, long, default_value = "array")]
        engine: String,
    },

    /// Delete a key
    Del {
        key: String,
        #[arg(short, long, default_value = "array")]
        engine: String,
    },

    /// Number of keys in an engine
    Count {
        #[arg(short, long, default_value = "array")]
        engine: String,
    },

    /// Check whether a key is present
    Exist {
        key: String,
        #[arg(short, long, default_value = "array")]
        engine: String,
    },

    /// Send a protocol line verbatim, e.g. `raw "RBSET k v"`
    Raw { line: String },
}

fn run(args: Args) -> hexkv::Result<String> {
    let mut client = Client::connect(&args.server)?;

    let response = match args.command {
        Commands::Raw { line } => return client.request_raw(&line),
        Commands::Set { key, value, engine } => {
            client.set(EngineKind::from_name(&engine)?, key.as_bytes(), value.as_bytes())?
        }
        Commands::Get { key, engine } => client.get(EngineKind::from_name(&engine)?, key.as_bytes())?,
        Commands::Del { key, engine } => {
            client.delete(EngineKind::from_name(&engine)?, key.as_bytes())?
        }
        Commands::Count { engine } => client.count(EngineKind::from_name(&engine)?)?,
        Commands::Exist { key, engine } => {
            client.exist(EngineKind::from_name(&engine)?, key.as_bytes())?
        }
    };

    Ok(render(&response))
}

fn render(response: &Response) -> String {
    match response {
        Response::Ok => "OK".to_string(),
        Response::AlreadyExists => "(already exists)".to_string(),
        Response::Value(value) => String::from_utf8_lossy(value).into_owned(),
        Response::NoSuchKey => "(nil)".to_string(),
        Response::Count(n) => format!("(integer) {n}"),
        Response::True => "true".to_string(),
        Response::False => "false".to_string(),
        Response::Error => "(error) command rejected".to_string(),
    }
}

fn main() {
    let args = Args::parse();

    match run(args) {
        Ok(output) => println!("{output}"),
        Err(e) => {
            eprintln!("error: {e}");
            std::process::exit(1);
        }
    }
}
