use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use product_tables::script::Script;
use product_tables::{CompatConfig, ProductTables, mapping};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "product-tables")]
#[command(about = "Developer tooling for the product tables metadata layer")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List the metadata keys stored in product tables
    Keys,
    /// Run a JSON script of metadata calls against a fresh in-memory store
    Run {
        script: PathBuf,
        /// Print the tables after the last step
        #[arg(long)]
        dump: bool,
        /// Fail multi-statement writes on the first failing statement
        #[arg(long)]
        strict: bool,
        /// Leave every key to legacy storage
        #[arg(long)]
        disable_bw_compat: bool,
        #[arg(long)]
        prefix: Option<String>,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Keys => list_keys(),
        Command::Run {
            script,
            dump,
            strict,
            disable_bw_compat,
            prefix,
        } => {
            let mut config = CompatConfig::from_env();
            if strict {
                config = config.strict_writes(true);
            }
            if disable_bw_compat {
                config = config.enable_backward_compatibility(false);
            }
            if let Some(prefix) = prefix {
                config = config.table_prefix(&prefix);
            }
            run_script(&script, config, dump)
        }
    }
}

fn list_keys() -> Result<()> {
    for (key, mapped) in mapping().iter() {
        let reset = mapped
            .delete
            .value
            .as_ref()
            .map(|value| value.to_string())
            .unwrap_or_default();
        println!("{:<26} {:<34} delete -> {}", key, mapped.handler.to_string(), reset);
    }
    Ok(())
}

fn run_script(path: &Path, config: CompatConfig, dump: bool) -> Result<()> {
    let script = Script::from_path(path).with_context(|| format!("failed to load {}", path.display()))?;
    let (tables, outcomes) = script
        .run_fresh(config)
        .with_context(|| format!("failed to run {}", path.display()))?;

    for outcome in &outcomes {
        println!("{}", serde_json::to_string(outcome).context("failed to encode outcome")?);
    }

    if dump {
        dump_tables(&tables)?;
    }
    Ok(())
}

fn dump_tables(tables: &ProductTables) -> Result<()> {
    use product_tables::storage::{Select, Statement};

    for name in tables.storage().list_tables() {
        println!("\n== {} ==", name);
        tables
            .storage()
            .execute(&Statement::Select(Select::from(&name)))
            .with_context(|| format!("failed to read {}", name))?
            .print();
    }
    Ok(())
}
