use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser as ClapParser;
use job_filter::{Dialect, EngineConfig, FilterEngine, SqlCompiler};
use rustyline::{error::ReadlineError, DefaultEditor};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const DEFAULT_CONFIG_FILE: &str = "job_filter.json";

#[derive(ClapParser)]
#[command(name = "job-filter", version, about = "Compile job listing filter expressions to SQL")]
struct Cli {
    /// JSON config with schema mapping and attribute catalog
    #[arg(long)]
    config: Option<PathBuf>,

    /// postgres, mysql or sqlite
    #[arg(long, value_parser = parse_dialect)]
    dialect: Option<Dialect>,

    /// Compile one filter and exit instead of starting the REPL
    #[arg(long)]
    filter: Option<String>,
}

fn parse_dialect(s: &str) -> Result<Dialect, String> {
    match s.to_ascii_lowercase().as_str() {
        "postgres" | "postgresql" => Ok(Dialect::Postgres),
        "mysql" => Ok(Dialect::Mysql),
        "sqlite" => Ok(Dialect::Sqlite),
        other => Err(format!("unknown dialect '{other}'")),
    }
}

/// 加载配置: 显式路径必须可用, 否则尝试默认文件, 失败时使用默认配置
fn load_config(path: Option<&Path>) -> Result<EngineConfig> {
    if let Some(path) = path {
        return EngineConfig::from_json_file(path)
            .with_context(|| format!("loading config {}", path.display()));
    }

    match EngineConfig::from_json_file(DEFAULT_CONFIG_FILE) {
        Ok(config) => {
            info!(file = DEFAULT_CONFIG_FILE, "loaded config");
            Ok(config)
        }
        Err(e) => {
            warn!("{e}, using default config");
            Ok(EngineConfig::default())
        }
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut config = load_config(cli.config.as_deref())?;
    if let Some(dialect) = cli.dialect {
        config.dialect = dialect;
    }
    info!(
        relations = config.schema.relations.len(),
        attributes = config.attributes.len(),
        dialect = ?config.dialect,
        "engine ready"
    );

    let engine = FilterEngine::new(SqlCompiler::from_config(&config), config.catalog());

    match cli.filter {
        Some(filter) => {
            if !run_filter(&engine, &filter)? {
                std::process::exit(1);
            }
            Ok(())
        }
        None => repl(&engine),
    }
}

fn repl(engine: &FilterEngine) -> Result<()> {
    println!("--- job-filter: filter expression → SQL ---");
    println!("示例: job_type = full-time AND languages HAS_ANY (PHP, Go)");
    println!("Ctrl-D 退出");

    let mut editor = DefaultEditor::new()?;
    loop {
        match editor.readline("filter> ") {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                editor.add_history_entry(line)?;
                run_filter(engine, line)?;
            }
            Err(ReadlineError::Interrupted | ReadlineError::Eof) => break,
            Err(e) => return Err(e.into()),
        }
    }
    Ok(())
}

/// Prints the AST and SQL for `filter`, or the error body. Returns whether it compiled.
fn run_filter(engine: &FilterEngine, filter: &str) -> Result<bool> {
    let outcome = engine
        .parse(filter)
        .and_then(|ast| Ok((engine.compile(ast.as_ref())?, ast)));

    match outcome {
        Ok((compiled, ast)) => {
            match ast {
                Some(ast) => println!("[AST]: {ast}"),
                None => println!("[AST]: <empty>"),
            }
            println!("[SQL]: {}", compiled.sql());
            let (sql, values) = compiled.build();
            println!("[SQL 参数化]: {sql}");
            println!("[参数]: {:?}", values.0);
            Ok(true)
        }
        Err(e) => {
            println!("{}", serde_json::to_string_pretty(&e.to_body())?);
            Ok(false)
        }
    }
}
