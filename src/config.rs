use clap::Parser;
use config::{Config, ConfigError, File};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone)]
pub struct DatasetConfig {
    /// Root of the benchmark dataset layout.
    pub spider_path: String,
    pub dev_filename: String,
    pub tables_filename: String,
    /// Directory holding the per-database files. Defaults to
    /// `<spider_path>/database` when unset.
    pub database_dir: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub pool_size: usize,
}

#[derive(Debug, Deserialize, Clone)]
pub struct EvalSettings {
    pub execution: bool,
    pub timeout_secs: u64,
    pub max_rows: usize,
    pub column_order: String, // "any-permutation" or "exact"
    /// Worker bound for concurrent evaluation; 0 picks the host's
    /// available parallelism.
    pub parallelism: usize,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub dataset: DatasetConfig,
    pub database: DatabaseConfig,
    pub eval: EvalSettings,
}

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct CliArgs {
    /// Predictions file (JSON Lines, one record per example)
    pub predictions: PathBuf,

    /// Path to configuration file
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Root of the benchmark dataset
    #[arg(long)]
    pub spider_path: Option<String>,

    /// Directory holding the per-database files
    #[arg(long)]
    pub database_dir: Option<String>,

    /// Skip execution verification, score structural match only
    #[arg(long)]
    pub no_execution: bool,

    /// Per-query execution deadline, in seconds
    #[arg(long)]
    pub timeout_secs: Option<u64>,

    /// Result-column order policy: "any-permutation" or "exact"
    #[arg(long)]
    pub column_order: Option<String>,

    /// Worker bound for concurrent evaluation (0 = auto)
    #[arg(long)]
    pub parallelism: Option<usize>,

    /// Write the JSON report here in addition to stdout
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,
}

impl AppConfig {
    pub fn new(args: &CliArgs) -> Result<Self, ConfigError> {
        // Start from defaults so the evaluator runs without any file.
        let mut config_builder = Config::builder()
            .set_default("dataset.spider_path", "data/spider")?
            .set_default("dataset.dev_filename", "dev.json")?
            .set_default("dataset.tables_filename", "tables.json")?
            .set_default("database.pool_size", 4)?
            .set_default("eval.execution", true)?
            .set_default("eval.timeout_secs", 30)?
            .set_default("eval.max_rows", 100_000)?
            .set_default("eval.column_order", "any-permutation")?
            .set_default("eval.parallelism", 0)?;

        // Add configuration from file if specified
        if let Some(config_path) = &args.config {
            config_builder = config_builder.add_source(File::from(config_path.as_path()));
        } else {
            // Check for config in default locations
            let default_locations = vec![
                "config.toml",
                "config/config.toml",
                "/etc/sqleval/config.toml",
            ];

            for location in default_locations {
                if Path::new(location).exists() {
                    config_builder =
                        config_builder.add_source(File::new(location, config::FileFormat::Toml));
                    break;
                }
            }
        }

        let mut config: AppConfig = config_builder.build()?.try_deserialize()?;

        // Override with command line args if provided
        if let Some(spider_path) = &args.spider_path {
            config.dataset.spider_path = spider_path.clone();
        }
        if let Some(database_dir) = &args.database_dir {
            config.dataset.database_dir = Some(database_dir.clone());
        }
        if args.no_execution {
            config.eval.execution = false;
        }
        if let Some(timeout_secs) = args.timeout_secs {
            config.eval.timeout_secs = timeout_secs;
        }
        if let Some(column_order) = &args.column_order {
            config.eval.column_order = column_order.clone();
        }
        if let Some(parallelism) = args.parallelism {
            config.eval.parallelism = parallelism;
        }

        Ok(config)
    }

    pub fn database_dir(&self) -> PathBuf {
        match &self.dataset.database_dir {
            Some(dir) => PathBuf::from(dir),
            None => Path::new(&self.dataset.spider_path).join("database"),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            dataset: DatasetConfig {
                spider_path: "data/spider".to_string(),
                dev_filename: "dev.json".to_string(),
                tables_filename: "tables.json".to_string(),
                database_dir: None,
            },
            database: DatabaseConfig { pool_size: 4 },
            eval: EvalSettings {
                execution: true,
                timeout_secs: 30,
                max_rows: 100_000,
                column_order: "any-permutation".to_string(),
                parallelism: 0,
            },
        }
    }
}
