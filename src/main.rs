use clap::Parser;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

mod config;
mod dataset;
mod db;
mod eval;
mod sql;
mod util;

use crate::config::{AppConfig, CliArgs};
use crate::dataset::predictions::load_predictions;
use crate::dataset::spider::SpiderDataset;
use crate::dataset::DatasetError;
use crate::db::registry::DatabaseRegistry;
use crate::eval::exec::{ColumnOrderPolicy, ExecOptions, QueryExecutor};
use crate::eval::{EvalExample, EvalOptions, Evaluator};
use crate::util::logging::init_tracing;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    init_tracing();

    // Parse command line arguments
    let args = CliArgs::parse();

    // Load configuration
    let config = match AppConfig::new(&args) {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };

    // Load the benchmark dataset (gold queries and schemas)
    let spider_path = Path::new(&config.dataset.spider_path);
    info!("Loading benchmark dataset from {}", spider_path.display());
    let dataset = SpiderDataset::load(
        spider_path,
        &config.dataset.dev_filename,
        &config.dataset.tables_filename,
    )?;
    info!("Loaded {} gold examples", dataset.examples().len());

    // Load the predictions to score
    info!("Loading predictions from {}", args.predictions.display());
    let predictions = load_predictions(&args.predictions)?;
    if predictions.len() != dataset.examples().len() {
        warn!(
            "Prediction count ({}) differs from gold example count ({})",
            predictions.len(),
            dataset.examples().len()
        );
    }

    // Pair predictions with gold references. Records that omit the gold
    // query or database id fall back to the dev example at their index.
    let mut examples = Vec::with_capacity(predictions.len());
    for (index, record) in predictions.into_iter().enumerate() {
        let reference = dataset.examples().get(index);
        let gold_sql = if record.gold_sql.is_empty() {
            match reference {
                Some(r) => r.gold_sql.clone(),
                None => {
                    return Err(DatasetError::Malformed(format!(
                        "prediction {} has no gold query and no dev example at that index",
                        index
                    ))
                    .into());
                }
            }
        } else {
            record.gold_sql
        };
        let db_id = if record.db_id.is_empty() {
            match reference {
                Some(r) => r.db_id.clone(),
                None => {
                    return Err(DatasetError::Malformed(format!(
                        "prediction {} has no database id and no dev example at that index",
                        index
                    ))
                    .into());
                }
            }
        } else {
            record.db_id
        };
        examples.push(EvalExample {
            index,
            db_id,
            gold_sql,
            pred_sql: record.pred_sql,
        });
    }

    // Execution verification runs against pooled read-only databases
    let executor: Option<Arc<dyn QueryExecutor>> = if config.eval.execution {
        let database_dir = config.database_dir();
        if !database_dir.is_dir() {
            warn!(
                "Database directory {} not found; disabling execution verification",
                database_dir.display()
            );
            None
        } else {
            info!("Executing against databases under {}", database_dir.display());
            Some(Arc::new(DatabaseRegistry::new(
                database_dir,
                config.database.pool_size as u32,
            )))
        }
    } else {
        info!("Execution verification disabled, scoring structural match only");
        None
    };

    let column_order: ColumnOrderPolicy = config.eval.column_order.parse()?;
    let opts = EvalOptions {
        execution: executor.is_some(),
        exec: ExecOptions {
            timeout: Duration::from_secs(config.eval.timeout_secs),
            max_rows: config.eval.max_rows,
            column_order,
        },
        parallelism: if config.eval.parallelism == 0 {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(4)
        } else {
            config.eval.parallelism
        },
    };

    let schemas: HashMap<_, _> = dataset.into_schemas().into_iter().collect();
    let evaluator = Evaluator::new(Arc::new(schemas), executor, opts);

    info!("Evaluating {} predictions", examples.len());
    let report = evaluator.run(examples).await?;

    let json = serde_json::to_string_pretty(&report)?;
    if let Some(output) = &args.output {
        std::fs::write(output, &json)?;
        info!("Report written to {}", output.display());
    }
    println!("{}", json);

    if let Some(exact) = report.overall.exact_match {
        info!(
            "Exact match {:.3} over {} examples",
            exact, report.total
        );
    }
    if let Some(execution) = report.overall.execution_match {
        info!("Execution match {:.3}", execution);
    }

    Ok(())
}
