//! The evaluation pipeline: parse and resolve both queries, extract
//! canonical components, score the structural match, classify hardness
//! on the gold query, optionally verify by execution, and fold
//! everything into the report.
//!
//! Gold-side failures are fatal for the whole run; the benchmark data
//! is trusted and a bad gold query means a setup problem. Predicted-
//! side failures of any kind score as a non-match and the run goes on.

pub mod components;
pub mod exec;
pub mod hardness;
pub mod matcher;
pub mod report;
pub mod resolve;

use std::collections::HashMap;
use std::error::Error;
use std::fmt;
use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, info};

use crate::dataset::schema::Schema;
use crate::eval::components::{extract, ComponentSet};
use crate::eval::exec::{verify, ExecOptions, ExecutionError, QueryExecutor};
use crate::eval::hardness::Hardness;
use crate::eval::matcher::{score, MatchResult};
use crate::eval::report::{Aggregator, EvaluationReport};
use crate::eval::resolve::resolve;
use crate::sql;

#[derive(Debug)]
pub enum EvalError {
    UnknownDatabase {
        index: usize,
        db_id: String,
    },
    GoldParse {
        index: usize,
        source: sql::ParseError,
    },
    GoldResolve {
        index: usize,
        source: resolve::ResolveError,
    },
    GoldExecution {
        index: usize,
        source: ExecutionError,
    },
    Internal(String),
}

impl fmt::Display for EvalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EvalError::UnknownDatabase { index, db_id } => {
                write!(f, "example {}: no schema for database {:?}", index, db_id)
            }
            EvalError::GoldParse { index, source } => {
                write!(f, "example {}: gold query failed to parse: {}", index, source)
            }
            EvalError::GoldResolve { index, source } => {
                write!(f, "example {}: gold query failed to resolve: {}", index, source)
            }
            EvalError::GoldExecution { index, source } => {
                write!(f, "example {}: gold query failed to execute: {}", index, source)
            }
            EvalError::Internal(msg) => write!(f, "internal error: {}", msg),
        }
    }
}

impl Error for EvalError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            EvalError::GoldParse { source, .. } => Some(source),
            EvalError::GoldResolve { source, .. } => Some(source),
            EvalError::GoldExecution { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// One prediction paired with its gold reference.
#[derive(Debug, Clone)]
pub struct EvalExample {
    pub index: usize,
    pub db_id: String,
    pub gold_sql: String,
    pub pred_sql: String,
}

#[derive(Debug, Clone)]
pub struct ExampleOutcome {
    pub index: usize,
    pub hardness: Hardness,
    pub result: MatchResult,
    /// `None` when execution verification was disabled.
    pub exec_matched: Option<bool>,
}

#[derive(Debug, Clone)]
pub struct EvalOptions {
    pub execution: bool,
    pub exec: ExecOptions,
    pub parallelism: usize,
}

impl Default for EvalOptions {
    fn default() -> Self {
        Self {
            execution: true,
            exec: ExecOptions::default(),
            parallelism: std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(4),
        }
    }
}

#[derive(Clone)]
pub struct Evaluator {
    schemas: Arc<HashMap<String, Schema>>,
    executor: Option<Arc<dyn QueryExecutor>>,
    opts: EvalOptions,
}

impl Evaluator {
    pub fn new(
        schemas: Arc<HashMap<String, Schema>>,
        executor: Option<Arc<dyn QueryExecutor>>,
        opts: EvalOptions,
    ) -> Self {
        Self {
            schemas,
            executor,
            opts,
        }
    }

    /// Scores a single example. Only gold-side problems surface as
    /// errors; a prediction that fails to parse, resolve, or execute
    /// scores zero on every occupied category.
    pub async fn evaluate_example(&self, example: &EvalExample) -> Result<ExampleOutcome, EvalError> {
        let schema = self
            .schemas
            .get(&example.db_id)
            .ok_or_else(|| EvalError::UnknownDatabase {
                index: example.index,
                db_id: example.db_id.clone(),
            })?;

        let gold_ast = sql::parse(&example.gold_sql).map_err(|source| EvalError::GoldParse {
            index: example.index,
            source,
        })?;
        let gold_ordered = gold_ast.is_ordered();
        let gold_resolved = resolve(gold_ast, schema).map_err(|source| EvalError::GoldResolve {
            index: example.index,
            source,
        })?;
        let gold_components = extract(&gold_resolved);
        let hardness = hardness::classify(&gold_resolved);

        let result = self.score_prediction(example, schema, &gold_components);

        // Execution runs on the raw SQL text, so a prediction outside
        // the parser's dialect subset can still earn execution credit.
        let exec_matched = match (&self.executor, self.opts.execution) {
            (Some(executor), true) => {
                let verdict = verify(
                    executor,
                    &example.db_id,
                    &example.pred_sql,
                    &example.gold_sql,
                    gold_ordered,
                    &self.opts.exec,
                )
                .await
                .map_err(|source| EvalError::GoldExecution {
                    index: example.index,
                    source,
                })?;
                Some(verdict.matched)
            }
            _ => None,
        };

        Ok(ExampleOutcome {
            index: example.index,
            hardness,
            result,
            exec_matched,
        })
    }

    fn score_prediction(
        &self,
        example: &EvalExample,
        schema: &Schema,
        gold: &ComponentSet,
    ) -> MatchResult {
        let ast = match sql::parse(&example.pred_sql) {
            Ok(ast) => ast,
            Err(err) => {
                debug!(index = example.index, %err, "predicted query failed to parse");
                return MatchResult::non_match(gold);
            }
        };
        let resolved = match resolve(ast, schema) {
            Ok(resolved) => resolved,
            Err(err) => {
                debug!(index = example.index, %err, "predicted query failed to resolve");
                return MatchResult::non_match(gold);
            }
        };
        score(&extract(&resolved), gold)
    }

    /// Evaluates every example with bounded parallelism and folds the
    /// outcomes into a report. The first gold-side error aborts the
    /// remaining work.
    pub async fn run(&self, examples: Vec<EvalExample>) -> Result<EvaluationReport, EvalError> {
        let total = examples.len();
        let semaphore = Arc::new(Semaphore::new(self.opts.parallelism.max(1)));
        let mut tasks = JoinSet::new();
        for example in examples {
            let evaluator = self.clone();
            let semaphore = Arc::clone(&semaphore);
            tasks.spawn(async move {
                let _permit = semaphore
                    .acquire_owned()
                    .await
                    .map_err(|e| EvalError::Internal(e.to_string()))?;
                evaluator.evaluate_example(&example).await
            });
        }

        let mut aggregator = Aggregator::new();
        let mut done = 0usize;
        while let Some(joined) = tasks.join_next().await {
            let outcome = match joined {
                Ok(Ok(outcome)) => outcome,
                Ok(Err(err)) => {
                    tasks.abort_all();
                    return Err(err);
                }
                Err(join_err) => {
                    tasks.abort_all();
                    return Err(EvalError::Internal(join_err.to_string()));
                }
            };
            aggregator.fold(outcome.hardness, &outcome.result, outcome.exec_matched);
            done += 1;
            if done % 100 == 0 {
                info!(done, total, "evaluation progress");
            }
        }
        info!(total, "evaluation complete");
        Ok(aggregator.finalize())
    }
}
