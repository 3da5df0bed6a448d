//! Workflow runner
//!
//! Drives one question-answering run: generate, validate, execute, decide.
//! Bounded retries, a single fallback escalation to the simplified
//! raw-rows strategy, then a terminal answer either way. The collaborators
//! are injected traits; this loop is the only sequencing in the crate.

use super::error_feedback::{feedback_for_outcome, final_error_message};
use super::routing::{RouteDecider, RouteDecision};
use super::state::{AttemptState, ExecutionOutcome, StepOutcome, WorkflowPhase};
use crate::config::WorkflowConfig;
use crate::db::ExecutionEngine;
use crate::error::{Result, WardenError};
use crate::llm::TextGenerator;
use crate::prompts;
use crate::schema::AllowedTables;
use crate::validation::{validate, validate_user_question, ValidationOutcome};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

/// Everything a caller gets back from one run.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub run_id: Uuid,
    pub question: String,
    pub sql: Option<String>,
    pub rows_json: Option<String>,
    pub answer: String,
    pub attempts: u32,
    pub fallback_used: bool,
    pub succeeded: bool,
    pub started_at: DateTime<Utc>,
    pub elapsed_ms: u64,
}

pub struct WorkflowRunner {
    generator: Arc<dyn TextGenerator>,
    engine: Arc<dyn ExecutionEngine>,
    allowed: AllowedTables,
    schema_prompt: String,
    config: WorkflowConfig,
}

impl WorkflowRunner {
    pub fn new(
        generator: Arc<dyn TextGenerator>,
        engine: Arc<dyn ExecutionEngine>,
        allowed: AllowedTables,
        schema_prompt: String,
        config: WorkflowConfig,
    ) -> Self {
        Self {
            generator,
            engine,
            allowed,
            schema_prompt,
            config,
        }
    }

    /// Answer one question. Always returns a report; only infrastructure
    /// failures (generator transport, input validation) surface as `Err`.
    pub async fn answer(&self, question: &str) -> Result<RunReport> {
        let question = validate_user_question(question, self.config.max_question_len)?;
        let run_id = Uuid::new_v4();
        let started_at = Utc::now();
        let clock = std::time::Instant::now();

        let mut state = AttemptState::new();
        let mut fallback_mode = false;
        let mut feedback: Option<String> = None;
        let mut attempts = 0u32;
        let mut last_sql: Option<String> = None;

        // Retries plus one fallback escalation: any failure sequence is
        // decided within 2 * max_retries + 2 steps.
        let decision_bound = 2 * self.config.max_retries + 2;

        for _ in 0..decision_bound {
            attempts += 1;
            info!(
                %run_id,
                attempt = attempts,
                phase = ?WorkflowPhase::Generating,
                fallback = fallback_mode,
                "generating candidate SQL"
            );

            let mut prompt = if fallback_mode {
                prompts::simplified_sql_prompt(&self.schema_prompt, &question)
            } else {
                prompts::sql_generation_prompt(&self.schema_prompt, &question)
            };
            if let Some(ref extra) = feedback {
                prompt.push_str(extra);
            }

            let raw = self.generator.complete(&prompt).await?;
            let sql = prompts::extract_sql(&raw);
            last_sql = Some(sql.clone());

            let outcome = match validate(&sql, &self.allowed) {
                ValidationOutcome::Accepted => {
                    info!(%run_id, phase = ?WorkflowPhase::Executing, "executing validated query");
                    match self.engine.run_query(&sql).await {
                        Ok(rows) => {
                            let row_count = rows.len();
                            let rows_json = serde_json::to_string(&rows)?;
                            StepOutcome::Execution(ExecutionOutcome::Success {
                                rows_json,
                                row_count,
                            })
                        }
                        Err(e) => {
                            StepOutcome::Execution(ExecutionOutcome::Failed(format!("Error: {}", e)))
                        }
                    }
                }
                rejected => {
                    warn!(
                        %run_id,
                        detail = rejected.detail().unwrap_or_default(),
                        "candidate query rejected"
                    );
                    StepOutcome::Validation(rejected)
                }
            };

            match RouteDecider::decide(&state, Some(&outcome), self.config.max_retries) {
                RouteDecision::Accept => {
                    let (rows_json, row_count) = match &outcome {
                        StepOutcome::Execution(ExecutionOutcome::Success {
                            rows_json,
                            row_count,
                        }) => (rows_json.clone(), *row_count),
                        _ => ("[]".to_string(), 0),
                    };
                    let answer = self.render_answer(&question, &rows_json, row_count).await;
                    info!(
                        %run_id,
                        attempts,
                        phase = ?WorkflowPhase::Accepted,
                        rows = row_count,
                        "run finished"
                    );
                    return Ok(RunReport {
                        run_id,
                        question,
                        sql: last_sql,
                        rows_json: Some(rows_json),
                        answer,
                        attempts,
                        fallback_used: fallback_mode,
                        succeeded: true,
                        started_at,
                        elapsed_ms: clock.elapsed().as_millis() as u64,
                    });
                }
                RouteDecision::Retry => {
                    feedback =
                        feedback_for_outcome(&outcome, Some(sql.as_str()), &self.allowed, &self.config);
                    warn!(
                        %run_id,
                        retry = state.retry_count + 1,
                        phase = ?WorkflowPhase::Retrying,
                        "retrying with targeted feedback"
                    );
                    state.record(outcome);
                }
                RouteDecision::Fallback => {
                    info!(
                        %run_id,
                        phase = ?WorkflowPhase::FallbackTriggered,
                        "max retries reached, switching to simplified raw-rows generation"
                    );
                    state.enter_fallback();
                    fallback_mode = true;
                    feedback = None;
                }
                RouteDecision::GiveUp => {
                    let answer = final_error_message(Some(&outcome));
                    warn!(%run_id, attempts, phase = ?WorkflowPhase::GivenUp, "run gave up");
                    return Ok(RunReport {
                        run_id,
                        question,
                        sql: last_sql,
                        rows_json: None,
                        answer,
                        attempts,
                        fallback_used: fallback_mode,
                        succeeded: false,
                        started_at,
                        elapsed_ms: clock.elapsed().as_millis() as u64,
                    });
                }
            }
        }

        // Unreachable while decide() honors its bound; kept as a hard stop.
        Err(WardenError::Workflow(format!(
            "retry loop exceeded its decision bound of {}",
            decision_bound
        )))
    }

    async fn render_answer(&self, question: &str, rows_json: &str, row_count: usize) -> String {
        if row_count == 0 {
            return "No data found for your question. Please try a different query.".to_string();
        }
        let prompt = prompts::answer_prompt(question, rows_json);
        match self.generator.complete(&prompt).await {
            Ok(raw) => prompts::extract_answer(&raw),
            Err(e) => {
                warn!("answer generation failed: {}, returning raw rows", e);
                rows_json.to_string()
            }
        }
    }
}
