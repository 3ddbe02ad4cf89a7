//! Question answering handler
//!
//! Retrieves the answer context and hands it to the generation model.
//! The retrieval core decides what the context is; this handler only
//! formats it into the expert prompt and relays the generated answer.

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use std::time::Instant;
use validator::Validate;

use crate::AppState;
use rsge_common::errors::{AppError, Result};
use rsge_common::metrics;
use rsge_search::Document;

/// Answer returned when retrieval finds no relevant context
const NO_CONTEXT_ANSWER: &str = "ინფორმაცია ვერ მოიძებნა.";

/// Incoming question
#[derive(Debug, Deserialize, Validate)]
pub struct AskRequest {
    #[validate(length(min = 1, max = 4000))]
    pub text: String,
}

/// Generated answer with its source case numbers
#[derive(Debug, Serialize)]
pub struct AskResponse {
    pub answer: String,
    pub sources: Vec<String>,
}

/// Answer a question against the decision corpus
pub async fn ask(
    State(state): State<AppState>,
    Json(request): Json<AskRequest>,
) -> Result<Json<AskResponse>> {
    request.validate().map_err(|e| AppError::Validation {
        message: e.to_string(),
        field: Some("text".to_string()),
    })?;

    let retrieval = state.engine.retrieve(&request.text).await?;

    if retrieval.is_empty() {
        return Ok(Json(AskResponse {
            answer: NO_CONTEXT_ANSWER.to_string(),
            sources: Vec::new(),
        }));
    }

    let (context, sources) = format_context(&retrieval.documents);
    let prompt = build_prompt(&context, &request.text);

    let started = Instant::now();
    let answer = state.generator.generate(&prompt).await?;
    metrics::record_question(
        started.elapsed().as_secs_f64(),
        state.generator.model_name(),
    );

    tracing::info!(
        strategy = retrieval.strategy.as_str(),
        sources = sources.len(),
        generation_ms = started.elapsed().as_millis() as u64,
        "Question answered"
    );

    Ok(Json(AskResponse { answer, sources }))
}

/// Render the context block and collect unique source case numbers in
/// first-appearance order.
fn format_context(documents: &[Document]) -> (String, Vec<String>) {
    let mut parts = Vec::with_capacity(documents.len());
    let mut sources: Vec<String> = Vec::new();

    for document in documents {
        let source = document.case_number.as_deref().unwrap_or("Unknown");
        if !sources.iter().any(|s| s == source) {
            sources.push(source.to_string());
        }
        parts.push(format!("[წყარო: {}]\n{}", source, document.content));
    }

    (parts.join("\n\n---\n\n"), sources)
}

/// The expert prompt handed to the generation model
fn build_prompt(context: &str, question: &str) -> String {
    format!(
        "შენ ხარ RS.ge-ს საგადასახადო ექსპერტი. უპასუხე კითხვას მოცემული კონტექსტის საფუძველზე.\n\
         კონტექსტი შეიცავს ოფიციალურ გადაწყვეტილებებს.\n\n\
         წესები:\n\
         1. თუ კითხვა ეხება კონკრეტულ ნომერს, გამოიყენე მხოლოდ ამ ნომრის მქონე წყარო.\n\
         2. იყავი მაქსიმალურად ზუსტი ციფრებში და თარიღებში.\n\
         3. თუ კონტექსტიდან გამომდინარე საჩივარი არ დაკმაყოფილდა, მკაფიოდ ახსენი მიზეზი.\n\n\
         კონტექსტი:\n{}\n\nკითხვა: {}",
        context, question
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn doc(content: &str, case_number: Option<&str>) -> Document {
        Document {
            id: Uuid::new_v4(),
            content: content.to_string(),
            case_number: case_number.map(|s| s.to_string()),
        }
    }

    #[test]
    fn test_format_context_sources_deduped() {
        let documents = vec![
            doc("პირველი", Some("4521")),
            doc("მეორე", Some("4521")),
            doc("მესამე", None),
        ];

        let (context, sources) = format_context(&documents);

        assert_eq!(sources, vec!["4521".to_string(), "Unknown".to_string()]);
        assert!(context.contains("[წყარო: 4521]\nპირველი"));
        assert!(context.contains("\n\n---\n\n"));
    }

    #[test]
    fn test_prompt_carries_context_and_question() {
        let prompt = build_prompt("კონტექსტის ტექსტი", "რა მოხდა?");
        assert!(prompt.contains("კონტექსტის ტექსტი"));
        assert!(prompt.ends_with("კითხვა: რა მოხდა?"));
    }
}
