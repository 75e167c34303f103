//! Modal questionnaire flow
//!
//! `Closed -> Open -> Closed`. At most one questionnaire is open at a time;
//! while open, normal interaction is suspended and game time is frozen by the
//! session. An empty (whitespace-only) answer is rejected and the flow stays
//! open so the UI can re-prompt.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::world::EntityId;

/// Question payload bound to one interactive entity
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Questionnaire {
    pub question_text: String,
    /// Kept for the record; answers are not graded
    pub correct_answer: String,
    pub options: Vec<String>,
    /// Key the answer is filed under for external submission
    pub submission_key: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FlowError {
    #[error("a questionnaire is already open for entity {0}")]
    AlreadyOpen(EntityId),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubmitError {
    #[error("answer is empty")]
    EmptyAnswer,
    #[error("no questionnaire is open")]
    NotOpen,
}

/// An accepted answer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerRecord {
    pub entity: EntityId,
    pub submission_key: String,
    pub answer: String,
}

/// Flow state
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum FlowState {
    #[default]
    Closed,
    Open {
        entity: EntityId,
        questionnaire: Questionnaire,
    },
}

#[derive(Debug, Clone, Default)]
pub struct QuestionnaireFlow {
    state: FlowState,
    answers: Vec<AnswerRecord>,
}

impl QuestionnaireFlow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &FlowState {
        &self.state
    }

    #[inline]
    pub fn is_open(&self) -> bool {
        matches!(self.state, FlowState::Open { .. })
    }

    /// Entity whose questionnaire is currently shown
    pub fn open_entity(&self) -> Option<EntityId> {
        match &self.state {
            FlowState::Open { entity, .. } => Some(*entity),
            FlowState::Closed => None,
        }
    }

    /// Question text currently shown
    pub fn prompt(&self) -> Option<&str> {
        match &self.state {
            FlowState::Open { questionnaire, .. } => Some(&questionnaire.question_text),
            FlowState::Closed => None,
        }
    }

    /// Accepted answers, oldest first
    pub fn answers(&self) -> &[AnswerRecord] {
        &self.answers
    }

    pub fn open(&mut self, entity: EntityId, questionnaire: Questionnaire) -> Result<(), FlowError> {
        if let Some(current) = self.open_entity() {
            return Err(FlowError::AlreadyOpen(current));
        }
        log::info!("Questionnaire opened for {}: {}", entity, questionnaire.question_text);
        self.state = FlowState::Open {
            entity,
            questionnaire,
        };
        Ok(())
    }

    /// Validate and accept an answer, closing the flow
    pub fn submit(&mut self, raw_answer: &str) -> Result<AnswerRecord, SubmitError> {
        let FlowState::Open { entity, questionnaire } = &self.state else {
            return Err(SubmitError::NotOpen);
        };

        let answer = raw_answer.trim();
        if answer.is_empty() {
            log::warn!("Player submitted an empty answer for {}", entity);
            return Err(SubmitError::EmptyAnswer);
        }

        let record = AnswerRecord {
            entity: *entity,
            submission_key: questionnaire.submission_key.clone(),
            answer: answer.to_string(),
        };
        self.state = FlowState::Closed;
        self.answers.push(record.clone());
        log::info!("Questionnaire for {} answered", record.entity);
        Ok(record)
    }
}
