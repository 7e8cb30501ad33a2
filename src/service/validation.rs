//! Component batch validation against the type allow-list.

use crate::error::AppError;
use crate::model::{ComponentType, NewComponent};

/// A component as submitted, before its type tag is checked.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ComponentDraft {
    pub index: i32,
    pub kind: String,
    pub text: String,
}

pub struct ComponentValidator;

impl ComponentValidator {
    /// Validate every draft before anything is written. One rejected type rejects the batch;
    /// the error names each offending position.
    pub fn validate(user_id: i32, drafts: &[ComponentDraft]) -> Result<Vec<NewComponent>, AppError> {
        let mut accepted = Vec::with_capacity(drafts.len());
        let mut rejected = Vec::new();
        for (pos, d) in drafts.iter().enumerate() {
            match d.kind.parse::<ComponentType>() {
                Ok(kind) => accepted.push(NewComponent {
                    user_id,
                    index: d.index,
                    kind,
                    text: d.text.clone(),
                }),
                Err(e) => rejected.push(format!("#{}: {}", pos, e)),
            }
        }
        if accepted.len() != drafts.len() {
            return Err(AppError::Validation(format!(
                "component batch rejected ({}); allowed types: {}",
                rejected.join(", "),
                ComponentType::ALL.map(ComponentType::as_str).join(", ")
            )));
        }
        Ok(accepted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft(index: i32, kind: &str) -> ComponentDraft {
        ComponentDraft {
            index,
            kind: kind.into(),
            text: format!("t{}", index),
        }
    }

    #[test]
    fn accepts_a_fully_valid_batch() {
        let out = ComponentValidator::validate(7, &[draft(0, "header"), draft(1, "paragraph")]).unwrap();
        assert_eq!(out.len(), 2);
        assert_eq!(out[1].kind, ComponentType::Paragraph);
        assert!(out.iter().all(|c| c.user_id == 7));
    }

    #[test]
    fn one_bad_type_rejects_everything() {
        let err = ComponentValidator::validate(7, &[draft(0, "header"), draft(1, "bogus"), draft(2, "nope")])
            .unwrap_err();
        assert_eq!(err.kind(), "validation_error");
        let msg = err.to_string();
        assert!(msg.contains("#1: unknown component type 'bogus'"), "{}", msg);
        assert!(msg.contains("#2: unknown component type 'nope'"), "{}", msg);
    }

    #[test]
    fn empty_batch_is_valid() {
        assert!(ComponentValidator::validate(1, &[]).unwrap().is_empty());
    }
}
