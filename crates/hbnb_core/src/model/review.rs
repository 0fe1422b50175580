//! Review model.
//!
//! # Invariants
//! - `text` is 1..=1000 characters, `rating` is an integer in `1..=5`.
//! - Several reviews by the same user for the same place are allowed.

use crate::model::base::{AttributeValue, Entity, EntityId, EntityKind, RecordMeta};
use crate::model::validation::{self, ValidationError, LONG_TEXT_MAX_CHARS};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Review {
    #[serde(flatten)]
    pub(crate) meta: RecordMeta,
    pub(crate) text: String,
    pub(crate) rating: i32,
    pub(crate) user_id: EntityId,
    pub(crate) place_id: EntityId,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewReview {
    pub text: String,
    pub rating: i32,
    pub user_id: EntityId,
    pub place_id: EntityId,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReviewPatch {
    pub text: Option<String>,
    pub rating: Option<i32>,
    pub user_id: Option<EntityId>,
    pub place_id: Option<EntityId>,
}

impl Review {
    pub fn new(input: &NewReview) -> Result<Self, ValidationError> {
        Ok(Self {
            meta: RecordMeta::new(),
            text: validate_text(&input.text)?,
            rating: validation::rating(input.rating)?,
            user_id: input.user_id,
            place_id: input.place_id,
        })
    }

    pub fn update(&mut self, patch: &ReviewPatch) -> Result<(), ValidationError> {
        let text = patch.text.as_deref().map(validate_text).transpose()?;
        let rating = patch.rating.map(validation::rating).transpose()?;

        if let Some(value) = text {
            self.text = value;
        }
        if let Some(value) = rating {
            self.rating = value;
        }
        if let Some(value) = patch.user_id {
            self.user_id = value;
        }
        if let Some(value) = patch.place_id {
            self.place_id = value;
        }
        self.meta.touch();
        Ok(())
    }

    pub fn meta(&self) -> &RecordMeta {
        &self.meta
    }

    pub fn id(&self) -> EntityId {
        self.meta.id
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn rating(&self) -> i32 {
        self.rating
    }

    pub fn user_id(&self) -> EntityId {
        self.user_id
    }

    pub fn place_id(&self) -> EntityId {
        self.place_id
    }
}

fn validate_text(value: &str) -> Result<String, ValidationError> {
    validation::required_text("text", value, LONG_TEXT_MAX_CHARS)
}

impl Entity for Review {
    type Patch = ReviewPatch;

    const KIND: EntityKind = EntityKind::Review;
    const ATTRIBUTES: &'static [&'static str] = &["id", "text", "rating", "user_id", "place_id"];

    fn meta(&self) -> &RecordMeta {
        &self.meta
    }

    fn attribute(&self, name: &str) -> Option<AttributeValue> {
        match name {
            "id" => Some(AttributeValue::Id(self.meta.id)),
            "text" => Some(self.text.clone().into()),
            "rating" => Some(AttributeValue::Integer(i64::from(self.rating))),
            "user_id" => Some(AttributeValue::Id(self.user_id)),
            "place_id" => Some(AttributeValue::Id(self.place_id)),
            _ => None,
        }
    }

    fn apply(&mut self, patch: &Self::Patch) -> Result<(), ValidationError> {
        self.update(patch)
    }
}

#[cfg(test)]
mod tests {
    use super::{NewReview, Review, ReviewPatch};
    use crate::model::validation::ValidationKind;
    use uuid::Uuid;

    fn draft(rating: i32) -> NewReview {
        NewReview {
            text: "Lovely stay".to_string(),
            rating,
            user_id: Uuid::new_v4(),
            place_id: Uuid::new_v4(),
        }
    }

    #[test]
    fn rating_boundaries() {
        for rating in [1, 3, 5] {
            assert_eq!(Review::new(&draft(rating)).unwrap().rating(), rating);
        }
        for rating in [0, 6] {
            let err = Review::new(&draft(rating)).unwrap_err();
            assert_eq!(err.field, "rating");
            assert_eq!(err.kind, ValidationKind::OutOfRange);
        }
    }

    #[test]
    fn update_rejects_blank_text() {
        let mut review = Review::new(&draft(4)).unwrap();
        let err = review
            .update(&ReviewPatch {
                text: Some("   ".to_string()),
                ..ReviewPatch::default()
            })
            .unwrap_err();
        assert_eq!(err.kind, ValidationKind::Required);
        assert_eq!(review.text(), "Lovely stay");
    }
}
