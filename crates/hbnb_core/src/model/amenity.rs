//! Amenity model. Amenities relate to places many-to-many and own nothing.

use crate::model::base::{AttributeValue, Entity, EntityId, EntityKind, RecordMeta};
use crate::model::validation::{self, ValidationError, NAME_MAX_CHARS};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Amenity {
    #[serde(flatten)]
    pub(crate) meta: RecordMeta,
    pub(crate) name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AmenityPatch {
    pub name: Option<String>,
}

impl Amenity {
    pub fn new(name: &str) -> Result<Self, ValidationError> {
        Ok(Self {
            meta: RecordMeta::new(),
            name: validate_name(name)?,
        })
    }

    pub fn update(&mut self, patch: &AmenityPatch) -> Result<(), ValidationError> {
        if let Some(name) = patch.name.as_deref() {
            self.name = validate_name(name)?;
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

    pub fn name(&self) -> &str {
        &self.name
    }
}

fn validate_name(value: &str) -> Result<String, ValidationError> {
    validation::required_text("name", value, NAME_MAX_CHARS)
}

impl Entity for Amenity {
    type Patch = AmenityPatch;

    const KIND: EntityKind = EntityKind::Amenity;
    const ATTRIBUTES: &'static [&'static str] = &["id", "name"];

    fn meta(&self) -> &RecordMeta {
        &self.meta
    }

    fn attribute(&self, name: &str) -> Option<AttributeValue> {
        match name {
            "id" => Some(AttributeValue::Id(self.meta.id)),
            "name" => Some(self.name.clone().into()),
            _ => None,
        }
    }

    fn apply(&mut self, patch: &Self::Patch) -> Result<(), ValidationError> {
        self.update(patch)
    }
}

#[cfg(test)]
mod tests {
    use super::{Amenity, AmenityPatch};

    #[test]
    fn empty_patch_only_touches_updated_at() {
        let mut amenity = Amenity::new("Wifi").unwrap();
        let before = amenity.clone();

        amenity.update(&AmenityPatch::default()).unwrap();

        assert_eq!(amenity.name(), before.name());
        assert_eq!(amenity.meta().id(), before.meta().id());
        assert_eq!(amenity.meta().created_at(), before.meta().created_at());
        assert!(amenity.meta().updated_at() > before.meta().updated_at());
    }
}
