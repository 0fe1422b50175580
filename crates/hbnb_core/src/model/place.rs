//! Place (rental listing) model.
//!
//! # Invariants
//! - `title` is 1..=100 characters, `description` at most 1000.
//! - `price >= 0`, `latitude` in `[-90, 90]`, `longitude` in `[-180, 180]`.
//! - `amenities` holds distinct identifiers in ascending order.
//! - `owner_id` and amenity membership are checked for existence by the
//!   facade at write time, not here.

use crate::model::base::{AttributeValue, Entity, EntityId, EntityKind, RecordMeta};
use crate::model::validation::{self, ValidationError, LONG_TEXT_MAX_CHARS, TITLE_MAX_CHARS};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Place {
    #[serde(flatten)]
    pub(crate) meta: RecordMeta,
    pub(crate) title: String,
    pub(crate) description: String,
    pub(crate) price: f64,
    pub(crate) latitude: f64,
    pub(crate) longitude: f64,
    pub(crate) owner_id: EntityId,
    pub(crate) amenities: Vec<EntityId>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewPlace {
    pub title: String,
    pub description: String,
    pub price: f64,
    pub latitude: f64,
    pub longitude: f64,
    pub owner_id: EntityId,
    pub amenities: Vec<EntityId>,
}

/// Partial place update. `amenities` replaces the whole set when present.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlacePatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub price: Option<f64>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub owner_id: Option<EntityId>,
    pub amenities: Option<Vec<EntityId>>,
}

impl Place {
    pub fn new(input: &NewPlace) -> Result<Self, ValidationError> {
        Ok(Self {
            meta: RecordMeta::new(),
            title: validate_title(&input.title)?,
            description: validate_description(&input.description)?,
            price: validation::price(input.price)?,
            latitude: validation::latitude(input.latitude)?,
            longitude: validation::longitude(input.longitude)?,
            owner_id: input.owner_id,
            amenities: validate_amenities(&input.amenities)?,
        })
    }

    pub fn update(&mut self, patch: &PlacePatch) -> Result<(), ValidationError> {
        let title = patch.title.as_deref().map(validate_title).transpose()?;
        let description = patch
            .description
            .as_deref()
            .map(validate_description)
            .transpose()?;
        let price = patch.price.map(validation::price).transpose()?;
        let latitude = patch.latitude.map(validation::latitude).transpose()?;
        let longitude = patch.longitude.map(validation::longitude).transpose()?;
        let amenities = patch
            .amenities
            .as_deref()
            .map(validate_amenities)
            .transpose()?;

        if let Some(value) = title {
            self.title = value;
        }
        if let Some(value) = description {
            self.description = value;
        }
        if let Some(value) = price {
            self.price = value;
        }
        if let Some(value) = latitude {
            self.latitude = value;
        }
        if let Some(value) = longitude {
            self.longitude = value;
        }
        if let Some(value) = patch.owner_id {
            self.owner_id = value;
        }
        if let Some(value) = amenities {
            self.amenities = value;
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

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn price(&self) -> f64 {
        self.price
    }

    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    pub fn longitude(&self) -> f64 {
        self.longitude
    }

    pub fn owner_id(&self) -> EntityId {
        self.owner_id
    }

    pub fn amenities(&self) -> &[EntityId] {
        &self.amenities
    }

    pub fn has_amenity(&self, amenity_id: EntityId) -> bool {
        self.amenities.binary_search(&amenity_id).is_ok()
    }
}

fn validate_title(value: &str) -> Result<String, ValidationError> {
    validation::required_text("title", value, TITLE_MAX_CHARS)
}

fn validate_description(value: &str) -> Result<String, ValidationError> {
    validation::bounded_text("description", value, LONG_TEXT_MAX_CHARS)
}

fn validate_amenities(ids: &[EntityId]) -> Result<Vec<EntityId>, ValidationError> {
    validation::id_set("amenities", ids)
}

impl Entity for Place {
    type Patch = PlacePatch;

    const KIND: EntityKind = EntityKind::Place;
    const ATTRIBUTES: &'static [&'static str] = &[
        "id",
        "title",
        "description",
        "price",
        "latitude",
        "longitude",
        "owner_id",
    ];

    fn meta(&self) -> &RecordMeta {
        &self.meta
    }

    fn attribute(&self, name: &str) -> Option<AttributeValue> {
        match name {
            "id" => Some(AttributeValue::Id(self.meta.id)),
            "title" => Some(self.title.clone().into()),
            "description" => Some(self.description.clone().into()),
            "price" => Some(AttributeValue::Real(self.price)),
            "latitude" => Some(AttributeValue::Real(self.latitude)),
            "longitude" => Some(AttributeValue::Real(self.longitude)),
            "owner_id" => Some(AttributeValue::Id(self.owner_id)),
            _ => None,
        }
    }

    fn apply(&mut self, patch: &Self::Patch) -> Result<(), ValidationError> {
        self.update(patch)
    }
}
