//! Place operations and the place cascade.
//!
//! # Invariants
//! - `owner_id` and every amenity id resolve at write time.
//! - Deleting a place deletes its reviews first, as one unit.
//! - Authorization is the caller's concern; the facade deletes when asked.

use crate::model::{
    Amenity, AttributeValue, EntityId, EntityKind, NewPlace, Place, PlacePatch, Review, User,
};
use crate::repo::CascadePlan;
use crate::service::error::{CatalogError, CatalogResult};
use crate::service::facade::{ensure_reference, require, retry_transient, CatalogFacade};
use log::info;
use serde::Serialize;

/// A place with its owner, amenities and reviews resolved.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlaceDetails {
    pub place: Place,
    pub owner: Option<User>,
    pub amenities: Vec<Amenity>,
    pub reviews: Vec<Review>,
}

impl CatalogFacade {
    /// Creates a place once fields are valid and the owner and every amenity exist.
    ///
    /// # Errors
    /// - `Validation` for field rules (checked first).
    /// - `MissingDependency` for an unknown owner or amenity; nothing is stored.
    pub fn create_place(&self, input: &NewPlace) -> CatalogResult<Place> {
        let _gate = self.shared_gate();
        let place = Place::new(input)?;
        self.ensure_place_references(place.owner_id(), place.amenities(), "place_create")?;

        let stored = retry_transient("place_create", || self.repos.places.add(place.clone()))?;
        info!(
            "event=place_create module=service status=ok place_id={} owner_id={} amenity_count={}",
            stored.id(),
            stored.owner_id(),
            stored.amenities().len()
        );
        Ok(stored)
    }

    pub fn get_place(&self, place_id: EntityId) -> CatalogResult<Option<Place>> {
        let _gate = self.shared_gate();
        retry_transient("place_get", || self.repos.places.get(place_id))
    }

    pub fn get_all_places(&self) -> CatalogResult<Vec<Place>> {
        let _gate = self.shared_gate();
        retry_transient("place_list", || self.repos.places.get_all())
    }

    /// Resolves a place together with its owner, amenities and reviews.
    ///
    /// # Errors
    /// - `NotFound` when the place does not exist.
    pub fn get_place_with_details(&self, place_id: EntityId) -> CatalogResult<PlaceDetails> {
        let _gate = self.shared_gate();
        let place = require(self.repos.places.as_ref(), "place_details", place_id)?;
        let owner = retry_transient("place_details", || self.repos.users.get(place.owner_id()))?;

        let mut amenities = Vec::with_capacity(place.amenities().len());
        for amenity_id in place.amenities() {
            if let Some(amenity) =
                retry_transient("place_details", || self.repos.amenities.get(*amenity_id))?
            {
                amenities.push(amenity);
            }
        }
        let reviews = retry_transient("place_details", || {
            self.repos
                .reviews
                .find_by_attribute("place_id", &AttributeValue::Id(place_id))
        })?;

        Ok(PlaceDetails {
            place,
            owner,
            amenities,
            reviews,
        })
    }

    /// Applies a partial update. A new owner and a replacement amenity set
    /// are re-checked for existence.
    pub fn update_place(&self, place_id: EntityId, patch: &PlacePatch) -> CatalogResult<Place> {
        let _gate = self.shared_gate();
        let mut preview = require(self.repos.places.as_ref(), "place_update", place_id)?;
        preview.update(patch)?;

        if let Some(owner_id) = patch.owner_id {
            ensure_reference(self.repos.users.as_ref(), "place_update", owner_id)?;
        }
        if patch.amenities.is_some() {
            for amenity_id in preview.amenities() {
                ensure_reference(self.repos.amenities.as_ref(), "place_update", *amenity_id)?;
            }
        }

        let updated = retry_transient("place_update", || self.repos.places.update(place_id, patch))?
            .ok_or(CatalogError::not_found(EntityKind::Place, place_id))?;
        info!("event=place_update module=service status=ok place_id={place_id}");
        Ok(updated)
    }

    /// Deletes a place and its reviews. Returns `false` when it does not exist.
    pub fn delete_place(&self, place_id: EntityId) -> CatalogResult<bool> {
        let _gate = self.exclusive_gate();
        let Some(place) = retry_transient("place_delete", || self.repos.places.get(place_id))?
        else {
            return Ok(false);
        };

        let mut plan = CascadePlan::new();
        self.plan_place_removal(place, &mut plan, "place_delete")?;
        self.apply_cascade(&plan, "place_delete")?;
        info!(
            "event=place_delete module=service status=ok place_id={place_id} reviews_removed={}",
            plan.reviews_removed()
        );
        Ok(true)
    }

    /// Queues the place's reviews, then the place. Callers hold the
    /// exclusive gate.
    pub(crate) fn plan_place_removal(
        &self,
        place: Place,
        plan: &mut CascadePlan,
        event: &'static str,
    ) -> CatalogResult<()> {
        let reviews = retry_transient(event, || {
            self.repos
                .reviews
                .find_by_attribute("place_id", &AttributeValue::Id(place.id()))
        })?;
        for review in reviews {
            plan.remove_review(review);
        }
        plan.remove_place(place);
        Ok(())
    }

    fn ensure_place_references(
        &self,
        owner_id: EntityId,
        amenity_ids: &[EntityId],
        event: &'static str,
    ) -> CatalogResult<()> {
        ensure_reference(self.repos.users.as_ref(), event, owner_id)?;
        for amenity_id in amenity_ids {
            ensure_reference(self.repos.amenities.as_ref(), event, *amenity_id)?;
        }
        Ok(())
    }
}
