//! Review operations.

use crate::model::{AttributeValue, EntityId, EntityKind, NewReview, Review, ReviewPatch};
use crate::service::error::{CatalogError, CatalogResult};
use crate::service::facade::{ensure_reference, require, retry_transient, CatalogFacade};
use log::info;

impl CatalogFacade {
    /// Creates a review once the rating and text are valid and both the
    /// author and the place exist. Repeated reviews of one place by the same
    /// user are accepted.
    pub fn create_review(&self, input: &NewReview) -> CatalogResult<Review> {
        let _gate = self.shared_gate();
        let review = Review::new(input)?;
        ensure_reference(self.repos.users.as_ref(), "review_create", review.user_id())?;
        ensure_reference(self.repos.places.as_ref(), "review_create", review.place_id())?;

        let stored = retry_transient("review_create", || self.repos.reviews.add(review.clone()))?;
        info!(
            "event=review_create module=service status=ok review_id={} place_id={} rating={}",
            stored.id(),
            stored.place_id(),
            stored.rating()
        );
        Ok(stored)
    }

    pub fn get_review(&self, review_id: EntityId) -> CatalogResult<Option<Review>> {
        let _gate = self.shared_gate();
        retry_transient("review_get", || self.repos.reviews.get(review_id))
    }

    pub fn get_all_reviews(&self) -> CatalogResult<Vec<Review>> {
        let _gate = self.shared_gate();
        retry_transient("review_list", || self.repos.reviews.get_all())
    }

    /// Lists a place's reviews in creation order.
    ///
    /// # Errors
    /// - `NotFound` when the place does not exist. An existing place without
    ///   reviews yields `Ok(vec![])`.
    pub fn get_reviews_by_place(&self, place_id: EntityId) -> CatalogResult<Vec<Review>> {
        let _gate = self.shared_gate();
        require(self.repos.places.as_ref(), "review_list_by_place", place_id)?;
        retry_transient("review_list_by_place", || {
            self.repos
                .reviews
                .find_by_attribute("place_id", &AttributeValue::Id(place_id))
        })
    }

    /// Applies a partial update, re-checking any supplied author or place.
    pub fn update_review(&self, review_id: EntityId, patch: &ReviewPatch) -> CatalogResult<Review> {
        let _gate = self.shared_gate();
        let mut preview = require(self.repos.reviews.as_ref(), "review_update", review_id)?;
        preview.update(patch)?;

        if let Some(user_id) = patch.user_id {
            ensure_reference(self.repos.users.as_ref(), "review_update", user_id)?;
        }
        if let Some(place_id) = patch.place_id {
            ensure_reference(self.repos.places.as_ref(), "review_update", place_id)?;
        }

        let updated = retry_transient("review_update", || {
            self.repos.reviews.update(review_id, patch)
        })?
        .ok_or(CatalogError::not_found(EntityKind::Review, review_id))?;
        info!("event=review_update module=service status=ok review_id={review_id}");
        Ok(updated)
    }

    /// Returns `false` when the review does not exist.
    pub fn delete_review(&self, review_id: EntityId) -> CatalogResult<bool> {
        let _gate = self.shared_gate();
        let deleted = retry_transient("review_delete", || self.repos.reviews.delete(review_id))?;
        if deleted {
            info!("event=review_delete module=service status=ok review_id={review_id}");
        }
        Ok(deleted)
    }
}
