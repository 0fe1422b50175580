//! Cascade execution.
//!
//! # Invariants
//! - A cascade either applies completely or leaves every repository as it
//!   found it.
//! - Repositories sharing one `SqliteStore` commit the plan in a single
//!   transaction. Other backends apply it step by step and undo the applied
//!   steps in reverse when one fails.
//! - Callers hold the exclusive gate, so no reader sees the steps or the undo.

use crate::model::PlacePatch;
use crate::repo::{CascadePlan, CascadeStep};
use crate::service::error::CatalogResult;
use crate::service::facade::{retry_transient, CatalogFacade};
use log::{error, warn};

impl CatalogFacade {
    pub(crate) fn apply_cascade(&self, plan: &CascadePlan, event: &'static str) -> CatalogResult<()> {
        match &self.repos.shared_store {
            Some(store) => retry_transient(event, || store.apply_cascade(plan)),
            None => self.apply_with_undo(plan, event),
        }
    }

    fn apply_with_undo(&self, plan: &CascadePlan, event: &'static str) -> CatalogResult<()> {
        let mut applied = Vec::with_capacity(plan.steps().len());
        for step in plan.steps() {
            match self.apply_step(step, event) {
                Ok(true) => applied.push(step),
                Ok(false) => {}
                Err(err) => {
                    warn!(
                        "event={event} module=service status=rollback steps_applied={} error_code={}",
                        applied.len(),
                        err.code()
                    );
                    for done in applied.into_iter().rev() {
                        if let Err(undo_err) = self.undo_step(done, event) {
                            error!(
                                "event={event} module=service status=rollback_failed error_code={}",
                                undo_err.code()
                            );
                        }
                    }
                    return Err(err);
                }
            }
        }
        Ok(())
    }

    /// Returns whether the step changed anything.
    fn apply_step(&self, step: &CascadeStep, event: &'static str) -> CatalogResult<bool> {
        match step {
            CascadeStep::RemoveReview(review) => {
                retry_transient(event, || self.repos.reviews.delete(review.id()))
            }
            CascadeStep::RemovePlace(place) => {
                retry_transient(event, || self.repos.places.delete(place.id()))
            }
            CascadeStep::RemoveUser(user) => {
                retry_transient(event, || self.repos.users.delete(user.id()))
            }
            CascadeStep::RemoveAmenity(amenity) => {
                retry_transient(event, || self.repos.amenities.delete(amenity.id()))
            }
            CascadeStep::DetachAmenity { place, amenity_id } => {
                let patch = CascadeStep::detach_patch(place, *amenity_id);
                let updated =
                    retry_transient(event, || self.repos.places.update(place.id(), &patch))?;
                Ok(updated.is_some())
            }
        }
    }

    fn undo_step(&self, step: &CascadeStep, event: &'static str) -> CatalogResult<()> {
        match step {
            CascadeStep::RemoveReview(review) => {
                retry_transient(event, || self.repos.reviews.add(review.clone()))?;
            }
            CascadeStep::RemovePlace(place) => {
                retry_transient(event, || self.repos.places.add(place.clone()))?;
            }
            CascadeStep::RemoveUser(user) => {
                retry_transient(event, || self.repos.users.add(user.clone()))?;
            }
            CascadeStep::RemoveAmenity(amenity) => {
                retry_transient(event, || self.repos.amenities.add(amenity.clone()))?;
            }
            CascadeStep::DetachAmenity { place, .. } => {
                let patch = PlacePatch {
                    amenities: Some(place.amenities().to_vec()),
                    ..PlacePatch::default()
                };
                retry_transient(event, || self.repos.places.update(place.id(), &patch))?;
            }
        }
        Ok(())
    }
}
