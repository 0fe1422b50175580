//! Multi-entity removal plans.
//!
//! # Responsibility
//! - Describe a cascade as an ordered list of steps built before any write.
//! - Carry a snapshot of every touched entity so a non-transactional backend
//!   can put it back.
//!
//! # Invariants
//! - Steps are ordered children-first.
//! - An entity appears in at most one removal step.

use crate::model::{Amenity, EntityId, Place, PlacePatch, Review, User};
use std::collections::HashSet;

/// One write inside a cascade.
#[derive(Debug, Clone, PartialEq)]
pub enum CascadeStep {
    RemoveReview(Review),
    RemovePlace(Place),
    RemoveUser(User),
    RemoveAmenity(Amenity),
    /// Drops `amenity_id` from `place`'s amenity set. `place` is the state
    /// before the step.
    DetachAmenity { place: Place, amenity_id: EntityId },
}

impl CascadeStep {
    /// Patch applied by a `DetachAmenity` step.
    pub fn detach_patch(place: &Place, amenity_id: EntityId) -> PlacePatch {
        PlacePatch {
            amenities: Some(
                place
                    .amenities()
                    .iter()
                    .copied()
                    .filter(|id| *id != amenity_id)
                    .collect(),
            ),
            ..PlacePatch::default()
        }
    }
}

/// Ordered cascade, applied as one unit by the facade.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CascadePlan {
    steps: Vec<CascadeStep>,
    removed: HashSet<EntityId>,
}

impl CascadePlan {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn steps(&self) -> &[CascadeStep] {
        &self.steps
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Queues a review removal. Returns `false` when it is already queued.
    pub fn remove_review(&mut self, review: Review) -> bool {
        if !self.removed.insert(review.id()) {
            return false;
        }
        self.steps.push(CascadeStep::RemoveReview(review));
        true
    }

    pub fn remove_place(&mut self, place: Place) -> bool {
        if !self.removed.insert(place.id()) {
            return false;
        }
        self.steps.push(CascadeStep::RemovePlace(place));
        true
    }

    pub fn remove_user(&mut self, user: User) -> bool {
        if !self.removed.insert(user.id()) {
            return false;
        }
        self.steps.push(CascadeStep::RemoveUser(user));
        true
    }

    pub fn remove_amenity(&mut self, amenity: Amenity) -> bool {
        if !self.removed.insert(amenity.id()) {
            return false;
        }
        self.steps.push(CascadeStep::RemoveAmenity(amenity));
        true
    }

    pub fn detach_amenity(&mut self, place: Place, amenity_id: EntityId) {
        self.steps
            .push(CascadeStep::DetachAmenity { place, amenity_id });
    }

    /// Number of queued review removals.
    pub fn reviews_removed(&self) -> usize {
        self.count(|step| matches!(step, CascadeStep::RemoveReview(_)))
    }

    pub fn places_removed(&self) -> usize {
        self.count(|step| matches!(step, CascadeStep::RemovePlace(_)))
    }

    pub fn places_detached(&self) -> usize {
        self.count(|step| matches!(step, CascadeStep::DetachAmenity { .. }))
    }

    fn count(&self, keep: impl Fn(&CascadeStep) -> bool) -> usize {
        self.steps.iter().filter(|step| keep(step)).count()
    }
}

#[cfg(test)]
mod tests {
    use super::{CascadePlan, CascadeStep};
    use crate::model::{Amenity, NewPlace, NewReview, Place, Review};
    use uuid::Uuid;

    fn place(amenities: Vec<Uuid>) -> Place {
        Place::new(&NewPlace {
            title: "Loft".to_string(),
            description: String::new(),
            price: 80.0,
            latitude: 0.0,
            longitude: 0.0,
            owner_id: Uuid::new_v4(),
            amenities,
        })
        .unwrap()
    }

    #[test]
    fn a_review_is_queued_once() {
        let review = Review::new(&NewReview {
            text: "Fine".to_string(),
            rating: 4,
            user_id: Uuid::new_v4(),
            place_id: Uuid::new_v4(),
        })
        .unwrap();

        let mut plan = CascadePlan::new();
        assert!(plan.remove_review(review.clone()));
        assert!(!plan.remove_review(review));
        assert_eq!(plan.reviews_removed(), 1);
        assert_eq!(plan.steps().len(), 1);
    }

    #[test]
    fn detach_patch_keeps_the_other_amenities() {
        let wifi = Amenity::new("Wifi").unwrap();
        let pool = Amenity::new("Pool").unwrap();
        let place = place(vec![wifi.id(), pool.id()]);

        let patch = CascadeStep::detach_patch(&place, wifi.id());
        assert_eq!(patch.amenities, Some(vec![pool.id()]));
        assert!(patch.title.is_none());
    }
}
