//! Amenity operations. Amenities are not owned by anything; deleting one
//! detaches it from every place that lists it.

use crate::model::{Amenity, AmenityPatch, EntityId, EntityKind};
use crate::repo::CascadePlan;
use crate::service::error::{CatalogError, CatalogResult};
use crate::service::facade::{require, retry_transient, CatalogFacade};
use log::info;

impl CatalogFacade {
    pub fn create_amenity(&self, name: &str) -> CatalogResult<Amenity> {
        let _gate = self.shared_gate();
        let amenity = Amenity::new(name)?;
        let stored = retry_transient("amenity_create", || self.repos.amenities.add(amenity.clone()))?;
        info!(
            "event=amenity_create module=service status=ok amenity_id={}",
            stored.id()
        );
        Ok(stored)
    }

    pub fn get_amenity(&self, amenity_id: EntityId) -> CatalogResult<Option<Amenity>> {
        let _gate = self.shared_gate();
        retry_transient("amenity_get", || self.repos.amenities.get(amenity_id))
    }

    pub fn get_all_amenities(&self) -> CatalogResult<Vec<Amenity>> {
        let _gate = self.shared_gate();
        retry_transient("amenity_list", || self.repos.amenities.get_all())
    }

    pub fn update_amenity(
        &self,
        amenity_id: EntityId,
        patch: &AmenityPatch,
    ) -> CatalogResult<Amenity> {
        let _gate = self.shared_gate();
        let mut preview = require(self.repos.amenities.as_ref(), "amenity_update", amenity_id)?;
        preview.update(patch)?;

        let updated = retry_transient("amenity_update", || {
            self.repos.amenities.update(amenity_id, patch)
        })?
        .ok_or(CatalogError::not_found(EntityKind::Amenity, amenity_id))?;
        info!("event=amenity_update module=service status=ok amenity_id={amenity_id}");
        Ok(updated)
    }

    /// Removes the amenity from every place's set, then deletes it.
    ///
    /// Returns `false` when the amenity does not exist.
    pub fn delete_amenity(&self, amenity_id: EntityId) -> CatalogResult<bool> {
        let _gate = self.exclusive_gate();
        let Some(amenity) =
            retry_transient("amenity_delete", || self.repos.amenities.get(amenity_id))?
        else {
            return Ok(false);
        };

        let mut plan = CascadePlan::new();
        let places = retry_transient("amenity_delete", || self.repos.places.get_all())?;
        for place in places.into_iter().filter(|place| place.has_amenity(amenity_id)) {
            plan.detach_amenity(place, amenity_id);
        }
        plan.remove_amenity(amenity);

        self.apply_cascade(&plan, "amenity_delete")?;
        info!(
            "event=amenity_delete module=service status=ok amenity_id={amenity_id} places_detached={}",
            plan.places_detached()
        );
        Ok(true)
    }
}
