//! Crop listings: farmers post produce for sale, brokers accept or reject.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::AgriMandiError;

/// Contact details of the farmer behind a listing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FarmerContact {
    pub name: String,
    pub phone: String,
    pub email: String,
}

/// What a farmer submits when putting produce up for sale.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListingDraft {
    pub farmer: FarmerContact,
    pub district: String,
    pub state: String,
    pub crop_name: String,
    pub variety: String,
    pub quantity_quintals: f64,
    /// Asking price per quintal in rupees
    pub asking_price: f64,
    pub description: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ListingStatus {
    Pending,
    Accepted,
    Rejected,
}

/// A listing on the board. Status only ever moves out of `Pending`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CropListing {
    pub id: String,
    pub farmer: FarmerContact,
    pub district: String,
    pub state: String,
    pub crop_name: String,
    pub variety: String,
    pub quantity_quintals: f64,
    pub asking_price: f64,
    pub description: String,
    pub status: ListingStatus,
    pub created_at: DateTime<Utc>,
}

/// In-memory listing board with sequential ids.
#[derive(Debug, Default)]
pub struct ListingBook {
    listings: Vec<CropListing>,
    next_id: u64,
}

impl ListingBook {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate and record a new listing. Returns the stored listing.
    pub fn submit(&mut self, draft: ListingDraft) -> crate::Result<CropListing> {
        if draft.farmer.name.trim().is_empty() {
            return Err(AgriMandiError::validation("Farmer name cannot be empty"));
        }
        if draft.crop_name.trim().is_empty() {
            return Err(AgriMandiError::validation("Crop name cannot be empty"));
        }
        if draft.state.trim().is_empty() {
            return Err(AgriMandiError::validation("State cannot be empty"));
        }
        if draft.quantity_quintals <= 0.0 {
            return Err(AgriMandiError::validation(
                "Quantity must be greater than zero",
            ));
        }
        if draft.asking_price <= 0.0 {
            return Err(AgriMandiError::validation(
                "Asking price must be greater than zero",
            ));
        }

        self.next_id += 1;
        let listing = CropListing {
            id: format!("listing-{}", self.next_id),
            farmer: draft.farmer,
            district: draft.district,
            state: draft.state,
            crop_name: draft.crop_name,
            variety: draft.variety,
            quantity_quintals: draft.quantity_quintals,
            asking_price: draft.asking_price,
            description: draft.description,
            status: ListingStatus::Pending,
            created_at: Utc::now(),
        };
        info!(id = %listing.id, crop = %listing.crop_name, "New crop listing submitted");
        self.listings.push(listing.clone());
        Ok(listing)
    }

    /// Accept a pending listing.
    pub fn accept(&mut self, id: &str) -> crate::Result<&CropListing> {
        self.transition(id, ListingStatus::Accepted)
    }

    /// Reject a pending listing.
    pub fn reject(&mut self, id: &str) -> crate::Result<&CropListing> {
        self.transition(id, ListingStatus::Rejected)
    }

    fn transition(&mut self, id: &str, to: ListingStatus) -> crate::Result<&CropListing> {
        let Some(listing) = self.listings.iter_mut().find(|l| l.id == id) else {
            return Err(AgriMandiError::validation(format!(
                "No listing with id '{id}'"
            )));
        };
        if listing.status != ListingStatus::Pending {
            return Err(AgriMandiError::validation(format!(
                "Listing '{id}' has already been decided"
            )));
        }
        listing.status = to;
        info!(id, status = ?to, "Listing status updated");
        Ok(listing)
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<&CropListing> {
        self.listings.iter().find(|l| l.id == id)
    }

    #[must_use]
    pub fn all(&self) -> &[CropListing] {
        &self.listings
    }

    /// Listings for a state, matched case-insensitively.
    #[must_use]
    pub fn for_state(&self, state: &str) -> Vec<&CropListing> {
        let needle = state.to_lowercase();
        self.listings
            .iter()
            .filter(|l| l.state.to_lowercase() == needle)
            .collect()
    }

    /// Listings still waiting on a broker decision.
    #[must_use]
    pub fn pending(&self) -> Vec<&CropListing> {
        self.listings
            .iter()
            .filter(|l| l.status == ListingStatus::Pending)
            .collect()
    }
}
