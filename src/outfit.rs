use std::collections::BTreeSet;

use chrono::{DateTime, Utc};

use crate::{
    draft::{PlacementItem, SlotPlacement},
    error::{GarbError, GarbResult},
};

/// One entry of a persisted outfit. An outfit's items are either all `Free`
/// or all `Slot` for its entire lifetime; mixing the two is rejected by
/// [`Outfit::validate`].
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutfitItem {
    Free(PlacementItem),
    Slot(SlotPlacement),
}

/// A finished outfit as handed to the persistence bridge. The preview is
/// always regenerated from `items` at save time; it is never edited
/// independently.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct Outfit {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_id: Option<String>,
    pub items: Vec<OutfitItem>,
    /// PNG-encoded flattened preview.
    pub preview_png: Vec<u8>,
    pub created_at: DateTime<Utc>,
}

impl Outfit {
    pub fn validate(&self) -> GarbResult<()> {
        if self.name.trim().is_empty() {
            return Err(GarbError::validation("outfit name must be non-empty"));
        }
        if self.items.is_empty() {
            return Err(GarbError::validation(
                "outfit must contain at least one item",
            ));
        }

        let free = self
            .items
            .iter()
            .filter(|i| matches!(i, OutfitItem::Free(_)))
            .count();
        let slotted = self.items.len() - free;
        if free > 0 && slotted > 0 {
            return Err(GarbError::validation(format!(
                "outfit '{}' mixes free-form and slot items",
                self.id
            )));
        }

        let mut seen = BTreeSet::new();
        for item in &self.items {
            if let OutfitItem::Slot(s) = item
                && !seen.insert(s.slot)
            {
                return Err(GarbError::validation(format!(
                    "outfit '{}' assigns slot '{}' more than once",
                    self.id,
                    s.slot.as_str()
                )));
            }
        }

        Ok(())
    }
}
