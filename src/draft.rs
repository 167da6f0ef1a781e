use std::collections::BTreeMap;
use std::str::FromStr;

use crate::{
    article::ArticleRegistry,
    error::{GarbError, GarbResult},
    outfit::{Outfit, OutfitItem},
};

/// Side length of the logical bounding box every free-form item occupies.
pub const ITEM_BOX: f64 = 80.0;

/// The fixed slot enumeration. No other keys are valid.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum SlotKey {
    Head,
    Jacket,
    Body,
    Legs,
    Feet,
    Accessory,
}

impl SlotKey {
    /// Display (and compositing draw) order: head row, then
    /// jacket | body | accessory, then legs, then feet.
    pub const DISPLAY_ORDER: [SlotKey; 6] = [
        SlotKey::Head,
        SlotKey::Jacket,
        SlotKey::Body,
        SlotKey::Accessory,
        SlotKey::Legs,
        SlotKey::Feet,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            SlotKey::Head => "head",
            SlotKey::Jacket => "jacket",
            SlotKey::Body => "body",
            SlotKey::Legs => "legs",
            SlotKey::Feet => "feet",
            SlotKey::Accessory => "accessory",
        }
    }
}

impl FromStr for SlotKey {
    type Err = GarbError;

    fn from_str(s: &str) -> GarbResult<Self> {
        match s {
            "head" => Ok(SlotKey::Head),
            "jacket" => Ok(SlotKey::Jacket),
            "body" => Ok(SlotKey::Body),
            "legs" => Ok(SlotKey::Legs),
            "feet" => Ok(SlotKey::Feet),
            "accessory" => Ok(SlotKey::Accessory),
            other => Err(GarbError::invalid_slot(other)),
        }
    }
}

/// A free-form placed item. `x`/`y` are the stored top-left of the
/// [`ITEM_BOX`] square, in canvas-local pixels.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct PlacementItem {
    pub id: String,
    pub article_id: String,
    pub x: f64,
    pub y: f64,
}

/// A slot occupant in a persisted outfit.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct SlotPlacement {
    pub slot: SlotKey,
    pub article_id: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlacementMode {
    FreeForm,
    Slots,
}

/// Single source of truth for an in-progress outfit, in one of two mutually
/// exclusive placement modes. Created empty when the builder view is entered,
/// or pre-populated from a stored outfit when editing.
#[derive(Clone, Debug, Default, serde::Serialize, serde::Deserialize)]
pub struct OutfitDraft {
    free_items: Vec<PlacementItem>,
    slots: BTreeMap<SlotKey, String>,
    last_mode: Option<PlacementMode>,
    #[serde(default)]
    next_item_seq: u64,
}

impl OutfitDraft {
    pub fn new() -> Self {
        Self::default()
    }

    /// Re-derive a draft from a stored outfit for editing.
    pub fn from_outfit(outfit: &Outfit) -> Self {
        let mut draft = Self::new();
        for item in &outfit.items {
            match item {
                OutfitItem::Free(p) => {
                    // Keep the id counter ahead of every stored id so items
                    // added during the edit cannot collide.
                    if let Some(seq) = p.id.strip_prefix("item-").and_then(|s| s.parse::<u64>().ok())
                    {
                        draft.next_item_seq = draft.next_item_seq.max(seq + 1);
                    }
                    draft.free_items.push(p.clone());
                    draft.last_mode = Some(PlacementMode::FreeForm);
                }
                OutfitItem::Slot(s) => {
                    draft.slots.insert(s.slot, s.article_id.clone());
                    draft.last_mode = Some(PlacementMode::Slots);
                }
            }
        }
        draft
    }

    /// Place a new item with its box centered at `(x, y)`; the stored
    /// position is the derived top-left. Fails only when `article_id` does
    /// not resolve; no partial state change in that case.
    pub fn add_free_item(
        &mut self,
        registry: &ArticleRegistry,
        article_id: &str,
        x: f64,
        y: f64,
    ) -> GarbResult<&PlacementItem> {
        if !registry.contains(article_id) {
            return Err(GarbError::unknown_article(article_id));
        }

        let id = format!("item-{}", self.next_item_seq);
        self.next_item_seq += 1;
        self.free_items.push(PlacementItem {
            id,
            article_id: article_id.to_string(),
            x: x - ITEM_BOX / 2.0,
            y: y - ITEM_BOX / 2.0,
        });
        self.last_mode = Some(PlacementMode::FreeForm);
        let idx = self.free_items.len() - 1;
        Ok(&self.free_items[idx])
    }

    /// Assign an article to a slot, replacing any prior occupant without
    /// warning (last-writer-wins by design).
    pub fn assign_slot(
        &mut self,
        registry: &ArticleRegistry,
        slot: SlotKey,
        article_id: &str,
    ) -> GarbResult<()> {
        if !registry.contains(article_id) {
            return Err(GarbError::unknown_article(article_id));
        }
        self.slots.insert(slot, article_id.to_string());
        self.last_mode = Some(PlacementMode::Slots);
        Ok(())
    }

    /// Move an item by a relative delta. A missing id is a silent no-op: the
    /// drag can race with a remove triggered by another event.
    pub fn move_free_item(&mut self, item_id: &str, dx: f64, dy: f64) {
        match self.free_items.iter_mut().find(|i| i.id == item_id) {
            Some(item) => {
                item.x += dx;
                item.y += dy;
            }
            None => tracing::debug!(item_id, "move of unknown item ignored"),
        }
    }

    /// Overwrite an item's stored top-left. Used by the drag controller,
    /// which re-applies `anchor + total_delta` every move so repeated small
    /// deltas cannot drift. Missing id is a silent no-op.
    pub fn set_free_item_position(&mut self, item_id: &str, x: f64, y: f64) {
        match self.free_items.iter_mut().find(|i| i.id == item_id) {
            Some(item) => {
                item.x = x;
                item.y = y;
            }
            None => tracing::debug!(item_id, "position update of unknown item ignored"),
        }
    }

    /// Idempotent: removing an absent item is a no-op.
    pub fn remove_free_item(&mut self, item_id: &str) {
        self.free_items.retain(|i| i.id != item_id);
    }

    /// Idempotent: clearing an empty slot is a no-op.
    pub fn clear_slot(&mut self, slot: SlotKey) {
        self.slots.remove(&slot);
    }

    /// Empty both collections. The last-used mode marker is retained until
    /// the next add/assign determines the new mode.
    pub fn clear(&mut self) {
        self.free_items.clear();
        self.slots.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.free_items.is_empty() && self.slots.is_empty()
    }

    pub fn free_items(&self) -> &[PlacementItem] {
        &self.free_items
    }

    pub fn free_item(&self, item_id: &str) -> Option<&PlacementItem> {
        self.free_items.iter().find(|i| i.id == item_id)
    }

    pub fn slot(&self, slot: SlotKey) -> Option<&str> {
        self.slots.get(&slot).map(String::as_str)
    }

    /// Occupied slots in display order.
    pub fn occupied_slots(&self) -> impl Iterator<Item = (SlotKey, &str)> {
        SlotKey::DISPLAY_ORDER
            .into_iter()
            .filter_map(|k| self.slots.get(&k).map(|id| (k, id.as_str())))
    }

    pub fn last_mode(&self) -> Option<PlacementMode> {
        self.last_mode
    }

    /// The mode the renderer and compositor must use. Slot-mode wins whenever
    /// any slot is occupied, even if free items also exist (the naive model
    /// permits the mixed state; this asymmetric tie-break resolves it the
    /// same way for every consumer).
    pub fn active_mode(&self) -> Option<PlacementMode> {
        if !self.slots.is_empty() {
            Some(PlacementMode::Slots)
        } else if !self.free_items.is_empty() {
            Some(PlacementMode::FreeForm)
        } else {
            None
        }
    }
}
