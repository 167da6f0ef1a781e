//! The save flow: validate the draft, regenerate the preview, build the
//! outfit record, and hand it to a persistence bridge. On any failure the
//! caller's draft is untouched, so the user can retry without re-composing.

use std::collections::BTreeMap;
use std::path::PathBuf;

use anyhow::Context as _;
use chrono::Utc;

use crate::{
    article::ArticleRegistry,
    compose::{ImageLoader, compose_preview},
    draft::{OutfitDraft, PlacementMode, SlotPlacement},
    error::{GarbError, GarbResult},
    outfit::{Outfit, OutfitItem},
    render::Surfaces,
};

/// Where finished outfits go. The engine does not care whether this writes
/// to a local store, a remote one, or both.
pub trait OutfitStore {
    fn persist(&mut self, outfit: &Outfit) -> GarbResult<()>;
}

#[derive(Clone, Debug, Default)]
pub struct SaveOptions {
    pub name: String,
    pub category_id: Option<String>,
    /// Reuse an existing id when saving an edit; a fresh v4 uuid otherwise.
    pub outfit_id: Option<String>,
}

/// Run the full save path. Fails with [`GarbError::EmptyDraft`] before
/// touching the store when nothing is placed; propagates store failures as
/// [`GarbError::Persistence`] without consuming the draft.
pub fn save_outfit(
    draft: &OutfitDraft,
    registry: &ArticleRegistry,
    surfaces: &Surfaces,
    loader: &mut dyn ImageLoader,
    store: &mut dyn OutfitStore,
    options: SaveOptions,
) -> GarbResult<Outfit> {
    if draft.is_empty() {
        return Err(GarbError::EmptyDraft);
    }
    if options.name.trim().is_empty() {
        return Err(GarbError::validation("outfit name must be non-empty"));
    }

    let preview = compose_preview(draft, registry, surfaces, loader)?;
    if preview.skipped > 0 {
        tracing::warn!(skipped = preview.skipped, "preview composited partially");
    }

    let items = match draft.active_mode() {
        Some(PlacementMode::Slots) => draft
            .occupied_slots()
            .map(|(slot, article_id)| {
                OutfitItem::Slot(SlotPlacement {
                    slot,
                    article_id: article_id.to_string(),
                })
            })
            .collect(),
        Some(PlacementMode::FreeForm) => draft
            .free_items()
            .iter()
            .cloned()
            .map(OutfitItem::Free)
            .collect(),
        None => Vec::new(),
    };

    let outfit = Outfit {
        id: options
            .outfit_id
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string()),
        name: options.name,
        category_id: options.category_id,
        items,
        preview_png: preview.to_png()?,
        created_at: Utc::now(),
    };
    outfit.validate()?;

    store.persist(&outfit)?;
    tracing::info!(outfit_id = %outfit.id, items = outfit.items.len(), "outfit saved");
    Ok(outfit)
}

/// In-memory bridge, keyed by outfit id.
#[derive(Debug, Default)]
pub struct MemoryStore {
    outfits: BTreeMap<String, Outfit>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: &str) -> Option<&Outfit> {
        self.outfits.get(id)
    }

    pub fn len(&self) -> usize {
        self.outfits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outfits.is_empty()
    }
}

impl OutfitStore for MemoryStore {
    fn persist(&mut self, outfit: &Outfit) -> GarbResult<()> {
        self.outfits.insert(outfit.id.clone(), outfit.clone());
        Ok(())
    }
}

/// File-backed bridge: a single JSON document holding all outfits, rewritten
/// on every persist. Saving an existing id replaces that outfit.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn load_all(&self) -> GarbResult<Vec<Outfit>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let bytes = std::fs::read(&self.path)
            .with_context(|| format!("read outfit store '{}'", self.path.display()))?;
        let outfits: Vec<Outfit> =
            serde_json::from_slice(&bytes).context("parse outfit store JSON")?;
        Ok(outfits)
    }
}

impl OutfitStore for JsonFileStore {
    fn persist(&mut self, outfit: &Outfit) -> GarbResult<()> {
        let mut outfits = self
            .load_all()
            .map_err(|err| GarbError::persistence(err.to_string()))?;
        outfits.retain(|o| o.id != outfit.id);
        outfits.push(outfit.clone());

        let json = serde_json::to_vec_pretty(&outfits)
            .map_err(|err| GarbError::persistence(err.to_string()))?;
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)
                .map_err(|err| GarbError::persistence(err.to_string()))?;
        }
        std::fs::write(&self.path, json)
            .map_err(|err| GarbError::persistence(err.to_string()))?;
        Ok(())
    }
}
