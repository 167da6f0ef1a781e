//! The outfit renderer: a pure function from the draft to a declarative
//! render tree. A UI shell materializes the tree however it likes (DOM,
//! retained widgets) and can key live drag updates off `item_id` without a
//! structural re-render; the engine never touches a toolkit.

use crate::{
    article::ArticleRegistry,
    draft::{ITEM_BOX, OutfitDraft, PlacementMode, SlotKey},
    geom::Rect,
    layout,
};

/// Instructional copy for the free-canvas empty state.
pub const EMPTY_CANVAS_MESSAGE: &str = "Drag articles here to start an outfit";

/// The two addressable UI regions supplied by the surrounding layout, as
/// current bounding rects in client space.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Surfaces {
    pub free_canvas: Rect,
    pub slot_grid: Rect,
}

/// An article thumbnail reference. `Placeholder` is the single deterministic
/// stand-in used by every call site when an article is missing or has no
/// image.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum Thumb {
    Image(String),
    Placeholder,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct FreeItemNode {
    /// Key for direct position mutation during drag and for the remove
    /// affordance.
    pub item_id: String,
    pub article_id: String,
    pub rect: Rect,
    pub thumb: Thumb,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CellState {
    Empty,
    Filled,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct SlotContent {
    pub article_id: String,
    pub name: String,
    pub thumb: Thumb,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct SlotCellNode {
    pub slot: SlotKey,
    pub rect: Rect,
    pub state: CellState,
    pub content: Option<SlotContent>,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum RenderTree {
    /// Free canvas with nothing placed yet (slot grids render their six
    /// cells even when empty).
    EmptyCanvas { message: String },
    FreeCanvas(Vec<FreeItemNode>),
    SlotGrid(Vec<SlotCellNode>),
}

/// Resolve the thumbnail for an article id, substituting the placeholder for
/// stale references and imageless articles.
pub fn thumb_for(registry: &ArticleRegistry, article_id: &str) -> Thumb {
    match registry.resolve(article_id) {
        Some(article) if !article.preferred_image().is_empty() => {
            Thumb::Image(article.preferred_image().to_string())
        }
        _ => Thumb::Placeholder,
    }
}

/// Materialize the draft. Slot-mode wins whenever any slot is occupied
/// (the model's tie-break); an empty draft renders the six-cell grid if its
/// last-used mode was slots, else the instructional canvas placeholder.
pub fn render(draft: &OutfitDraft, registry: &ArticleRegistry, surfaces: &Surfaces) -> RenderTree {
    match draft.active_mode() {
        Some(PlacementMode::Slots) => RenderTree::SlotGrid(slot_cells(draft, registry, surfaces)),
        Some(PlacementMode::FreeForm) => RenderTree::FreeCanvas(free_nodes(draft, registry)),
        None => {
            if draft.last_mode() == Some(PlacementMode::Slots) {
                RenderTree::SlotGrid(slot_cells(draft, registry, surfaces))
            } else {
                RenderTree::EmptyCanvas {
                    message: EMPTY_CANVAS_MESSAGE.to_string(),
                }
            }
        }
    }
}

fn free_nodes(draft: &OutfitDraft, registry: &ArticleRegistry) -> Vec<FreeItemNode> {
    draft
        .free_items()
        .iter()
        .map(|item| FreeItemNode {
            item_id: item.id.clone(),
            article_id: item.article_id.clone(),
            rect: Rect::new(item.x, item.y, ITEM_BOX, ITEM_BOX),
            thumb: thumb_for(registry, &item.article_id),
        })
        .collect()
}

fn slot_cells(
    draft: &OutfitDraft,
    registry: &ArticleRegistry,
    surfaces: &Surfaces,
) -> Vec<SlotCellNode> {
    let accessory_occupied = draft.slot(SlotKey::Accessory).is_some();
    layout::slot_rects(surfaces.slot_grid, accessory_occupied)
        .into_iter()
        .map(|(slot, rect)| {
            let content = draft.slot(slot).map(|article_id| SlotContent {
                article_id: article_id.to_string(),
                name: registry
                    .resolve(article_id)
                    .map(|a| a.name.clone())
                    .unwrap_or_default(),
                thumb: thumb_for(registry, article_id),
            });
            SlotCellNode {
                slot,
                rect,
                state: if content.is_some() {
                    CellState::Filled
                } else {
                    CellState::Empty
                },
                content,
            }
        })
        .collect()
}
