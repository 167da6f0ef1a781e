//! The drag/drop input adapter.
//!
//! Pointer and touch shells translate their raw events into a single
//! four-phase gesture stream (`begin`, `update`, `finish`, `cancel`) and feed
//! it to [`DragController`], which routes drops against the current drop
//! targets and mutates the draft. Malformed payloads and drops outside every
//! target are logged and discarded, never surfaced as errors: they are
//! routine races with concurrent data mutation.

use crate::{
    article::ArticleRegistry,
    draft::{OutfitDraft, SlotKey},
    error::GarbResult,
    geom::{Point, Rect},
};

/// What is being dragged: a registry article (new placement) or an
/// already-placed free-form item (reposition).
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DragSource {
    Article(String),
    PlacedItem(String),
}

/// Candidate drop-target rectangles, queried at drop time (not drag-start
/// time: the pointer can cross UI regions before release).
#[derive(Clone, Debug, Default)]
pub struct DropTargets {
    /// Slot cells with their current client rects; empty when no grid is on
    /// screen.
    pub slot_cells: Vec<(SlotKey, Rect)>,
    /// The free canvas's current client rect, when present.
    pub free_canvas: Option<Rect>,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum DropTarget {
    Slot(SlotKey),
    /// Canvas hit, carrying the canvas-local drop point.
    FreeCanvas(Point),
    Outside,
}

/// Hit-test a drop point: slot cells first (in the order given), then the
/// free canvas, else outside.
pub fn resolve_drop(point: Point, targets: &DropTargets) -> DropTarget {
    for (slot, rect) in &targets.slot_cells {
        if rect.contains(point) {
            return DropTarget::Slot(*slot);
        }
    }
    if let Some(canvas) = targets.free_canvas
        && canvas.contains(point)
    {
        return DropTarget::FreeCanvas(canvas.to_local(point));
    }
    DropTarget::Outside
}

/// Page-level scroll/selection suppression for the duration of a touch drag.
/// Acquired at gesture start and released unconditionally on both end and
/// cancel, so an interrupted gesture can never leave the page locked.
pub trait ScrollLock {
    fn acquire(&mut self);
    fn release(&mut self);
}

/// Lock for environments that have nothing to suppress (tests, native
/// shells).
#[derive(Clone, Copy, Debug, Default)]
pub struct NoScrollLock;

impl ScrollLock for NoScrollLock {
    fn acquire(&mut self) {}
    fn release(&mut self) {}
}

#[derive(Clone, Debug)]
struct Session {
    source: DragSource,
    anchor: Point,
    /// Stored top-left of the dragged item at gesture start; reposition math
    /// is `item_start + total_delta`, overwritten each move, so repeated
    /// small deltas cannot accumulate drift.
    item_start: Option<Point>,
}

/// Translates gesture phases into placement-model operations.
#[derive(Debug)]
pub struct DragController<L: ScrollLock> {
    lock: L,
    lock_held: bool,
    session: Option<Session>,
}

impl Default for DragController<NoScrollLock> {
    fn default() -> Self {
        Self::new(NoScrollLock)
    }
}

impl<L: ScrollLock> DragController<L> {
    pub fn new(lock: L) -> Self {
        Self {
            lock,
            lock_held: false,
            session: None,
        }
    }

    pub fn is_dragging(&self) -> bool {
        self.session.is_some()
    }

    /// Start a gesture at `at` (client coordinates). An interrupted previous
    /// session is discarded first.
    pub fn begin(&mut self, draft: &OutfitDraft, source: DragSource, at: Point) {
        if self.session.is_some() {
            tracing::debug!("gesture begin while previous session active; discarding");
            self.end_session();
        }

        let item_start = match &source {
            DragSource::PlacedItem(item_id) => draft
                .free_item(item_id)
                .map(|item| Point::new(item.x, item.y)),
            DragSource::Article(_) => None,
        };

        if !self.lock_held {
            self.lock.acquire();
            self.lock_held = true;
        }
        self.session = Some(Session {
            source,
            anchor: at,
            item_start,
        });
    }

    /// Continuous move. Reposition drags apply `start + total_delta` as an
    /// absolute position; new-article drags have no model effect until drop
    /// (any ghost preview is the shell's concern).
    pub fn update(&mut self, draft: &mut OutfitDraft, at: Point) {
        let Some(session) = &self.session else {
            return;
        };
        if let (DragSource::PlacedItem(item_id), Some(start)) =
            (&session.source, session.item_start)
        {
            let x = start.x + (at.x - session.anchor.x);
            let y = start.y + (at.y - session.anchor.y);
            draft.set_free_item_position(item_id, x, y);
        }
    }

    /// Drop at `at`. Routes against `targets` and mutates the draft; every
    /// failure path is a logged no-op.
    pub fn finish(
        &mut self,
        draft: &mut OutfitDraft,
        registry: &ArticleRegistry,
        targets: &DropTargets,
        at: Point,
    ) {
        let Some(session) = self.session.take() else {
            self.end_session();
            return;
        };
        self.end_session();

        let DragSource::Article(article_id) = session.source else {
            // Reposition drags apply their final position during `update`.
            return;
        };

        match resolve_drop(at, targets) {
            DropTarget::Slot(slot) => {
                log_discarded(draft.assign_slot(registry, slot, &article_id));
            }
            DropTarget::FreeCanvas(local) => {
                log_discarded(draft.add_free_item(registry, &article_id, local.x, local.y));
            }
            DropTarget::Outside => {
                tracing::debug!(%article_id, "drop outside all targets discarded");
            }
        }
    }

    /// Browser- or shell-issued cancellation. Positions already applied by
    /// `update` stay; the lock is always released.
    pub fn cancel(&mut self) {
        self.session = None;
        self.end_session();
    }

    fn end_session(&mut self) {
        self.session = None;
        if self.lock_held {
            self.lock.release();
            self.lock_held = false;
        }
    }
}

/// Slot assignment from a string drop-target key, for shells whose targets
/// carry string ids. An out-of-enumeration key is a caller bug: logged and
/// dropped, never propagated.
pub fn assign_slot_by_key(
    draft: &mut OutfitDraft,
    registry: &ArticleRegistry,
    key: &str,
    article_id: &str,
) {
    match key.parse::<SlotKey>() {
        Ok(slot) => log_discarded(draft.assign_slot(registry, slot, article_id)),
        Err(err) => tracing::error!(key, %err, "slot assignment with invalid key dropped"),
    }
}

fn log_discarded<T>(result: GarbResult<T>) {
    if let Err(err) = result {
        tracing::warn!(%err, "placement discarded");
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::article::Article;

    fn registry(ids: &[&str]) -> ArticleRegistry {
        ArticleRegistry::from_articles(ids.iter().map(|id| Article {
            id: id.to_string(),
            name: id.to_string(),
            tags: vec![],
            image: format!("{id}.png"),
            processed_image: None,
        }))
    }

    fn grid_targets() -> DropTargets {
        DropTargets {
            slot_cells: vec![
                (SlotKey::Head, Rect::new(100.0, 0.0, 50.0, 50.0)),
                (SlotKey::Body, Rect::new(100.0, 60.0, 50.0, 50.0)),
            ],
            free_canvas: Some(Rect::new(0.0, 200.0, 300.0, 300.0)),
        }
    }

    #[derive(Clone, Default)]
    struct CountingLock {
        acquired: Rc<RefCell<u32>>,
        released: Rc<RefCell<u32>>,
    }

    impl ScrollLock for CountingLock {
        fn acquire(&mut self) {
            *self.acquired.borrow_mut() += 1;
        }
        fn release(&mut self) {
            *self.released.borrow_mut() += 1;
        }
    }

    #[test]
    fn drop_outside_all_targets_is_a_noop() {
        let reg = registry(&["shirt-1"]);
        let mut draft = OutfitDraft::new();
        let mut ctl = DragController::default();

        ctl.begin(&draft, DragSource::Article("shirt-1".to_string()), Point::new(0.0, 0.0));
        ctl.finish(&mut draft, &reg, &grid_targets(), Point::new(500.0, 500.0));

        assert!(draft.is_empty());
        assert!(!ctl.is_dragging());
    }

    #[test]
    fn slot_cells_take_precedence_over_canvas() {
        let reg = registry(&["hat-1"]);
        let mut draft = OutfitDraft::new();
        let mut ctl = DragController::default();

        // Overlap the canvas under the head cell so both contain the point.
        let mut targets = grid_targets();
        targets.free_canvas = Some(Rect::new(0.0, 0.0, 300.0, 300.0));

        ctl.begin(&draft, DragSource::Article("hat-1".to_string()), Point::new(0.0, 0.0));
        ctl.finish(&mut draft, &reg, &targets, Point::new(120.0, 20.0));

        assert_eq!(draft.slot(SlotKey::Head), Some("hat-1"));
        assert!(draft.free_items().is_empty());
    }

    #[test]
    fn canvas_drop_converts_to_local_coordinates() {
        let reg = registry(&["shirt-1"]);
        let mut draft = OutfitDraft::new();
        let mut ctl = DragController::default();

        ctl.begin(&draft, DragSource::Article("shirt-1".to_string()), Point::new(0.0, 0.0));
        // Canvas rect starts at (0, 200); client (100, 300) is local (100, 100).
        ctl.finish(&mut draft, &reg, &grid_targets(), Point::new(100.0, 300.0));

        let item = &draft.free_items()[0];
        assert_eq!((item.x, item.y), (60.0, 60.0));
    }

    #[test]
    fn unknown_article_drop_is_silently_discarded() {
        let reg = registry(&[]);
        let mut draft = OutfitDraft::new();
        let mut ctl = DragController::default();

        ctl.begin(&draft, DragSource::Article("deleted".to_string()), Point::new(0.0, 0.0));
        ctl.finish(&mut draft, &reg, &grid_targets(), Point::new(100.0, 300.0));

        assert!(draft.is_empty());
    }

    #[test]
    fn reposition_applies_absolute_anchor_math_without_drift() {
        let reg = registry(&["shirt-1"]);
        let mut draft = OutfitDraft::new();
        let id = draft
            .add_free_item(&reg, "shirt-1", 100.0, 100.0)
            .unwrap()
            .id
            .clone();

        let mut ctl = DragController::default();
        ctl.begin(&draft, DragSource::PlacedItem(id.clone()), Point::new(10.0, 10.0));

        // Many intermediate moves; only the final pointer position matters.
        for step in 1..=50 {
            let at = Point::new(10.0 + f64::from(step), 10.0 + f64::from(step) * 0.5);
            ctl.update(&mut draft, at);
        }
        ctl.finish(&mut draft, &reg, &grid_targets(), Point::new(60.0, 35.0));

        let item = draft.free_item(&id).unwrap();
        assert_eq!((item.x, item.y), (110.0, 85.0));
    }

    #[test]
    fn lock_released_on_finish_and_cancel_alike() {
        let lock = CountingLock::default();
        let acquired = lock.acquired.clone();
        let released = lock.released.clone();
        let reg = registry(&["shirt-1"]);
        let mut draft = OutfitDraft::new();
        let mut ctl = DragController::new(lock);

        ctl.begin(&draft, DragSource::Article("shirt-1".to_string()), Point::new(0.0, 0.0));
        ctl.finish(&mut draft, &reg, &DropTargets::default(), Point::new(0.0, 0.0));
        assert_eq!((*acquired.borrow(), *released.borrow()), (1, 1));

        ctl.begin(&draft, DragSource::Article("shirt-1".to_string()), Point::new(0.0, 0.0));
        ctl.cancel();
        // Cancel twice; release stays balanced.
        ctl.cancel();
        assert_eq!((*acquired.borrow(), *released.borrow()), (2, 2));
    }

    #[test]
    fn cancel_keeps_positions_already_applied() {
        let reg = registry(&["shirt-1"]);
        let mut draft = OutfitDraft::new();
        let id = draft
            .add_free_item(&reg, "shirt-1", 100.0, 100.0)
            .unwrap()
            .id
            .clone();

        let mut ctl = DragController::default();
        ctl.begin(&draft, DragSource::PlacedItem(id.clone()), Point::new(0.0, 0.0));
        ctl.update(&mut draft, Point::new(20.0, 0.0));
        ctl.cancel();

        let item = draft.free_item(&id).unwrap();
        assert_eq!((item.x, item.y), (80.0, 60.0));
    }

    #[test]
    fn string_slot_keys_route_or_drop() {
        let reg = registry(&["hat-1"]);
        let mut draft = OutfitDraft::new();

        assign_slot_by_key(&mut draft, &reg, "head", "hat-1");
        assert_eq!(draft.slot(SlotKey::Head), Some("hat-1"));

        assign_slot_by_key(&mut draft, &reg, "helmet", "hat-1");
        let occupied: Vec<_> = draft.occupied_slots().collect();
        assert_eq!(occupied.len(), 1);
    }
}
