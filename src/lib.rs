#![forbid(unsafe_code)]

//! Headless outfit composition: a placement model for draft outfits
//! (free-form or fixed slots), a gesture-driven drag/drop controller, a
//! declarative renderer, and a deterministic compositor that flattens a
//! draft into a PNG preview for persistence.

pub mod article;
pub mod compose;
pub mod draft;
pub mod error;
pub mod geom;
pub mod gesture;
pub mod layout;
pub mod outfit;
pub mod raster;
pub mod render;
pub mod save;

pub use article::{Article, ArticleRegistry};
pub use compose::{FsImageLoader, ImageLoader, PreparedImage, PreviewImage, compose_preview};
pub use draft::{ITEM_BOX, OutfitDraft, PlacementItem, PlacementMode, SlotKey, SlotPlacement};
pub use error::{GarbError, GarbResult};
pub use geom::{Point, Rect};
pub use gesture::{
    DragController, DragSource, DropTarget, DropTargets, NoScrollLock, ScrollLock, resolve_drop,
};
pub use outfit::{Outfit, OutfitItem};
pub use render::{RenderTree, Surfaces, render};
pub use save::{JsonFileStore, MemoryStore, OutfitStore, SaveOptions, save_outfit};
