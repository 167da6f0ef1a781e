//! The preview compositor: flattens a draft into a single raster image for
//! storage alongside the saved outfit.
//!
//! Image IO happens only through [`ImageLoader`] (the engine's one
//! suspension point), and loads run strictly sequentially in draw order, so
//! the same draft with the same cached images composites to identical bytes.
//! A load that fails is skipped and counted; compositing always completes
//! with some image, never an error terminal state.

use std::collections::BTreeMap;
use std::io::Cursor;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context as _;
use image::RgbaImage;

use crate::{
    article::ArticleRegistry,
    draft::{ITEM_BOX, OutfitDraft, PlacementMode, SlotKey},
    error::{GarbError, GarbResult},
    geom::Rect,
    layout,
    raster,
    render::Surfaces,
};

/// Faint background tint for free-form previews.
pub const PREVIEW_BG: raster::PremulRgba8 = [246, 246, 243, 255];

/// A decoded, premultiplied source image ready to draw.
#[derive(Clone, Debug)]
pub struct PreparedImage {
    /// Premultiplied RGBA8.
    pub image: Arc<RgbaImage>,
}

impl PreparedImage {
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }
}

/// Resolves an article's image reference to decoded pixels. Implementations
/// may cache; the compositor never retries a failed load.
pub trait ImageLoader {
    fn load(&mut self, source: &str) -> GarbResult<PreparedImage>;
}

/// Decode an encoded image and premultiply it at ingest.
pub fn decode_image(bytes: &[u8]) -> GarbResult<PreparedImage> {
    let dyn_img = image::load_from_memory(bytes).context("decode image from memory")?;
    let rgba = dyn_img.to_rgba8();
    let (width, height) = rgba.dimensions();

    let mut raw = rgba.into_raw();
    raster::premultiply_rgba8_in_place(&mut raw);

    let image = RgbaImage::from_raw(width, height, raw)
        .ok_or_else(|| GarbError::image_load("decoded buffer size mismatch"))?;
    Ok(PreparedImage {
        image: Arc::new(image),
    })
}

/// Loads image references as paths under a root directory, memoizing
/// prepared results.
#[derive(Debug, Default)]
pub struct FsImageLoader {
    root: PathBuf,
    cache: BTreeMap<String, PreparedImage>,
}

impl FsImageLoader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            cache: BTreeMap::new(),
        }
    }
}

impl ImageLoader for FsImageLoader {
    fn load(&mut self, source: &str) -> GarbResult<PreparedImage> {
        if let Some(hit) = self.cache.get(source) {
            return Ok(hit.clone());
        }
        let path = self.root.join(source);
        let bytes = std::fs::read(&path)
            .with_context(|| format!("read image '{}'", path.display()))?;
        let prepared = decode_image(&bytes)?;
        self.cache.insert(source.to_string(), prepared.clone());
        Ok(prepared)
    }
}

/// The flattened preview. Pixels are premultiplied RGBA8, the same contract
/// as every intermediate surface.
#[derive(Clone, Debug)]
pub struct PreviewImage {
    pub width: u32,
    pub height: u32,
    pub rgba8_premul: Vec<u8>,
    /// Items whose image failed to load and were left blank.
    pub skipped: usize,
}

impl PreviewImage {
    /// The premultiplied pixel at `(x, y)`, or `None` outside the surface.
    pub fn pixel(&self, x: u32, y: u32) -> Option<raster::PremulRgba8> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = ((y * self.width + x) * 4) as usize;
        Some([
            self.rgba8_premul[i],
            self.rgba8_premul[i + 1],
            self.rgba8_premul[i + 2],
            self.rgba8_premul[i + 3],
        ])
    }

    pub fn to_png(&self) -> GarbResult<Vec<u8>> {
        let img = RgbaImage::from_raw(self.width, self.height, self.rgba8_premul.clone())
            .ok_or_else(|| GarbError::validation("preview buffer size mismatch"))?;
        let mut buf = Vec::new();
        image::DynamicImage::ImageRgba8(img)
            .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
            .context("encode preview png")?;
        Ok(buf)
    }
}

/// Composite the draft into a fresh surface. Slot-mode wins when any slot is
/// occupied (the model's tie-break); free mode draws items in insertion
/// order at their stored top-left, 80x80, later items over earlier ones;
/// slot mode draws occupied slots in display order, scale-to-fit and
/// centered in the same rects the live grid uses.
pub fn compose_preview(
    draft: &OutfitDraft,
    registry: &ArticleRegistry,
    surfaces: &Surfaces,
    loader: &mut dyn ImageLoader,
) -> GarbResult<PreviewImage> {
    match draft.active_mode() {
        Some(PlacementMode::Slots) => compose_slots(draft, registry, surfaces, loader),
        _ => compose_free(draft, registry, surfaces, loader),
    }
}

fn surface_size(rect: Rect) -> (u32, u32) {
    let w = rect.width.round().max(1.0) as u32;
    let h = rect.height.round().max(1.0) as u32;
    (w, h)
}

fn compose_free(
    draft: &OutfitDraft,
    registry: &ArticleRegistry,
    surfaces: &Surfaces,
    loader: &mut dyn ImageLoader,
) -> GarbResult<PreviewImage> {
    let (width, height) = surface_size(surfaces.free_canvas);
    let mut data = vec![0u8; (width as usize) * (height as usize) * 4];
    raster::fill(&mut data, PREVIEW_BG);

    let mut skipped = 0usize;
    for item in draft.free_items() {
        let dest = Rect::new(item.x, item.y, ITEM_BOX, ITEM_BOX);
        match source_for(registry, &item.article_id) {
            ImageSource::Reference(source) => match loader.load(&source) {
                Ok(prepared) => raster::blit_over(&mut data, width, height, &prepared.image, dest),
                Err(err) => {
                    skipped += 1;
                    tracing::warn!(item_id = %item.id, %source, %err, "skipping unloadable item");
                }
            },
            ImageSource::Placeholder => {
                let tile = raster::placeholder_tile(ITEM_BOX as u32, ITEM_BOX as u32);
                raster::blit_over(&mut data, width, height, &tile, dest);
            }
        }
    }

    Ok(PreviewImage {
        width,
        height,
        rgba8_premul: data,
        skipped,
    })
}

fn compose_slots(
    draft: &OutfitDraft,
    registry: &ArticleRegistry,
    surfaces: &Surfaces,
    loader: &mut dyn ImageLoader,
) -> GarbResult<PreviewImage> {
    let (width, height) = surface_size(surfaces.slot_grid);
    let mut data = vec![0u8; (width as usize) * (height as usize) * 4];

    // Grid-local geometry, identical to the live layout (including the
    // body-widens-when-no-accessory rule).
    let bounds = Rect::new(0.0, 0.0, f64::from(width), f64::from(height));
    let accessory_occupied = draft.slot(SlotKey::Accessory).is_some();

    let mut skipped = 0usize;
    for (slot, article_id) in draft.occupied_slots() {
        let cell = layout::slot_rect(bounds, slot, accessory_occupied);
        match source_for(registry, article_id) {
            ImageSource::Reference(source) => match loader.load(&source) {
                Ok(prepared) => {
                    let dest = raster::fit_rect(prepared.width(), prepared.height(), cell);
                    raster::blit_over(&mut data, width, height, &prepared.image, dest);
                }
                Err(err) => {
                    skipped += 1;
                    tracing::warn!(slot = slot.as_str(), %source, %err, "skipping unloadable slot");
                }
            },
            ImageSource::Placeholder => {
                let tile = raster::placeholder_tile(cell.width as u32, cell.height as u32);
                let dest = raster::fit_rect(tile.width(), tile.height(), cell);
                raster::blit_over(&mut data, width, height, &tile, dest);
            }
        }
    }

    Ok(PreviewImage {
        width,
        height,
        rgba8_premul: data,
        skipped,
    })
}

enum ImageSource {
    Reference(String),
    Placeholder,
}

fn source_for(registry: &ArticleRegistry, article_id: &str) -> ImageSource {
    match registry.resolve(article_id) {
        Some(article) if !article.preferred_image().is_empty() => {
            ImageSource::Reference(article.preferred_image().to_string())
        }
        _ => ImageSource::Placeholder,
    }
}
