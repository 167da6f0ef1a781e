use std::io::Cursor;
use std::path::PathBuf;

use garb::{
    Article, ArticleRegistry, FsImageLoader, OutfitDraft, Rect, SlotKey, Surfaces, compose_preview,
};

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

fn temp_dir(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!(
        "garb_{name}_{}_{}",
        std::process::id(),
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos()
    ))
}

fn write_png(path: &PathBuf, w: u32, h: u32, rgba: [u8; 4]) {
    let img = image::RgbaImage::from_pixel(w, h, image::Rgba(rgba));
    let mut buf = Vec::new();
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .unwrap();
    std::fs::write(path, &buf).unwrap();
}

fn registry(ids: &[&str]) -> ArticleRegistry {
    ArticleRegistry::from_articles(ids.iter().map(|id| Article {
        id: id.to_string(),
        name: id.to_string(),
        tags: vec![],
        image: format!("{id}.png"),
        processed_image: None,
    }))
}

fn surfaces() -> Surfaces {
    Surfaces {
        free_canvas: Rect::new(0.0, 0.0, 300.0, 300.0),
        slot_grid: Rect::new(0.0, 0.0, 316.0, 432.0),
    }
}

#[test]
fn fs_loader_composites_deterministically() {
    let tmp = temp_dir("fs_deterministic");
    std::fs::create_dir_all(&tmp).unwrap();
    write_png(&tmp.join("shirt-1.png"), 80, 80, [200, 30, 30, 255]);
    write_png(&tmp.join("pants-1.png"), 80, 80, [30, 30, 200, 255]);

    let reg = registry(&["shirt-1", "pants-1"]);
    let mut draft = OutfitDraft::new();
    draft.add_free_item(&reg, "shirt-1", 100.0, 100.0).unwrap();
    draft.add_free_item(&reg, "pants-1", 150.0, 150.0).unwrap();

    let mut loader = FsImageLoader::new(&tmp);
    let first = compose_preview(&draft, &reg, &surfaces(), &mut loader).unwrap();
    let second = compose_preview(&draft, &reg, &surfaces(), &mut loader).unwrap();

    assert_eq!(first.rgba8_premul, second.rgba8_premul);
    assert_eq!(first.to_png().unwrap(), second.to_png().unwrap());

    std::fs::remove_dir_all(&tmp).ok();
}

#[test]
fn missing_file_is_skipped_but_the_composite_completes() {
    init_tracing();
    let tmp = temp_dir("fs_partial");
    std::fs::create_dir_all(&tmp).unwrap();
    write_png(&tmp.join("pants-1.png"), 80, 80, [30, 30, 200, 255]);
    // shirt-1.png deliberately absent.

    let reg = registry(&["shirt-1", "pants-1"]);
    let mut draft = OutfitDraft::new();
    draft.add_free_item(&reg, "shirt-1", 60.0, 60.0).unwrap();
    draft.add_free_item(&reg, "pants-1", 200.0, 200.0).unwrap();

    let mut loader = FsImageLoader::new(&tmp);
    let preview = compose_preview(&draft, &reg, &surfaces(), &mut loader).unwrap();

    assert_eq!(preview.skipped, 1);
    // The loadable item is still drawn at its stored position.
    assert_eq!(preview.pixel(200, 200), Some([30, 30, 200, 255]));

    std::fs::remove_dir_all(&tmp).ok();
}

#[test]
fn slot_preview_decodes_with_grid_dimensions() {
    let tmp = temp_dir("fs_slot_grid");
    std::fs::create_dir_all(&tmp).unwrap();
    write_png(&tmp.join("hat-1.png"), 64, 64, [10, 180, 10, 255]);

    let reg = registry(&["hat-1"]);
    let mut draft = OutfitDraft::new();
    draft.assign_slot(&reg, SlotKey::Head, "hat-1").unwrap();

    let mut loader = FsImageLoader::new(&tmp);
    let preview = compose_preview(&draft, &reg, &surfaces(), &mut loader).unwrap();
    let png = preview.to_png().unwrap();

    let decoded = image::load_from_memory(&png).unwrap();
    assert_eq!((decoded.width(), decoded.height()), (316, 432));

    std::fs::remove_dir_all(&tmp).ok();
}
