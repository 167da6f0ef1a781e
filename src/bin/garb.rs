use std::{
    fs::File,
    io::BufReader,
    path::{Path, PathBuf},
};

use anyhow::Context as _;
use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "garb", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Composite a draft outfit to a PNG preview.
    Preview(PreviewArgs),
    /// Save a draft outfit (preview included) into a JSON outfit store.
    Save(SaveArgs),
}

#[derive(Parser, Debug)]
struct PreviewArgs {
    /// Article registry JSON (list of articles).
    #[arg(long)]
    articles: PathBuf,

    /// Draft outfit JSON.
    #[arg(long)]
    draft: PathBuf,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,

    /// Free-canvas surface size.
    #[arg(long, default_value_t = 400)]
    canvas_width: u32,
    #[arg(long, default_value_t = 400)]
    canvas_height: u32,

    /// Slot-grid surface size.
    #[arg(long, default_value_t = 316)]
    grid_width: u32,
    #[arg(long, default_value_t = 432)]
    grid_height: u32,
}

#[derive(Parser, Debug)]
struct SaveArgs {
    /// Article registry JSON (list of articles).
    #[arg(long)]
    articles: PathBuf,

    /// Draft outfit JSON.
    #[arg(long)]
    draft: PathBuf,

    /// Outfit store JSON document (created if absent).
    #[arg(long)]
    store: PathBuf,

    /// Outfit name.
    #[arg(long)]
    name: String,

    /// Optional category id.
    #[arg(long)]
    category: Option<String>,

    #[arg(long, default_value_t = 400)]
    canvas_width: u32,
    #[arg(long, default_value_t = 400)]
    canvas_height: u32,
    #[arg(long, default_value_t = 316)]
    grid_width: u32,
    #[arg(long, default_value_t = 432)]
    grid_height: u32,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    match cli.cmd {
        Command::Preview(args) => cmd_preview(args),
        Command::Save(args) => cmd_save(args),
    }
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path, what: &str) -> anyhow::Result<T> {
    let f = File::open(path).with_context(|| format!("open {what} '{}'", path.display()))?;
    let r = BufReader::new(f);
    serde_json::from_reader(r).with_context(|| format!("parse {what} JSON"))
}

fn read_registry(path: &Path) -> anyhow::Result<garb::ArticleRegistry> {
    let articles: Vec<garb::Article> = read_json(path, "article registry")?;
    Ok(garb::ArticleRegistry::from_articles(articles))
}

fn surfaces(cw: u32, ch: u32, gw: u32, gh: u32) -> garb::Surfaces {
    garb::Surfaces {
        free_canvas: garb::Rect::new(0.0, 0.0, f64::from(cw), f64::from(ch)),
        slot_grid: garb::Rect::new(0.0, 0.0, f64::from(gw), f64::from(gh)),
    }
}

fn loader_for(draft_path: &Path) -> garb::FsImageLoader {
    let root = draft_path.parent().unwrap_or_else(|| Path::new("."));
    garb::FsImageLoader::new(root)
}

fn cmd_preview(args: PreviewArgs) -> anyhow::Result<()> {
    let registry = read_registry(&args.articles)?;
    let draft: garb::OutfitDraft = read_json(&args.draft, "draft")?;
    let surfaces = surfaces(
        args.canvas_width,
        args.canvas_height,
        args.grid_width,
        args.grid_height,
    );

    let mut loader = loader_for(&args.draft);
    let preview = garb::compose_preview(&draft, &registry, &surfaces, &mut loader)?;
    if preview.skipped > 0 {
        eprintln!("warning: {} item(s) skipped (image load failed)", preview.skipped);
    }

    if let Some(parent) = args.out.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }

    image::save_buffer_with_format(
        &args.out,
        &preview.rgba8_premul,
        preview.width,
        preview.height,
        image::ColorType::Rgba8,
        image::ImageFormat::Png,
    )
    .with_context(|| format!("write png '{}'", args.out.display()))?;

    eprintln!("wrote {}", args.out.display());
    Ok(())
}

fn cmd_save(args: SaveArgs) -> anyhow::Result<()> {
    let registry = read_registry(&args.articles)?;
    let draft: garb::OutfitDraft = read_json(&args.draft, "draft")?;
    let surfaces = surfaces(
        args.canvas_width,
        args.canvas_height,
        args.grid_width,
        args.grid_height,
    );

    let mut loader = loader_for(&args.draft);
    let mut store = garb::JsonFileStore::new(&args.store);
    let outfit = garb::save_outfit(
        &draft,
        &registry,
        &surfaces,
        &mut loader,
        &mut store,
        garb::SaveOptions {
            name: args.name,
            category_id: args.category,
            outfit_id: None,
        },
    )?;

    eprintln!("saved outfit {} to {}", outfit.id, args.store.display());
    Ok(())
}
