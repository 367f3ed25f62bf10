use std::{path::PathBuf, sync::Arc};

use anyhow::Context as _;
use bubu_avatar::{
    AssetProvider, AvatarStudio, Category, FrameRGBA, FsAssetProvider, LayerId, ManualScheduler,
    RandomSource, Scheduler, StdRandom, StudioConfig, SystemScheduler, contact_sheet,
    decode_image, encode_png, render_thumbnail,
};
use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser, Debug)]
#[command(name = "bubu", version)]
struct Cli {
    /// JSON config file. Missing fields take their defaults.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Override the asset root directory.
    #[arg(long, global = true)]
    assets: Option<PathBuf>,

    /// Log filter used when `RUST_LOG` is unset.
    #[arg(long, global = true, default_value = "warn")]
    log: String,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Composite an outfit and write it as a PNG.
    Export(ExportArgs),
    /// Print the autoframed thumbnail focus of one option.
    Focus(FocusArgs),
    /// Render every option of a category into one contact sheet PNG.
    Thumbs(ThumbsArgs),
    /// Run a blind-box reveal and print its timeline.
    Reveal(RevealArgs),
}

#[derive(Parser, Debug)]
struct ExportArgs {
    /// Output directory.
    #[arg(long, default_value = ".")]
    out: PathBuf,

    #[arg(long)]
    base: Option<String>,

    #[arg(long)]
    nose: Option<String>,

    #[arg(long)]
    eyes: Option<String>,

    /// Accessory id; repeat for more.
    #[arg(long = "acc")]
    accessories: Vec<String>,

    /// Ignore the explicit layers and generate a random outfit.
    #[arg(long)]
    random: bool,

    /// Seed for `--random`.
    #[arg(long)]
    seed: Option<u64>,
}

#[derive(Parser, Debug)]
struct FocusArgs {
    /// base, nose, eyes or acc.
    #[arg(long, value_parser = parse_category)]
    category: Category,

    #[arg(long)]
    id: String,
}

#[derive(Parser, Debug)]
struct ThumbsArgs {
    /// base, nose, eyes or acc.
    #[arg(long, value_parser = parse_category)]
    category: Category,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,

    /// Tile side in pixels.
    #[arg(long, default_value_t = 128)]
    tile: u32,

    #[arg(long, default_value_t = 6)]
    columns: u32,
}

#[derive(Parser, Debug)]
struct RevealArgs {
    /// Force the outcome instead of drawing it.
    #[arg(long, value_enum)]
    force: Option<OutcomeArg>,

    #[arg(long)]
    seed: Option<u64>,

    /// Run on a virtual clock instead of waiting in real time.
    #[arg(long)]
    instant: bool,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum OutcomeArg {
    Win,
    Lose,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.log);

    let mut config = match &cli.config {
        Some(path) => StudioConfig::from_path(path)?,
        None => StudioConfig::default(),
    };
    if let Some(root) = &cli.assets {
        config.assets_root = root.clone();
    }

    match cli.cmd {
        Command::Export(args) => cmd_export(config, args),
        Command::Focus(args) => cmd_focus(config, args),
        Command::Thumbs(args) => cmd_thumbs(config, args),
        Command::Reveal(args) => cmd_reveal(config, args),
    }
}

fn init_logging(level: &str) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(format!("bubu_avatar={level}")));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn rng_for(seed: Option<u64>) -> StdRandom {
    match seed {
        Some(seed) => StdRandom::seeded(seed),
        None => StdRandom::from_os_rng(),
    }
}

fn parse_category(raw: &str) -> Result<Category, String> {
    Category::parse(raw).map_err(|e| e.to_string())
}

fn layer_id(raw: &str) -> anyhow::Result<LayerId> {
    LayerId::new(raw).with_context(|| format!("invalid layer id '{raw}'"))
}

fn studio_for(
    config: StudioConfig,
    rng: StdRandom,
) -> anyhow::Result<AvatarStudio<SystemScheduler, StdRandom>> {
    let provider = Arc::new(FsAssetProvider::new(config.assets_root.clone()));
    Ok(AvatarStudio::new(config, provider, SystemScheduler::new(), rng)?)
}

fn cmd_export(config: StudioConfig, args: ExportArgs) -> anyhow::Result<()> {
    let mut studio = studio_for(config, rng_for(args.seed))?;

    if args.random {
        studio.build_for_me();
    } else {
        if let Some(base) = &args.base {
            studio.set_base(layer_id(base)?)?;
        }
        studio.set_nose(args.nose.as_deref().map(layer_id).transpose()?)?;
        studio.set_eyes(args.eyes.as_deref().map(layer_id).transpose()?)?;
        for acc in &args.accessories {
            studio.toggle_accessory(layer_id(acc)?)?;
        }
    }

    let result = studio.export_to(&args.out);
    if let Some(notice) = studio.take_notice() {
        eprintln!("{}", notice.message());
    }
    let path = result?;

    let outfit = serde_json::to_string(studio.selection()).context("serialize outfit")?;
    println!("{outfit}");
    eprintln!("wrote {}", path.display());
    Ok(())
}

fn cmd_focus(config: StudioConfig, args: FocusArgs) -> anyhow::Result<()> {
    let studio = AvatarStudio::from_config(config)?;
    let category = args.category;
    let focus = studio.thumbnail_focus(category, &layer_id(&args.id)?);

    let out = serde_json::json!({
        "category": category,
        "id": args.id,
        "focus": focus,
        "transform": focus.transform().to_css(),
    });
    println!("{out}");
    Ok(())
}

fn cmd_thumbs(config: StudioConfig, args: ThumbsArgs) -> anyhow::Result<()> {
    let provider = FsAssetProvider::new(config.assets_root.clone());
    let studio = AvatarStudio::from_config(config)?;
    let category = args.category;

    let mut tiles = Vec::new();
    for (id, focus) in studio.thumbnails(category) {
        // Unreadable artwork still gets a blank tile so the grid keeps catalog order.
        let tile = provider
            .load(category, &id)
            .and_then(|bytes| decode_image(&bytes))
            .map(|img| render_thumbnail(&img, &focus, args.tile))
            .unwrap_or_else(|err| {
                tracing::warn!(%id, %err, "blank thumbnail");
                FrameRGBA::transparent(args.tile, args.tile)
            });
        tiles.push(tile);
    }

    let sheet = contact_sheet(&tiles, args.columns)?;
    let png = encode_png(&sheet)?;
    if let Some(parent) = args.out.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    std::fs::write(&args.out, png)
        .with_context(|| format!("write png '{}'", args.out.display()))?;

    eprintln!(
        "wrote {} sheet ({} tiles) to {}",
        category.label(),
        tiles.len(),
        args.out.display()
    );
    Ok(())
}

fn cmd_reveal(config: StudioConfig, args: RevealArgs) -> anyhow::Result<()> {
    let force = args.force.map(|o| matches!(o, OutcomeArg::Win));
    let provider = Arc::new(FsAssetProvider::new(config.assets_root.clone()));
    let rng = rng_for(args.seed);

    if args.instant {
        let mut studio = AvatarStudio::new(config, provider, ManualScheduler::new(), rng)?;
        run_reveal(&mut studio, force, |s| match s.next_deadline() {
            Some(deadline) => {
                s.advance_to(deadline);
                true
            }
            None => false,
        })
    } else {
        let mut studio = AvatarStudio::new(config, provider, SystemScheduler::new(), rng)?;
        run_reveal(&mut studio, force, |s| s.wait_for_next())
    }
}

/// Start a reveal and pump it until no timers remain, printing each phase change.
fn run_reveal<S: Scheduler, R: RandomSource>(
    studio: &mut AvatarStudio<S, R>,
    force: Option<bool>,
    mut wait: impl FnMut(&mut S) -> bool,
) -> anyhow::Result<()> {
    studio.start_reveal(force);
    loop {
        let effects = studio.pump();
        for change in studio.reveal_mut().take_log() {
            let headline = change.phase.headline();
            if headline.is_empty() {
                println!("{:>6}ms {}", change.at.as_millis(), change.phase);
            } else {
                println!("{:>6}ms {} {headline}", change.at.as_millis(), change.phase);
            }
        }
        if !effects.is_empty() {
            println!(
                "unlocked: base={} nose={}",
                studio.selection().base(),
                studio
                    .selection()
                    .nose()
                    .map(LayerId::as_str)
                    .unwrap_or("-"),
            );
        }
        if !wait(studio.reveal_mut().scheduler_mut()) {
            break;
        }
    }
    Ok(())
}
