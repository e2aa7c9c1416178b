use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use zenvdfs::loader::WorldLoader;
use zenvdfs::vdfs::{FileIndex, VdfArchive};
use zenvdfs::zen::{ParseOptions, Schema, Value, ZenArchive, ZenWorld};

#[derive(Parser)]
#[command(name = "zvdf", about = "Inspect ZenGin world archives and VDFS packages")]
struct Cli {
    /// More log output (-v debug, -vv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show VDFS header fields
    Info {
        input: PathBuf,
    },
    /// List the files of one or more VDFS archives, later ones overriding earlier
    List {
        #[arg(required = true, num_args = 1..)]
        archives: Vec<PathBuf>,
        #[arg(long)]
        json: bool,
    },
    /// Copy one file out of the mounted archives
    Extract {
        #[arg(short, long, required = true, num_args = 1..)]
        archives: Vec<PathBuf>,
        name: String,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Parse a ZEN document and print its object tree
    Zen {
        /// File name, looked up in --vdf archives first, then on disk
        input: String,
        #[arg(long = "vdf", num_args = 1..)]
        vdfs: Vec<PathBuf>,
        /// JSON file with BINARY field layouts
        #[arg(long)]
        schema: Option<PathBuf>,
        #[arg(long, default_value = zenvdfs::zen::DEFAULT_ROOT_CLASS)]
        root_class: String,
        #[arg(long)]
        json: bool,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let default_level = match cli.verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    match cli.command {

        // ── Info ─────────────────────────────────────────────────────────────
        Commands::Info { input } => {
            let ar = VdfArchive::open(&input)?;
            let h  = ar.header();
            let ts = h.timestamp
                .to_datetime()
                .map(|t| t.to_string())
                .unwrap_or_else(|| format!("invalid ({:#010x})", h.timestamp.0));

            println!("── VDFS Archive ─────────────────────────────────────────");
            println!("  Path           {}", input.display());
            println!("  Comment        {}", h.comment);
            println!("  Game version   {:?}", ar.version());
            println!("  Header version {:#x}", h.version);
            println!("  Timestamp      {ts}");
            println!("  Entries        {}", h.num_entries);
            println!("  Files          {} (declared {})", ar.files().len(), h.num_files);
            println!("  Data size      {} B", h.data_size);
            println!("  Catalog offset {}", h.root_cat_offset);
        }

        // ── List ─────────────────────────────────────────────────────────────
        Commands::List { archives, json } => {
            let index = mount_all(&archives)?;
            if json {
                let files: Vec<_> = index.files().into_iter().map(|(_, r)| r).collect();
                println!("{}", serde_json::to_string_pretty(&files)?);
            } else {
                println!("{:<40} {:>12} {:>12} {:>4}", "Path", "Offset", "Size", "Arc");
                for (_, r) in index.files() {
                    println!("{:<40} {:>12} {:>12} {:>4}", r.path, r.offset, r.size, r.archive.0);
                }
                println!("{} files in {} archives", index.len(), archives.len());
            }
        }

        // ── Extract ──────────────────────────────────────────────────────────
        Commands::Extract { archives, name, output } => {
            let mut index = mount_all(&archives)?;
            let data = index.read(&name)?;
            let output = output.unwrap_or_else(|| PathBuf::from(zenvdfs::vdfs::normalize_name(&name)));
            std::fs::write(&output, &data)?;
            println!("Extracted {} ({} B) to {}", name, data.len(), output.display());
        }

        // ── Zen ──────────────────────────────────────────────────────────────
        Commands::Zen { input, vdfs, schema, root_class, json } => {
            let mut options = ParseOptions { root_class, ..ParseOptions::default() };
            if let Some(path) = schema {
                options = options.with_schema(Schema::from_json(&std::fs::read_to_string(path)?)?);
            }

            let world = if vdfs.is_empty() {
                ZenArchive::open(&input, options)?.into_world()
            } else {
                let mut loader = WorldLoader::new(mount_all(&vdfs)?, options);
                loader.load_world(&input)?.world().clone()
            };

            if json {
                println!("{}", serde_json::to_string_pretty(&world)?);
            } else {
                print_world(&world);
            }
        }
    }
    Ok(())
}

fn mount_all(paths: &[PathBuf]) -> Result<FileIndex, Box<dyn std::error::Error>> {
    let mut index = FileIndex::new();
    for path in paths {
        index.load_vdf(path)?;
    }
    Ok(index)
}

fn print_world(world: &ZenWorld) {
    let h = &world.header;
    println!("── ZEN Archive ──────────────────────────────────────────");
    println!("  Encoding       {}", h.encoding);
    println!("  Version        {}", h.version);
    println!("  Save game      {}", h.save_game);
    println!("  Date           {}", h.date.as_deref().unwrap_or("-"));
    println!("  User           {}", h.user.as_deref().unwrap_or("-"));
    println!("  Objects        {}", world.object_count);
    println!("  Nodes          {}", world.root.count());
    if let Some(mesh) = &world.mesh {
        println!("  Mesh           v{} {} B at {:#x}", mesh.version, mesh.len, mesh.offset);
    }
    println!();

    world.root.walk(|node, depth| {
        let indent = "  ".repeat(depth);
        let name = if node.header.name.is_empty() { "%" } else { node.header.name.as_str() };
        println!("{indent}[{name} {} #{}]", node.class_name(), node.object_id());
        for e in &node.entries {
            let value = match &e.value {
                Value::String(s) => format!("{s:?}"),
                Value::Raw(b)    => hex::encode(b),
                other            => format!("{other:?}"),
            };
            println!("{indent}  {}: {} = {}", e.name, e.value.kind(), value);
        }
    });
}
