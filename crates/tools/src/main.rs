use std::fs;
use std::io;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use levelgen::{
    GeneratedRoom, GenerationConfig, RunControl, TileLayer, TileSink, WorldGenerator, WorldRecord,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// World seed
    #[arg(short, long, default_value_t = 42)]
    seed: u64,
    /// TOML file with `[world]`, `[room]` and `[difficulty]` tables
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Overrides `world.level_index` from the config
    #[arg(short, long)]
    level: Option<u32>,
    /// Write a world record to this path
    #[arg(short, long)]
    record: Option<PathBuf>,
    /// Check the generated world against a previously written record
    #[arg(long)]
    verify: Option<PathBuf>,
    /// Print every room as ASCII tiles
    #[arg(short, long)]
    ascii: bool,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .compact()
        .init();
}

fn load_config(path: Option<&PathBuf>) -> Result<GenerationConfig> {
    let Some(path) = path else {
        return Ok(GenerationConfig::default());
    };
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    toml::from_str(&text).with_context(|| format!("Failed to parse config: {}", path.display()))
}

/// Collects the layers of one room and overlays them into characters.
#[derive(Default)]
struct AsciiSink {
    width: usize,
    height: usize,
    background: Vec<i8>,
    ground: Vec<i8>,
    platform: Vec<i8>,
}

impl TileSink for AsciiSink {
    fn consume_layer(
        &mut self,
        layer: TileLayer,
        width: usize,
        height: usize,
        values: &[i8],
        _theme: &str,
    ) {
        self.width = width;
        self.height = height;
        let target = match layer {
            TileLayer::Background => &mut self.background,
            TileLayer::Ground => &mut self.ground,
            TileLayer::Platform => &mut self.platform,
        };
        *target = values.to_vec();
    }
}

impl AsciiSink {
    fn render(&self, room: &GeneratedRoom) -> String {
        let mut cells: Vec<char> = (0..self.width * self.height)
            .map(|index| {
                if self.ground.get(index) == Some(&1) {
                    '#'
                } else if self.platform.get(index) == Some(&1) {
                    '='
                } else if self.background.get(index) == Some(&1) {
                    '.'
                } else {
                    ' '
                }
            })
            .collect();

        let mut mark = |x: i32, y: i32, glyph: char| {
            if x >= 0 && y >= 0 && (x as usize) < self.width && (y as usize) < self.height {
                cells[(y as usize) * self.width + (x as usize)] = glyph;
            }
        };
        let tile_size = room.tile_pixel_size.max(1);
        for request in room.spawns.iter() {
            let local = request.position - room.world_offset;
            mark(local.x / tile_size, local.y / tile_size, '*');
        }
        if let Some(doors) = room.doors {
            mark(doors.entrance.x, doors.entrance.y, 'E');
            mark(doors.exit.x, doors.exit.y, 'X');
        }

        let mut out = String::with_capacity(cells.len() + self.height);
        for row in cells.chunks(self.width.max(1)) {
            out.extend(row);
            out.push('\n');
        }
        out
    }
}

fn main() -> Result<()> {
    init_tracing();
    let args = Args::parse();

    let mut config = load_config(args.config.as_ref())?;
    if let Some(level) = args.level {
        config.world.level_index = level;
    }

    let world = WorldGenerator::new(&config)
        .generate(args.seed, &mut RunControl::default())
        .map_err(|e| anyhow::anyhow!("Generation failed: {e}"))?;

    println!("World seed {} level {}", world.seed, world.level_index);
    for placed in &world.placements {
        let node = &placed.node;
        let doors = match node.doors {
            Some(doors) => format!(
                "entrance ({}, {}) exit ({}, {})",
                doors.entrance.x, doors.entrance.y, doors.exit.x, doors.exit.y
            ),
            None => "no doors".to_string(),
        };
        println!(
            "  node ({}, {}) offset ({}, {}) seed {:#018x} attempts {} {}: {}",
            node.grid.x,
            node.grid.y,
            node.world_offset.x,
            node.world_offset.y,
            node.seed,
            node.attempts,
            if node.generated { "ok" } else { "FAILED" },
            doors
        );
        if args.ascii
            && let Some(room) = &placed.room
        {
            let mut sink = AsciiSink::default();
            room.render_into(&mut sink, "ascii");
            println!("{}", sink.render(room));
        }
    }
    println!("Spawns: {}", world.spawns.len());
    println!("Fingerprint: {:016x}", world.fingerprint());

    if let Some(path) = &args.record {
        WorldRecord::capture(&world)
            .write_atomic(path)
            .with_context(|| format!("Failed to write record: {}", path.display()))?;
        info!(path = %path.display(), "world record written");
    }
    if let Some(path) = &args.verify {
        let record = WorldRecord::load(path)
            .with_context(|| format!("Failed to load record: {}", path.display()))?;
        record.verify(&world).context("World does not match record")?;
        println!("Record verified.");
    }

    Ok(())
}
