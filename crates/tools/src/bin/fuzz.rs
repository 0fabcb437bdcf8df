use anyhow::{Result, bail};
use clap::Parser;
use levelgen::dungeon::path::find_path;
use levelgen::{GeneratedWorld, GenerationConfig, Pos, RoomRole, generate_world};
use rand_chacha::{
    ChaCha8Rng,
    rand_core::{Rng, SeedableRng},
};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[arg(short, long, default_value_t = 42)]
    seed: u64,
    #[arg(short, long, default_value_t = 200)]
    worlds: u32,
}

fn check_world(config: &GenerationConfig, world: &GeneratedWorld) -> Result<(), String> {
    if world.failed_count() != 0 {
        return Err(format!("{} nodes failed to generate", world.failed_count()));
    }
    let nodes: Vec<_> = world.nodes().collect();
    for (i, a) in nodes.iter().enumerate() {
        for b in &nodes[i + 1..] {
            if a.grid.chebyshev(b.grid) < 2 {
                return Err(format!("nodes {:?} and {:?} touch", a.grid, b.grid));
            }
        }
    }
    for room in world.rooms() {
        if room.graph.count_role(RoomRole::Start) != 1 || room.graph.count_role(RoomRole::End) != 1 {
            return Err(format!("room {:#x} lacks a unique start or end", room.seed));
        }
        let Some(doors) = room.doors else {
            return Err(format!("room {:#x} has no doors", room.seed));
        };
        if !find_path(&room.layers.ground, doors.entrance, doors.exit, config.room.player_size) {
            return Err(format!("room {:#x} has no path from entrance to exit", room.seed));
        }
    }
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();

    println!("Starting fuzz harness on seed {} for {} worlds...", args.seed, args.worlds);
    let mut rng = ChaCha8Rng::seed_from_u64(args.seed);
    let mut failures = 0_u32;

    for run in 0..args.worlds {
        let mut config = GenerationConfig::default();
        config.world.grid_size = 4 + (rng.next_u64() % 5) as usize;
        config.world.room_count = 1 + (rng.next_u64() % 4) as usize;
        config.world.level_index = (rng.next_u64() % 10) as u32;
        config.room.columns = 2 + (rng.next_u64() % 4) as usize;
        config.room.rows = 1 + (rng.next_u64() % 3) as usize;
        config.room.boss_room = rng.next_u64() % 2 == 0;
        config.room.room_width = 12 + (rng.next_u64() % 21) as i32;
        config.room.room_height = 10 + (rng.next_u64() % 11) as i32;
        config.room.player_size = 1 + (rng.next_u64() % 3) as i32;
        let max_wall = (config.room.room_width.min(config.room.room_height)
            - config.room.player_size)
            / 2;
        config.room.wall_thickness = 1 + (rng.next_u64() % max_wall as u64) as i32;
        let tile_pixels = config.room.tile_pixel_size as usize;
        config.world.room_pixel_size = Pos::new(
            (config.room.tile_width() * tile_pixels) as i32,
            (config.room.tile_height() * tile_pixels) as i32,
        );
        let world_seed = rng.next_u64();

        match generate_world(&config, world_seed) {
            Ok(world) => {
                if let Err(message) = check_world(&config, &world) {
                    failures += 1;
                    println!(
                        "Run {run}: seed {world_seed:#018x} wall {} violated an invariant: {message}",
                        config.room.wall_thickness
                    );
                }
            }
            Err(error) => {
                failures += 1;
                println!("Run {run}: seed {world_seed:#018x} failed: {error}");
            }
        }
    }

    if failures > 0 {
        bail!("{failures} of {} worlds failed", args.worlds);
    }
    println!("All {} worlds passed.", args.worlds);
    Ok(())
}
