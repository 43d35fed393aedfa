//! Headless demo host for the statue plugin.

use std::path::PathBuf;

use bevy::prelude::*;
use clap::Parser;
use log::info;
use statuary::prelude::*;

/// Player-placed creature statues, running against a headless host.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
    /// Directory holding the per-owner statue files
    #[arg(long, default_value = "data/statuary")]
    data_dir: PathBuf,
}

fn main() {
    let args = Args::parse();
    statuary::init_logging(args.verbose);

    let mut app = App::new();
    app.add_plugins(MinimalPlugins);
    app.insert_resource(StatuarySettings {
        data_dir: args.data_dir,
        ..Default::default()
    });
    app.add_plugins(StatuaryPlugin);

    // Scripted session standing in for a connected player.
    let owner = OwnerId::random();
    let source = CommandSource {
        owner,
        world: "world".to_owned(),
        position: Vec3::new(10.0, 64.0, 10.0),
        facing: Facing::new(0.0, 0.0),
    };
    {
        let mut inbox = app.world_mut().resource_mut::<CommandInbox>();
        inbox.push(source.clone(), "ms guard zombie");
        inbox.push(source.clone(), "msadjust guard 90 0");
        inbox.push(source, "msdel");
    }
    app.update();

    for reply in app.world_mut().resource_mut::<ReplyQueue>().drain() {
        info!("[chat -> {}] {}", reply.owner, reply.text);
    }

    app.world_mut().trigger(StatuaryShutdown);
    info!("session complete");
}
