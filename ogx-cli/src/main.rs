// CLI application
use std::path::PathBuf;

use clap::Parser;
use ogx_cli::commands::{list_scenes, run_scene, OutputFormat};

#[derive(Parser)]
#[command(name = "ogx-trace")]
#[command(about = "Replay OpenGL call scripts and trace the resulting GX commands")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// List the built-in scenes
    List,
    /// Replay a scene and print the GX trace
    Run {
        /// Built-in scene name or path to a scene JSON file
        scene: String,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Summary)]
        format: OutputFormat,

        /// Write the output to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::List => list_scenes()?,
        Commands::Run { scene, format, output } => run_scene(&scene, format, output.as_deref())?,
    }

    Ok(())
}
