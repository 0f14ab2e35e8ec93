/// Trackball Terminal Viewer
///
/// Renders a mesh as ASCII art and rotates it with arcball mouse drags.
/// Usage: trackball-terminal [--config viewer.toml] [model.stl]
/// Controls:
///   - Left mouse drag: Rotate
///   - +/-: Zoom
///   - C: Toggle the configured rotation center
///   - P: Toggle perspective/orthographic
///   - R: Reset the view
///   - Q/ESC: Quit

use anyhow::Context;
use clap::Parser;
use std::fs::File;
use std::path::PathBuf;
use trackball_core::{stl, Mesh};
use trackball_terminal::{TerminalApp, ViewerConfig};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Viewer settings in TOML
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// STL model to show; a cube when omitted
    model: Option<PathBuf>,
}

fn init_logging(config: &ViewerConfig) -> anyhow::Result<()> {
    // the terminal is in raw mode while running, so logs only go to a file
    let Some(path) = &config.log_file else {
        return Ok(());
    };
    let file = File::create(path)
        .with_context(|| format!("failed to create log file {}", path.display()))?;
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Pipe(Box::new(file)))
        .init();
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => ViewerConfig::load(path)?,
        None => ViewerConfig::default(),
    };
    init_logging(&config)?;

    let mesh = match &cli.model {
        Some(path) => {
            println!("Loading STL file: {}", path.display());
            let data = std::fs::read(path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            let mesh = stl::parse_stl(&data)
                .with_context(|| format!("failed to parse {}", path.display()))?;
            println!("Loaded {} triangles", mesh.triangles.len());
            mesh
        }
        None => Mesh::cube(2.0),
    };

    let mut app = TerminalApp::new(mesh, config)?;
    app.run()?;

    println!("Thank you for using the Trackball Terminal Viewer!");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_cli_arguments() {
        let cli = Cli::try_parse_from(["trackball-terminal", "--config", "view.toml", "part.stl"]).unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("view.toml")));
        assert_eq!(cli.model, Some(PathBuf::from("part.stl")));

        let bare = Cli::try_parse_from(["trackball-terminal"]).unwrap();
        assert_eq!(bare.config, None);
        assert_eq!(bare.model, None);

        assert!(Cli::try_parse_from(["trackball-terminal", "--fast"]).is_err());
        assert!(Cli::try_parse_from(["trackball-terminal", "a.stl", "b.stl"]).is_err());
    }
}
