//! Command-line arguments.

use std::path::PathBuf;

use clap::Parser;

use crate::shader::Platform;

#[derive(Parser, Debug)]
#[command(
    name = "shader-validator",
    version,
    about = "Compile every shader under a folder and fail on any error or warning",
    after_help = "Exit codes:\n  0  all shaders passed\n  1  no shaders found, or at least one shader failed\n  2  internal error\n\nSet RUST_LOG=debug for per-shader tracing."
)]
pub struct Args {
    /// Directories to scan for shaders
    #[arg(value_name = "ROOT", default_value = "Assets/Shaders")]
    pub roots: Vec<PathBuf>,

    /// File extension treated as a shader (repeatable)
    #[arg(long = "extension", value_name = "EXT", default_value = "wgsl")]
    pub extensions: Vec<String>,

    /// Target platform to validate against (repeatable, default: all)
    #[arg(long = "platform", value_enum)]
    pub platforms: Vec<Platform>,

    /// Print annotated source snippets for compile errors
    #[arg(long)]
    pub rich: bool,

    /// Validate again whenever a file under the roots changes
    #[arg(long)]
    pub watch: bool,
}

impl Args {
    pub fn platforms(&self) -> Vec<Platform> {
        if self.platforms.is_empty() {
            Platform::ALL.to_vec()
        } else {
            self.platforms.clone()
        }
    }
}
