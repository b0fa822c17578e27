use clap::Parser;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "paintnum")]
#[command(about = "Generate paint-by-numbers templates from raster images")]
#[command(version)]
pub struct Cli {
    /// Input image file
    #[arg(short, long)]
    pub input: PathBuf,

    /// Output template JSON file (defaults to the input name with .json)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Number of palette colors (allowed range depends on difficulty)
    #[arg(short, long, default_value = "10")]
    pub colors: usize,

    /// Puzzle difficulty: easy, medium or hard
    #[arg(short, long, default_value = "medium")]
    pub difficulty: String,

    /// Pre-quantization smoothing (0.0-1.0) to merge noisy micro-regions
    #[arg(short, long, default_value = "0.2")]
    pub smoothing: f32,

    /// Also write a printable outline SVG to this path
    #[arg(short, long)]
    pub preview: Option<PathBuf>,

    /// Template title (defaults to the input file stem)
    #[arg(short, long)]
    pub title: Option<String>,

    /// Category recorded on the template
    #[arg(long, default_value = "uncategorized")]
    pub category: String,
}
