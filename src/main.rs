mod cli;

use anyhow::Result;
use clap::Parser;
use cli::Cli;
use paintnum::{Difficulty, generate_template_from_path, svg_generator};

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let difficulty: Difficulty = cli.difficulty.parse()?;
    let output = cli.output.unwrap_or_else(|| {
        let mut path = cli.input.clone();
        path.set_extension("json");
        path
    });
    let stem = cli
        .input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "template".to_string());
    let title = cli.title.unwrap_or_else(|| stem.clone());

    println!(
        "Generating {} template from {}...",
        difficulty,
        cli.input.display()
    );

    let outcome = generate_template_from_path(&cli.input, cli.colors, difficulty, cli.smoothing)?;
    println!(
        "  {} colors, {} regions",
        outcome.color_count, outcome.region_count
    );

    match outcome.to_template(&stem, &title, &cli.category, difficulty) {
        Some(template) => {
            std::fs::write(&output, serde_json::to_string_pretty(&template)?)?;
            println!("Template written to {}", output.display());

            if let Some(preview_path) = &cli.preview {
                std::fs::write(preview_path, svg_generator::render_template_svg(&template))?;
                println!("Preview written to {}", preview_path.display());
            }
        }
        None => {
            println!("Tracing produced no regions; only color analysis was possible.");
            println!("Try lowering the difficulty or increasing smoothing.");
        }
    }

    Ok(())
}
