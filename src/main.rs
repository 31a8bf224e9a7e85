use anyhow::{Context, Result};
use log::info;
use recipe_shopper::catalog::InMemoryCatalog;
use recipe_shopper::config::PipelineConfig;
use recipe_shopper::pipeline::ShoppingPipeline;
use recipe_shopper::text_processing::{RecipeSource, RecipeTextProcessor};
use std::env;
use std::path::Path;
use std::process;

const USAGE: &str = "Usage: recipe-shopper <recipe.txt>... <catalog.json> [--json]";

fn load_recipe(processor: &RecipeTextProcessor, path: &Path) -> Result<RecipeSource> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read recipe file {}", path.display()))?;
    let title = path
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    Ok(processor.recipe_from_text(&title, &text))
}

fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    // Initialize logging
    env_logger::init();

    let mut args: Vec<String> = env::args().skip(1).collect();
    let json_output = args.iter().any(|arg| arg == "--json");
    args.retain(|arg| arg != "--json");

    if args.len() < 2 {
        eprintln!("{USAGE}");
        process::exit(2);
    }

    let catalog_path = args.pop().context("Missing catalog path")?;
    let config = PipelineConfig::from_env().context("Invalid configuration")?;
    info!("Starting recipe shopper: {}", config.summary());

    let catalog = InMemoryCatalog::from_json_file(&catalog_path)?;
    let processor = RecipeTextProcessor::new();
    let recipes = args
        .iter()
        .map(|path| load_recipe(&processor, Path::new(path)))
        .collect::<Result<Vec<_>>>()?;

    let pipeline = ShoppingPipeline::from_config(&config);
    let list = pipeline
        .run(&recipes, &catalog)
        .context("Failed to build shopping list")?;

    if json_output {
        println!("{}", serde_json::to_string_pretty(&list)?);
    } else {
        print!("{}", list);
    }

    Ok(())
}
