//! synth's main application entry point.
//! Handles command-line argument parsing and drives the runner.

use synth::{
    cli::{get_args, Args},
    config::{get_config, load_config},
    error::{default_error_handler, Result},
    generator::GeneratorSource,
    logger::init_logger,
    renderer::MiniJinjaRenderer,
    runner::Runner,
};

/// Main application entry point.
fn main() {
    let args = get_args();
    init_logger(args.verbose);

    if let Err(err) = run(args) {
        default_error_handler(err);
    }
}

/// Main application logic execution.
///
/// # Flow
/// 1. Loads and validates the synth file
/// 2. Picks the generator (command or pre-generated output)
/// 3. Runs every mapping: generate, copy, patch
/// 4. Runs the post-process command
fn run(args: Args) -> Result<()> {
    let library_root = args.resolved_library_root();
    let config = match &args.synth_file {
        Some(path) => load_config(path)?,
        None => get_config(&library_root)?,
    };

    let source = GeneratorSource::resolve(args.generator_output.clone(), &config);
    println!("Using generator from the {source}");
    let generator = source.into_generator();
    let renderer = MiniJinjaRenderer::new();

    let runner = Runner::new(&*generator, &renderer, &library_root, args.skip_post_process);
    for report in runner.run(&config)? {
        println!("Mapping {}:", report.target);
        for copied in &report.copied {
            println!("  {}: '{}'", copied.action, copied.target.display());
        }
        for outcome in &report.rules {
            println!("  Rule '{}': {}", outcome.rule, outcome);
        }
    }

    println!("Synthesis completed successfully in {}.", library_root.display());
    Ok(())
}
