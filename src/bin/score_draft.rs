//! Score one draft file offline and print the report as YAML.
//!
//! Usage: `score-draft <draft.yaml> [--equation ID] [--write]`

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;

use ripplewriter_studio::analyze::load_equations;
use ripplewriter_studio::draft::{load_draft_file, save_draft_file};
use ripplewriter_studio::{score_draft, StudioConfig};

/// Score a RippleWriter draft
#[derive(Parser, Debug)]
#[clap(name = "score-draft")]
#[clap(about = "Compute signals and the ripple score for one draft YAML file")]
struct Args {
    /// Draft YAML file
    #[clap(value_name = "DRAFT")]
    draft: PathBuf,

    /// Equation id or display name (defaults to the draft's own choice)
    #[clap(long, short = 'e', env = "RIPPLE_EQUATION")]
    equation: Option<String>,

    /// Save the updated `meta` back into the draft file
    #[clap(long, short = 'w')]
    write: bool,
}

fn main() -> Result<()> {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt()
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let cfg = StudioConfig::load()?;

    let load = load_equations(&cfg.paths.equations);
    if let Some(w) = &load.warning {
        tracing::warn!("{w}");
    }

    let mut draft = load_draft_file(&args.draft)?;
    let report = score_draft(&mut draft, args.equation.as_deref(), &load.registry, &cfg);

    print!("{}", serde_yaml::to_string(&report)?);
    println!("# ripple score: {}%", report.percent());

    if args.write {
        save_draft_file(&args.draft, &draft)?;
        tracing::info!(path = %args.draft.display(), "draft meta written");
    }
    Ok(())
}
