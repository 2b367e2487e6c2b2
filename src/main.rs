use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};

use figmap::export::{Exporter, JsonExporter};
use figmap::pipeline::{build_figure_map, export_outputs, load_inputs, InputPaths, PipelineConfig};

#[derive(Parser, Debug)]
#[command(name = "figmap")]
#[command(version, about = "Map document figures to the sentences and sections that cite them", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Suppress progress output
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Log per-item decisions
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Attach middle-structure geometry to every content-list item
    Merge {
        #[command(flatten)]
        inputs: DocumentArgs,
    },

    /// Merge, then link figures and tables to the sentences citing them
    Match {
        #[command(flatten)]
        inputs: DocumentArgs,

        /// Identifier recorded in the matching report
        #[arg(long)]
        document_id: Option<String>,
    },

    /// Merge, match, and assign every figure to a section lane
    Map {
        #[command(flatten)]
        inputs: DocumentArgs,

        /// JSON object of lane name to lane text
        #[arg(long)]
        lanes: PathBuf,

        /// JSON object of figure id to encoded image
        #[arg(long)]
        assets: Option<PathBuf>,

        /// Identifier recorded in the matching report
        #[arg(long)]
        document_id: Option<String>,
    },
}

#[derive(Args, Debug)]
struct DocumentArgs {
    /// Content list JSON file
    content_list: PathBuf,

    /// Middle structure JSON file
    middle: PathBuf,

    /// Output directory (default: ./<content_list_name>_output)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Pipeline configuration JSON file
    #[arg(short, long)]
    config: Option<PathBuf>,
}

impl DocumentArgs {
    fn output_dir(&self) -> PathBuf {
        self.output.clone().unwrap_or_else(|| {
            let stem = self
                .content_list
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_else(|| "figmap".to_string());
            PathBuf::from(format!("{stem}_output"))
        })
    }

    fn load_config(&self) -> Result<PipelineConfig> {
        match &self.config {
            Some(path) => PipelineConfig::from_file(path),
            None => Ok(PipelineConfig::default()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Stage {
    Merge,
    Match,
    Map,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();

    match cli.command {
        Commands::Merge { inputs } => run(Stage::Merge, &inputs, None, None, None, cli.quiet),
        Commands::Match {
            inputs,
            document_id,
        } => run(Stage::Match, &inputs, None, None, document_id, cli.quiet),
        Commands::Map {
            inputs,
            lanes,
            assets,
            document_id,
        } => run(
            Stage::Map,
            &inputs,
            Some(lanes),
            assets,
            document_id,
            cli.quiet,
        ),
    }
}

fn run(
    stage: Stage,
    args: &DocumentArgs,
    lanes: Option<PathBuf>,
    assets: Option<PathBuf>,
    document_id: Option<String>,
    quiet: bool,
) -> Result<()> {
    for path in [&args.content_list, &args.middle] {
        ensure_file(path)?;
    }
    if let Some(path) = &lanes {
        ensure_file(path)?;
    }

    let output_dir = args.output_dir();
    let mut config = args.load_config()?;
    if document_id.is_some() {
        config.document_id = document_id;
    }

    if !quiet {
        println!("[*] Content list: {}", args.content_list.display());
        println!("[*] Middle structure: {}", args.middle.display());
        println!("[*] Output: {}", output_dir.display());
    }

    let paths = InputPaths {
        content_list: args.content_list.clone(),
        middle: args.middle.clone(),
        lanes,
        assets,
    };
    let inputs = load_inputs(&paths)?;

    if !quiet {
        println!("\n[+] Processing {} content items...", inputs.content_list.len());
    }

    let result = build_figure_map(&config, &inputs);

    if !quiet {
        let matched = result.merged.iter().filter(|r| r.is_matched()).count();
        println!("[+] Matched {matched}/{} items", result.merged.len());
        if stage != Stage::Merge {
            println!(
                "[+] {} figures, {} references linked",
                result.matching.total_figures, result.matching.total_matches
            );
        }
        println!("[+] Exporting results...");
    }

    let exported = match stage {
        Stage::Merge => {
            std::fs::create_dir_all(&output_dir)?;
            let data = serde_json::to_string_pretty(&result.merged)?;
            std::fs::write(output_dir.join("merged.json"), data).map_err(anyhow::Error::from)
        }
        Stage::Match => JsonExporter::new(output_dir.clone()).export(&result),
        Stage::Map => export_outputs(&result, &output_dir),
    };
    exported.with_context(|| format!("Failed to export to: {}", output_dir.display()))?;

    if !quiet {
        println!("\n[✓] Done! Results saved to: {}", output_dir.display());
    }

    Ok(())
}

fn ensure_file(path: &Path) -> Result<()> {
    if !path.exists() {
        anyhow::bail!("Input file does not exist: {}", path.display());
    }
    if !path.is_file() {
        anyhow::bail!("Input is not a file: {}", path.display());
    }
    Ok(())
}
