//! dea - Differential Expression Analysis CLI
//!
//! Command-line interface for the proteomics DE pipeline.

use clap::{Parser, Subcommand};
use proteo_dea::data::{AbundanceMatrix, CategoryLists, IdMap, IdSet, SampleMetadata};
use proteo_dea::enrich::{analyze_enrichment, observed_genes};
use proteo_dea::error::Result;
use proteo_dea::filter::filter_missingness;
use proteo_dea::pipeline::{run_standard, Pipeline, PipelineConfig, DEFAULT_MAX_MISSING};
use proteo_dea::rank::build_ranking;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Proteomics differential-expression analysis
#[derive(Parser)]
#[command(name = "dea")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a pipeline from a YAML configuration file
    Run {
        /// Path to pipeline configuration YAML
        #[arg(long)]
        config: PathBuf,

        /// Path to abundance table TSV
        #[arg(short, long)]
        abundance: PathBuf,

        /// Path to sample metadata TSV
        #[arg(short, long)]
        metadata: PathBuf,

        /// Output path for the DE results TSV
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Run the standard differential-expression workflow
    De {
        /// Path to abundance table TSV
        #[arg(short, long)]
        abundance: PathBuf,

        /// Path to sample metadata TSV
        #[arg(short, long)]
        metadata: PathBuf,

        /// Output path for the DE results TSV
        #[arg(short, long)]
        output: PathBuf,

        /// Maximum missing values per protein
        #[arg(long, default_value_t = DEFAULT_MAX_MISSING)]
        max_missing: usize,

        /// Optional inclusion panel (single-column TSV of gene symbols)
        #[arg(long)]
        panel: Option<PathBuf>,
    },

    /// Test compartment enrichment of the observed protein set
    Enrich {
        /// Path to abundance table TSV
        #[arg(short, long)]
        abundance: PathBuf,

        /// Path to category reference lists (ragged multi-column TSV)
        #[arg(short, long)]
        categories: PathBuf,

        /// Path to whole-proteome reference (single-column TSV)
        #[arg(short, long)]
        proteome: PathBuf,

        /// Output path for the enrichment TSV
        #[arg(short, long)]
        output: PathBuf,

        /// Maximum missing values per protein
        #[arg(long, default_value_t = DEFAULT_MAX_MISSING)]
        max_missing: usize,
    },

    /// Build a ranked gene list for GSEA from one contrast
    Rank {
        /// Path to abundance table TSV
        #[arg(short, long)]
        abundance: PathBuf,

        /// Path to sample metadata TSV
        #[arg(short, long)]
        metadata: PathBuf,

        /// Path to accession-to-gene mapping TSV
        #[arg(long)]
        mapping: PathBuf,

        /// Target contrast, e.g. "Dementia-AD_over_Normal"
        #[arg(short, long)]
        contrast: String,

        /// Output path for the ranked list TSV
        #[arg(short, long)]
        output: PathBuf,

        /// Maximum missing values per protein
        #[arg(long, default_value_t = DEFAULT_MAX_MISSING)]
        max_missing: usize,

        /// Optional inclusion panel (single-column TSV of gene symbols)
        #[arg(long)]
        panel: Option<PathBuf>,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            config,
            abundance,
            metadata,
            output,
        } => {
            let yaml = std::fs::read_to_string(&config)?;
            let config = PipelineConfig::from_yaml(&yaml)?;
            let (matrix, annotations) = AbundanceMatrix::from_tsv(&abundance)?;
            let meta = SampleMetadata::from_tsv(&metadata)?;

            let results = Pipeline::from_config(&config).run(&matrix, &annotations, &meta)?;
            results.to_tsv(&output)?;
            println!("Pipeline '{}' complete.", config.name);
            println!("{}", results.summary());
            println!("Results written to {}", output.display());
        }

        Commands::De {
            abundance,
            metadata,
            output,
            max_missing,
            panel,
        } => {
            let (matrix, annotations) = AbundanceMatrix::from_tsv(&abundance)?;
            let meta = SampleMetadata::from_tsv(&metadata)?;
            let panel = panel.map(IdSet::from_tsv).transpose()?;

            let results =
                run_standard(&matrix, &annotations, &meta, max_missing, panel.as_ref())?;
            results.to_tsv(&output)?;
            println!("{}", results.summary());
            println!("Results written to {}", output.display());
        }

        Commands::Enrich {
            abundance,
            categories,
            proteome,
            output,
            max_missing,
        } => {
            let (matrix, annotations) = AbundanceMatrix::from_tsv(&abundance)?;
            let categories = CategoryLists::from_tsv(&categories)?;
            let proteome = IdSet::from_tsv(&proteome)?;

            let (filtered, report) = filter_missingness(&matrix, max_missing)?;
            let observed = observed_genes(&filtered, &annotations);
            let analysis = analyze_enrichment(&observed, &categories, &proteome)?;
            analysis.to_tsv(&output)?;

            println!(
                "Tested {} categories against {} observed proteins ({} before filtering).",
                analysis.len(),
                report.n_kept,
                report.n_before
            );
            for r in &analysis.records {
                println!(
                    "  {}: fold {:.2} {} {}",
                    r.category,
                    r.fold_enrichment,
                    r.direction.name(),
                    r.significance
                );
            }
            println!("Results written to {}", output.display());
        }

        Commands::Rank {
            abundance,
            metadata,
            mapping,
            contrast,
            output,
            max_missing,
            panel,
        } => {
            let (matrix, annotations) = AbundanceMatrix::from_tsv(&abundance)?;
            let meta = SampleMetadata::from_tsv(&metadata)?;
            let mapping = IdMap::from_tsv(&mapping)?;
            let panel = panel.map(IdSet::from_tsv).transpose()?;

            let results =
                run_standard(&matrix, &annotations, &meta, max_missing, panel.as_ref())?;
            let ranking = build_ranking(&results, &contrast, &mapping)?;
            ranking.to_tsv(&output)?;

            println!(
                "Ranked {} genes for contrast '{}'.",
                ranking.len(),
                contrast
            );
            println!("Results written to {}", output.display());
        }
    }

    Ok(())
}
