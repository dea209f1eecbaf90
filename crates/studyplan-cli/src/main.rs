//! studyplan CLI: curriculum progress, what-if risk and success prediction.

use std::path::PathBuf;
use std::process;

use clap::{Args, Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "studyplan",
    version,
    about = "Curriculum progress and subject risk advising"
)]
struct Cli {
    /// Config file path
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Variant selection shared by the catalog commands.
#[derive(Args)]
struct VariantArgs {
    /// Variant key, e.g. "202301-normal" (defaults to the configured variant)
    #[arg(long)]
    variant: Option<String>,

    /// Output format: text, json
    #[arg(long, default_value = "text")]
    format: String,
}

#[derive(Subcommand)]
enum Commands {
    /// List programme variants
    Variants {
        /// Output format: text, json
        #[arg(long, default_value = "text")]
        format: String,
    },

    /// List the courses of a variant
    Courses {
        #[command(flatten)]
        variant: VariantArgs,
    },

    /// List the elective groups of a variant
    Electives {
        #[command(flatten)]
        variant: VariantArgs,
    },

    /// Show completion progress against a variant
    Progress {
        #[command(flatten)]
        variant: VariantArgs,

        /// Completed subject codes (comma-separated)
        #[arg(long)]
        completed: Option<String>,

        /// Take completed subjects from this student's history
        #[arg(long)]
        student: Option<String>,

        /// Historical dataset CSV
        #[arg(long)]
        dataset: Option<PathBuf>,
    },

    /// Simulate the risk of a planned course load
    WhatIf {
        #[command(flatten)]
        variant: VariantArgs,

        /// Planned subject codes (comma-separated)
        #[arg(long)]
        planned: String,

        /// Completed subject codes (comma-separated)
        #[arg(long, default_value = "")]
        completed: String,

        /// Cumulative GPA (0-4)
        #[arg(long, default_value = "0.0")]
        cgpa: f64,

        /// Attendance percentage (0-100)
        #[arg(long, default_value = "0.0")]
        attendance: f64,

        /// Recent GPA trend (-1 to 1)
        #[arg(long, default_value = "0.0", allow_hyphen_values = true)]
        gpa_trend: f64,
    },

    /// Recommend next courses whose prerequisites are complete
    Recommend {
        #[command(flatten)]
        variant: VariantArgs,

        /// Completed subject codes (comma-separated)
        #[arg(long, default_value = "")]
        completed: String,

        /// Number of upcoming courses considered
        #[arg(long, default_value = "20")]
        limit: usize,
    },

    /// Predict a student's success in upcoming subjects
    Predict {
        /// Student identifier
        #[arg(long)]
        student: String,

        /// Subject codes (comma-separated)
        #[arg(long)]
        subjects: String,

        /// Historical dataset CSV
        #[arg(long)]
        dataset: Option<PathBuf>,

        /// Also report progress against this variant
        #[arg(long)]
        variant: Option<String>,

        /// Earlier JSON report to compare against
        #[arg(long)]
        baseline: Option<PathBuf>,

        /// Output format: text, json, markdown, html
        #[arg(long, default_value = "text")]
        format: String,

        /// Write the report to this file instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,

        /// Also keep a JSON copy under the configured output directory
        #[arg(long)]
        save: bool,
    },

    /// Show the prerequisite chain of a subject
    Chain {
        /// Subject code
        #[arg(long)]
        subject: String,

        /// Historical dataset CSV, used for subject names
        #[arg(long)]
        dataset: Option<PathBuf>,

        /// Output format: text, json
        #[arg(long, default_value = "text")]
        format: String,
    },

    /// Show cohort pass rates and averages
    CohortStats {
        /// Restrict to one subject
        #[arg(long)]
        subject: Option<String>,

        /// Historical dataset CSV
        #[arg(long)]
        dataset: Option<PathBuf>,

        /// Output format: text, json
        #[arg(long, default_value = "text")]
        format: String,
    },

    /// Create a starter config
    Init,
}

fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("studyplan=info".parse().unwrap()),
        )
        .init();

    let cli = Cli::parse();
    let config = cli.config;

    let result = match cli.command {
        Commands::Variants { format } => commands::catalog::variants(format),
        Commands::Courses { variant } => {
            commands::catalog::courses(config, variant.variant, variant.format)
        }
        Commands::Electives { variant } => {
            commands::catalog::electives(config, variant.variant, variant.format)
        }
        Commands::Progress {
            variant,
            completed,
            student,
            dataset,
        } => commands::progress::execute(
            config,
            variant.variant,
            completed,
            student,
            dataset,
            variant.format,
        ),
        Commands::WhatIf {
            variant,
            planned,
            completed,
            cgpa,
            attendance,
            gpa_trend,
        } => commands::what_if::execute(
            config,
            variant.variant,
            planned,
            completed,
            cgpa,
            attendance,
            gpa_trend,
            variant.format,
        ),
        Commands::Recommend {
            variant,
            completed,
            limit,
        } => commands::recommend::execute(config, variant.variant, completed, limit, variant.format),
        Commands::Predict {
            student,
            subjects,
            dataset,
            variant,
            baseline,
            format,
            output,
            save,
        } => commands::predict::execute(
            config, student, subjects, dataset, variant, baseline, format, output, save,
        ),
        Commands::Chain {
            subject,
            dataset,
            format,
        } => commands::chain::execute(config, subject, dataset, format),
        Commands::CohortStats {
            subject,
            dataset,
            format,
        } => commands::cohort_stats::execute(config, subject, dataset, format),
        Commands::Init => commands::init::execute(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
