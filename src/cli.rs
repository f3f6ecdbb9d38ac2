use clap::{Parser, ValueEnum};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "reflow",
    version,
    about = "Infer the transformation that turns system A into system C"
)]
pub struct Cli {
    #[arg(help = "Graph JSON for the system before the change")]
    pub system_a: PathBuf,
    #[arg(help = "Graph JSON for the system after the change")]
    pub system_c: PathBuf,
    #[arg(long, default_value_t = false, help = "Decompose B into sequential layers")]
    pub multilayer: bool,
    #[arg(short, long, default_value_t = false, help = "Log pipeline steps to stderr")]
    pub verbose: bool,
    #[arg(short, long, help = "Also write the JSON report to this file")]
    pub output: Option<PathBuf>,
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
    #[arg(long, env = "REFLOW_CONFIG", help = "TOML file with engine thresholds")]
    pub config: Option<PathBuf>,
    #[arg(long, help = "Relative pseudoinverse tolerance (overrides config)")]
    pub tolerance: Option<f64>,
    #[arg(long, help = "Singular value gap that splits layers (overrides config)")]
    pub gap_threshold: Option<f64>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

impl Cli {
    pub fn json(&self) -> bool {
        self.format == OutputFormat::Json
    }
}
