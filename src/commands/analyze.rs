use crate::cli::Cli;
use crate::services::output::{print_one, render_text, write_report};
use crate::services::pipeline::analyze_files;
use crate::services::settings::{apply_overrides, load_config};
use tracing::info;

pub fn handle_analyze(cli: &Cli) -> anyhow::Result<()> {
    let cfg = load_config(cli.config.as_deref())?;
    let cfg = apply_overrides(cfg, cli.tolerance, cli.gap_threshold)?;

    let report = analyze_files(&cli.system_a, &cli.system_c, cli.multilayer, &cfg)?;

    if let Some(path) = &cli.output {
        write_report(path, &report)?;
        info!(path = %path.display(), "report written");
    }
    print_one(cli.json(), report, render_text)
}
