//! `pizza-city ssg` - Render every static page to disk.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;
use edge_sdk::prelude::*;
use serde::Serialize;

use crate::output::{format_duration, Output};

/// Config file picked up from the working directory when `--config` is
/// not given.
pub const DEFAULT_CONFIG: &str = "edge.toml";

#[derive(Args, Debug, Default)]
pub struct SsgArgs {
    /// Config file (TOML, or JSON with a .json extension)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Output directory
    #[arg(short, long)]
    pub out_dir: Option<PathBuf>,

    /// Origin pages are requested against
    #[arg(long)]
    pub origin: Option<String>,

    /// Number of workers
    #[arg(short, long)]
    pub workers: Option<usize>,

    /// Do not write HTML files
    #[arg(long)]
    pub no_html: bool,

    /// Do not write q-data.json files
    #[arg(long)]
    pub no_data: bool,
}

#[derive(Serialize)]
struct Summary<'a> {
    out_dir: String,
    rendered: usize,
    errors: usize,
    duration_ms: u128,
    static_paths: &'a [String],
    failures: &'a [StaticWorkerRenderResult],
}

/// Options from the config file with command line overrides applied.
pub fn resolve_options(args: &SsgArgs) -> Result<StaticGenerateOptions> {
    let mut options = match &args.config {
        Some(path) => load_options(path)?,
        None if Path::new(DEFAULT_CONFIG).exists() => load_options(DEFAULT_CONFIG)?,
        None => StaticGenerateOptions::default(),
    };

    if let Some(out_dir) = &args.out_dir {
        options = options.with_out_dir(out_dir);
    }
    if let Some(origin) = &args.origin {
        options = options.with_origin(origin);
    }
    if let Some(workers) = args.workers {
        options = options.with_max_workers(workers);
    }
    if args.no_html {
        options = options.with_emit_html(false);
    }
    if args.no_data {
        options = options.with_emit_data(false);
    }
    Ok(options)
}

pub async fn run(args: SsgArgs, output: &Output) -> Result<()> {
    let options = resolve_options(&args)?;
    let out_dir = options.out_dir.display().to_string();

    output.header("Static generation");
    output.kv("Origin", &options.origin);
    output.kv("Output", &out_dir);

    let plan = pizza_city::plan().context("Failed to build the route plan")?;
    let sys = Arc::new(FsSystem::new(options));

    let mut progress = None;
    let mut failures = Vec::new();
    let result = generate_with_progress(sys, plan, |event| match event {
        GenerateEvent::Started { total, workers } => {
            output.debug(&format!("{} pathnames across {} workers", total, workers));
            progress = Some(output.progress(total as u64, "rendering"));
        }
        GenerateEvent::Rendered(render) => {
            if let Some(pb) = &progress {
                pb.set_message(render.pathname.clone());
                pb.inc(1);
            }
            if render.error.is_some() {
                failures.push(render.clone());
            }
        }
    })
    .await
    .context("Static generation failed")?;

    if let Some(pb) = progress {
        pb.finish_and_clear();
    }

    if output.is_json() {
        output.json(&Summary {
            out_dir,
            rendered: result.rendered,
            errors: result.errors,
            duration_ms: result.duration.as_millis(),
            static_paths: &result.static_paths,
            failures: &failures,
        });
    } else {
        output.success(&format!(
            "Rendered {} pages in {}",
            result.rendered,
            format_duration(result.duration)
        ));
        for path in &result.static_paths {
            output.list_item(path);
        }
        for failure in &failures {
            output.warn(&format!(
                "{}: {}",
                failure.pathname,
                failure.error.as_deref().unwrap_or_default()
            ));
        }
    }

    if result.errors > 0 {
        anyhow::bail!("{} pages failed to render", result.errors);
    }
    Ok(())
}
