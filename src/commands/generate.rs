//! Generate the site

use anyhow::Result;
use notify_debouncer_mini::{new_debouncer, notify::RecursiveMode};
use std::time::Duration;

use crate::content::ContentLoader;
use crate::generator::{self, copy_static_files, prepare_destination, write_pages, RunReport};
use crate::theme::TemplateResolver;
use crate::Site;

/// Load, compose and write the whole site.
///
/// Item-level failures end up in the returned report. Configuration,
/// cyclic templates and output IO abort the run with an error.
pub fn run(site: &Site) -> Result<RunReport> {
    let start = std::time::Instant::now();

    site.check_destination()?;

    // Templates first: a cyclic theme must abort before anything is touched
    let resolver = TemplateResolver::load(&site.layouts_dir, &site.includes_dir)?;

    let outcome = ContentLoader::new(site).load(&site.posts_dir);
    tracing::info!("Loaded {} posts", outcome.items.len());

    let mut composition = generator::compose(&outcome.items, &resolver, &site.config);
    composition
        .report
        .absorb_load_failures(outcome.failures, outcome.unpublished);

    prepare_destination(&site.destination_dir)?;
    let written = write_pages(&site.destination_dir, &composition.pages)?;
    let copied = copy_static_files(site)?;

    tracing::info!(
        "Wrote {} pages and {} static files in {:.2}s",
        written,
        copied,
        start.elapsed().as_secs_f64()
    );

    Ok(composition.report)
}

/// Regenerate whenever the source or configuration changes
pub fn watch(site: &Site) -> Result<()> {
    let (tx, rx) = std::sync::mpsc::channel();
    let mut debouncer = new_debouncer(Duration::from_millis(500), tx)?;

    debouncer
        .watcher()
        .watch(&site.source_dir, RecursiveMode::Recursive)?;
    tracing::debug!("Watching: {:?}", site.source_dir);

    let config_path = site.base_dir.join("_config.yml");
    if config_path.exists() && !config_path.starts_with(&site.source_dir) {
        debouncer
            .watcher()
            .watch(&config_path, RecursiveMode::NonRecursive)?;
        tracing::debug!("Watching: {:?}", config_path);
    }

    tracing::info!("Watching for changes. Press Ctrl+C to stop.");

    loop {
        match rx.recv() {
            Ok(Ok(events)) => {
                let relevant: Vec<_> = events
                    .iter()
                    .filter(|e| {
                        !e.path.starts_with(&site.destination_dir)
                            && !e.path.to_string_lossy().contains(".git")
                            && !e.path.to_string_lossy().ends_with('~')
                    })
                    .collect();
                if relevant.is_empty() {
                    continue;
                }
                for event in &relevant {
                    tracing::info!("Changed: {}", event.path.display());
                }

                // Configuration may have changed too
                let site = match Site::new(&site.base_dir) {
                    Ok(site) => site,
                    Err(e) => {
                        tracing::error!("{}", e);
                        continue;
                    }
                };
                match run(&site) {
                    Ok(report) => println!("{}", report),
                    Err(e) => tracing::error!("Generation failed: {:#}", e),
                }
            }
            Ok(Err(e)) => tracing::error!("Watch error: {:?}", e),
            Err(e) => {
                tracing::error!("Channel error: {:?}", e);
                break;
            }
        }
    }

    Ok(())
}
