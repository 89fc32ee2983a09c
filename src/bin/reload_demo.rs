/// Hot reload walkthrough
/// Run with: cargo run --bin reload_demo [config.toml]
///
/// Without a config the demo builds a throwaway module tree, then edits,
/// migrates and deletes modules while printing the scheduler order.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use system_reload::hot_reload::{DirectoryLoader, HotReloadConfig, HotReloadCoordinator, ManifestEvaluator, RunLog};
use system_reload::Scheduler;
use tempfile::TempDir;

fn print_state(step: &str, scheduler: &Scheduler, runs: &RunLog) {
    scheduler.run(1.0 / 60.0);
    println!("{step}");
    println!("  order: {:?}", scheduler.system_names());
    println!("  ran:   {:?}\n", runs.take());
}

fn write(path: &Path, body: &str) -> anyhow::Result<()> {
    fs::write(path, body).with_context(|| format!("writing {}", path.display()))
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    // Removed on drop, including early returns
    let temp_dir = TempDir::with_prefix("system_reload_demo_").context("creating demo directory")?;
    let tree = temp_dir.path();
    fs::create_dir_all(tree.join("ui")).context("creating demo module tree")?;

    let config = match std::env::args().nth(1) {
        Some(path) => HotReloadConfig::load(path)?,
        None => HotReloadConfig {
            roots: vec![tree.to_path_buf()],
            ..HotReloadConfig::default()
        },
    };

    let game = tree.join("game.systems");
    let hud = tree.join("ui").join("hud.systems");
    write(&game, "system physics\nsystem render\n")?;
    write(&hud, "# overlay\nsystem hud\n")?;

    let runs = RunLog::new();
    let scheduler = Arc::new(Scheduler::new());
    let mut loader = DirectoryLoader::new(&config, Arc::new(ManifestEvaluator::new(runs.clone())));
    let coordinator = HotReloadCoordinator::start(&config.roots, scheduler.clone(), &mut loader)?;
    print_state("1. Initial scan", &scheduler, &runs);

    if loader.module_id(&game).is_some() {
        write(&game, "system physics\nsystem ui\n")?;
        loader.reload(&game)?;
        print_state("2. game.systems edited (render -> ui)", &scheduler, &runs);

        loader.replace_module(&game)?;
        print_state("3. game.systems re-created under a new identity", &scheduler, &runs);

        write(&game, "system physics\nfail unfinished edit\nsystem ui\n")?;
        let outcome = loader.reload(&game)?;
        println!("   failure: {:?}", outcome.failure);
        print_state("4. game.systems saved mid-edit", &scheduler, &runs);
    }

    if loader.module_id(&hud).is_some() {
        fs::remove_file(&hud).context("removing hud module")?;
        loader.remove(&hud)?;
        print_state("5. ui/hud.systems deleted", &scheduler, &runs);
    }

    println!("Tracked modules: {:?}", coordinator.tracked_modules());
    Ok(())
}
