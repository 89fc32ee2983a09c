// Directory-backed hot reload integration tests
//
// Drives the coordinator through the bundled DirectoryLoader and manifest
// modules on a temporary module tree.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use system_reload::hot_reload::{
    DirectoryLoader, HotReloadConfig, HotReloadCoordinator, ManifestEvaluator, RunLog,
};
use system_reload::{ReloadError, Scheduler};
use tempfile::TempDir;

struct Harness {
    _temp_dir: TempDir,
    root: PathBuf,
    scheduler: Arc<Scheduler>,
    loader: DirectoryLoader,
    coordinator: Arc<HotReloadCoordinator>,
    runs: RunLog,
}

fn write_module(root: &Path, relative: &str, systems: &[&str]) -> PathBuf {
    let path = root.join(relative);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("create module directory");
    }
    let body: String = systems.iter().map(|name| format!("system {name}\n")).collect();
    fs::write(&path, body).expect("write module");
    path
}

fn module<'a>(relative: &'a str, systems: &'a [&'a str]) -> (&'a str, &'a [&'a str]) {
    (relative, systems)
}

fn harness(config: HotReloadConfig, modules: &[(&str, &[&str])]) -> Harness {
    let temp_dir = TempDir::new().expect("temp dir");
    let root = temp_dir.path().to_path_buf();
    for (relative, systems) in modules {
        write_module(&root, relative, systems);
    }

    let runs = RunLog::new();
    let scheduler = Arc::new(Scheduler::new());
    let mut loader = DirectoryLoader::new(&config, Arc::new(ManifestEvaluator::new(runs.clone())));
    let coordinator = HotReloadCoordinator::start([&root], scheduler.clone(), &mut loader)
        .expect("start coordinator");

    Harness {
        _temp_dir: temp_dir,
        root,
        scheduler,
        loader,
        coordinator,
        runs,
    }
}

#[test]
fn test_scan_loads_modules_in_path_order() {
    let h = harness(
        HotReloadConfig::default(),
        &[
            module("physics.systems", &["physics", "render"]),
            module("ui/hud.systems", &["hud"]),
            module("notes.txt", &["ignored"]),
        ],
    );

    assert_eq!(h.scheduler.system_names(), vec!["physics", "render", "hud"]);
    assert_eq!(h.coordinator.tracked_modules().len(), 2);
    assert_eq!(h.loader.module_paths().len(), 2);

    h.scheduler.run(1.0 / 60.0);
    assert_eq!(h.runs.take(), vec!["physics", "render", "hud"]);
}

#[test]
fn test_non_recursive_scan_skips_subdirectories() {
    let config = HotReloadConfig {
        recursive: false,
        ..HotReloadConfig::default()
    };
    let h = harness(config, &[module("top.systems", &["top"]), module("nested/deep.systems", &["deep"])]);

    assert_eq!(h.scheduler.system_names(), vec!["top"]);
}

#[test]
fn test_edit_and_reload_reconciles_in_place() {
    let mut h = harness(
        HotReloadConfig::default(),
        &[module("game.systems", &["physics", "render"]), module("z_hud.systems", &["hud"])],
    );
    let id = h.loader.module_id(h.root.join("game.systems")).unwrap();

    let path = write_module(&h.root, "game.systems", &["physics", "ui"]);
    let outcome = h.loader.reload(&path).unwrap();

    assert_eq!(outcome.replaced, vec!["physics"]);
    assert_eq!(outcome.added, vec!["ui"]);
    assert_eq!(outcome.removed, vec!["render"]);
    assert_eq!(h.scheduler.system_names(), vec!["physics", "hud", "ui"]);
    assert_eq!(h.coordinator.system_names_of(id).unwrap(), vec!["physics", "ui"]);

    h.scheduler.run(0.016);
    assert_eq!(h.runs.count("render"), 0);
    assert_eq!(h.runs.count("physics"), 1);
}

#[test]
fn test_remove_module_file() {
    let mut h = harness(
        HotReloadConfig::default(),
        &[module("a.systems", &["a"]), module("b.systems", &["b"])],
    );

    let path = h.root.join("a.systems");
    fs::remove_file(&path).unwrap();
    let outcome = h.loader.remove(&path).unwrap();

    assert_eq!(outcome.removed, vec!["a"]);
    assert_eq!(h.scheduler.system_names(), vec!["b"]);
    assert_eq!(h.coordinator.tracked_modules().len(), 1);
    assert!(h.loader.module_id(&path).is_none());
}

#[test]
fn test_replace_module_migrates_identity() {
    let mut h = harness(HotReloadConfig::default(), &[module("m.systems", &["a", "b"])]);
    let path = h.root.join("m.systems");
    let original = h.loader.module_id(&path).unwrap();

    write_module(&h.root, "m.systems", &["a", "c"]);
    let outcome = h.loader.replace_module(&path).unwrap();
    let migrated = h.loader.module_id(&path).unwrap();

    assert_ne!(original, migrated);
    assert_eq!(outcome.module, Some(migrated));
    assert_eq!(h.scheduler.system_names(), vec!["a", "c"]);
    assert_eq!(h.coordinator.tracked_modules(), vec![migrated]);
    assert!(h.coordinator.system_names_of(original).is_none());

    // Later edits reconcile against the new identity
    write_module(&h.root, "m.systems", &["c"]);
    h.loader.reload(&path).unwrap();
    assert_eq!(h.scheduler.system_names(), vec!["c"]);
}

#[test]
fn test_new_file_after_scan() {
    let mut h = harness(HotReloadConfig::default(), &[module("a.systems", &["a"])]);

    let path = write_module(&h.root, "later/b.systems", &["b"]);
    let outcome = h.loader.load(&path).unwrap();

    assert_eq!(outcome.added, vec!["b"]);
    assert_eq!(h.scheduler.system_names(), vec!["a", "b"]);
    assert_eq!(h.coordinator.tracked_modules().len(), 2);
}

#[test]
fn test_failed_evaluation_keeps_partial_registration() {
    let mut h = harness(HotReloadConfig::default(), &[module("m.systems", &["a", "b"])]);
    let path = h.root.join("m.systems");

    fs::write(&path, "system a\nfail half-saved file\nsystem b\n").unwrap();
    let outcome = h.loader.reload(&path).unwrap();

    assert!(outcome.failure.as_deref().unwrap().contains("half-saved file"));
    assert_eq!(h.scheduler.system_names(), vec!["a"]);

    // Fixing the file restores the removed system
    write_module(&h.root, "m.systems", &["a", "b"]);
    let outcome = h.loader.reload(&path).unwrap();
    assert!(outcome.is_success());
    assert_eq!(h.scheduler.system_names(), vec!["a", "b"]);
}

#[test]
fn test_unknown_paths_are_rejected() {
    let mut h = harness(HotReloadConfig::default(), &[module("a.systems", &["a"])]);

    assert!(matches!(
        h.loader.reload(h.root.join("missing.systems")),
        Err(ReloadError::UnknownModule { .. })
    ));
    assert!(matches!(
        h.loader.load("/elsewhere/x.systems"),
        Err(ReloadError::UnknownModule { .. })
    ));
}

#[test]
fn test_missing_root_fails_start() {
    let scheduler = Arc::new(Scheduler::new());
    let config = HotReloadConfig::default();
    let mut loader = DirectoryLoader::new(&config, Arc::new(ManifestEvaluator::default()));

    let result = HotReloadCoordinator::start(["/definitely/not/here"], scheduler, &mut loader);
    assert!(matches!(result, Err(ReloadError::Io { .. })));
}

#[test]
fn test_start_from_toml_config() {
    let temp_dir = TempDir::new().unwrap();
    let modules = temp_dir.path().join("mods");
    write_module(&modules, "core.sys", &["core"]);
    write_module(&modules, "skip.systems", &["skipped"]);

    let config_path = temp_dir.path().join("reload.toml");
    fs::write(
        &config_path,
        format!("roots = [{:?}]\nextensions = [\"sys\"]\n", modules.display().to_string()),
    )
    .unwrap();

    let config = HotReloadConfig::load(&config_path).unwrap();
    let scheduler = Arc::new(Scheduler::new());
    let mut loader = DirectoryLoader::new(&config, Arc::new(ManifestEvaluator::default()));
    HotReloadCoordinator::start(&config.roots, scheduler.clone(), &mut loader).unwrap();

    assert_eq!(scheduler.system_names(), vec!["core"]);
}

#[cfg(unix)]
#[test]
fn test_scan_does_not_follow_directory_symlink_loops() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path().join("mods");
    write_module(&root, "a.systems", &["a"]);
    std::os::unix::fs::symlink(&root, root.join("loop")).unwrap();

    let scheduler = Arc::new(Scheduler::new());
    let mut loader = DirectoryLoader::new(&HotReloadConfig::default(), Arc::new(ManifestEvaluator::default()));
    let coordinator = HotReloadCoordinator::start([&root], scheduler.clone(), &mut loader).unwrap();

    assert_eq!(scheduler.system_names(), vec!["a"]);
    assert_eq!(coordinator.tracked_modules().len(), 1);
    assert_eq!(loader.module_paths().len(), 1);
}

#[test]
fn test_equivalent_paths_name_the_same_module() {
    let mut h = harness(HotReloadConfig::default(), &[module("sub/a.systems", &["a"])]);
    let id = h.loader.module_id(h.root.join("sub/a.systems")).unwrap();

    assert_eq!(h.loader.module_id(h.root.join("sub/./a.systems")), Some(id));
    assert_eq!(h.loader.module_id(h.root.join("sub/../sub/a.systems")), Some(id));

    // Loading through an aliased path reloads the tracked module in place
    let outcome = h.loader.load(h.root.join(".").join("sub/a.systems")).unwrap();
    assert_eq!(outcome.module, Some(id));
    assert_eq!(outcome.replaced, vec!["a"]);
    assert_eq!(h.scheduler.system_names(), vec!["a"]);
    assert_eq!(h.coordinator.tracked_modules(), vec![id]);

    let removed = h.loader.remove(h.root.join("sub/./a.systems")).unwrap();
    assert_eq!(removed.removed, vec!["a"]);
    assert!(h.scheduler.is_empty());
}
