//! Hot reloading for scheduler systems.
//!
//! Modules register named systems with a [`Scheduler`]. When a module is
//! edited and re-evaluated, the [`HotReloadCoordinator`] swaps changed systems
//! into their existing slots, adds new ones and removes the ones the module no
//! longer registers. Unloading a module removes everything it owned.
//!
//! ```no_run
//! use std::sync::Arc;
//! use system_reload::hot_reload::{DirectoryLoader, HotReloadConfig, HotReloadCoordinator, ManifestEvaluator};
//! use system_reload::Scheduler;
//!
//! # fn main() -> anyhow::Result<()> {
//! let config = HotReloadConfig::load("reload.toml")?;
//! let scheduler = Arc::new(Scheduler::new());
//! let mut loader = DirectoryLoader::new(&config, Arc::new(ManifestEvaluator::default()));
//! let _coordinator = HotReloadCoordinator::start(&config.roots, scheduler.clone(), &mut loader)?;
//!
//! scheduler.run(1.0 / 60.0);
//! loader.reload("systems/physics.systems")?;
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod hot_reload;
pub mod scheduler;

pub use error::{ReloadError, ReloadResult};
pub use hot_reload::{HotReloadConfig, HotReloadCoordinator, ModuleId};
pub use scheduler::{Scheduler, SystemHandle, SystemInfo};
