use std::path::{Path, PathBuf};

use modkit_events::{EventConsumer, HostEvent};
use modkit_host::{NotificationSink, RunnerOptions, ScriptRegistry, ScriptRunner, World};
use tracing::{debug, error, info, warn};

use crate::config::{ConfigError, ModkitConfig};

/// The loaded plugin: owns the game-facing collaborators and the script runner,
/// and turns host events into dispatch calls.
///
/// Scripts are unloaded on `Shutdown`, on [`ModHost::unload`], and when the
/// host is dropped.
pub struct ModHost<W: World, N: NotificationSink> {
    world: W,
    sink: N,
    registry: ScriptRegistry,
    config: ModkitConfig,
    /// Where the config came from, re-read on reload
    config_path: Option<PathBuf>,
    runner: Option<ScriptRunner>,
}

impl<W: World, N: NotificationSink> ModHost<W, N> {
    pub fn new(world: W, sink: N, registry: ScriptRegistry, config: ModkitConfig) -> Self {
        Self {
            world,
            sink,
            registry,
            config,
            config_path: None,
            runner: None,
        }
    }

    /// Host running the built-in scripts, configured from the platform config file
    #[cfg(feature = "builtin-scripts")]
    pub fn with_builtin_scripts(world: W, sink: N) -> Self {
        let host = Self::new(
            world,
            sink,
            modkit_scripts::create_registry(),
            ModkitConfig::default(),
        );

        match ModkitConfig::config_path() {
            Ok(path) => host.with_config_file(path),
            Err(e) => {
                warn!(target: "host", "{}; using default configuration", e);
                host
            }
        }
    }

    /// Read the configuration from `path`, now and on every reload
    pub fn with_config_file(mut self, path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        self.config = read_config(&path).unwrap_or_default();
        self.config_path = Some(path);
        self
    }

    /// Instantiate every enabled script. Does nothing if already loaded.
    pub fn load(&mut self) {
        if self.runner.is_some() {
            warn!(target: "host", "Scripts already loaded");
            return;
        }

        let runner = self.build_runner();
        info!(target: "host", "Loaded {} script(s)", runner.script_count());
        self.runner = Some(runner);
    }

    /// Unload every script, re-read the configuration, and load again
    pub fn reload(&mut self) {
        info!(target: "host", "Reloading scripts");
        self.unload();

        if let Some(path) = &self.config_path {
            if let Some(config) = read_config(path) {
                self.config = config;
            }
        }

        self.load();
    }

    /// Release everything the scripts track and drop them
    pub fn unload(&mut self) {
        if let Some(mut runner) = self.runner.take() {
            runner.unload_scripts(&mut self.world, &mut self.sink);
            info!(target: "host", "Scripts unloaded");
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.runner.is_some()
    }

    pub fn runner(&self) -> Option<&ScriptRunner> {
        self.runner.as_ref()
    }

    pub fn runner_mut(&mut self) -> Option<&mut ScriptRunner> {
        self.runner.as_mut()
    }

    pub fn config(&self) -> &ModkitConfig {
        &self.config
    }

    /// Replace the configuration; takes effect on the next load or reload
    pub fn set_config(&mut self, config: ModkitConfig) {
        self.config = config;
    }

    pub fn world(&self) -> &W {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut W {
        &mut self.world
    }

    pub fn sink(&self) -> &N {
        &self.sink
    }

    fn build_runner(&self) -> ScriptRunner {
        let options = match self.config.to_runner_options() {
            Ok(options) => options,
            Err(e) => {
                error!(target: "host", "Invalid configuration, using defaults: {}", e);
                RunnerOptions::default()
            }
        };

        if !self.config.scripting.enabled {
            info!(target: "host", "Scripting disabled by config");
            return ScriptRunner::new_with_notification_timeout(options.notification_timeout);
        }

        self.registry.create_runner(&options)
    }
}

/// Read a config file, logging and returning `None` on failure. A missing file
/// reads as the default configuration.
fn read_config(path: &Path) -> Option<ModkitConfig> {
    match ModkitConfig::load_from(path) {
        Ok(config) => Some(config),
        Err(ConfigError::NotFound(_)) => {
            info!(target: "host", "No config at {}, using defaults", path.display());
            Some(ModkitConfig::default())
        }
        Err(e) => {
            error!(target: "host", "{}", e);
            None
        }
    }
}

impl<W: World, N: NotificationSink> EventConsumer for ModHost<W, N> {
    fn handle_event(&mut self, event: HostEvent) {
        match event {
            HostEvent::ReloadScripts => self.reload(),
            HostEvent::Shutdown => self.unload(),
            event => match self.runner.as_mut() {
                Some(runner) => runner.handle_event(&event, &mut self.world, &mut self.sink),
                None => debug!(target: "host", "Scripts not loaded, dropping {:?}", event),
            },
        }
    }
}

impl<W: World, N: NotificationSink> Drop for ModHost<W, N> {
    fn drop(&mut self) {
        self.unload();
    }
}
