pub mod angle;
mod error;
pub mod layout;
pub mod showtime;

use std::{
    fs,
    path::{Path, PathBuf},
};

use bevy::prelude::*;
use serde::{Serialize, de::DeserializeOwned};
use toml::Table;

use crate::{
    behavior::BehaviorConfig, motion::sequence::MotionLibrary, navigation::NavigatorConfig,
    playbook::PlaybookConfig,
};

pub use error::{ConfigError, ConfigKind};
pub use layout::{FieldConfig, LayoutConfig};
pub use showtime::{PlayerConfig, ShowtimeConfig};

/// A configuration struct that is stored as a toml file.
pub trait Config: Sized + DeserializeOwned + Serialize {
    /// Path of the file, relative to the config directory.
    const PATH: &'static str;

    /// Loads the config from the main config directory.
    fn load(main_dir: &Path) -> Result<Self, ConfigError> {
        let table = read_table(&main_dir.join(Self::PATH), ConfigKind::Main)?;
        deserialize(table, Self::PATH)
    }

    /// Loads the config from the main config directory, with every key that is also present in
    /// the overlay directory replaced by the overlay value.
    fn load_with_overlay(main_dir: &Path, overlay_dir: &Path) -> Result<Self, ConfigError> {
        let main = read_table(&main_dir.join(Self::PATH), ConfigKind::Main)?;
        let overlay = read_table(&overlay_dir.join(Self::PATH), ConfigKind::Overlay)?;

        deserialize(merge(main, overlay), Self::PATH)
    }
}

fn read_table(path: &Path, kind: ConfigKind) -> Result<Table, ConfigError> {
    let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        kind,
        source,
    })?;

    contents.parse().map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

fn deserialize<T: DeserializeOwned>(table: Table, name: &'static str) -> Result<T, ConfigError> {
    toml::Value::Table(table)
        .try_into()
        .map_err(|source| ConfigError::Invalid { name, source })
}

/// Merges `overlay` into `main`.
///
/// Tables are merged recursively, any other value present in `overlay` replaces the one in
/// `main`. Keys that only exist in `overlay` are dropped, so an overlay can never introduce a
/// setting the main config does not know about.
#[must_use]
pub fn merge(main: Table, mut overlay: Table) -> Table {
    main.into_iter()
        .map(|(key, value)| {
            let merged = match (value, overlay.remove(&key)) {
                (toml::Value::Table(main), Some(toml::Value::Table(overlay))) => {
                    toml::Value::Table(merge(main, overlay))
                }
                (_, Some(overlay)) => overlay,
                (value, None) => value,
            };
            (key, merged)
        })
        .collect()
}

/// Plugin that loads all configuration structs from files and inserts them as resources.
///
/// It provides the following resources to the application:
/// - [`MainConfigDir`]
/// - [`OverlayConfigDir`]
/// - [`ShowtimeConfig`], [`LayoutConfig`], [`NavigatorConfig`], [`PlaybookConfig`],
///   [`BehaviorConfig`] and [`MotionLibrary`]
pub struct ConfigPlugin {
    /// Directory containing the main config files.
    pub main_dir: PathBuf,
    /// Name of the robot, its overlay is read from `<main_dir>/overlay/<robot>/`.
    pub robot: String,
}

impl Plugin for ConfigPlugin {
    fn build(&self, app: &mut App) {
        assert!(
            self.main_dir.is_dir(),
            "main config directory `{}` does not exist",
            self.main_dir.display()
        );

        let overlay_dir = self.main_dir.join("overlay").join(&self.robot);
        if !overlay_dir.is_dir() {
            tracing::warn!(
                "overlay config directory for {} does not exist, using main configs only",
                self.robot
            );
        }

        app.insert_resource(MainConfigDir(self.main_dir.clone()))
            .insert_resource(OverlayConfigDir(overlay_dir));

        app.init_config::<ShowtimeConfig>()
            .init_config::<LayoutConfig>()
            .init_config::<NavigatorConfig>()
            .init_config::<PlaybookConfig>()
            .init_config::<BehaviorConfig>()
            .init_config::<MotionLibrary>();

        let showtime = app.world().resource::<ShowtimeConfig>();
        let player = showtime.player(&self.robot).unwrap_or_else(|| {
            panic!("could not find robot {} in showtime config", self.robot)
        });
        app.insert_resource(player);
    }
}

/// Directory where the main configs are stored
#[derive(Resource, Debug)]
pub struct MainConfigDir(PathBuf);

impl<T: Into<PathBuf>> From<T> for MainConfigDir {
    fn from(value: T) -> Self {
        Self(value.into())
    }
}

/// Directory where the overlay configs are stored
#[derive(Resource, Debug)]
pub struct OverlayConfigDir(PathBuf);

impl<T: Into<PathBuf>> From<T> for OverlayConfigDir {
    fn from(value: T) -> Self {
        Self(value.into())
    }
}

/// Trait for adding configs to an [`App`]
pub trait ConfigExt {
    /// Loads the configuration `T` and inserts it as a resource.
    fn init_config<T: Resource + Config>(&mut self) -> &mut Self;
}

impl ConfigExt for App {
    fn init_config<T: Resource + Config>(&mut self) -> &mut Self {
        let world = self.world();
        let main_dir = &world.resource::<MainConfigDir>().0;
        let overlay_dir = &world.resource::<OverlayConfigDir>().0;

        let config = match T::load_with_overlay(main_dir, overlay_dir) {
            Ok(config) => Ok(config),
            Err(ConfigError::Read {
                path,
                kind: ConfigKind::Overlay,
                ..
            }) => {
                tracing::debug!("`{}`: no overlay at `{}`", T::PATH, path.display());
                T::load(main_dir)
            }
            Err(error) => Err(error),
        }
        .unwrap_or_else(|error| panic!("failed to load config `{}`: {error}", T::PATH));

        self.insert_resource(config);
        self
    }
}
