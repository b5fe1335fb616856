#![forbid(unsafe_code)]

mod error;
mod inference;
mod readahead;
mod sampler;
mod window;

pub use error::Error;
pub use inference::Inference;
pub use readahead::Readahead;
pub use sampler::Sampler;
pub use window::Window;

use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct Config {
    pub sampler: Sampler,
    pub window: Window,
    pub inference: Inference,
    pub readahead: Readahead,
}

impl Config {
    /// Load configuration from a TOML file. Missing fields are filled with defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, Error> {
        let text = std::fs::read_to_string(path)?;
        let config: Config = toml_edit::de::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a TOML file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), Error> {
        let toml = toml_edit::ser::to_string_pretty(self)?;
        std::fs::write(path, toml)?;
        Ok(())
    }

    /// Load configuration from multiple TOML files. Later files override earlier ones.
    pub fn load_multiple<T, U>(paths: U) -> Result<Self, Error>
    where
        T: AsRef<Path>,
        U: IntoIterator<Item = T>,
    {
        let mut merged = toml_edit::DocumentMut::new();
        for path in paths {
            let path = path.as_ref();
            if !path.exists() {
                continue;
            }
            let text = std::fs::read_to_string(path)?;
            let doc: toml_edit::DocumentMut = text.parse()?;
            merge_document(&mut merged, doc);
        }
        let config: Config = toml_edit::de::from_str(&merged.to_string())?;
        config.validate()?;
        Ok(config)
    }

    /// Check cross-field invariants. The inference round trip must fit inside
    /// one window with room to spare for actuation, so a timeout at or above
    /// the cycle is rejected rather than silently clamped.
    pub fn validate(&self) -> Result<(), Error> {
        if self.sampler.device.is_empty() {
            return Err(Error::EmptyDevice);
        }
        if self.window.cycle.is_zero() {
            return Err(Error::ZeroWindowCycle);
        }
        if self.inference.timeout >= self.window.cycle {
            return Err(Error::TimeoutExceedsWindow {
                timeout: self.inference.timeout,
                cycle: self.window.cycle,
            });
        }
        Ok(())
    }
}

fn merge_document(target: &mut toml_edit::DocumentMut, source: toml_edit::DocumentMut) {
    for (key, item) in source.iter() {
        merge_item(
            target.entry(key).or_insert(toml_edit::Item::None),
            item.clone(),
        );
    }
}

fn merge_item(target: &mut toml_edit::Item, source: toml_edit::Item) {
    use toml_edit::Item;
    match (target, source) {
        (Item::Table(target_table), Item::Table(source_table)) => {
            for (key, item) in source_table.iter() {
                merge_item(target_table.entry(key).or_insert(Item::None), item.clone());
            }
        }
        (Item::ArrayOfTables(target_array), Item::ArrayOfTables(source_array)) => {
            for table in source_array.iter() {
                target_array.push(table.clone());
            }
        }
        (target_item, source_item) => {
            *target_item = source_item;
        }
    }
}
