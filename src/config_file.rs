//! Loading and saving sweep and plot definition files. The format is
//! chosen by the file name extension.

use std::path::Path;

use anyhow::{anyhow, bail, Context, Result};
use serde::{de::DeserializeOwned, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigBackend {
    Json5,
    Yaml,
    Ron,
}

pub fn ron_to_string_pretty<T: Serialize>(value: &T) -> Result<String, ron::Error> {
    ron::ser::to_string_pretty(value, ron::ser::PrettyConfig::default())
}

impl ConfigBackend {
    pub fn decode<T: DeserializeOwned>(self, s: &str) -> Result<T> {
        match self {
            ConfigBackend::Json5 => serde_json5::from_str(s).map_err(|e| anyhow!("{e}")),
            ConfigBackend::Yaml => serde_yml::from_str(s).map_err(|e| anyhow!("{e}")),
            ConfigBackend::Ron => ron::from_str(s).map_err(|e| anyhow!("{e}")),
        }
    }

    pub fn encode<T: Serialize>(self, value: &T) -> Result<String> {
        match self {
            ConfigBackend::Json5 => {
                serde_json5::to_string(value).map_err(|e| anyhow!("encoding as JSON5: {e}"))
            }
            ConfigBackend::Yaml => {
                serde_yml::to_string(value).map_err(|e| anyhow!("encoding as YAML: {e}"))
            }
            ConfigBackend::Ron => {
                ron_to_string_pretty(value).map_err(|e| anyhow!("encoding as RON: {e}"))
            }
        }
    }

    pub fn load_config_file<T: DeserializeOwned>(self, path: &Path) -> Result<T> {
        let s = std::fs::read_to_string(path)
            .with_context(|| anyhow!("loading config file from {path:?}"))?;
        self.decode(&s)
            .with_context(|| anyhow!("decoding {self:?} from config file {path:?}"))
    }

    pub fn save_config_file<T: Serialize>(self, path: &Path, value: &T) -> Result<()> {
        let s = self.encode(value)?;
        std::fs::write(path, s).with_context(|| anyhow!("writing config file to {path:?}"))
    }
}

pub const FILE_EXTENSIONS: &[(&str, ConfigBackend)] = &[
    ("json5", ConfigBackend::Json5),
    ("json", ConfigBackend::Json5),
    ("yml", ConfigBackend::Yaml),
    ("yaml", ConfigBackend::Yaml),
    ("ron", ConfigBackend::Ron),
];

/// The extensions with their format names, e.g. "yaml (Yaml)".
pub fn supported_formats() -> Vec<String> {
    FILE_EXTENSIONS
        .iter()
        .map(|(ext, backend)| format!("{ext} ({backend:?})"))
        .collect()
}

pub fn backend_from_path(path: &Path) -> Result<ConfigBackend> {
    if let Some(ext) = path.extension() {
        if let Some(ext) = ext.to_str() {
            if let Some((_, backend)) = FILE_EXTENSIONS.iter().find(|(e, _b)| *e == ext) {
                Ok(*backend)
            } else {
                bail!("given file path does have an unknown extension {ext:?}: {path:?}")
            }
        } else {
            bail!("given file path does have an extension that is not unicode: {path:?}")
        }
    } else {
        bail!(
            "given file path does not have an extension \
             for determining the file type: {path:?}"
        )
    }
}

pub fn load_config_file<T: DeserializeOwned>(path: &Path) -> Result<T> {
    backend_from_path(path)?.load_config_file(path)
}

pub fn save_config_file<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    backend_from_path(path)?.save_config_file(path, value)
}
