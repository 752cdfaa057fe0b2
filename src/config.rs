// src/config.rs
use anyhow::{Context, Result};
use serde::Deserialize;
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::export::Format;

/// Where statements are read from and where tables are written.
///
/// Every field is optional in the YAML file; missing ones take the defaults
/// below. Command-line flags are applied on top with [`Config::with_overrides`].
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub input_root: PathBuf,
    pub output_root: PathBuf,
    pub formats: Vec<Format>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            input_root: PathBuf::from("data/raw"),
            output_root: PathBuf::from("data/processed"),
            formats: vec![Format::Csv, Format::Json],
        }
    }
}

impl Config {
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml).context("parsing YAML config")
    }

    pub fn from_yaml_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("reading config file {:?}", path))?;
        Self::from_yaml_str(&text).with_context(|| format!("in config file {:?}", path))
    }

    /// Replace fields that were given on the command line.
    pub fn with_overrides(
        mut self,
        input_root: Option<PathBuf>,
        output_root: Option<PathBuf>,
        formats: Vec<Format>,
    ) -> Self {
        if let Some(root) = input_root {
            self.input_root = root;
        }
        if let Some(root) = output_root {
            self.output_root = root;
        }
        if !formats.is_empty() {
            self.formats = formats;
        }
        self
    }
}
