//! Lowering options
//! Read from a TOML file next to the crate, or the file named by
//! `SSA2ROP_CONFIG`. Missing keys take their defaults.

use std::env;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::regalloc::AllocatorKind;

const CONFIG_ENV_VAR: &str = "SSA2ROP_CONFIG";

fn get_config_file_path() -> String {
  match env::var(CONFIG_ENV_VAR) {
    Ok(path) => path,
    Err(_) => {
      let source_dir = env!("CARGO_MANIFEST_DIR");
      format!("{}/{}", source_dir, "lowering.toml")
    }
  }
}

fn enabled() -> bool {
  true
}

/// Configuration options for the lowering passes.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoweringConfig {
  /// Overrides the allocator picked from the `minimize_registers` flag.
  #[serde(default)]
  pub allocator: Option<AllocatorKind>,
  #[serde(default = "enabled")]
  pub elide_gotos: bool,
  #[serde(default = "enabled")]
  pub merge_identical_blocks: bool,
  /// Log the interference graph as JSON at debug level.
  #[serde(default)]
  pub dump_interference: bool,
}

impl Default for LoweringConfig {
  fn default() -> Self {
    LoweringConfig {
      allocator: None,
      elide_gotos: true,
      merge_identical_blocks: true,
      dump_interference: false,
    }
  }
}

impl LoweringConfig {
  /// Loads the configuration file, falling back to the defaults when there
  /// is no file or it does not parse.
  pub fn from_config() -> Self {
    let path = get_config_file_path();
    let text = match std::fs::read_to_string(&path) {
      Ok(text) => text,
      Err(_) => {
        log::debug!("no lowering config at {}, using defaults", path);
        return LoweringConfig::default();
      }
    };
    match LoweringConfig::from_toml_str(&text) {
      Ok(config) => config,
      Err(e) => {
        log::warn!("ignoring lowering config {}: {:#}", path, e);
        LoweringConfig::default()
      }
    }
  }

  pub fn from_toml_str(text: &str) -> Result<Self> {
    toml::from_str(text).context("malformed lowering config")
  }

  /// The allocator to run for a method.
  pub fn allocator_for(&self, minimize_registers: bool) -> AllocatorKind {
    self
      .allocator
      .unwrap_or_else(|| AllocatorKind::for_flags(minimize_registers))
  }
}
