//! Key=value configuration file parsing.
//!
//! Mirrors the original tool's config format: a plain text file of `key value`
//! or `key = value` pairs, one per line, with `#`-prefixed comment lines.
//! Lines that do not tokenize into exactly two pieces are skipped with a
//! warning rather than rejected, and numeric keys that are absent from the
//! file silently resolve to zero (the original's `std::map::operator[]`
//! default-construction behaviour).

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use log::warn;

use crate::error::{GoIcpError, Result};

/// A parsed config file: a flat string-to-string key/value map.
#[derive(Debug, Default, Clone)]
pub struct ConfigMap {
    entries: HashMap<String, String>,
}

impl ConfigMap {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| GoIcpError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::parse(&text))
    }

    /// Parses config text directly, in the line-by-line `# comment` / `key =
    /// value` format. Separators recognized between key and value are space,
    /// `=` and `;`, matching the original tokenizer's delimiter set.
    pub fn parse(text: &str) -> Self {
        let mut entries = HashMap::new();
        for (lineno, raw) in text.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let tokens: Vec<&str> = line
                .split(|c: char| c == ' ' || c == '=' || c == ';')
                .filter(|t| !t.is_empty())
                .collect();
            if tokens.len() != 2 {
                warn!("config line {}: expected 'key value', got {:?}", lineno + 1, line);
                continue;
            }
            entries.insert(tokens[0].to_string(), tokens[1].to_string());
        }
        ConfigMap { entries }
    }

    /// Looks up an integer key, silently defaulting to 0 if absent or unparsable.
    pub fn get_i(&self, key: &str) -> i64 {
        self.entries
            .get(key)
            .and_then(|v| v.parse::<i64>().ok())
            .unwrap_or(0)
    }

    /// Looks up a float key, silently defaulting to 0.0 if absent or unparsable.
    pub fn get_f(&self, key: &str) -> f64 {
        self.entries
            .get(key)
            .and_then(|v| v.parse::<f64>().ok())
            .unwrap_or(0.0)
    }

    /// Looks up a string key, returning an empty string if absent.
    pub fn get_s(&self, key: &str) -> String {
        self.entries.get(key).cloned().unwrap_or_default()
    }

    /// Parses a `(a,b,c,...)` vector-valued key into its component floats.
    /// Absent keys yield an empty vector.
    pub fn get_vector(&self, key: &str) -> Vec<f64> {
        let raw = match self.entries.get(key) {
            Some(v) => v,
            None => return Vec::new(),
        };
        raw.split(|c: char| c == '(' || c == ',' || c == ')')
            .filter(|t| !t.is_empty())
            .filter_map(|t| t.parse::<f64>().ok())
            .collect()
    }

    pub fn print(&self) {
        for (k, v) in &self.entries {
            println!("{k}={v}");
        }
    }

    /// Builds a [`crate::goicp::RegistrationConfig`] from the conventional
    /// key names (`MSEThresh`, `rotMinX/Y/Z`, `rotWidth`, `transMinX/Y/Z`,
    /// `transWidth`, `trimFraction`, `distTransSize`,
    /// `distTransExpandFactor`). A `trimFraction` below 0.1% is treated as
    /// "no trimming", same as the reference tool.
    pub fn to_registration_config(&self) -> crate::goicp::RegistrationConfig {
        let mut trim_fraction = self.get_f("trimFraction");
        if trim_fraction < 0.001 {
            trim_fraction = 0.0;
        }
        crate::goicp::RegistrationConfig {
            mse_thresh: self.get_f("MSEThresh"),
            rot_min: [self.get_f("rotMinX"), self.get_f("rotMinY"), self.get_f("rotMinZ")],
            rot_width: self.get_f("rotWidth"),
            trans_min: [self.get_f("transMinX"), self.get_f("transMinY"), self.get_f("transMinZ")],
            trans_width: self.get_f("transWidth"),
            trim_fraction,
            dist_trans_size: self.get_i("distTransSize") as usize,
            dist_trans_expand_factor: self.get_f("distTransExpandFactor"),
        }
    }
}
