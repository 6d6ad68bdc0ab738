//! Action Catalog Module
//! Recommendation modules, next-action bullets, teams and card colours.
//!
//! The catalog is plain configuration. A built-in copy ships with the binary
//! and can be replaced by a JSON file named in the settings.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

const BUILTIN_CATALOG: &str = include_str!("../assets/catalog.json");

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("Failed to read catalog: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid catalog JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Invalid catalog: {0}")]
    Invalid(String),
}

/// A group of recommendation cards shown under one header.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionModule {
    pub name: String,
    pub actions: Vec<String>,
}

/// Two-stop card gradient as `#RRGGBB` strings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CardColor {
    pub from: String,
    pub to: String,
}

impl CardColor {
    pub fn start_rgb(&self) -> [u8; 3] {
        parse_hex(&self.from).unwrap_or([128, 128, 128])
    }

    pub fn end_rgb(&self) -> [u8; 3] {
        parse_hex(&self.to).unwrap_or([128, 128, 128])
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionCatalog {
    pub modules: Vec<ActionModule>,
    #[serde(default)]
    pub next_actions: HashMap<String, Vec<String>>,
    #[serde(default = "default_next_actions")]
    pub default_next_actions: Vec<String>,
    pub teams: Vec<String>,
    pub card_colors: Vec<CardColor>,
}

fn default_next_actions() -> Vec<String> {
    vec![
        "Define next actions to be taken for this item.".to_string(),
        "Assign tasks to appropriate team members.".to_string(),
    ]
}

impl Default for ActionCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

impl ActionCatalog {
    /// The catalog compiled into the binary.
    pub fn builtin() -> Self {
        match Self::from_json(BUILTIN_CATALOG) {
            Ok(catalog) => catalog,
            Err(e) => {
                tracing::error!("built-in catalog is invalid: {e}");
                Self {
                    modules: Vec::new(),
                    next_actions: HashMap::new(),
                    default_next_actions: default_next_actions(),
                    teams: vec!["Sales".to_string()],
                    card_colors: vec![CardColor {
                        from: "#BF82D9".to_string(),
                        to: "#9333EA".to_string(),
                    }],
                }
            }
        }
    }

    pub fn from_json(text: &str) -> Result<Self, CatalogError> {
        let catalog: Self = serde_json::from_str(text)?;
        catalog.validate()?;
        Ok(catalog)
    }

    pub fn from_path(path: &Path) -> Result<Self, CatalogError> {
        let text = std::fs::read_to_string(path)?;
        let catalog = Self::from_json(&text)?;
        tracing::info!(
            path = %path.display(),
            modules = catalog.modules.len(),
            "loaded action catalog"
        );
        Ok(catalog)
    }

    fn validate(&self) -> Result<(), CatalogError> {
        if self.teams.is_empty() {
            return Err(CatalogError::Invalid("at least one team is required".into()));
        }
        if self.card_colors.is_empty() {
            return Err(CatalogError::Invalid("at least one card colour is required".into()));
        }
        for color in &self.card_colors {
            for hex in [&color.from, &color.to] {
                if parse_hex(hex).is_none() {
                    return Err(CatalogError::Invalid(format!("bad colour '{hex}'")));
                }
            }
        }
        Ok(())
    }

    /// Bullets for an action. Unknown actions get the generic default list.
    pub fn next_actions(&self, action: &str) -> &[String] {
        self.next_actions
            .get(action)
            .map(Vec::as_slice)
            .unwrap_or(&self.default_next_actions)
    }

    /// Colour for the module at `index`, cycling through the palette.
    pub fn card_color(&self, index: usize) -> &CardColor {
        &self.card_colors[index % self.card_colors.len()]
    }

    pub fn team(&self, index: usize) -> &str {
        self.teams
            .get(index)
            .or_else(|| self.teams.first())
            .map(String::as_str)
            .unwrap_or_default()
    }
}

/// Parse `#RRGGBB` (leading `#` optional).
pub fn parse_hex(hex: &str) -> Option<[u8; 3]> {
    let digits = hex.strip_prefix('#').unwrap_or(hex);
    if digits.len() != 6 || !digits.is_ascii() {
        return None;
    }

    let channel = |i: usize| u8::from_str_radix(&digits[i..i + 2], 16).ok();
    Some([channel(0)?, channel(2)?, channel(4)?])
}
