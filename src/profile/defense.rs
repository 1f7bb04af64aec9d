use serde::{Deserialize, Serialize};

use crate::core::error::{OddsError, Result};

/// The receiving unit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DefenseProfile {
    pub name: String,
    pub resilience: i32,
    /// Armour save, 2..=6
    pub save: i32,
    /// Save that ignores penetration
    #[serde(default)]
    pub alt_save: Option<i32>,
    /// Roll needed to negate each point of damage
    #[serde(default)]
    pub mitigation: Option<i32>,
    pub wounds_per_model: u32,
    pub model_count: u32,
    /// Category keywords consumed by category-gated rules
    #[serde(default)]
    pub categories: Vec<String>,
}

impl DefenseProfile {
    pub fn new(
        name: impl Into<String>,
        resilience: i32,
        save: i32,
        wounds_per_model: u32,
        model_count: u32,
    ) -> Self {
        Self {
            name: name.into(),
            resilience,
            save,
            alt_save: None,
            mitigation: None,
            wounds_per_model,
            model_count,
            categories: Vec::new(),
        }
    }

    /// Test profile: ten line infantry
    pub fn test_infantry() -> Self {
        Self::new("Line Infantry", 4, 3, 1, 10).with_categories(["infantry"])
    }

    /// Test profile: single battle tank
    pub fn test_tank() -> Self {
        Self::new("Battle Tank", 10, 3, 12, 1).with_categories(["vehicle"])
    }

    /// Test profile: five elite warriors with a 4+ alternate save
    pub fn test_elite() -> Self {
        Self::new("Elite Warriors", 5, 2, 3, 5)
            .with_alt_save(4)
            .with_categories(["infantry"])
    }

    pub fn with_alt_save(self, alt_save: i32) -> Self {
        Self {
            alt_save: Some(alt_save),
            ..self
        }
    }

    pub fn with_mitigation(self, target: i32) -> Self {
        Self {
            mitigation: Some(target),
            ..self
        }
    }

    pub fn with_models(self, model_count: u32) -> Self {
        Self {
            model_count,
            ..self
        }
    }

    pub fn with_categories<I, S>(self, categories: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            categories: categories.into_iter().map(Into::into).collect(),
            ..self
        }
    }

    pub fn total_capacity(&self) -> u32 {
        self.wounds_per_model.saturating_mul(self.model_count)
    }

    pub fn has_category(&self, keyword: &str) -> bool {
        self.categories
            .iter()
            .any(|c| c.eq_ignore_ascii_case(keyword))
    }

    pub fn is_valid(&self) -> bool {
        self.wounds_per_model > 0 && self.model_count > 0 && (2..=6).contains(&self.save)
    }

    pub fn validate(&self) -> Result<()> {
        if self.wounds_per_model == 0 {
            return Err(OddsError::InvalidDefense(format!(
                "{}: wounds per model must be positive",
                self.name
            )));
        }
        if self.model_count == 0 {
            return Err(OddsError::InvalidDefense(format!(
                "{}: model count must be positive",
                self.name
            )));
        }
        if !(2..=6).contains(&self.save) {
            return Err(OddsError::InvalidDefense(format!(
                "{}: save {} outside 2..=6",
                self.name, self.save
            )));
        }
        Ok(())
    }
}
