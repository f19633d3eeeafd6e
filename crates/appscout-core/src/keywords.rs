//! The curated niche-keyword pool used when a run supplies no keywords.

use std::path::Path;

use rand::seq::SliceRandom;
use serde::Deserialize;

use crate::ConfigError;

/// Keywords where small subscription products tend to thrive: specific
/// audiences, single-purpose tools, no heavy backend.
const DEFAULT_POOL: &[&str] = &[
    "ADHD Planner",
    "Visual Timer",
    "Minimalist tracker",
    "Couple budget",
    "Neurodivergent focus",
    "Pomodoro study",
    "Freelance invoice",
    "Receipt tracker",
    "Pet journal",
    "Digital detox",
    "Mood tracker",
    "Habit streak",
    "Baby feeding log",
    "Plant care reminder",
    "Shift work calendar",
    "Water fasting timer",
    "Dream journal",
    "Wedding countdown",
    "Medication reminder",
    "Gratitude diary",
];

#[derive(Debug, Clone)]
pub struct KeywordPool {
    keywords: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct KeywordFile {
    keywords: Vec<String>,
}

impl KeywordPool {
    #[must_use]
    pub fn builtin() -> Self {
        Self {
            keywords: DEFAULT_POOL.iter().map(|s| (*s).to_string()).collect(),
        }
    }

    #[must_use]
    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.keywords.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.keywords.is_empty()
    }
}

/// Load the keyword pool from a YAML file, falling back to the built-in
/// pool when the file does not exist.
///
/// # Errors
///
/// Returns `ConfigError` if the file exists but cannot be read or parsed,
/// or if it parses to an empty list.
pub fn load_keyword_pool(path: &Path) -> Result<KeywordPool, ConfigError> {
    if !path.exists() {
        tracing::debug!(path = %path.display(), "keyword file absent, using built-in pool");
        return Ok(KeywordPool::builtin());
    }

    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::KeywordFileIo {
        path: path.display().to_string(),
        source: e,
    })?;
    let file: KeywordFile = serde_yaml::from_str(&content)?;

    let keywords: Vec<String> = file
        .keywords
        .into_iter()
        .map(|k| k.trim().to_string())
        .filter(|k| !k.is_empty())
        .collect();

    if keywords.is_empty() {
        return Err(ConfigError::Validation(format!(
            "keyword file {} contains no usable keywords",
            path.display()
        )));
    }

    Ok(KeywordPool { keywords })
}

/// Draw `count` distinct keywords from the pool at random.
///
/// Returns the whole pool (shuffled) when `count` exceeds the pool size.
#[must_use]
pub fn sample_keywords(pool: &KeywordPool, count: usize) -> Vec<String> {
    let mut rng = rand::rng();
    let mut shuffled: Vec<String> = pool.keywords.clone();
    shuffled.shuffle(&mut rng);
    shuffled.truncate(count);
    shuffled
}
