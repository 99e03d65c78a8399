//! Specialty inference: file paths to weighted domain tags.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

/// Lookup tables mapping path features to domain tags.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SpecialtyTables {
    /// Extension (without the dot, lowercase) to tag.
    pub extensions: BTreeMap<String, String>,
    /// Directory segment (lowercase) to tag.
    pub directories: BTreeMap<String, String>,
}

impl Default for SpecialtyTables {
    fn default() -> Self {
        let extensions = [
            ("ts", "frontend"),
            ("tsx", "frontend"),
            ("js", "frontend"),
            ("jsx", "frontend"),
            ("css", "frontend"),
            ("html", "frontend"),
            ("vue", "frontend"),
            ("rs", "backend"),
            ("go", "backend"),
            ("py", "backend"),
            ("rb", "backend"),
            ("java", "backend"),
            ("kt", "backend"),
            ("sql", "database"),
            ("tf", "infra"),
            ("yaml", "infra"),
            ("yml", "infra"),
            ("sh", "infra"),
            ("md", "docs"),
        ];
        let directories = [
            ("frontend", "frontend"),
            ("ui", "frontend"),
            ("web", "frontend"),
            ("backend", "backend"),
            ("server", "backend"),
            ("api", "backend"),
            ("migrations", "database"),
            ("db", "database"),
            ("infra", "infra"),
            ("deploy", "infra"),
            ("ops", "infra"),
            ("ci", "infra"),
            ("docs", "docs"),
            ("tests", "testing"),
            ("test", "testing"),
        ];
        Self {
            extensions: extensions
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            directories: directories
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }
}

impl SpecialtyTables {
    /// Distinct tags the tables can produce.
    pub fn tag_universe(&self) -> BTreeSet<&str> {
        self.extensions
            .values()
            .chain(self.directories.values())
            .map(String::as_str)
            .collect()
    }
}

/// Pure mapping from touched file paths to weighted domain tags.
///
/// A tag's weight is the fraction of touched files matching it, so weights
/// lie in `[0, 1]` but do not sum to 1 when files carry multiple tags.
/// No state, no side effects.
#[derive(Debug, Clone, Default)]
pub struct SpecialtyInferencer {
    tables: SpecialtyTables,
}

impl SpecialtyInferencer {
    /// Creates an inferencer over custom tables.
    pub fn new(tables: SpecialtyTables) -> Self {
        Self { tables }
    }

    /// Infers weighted tags for a set of touched files.
    pub fn infer(&self, files: &[String]) -> BTreeMap<String, f64> {
        if files.is_empty() {
            return BTreeMap::new();
        }

        let mut hits: BTreeMap<String, usize> = BTreeMap::new();
        for file in files {
            let mut file_tags: BTreeSet<&str> = BTreeSet::new();
            let path = Path::new(file);

            if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
                if let Some(tag) = self.tables.extensions.get(&ext.to_lowercase()) {
                    file_tags.insert(tag);
                }
            }
            // Every segment except the file name itself.
            let mut components: Vec<_> = path
                .components()
                .filter_map(|c| c.as_os_str().to_str())
                .collect();
            components.pop();
            for segment in components {
                if let Some(tag) = self.tables.directories.get(&segment.to_lowercase()) {
                    file_tags.insert(tag);
                }
            }

            for tag in file_tags {
                *hits.entry(tag.to_string()).or_insert(0) += 1;
            }
        }

        let total = files.len() as f64;
        hits.into_iter()
            .map(|(tag, count)| (tag, count as f64 / total))
            .collect()
    }

    /// Fraction of the tag universe present in `tags`.
    pub fn diversity(&self, tags: &BTreeMap<String, f64>) -> f64 {
        let universe = self.tables.tag_universe().len();
        if universe == 0 {
            return 0.0;
        }
        tags.len() as f64 / universe as f64
    }
}
