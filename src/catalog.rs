//! Static catalog of downloadable Bible versions
//!
//! The catalog is compiled in and never changes at runtime. It lists what CAN be
//! downloaded; what HAS been downloaded lives in the local store.

/// A downloadable Bible translation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionDefinition {
    pub id: &'static str,
    pub name: &'static str,
    pub language: &'static str,
    pub abbreviation: &'static str,
    pub download_url: &'static str,
    pub description: &'static str,
}

/// Versions shipped with the application
pub const DEFAULT_VERSIONS: &[VersionDefinition] = &[
    VersionDefinition {
        id: "es_1909",
        name: "Reina Valera 1909",
        language: "Español",
        abbreviation: "RVR1909",
        download_url: "https://raw.githubusercontent.com/thiagobodruk/bible/master/json/es_1909.json",
        description: "Edición histórica castellana con ortografía clásica.",
    },
    VersionDefinition {
        id: "es_rvc",
        name: "Reina Valera Contemporánea",
        language: "Español",
        abbreviation: "RVC",
        download_url: "https://raw.githubusercontent.com/thiagobodruk/bible/master/json/es_rvc.json",
        description: "Traducción moderna fácil de leer.",
    },
    VersionDefinition {
        id: "en_kjv",
        name: "King James Version",
        language: "English",
        abbreviation: "KJV",
        download_url: "https://raw.githubusercontent.com/thiagobodruk/bible/master/json/en_kjv.json",
        description: "Published in 1611, one of the best known English translations.",
    },
    VersionDefinition {
        id: "en_bbe",
        name: "Bible in Basic English",
        language: "English",
        abbreviation: "BBE",
        download_url: "https://raw.githubusercontent.com/thiagobodruk/bible/master/json/en_bbe.json",
        description: "Simple English intended for non-native readers.",
    },
];

/// Ordered list of version definitions
#[derive(Debug, Clone)]
pub struct Catalog {
    versions: Vec<VersionDefinition>,
}

impl Default for Catalog {
    fn default() -> Self {
        Self::new(DEFAULT_VERSIONS.to_vec())
    }
}

impl Catalog {
    pub fn new(versions: Vec<VersionDefinition>) -> Self {
        Self { versions }
    }

    /// Look up a definition by id
    pub fn find(&self, id: &str) -> Option<&VersionDefinition> {
        self.versions.iter().find(|v| v.id == id)
    }

    pub fn versions(&self) -> &[VersionDefinition] {
        &self.versions
    }

    pub fn len(&self) -> usize {
        self.versions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.versions.is_empty()
    }
}
