//! Streaming platform loudness targets
//!
//! Process-wide constant catalog. Targets are the commonly published
//! normalization references; a `None` peak ceiling means the platform only
//! shifts loudness and never applies limiting.

use serde::{Deserialize, Serialize};

/// Loudness target of one distribution platform
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlatformProfile {
    /// Stable identifier (`"spotify"`, `"apple_music"`, ...)
    pub id: String,
    /// Display name
    pub name: String,
    /// Target loudness (dB, same proxy scale as the analyzer)
    pub target_loudness_db: f64,
    /// Peak ceiling (dBFS), if the platform enforces one
    pub peak_ceiling_db: Option<f64>,
    /// Optional guidance shown next to the result
    pub guidance: Option<String>,
}

impl PlatformProfile {
    /// Create a profile
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        target_loudness_db: f64,
        peak_ceiling_db: Option<f64>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            target_loudness_db,
            peak_ceiling_db,
            guidance: None,
        }
    }

    /// Attach guidance text
    #[must_use]
    pub fn with_guidance(mut self, guidance: impl Into<String>) -> Self {
        self.guidance = Some(guidance.into());
        self
    }
}

/// (id, name, target, ceiling, guidance)
type BuiltinProfile = (
    &'static str,
    &'static str,
    f64,
    Option<f64>,
    Option<&'static str>,
);

const BUILTIN_PROFILES: &[BuiltinProfile] = &[
    (
        "spotify",
        "Spotify",
        -14.0,
        Some(-1.0),
        Some("Loud masters are turned down; quiet ones are raised only up to the peak ceiling."),
    ),
    (
        "apple_music",
        "Apple Music",
        -16.0,
        Some(-1.0),
        Some("Sound Check targets -16; leave at least 1 dB of peak headroom."),
    ),
    (
        "youtube",
        "YouTube",
        -14.0,
        None,
        Some("Playback level is adjusted without a peak ceiling."),
    ),
    (
        "amazon_music",
        "Amazon Music",
        -14.0,
        Some(-2.0),
        Some("Allow 2 dB of peak headroom to avoid limiting on lossy encodes."),
    ),
    ("tidal", "Tidal", -14.0, Some(-1.0), None),
    ("deezer", "Deezer", -15.0, Some(-1.0), None),
    (
        "soundcloud",
        "SoundCloud",
        -14.0,
        Some(-1.0),
        Some("Very loud uploads may be limited after transcoding."),
    ),
    (
        "ebu_r128",
        "Broadcast (EBU R128)",
        -23.0,
        None,
        Some("Broadcast delivery reference; loudness only."),
    ),
];

/// Ordered, immutable catalog of platform profiles
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlatformCatalog {
    profiles: Vec<PlatformProfile>,
}

impl Default for PlatformCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

impl PlatformCatalog {
    /// The built-in catalog, in display order
    pub fn builtin() -> Self {
        let profiles = BUILTIN_PROFILES
            .iter()
            .map(|&(id, name, target, ceiling, guidance)| {
                let profile = PlatformProfile::new(id, name, target, ceiling);
                match guidance {
                    Some(text) => profile.with_guidance(text),
                    None => profile,
                }
            })
            .collect();
        Self { profiles }
    }

    /// Catalog from explicit profiles (display order is preserved)
    pub fn from_profiles(profiles: Vec<PlatformProfile>) -> Self {
        Self { profiles }
    }

    /// Look up a profile by id
    pub fn get(&self, id: &str) -> Option<&PlatformProfile> {
        self.profiles.iter().find(|p| p.id == id)
    }

    /// Iterate in display order
    pub fn iter(&self) -> impl Iterator<Item = &PlatformProfile> {
        self.profiles.iter()
    }

    /// Number of profiles
    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    /// Whether the catalog is empty
    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }
}

impl<'a> IntoIterator for &'a PlatformCatalog {
    type Item = &'a PlatformProfile;
    type IntoIter = std::slice::Iter<'a, PlatformProfile>;

    fn into_iter(self) -> Self::IntoIter {
        self.profiles.iter()
    }
}
