//! Cosmic event model.
//!
//! Events arrive from the external astronomy scheduler as tagged JSON.
//! Each category carries only the fields that are valid for it, so the
//! rest of the engine never has to shape-check loosely typed records.

use serde::{Deserialize, Serialize};

use lunary_common::{AppError, AppResult};

/// A cosmic event driving one notification send.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationEvent {
    /// Human label, e.g. "Full Moon" or "Venus Trine Mars".
    pub name: String,
    /// Priority, recorded with the sent ledger for audit only.
    pub priority: i32,
    /// Category-specific payload.
    #[serde(flatten)]
    pub kind: EventKind,
}

/// Event category with the fields valid for that category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EventKind {
    /// Moon phase change; the phase label is the event name.
    #[serde(alias = "moon_phase")]
    Moon,
    /// Two planets forming an exact aspect.
    #[serde(rename_all = "camelCase")]
    Aspect {
        /// First planet of the pair
        #[serde(default)]
        planet_a: Option<String>,
        /// Second planet of the pair
        #[serde(default)]
        planet_b: Option<String>,
        /// Aspect name (conjunction, trine, square, sextile, opposition)
        #[serde(default)]
        aspect: Option<String>,
    },
    /// A planet entering a new zodiac sign.
    #[serde(alias = "planetary_transit")]
    Ingress {
        /// The moving planet
        #[serde(default)]
        planet: Option<String>,
        /// The sign being entered
        #[serde(default)]
        sign: Option<String>,
    },
    /// A planet stationing retrograde.
    Retrograde {
        /// The retrograde planet
        #[serde(default)]
        planet: Option<String>,
        /// Sign the station occurs in
        #[serde(default)]
        sign: Option<String>,
    },
    /// Solstice, equinox or sabbat.
    #[serde(alias = "sabbat")]
    Seasonal {
        /// Short energy keyword for the day
        #[serde(default)]
        energy: Option<String>,
        /// Longer descriptive text
        #[serde(default)]
        description: Option<String>,
    },
}

impl EventKind {
    /// The category label used in fingerprints, payload tags and logs.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Moon => "moon",
            Self::Aspect { .. } => "aspect",
            Self::Ingress { .. } => "ingress",
            Self::Retrograde { .. } => "retrograde",
            Self::Seasonal { .. } => "seasonal",
        }
    }

    /// The subscription preference flag gating this category.
    ///
    /// A category with no mapped flag is delivered to every active
    /// subscription regardless of preferences.
    #[must_use]
    pub const fn preference_key(&self) -> Option<&'static str> {
        match self {
            Self::Moon => Some("moonPhases"),
            Self::Aspect { .. } => Some("majorAspects"),
            Self::Ingress { .. } => Some("planetaryTransits"),
            Self::Retrograde { .. } => Some("retrogrades"),
            Self::Seasonal { .. } => Some("sabbats"),
        }
    }
}

impl NotificationEvent {
    /// Validate the event before any side effect occurs.
    pub fn validate(&self) -> AppResult<()> {
        if self.name.trim().is_empty() {
            return Err(AppError::Validation("Event name is required".to_string()));
        }
        Ok(())
    }

    /// Derived idempotency key: `type-name-priority`.
    ///
    /// A blank name falls back to the literal `unknown` so a malformed
    /// event still produces a stable key.
    #[must_use]
    pub fn fingerprint(&self) -> String {
        let name = if self.name.trim().is_empty() {
            "unknown"
        } else {
            self.name.as_str()
        };
        format!("{}-{}-{}", self.kind.as_str(), name, self.priority)
    }
}

/// Optional astronomy context supplied by the scheduler.
///
/// Used only for body enrichment and the payload date; never required.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CosmicContext {
    /// Calendar date the event belongs to
    #[serde(default)]
    pub date: Option<chrono::NaiveDate>,
    /// The moon's current zodiac sign
    #[serde(default)]
    pub moon_sign: Option<String>,
}

/// The cadence that triggered a send, recorded for audit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SendCadence {
    /// Once-a-day trigger
    #[serde(rename = "daily")]
    Daily,
    /// Four-hourly trigger
    #[serde(rename = "4-hourly")]
    FourHourly,
}

impl Default for SendCadence {
    fn default() -> Self {
        Self::Daily
    }
}

impl std::fmt::Display for SendCadence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Daily => "daily",
            Self::FourHourly => "4-hourly",
        };
        write!(f, "{s}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn aspect_event(name: &str) -> NotificationEvent {
        NotificationEvent {
            name: name.to_string(),
            priority: 3,
            kind: EventKind::Aspect {
                planet_a: Some("Venus".to_string()),
                planet_b: Some("Mars".to_string()),
                aspect: Some("trine".to_string()),
            },
        }
    }

    #[test]
    fn test_fingerprint_construction() {
        let event = aspect_event("Venus Trine Mars");
        assert_eq!(event.fingerprint(), "aspect-Venus Trine Mars-3");
    }

    #[test]
    fn test_fingerprint_blank_name_falls_back() {
        let event = aspect_event("   ");
        assert_eq!(event.fingerprint(), "aspect-unknown-3");
    }

    #[test]
    fn test_validate_rejects_blank_name() {
        let event = aspect_event("");
        assert!(event.validate().is_err());

        let event = aspect_event("Venus Trine Mars");
        assert!(event.validate().is_ok());
    }

    #[test]
    fn test_preference_key_mapping() {
        assert_eq!(EventKind::Moon.preference_key(), Some("moonPhases"));
        assert_eq!(
            EventKind::Ingress {
                planet: None,
                sign: None
            }
            .preference_key(),
            Some("planetaryTransits")
        );
        assert_eq!(
            EventKind::Seasonal {
                energy: None,
                description: None
            }
            .preference_key(),
            Some("sabbats")
        );
    }

    #[test]
    fn test_deserialize_tagged_event() {
        let json = r#"{
            "type": "aspect",
            "name": "Venus Trine Mars",
            "priority": 3,
            "planetA": "Venus",
            "planetB": "Mars",
            "aspect": "trine"
        }"#;
        let event: NotificationEvent = serde_json::from_str(json).unwrap();
        assert_eq!(event, aspect_event("Venus Trine Mars"));
    }

    #[test]
    fn test_deserialize_legacy_type_alias() {
        let json = r#"{"type": "moon_phase", "name": "Full Moon", "priority": 5}"#;
        let event: NotificationEvent = serde_json::from_str(json).unwrap();
        assert_eq!(event.kind, EventKind::Moon);
        assert_eq!(event.fingerprint(), "moon-Full Moon-5");
    }

    #[test]
    fn test_cadence_display() {
        assert_eq!(SendCadence::Daily.to_string(), "daily");
        assert_eq!(SendCadence::FourHourly.to_string(), "4-hourly");
    }
}
