//! Notification content templating.
//!
//! Pure functions mapping an event (plus optional astronomy context) to
//! title/body text and the full push payload. Every path degrades to a
//! non-empty generic sentence; nothing here errors or touches I/O.

use std::collections::HashSet;

use chrono::Utc;
use serde::Serialize;

use crate::events::{CosmicContext, EventKind, NotificationEvent};

/// A notification action button.
#[derive(Debug, Clone, Serialize)]
pub struct NotificationAction {
    /// Action identifier
    pub action: String,
    /// Button label
    pub title: String,
    /// Button icon URL
    pub icon: String,
}

/// Structured metadata attached to a payload.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PayloadData {
    /// Link opened on tap
    pub url: String,
    /// Calendar date of the event
    pub date: String,
    /// Event category
    pub event_type: String,
    /// Event priority
    pub priority: i32,
    /// Human event label
    pub event_name: String,
    /// Moon phase name (moon events)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phase: Option<String>,
    /// Aspect label (aspect events)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aspect: Option<String>,
    /// Ingress label (ingress events)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ingress: Option<String>,
    /// Season label (seasonal events)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub season: Option<String>,
}

/// The rendered, possibly-personalized push message.
///
/// `tag` is always `lunary-{type}` so the client can collapse superseded
/// notifications of the same category.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationPayload {
    /// Notification title
    pub title: String,
    /// Notification body
    pub body: String,
    /// Icon URL
    pub icon: String,
    /// Badge URL
    pub badge: String,
    /// Category grouping tag
    pub tag: String,
    /// Structured metadata
    pub data: PayloadData,
    /// Action buttons
    pub actions: Vec<NotificationAction>,
    /// Vibration pattern
    pub vibrate: Vec<u32>,
}

/// Build the title for an event.
#[must_use]
pub fn build_title(event: &NotificationEvent) -> String {
    let name = event.name.trim();

    match &event.kind {
        EventKind::Moon => {
            if name.is_empty() {
                "Moon Phase".to_string()
            } else {
                name.to_string()
            }
        }
        EventKind::Aspect {
            planet_a,
            planet_b,
            aspect,
        } => {
            if let (Some(a), Some(b), Some(asp)) = (
                non_blank(planet_a.as_deref()),
                non_blank(planet_b.as_deref()),
                non_blank(aspect.as_deref()),
            ) {
                return format!("{a}-{b} {}", capitalize(asp));
            }
            if name.is_empty() {
                "Planetary Aspect".to_string()
            } else {
                name.to_string()
            }
        }
        EventKind::Ingress { planet, sign } => {
            if let (Some(planet), Some(sign)) = (
                non_blank(planet.as_deref()),
                non_blank(sign.as_deref()),
            ) {
                return format!("{planet} Enters {sign}");
            }
            if name.contains("Enters") {
                return name.to_string();
            }
            if name.is_empty() {
                "Planetary Ingress".to_string()
            } else {
                name.to_string()
            }
        }
        EventKind::Retrograde { planet, .. } => {
            if let Some(planet) = non_blank(planet.as_deref()) {
                return format!("{planet} Retrograde Begins");
            }
            if name.contains("Retrograde") {
                return name.to_string();
            }
            if name.is_empty() {
                "Planetary Retrograde".to_string()
            } else {
                name.to_string()
            }
        }
        EventKind::Seasonal { .. } => {
            if name.is_empty() {
                "Seasonal Event".to_string()
            } else {
                name.to_string()
            }
        }
    }
}

/// Build the body text for an event.
#[must_use]
pub fn build_body(event: &NotificationEvent) -> String {
    match &event.kind {
        EventKind::Moon => moon_description(&event.name),
        EventKind::Aspect {
            planet_a,
            planet_b,
            aspect,
        } => aspect_description(
            planet_a.as_deref(),
            planet_b.as_deref(),
            aspect.as_deref(),
        ),
        EventKind::Ingress { planet, sign } => {
            // Recover the pieces from a "{Planet} Enters {Sign}" name when
            // the scheduler omitted the structured fields.
            let parts: Vec<&str> = event.name.split_whitespace().collect();
            let planet = non_blank(planet.as_deref()).or_else(|| parts.first().copied());
            let sign = non_blank(sign.as_deref()).or_else(|| parts.get(2).copied());
            ingress_description(planet, sign)
        }
        EventKind::Retrograde { planet, sign } => {
            let planet = non_blank(planet.as_deref())
                .or_else(|| event.name.split_whitespace().next());
            retrograde_description(planet, sign.as_deref())
        }
        EventKind::Seasonal {
            energy,
            description,
        } => seasonal_description(&event.name, energy.as_deref(), description.as_deref()),
    }
}

/// Append contextual astronomy info to a body.
///
/// Only moon events are enriched: when the context carries the moon's
/// current sign, ` (Moon in {sign})` is appended. Everything else passes
/// through unchanged.
#[must_use]
pub fn add_contextual_info(
    body: String,
    event: &NotificationEvent,
    context: Option<&CosmicContext>,
) -> String {
    if event.kind != EventKind::Moon {
        return body;
    }
    let Some(sign) = context.and_then(|c| non_blank(c.moon_sign.as_deref())) else {
        return body;
    };
    format!("{body} (Moon in {sign})")
}

/// Build the complete push payload for an event.
#[must_use]
pub fn build_payload(event: &NotificationEvent, context: Option<&CosmicContext>) -> NotificationPayload {
    let title = build_title(event);
    let body = add_contextual_info(build_body(event), event, context);

    let event_name = if event.name.trim().is_empty() {
        "Cosmic Event".to_string()
    } else {
        event.name.clone()
    };

    let date = context
        .and_then(|c| c.date)
        .unwrap_or_else(|| Utc::now().date_naive())
        .to_string();

    let mut data = PayloadData {
        url: "/".to_string(),
        date,
        event_type: event.kind.as_str().to_string(),
        priority: event.priority,
        event_name: event_name.clone(),
        phase: None,
        aspect: None,
        ingress: None,
        season: None,
    };
    match event.kind {
        EventKind::Moon => data.phase = Some(event_name),
        EventKind::Aspect { .. } => data.aspect = Some(event_name),
        EventKind::Ingress { .. } => data.ingress = Some(event_name),
        EventKind::Seasonal { .. } => data.season = Some(event_name),
        EventKind::Retrograde { .. } => {}
    }

    NotificationPayload {
        title,
        body,
        icon: "/icons/icon-192x192.png".to_string(),
        badge: "/icons/icon-72x72.png".to_string(),
        tag: format!("lunary-{}", event.kind.as_str()),
        data,
        actions: vec![NotificationAction {
            action: "view".to_string(),
            title: "View".to_string(),
            icon: "/icons/icon-72x72.png".to_string(),
        }],
        vibrate: vec![200, 100, 200],
    }
}

/// Render a body from the per-category phrasing variants, skipping texts
/// already used for the same context.
///
/// Variants carry `{planet}`, `{sign}`, `{planetA}`, `{planetB}` and
/// `{aspect}` placeholder tokens. The first variant whose rendered text is
/// not in `used` wins; when every variant is exhausted the first one is
/// returned anyway.
#[must_use]
pub fn variant_body(event: &NotificationEvent, used: &HashSet<String>) -> String {
    let variants: &[&str] = match event.kind {
        EventKind::Moon => &[
            "Lunar energy peaks today, inviting reflection and intention-setting",
            "The moon turns a corner tonight, shifting the emotional tone",
            "A fresh lunar chapter opens, carrying new themes for the days ahead",
        ],
        EventKind::Aspect { .. } => &[
            "{planetA} and {planetB} form a {aspect} today, shaping the collective mood",
            "A {aspect} between {planetA} and {planetB} colors the day's energy",
        ],
        EventKind::Ingress { .. } => &[
            "{planet} enters {sign}, bringing a new flavor to its themes",
            "{planet} moves into {sign} today, redirecting its focus",
            "A shift as {planet} crosses into {sign}",
        ],
        EventKind::Retrograde { .. } => &[
            "{planet} stations retrograde, inviting review and reflection",
            "{planet} begins its backward dance through {sign}",
        ],
        EventKind::Seasonal { .. } => &[
            "The wheel of the year turns, marking a seasonal threshold",
            "A seasonal turning point arrives, shifting the year's rhythm",
        ],
    };

    let mut rendered = variants.iter().map(|v| substitute(v, event));
    let first = rendered.next().unwrap_or_default();
    if !used.contains(&first) {
        return first;
    }
    rendered
        .find(|candidate| !used.contains(candidate))
        .unwrap_or(first)
}

/// Fill placeholder tokens from the event's fields.
fn substitute(template: &str, event: &NotificationEvent) -> String {
    let mut out = template.to_string();
    match &event.kind {
        EventKind::Aspect {
            planet_a,
            planet_b,
            aspect,
        } => {
            out = out.replace("{planetA}", planet_a.as_deref().unwrap_or("Planet"));
            out = out.replace("{planetB}", planet_b.as_deref().unwrap_or("Planet"));
            out = out.replace(
                "{aspect}",
                &capitalize(aspect.as_deref().unwrap_or("Alignment")),
            );
        }
        EventKind::Ingress { planet, sign } | EventKind::Retrograde { planet, sign } => {
            out = out.replace("{planet}", planet.as_deref().unwrap_or("A planet"));
            out = out.replace("{sign}", sign.as_deref().unwrap_or("a new sign"));
        }
        EventKind::Moon | EventKind::Seasonal { .. } => {}
    }
    out
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn capitalize(value: &str) -> String {
    let mut chars = value.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_uppercase().collect::<String>() + chars.as_str()
    })
}

fn moon_description(phase_name: &str) -> String {
    const PHASES: [(&str, &str); 4] = [
        (
            "New Moon",
            "A powerful reset point for manifestation and new beginnings. Set intentions aligned with your deeper purpose.",
        ),
        (
            "Full Moon",
            "Peak illumination brings clarity to accomplishments and reveals areas ready for release and transformation.",
        ),
        (
            "First Quarter",
            "A critical decision point supporting decisive action and breakthrough moments.",
        ),
        (
            "Last Quarter",
            "A time for reflection, release, and preparing for the next lunar cycle.",
        ),
    ];

    PHASES
        .iter()
        .find(|(phase, _)| phase_name.contains(phase))
        .map_or_else(
            || "Lunar energy shift creating new opportunities for growth".to_string(),
            |(_, description)| (*description).to_string(),
        )
}

fn aspect_description(
    planet_a: Option<&str>,
    planet_b: Option<&str>,
    aspect: Option<&str>,
) -> String {
    const GENERIC: &str = "Powerful cosmic alignment creating new opportunities";

    let Some(aspect) = non_blank(aspect) else {
        return GENERIC.to_string();
    };
    let (Some(planet_a), Some(planet_b)) = (non_blank(planet_a), non_blank(planet_b)) else {
        return GENERIC.to_string();
    };

    let action = match aspect {
        "conjunction" => "unite their energies",
        "trine" => "flow harmoniously together",
        "square" => "create dynamic tension",
        "sextile" => "offer cooperative opportunities",
        "opposition" => "seek balance between",
        _ => "align",
    };

    format!("{planet_a} and {planet_b} {action}, creating powerful cosmic influence")
}

fn ingress_description(planet: Option<&str>, sign: Option<&str>) -> String {
    const GENERIC: &str = "Planetary energy shift creating new opportunities";

    let (Some(planet), Some(sign)) = (non_blank(planet), non_blank(sign)) else {
        return GENERIC.to_string();
    };

    match ingress_influence(planet, sign) {
        Some(influence) => format!("This amplifies focus on {influence} energies"),
        None => format!("This amplifies focus on {sign} themes and energies"),
    }
}

/// Influence phrase for a planet entering a sign.
fn ingress_influence(planet: &str, sign: &str) -> Option<&'static str> {
    let influence = match (planet, sign) {
        ("Mercury", "Aries") => "directness and pioneering ideas",
        ("Mercury", "Taurus") => "practicality and grounded wisdom",
        ("Mercury", "Gemini") => "mental agility, communication, and learning",
        ("Mercury", "Cancer") => "emotional intelligence and intuition",
        ("Mercury", "Leo") => "confidence and creative expression",
        ("Mercury", "Virgo") => "precision and analytical clarity",
        ("Mercury", "Libra") => "harmony and balanced dialogue",
        ("Mercury", "Scorpio") => "deep, transformative conversations",
        ("Mercury", "Sagittarius") => "philosophical discourse and exploration",
        ("Mercury", "Capricorn") => "practical achievement through communication",
        ("Mercury", "Aquarius") => "unconventional ideas and technology",
        ("Mercury", "Pisces") => "intuitive understanding and artistic expression",
        ("Venus", "Aries") => "passionate attraction and bold romance",
        ("Venus", "Taurus") => "sensuality, stability, and material beauty",
        ("Venus", "Gemini") => "lighthearted connections and intellectual attraction",
        ("Venus", "Cancer") => "emotional bonds and nurturing love",
        ("Venus", "Leo") => "dramatic romance and creative expression",
        ("Venus", "Virgo") => "practical love and service in relationships",
        ("Venus", "Libra") => "partnerships and artistic beauty",
        ("Venus", "Scorpio") => "transformative love and deep connections",
        ("Venus", "Sagittarius") => "adventurous romance and philosophical bonds",
        ("Venus", "Capricorn") => "committed, structured relationships",
        ("Venus", "Aquarius") => "unconventional connections and friendly love",
        ("Venus", "Pisces") => "dreamy romance and spiritual connection",
        ("Mars", "Aries") => "action, courage, and pioneering initiative",
        ("Mars", "Taurus") => "stability, patience, and material progress",
        ("Mars", "Gemini") => "communication, learning, and mental agility",
        ("Mars", "Cancer") => "emotional security and nurturing actions",
        ("Mars", "Leo") => "creative expression and confident leadership",
        ("Mars", "Virgo") => "precision and disciplined action in work and health",
        ("Mars", "Libra") => "balance in partnerships and harmonious action",
        ("Mars", "Scorpio") => "transformation and deep emotional focus",
        ("Mars", "Sagittarius") => "adventure and philosophical exploration",
        ("Mars", "Capricorn") => "structured ambition and long-term goals",
        ("Mars", "Aquarius") => "innovation and revolutionary change",
        ("Mars", "Pisces") => "intuitive action and compassionate service",
        ("Jupiter", "Aries") => "leadership and pioneering ventures",
        ("Jupiter", "Taurus") => "financial growth and material abundance",
        ("Jupiter", "Gemini") => "learning, communication, and short-distance travel",
        ("Jupiter", "Cancer") => "home, family, and emotional security",
        ("Jupiter", "Leo") => "creativity, entertainment, and self-expression",
        ("Jupiter", "Virgo") => "health, work, and service to others",
        ("Jupiter", "Libra") => "partnerships, justice, and artistic pursuits",
        ("Jupiter", "Scorpio") => "transformation, research, and shared resources",
        ("Jupiter", "Sagittarius") => "higher education, philosophy, and long-distance travel",
        ("Jupiter", "Capricorn") => "career recognition and public achievement",
        ("Jupiter", "Aquarius") => "friendship and humanitarian causes",
        ("Jupiter", "Pisces") => "spirituality, compassion, and artistic inspiration",
        ("Saturn", "Aries") => "discipline in personal expression and independence",
        ("Saturn", "Taurus") => "structure in material values and financial stability",
        ("Saturn", "Gemini") => "responsibility in communication and learning",
        ("Saturn", "Cancer") => "structure in emotional security and family",
        ("Saturn", "Leo") => "discipline in creative expression and leadership",
        ("Saturn", "Virgo") => "structure in work methods and health routines",
        ("Saturn", "Libra") => "commitment in partnerships and relationships",
        ("Saturn", "Scorpio") => "transformation through power structures and healing",
        ("Saturn", "Sagittarius") => "structure in belief systems and education",
        ("Saturn", "Capricorn") => "authority and institutional achievement",
        ("Saturn", "Aquarius") => "structured social change",
        ("Saturn", "Pisces") => "discipline in spiritual practice",
        ("Uranus", "Aries") => "personal independence and pioneering spirit",
        ("Uranus", "Taurus") => "material values and earth-conscious innovation",
        ("Uranus", "Gemini") => "communication technology and mental liberation",
        ("Uranus", "Cancer") => "family structures and emotional freedom",
        ("Uranus", "Leo") => "creative expression and individual uniqueness",
        ("Uranus", "Virgo") => "work methods and health innovations",
        ("Uranus", "Libra") => "relationship patterns and social justice",
        ("Uranus", "Scorpio") => "power structures and transformational healing",
        ("Uranus", "Sagittarius") => "belief systems and educational reform",
        ("Uranus", "Capricorn") => "authority structures and institutional change",
        ("Uranus", "Aquarius") => "collective consciousness and technological advancement",
        ("Uranus", "Pisces") => "spiritual awakening and artistic inspiration",
        ("Neptune", "Aries") => "spiritual leadership and intuitive action",
        ("Neptune", "Taurus") => "material attachment and earth spirituality",
        ("Neptune", "Gemini") => "intuitive communication and mental clarity",
        ("Neptune", "Cancer") => "emotional boundaries and family mysticism",
        ("Neptune", "Leo") => "creative expression and heart-centered art",
        ("Neptune", "Virgo") => "service and practical spirituality",
        ("Neptune", "Libra") => "relationship ideals and artistic beauty",
        ("Neptune", "Scorpio") => "hidden truths and mystical transformation",
        ("Neptune", "Sagittarius") => "spiritual seeking and higher knowledge",
        ("Neptune", "Capricorn") => "transcendence of material illusions with spiritual authority",
        ("Neptune", "Aquarius") => "collective dreams and humanitarian vision",
        ("Neptune", "Pisces") => "universal compassion and divine connection",
        ("Pluto", "Aries") => "personal power and individual transformation",
        ("Pluto", "Taurus") => "material values and resource transformation",
        ("Pluto", "Gemini") => "communication power and mental transformation",
        ("Pluto", "Cancer") => "emotional depth and family transformation",
        ("Pluto", "Leo") => "creative power and self-expression transformation",
        ("Pluto", "Virgo") => "work and health transformation",
        ("Pluto", "Libra") => "relationship power and social transformation",
        ("Pluto", "Scorpio") => "deep psychological and spiritual transformation",
        ("Pluto", "Sagittarius") => "belief systems and educational transformation",
        ("Pluto", "Capricorn") => "power structures and institutional transformation",
        ("Pluto", "Aquarius") => "collective consciousness and technological transformation",
        ("Pluto", "Pisces") => "spiritual evolution and universal consciousness",
        _ => return None,
    };
    Some(influence)
}

fn retrograde_description(planet: Option<&str>, sign: Option<&str>) -> String {
    let Some(planet) = non_blank(planet) else {
        return "Planetary retrograde invites reflection and review".to_string();
    };

    let meaning = match planet {
        "Mercury" => "invites reflection on communication, technology, and mental patterns",
        "Venus" => "encourages review of relationships, values, and what brings beauty",
        "Mars" => "suggests revisiting action, motivation, and how we channel energy",
        "Jupiter" => "invites reflection on expansion, growth, and philosophical beliefs",
        "Saturn" => "encourages review of structures, responsibilities, and long-term goals",
        "Uranus" => "brings revolutionary reflection on change, innovation, and freedom",
        "Neptune" => "invites reflection on dreams, intuition, and spiritual connection",
        "Pluto" => "encourages deep transformation through shadow work and renewal",
        _ => "invites reflection and review",
    };

    match non_blank(sign) {
        Some(sign) => format!("This {meaning} in {sign}"),
        None => format!("This {meaning}"),
    }
}

fn seasonal_description(name: &str, energy: Option<&str>, description: Option<&str>) -> String {
    if name.contains("Equinox") {
        return "Equal day and night mark a powerful balance point, supporting new beginnings and equilibrium"
            .to_string();
    }
    if name.contains("Solstice") {
        return "Peak daylight or darkness marks a turning point, supporting reflection and seasonal transition"
            .to_string();
    }
    if let Some(energy) = non_blank(energy) {
        return energy.to_string();
    }
    if let Some(description) = non_blank(description) {
        return description.to_string();
    }
    "Seasonal energy shift brings new themes and opportunities for growth".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventKind;

    fn event(name: &str, kind: EventKind) -> NotificationEvent {
        NotificationEvent {
            name: name.to_string(),
            priority: 5,
            kind,
        }
    }

    fn all_kinds_with_fields_absent() -> Vec<EventKind> {
        vec![
            EventKind::Moon,
            EventKind::Aspect {
                planet_a: None,
                planet_b: None,
                aspect: None,
            },
            EventKind::Ingress {
                planet: None,
                sign: None,
            },
            EventKind::Retrograde {
                planet: None,
                sign: None,
            },
            EventKind::Seasonal {
                energy: None,
                description: None,
            },
        ]
    }

    #[test]
    fn test_title_and_body_never_empty() {
        for kind in all_kinds_with_fields_absent() {
            for name in ["", "   ", "Some Event"] {
                let event = event(name, kind.clone());
                assert!(!build_title(&event).is_empty(), "empty title for {kind:?}");
                assert!(!build_body(&event).is_empty(), "empty body for {kind:?}");
            }
        }
    }

    #[test]
    fn test_moon_title_uses_name_verbatim() {
        let moon = event("Full Moon in Scorpio", EventKind::Moon);
        assert_eq!(build_title(&moon), "Full Moon in Scorpio");

        let blank = event("", EventKind::Moon);
        assert_eq!(build_title(&blank), "Moon Phase");
    }

    #[test]
    fn test_aspect_title_formats_planet_pair() {
        let aspect = event(
            "Venus Trine Mars",
            EventKind::Aspect {
                planet_a: Some("Venus".to_string()),
                planet_b: Some("Mars".to_string()),
                aspect: Some("trine".to_string()),
            },
        );
        assert_eq!(build_title(&aspect), "Venus-Mars Trine");
    }

    #[test]
    fn test_aspect_title_falls_back_to_name() {
        let aspect = event(
            "Venus Trine Mars",
            EventKind::Aspect {
                planet_a: Some("Venus".to_string()),
                planet_b: None,
                aspect: Some("trine".to_string()),
            },
        );
        assert_eq!(build_title(&aspect), "Venus Trine Mars");
    }

    #[test]
    fn test_ingress_title() {
        let ingress = event(
            "ignored",
            EventKind::Ingress {
                planet: Some("Venus".to_string()),
                sign: Some("Leo".to_string()),
            },
        );
        assert_eq!(build_title(&ingress), "Venus Enters Leo");

        let from_name = event(
            "Mercury Enters Gemini",
            EventKind::Ingress {
                planet: None,
                sign: None,
            },
        );
        assert_eq!(build_title(&from_name), "Mercury Enters Gemini");
    }

    #[test]
    fn test_retrograde_title() {
        let retro = event(
            "whatever",
            EventKind::Retrograde {
                planet: Some("Mercury".to_string()),
                sign: None,
            },
        );
        assert_eq!(build_title(&retro), "Mercury Retrograde Begins");
    }

    #[test]
    fn test_moon_body_matches_phase_substring() {
        let full = event("Full Moon in Taurus", EventKind::Moon);
        assert!(build_body(&full).contains("Peak illumination"));

        let unknown = event("Waxing Gibbous", EventKind::Moon);
        assert_eq!(
            build_body(&unknown),
            "Lunar energy shift creating new opportunities for growth"
        );
    }

    #[test]
    fn test_aspect_body_joins_planets() {
        let aspect = event(
            "Venus Trine Mars",
            EventKind::Aspect {
                planet_a: Some("Venus".to_string()),
                planet_b: Some("Mars".to_string()),
                aspect: Some("trine".to_string()),
            },
        );
        assert_eq!(
            build_body(&aspect),
            "Venus and Mars flow harmoniously together, creating powerful cosmic influence"
        );
    }

    #[test]
    fn test_ingress_body_uses_influence_table() {
        let ingress = event(
            "Venus Enters Leo",
            EventKind::Ingress {
                planet: None,
                sign: None,
            },
        );
        // Planet and sign recovered from the name
        assert_eq!(
            build_body(&ingress),
            "This amplifies focus on dramatic romance and creative expression energies"
        );
    }

    #[test]
    fn test_ingress_body_unknown_pair_falls_back_to_sign() {
        let ingress = event(
            "",
            EventKind::Ingress {
                planet: Some("Chiron".to_string()),
                sign: Some("Aries".to_string()),
            },
        );
        assert_eq!(
            build_body(&ingress),
            "This amplifies focus on Aries themes and energies"
        );
    }

    #[test]
    fn test_retrograde_body_with_sign() {
        let retro = event(
            "",
            EventKind::Retrograde {
                planet: Some("Venus".to_string()),
                sign: Some("Scorpio".to_string()),
            },
        );
        assert_eq!(
            build_body(&retro),
            "This encourages review of relationships, values, and what brings beauty in Scorpio"
        );
    }

    #[test]
    fn test_contextual_info_appends_moon_sign() {
        let moon = event("Full Moon", EventKind::Moon);
        let context = CosmicContext {
            date: None,
            moon_sign: Some("Pisces".to_string()),
        };
        let body = add_contextual_info("Base text".to_string(), &moon, Some(&context));
        assert_eq!(body, "Base text (Moon in Pisces)");

        // No context: pass through
        let body = add_contextual_info("Base text".to_string(), &moon, None);
        assert_eq!(body, "Base text");

        // Non-moon events are never enriched
        let seasonal = event(
            "Summer Solstice",
            EventKind::Seasonal {
                energy: None,
                description: None,
            },
        );
        let body = add_contextual_info("Base text".to_string(), &seasonal, Some(&context));
        assert_eq!(body, "Base text");
    }

    #[test]
    fn test_payload_tag_and_data() {
        let moon = event("Full Moon", EventKind::Moon);
        let payload = build_payload(&moon, None);
        assert_eq!(payload.tag, "lunary-moon");
        assert_eq!(payload.data.phase.as_deref(), Some("Full Moon"));
        assert_eq!(payload.data.event_type, "moon");
        assert_eq!(payload.vibrate, vec![200, 100, 200]);
    }

    #[test]
    fn test_variant_body_skips_used_texts() {
        let ingress = event(
            "Venus Enters Leo",
            EventKind::Ingress {
                planet: Some("Venus".to_string()),
                sign: Some("Leo".to_string()),
            },
        );

        let mut used = HashSet::new();
        let first = variant_body(&ingress, &used);
        assert!(first.contains("Venus"));
        assert!(first.contains("Leo"));

        used.insert(first.clone());
        let second = variant_body(&ingress, &used);
        assert_ne!(first, second);

        // All variants exhausted: fall back to the first
        used.insert(second);
        used.insert(variant_body(&ingress, &used));
        assert_eq!(variant_body(&ingress, &used), first);
    }
}
