//! Per-subscriber personalization.
//!
//! Decides whether and how deeply a notification may be tailored for a
//! subscriber, and resolves the profile data needed to do it. Tailoring
//! is a paid feature gated on billing status, never on data availability
//! alone.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::events::EventKind;
use lunary_db::entities::billing_subscription::BillingStatus;
use lunary_db::repositories::ProfileRepository;

/// Natal chart placements for one subscriber.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BirthChart {
    /// Sun sign
    #[serde(default)]
    pub sun: Option<String>,
    /// Moon sign
    #[serde(default)]
    pub moon: Option<String>,
    /// Rising sign
    #[serde(default)]
    pub rising: Option<String>,
}

/// How deeply a notification may be tailored for a subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PersonalizationLevel {
    /// Free tier: the base message is delivered unchanged
    None,
    /// Paid but no birthday on file
    Basic,
    /// Paid, birthday present and chart resolved
    Full,
}

/// Read-only personalization snapshot for one subscriber.
///
/// Fetched fresh per notification batch and discarded afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscriberProfile {
    /// Opaque user identity owned by the subscription store
    pub user_id: String,
    /// Display name
    pub name: Option<String>,
    /// Birthday
    pub birthday: Option<chrono::NaiveDate>,
    /// IANA timezone name
    pub timezone: Option<String>,
    /// Billing status
    pub status: BillingStatus,
    /// Plan identifier
    pub plan: Option<String>,
    /// Natal placements, only populated for paying users with a birthday
    pub birth_chart: Option<BirthChart>,
}

impl SubscriberProfile {
    /// Whether the subscriber's billing status grants paid features.
    #[must_use]
    pub fn is_paid(&self) -> bool {
        self.status.is_paid()
    }

    /// First whitespace-separated token of the display name.
    #[must_use]
    pub fn first_name(&self) -> Option<&str> {
        self.name
            .as_deref()
            .and_then(|name| name.split_whitespace().next())
    }
}

/// Whether a notification for `kind` may be personalized for `profile`.
///
/// The event kind is a reserved hook for future category gating; today
/// every category follows the same rule.
#[must_use]
pub fn should_personalize(profile: &SubscriberProfile, _kind: &EventKind) -> bool {
    profile.is_paid() && profile.birthday.is_some()
}

/// Personalization depth for a profile.
#[must_use]
pub fn personalization_level(profile: &SubscriberProfile) -> PersonalizationLevel {
    if !profile.is_paid() {
        return PersonalizationLevel::None;
    }
    if profile.birthday.is_none() {
        return PersonalizationLevel::Basic;
    }
    if profile.birth_chart.is_some() {
        PersonalizationLevel::Full
    } else {
        PersonalizationLevel::Basic
    }
}

/// Personalize a notification title.
///
/// Currently a pass-through; the hook exists so title tailoring can be
/// introduced without touching call sites.
#[must_use]
pub fn personalize_title(title: &str, _profile: &SubscriberProfile) -> String {
    title.to_string()
}

/// Personalize a notification body by addressing the subscriber by name.
///
/// `"Your week ahead..."` becomes `"{First}, your week ahead..."`; any
/// other body gets its first letter lowercased and the name prefixed.
/// Strictly additive: profiles that do not qualify, or carry no name,
/// leave the base message untouched.
#[must_use]
pub fn personalize_body(body: &str, profile: &SubscriberProfile) -> String {
    if !(profile.is_paid() && profile.birthday.is_some()) {
        return body.to_string();
    }
    let Some(first_name) = profile.first_name() else {
        return body.to_string();
    };

    if let Some(rest) = body.strip_prefix("Your ") {
        return format!("{first_name}, your {rest}");
    }

    let mut chars = body.chars();
    match chars.next() {
        Some(first) => format!(
            "{first_name}, {}{}",
            first.to_lowercase(),
            chars.as_str()
        ),
        None => body.to_string(),
    }
}

/// Resolves subscriber profiles from the profile, chart and billing stores.
#[derive(Clone)]
pub struct ProfileResolver {
    repo: ProfileRepository,
}

impl ProfileResolver {
    /// Create a new profile resolver.
    #[must_use]
    pub const fn new(repo: ProfileRepository) -> Self {
        Self { repo }
    }

    /// Resolve a single subscriber's profile.
    pub async fn get_profile(&self, user_id: &str) -> Option<SubscriberProfile> {
        self.batch_get_profiles(&[user_id.to_string()])
            .await
            .remove(user_id)
    }

    /// Resolve profiles for a batch of subscribers.
    ///
    /// Issues one query per backing store regardless of batch size; a
    /// per-user loop here would melt under fan-out to thousands of
    /// subscribers. Store failures degrade the affected data to "absent"
    /// rather than aborting the batch, so delivery always proceeds
    /// (un-personalized at worst).
    pub async fn batch_get_profiles(
        &self,
        user_ids: &[String],
    ) -> HashMap<String, SubscriberProfile> {
        let unique: Vec<String> = user_ids
            .iter()
            .cloned()
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();
        if unique.is_empty() {
            return HashMap::new();
        }

        let profiles = match self.repo.find_profiles(&unique).await {
            Ok(profiles) => profiles,
            Err(e) => {
                tracing::warn!(error = %e, "Profile lookup failed, delivering un-personalized");
                return HashMap::new();
            }
        };

        let charts: HashMap<String, BirthChart> = match self.repo.find_charts(&unique).await {
            Ok(charts) => charts
                .into_iter()
                .map(|chart| {
                    (
                        chart.user_id,
                        BirthChart {
                            sun: chart.sun,
                            moon: chart.moon,
                            rising: chart.rising,
                        },
                    )
                })
                .collect(),
            Err(e) => {
                tracing::warn!(error = %e, "Birth chart lookup failed, continuing without charts");
                HashMap::new()
            }
        };

        let billing: HashMap<String, (BillingStatus, Option<String>)> =
            match self.repo.find_billing(&unique).await {
                Ok(billing) => billing
                    .into_iter()
                    .map(|record| (record.user_id, (record.status, record.plan)))
                    .collect(),
                Err(e) => {
                    tracing::warn!(error = %e, "Billing lookup failed, treating batch as free tier");
                    HashMap::new()
                }
            };

        profiles
            .into_iter()
            .map(|profile| {
                let (status, plan) = billing
                    .get(&profile.user_id)
                    .cloned()
                    .unwrap_or((BillingStatus::Free, None));

                // Chart data is a paid feature: the gate is billing policy,
                // not data availability.
                let birth_chart = if status.is_paid() && profile.birthday.is_some() {
                    charts
                        .get(&profile.user_id)
                        .cloned()
                        .or_else(|| chart_from_preferences(profile.preferences.as_ref()))
                } else {
                    None
                };

                let resolved = SubscriberProfile {
                    user_id: profile.user_id.clone(),
                    name: profile.name,
                    birthday: profile.birthday,
                    timezone: profile.timezone,
                    status,
                    plan,
                    birth_chart,
                };
                (profile.user_id, resolved)
            })
            .collect()
    }
}

/// Secondary chart location: a `birthChart` object cached inside the
/// profile's preference blob.
fn chart_from_preferences(preferences: Option<&serde_json::Value>) -> Option<BirthChart> {
    let value = preferences?.get("birthChart")?;
    serde_json::from_value(value.clone()).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Utc};
    use lunary_db::entities::{billing_subscription, birth_chart, user_profile};
    use sea_orm::{DatabaseBackend, MockDatabase};
    use std::sync::Arc;

    fn paid_profile(name: &str) -> SubscriberProfile {
        SubscriberProfile {
            user_id: "u1".to_string(),
            name: Some(name.to_string()),
            birthday: NaiveDate::from_ymd_opt(1990, 12, 10),
            timezone: None,
            status: BillingStatus::Active,
            plan: Some("lunary_plus".to_string()),
            birth_chart: None,
        }
    }

    fn free_profile(name: &str) -> SubscriberProfile {
        SubscriberProfile {
            status: BillingStatus::Free,
            ..paid_profile(name)
        }
    }

    #[test]
    fn test_personalize_body_prefixes_name() {
        let profile = paid_profile("Ada Lovelace");
        assert_eq!(
            personalize_body("Your week ahead looks bright.", &profile),
            "Ada, your week ahead looks bright."
        );
        assert_eq!(
            personalize_body("Peak illumination brings clarity.", &profile),
            "Ada, peak illumination brings clarity."
        );
    }

    #[test]
    fn test_personalization_is_gated_on_payment() {
        let profile = free_profile("Ada Lovelace");
        let body = "Your week ahead looks bright.";
        let title = "Full Moon";

        // Free tier: byte-identical output regardless of name/birthday
        assert_eq!(personalize_body(body, &profile), body);
        assert_eq!(personalize_title(title, &profile), title);
        assert!(!should_personalize(&profile, &EventKind::Moon));
    }

    #[test]
    fn test_personalization_requires_birthday() {
        let profile = SubscriberProfile {
            birthday: None,
            ..paid_profile("Ada Lovelace")
        };
        assert!(!should_personalize(&profile, &EventKind::Moon));
        assert_eq!(
            personalize_body("Your week ahead looks bright.", &profile),
            "Your week ahead looks bright."
        );
    }

    #[test]
    fn test_personalize_body_without_name_is_noop() {
        let profile = SubscriberProfile {
            name: None,
            ..paid_profile("ignored")
        };
        assert_eq!(
            personalize_body("Your week ahead looks bright.", &profile),
            "Your week ahead looks bright."
        );
    }

    #[test]
    fn test_personalization_level() {
        assert_eq!(
            personalization_level(&free_profile("Ada")),
            PersonalizationLevel::None
        );

        let basic = SubscriberProfile {
            birthday: None,
            ..paid_profile("Ada")
        };
        assert_eq!(personalization_level(&basic), PersonalizationLevel::Basic);

        let full = SubscriberProfile {
            birth_chart: Some(BirthChart {
                sun: Some("Sagittarius".to_string()),
                moon: None,
                rising: None,
            }),
            ..paid_profile("Ada")
        };
        assert_eq!(personalization_level(&full), PersonalizationLevel::Full);
    }

    fn profile_row(user_id: &str, preferences: Option<serde_json::Value>) -> user_profile::Model {
        user_profile::Model {
            user_id: user_id.to_string(),
            name: Some("Ada Lovelace".to_string()),
            birthday: NaiveDate::from_ymd_opt(1990, 12, 10),
            timezone: Some("Europe/London".to_string()),
            preferences,
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    fn billing_row(user_id: &str, status: BillingStatus) -> billing_subscription::Model {
        billing_subscription::Model {
            user_id: user_id.to_string(),
            status,
            plan: Some("lunary_plus".to_string()),
            updated_at: None,
        }
    }

    #[tokio::test]
    async fn test_batch_resolves_chart_from_dedicated_table() {
        let chart_row = birth_chart::Model {
            user_id: "u1".to_string(),
            sun: Some("Sagittarius".to_string()),
            moon: Some("Pisces".to_string()),
            rising: Some("Leo".to_string()),
            computed_at: Utc::now().into(),
        };

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([vec![profile_row("u1", None)]])
                .append_query_results([vec![chart_row]])
                .append_query_results([vec![billing_row("u1", BillingStatus::Active)]])
                .into_connection(),
        );

        let resolver = ProfileResolver::new(ProfileRepository::new(db));
        let profiles = resolver.batch_get_profiles(&["u1".to_string()]).await;

        let profile = profiles.get("u1").unwrap();
        assert!(profile.is_paid());
        assert_eq!(
            profile.birth_chart.as_ref().unwrap().sun.as_deref(),
            Some("Sagittarius")
        );
        assert_eq!(personalization_level(profile), PersonalizationLevel::Full);
    }

    #[tokio::test]
    async fn test_batch_falls_back_to_preferences_chart() {
        let preferences = serde_json::json!({
            "birthChart": { "sun": "Capricorn", "moon": "Virgo", "rising": "Taurus" }
        });

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([vec![profile_row("u1", Some(preferences))]])
                .append_query_results([Vec::<birth_chart::Model>::new()])
                .append_query_results([vec![billing_row("u1", BillingStatus::Trial)]])
                .into_connection(),
        );

        let resolver = ProfileResolver::new(ProfileRepository::new(db));
        let profiles = resolver.batch_get_profiles(&["u1".to_string()]).await;

        let profile = profiles.get("u1").unwrap();
        assert_eq!(
            profile.birth_chart.as_ref().unwrap().sun.as_deref(),
            Some("Capricorn")
        );
    }

    #[tokio::test]
    async fn test_chart_is_never_populated_for_free_users() {
        let preferences = serde_json::json!({
            "birthChart": { "sun": "Capricorn", "moon": "Virgo", "rising": "Taurus" }
        });

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([vec![profile_row("u1", Some(preferences))]])
                .append_query_results([Vec::<birth_chart::Model>::new()])
                .append_query_results([vec![billing_row("u1", BillingStatus::Free)]])
                .into_connection(),
        );

        let resolver = ProfileResolver::new(ProfileRepository::new(db));
        let profiles = resolver.batch_get_profiles(&["u1".to_string()]).await;

        // Chart data exists upstream, but the policy gate wins
        assert!(profiles.get("u1").unwrap().birth_chart.is_none());
    }

    #[tokio::test]
    async fn test_get_profile_resolves_single_subscriber() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([vec![profile_row("u1", None)]])
                .append_query_results([Vec::<birth_chart::Model>::new()])
                .append_query_results([vec![billing_row("u1", BillingStatus::Active)]])
                .into_connection(),
        );

        let resolver = ProfileResolver::new(ProfileRepository::new(db));
        let profile = resolver.get_profile("u1").await.unwrap();

        assert_eq!(profile.name.as_deref(), Some("Ada Lovelace"));
        assert_eq!(profile.first_name(), Some("Ada"));
    }

    #[tokio::test]
    async fn test_missing_billing_row_defaults_to_free() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([vec![profile_row("u1", None)]])
                .append_query_results([Vec::<birth_chart::Model>::new()])
                .append_query_results([Vec::<billing_subscription::Model>::new()])
                .into_connection(),
        );

        let resolver = ProfileResolver::new(ProfileRepository::new(db));
        let profiles = resolver.batch_get_profiles(&["u1".to_string()]).await;

        assert!(!profiles.get("u1").unwrap().is_paid());
    }

    #[tokio::test]
    async fn test_empty_batch_issues_no_queries() {
        let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());
        let resolver = ProfileResolver::new(ProfileRepository::new(db));
        assert!(resolver.batch_get_profiles(&[]).await.is_empty());
    }
}
