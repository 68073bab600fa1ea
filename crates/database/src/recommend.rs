//! Recommendation scorer: ranked opposite-role browse candidates.
//!
//! Scoring is a two-tier match per attribute (industry, location): exact
//! case-insensitive equality scores 2, a case-insensitive substring match
//! scores 1 only when equality did not, missing data scores 0. Candidates
//! already connected (any status, either direction), already favorited, or
//! the viewer itself are excluded. Pagination is applied after the full
//! candidate set is scored and sorted, never before.

use sqlx::{FromRow, SqlitePool};

use crate::error::Result;
use crate::models::{Recommendation, Role};
use crate::validation::{clamp_limit, clamp_offset};

#[derive(FromRow)]
struct CandidateRow {
    id: i64,
    role: Role,
    profile_picture: Option<String>,
    bio: Option<String>,
    created_at: String,
    industry: Option<String>,
    location: Option<String>,
}

/// Score one attribute pair: 2 exact, 1 substring fallback, 0 otherwise.
fn attribute_score(viewer: Option<&str>, candidate: Option<&str>) -> i64 {
    let (Some(viewer), Some(candidate)) = (viewer, candidate) else {
        return 0;
    };
    let viewer = viewer.trim().to_lowercase();
    let candidate = candidate.trim().to_lowercase();

    if viewer.is_empty() || candidate.is_empty() {
        0
    } else if viewer == candidate {
        2
    } else if viewer.contains(&candidate) || candidate.contains(&viewer) {
        1
    } else {
        0
    }
}

/// Produce the ranked candidate list for a viewer.
pub async fn recommend(
    pool: &SqlitePool,
    viewer_profile_id: i64,
    limit: i64,
    offset: i64,
) -> Result<Vec<Recommendation>> {
    let viewer = crate::profile::get_profile(pool, viewer_profile_id).await?;
    let (viewer_industry, viewer_location) =
        crate::role_profile::matching_attributes(pool, &viewer).await?;

    let candidates = sqlx::query_as::<_, CandidateRow>(
        r#"
        SELECT p.id, p.role, p.profile_picture, p.bio, p.created_at,
               COALESCE(e.industry, i.industry_focus) AS industry,
               COALESCE(e.location, i.location) AS location
        FROM profiles p
        LEFT JOIN entrepreneur_profiles e ON e.profile_id = p.id
        LEFT JOIN investor_profiles i ON i.profile_id = p.id
        WHERE p.role = ?1
          AND p.id <> ?2
          AND p.id NOT IN
              (SELECT recipient_id FROM connections WHERE requester_id = ?2)
          AND p.id NOT IN
              (SELECT requester_id FROM connections WHERE recipient_id = ?2)
          AND p.id NOT IN
              (SELECT favorited_profile_id FROM favorites WHERE profile_id = ?2)
        "#,
    )
    .bind(viewer.role.opposite())
    .bind(viewer_profile_id)
    .fetch_all(pool)
    .await?;

    let mut scored: Vec<Recommendation> = candidates
        .into_iter()
        .map(|row| {
            let score = attribute_score(viewer_industry.as_deref(), row.industry.as_deref())
                + attribute_score(viewer_location.as_deref(), row.location.as_deref());
            Recommendation {
                profile_id: row.id,
                role: row.role,
                profile_picture: row.profile_picture,
                bio: row.bio,
                industry: row.industry,
                location: row.location,
                score,
                created_at: row.created_at,
            }
        })
        .collect();

    // Full sort before slicing; id breaks same-second ties so the order is
    // total and re-runs are identical.
    scored.sort_by(|a, b| {
        b.score
            .cmp(&a.score)
            .then_with(|| b.created_at.cmp(&a.created_at))
            .then_with(|| b.profile_id.cmp(&a.profile_id))
    });

    let limit = clamp_limit(limit, 10) as usize;
    let offset = clamp_offset(offset) as usize;

    Ok(scored.into_iter().skip(offset).take(limit).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::request_connection;
    use crate::favorite::add_favorite;
    use crate::role_profile::{
        create_entrepreneur_profile, create_investor_profile, EntrepreneurAttrs, InvestorAttrs,
    };
    use crate::test_support::{seed_profile, test_db};

    #[test]
    fn test_attribute_score_tiers() {
        assert_eq!(attribute_score(Some("Fintech"), Some("fintech")), 2);
        assert_eq!(attribute_score(Some("Fintech"), Some("Consumer Fintech")), 1);
        assert_eq!(attribute_score(Some("Consumer Fintech"), Some("fintech")), 1);
        assert_eq!(attribute_score(Some("Fintech"), Some("Biotech")), 0);
        assert_eq!(attribute_score(None, Some("Fintech")), 0);
        assert_eq!(attribute_score(Some("Fintech"), None), 0);
        assert_eq!(attribute_score(Some("  "), Some("Fintech")), 0);
    }

    async fn seed_entrepreneur(
        pool: &SqlitePool,
        user_id: &str,
        industry: Option<&str>,
        location: Option<&str>,
    ) -> i64 {
        let profile = seed_profile(pool, user_id, Role::Entrepreneur).await;
        create_entrepreneur_profile(
            pool,
            profile.id,
            &EntrepreneurAttrs {
                startup_name: format!("{user_id} Inc"),
                industry: industry.map(str::to_string),
                location: location.map(str::to_string),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        profile.id
    }

    async fn seed_investor(
        pool: &SqlitePool,
        user_id: &str,
        industry_focus: Option<&str>,
        location: Option<&str>,
    ) -> i64 {
        let profile = seed_profile(pool, user_id, Role::Investor).await;
        create_investor_profile(
            pool,
            profile.id,
            &InvestorAttrs {
                industry_focus: industry_focus.map(str::to_string),
                location: location.map(str::to_string),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        profile.id
    }

    #[tokio::test]
    async fn test_case_insensitive_industry_match_scores_two() {
        let db = test_db().await;
        let pool = db.pool();

        let viewer = seed_entrepreneur(pool, "founder", Some("Fintech"), Some("NYC")).await;
        let investor =
            seed_investor(pool, "investor", Some("fintech"), Some("San Francisco")).await;

        let results = recommend(pool, viewer, 10, 0).await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].profile_id, investor);
        assert_eq!(results[0].score, 2);
    }

    #[tokio::test]
    async fn test_exclusions() {
        let db = test_db().await;
        let pool = db.pool();

        let viewer = seed_entrepreneur(pool, "founder", Some("Fintech"), None).await;
        let connected = seed_investor(pool, "connected", None, None).await;
        let requested_me = seed_investor(pool, "requested-me", None, None).await;
        let favorited = seed_investor(pool, "favorited", None, None).await;
        let fresh = seed_investor(pool, "fresh", None, None).await;
        let same_side = seed_entrepreneur(pool, "rival", Some("Fintech"), None).await;

        request_connection(pool, viewer, connected).await.unwrap();
        request_connection(pool, requested_me, viewer).await.unwrap();
        add_favorite(pool, viewer, favorited).await.unwrap();

        let results = recommend(pool, viewer, 10, 0).await.unwrap();
        let ids: Vec<i64> = results.iter().map(|r| r.profile_id).collect();
        assert_eq!(ids, vec![fresh]);
        assert!(!ids.contains(&viewer));
        assert!(!ids.contains(&connected));
        assert!(!ids.contains(&requested_me));
        assert!(!ids.contains(&favorited));
        assert!(!ids.contains(&same_side));
    }

    #[tokio::test]
    async fn test_ranking_and_determinism() {
        let db = test_db().await;
        let pool = db.pool();

        let viewer = seed_entrepreneur(pool, "founder", Some("Fintech"), Some("NYC")).await;
        let no_match = seed_investor(pool, "none", Some("Biotech"), Some("Austin")).await;
        let substring = seed_investor(pool, "partial", Some("Consumer Fintech"), None).await;
        let exact_both = seed_investor(pool, "perfect", Some("fintech"), Some("nyc")).await;
        let exact_one = seed_investor(pool, "industry-only", Some("Fintech"), Some("LA")).await;

        let results = recommend(pool, viewer, 10, 0).await.unwrap();
        let ranked: Vec<(i64, i64)> = results.iter().map(|r| (r.profile_id, r.score)).collect();
        assert_eq!(
            ranked,
            vec![(exact_both, 4), (exact_one, 2), (substring, 1), (no_match, 0)]
        );

        // Same data, same order, every run.
        let again = recommend(pool, viewer, 10, 0).await.unwrap();
        assert_eq!(results, again);
    }

    #[tokio::test]
    async fn test_pagination_after_sort() {
        let db = test_db().await;
        let pool = db.pool();

        let viewer = seed_entrepreneur(pool, "founder", Some("Fintech"), Some("NYC")).await;
        seed_investor(pool, "none", Some("Biotech"), None).await;
        let best = seed_investor(pool, "best", Some("Fintech"), Some("NYC")).await;
        let second = seed_investor(pool, "second", Some("Fintech"), None).await;

        let page_one = recommend(pool, viewer, 1, 0).await.unwrap();
        assert_eq!(page_one.len(), 1);
        assert_eq!(page_one[0].profile_id, best);

        // Offset slices the sorted ranking, not the raw candidate set.
        let page_two = recommend(pool, viewer, 1, 1).await.unwrap();
        assert_eq!(page_two.len(), 1);
        assert_eq!(page_two[0].profile_id, second);
    }

    #[tokio::test]
    async fn test_ties_broken_by_recency() {
        let db = test_db().await;
        let pool = db.pool();

        let viewer = seed_entrepreneur(pool, "founder", Some("Fintech"), None).await;
        let older = seed_investor(pool, "older", Some("Fintech"), None).await;
        let newer = seed_investor(pool, "newer", Some("Fintech"), None).await;

        // Equal scores: most recently created candidate ranks first.
        let results = recommend(pool, viewer, 10, 0).await.unwrap();
        let ids: Vec<i64> = results.iter().map(|r| r.profile_id).collect();
        assert_eq!(ids, vec![newer, older]);
    }
}
