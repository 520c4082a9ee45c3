use lehrmatch_types::api::ScoreBreakdown;
use lehrmatch_types::models::{IdealOcean, IdealRiasec, OceanScores, RiasecScores};

use crate::fields::field_default_score;
use crate::vector::cosine_similarity;
use crate::weights::COMPATIBILITY_WEIGHTS;

/// Region score when student and listing cantons differ. Partial credit on
/// purpose — nearby listings stay visible instead of vanishing from the feed.
pub const REGION_PARTIAL_CREDIT: f64 = 30.0;

/// Field score when the student has stated no preference at all.
pub const FIELD_NEUTRAL: f64 = 50.0;

/// Scoring inputs taken from a student profile.
#[derive(Debug, Clone)]
pub struct StudentTraits {
    pub canton: String,
    pub ocean: OceanScores,
    pub riasec: RiasecScores,
}

/// Scoring inputs taken from a listing, regardless of which store it came from.
#[derive(Debug, Clone)]
pub struct ListingProfile {
    pub canton: String,
    pub field: String,
    pub ideal_ocean: IdealOcean,
    pub ideal_riasec: IdealRiasec,
}

#[derive(Debug, Clone)]
pub struct CompatibilityResult {
    pub total: u8,
    pub breakdown: [ScoreBreakdown; 4],
}

/// Compute compatibility between a student and a listing. Pure function:
/// the same inputs always produce the same score.
///
/// `desired_fields` is the student's priority-ordered field wish list; an
/// empty list means "I don't know yet" and scores the field factor neutrally.
pub fn compatibility(
    student: &StudentTraits,
    listing: &ListingProfile,
    desired_fields: &[String],
) -> CompatibilityResult {
    let personality = personality_score(&student.ocean, &listing.ideal_ocean);
    let interests = interest_score(&student.riasec, listing);
    let field = field_score(desired_fields, &listing.field);
    let region = if student.canton == listing.canton {
        100.0
    } else {
        REGION_PARTIAL_CREDIT
    };

    let weights = COMPATIBILITY_WEIGHTS;
    let total = personality * weights.personality
        + interests * weights.interests
        + field * weights.field
        + region * weights.region;

    CompatibilityResult {
        total: total.round().clamp(0.0, 100.0) as u8,
        breakdown: [
            ScoreBreakdown {
                label: "Persoenlichkeit".into(),
                weight: weights.personality,
                score: personality.round().clamp(0.0, 100.0) as u8,
            },
            ScoreBreakdown {
                label: "Interessen".into(),
                weight: weights.interests,
                score: interests.round().clamp(0.0, 100.0) as u8,
            },
            ScoreBreakdown {
                label: "Berufsfeld".into(),
                weight: weights.field,
                score: field.round() as u8,
            },
            ScoreBreakdown {
                label: "Region".into(),
                weight: weights.region,
                score: region.round() as u8,
            },
        ],
    }
}

/// OCEAN similarity, 0-100. Ideal components the company left unset mirror
/// the student's own value so "no preference" never counts against anyone.
fn personality_score(student: &OceanScores, ideal: &IdealOcean) -> f64 {
    let student_vec = student.to_vec();
    let ideal_vec: Vec<f64> = ideal
        .to_vec()
        .iter()
        .zip(student_vec.iter())
        .map(|(component, own)| component.unwrap_or(*own))
        .collect();

    cosine_similarity(&student_vec, &ideal_vec) * 100.0
}

/// RIASEC similarity, 0-100. Listings without any ideal interest profile
/// fall back to the field's default profile instead of scoring zero.
fn interest_score(student: &RiasecScores, listing: &ListingProfile) -> f64 {
    if !listing.ideal_riasec.has_any() {
        return field_default_score(student, &listing.field);
    }

    let student_vec = student.to_vec();
    let ideal_vec: Vec<f64> = listing
        .ideal_riasec
        .to_vec()
        .iter()
        .zip(student_vec.iter())
        .map(|(component, own)| component.unwrap_or(*own))
        .collect();

    cosine_similarity(&student_vec, &ideal_vec) * 100.0
}

fn field_score(desired_fields: &[String], listing_field: &str) -> f64 {
    if desired_fields.is_empty() {
        return FIELD_NEUTRAL;
    }
    if desired_fields
        .iter()
        .any(|f| f.eq_ignore_ascii_case(listing_field))
    {
        100.0
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn student() -> StudentTraits {
        StudentTraits {
            canton: "ZH".into(),
            ocean: OceanScores {
                openness: 0.7,
                conscientiousness: 0.8,
                extraversion: 0.5,
                agreeableness: 0.6,
                neuroticism: 0.3,
            },
            riasec: RiasecScores {
                realistic: 0.4,
                investigative: 0.8,
                artistic: 0.3,
                social: 0.5,
                enterprising: 0.6,
                conventional: 0.7,
            },
        }
    }

    fn listing() -> ListingProfile {
        ListingProfile {
            canton: "ZH".into(),
            field: "informatik".into(),
            ideal_ocean: IdealOcean {
                openness: Some(0.7),
                conscientiousness: Some(0.8),
                extraversion: Some(0.5),
                agreeableness: Some(0.6),
                neuroticism: Some(0.3),
            },
            ideal_riasec: IdealRiasec {
                realistic: Some(0.4),
                investigative: Some(0.8),
                artistic: Some(0.3),
                social: Some(0.5),
                enterprising: Some(0.6),
                conventional: Some(0.7),
            },
        }
    }

    #[test]
    fn identical_profiles_score_perfect() {
        let result = compatibility(&student(), &listing(), &["informatik".into()]);
        assert_eq!(result.total, 100);
        assert_eq!(result.breakdown.len(), 4);
    }

    #[test]
    fn different_canton_gets_partial_credit() {
        let mut l = listing();
        l.canton = "BE".into();

        let result = compatibility(&student(), &l, &["informatik".into()]);
        assert!(result.total < 100);

        let region = result.breakdown.iter().find(|b| b.label == "Region").unwrap();
        assert_eq!(region.score, REGION_PARTIAL_CREDIT as u8);
    }

    #[test]
    fn unmatched_desired_fields_score_zero_on_field() {
        let result = compatibility(
            &student(),
            &listing(),
            &["kv".into(), "polymechanik".into()],
        );
        let field = result.breakdown.iter().find(|b| b.label == "Berufsfeld").unwrap();
        assert_eq!(field.score, 0);
    }

    #[test]
    fn empty_desired_fields_score_neutral_on_field() {
        let result = compatibility(&student(), &listing(), &[]);
        let field = result.breakdown.iter().find(|b| b.label == "Berufsfeld").unwrap();
        assert_eq!(field.score, 50);
    }

    #[test]
    fn field_match_is_case_insensitive() {
        let result = compatibility(&student(), &listing(), &["Informatik".into()]);
        let field = result.breakdown.iter().find(|b| b.label == "Berufsfeld").unwrap();
        assert_eq!(field.score, 100);
    }

    #[test]
    fn zero_ocean_vector_scores_neutral_personality() {
        let mut s = student();
        s.ocean = OceanScores::default();

        let result = compatibility(&s, &listing(), &["informatik".into()]);
        let personality = result
            .breakdown
            .iter()
            .find(|b| b.label == "Persoenlichkeit")
            .unwrap();
        assert_eq!(personality.score, 50);
        assert!(result.total > 0);
    }

    #[test]
    fn unset_ideal_components_never_penalize() {
        let mut l = listing();
        l.ideal_ocean = IdealOcean {
            openness: Some(0.7),
            ..Default::default()
        };

        // Every unset component mirrors the student; the one set component
        // matches exactly, so personality stays perfect.
        let result = compatibility(&student(), &l, &["informatik".into()]);
        let personality = result
            .breakdown
            .iter()
            .find(|b| b.label == "Persoenlichkeit")
            .unwrap();
        assert_eq!(personality.score, 100);
    }

    #[test]
    fn missing_ideal_riasec_uses_field_fallback() {
        let mut l = listing();
        l.ideal_riasec = IdealRiasec::default();

        let result = compatibility(&student(), &l, &["informatik".into()]);
        let interests = result.breakdown.iter().find(|b| b.label == "Interessen").unwrap();
        assert!(interests.score <= 100);
        // informatik averages investigative (0.8) and conventional (0.7)
        assert_eq!(interests.score, 75);
    }

    #[test]
    fn breakdown_weights_sum_to_one() {
        let result = compatibility(&student(), &listing(), &["informatik".into()]);
        let total: f64 = result.breakdown.iter().map(|b| b.weight).sum();
        assert!((total - 1.0).abs() < 1e-9);
    }

    #[test]
    fn score_is_always_within_bounds() {
        let mut s = student();
        s.ocean = OceanScores {
            openness: 0.1,
            conscientiousness: 0.1,
            extraversion: 0.9,
            agreeableness: 0.9,
            neuroticism: 0.1,
        };
        let mut l = listing();
        l.ideal_ocean = IdealOcean {
            openness: Some(0.9),
            conscientiousness: Some(0.9),
            extraversion: Some(0.1),
            agreeableness: Some(0.1),
            neuroticism: Some(0.9),
        };
        l.canton = "GE".into();

        let result = compatibility(&s, &l, &[]);
        assert!(result.total <= 100);
    }
}
