use lehrmatch_types::models::RiasecScores;

use crate::fields::{Dimension, ALL_DIMENSIONS};
use crate::vector::cosine_similarity_clamped;

/// Both sides must score at least this much on a dimension for it to count
/// as shared.
pub const SHARED_DIMENSION_THRESHOLD: f64 = 0.4;

/// How many canned explanations a match carries at most.
const MAX_EXPLANATIONS: usize = 3;

/// A career profile from the static apprenticeship catalog.
#[derive(Debug, Clone)]
pub struct CareerArchetype {
    pub code: &'static str,
    pub name: &'static str,
    pub field: &'static str,
    /// RIASEC profile in canonical order; all-zero means "no profile yet"
    /// and excludes the archetype from matching.
    pub riasec: [f64; 6],
}

/// An interest dimension both the student and the career score high on.
#[derive(Debug, Clone)]
pub struct SharedDimension {
    pub dimension: Dimension,
    pub user_score: f64,
    pub career_score: f64,
}

#[derive(Debug, Clone)]
pub struct CareerMatch<'a> {
    pub archetype: &'a CareerArchetype,
    pub match_percentage: u8,
    pub shared_dimensions: Vec<SharedDimension>,
    pub explanations: Vec<&'static str>,
}

/// Rank careers against a student's interest profile.
///
/// Archetypes without a RIASEC profile are skipped, not scored as zero.
/// Returns the top `limit` matches, best first.
pub fn match_careers<'a>(
    user: &RiasecScores,
    archetypes: &'a [CareerArchetype],
    limit: usize,
) -> Vec<CareerMatch<'a>> {
    let user_vec = user.to_vec();

    let mut matches: Vec<CareerMatch<'a>> = archetypes
        .iter()
        .filter(|a| a.riasec.iter().any(|v| *v > 0.0))
        .map(|archetype| {
            let percentage =
                (cosine_similarity_clamped(&user_vec, &archetype.riasec) * 100.0).round() as u8;

            let mut shared: Vec<SharedDimension> = ALL_DIMENSIONS
                .iter()
                .filter_map(|dim| {
                    let user_score = user_vec[dim.index()];
                    let career_score = archetype.riasec[dim.index()];
                    (user_score >= SHARED_DIMENSION_THRESHOLD
                        && career_score >= SHARED_DIMENSION_THRESHOLD)
                        .then_some(SharedDimension {
                            dimension: *dim,
                            user_score,
                            career_score,
                        })
                })
                .collect();
            shared.sort_by(|a, b| {
                (b.user_score + b.career_score)
                    .partial_cmp(&(a.user_score + a.career_score))
                    .unwrap_or(std::cmp::Ordering::Equal)
            });

            let explanations = shared
                .iter()
                .take(MAX_EXPLANATIONS)
                .map(|d| explanation(d.dimension))
                .collect();

            CareerMatch {
                archetype,
                match_percentage: percentage,
                shared_dimensions: shared,
                explanations,
            }
        })
        .collect();

    matches.sort_by(|a, b| b.match_percentage.cmp(&a.match_percentage));
    matches.truncate(limit);
    matches
}

fn explanation(dimension: Dimension) -> &'static str {
    match dimension {
        Dimension::Realistic => {
            "Du packst gerne an und arbeitest mit den Händen — genau das braucht dieser Beruf."
        }
        Dimension::Investigative => {
            "Du bist neugierig und denkst gerne nach — ideal für dieses Berufsfeld."
        }
        Dimension::Artistic => "Deine kreative Ader passt perfekt zu diesem Beruf.",
        Dimension::Social => {
            "Du bist gerne mit Menschen zusammen und hilfst anderen — das steckt in diesem Beruf."
        }
        Dimension::Enterprising => {
            "Du ergreifst die Initiative und überzeugst andere — top für dieses Berufsfeld."
        }
        Dimension::Conventional => {
            "Du arbeitest genau, organisiert und zuverlässig — das wird hier gebraucht."
        }
    }
}

/// Static catalog of Swiss apprenticeship careers with their interest
/// profiles. Codes follow the EFZ naming.
pub const CAREER_ARCHETYPES: &[CareerArchetype] = &[
    CareerArchetype {
        code: "informatiker_efz",
        name: "Informatiker/in EFZ",
        field: "informatik",
        riasec: [0.3, 0.9, 0.2, 0.2, 0.3, 0.7],
    },
    CareerArchetype {
        code: "mediamatiker_efz",
        name: "Mediamatiker/in EFZ",
        field: "informatik",
        riasec: [0.2, 0.6, 0.7, 0.4, 0.6, 0.5],
    },
    CareerArchetype {
        code: "kaufmann_efz",
        name: "Kauffrau/Kaufmann EFZ",
        field: "kv",
        riasec: [0.1, 0.4, 0.2, 0.5, 0.7, 0.9],
    },
    CareerArchetype {
        code: "fage_efz",
        name: "Fachfrau/Fachmann Gesundheit EFZ",
        field: "gesundheit",
        riasec: [0.4, 0.5, 0.2, 0.9, 0.3, 0.5],
    },
    CareerArchetype {
        code: "drogist_efz",
        name: "Drogist/in EFZ",
        field: "gesundheit",
        riasec: [0.3, 0.7, 0.3, 0.7, 0.5, 0.6],
    },
    CareerArchetype {
        code: "fabe_efz",
        name: "Fachfrau/Fachmann Betreuung EFZ",
        field: "soziales",
        riasec: [0.3, 0.3, 0.4, 0.9, 0.3, 0.3],
    },
    CareerArchetype {
        code: "elektroinstallateur_efz",
        name: "Elektroinstallateur/in EFZ",
        field: "elektro",
        riasec: [0.9, 0.6, 0.1, 0.2, 0.3, 0.5],
    },
    CareerArchetype {
        code: "polymechaniker_efz",
        name: "Polymechaniker/in EFZ",
        field: "metall",
        riasec: [0.9, 0.7, 0.2, 0.2, 0.2, 0.5],
    },
    CareerArchetype {
        code: "automobil_mechatroniker_efz",
        name: "Automobil-Mechatroniker/in EFZ",
        field: "auto",
        riasec: [0.9, 0.6, 0.1, 0.2, 0.2, 0.4],
    },
    CareerArchetype {
        code: "maurer_efz",
        name: "Maurer/in EFZ",
        field: "bau",
        riasec: [0.9, 0.2, 0.2, 0.3, 0.3, 0.3],
    },
    CareerArchetype {
        code: "zeichner_efz",
        name: "Zeichner/in EFZ",
        field: "gestaltung",
        riasec: [0.5, 0.6, 0.8, 0.2, 0.3, 0.6],
    },
    CareerArchetype {
        code: "grafiker_efz",
        name: "Grafiker/in EFZ",
        field: "gestaltung",
        riasec: [0.2, 0.3, 0.9, 0.4, 0.4, 0.3],
    },
    CareerArchetype {
        code: "koch_efz",
        name: "Koch/Köchin EFZ",
        field: "gastronomie",
        riasec: [0.8, 0.3, 0.6, 0.5, 0.4, 0.4],
    },
    CareerArchetype {
        code: "detailhandelsfachmann_efz",
        name: "Detailhandelsfachfrau/-fachmann EFZ",
        field: "detailhandel",
        riasec: [0.2, 0.2, 0.3, 0.8, 0.8, 0.5],
    },
    CareerArchetype {
        code: "logistiker_efz",
        name: "Logistiker/in EFZ",
        field: "logistik",
        riasec: [0.7, 0.3, 0.1, 0.3, 0.4, 0.8],
    },
    CareerArchetype {
        code: "gaertner_efz",
        name: "Gärtner/in EFZ",
        field: "natur",
        riasec: [0.8, 0.4, 0.5, 0.3, 0.2, 0.3],
    },
];

#[cfg(test)]
mod tests {
    use super::*;

    fn scores(v: [f64; 6]) -> RiasecScores {
        RiasecScores {
            realistic: v[0],
            investigative: v[1],
            artistic: v[2],
            social: v[3],
            enterprising: v[4],
            conventional: v[5],
        }
    }

    #[test]
    fn identical_vectors_match_at_100() {
        let archetypes = [CareerArchetype {
            code: "test",
            name: "Test",
            field: "informatik",
            riasec: [0.3, 0.9, 0.2, 0.2, 0.3, 0.7],
        }];
        let user = scores([0.3, 0.9, 0.2, 0.2, 0.3, 0.7]);

        let matches = match_careers(&user, &archetypes, 10);
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].match_percentage, 100);
    }

    #[test]
    fn orthogonal_vectors_match_at_0() {
        let archetypes = [CareerArchetype {
            code: "test",
            name: "Test",
            field: "bau",
            riasec: [1.0, 0.0, 0.0, 0.0, 0.0, 0.0],
        }];
        let user = scores([0.0, 1.0, 0.0, 0.0, 0.0, 0.0]);

        let matches = match_careers(&user, &archetypes, 10);
        assert_eq!(matches[0].match_percentage, 0);
    }

    #[test]
    fn archetypes_without_profile_are_skipped() {
        let archetypes = [
            CareerArchetype {
                code: "unprofiled",
                name: "Unprofiled",
                field: "kv",
                riasec: [0.0; 6],
            },
            CareerArchetype {
                code: "profiled",
                name: "Profiled",
                field: "kv",
                riasec: [0.1, 0.4, 0.2, 0.5, 0.7, 0.9],
            },
        ];
        let user = scores([0.5; 6]);

        let matches = match_careers(&user, &archetypes, 10);
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].archetype.code, "profiled");
    }

    #[test]
    fn results_are_sorted_and_bounded_by_limit() {
        let user = scores([0.4, 0.8, 0.3, 0.5, 0.6, 0.7]);
        let matches = match_careers(&user, CAREER_ARCHETYPES, 5);

        assert!(matches.len() <= 5);
        for pair in matches.windows(2) {
            assert!(pair[0].match_percentage >= pair[1].match_percentage);
        }
    }

    #[test]
    fn shared_dimensions_require_both_sides_above_threshold() {
        let archetypes = [CareerArchetype {
            code: "test",
            name: "Test",
            field: "informatik",
            riasec: [0.3, 0.9, 0.2, 0.2, 0.3, 0.7],
        }];
        // Investigative is high on both; conventional only on the career.
        let user = scores([0.2, 0.8, 0.1, 0.1, 0.2, 0.3]);

        let matches = match_careers(&user, &archetypes, 10);
        let shared = &matches[0].shared_dimensions;
        assert_eq!(shared.len(), 1);
        assert_eq!(shared[0].dimension, Dimension::Investigative);
    }

    #[test]
    fn explanations_cap_at_three() {
        let user = scores([0.9; 6]);
        let matches = match_careers(&user, CAREER_ARCHETYPES, 3);
        for m in &matches {
            assert!(m.explanations.len() <= 3);
        }
    }

    #[test]
    fn catalog_profiles_are_normalized() {
        for archetype in CAREER_ARCHETYPES {
            for v in archetype.riasec {
                assert!((0.0..=1.0).contains(&v), "{} out of range", archetype.code);
            }
        }
    }
}
