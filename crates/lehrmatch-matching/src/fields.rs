use lehrmatch_types::models::RiasecScores;

/// The six RIASEC interest dimensions, in canonical vector order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dimension {
    Realistic,
    Investigative,
    Artistic,
    Social,
    Enterprising,
    Conventional,
}

pub const ALL_DIMENSIONS: [Dimension; 6] = [
    Dimension::Realistic,
    Dimension::Investigative,
    Dimension::Artistic,
    Dimension::Social,
    Dimension::Enterprising,
    Dimension::Conventional,
];

impl Dimension {
    pub fn index(&self) -> usize {
        match self {
            Dimension::Realistic => 0,
            Dimension::Investigative => 1,
            Dimension::Artistic => 2,
            Dimension::Social => 3,
            Dimension::Enterprising => 4,
            Dimension::Conventional => 5,
        }
    }

    pub fn key(&self) -> &'static str {
        match self {
            Dimension::Realistic => "realistic",
            Dimension::Investigative => "investigative",
            Dimension::Artistic => "artistic",
            Dimension::Social => "social",
            Dimension::Enterprising => "enterprising",
            Dimension::Conventional => "conventional",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Dimension::Realistic => "Realistisch",
            Dimension::Investigative => "Forschend",
            Dimension::Artistic => "Künstlerisch",
            Dimension::Social => "Sozial",
            Dimension::Enterprising => "Unternehmerisch",
            Dimension::Conventional => "Konventionell",
        }
    }
}

/// Dominant RIASEC dimensions per apprenticeship field. Used when a listing
/// carries no ideal interest profile of its own.
pub fn dominant_dimensions(field: &str) -> &'static [Dimension] {
    use Dimension::*;
    match field.to_lowercase().as_str() {
        "informatik" => &[Investigative, Conventional],
        "kv" => &[Conventional, Enterprising],
        "gesundheit" => &[Social, Investigative],
        "soziales" => &[Social],
        "technik" => &[Realistic, Investigative],
        "elektro" => &[Realistic, Investigative],
        "metall" => &[Realistic],
        "bau" => &[Realistic],
        "auto" => &[Realistic],
        "natur" => &[Realistic, Investigative],
        "detailhandel" => &[Enterprising, Social],
        "gastronomie" => &[Realistic, Social],
        "logistik" => &[Conventional, Realistic],
        "gestaltung" => &[Artistic],
        _ => &[],
    }
}

/// Interest score for a listing without an ideal RIASEC profile: the mean of
/// the student's scores on the field's dominant dimensions, scaled to 0-100.
/// Unknown fields score a neutral 50.
pub fn field_default_score(student: &RiasecScores, field: &str) -> f64 {
    let dims = dominant_dimensions(field);
    if dims.is_empty() {
        return 50.0;
    }

    let vec = student.to_vec();
    let total: f64 = dims.iter().map(|d| vec[d.index()]).sum();
    (total / dims.len() as f64) * 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_field_scores_neutral() {
        let student = RiasecScores::default();
        assert_eq!(field_default_score(&student, "astronautik"), 50.0);
    }

    #[test]
    fn dominant_dimensions_drive_the_default_score() {
        let student = RiasecScores {
            investigative: 0.8,
            conventional: 0.6,
            ..Default::default()
        };
        // informatik averages investigative and conventional
        assert!((field_default_score(&student, "informatik") - 70.0).abs() < 1e-9);
    }

    #[test]
    fn field_lookup_is_case_insensitive() {
        assert_eq!(dominant_dimensions("Informatik"), dominant_dimensions("informatik"));
    }

    #[test]
    fn default_score_stays_in_bounds() {
        let maxed = RiasecScores {
            realistic: 1.0,
            investigative: 1.0,
            artistic: 1.0,
            social: 1.0,
            enterprising: 1.0,
            conventional: 1.0,
        };
        for field in ["informatik", "kv", "bau", "gestaltung", "gesundheit"] {
            let score = field_default_score(&maxed, field);
            assert!((0.0..=100.0).contains(&score));
        }
    }
}
