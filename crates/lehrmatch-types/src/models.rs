use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    Student,
    Company,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Student => "STUDENT",
            Role::Company => "COMPANY",
        }
    }

    pub fn parse(s: &str) -> Option<Role> {
        match s {
            "STUDENT" => Some(Role::Student),
            "COMPANY" => Some(Role::Company),
            _ => None,
        }
    }
}

/// Swipe direction as sent by the client. Stored uppercase in the database.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SwipeDirection {
    Right,
    Left,
    Super,
}

impl SwipeDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            SwipeDirection::Right => "RIGHT",
            SwipeDirection::Left => "LEFT",
            SwipeDirection::Super => "SUPER",
        }
    }

    /// Right and super swipes create a match; left swipes never do.
    pub fn creates_match(&self) -> bool {
        matches!(self, SwipeDirection::Right | SwipeDirection::Super)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum MatchStatus {
    Active,
    Archived,
    Hired,
}

impl MatchStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchStatus::Active => "ACTIVE",
            MatchStatus::Archived => "ARCHIVED",
            MatchStatus::Hired => "HIRED",
        }
    }

    pub fn parse(s: &str) -> Option<MatchStatus> {
        match s {
            "ACTIVE" => Some(MatchStatus::Active),
            "ARCHIVED" => Some(MatchStatus::Archived),
            "HIRED" => Some(MatchStatus::Hired),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum MessageType {
    #[default]
    Text,
    Image,
    File,
    System,
}

impl MessageType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageType::Text => "TEXT",
            MessageType::Image => "IMAGE",
            MessageType::File => "FILE",
            MessageType::System => "SYSTEM",
        }
    }

    /// Unknown values fall back to TEXT rather than failing a whole row.
    pub fn parse(s: &str) -> MessageType {
        match s {
            "IMAGE" => MessageType::Image,
            "FILE" => MessageType::File,
            "SYSTEM" => MessageType::System,
            _ => MessageType::Text,
        }
    }
}

/// OCEAN personality scores, each component in [0, 1].
/// All-zero means the student has not completed the quiz yet.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct OceanScores {
    pub openness: f64,
    pub conscientiousness: f64,
    pub extraversion: f64,
    pub agreeableness: f64,
    pub neuroticism: f64,
}

impl OceanScores {
    pub fn to_vec(&self) -> [f64; 5] {
        [
            self.openness,
            self.conscientiousness,
            self.extraversion,
            self.agreeableness,
            self.neuroticism,
        ]
    }
}

/// RIASEC interest scores, each component in [0, 1].
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RiasecScores {
    pub realistic: f64,
    pub investigative: f64,
    pub artistic: f64,
    pub social: f64,
    pub enterprising: f64,
    pub conventional: f64,
}

impl RiasecScores {
    pub fn to_vec(&self) -> [f64; 6] {
        [
            self.realistic,
            self.investigative,
            self.artistic,
            self.social,
            self.enterprising,
            self.conventional,
        ]
    }
}

/// A listing's ideal OCEAN profile. A `None` component means the company
/// stated no preference for that trait — it must never penalize a student.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct IdealOcean {
    pub openness: Option<f64>,
    pub conscientiousness: Option<f64>,
    pub extraversion: Option<f64>,
    pub agreeableness: Option<f64>,
    pub neuroticism: Option<f64>,
}

impl IdealOcean {
    pub fn to_vec(&self) -> [Option<f64>; 5] {
        [
            self.openness,
            self.conscientiousness,
            self.extraversion,
            self.agreeableness,
            self.neuroticism,
        ]
    }
}

/// A listing's ideal RIASEC profile. Fully absent profiles fall back to the
/// per-field default interest profile during scoring.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct IdealRiasec {
    pub realistic: Option<f64>,
    pub investigative: Option<f64>,
    pub artistic: Option<f64>,
    pub social: Option<f64>,
    pub enterprising: Option<f64>,
    pub conventional: Option<f64>,
}

impl IdealRiasec {
    pub fn to_vec(&self) -> [Option<f64>; 6] {
        [
            self.realistic,
            self.investigative,
            self.artistic,
            self.social,
            self.enterprising,
            self.conventional,
        ]
    }

    /// True when at least one component is set to a positive value.
    pub fn has_any(&self) -> bool {
        self.to_vec().iter().any(|c| c.is_some_and(|v| v > 0.0))
    }
}
