//! The interview question catalog.
//!
//! A fixed, ordered table of intake steps. Each step carries the spoken
//! question, the profile field it fills, and a hint describing the accepted
//! value domain (which also feeds the extraction prompt). Index in the table
//! defines interview order; the catalog is constructed once and never
//! mutated.

use serde::{Deserialize, Serialize};

/// Field key for one catalog step.
///
/// The wire form (serde and `token()`) is the camelCase token used by both
/// the extraction oracle contract and the HTTP endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum StepKey {
    Age,
    LifeStage,
    HelmetUsage,
    HealthVision,
    MoneyRelationship,
    Medications,
    RecordPermission,
    AdditionalHealthInfo,
}

impl StepKey {
    /// Wire token for this key, e.g. `"lifeStage"`.
    pub fn token(&self) -> &'static str {
        match self {
            Self::Age => "age",
            Self::LifeStage => "lifeStage",
            Self::HelmetUsage => "helmetUsage",
            Self::HealthVision => "healthVision",
            Self::MoneyRelationship => "moneyRelationship",
            Self::Medications => "medications",
            Self::RecordPermission => "recordPermission",
            Self::AdditionalHealthInfo => "additionalHealthInfo",
        }
    }

    /// Parse a wire token. Unknown tokens yield `None`, never an error.
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "age" => Some(Self::Age),
            "lifeStage" => Some(Self::LifeStage),
            "helmetUsage" => Some(Self::HelmetUsage),
            "healthVision" => Some(Self::HealthVision),
            "moneyRelationship" => Some(Self::MoneyRelationship),
            "medications" => Some(Self::Medications),
            "recordPermission" => Some(Self::RecordPermission),
            "additionalHealthInfo" => Some(Self::AdditionalHealthInfo),
            _ => None,
        }
    }
}

impl std::fmt::Display for StepKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.token())
    }
}

/// One entry in the interview.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InterviewQuestion {
    /// Unique step/field key.
    pub key: StepKey,
    /// The question the agent asks out loud.
    pub question: &'static str,
    /// Display label for the profile summary.
    pub label: &'static str,
    /// Accepted value domain, phrased for the extraction prompt.
    pub hint: &'static str,
}

/// The shipped intake interview, in asking order.
const QUESTIONS: &[InterviewQuestion] = &[
    InterviewQuestion {
        key: StepKey::Age,
        question: "First, how old are you?",
        label: "Age",
        hint: "the user's age, clearly stated as a number",
    },
    InterviewQuestion {
        key: StepKey::LifeStage,
        question: "What life stage best describes you currently (e.g., Education/Training, \
                   Early Career, Established Career, Family Formation, Empty Nest, \
                   Retirement Preparation)?",
        label: "Life Stage",
        hint: "their current life stage (e.g., education, training, early career, \
               established career, family formation, empty nest, retirement)",
    },
    InterviewQuestion {
        key: StepKey::HelmetUsage,
        question: "When engaging in activities with potential physical risk (like cycling, \
                   skiing, etc.), how often do you use safety equipment like helmets? \
                   (e.g., Always, Sometimes, Rarely, Never)",
        label: "Helmet Usage",
        hint: "how often they use safety equipment (e.g., always, sometimes, rarely, never)",
    },
    InterviewQuestion {
        key: StepKey::HealthVision,
        question: "What's most important to you regarding your long-term health? (e.g., \
                   Maintaining mobility, energy, cognitive function, longevity, overall balance)",
        label: "Health Vision",
        hint: "their primary long-term health goal (e.g., energy, cognitive function, \
               physical mobility, longevity, overall balance)",
    },
    InterviewQuestion {
        key: StepKey::MoneyRelationship,
        question: "How would you describe your relationship with money regarding health \
                   decisions? (e.g., Cautious, Balanced, Investing, Anxious, Avoidant)",
        label: "Money Relationship",
        hint: "their relationship with money regarding health (e.g., cautious, balanced, \
               investing, anxious, avoidant)",
    },
    InterviewQuestion {
        key: StepKey::Medications,
        question: "Are you currently taking any regular medications? If so, could you list \
                   them? (Type 'None' if not applicable)",
        label: "Medications",
        hint: "their current medication list, or 'None'",
    },
    InterviewQuestion {
        key: StepKey::RecordPermission,
        question: "Would you be open to potentially linking your medical records later to \
                   get more personalized insights? (Yes/No)",
        label: "Record Permission",
        hint: "a yes/no answer about linking medical records",
    },
    InterviewQuestion {
        key: StepKey::AdditionalHealthInfo,
        question: "Is there any other important health information you'd like to share at \
                   this time? (Type 'None' if not applicable)",
        label: "Additional Health Info",
        hint: "any additional health information shared, or 'Not now'. This closes the interview",
    },
];

/// Read-only ordered view over the interview questions.
///
/// All lookups for unknown keys return `None` rather than failing the caller.
#[derive(Debug, Clone, Copy)]
pub struct QuestionCatalog {
    questions: &'static [InterviewQuestion],
}

/// The catalog shipped with this service.
pub const CATALOG: QuestionCatalog = QuestionCatalog {
    questions: QUESTIONS,
};

impl QuestionCatalog {
    /// Number of steps in the interview.
    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    /// Step at `index`, in asking order.
    pub fn step_at(&self, index: usize) -> Option<&'static InterviewQuestion> {
        self.questions.get(index)
    }

    /// Zero-based position of `key` in the interview.
    pub fn index_of(&self, key: StepKey) -> Option<usize> {
        self.questions.iter().position(|q| q.key == key)
    }

    /// The question record for `key`.
    pub fn question_for(&self, key: StepKey) -> Option<&'static InterviewQuestion> {
        self.questions.iter().find(|q| q.key == key)
    }

    /// The first step of the interview, if any.
    pub fn first(&self) -> Option<&'static InterviewQuestion> {
        self.questions.first()
    }

    /// The key after `key` in asking order.
    ///
    /// `None` means there is no next question: either `key` is the last
    /// entry (the interview moves to its summary) or `key` is not in the
    /// catalog at all.
    pub fn next_after(&self, key: StepKey) -> Option<StepKey> {
        let index = self.index_of(key)?;
        self.questions.get(index + 1).map(|q| q.key)
    }

    /// Iterate over the steps in asking order.
    pub fn iter(&self) -> impl Iterator<Item = &'static InterviewQuestion> {
        self.questions.iter()
    }
}
