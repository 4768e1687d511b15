use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Career profile submitted for a pathway report.
///
/// Every field is optional free-form text. Missing fields and `null` become
/// empty strings; numbers, booleans and nested values are rendered as text
/// rather than rejected. Unknown fields are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CareerProfile {
    #[serde(deserialize_with = "lenient_text")]
    pub name: String,
    #[serde(deserialize_with = "lenient_text")]
    pub profession: String,
    /// Strengths ("great at").
    #[serde(deserialize_with = "lenient_text")]
    pub great_at: String,
    #[serde(deserialize_with = "lenient_text")]
    pub challenges: String,
    #[serde(deserialize_with = "lenient_text")]
    pub wins: String,
    #[serde(deserialize_with = "lenient_text")]
    pub goals: String,
    #[serde(deserialize_with = "lenient_text")]
    pub location: String,
    #[serde(deserialize_with = "lenient_text")]
    pub contact_email: String,
    #[serde(deserialize_with = "lenient_text")]
    pub headline: String,
    #[serde(deserialize_with = "lenient_text")]
    pub about: String,
    #[serde(deserialize_with = "lenient_text")]
    pub experience: String,
    #[serde(deserialize_with = "lenient_text")]
    pub education: String,
    /// Precomputed skills analysis from an upstream step.
    #[serde(deserialize_with = "lenient_text")]
    pub skills_analysis_output: String,
}

impl CareerProfile {
    /// Named fields in template order, keyed by their placeholder names.
    pub fn fields(&self) -> [(&'static str, &str); 13] {
        [
            ("name", &self.name),
            ("profession", &self.profession),
            ("great_at", &self.great_at),
            ("challenges", &self.challenges),
            ("wins", &self.wins),
            ("goals", &self.goals),
            ("location", &self.location),
            ("contact_email", &self.contact_email),
            ("headline", &self.headline),
            ("about", &self.about),
            ("experience", &self.experience),
            ("education", &self.education),
            ("skills_analysis_output", &self.skills_analysis_output),
        ]
    }
}

fn lenient_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Null => String::new(),
        Value::String(text) => text,
        other => other.to_string(),
    })
}
