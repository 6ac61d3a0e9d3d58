use serde::{Deserialize, Deserializer};

use super::completion::ChatMessage;

pub const SYSTEM_MESSAGE: &str =
    "You are a CLIL methodology expert generating professional lesson plans.";

/// Lesson parameters posted by the front end. Missing fields are empty;
/// numbers (a grade sent as `5`) are accepted as text.
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct LessonRequest {
    #[serde(deserialize_with = "lenient_string")]
    pub topic: String,
    #[serde(deserialize_with = "lenient_string")]
    pub subject: String,
    #[serde(deserialize_with = "lenient_string")]
    pub grade: String,
    #[serde(deserialize_with = "lenient_string")]
    pub language_level: String,
    #[serde(deserialize_with = "lenient_string")]
    pub bloom_level: String,
}

pub(crate) fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::Null => String::new(),
        serde_json::Value::String(s) => s,
        other => other.to_string(),
    })
}

pub fn build_prompt(req: &LessonRequest) -> String {
    let LessonRequest {
        topic,
        subject,
        grade,
        language_level,
        bloom_level,
    } = req;
    format!(
        r#"
You are a CLIL lesson planner for school teachers in Kazakhstan.

Create a full CLIL-based lesson plan for the subject "{subject}" on the topic "{topic}" for Grade {grade} students.
The learners' English level is {language_level}, and the cognitive focus should be based on Bloom's level: {bloom_level}.

The lesson plan must be structured as a 2-column table:
Column 1 — Section Name (e.g., Objectives, Assessment, Language Focus, etc.)
Column 2 — Content for each section (described in clear paragraphs)

Sections to include:
- Title of lesson
- Grade level
- Learning objectives (content + language)
- Assessment criteria
- Subject vocabulary (EN + KZ)
- Bloom’s level
- 4Cs focus (Content, Communication, Cognition, Culture)
- Pre-knowledge
- Lesson stages (Beginning – Middle – End)
- Differentiation
- Values
- ICT used
- Resources (include specific useful websites, tools, programs, and platforms with names and links that teachers can visit directly to use in class)

Output format must be a clean textual table with each row representing a section."#
    )
}

/// System and user messages for one lesson plan request.
pub fn messages(req: &LessonRequest) -> Vec<ChatMessage> {
    vec![
        ChatMessage::system(SYSTEM_MESSAGE),
        ChatMessage::user(build_prompt(req)),
    ]
}
