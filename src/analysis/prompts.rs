//! Prompt text and response-shape helpers for the Gemini adapter.

use serde_json::{Value, json};
use tracing::{debug, error};

use crate::profile::Profile;

/// System instruction for the chat assistant.
pub const CHAT_SYSTEM_INSTRUCTION: &str = "את שלי, מלווה אישית חמה ומקצועית למיצוי זכויות בישראל. \
עני תמיד בעברית, בקצרה ובשפה פשוטה. כשאת מפנה לרשות, צייני את שם הרשות ואת הצעד הבא המעשי. \
אם אינך בטוחה, אמרי זאת והפני למקור רשמי.";

/// Reply when the service answers with no text.
pub const EMPTY_REPLY_FALLBACK: &str = "מצטערת, לא הצלחתי למצוא תשובה מדויקת.";

/// Reply when the service call fails.
pub const ERROR_REPLY_FALLBACK: &str = "מצטערת, נתקלתי בקושי קטן. תוכלי לשאול שוב?";

/// Title for grounding citations that came without one.
pub const DEFAULT_SOURCE_TITLE: &str = "מקור רשמי";

/// Build the analysis prompt around the profile JSON.
pub fn analysis_prompt(profile: &Profile) -> String {
    let profile_json =
        serde_json::to_string_pretty(profile).unwrap_or_else(|_| "{}".to_string());

    format!(
        r#"את/ה המומחה/ית הבכיר/ה ביותר בישראל למיצוי זכויות, בחינם ובשירות האזרח.

פרופיל המשתמש המעמיק:
{profile_json}

משימה:
הפק/י דו"ח זכויות מפורט ומקצועי. עבור כל זכות שזוהתה, ספק/י:
1. כותרת ותיאור בשפה אנושית ומונגשת.
2. הרשות האחראית (ביטוח לאומי, מס הכנסה, משרד הבריאות וכו').
3. שווי כספי שנתי מוערך (אם רלוונטי).
4. תיאור הזכות בפועל (מה מקבלים?).
5. סדר פעולות מדויק למימוש: היכן מגישים, קישורים רשמיים (.gov.il), וצפי למשך טיפול.
6. רשימת מסמכים ואישורים שצריך להכין מראש.
7. המלצות להמשך וטיפ מקצועי.

השתמש/י בחיפוש למציאת הקישורים הרשמיים המעודכנים ביותר.

החזר/י מערך JSON בלבד בפורמט הנדרש."#
    )
}

/// Chat system instruction, with the report appended when there is one.
pub fn chat_system_instruction(report_context: Option<&str>) -> String {
    match report_context {
        Some(context) => format!(
            "{CHAT_SYSTEM_INSTRUCTION}\n\nהקשר נוכחי: המשתמש קיבל דו\"ח זכויות הכולל: {context}. עני על שאלות בהתבסס על מידע זה."
        ),
        None => CHAT_SYSTEM_INSTRUCTION.to_string(),
    }
}

/// JSON schema of the analysis response: an array of entitlement records.
pub fn report_schema() -> Value {
    let string = json!({ "type": "STRING" });
    let string_list = json!({ "type": "ARRAY", "items": { "type": "STRING" } });

    json!({
        "type": "ARRAY",
        "items": {
            "type": "OBJECT",
            "properties": {
                "id": string,
                "title": string,
                "description": string,
                "authority": string,
                "location": string,
                "priority": {
                    "type": "STRING",
                    "description": "critical, important, recommended, future"
                },
                "estimatedValue": string,
                "numericValue": { "type": "NUMBER" },
                "requirements": string_list,
                "actionSteps": string_list,
                "officialLink": string,
                "formLink": string,
                "contactInfo": string,
                "documentsToPrepare": string_list,
                "estimatedProcessingTime": string,
                "recommendations": string_list,
                "sources": {
                    "type": "ARRAY",
                    "items": {
                        "type": "OBJECT",
                        "properties": { "title": string, "uri": string }
                    }
                }
            },
            "required": [
                "id", "title", "description", "authority",
                "priority", "actionSteps", "documentsToPrepare"
            ]
        }
    })
}

/// Extract a JSON array from model output that may be wrapped in markdown
/// fences or prose.
pub fn extract_json_array(text: &str) -> String {
    let trimmed = text.trim();

    if trimmed.starts_with('[') {
        return trimmed.to_string();
    }

    if let Some(start) = trimmed.find("```json") {
        let after = &trimmed[start + 7..];
        if let Some(end) = after.find("```") {
            return after[..end].trim().to_string();
        }
    }

    if let Some(start) = trimmed.find("```") {
        let after = &trimmed[start + 3..];
        if let Some(end) = after.find("```") {
            let inner = after[..end].trim();
            if inner.starts_with('[') {
                return inner.to_string();
            }
        }
    }

    if let (Some(start), Some(end)) = (trimmed.find('['), trimmed.rfind(']')) {
        if end > start {
            debug!("Trimmed prose around JSON array");
            return trimmed[start..=end].to_string();
        }
    }

    error!(text = trimmed, "Could not extract JSON array from model response");
    trimmed.to_string()
}
