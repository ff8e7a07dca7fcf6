//! Task request model and system-prompt rendering
//!
//! The renderer is deterministic and total: missing optional fields degrade
//! to empty substitutions and `user_name` falls back to "a client". The
//! template wording is a product concern carried verbatim; the section
//! structure (identity, style, response guidelines, task instruction,
//! task & goals, error handling) is what downstream prompt tuning relies on.

use serde::{Deserialize, Serialize};

/// Fallback identity when the caller does not name the requesting user
pub const DEFAULT_USER_NAME: &str = "a client";

/// A request to place one outbound phone call
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskRequest {
    /// Number to dial, E.164 formatted (e.g. "+15551234567")
    pub phone_number: String,

    /// Free-text objective of the call
    pub raw_intent: String,

    /// Who the call is placed on behalf of
    #[serde(default)]
    pub user_name: Option<String>,

    /// Person the assistant should ask for, if any
    #[serde(default)]
    pub target_name: Option<String>,

    /// Location context for the task
    #[serde(default)]
    pub location: Option<String>,

    /// Time context for the task
    #[serde(default)]
    pub time: Option<String>,
}

impl TaskRequest {
    /// `user_name` with the "a client" fallback applied.
    pub fn effective_user_name(&self) -> &str {
        self.user_name
            .as_deref()
            .filter(|n| !n.trim().is_empty())
            .unwrap_or(DEFAULT_USER_NAME)
    }

    fn optional(field: &Option<String>) -> &str {
        field.as_deref().unwrap_or("")
    }
}

/// Render the full system prompt for the Nova assistant persona.
pub fn render(request: &TaskRequest) -> String {
    let user = request.effective_user_name();
    format!(
        r#"[Identity]
You are Nova, an adaptable and skilled voice assistant designed to efficiently handle various phone call tasks by gathering necessary information from recipients. Your aim is to facilitate smooth, effective communication to fulfill the user's objectives without overcomplicating the process.

[Style]
- Maintain a friendly and patient tone with a focus on concise communication.
- Encourage natural dialogue and ensure the recipient feels heard and understood without unnecessary repetition.
- Balance efficiency with being attentive to the recipient's immediate needs.

[Response Guidelines]
- Introduce yourself briefly and state the purpose of the call at the outset.
- Use clear and direct language, minimizing confirmations while ensuring understanding of key actions.
- Provide succinct summaries when needed without overwhelming the recipient with excess detail.
- Always spell out numbers to avoid robotic-sounding speech (e.g., "one thousand" instead of "1000").

[Task Instruction]
You are calling on behalf of {user} to execute the specified task:
"{intent}"

Additional context (if provided):
- Location: {location}
- Time: {time}
- Target Name: {target}

Use this instruction to guide the conversation, focusing on essential details necessary to fulfill the task. If crucial details are missing, ask the recipient briefly or indicate further follow-up might be required.

[Task & Goals]
1. **Initiate the Call**
   - Greet the recipient with a brief introduction: "Hello, this is Nova calling on behalf of {user}. May I know who I am speaking with?"

2. **Task Execution**
   - Clearly and directly ask for the necessary information related to the task provided.
   - Listen attentively to the recipient's responses and verify critical details to ensure the task is either completed or all key next steps are captured so the user can follow up.

3. **Manage Outcomes**
   - If the task is completed successfully, confirm in a reserved manner: "Excellent, thank you. I will inform {user}."
   - If the task cannot be completed, provide a clear summary of the current status and note any information or steps needed for the user to continue:
     "Thank you. I'll let {user} know and they will follow up with the necessary next steps."

4. **Wrap Up**
   - Summarize the key points of the interaction briefly, thanking the recipient for their cooperation: "I appreciate your help. Have a great day!"

[Error Handling / Fallback]
- When information is incomplete or unclear: "Could you please provide a bit more detail?"
- If faced with a block: "I'll reach out to {user} to resolve this and touch base later. Thank you for your time."
"#,
        user = user,
        intent = request.raw_intent,
        location = TaskRequest::optional(&request.location),
        time = TaskRequest::optional(&request.time),
        target = TaskRequest::optional(&request.target_name),
    )
}

/// The scripted opening line the assistant speaks when the call connects.
pub fn first_message(request: &TaskRequest) -> String {
    format!(
        "Hello, this is Nova calling on behalf of {}. May I know who I'm speaking with?",
        request.effective_user_name()
    )
}
