//! Campus assistant — stateless chat passthrough with an offline
//! keyword fallback when the model's quota is exhausted.

use vanguard_ai::RecognitionClient;

const CONNECTIVITY_APOLOGY: &str =
    "I'm having trouble connecting to the building mainframe. Please see the nearest security desk.";

const LIMITED_MODE_NOTICE: &str = "High Traffic Warning: The AI Assistant is currently in limited \
mode due to network congestion. Please ask Security for complex queries.";

/// Answer a visitor's question. Each message is independent: no
/// conversation history is sent to the model.
pub async fn ask(client: &dyn RecognitionClient, query: &str) -> String {
    match client.chat(query).await {
        Ok(answer) => answer,
        Err(e) if e.is_quota() => {
            tracing::warn!("assistant quota exhausted; using canned answers");
            canned_answer(query)
        }
        Err(e) => {
            tracing::warn!(error = %e, "assistant unavailable");
            CONNECTIVITY_APOLOGY.to_string()
        }
    }
}

/// Keyword-matched offline answers for the common kiosk questions.
fn canned_answer(query: &str) -> String {
    let q = query.to_lowercase();

    let answer = if q.contains("park") || q.contains("car") {
        "[Offline Mode] Visitor parking is available in Zone A and B (Levels P1-P2). EV charging is on P1."
    } else if q.contains("wifi") || q.contains("internet") {
        "[Offline Mode] The guest Wi-Fi network is 'Vanguard-Guest'. No password is required for the first 2 hours."
    } else if q.contains("food") || q.contains("cafe") || q.contains("eat") {
        "[Offline Mode] The main cafeteria is located in the Tower C Lobby, open from 8:00 AM to 4:00 PM."
    } else if q.contains("toilet") || q.contains("restroom") || q.contains("washroom") {
        "[Offline Mode] Restrooms are located near the elevator banks on every floor."
    } else if q.contains("nav") || q.contains("map") || q.contains("where") {
        "[Offline Mode] You can use the 'Navigate Live' feature on your digital pass to find your way around."
    } else {
        LIMITED_MODE_NOTICE
    };
    answer.to_string()
}
