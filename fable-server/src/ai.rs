use serde::{Deserialize, Serialize};
use serde_json::json;

/// Inputs longer than this are cut before prompt construction. Only the
/// title-suggestion and writing-suggestion prompts truncate; the other
/// prompts send the full text.
const MAX_CONTENT_LENGTH: usize = 2000;

const NOT_CONFIGURED: &str =
    "AI service not configured. Please set GEMINI_API_KEY environment variable.";

const GEMINI_ENDPOINT: &str =
    "https://generativelanguage.googleapis.com/v1beta/models/gemini-1.5-flash:generateContent";

/// Outcome of one writing-assistant call. Exactly one of `content` and
/// `error` is set.
#[derive(Debug, Serialize)]
pub struct AiResult {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl AiResult {
    fn ok(content: String) -> Self {
        Self {
            success: true,
            content: Some(content),
            error: None,
        }
    }

    fn err(message: impl Into<String>) -> Self {
        Self {
            success: false,
            content: None,
            error: Some(message.into()),
        }
    }
}

#[derive(Deserialize)]
struct GeminiResponse {
    candidates: Vec<GeminiCandidate>,
}

#[derive(Deserialize)]
struct GeminiCandidate {
    content: GeminiContent,
}

#[derive(Deserialize)]
struct GeminiContent {
    parts: Vec<GeminiPart>,
}

#[derive(Deserialize)]
struct GeminiPart {
    text: String,
}

/// Thin proxy around the Gemini text-generation API.
///
/// Construction never fails: a missing key produces a client whose every
/// call answers with a fixed not-configured error and no network attempt.
/// Upstream failures are caught here and surfaced in the result body, never
/// as a server error.
#[derive(Clone)]
pub struct AiClient {
    api_key: Option<String>,
    http: reqwest::Client,
}

fn truncate(content: &str) -> &str {
    match content.char_indices().nth(MAX_CONTENT_LENGTH) {
        Some((idx, _)) => &content[..idx],
        None => content,
    }
}

impl AiClient {
    pub fn new(api_key: Option<String>) -> Self {
        if api_key.is_none() {
            tracing::warn!("GEMINI_API_KEY not set, writing-assistant endpoints disabled");
        }
        Self {
            api_key,
            http: reqwest::Client::new(),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    /// Continue a story from where the author left off
    pub async fn continue_story(&self, story_content: &str, genre: &str, words: u32) -> AiResult {
        let prompt = format!(
            "You are a creative story writer. Continue the following {genre} story naturally.\n\
             Write approximately {words} words. Match the tone and style of the existing text.\n\
             Do not repeat the original text, only provide the continuation.\n\n\
             Story so far:\n{story_content}\n\nContinue the story:"
        );
        self.generate(&prompt).await
    }

    /// Generate a story opening for a genre and optional theme
    pub async fn generate_story_starter(&self, genre: &str, theme: &str, words: u32) -> AiResult {
        let theme_line = if theme.is_empty() {
            String::new()
        } else {
            format!("Theme/Setting: {theme}")
        };
        let prompt = format!(
            "You are a creative story writer. Write an engaging opening for a {genre} story.\n\
             {theme_line}\n\
             Write approximately {words} words. Make it captivating and hook the reader immediately.\n\
             Include vivid descriptions and introduce an interesting character or situation.\n\n\
             Write the story opening:"
        );
        self.generate(&prompt).await
    }

    /// Suggest titles for a story; long stories are truncated first
    pub async fn suggest_titles(&self, story_content: &str, count: u32) -> AiResult {
        let story = truncate(story_content);
        let prompt = format!(
            "Based on the following story content, suggest {count} creative and catchy titles.\n\
             Make them intriguing and relevant to the story's theme.\n\
             Return only the titles, one per line, numbered.\n\n\
             Story:\n{story}\n\nSuggest {count} titles:"
        );
        self.generate(&prompt).await
    }

    /// Improve grammar, style and vocabulary of a text
    pub async fn improve_writing(&self, text: &str) -> AiResult {
        let prompt = format!(
            "You are an expert editor. Improve the following text by:\n\
             1. Fixing any grammar or spelling errors\n\
             2. Enhancing vocabulary with better word choices\n\
             3. Improving sentence structure and flow\n\
             4. Making it more engaging and vivid\n\n\
             Keep the original meaning and story intact. Return only the improved text.\n\n\
             Original text:\n{text}\n\nImproved text:"
        );
        self.generate(&prompt).await
    }

    /// Plot, character and scene suggestions; long stories are truncated first
    pub async fn get_writing_suggestions(&self, story_content: &str) -> AiResult {
        let story = truncate(story_content);
        let prompt = format!(
            "You are a creative writing coach. Based on this story, provide 3-4 brief suggestions for:\n\
             - Possible plot developments\n\
             - Character depth additions\n\
             - Scene or setting ideas\n\n\
             Keep suggestions concise and inspiring.\n\n\
             Story:\n{story}\n\nSuggestions:"
        );
        self.generate(&prompt).await
    }

    async fn generate(&self, prompt: &str) -> AiResult {
        let api_key = match &self.api_key {
            Some(key) => key,
            None => return AiResult::err(NOT_CONFIGURED),
        };

        let body = json!({
            "contents": [{ "parts": [{ "text": prompt }] }]
        });

        let response = match self
            .http
            .post(GEMINI_ENDPOINT)
            .query(&[("key", api_key)])
            .json(&body)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => return AiResult::err(e.to_string()),
        };

        if !response.status().is_success() {
            let status = response.status();
            let detail = response.text().await.unwrap_or_default();
            tracing::warn!("Gemini call failed with status {}", status);
            return AiResult::err(format!("AI service returned {status}: {detail}"));
        }

        let parsed: GeminiResponse = match response.json().await {
            Ok(parsed) => parsed,
            Err(e) => return AiResult::err(e.to_string()),
        };

        let text = parsed
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content.parts.into_iter().next())
            .map(|p| p.text);

        match text {
            Some(text) => AiResult::ok(text),
            None => AiResult::err("AI service returned an empty response"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_unconfigured_client_never_touches_the_network() {
        let client = AiClient::new(None);
        assert!(!client.is_configured());

        for result in [
            client.continue_story("once upon a time", "fantasy", 150).await,
            client.generate_story_starter("horror", "", 200).await,
            client.suggest_titles("a story", 5).await,
            client.improve_writing("sum text").await,
            client.get_writing_suggestions("a story").await,
        ] {
            assert!(!result.success);
            assert_eq!(result.error.as_deref(), Some(NOT_CONFIGURED));
            assert!(result.content.is_none());
        }
    }

    #[test]
    fn test_truncate_cuts_at_the_character_budget() {
        let long = "x".repeat(MAX_CONTENT_LENGTH + 500);
        assert_eq!(truncate(&long).len(), MAX_CONTENT_LENGTH);

        let short = "short story";
        assert_eq!(truncate(short), short);

        // Multi-byte input must cut on a char boundary
        let wide = "é".repeat(MAX_CONTENT_LENGTH + 1);
        assert_eq!(truncate(&wide).chars().count(), MAX_CONTENT_LENGTH);
    }

    #[test]
    fn test_result_wire_shape() {
        let ok = serde_json::to_value(AiResult::ok("hello".to_string())).unwrap();
        assert_eq!(ok["success"], true);
        assert_eq!(ok["content"], "hello");
        assert!(ok.get("error").is_none());

        let err = serde_json::to_value(AiResult::err("boom")).unwrap();
        assert_eq!(err["success"], false);
        assert_eq!(err["error"], "boom");
        assert!(err.get("content").is_none());
    }
}
