use crate::llm::LlmClient;
use crate::template::PromptTemplate;
use async_trait::async_trait;
use cadre_core::{CadreError, CadreResult, Decomposer, Message};
use serde_json::Value;
use tracing::{debug, info};

/// Default decomposition prompt. `{0}` is the objective.
pub const DECOMPOSE_TEMPLATE: &str = "Given the objective {0}, generate tasks in the following \
JSON format: [{{\"name\": \"task_name\", \"agent\": \"agent_to_use\", \"function\": \
\"function_to_use\", \"details\": {{}}, \"input\": \"input_to_add\"}}]. Reply with the JSON array only.";

/// [`Decomposer`] that asks a language model to break an objective into tasks.
pub struct LlmDecomposer {
    client: LlmClient,
    template: PromptTemplate,
    catalogue: Option<String>,
}

impl LlmDecomposer {
    /// Use [`DECOMPOSE_TEMPLATE`] and no catalogue.
    pub fn new(client: LlmClient) -> Self {
        Self {
            client,
            template: PromptTemplate::new(DECOMPOSE_TEMPLATE),
            catalogue: None,
        }
    }

    /// Replace the decomposition prompt.
    pub fn with_template(mut self, template: PromptTemplate) -> Self {
        self.template = template;
        self
    }

    /// Agent catalogue appended to the system message so the model knows
    /// which capabilities exist.
    pub fn with_catalogue(mut self, catalogue: impl Into<String>) -> Self {
        self.catalogue = Some(catalogue.into());
        self
    }

    fn system_prompt(&self, context: &str) -> String {
        match &self.catalogue {
            Some(catalogue) => format!("{context}\n\n{catalogue}"),
            None => context.to_string(),
        }
    }
}

#[async_trait]
impl Decomposer for LlmDecomposer {
    async fn decompose(&self, objective: &str, context: &str) -> CadreResult<Vec<Value>> {
        let prompt = self.template.render(&[objective])?;
        let system = self.system_prompt(context);
        let reply = self
            .client
            .chat(Some(&system), &[Message::user(prompt)])
            .await?;
        debug!(reply_len = reply.len(), "Decomposition reply received");

        let records = extract_task_records(&reply)?;
        info!(records = records.len(), "Objective decomposed");
        Ok(records)
    }
}

/// Pull task records out of free-form model output.
///
/// Uses the first JSON value found in `reply`: an array of objects is returned as-is, an
/// object with a `tasks` array yields that array, and any other object counts
/// as a single record.
pub fn extract_task_records(reply: &str) -> CadreResult<Vec<Value>> {
    for (start, _) in reply.match_indices(['[', '{']) {
        let mut values = serde_json::Deserializer::from_str(&reply[start..]).into_iter::<Value>();
        match values.next() {
            Some(Ok(Value::Array(items))) if items.iter().all(Value::is_object) => {
                return Ok(items)
            }
            Some(Ok(Value::Object(mut map))) => {
                return Ok(match map.remove("tasks") {
                    Some(Value::Array(items)) => items,
                    Some(other) => {
                        map.insert("tasks".to_string(), other);
                        vec![Value::Object(map)]
                    }
                    None => vec![Value::Object(map)],
                });
            }
            _ => continue,
        }
    }
    Err(CadreError::Agent(format!(
        "No JSON task list found in model reply: {reply}"
    )))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::backends::LlmBackend;
    use parking_lot::Mutex;
    use serde_json::json;
    use std::sync::Arc;

    struct Canned {
        reply: String,
        seen: Arc<Mutex<Vec<(Option<String>, String)>>>,
    }

    #[async_trait]
    impl LlmBackend for Canned {
        async fn chat(&self, system: Option<&str>, messages: &[Message]) -> CadreResult<String> {
            self.seen.lock().push((
                system.map(str::to_string),
                messages.last().map(|m| m.content.clone()).unwrap_or_default(),
            ));
            Ok(self.reply.clone())
        }
    }

    #[test]
    fn test_extract_array_with_prose() {
        let reply = r#"Sure! Here you go: [{"name": "a", "details": {}}, {"name": "b", "details": {}}] Hope it helps."#;
        let records = extract_task_records(reply).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1]["name"], "b");
    }

    #[test]
    fn test_extract_single_object_and_tasks_key() {
        let single = extract_task_records(r#"{"name": "a", "details": {}}"#).unwrap();
        assert_eq!(single, vec![json!({"name": "a", "details": {}})]);

        let wrapped = extract_task_records(r#"{"tasks": [{"name": "x"}, {"name": "y"}]}"#).unwrap();
        assert_eq!(wrapped.len(), 2);
    }

    #[test]
    fn test_extract_skips_unparseable_brackets() {
        let reply = r#"Step [1] of plan: {"name": "a", "details": {}}"#;
        let records = extract_task_records(reply).unwrap();
        assert_eq!(records[0]["name"], "a");
    }

    #[test]
    fn test_extract_without_json_fails() {
        assert!(matches!(
            extract_task_records("I cannot help with that."),
            Err(CadreError::Agent(_))
        ));
    }

    #[tokio::test]
    async fn test_decompose_sends_context_as_system() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let backend = Canned {
            reply: r#"[{"name": "add", "function": "add", "details": {}, "input": [1, 2]}]"#.into(),
            seen: seen.clone(),
        };
        let decomposer = LlmDecomposer::new(LlmClient::from_backend(Box::new(backend)))
            .with_catalogue("CATALOGUE");

        let records = decomposer
            .decompose("add one and two", "Buffer: , Memory: None")
            .await
            .unwrap();
        assert_eq!(records.len(), 1);

        let calls = seen.lock();
        let (system, prompt) = &calls[0];
        assert_eq!(system.as_deref(), Some("Buffer: , Memory: None\n\nCATALOGUE"));
        assert!(prompt.starts_with("Given the objective add one and two, generate tasks"));
        assert!(prompt.contains(r#"[{"name": "task_name""#));
    }

    #[tokio::test]
    async fn test_template_mismatch_is_config_error() {
        let backend = Canned {
            reply: "[]".into(),
            seen: Arc::new(Mutex::new(Vec::new())),
        };
        let decomposer = LlmDecomposer::new(LlmClient::from_backend(Box::new(backend)))
            .with_template(PromptTemplate::new("{0} and {1}"));
        assert!(matches!(
            decomposer.decompose("x", "").await,
            Err(CadreError::Config(_))
        ));
    }
}
