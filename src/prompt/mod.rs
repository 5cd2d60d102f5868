//! Prompt construction for the two chat calls of one analyse action.

use crate::llm::{ChatMessage, ChatOptions, Role};

const TEMPERATURE: f32 = 0.7;
const TOP_P: f32 = 0.9;
const FREQUENCY_PENALTY: f32 = 0.5;
const CODE_MAX_TOKENS: u32 = 2048;
const EXPLAIN_MAX_TOKENS: u32 = 1024;

/// Messages asking the model for analysis code and nothing else.
///
/// The dataset path is spelled out literally so the generated code reads the
/// file from the location the upload step actually used.
pub fn code_only(dataset_path: &str, question: &str) -> Vec<ChatMessage> {
    let system = format!(
        "You are a Python data scientist. You are given the dataset at path '{dataset_path}' \
         and a user question. Reply with exactly one fenced Python code block that analyses \
         or visualises the data to answer the question. Do not output any explanation or \
         prose outside the code block. The code must read the dataset from '{dataset_path}'."
    );
    vec![
        ChatMessage::new(Role::System, system),
        ChatMessage::new(Role::User, question),
    ]
}

/// Messages asking the model to explain an execution result in prose.
pub fn explain(question: &str, exec_result: &str) -> Vec<ChatMessage> {
    let system = "You are a data analysis expert. Using the user's question and the code \
                  execution result below, explain the result to the user in clear, plain \
                  language.";
    let user = format!("Question: {question}\nExecution result: {exec_result}");
    vec![
        ChatMessage::new(Role::System, system),
        ChatMessage::new(Role::User, user),
    ]
}

pub fn code_options(model: &str) -> ChatOptions {
    ChatOptions {
        model: model.to_string(),
        temperature: TEMPERATURE,
        top_p: TOP_P,
        max_tokens: CODE_MAX_TOKENS,
        frequency_penalty: FREQUENCY_PENALTY,
    }
}

pub fn explain_options(model: &str) -> ChatOptions {
    ChatOptions {
        model: model.to_string(),
        temperature: TEMPERATURE,
        top_p: TOP_P,
        max_tokens: EXPLAIN_MAX_TOKENS,
        frequency_penalty: FREQUENCY_PENALTY,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn code_prompt_references_dataset_path_literally() {
        let msgs = code_only("./sales.csv", "average cost per category?");
        assert_eq!(msgs.len(), 2);
        assert!(matches!(msgs[0].role, Role::System));
        assert!(msgs[0].content.matches("./sales.csv").count() >= 2);
        assert!(matches!(msgs[1].role, Role::User));
        assert_eq!(msgs[1].content, "average cost per category?");
    }

    #[test]
    fn explain_prompt_embeds_question_and_result() {
        let msgs = explain("why?", "category | cost");
        assert_eq!(msgs.len(), 2);
        assert!(msgs[1].content.contains("Question: why?"));
        assert!(msgs[1].content.contains("Execution result: category | cost"));
    }

    #[test]
    fn options_differ_only_in_output_budget() {
        let code = code_options("m");
        let explain = explain_options("m");
        assert_eq!(code.max_tokens, 2048);
        assert_eq!(explain.max_tokens, 1024);
        assert_eq!(code.temperature, explain.temperature);
        assert_eq!(code.top_p, explain.top_p);
        assert_eq!(code.frequency_penalty, explain.frequency_penalty);
    }
}
