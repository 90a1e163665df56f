//! Prompt templates for grounded search answers

use std::collections::HashMap;

/// Template with `{{name}}` placeholders
#[derive(Debug, Clone)]
pub struct PromptTemplate {
    template: String,
    variables: Vec<String>,
}

impl PromptTemplate {
    /// Create a new prompt template
    pub fn new(template: impl Into<String>) -> Self {
        let template = template.into();
        let variables = extract_variables(&template);
        Self {
            template,
            variables,
        }
    }

    /// Fill in the template in a single pass.
    ///
    /// Substituted values are never rescanned, so user text containing `{{...}}`
    /// is inserted literally. Unknown placeholders are left as they are.
    #[must_use]
    pub fn render(&self, values: &HashMap<&str, String>) -> String {
        let mut result = String::with_capacity(self.template.len());
        let mut rest = self.template.as_str();

        while let Some(start) = rest.find("{{") {
            result.push_str(&rest[..start]);
            let after = &rest[start + 2..];
            match after.find("}}") {
                Some(end) => {
                    let name = &after[..end];
                    match values.get(name) {
                        Some(value) => result.push_str(value),
                        None => {
                            result.push_str("{{");
                            result.push_str(name);
                            result.push_str("}}");
                        }
                    }
                    rest = &after[end + 2..];
                }
                None => {
                    result.push_str(&rest[start..]);
                    rest = "";
                }
            }
        }
        result.push_str(rest);
        result
    }

    /// Convenience wrapper over [`render`](Self::render)
    #[must_use]
    pub fn render_pairs(&self, pairs: &[(&str, String)]) -> String {
        let values: HashMap<&str, String> = pairs.iter().cloned().collect();
        self.render(&values)
    }

    /// Get required variables
    #[must_use]
    pub fn variables(&self) -> &[String] {
        &self.variables
    }
}

/// Extract variable names from template, in order of first appearance
fn extract_variables(template: &str) -> Vec<String> {
    let mut variables: Vec<String> = Vec::new();
    let mut rest = template;

    while let Some(start) = rest.find("{{") {
        let after = &rest[start + 2..];
        let Some(end) = after.find("}}") else {
            break;
        };
        let name = after[..end].trim();
        if !name.is_empty() && !variables.iter().any(|v| v == name) {
            variables.push(name.to_string());
        }
        rest = &after[end + 2..];
    }

    variables
}

/// Citation format every grounded answer must use
pub const CITATION_FORMAT: &str = "投稿: [タイトル]（投稿者: [投稿者名]）[番号]";

/// Prompt templates used by the search pipeline
pub struct SearchPrompts;

impl SearchPrompts {
    /// Standard grounded answer over numbered posts
    #[must_use]
    pub fn grounded() -> PromptTemplate {
        PromptTemplate::new(
            r"あなたはコミュニティの投稿をもとに質問へ答えるアシスタントです。

以下は回答の参考になる可能性があるコミュニティの投稿です（全{{count}}件）。

{{posts}}

質問: {{question}}

回答のルール:
1. 上の投稿の内容を根拠にして、日本語で分かりやすく回答してください
2. 投稿を参照するときは必ず次の形式で引用してください: {{citation_format}}
   例: {{citation_example}}
3. [番号] には各投稿の見出しにある番号をそのまま使ってください
4. 投稿に書かれていない内容を補う場合は、一般的な情報であることを明記してください
5. 具体的かつ簡潔に答えてください

回答:",
        )
    }

    /// Second attempt after an empty or too-short answer
    #[must_use]
    pub fn directive_retry() -> PromptTemplate {
        PromptTemplate::new(
            r"次の質問に、下の投稿を根拠として必ず回答してください。回答を拒否したり、空の回答を返したりしてはいけません。

質問: {{question}}

参考投稿（全{{count}}件）:

{{posts}}

必須条件:
- {{min_chars}}文字以上の日本語で回答すること
- 少なくとも1件の投稿を次の形式で引用すること: {{citation_format}}
  例: {{citation_example}}
- [番号] は投稿の見出しの番号と一致させること
- 投稿から分かること、分からないことを区別して書くこと

回答:",
        )
    }

    /// Used when no reference posts are available
    #[must_use]
    pub fn reasoning() -> PromptTemplate {
        PromptTemplate::new(
            r"あなたはコミュニティの質問に答えるアシスタントです。
今回の質問に関連するコミュニティの投稿は見つかりませんでした。

質問: {{question}}

回答のルール:
1. 一般的な知識と推論にもとづいて、日本語で丁寧に回答してください
2. コミュニティの投稿を根拠にしていないことを冒頭で一言伝えてください
3. 投稿を引用したり、引用番号を付けたりしないでください
4. {{min_chars}}文字以上で具体的に答えてください

回答:",
        )
    }
}
