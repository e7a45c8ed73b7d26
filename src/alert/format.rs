use serde::Serialize;

use crate::storage::AcceptedRecord;

const HEADER: &str = ":rotating_light: Highly Relevant Post Found!";
const NO_SUMMARY: &str = "No summary available.";
const NO_SUGGESTION: &str = "Could not analyze.";

/// Block Kit message announcing one accepted post.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Notification {
    /// Fallback text for clients that cannot render blocks
    pub text: String,
    pub blocks: Vec<Block>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Block {
    Header {
        text: Text,
    },
    Section {
        #[serde(skip_serializing_if = "Option::is_none")]
        text: Option<Text>,
        #[serde(skip_serializing_if = "Vec::is_empty")]
        fields: Vec<Text>,
    },
    Divider,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Text {
    PlainText { text: String },
    Mrkdwn { text: String },
}

fn mrkdwn(text: String) -> Text {
    Text::Mrkdwn { text }
}

/// Slack treats these three as control characters in mrkdwn.
fn escape(s: &str) -> String {
    s.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}

fn or_placeholder<'a>(value: &'a str, placeholder: &'a str) -> &'a str {
    if value.trim().is_empty() {
        placeholder
    } else {
        value
    }
}

pub fn format_notification(record: &AcceptedRecord) -> Notification {
    let analysis = &record.analysis;
    let post = &record.post;
    let summary = or_placeholder(&analysis.summary, NO_SUMMARY);
    let suggestion = or_placeholder(&analysis.suggestion, NO_SUGGESTION);

    Notification {
        text: format!(
            "Highly Relevant Post Found! (Relevance {:.2})",
            analysis.relevance
        ),
        blocks: vec![
            Block::Header {
                text: Text::PlainText {
                    text: HEADER.to_string(),
                },
            },
            Block::Section {
                text: None,
                fields: vec![
                    mrkdwn(format!("*Title:*\n<{}|{}>", post.url, escape(&post.title))),
                    mrkdwn(format!("*Relevance Score:*\n{:.2}", analysis.relevance)),
                    mrkdwn(format!("*Sentiment:*\n{}", analysis.sentiment.capitalized())),
                ],
            },
            Block::Divider,
            Block::Section {
                text: Some(mrkdwn(format!("*Summary:*\n{}", escape(summary)))),
                fields: Vec::new(),
            },
            Block::Section {
                text: Some(mrkdwn(format!("*Suggested Reply:*\n>{}", escape(suggestion)))),
                fields: Vec::new(),
            },
        ],
    }
}
