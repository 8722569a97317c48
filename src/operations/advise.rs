use crate::advisor::AdvisoryClient;
use crate::models::transaction::Transaction;
use regex::Regex;
use std::sync::LazyLock;
use tracing::{info, warn};

pub const UNAVAILABLE_MESSAGE: &str =
    "AI Insights currently unavailable. Check your internet connection or API key.";
pub const NO_INSIGHTS_MESSAGE: &str =
    "Could not generate insights at this time. Keep tracking to see patterns!";

// A `*` bullet needs whitespace after it so bold text like `**Budget**` survives.
static BULLET: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^(?:-\s*|\*\s+)").expect("valid bullet pattern"));
static NUMBERED: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\d+\.\s*").expect("valid numbering pattern"));

/// Asks the advisor for tips. Returns `None` without calling the client when
/// there is nothing to analyze. Failures come back as a fixed message and are
/// never retried.
pub fn generate_insights(client: &dyn AdvisoryClient, transactions: &[Transaction]) -> Option<String> {
    if transactions.is_empty() {
        return None;
    }

    let text = match client.request(transactions) {
        Ok(text) if text.trim().is_empty() => NO_INSIGHTS_MESSAGE.to_string(),
        Ok(text) => {
            info!(chars = text.len(), "received insights");
            text
        }
        Err(e) => {
            warn!(error = %e, "advisory request failed");
            UNAVAILABLE_MESSAGE.to_string()
        }
    };
    Some(text)
}

/// Splits a markdown-ish list into one tip per non-blank line with the list
/// marker removed.
pub fn parse_tips(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| {
            let line = BULLET.replace(line, "");
            NUMBERED.replace(&line, "").into_owned()
        })
        .collect()
}

/// Request state for the advisory view. At most one request is in flight.
#[derive(Debug, Default)]
pub struct AdvisorPanel {
    pending: bool,
    tips: Option<Vec<String>>,
}

impl AdvisorPanel {
    pub fn is_pending(&self) -> bool {
        self.pending
    }

    pub fn tips(&self) -> Option<&[String]> {
        self.tips.as_deref()
    }

    pub fn can_request(&self, has_transactions: bool) -> bool {
        !self.pending && has_transactions
    }

    /// Marks a request as started. Returns `false`, changing nothing, when
    /// one is already pending or there are no transactions.
    pub fn begin(&mut self, has_transactions: bool) -> bool {
        if !self.can_request(has_transactions) {
            return false;
        }
        self.pending = true;
        true
    }

    /// Records the outcome and clears the pending flag.
    pub fn finish(&mut self, text: &str) {
        self.pending = false;
        self.tips = Some(parse_tips(text));
    }
}
