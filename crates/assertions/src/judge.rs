//! `llm_judge` assertion evaluation (§4.3): a configured judge provider is
//! asked, with a criterion string, whether a response passes.

use conductor_domain::error::{Error, Result};
use conductor_domain::message::Message;
use conductor_providers::{ChatRequest, Provider};

/// The judge's verdict, parsed from its response text.
#[derive(Debug, Clone, PartialEq)]
pub struct JudgeVerdict {
    pub pass: bool,
    pub score: Option<f64>,
    pub rationale: String,
}

/// Ask `judge` whether `response_text` satisfies `criterion`. The judge is
/// instructed to answer in a single-line `PASS`/`FAIL` format with an
/// optional numeric score, which this function parses defensively — a
/// judge that ignores the instruction and free-forms still gets scored
/// on whether its reply contains a recognizable verdict token.
pub async fn judge(
    judge_provider: &dyn Provider,
    criterion: &str,
    response_text: &str,
) -> Result<JudgeVerdict> {
    let prompt = format!(
        "You are an evaluation judge. Given a criterion and a candidate response, \
         decide whether the response satisfies the criterion.\n\n\
         Criterion: {criterion}\n\n\
         Candidate response:\n{response_text}\n\n\
         Reply with exactly one line in the form:\n\
         VERDICT: PASS|FAIL SCORE: <0.0-1.0> REASON: <short reason>"
    );

    let req = ChatRequest {
        messages: vec![Message::user(prompt)],
        temperature: Some(0.0),
        ..ChatRequest::default()
    };

    let resp = judge_provider.predict(req).await.map_err(|e| Error::Other(format!(
        "llm_judge provider call failed: {e}"
    )))?;

    Ok(parse_verdict(&resp.content))
}

fn parse_verdict(text: &str) -> JudgeVerdict {
    let upper = text.to_uppercase();
    let pass = if upper.contains("VERDICT: PASS") || upper.contains("VERDICT:PASS") {
        true
    } else if upper.contains("VERDICT: FAIL") || upper.contains("VERDICT:FAIL") {
        false
    } else {
        // Fall back to a loose keyword scan so a non-conforming judge
        // still yields a usable signal rather than always failing.
        upper.contains("PASS") && !upper.contains("FAIL")
    };

    let score = text
        .split("SCORE:")
        .nth(1)
        .and_then(|rest| rest.split_whitespace().next())
        .and_then(|tok| tok.parse::<f64>().ok());

    let rationale = text
        .split("REASON:")
        .nth(1)
        .map(|s| s.trim().to_string())
        .unwrap_or_else(|| text.trim().to_string());

    JudgeVerdict { pass, score, rationale }
}
