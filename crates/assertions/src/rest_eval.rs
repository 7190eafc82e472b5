//! `rest_eval` assertion evaluation (§4.3): the response is POSTed to a
//! configured evaluation endpoint; a min-score threshold gates pass/fail.

use conductor_domain::error::{Error, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
struct RestEvalRequest<'a> {
    response: &'a str,
}

#[derive(Debug, Deserialize)]
struct RestEvalResponse {
    score: f64,
    #[serde(default)]
    detail: Option<String>,
}

/// POST `response_text` to `endpoint` and return the score it returns.
pub async fn score_response(
    client: &reqwest::Client,
    endpoint: &str,
    response_text: &str,
) -> Result<(f64, Option<String>)> {
    let body = client
        .post(endpoint)
        .json(&RestEvalRequest { response: response_text })
        .send()
        .await
        .map_err(|e| Error::Other(format!("rest_eval request to \"{endpoint}\" failed: {e}")))?;

    let status = body.status();
    if !status.is_success() {
        return Err(Error::Other(format!(
            "rest_eval endpoint \"{endpoint}\" returned HTTP {status}"
        )));
    }

    let parsed: RestEvalResponse = body
        .json()
        .await
        .map_err(|e| Error::Other(format!("rest_eval endpoint \"{endpoint}\" returned an unparseable body: {e}")))?;

    Ok((parsed.score, parsed.detail))
}
