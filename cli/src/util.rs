use serde_json::{Value, json};

pub fn client() -> reqwest::Client {
    reqwest::Client::new()
}

fn print_json(value: &Value, raw: bool, to_stderr: bool) {
    let formatted = if raw {
        serde_json::to_string(value)
    } else {
        serde_json::to_string_pretty(value)
    }
    .unwrap_or_else(|_| value.to_string());

    if to_stderr {
        eprintln!("{formatted}");
    } else {
        println!("{formatted}");
    }
}

pub fn exit_error(message: &str, docs_hint: Option<&str>) -> ! {
    let mut err = json!({
        "error": "cli_error",
        "message": message
    });
    if let Some(hint) = docs_hint {
        err["docs_hint"] = json!(hint);
    }
    print_json(&err, false, true);
    std::process::exit(4);
}

/// Print a successful result on stdout, or a structured error on stderr.
pub fn print_outcome(value: &Value, raw: bool, ok: bool) {
    print_json(value, raw, !ok);
}

/// Map an HTTP status to the CLI exit code.
///
/// 0=success (2xx), 1=client error (4xx), 2=server error (5xx).
/// Connection failures use 3 and usage errors 4.
pub fn exit_code_for(status: u16) -> i32 {
    match status {
        200..=299 => 0,
        400..=499 => 1,
        _ => 2,
    }
}

/// Execute an API request, print the response and return the exit code.
pub async fn api_request(
    api_url: &str,
    method: reqwest::Method,
    path: &str,
    body: Option<Value>,
    raw: bool,
) -> i32 {
    let url = match url::Url::parse(api_url).and_then(|base| base.join(path)) {
        Ok(url) => url,
        Err(e) => {
            print_json(
                &json!({
                    "error": "cli_error",
                    "message": format!("Invalid URL: {api_url}{path}: {e}")
                }),
                false,
                true,
            );
            return 4;
        }
    };

    let mut req = client().request(method, url);
    if let Some(b) = body {
        req = req.json(&b);
    }

    let resp = match req.send().await {
        Ok(r) => r,
        Err(e) => {
            print_json(
                &json!({
                    "error": "connection_error",
                    "message": format!("{e}"),
                    "docs_hint": "Is the action server running? Check BRICK_API_URL."
                }),
                false,
                true,
            );
            return 3;
        }
    };

    let exit_code = exit_code_for(resp.status().as_u16());
    let resp_body: Value = match resp.json().await {
        Ok(v) => v,
        Err(e) => json!({"raw_error": format!("Failed to parse response as JSON: {e}")}),
    };

    print_outcome(&resp_body, raw, exit_code == 0);
    exit_code
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes_follow_status_class() {
        assert_eq!(exit_code_for(200), 0);
        assert_eq!(exit_code_for(204), 0);
        assert_eq!(exit_code_for(400), 1);
        assert_eq!(exit_code_for(404), 1);
        assert_eq!(exit_code_for(500), 2);
        assert_eq!(exit_code_for(503), 2);
    }
}
