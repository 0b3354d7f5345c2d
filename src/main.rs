mod backup;
mod calc;
mod ipc;
mod report;
mod store;
mod student;

use std::io::{self, BufRead, Write};
use tracing_subscriber::EnvFilter;

fn respond(stdout: &mut io::Stdout, value: &serde_json::Value) {
    let line = serde_json::to_string(value).unwrap_or_else(|_| "{\"ok\":false}".to_string());
    let _ = writeln!(stdout, "{}", line);
    let _ = stdout.flush();
}

fn main() {
    // stdout carries the protocol; diagnostics go to stderr.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let mut state = ipc::AppState {
        workspace: None,
        store: None,
    };

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    for line in stdin.lock().lines() {
        let line = match line {
            Ok(v) => v,
            Err(_) => break,
        };
        if line.trim().is_empty() {
            continue;
        }

        let req: ipc::Request = match serde_json::from_str(&line) {
            Ok(v) => v,
            Err(e) => {
                // Can't echo a request id we failed to parse.
                let resp = serde_json::json!({
                    "ok": false,
                    "error": { "code": "bad_json", "message": e.to_string() }
                });
                respond(&mut stdout, &resp);
                continue;
            }
        };

        let resp = ipc::handle_request(&mut state, req);
        respond(&mut stdout, &resp);
    }
}
