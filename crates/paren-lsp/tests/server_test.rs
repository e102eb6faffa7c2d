//! End-to-end exercises of the server over in-memory framed streams.

use std::collections::HashSet;

use serde_json::{json, Value};

use paren_lsp::{FrameDecoder, Server};

fn send(server: &mut Server<Vec<u8>>, message: Value) {
    let body = message.to_string();
    let mut framed = format!("Content-Length: {}\r\n\r\n", body.len()).into_bytes();
    framed.extend_from_slice(body.as_bytes());
    server.feed(&framed).unwrap();
}

fn messages(server: &Server<Vec<u8>>) -> Vec<Value> {
    let mut decoder = FrameDecoder::new();
    decoder.push(server.output());
    let mut out = Vec::new();
    while let Some(frame) = decoder.next_frame() {
        out.push(serde_json::from_slice(&frame.unwrap()).unwrap());
    }
    out
}

fn response_for(server: &Server<Vec<u8>>, id: i64) -> Value {
    messages(server)
        .into_iter()
        .find(|m| m.get("id") == Some(&json!(id)))
        .unwrap_or_else(|| panic!("no response with id {id}"))
}

fn initialize(server: &mut Server<Vec<u8>>) {
    send(
        server,
        json!({
            "jsonrpc": "2.0",
            "id": 0,
            "method": "initialize",
            "params": {
                "capabilities": {
                    "textDocument": {
                        "publishDiagnostics": {},
                        "semanticTokens": {
                            "tokenTypes": ["keyword", "function", "variable", "number", "comment"],
                        },
                    },
                },
            },
        }),
    );
}

fn open(server: &mut Server<Vec<u8>>, uri: &str, text: &str) {
    send(
        server,
        json!({
            "jsonrpc": "2.0",
            "method": "textDocument/didOpen",
            "params": {"textDocument": {"uri": uri, "languageId": "paren", "version": 1, "text": text}},
        }),
    );
}

const URI: &str = "file:///main.paren";

#[test]
fn initialize_negotiates_capabilities() {
    let mut server = Server::new(Vec::new());
    initialize(&mut server);
    let result = &response_for(&server, 0)["result"];
    let capabilities = &result["capabilities"];
    assert_eq!(capabilities["textDocumentSync"], json!(1));
    assert_eq!(capabilities["definitionProvider"], json!(true));
    assert_eq!(capabilities["hoverProvider"], json!(true));
    assert_eq!(capabilities["completionProvider"], json!({}));
    assert_eq!(
        capabilities["semanticTokensProvider"]["legend"]["tokenTypes"],
        json!(["keyword", "function", "variable", "number", "comment"])
    );
    assert_eq!(capabilities["semanticTokensProvider"]["full"], json!(true));
}

#[test]
fn initialize_without_semantic_tokens_omits_the_provider() {
    let mut server = Server::new(Vec::new());
    send(
        &mut server,
        json!({"jsonrpc": "2.0", "id": 0, "method": "initialize", "params": {"capabilities": {}}}),
    );
    let capabilities = &response_for(&server, 0)["result"]["capabilities"];
    assert!(capabilities.get("semanticTokensProvider").is_none());
}

#[test]
fn did_open_publishes_diagnostics() {
    let mut server = Server::new(Vec::new());
    initialize(&mut server);
    open(&mut server, URI, "(f 1)");
    let publish = messages(&server)
        .into_iter()
        .find(|m| m["method"] == json!("textDocument/publishDiagnostics"))
        .unwrap();
    assert_eq!(publish["params"]["uri"], json!(URI));
    let diagnostics = publish["params"]["diagnostics"].as_array().unwrap().clone();
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics[0]["message"], json!("undefined variable"));
    assert_eq!(diagnostics[0]["severity"], json!(1));
    assert_eq!(diagnostics[0]["source"], json!("paren"));
    assert_eq!(
        diagnostics[0]["range"],
        json!({"start": {"line": 0, "character": 1}, "end": {"line": 0, "character": 2}})
    );
}

#[test]
fn diagnostics_stay_quiet_without_the_capability() {
    let mut server = Server::new(Vec::new());
    send(
        &mut server,
        json!({"jsonrpc": "2.0", "id": 0, "method": "initialize", "params": {"capabilities": {}}}),
    );
    open(&mut server, URI, "(f 1)");
    assert!(messages(&server)
        .iter()
        .all(|m| m["method"] != json!("textDocument/publishDiagnostics")));
}

#[test]
fn explicit_false_publish_capability_opts_out() {
    let mut server = Server::new(Vec::new());
    send(
        &mut server,
        json!({
            "jsonrpc": "2.0",
            "id": 0,
            "method": "initialize",
            "params": {"capabilities": {"textDocument": {"publishDiagnostics": false}}},
        }),
    );
    open(&mut server, URI, "(f 1)");
    assert!(messages(&server)
        .iter()
        .all(|m| m["method"] != json!("textDocument/publishDiagnostics")));
}

#[test]
fn did_change_reanalyzes_with_the_last_change() {
    let mut server = Server::new(Vec::new());
    initialize(&mut server);
    open(&mut server, URI, "(f 1)");
    send(
        &mut server,
        json!({
            "jsonrpc": "2.0",
            "method": "textDocument/didChange",
            "params": {
                "textDocument": {"uri": URI, "version": 2},
                "contentChanges": [{"text": "still (broken"}, {"text": "(print 1)"}],
            },
        }),
    );
    let publishes: Vec<Value> = messages(&server)
        .into_iter()
        .filter(|m| m["method"] == json!("textDocument/publishDiagnostics"))
        .collect();
    assert_eq!(publishes.len(), 2);
    assert_eq!(publishes[1]["params"]["diagnostics"], json!([]));
}

#[test]
fn did_close_publishes_an_empty_set() {
    let mut server = Server::new(Vec::new());
    initialize(&mut server);
    open(&mut server, URI, "(f 1)");
    send(
        &mut server,
        json!({
            "jsonrpc": "2.0",
            "method": "textDocument/didClose",
            "params": {"textDocument": {"uri": URI}},
        }),
    );
    let last = messages(&server).pop().unwrap();
    assert_eq!(last["method"], json!("textDocument/publishDiagnostics"));
    assert_eq!(last["params"]["diagnostics"], json!([]));
}

#[test]
fn hover_reports_the_resolved_type() {
    let mut server = Server::new(Vec::new());
    initialize(&mut server);
    open(&mut server, URI, "(print 1)");
    send(
        &mut server,
        json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": "textDocument/hover",
            "params": {"textDocument": {"uri": URI}, "position": {"line": 0, "character": 2}},
        }),
    );
    assert_eq!(
        response_for(&server, 1)["result"],
        json!({"contents": "(number) -> unit"})
    );
}

#[test]
fn hover_outside_any_form_is_null() {
    let mut server = Server::new(Vec::new());
    initialize(&mut server);
    open(&mut server, URI, "(print 1)");
    send(
        &mut server,
        json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": "textDocument/hover",
            "params": {"textDocument": {"uri": URI}, "position": {"line": 5, "character": 0}},
        }),
    );
    assert_eq!(response_for(&server, 1)["result"], Value::Null);
}

#[test]
fn definition_points_at_the_binding_site() {
    let mut server = Server::new(Vec::new());
    initialize(&mut server);
    open(&mut server, URI, "(defun f (x) x) (f 1)");
    send(
        &mut server,
        json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": "textDocument/definition",
            "params": {"textDocument": {"uri": URI}, "position": {"line": 0, "character": 17}},
        }),
    );
    assert_eq!(
        response_for(&server, 1)["result"],
        json!({
            "uri": URI,
            "range": {"start": {"line": 0, "character": 7}, "end": {"line": 0, "character": 8}},
        })
    );
}

#[test]
fn definition_of_a_builtin_is_null() {
    let mut server = Server::new(Vec::new());
    initialize(&mut server);
    open(&mut server, URI, "(print 1)");
    send(
        &mut server,
        json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": "textDocument/definition",
            "params": {"textDocument": {"uri": URI}, "position": {"line": 0, "character": 2}},
        }),
    );
    assert_eq!(response_for(&server, 1)["result"], Value::Null);
}

#[test]
fn completion_is_scope_aware() {
    let mut server = Server::new(Vec::new());
    initialize(&mut server);
    open(&mut server, URI, "(defun f (x) x) 1");
    let labels_at = |server: &mut Server<Vec<u8>>, id: i64, character: u32| -> HashSet<String> {
        send(
            server,
            json!({
                "jsonrpc": "2.0",
                "id": id,
                "method": "textDocument/completion",
                "params": {"textDocument": {"uri": URI}, "position": {"line": 0, "character": character}},
            }),
        );
        response_for(server, id)["result"]
            .as_array()
            .unwrap()
            .iter()
            .map(|item| item["label"].as_str().unwrap().to_string())
            .collect()
    };

    let inside_body = labels_at(&mut server, 1, 13);
    for name in ["print", "+", "-", "*", "=", "f", "x"] {
        assert!(inside_body.contains(name), "missing {name}");
    }

    let at_toplevel = labels_at(&mut server, 2, 16);
    assert!(at_toplevel.contains("f"));
    assert!(!at_toplevel.contains("x"));
}

#[test]
fn semantic_tokens_are_delta_encoded() {
    let mut server = Server::new(Vec::new());
    initialize(&mut server);
    open(&mut server, URI, "(defun f (x) x)");
    send(
        &mut server,
        json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": "textDocument/semanticTokens/full",
            "params": {"textDocument": {"uri": URI}},
        }),
    );
    // defun: keyword, f: function, then the two xs as variables.
    assert_eq!(
        response_for(&server, 1)["result"]["data"],
        json!([0, 1, 5, 0, 0, 0, 6, 1, 1, 0, 0, 3, 1, 2, 0, 0, 3, 1, 2, 0])
    );
}

#[test]
fn semantic_tokens_span_lines() {
    let mut server = Server::new(Vec::new());
    initialize(&mut server);
    open(&mut server, URI, "; note\n42");
    send(
        &mut server,
        json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": "textDocument/semanticTokens/full",
            "params": {"textDocument": {"uri": URI}},
        }),
    );
    // comment at (0,0) length 6, number on the next line at column 0.
    assert_eq!(
        response_for(&server, 1)["result"]["data"],
        json!([0, 0, 6, 4, 0, 1, 0, 2, 3, 0])
    );
}

#[test]
fn initialized_notification_logs_a_greeting() {
    let mut server = Server::new(Vec::new());
    initialize(&mut server);
    send(&mut server, json!({"jsonrpc": "2.0", "method": "initialized", "params": {}}));
    let log = messages(&server)
        .into_iter()
        .find(|m| m["method"] == json!("window/logMessage"))
        .unwrap();
    assert_eq!(log["params"], json!({"type": 3, "message": "initialized!"}));
}

#[test]
fn unknown_methods_get_method_not_found() {
    let mut server = Server::new(Vec::new());
    send(
        &mut server,
        json!({"jsonrpc": "2.0", "id": 9, "method": "foo/bar", "params": {}}),
    );
    let response = response_for(&server, 9);
    assert_eq!(response["error"]["code"], json!(-32601));
    assert_eq!(response["error"]["message"], json!("foo/bar is not supported"));
}

#[test]
fn malformed_json_gets_a_parse_error_with_null_id() {
    let mut server = Server::new(Vec::new());
    server.feed(b"Content-Length: 5\r\n\r\n{oops").unwrap();
    let response = messages(&server).pop().unwrap();
    assert_eq!(response["id"], Value::Null);
    assert_eq!(response["error"]["code"], json!(-32700));
    assert_eq!(response["error"]["message"], json!("received an invalid JSON"));
}

#[test]
fn messages_without_id_or_method_are_invalid() {
    let mut server = Server::new(Vec::new());
    send(&mut server, json!({"jsonrpc": "2.0"}));
    let response = messages(&server).pop().unwrap();
    assert_eq!(response["error"]["code"], json!(-32600));
    assert_eq!(
        response["error"]["message"],
        json!("received an invalid request")
    );
}

#[test]
fn responses_are_ignored_and_unknown_notifications_dropped() {
    let mut server = Server::new(Vec::new());
    send(&mut server, json!({"jsonrpc": "2.0", "id": 3, "result": null}));
    send(&mut server, json!({"jsonrpc": "2.0", "method": "$/cancelRequest", "params": {}}));
    assert!(messages(&server).is_empty());
}

#[test]
fn requests_survive_arbitrary_chunking() {
    let mut server = Server::new(Vec::new());
    let body = json!({"jsonrpc": "2.0", "id": 0, "method": "initialize", "params": {}}).to_string();
    let framed = format!("Content-Length: {}\r\n\r\n{body}", body.len());
    for byte in framed.as_bytes() {
        server.feed(std::slice::from_ref(byte)).unwrap();
    }
    let result = &response_for(&server, 0)["result"];
    assert_eq!(result["capabilities"]["textDocumentSync"], json!(1));
}
