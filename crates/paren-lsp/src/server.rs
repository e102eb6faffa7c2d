//! The language server proper: one synchronous session owning the
//! document store and the client's negotiated capabilities.

use std::io::Write;

use serde_json::{json, Value};

use paren_analysis::{analyze, AstKind, DocumentStore, ScopeSet};
use paren_core::Location;

use crate::protocol::{
    classify, DidChangeParams, DidCloseParams, DidOpenParams, Incoming, PositionParams,
    SemanticTokensParams, INVALID_REQUEST, METHOD_NOT_FOUND, PARSE_ERROR,
};
use crate::transport::{write_frame, FrameDecoder};

/// A language server session bound to an output stream.
pub struct Server<W: Write> {
    out: W,
    decoder: FrameDecoder,
    documents: DocumentStore,
    /// Whether the client announced `textDocument.publishDiagnostics`.
    publish_diagnostics: bool,
    /// Semantic token legend, in the client's order. Empty until the
    /// client announces `textDocument.semanticTokens.tokenTypes`.
    token_types: Vec<String>,
}

impl<W: Write> Server<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            decoder: FrameDecoder::new(),
            documents: DocumentStore::new(),
            publish_diagnostics: false,
            token_types: Vec::new(),
        }
    }

    /// Feed raw bytes from the client and handle every complete message
    /// they finish.
    pub fn feed(&mut self, bytes: &[u8]) -> std::io::Result<()> {
        self.decoder.push(bytes);
        while let Some(frame) = self.decoder.next_frame() {
            match frame {
                Ok(body) => self.handle_frame(&body)?,
                // The framing itself was broken; there is no body to
                // parse, so report it the same way as unparseable JSON.
                Err(_) => self.send_error(Value::Null, PARSE_ERROR, "received an invalid JSON")?,
            }
        }
        Ok(())
    }

    /// Borrow the output stream. Tests decode the frames written so far.
    pub fn output(&self) -> &W {
        &self.out
    }

    fn handle_frame(&mut self, body: &[u8]) -> std::io::Result<()> {
        let message: Value = match serde_json::from_slice(body) {
            Ok(message) => message,
            Err(_) => {
                return self.send_error(Value::Null, PARSE_ERROR, "received an invalid JSON");
            }
        };
        match classify(&message) {
            Incoming::Request { id, method, params } => self.handle_request(id, &method, params),
            Incoming::Notification { method, params } => {
                self.handle_notification(&method, params)
            }
            // This server never sends requests, so any response is stale.
            Incoming::Response => Ok(()),
            Incoming::Invalid => {
                self.send_error(Value::Null, INVALID_REQUEST, "received an invalid request")
            }
        }
    }

    fn handle_request(&mut self, id: Value, method: &str, params: Value) -> std::io::Result<()> {
        match method {
            "initialize" => self.initialize(id, params),
            "textDocument/semanticTokens/full" => self.semantic_tokens(id, params),
            "textDocument/completion" => self.completion(id, params),
            "textDocument/definition" => self.definition(id, params),
            "textDocument/hover" => self.hover(id, params),
            _ => self.send_error(id, METHOD_NOT_FOUND, &format!("{method} is not supported")),
        }
    }

    fn handle_notification(&mut self, method: &str, params: Value) -> std::io::Result<()> {
        match method {
            "initialized" => self.log_message("initialized!"),
            "textDocument/didOpen" => {
                let Ok(params) = serde_json::from_value::<DidOpenParams>(params) else {
                    return Ok(());
                };
                self.open_or_change(params.text_document.uri, &params.text_document.text)
            }
            "textDocument/didChange" => {
                let Ok(params) = serde_json::from_value::<DidChangeParams>(params) else {
                    return Ok(());
                };
                // Sync kind is full, so only the last change matters.
                let Some(change) = params.content_changes.last() else {
                    return Ok(());
                };
                self.open_or_change(params.text_document.uri, &change.text)
            }
            "textDocument/didClose" => {
                let Ok(params) = serde_json::from_value::<DidCloseParams>(params) else {
                    return Ok(());
                };
                self.publish_diagnostics(&params.text_document.uri, &[])
            }
            // Unknown notifications are dropped without an answer.
            _ => Ok(()),
        }
    }

    // ── requests ──

    fn initialize(&mut self, id: Value, params: Value) -> std::io::Result<()> {
        let mut capabilities = json!({
            "textDocumentSync": 1,
            "definitionProvider": true,
            "hoverProvider": true,
            "completionProvider": {},
        });

        let text_document = params
            .get("capabilities")
            .and_then(|c| c.get("textDocument"));
        if let Some(text_document) = text_document {
            // An explicit `false` or `null` opts out like an absent key.
            let publish = text_document
                .get("publishDiagnostics")
                .is_some_and(|v| !matches!(v, Value::Null | Value::Bool(false)));
            if publish {
                self.publish_diagnostics = true;
            }
            let token_types = text_document
                .get("semanticTokens")
                .and_then(|s| s.get("tokenTypes"))
                .and_then(Value::as_array);
            if let Some(token_types) = token_types {
                self.token_types = token_types
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect();
                capabilities["semanticTokensProvider"] = json!({
                    "legend": {
                        "tokenTypes": self.token_types,
                        "tokenModifiers": [],
                    },
                    "range": false,
                    "full": true,
                });
            }
        }

        self.respond(id, json!({ "capabilities": capabilities }))
    }

    fn semantic_tokens(&mut self, id: Value, params: Value) -> std::io::Result<()> {
        let Ok(params) = serde_json::from_value::<SemanticTokensParams>(params) else {
            return self.respond(id, Value::Null);
        };
        let Some(analysis) = self.documents.get(&params.text_document.uri) else {
            return self.respond(id, Value::Null);
        };

        let mut data: Vec<u32> = Vec::new();
        let mut line = 0;
        let mut character = 0;
        for token in &analysis.tokens {
            let Some(index) = token
                .semantic_name()
                .and_then(|name| self.token_types.iter().position(|t| t == name))
            else {
                continue;
            };
            let start = token.range.start;
            let (delta_line, delta_char) = if start.line == line {
                (0, start.character - character)
            } else {
                (start.line - line, start.character)
            };
            line = start.line;
            character = start.character;
            let length = token.text.chars().count() as u32;
            data.extend([delta_line, delta_char, length, index as u32, 0]);
        }

        self.respond(id, json!({ "data": data }))
    }

    fn completion(&mut self, id: Value, params: Value) -> std::io::Result<()> {
        let Ok(params) = serde_json::from_value::<PositionParams>(params) else {
            return self.respond(id, Value::Null);
        };
        let Some(analysis) = self.documents.get(&params.text_document.uri) else {
            return self.respond(id, Value::Null);
        };

        let scopes = &analysis.scopes;
        let mut items = Vec::new();
        for scope in [ScopeSet::GLOBAL, ScopeSet::TOPLEVEL] {
            for name in scopes.scope(scope).definitions.keys() {
                items.push(json!({ "label": name }));
            }
        }
        for &child in &scopes.scope(ScopeSet::TOPLEVEL).children {
            let local = scopes.scope(child);
            let in_scope = local
                .range
                .as_ref()
                .is_some_and(|range| range.contains(params.position));
            if in_scope {
                for name in local.definitions.keys() {
                    items.push(json!({ "label": name }));
                }
            }
        }

        self.respond(id, Value::Array(items))
    }

    fn definition(&mut self, id: Value, params: Value) -> std::io::Result<()> {
        let Ok(params) = serde_json::from_value::<PositionParams>(params) else {
            return self.respond(id, Value::Null);
        };
        let uri = params.text_document.uri;
        let Some(analysis) = self.documents.get(&uri) else {
            return self.respond(id, Value::Null);
        };

        let ast = analysis.find_ast_of_position(params.position);
        let result = match ast.map(|ast| &ast.kind) {
            Some(AstKind::Variable {
                def_token: Some(token),
                ..
            }) => {
                let location = Location {
                    uri,
                    range: analysis.tokens[*token].range,
                };
                serde_json::to_value(location).unwrap_or(Value::Null)
            }
            _ => Value::Null,
        };
        self.respond(id, result)
    }

    fn hover(&mut self, id: Value, params: Value) -> std::io::Result<()> {
        let Ok(params) = serde_json::from_value::<PositionParams>(params) else {
            return self.respond(id, Value::Null);
        };
        let Some(analysis) = self.documents.get(&params.text_document.uri) else {
            return self.respond(id, Value::Null);
        };

        let result = match analysis.find_ast_of_position(params.position) {
            Some(ast) => json!({ "contents": analysis.types.display(ast.ty) }),
            None => Value::Null,
        };
        self.respond(id, result)
    }

    // ── document lifecycle ──

    fn open_or_change(&mut self, uri: String, text: &str) -> std::io::Result<()> {
        let analysis = analyze(text);
        let diagnostics = analysis.diagnostics.clone();
        self.documents.insert(uri.clone(), analysis);
        self.publish_diagnostics(&uri, &diagnostics)
    }

    fn publish_diagnostics(
        &mut self,
        uri: &str,
        diagnostics: &[paren_core::Diagnostic],
    ) -> std::io::Result<()> {
        if !self.publish_diagnostics {
            return Ok(());
        }
        let diagnostics: Vec<Value> = diagnostics
            .iter()
            .map(|d| {
                json!({
                    "range": d.range,
                    "message": d.message,
                    "severity": 1,
                    "source": "paren",
                })
            })
            .collect();
        self.send(json!({
            "jsonrpc": "2.0",
            "method": "textDocument/publishDiagnostics",
            "params": { "uri": uri, "diagnostics": diagnostics },
        }))
    }

    // ── outgoing messages ──

    fn log_message(&mut self, message: &str) -> std::io::Result<()> {
        self.send(json!({
            "jsonrpc": "2.0",
            "method": "window/logMessage",
            "params": { "type": 3, "message": message },
        }))
    }

    fn respond(&mut self, id: Value, result: Value) -> std::io::Result<()> {
        self.send(json!({ "jsonrpc": "2.0", "id": id, "result": result }))
    }

    fn send_error(&mut self, id: Value, code: i64, message: &str) -> std::io::Result<()> {
        self.send(json!({
            "jsonrpc": "2.0",
            "id": id,
            "error": { "code": code, "message": message },
        }))
    }

    fn send(&mut self, message: Value) -> std::io::Result<()> {
        let body = message.to_string();
        write_frame(&mut self.out, body.as_bytes())
    }
}
