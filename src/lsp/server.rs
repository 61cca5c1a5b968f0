use std::collections::HashMap;
use std::path::PathBuf;
use tokio::sync::{Mutex, RwLock};
use tower_lsp::jsonrpc::Result;
use tower_lsp::lsp_types::*;
use tower_lsp::{Client, LanguageServer, LspService, Server};

use super::diagnostics::to_lsp_diagnostic;
use crate::config::ServiceConfig;
use crate::service::Service;

pub struct HiFriendServer {
    client: Client,
    service: Mutex<Service>,
    documents: RwLock<HashMap<Url, String>>,
}

impl HiFriendServer {
    pub fn new(client: Client, service: Service) -> Self {
        Self {
            client,
            service: Mutex::new(service),
            documents: RwLock::new(HashMap::new()),
        }
    }

    /// Re-analyze an open buffer and publish its diagnostics
    async fn analyze_document(&self, uri: Url) {
        let Ok(path) = uri.to_file_path() else {
            tracing::debug!("ignoring non-file URI {}", uri);
            return;
        };
        let Some(text) = self.documents.read().await.get(&uri).cloned() else {
            return;
        };

        let diagnostics: Vec<Diagnostic> = {
            let mut service = self.service.lock().await;
            if let Err(err) = service.update_file(&path, Some(&text)) {
                tracing::debug!("{}", err);
            }
            service
                .diagnostics(&path)
                .iter()
                .map(to_lsp_diagnostic)
                .collect()
        };

        self.client.publish_diagnostics(uri, diagnostics, None).await;
    }

    /// Byte column of an LSP position inside the open buffer
    async fn byte_column(&self, uri: &Url, position: Position) -> usize {
        let documents = self.documents.read().await;
        let Some(line) = documents
            .get(uri)
            .and_then(|text| text.lines().nth(position.line as usize))
        else {
            return position.character as usize;
        };
        utf16_to_byte_column(line, position.character as usize)
    }
}

/// Convert a UTF-16 code unit offset within `line` to a byte offset
fn utf16_to_byte_column(line: &str, character: usize) -> usize {
    let mut units = 0;
    for (offset, ch) in line.char_indices() {
        if units >= character {
            return offset;
        }
        units += ch.len_utf16();
    }
    line.len()
}

fn document_path(uri: &Url) -> Option<PathBuf> {
    uri.to_file_path().ok()
}

#[tower_lsp::async_trait]
impl LanguageServer for HiFriendServer {
    async fn initialize(&self, params: InitializeParams) -> Result<InitializeResult> {
        if let Some(root) = params.root_uri.as_ref().and_then(document_path) {
            let mut service = self.service.lock().await;
            match service.add_workspace(&root) {
                Ok(count) => tracing::info!("indexed {} files under {}", count, root.display()),
                Err(err) => tracing::warn!("workspace indexing failed: {}", err),
            }
        }

        Ok(InitializeResult {
            capabilities: ServerCapabilities {
                text_document_sync: Some(TextDocumentSyncCapability::Kind(
                    TextDocumentSyncKind::FULL,
                )),
                hover_provider: Some(HoverProviderCapability::Simple(true)),
                definition_provider: Some(OneOf::Left(true)),
                references_provider: Some(OneOf::Left(true)),
                completion_provider: Some(CompletionOptions::default()),
                ..Default::default()
            },
            server_info: Some(ServerInfo {
                name: "hifriend".to_string(),
                version: Some(env!("CARGO_PKG_VERSION").to_string()),
            }),
        })
    }

    async fn initialized(&self, _: InitializedParams) {
        self.client
            .log_message(MessageType::INFO, "HiFriend LSP server initialized")
            .await;
    }

    async fn did_open(&self, params: DidOpenTextDocumentParams) {
        let uri = params.text_document.uri;
        let text = params.text_document.text;

        self.documents.write().await.insert(uri.clone(), text);
        self.analyze_document(uri).await;
    }

    async fn did_change(&self, params: DidChangeTextDocumentParams) {
        let uri = params.text_document.uri;

        // Full sync: the last change holds the whole buffer
        if let Some(change) = params.content_changes.into_iter().last() {
            self.documents.write().await.insert(uri.clone(), change.text);
            self.analyze_document(uri).await;
        }
    }

    async fn did_save(&self, params: DidSaveTextDocumentParams) {
        self.analyze_document(params.text_document.uri).await;
    }

    async fn did_close(&self, params: DidCloseTextDocumentParams) {
        self.documents.write().await.remove(&params.text_document.uri);

        // The file stays analyzed from disk; only the buffer is dropped
        self.client
            .publish_diagnostics(params.text_document.uri, vec![], None)
            .await;
    }

    async fn hover(&self, params: HoverParams) -> Result<Option<Hover>> {
        let uri = params.text_document_position_params.text_document.uri;
        let position = params.text_document_position_params.position;
        let Some(path) = document_path(&uri) else {
            return Ok(None);
        };
        let column = self.byte_column(&uri, position).await;

        let shown = self
            .service
            .lock()
            .await
            .hover(&path, position.line as usize + 1, column);

        Ok(shown.map(|text| Hover {
            contents: HoverContents::Markup(MarkupContent {
                kind: MarkupKind::Markdown,
                value: format!("```ruby\n{}\n```", text),
            }),
            range: None,
        }))
    }

    async fn goto_definition(
        &self,
        params: GotoDefinitionParams,
    ) -> Result<Option<GotoDefinitionResponse>> {
        let uri = params.text_document_position_params.text_document.uri;
        let position = params.text_document_position_params.position;
        let Some(path) = document_path(&uri) else {
            return Ok(None);
        };

        let column = self.byte_column(&uri, position).await;

        let locations = self
            .service
            .lock()
            .await
            .definitions(&path, position.line as usize + 1, column);
        let locations: Vec<Location> = locations.iter().filter_map(to_lsp_location).collect();

        Ok((!locations.is_empty()).then_some(GotoDefinitionResponse::Array(locations)))
    }

    async fn references(&self, params: ReferenceParams) -> Result<Option<Vec<Location>>> {
        let uri = params.text_document_position.text_document.uri;
        let position = params.text_document_position.position;
        let Some(path) = document_path(&uri) else {
            return Ok(None);
        };

        let column = self.byte_column(&uri, position).await;

        let locations = self
            .service
            .lock()
            .await
            .references(&path, position.line as usize + 1, column);
        Ok(Some(locations.iter().filter_map(to_lsp_location).collect()))
    }

    async fn completion(&self, params: CompletionParams) -> Result<Option<CompletionResponse>> {
        let uri = params.text_document_position.text_document.uri;
        let position = params.text_document_position.position;
        let Some(path) = document_path(&uri) else {
            return Ok(None);
        };

        let column = self.byte_column(&uri, position).await;

        let items = self
            .service
            .lock()
            .await
            .completion(&path, position.line as usize + 1, column)
            .into_iter()
            .map(|label| CompletionItem {
                label,
                kind: Some(CompletionItemKind::METHOD),
                ..Default::default()
            })
            .collect();
        Ok(Some(CompletionResponse::Array(items)))
    }

    async fn shutdown(&self) -> Result<()> {
        Ok(())
    }
}

fn to_lsp_location(location: &crate::diagnostics::Location) -> Option<Location> {
    let uri = Url::from_file_path(&location.file).ok()?;
    let start = Position {
        line: location.line.saturating_sub(1) as u32,
        character: location.column.saturating_sub(1) as u32,
    };
    let end = Position {
        character: start.character + location.length.unwrap_or(0) as u32,
        ..start
    };
    Some(Location {
        uri,
        range: Range { start, end },
    })
}

pub async fn run_server() {
    let service = match Service::new(ServiceConfig::default()) {
        Ok(service) => service,
        Err(err) => {
            tracing::error!("failed to start analysis service: {}", err);
            return;
        }
    };

    let stdin = tokio::io::stdin();
    let stdout = tokio::io::stdout();

    let (service, socket) = LspService::new(|client| HiFriendServer::new(client, service));

    Server::new(stdin, stdout, socket).serve(service).await;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_utf16_to_byte_column() {
        assert_eq!(utf16_to_byte_column("x = 1", 4), 4);
        // "é" is two bytes but one UTF-16 unit
        assert_eq!(utf16_to_byte_column("é = 1", 2), 3);
        assert_eq!(utf16_to_byte_column("ab", 10), 2);
    }
}
