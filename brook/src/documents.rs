//! Uploaded documents and the built-in `get_file_text` tool that reads them back to the model.
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use brook::{GetFileTextTool, InMemoryDocumentSource, Tool};
//!
//! let documents = Arc::new(InMemoryDocumentSource::new());
//! documents.insert(1, "budget.pdf", "quarterly budget: 10k").expect("insert");
//!
//! let tool = GetFileTextTool::new(documents);
//! assert_eq!(tool.schema().name(), "get_file_text");
//! ```

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use bcommon::BoxFuture;
use bprovider::ToolSchema;
use btooling::{
    Tool, ToolArguments, ToolError, ToolExecutionContext, ToolFuture, required_i64,
};
use serde_json::json;

pub const GET_FILE_TEXT: &str = "get_file_text";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub id: i64,
    pub file_name: String,
    pub text: String,
}

/// Where extracted document text lives. `Ok(None)` means no document has that id.
pub trait DocumentSource: Send + Sync {
    fn document<'a>(&'a self, id: i64) -> BoxFuture<'a, Result<Option<Document>, ToolError>>;
}

#[derive(Debug, Default)]
pub struct InMemoryDocumentSource {
    documents: Mutex<HashMap<i64, Document>>,
}

impl InMemoryDocumentSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(
        &self,
        id: i64,
        file_name: impl Into<String>,
        text: impl Into<String>,
    ) -> Result<(), ToolError> {
        let document = Document {
            id,
            file_name: file_name.into(),
            text: text.into(),
        };
        self.documents
            .lock()
            .map_err(|_| ToolError::other("document source lock poisoned"))?
            .insert(id, document);
        Ok(())
    }

    pub fn remove(&self, id: i64) -> Result<Option<Document>, ToolError> {
        Ok(self
            .documents
            .lock()
            .map_err(|_| ToolError::other("document source lock poisoned"))?
            .remove(&id))
    }
}

impl DocumentSource for InMemoryDocumentSource {
    fn document<'a>(&'a self, id: i64) -> BoxFuture<'a, Result<Option<Document>, ToolError>> {
        Box::pin(async move {
            Ok(self
                .documents
                .lock()
                .map_err(|_| ToolError::other("document source lock poisoned"))?
                .get(&id)
                .cloned())
        })
    }
}

pub fn get_file_text_schema() -> ToolSchema {
    ToolSchema::function(
        GET_FILE_TEXT,
        "Get the full text of a given context file based on the context_file_id.",
        json!({
            "type": "object",
            "properties": {
                "context_file_id": {
                    "type": "integer",
                    "description": "The id of the context files to get the text from."
                }
            },
            "required": ["context_file_id"]
        }),
    )
}

/// Text handed back to the model when the id does not resolve. It stays in-band so the
/// model can correct itself.
pub fn file_not_found_text(id: i64) -> String {
    format!(
        "File not found with id {id}, perhaps it was deleted or never existed, are you sure the id is correct?"
    )
}

pub struct GetFileTextTool {
    documents: Arc<dyn DocumentSource>,
}

impl GetFileTextTool {
    pub fn new(documents: Arc<dyn DocumentSource>) -> Self {
        Self { documents }
    }
}

impl Tool for GetFileTextTool {
    fn schema(&self) -> ToolSchema {
        get_file_text_schema()
    }

    fn invoke<'a>(
        &'a self,
        arguments: &'a ToolArguments,
        context: &'a ToolExecutionContext,
    ) -> ToolFuture<'a, Result<Option<String>, ToolError>> {
        Box::pin(async move {
            let id = required_i64(arguments, "context_file_id")?;

            match self.documents.document(id).await? {
                Some(document) => {
                    tracing::debug!(
                        conversation_id = %context.session_id,
                        context_file_id = id,
                        file_name = document.file_name.as_str(),
                        "file retrieved"
                    );
                    Ok(Some(document.text))
                }
                None => {
                    tracing::warn!(
                        conversation_id = %context.session_id,
                        context_file_id = id,
                        "file not found"
                    );
                    Ok(Some(file_not_found_text(id)))
                }
            }
        })
    }
}
