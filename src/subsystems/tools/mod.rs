//! Tool registry: the closed set of functions the model may call.
//!
//! Every tool answers with a JSON value that is wrapped as
//! `{"result": <value>}` before going back to the model. Tool failures
//! (missing argument, store error) are rendered as `{"error": "..."}` values
//! so a bad call never aborts the conversation turn.

use std::sync::Arc;

use serde_json::{Value, json};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::error::AppError;
use crate::llm::{FunctionResponse, ToolCall, ToolDeclaration};
use crate::subsystems::pubmed::PubMedClient;
use crate::subsystems::store::DrugLookup;

const DRUG_NOT_FOUND: &str = "Medicamento não encontrado";

#[derive(Debug, Error)]
pub enum ToolError {
    #[error("missing required argument '{0}'")]
    MissingArgument(&'static str),
    #[error("{0}")]
    Store(#[from] AppError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolKind {
    DrugStockPrice,
    ScientificArticles,
}

impl ToolKind {
    pub const ALL: [ToolKind; 2] = [ToolKind::DrugStockPrice, ToolKind::ScientificArticles];

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "get_drug_stock_price" => Some(Self::DrugStockPrice),
            "search_scientific_articles" => Some(Self::ScientificArticles),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::DrugStockPrice => "get_drug_stock_price",
            Self::ScientificArticles => "search_scientific_articles",
        }
    }

    /// The single required string argument.
    fn argument(self) -> &'static str {
        match self {
            Self::DrugStockPrice => "drugName",
            Self::ScientificArticles => "query",
        }
    }

    pub fn declaration(self) -> ToolDeclaration {
        let (description, arg_description) = match self {
            Self::DrugStockPrice => (
                "Busca preço e estoque de medicamento no banco de dados.",
                "Nome do medicamento (ex: Simparic, Apoquel).",
            ),
            Self::ScientificArticles => (
                "Busca artigos científicos no PubMed.",
                "Termo de busca científica.",
            ),
        };
        let arg = self.argument();
        ToolDeclaration {
            name: self.name().to_string(),
            description: description.to_string(),
            parameters: json!({
                "type": "object",
                "properties": {
                    arg: { "type": "string", "description": arg_description }
                },
                "required": [arg],
            }),
        }
    }
}

pub struct ToolRegistry {
    store: Arc<dyn DrugLookup>,
    pubmed: PubMedClient,
}

impl ToolRegistry {
    pub fn new(store: Arc<dyn DrugLookup>, pubmed: PubMedClient) -> Self {
        Self { store, pubmed }
    }

    pub fn declarations(&self) -> Vec<ToolDeclaration> {
        ToolKind::ALL.iter().map(|k| k.declaration()).collect()
    }

    /// Run one tool call. Unknown tool names yield `None` and are dropped
    /// from the reply batch.
    pub async fn dispatch(&self, call: &ToolCall) -> Option<FunctionResponse> {
        let Some(kind) = ToolKind::from_name(&call.name) else {
            debug!(tool = %call.name, "model requested unknown tool, skipping");
            return None;
        };

        info!(tool = kind.name(), args = %call.args, "executing tool");
        let result = match self.run(kind, &call.args).await {
            Ok(value) => value,
            Err(e) => {
                warn!(tool = kind.name(), error = %e, "tool failed");
                json!({ "error": e.to_string() })
            }
        };

        Some(FunctionResponse {
            id: call.id.clone(),
            name: call.name.clone(),
            response: json!({ "result": result }),
        })
    }

    async fn run(&self, kind: ToolKind, args: &Value) -> Result<Value, ToolError> {
        let arg = args
            .get(kind.argument())
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or(ToolError::MissingArgument(kind.argument()))?
            .to_string();

        match kind {
            ToolKind::DrugStockPrice => {
                let store = Arc::clone(&self.store);
                // rusqlite is blocking; keep it off the async executor.
                let found = tokio::task::spawn_blocking(move || store.find_drug(&arg))
                    .await
                    .map_err(|e| AppError::Store(format!("lookup task failed: {e}")))??;
                Ok(match found {
                    Some(record) => serde_json::to_value(record)
                        .map_err(|e| AppError::Store(format!("serialize record: {e}")))?,
                    None => json!({ "error": DRUG_NOT_FOUND }),
                })
            }
            ToolKind::ScientificArticles => {
                let articles = self.pubmed.search(&arg).await;
                Ok(json!({ "articles": articles }))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PubMedConfig;
    use crate::subsystems::store::MedicineRecord;

    struct OneDrug;

    impl DrugLookup for OneDrug {
        fn find_drug(&self, query: &str) -> Result<Option<MedicineRecord>, AppError> {
            if "simparic 20mg".contains(&query.to_lowercase()) {
                Ok(Some(MedicineRecord { id: 1, description: "Simparic 20mg".into(), price: 89.9, stock: 12 }))
            } else {
                Ok(None)
            }
        }
    }

    struct BrokenStore;

    impl DrugLookup for BrokenStore {
        fn find_drug(&self, _query: &str) -> Result<Option<MedicineRecord>, AppError> {
            Err(AppError::Store("disk on fire".into()))
        }
    }

    fn registry(store: Arc<dyn DrugLookup>) -> ToolRegistry {
        let pubmed = PubMedClient::new(&PubMedConfig {
            base_url: "http://127.0.0.1:9".into(),
            article_base_url: "https://pubmed.ncbi.nlm.nih.gov".into(),
            domain_filter: "veterinary".into(),
            max_results: 3,
            timeout_seconds: 1,
        })
        .unwrap();
        ToolRegistry::new(store, pubmed)
    }

    fn call(name: &str, args: Value) -> ToolCall {
        ToolCall { id: None, name: name.into(), args, signature: None }
    }

    #[test]
    fn names_round_trip() {
        for kind in ToolKind::ALL {
            assert_eq!(ToolKind::from_name(kind.name()), Some(kind));
        }
        assert_eq!(ToolKind::from_name("delete_everything"), None);
    }

    #[test]
    fn declarations_list_required_argument() {
        let decls = registry(Arc::new(OneDrug)).declarations();
        assert_eq!(decls.len(), 2);
        assert_eq!(decls[0].name, "get_drug_stock_price");
        assert_eq!(decls[0].parameters["required"], json!(["drugName"]));
        assert_eq!(decls[1].parameters["properties"]["query"]["type"], "string");
    }

    #[tokio::test]
    async fn drug_found_returns_record() {
        let resp = registry(Arc::new(OneDrug))
            .dispatch(&call("get_drug_stock_price", json!({ "drugName": "Simparic" })))
            .await
            .unwrap();
        assert_eq!(resp.name, "get_drug_stock_price");
        assert_eq!(
            resp.response,
            json!({ "result": { "id": 1, "description": "Simparic 20mg", "price": 89.9, "stock": 12 } })
        );
    }

    #[tokio::test]
    async fn drug_missing_returns_not_found() {
        let resp = registry(Arc::new(OneDrug))
            .dispatch(&call("get_drug_stock_price", json!({ "drugName": "Bravecto" })))
            .await
            .unwrap();
        assert_eq!(resp.response, json!({ "result": { "error": DRUG_NOT_FOUND } }));
    }

    #[tokio::test]
    async fn store_failure_is_error_shaped() {
        let resp = registry(Arc::new(BrokenStore))
            .dispatch(&call("get_drug_stock_price", json!({ "drugName": "x" })))
            .await
            .unwrap();
        let err = resp.response["result"]["error"].as_str().unwrap();
        assert!(err.contains("disk on fire"));
    }

    #[tokio::test]
    async fn missing_argument_is_error_shaped() {
        let resp = registry(Arc::new(OneDrug))
            .dispatch(&call("search_scientific_articles", json!({ "q": "otite" })))
            .await
            .unwrap();
        assert_eq!(
            resp.response,
            json!({ "result": { "error": "missing required argument 'query'" } })
        );
    }

    #[tokio::test]
    async fn unknown_tool_is_skipped() {
        let resp = registry(Arc::new(OneDrug))
            .dispatch(&call("order_pizza", json!({})))
            .await;
        assert!(resp.is_none());
    }

    #[tokio::test]
    async fn unreachable_pubmed_yields_empty_articles() {
        let resp = registry(Arc::new(OneDrug))
            .dispatch(&call("search_scientific_articles", json!({ "query": "otite" })))
            .await
            .unwrap();
        assert_eq!(resp.response, json!({ "result": { "articles": [] } }));
    }

    #[tokio::test]
    async fn call_id_is_echoed() {
        let mut c = call("get_drug_stock_price", json!({ "drugName": "Simparic" }));
        c.id = Some("call_7".into());
        let resp = registry(Arc::new(OneDrug)).dispatch(&c).await.unwrap();
        assert_eq!(resp.id.as_deref(), Some("call_7"));
    }
}
