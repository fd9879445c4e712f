use crate::error::TeamError;
use crate::tools::traits::{Tool, ToolResult};
use futures::future::BoxFuture;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::future::Future;

type Handler = Box<dyn Fn(Value) -> BoxFuture<'static, ToolResult> + Send + Sync>;

/// A tool backed by a plain function or closure.
///
/// ```ignore
/// let tool = FunctionTool::typed(
///     "calculate_sum",
///     "Calculate the sum of two numbers",
///     schema,
///     |args: BinaryArgs| args.a + args.b,
/// );
/// ```
pub struct FunctionTool {
    name: String,
    description: String,
    schema: Value,
    handler: Handler,
}

impl FunctionTool {
    /// Wrap an async handler that receives the raw JSON arguments.
    pub fn new<F, Fut>(
        name: impl Into<String>,
        description: impl Into<String>,
        schema: Value,
        handler: F,
    ) -> Self
    where
        F: Fn(Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ToolResult> + Send + 'static,
    {
        Self {
            name: name.into(),
            description: description.into(),
            schema,
            handler: Box::new(move |params| Box::pin(handler(params))),
        }
    }

    /// Wrap a synchronous function over typed arguments. Arguments that do
    /// not deserialize into `A` become a tool error.
    pub fn typed<A, R, F>(
        name: impl Into<String>,
        description: impl Into<String>,
        schema: Value,
        f: F,
    ) -> Self
    where
        A: DeserializeOwned + Send + 'static,
        R: Serialize + 'static,
        F: Fn(A) -> R + Send + Sync + 'static,
    {
        let name = name.into();
        let tool_name = name.clone();
        let f = std::sync::Arc::new(f);
        Self::new(name, description, schema, move |params| {
            let f = f.clone();
            let tool_name = tool_name.clone();
            async move {
                let args: A = serde_json::from_value(params).map_err(|e| {
                    TeamError::tool(&tool_name, format!("invalid arguments: {e}"))
                })?;
                Ok(serde_json::to_value(f(args))?)
            }
        })
    }
}

impl std::fmt::Debug for FunctionTool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FunctionTool")
            .field("name", &self.name)
            .field("description", &self.description)
            .finish_non_exhaustive()
    }
}

#[async_trait::async_trait]
impl Tool for FunctionTool {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn parameters_schema(&self) -> Value {
        self.schema.clone()
    }

    async fn execute(&self, params: Value) -> ToolResult {
        (self.handler)(params).await
    }
}
