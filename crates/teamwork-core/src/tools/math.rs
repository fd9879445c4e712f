use crate::tools::function::FunctionTool;
use serde::Deserialize;
use serde_json::Value;

#[derive(Debug, Deserialize)]
struct BinaryArgs {
    a: f64,
    b: f64,
}

pub fn calculate_sum(a: f64, b: f64) -> f64 {
    a + b
}

pub fn calculate_product(a: f64, b: f64) -> f64 {
    a * b
}

fn binary_schema() -> Value {
    serde_json::json!({
        "type": "object",
        "properties": {
            "a": { "type": "number", "description": "First number" },
            "b": { "type": "number", "description": "Second number" }
        },
        "required": ["a", "b"]
    })
}

pub fn sum_tool() -> FunctionTool {
    FunctionTool::typed(
        "calculate_sum",
        "Calculate the sum of two numbers",
        binary_schema(),
        |args: BinaryArgs| calculate_sum(args.a, args.b),
    )
}

pub fn product_tool() -> FunctionTool {
    FunctionTool::typed(
        "calculate_product",
        "Calculate the product of two numbers",
        binary_schema(),
        |args: BinaryArgs| calculate_product(args.a, args.b),
    )
}
