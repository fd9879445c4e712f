use crate::tools::function::FunctionTool;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct WeatherArgs {
    city: String,
}

/// Canned weather lookup; no external service is queried.
pub fn get_weather(city: &str) -> String {
    match city {
        "New York" => "Sunny, 72°F".to_string(),
        "London" => "Cloudy, 15°C".to_string(),
        "Tokyo" => "Rainy, 20°C".to_string(),
        other => format!("Weather data not available for {other}"),
    }
}

pub fn weather_tool() -> FunctionTool {
    FunctionTool::typed(
        "get_weather",
        "Get weather information for a city",
        serde_json::json!({
            "type": "object",
            "properties": {
                "city": { "type": "string", "description": "City name" }
            },
            "required": ["city"]
        }),
        |args: WeatherArgs| get_weather(&args.city),
    )
}
