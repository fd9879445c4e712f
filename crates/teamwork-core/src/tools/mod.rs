mod traits;
mod function;
mod math;
mod weather;

pub use traits::*;
pub use function::FunctionTool;
pub use math::{calculate_product, calculate_sum, product_tool, sum_tool};
pub use weather::{get_weather, weather_tool};
