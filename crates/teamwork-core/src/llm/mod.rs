mod traits;
mod openai;
mod azure;

pub use traits::*;
pub use openai::OpenAIClient;
pub use azure::AzureOpenAIClient;
