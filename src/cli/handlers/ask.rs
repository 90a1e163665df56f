//! One-shot search handler

use tracing::debug;

use crate::cli::output::print_search_outcome;
use crate::rag::SearchRequest;
use crate::rag::SearchService;
use crate::session::RequestContext;
use crate::AppConfig;
use crate::Result;

pub async fn handle_ask_command(
    config: &AppConfig,
    question: String,
    top_k: Option<usize>,
    json: bool,
) -> Result<()> {
    let service = SearchService::from_config(config).await?;
    let ctx = RequestContext::anonymous();
    debug!("CLI request {}", ctx.request_id);

    let request = SearchRequest { question, top_k };
    let outcome = service.search(&ctx, request).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&outcome.result)?);
    } else {
        print_search_outcome(&outcome);
    }
    Ok(())
}
