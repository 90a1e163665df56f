//! Information display handlers (candidate pool, config)

use crate::cli::output::print_config;
use crate::cli::output::print_info;
use crate::cli::output::print_post_list;
use crate::database::Database;
use crate::AppConfig;
use crate::Result;

/// Handle recent command
pub async fn handle_recent_command(config: &AppConfig, limit: usize) -> Result<()> {
    let database = Database::from_config(config).await?;
    let total = database.count_global_posts().await?;
    let posts = database.list_recent_global_posts(limit).await?;

    print_info(&format!(
        "📋 Newest {} of {} global posts",
        posts.len(),
        total
    ));
    print_post_list(&posts);
    Ok(())
}

/// Handle config command
pub fn handle_config_command(config: &AppConfig) -> Result<()> {
    print_config(config);
    Ok(())
}
