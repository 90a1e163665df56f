//! Database initialization handler

use crate::cli::output::print_info;
use crate::cli::output::print_success;
use crate::cli::output::print_warning;
use crate::database::Database;
use crate::AppConfig;
use crate::Result;

/// Handle database initialization command
pub async fn handle_init_command(config: &AppConfig, force: bool) -> Result<()> {
    if !force {
        print_warning("This will create the profiles, communities and posts tables.");
        print_warning("This operation is safe - it uses CREATE IF NOT EXISTS.");
        println!("\nUse --force to proceed.");
        return Ok(());
    }

    let database = Database::from_config(config).await?;
    if database.is_schema_initialized().await? {
        print_info("Schema already present, re-applying missing objects only");
    }

    print_info("🗄️  Initializing postrag database...");
    database.init_schema().await?;
    print_success("Schema ready");
    Ok(())
}
