//! CLI output formatting utilities

use crate::models::Post;
use crate::rag::text::truncate_chars;
use crate::rag::SearchOutcome;
use crate::AppConfig;

/// Print the answer followed by the cited posts
pub fn print_search_outcome(outcome: &SearchOutcome) {
    let result = &outcome.result;
    println!("💬 Answer:");
    println!();
    println!("{}", result.answer_text);
    println!();
    println!(
        "📊 Mode: {:?} | Confidence: {:?} | Candidates: {}",
        result.mode, result.confidence_level, outcome.candidates_considered
    );
    if outcome.used_recency_fallback {
        print_info("No posts matched the question; the newest posts were used instead");
    }

    if result.related_posts.is_empty() {
        return;
    }

    println!();
    println!("📚 Related posts ({}):", result.related_posts.len());
    for related in &result.related_posts {
        println!(
            "  [{}] {} ({}) ❤️ {} 💬 {}",
            related.citation_index,
            related.title,
            related.author_name,
            related.likes_count,
            related.comments_count
        );
        println!("      {}", truncate_chars(&related.content, 80).replace('\n', " "));
    }
}

/// Print the candidate pool as a table
pub fn print_post_list(posts: &[Post]) {
    if posts.is_empty() {
        print_warning("No global posts found");
        return;
    }

    println!("{:<17} {:<6} {:<16} {}", "Created", "Cat.", "Author", "Title");
    println!("{}", "-".repeat(72));
    for post in posts {
        println!(
            "{:<17} {:<6} {:<16} {}",
            post.created_at.format("%Y-%m-%d %H:%M").to_string(),
            post.category.as_str(),
            truncate_chars(post.author_display_name(), 14),
            truncate_chars(&post.title, 40)
        );
    }
}

/// Print configuration
pub fn print_config(config: &AppConfig) {
    println!("📋 postrag Configuration:");
    println!();

    println!("🗄️  Database:");
    println!("  URL: {}", mask_database_url(config.database_url()));
    println!("  Max connections: {}", config.max_connections());
    println!("  Min connections: {}", config.min_connections());
    println!("  Connection timeout: {}s", config.connection_timeout());
    println!();

    println!("📝 Logging:");
    println!("  Level: {}", config.logging.level);
    println!("  Log dir: {}", config.logging.log_dir);
    println!("  File output: {}", config.logging.file_output);
    println!();

    println!("🤖 LLM:");
    println!("  Provider: {}", config.llm.provider);
    println!("  Endpoint: {}", config.llm_endpoint());
    println!("  Model: {}", config.llm_model());
    println!("  Key: {}", mask_secret(config.llm_key()));
    println!("  Temperature: {}", config.llm.temperature);
    println!("  Max tokens: {}", config.llm.max_tokens);
    println!();

    println!("🔎 Search:");
    println!("  Candidate pool: {}", config.search.candidate_pool_size);
    println!("  Default topK: {}", config.search.default_top_k);
    println!("  Max topK: {}", config.search.max_top_k);
    println!("  Min answer chars: {}", config.search.min_answer_chars);
    println!();

    println!("🌐 Server:");
    println!("  Address: {}:{}", config.server.host, config.server.port);
    println!("  CORS: {}", config.server.enable_cors);
    println!();

    println!("🔒 Auth:");
    println!("  Required: {}", config.auth.required);
    println!(
        "  Verify URL: {}",
        config.auth.verify_url.as_deref().unwrap_or("(none)")
    );
    println!(
        "  API key: {}",
        mask_secret(config.auth.api_key.as_deref().unwrap_or_default())
    );
    println!("  Static tokens: {}", config.auth.static_tokens.len());
}

/// Mask database URL for logging (hide password)
fn mask_database_url(url: &str) -> String {
    if let Ok(parsed) = url::Url::parse(url) {
        if let Some(host) = parsed.host_str() {
            format!(
                "{}://{}@{}:{}",
                parsed.scheme(),
                parsed.username(),
                host,
                parsed.port().unwrap_or(5432)
            )
        } else {
            "***masked***".to_string()
        }
    } else {
        "***invalid***".to_string()
    }
}

/// Keep only the last four characters of a secret
fn mask_secret(secret: &str) -> String {
    let count = secret.chars().count();
    if count == 0 {
        return "(not set)".to_string();
    }
    if count <= 8 {
        return "****".to_string();
    }
    let tail: String = secret.chars().skip(count - 4).collect();
    format!("****{tail}")
}

/// Print colored output functions
pub fn print_info(msg: &str) {
    println!("ℹ️  {msg}");
}

pub fn print_success(msg: &str) {
    println!("✅ {msg}");
}

pub fn print_warning(msg: &str) {
    println!("⚠️  {msg}");
}

pub fn print_error(msg: &str) {
    eprintln!("❌ {msg}");
}
