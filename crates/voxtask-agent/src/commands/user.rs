use anyhow::Result;
use owo_colors::OwoColorize;
use uuid::Uuid;
use voxtask_core::models::NewUserData;
use voxtask_core::repository::Repository;

/// Creates a user with every default category selected.
pub async fn add_user(repo: &impl Repository, email: String, name: Option<String>) -> Result<()> {
    let defaults = repo.ensure_default_categories().await?;
    let category_ids: Vec<Uuid> = defaults.iter().map(|category| category.id).collect();
    let user = repo
        .add_user_with_categories(
            NewUserData {
                email,
                display_name: name,
            },
            &category_ids,
        )
        .await?;
    tracing::info!(user_id = %user.id, categories = defaults.len(), "user created");

    eprintln!(
        "{} Created user {} with {} default categories",
        "✓".green().bold(),
        user.email.bright_white().bold(),
        defaults.len()
    );
    println!("{}", user.id);
    Ok(())
}
