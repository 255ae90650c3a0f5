use crate::cli::SelectionArgs;
use crate::views::table::display_categories;
use anyhow::{Context, Result};
use owo_colors::OwoColorize;
use uuid::Uuid;
use voxtask_agent::session::parse_identity;
use voxtask_core::repository::Repository;

pub async fn list_categories(repo: &impl Repository, user: Option<String>) -> Result<()> {
    let categories = match user {
        Some(identity) => {
            let user_id = parse_identity(&identity)?;
            repo.find_categories_for_user(user_id).await?
        }
        None => repo.find_categories(None).await?,
    };
    display_categories(&categories);
    Ok(())
}

fn selection_ids(args: &SelectionArgs) -> Result<(Uuid, Uuid)> {
    let user_id = parse_identity(&args.user)?;
    let category_id = Uuid::parse_str(args.category.trim())
        .with_context(|| format!("Invalid category id '{}'", args.category))?;
    Ok((user_id, category_id))
}

pub async fn select_category(repo: &impl Repository, args: SelectionArgs) -> Result<()> {
    let (user_id, category_id) = selection_ids(&args)?;
    repo.select_category(user_id, category_id).await?;
    println!("{} Category selected", "✓".green().bold());
    Ok(())
}

pub async fn deselect_category(repo: &impl Repository, args: SelectionArgs) -> Result<()> {
    let (user_id, category_id) = selection_ids(&args)?;
    repo.deselect_category(user_id, category_id).await?;
    println!("{} Category deselected", "✓".green().bold());
    Ok(())
}
