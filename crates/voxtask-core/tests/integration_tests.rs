use chrono::{Duration, TimeZone, Utc};
use chrono_tz::Tz;
use voxtask_core::db::establish_connection;
use voxtask_core::error::CoreError;
use voxtask_core::models::*;
use voxtask_core::repository::{
    CategoryRepository, SqliteRepository, TaskRepository, UserRepository,
};
use voxtask_core::timezone::local_day_bounds;
use tempfile::TempDir;
use uuid::Uuid;

/// Helper function to create a test database
async fn setup_test_db() -> (SqliteRepository, TempDir) {
    let temp_dir = tempfile::tempdir().expect("Failed to create temp directory");
    let db_path = temp_dir.path().join("test.db");

    let pool = establish_connection(&db_path.to_string_lossy())
        .await
        .expect("Failed to establish test database connection");

    (SqliteRepository::new(pool), temp_dir)
}

/// Helper function to create a test user
async fn create_test_user(repo: &SqliteRepository, email: &str) -> User {
    repo.add_user(NewUserData {
        email: email.to_string(),
        display_name: Some(format!("Test user {}", email)),
    })
    .await
    .expect("Failed to create test user")
}

/// Helper function to create a category owned by `user`
async fn create_test_category(repo: &SqliteRepository, user: &User, name: &str) -> Category {
    repo.add_category(NewCategoryData {
        name: name.to_string(),
        color: Some("#123456".to_string()),
        icon: Some("🧪".to_string()),
        user_id: Some(user.id),
        ..Default::default()
    })
    .await
    .expect("Failed to create test category")
}

/// Helper function to create a task with a due date
async fn create_due_task(
    repo: &SqliteRepository,
    user: &User,
    title: &str,
    due_date: Option<chrono::DateTime<Utc>>,
    is_completed: bool,
) -> Task {
    repo.add_task(NewTaskData {
        title: title.to_string(),
        due_date,
        is_completed,
        user_id: user.id,
        ..Default::default()
    })
    .await
    .expect("Failed to create test task")
}

fn titles(tasks: &[TaskDetails]) -> Vec<&str> {
    tasks.iter().map(|t| t.title.as_str()).collect()
}

#[tokio::test]
async fn test_user_lookup() {
    let (repo, _temp_dir) = setup_test_db().await;

    let user = create_test_user(&repo, "Ada@Example.com").await;
    assert_eq!(user.email, "ada@example.com");
    assert!(user.notifications_enabled);
    assert!(!user.dark_mode);

    let by_id = repo.find_user_by_id(user.id).await.unwrap().unwrap();
    assert_eq!(by_id.email, user.email);
    let by_email = repo.find_user_by_email("ADA@example.com").await.unwrap().unwrap();
    assert_eq!(by_email.id, user.id);

    let duplicate = repo
        .add_user(NewUserData { email: "ada@example.com".into(), display_name: None })
        .await;
    assert!(matches!(duplicate, Err(CoreError::Duplicate(_))));
}

#[tokio::test]
async fn test_category_create_lowercases_and_rejects_duplicates() {
    let (repo, _temp_dir) = setup_test_db().await;
    let ada = create_test_user(&repo, "ada@example.com").await;
    let bob = create_test_user(&repo, "bob@example.com").await;

    let garden = create_test_category(&repo, &ada, "  Garden ").await;
    assert_eq!(garden.name, "garden");
    assert_eq!(garden.user_id, Some(ada.id));
    assert!(!garden.is_default);
    assert_eq!(garden.task_count, 0);

    let again = repo
        .add_category(NewCategoryData {
            name: "GARDEN".to_string(),
            user_id: Some(ada.id),
            ..Default::default()
        })
        .await;
    match again {
        Err(err @ CoreError::Duplicate(_)) => {
            assert_eq!(err.code(), "DUPLICATE_RESOURCE");
            assert_eq!(err.status(), 409);
        }
        other => panic!("Expected duplicate error, got {:?}", other),
    }

    // The same name is free for another user.
    let bobs = create_test_category(&repo, &bob, "garden").await;
    assert_ne!(bobs.id, garden.id);

    let empty = repo
        .add_category(NewCategoryData { name: "  ".into(), user_id: Some(ada.id), ..Default::default() })
        .await;
    assert!(matches!(empty, Err(CoreError::InvalidInput(_))));
}

#[tokio::test]
async fn test_category_owner_must_exist() {
    let (repo, _temp_dir) = setup_test_db().await;

    let orphan = repo
        .add_category(NewCategoryData {
            name: "orphan".into(),
            user_id: Some(Uuid::now_v7()),
            ..Default::default()
        })
        .await;
    assert!(matches!(orphan, Err(CoreError::Reference(_))));
}

#[tokio::test]
async fn test_category_get_update_delete_are_scoped_by_owner() {
    let (repo, _temp_dir) = setup_test_db().await;
    let ada = create_test_user(&repo, "ada@example.com").await;
    let bob = create_test_user(&repo, "bob@example.com").await;
    let category = create_test_category(&repo, &ada, "reading").await;

    let missing = repo.find_category_by_id(Uuid::now_v7()).await;
    assert!(matches!(missing, Err(CoreError::NotFound(_))));

    let forbidden = repo
        .update_category(
            category.id,
            bob.id,
            UpdateCategoryData { color: Some(Some("#000000".into())), ..Default::default() },
        )
        .await;
    assert!(matches!(forbidden, Err(CoreError::Forbidden(_))));
    assert!(matches!(
        repo.delete_category(category.id, bob.id).await,
        Err(CoreError::Forbidden(_))
    ));

    let updated = repo
        .update_category(
            category.id,
            ada.id,
            UpdateCategoryData {
                name: Some("Books".into()),
                icon: Some(None),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.name, "books");
    assert_eq!(updated.icon, None);
    assert_eq!(updated.color.as_deref(), Some("#123456"));

    repo.delete_category(category.id, ada.id).await.unwrap();
    assert!(matches!(
        repo.find_category_by_id(category.id).await,
        Err(CoreError::NotFound(_))
    ));
    assert!(matches!(
        repo.delete_category(category.id, ada.id).await,
        Err(CoreError::NotFound(_))
    ));
}

#[tokio::test]
async fn test_default_categories_are_seeded_once_and_read_only() {
    let (repo, _temp_dir) = setup_test_db().await;
    let ada = create_test_user(&repo, "ada@example.com").await;

    let first = repo.ensure_default_categories().await.unwrap();
    let second = repo.ensure_default_categories().await.unwrap();
    assert_eq!(first.len(), DEFAULT_CATEGORIES.len());
    assert_eq!(second.len(), DEFAULT_CATEGORIES.len());
    assert!(first.iter().all(|c| c.is_default && c.user_id.is_none()));

    let names: Vec<&str> = first.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["health", "personal", "shopping", "uncategorized", "work"]);

    let work = first.iter().find(|c| c.name == "work").unwrap();
    let result = repo
        .update_category(work.id, ada.id, UpdateCategoryData { name: Some("play".into()), ..Default::default() })
        .await;
    assert!(matches!(result, Err(CoreError::Forbidden(_))));
}

#[tokio::test]
async fn test_category_listing() {
    let (repo, _temp_dir) = setup_test_db().await;
    let ada = create_test_user(&repo, "ada@example.com").await;
    let bob = create_test_user(&repo, "bob@example.com").await;
    repo.ensure_default_categories().await.unwrap();

    create_test_category(&repo, &ada, "zoo").await;
    create_test_category(&repo, &ada, "art").await;
    create_test_category(&repo, &bob, "music").await;

    let adas = repo.find_categories(Some(ada.id)).await.unwrap();
    let names: Vec<&str> = adas.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["art", "zoo"]);

    let all = repo.find_categories(None).await.unwrap();
    assert_eq!(all.len(), DEFAULT_CATEGORIES.len() + 3);
    let all_names: Vec<&str> = all.iter().map(|c| c.name.as_str()).collect();
    let mut sorted = all_names.clone();
    sorted.sort();
    assert_eq!(all_names, sorted);
}

#[tokio::test]
async fn test_user_category_selection() {
    let (repo, _temp_dir) = setup_test_db().await;
    let ada = create_test_user(&repo, "ada@example.com").await;
    let bob = create_test_user(&repo, "bob@example.com").await;
    let defaults = repo.ensure_default_categories().await.unwrap();

    assert!(repo.find_categories_for_user(ada.id).await.unwrap().is_empty());

    let work = defaults.iter().find(|c| c.name == "work").unwrap();
    let garden = create_test_category(&repo, &ada, "garden").await;
    repo.select_category(ada.id, work.id).await.unwrap();
    repo.select_category(ada.id, garden.id).await.unwrap();

    let selected = repo.find_categories_for_user(ada.id).await.unwrap();
    let names: Vec<&str> = selected.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["garden", "work"]);

    assert!(matches!(
        repo.select_category(ada.id, work.id).await,
        Err(CoreError::Duplicate(_))
    ));
    assert!(matches!(
        repo.select_category(ada.id, Uuid::now_v7()).await,
        Err(CoreError::Reference(_))
    ));
    assert!(matches!(
        repo.select_category(bob.id, garden.id).await,
        Err(CoreError::Forbidden(_))
    ));

    repo.deselect_category(ada.id, work.id).await.unwrap();
    let selected = repo.find_categories_for_user(ada.id).await.unwrap();
    assert_eq!(selected.len(), 1);
    assert!(matches!(
        repo.deselect_category(ada.id, work.id).await,
        Err(CoreError::NotFound(_))
    ));
}

#[tokio::test]
async fn test_category_for_user_is_selected_with_the_insert() {
    for _ in 0..20 {
        let (repo, _temp_dir) = setup_test_db().await;
        let ada = create_test_user(&repo, "ada@example.com").await;

        let garden = repo
            .add_category_for_user(NewCategoryData {
                name: "Garden".into(),
                color: Some("#228B22".into()),
                icon: Some("🌱".into()),
                user_id: Some(ada.id),
                ..Default::default()
            })
            .await
            .unwrap();

        let selected = repo.find_categories_for_user(ada.id).await.unwrap();
        assert_eq!(selected, vec![garden.clone()]);
        repo.delete_category(garden.id, ada.id).await.unwrap();
    }
}

#[tokio::test]
async fn test_category_for_user_failures_leave_nothing_behind() {
    let (repo, _temp_dir) = setup_test_db().await;
    let ada = create_test_user(&repo, "ada@example.com").await;
    create_test_category(&repo, &ada, "garden").await;

    let duplicate = repo
        .add_category_for_user(NewCategoryData {
            name: "GARDEN".into(),
            user_id: Some(ada.id),
            ..Default::default()
        })
        .await;
    assert!(matches!(duplicate, Err(CoreError::Duplicate(_))));
    assert!(repo.find_categories_for_user(ada.id).await.unwrap().is_empty());

    let ownerless = repo
        .add_category_for_user(NewCategoryData { name: "shared".into(), ..Default::default() })
        .await;
    assert!(matches!(ownerless, Err(CoreError::InvalidInput(_))));
    assert_eq!(repo.find_categories(None).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_user_with_categories_is_all_or_nothing() {
    let (repo, _temp_dir) = setup_test_db().await;
    let defaults = repo.ensure_default_categories().await.unwrap();
    let ids: Vec<Uuid> = defaults.iter().map(|c| c.id).collect();

    let ada = repo
        .add_user_with_categories(
            NewUserData { email: "ada@example.com".into(), display_name: None },
            &ids,
        )
        .await
        .unwrap();
    assert_eq!(repo.find_categories_for_user(ada.id).await.unwrap(), defaults);

    let mut bad_ids = ids.clone();
    bad_ids.push(Uuid::now_v7());
    let failed = repo
        .add_user_with_categories(
            NewUserData { email: "bob@example.com".into(), display_name: None },
            &bad_ids,
        )
        .await;
    assert!(matches!(failed, Err(CoreError::Reference(_))));
    assert!(repo.find_user_by_email("bob@example.com").await.unwrap().is_none());
}

#[tokio::test]
async fn test_task_round_trip_with_category_name() {
    let (repo, _temp_dir) = setup_test_db().await;
    let ada = create_test_user(&repo, "ada@example.com").await;
    let garden = create_test_category(&repo, &ada, "garden").await;

    let task = repo
        .add_task(NewTaskData {
            title: "  Plant tomatoes ".to_string(),
            description: Some("Before the rain".to_string()),
            category_id: Some(garden.id),
            priority: Some(Priority::High),
            user_id: ada.id,
            ..Default::default()
        })
        .await
        .unwrap();

    assert_eq!(task.title, "Plant tomatoes");
    assert_eq!(task.priority, Priority::High);
    assert!(!task.is_completed);
    assert!(!task.is_recurring);
    assert!(task.completed_at.is_none());

    let fetched = repo.find_task_by_id(task.id).await.unwrap().unwrap();
    assert_eq!(fetched.title, "Plant tomatoes");
    assert_eq!(fetched.category_id, Some(garden.id));
    assert_eq!(fetched.category_name.as_deref(), Some("garden"));
    assert_eq!(fetched.priority, Priority::High);
    assert_eq!(fetched.description.as_deref(), Some("Before the rain"));

    let garden = repo.find_category_by_id(garden.id).await.unwrap();
    assert_eq!(garden.task_count, 1);

    assert!(repo.find_task_by_id(Uuid::now_v7()).await.unwrap().is_none());
}

#[tokio::test]
async fn test_task_defaults_and_validation() {
    let (repo, _temp_dir) = setup_test_db().await;
    let ada = create_test_user(&repo, "ada@example.com").await;
    let bob = create_test_user(&repo, "bob@example.com").await;
    let bobs_category = create_test_category(&repo, &bob, "secret").await;

    let task = create_due_task(&repo, &ada, "Call mom", None, false).await;
    assert_eq!(task.priority, Priority::Medium);

    let blank = repo
        .add_task(NewTaskData { title: "   ".into(), user_id: ada.id, ..Default::default() })
        .await;
    assert!(matches!(blank, Err(CoreError::InvalidInput(_))));

    let foreign = repo
        .add_task(NewTaskData {
            title: "Snoop".into(),
            category_id: Some(bobs_category.id),
            user_id: ada.id,
            ..Default::default()
        })
        .await;
    assert!(matches!(foreign, Err(CoreError::Forbidden(_))));

    let dangling = repo
        .add_task(NewTaskData {
            title: "Dangling".into(),
            category_id: Some(Uuid::now_v7()),
            user_id: ada.id,
            ..Default::default()
        })
        .await;
    assert!(matches!(dangling, Err(CoreError::Reference(_))));

    let no_owner = repo
        .add_task(NewTaskData { title: "Ghost".into(), user_id: Uuid::now_v7(), ..Default::default() })
        .await;
    assert!(matches!(no_owner, Err(CoreError::Reference(_))));

    let recurring = repo
        .add_task(NewTaskData {
            title: "Water plants".into(),
            is_recurring: true,
            recurring_frequency: Some(RecurringFrequency::Weekly),
            recurring_interval: Some(2),
            user_id: ada.id,
            ..Default::default()
        })
        .await
        .unwrap();
    assert!(recurring.is_recurring);
    assert_eq!(recurring.recurring_frequency, Some(RecurringFrequency::Weekly));
    assert_eq!(recurring.recurring_interval, Some(2));
}

#[tokio::test]
async fn test_task_update_and_delete_are_scoped_by_owner() {
    let (repo, _temp_dir) = setup_test_db().await;
    let ada = create_test_user(&repo, "ada@example.com").await;
    let bob = create_test_user(&repo, "bob@example.com").await;
    let garden = create_test_category(&repo, &ada, "garden").await;
    let errands = create_test_category(&repo, &ada, "errands").await;

    let task = repo
        .add_task(NewTaskData {
            title: "Buy seeds".into(),
            category_id: Some(garden.id),
            user_id: ada.id,
            ..Default::default()
        })
        .await
        .unwrap();

    let forbidden = repo
        .update_task(task.id, bob.id, UpdateTaskData { title: Some("Mine now".into()), ..Default::default() })
        .await;
    assert!(matches!(forbidden, Err(CoreError::Forbidden(_))));
    assert!(matches!(
        repo.delete_task(task.id, bob.id).await,
        Err(CoreError::Forbidden(_))
    ));

    let updated = repo
        .update_task(
            task.id,
            ada.id,
            UpdateTaskData {
                category_id: Some(Some(errands.id)),
                priority: Some(Priority::Low),
                is_completed: Some(true),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.category_id, Some(errands.id));
    assert_eq!(updated.priority, Priority::Low);
    assert!(updated.is_completed);
    assert!(updated.completed_at.is_some());
    assert_eq!(repo.find_category_by_id(garden.id).await.unwrap().task_count, 0);
    assert_eq!(repo.find_category_by_id(errands.id).await.unwrap().task_count, 1);

    let reopened = repo
        .update_task(task.id, ada.id, UpdateTaskData { is_completed: Some(false), ..Default::default() })
        .await
        .unwrap();
    assert!(!reopened.is_completed);
    assert!(reopened.completed_at.is_none());

    repo.delete_task(task.id, ada.id).await.unwrap();
    assert!(repo.find_task_by_id(task.id).await.unwrap().is_none());
    assert_eq!(repo.find_category_by_id(errands.id).await.unwrap().task_count, 0);
    assert!(matches!(
        repo.delete_task(task.id, ada.id).await,
        Err(CoreError::NotFound(_))
    ));
}

#[tokio::test]
async fn test_task_listing_is_scoped_and_newest_first() {
    let (repo, _temp_dir) = setup_test_db().await;
    let ada = create_test_user(&repo, "ada@example.com").await;
    let bob = create_test_user(&repo, "bob@example.com").await;

    create_due_task(&repo, &ada, "First", None, false).await;
    create_due_task(&repo, &ada, "Second", None, false).await;
    create_due_task(&repo, &ada, "Third", None, false).await;
    create_due_task(&repo, &bob, "Bob's", None, false).await;

    let tasks = repo.find_tasks(ada.id, &TaskFilter::default()).await.unwrap();
    assert_eq!(titles(&tasks), vec!["Third", "Second", "First"]);

    let oldest_first = TaskFilter { order: TaskOrder::CreatedAsc, ..Default::default() };
    let tasks = repo.find_tasks(ada.id, &oldest_first).await.unwrap();
    assert_eq!(titles(&tasks), vec!["First", "Second", "Third"]);
}

#[tokio::test]
async fn test_task_listing_filters() {
    let (repo, _temp_dir) = setup_test_db().await;
    let ada = create_test_user(&repo, "ada@example.com").await;
    let garden = create_test_category(&repo, &ada, "garden").await;
    let now = Utc::now();

    repo.add_task(NewTaskData {
        title: "Weed beds".into(),
        category_id: Some(garden.id),
        priority: Some(Priority::High),
        due_date: Some(now + Duration::days(2)),
        user_id: ada.id,
        ..Default::default()
    })
    .await
    .unwrap();
    repo.add_task(NewTaskData {
        title: "Pay rent".into(),
        priority: Some(Priority::High),
        due_date: Some(now + Duration::days(10)),
        is_completed: true,
        user_id: ada.id,
        ..Default::default()
    })
    .await
    .unwrap();
    repo.add_task(NewTaskData {
        title: "Read novel".into(),
        priority: Some(Priority::Low),
        user_id: ada.id,
        ..Default::default()
    })
    .await
    .unwrap();

    let by_category_id = TaskFilter { category: Some(CategoryRef::Id(garden.id)), ..Default::default() };
    assert_eq!(titles(&repo.find_tasks(ada.id, &by_category_id).await.unwrap()), vec!["Weed beds"]);

    let by_category_name = TaskFilter { category: Some(CategoryRef::Name("Garden".into())), ..Default::default() };
    assert_eq!(titles(&repo.find_tasks(ada.id, &by_category_name).await.unwrap()), vec!["Weed beds"]);

    let high = TaskFilter { priority: Some(Priority::High), ..Default::default() };
    assert_eq!(repo.find_tasks(ada.id, &high).await.unwrap().len(), 2);

    let high_pending = TaskFilter { priority: Some(Priority::High), completed: Some(false), ..Default::default() };
    assert_eq!(titles(&repo.find_tasks(ada.id, &high_pending).await.unwrap()), vec!["Weed beds"]);

    let completed = TaskFilter { completed: Some(true), ..Default::default() };
    assert_eq!(titles(&repo.find_tasks(ada.id, &completed).await.unwrap()), vec!["Pay rent"]);

    let before = TaskFilter { due_before: Some(now + Duration::days(5)), ..Default::default() };
    assert_eq!(titles(&repo.find_tasks(ada.id, &before).await.unwrap()), vec!["Weed beds"]);

    let after = TaskFilter { due_after: Some(now + Duration::days(5)), ..Default::default() };
    assert_eq!(titles(&repo.find_tasks(ada.id, &after).await.unwrap()), vec!["Pay rent"]);

    let by_due = TaskFilter { order: TaskOrder::DueAsc, ..Default::default() };
    assert_eq!(
        titles(&repo.find_tasks(ada.id, &by_due).await.unwrap()),
        vec!["Weed beds", "Pay rent", "Read novel"]
    );
}

#[tokio::test]
async fn test_due_today_is_a_half_open_local_day() {
    let (repo, _temp_dir) = setup_test_db().await;
    let ada = create_test_user(&repo, "ada@example.com").await;
    let tz: Tz = "America/New_York".parse().unwrap();
    let now = Utc.with_ymd_and_hms(2025, 6, 10, 16, 0, 0).unwrap();
    let (start, end) = local_day_bounds(now, &tz);

    create_due_task(&repo, &ada, "At midnight", Some(start), false).await;
    create_due_task(&repo, &ada, "Last second", Some(end - Duration::seconds(1)), false).await;
    create_due_task(&repo, &ada, "Next midnight", Some(end), false).await;
    create_due_task(&repo, &ada, "Yesterday", Some(start - Duration::seconds(1)), false).await;
    create_due_task(&repo, &ada, "Undated", None, false).await;

    let filter = TaskFilter { due_today: true, ..TaskFilter::at(now, tz) };
    let tasks = repo.find_tasks(ada.id, &filter).await.unwrap();
    assert_eq!(titles(&tasks), vec!["Last second", "At midnight"]);
    assert!(tasks
        .iter()
        .all(|t| t.due_date.map_or(false, |d| d >= start && d < end)));
}

#[tokio::test]
async fn test_overdue_only_includes_incomplete_past_tasks() {
    let (repo, _temp_dir) = setup_test_db().await;
    let ada = create_test_user(&repo, "ada@example.com").await;
    let now = Utc.with_ymd_and_hms(2025, 6, 10, 16, 0, 0).unwrap();

    create_due_task(&repo, &ada, "Late", Some(now - Duration::hours(1)), false).await;
    create_due_task(&repo, &ada, "Late but done", Some(now - Duration::hours(1)), true).await;
    create_due_task(&repo, &ada, "Exactly now", Some(now), false).await;
    create_due_task(&repo, &ada, "Upcoming", Some(now + Duration::hours(1)), false).await;
    create_due_task(&repo, &ada, "Undated", None, false).await;

    let filter = TaskFilter { overdue: true, ..TaskFilter::at(now, Tz::UTC) };
    let tasks = repo.find_tasks(ada.id, &filter).await.unwrap();
    assert_eq!(titles(&tasks), vec!["Late"]);
}
