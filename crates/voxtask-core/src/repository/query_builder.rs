use crate::models::{CategoryRef, TaskFilter, TaskOrder};
use crate::timezone::local_day_bounds;
use sqlx::{QueryBuilder, Sqlite};
use uuid::Uuid;

/// Columns selected for [`crate::models::TaskDetails`].
pub(crate) const TASK_DETAILS_SELECT: &str = r#"SELECT
    t.id, t.title, t.description, t.category_id, c.name AS category_name,
    t.priority, t.is_completed, t.completed_at, t.is_recurring,
    t.recurring_frequency, t.recurring_interval, t.due_date, t.user_id,
    t.created_at, t.updated_at
FROM tasks t
LEFT JOIN categories c ON t.category_id = c.id
"#;

/// Utility functions for building SQL queries from a [`TaskFilter`]
pub struct SqlQueryBuilder;

impl SqlQueryBuilder {
    /// Build the full task listing query for one user.
    pub fn build_task_listing<'a>(user_id: Uuid, filter: &TaskFilter) -> QueryBuilder<'a, Sqlite> {
        let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new(TASK_DETAILS_SELECT);
        qb.push(" WHERE t.user_id = ");
        qb.push_bind(user_id);
        Self::build_filter_clauses(filter, &mut qb);
        Self::build_order_clause(filter.order, &mut qb);
        qb
    }

    /// Append one ` AND ...` clause per active filter.
    pub fn build_filter_clauses(filter: &TaskFilter, qb: &mut QueryBuilder<'_, Sqlite>) {
        if let Some(completed) = filter.completed {
            qb.push(" AND t.is_completed = ");
            qb.push_bind(completed);
        }

        match &filter.category {
            Some(CategoryRef::Id(id)) => {
                qb.push(" AND t.category_id = ");
                qb.push_bind(*id);
            }
            Some(CategoryRef::Name(name)) => {
                qb.push(" AND c.name = ");
                qb.push_bind(name.to_lowercase());
            }
            None => {}
        }

        if let Some(priority) = filter.priority {
            qb.push(" AND t.priority = ");
            qb.push_bind(priority);
        }

        if let Some(before) = filter.due_before {
            qb.push(" AND t.due_date < ");
            qb.push_bind(before);
        }

        if let Some(after) = filter.due_after {
            qb.push(" AND t.due_date > ");
            qb.push_bind(after);
        }

        if filter.due_today {
            let (start, end) = local_day_bounds(filter.now, &filter.timezone);
            qb.push(" AND t.due_date >= ");
            qb.push_bind(start);
            qb.push(" AND t.due_date < ");
            qb.push_bind(end);
        }

        if filter.overdue {
            qb.push(" AND t.due_date < ");
            qb.push_bind(filter.now);
            qb.push(" AND t.is_completed = 0");
        }
    }

    fn build_order_clause(order: TaskOrder, qb: &mut QueryBuilder<'_, Sqlite>) {
        match order {
            TaskOrder::CreatedDesc => qb.push(" ORDER BY t.created_at DESC, t.id DESC"),
            TaskOrder::CreatedAsc => qb.push(" ORDER BY t.created_at ASC, t.id ASC"),
            TaskOrder::DueAsc => {
                qb.push(" ORDER BY t.due_date IS NULL, t.due_date ASC, t.created_at DESC")
            }
            TaskOrder::PriorityDesc => qb.push(
                " ORDER BY CASE t.priority WHEN 'high' THEN 0 WHEN 'medium' THEN 1 ELSE 2 END, t.created_at DESC",
            ),
        };
    }
}
