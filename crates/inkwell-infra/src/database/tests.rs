#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult, Value};
    use uuid::Uuid;

    use crate::database::entity::{category, post, user};
    use crate::database::postgres_repo::{
        PostgresCategoryRepository, PostgresPostRepository, PostgresUserRepository,
    };
    use inkwell_core::domain::{Category, PageRequest, Post, PostQuery};
    use inkwell_core::error::RepoError;
    use inkwell_core::ports::{
        BaseRepository, CategoryRepository, PostRepository, UserRepository,
    };

    fn post_model(id: Uuid, author_id: Uuid) -> post::Model {
        let now = Utc::now();
        post::Model {
            id,
            title: "Test Post".to_owned(),
            text: "Body".to_owned(),
            pub_date: now.into(),
            is_published: true,
            created_at: now.into(),
            author_id,
            location_id: None,
            category_id: None,
        }
    }

    #[tokio::test]
    async fn test_find_post_by_id() {
        let post_id = Uuid::new_v4();
        let author_id = Uuid::new_v4();

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results(vec![vec![post_model(post_id, author_id)]])
            .into_connection();

        let repo = PostgresPostRepository::new(db);

        let result: Option<Post> = repo.find_by_id(post_id).await.unwrap();

        let post = result.expect("post should be found");
        assert_eq!(post.title, "Test Post");
        assert_eq!(post.author_id, author_id);
        assert_eq!(post.category_id, None);
    }

    #[tokio::test]
    async fn test_find_user_by_username() {
        let now = Utc::now();
        let id = Uuid::new_v4();

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results(vec![vec![user::Model {
                id,
                username: "writer".to_owned(),
                email: "writer@example.com".to_owned(),
                first_name: "Ada".to_owned(),
                last_name: String::new(),
                password_hash: "hash".to_owned(),
                is_staff: true,
                created_at: now.into(),
                updated_at: now.into(),
            }]])
            .into_connection();

        let repo = PostgresUserRepository::new(db);

        let user = repo.find_by_username("writer").await.unwrap().unwrap();
        assert_eq!(user.id, id);
        assert!(user.is_staff);
        assert_eq!(user.first_name, "Ada");
    }

    #[tokio::test]
    async fn test_find_missing_category_by_slug() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results(vec![Vec::<category::Model>::new()])
            .into_connection();

        let repo = PostgresCategoryRepository::new(db);

        assert!(repo.find_by_slug("nowhere").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_insert_category_returns_stored_row() {
        let category = Category::new(
            "Travel".to_owned(),
            "Trips".to_owned(),
            "travel".to_owned(),
        );

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results(vec![vec![category::Model {
                id: category.id,
                title: category.title.clone(),
                description: category.description.clone(),
                slug: category.slug.clone(),
                is_published: true,
                created_at: category.created_at.into(),
            }]])
            .into_connection();

        let repo = PostgresCategoryRepository::new(db);

        let saved = repo.insert(category.clone()).await.unwrap();
        assert_eq!(saved.id, category.id);
        assert_eq!(saved.slug, "travel");
    }

    #[tokio::test]
    async fn test_list_past_last_page_skips_fetch() {
        // Only the count query has a result; fetching a page would fail.
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results(vec![vec![BTreeMap::from([(
                "num_items",
                Value::from(3i64),
            )])]])
            .into_connection();

        let repo = PostgresPostRepository::new(db);

        let page = repo
            .list(PostQuery::default(), PageRequest::new(u64::MAX, 10))
            .await
            .unwrap();
        assert!(page.is_out_of_range());
        assert!(page.items.is_empty());
        assert_eq!(page.total_items, 3);
    }

    #[tokio::test]
    async fn test_delete_missing_post_is_not_found() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_results(vec![MockExecResult {
                last_insert_id: 0,
                rows_affected: 0,
            }])
            .into_connection();

        let repo = PostgresPostRepository::new(db);

        let result = BaseRepository::<Post, Uuid>::delete(&repo, Uuid::new_v4()).await;
        assert!(matches!(result, Err(RepoError::NotFound)));
    }
}
