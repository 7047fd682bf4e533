use super::support::*;
use murmur::pagination::{SortOrder, Window, compute_window};

#[tokio::test]
#[serial]
#[ignore = "requires a Redis Stack server (REDIS_URL)"]
async fn insert_assigns_sequence_and_claims_username() {
    let ns = TestNamespace::unique().await;
    let store = &ns.store;

    let alice = store.insert(user("alice")).await.expect("alice");
    let bob = store.insert(user("bob")).await.expect("bob");
    assert_eq!((alice.seq, bob.seq), (1, 2));
    assert_eq!(store.count::<User>().await.unwrap(), 2);

    let err = store.insert(user("ALICE")).await.expect_err("duplicate username");
    assert!(matches!(
        err,
        RepoError::UniqueConstraintViolation { ref existing_entity_id, .. } if *existing_entity_id == alice.id
    ));
    assert_eq!(store.count::<User>().await.unwrap(), 2);

    let found: Option<User> = store.find_by_unique("username", "Alice").await.unwrap();
    assert_eq!(found, Some(alice.clone()));
    let missing: Option<User> = store.find_by_id(&generate_entity_id()).await.unwrap();
    assert!(missing.is_none());

    let many: Vec<User> = store
        .find_many(&[bob.id.clone(), generate_entity_id(), alice.id.clone()])
        .await
        .unwrap();
    assert_eq!(many.into_iter().map(|u| u.username).collect::<Vec<_>>(), vec!["bob", "alice"]);

    ns.finish().await;
}

#[tokio::test]
#[serial]
#[ignore = "requires a Redis Stack server (REDIS_URL)"]
async fn post_insert_checks_author_reference() {
    let ns = TestNamespace::unique().await;
    let store = &ns.store;

    let err = store.insert(post(&generate_entity_id(), "orphan")).await.expect_err("no author");
    assert!(matches!(err, RepoError::ReferenceNotFound { ref field, .. } if field == "author"));
    assert_eq!(store.count::<Post>().await.unwrap(), 0);

    let alice = store.insert(user("alice")).await.unwrap();
    let post = store.insert(post(&alice.id, "hello")).await.unwrap();
    assert_eq!(post.seq, 1);
    assert_eq!(store.count_where_contains::<Post>(Post::AUTHOR, &alice.id).await.unwrap(), 1);

    ns.finish().await;
}

#[tokio::test]
#[serial]
#[ignore = "requires a Redis Stack server (REDIS_URL)"]
async fn toggle_like_is_atomic_and_reversible() {
    let ns = TestNamespace::unique().await;
    let store = &ns.store;
    let alice = store.insert(user("alice")).await.unwrap();
    let bob = store.insert(user("bob")).await.unwrap();
    let post = store.insert(post(&alice.id, "hello")).await.unwrap();

    let liked: Post = store
        .update_set_field(&post.id, Post::LIKED_BY, SetOperation::toggle(bob.id.clone()))
        .await
        .unwrap()
        .expect("post exists");
    assert_eq!(liked.liked_by, vec![bob.id.clone()]);

    let unliked: Post = store
        .update_set_field(&post.id, Post::LIKED_BY, SetOperation::toggle(bob.id.clone()))
        .await
        .unwrap()
        .expect("post exists");
    assert!(unliked.liked_by.is_empty());

    let reread: Post = store.find_by_id(&post.id).await.unwrap().unwrap();
    assert!(reread.liked_by.is_empty());

    let missing: Option<Post> = store
        .update_set_field(&generate_entity_id(), Post::LIKED_BY, SetOperation::toggle(bob.id.clone()))
        .await
        .unwrap();
    assert!(missing.is_none());

    ns.finish().await;
}

#[tokio::test]
#[serial]
#[ignore = "requires a Redis Stack server (REDIS_URL)"]
async fn concurrent_toggles_by_distinct_users_all_land() {
    let ns = TestNamespace::unique().await;
    let alice = ns.store.insert(user("alice")).await.unwrap();
    let post = ns.store.insert(post(&alice.id, "hello")).await.unwrap();

    let likers: Vec<String> = (0..16).map(|_| generate_entity_id()).collect();
    let mut handles = Vec::new();
    for liker in &likers {
        let store = ns.store.clone();
        let post_id = post.id.clone();
        let liker = liker.clone();
        handles.push(tokio::spawn(async move {
            store
                .update_set_field::<Post>(&post_id, Post::LIKED_BY, SetOperation::toggle(liker))
                .await
        }));
    }
    for handle in handles {
        handle.await.expect("join").expect("toggle");
    }

    let post: Post = ns.store.find_by_id(&post.id).await.unwrap().unwrap();
    assert_eq!(post.like_count(), 16);
    ns.finish().await;
}

#[tokio::test]
#[serial]
#[ignore = "requires a Redis Stack server (REDIS_URL)"]
async fn following_maintains_reverse_index() {
    let ns = TestNamespace::unique().await;
    let store = &ns.store;
    let alice = store.insert(user("alice")).await.unwrap();
    let bob = store.insert(user("bob")).await.unwrap();
    let carol = store.insert(user("carol")).await.unwrap();

    for follower in [&carol, &bob] {
        let operation = SetOperation::Insert {
            value: alice.id.clone(),
            strip: vec![follower.id.clone(), alice.id.clone()],
        };
        store.update_set_field::<User>(&follower.id, User::FOLLOWING, operation).await.unwrap();
    }

    let followers: Vec<User> = store.find_where_array_contains(User::FOLLOWING, &alice.id).await.unwrap();
    assert_eq!(followers.into_iter().map(|u| u.username).collect::<Vec<_>>(), vec!["bob", "carol"]);
    assert_eq!(store.count_where_contains::<User>(User::FOLLOWING, &alice.id).await.unwrap(), 2);

    let operation = SetOperation::Remove {
        values: vec![bob.id.clone(), alice.id.clone()],
    };
    let bob: User = store
        .update_set_field(&bob.id, User::FOLLOWING, operation)
        .await
        .unwrap()
        .unwrap();
    assert!(bob.following.is_empty());
    assert_eq!(store.count_where_contains::<User>(User::FOLLOWING, &alice.id).await.unwrap(), 1);

    ns.finish().await;
}

#[tokio::test]
#[serial]
#[ignore = "requires a Redis Stack server (REDIS_URL)"]
async fn listing_respects_window_and_order() {
    let ns = TestNamespace::unique().await;
    let store = &ns.store;
    let alice = store.insert(user("alice")).await.unwrap();
    for title in ["P1", "P2", "P3"] {
        store.insert(post(&alice.id, title)).await.unwrap();
    }
    let titles = |posts: Vec<Post>| posts.into_iter().map(|p| p.title).collect::<Vec<_>>();

    let page = store.list_paginated::<Post>(&compute_window(1, 2, SortOrder::Asc)).await.unwrap();
    assert_eq!(titles(page), vec!["P2"]);
    let page = store.list_paginated::<Post>(&compute_window(2, 1, SortOrder::Desc)).await.unwrap();
    assert_eq!(titles(page), vec!["P3", "P2"]);
    let page = store.list_paginated::<Post>(&compute_window(0, 1, SortOrder::Desc)).await.unwrap();
    assert!(page.is_empty());
    let page = store.list_paginated::<Post>(&compute_window(10, i64::MAX, SortOrder::Desc)).await.unwrap();
    assert!(page.is_empty());
    let page = store
        .list_paginated::<Post>(&Window {
            skip: 1,
            limit: u64::MAX,
            order: SortOrder::Asc,
        })
        .await
        .unwrap();
    assert_eq!(titles(page), vec!["P2", "P3"]);

    let removed = store.purge().await.unwrap();
    assert!(removed > 0);
    assert_eq!(store.count::<Post>().await.unwrap(), 0);
}
