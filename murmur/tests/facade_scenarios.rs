use std::time::Duration;

use murmur::{
    ErrorKind, Facade, MemoryStore, ServiceError, SortOrder, TokenSigner,
    api::{Response, UserView},
    id::generate_entity_id,
};
use serde_json::json;

fn facade() -> Facade<MemoryStore> {
    let signer = TokenSigner::new(b"scenario-secret".to_vec(), Duration::from_secs(3600));
    Facade::new(MemoryStore::new(), signer)
}

async fn account(facade: &Facade<MemoryStore>, username: &str) -> (String, UserView) {
    let token = facade
        .register(username, &format!("{username}@example.com"), "secret1")
        .await
        .expect("register")
        .token;
    let user = facade.whoami(&token).await.expect("whoami").expect("authenticated");
    (token, user)
}

#[tokio::test]
async fn publish_returns_unliked_post_by_caller() {
    let facade = facade();
    let (token, alice) = account(&facade, "alice").await;

    let post = facade.publish_post("Hello", "first post", &token).await.unwrap();
    assert_eq!(post.author, alice.id);
    assert_eq!(post.like_count, 0);
    assert!(post.liked_by.is_empty());

    let fetched = facade.get_post(&post.id).await.unwrap().expect("stored");
    assert_eq!(fetched, post);
}

#[tokio::test]
async fn anonymous_like_is_rejected_without_mutation() {
    let facade = facade();
    let (token, _) = account(&facade, "alice").await;
    let post = facade.publish_post("Hello", "body", &token).await.unwrap();

    for credential in ["", "not-a-token"] {
        let err = facade.like_post(&post.id, credential).await.expect_err("anonymous");
        assert!(matches!(err, ServiceError::AuthenticationRequired));
        assert_eq!(err.to_string(), "Please login");
    }
    let post = facade.get_post(&post.id).await.unwrap().unwrap();
    assert_eq!(post.like_count, 0);
}

#[tokio::test]
async fn liking_twice_restores_like_count() {
    let facade = facade();
    let (alice_token, _) = account(&facade, "alice").await;
    let (bob_token, bob) = account(&facade, "bob").await;
    let post = facade.publish_post("Hello", "body", &alice_token).await.unwrap();

    let liked = facade.like_post(&post.id, &bob_token).await.unwrap();
    assert_eq!(liked.like_count, 1);
    assert_eq!(liked.liked_by, vec![bob.id.clone()]);

    let likers = facade.get_post_likers(&post.id).await.unwrap();
    assert_eq!(likers.into_iter().map(|u| u.username).collect::<Vec<_>>(), vec!["bob"]);

    let unliked = facade.like_post(&post.id, &bob_token).await.unwrap();
    assert_eq!(unliked.like_count, 0);
}

#[tokio::test]
async fn like_unknown_post_reports_not_found() {
    let facade = facade();
    let (token, _) = account(&facade, "alice").await;
    let err = facade.like_post(&generate_entity_id(), &token).await.expect_err("missing");
    assert_eq!(err.to_string(), "Post not found");
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[tokio::test]
async fn get_posts_pages_by_insertion_order() {
    let facade = facade();
    let (token, _) = account(&facade, "alice").await;
    for title in ["P1", "P2", "P3"] {
        facade.publish_post(title, "body", &token).await.unwrap();
    }
    let titles = |posts: Vec<murmur::PostView>| posts.into_iter().map(|p| p.title).collect::<Vec<_>>();

    let page = facade.get_posts(1, Some(2), Some(SortOrder::Asc)).await.unwrap();
    assert_eq!(titles(page), vec!["P2"]);

    let newest = facade.get_posts(2, None, None).await.unwrap();
    assert_eq!(titles(newest), vec!["P3", "P2"]);

    let clamped = facade.get_posts(2, Some(-3), Some(SortOrder::Asc)).await.unwrap();
    assert_eq!(titles(clamped), vec!["P1", "P2"]);

    assert!(facade.get_posts(0, Some(1), None).await.unwrap().is_empty());
    assert!(facade.get_posts(5, Some(4), None).await.unwrap().is_empty());
    assert!(facade.get_posts(10, Some(i64::MAX), None).await.unwrap().is_empty());

    assert_eq!(facade.count_pages(2).await.unwrap(), 2);
    let err = facade.count_pages(0).await.expect_err("zero page size");
    assert_eq!(err.kind(), ErrorKind::Validation);
}

#[tokio::test]
async fn follow_is_idempotent_and_counts_both_sides() {
    let facade = facade();
    let (alice_token, alice) = account(&facade, "alice").await;
    let (_, bob) = account(&facade, "bob").await;

    facade.follow_user(&bob.id, &alice_token).await.unwrap();
    let alice_view = facade.follow_user(&bob.id, &alice_token).await.unwrap();
    assert_eq!(alice_view.following, vec![bob.id.clone()]);
    assert_eq!(alice_view.following_count, 1);

    let bob_view = facade.get_user(&bob.id).await.unwrap().unwrap();
    assert_eq!(bob_view.follower_count, 1);

    let followers = facade.get_followers(&bob.id).await.unwrap();
    assert_eq!(followers.into_iter().map(|u| u.id).collect::<Vec<_>>(), vec![alice.id.clone()]);
    let following = facade.get_following(&alice.id).await.unwrap();
    assert_eq!(following.into_iter().map(|u| u.id).collect::<Vec<_>>(), vec![bob.id.clone()]);

    let alice_view = facade.unfollow_user(&bob.id, &alice_token).await.unwrap();
    assert!(alice_view.following.is_empty());
    let alice_view = facade.unfollow_user(&bob.id, &alice_token).await.unwrap();
    assert_eq!(alice_view.following_count, 0);
    assert_eq!(facade.get_user(&bob.id).await.unwrap().unwrap().follower_count, 0);
}

#[tokio::test]
async fn self_follow_is_rejected() {
    let facade = facade();
    let (token, alice) = account(&facade, "alice").await;
    let err = facade.follow_user(&alice.id, &token).await.expect_err("self follow");
    assert_eq!(err.to_string(), "You cannot follow yourself");
    assert_eq!(facade.get_user(&alice.id).await.unwrap().unwrap().following_count, 0);

    let (_, bob) = account(&facade, "bob").await;
    facade.follow_user(&bob.id, &token).await.unwrap();
    let err = facade.follow_user(&alice.id, &token).await.expect_err("self follow while following");
    assert_eq!(err.kind(), ErrorKind::Validation);
    let alice = facade.get_user(&alice.id).await.unwrap().unwrap();
    assert_eq!(alice.following, vec![bob.id]);
}

#[tokio::test]
async fn registration_and_login_errors() {
    let facade = facade();
    account(&facade, "alice").await;

    let err = facade.register("alice", "a2@example.com", "secret1").await.expect_err("taken");
    assert_eq!(err.to_string(), "Username already taken");

    let err = facade.login("nobody", "secret1").await.expect_err("unknown");
    assert_eq!(err.to_string(), "User not found");

    let err = facade.login("alice", "wrong-password").await.expect_err("mismatch");
    assert_eq!(err.to_string(), "Credentials not match");

    let token = facade.login("alice", "secret1").await.unwrap().token;
    assert!(facade.whoami(&format!("Bearer {token}")).await.unwrap().is_some());
}

#[tokio::test]
async fn registration_accepts_short_username_and_password() {
    let facade = facade();
    let token = facade.register("al", "al@example.com", "pw").await.unwrap().token;
    let al = facade.whoami(&token).await.unwrap().expect("authenticated");
    assert_eq!(al.username, "al");
    assert!(facade.login("al", "pw").await.is_ok());

    let err = facade.register("bo", "not-an-email", "pw").await.expect_err("bad email");
    assert_eq!(err.kind(), ErrorKind::Validation);
}

#[tokio::test]
async fn empty_title_is_published() {
    let facade = facade();
    let (token, alice) = account(&facade, "alice").await;
    let post = facade.publish_post("", "C", &token).await.unwrap();
    assert_eq!(post.title, "");
    assert_eq!(post.author, alice.id);
}

#[tokio::test]
async fn post_author_resolves_to_user() {
    let facade = facade();
    let (token, alice) = account(&facade, "alice").await;
    let post = facade.publish_post("Hello", "body", &token).await.unwrap();

    let author = facade.get_post_author(&post.id).await.unwrap();
    assert_eq!(author.id, alice.id);
    assert_eq!(author.post_count, 1);

    let err = facade.get_post_author(&generate_entity_id()).await.expect_err("unknown post");
    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert_eq!(err.to_string(), "Post not found");

    let response = facade
        .dispatch_json(&json!({"op": "getPostAuthor", "postId": post.id}).to_string())
        .await;
    let Response::Data(data) = response else {
        panic!("getPostAuthor failed");
    };
    assert_eq!(data["username"], "alice");
}

#[tokio::test]
async fn user_posts_and_counts() {
    let facade = facade();
    let (token, alice) = account(&facade, "alice").await;
    facade.publish_post("A1", "body", &token).await.unwrap();
    facade.publish_post("A2", "body", &token).await.unwrap();

    let posts = facade.get_user_posts(&alice.id).await.unwrap();
    assert_eq!(posts.into_iter().map(|p| p.title).collect::<Vec<_>>(), vec!["A1", "A2"]);
    assert_eq!(facade.get_user(&alice.id).await.unwrap().unwrap().post_count, 2);
    assert!(facade.get_user(&generate_entity_id()).await.unwrap().is_none());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_likes_are_never_lost() {
    let facade = facade();
    let (author_token, _) = account(&facade, "author").await;
    let post = facade.publish_post("Popular", "body", &author_token).await.unwrap();

    let mut tokens = Vec::new();
    for i in 0..8 {
        tokens.push(account(&facade, &format!("fan{i}")).await.0);
    }

    let mut handles = Vec::new();
    for token in tokens {
        let facade = facade.clone();
        let post_id = post.id.clone();
        handles.push(tokio::spawn(async move { facade.like_post(&post_id, &token).await.map(|_| ()) }));
    }
    for handle in handles {
        handle.await.expect("join").expect("like");
    }

    let post = facade.get_post(&post.id).await.unwrap().unwrap();
    assert_eq!(post.like_count, 8);
}

#[tokio::test]
async fn envelope_dispatch_round_trip() {
    let facade = facade();
    let response = facade
        .dispatch_json(r#"{"op":"register","username":"alice","email":"alice@example.com","password":"secret1"}"#)
        .await;
    let Response::Data(data) = response else {
        panic!("register failed");
    };
    let token = data["token"].as_str().expect("token").to_string();

    let publish = json!({"op": "publishPost", "title": "Hello", "content": "body", "authorization": format!("Bearer {token}")});
    let Response::Data(post) = facade.dispatch_json(&publish.to_string()).await else {
        panic!("publish failed");
    };
    assert_eq!(post["like_count"], 0);

    let like = json!({"op": "likePost", "postId": post["id"]});
    let response = serde_json::to_value(facade.dispatch_json(&like.to_string()).await).unwrap();
    assert_eq!(
        response,
        json!({"error": {"kind": "authentication_required", "message": "Please login"}})
    );

    let listing = facade.dispatch_json(r#"{"op":"getPosts","first":10,"order":"asc"}"#).await;
    let Response::Data(posts) = listing else {
        panic!("listing failed");
    };
    assert_eq!(posts.as_array().map(Vec::len), Some(1));

    assert!(facade.dispatch_json("{not json").await.is_error());
    let missing = facade.dispatch_json(&json!({"op": "getPost", "id": generate_entity_id()}).to_string()).await;
    assert!(matches!(missing, Response::Data(serde_json::Value::Null)));
}
