mod common;

use std::time::Duration;

use axum::http::StatusCode;
use chrono::Utc;
use common::test_app;
use quire::db::{groups, posts, users};

#[tokio::test]
async fn global_feed_lists_newest_first() {
    let app = test_app();
    let alice = app.user("alice");
    let now = Utc::now();
    app.post_at(&alice, "Older words", None, now - chrono::Duration::minutes(5));
    app.post_at(&alice, "Fresh words", None, now);

    let response = app.get("/", None).await;
    assert_eq!(response.status, StatusCode::OK);

    let fresh = response.body.find("Fresh words").expect("newest post shown");
    let older = response.body.find("Older words").expect("older post shown");
    assert!(fresh < older, "newest post must come first");
}

#[tokio::test]
async fn empty_global_feed_still_renders() {
    let app = test_app();
    let response = app.get("/", None).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.card_count(), 0);
    assert!(response.body.contains("No posts yet."));
}

#[tokio::test]
async fn group_feed_shows_only_its_posts() {
    let app = test_app();
    let alice = app.user("alice");
    let cats = app.group("cats", "Cats");
    let dogs = app.group("dogs", "Dogs");
    let now = Utc::now();
    app.post_at(&alice, "Purring", Some(&cats), now);
    app.post_at(&alice, "Barking", Some(&dogs), now);
    app.post_at(&alice, "Ungrouped", None, now);

    let response = app.get("/group/cats/", None).await;
    assert_eq!(response.status, StatusCode::OK);
    assert!(response.body.contains("Purring"));
    assert!(!response.body.contains("Barking"));
    assert!(!response.body.contains("Ungrouped"));
    assert_eq!(response.card_count(), 1);
}

#[tokio::test]
async fn unknown_group_is_404() {
    let app = test_app();
    let response = app.get("/group/nope/", None).await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn deleted_group_keeps_posts_in_global_feed() {
    let app = test_app();
    let alice = app.user("alice");
    let cats = app.group("cats", "Cats");
    app.post_at(&alice, "Orphaned", Some(&cats), Utc::now());

    {
        let conn = app.state.db.get().unwrap();
        assert!(groups::delete_group(&conn, &cats).unwrap());
    }

    assert_eq!(app.get("/group/cats/", None).await.status, StatusCode::NOT_FOUND);
    let response = app.get("/", None).await;
    assert!(response.body.contains("Orphaned"));
}

#[tokio::test]
async fn profile_feed_and_counters() {
    let app = test_app();
    let alice = app.user("alice");
    let bob = app.user("bob");
    app.posts(&alice, 3, "Alice note");
    app.posts(&bob, 1, "Bob note");
    app.state.follows.follow(&bob, &alice).await.unwrap();

    let response = app.get("/alice/", None).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.card_count(), 3);
    assert!(!response.body.contains("Bob note"));
    assert!(response.body.contains("Posts: 3"));
    assert!(response.body.contains("Followers: 1"));
    assert!(response.body.contains("Following: 0"));
}

#[tokio::test]
async fn unknown_profile_is_404() {
    let app = test_app();
    assert_eq!(app.get("/ghost/", None).await.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn profile_shows_follow_state_to_viewer() {
    let app = test_app();
    let alice = app.user("alice");
    let bob = app.user("bob");
    let cookie = app.login(&bob);

    let before = app.get("/alice/", Some(&cookie)).await;
    assert!(before.body.contains(">Follow</a>"));

    app.state.follows.follow(&bob, &alice).await.unwrap();
    let after = app.get("/alice/", Some(&cookie)).await;
    assert!(after.body.contains(">Unfollow</a>"));

    // No follow button on your own profile
    let own = app.get("/bob/", Some(&cookie)).await;
    assert!(!own.body.contains(">Follow</a>"));
    assert!(!own.body.contains(">Unfollow</a>"));
}

#[tokio::test]
async fn thirteen_posts_paginate_ten_then_three() {
    let app = test_app();
    let alice = app.user("alice");
    app.posts(&alice, 13, "Entry");

    let first = app.get("/", None).await;
    assert_eq!(first.card_count(), 10);
    assert!(first.body.contains("Entry 13"));
    assert!(!first.body.contains("Entry 03"));

    let second = app.get("/?page=2", None).await;
    assert_eq!(second.card_count(), 3);
    assert!(second.body.contains("Entry 01"));

    // Past the end, non-numeric and zero all land on the last page
    for uri in ["/?page=3", "/?page=abc", "/?page=0", "/?page=-2"] {
        let response = app.get(uri, None).await;
        assert_eq!(response.status, StatusCode::OK, "{uri}");
        assert_eq!(response.card_count(), 3, "{uri}");
    }

    let profile = app.get("/alice/?page=2", None).await;
    assert_eq!(profile.card_count(), 3);
}

#[tokio::test]
async fn follow_feed_requires_login() {
    let app = test_app();
    let response = app.get("/follow/", None).await;
    assert_eq!(response.status, StatusCode::SEE_OTHER);
    assert_eq!(response.location(), "/auth/login/?next=%2Ffollow%2F");

    let response = app.get("/follow/?page=2", None).await;
    assert_eq!(
        response.location(),
        "/auth/login/?next=%2Ffollow%2F%3Fpage%3D2"
    );
}

#[tokio::test]
async fn follow_feed_shows_followed_authors_only() {
    let app = test_app();
    let reader = app.user("reader");
    let followed = app.user("followed");
    let stranger = app.user("stranger");
    app.post_at(&followed, "Worth reading", None, Utc::now());
    app.post_at(&stranger, "Not followed", None, Utc::now());
    let cookie = app.login(&reader);

    let empty = app.get("/follow/", Some(&cookie)).await;
    assert_eq!(empty.status, StatusCode::OK);
    assert_eq!(empty.card_count(), 0);

    app.state.follows.follow(&reader, &followed).await.unwrap();
    let response = app.get("/follow/", Some(&cookie)).await;
    assert_eq!(response.card_count(), 1);
    assert!(response.body.contains("Worth reading"));
    assert!(!response.body.contains("Not followed"));

    // The author's own feed is unaffected by who follows them
    let theirs = app.get("/follow/", Some(&app.login(&followed))).await;
    assert_eq!(theirs.card_count(), 0);
}

#[tokio::test]
async fn index_is_cached_until_ttl_expires() {
    let app = test_app();
    let alice = app.user("alice");
    let doomed = app.post_at(&alice, "Doomed post", None, Utc::now());

    let first = app.get("/", None).await;
    assert!(first.body.contains("Doomed post"));

    {
        let conn = app.state.db.get().unwrap();
        assert!(posts::delete_post(&conn, &doomed.id).unwrap());
    }

    let cached = app.get("/", None).await;
    assert_eq!(cached.body, first.body);

    app.clock.advance(Duration::from_secs(19));
    let still_cached = app.get("/", None).await;
    assert!(still_cached.body.contains("Doomed post"));

    app.clock.advance(Duration::from_secs(1));
    let fresh = app.get("/", None).await;
    assert!(!fresh.body.contains("Doomed post"));
}

#[tokio::test]
async fn cache_does_not_serve_one_page_for_another() {
    let app = test_app();
    let alice = app.user("alice");
    app.posts(&alice, 13, "Entry");

    let first = app.get("/", None).await;
    let second = app.get("/?page=2", None).await;
    assert_eq!(first.card_count(), 10);
    assert_eq!(second.card_count(), 3);
    assert_ne!(first.body, second.body);
}

#[tokio::test]
async fn out_of_range_pages_share_the_last_page_entry() {
    let app = test_app();
    let alice = app.user("alice");
    app.posts(&alice, 13, "Entry");

    for n in 3..=200 {
        let response = app.get(&format!("/?page={n}"), None).await;
        assert_eq!(response.status, StatusCode::OK);
        assert_eq!(response.card_count(), 3);
    }
    for junk in ["0", "-4", "abc", "last"] {
        let response = app.get(&format!("/?page={junk}"), None).await;
        assert_eq!(response.card_count(), 3);
    }
    assert_eq!(app.state.index_cache.len().await, 1);

    app.get("/", None).await;
    app.get("/?page=2", None).await;
    assert!(app.state.index_cache.len().await <= 2);
}

#[tokio::test]
async fn deleting_author_removes_their_posts_everywhere() {
    let app = test_app();
    let alice = app.user("alice");
    let bob = app.user("bob");
    app.post_at(&alice, "Alice stays", None, Utc::now());
    app.post_at(&bob, "Bob leaves", None, Utc::now());
    app.state.follows.follow(&alice, &bob).await.unwrap();

    {
        let conn = app.state.db.get().unwrap();
        assert!(users::delete_user(&conn, &bob).unwrap());
    }

    let cookie = app.login(&alice);
    let follow = app.get("/follow/", Some(&cookie)).await;
    assert_eq!(follow.card_count(), 0);
    assert_eq!(app.state.follows.followee_count(&alice).await.unwrap(), 0);
    assert_eq!(app.get("/bob/", None).await.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn unknown_path_renders_404_page() {
    let app = test_app();
    let response = app.get("/a/b/c/d/", None).await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert!(response.body.contains("Page not found"));
}
