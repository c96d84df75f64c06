//! Concurrent booking load against one class.
//!
//! Many members race for a handful of seats on a multi-threaded runtime;
//! the capacity bound and the booking/participant pairing must hold no
//! matter how the tasks interleave.

#![allow(clippy::expect_used, clippy::unwrap_used)] // Test code can use unwrap/expect

mod common;

use booking::engine::CLASS_FULL;
use booking::{BookClassRequest, CancelMode, CancelTarget};
use common::TestApp;
use fitbook_core::BookingError;
use futures::future::join_all;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_bookings_respect_capacity() {
    let app = TestApp::new();
    let ivy = app.instructor("Ivy").await;
    let capacity = 5;
    let class = app.class(&ivy, capacity).await;

    let mut members = Vec::new();
    for i in 0..40 {
        members.push(app.member(&format!("M{i}")).await);
    }

    let handles = members.iter().map(|member| {
        let engine = app.state.engine.clone();
        let user_id = member.id;
        let request = BookClassRequest::for_class(&class);
        tokio::spawn(async move { engine.book_class(user_id, request).await })
    });

    let results: Vec<_> = join_all(handles)
        .await
        .into_iter()
        .map(|joined| joined.expect("task panicked"))
        .collect();

    let booked = results.iter().filter(|r| r.is_ok()).count();
    assert_eq!(booked, capacity as usize);
    for err in results.iter().filter_map(|r| r.as_ref().err()) {
        assert_eq!(*err, BookingError::Conflict(CLASS_FULL.to_string()));
    }

    assert_eq!(app.reload(&class).await.participants.len(), capacity as usize);
    app.assert_consistent().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_same_member_racing_itself_books_once() {
    let app = TestApp::new();
    let ivy = app.instructor("Ivy").await;
    let class = app.class(&ivy, 10).await;
    let u = app.member("U").await;

    let handles = (0..16).map(|_| {
        let engine = app.state.engine.clone();
        let request = BookClassRequest::for_class(&class);
        let user_id = u.id;
        tokio::spawn(async move { engine.book_class(user_id, request).await })
    });

    let results: Vec<_> = join_all(handles)
        .await
        .into_iter()
        .map(|joined| joined.expect("task panicked"))
        .collect();

    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
    assert_eq!(app.active_bookings(&class).await.len(), 1);
    app.assert_consistent().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_mixed_book_and_cancel_load() {
    let app = TestApp::new();
    let ivy = app.instructor("Ivy").await;
    let classes = vec![app.class(&ivy, 2).await, app.class(&ivy, 3).await];

    let mut members = Vec::new();
    for i in 0..8 {
        members.push(app.member(&format!("M{i}")).await);
    }

    let mut handles = Vec::new();
    for round in 0..4 {
        for (i, member) in members.iter().enumerate() {
            let engine = app.state.engine.clone();
            let class = classes[(i + round) % classes.len()].clone();
            let user_id = member.id;
            let cancel = (i + round) % 3 == 0;
            handles.push(tokio::spawn(async move {
                let _ = engine
                    .book_class(user_id, BookClassRequest::for_class(&class))
                    .await;
                if cancel {
                    let _ = engine
                        .cancel_booking(user_id, CancelTarget::Class(class.id), CancelMode::MarkCancelled)
                        .await;
                }
            }));
        }
    }

    for joined in join_all(handles).await {
        joined.expect("task panicked");
    }

    app.assert_consistent().await;
}
