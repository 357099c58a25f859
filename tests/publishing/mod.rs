use std::sync::atomic::Ordering;
use std::sync::Arc;

use nutmeg::channel::{ChannelError, ChannelRef};
use nutmeg::publishers::{PublishError, Publisher};

use crate::fixtures::{
    an_order, BalanceQuery, CountingRouter, CountingSerializer, OrderPlaced, StubChannel,
};

#[tokio::test]
async fn publishing_serializes_and_routes_the_message_exactly_once() {
    // Arrange
    let (channel, log) = StubChannel::new();
    let (serializer, serialize_calls) = CountingSerializer::new();
    let (router, route_calls) = CountingRouter::new("#");
    let publisher = Publisher::builder(ChannelRef::new(channel))
        .serializer(serializer)
        .router(router)
        .build();

    // Act
    publisher.publish(an_order()).await.unwrap();

    // Assert
    assert_eq!(1, serialize_calls.load(Ordering::SeqCst));
    assert_eq!(1, route_calls.load(Ordering::SeqCst));
    let submissions = log.submissions.lock().unwrap();
    assert_eq!(1, submissions.len());
    assert_eq!("#", submissions[0].routing_key);
}

#[tokio::test]
async fn the_submitted_envelope_carries_the_full_message() {
    // Arrange
    let (channel, log) = StubChannel::new();
    let publisher = Publisher::builder(ChannelRef::new(channel))
        .exchange("orders")
        .build();
    let body = an_order();

    // Act
    publisher.publish(body.clone()).await.unwrap();

    // Assert
    let submissions = log.submissions.lock().unwrap();
    let submission = &submissions[0];
    assert_eq!("orders", submission.exchange);
    assert_eq!("OrderPlaced", submission.routing_key);
    assert_eq!(
        body,
        serde_json::from_slice::<OrderPlaced>(&submission.payload).unwrap()
    );
    assert_eq!(
        Some("application/json"),
        submission
            .properties
            .content_type()
            .as_ref()
            .map(|ct| ct.as_str())
    );
    assert_eq!(&Some(2), submission.properties.delivery_mode());
}

#[tokio::test]
async fn a_request_message_carries_correlation_and_expiration_on_the_wire() {
    // Arrange
    let (channel, log) = StubChannel::new();
    let publisher = crate::fixtures::get_publisher(channel);

    // Act
    publisher
        .publish(BalanceQuery {
            account: "acc-2389".into(),
        })
        .await
        .unwrap();

    // Assert
    let submissions = log.submissions.lock().unwrap();
    let properties = &submissions[0].properties;
    assert!(properties.correlation_id().is_some());
    assert_eq!(
        Some("60000"),
        properties.expiration().as_ref().map(|e| e.as_str())
    );
}

#[tokio::test]
async fn publishers_sharing_a_channel_do_not_lose_submissions() {
    // Arrange
    let (channel, log) = StubChannel::new();
    let channel = ChannelRef::new(channel);
    let first = Arc::new(Publisher::builder(channel.clone()).build());
    let second = Arc::new(Publisher::builder(channel).build());

    // Act
    let mut handles = vec![];
    for publisher in [first, second] {
        for _ in 0..8 {
            let publisher = Arc::clone(&publisher);
            handles.push(tokio::spawn(
                async move { publisher.publish(an_order()).await },
            ));
        }
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    // Assert
    assert_eq!(16, log.submission_count());
}

#[tokio::test]
async fn disposing_multiple_times_disposes_the_channel_once() {
    let (channel, log) = StubChannel::new();
    let publisher = crate::fixtures::get_publisher(channel);

    publisher.dispose().await;
    publisher.dispose().await;

    assert_eq!(1, log.dispose_count());
}

#[tokio::test]
async fn concurrent_disposals_dispose_the_channel_once() {
    let (channel, log) = StubChannel::new();
    let publisher = Arc::new(crate::fixtures::get_publisher(channel));

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let publisher = Arc::clone(&publisher);
            tokio::spawn(async move { publisher.dispose().await })
        })
        .collect();
    for handle in handles {
        handle.await.unwrap();
    }

    assert_eq!(1, log.dispose_count());
}

#[tokio::test]
async fn publishing_after_dispose_fails() {
    let (channel, log) = StubChannel::new();
    let publisher = crate::fixtures::get_publisher(channel);

    publisher.dispose().await;
    let result = publisher.publish(an_order()).await;

    assert!(matches!(
        result,
        Err(PublishError::Channel(ChannelError::Disposed))
    ));
    assert_eq!(0, log.submission_count());
}

#[tokio::test]
async fn a_broken_channel_surfaces_as_a_fault() {
    let (channel, log) = StubChannel::new();
    let breaker = channel.breaker();
    let publisher = crate::fixtures::get_publisher(channel);
    breaker.store(true, Ordering::SeqCst);

    let result = publisher.publish(an_order()).await;

    assert!(matches!(
        result,
        Err(PublishError::Channel(ChannelError::Fault(_)))
    ));
    assert_eq!(0, log.submission_count());
}
