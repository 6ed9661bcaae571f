use std::time::Duration;

use live_map::{
    settings::SyncSettings,
    status::{ChannelState, StatusIndicator},
};
use tokio::time::Instant;
use tracking_core::{
    Bounds, FetchSequence, GeoPoint, Mmsi, PushSignal, VesselPosition,
    fetch_error::{PermissionDeniedSnafu, ServerSnafu},
};

use crate::helper::{test, test_settings, test_with_push, test_with_settings};

fn mmsi(v: &str) -> Mmsi {
    v.parse().unwrap()
}

fn point(lat: f64, lon: f64) -> GeoPoint {
    GeoPoint::new(lat, lon).unwrap()
}

#[tokio::test(start_paused = true)]
async fn test_initial_snapshot_is_a_global_fetch_and_is_rendered() {
    test(|mut helper| async move {
        let fetch = helper.next_fetch().await;
        assert_eq!(fetch.request.bounds, None);
        assert_eq!(fetch.request.sequence, FetchSequence::new(1));

        fetch.respond(vec![VesselPosition::test_at("1", 10.0, 20.0)]);

        let frame = helper
            .wait_for_frame(|f| f.status == StatusIndicator::Healthy)
            .await;
        assert_eq!(frame.vessels.len(), 1);
        assert_eq!(frame.vessels[0].position, point(10.0, 20.0));
        assert_eq!(frame.channel, ChannelState::Disabled);
    })
    .await;
}

#[tokio::test(start_paused = true)]
async fn test_poll_tick_refreshes_after_poll_interval() {
    test(|mut helper| async move {
        let start = Instant::now();
        helper.load(vec![]).await;

        let fetch = helper.next_fetch().await;

        assert!(start.elapsed() >= SyncSettings::default().poll_interval);
        assert_eq!(fetch.request.sequence, FetchSequence::new(2));
    })
    .await;
}

#[tokio::test(start_paused = true)]
async fn test_push_event_triggers_a_refresh() {
    test_with_push(|mut helper| async move {
        let connection = helper.next_subscription().await;
        helper.load(vec![]).await;
        helper
            .wait_for_frame(|f| f.channel == ChannelState::Connected)
            .await;

        let start = Instant::now();
        connection.send(PushSignal::Subscribed);
        connection.send(PushSignal::PositionsUpdated);
        let fetch = helper.next_fetch().await;

        assert!(start.elapsed() < Duration::from_secs(1));
        assert_eq!(fetch.request.sequence, FetchSequence::new(2));
    })
    .await;
}

#[tokio::test(start_paused = true)]
async fn test_lost_push_channel_falls_back_to_polling_and_reconnects() {
    test_with_push(|mut helper| async move {
        let connection = helper.next_subscription().await;
        helper.load(vec![]).await;

        drop(connection);
        helper
            .wait_for_frame(|f| f.channel == ChannelState::Disconnected)
            .await;

        // Polling keeps going without the channel.
        let fetch = helper.next_fetch().await;
        fetch.respond(vec![]);

        let connection = helper.next_subscription().await;
        helper
            .wait_for_frame(|f| f.channel == ChannelState::Connected)
            .await;
        connection.send(PushSignal::PositionsUpdated);
        helper.next_fetch().await.respond(vec![]);
    })
    .await;
}

#[tokio::test(start_paused = true)]
async fn test_triggers_during_a_fetch_collapse_into_one_follow_up() {
    test_with_push(|mut helper| async move {
        let connection = helper.next_subscription().await;
        let first = helper.next_fetch().await;

        connection.send(PushSignal::PositionsUpdated);
        connection.send(PushSignal::PositionsUpdated);
        connection.send(PushSignal::PositionsUpdated);
        tokio::time::sleep(Duration::from_millis(10)).await;

        first.respond(vec![]);
        let follow_up = helper.next_fetch().await;
        assert_eq!(follow_up.request.sequence, FetchSequence::new(2));
        follow_up.respond(vec![]);

        // The next fetch only comes from the poll interval.
        let start = Instant::now();
        helper.next_fetch().await;
        assert!(start.elapsed() >= Duration::from_secs(29));
    })
    .await;
}

#[tokio::test(start_paused = true)]
async fn test_late_response_for_previous_bounds_is_discarded() {
    test(|mut helper| async move {
        let first = helper.next_fetch().await;

        let bounds = Bounds::new(10.0, 11.0, 20.0, 21.0).unwrap();
        // Edges as reported by the map surface, north first.
        assert!(
            helper
                .handle
                .viewport_changed(Bounds::from_viewport(11.0, 10.0, 20.0, 21.0).unwrap())
        );
        let second = helper.next_fetch().await;
        assert_eq!(second.request.bounds, Some(bounds));

        second.respond(vec![VesselPosition::test_at("A", 10.5, 20.5)]);
        helper
            .wait_for_frame(|f| f.vessel(&mmsi("A")).is_some())
            .await;

        first.respond(vec![VesselPosition::test_at("A", 10.0, 20.0)]);
        tokio::time::sleep(Duration::from_secs(2)).await;

        let frame = helper.binding.current();
        assert_eq!(
            frame.vessel(&mmsi("A")).unwrap().position,
            point(10.5, 20.5)
        );
    })
    .await;
}

#[tokio::test(start_paused = true)]
async fn test_moved_vessel_is_animated_to_its_target() {
    test_with_push(|mut helper| async move {
        let connection = helper.next_subscription().await;
        helper
            .load(vec![VesselPosition::test_at("A", 0.0, 0.0)])
            .await;

        connection.send(PushSignal::PositionsUpdated);
        let start = Instant::now();
        helper
            .next_fetch()
            .await
            .respond(vec![VesselPosition::test_at("A", 10.0, 0.0)]);

        let midway = helper
            .wait_for_frame(|f| {
                let lat = f.vessel(&mmsi("A")).unwrap().position.latitude;
                lat > 0.0 && lat < 10.0
            })
            .await;
        assert_eq!(midway.vessel(&mmsi("A")).unwrap().position.longitude, 0.0);

        helper
            .wait_for_frame(|f| f.vessel(&mmsi("A")).unwrap().position == point(10.0, 0.0))
            .await;
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_millis(950), "{elapsed:?}");
        assert!(elapsed <= Duration::from_millis(1100), "{elapsed:?}");
    })
    .await;
}

#[tokio::test(start_paused = true)]
async fn test_vessel_absent_from_next_fetch_is_removed() {
    test_with_push(|mut helper| async move {
        let connection = helper.next_subscription().await;
        helper
            .load(vec![
                VesselPosition::test_at("A", 1.0, 1.0),
                VesselPosition::test_at("B", 2.0, 2.0),
            ])
            .await;

        connection.send(PushSignal::PositionsUpdated);
        helper
            .next_fetch()
            .await
            .respond(vec![VesselPosition::test_at("A", 1.0, 1.0)]);

        let frame = helper.wait_for_frame(|f| f.vessels.len() == 1).await;
        assert!(frame.vessel(&mmsi("A")).is_some());
        assert!(frame.vessel(&mmsi("B")).is_none());
    })
    .await;
}

#[tokio::test(start_paused = true)]
async fn test_failures_keep_last_known_vessels() {
    let mut settings = test_settings();
    settings.sync.persistent_failure_threshold = 2;

    test_with_settings(settings, false, |mut helper| async move {
        helper
            .load(vec![VesselPosition::test_at("A", 1.0, 1.0)])
            .await;

        for _ in 0..2 {
            helper.next_fetch().await.fail(
                ServerSnafu {
                    status: 503u16,
                    body: "unavailable",
                }
                .build(),
            );
        }

        let frame = helper
            .wait_for_frame(|f| matches!(f.status, StatusIndicator::PersistentFailure { .. }))
            .await;
        assert_eq!(frame.vessels.len(), 1);
    })
    .await;
}

#[tokio::test(start_paused = true)]
async fn test_permission_denied_backs_off_polling() {
    test(|mut helper| async move {
        helper
            .next_fetch()
            .await
            .fail(PermissionDeniedSnafu { status: 403u16 }.build());
        helper
            .wait_for_frame(|f| matches!(f.status, StatusIndicator::PermissionDenied { .. }))
            .await;

        let start = Instant::now();
        helper.next_fetch().await;

        // The first poll tick after the refusal is skipped.
        assert!(start.elapsed() >= SyncSettings::default().poll_interval * 2);
    })
    .await;
}

#[tokio::test(start_paused = true)]
async fn test_dropping_the_handle_shuts_the_engine_down() {
    test(|mut helper| async move {
        let fetch = helper.next_fetch().await;

        let helper_app = helper.app;
        drop(helper.handle);
        helper_app.await.unwrap();

        assert!(fetch.is_abandoned());
    })
    .await;
}
