mod common;

use anchor_annotation::plugin::{
    AnchorDrawEvent, AnchorTapEvent, AnnotationNoticeEvent, LabelPlacementEvent, RelabelAnchorEvent,
    SearchQueryEvent, StatusMessageEvent, ViewportResizedEvent,
};
use anchor_annotation::{
    AnchorId, AnnotationConfig, AnnotationPlugin, AnnotationSession, ArBackend, Notice, SyncConfig,
};
use bevy::prelude::*;
use common::{ScriptedAr, VIEWPORT};
use pretty_assertions::assert_eq;

fn offline_config() -> AnnotationConfig {
    AnnotationConfig {
        sync: SyncConfig {
            enabled: false,
            ..Default::default()
        },
        ..Default::default()
    }
}

fn app_with_backend() -> App {
    let mut app = App::new();
    app.insert_resource(AnnotationSession::offline(offline_config()))
        .insert_resource(ArBackend(Box::new(ScriptedAr::default())))
        .add_plugins(AnnotationPlugin::new(offline_config()));
    app
}

fn current<E: Event + Clone>(app: &App) -> Vec<E> {
    app.world()
        .resource::<Events<E>>()
        .iter_current_update_events()
        .cloned()
        .collect()
}

fn tap(app: &mut App) {
    app.world_mut().send_event(ViewportResizedEvent {
        width: VIEWPORT.x,
        height: VIEWPORT.y,
    });
    app.world_mut().send_event(AnchorTapEvent {
        position: VIEWPORT / 2.0,
    });
    app.update();
}

#[test]
fn tap_event_places_labelled_anchor() {
    let mut app = app_with_backend();

    tap(&mut app);

    let notices = current::<AnnotationNoticeEvent>(&app);
    assert!(matches!(
        &notices[..],
        [AnnotationNoticeEvent(Notice::AnchorCreated { anchor: AnchorId(0), label })] if label == "New Marker #1"
    ));

    let labels = current::<LabelPlacementEvent>(&app);
    assert_eq!(labels.len(), 1);
    assert_eq!(labels[0].0.text, "New Marker #1");
    assert_eq!(current::<AnchorDrawEvent>(&app).len(), 1);

    let status = current::<StatusMessageEvent>(&app);
    assert_eq!(status.len(), 1);
    assert_eq!(status[0].0, None);

    assert_eq!(app.world().resource::<AnnotationSession>().viewport(), VIEWPORT);
}

#[test]
fn relabel_and_search_events_drive_highlighting() {
    let mut app = app_with_backend();
    tap(&mut app);
    tap(&mut app);

    app.world_mut().send_event(RelabelAnchorEvent {
        anchor: AnchorId(1),
        label: "Lemon".into(),
    });
    app.world_mut()
        .send_event(SearchQueryEvent::Submitted("Lemon".into()));
    app.update();

    let draws: Vec<_> = current::<AnchorDrawEvent>(&app)
        .into_iter()
        .map(|draw| (draw.0.anchor, draw.0.highlighted))
        .collect();
    assert_eq!(draws, vec![(AnchorId(1), true), (AnchorId(0), false)]);

    app.world_mut().send_event(SearchQueryEvent::Cleared);
    app.update();

    let session = app.world().resource::<AnnotationSession>();
    assert!(session.search().current_matches().is_empty());
    assert_eq!(session.registry().get(AnchorId(1)).unwrap().label(), "Lemon");
}

#[test]
fn changed_query_updates_suggestions_only() {
    let mut app = app_with_backend();
    tap(&mut app);

    app.world_mut()
        .send_event(SearchQueryEvent::Changed("new".into()));
    app.update();

    let session = app.world().resource::<AnnotationSession>();
    assert_eq!(session.search().suggestions(), ["New Marker #1".to_string()]);
    assert!(session.search().suggestions_visible());
    assert!(session.search().current_matches().is_empty());
}

#[test]
fn frames_wait_for_a_backend() {
    let mut app = App::new();
    app.add_plugins(AnnotationPlugin::new(offline_config()));

    app.world_mut().send_event(AnchorTapEvent {
        position: Vec2::ZERO,
    });
    app.update();

    assert!(current::<LabelPlacementEvent>(&app).is_empty());
    let session = app.world().resource::<AnnotationSession>();
    assert!(session.registry().is_empty());
    assert_eq!(session.pending_taps(), 1);
}
