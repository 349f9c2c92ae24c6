use bevy::math::Vec2;
use bevy::prelude::*;

use crate::ar::ArSession;
use crate::config::AnnotationConfig;
use crate::engine::anchor::AnchorId;
use crate::engine::frame::{DrawCommand, LabelPlacement, Notice, StatusMessage};
use crate::engine::session::AnnotationSession;

/// Tracking backend the frame system pulls camera frames from. Frames are
/// skipped until the host inserts one.
#[derive(Resource)]
pub struct ArBackend(pub Box<dyn ArSession>);

/// Screen tap requesting an anchor under `position` (pixels, top-left origin).
#[derive(Event, Debug, Clone, Copy)]
pub struct AnchorTapEvent {
    pub position: Vec2,
}

/// Input from the search field.
#[derive(Event, Debug, Clone, PartialEq, Eq)]
pub enum SearchQueryEvent {
    Submitted(String),
    Changed(String),
    Cleared,
}

/// User finished editing an anchor's label.
#[derive(Event, Debug, Clone)]
pub struct RelabelAnchorEvent {
    pub anchor: AnchorId,
    pub label: String,
}

#[derive(Event, Debug, Clone, Copy)]
pub struct ViewportResizedEvent {
    pub width: f32,
    pub height: f32,
}

#[derive(Event, Debug, Clone)]
pub struct LabelPlacementEvent(pub LabelPlacement);

#[derive(Event, Debug, Clone)]
pub struct AnchorDrawEvent(pub DrawCommand);

#[derive(Event, Debug, Clone)]
pub struct AnnotationNoticeEvent(pub Notice);

/// Current tracking hint; `None` tells the UI to hide it.
#[derive(Event, Debug, Clone, Copy)]
pub struct StatusMessageEvent(pub Option<StatusMessage>);

#[derive(Event, Debug, Clone, Copy)]
pub struct AnchorPublishedEvent {
    pub anchor: AnchorId,
}

/// Wires an [`AnnotationSession`] into the app.
///
/// A session resource inserted before the plugin is kept; otherwise one is
/// built from `config`, falling back to offline mode if the remote store
/// cannot be set up.
#[derive(Default)]
pub struct AnnotationPlugin {
    pub config: AnnotationConfig,
}

impl AnnotationPlugin {
    pub fn new(config: AnnotationConfig) -> Self {
        Self { config }
    }
}

impl Plugin for AnnotationPlugin {
    fn build(&self, app: &mut App) {
        if !app.world().contains_resource::<AnnotationSession>() {
            let session = AnnotationSession::from_config(self.config.clone()).unwrap_or_else(|err| {
                error!("Cloud sync unavailable, running offline: {}", err);
                AnnotationSession::offline(self.config.clone())
            });
            app.insert_resource(session);
        }

        app.add_event::<AnchorTapEvent>()
            .add_event::<SearchQueryEvent>()
            .add_event::<RelabelAnchorEvent>()
            .add_event::<ViewportResizedEvent>()
            .add_event::<LabelPlacementEvent>()
            .add_event::<AnchorDrawEvent>()
            .add_event::<AnnotationNoticeEvent>()
            .add_event::<StatusMessageEvent>()
            .add_event::<AnchorPublishedEvent>()
            .add_systems(Startup, start_cloud_hydration)
            .add_systems(Update, (handle_annotation_input, run_annotation_frame).chain());
    }
}

fn start_cloud_hydration(mut session: ResMut<AnnotationSession>) {
    if session.start_hydration() {
        info!("Requested cloud anchors for room {}", session.sync().room_id());
    }
}

fn handle_annotation_input(
    mut session: ResMut<AnnotationSession>,
    mut resizes: EventReader<ViewportResizedEvent>,
    mut relabels: EventReader<RelabelAnchorEvent>,
    mut queries: EventReader<SearchQueryEvent>,
    mut taps: EventReader<AnchorTapEvent>,
) {
    if let Some(resize) = resizes.read().last() {
        session.set_viewport(Vec2::new(resize.width, resize.height));
    }

    for event in relabels.read() {
        if !session.relabel(event.anchor, &event.label) {
            warn!("Ignoring label for unknown anchor {}", event.anchor);
        }
    }

    for event in queries.read() {
        match event {
            SearchQueryEvent::Submitted(text) => {
                session.submit_query(text);
            }
            SearchQueryEvent::Changed(text) => session.change_query(text),
            SearchQueryEvent::Cleared => session.clear_search(),
        }
    }

    for tap in taps.read() {
        session.queue_tap(tap.position);
    }
}

fn run_annotation_frame(
    mut session: ResMut<AnnotationSession>,
    backend: Option<ResMut<ArBackend>>,
    mut labels: EventWriter<LabelPlacementEvent>,
    mut draws: EventWriter<AnchorDrawEvent>,
    mut notices: EventWriter<AnnotationNoticeEvent>,
    mut status: EventWriter<StatusMessageEvent>,
    mut published: EventWriter<AnchorPublishedEvent>,
) {
    let Some(mut backend) = backend else {
        return;
    };

    let output = session.process_frame(backend.0.as_mut());

    for notice in output.notices {
        notices.write(AnnotationNoticeEvent(notice));
    }
    for anchor in output.published {
        published.write(AnchorPublishedEvent { anchor });
    }
    if output.skipped {
        return;
    }

    status.write(StatusMessageEvent(output.status));
    for label in output.labels {
        labels.write(LabelPlacementEvent(label));
    }
    for draw in output.draws {
        draws.write(AnchorDrawEvent(draw));
    }
}
