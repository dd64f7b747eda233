use bevy::diagnostic::{DiagnosticsStore, FrameTimeDiagnosticsPlugin};
use bevy::prelude::*;

use crate::placement::state::PlacementState;
use crate::xr::hit_test::HitTestSubscription;
use crate::xr::session::{ArSession, ArSessionState, EndArRequest, StartArRequest};

#[derive(Component)]
pub struct FpsText;

#[derive(Component)]
pub struct StatusText;

#[derive(Component)]
pub struct SessionButton;

#[derive(Component)]
pub struct SessionButtonLabel;

const BUTTON_IDLE: Color = Color::srgb(0.22, 0.24, 0.28);
const BUTTON_HOVERED: Color = Color::srgb(0.26, 0.28, 0.32);
const BUTTON_PRESSED: Color = Color::srgb(0.18, 0.20, 0.24);

pub fn spawn_hud(commands: &mut Commands) {
    commands
        .spawn((
            Name::new("Hud"),
            Node {
                width: Val::Percent(100.0),
                height: Val::Percent(100.0),
                ..default()
            },
        ))
        .with_children(|parent| {
            parent.spawn((
                Text::new("FPS: "),
                TextFont {
                    font_size: 16.0,
                    ..default()
                },
                TextColor(Color::srgb(1., 0., 0.)),
                Node {
                    position_type: PositionType::Absolute,
                    bottom: Val::Px(12.0),
                    right: Val::Px(12.0),
                    ..default()
                },
                FpsText,
            ));

            parent.spawn((
                Text::new(""),
                TextFont {
                    font_size: 16.0,
                    ..default()
                },
                TextColor(Color::WHITE),
                Node {
                    position_type: PositionType::Absolute,
                    top: Val::Px(12.0),
                    left: Val::Px(12.0),
                    ..default()
                },
                StatusText,
            ));

            parent
                .spawn((
                    SessionButton,
                    Button,
                    BackgroundColor(BUTTON_IDLE),
                    BorderColor(Color::srgba(0.0, 0.0, 0.0, 0.25)),
                    Node {
                        position_type: PositionType::Absolute,
                        bottom: Val::Px(12.0),
                        left: Val::Px(12.0),
                        padding: UiRect::axes(Val::Px(16.0), Val::Px(8.0)),
                        border: UiRect::all(Val::Px(1.0)),
                        align_items: AlignItems::Center,
                        justify_content: JustifyContent::Center,
                        ..default()
                    },
                ))
                .with_children(|button| {
                    button.spawn((
                        SessionButtonLabel,
                        Text::new("START AR"),
                        TextFont {
                            font_size: 18.0,
                            ..default()
                        },
                        TextColor(Color::WHITE),
                    ));
                });
        });
}

pub fn fps_text_update_system(
    diagnostics: Res<DiagnosticsStore>,
    mut query: Query<&mut Text, With<FpsText>>,
) {
    for mut text in &mut query {
        if let Some(fps) = diagnostics.get(&FrameTimeDiagnosticsPlugin::FPS) {
            if let Some(value) = fps.smoothed() {
                text.0 = format!("FPS: {value:.1}");
            }
        }
    }
}

/// Starts a session when idle, ends it when one is running.
pub fn session_button_interaction(
    mut buttons: Query<
        (&Interaction, &mut BackgroundColor),
        (Changed<Interaction>, With<Button>, With<SessionButton>),
    >,
    state: Res<State<ArSessionState>>,
    mut start: EventWriter<StartArRequest>,
    mut end: EventWriter<EndArRequest>,
) {
    for (interaction, mut bg) in &mut buttons {
        match *interaction {
            Interaction::Pressed => {
                match state.get() {
                    ArSessionState::Idle => {
                        start.write(StartArRequest);
                    }
                    ArSessionState::Active => {
                        end.write(EndArRequest);
                    }
                    ArSessionState::Requesting => {}
                }
                *bg = BackgroundColor(BUTTON_PRESSED);
            }
            Interaction::Hovered => *bg = BackgroundColor(BUTTON_HOVERED),
            Interaction::None => *bg = BackgroundColor(BUTTON_IDLE),
        }
    }
}

pub fn session_button_label(
    state: Res<State<ArSessionState>>,
    mut labels: Query<&mut Text, With<SessionButtonLabel>>,
) {
    if !state.is_changed() {
        return;
    }
    for mut text in &mut labels {
        text.0 = button_label(*state.get()).to_string();
    }
}

fn button_label(state: ArSessionState) -> &'static str {
    match state {
        ArSessionState::Idle => "START AR",
        ArSessionState::Requesting => "STARTING...",
        ArSessionState::Active => "STOP AR",
    }
}

pub fn status_text_update_system(
    state: Res<State<ArSessionState>>,
    session: Option<Res<ArSession>>,
    placement: Res<PlacementState>,
    mut query: Query<&mut Text, With<StatusText>>,
) {
    let status = status_line(*state.get(), session.as_deref(), &placement);
    for mut text in &mut query {
        if text.0 != status {
            text.0 = status.clone();
        }
    }
}

fn status_line(
    state: ArSessionState,
    session: Option<&ArSession>,
    placement: &PlacementState,
) -> String {
    let Some(session) = session else {
        return match state {
            ArSessionState::Requesting => "Requesting AR session...".into(),
            _ => "Press START AR or Enter".into(),
        };
    };

    let tracking = match session.tracker().subscription() {
        HitTestSubscription::NotRequested | HitTestSubscription::Pending => "finding surfaces",
        HitTestSubscription::Active(_) => "tracking",
        HitTestSubscription::Failed => "tracking unavailable",
    };
    let placement = if session.placed_object().is_some() {
        "placed"
    } else if placement.is_loading() {
        "loading model"
    } else {
        "tap to place"
    };
    format!("Session {} | {} | {}", session.id(), tracking, placement)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xr::platform::SessionId;

    #[test]
    fn status_reflects_session_progress() {
        let placement = PlacementState::default();
        assert_eq!(
            status_line(ArSessionState::Idle, None, &placement),
            "Press START AR or Enter"
        );

        let mut session = ArSession::new(SessionId(3));
        assert_eq!(
            status_line(ArSessionState::Active, Some(&session), &placement),
            "Session #3 | finding surfaces | tap to place"
        );

        session.tracker_mut().on_setup_failed(&crate::xr::error::ArError::HitTestSetup(
            "denied".into(),
        ));
        assert_eq!(
            status_line(ArSessionState::Active, Some(&session), &placement),
            "Session #3 | tracking unavailable | tap to place"
        );
    }

    #[test]
    fn placed_session_reports_placement() {
        let placement = PlacementState::default();
        let mut session = ArSession::new(SessionId(1));
        session.mark_placed(Entity::PLACEHOLDER);

        assert_eq!(
            status_line(ArSessionState::Active, Some(&session), &placement),
            "Session #1 | finding surfaces | placed"
        );
    }

    #[test]
    fn button_label_follows_state() {
        assert_eq!(button_label(ArSessionState::Idle), "START AR");
        assert_eq!(button_label(ArSessionState::Active), "STOP AR");
    }
}
