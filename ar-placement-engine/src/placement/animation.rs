use bevy::prelude::*;
use bevy::scene::SceneInstanceReady;

/// Clips of a placed model, started once its scene has been instantiated.
#[derive(Component, Debug, Clone)]
pub struct PlacedAnimations {
    pub graph: Handle<AnimationGraph>,
    pub nodes: Vec<AnimationNodeIndex>,
}

impl PlacedAnimations {
    /// One graph holding every clip, each on its own node with equal weight.
    pub fn from_clips(
        clips: impl IntoIterator<Item = Handle<AnimationClip>>,
        graphs: &mut Assets<AnimationGraph>,
    ) -> Self {
        let (graph, nodes) = AnimationGraph::from_clips(clips);
        Self {
            graph: graphs.add(graph),
            nodes,
        }
    }
}

/// Start every clip at once, looping. No blending or priority between them.
pub fn play_all(player: &mut AnimationPlayer, nodes: &[AnimationNodeIndex]) {
    for &node in nodes {
        player.play(node).repeat();
    }
}

/// Bind the graph to the scene's animation player and start playback.
///
/// Playback then advances with Bevy's measured frame time.
pub fn start_clips_on_ready(
    trigger: Trigger<SceneInstanceReady>,
    placed: Query<&PlacedAnimations>,
    children: Query<&Children>,
    mut players: Query<&mut AnimationPlayer>,
    mut commands: Commands,
) {
    let root = trigger.target();
    let Ok(animations) = placed.get(root) else {
        return;
    };

    let Some(player_entity) = children
        .iter_descendants(root)
        .find(|entity| players.contains(*entity))
    else {
        warn!("Placed model has clips but no animation player");
        return;
    };

    if let Ok(mut player) = players.get_mut(player_entity) {
        play_all(&mut player, &animations.nodes);
        commands
            .entity(player_entity)
            .insert(AnimationGraphHandle(animations.graph.clone()));
        info!("Playing {} clip(s) on placed model", animations.nodes.len());
    }
}
