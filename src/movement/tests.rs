use bevy::prelude::*;

use super::state::{MovementState, Step};
use super::ActiveMoves;
use crate::animation::events::{CommandFailed, MoveCommand, MovementRejected};
use crate::animation::registry::{AnimationKind, AnimationRegistry};
use crate::harness;
use crate::models::{ActionError, ActorId, GridPos, Settings, VisualPos};
use crate::networking::{ActorIndex, ClientRequest, ServerMessage};

fn gp(x: i32, y: i32) -> GridPos {
    GridPos::new(x, y)
}

fn straight(cells: &[(i32, i32)]) -> Vec<GridPos> {
    cells.iter().map(|&(x, y)| gp(x, y)).collect()
}

// ── State machine ───────────────────────────────────────────────────

#[test]
fn walk_time_is_exact_for_odd_tick_sizes() {
    // 3 segments at 1 tile/s must take 3s ± one tick, whatever the tick.
    for dt in [0.016, 0.33, 0.5, 0.75, 1.1] {
        let mut state = MovementState::new(straight(&[(0, 0), (1, 0), (2, 0), (3, 0)]), 1.0);
        state.adopt(&straight(&[(0, 0), (1, 0), (2, 0), (3, 0)]));

        let mut ticks = 0;
        loop {
            ticks += 1;
            assert!(ticks < 1000, "never arrived with dt {dt}");
            if state.advance(dt) == Step::Arrived {
                break;
            }
        }
        let total = ticks as f32 * dt;
        assert!(
            (total - 3.0).abs() <= dt + 1e-4,
            "dt {dt}: walked for {total}s"
        );
    }
}

#[test]
fn remainder_carries_across_segment_boundaries() {
    let mut state = MovementState::new(straight(&[(0, 0), (1, 0), (2, 0)]), 1.0);
    state.advance(0.75);
    state.advance(0.75);
    // 1.5s at 1 tile/s: half-way through the second segment, not stalled
    // at the boundary.
    assert_eq!(state.visual_pos(), Vec2::new(1.5, 0.0));
}

#[test]
fn adopting_the_predicted_path_is_seamless() {
    let path = straight(&[(0, 0), (1, 0), (2, 0)]);
    let mut state = MovementState::new(path.clone(), 2.0);
    state.advance(0.1);
    assert!(!state.adopt(&path));
    assert_eq!(state.path(), &path[..]);
}

#[test]
fn divergent_path_splices_at_next_boundary() {
    let mut state = MovementState::new(straight(&[(0, 0), (1, 0), (2, 0), (3, 0)]), 1.0);
    state.advance(0.5); // mid first segment

    let server = straight(&[(0, 0), (1, 0), (1, 1), (2, 1)]);
    assert!(state.adopt(&server));
    // Still walking the committed segment; splice waits for the boundary.
    assert_eq!(state.visual_pos(), Vec2::new(0.5, 0.0));

    state.advance(0.5); // lands exactly on (1,0), reroute applies
    state.advance(0.5); // now walking toward (1,1)
    assert_eq!(state.visual_pos(), Vec2::new(1.0, 0.5));
    assert_eq!(state.destination(), gp(2, 1));
}

#[test]
fn adoption_never_jumps() {
    let dt = 0.25;
    let speed = 1.0;
    let mut state = MovementState::new(straight(&[(0, 0), (1, 0), (2, 0), (3, 0)]), speed);
    let mut last = state.visual_pos();

    for tick in 0..40 {
        if tick == 3 {
            state.adopt(&straight(&[(0, 0), (1, 0), (1, 1), (2, 1), (3, 1)]));
        }
        let step = state.advance(dt);
        let pos = state.visual_pos();
        assert!(
            (pos - last).length() <= dt * speed + 1e-4,
            "jumped from {last:?} to {pos:?} on tick {tick}"
        );
        last = pos;
        if step == Step::Arrived {
            return;
        }
    }
    panic!("never arrived");
}

#[test]
fn splice_bridges_a_non_adjacent_server_path() {
    let mut state = MovementState::new(straight(&[(0, 0), (1, 0), (2, 0), (3, 0)]), 1.0);
    state.advance(1.0); // standing on (1,0)

    // Server routed around the other side; the junction is two tiles away
    // from the cell being walked.
    assert!(state.adopt(&straight(&[(0, 0), (0, 1), (1, 1)])));

    let dt = 0.25;
    let mut last = state.visual_pos();
    for _ in 0..40 {
        let step = state.advance(dt);
        let pos = state.visual_pos();
        assert!(
            (pos - last).length() <= dt + 1e-4,
            "jumped from {last:?} to {pos:?}"
        );
        last = pos;
        if step == Step::Arrived {
            break;
        }
    }
    assert_eq!(state.destination(), gp(1, 1));
    assert_eq!(last, Vec2::new(1.0, 1.0));
}

#[test]
fn rejection_finishes_the_current_tile_only() {
    let mut state = MovementState::new(straight(&[(0, 0), (1, 0), (2, 0), (3, 0)]), 1.0);
    state.advance(0.4);
    state.reject();

    // Walks out the committed tile...
    assert_eq!(state.advance(0.4), Step::Moving);
    // ...then halts at its boundary and stays halted.
    assert_eq!(state.advance(0.4), Step::Halted);
    assert_eq!(state.visual_pos(), Vec2::new(1.0, 0.0));
    assert_eq!(state.advance(5.0), Step::Halted);
    assert_eq!(state.visual_pos(), Vec2::new(1.0, 0.0));
}

#[test]
fn pending_verdict_holds_at_destination() {
    let mut state = MovementState::new(straight(&[(0, 0), (1, 0)]), 1.0);
    assert_eq!(state.advance(1.0), Step::Waiting);
    assert_eq!(state.advance(1.0), Step::Waiting);
    state.adopt(&straight(&[(0, 0), (1, 0)]));
    assert_eq!(state.advance(0.1), Step::Arrived);
}

// ── Full-app scenarios ──────────────────────────────────────────────

const KNIGHT: ActorId = ActorId(1);

#[derive(Resource, Default)]
struct Captured {
    failures: Vec<ActionError>,
    rejections: Vec<GridPos>,
}

fn scenario() -> (App, crate::networking::ServerEndpoint) {
    let (mut app, endpoint) = harness::app();
    app.init_resource::<Captured>();
    app.add_observer(|on: On<CommandFailed>, mut captured: ResMut<Captured>| {
        captured.failures.push(on.event().error.clone());
    });
    app.add_observer(|on: On<MovementRejected>, mut captured: ResMut<Captured>| {
        captured.rejections.push(on.event().resync_to);
    });
    app.world_mut()
        .resource_mut::<Settings>()
        .movement
        .speed = 1.0;
    harness::push_summary(&endpoint, vec![harness::snapshot(KNIGHT, gp(0, 0))]);
    harness::tick(&mut app, 0.0);
    (app, endpoint)
}

fn visual_of(app: &mut App, actor: ActorId) -> Vec2 {
    let entity = app
        .world()
        .resource::<ActorIndex>()
        .get(actor)
        .expect("mirror entity");
    app.world().get::<VisualPos>(entity).expect("visual pos").0
}

#[test]
fn straight_walk_arrives_on_time_and_clears_the_registry() {
    let (mut app, endpoint) = scenario();

    app.world_mut().trigger(MoveCommand {
        actor: KNIGHT,
        target: gp(3, 0),
    });
    assert!(matches!(
        endpoint.requests.try_recv(),
        Ok(ClientRequest::Move { .. })
    ));

    // Server approves the predicted path and reports the final cell.
    endpoint
        .replies
        .send(ServerMessage::MoveOutcome {
            actor: KNIGHT,
            approved: true,
            path: straight(&[(1, 0), (2, 0), (3, 0)]),
        })
        .unwrap();
    harness::push_summary(&endpoint, vec![harness::snapshot(KNIGHT, gp(3, 0))]);

    for _ in 0..6 {
        harness::tick(&mut app, 0.5);
    }
    assert_eq!(visual_of(&mut app, KNIGHT), Vec2::new(3.0, 0.0));

    // Entry completes on arrival and is swept shortly after.
    harness::tick(&mut app, 0.1);
    harness::tick(&mut app, 0.1);
    assert!(
        app.world()
            .resource::<AnimationRegistry>()
            .get_active(KNIGHT)
            .is_none()
    );
    assert!(
        !app.world()
            .resource::<ActiveMoves>()
            .is_moving(KNIGHT)
    );
}

#[test]
fn divergent_server_path_splices_without_jumps() {
    let (mut app, endpoint) = scenario();

    app.world_mut().trigger(MoveCommand {
        actor: KNIGHT,
        target: gp(3, 0),
    });
    endpoint.requests.try_recv().ok();

    // Part-way into the first segment when the reroute lands.
    for _ in 0..3 {
        harness::tick(&mut app, 0.25);
    }
    endpoint
        .replies
        .send(ServerMessage::MoveOutcome {
            actor: KNIGHT,
            approved: true,
            path: straight(&[(1, 0), (1, 1), (2, 1), (3, 1)]),
        })
        .unwrap();
    harness::push_summary(&endpoint, vec![harness::snapshot(KNIGHT, gp(3, 1))]);

    let mut last = visual_of(&mut app, KNIGHT);
    for _ in 0..30 {
        harness::tick(&mut app, 0.25);
        let pos = visual_of(&mut app, KNIGHT);
        assert!(
            (pos - last).length() <= 0.25 + 1e-4,
            "jumped from {last:?} to {pos:?}"
        );
        last = pos;
    }
    assert_eq!(last, Vec2::new(3.0, 1.0));
}

#[test]
fn second_command_conflicts_and_leaves_the_walk_alone() {
    let (mut app, endpoint) = scenario();

    app.world_mut().trigger(MoveCommand {
        actor: KNIGHT,
        target: gp(3, 0),
    });
    harness::tick(&mut app, 0.25);

    app.world_mut().trigger(MoveCommand {
        actor: KNIGHT,
        target: gp(0, 2),
    });
    app.world_mut().flush();

    let captured = app.world().resource::<Captured>();
    assert_eq!(captured.failures, vec![ActionError::Conflict(KNIGHT)]);
    let moves = app.world().resource::<ActiveMoves>();
    assert_eq!(
        moves.get(KNIGHT).map(|s| s.destination()),
        Some(gp(3, 0)),
        "original walk must be untouched"
    );
    // One request only: the conflicting command never reached the wire.
    assert!(endpoint.requests.try_recv().is_ok());
    assert!(endpoint.requests.try_recv().is_err());
}

#[test]
fn rejection_snaps_once_to_the_server_cell() {
    let (mut app, endpoint) = scenario();

    app.world_mut().trigger(MoveCommand {
        actor: KNIGHT,
        target: gp(3, 0),
    });
    harness::tick(&mut app, 0.4);

    endpoint
        .replies
        .send(ServerMessage::MoveOutcome {
            actor: KNIGHT,
            approved: false,
            path: Vec::new(),
        })
        .unwrap();
    harness::push_summary(&endpoint, vec![harness::snapshot(KNIGHT, gp(0, 0))]);

    for _ in 0..8 {
        harness::tick(&mut app, 0.25);
    }

    let captured = app.world().resource::<Captured>();
    assert_eq!(captured.rejections, vec![gp(0, 0)], "exactly one snap");
    assert_eq!(visual_of(&mut app, KNIGHT), Vec2::ZERO);
    assert!(
        app.world()
            .resource::<AnimationRegistry>()
            .is_ready(KNIGHT)
    );
}

#[test]
fn unreachable_target_fails_without_side_effects() {
    let (mut app, endpoint) = scenario();

    app.world_mut().trigger(MoveCommand {
        actor: KNIGHT,
        target: gp(7, 7),
    });
    app.world_mut().flush();

    let captured = app.world().resource::<Captured>();
    assert_eq!(
        captured.failures,
        vec![ActionError::Unreachable(gp(7, 7))]
    );
    assert!(!app.world().resource::<ActiveMoves>().is_moving(KNIGHT));
    assert!(endpoint.requests.try_recv().is_err());
}

#[test]
fn move_animation_carries_the_path() {
    let (mut app, _endpoint) = scenario();

    app.world_mut().trigger(MoveCommand {
        actor: KNIGHT,
        target: gp(2, 0),
    });

    let registry = app.world().resource::<AnimationRegistry>();
    let active = registry.get_active(KNIGHT).expect("move entry");
    assert_eq!(active.kind, AnimationKind::Move);
    assert!(active.client_initiated);
    // 2 segments at 1 tile/s
    assert!((active.duration - 2.0).abs() < 1e-6);
}
