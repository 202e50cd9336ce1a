use tabletop_session::blocks::{BlockRecord, Hand, RoundPlan};
use tabletop_session::controller::SessionController;
use tabletop_session::round_log::{Condition, RoundLog};
use tabletop_session::session::*;
use tabletop_session::state::StartMode;

fn blocks() -> Vec<BlockRecord> {
    vec![
        BlockRecord {
            index: 0,
            practice: true,
            rounds: vec![RoundPlan::new(Hand(1, 2), Hand(3, 4))],
        },
        BlockRecord {
            index: 2,
            practice: false,
            rounds: vec![
                RoundPlan::new(Hand(5, 6), Hand(7, 8)),
                RoundPlan::new(Hand(9, 1), Hand(2, 3)),
            ],
        },
    ]
}

fn run(input: &[u8], mode: StartMode) -> (SessionSummary, RoundLog, String) {
    colored::control::set_override(false);
    let mut controller = SessionController::new(blocks(), mode).unwrap();
    let mut log = RoundLog::new("test-session");
    let mut reader = input;
    let mut output = Vec::new();
    let summary = run_interactive_session(&mut controller, &mut log, &mut reader, &mut output).unwrap();
    (summary, log, String::from_utf8(output).unwrap())
}

#[test]
fn test_full_session_with_block_pause() {
    let input = b"up\nyes\n\ndown\nno\nup\nyes\n";
    let (summary, log, out) = run(input, StartMode::T);

    assert!(summary.finished);
    assert_eq!(summary.rounds_played, 3);
    assert_eq!(log.len(), 6);
    assert!(log.records().iter().all(|r| r.condition == Condition::Masked));
    assert!(out.contains("Dieser Block ist vorbei"));
    assert!(out.contains("Session complete."));
    assert!(out.contains("Das Experiment ist beendet"));
}

#[test]
fn test_roles_switch_after_practice() {
    let input = b"up\nyes\n\ndown\nno\nq\n";
    let (summary, log, _) = run(input, StartMode::C);

    assert!(!summary.finished);
    assert_eq!(summary.rounds_played, 2);
    let records = log.records();
    assert_eq!(records.len(), 4);

    // Practice block: vp1 signals, vp2 judges.
    assert_eq!(records[0].player, "P1");
    assert_eq!(records[0].event, "signal");
    assert_eq!(records[1].player, "P2");
    assert_eq!(records[1].decision.as_deref(), Some("yes"));
    assert!(records[0].practice);

    // Block 2: vp2 signals, vp1 judges.
    assert_eq!(records[2].player, "P2");
    assert_eq!(records[2].block_index, 2);
    assert_eq!(records[3].player, "P1");
    assert_eq!(records[3].signal.as_deref(), Some("down"));
    assert!(records.iter().all(|r| r.condition == Condition::Unmasked));
}

#[test]
fn test_quit_during_pause() {
    let input = b"up\nyes\nq\n";
    let (summary, log, out) = run(input, StartMode::C);
    assert!(!summary.finished);
    assert_eq!(summary.rounds_played, 1);
    assert_eq!(log.len(), 2);
    assert!(out.contains("Session stopped."));
}

#[test]
fn test_rounds_played_matches_completed_rounds_when_quitting_mid_round() {
    // Quit at the decision prompt of the second round: only the first counts.
    let input = b"up\nyes\n\ndown\nq\n";
    let (summary, log, _) = run(input, StartMode::C);
    assert!(!summary.finished);
    assert_eq!(summary.rounds_played, 1);
    assert_eq!(log.len(), 3);
}

#[test]
fn test_end_of_input_stops_session() {
    let (summary, log, _) = run(b"up\n", StartMode::C);
    assert!(!summary.finished);
    assert_eq!(log.len(), 1);
}

#[test]
fn test_terminal_banner_tracks_presentation() {
    use tabletop_session::overlay::{OverlayHandle, OverlayPresentation};

    let mut banner = TerminalBanner::default();
    banner.apply(&OverlayPresentation::shown("Pause")).unwrap();
    assert!(banner.visible);
    assert_eq!(banner.message, "Pause");
    banner.apply(&OverlayPresentation::hidden()).unwrap();
    assert!(!banner.visible);
}
