use std::io::{self, BufRead, Write};

use colored::Colorize;

use crate::blocks::Vp;
use crate::controller::SessionController;
use crate::display::{pause_banner, plan_table, roles_table, round_header, vp_label};
use crate::error::TabletopResult;
use crate::overlay::{OverlayHandle, OverlayPresentation, PauseOverlay};
use crate::round_log::{derive_condition, PlainFormatter, RoundEvent, RoundLog};

// ---------------------------------------------------------------------------
// Input helpers
// ---------------------------------------------------------------------------

fn prompt(message: &str, default: Option<&str>, reader: &mut dyn BufRead, writer: &mut dyn Write) -> String {
    if let Some(d) = default {
        write!(writer, "{} [{}]: ", message, d).ok();
    } else {
        write!(writer, "{}: ", message).ok();
    }
    writer.flush().ok();

    let mut line = String::new();
    match reader.read_line(&mut line) {
        Ok(0) => "q".to_string(),
        Ok(_) => {
            let trimmed = line.trim().to_string();
            if trimmed.is_empty() {
                default.unwrap_or("").to_string()
            } else {
                trimmed
            }
        }
        Err(_) => "q".to_string(),
    }
}

/// Ask until a non-empty answer arrives. `None` means quit.
fn prompt_required(message: &str, reader: &mut dyn BufRead, writer: &mut dyn Write) -> Option<String> {
    loop {
        let answer = prompt(message, None, reader, writer);
        if answer.eq_ignore_ascii_case("q") {
            return None;
        }
        if !answer.is_empty() {
            return Some(answer);
        }
        writeln!(writer, "  {}", "An answer is required.".red()).ok();
    }
}

pub fn player_label(vp: Vp) -> String {
    format!("P{}", vp.number())
}

// ---------------------------------------------------------------------------
// Terminal pause banner
// ---------------------------------------------------------------------------

/// Overlay handle for a terminal: remembers what should be on screen.
#[derive(Debug, Default)]
pub struct TerminalBanner {
    pub visible: bool,
    pub message: String,
}

impl OverlayHandle for TerminalBanner {
    fn apply(&mut self, presentation: &OverlayPresentation) -> TabletopResult<()> {
        self.visible = presentation.is_visible();
        self.message = presentation.message.clone();
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Interactive session
// ---------------------------------------------------------------------------

struct QuitSession;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionSummary {
    pub rounds_played: usize,
    pub finished: bool,
}

pub fn session_command(controller: &mut SessionController, log: &mut RoundLog) -> TabletopResult<SessionSummary> {
    let stdin = io::stdin();
    let stdout = io::stdout();
    let mut reader = stdin.lock();
    let mut writer = stdout.lock();
    run_interactive_session(controller, log, &mut reader, &mut writer)
}

pub fn run_interactive_session(
    controller: &mut SessionController,
    log: &mut RoundLog,
    reader: &mut dyn BufRead,
    writer: &mut dyn Write,
) -> TabletopResult<SessionSummary> {
    let condition = derive_condition(controller.state().start_mode());
    writeln!(writer).ok();
    writeln!(writer, "{}", "Tabletop session".cyan().bold()).ok();
    writeln!(
        writer,
        "Session {}  |  condition {}  |  type {} at any prompt to quit.\n",
        log.session_id().bold(),
        condition.as_str().bold(),
        "'q'".bold()
    )
    .ok();

    let mut overlay = PauseOverlay::new();
    let mut banner = TerminalBanner::default();
    let mut rounds_played = 0;

    loop {
        if controller.state().session_finished() {
            break;
        }
        let outcome = play_one_round(
            controller,
            log,
            &mut overlay,
            &mut banner,
            &mut rounds_played,
            reader,
            writer,
        )?;
        match outcome {
            Ok(()) => {}
            Err(QuitSession) => {
                writeln!(writer, "\n{}\n", "Session stopped.".yellow().bold()).ok();
                return Ok(SessionSummary {
                    rounds_played,
                    finished: false,
                });
            }
        }
    }

    writeln!(writer, "\n{}\n", "Session complete.".green().bold()).ok();
    Ok(SessionSummary {
        rounds_played,
        finished: true,
    })
}

fn play_one_round(
    controller: &mut SessionController,
    log: &mut RoundLog,
    overlay: &mut PauseOverlay,
    banner: &mut TerminalBanner,
    rounds_played: &mut usize,
    reader: &mut dyn BufRead,
    writer: &mut dyn Write,
) -> TabletopResult<Result<(), QuitSession>> {
    let snapshot = controller.snapshot();
    writeln!(writer, "\n{}", round_header(&snapshot)).ok();
    writeln!(writer, "{}", roles_table(&snapshot.roles)).ok();
    if let Some(plan) = &snapshot.plan {
        writeln!(writer, "{}", plan_table(plan)).ok();
    }

    // -- Signal --
    let signaler = snapshot.roles.signaler;
    let signal = match prompt_required(&format!("  Signal from {}", vp_label(signaler)), reader, writer) {
        Some(s) => s,
        None => return Ok(Err(QuitSession)),
    };
    let event = RoundEvent::new(&player_label(signaler), "signal", signaler).with_signal(&signal);
    log.write_round_log(controller, event, &PlainFormatter)?;

    // -- Decision --
    let judge = snapshot.roles.judge;
    let decision = match prompt_required(&format!("  Decision of {}", vp_label(judge)), reader, writer) {
        Some(d) => d,
        None => return Ok(Err(QuitSession)),
    };
    let event = RoundEvent::new(&player_label(judge), "decision", judge)
        .with_signal(&signal)
        .with_decision(&decision);
    log.write_round_log(controller, event, &PlainFormatter)?;
    // Both events are logged; the round is complete before any pause.
    *rounds_played += 1;

    // -- Advance --
    let next = controller.prepare_next_round(false)?;
    overlay.update(&next, None, banner)?;
    if banner.visible {
        writeln!(writer, "\n{}", pause_banner(&banner.message)).ok();
    }
    if next.in_block_pause {
        let answer = prompt("  Press Enter to continue", Some(""), reader, writer);
        if answer.eq_ignore_ascii_case("q") {
            return Ok(Err(QuitSession));
        }
        let resumed = controller.resume();
        overlay.update(&resumed, None, banner)?;
    }
    Ok(Ok(()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blocks::{BlockRecord, Hand, RoundPlan};
    use crate::state::StartMode;

    fn two_blocks() -> Vec<BlockRecord> {
        vec![
            BlockRecord {
                index: 1,
                practice: false,
                rounds: vec![RoundPlan::new(Hand(1, 2), Hand(3, 4))],
            },
            BlockRecord {
                index: 2,
                practice: false,
                rounds: vec![RoundPlan::new(Hand(5, 6), Hand(7, 8))],
            },
        ]
    }

    #[test]
    fn test_player_label() {
        assert_eq!(player_label(Vp::Vp1), "P1");
        assert_eq!(player_label(Vp::Vp2), "P2");
    }

    #[test]
    fn test_quit_immediately() {
        let mut controller = SessionController::new(two_blocks(), StartMode::C).unwrap();
        let mut log = RoundLog::new("s1");
        let input = b"q\n";
        let mut reader = &input[..];
        let mut output = Vec::new();
        let summary = run_interactive_session(&mut controller, &mut log, &mut reader, &mut output).unwrap();
        assert_eq!(summary.rounds_played, 0);
        assert!(!summary.finished);
        assert!(log.is_empty());
    }

    #[test]
    fn test_empty_answer_is_asked_again() {
        let mut controller = SessionController::new(two_blocks(), StartMode::C).unwrap();
        let mut log = RoundLog::new("s1");
        let input = b"\nup\nq\n";
        let mut reader = &input[..];
        let mut output = Vec::new();
        run_interactive_session(&mut controller, &mut log, &mut reader, &mut output).unwrap();
        assert_eq!(log.len(), 1);
        assert_eq!(log.records()[0].signal.as_deref(), Some("up"));
    }
}
