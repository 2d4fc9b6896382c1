//! End-to-end tests for the camera session
//!
//! Each test starts one or more fake camerad servers on loopback ports and
//! drives a real [`Session`] against them over TCP:
//!
//! - command fan-out to every host and reply aggregation
//! - open/load/close sequences as seen on the wire
//! - magic board register writes
//! - shell lines dispatched through `parse_line` + `execute`
//!
//! Run: `cargo test --test session`

use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpListener;

use camerad_client::magicboard::{self, BoardElement, Identifier, MagicboardRun, RunOptions};
use camerad_client::{
    execute, parse_line, ClientConfig, HostEntry, HostSelection, HostTable, LoadOptions,
    OpenOptions, PowerState, Session, SessionError, ShellAction,
};

// ── Fake camerad ─────────────────────────────────────────────────────

type Responder = Arc<dyn Fn(&str) -> Option<String> + Send + Sync>;
type Delay = Arc<dyn Fn(&str) -> Duration + Send + Sync>;

/// A loopback camerad that records every line and answers via `respond`.
/// Returning `None` leaves the command unanswered.
struct FakeCamerad {
    entry: HostEntry,
    received: Arc<Mutex<Vec<String>>>,
}

impl FakeCamerad {
    async fn start(id: u32, respond: Responder) -> Self {
        Self::start_delayed(id, respond, Arc::new(|_: &str| Duration::ZERO)).await
    }

    /// Like `start`, but holds each reply back for `delay(line)`.
    async fn start_delayed(id: u32, respond: Responder, delay: Delay) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let received = Arc::new(Mutex::new(Vec::new()));

        let log = Arc::clone(&received);
        tokio::spawn(async move {
            loop {
                let Ok((socket, _)) = listener.accept().await else {
                    return;
                };
                let log = Arc::clone(&log);
                let respond = Arc::clone(&respond);
                let delay = Arc::clone(&delay);
                tokio::spawn(async move {
                    let (read, mut write) = socket.into_split();
                    let mut lines = BufReader::new(read).lines();
                    while let Ok(Some(line)) = lines.next_line().await {
                        log.lock().unwrap().push(line.clone());
                        if let Some(reply) = respond(&line) {
                            let wait = delay(&line);
                            if !wait.is_zero() {
                                tokio::time::sleep(wait).await;
                            }
                            if write.write_all(reply.as_bytes()).await.is_err() {
                                return;
                            }
                        }
                    }
                });
            }
        });

        Self {
            entry: HostEntry::new(id, format!("camera{id}"), "127.0.0.1", port),
            received,
        }
    }

    /// Answers every command with `DONE`.
    async fn done(id: u32) -> Self {
        Self::start(id, Arc::new(|_: &str| Some("DONE\n".to_string()))).await
    }

    fn lines(&self) -> Vec<String> {
        self.received.lock().unwrap().clone()
    }

    fn clear(&self) {
        self.received.lock().unwrap().clear();
    }
}

fn session_for(servers: &[&FakeCamerad], reply_timeout_secs: f64) -> Session {
    let table = HostTable::new(servers.iter().map(|s| s.entry.clone()).collect()).unwrap();
    let config = ClientConfig {
        reply_timeout_secs,
        ..ClientConfig::default()
    };
    Session::new(table, config)
}

fn is_image_name(value: &str, basename: &str) -> bool {
    let stamp = match basename {
        "" => value,
        b => match value.strip_prefix(b).and_then(|rest| rest.strip_prefix('_')) {
            Some(rest) => rest,
            None => return false,
        },
    };
    stamp.len() == 15
        && stamp.as_bytes()[8] == b'_'
        && stamp
            .chars()
            .enumerate()
            .all(|(i, c)| i == 8 || c.is_ascii_digit())
}

// ── Lifecycle ────────────────────────────────────────────────────────

#[tokio::test]
async fn open_initializes_every_host() {
    let cam1 = FakeCamerad::done(1).await;
    let cam2 = FakeCamerad::done(2).await;
    let mut session = session_for(&[&cam1, &cam2], 2.0);

    session
        .open(&HostSelection::All, OpenOptions::default())
        .await
        .unwrap();
    assert_eq!(session.connected_hosts().len(), 2);
    assert_eq!(session.stats().connected_hosts, 2);

    for cam in [&cam1, &cam2] {
        let lines = cam.lines();
        assert_eq!(&lines[..3], ["open", "load", "POWERON"]);
        let name = lines[3].strip_prefix("basename ").unwrap();
        assert!(is_image_name(name, ""), "bad image name {name}");
        assert_eq!(&lines[4..], ["exptime 0", "mode DEFAULT"]);
    }
    assert!(session.camera_settings().power_on);
}

#[tokio::test]
async fn open_without_load_only_sends_open() {
    let cam = FakeCamerad::done(1).await;
    let mut session = session_for(&[&cam], 2.0);

    session
        .open(&HostSelection::Ids(vec![1]), OpenOptions::connect_only())
        .await
        .unwrap();
    assert_eq!(cam.lines(), ["open"]);
}

#[tokio::test]
async fn open_stops_at_the_first_failing_step() {
    let cam = FakeCamerad::start(
        1,
        Arc::new(|line: &str| match line {
            "load" => Some("ERROR\n".to_string()),
            _ => Some("DONE\n".to_string()),
        }),
    )
    .await;
    let mut session = session_for(&[&cam], 2.0);

    assert!(matches!(
        session.open(&HostSelection::All, OpenOptions::default()).await,
        Err(SessionError::CommandFailed { .. })
    ));
    assert_eq!(cam.lines(), ["open", "load"]);
    assert!(!session.camera_settings().power_on);
    // sockets stay open so the caller can still close
    assert!(session.is_connected());
}

#[tokio::test]
async fn open_local_skips_remote_hosts() {
    let cam = FakeCamerad::done(1).await;
    let remote = HostEntry::new(2, "remote", "192.0.2.1", 3031);
    let table = HostTable::new(vec![cam.entry.clone(), remote]).unwrap();
    let mut session = Session::new(table, ClientConfig::default());

    session
        .open(&HostSelection::Local, OpenOptions::connect_only())
        .await
        .unwrap();
    let connected: Vec<u32> = session.connected_hosts().iter().map(|h| h.id).collect();
    assert_eq!(connected, [1]);
    assert_eq!(cam.lines(), ["open"]);
}

#[tokio::test]
async fn close_sends_close_and_drops_sockets() {
    let cam = FakeCamerad::done(1).await;
    let mut session = session_for(&[&cam], 2.0);
    session
        .open(&HostSelection::All, OpenOptions::connect_only())
        .await
        .unwrap();

    session.close().await.unwrap();
    assert!(!session.is_connected());
    assert_eq!(cam.lines().last().map(String::as_str), Some("close"));
    assert_eq!(session.stats().connected_hosts, 0);

    assert!(matches!(
        session.read_param("Gain").await,
        Err(SessionError::NotConnected)
    ));
}

#[tokio::test]
async fn close_still_disconnects_when_camerad_errors() {
    let cam = FakeCamerad::start(
        1,
        Arc::new(|line: &str| Some((if line == "close" { "ERROR\n" } else { "DONE\n" }).to_string())),
    )
    .await;
    let mut session = session_for(&[&cam], 2.0);
    session.connect(&HostSelection::All).await.unwrap();

    assert!(matches!(
        session.close().await,
        Err(SessionError::CommandFailed { .. })
    ));
    assert!(!session.is_connected());
}

// ── Reply aggregation ────────────────────────────────────────────────

#[tokio::test]
async fn agreeing_hosts_return_the_value() {
    let respond: Responder = Arc::new(|line: &str| match line {
        "getp Gain" => Some("4 DONE\n".to_string()),
        _ => Some("DONE\n".to_string()),
    });
    let cam1 = FakeCamerad::start(1, Arc::clone(&respond)).await;
    let cam2 = FakeCamerad::start(2, respond).await;
    let mut session = session_for(&[&cam1, &cam2], 2.0);
    session.connect(&HostSelection::All).await.unwrap();

    assert_eq!(session.read_param("Gain").await.unwrap(), "4");
    assert_eq!(session.stats().commands_sent, 1);
    assert_eq!(session.stats().command_failures, 0);
    assert!(session.stats().last_command_latency.is_some());
}

#[tokio::test]
async fn divergent_hosts_are_reported() {
    let cam1 = FakeCamerad::start(1, Arc::new(|_: &str| Some("10 DONE\n".to_string()))).await;
    let cam2 = FakeCamerad::start(2, Arc::new(|_: &str| Some("11 DONE\n".to_string()))).await;
    let mut session = session_for(&[&cam1, &cam2], 2.0);
    session.connect(&HostSelection::All).await.unwrap();

    match session.read_param("Lines").await {
        Err(SessionError::DivergentReplies { command, values }) => {
            assert_eq!(command, "getp Lines");
            assert_eq!(
                values,
                vec![
                    ("camera1".to_string(), "10".to_string()),
                    ("camera2".to_string(), "11".to_string())
                ]
            );
        }
        other => panic!("expected divergent replies, got {other:?}"),
    }
    assert_eq!(session.stats().divergent_replies, 1);
}

#[tokio::test]
async fn error_reply_fails_the_command() {
    let cam = FakeCamerad::start(1, Arc::new(|_: &str| Some("ERROR\n".to_string()))).await;
    let mut session = session_for(&[&cam], 2.0);
    session.connect(&HostSelection::All).await.unwrap();

    match session.set_param("BitLevel", 2).await {
        Err(SessionError::CommandFailed { command, hosts }) => {
            assert_eq!(command, "setp BitLevel 2");
            assert_eq!(hosts, vec!["camera1".to_string()]);
        }
        other => panic!("expected failure, got {other:?}"),
    }
    assert_eq!(session.stats().command_failures, 1);
}

#[tokio::test]
async fn silent_host_times_out() {
    let quick = FakeCamerad::done(1).await;
    let silent = FakeCamerad::start(
        2,
        Arc::new(|line: &str| {
            if line.starts_with("expose") {
                None
            } else {
                Some("DONE\n".to_string())
            }
        }),
    )
    .await;
    let mut session = session_for(&[&quick, &silent], 0.2);
    session.connect(&HostSelection::All).await.unwrap();

    match session.expose(0.0, 1).await {
        Err(SessionError::CommandFailed { hosts, .. }) => {
            assert_eq!(hosts, vec!["camera2".to_string()]);
        }
        other => panic!("expected timeout failure, got {other:?}"),
    }
    assert_eq!(session.stats().reply_timeouts, 1);
    assert_eq!(session.lost_hosts(), ["camera2"]);
    assert_eq!(session.connected_hosts().len(), 1);
    assert_eq!(session.stats().connected_hosts, 1);
}

#[tokio::test]
async fn late_reply_is_never_taken_for_the_next_one() {
    let cam = FakeCamerad::start_delayed(
        1,
        Arc::new(|line: &str| match line {
            "getp A" => Some("6 DONE\n".to_string()),
            "getp LongerName" => Some("15 DONE\n".to_string()),
            _ => Some("DONE\n".to_string()),
        }),
        Arc::new(|line: &str| {
            if line == "getp A" {
                Duration::from_millis(400)
            } else {
                Duration::ZERO
            }
        }),
    )
    .await;
    let mut session = session_for(&[&cam], 0.2);
    session.connect(&HostSelection::All).await.unwrap();

    assert!(matches!(
        session.read_param("A").await,
        Err(SessionError::CommandFailed { .. })
    ));
    assert!(!session.is_connected());
    assert_eq!(session.stats().connected_hosts, 0);

    // wait out the late reply; it must not answer the next command
    tokio::time::sleep(Duration::from_millis(300)).await;
    match session.read_param("LongerName").await {
        Err(SessionError::HostsLost { hosts }) => assert_eq!(hosts, ["camera1"]),
        other => panic!("expected lost hosts, got {other:?}"),
    }

    session.connect(&HostSelection::All).await.unwrap();
    assert!(session.lost_hosts().is_empty());
    assert_eq!(session.read_param("LongerName").await.unwrap(), "15");
}

#[tokio::test]
async fn close_after_lost_reply_still_drops_everything() {
    let silent = FakeCamerad::start(1, Arc::new(|_: &str| None)).await;
    let mut session = session_for(&[&silent], 0.2);
    session.connect(&HostSelection::All).await.unwrap();

    assert!(session.read_param("Gain").await.is_err());
    assert!(matches!(
        session.close().await,
        Err(SessionError::HostsLost { .. })
    ));
    assert!(session.lost_hosts().is_empty());
    assert!(session.close().await.is_ok());
    assert_eq!(silent.lines(), ["getp Gain"]);
}

// ── Wire safety ──────────────────────────────────────────────────────

#[tokio::test]
async fn embedded_line_breaks_never_reach_camerad() {
    let cam = FakeCamerad::done(1).await;
    let mut session = session_for(&[&cam], 2.0);
    session.connect(&HostSelection::All).await.unwrap();

    assert!(matches!(
        session.set_basename("dark\nPOWEROFF").await,
        Err(SessionError::InvalidBasename(_))
    ));
    assert!(matches!(
        session.set_mode("RAW\rPOWEROFF").await,
        Err(SessionError::InvalidMode(_))
    ));
    assert!(matches!(
        session.set_param("Label", "x\nPOWEROFF").await,
        Err(SessionError::LineBreak(_))
    ));
    assert!(matches!(
        session.send(["getp", "Gain\nPOWEROFF"]).await,
        Err(SessionError::LineBreak(_))
    ));

    assert!(cam.lines().is_empty());
    assert_eq!(session.stats().commands_sent, 0);
    assert_eq!(session.camera_settings().basename, "");
}

// ── Settings traffic ─────────────────────────────────────────────────

#[tokio::test]
async fn mode_and_basename_only_sent_on_change() {
    let cam = FakeCamerad::done(1).await;
    let mut session = session_for(&[&cam], 2.0);
    session.connect(&HostSelection::All).await.unwrap();

    session.set_mode("DEFAULT").await.unwrap();
    session.set_mode("RAW").await.unwrap();
    session.set_mode("RAW").await.unwrap();
    session.set_basename("flat").await.unwrap();
    session.set_basename("flat").await.unwrap();

    assert_eq!(cam.lines(), ["mode RAW", "basename flat"]);
    assert_eq!(session.camera_settings().mode, "RAW");
    assert_eq!(session.camera_settings().basename, "flat");
}

#[tokio::test]
async fn power_commands_reach_camerad() {
    let cam = FakeCamerad::done(1).await;
    let mut session = session_for(&[&cam], 2.0);
    session.connect(&HostSelection::All).await.unwrap();

    session.set_power(PowerState::Off).await.unwrap();
    assert!(!session.camera_settings().power_on);
    session.set_power(PowerState::On).await.unwrap();
    assert!(session.camera_settings().power_on);
    assert_eq!(cam.lines(), ["POWEROFF", "POWERON"]);
}

#[tokio::test]
async fn expose_sends_iterations_and_records_exptime() {
    let cam = FakeCamerad::done(1).await;
    let mut session = session_for(&[&cam], 2.0);
    session.connect(&HostSelection::All).await.unwrap();

    session.expose(2.5, 3).await.unwrap();
    assert_eq!(cam.lines(), ["expose 3"]);
    assert_eq!(session.exposure_settings().exptime(), 2.5);

    cam.clear();
    session.setup_observation().await.unwrap();
    assert_eq!(cam.lines()[1], "exptime 2.5");
}

#[tokio::test]
async fn load_expands_path_and_sets_power() {
    let cam = FakeCamerad::done(1).await;
    let mut session = session_for(&[&cam], 2.0);
    session.connect(&HostSelection::All).await.unwrap();

    let acf = tempfile::Builder::new().suffix(".acf").tempfile().unwrap();
    let options = LoadOptions {
        mode: "RAW".into(),
        basename: "dark".into(),
        power: PowerState::Off,
        ..LoadOptions::default()
    };
    session.load(acf.path(), options).await.unwrap();

    let lines = cam.lines();
    let loaded = lines[0].strip_prefix("load ").unwrap();
    assert!(Path::new(loaded).is_absolute());
    assert_eq!(lines[1], "POWEROFF");
    let name = lines[2].strip_prefix("basename ").unwrap();
    assert!(is_image_name(name, "dark"), "bad image name {name}");
    assert_eq!(&lines[3..], ["exptime 0", "mode RAW"]);
    assert!(!session.camera_settings().power_on);
}

// ── Magic board ──────────────────────────────────────────────────────

#[tokio::test]
async fn magicboard_writes_register_then_exposes() {
    let cam = FakeCamerad::done(1).await;
    let mut session = session_for(&[&cam], 2.0);
    session.connect(&HostSelection::All).await.unwrap();

    let board = MagicboardRun {
        acf_file: None,
        p_in: Identifier::new(BoardElement::Driver, 1),
        n_in: Identifier::new(BoardElement::Dnl, 0),
        p_out: Identifier::new(BoardElement::Hvlc, 2),
        n_out: Identifier::new(BoardElement::Hvhc, 0),
        iterations: 2,
        read_cds: false,
        timeit: true,
        delay: Duration::ZERO,
    };
    magicboard::magicboard(&mut session, &board).await.unwrap();

    let lines = cam.lines();
    assert_eq!(lines[0], "basename zzmagic");
    let bits: Vec<&str> = lines
        .iter()
        .filter_map(|l| l.strip_prefix("setp BitLevel "))
        .map(|s| s.trim())
        .collect();
    assert_eq!(bits.len(), 4 * 6 + 4);
    // driver,1 is 000001; its last character goes out first as level 2
    assert_eq!(&bits[..6], ["2", "1", "1", "1", "1", "1"]);
    assert_eq!(lines.last().map(String::as_str), Some("expose 2"));
}

#[tokio::test]
async fn run_names_and_exposes() {
    let cam = FakeCamerad::done(1).await;
    let mut session = session_for(&[&cam], 2.0);
    session.connect(&HostSelection::All).await.unwrap();

    let options = RunOptions {
        iterations: 3,
        exptime: 1.5,
        ..RunOptions::default()
    };
    magicboard::run(&mut session, &options).await.unwrap();

    assert_eq!(cam.lines(), ["basename zztf", "expose 3"]);
    assert_eq!(session.exposure_settings().exptime(), 1.5);
    assert_eq!(session.exposure_settings().iterations(), 3);
    assert_eq!(
        session.camera_settings().compression,
        camerad_client::Compression::None
    );
}

#[tokio::test]
async fn run_loads_an_existing_acf_in_raw_mode() {
    let cam = FakeCamerad::done(1).await;
    let mut session = session_for(&[&cam], 2.0);
    session.connect(&HostSelection::All).await.unwrap();

    let acf = tempfile::Builder::new().suffix(".acf").tempfile().unwrap();
    let options = RunOptions {
        acf_file: Some(acf.path().to_path_buf()),
        ..RunOptions::default()
    };
    magicboard::run(&mut session, &options).await.unwrap();

    let lines = cam.lines();
    assert_eq!(lines[0], format!("load {}", acf.path().display()));
    assert_eq!(lines[1], "POWERON");
    assert_eq!(&lines[3..], ["exptime 0", "mode RAW", "basename zztf", "expose 1"]);
    assert_eq!(session.camera_settings().mode, "RAW");
}

#[tokio::test]
async fn magicboard_loads_in_default_mode_for_cds() {
    let cam = FakeCamerad::done(1).await;
    let mut session = session_for(&[&cam], 2.0);
    session.connect(&HostSelection::All).await.unwrap();

    let acf = tempfile::Builder::new().suffix(".acf").tempfile().unwrap();
    let id = Identifier::new(BoardElement::Null, 0);
    let board = MagicboardRun {
        acf_file: Some(acf.path().to_path_buf()),
        p_in: id,
        n_in: id,
        p_out: id,
        n_out: id,
        iterations: 1,
        read_cds: true,
        timeit: false,
        delay: Duration::ZERO,
    };
    magicboard::magicboard(&mut session, &board).await.unwrap();

    let lines = cam.lines();
    assert!(lines[0].starts_with("load "));
    assert_eq!(lines[4], "mode DEFAULT");
    assert_eq!(lines[5], "basename zzmagic");
    assert_eq!(lines.last().map(String::as_str), Some("expose 1"));
}

#[tokio::test]
async fn missing_acf_is_not_loaded() {
    let cam = FakeCamerad::done(1).await;
    let mut session = session_for(&[&cam], 2.0);
    session.connect(&HostSelection::All).await.unwrap();

    let options = RunOptions {
        acf_file: Some("/nonexistent/camera.acf".into()),
        ..RunOptions::default()
    };
    magicboard::run(&mut session, &options).await.unwrap();
    assert_eq!(cam.lines(), ["basename zztf", "expose 1"]);
}

// ── Shell dispatch ───────────────────────────────────────────────────

#[tokio::test]
async fn shell_lines_drive_the_session() {
    let cam = FakeCamerad::start(
        1,
        Arc::new(|line: &str| match line {
            "getp Gain" => Some("42 DONE\n".to_string()),
            _ => Some("DONE\n".to_string()),
        }),
    )
    .await;
    let mut session = session_for(&[&cam], 2.0);

    let run = |line: &str| match parse_line(line).unwrap() {
        Some(ShellAction::Run(command)) => command,
        other => panic!("unexpected {other:?}"),
    };

    execute(&mut session, run("open --no-load")).await.unwrap();
    let gain = execute(&mut session, run("getp Gain")).await.unwrap();
    assert_eq!(gain.as_deref(), Some("42"));

    execute(&mut session, run("type BIAS")).await.unwrap();
    let report = execute(&mut session, run("settings")).await.unwrap().unwrap();
    assert!(report.contains("type          = 'BIAS'"));

    let raw = execute(&mut session, run("send POWERON")).await.unwrap();
    assert_eq!(raw.as_deref(), Some("DONE"));

    execute(&mut session, run("close")).await.unwrap();
    assert_eq!(cam.lines(), ["open", "getp Gain", "POWERON", "close"]);
}
