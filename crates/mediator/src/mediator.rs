//! The main interactive loop (spec §4.5, §5 "Threads on the client").

use std::io::{self, Read, Write};
use std::os::fd::RawFd;
use std::sync::mpsc;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use frame::{FrameKind, FrameReader, FrameWriter};
use ftcli::FileTransferCli;
use ftproto::FileClient;
use util::term::RawModeGuard;

use crate::cmdend::{CommandEndDetector, Strategy};
use crate::error::MediatorError;
use crate::line_editor::LineEditor;
use crate::sigwinch;

/// The mediator's state machine (spec §4.5 "States of the mediator").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    Booting,
    Editing,
    AwaitingCmdEnd,
    AwaitingPossiblePaths,
    Closing,
}

enum ServerEvent {
    Output(String),
    SyncAck,
    Teardown,
}

/// Runs the client mediator to completion against `reader`/`writer`,
/// mediating between the raw terminal on `stdin_fd` and the remote
/// session.
pub fn run<R, W>(reader: FrameReader<R>, writer: FrameWriter<W>, stdin_fd: RawFd) -> Result<(), MediatorError>
where
    R: Read + Send + 'static,
    W: Write + Send + Sync + 'static,
{
    let _raw_guard = RawModeGuard::enable(&io::stdin()).map_err(|e| MediatorError::nix("enable raw mode", e))?;

    let writer = Arc::new(writer);
    sigwinch::install(stdin_fd, Arc::clone(&writer))?;

    let (client, inbox) = FileClient::new(Arc::clone(&writer));
    let cli = FileTransferCli::new(client);

    let (events_tx, events_rx) = mpsc::channel::<ServerEvent>();
    spawn_demuxer(reader, inbox, events_tx);

    let (stdin_tx, stdin_rx) = mpsc::channel::<Option<u8>>();
    spawn_stdin_reader(stdin_tx);

    let mut line_editor = LineEditor::new(EchoSink);
    let mut detector = CommandEndDetector::new(Strategy::marker_echo());
    let mut boot_detector = CommandEndDetector::new(Strategy::prompt_regex());
    let mut state = State::Booting;

    loop {
        while let Ok(event) = events_rx.try_recv() {
            match event {
                ServerEvent::Teardown => {
                    state = State::Closing;
                }
                ServerEvent::SyncAck => {}
                ServerEvent::Output(text) => match state {
                    State::Booting => {
                        // Plain (unframed) mode already consumed the
                        // server's banner line before the demuxer ever
                        // started (see `wait_for_banner`); what's left to
                        // wait for here is the shell's own initial prompt,
                        // the same `$`/`#` pattern `Strategy::prompt_regex`
                        // watches for at the end of any other command.
                        let result = boot_detector.feed(&text);
                        write_terminal(&result.forward);
                        if result.finished.is_some() {
                            send_remote_command(&writer, "export TERM=$TERM\n", &mut state);
                        }
                    }
                    State::AwaitingCmdEnd => {
                        let result = detector.feed(&text);
                        write_terminal(&result.forward);
                        if result.finished.is_some() {
                            state = State::Editing;
                        }
                    }
                    State::AwaitingPossiblePaths | State::Editing | State::Closing => {
                        write_terminal(&text);
                    }
                },
            }
        }

        if state == State::Closing {
            let _ = writer.write_frame(FrameKind::End, b"");
            break;
        }

        match stdin_rx.recv_timeout(Duration::from_millis(50)) {
            Ok(Some(byte)) => {
                if state != State::Editing {
                    // A command is still running; treat bytes as literal
                    // keystrokes forwarded straight to the remote shell
                    // (e.g. Ctrl-C to interrupt a long-running program).
                    let _ = writer.write_frame(FrameKind::Terminal, &[byte]);
                    continue;
                }
                if let Some(line) = line_editor.feed_byte(byte) {
                    handle_line(&line, &cli, &writer, &mut state)?;
                }
            }
            Ok(None) => {
                let _ = writer.write_frame(FrameKind::End, b"");
                break;
            }
            Err(mpsc::RecvTimeoutError::Timeout) => continue,
            Err(mpsc::RecvTimeoutError::Disconnected) => break,
        }
    }

    Ok(())
}

fn handle_line<W: Write>(
    line: &str,
    cli: &FileTransferCli<W>,
    writer: &Arc<FrameWriter<W>>,
    state: &mut State,
) -> Result<(), MediatorError> {
    let Some(terminator) = line.chars().last() else {
        return Ok(());
    };
    let body = &line[..line.len() - terminator.len_utf8()];

    if terminator == '\t' {
        let _ = writer.write_frame(FrameKind::Sync, b"");
        *state = State::AwaitingPossiblePaths;
        let names = cli.get_possible_paths(body)?;
        write_terminal(&format!("\r\n{}\r\n", names.join("  ")));
        *state = State::Editing;
        return Ok(());
    }

    if terminator == '\n' || terminator == '\r' {
        if FileTransferCli::<W>::is_cmd_supported(body) {
            let _ = writer.write_frame(FrameKind::Sync, b"");
            match cli.handle(body) {
                Ok(Some(output)) => write_terminal(&output.replace('\n', "\r\n")),
                Ok(None) => {}
                Err(e) => write_terminal(&format!("\r\n{e}\r\n")),
            }
            return Ok(());
        }

        let mut cmd = body.to_string();
        cmd.push(terminator);
        send_remote_command(writer, &cmd, state);
        return Ok(());
    }

    // Ctrl-C (0x03) or Ctrl-R (0x12): forward the raw byte to the remote
    // shell as-is rather than treating it as a command line.
    let mut raw = body.to_string();
    raw.push(terminator);
    let _ = writer.write_frame(FrameKind::Terminal, raw.as_bytes());
    Ok(())
}

/// Writes `cmd` as a `T` frame with the marker suffix appended, and
/// advances `state` to [`State::AwaitingCmdEnd`] so the command-end
/// detector knows to watch for completion.
fn send_remote_command<W: Write>(writer: &Arc<FrameWriter<W>>, cmd: &str, state: &mut State) {
    let mut framed = cmd.to_string();
    if !framed.ends_with('\n') {
        framed.push('\n');
    }
    framed.push_str(crate::cmdend::MARKER_SUFFIX);
    let _ = writer.write_frame(FrameKind::Terminal, framed.as_bytes());
    *state = State::AwaitingCmdEnd;
}

fn write_terminal(text: &str) {
    let mut stdout = io::stdout();
    let translated = text.replace('\n', "\r\n");
    let _ = stdout.write_all(translated.as_bytes());
    let _ = stdout.flush();
}

fn spawn_demuxer<R>(mut reader: FrameReader<R>, inbox: ftproto::FileInbox, events_tx: mpsc::Sender<ServerEvent>)
where
    R: Read + Send + 'static,
{
    thread::spawn(move || loop {
        match reader.read_frame() {
            Ok((FrameKind::Terminal, payload)) => {
                let text = String::from_utf8_lossy(&payload).into_owned();
                if events_tx.send(ServerEvent::Output(text)).is_err() {
                    break;
                }
            }
            Ok((FrameKind::FileTransfer, payload)) => {
                inbox.add_input(payload);
            }
            Ok((FrameKind::Sync, _)) => {
                let _ = events_tx.send(ServerEvent::SyncAck);
            }
            Ok((FrameKind::End, _)) | Err(_) => {
                let _ = events_tx.send(ServerEvent::Teardown);
                break;
            }
            Ok((FrameKind::WindowResize, _)) => {}
        }
    });
}

fn spawn_stdin_reader(tx: mpsc::Sender<Option<u8>>) {
    thread::spawn(move || {
        let mut stdin = io::stdin();
        let mut buf = [0u8; 1];
        loop {
            match stdin.read(&mut buf) {
                Ok(0) => {
                    let _ = tx.send(None);
                    break;
                }
                Ok(_) => {
                    if tx.send(Some(buf[0])).is_err() {
                        break;
                    }
                }
                Err(ref e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(_) => {
                    let _ = tx.send(None);
                    break;
                }
            }
        }
    });
}

/// A `Write` sink used only by the line editor's local echo.
struct EchoSink;

impl Write for EchoSink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        io::stdout().write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        io::stdout().flush()
    }
}
