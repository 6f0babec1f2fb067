//! Busylight session with keep-alive.
//!
//! Busylights switch themselves off after 30 seconds without any traffic. A
//! dedicated control thread owns the HID handle, applies color changes and
//! re-sends the current color whenever the device has been idle for the
//! keep-alive interval. No other thread ever writes to the handle.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, SyncSender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use hidapi::HidDevice;
use log::{debug, log_enabled, trace, warn, Level};

use crate::color::Rgb;
use crate::controller::SharedController;
use crate::error::{Error, Result};

/// Default time between keep-alive writes.
pub const KEEP_ALIVE_INTERVAL: Duration = Duration::from_secs(20);

/// Writable HID handle.
///
/// The handle is released by dropping it.
pub trait HidWrite: Send + 'static {
    /// Write a single packet to the device.
    fn write(&mut self, packet: &[u8]) -> Result<usize>;
}

impl HidWrite for HidDevice {
    fn write(&mut self, packet: &[u8]) -> Result<usize> {
        HidDevice::write(self, packet).map_err(|err| Error::WriteFailed(err.to_string()))
    }
}

/// Capabilities shared by all indicator lights.
pub trait Indicator {
    /// Hand a new color to the device.
    ///
    /// Returns once the request has been accepted, not once it was written.
    fn set_color(&self, color: Rgb) -> Result<()>;

    /// Turn the indicator white and release the device.
    fn close(&self) -> Result<()>;

    /// Check if the device was released.
    fn is_closed(&self) -> bool;

    /// Keep the device active without color updates.
    fn set_keep_active(&self, keep_active: bool) -> Result<()>;
}

/// Session configuration.
#[derive(Debug, Copy, Clone)]
pub struct SessionConfig {
    /// Maximum idle time before the current color is re-sent.
    pub keep_alive: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self { keep_alive: KEEP_ALIVE_INTERVAL }
    }
}

/// Requests handled by the control thread.
#[derive(Debug)]
enum Command {
    SetColor(Rgb),
    Close,
}

/// Running busylight.
pub struct DeviceSession {
    name: &'static str,
    commands: SyncSender<Command>,
    closed: Arc<AtomicBool>,
    worker: Option<JoinHandle<()>>,
}

impl DeviceSession {
    /// Start a session with the default keep-alive interval.
    pub fn new<H: HidWrite>(handle: H, controller: SharedController) -> Result<Self> {
        Self::with_config(handle, controller, SessionConfig::default())
    }

    /// Start a session, taking exclusive ownership of the HID handle.
    pub fn with_config<H: HidWrite>(
        handle: H,
        controller: SharedController,
        config: SessionConfig,
    ) -> Result<Self> {
        let name = controller.name();

        // Without buffering, sending only completes once the control thread took the request.
        let (commands, receiver) = mpsc::sync_channel(0);
        let closed = Arc::new(AtomicBool::new(false));

        let control_loop = ControlLoop {
            keep_alive: config.keep_alive,
            closed: closed.clone(),
            current: Rgb::OFF,
            controller,
            receiver,
            handle,
        };
        let worker =
            thread::Builder::new().name(format!("{name} control")).spawn(move || control_loop.run())?;

        debug!("{name}: session started");

        Ok(Self { name, commands, closed, worker: Some(worker) })
    }

    /// Model name of the controlled device.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Hand a request to the control thread.
    fn submit(&self, command: Command) -> Result<()> {
        if self.is_closed() {
            return Err(Error::UseAfterClose);
        }

        // Fails once the control thread has dropped its receiver.
        self.commands.send(command).map_err(|_| Error::UseAfterClose)
    }
}

impl Indicator for DeviceSession {
    fn set_color(&self, color: Rgb) -> Result<()> {
        self.submit(Command::SetColor(color))
    }

    fn close(&self) -> Result<()> {
        self.submit(Command::Close)
    }

    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    fn set_keep_active(&self, _keep_active: bool) -> Result<()> {
        Err(Error::KeepActiveNotSupported)
    }
}

impl Drop for DeviceSession {
    fn drop(&mut self) {
        // Already closed sessions reject this, which is fine.
        let _ = self.submit(Command::Close);

        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                warn!("{}: control thread panicked", self.name);
            }
        }
    }
}

/// State owned by the control thread.
struct ControlLoop<H> {
    handle: H,
    controller: SharedController,
    receiver: Receiver<Command>,
    closed: Arc<AtomicBool>,
    keep_alive: Duration,
    current: Rgb,
}

impl<H: HidWrite> ControlLoop<H> {
    fn run(mut self) {
        let mut deadline = Instant::now() + self.keep_alive;

        loop {
            let timeout = deadline.saturating_duration_since(Instant::now());
            match self.receiver.recv_timeout(timeout) {
                Ok(Command::SetColor(color)) => {
                    self.current = color;
                    self.write(color);
                },
                Err(RecvTimeoutError::Timeout) => {
                    trace!("{}: keep-alive", self.controller.name());
                    self.write(self.current);
                },
                // A dropped session is treated like a close request.
                Ok(Command::Close) | Err(RecvTimeoutError::Disconnected) => break,
            }

            // Every write resets the device's idle timer.
            deadline = Instant::now() + self.keep_alive;
        }

        self.write(Rgb::WHITE);

        let ControlLoop { handle, controller, closed, .. } = self;
        drop(handle);
        closed.store(true, Ordering::Release);

        debug!("{}: session closed", controller.name());
    }

    /// Write a color to the device.
    ///
    /// Failures are logged and otherwise ignored, the next write is another attempt.
    fn write(&mut self, color: Rgb) {
        let name = self.controller.name();

        for packet in self.controller.color_bytes(color) {
            trace!("{name}: writing {color}");

            if let Err(err) = self.handle.write(&packet) {
                warn!("{name}: {err}");
            }
        }

        if log_enabled!(Level::Trace) {
            if let Some(frame) = self.controller.diagnostic_bytes(color) {
                trace!("{name}: diagnostic frame {}", hex(&frame));
            }
        }
    }
}

/// Lowercase hex representation of a byte slice.
fn hex(bytes: &[u8]) -> String {
    bytes.iter().map(|byte| format!("{byte:02x}")).collect()
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicUsize;
    use std::sync::Mutex;

    use super::*;
    use crate::busylight_lync::BusylightLync;
    use crate::busylight_uc::{self, BusylightUc};

    /// Shared view on everything written to a [`RecordingHandle`].
    #[derive(Clone, Default)]
    struct Recorder {
        packets: Arc<Mutex<Vec<Vec<u8>>>>,
        released: Arc<AtomicBool>,
        failures: Arc<AtomicUsize>,
    }

    impl Recorder {
        fn handle(&self) -> RecordingHandle {
            RecordingHandle(self.clone())
        }

        fn packets(&self) -> Vec<Vec<u8>> {
            self.packets.lock().unwrap().clone()
        }

        fn released(&self) -> bool {
            self.released.load(Ordering::SeqCst)
        }
    }

    struct RecordingHandle(Recorder);

    impl HidWrite for RecordingHandle {
        fn write(&mut self, packet: &[u8]) -> Result<usize> {
            let failures = &self.0.failures;
            if failures.load(Ordering::SeqCst) > 0 {
                failures.fetch_sub(1, Ordering::SeqCst);
                return Err(Error::WriteFailed("unplugged".into()));
            }

            self.0.packets.lock().unwrap().push(packet.to_vec());
            Ok(packet.len())
        }
    }

    impl Drop for RecordingHandle {
        fn drop(&mut self) {
            self.0.released.store(true, Ordering::SeqCst);
        }
    }

    fn uc_session(recorder: &Recorder, keep_alive: Duration) -> DeviceSession {
        let config = SessionConfig { keep_alive };
        DeviceSession::with_config(recorder.handle(), Arc::new(BusylightUc), config).unwrap()
    }

    fn frame(color: Rgb) -> Vec<u8> {
        busylight_uc::color_frame(color).to_vec()
    }

    fn wait_until(condition: impl Fn() -> bool) {
        let start = Instant::now();
        while !condition() {
            assert!(start.elapsed() < Duration::from_secs(5), "timed out");
            thread::sleep(Duration::from_millis(5));
        }
    }

    #[test]
    fn last_color_wins() {
        let recorder = Recorder::default();
        let session = uc_session(&recorder, Duration::from_secs(60));

        let colors = [Rgb::new(0xff, 0, 0), Rgb::new(0, 0xff, 0), Rgb::new(0, 0, 0xff)];
        for color in &colors {
            session.set_color(*color).unwrap();
        }
        session.close().unwrap();
        wait_until(|| session.is_closed());

        let expected = vec![frame(colors[0]), frame(colors[1]), frame(colors[2]), frame(Rgb::WHITE)];
        assert_eq!(recorder.packets(), expected);
    }

    #[test]
    fn keep_alive_resends_current_color() {
        let recorder = Recorder::default();
        let session = uc_session(&recorder, Duration::from_millis(20));

        let red = Rgb::new(0xff, 0, 0);
        session.set_color(red).unwrap();
        let red_writes = || recorder.packets().iter().filter(|packet| *packet == &frame(red)).count();
        wait_until(|| red_writes() >= 3);
        session.close().unwrap();
        wait_until(|| session.is_closed());

        let packets = recorder.packets();
        let (last, rest) = packets.split_last().unwrap();
        assert_eq!(last, &frame(Rgb::WHITE));

        // Keep-alives before the first color carry the initial off color.
        let first_red = rest.iter().position(|packet| packet == &frame(red)).unwrap();
        assert!(rest[..first_red].iter().all(|packet| packet == &frame(Rgb::OFF)));
        assert!(rest[first_red..].iter().all(|packet| packet == &frame(red)));
    }

    #[test]
    fn keep_alive_starts_with_off() {
        let recorder = Recorder::default();
        let _session = uc_session(&recorder, Duration::from_millis(10));

        wait_until(|| !recorder.packets().is_empty());
        assert_eq!(recorder.packets()[0], frame(Rgb::OFF));
    }

    #[test]
    fn close_writes_white_once_and_releases() {
        let recorder = Recorder::default();
        let session = uc_session(&recorder, Duration::from_secs(60));

        assert!(!session.is_closed());
        session.close().unwrap();
        wait_until(|| session.is_closed());

        assert!(recorder.released());
        assert_eq!(recorder.packets(), vec![frame(Rgb::WHITE)]);

        // Closing is irreversible.
        thread::sleep(Duration::from_millis(20));
        assert!(session.is_closed());
    }

    #[test]
    fn use_after_close_fails_fast() {
        let recorder = Recorder::default();
        let session = uc_session(&recorder, Duration::from_secs(60));

        session.close().unwrap();
        assert!(matches!(session.close(), Err(Error::UseAfterClose)));

        wait_until(|| session.is_closed());
        assert!(matches!(session.set_color(Rgb::WHITE), Err(Error::UseAfterClose)));
        assert!(matches!(session.close(), Err(Error::UseAfterClose)));
        assert_eq!(recorder.packets(), vec![frame(Rgb::WHITE)]);
    }

    #[test]
    fn is_closed_during_color_updates() {
        let recorder = Recorder::default();
        let session = uc_session(&recorder, Duration::from_secs(60));
        let done = AtomicBool::new(false);

        thread::scope(|scope| {
            scope.spawn(|| {
                while !done.load(Ordering::SeqCst) {
                    assert!(!session.is_closed());
                }
            });

            for i in 0..50 {
                session.set_color(Rgb::new(i, i, i)).unwrap();
            }
            done.store(true, Ordering::SeqCst);
        });

        session.close().unwrap();
        wait_until(|| session.is_closed());
        assert_eq!(recorder.packets().len(), 51);
    }

    #[test]
    fn keep_active_not_supported() {
        let recorder = Recorder::default();
        let session = uc_session(&recorder, Duration::from_secs(60));

        assert!(matches!(session.set_keep_active(true), Err(Error::KeepActiveNotSupported)));
        assert!(matches!(session.set_keep_active(false), Err(Error::KeepActiveNotSupported)));

        session.close().unwrap();
        wait_until(|| session.is_closed());
        assert_eq!(recorder.packets(), vec![frame(Rgb::WHITE)]);
    }

    #[test]
    fn write_failure_keeps_running() {
        let recorder = Recorder::default();
        recorder.failures.store(1, Ordering::SeqCst);
        let session = uc_session(&recorder, Duration::from_secs(60));

        let blue = Rgb::new(0, 0, 0xff);
        session.set_color(Rgb::new(0xff, 0, 0)).unwrap();
        session.set_color(blue).unwrap();
        session.close().unwrap();
        wait_until(|| session.is_closed());

        assert_eq!(recorder.packets(), vec![frame(blue), frame(Rgb::WHITE)]);
    }

    #[test]
    fn drop_closes_device() {
        let recorder = Recorder::default();
        let session = uc_session(&recorder, Duration::from_secs(60));

        session.set_color(Rgb::new(0x12, 0x34, 0x56)).unwrap();
        drop(session);

        assert!(recorder.released());
        assert_eq!(recorder.packets().last(), Some(&frame(Rgb::WHITE)));
    }

    #[test]
    fn lync_writes_primary_frame_only() {
        let recorder = Recorder::default();
        let config = SessionConfig { keep_alive: Duration::from_secs(60) };
        let session =
            DeviceSession::with_config(recorder.handle(), Arc::new(BusylightLync), config).unwrap();
        assert_eq!(session.name(), "BusyLight Lync");

        let color = Rgb::new(0xab, 0xcd, 0xef);
        session.set_color(color).unwrap();
        session.close().unwrap();
        wait_until(|| session.is_closed());

        assert_eq!(recorder.packets(), vec![frame(color), frame(Rgb::WHITE)]);
    }

    #[test]
    fn hex_encoding() {
        assert_eq!(hex(&[0x00, 0x04, 0xab, 0xff]), "0004abff");
    }
}
