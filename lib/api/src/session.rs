//! Scan session: the boundary between a barcode sensor and lookups.
//!
//! The sensor is any line-oriented text source. Keyboard-wedge and serial
//! scanners emit one decoded code per line, optionally prefixed with an AIM
//! symbology identifier (`]E0`, `]Q1`, ...), so a device node, a FIFO or
//! stdin can all act as the sensor.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::fmt;
use std::future::Future;
use std::io::{self, BufRead};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("Scanner unavailable: {0}")]
    SensorUnavailable(String),

    #[error("Permission denied opening scanner: {0}")]
    PermissionDenied(String),

    #[error("Invalid scan configuration: {0}")]
    InvalidConfig(String),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// Barcode symbologies a session can accept
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Symbology {
    QrCode,
    Ean13,
    Ean8,
    Code128,
    Code39,
    UpcA,
    UpcE,
    /// AIM code letter with no supported mapping
    Unsupported(char),
}

impl Symbology {
    /// Symbology announced by an AIM identifier `]` + `code` + `modifier`
    pub fn from_aim(code: char, modifier: char) -> Self {
        match (code, modifier) {
            ('Q', _) => Symbology::QrCode,
            ('E', '4') => Symbology::Ean8,
            ('E', _) => Symbology::Ean13,
            ('C', _) => Symbology::Code128,
            ('A', _) => Symbology::Code39,
            (other, _) => Symbology::Unsupported(other),
        }
    }

    /// Formats accepted when a session is started without an explicit list
    pub fn defaults() -> Vec<Symbology> {
        vec![
            Symbology::QrCode,
            Symbology::Ean13,
            Symbology::Ean8,
            Symbology::Code128,
            Symbology::Code39,
            Symbology::UpcA,
            Symbology::UpcE,
        ]
    }

    /// UPC-A and UPC-E travel in EAN-13 form, so accepting either of them
    /// also accepts EAN-13 events.
    fn is_accepted_by(&self, formats: &[Symbology]) -> bool {
        formats.contains(self)
            || (*self == Symbology::Ean13
                && formats
                    .iter()
                    .any(|f| matches!(f, Symbology::UpcA | Symbology::UpcE)))
    }
}

impl fmt::Display for Symbology {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Symbology::QrCode => write!(f, "qr"),
            Symbology::Ean13 => write!(f, "ean13"),
            Symbology::Ean8 => write!(f, "ean8"),
            Symbology::Code128 => write!(f, "code128"),
            Symbology::Code39 => write!(f, "code39"),
            Symbology::UpcA => write!(f, "upca"),
            Symbology::UpcE => write!(f, "upce"),
            Symbology::Unsupported(code) => write!(f, "aim-{}", code),
        }
    }
}

impl FromStr for Symbology {
    type Err = ScanError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace(['-', '_'], "").as_str() {
            "qr" | "qrcode" => Ok(Symbology::QrCode),
            "ean13" => Ok(Symbology::Ean13),
            "ean8" => Ok(Symbology::Ean8),
            "code128" => Ok(Symbology::Code128),
            "code39" => Ok(Symbology::Code39),
            "upca" => Ok(Symbology::UpcA),
            "upce" => Ok(Symbology::UpcE),
            _ => Err(ScanError::InvalidConfig(format!("unknown symbology {:?}", s))),
        }
    }
}

/// Where raw scans are read from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SensorSource {
    Stdin,
    /// Character device or FIFO fed by the scanner
    Device(PathBuf),
}

#[derive(Debug, Clone)]
pub struct ScanConfig {
    pub source: SensorSource,
    pub formats: Vec<Symbology>,
    /// Repeats of the same code inside this window are dropped
    pub debounce: Duration,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            source: SensorSource::Stdin,
            formats: Symbology::defaults(),
            debounce: Duration::from_secs(2),
        }
    }
}

impl ScanConfig {
    pub fn validate(&self) -> Result<(), ScanError> {
        if self.formats.is_empty() {
            return Err(ScanError::InvalidConfig(
                "at least one symbology must be accepted".to_string(),
            ));
        }
        Ok(())
    }
}

/// One successful decode
#[derive(Debug, Clone, PartialEq)]
pub struct ScanEvent {
    pub raw: String,
    /// Known only when the scanner sends AIM identifiers
    pub symbology: Option<Symbology>,
    pub scanned_at: DateTime<Utc>,
}

/// Turns sensor lines into scan events: strips AIM identifiers, drops
/// unaccepted symbologies, empty lines and held-trigger repeats.
#[derive(Debug, Clone)]
pub struct ScanFilter {
    formats: Vec<Symbology>,
    debounce: Duration,
    last: Option<(String, DateTime<Utc>)>,
}

impl ScanFilter {
    pub fn new(config: &ScanConfig) -> Self {
        Self {
            formats: config.formats.clone(),
            debounce: config.debounce,
            last: None,
        }
    }

    pub fn accept(&mut self, line: &str, now: DateTime<Utc>) -> Option<ScanEvent> {
        let line = line.trim_end_matches(['\r', '\n']);
        let (symbology, payload) = split_aim_identifier(line);

        if let Some(symbology) = symbology {
            if !symbology.is_accepted_by(&self.formats) {
                debug!(%symbology, "scan dropped: symbology not accepted");
                return None;
            }
        }

        let key = payload.trim();
        if key.is_empty() {
            return None;
        }

        if let Some((last_code, last_time)) = &self.last {
            // a clock that went backwards counts as inside the window
            let within_window = now
                .signed_duration_since(*last_time)
                .to_std()
                .map(|elapsed| elapsed < self.debounce)
                .unwrap_or(true);
            if last_code == key && within_window {
                debug!(code = key, "scan dropped: repeat inside debounce window");
                return None;
            }
        }
        self.last = Some((key.to_string(), now));

        Some(ScanEvent {
            raw: payload.to_string(),
            symbology,
            scanned_at: now,
        })
    }
}

fn split_aim_identifier(line: &str) -> (Option<Symbology>, &str) {
    let mut chars = line.chars();
    match (chars.next(), chars.next(), chars.next()) {
        (Some(']'), Some(code), Some(modifier))
            if code.is_ascii_alphabetic() && modifier.is_ascii_alphanumeric() =>
        {
            (Some(Symbology::from_aim(code, modifier)), chars.as_str())
        }
        _ => (None, line),
    }
}

/// Handle on a running (or stopped) scan session.
///
/// `start` while running and `stop` while stopped are no-ops.
#[derive(Debug, Default)]
pub struct ScanSession {
    task: Mutex<Option<JoinHandle<()>>>,
}

impl ScanSession {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.task
            .lock()
            .as_ref()
            .map(|task| !task.is_finished())
            .unwrap_or(false)
    }

    /// Open the configured sensor and deliver every accepted scan to `on_scan`
    pub async fn start<F>(&self, config: ScanConfig, on_scan: F) -> Result<(), ScanError>
    where
        F: FnMut(ScanEvent) + Send + 'static,
    {
        if self.is_running() {
            return Ok(());
        }
        config.validate()?;

        match config.source.clone() {
            SensorSource::Stdin => self.start_with_lines(stdin_lines()?, config, on_scan),
            SensorSource::Device(path) => {
                let file = tokio::fs::File::open(&path).await.map_err(|e| match e.kind() {
                    io::ErrorKind::NotFound => {
                        ScanError::SensorUnavailable(format!("{} not found", path.display()))
                    }
                    io::ErrorKind::PermissionDenied => {
                        ScanError::PermissionDenied(path.display().to_string())
                    }
                    _ => ScanError::Io(e),
                })?;
                self.start_with_reader(file, config, on_scan)
            }
        }
    }

    /// Start reading scans from an already opened sensor
    pub fn start_with_reader<R, F>(
        &self,
        reader: R,
        config: ScanConfig,
        mut on_scan: F,
    ) -> Result<(), ScanError>
    where
        R: AsyncRead + Unpin + Send + 'static,
        F: FnMut(ScanEvent) + Send + 'static,
    {
        let mut filter = ScanFilter::new(&config);
        let source = config.source.clone();
        self.spawn(config, async move {
            let mut lines = BufReader::new(reader).lines();
            loop {
                match lines.next_line().await {
                    Ok(Some(line)) => deliver(&mut filter, &mut on_scan, &line),
                    Ok(None) => {
                        info!("Scanner input closed ({:?})", source);
                        break;
                    }
                    Err(e) => {
                        warn!("Scanner read error ({:?}): {}", source, e);
                        break;
                    }
                }
            }
        })
    }

    /// Start reading scans forwarded by a reader outside the runtime.
    ///
    /// Stopping the session drops `lines`, so the sending side sees a closed
    /// channel on its next send.
    pub fn start_with_lines<F>(
        &self,
        mut lines: mpsc::Receiver<io::Result<String>>,
        config: ScanConfig,
        mut on_scan: F,
    ) -> Result<(), ScanError>
    where
        F: FnMut(ScanEvent) + Send + 'static,
    {
        let mut filter = ScanFilter::new(&config);
        let source = config.source.clone();
        self.spawn(config, async move {
            loop {
                match lines.recv().await {
                    Some(Ok(line)) => deliver(&mut filter, &mut on_scan, &line),
                    None => {
                        info!("Scanner input closed ({:?})", source);
                        break;
                    }
                    Some(Err(e)) => {
                        warn!("Scanner read error ({:?}): {}", source, e);
                        break;
                    }
                }
            }
        })
    }

    fn spawn<T>(&self, config: ScanConfig, session: T) -> Result<(), ScanError>
    where
        T: Future<Output = ()> + Send + 'static,
    {
        config.validate()?;

        let mut task = self.task.lock();
        if task.as_ref().is_some_and(|t| !t.is_finished()) {
            return Ok(());
        }
        *task = Some(tokio::spawn(session));

        info!("Scan session started ({:?})", config.source);
        Ok(())
    }

    pub fn stop(&self) {
        if let Some(task) = self.task.lock().take() {
            task.abort();
            info!("Scan session stopped");
        }
    }
}

fn deliver<F: FnMut(ScanEvent)>(filter: &mut ScanFilter, on_scan: &mut F, line: &str) {
    if let Some(event) = filter.accept(line, Utc::now()) {
        on_scan(event);
    }
}

/// Read stdin on a plain thread.
///
/// A blocking read cannot be cancelled, and a read parked on the runtime's
/// blocking pool would hold up runtime shutdown until the next line arrives.
/// The thread exits once the receiver is gone.
fn stdin_lines() -> Result<mpsc::Receiver<io::Result<String>>, ScanError> {
    let (tx, rx) = mpsc::channel(64);
    std::thread::Builder::new()
        .name("scanmatch-stdin".to_string())
        .spawn(move || {
            for line in io::stdin().lock().lines() {
                let failed = line.is_err();
                if tx.blocking_send(line).is_err() || failed {
                    break;
                }
            }
            debug!("stdin reader finished");
        })?;
    Ok(rx)
}

impl Drop for ScanSession {
    fn drop(&mut self) {
        if let Some(task) = self.task.get_mut().take() {
            task.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tokio::io::AsyncWriteExt;

    fn at(seconds: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000 + seconds, 0).unwrap()
    }

    #[test]
    fn test_filter_strips_aim_identifier() {
        let mut filter = ScanFilter::new(&ScanConfig::default());
        let event = filter.accept("]E07501234567890\r", at(0)).unwrap();

        assert_eq!(event.raw, "7501234567890");
        assert_eq!(event.symbology, Some(Symbology::Ean13));
    }

    #[test]
    fn test_filter_without_identifier() {
        let mut filter = ScanFilter::new(&ScanConfig::default());
        let event = filter.accept("https://shop.example/p/1", at(0)).unwrap();

        assert_eq!(event.raw, "https://shop.example/p/1");
        assert_eq!(event.symbology, None);
    }

    #[test]
    fn test_filter_drops_unaccepted_symbology() {
        let config = ScanConfig {
            formats: vec![Symbology::QrCode],
            ..ScanConfig::default()
        };
        let mut filter = ScanFilter::new(&config);

        assert!(filter.accept("]E07501234567890", at(0)).is_none());
        assert!(filter.accept("]d2010123", at(1)).is_none());
        assert!(filter.accept("]Q1https://shop.example/p/1", at(2)).is_some());
    }

    #[test]
    fn test_upc_formats_accept_ean13_events() {
        let config = ScanConfig {
            formats: vec![Symbology::UpcA],
            ..ScanConfig::default()
        };
        let mut filter = ScanFilter::new(&config);
        assert!(filter.accept("]E0012345678905", at(0)).is_some());
        assert!(filter.accept("]E412345670", at(1)).is_none());
    }

    #[test]
    fn test_filter_debounces_repeats() {
        let mut filter = ScanFilter::new(&ScanConfig::default());

        assert!(filter.accept("750", at(0)).is_some());
        assert!(filter.accept("750 ", at(1)).is_none());
        assert!(filter.accept("751", at(1)).is_some());
        assert!(filter.accept("750", at(2)).is_some());
        assert!(filter.accept("750", at(5)).is_some());
    }

    #[test]
    fn test_filter_drops_empty_lines() {
        let mut filter = ScanFilter::new(&ScanConfig::default());
        assert!(filter.accept("", at(0)).is_none());
        assert!(filter.accept("  \r", at(0)).is_none());
        assert!(filter.accept("]Q1", at(0)).is_none());
    }

    #[test]
    fn test_symbology_from_str() {
        assert_eq!("EAN-13".parse::<Symbology>().unwrap(), Symbology::Ean13);
        assert_eq!("qr_code".parse::<Symbology>().unwrap(), Symbology::QrCode);
        assert!("pdf417".parse::<Symbology>().is_err());
    }

    #[test]
    fn test_empty_formats_rejected() {
        let config = ScanConfig {
            formats: Vec::new(),
            ..ScanConfig::default()
        };
        assert!(matches!(config.validate(), Err(ScanError::InvalidConfig(_))));
    }

    #[tokio::test]
    async fn test_missing_device_is_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let session = ScanSession::new();
        let config = ScanConfig {
            source: SensorSource::Device(dir.path().join("scanner")),
            ..ScanConfig::default()
        };

        let result = session.start(config, |_| {}).await;
        assert!(matches!(result, Err(ScanError::SensorUnavailable(_))));
        assert!(!session.is_running());
    }

    #[tokio::test]
    async fn test_session_delivers_events_in_order() {
        let (mut writer, reader) = tokio::io::duplex(256);
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        let session = ScanSession::new();

        session
            .start_with_reader(reader, ScanConfig::default(), move |event| {
                let _ = tx.send(event.raw);
            })
            .unwrap();
        assert!(session.is_running());

        writer.write_all(b"first\n\nsecond\r\nsecond\n").await.unwrap();
        drop(writer);

        assert_eq!(rx.recv().await.as_deref(), Some("first"));
        assert_eq!(rx.recv().await.as_deref(), Some("second"));
        assert_eq!(rx.recv().await, None);
    }

    #[tokio::test]
    async fn test_forwarded_lines_are_filtered() {
        let (line_tx, line_rx) = tokio::sync::mpsc::channel(8);
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        let session = ScanSession::new();

        session
            .start_with_lines(line_rx, ScanConfig::default(), move |event| {
                let _ = tx.send(event.raw);
            })
            .unwrap();

        for line in ["]E07501234567890", "]E07501234567890", "", "F0012345"] {
            line_tx.send(Ok(line.to_string())).await.unwrap();
        }
        drop(line_tx);

        assert_eq!(rx.recv().await.as_deref(), Some("7501234567890"));
        assert_eq!(rx.recv().await.as_deref(), Some("F0012345"));
        assert_eq!(rx.recv().await, None);
    }

    #[tokio::test]
    async fn test_stopped_session_releases_line_source() {
        let (line_tx, line_rx) = tokio::sync::mpsc::channel(8);
        let session = ScanSession::new();

        session
            .start_with_lines(line_rx, ScanConfig::default(), |_| {})
            .unwrap();
        assert!(!line_tx.is_closed());

        session.stop();
        let released = tokio::time::timeout(Duration::from_secs(1), line_tx.closed()).await;
        assert!(released.is_ok());
        assert!(line_tx.send(Ok("750".to_string())).await.is_err());
    }

    #[tokio::test]
    async fn test_start_and_stop_are_idempotent() {
        let (_writer, reader) = tokio::io::duplex(64);
        let (_second_writer, second_reader) = tokio::io::duplex(64);
        let calls = Arc::new(parking_lot::Mutex::new(0usize));
        let session = ScanSession::new();

        session.stop();
        assert!(!session.is_running());

        let counter = calls.clone();
        session
            .start_with_reader(reader, ScanConfig::default(), move |_| *counter.lock() += 1)
            .unwrap();
        session
            .start_with_reader(second_reader, ScanConfig::default(), |_| {})
            .unwrap();
        assert!(session.is_running());

        session.stop();
        session.stop();
        tokio::task::yield_now().await;
        assert!(!session.is_running());
        assert_eq!(*calls.lock(), 0);
    }
}
