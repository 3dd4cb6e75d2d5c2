use std::{
    fmt::Write as _,
    fs::{self, File, OpenOptions},
    io::{self, BufWriter, Write},
    path::{Path, PathBuf},
    sync::mpsc::{sync_channel, SyncSender},
    thread,
    time::Duration,
};

use chrono::{format::DelayedFormat, Local};
use once_cell::sync::Lazy;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};

static LOGGER: Lazy<Logger> = Lazy::new(|| Logger::new("default"));

/// 日誌檔存放目錄
const LOG_DIR: &str = "log";
/// 累積超過這個長度就寫入檔案
const FLUSH_THRESHOLD: usize = 2048;
/// 等待寫入線程確認 flush 的上限
const FLUSH_TIMEOUT: Duration = Duration::from_secs(2);

enum Record {
    Line(String),
    /// 寫出目前累積的內容後回覆
    Flush(SyncSender<()>),
}

pub struct Logger {
    info_writer: UnboundedSender<Record>,
    warn_writer: UnboundedSender<Record>,
    error_writer: UnboundedSender<Record>,
    debug_writer: UnboundedSender<Record>,
}

impl Logger {
    pub fn new(log_name: &str) -> Self {
        Logger {
            info_writer: Self::create_writer(&format!("{}_info", log_name)),
            warn_writer: Self::create_writer(&format!("{}_warn", log_name)),
            error_writer: Self::create_writer(&format!("{}_error", log_name)),
            debug_writer: Self::create_writer(&format!("{}_debug", log_name)),
        }
    }

    pub fn info(&self, log: String) {
        self.send(log, &self.info_writer);
    }

    pub fn warn(&self, log: String) {
        self.send(log, &self.warn_writer);
    }

    pub fn error(&self, log: String) {
        self.send(log, &self.error_writer);
    }

    pub fn debug(&self, log: String) {
        self.send(log, &self.debug_writer);
    }

    /// 等待各層級已送出的日誌寫入檔案
    pub fn flush(&self) {
        for writer in [
            &self.info_writer,
            &self.warn_writer,
            &self.error_writer,
            &self.debug_writer,
        ] {
            let (ack_tx, ack_rx) = sync_channel(1);
            if writer.send(Record::Flush(ack_tx)).is_err() {
                continue;
            }

            if let Err(why) = ack_rx.recv_timeout(FLUSH_TIMEOUT) {
                error_console(format!("Failed to flush log because {:?}", why));
            }
        }
    }

    fn send(&self, msg: String, writer: &UnboundedSender<Record>) {
        if let Err(why) = writer.send(Record::Line(msg)) {
            error_console(why.to_string());
        }
    }

    fn create_writer(log_name: &str) -> UnboundedSender<Record> {
        let (tx, rx) = unbounded_channel::<Record>();
        let log_path = Self::get_log_path(log_name);

        // 寫入檔案的操作使用另一個線程處理
        thread::spawn(move || match log_path.and_then(|path| Self::open(&path)) {
            Ok(file) => Self::drain(rx, BufWriter::new(file)),
            Err(why) => {
                error_console(format!("Failed to open log file because {:?}", why));
                Self::drain_to_console(rx);
            }
        });

        tx
    }

    fn drain(mut rx: UnboundedReceiver<Record>, mut writer: BufWriter<File>) {
        let mut line = String::with_capacity(FLUSH_THRESHOLD);

        while let Some(received) = rx.blocking_recv() {
            match received {
                Record::Line(msg) => {
                    if writeln!(&mut line, "{} {}", Local::now().format("%F %X%.6f"), msg)
                        .is_err()
                    {
                        continue;
                    }

                    if rx.is_empty() || line.len() >= FLUSH_THRESHOLD {
                        Self::write_out(&mut writer, &mut line);
                    }
                }
                Record::Flush(ack) => {
                    Self::write_out(&mut writer, &mut line);
                    let _ = ack.send(());
                }
            }
        }

        Self::write_out(&mut writer, &mut line);
    }

    fn write_out(writer: &mut BufWriter<File>, line: &mut String) {
        if line.is_empty() {
            return;
        }

        if let Err(why) = writer.write_all(line.as_bytes()) {
            error_console(format!(
                "Failed to write to log file. because:{:#?}\r\nmsg:{}",
                why, line
            ));
        }

        if let Err(why) = writer.flush() {
            error_console(format!("Failed to flush log file. because:{:#?}", why));
        }

        line.clear();
    }

    fn drain_to_console(mut rx: UnboundedReceiver<Record>) {
        while let Some(received) = rx.blocking_recv() {
            match received {
                Record::Line(msg) => info_console(msg),
                Record::Flush(ack) => {
                    let _ = ack.send(());
                }
            }
        }
    }

    fn open(path: &Path) -> io::Result<File> {
        OpenOptions::new().create(true).append(true).open(path)
    }

    fn get_log_path(name: &str) -> io::Result<PathBuf> {
        let path = Path::new(LOG_DIR);

        if !path.exists() {
            fs::create_dir_all(path)?;
        }

        let mut log_path = PathBuf::from(path);
        log_path.push(format!("{}_{}.log", name, Local::now().format("%Y-%m-%d")));

        Ok(log_path)
    }
}

pub fn info_file_async(log: String) {
    LOGGER.info(log);
}

pub fn warn_file_async(log: String) {
    LOGGER.warn(log);
}

pub fn error_file_async(log: String) {
    LOGGER.error(log);
}

pub fn debug_file_async(log: String) {
    LOGGER.debug(log);
}

/// 程式結束前呼叫，避免佇列中的日誌遺失
pub fn flush() {
    LOGGER.flush();
}

pub fn info_console(log: String) {
    println!(
        "{} Info {}",
        Local::now().format("%Y-%m-%d %H:%M:%S.%3f"),
        log
    );
}

pub fn error_console(log: String) {
    eprintln!(
        "{} Error {}",
        DelayedFormat::to_string(&Local::now().format("%Y-%m-%d %H:%M:%S.%3f")),
        log
    );
}
