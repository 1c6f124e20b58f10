//! Run log: timestamped progress lines on the console and in a per-run file.

use chrono::{DateTime, Local};
use log::error;
use parking_lot::Mutex;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
const FILE_NAME_FORMAT: &str = "%Y-%m-%d_%H-%M-%S";

pub struct TestLog {
    path: PathBuf,
    echo: bool,
    // Serializes appends so concurrent workers never interleave partial lines.
    file_lock: Mutex<()>,
}

impl TestLog {
    /// Log file `test-execution-log-<timestamp>.txt` under `dir`, echoed to stdout.
    pub fn new(dir: &Path) -> Self {
        let name = format!("test-execution-log-{}.txt", Local::now().format(FILE_NAME_FORMAT));
        if let Err(e) = fs::create_dir_all(dir) {
            report_failure(&format!("cannot create {}: {}", dir.display(), e));
        }
        Self {
            path: dir.join(name),
            echo: true,
            file_lock: Mutex::new(()),
        }
    }

    /// Same as [`TestLog::new`] but writes only to the file.
    pub fn quiet(dir: &Path) -> Self {
        Self {
            echo: false,
            ..Self::new(dir)
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn log(&self, message: &str) {
        let line = format_line(Local::now(), message);
        if self.echo {
            println!("{}", line);
        }
        self.append(&line);
    }

    pub fn scenario_start(&self, name: &str) {
        self.log(&format!("🚀 Starting Scenario: {}", name));
    }

    pub fn scenario_end(&self, name: &str, status: &str) {
        self.log(&format!("🏁 Finished Scenario: {} | Status: {}", name, status));
    }

    fn append(&self, line: &str) {
        let _guard = self.file_lock.lock();
        let written = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .and_then(|mut file| writeln!(file, "{}", line));
        if let Err(e) = written {
            report_failure(&e.to_string());
        }
    }
}

fn report_failure(reason: &str) {
    eprintln!("[Logger Error] Failed to write log: {}", reason);
    error!("Failed to write run log: {}", reason);
}

pub fn format_line(at: DateTime<Local>, message: &str) -> String {
    format!("[{}] {}", at.format(TIMESTAMP_FORMAT), message)
}
