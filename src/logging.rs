// src/logging.rs
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::time::Instant;

use env_logger::{Builder, Env, Target};

use crate::config::LogOptions;

fn fmt_elapsed(ms: u128) -> String {
    let total_ms = ms as u64;
    let h = total_ms / 3_600_000;
    let m = (total_ms % 3_600_000) / 60_000;
    let s = (total_ms % 60_000) / 1_000;
    let ms = total_ms % 1_000;
    format!("{h:02}:{m:02}:{s:02}.{ms:03}")
}

/// Install the global logger: `[elapsed][LEVEL] msg` lines to stderr or,
/// when configured, appended to a file. `RUST_LOG` overrides the level.
pub fn init(opts: &LogOptions) -> io::Result<()> {
    let start = Instant::now();
    let default_level = if opts.verbose { "debug" } else { "info" };

    let mut builder = Builder::from_env(Env::default().default_filter_or(default_level));
    builder.format(move |buf, record| {
        let elapsed = fmt_elapsed(start.elapsed().as_millis());
        writeln!(buf, "[{elapsed}][{}] {}", record.level(), record.args())
    });

    if let Some(path) = &opts.file {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        builder.target(Target::Pipe(Box::new(file)));
    }

    // Already installed (second call in the same process) is fine.
    let _ = builder.try_init();
    Ok(())
}
