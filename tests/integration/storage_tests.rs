//! Storage log sink against a real directory standing in for the card.

use std::fs;
use std::sync::Arc;

use sdlogger::adapters::log_sink::StorageLogSink;
use sdlogger::adapters::volume::MountTable;
use sdlogger::app::ports::RecordSink;
use sdlogger::app::records::{LogRecord, LogStream};
use sdlogger::config::NodeConfig;

use crate::mock_hw::*;

fn light(n: usize) -> LogRecord {
    LogRecord::new(LogStream::Light, SYNCED_AT, format!("Light level {}", n))
}

#[test]
fn card_inserted_later_starts_receiving_records() {
    let dir = scratch_dir("hotplug");
    let card = dir.join("card");
    let sink = StorageLogSink::new(MountTable::new().with_mount("SD", &card), &NodeConfig::default());

    sink.append(&light(1));
    assert!(!card.exists());

    fs::create_dir_all(&card).unwrap();
    sink.append(&light(2));

    fs::remove_dir_all(&card).unwrap();
    sink.append(&light(3));

    assert_eq!(sink.written(), 1);
    assert_eq!(sink.dropped(), 2);
    assert!(!card.exists());
}

#[test]
fn other_volume_names_do_not_count() {
    let dir = scratch_dir("othername");
    let sink = StorageLogSink::new(MountTable::new().with_mount("USB", &dir), &NodeConfig::default());

    sink.append(&light(1));

    assert!(!dir.join("light.log").exists());
    assert_eq!(sink.dropped(), 1);
}

#[test]
fn concurrent_appends_never_interleave() {
    const THREADS: usize = 4;
    const PER_THREAD: usize = 50;

    let dir = scratch_dir("concurrent");
    let sink = Arc::new(StorageLogSink::new(
        MountTable::new().with_mount("SD", &dir),
        &NodeConfig::default(),
    ));

    let handles: Vec<_> = (0..THREADS)
        .map(|t| {
            let sink = sink.clone();
            std::thread::spawn(move || {
                for i in 0..PER_THREAD {
                    sink.append(&light(t * 1000 + i));
                }
            })
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }

    let text = fs::read_to_string(dir.join("light.log")).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), THREADS * PER_THREAD);
    assert!(lines.iter().all(|l| l.starts_with("2026-10-16 08:30:00: Light level ")));
    assert_eq!(sink.written() as usize, THREADS * PER_THREAD);
}

#[test]
fn absent_volume_leaves_existing_file_untouched() {
    let dir = scratch_dir("absent-existing");
    let path = dir.join("light.log");
    let before = b"2026-10-15 23:59:00: Light level 7\n".to_vec();
    fs::write(&path, &before).unwrap();

    let volume = SwitchableVolume::absent(dir.clone());
    let sink = StorageLogSink::new(volume.clone(), &NodeConfig::default());

    sink.append(&light(1));
    sink.append(&light(2));

    assert_eq!(fs::read(&path).unwrap(), before);
    assert_eq!(sink.written(), 0);
    assert_eq!(sink.dropped(), 2);

    volume.set_present(true);
    sink.append(&light(3));

    let text = fs::read_to_string(&path).unwrap();
    assert!(text.starts_with("2026-10-15 23:59:00: Light level 7\n"));
    assert_eq!(text.lines().count(), 2);
    assert_eq!(text.lines().last(), Some("2026-10-16 08:30:00: Light level 3"));
}
