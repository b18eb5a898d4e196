use coverager::config::CollectorConfig;
use coverager::domain::{ProcessInfo, Tid};
use coverager::export::ReportWriter;
use coverager::profiling::Collector;
use coverager::replay::replay;
use coverager_common::EventKind;
use std::fs;

const EVENTS: &str = r#"# two threads calling into app.exe and lib.so
{"event":"module_loaded","low":4194304,"high":4259840,"path":"/opt/app/app.exe"}
{"event":"module_loaded","low":268435456,"high":268959744,"path":"/opt/app/lib.so"}
{"event":"thread_start","tid":1}
{"event":"basic_block","tid":1,"address":4198400,"size":16,"instructions":4}
{"event":"thread_start","tid":2}
{"event":"call","tid":1,"instruction":4198416,"target":4202496}
{"event":"basic_block","tid":2,"address":4198400,"size":16,"instructions":4}
{"event":"call","tid":2,"instruction":4198416,"target":268439552}
{"event":"routine_entered","tid":2,"address":268439552}
{"event":"call","tid":2,"instruction":268439568,"target":0}
{"event":"return","tid":2,"instruction":268439600}
{"event":"return","tid":1,"instruction":4202512}
{"event":"return","tid":1,"instruction":4198432}
{"event":"thread_end","tid":2}
{"event":"call","tid":1,"instruction":4198420,"target":268439552}
{"event":"thread_end","tid":1}
{"event":"process_exit","code":0}
"#;

#[test]
fn test_replay_produces_reports_and_call_logs() {
    let dir = tempfile::tempdir().unwrap();
    let config = CollectorConfig::new(dir.path(), "replay").with_call_tree(true);
    let paths = config.report_paths();

    let collector = Collector::new(&config, ProcessInfo::default());
    let outcome = replay(&collector, EVENTS.as_bytes()).unwrap();
    assert_eq!(outcome.exit_code, Some(0));
    assert_eq!(outcome.workers, 2);
    assert_eq!(outcome.stats.count(EventKind::Call), 4);
    assert_eq!(outcome.stats.count(EventKind::ModuleLoaded), 2);

    let snapshot = collector.finish();
    let reports = ReportWriter::new(paths.clone()).write_all(&snapshot);
    assert!(reports.skipped.is_empty());

    let blocks = fs::read_to_string(paths.blocks()).unwrap();
    assert_eq!(blocks, "0x00401000:0x00000010:4:app.exe+0x1000:2\n");

    // lib.so+0x1000 is reached by two calls and one routine entry.
    let routines = fs::read_to_string(paths.routines()).unwrap();
    assert_eq!(routines, "0x00402000:app.exe+0x2000:1\n0x10001000:lib.so+0x1000:3\n");

    let loads = fs::read_to_string(paths.module_loads()).unwrap();
    assert_eq!(loads, "/opt/app/app.exe\n/opt/app/lib.so\n");

    let thread1 = fs::read_to_string(paths.call_log(Tid(1))).unwrap();
    assert_eq!(thread1, "# thread 1\n0x00000000:0x00402000\n0x00000000:0x10001000\n");

    let thread2 = fs::read_to_string(paths.call_log(Tid(2))).unwrap();
    assert_eq!(thread2, "# thread 2\n0x00000000:0x10001000\n");
}
