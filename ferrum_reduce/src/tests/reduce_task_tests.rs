use crate::api::record::KeyValue;
use crate::api::reduce::{ConcatReducer, SumReducer};
use crate::core::naming::MrTmpNaming;
use crate::core::task::{ReduceTask, Task, TaskState};
use crate::framework::errors::FerrumReduceError;
use crate::framework::options::ReduceOptions;
use crate::tests::support::{read_output, write_intermediate, write_raw_intermediate, TestDir};
use std::fs;
use std::sync::{Arc, Mutex};
use tokio_test::{assert_err, assert_ok};

fn task(dir: &TestDir, num_mappers: usize, reducer: Arc<dyn crate::Reducer + Send + Sync>) -> ReduceTask {
    ReduceTask::new("job", 0, dir.path().join("out"), num_mappers, reducer)
        .with_naming(Arc::new(MrTmpNaming::new(dir.path())))
}

#[test]
fn sums_values_across_map_outputs() {
    let dir = TestDir::new();
    let naming = MrTmpNaming::new(dir.path());
    write_intermediate(&naming, "job", 0, 0, &[("a", "1"), ("b", "2")]);
    write_intermediate(&naming, "job", 1, 0, &[("a", "3")]);

    let report = assert_ok!(task(&dir, 2, Arc::new(SumReducer)).run());

    assert_eq!(report.state, TaskState::Done);
    assert_eq!(report.collect.files_read, 2);
    assert_eq!(
        read_output(&dir.path().join("out")),
        vec![KeyValue::new("a", "4"), KeyValue::new("b", "2")]
    );
}

#[test]
fn disjoint_key_sets_produce_their_union() {
    let dir = TestDir::new();
    let naming = MrTmpNaming::new(dir.path());
    write_intermediate(&naming, "job", 0, 0, &[("a", "x"), ("a", "y")]);
    write_intermediate(&naming, "job", 1, 0, &[("b", "z")]);
    write_intermediate(&naming, "job", 2, 0, &[("c", "w")]);

    assert_ok!(task(&dir, 3, Arc::new(ConcatReducer::default())).run());

    assert_eq!(
        read_output(&dir.path().join("out")),
        vec![
            KeyValue::new("a", "x,y"),
            KeyValue::new("b", "z"),
            KeyValue::new("c", "w"),
        ]
    );
}

#[test]
fn reducer_called_once_per_key_with_ordered_values() {
    let dir = TestDir::new();
    let naming = MrTmpNaming::new(dir.path());
    write_intermediate(&naming, "job", 0, 0, &[("k", "v1"), ("other", "o")]);
    write_intermediate(&naming, "job", 1, 0, &[("k", "v2")]);
    write_intermediate(&naming, "job", 2, 0, &[("k", "v3"), ("k", "v4")]);

    let calls: Arc<Mutex<Vec<(String, Vec<String>)>>> = Arc::new(Mutex::new(Vec::new()));
    let seen = calls.clone();
    let recording = move |key: &str, values: &[String]| {
        seen.lock().unwrap().push((key.to_string(), values.to_vec()));
        values.len().to_string()
    };

    assert_ok!(task(&dir, 3, Arc::new(recording)).run());

    let calls = calls.lock().unwrap();
    let k_calls: Vec<_> = calls.iter().filter(|(key, _)| key == "k").collect();
    assert_eq!(k_calls.len(), 1);
    assert_eq!(k_calls[0].1, vec!["v1", "v2", "v3", "v4"]);
    assert_eq!(calls.len(), 2);
}

#[test]
fn rerunning_produces_identical_bytes() {
    let dir = TestDir::new();
    let naming = MrTmpNaming::new(dir.path());
    let words: Vec<(String, String)> = (0..200)
        .map(|i| (format!("word{}", i % 37), "1".to_string()))
        .collect();
    let records: Vec<(&str, &str)> = words.iter().map(|(k, v)| (k.as_str(), v.as_str())).collect();
    write_intermediate(&naming, "job", 0, 0, &records[..120]);
    write_intermediate(&naming, "job", 1, 0, &records[120..]);

    let out = dir.path().join("out");
    assert_ok!(task(&dir, 2, Arc::new(SumReducer)).run());
    let first = fs::read(&out).unwrap();
    assert_ok!(task(&dir, 2, Arc::new(SumReducer)).run());
    let second = fs::read(&out).unwrap();

    assert_eq!(first, second);
    assert_eq!(read_output(&out).len(), 37);
}

#[test]
fn tolerates_missing_intermediate_file() {
    let dir = TestDir::new();
    let naming = MrTmpNaming::new(dir.path());
    write_intermediate(&naming, "job", 0, 0, &[("a", "1")]);
    write_intermediate(&naming, "job", 2, 0, &[("c", "3")]);

    let report = assert_ok!(task(&dir, 3, Arc::new(SumReducer)).run());

    assert_eq!(report.collect.files_missing, 1);
    assert_eq!(
        read_output(&dir.path().join("out")),
        vec![KeyValue::new("a", "1"), KeyValue::new("c", "3")]
    );
}

#[test]
fn tolerates_corrupted_record() {
    let dir = TestDir::new();
    let naming = MrTmpNaming::new(dir.path());
    write_raw_intermediate(
        &naming,
        "job",
        0,
        0,
        b"{\"Key\":\"a\",\"Value\":\"1\"}\n\x00\x01garbage\n{\"Key\":\"b\",\"Value\":\"5\"}\n",
    );
    write_intermediate(&naming, "job", 1, 0, &[("a", "2")]);

    let report = assert_ok!(task(&dir, 2, Arc::new(SumReducer)).run());

    assert_eq!(report.collect.malformed, 1);
    assert_eq!(
        read_output(&dir.path().join("out")),
        vec![KeyValue::new("a", "3"), KeyValue::new("b", "5")]
    );
}

#[test]
fn unwritable_output_fails_without_leaving_a_file() {
    let dir = TestDir::new();
    let naming = MrTmpNaming::new(dir.path());
    write_intermediate(&naming, "job", 0, 0, &[("a", "1")]);
    let out = dir.path().join("missing").join("out");

    let err = assert_err!(ReduceTask::new("job", 0, &out, 1, Arc::new(SumReducer))
        .with_naming(Arc::new(naming))
        .run());

    assert!(matches!(err, FerrumReduceError::OutputOpenError(_)));
    assert!(!out.exists());
}

#[test]
fn strict_mode_fails_before_writing_output() {
    let dir = TestDir::new();
    let naming = MrTmpNaming::new(dir.path());
    write_intermediate(&naming, "job", 0, 0, &[("a", "1")]);

    let err = assert_err!(task(&dir, 2, Arc::new(SumReducer))
        .with_options(ReduceOptions::strict())
        .run());

    assert!(matches!(err, FerrumReduceError::MissingIntermediate(_)));
    assert!(!dir.path().join("out").exists());
}

#[test]
fn zero_mappers_writes_empty_output() {
    let dir = TestDir::new();
    let report = assert_ok!(task(&dir, 0, Arc::new(SumReducer)).run());
    assert_eq!(report.emit.records_written, 0);
    assert!(read_output(&dir.path().join("out")).is_empty());
}

#[tokio::test]
async fn executes_on_blocking_pool() {
    let dir = TestDir::new();
    let naming = MrTmpNaming::new(dir.path());
    write_intermediate(&naming, "job", 0, 0, &[("a", "1"), ("a", "1")]);

    let report = assert_ok!(task(&dir, 1, Arc::new(SumReducer)).execute().await);

    assert_eq!(report.emit.records_written, 1);
    assert_eq!(read_output(&dir.path().join("out")), vec![KeyValue::new("a", "2")]);
}

#[test]
fn do_reduce_reads_working_directory_names() {
    // relative names resolve against the process cwd, so use absolute output only
    let dir = TestDir::new();
    let out = dir.path().join("out");
    let report = assert_ok!(crate::do_reduce(
        &format!("absent-{}", uuid::Uuid::new_v4()),
        0,
        &out,
        2,
        SumReducer
    ));
    assert_eq!(report.collect.files_missing, 2);
    assert!(read_output(&out).is_empty());
}
